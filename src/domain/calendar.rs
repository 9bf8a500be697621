//! Calendar and bucket-boundary helpers.

use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};

use crate::domain::resolution::Resolution;

pub fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

pub fn is_sunday(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Sun
}

pub fn is_saturday(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Sat
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

pub fn is_end_of_month(date: NaiveDate) -> bool {
    days_to_next_month(date) == 1
}

/// Days until the first day of the next month: 1 on the last day of a month.
pub fn days_to_next_month(date: NaiveDate) -> u32 {
    let next_month = month_start(date) + Months::new(1);
    (next_month - date).num_days() as u32
}

/// Monday of the ISO week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.weekday().num_days_from_monday()))
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Start of the bucket containing `date` at the given resolution.
pub fn bucket_start(date: NaiveDate, resolution: Resolution) -> NaiveDate {
    match resolution {
        Resolution::Day => date,
        Resolution::Week => week_start(date),
        Resolution::Month => month_start(date),
    }
}

/// Late-evening timestamps stand for the next trading day: hour > 12 moves to
/// the next day's midnight, anything else truncates to the same day's midnight.
pub fn round_day(time: NaiveDateTime) -> NaiveDateTime {
    let date = time.date();
    if time.hour() > 12 {
        midnight(date + Days::new(1))
    } else {
        midnight(date)
    }
}

/// Whether the most recent bucket at `resolution` has closed as of `now`.
///
/// Weekly buckets close once the weekend starts. Monthly buckets close when the
/// month's remaining days are all weekend days: Sunday or Saturday as the last
/// day, or Saturday as the second-to-last.
pub fn is_last_bar_closed(resolution: Resolution, now: NaiveDateTime) -> bool {
    let today = now.date();
    match resolution {
        Resolution::Day => true,
        Resolution::Week => is_weekend(today),
        Resolution::Month => match days_to_next_month(today) {
            1 => is_weekend(today),
            2 => is_saturday(today),
            _ => false,
        },
    }
}
