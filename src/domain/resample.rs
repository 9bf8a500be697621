//! Daily to weekly/monthly aggregation.
//!
//! Buckets are right-open and labelled at their start: weeks on Monday,
//! months on the 1st. open = first open, high = max, low = min, close = last
//! close. A trailing in-progress bucket is kept; empty buckets are not emitted.

use crate::domain::bar::Bar;
use crate::domain::calendar::{bucket_start, midnight};
use crate::domain::resolution::Resolution;
use crate::domain::series::OhlcSeries;

pub fn resample(daily: &OhlcSeries, target: Resolution) -> OhlcSeries {
    if target == Resolution::Day {
        return daily.clone();
    }

    let mut out: Vec<Bar> = Vec::new();

    for bar in daily.bars() {
        let label = midnight(bucket_start(bar.date(), target));
        match out.last_mut() {
            Some(current) if current.time == label => {
                current.high = current.high.max(bar.high);
                current.low = current.low.min(bar.low);
                current.close = bar.close;
            }
            _ => out.push(Bar::new(label, bar.open, bar.high, bar.low, bar.close)),
        }
    }

    OhlcSeries::from_sorted_unchecked(out)
}
