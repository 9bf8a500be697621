//! ATR trailing stop.
//!
//! `stop_distance = atr * multiplier`. From the first row with an ATR the stop
//! is seeded on one side of the close, then each row looks at the previous
//! close and stop:
//! - both closes above the previous stop: `max(prev_stop, close - distance)`
//! - both closes below the previous stop: `min(prev_stop, close + distance)`
//! - otherwise price crossed it and the stop flips to the side of the new close.
//!
//! The recurrence is strictly sequential and runs in ascending time order.

use crate::domain::atr::compute_atr;
use crate::domain::bar::Bar;
use crate::domain::error::TrendstopError;
use crate::domain::series::OhlcSeries;

/// Side the stop is seeded on before any crossing has been observed.
///
/// The default seeds long, below the close. Running the recurrence against an
/// undefined previous stop instead falls through to the short branch and seeds
/// above the close; that is not the behaviour wanted here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopBias {
    #[default]
    Long,
    Short,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopRow {
    pub bar: Bar,
    pub atr: Option<f64>,
    pub stop_distance: Option<f64>,
    pub stop: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StopSeries {
    pub periods: usize,
    pub multiplier: f64,
    pub rows: Vec<StopRow>,
}

impl StopSeries {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn stops(&self) -> Vec<Option<f64>> {
        self.rows.iter().map(|r| r.stop).collect()
    }

    /// Drops the most recent row, used when its bucket has not closed yet.
    pub fn without_last(mut self) -> Self {
        self.rows.pop();
        self
    }

    /// Most recent row that carries a stop.
    pub fn latest(&self) -> Option<&StopRow> {
        self.rows.iter().rev().find(|r| r.stop.is_some())
    }
}

/// The stop for one row given the previous row's close and stop.
pub fn next_stop(prev_close: f64, prev_stop: f64, close: f64, distance: f64) -> f64 {
    if close > prev_stop && prev_close > prev_stop {
        prev_stop.max(close - distance)
    } else if close < prev_stop && prev_close < prev_stop {
        prev_stop.min(close + distance)
    } else if close > prev_stop {
        close - distance
    } else {
        close + distance
    }
}

pub fn compute_trailing_stop(
    series: &OhlcSeries,
    periods: usize,
    multiplier: f64,
) -> Result<StopSeries, TrendstopError> {
    compute_trailing_stop_with_bias(series, periods, multiplier, StopBias::default())
}

pub fn compute_trailing_stop_with_bias(
    series: &OhlcSeries,
    periods: usize,
    multiplier: f64,
    bias: StopBias,
) -> Result<StopSeries, TrendstopError> {
    if series.is_empty() {
        return Err(TrendstopError::EmptySeries);
    }

    let atr = compute_atr(series, periods);
    let mut rows: Vec<StopRow> = Vec::with_capacity(atr.len());

    for (i, atr_row) in atr.rows.iter().enumerate() {
        let bar = atr_row.bar;
        let stop_distance = atr_row.atr.map(|a| a * multiplier);
        let previous = i.checked_sub(1).map(|p| &rows[p]);

        let stop = match (stop_distance, previous.and_then(|p| p.stop.map(|s| (p.bar.close, s)))) {
            (None, _) => None,
            (Some(distance), None) => Some(match bias {
                StopBias::Long => bar.close - distance,
                StopBias::Short => bar.close + distance,
            }),
            (Some(distance), Some((prev_close, prev_stop))) => {
                Some(next_stop(prev_close, prev_stop, bar.close, distance))
            }
        };

        rows.push(StopRow {
            bar,
            atr: atr_row.atr,
            stop_distance,
            stop,
        });
    }

    Ok(StopSeries {
        periods,
        multiplier,
        rows,
    })
}

/// Latest defined stop, or `InsufficientHistory` when none was ever seeded.
pub fn latest_stop(series: &StopSeries) -> Result<f64, TrendstopError> {
    series
        .latest()
        .and_then(|r| r.stop)
        .ok_or(TrendstopError::InsufficientHistory {
            rows: series.len(),
            periods: series.periods,
        })
}
