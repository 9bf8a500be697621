//! Average True Range.
//!
//! True range is undefined on the first row (no previous close). The ATR is a
//! running (Wilder) moving average with alpha = 1/periods:
//! `atr[i] = atr[i-1] + alpha * (tr[i] - atr[i-1])`, started from the first
//! true range and reported once `periods` true ranges have been observed, so
//! rows `0..periods` carry no value.

use crate::domain::bar::Bar;
use crate::domain::series::OhlcSeries;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtrRow {
    pub bar: Bar,
    pub true_range: Option<f64>,
    pub atr: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AtrSeries {
    pub periods: usize,
    pub rows: Vec<AtrRow>,
}

impl AtrSeries {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn values(&self) -> Vec<Option<f64>> {
        self.rows.iter().map(|r| r.atr).collect()
    }
}

pub fn true_ranges(series: &OhlcSeries) -> Vec<Option<f64>> {
    let bars = series.bars();
    let mut out = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        if i == 0 {
            out.push(None);
        } else {
            out.push(Some(bar.true_range(bars[i - 1].close)));
        }
    }
    out
}

/// ATR over `series`. Never fails: with too little history (or `periods == 0`)
/// every `atr` is `None`.
pub fn compute_atr(series: &OhlcSeries, periods: usize) -> AtrSeries {
    let ranges = true_ranges(series);
    let mut rows = Vec::with_capacity(ranges.len());

    let alpha = if periods == 0 {
        0.0
    } else {
        1.0 / periods as f64
    };
    let mut running: Option<f64> = None;
    let mut observed = 0usize;

    for (bar, tr) in series.bars().iter().zip(ranges) {
        if let Some(tr) = tr {
            observed += 1;
            running = Some(match running {
                None => tr,
                Some(prev) => prev + alpha * (tr - prev),
            });
        }

        let atr = if periods > 0 && observed >= periods {
            running
        } else {
            None
        };

        rows.push(AtrRow {
            bar: *bar,
            true_range: tr,
            atr,
        });
    }

    AtrSeries { periods, rows }
}
