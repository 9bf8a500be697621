#![allow(dead_code)]

use chrono::{Days, NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::sync::Mutex;
use trendstop::domain::bar::Bar;
use trendstop::domain::error::TrendstopError;
use trendstop::domain::price::Price;
use trendstop::domain::resample::resample;
use trendstop::domain::resolution::Resolution;
use trendstop::domain::series::OhlcSeries;
use trendstop::ports::clock_port::ClockPort;
use trendstop::ports::data_feed_port::DataFeedPort;

/// Fourteen daily rows starting Monday 2024-01-01.
pub const FIXTURE: [(f64, f64, f64, f64); 14] = [
    (200.0, 203.5, 198.2, 202.1),
    (202.1, 205.0, 200.4, 204.6),
    (204.6, 206.3, 201.7, 202.0),
    (202.0, 204.9, 199.5, 204.1),
    (204.1, 208.8, 203.2, 208.0),
    (208.0, 210.2, 205.9, 206.4),
    (206.4, 207.1, 201.3, 202.2),
    (202.2, 203.0, 197.6, 198.5),
    (198.5, 201.4, 196.8, 200.9),
    (200.9, 204.7, 199.9, 203.8),
    (203.8, 205.5, 202.0, 204.9),
    (204.9, 205.2, 198.7, 199.3),
    (199.3, 200.1, 194.5, 195.2),
    (195.2, 199.9, 194.9, 199.0),
];

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn at(s: &str) -> NaiveDateTime {
    date(s).and_hms_opt(0, 0, 0).unwrap()
}

pub fn at_hour(s: &str, hour: u32) -> NaiveDateTime {
    date(s).and_hms_opt(hour, 0, 0).unwrap()
}

/// Consecutive calendar-day bars from `start`.
pub fn daily_series(start: &str, rows: &[(f64, f64, f64, f64)]) -> OhlcSeries {
    let first = at(start);
    OhlcSeries::from_bars(
        rows.iter()
            .enumerate()
            .map(|(i, &(o, h, l, c))| Bar::new(first + Days::new(i as u64), o, h, l, c))
            .collect(),
    )
    .unwrap()
}

pub fn fixture_series() -> OhlcSeries {
    daily_series("2024-01-01", &FIXTURE)
}

/// Deterministic random-walk style bars over `count` calendar days.
pub fn generate_series(start: &str, count: usize, base_price: f64) -> OhlcSeries {
    let rows: Vec<(f64, f64, f64, f64)> = (0..count)
        .map(|i| {
            let drift = (i as f64 * 0.7).sin() * 3.0 + i as f64 * 0.05;
            let open = base_price + drift;
            let close = open + (i as f64 * 1.3).cos() * 1.5;
            let high = open.max(close) + 1.0;
            let low = open.min(close) - 1.0;
            (open, high, low, close)
        })
        .collect();
    daily_series(start, &rows)
}

pub fn assert_options_close(actual: &[Option<f64>], expected: &[Option<f64>], eps: f64) {
    assert_eq!(actual.len(), expected.len(), "length mismatch");
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        match (a, e) {
            (None, None) => {}
            (Some(a), Some(e)) => assert!((a - e).abs() <= eps, "row {i}: {a} != {e}"),
            _ => panic!("row {i}: {a:?} != {e:?}"),
        }
    }
}

/// In-memory daily data per source id; other resolutions are resampled.
pub struct MockDataFeed {
    pub data: HashMap<String, OhlcSeries>,
    pub names: HashMap<String, String>,
    pub errors: HashMap<String, String>,
    pub prices: HashMap<String, Price>,
    pub requests: Mutex<Vec<(String, Resolution)>>,
}

impl MockDataFeed {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            names: HashMap::new(),
            errors: HashMap::new(),
            prices: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_series(mut self, source_id: &str, series: OhlcSeries) -> Self {
        self.data.insert(source_id.to_string(), series);
        self
    }

    pub fn with_name(mut self, source_id: &str, name: &str) -> Self {
        self.names.insert(source_id.to_string(), name.to_string());
        self
    }

    pub fn with_price(mut self, source_id: &str, last: f64, change: f64, change_pct: f64) -> Self {
        self.prices.insert(
            source_id.to_string(),
            Price {
                last,
                change,
                change_pct,
            },
        );
        self
    }

    pub fn with_error(mut self, source_id: &str, reason: &str) -> Self {
        self.errors.insert(source_id.to_string(), reason.to_string());
        self
    }
}

impl DataFeedPort for MockDataFeed {
    fn retrieve_ohlc(
        &self,
        source_id: &str,
        resolution: Resolution,
    ) -> Result<OhlcSeries, TrendstopError> {
        self.requests
            .lock()
            .unwrap()
            .push((source_id.to_string(), resolution));
        if let Some(reason) = self.errors.get(source_id) {
            return Err(TrendstopError::feed("mock", reason.clone()));
        }
        let daily = self.data.get(source_id).cloned().unwrap_or_else(OhlcSeries::empty);
        Ok(resample(&daily, resolution))
    }

    fn retrieve_asset_name(&self, source_id: &str) -> Result<String, TrendstopError> {
        Ok(self
            .names
            .get(source_id)
            .cloned()
            .unwrap_or_else(|| source_id.to_string()))
    }

    fn retrieve_price(&self, source_id: &str) -> Result<Price, TrendstopError> {
        if let Some(reason) = self.errors.get(source_id) {
            return Err(TrendstopError::feed("mock", reason.clone()));
        }
        self.prices
            .get(source_id)
            .copied()
            .ok_or_else(|| TrendstopError::feed("mock", format!("no quote for {source_id}")))
    }
}

pub struct FixedClock(pub NaiveDateTime);

impl ClockPort for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
