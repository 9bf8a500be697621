//! Canonical price bar and unordered bar sets.

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use crate::domain::error::TrendstopError;

/// One OHLC observation. The timestamp is naive local wall-clock time of the
/// source exchange; for daily and coarser bars it is midnight.
#[derive(Debug, Clone, Copy)]
pub struct Bar {
    pub time: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Bars unique by full value. Ordering is not inherent; see [`barset_to_sorted_vec`].
pub type BarSet = HashSet<Bar>;

impl Bar {
    pub fn new(time: NaiveDateTime, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.time.date()
    }

    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }

    pub fn with_time(self, time: NaiveDateTime) -> Self {
        Self { time, ..self }
    }

    fn key(&self) -> (NaiveDateTime, [u64; 4]) {
        (
            self.time,
            [
                self.open.to_bits(),
                self.high.to_bits(),
                self.low.to_bits(),
                self.close.to_bits(),
            ],
        )
    }
}

impl PartialEq for Bar {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Bar {}

impl Hash for Bar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` and `YYYY-MM-DDTHH:MM:SS`.
pub fn parse_time(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_price(origin: &str, name: &str, value: Option<&str>) -> Result<f64, TrendstopError> {
    let raw = value.ok_or_else(|| TrendstopError::malformed(origin, format!("missing {name}")))?;
    let parsed: f64 = raw
        .trim()
        .parse()
        .map_err(|e| TrendstopError::malformed(origin, format!("invalid {name} {raw:?}: {e}")))?;
    if !parsed.is_finite() {
        return Err(TrendstopError::malformed(
            origin,
            format!("non-finite {name} {raw:?}"),
        ));
    }
    Ok(parsed)
}

impl Bar {
    /// Parses one `time,open,high,low,close` record.
    pub fn from_csv_record(record: &csv::StringRecord) -> Result<Self, TrendstopError> {
        let raw_time = record
            .get(0)
            .ok_or_else(|| TrendstopError::malformed("csv", "missing time"))?;
        let time = parse_time(raw_time).ok_or_else(|| {
            TrendstopError::malformed("csv", format!("invalid time {raw_time:?}"))
        })?;

        Ok(Self {
            time,
            open: parse_price("csv", "open", record.get(1))?,
            high: parse_price("csv", "high", record.get(2))?,
            low: parse_price("csv", "low", record.get(3))?,
            close: parse_price("csv", "close", record.get(4))?,
        })
    }
}

/// Builds a bar set from header-less `time,open,high,low,close` lines.
pub fn barset_from_csv_string(content: &str) -> Result<BarSet, TrendstopError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(content.trim().as_bytes());

    let mut barset = BarSet::new();
    for result in rdr.records() {
        let record =
            result.map_err(|e| TrendstopError::malformed("csv", format!("CSV parse error: {e}")))?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        barset.insert(Bar::from_csv_record(&record)?);
    }

    Ok(barset)
}

pub fn barset_to_sorted_vec(barset: &BarSet) -> Vec<Bar> {
    let mut bars: Vec<Bar> = barset.iter().copied().collect();
    bars.sort_by(|a, b| {
        a.time
            .cmp(&b.time)
            .then_with(|| a.key().1.cmp(&b.key().1))
    });
    bars
}
