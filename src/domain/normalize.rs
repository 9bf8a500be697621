//! Per-source conversion of raw OHLC records into canonical [`Bar`]s.
//!
//! Every upstream encodes time differently:
//! - Avanza: epoch milliseconds that are local midnight in Europe/Stockholm.
//! - CMC Markets: ISO-8601 with offset; late-evening stamps mean the next day.
//! - Kraken: epoch seconds in UTC, prices as strings.
//! - Degiro: epoch seconds in UTC from pre-aggregated chart data, rounded to the day.

use chrono::{DateTime, Days, FixedOffset, NaiveDateTime, Timelike};
use chrono_tz::Europe::Stockholm;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::bar::Bar;
use crate::domain::calendar::{midnight, round_day};
use crate::domain::error::TrendstopError;
use crate::domain::price::{
    Price, from_avanza_quote, from_cmc_quote, from_degiro_quote, from_kraken_hourly,
};
use crate::domain::resolution::Resolution;

/// The closed set of normalization behaviours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Avanza,
    Cmc,
    Kraken,
    Degiro,
}

impl SourceKind {
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::Avanza => "Avanza",
            SourceKind::Cmc => "CMC",
            SourceKind::Kraken => "Kraken",
            SourceKind::Degiro => "Degiro",
        }
    }

    pub fn normalize(&self, raw: &Value) -> Result<Bar, TrendstopError> {
        match self {
            SourceKind::Avanza => from_avanza(raw),
            SourceKind::Cmc => from_cmc(raw),
            SourceKind::Kraken => from_kraken(raw),
            SourceKind::Degiro => from_degiro(raw),
        }
    }

    /// Resolution to request upstream for a caller asking for `requested`.
    /// Kraken and Degiro are always fetched daily and resampled locally.
    pub fn upstream_resolution(&self, requested: Resolution) -> Result<Resolution, TrendstopError> {
        match (self, requested) {
            (SourceKind::Avanza, r) => Ok(r),
            (SourceKind::Cmc, Resolution::Month) => Err(TrendstopError::UnsupportedResolution {
                origin: self.label().to_string(),
                resolution: requested.to_string(),
            }),
            (SourceKind::Cmc, r) => Ok(r),
            (SourceKind::Kraken | SourceKind::Degiro, _) => Ok(Resolution::Day),
        }
    }

    /// Source-specific shift applied after normalization. CMC weeks start on
    /// Sunday, so weekly bars move forward one day onto the Monday.
    pub fn adjust_for_resolution(&self, bar: Bar, fetched: Resolution) -> Bar {
        match (self, fetched) {
            (SourceKind::Cmc, Resolution::Week) => bar.with_time(bar.time + Days::new(1)),
            _ => bar,
        }
    }

    /// Picks the list of raw OHLC records out of a full response payload.
    pub fn extract_records<'a>(&self, payload: &'a Value) -> Result<&'a [Value], TrendstopError> {
        let records = match self {
            SourceKind::Avanza => payload.get("ohlc"),
            SourceKind::Cmc => Some(payload),
            SourceKind::Kraken => return kraken_records(payload),
            SourceKind::Degiro => payload
                .get("series")
                .and_then(|s| s.get(0))
                .and_then(|s| s.get("data")),
        };

        records
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .ok_or_else(|| TrendstopError::feed(self.label(), "unexpected payload shape"))
    }

    /// Reads the display name from a metadata payload. Kraken has no such
    /// endpoint and its pair ids are descriptive, so the id is the name.
    pub fn asset_name(&self, metadata: &Value, source_id: &str) -> Result<String, TrendstopError> {
        let key = match self {
            SourceKind::Avanza => "tickerSymbol",
            SourceKind::Cmc => "name",
            SourceKind::Degiro => "symbol",
            SourceKind::Kraken => return Ok(source_id.to_string()),
        };
        metadata
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| TrendstopError::feed(self.label(), format!("missing `{key}` in metadata")))
    }

    /// Latest price from a quote payload. Kraken has no quote endpoint, so its
    /// payload is a window of hourly bars.
    pub fn price(&self, payload: &Value) -> Result<Price, TrendstopError> {
        match self {
            SourceKind::Avanza => from_avanza_quote(payload),
            SourceKind::Cmc => from_cmc_quote(payload),
            SourceKind::Kraken => from_kraken_hourly(payload),
            SourceKind::Degiro => from_degiro_quote(payload),
        }
    }
}

/// Converts one raw record of the given source into a bar.
pub fn normalize_bar(raw: &Value, kind: SourceKind) -> Result<Bar, TrendstopError> {
    kind.normalize(raw)
}

#[derive(Deserialize)]
struct AvanzaOhlc {
    timestamp: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
}

#[derive(Deserialize)]
struct CmcOhlc {
    t: String,
    o: f64,
    h: f64,
    l: f64,
    c: f64,
}

pub fn from_avanza(raw: &Value) -> Result<Bar, TrendstopError> {
    let ohlc = AvanzaOhlc::deserialize(raw)
        .map_err(|e| TrendstopError::malformed(SourceKind::Avanza.label(), e.to_string()))?;

    let utc = DateTime::from_timestamp_millis(ohlc.timestamp).ok_or_else(|| {
        TrendstopError::malformed(
            SourceKind::Avanza.label(),
            format!("timestamp out of range: {}", ohlc.timestamp),
        )
    })?;
    let time = utc.with_timezone(&Stockholm).naive_local();

    finite_bar(
        SourceKind::Avanza,
        time,
        [ohlc.open, ohlc.high, ohlc.low, ohlc.close],
    )
}

pub fn from_cmc(raw: &Value) -> Result<Bar, TrendstopError> {
    let ohlc = CmcOhlc::deserialize(raw)
        .map_err(|e| TrendstopError::malformed(SourceKind::Cmc.label(), e.to_string()))?;

    let stamp = parse_offset_time(&ohlc.t).ok_or_else(|| {
        TrendstopError::malformed(SourceKind::Cmc.label(), format!("invalid timestamp {:?}", ohlc.t))
    })?;

    let local = stamp.naive_local();
    let time = if local.hour() > 12 {
        midnight(local.date() + Days::new(1))
    } else {
        local
    };

    finite_bar(SourceKind::Cmc, time, [ohlc.o, ohlc.h, ohlc.l, ohlc.c])
}

pub fn from_kraken(raw: &Value) -> Result<Bar, TrendstopError> {
    let kind = SourceKind::Kraken;
    let fields = raw
        .as_array()
        .ok_or_else(|| TrendstopError::malformed(kind.label(), "record is not an array"))?;

    let seconds = fields
        .first()
        .and_then(Value::as_i64)
        .ok_or_else(|| TrendstopError::malformed(kind.label(), "missing or non-integer time"))?;
    let time = DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| {
            TrendstopError::malformed(kind.label(), format!("timestamp out of range: {seconds}"))
        })?
        .naive_utc();

    Ok(Bar::new(
        time,
        price_at(kind, fields, 1, "open")?,
        price_at(kind, fields, 2, "high")?,
        price_at(kind, fields, 3, "low")?,
        price_at(kind, fields, 4, "close")?,
    ))
}

pub fn from_degiro(raw: &Value) -> Result<Bar, TrendstopError> {
    let kind = SourceKind::Degiro;
    let fields = raw
        .as_array()
        .ok_or_else(|| TrendstopError::malformed(kind.label(), "record is not an array"))?;

    let seconds = fields
        .first()
        .and_then(Value::as_f64)
        .ok_or_else(|| TrendstopError::malformed(kind.label(), "missing or non-numeric time"))?;
    let time = DateTime::from_timestamp(seconds as i64, 0)
        .ok_or_else(|| {
            TrendstopError::malformed(kind.label(), format!("timestamp out of range: {seconds}"))
        })?
        .naive_utc();

    Ok(Bar::new(
        round_day(time),
        price_at(kind, fields, 1, "open")?,
        price_at(kind, fields, 2, "high")?,
        price_at(kind, fields, 3, "low")?,
        price_at(kind, fields, 4, "close")?,
    ))
}

fn parse_offset_time(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z"))
        .ok()
}

fn finite_bar(
    kind: SourceKind,
    time: NaiveDateTime,
    [open, high, low, close]: [f64; 4],
) -> Result<Bar, TrendstopError> {
    if [open, high, low, close].iter().any(|v| !v.is_finite()) {
        return Err(TrendstopError::malformed(kind.label(), "non-finite price"));
    }
    Ok(Bar::new(time, open, high, low, close))
}

/// Prices arrive either as JSON numbers or as decimal strings.
fn price_at(
    kind: SourceKind,
    fields: &[Value],
    index: usize,
    name: &str,
) -> Result<f64, TrendstopError> {
    let value = fields
        .get(index)
        .ok_or_else(|| TrendstopError::malformed(kind.label(), format!("missing {name}")))?;

    let parsed = match value {
        Value::String(s) => s.trim().parse::<f64>().map_err(|e| {
            TrendstopError::malformed(kind.label(), format!("invalid {name} {s:?}: {e}"))
        })?,
        Value::Number(n) => n.as_f64().ok_or_else(|| {
            TrendstopError::malformed(kind.label(), format!("invalid {name} {n}"))
        })?,
        other => {
            return Err(TrendstopError::malformed(
                kind.label(),
                format!("invalid {name} {other}"),
            ));
        }
    };

    if !parsed.is_finite() {
        return Err(TrendstopError::malformed(
            kind.label(),
            format!("non-finite {name}"),
        ));
    }
    Ok(parsed)
}

pub(crate) fn kraken_records(payload: &Value) -> Result<&[Value], TrendstopError> {
    let label = SourceKind::Kraken.label();

    if let Some(errors) = payload.get("error").and_then(Value::as_array) {
        if !errors.is_empty() {
            let joined: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            return Err(TrendstopError::feed(label, joined.join(", ")));
        }
    }

    // `result` holds the pair's rows under its internal id, next to a `last` cursor.
    payload
        .get("result")
        .and_then(Value::as_object)
        .and_then(|result| {
            result
                .iter()
                .find(|(key, _)| key.as_str() != "last")
                .map(|(_, rows)| rows)
        })
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or_else(|| TrendstopError::feed(label, "unexpected payload shape"))
}
