//! Latest price and daily change, derived from each source's quote payload.

use serde::Serialize;
use serde_json::Value;

use crate::domain::error::TrendstopError;
use crate::domain::normalize::{SourceKind, from_kraken, kraken_records};
use crate::domain::series::OhlcSeries;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Price {
    pub last: f64,
    pub change: f64,
    pub change_pct: f64,
}

/// Avanza quote: `{"lastPrice", "change", "changePercent"}`.
pub fn from_avanza_quote(payload: &Value) -> Result<Price, TrendstopError> {
    let kind = SourceKind::Avanza;
    Ok(Price {
        last: number(kind, payload, "lastPrice")?,
        change: number(kind, payload, "change")?,
        change_pct: number(kind, payload, "changePercent")?,
    })
}

/// CMC quote: mid of `buy` and `sell`, with the movement fields as given.
pub fn from_cmc_quote(payload: &Value) -> Result<Price, TrendstopError> {
    let kind = SourceKind::Cmc;
    let buy = number(kind, payload, "buy")?;
    let sell = number(kind, payload, "sell")?;
    Ok(Price {
        last: (buy + sell) / 2.0,
        change: number(kind, payload, "movement_point")?,
        change_pct: number(kind, payload, "movement_percentage")?,
    })
}

/// Kraken has no quote endpoint: the payload is the last 24 hourly OHLC rows
/// and the change runs from the first row's close to the last row's close.
pub fn from_kraken_hourly(payload: &Value) -> Result<Price, TrendstopError> {
    let label = SourceKind::Kraken.label();
    let rows = kraken_records(payload)?;
    let (Some(first), Some(last)) = (rows.first(), rows.last()) else {
        return Err(TrendstopError::feed(label, "no hourly rows in price payload"));
    };

    change_between(label, from_kraken(first)?.close, from_kraken(last)?.close)
}

/// Last close against the one before it, for feeds without a quote.
pub fn from_daily_closes(series: &OhlcSeries, origin: &str) -> Result<Price, TrendstopError> {
    match series.bars() {
        [.., previous, last] => change_between(origin, previous.close, last.close),
        bars => Err(TrendstopError::InsufficientHistory {
            rows: bars.len(),
            periods: 1,
        }),
    }
}

fn change_between(origin: &str, then: f64, now: f64) -> Result<Price, TrendstopError> {
    if then == 0.0 {
        return Err(TrendstopError::feed(origin, "zero reference price"));
    }
    let change = now - then;
    Ok(Price {
        last: now,
        change,
        change_pct: change / then * 100.0,
    })
}

/// Degiro chart summary under `series[0].data`. `absDiff` and `relDiff` come
/// back null when zero; `relDiff` is a fraction.
pub fn from_degiro_quote(payload: &Value) -> Result<Price, TrendstopError> {
    let kind = SourceKind::Degiro;
    let data = payload
        .get("series")
        .and_then(|s| s.get(0))
        .and_then(|s| s.get("data"))
        .ok_or_else(|| TrendstopError::feed(kind.label(), "unexpected price payload shape"))?;

    Ok(Price {
        last: number(kind, data, "lastPrice")?,
        change: optional_number(kind, data, "absDiff")?.unwrap_or(0.0),
        change_pct: optional_number(kind, data, "relDiff")?.unwrap_or(0.0) * 100.0,
    })
}

fn number(kind: SourceKind, data: &Value, key: &str) -> Result<f64, TrendstopError> {
    optional_number(kind, data, key)?
        .ok_or_else(|| TrendstopError::feed(kind.label(), format!("missing `{key}` in price payload")))
}

fn optional_number(kind: SourceKind, data: &Value, key: &str) -> Result<Option<f64>, TrendstopError> {
    match data.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_f64()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or_else(|| {
                TrendstopError::feed(kind.label(), format!("invalid `{key}` in price payload: {value}"))
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use serde_json::json;

    #[test]
    fn avanza_fields_pass_through() {
        let price = from_avanza_quote(&json!({
            "lastPrice": 182.5, "change": -1.5, "changePercent": -0.81
        }))
        .unwrap();
        assert_eq!(price, Price { last: 182.5, change: -1.5, change_pct: -0.81 });
    }

    #[test]
    fn cmc_uses_mid_price() {
        let price = from_cmc_quote(&json!({
            "buy": 101.0, "sell": 100.0, "movement_point": 0.75, "movement_percentage": 0.74
        }))
        .unwrap();
        assert_eq!(price.last, 100.5);
        assert_eq!(price.change, 0.75);
        assert_eq!(price.change_pct, 0.74);
    }

    #[test]
    fn cmc_missing_side_is_feed_error() {
        let err = from_cmc_quote(&json!({"buy": 1.0, "movement_point": 0.0})).unwrap_err();
        assert!(matches!(err, TrendstopError::Feed { ref reason, .. } if reason.contains("sell")));
    }

    #[test]
    fn kraken_change_over_hourly_closes() {
        let payload = json!({
            "error": [],
            "result": {
                "XETHZEUR": [
                    [1630540800, "2000.0", "2010.0", "1990.0", "2000.0", "0", "0", 0],
                    [1630544400, "2000.0", "2050.0", "1995.0", "2040.0", "0", "0", 0],
                    [1630548000, "2040.0", "2060.0", "2030.0", "2050.0", "0", "0", 0]
                ],
                "last": 1630548000
            }
        });
        let price = from_kraken_hourly(&payload).unwrap();
        assert_eq!(price.last, 2050.0);
        assert_eq!(price.change, 50.0);
        assert_abs_diff_eq!(price.change_pct, 2.5, epsilon = 1e-12);
    }

    #[test]
    fn kraken_empty_or_erroring_payload_fails() {
        let empty = json!({"error": [], "result": {"XETHZEUR": [], "last": 0}});
        assert!(matches!(from_kraken_hourly(&empty), Err(TrendstopError::Feed { .. })));

        let failed = json!({"error": ["EQuery:Unknown asset pair"]});
        assert!(matches!(from_kraken_hourly(&failed), Err(TrendstopError::Feed { .. })));
    }

    #[test]
    fn daily_closes_need_two_bars() {
        use crate::domain::bar::Bar;
        use chrono::NaiveDate;

        let day = |d| NaiveDate::from_ymd_opt(2024, 3, d).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let series = OhlcSeries::from_bars(vec![
            Bar::new(day(4), 10.0, 11.0, 9.0, 10.0),
            Bar::new(day(5), 10.0, 12.0, 9.5, 11.0),
        ])
        .unwrap();

        let price = from_daily_closes(&series, "KR").unwrap();
        assert_eq!(price.last, 11.0);
        assert_eq!(price.change, 1.0);
        assert_abs_diff_eq!(price.change_pct, 10.0, epsilon = 1e-12);

        assert!(matches!(
            from_daily_closes(&series.tail(1), "KR"),
            Err(TrendstopError::InsufficientHistory { rows: 1, periods: 1 })
        ));
    }

    #[test]
    fn degiro_null_diffs_are_zero() {
        let price = from_degiro_quote(&json!({
            "series": [{"data": {"lastPrice": 310.2, "absDiff": null, "relDiff": null}}]
        }))
        .unwrap();
        assert_eq!(price, Price { last: 310.2, change: 0.0, change_pct: 0.0 });
    }

    #[test]
    fn degiro_relative_diff_is_a_fraction() {
        let price = from_degiro_quote(&json!({
            "series": [{"data": {"lastPrice": 102.0, "absDiff": 2.0, "relDiff": 0.02}}]
        }))
        .unwrap();
        assert_abs_diff_eq!(price.change_pct, 2.0, epsilon = 1e-12);
    }
}
