//! Time-ordered OHLC series, the tabular form every computation consumes.

use chrono::NaiveDateTime;

use crate::domain::bar::{barset_to_sorted_vec, Bar, BarSet};
use crate::domain::error::TrendstopError;

/// Bars with strictly increasing, unique timestamps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OhlcSeries {
    bars: Vec<Bar>,
}

impl OhlcSeries {
    pub fn empty() -> Self {
        Self { bars: Vec::new() }
    }

    /// Projects a bar set to a series. Fails on two bars sharing a timestamp,
    /// since a set already collapsed fully identical ones.
    pub fn from_barset(barset: &BarSet) -> Result<Self, TrendstopError> {
        Self::from_bars(barset_to_sorted_vec(barset))
    }

    /// Sorts `bars` by time; fails on duplicate timestamps.
    pub fn from_bars(mut bars: Vec<Bar>) -> Result<Self, TrendstopError> {
        bars.sort_by_key(|b| b.time);
        if let Some(pair) = bars.windows(2).find(|w| w[0].time == w[1].time) {
            return Err(TrendstopError::DuplicateTimestamp { time: pair[0].time });
        }
        Ok(Self { bars })
    }

    /// Wraps bars the caller already knows to be strictly ascending.
    pub(crate) fn from_sorted_unchecked(bars: Vec<Bar>) -> Self {
        debug_assert!(bars.windows(2).all(|w| w[0].time < w[1].time));
        Self { bars }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn times(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        self.bars.iter().map(|b| b.time)
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn get(&self, time: NaiveDateTime) -> Option<&Bar> {
        self.bars
            .binary_search_by_key(&time, |b| b.time)
            .ok()
            .map(|i| &self.bars[i])
    }

    /// Last `n` rows (all rows when shorter).
    pub fn tail(&self, n: usize) -> Self {
        let start = self.bars.len().saturating_sub(n);
        Self {
            bars: self.bars[start..].to_vec(),
        }
    }

    /// Every row except the most recent one.
    pub fn without_last(&self) -> Self {
        let end = self.bars.len().saturating_sub(1);
        Self {
            bars: self.bars[..end].to_vec(),
        }
    }

    pub fn to_barset(&self) -> BarSet {
        self.bars.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::barset_from_csv_string;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn upward_trend() -> BarSet {
        barset_from_csv_string(
            "2021-01-03 00:00:00,12,14,11,13
             2021-01-01 00:00:00,10,12,9,11
             2021-01-04 00:00:00,13,15,12,14
             2021-01-02 00:00:00,11,13,10,12",
        )
        .unwrap()
    }

    #[test]
    fn from_barset_sorts_ascending() {
        let series = OhlcSeries::from_barset(&upward_trend()).unwrap();
        let times: Vec<_> = series.times().collect();
        assert_eq!(
            times,
            vec![at(2021, 1, 1), at(2021, 1, 2), at(2021, 1, 3), at(2021, 1, 4)]
        );
        assert_eq!(series.closes(), vec![11.0, 12.0, 13.0, 14.0]);
    }

    #[test]
    fn round_trip_preserves_every_bar() {
        let barset = upward_trend();
        let series = OhlcSeries::from_barset(&barset).unwrap();
        assert_eq!(series.to_barset(), barset);
        assert_eq!(series.len(), barset.len());
    }

    #[test]
    fn duplicate_timestamp_is_rejected() {
        let bars = vec![
            Bar::new(at(2021, 1, 1), 1.0, 2.0, 0.5, 1.5),
            Bar::new(at(2021, 1, 1), 1.0, 2.0, 0.5, 1.6),
        ];
        let err = OhlcSeries::from_bars(bars).unwrap_err();
        assert!(matches!(err, TrendstopError::DuplicateTimestamp { time } if time == at(2021, 1, 1)));
    }

    #[test]
    fn empty_barset_gives_empty_series() {
        let series = OhlcSeries::from_barset(&BarSet::new()).unwrap();
        assert!(series.is_empty());
        assert!(series.without_last().is_empty());
    }

    #[test]
    fn tail_and_without_last() {
        let series = OhlcSeries::from_barset(&upward_trend()).unwrap();
        assert_eq!(series.tail(2).closes(), vec![13.0, 14.0]);
        assert_eq!(series.tail(10).len(), 4);
        assert_eq!(series.without_last().closes(), vec![11.0, 12.0, 13.0]);
    }

    #[test]
    fn get_by_time() {
        let series = OhlcSeries::from_barset(&upward_trend()).unwrap();
        assert_eq!(series.get(at(2021, 1, 2)).map(|b| b.close), Some(12.0));
        assert!(series.get(at(2021, 2, 2)).is_none());
    }
}
