//! Daily CSV file data feed.

use crate::domain::asset::Source;
use crate::domain::bar::Bar;
use crate::domain::error::TrendstopError;
use crate::domain::price::{Price, from_daily_closes};
use crate::domain::resample::resample;
use crate::domain::resolution::Resolution;
use crate::domain::series::OhlcSeries;
use crate::ports::data_feed_port::DataFeedPort;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Reads `<base>/<PREFIX>_<source_id>.csv` with a `date,open,high,low,close`
/// header and resamples locally.
pub struct CsvFeedAdapter {
    source: Source,
    base_path: PathBuf,
}

impl CsvFeedAdapter {
    pub fn new(source: Source, base_path: PathBuf) -> Self {
        Self { source, base_path }
    }

    fn csv_path(&self, source_id: &str) -> PathBuf {
        self.base_path
            .join(format!("{}_{}.csv", self.source.prefix(), source_id))
    }

    fn read_daily(&self, source_id: &str) -> Result<OhlcSeries, TrendstopError> {
        let path = self.csv_path(source_id);
        let content = fs::read_to_string(&path).map_err(|e| {
            TrendstopError::feed(
                self.source.prefix(),
                format!("failed to read {}: {}", path.display(), e),
            )
        })?;

        let daily = read_daily_csv(&content, self.source.prefix())?;
        debug!(source = %self.source, source_id, rows = daily.len(), "loaded csv");
        Ok(daily)
    }
}

/// Parses a daily CSV with a header row into a series.
pub fn read_daily_csv(content: &str, origin: &str) -> Result<OhlcSeries, TrendstopError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());
    let mut bars = Vec::new();

    for result in rdr.records() {
        let record = result
            .map_err(|e| TrendstopError::malformed(origin, format!("CSV parse error: {e}")))?;
        bars.push(Bar::from_csv_record(&record)?);
    }

    OhlcSeries::from_bars(bars)
}

impl DataFeedPort for CsvFeedAdapter {
    fn retrieve_ohlc(
        &self,
        source_id: &str,
        resolution: Resolution,
    ) -> Result<OhlcSeries, TrendstopError> {
        Ok(resample(&self.read_daily(source_id)?, resolution))
    }

    fn retrieve_asset_name(&self, source_id: &str) -> Result<String, TrendstopError> {
        Ok(source_id.to_string())
    }

    /// Files hold daily bars only, so the change is close to close.
    fn retrieve_price(&self, source_id: &str) -> Result<Price, TrendstopError> {
        from_daily_closes(&self.read_daily(source_id)?, self.source.prefix())
    }
}
