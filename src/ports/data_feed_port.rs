//! Data feed port trait.

use crate::domain::error::TrendstopError;
use crate::domain::price::Price;
use crate::domain::resolution::Resolution;
use crate::domain::series::OhlcSeries;

/// A source of canonical OHLC series for the instruments of one upstream.
pub trait DataFeedPort: Send + Sync {
    /// Bars for `source_id` at `resolution`, ascending and unique by time.
    fn retrieve_ohlc(
        &self,
        source_id: &str,
        resolution: Resolution,
    ) -> Result<OhlcSeries, TrendstopError>;

    fn retrieve_asset_name(&self, source_id: &str) -> Result<String, TrendstopError>;

    fn retrieve_price(&self, source_id: &str) -> Result<Price, TrendstopError>;
}
