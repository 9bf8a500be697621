//! Raw payload port trait.

use serde_json::Value;

use crate::domain::asset::Source;
use crate::domain::error::TrendstopError;
use crate::domain::resolution::Resolution;

/// Delivers upstream responses in each source's native JSON shape.
pub trait PayloadPort: Send + Sync {
    fn fetch_bars(
        &self,
        source: Source,
        source_id: &str,
        resolution: Resolution,
    ) -> Result<Value, TrendstopError>;

    fn fetch_metadata(&self, source: Source, source_id: &str) -> Result<Value, TrendstopError>;

    /// Quote payload; for Kraken the last day of hourly bars.
    fn fetch_price(&self, source: Source, source_id: &str) -> Result<Value, TrendstopError>;
}
