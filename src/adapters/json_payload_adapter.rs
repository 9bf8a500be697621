//! Captured upstream payloads read from disk.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::domain::asset::Source;
use crate::domain::error::TrendstopError;
use crate::domain::resolution::Resolution;
use crate::ports::payload_port::PayloadPort;

/// Serves `<dir>/<PREFIX>_<source_id>_<resolution>.json` for bars,
/// `<dir>/<PREFIX>_<source_id>_name.json` for metadata and
/// `<dir>/<PREFIX>_<source_id>_price.json` for quotes.
pub struct JsonPayloadAdapter {
    base_path: PathBuf,
}

impl JsonPayloadAdapter {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn bars_path(&self, source: Source, source_id: &str, resolution: Resolution) -> PathBuf {
        self.base_path
            .join(format!("{}_{}_{}.json", source.prefix(), source_id, resolution))
    }

    pub fn metadata_path(&self, source: Source, source_id: &str) -> PathBuf {
        self.base_path
            .join(format!("{}_{}_name.json", source.prefix(), source_id))
    }

    pub fn price_path(&self, source: Source, source_id: &str) -> PathBuf {
        self.base_path
            .join(format!("{}_{}_price.json", source.prefix(), source_id))
    }

    fn read(source: Source, path: &Path) -> Result<Value, TrendstopError> {
        debug!(%source, path = %path.display(), "reading payload");
        let content = fs::read_to_string(path).map_err(|e| {
            TrendstopError::feed(
                source.prefix(),
                format!("failed to read {}: {}", path.display(), e),
            )
        })?;
        serde_json::from_str(&content).map_err(|e| {
            TrendstopError::feed(
                source.prefix(),
                format!("invalid JSON in {}: {}", path.display(), e),
            )
        })
    }
}

impl PayloadPort for JsonPayloadAdapter {
    fn fetch_bars(
        &self,
        source: Source,
        source_id: &str,
        resolution: Resolution,
    ) -> Result<Value, TrendstopError> {
        Self::read(source, &self.bars_path(source, source_id, resolution))
    }

    fn fetch_metadata(&self, source: Source, source_id: &str) -> Result<Value, TrendstopError> {
        Self::read(source, &self.metadata_path(source, source_id))
    }

    fn fetch_price(&self, source: Source, source_id: &str) -> Result<Value, TrendstopError> {
        Self::read(source, &self.price_path(source, source_id))
    }
}
