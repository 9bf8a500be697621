//! Builds the feed registry from the `[feeds]` config section.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::adapters::csv_feed_adapter::CsvFeedAdapter;
use crate::adapters::json_payload_adapter::JsonPayloadAdapter;
use crate::adapters::source_feed::SourceFeed;
use crate::domain::asset::Source;
use crate::domain::error::TrendstopError;
use crate::domain::feed_registry::FeedRegistry;
use crate::ports::config_port::ConfigPort;
use crate::ports::payload_port::PayloadPort;

/// `payload_dir` serves every source through its native payload format;
/// otherwise `csv_dir` is required and serves every source from daily CSV files.
pub fn registry_from_config(config: &dyn ConfigPort) -> Result<FeedRegistry, TrendstopError> {
    if let Ok(dir) = config.require_string("feeds", "payload_dir") {
        info!(dir = %dir, "serving feeds from captured payloads");
        return Ok(payload_registry(Arc::new(JsonPayloadAdapter::new(dir))));
    }

    let dir = PathBuf::from(config.require_string("feeds", "csv_dir")?);
    info!(dir = %dir.display(), "serving feeds from csv files");
    Ok(csv_registry(dir))
}

pub fn payload_registry(payloads: Arc<dyn PayloadPort>) -> FeedRegistry {
    let mut registry = FeedRegistry::new();
    for source in Source::ALL {
        registry.register(source, Arc::new(SourceFeed::new(source, payloads.clone())));
    }
    registry
}

pub fn csv_registry(dir: PathBuf) -> FeedRegistry {
    let mut registry = FeedRegistry::new();
    for source in Source::ALL {
        registry.register(source, Arc::new(CsvFeedAdapter::new(source, dir.clone())));
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    #[test]
    fn payload_dir_registers_all_sources() {
        let config = FileConfigAdapter::from_string("[feeds]\npayload_dir = /tmp/payloads\n").unwrap();
        let registry = registry_from_config(&config).unwrap();
        for source in Source::ALL {
            assert!(registry.feed(source).is_ok(), "{source}");
        }
    }

    #[test]
    fn csv_dir_is_the_fallback() {
        let config =
            FileConfigAdapter::from_string("[feeds]\npayload_dir =\ncsv_dir = /tmp/csv\n").unwrap();
        let registry = registry_from_config(&config).unwrap();
        for source in Source::ALL {
            assert!(registry.feed(source).is_ok(), "{source}");
        }
    }

    #[test]
    fn missing_feed_dirs_is_config_error() {
        let config = FileConfigAdapter::from_string("[feeds]\ncsv_dir =  \n").unwrap();
        assert!(matches!(
            registry_from_config(&config),
            Err(TrendstopError::ConfigMissing { section, key }) if section == "feeds" && key == "csv_dir"
        ));
    }
}
