//! Source → data feed lookup, plus asset resolution through the cache.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::domain::asset::{Asset, Source};
use crate::domain::error::TrendstopError;
use crate::ports::asset_cache_port::AssetCachePort;
use crate::ports::data_feed_port::DataFeedPort;

/// Long-lived feeds keyed by source. Cloning shares the feeds.
#[derive(Clone, Default)]
pub struct FeedRegistry {
    feeds: HashMap<Source, Arc<dyn DataFeedPort>>,
}

impl FeedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, source: Source, feed: Arc<dyn DataFeedPort>) {
        self.feeds.insert(source, feed);
    }

    pub fn with(mut self, source: Source, feed: Arc<dyn DataFeedPort>) -> Self {
        self.register(source, feed);
        self
    }

    pub fn feed(&self, source: Source) -> Result<&Arc<dyn DataFeedPort>, TrendstopError> {
        self.feeds.get(&source).ok_or_else(|| {
            TrendstopError::feed(source.prefix(), "no data feed configured for source")
        })
    }
}

impl std::fmt::Debug for FeedRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedRegistry")
            .field("sources", &self.feeds.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Looks the asset up in the cache; on a miss asks its feed for the name and
/// stores the result.
pub fn resolve_asset(
    fqn_id: &str,
    cache: &dyn AssetCachePort,
    registry: &FeedRegistry,
) -> Result<Asset, TrendstopError> {
    let (source, source_id) = Asset::parse_fqn_id(fqn_id)?;

    if let Some(asset) = cache.get(fqn_id) {
        debug!(asset_id = fqn_id, "found in cache");
        return Ok(asset);
    }

    debug!(asset_id = fqn_id, "not cached, asking the feed for its name");
    let name = registry.feed(source)?.retrieve_asset_name(&source_id)?;
    let asset = Asset::new(source, source_id).with_name(name);
    cache.put(asset.clone());
    Ok(asset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price::Price;
    use crate::domain::resolution::Resolution;
    use crate::domain::series::OhlcSeries;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NamedFeed {
        calls: AtomicUsize,
    }

    impl DataFeedPort for NamedFeed {
        fn retrieve_ohlc(&self, _: &str, _: Resolution) -> Result<OhlcSeries, TrendstopError> {
            Ok(OhlcSeries::empty())
        }

        fn retrieve_asset_name(&self, source_id: &str) -> Result<String, TrendstopError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("Name of {source_id}"))
        }

        fn retrieve_price(&self, _: &str) -> Result<Price, TrendstopError> {
            Err(TrendstopError::feed("test", "no quotes"))
        }
    }

    #[derive(Default)]
    struct VecCache(Mutex<Vec<Asset>>);

    impl AssetCachePort for VecCache {
        fn get(&self, fqn_id: &str) -> Option<Asset> {
            self.0
                .lock()
                .unwrap()
                .iter()
                .find(|a| a.fqn_id() == fqn_id)
                .cloned()
        }

        fn put(&self, asset: Asset) {
            self.0.lock().unwrap().push(asset);
        }
    }

    #[test]
    fn missing_feed_is_a_feed_error() {
        let registry = FeedRegistry::new();
        assert!(matches!(
            registry.feed(Source::Kraken),
            Err(TrendstopError::Feed { origin, .. }) if origin == "KR"
        ));
    }

    #[test]
    fn resolve_asset_fetches_once_then_hits_cache() {
        let feed = Arc::new(NamedFeed {
            calls: AtomicUsize::new(0),
        });
        let registry = FeedRegistry::new().with(Source::Avanza, feed.clone());
        let cache = VecCache::default();

        let first = resolve_asset("AV:5269", &cache, &registry).unwrap();
        let second = resolve_asset("AV:5269", &cache, &registry).unwrap();

        assert_eq!(first.name.as_deref(), Some("Name of 5269"));
        assert_eq!(first, second);
        assert_eq!(feed.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn resolve_asset_rejects_bad_id() {
        let cache = VecCache::default();
        assert!(matches!(
            resolve_asset("nonsense", &cache, &FeedRegistry::new()),
            Err(TrendstopError::InvalidAssetId(_))
        ));
    }
}
