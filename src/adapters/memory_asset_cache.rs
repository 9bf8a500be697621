//! Process-local asset cache.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::asset::Asset;
use crate::ports::asset_cache_port::AssetCachePort;

#[derive(Debug, Default)]
pub struct InMemoryAssetCache {
    assets: RwLock<HashMap<String, Asset>>,
}

impl InMemoryAssetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.assets.read().map(|a| a.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AssetCachePort for InMemoryAssetCache {
    fn get(&self, fqn_id: &str) -> Option<Asset> {
        self.assets.read().ok()?.get(fqn_id).cloned()
    }

    fn put(&self, asset: Asset) {
        if let Ok(mut assets) = self.assets.write() {
            assets.insert(asset.fqn_id(), asset);
        }
    }
}
