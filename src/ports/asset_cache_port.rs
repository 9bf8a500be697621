//! Asset metadata cache port trait.

use crate::domain::asset::Asset;

pub trait AssetCachePort: Send + Sync {
    fn get(&self, fqn_id: &str) -> Option<Asset>;
    fn put(&self, asset: Asset);
}
