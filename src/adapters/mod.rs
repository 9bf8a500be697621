//! Concrete adapter implementations for ports.

pub mod csv_feed_adapter;
pub mod feed_factory;
pub mod file_config_adapter;
pub mod json_payload_adapter;
pub mod memory_asset_cache;
pub mod source_feed;
pub mod system_clock;
#[cfg(feature = "web")]
pub mod web;
