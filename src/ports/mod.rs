//! Port traits: the seams between domain logic and I/O.

pub mod asset_cache_port;
pub mod clock_port;
pub mod config_port;
pub mod data_feed_port;
pub mod payload_port;
