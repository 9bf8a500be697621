//! HTTP API adapter.
//!
//! JSON endpoints for prices and trailing stops, and a plain-text
//! correlation matrix.

mod error;
mod handlers;

pub use error::WebError;
pub use handlers::*;

use axum::{Router, routing::get};
use std::sync::Arc;

use crate::domain::feed_registry::FeedRegistry;
use crate::domain::strategy::StrategySettings;
use crate::ports::asset_cache_port::AssetCachePort;
use crate::ports::clock_port::ClockPort;

pub struct AppState {
    pub registry: FeedRegistry,
    pub cache: Arc<dyn AssetCachePort>,
    pub settings: StrategySettings,
    pub clock: Arc<dyn ClockPort>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health))
        .route("/price/{fqn_id}", get(handlers::price))
        .route("/price_bulk", get(handlers::price_bulk))
        .route("/stop_loss_atr/{fqn_id}", get(handlers::stop_loss_atr))
        .route("/stop_loss_atr_bulk", get(handlers::stop_loss_atr_bulk))
        .route("/correlations", get(handlers::correlations))
        .fallback(handlers::not_found)
        .with_state(Arc::new(state))
}
