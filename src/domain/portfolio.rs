//! Operations over a list of assets identified by fqn id.

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{error, info};

use crate::domain::asset::Asset;
use crate::domain::correlation::{CorrelationMatrix, portfolio_correlations};
use crate::domain::error::TrendstopError;
use crate::domain::feed_registry::{FeedRegistry, resolve_asset};
use crate::domain::price::Price;
use crate::domain::resolution::Resolution;
use crate::domain::series::OhlcSeries;
use crate::domain::strategy::{StrategySettings, current_stop_for_asset};
use crate::ports::asset_cache_port::AssetCachePort;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetStop {
    pub fqn_id: String,
    pub stop_loss_atr: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetPrice {
    pub fqn_id: String,
    #[serde(flatten)]
    pub price: Price,
}

/// Latest closed-bar stop for one asset id.
pub fn stop_for_id(
    fqn_id: &str,
    cache: &dyn AssetCachePort,
    registry: &FeedRegistry,
    settings: &StrategySettings,
    now: NaiveDateTime,
) -> Result<f64, TrendstopError> {
    let asset = resolve_asset(fqn_id, cache, registry)?;
    current_stop_for_asset(&asset, registry, settings, now)
}

/// Stops for every id in order. Failing assets are logged and left out.
pub fn stops_for_ids(
    fqn_ids: &[String],
    cache: &dyn AssetCachePort,
    registry: &FeedRegistry,
    settings: &StrategySettings,
    now: NaiveDateTime,
) -> Vec<AssetStop> {
    let mut out = Vec::with_capacity(fqn_ids.len());
    for fqn_id in fqn_ids {
        match stop_for_id(fqn_id, cache, registry, settings, now) {
            Ok(stop_loss_atr) => out.push(AssetStop {
                fqn_id: fqn_id.clone(),
                stop_loss_atr,
            }),
            Err(e) => log_skipped(fqn_id, &e),
        }
    }
    info!(requested = fqn_ids.len(), computed = out.len(), "bulk stops done");
    out
}

/// Current price and daily change for one asset id.
pub fn price_for_id(
    fqn_id: &str,
    cache: &dyn AssetCachePort,
    registry: &FeedRegistry,
) -> Result<Price, TrendstopError> {
    let asset = resolve_asset(fqn_id, cache, registry)?;
    let price = registry.feed(asset.source)?.retrieve_price(&asset.source_id)?;
    info!(asset_id = %fqn_id, last = price.last, change_pct = price.change_pct, "retrieved price");
    Ok(price)
}

/// Prices for every id in order. Failing assets are logged and left out.
pub fn prices_for_ids(
    fqn_ids: &[String],
    cache: &dyn AssetCachePort,
    registry: &FeedRegistry,
) -> Vec<AssetPrice> {
    let mut out = Vec::with_capacity(fqn_ids.len());
    for fqn_id in fqn_ids {
        match price_for_id(fqn_id, cache, registry) {
            Ok(price) => out.push(AssetPrice {
                fqn_id: fqn_id.clone(),
                price,
            }),
            Err(e) => log_skipped(fqn_id, &e),
        }
    }
    info!(requested = fqn_ids.len(), computed = out.len(), "bulk prices done");
    out
}

fn log_skipped(fqn_id: &str, e: &TrendstopError) {
    let source = Asset::parse_fqn_id(fqn_id)
        .map(|(source, _)| source.to_string())
        .unwrap_or_default();
    error!(asset_id = %fqn_id, %source, error = %e, "skipping asset");
}

fn daily_closes(
    fqn_ids: &[String],
    cache: &dyn AssetCachePort,
    registry: &FeedRegistry,
) -> Result<Vec<(String, OhlcSeries)>, TrendstopError> {
    fqn_ids
        .iter()
        .map(|fqn_id| {
            let asset = resolve_asset(fqn_id, cache, registry)?;
            let series = registry
                .feed(asset.source)?
                .retrieve_ohlc(&asset.source_id, Resolution::Day)?;
            Ok((asset.label(), series))
        })
        .collect()
}

/// Clustered daily-return correlations of `portfolio`, with `external` ids
/// appended for comparison.
pub fn correlations_for_ids(
    portfolio: &[String],
    external: &[String],
    cache: &dyn AssetCachePort,
    registry: &FeedRegistry,
) -> Result<CorrelationMatrix, TrendstopError> {
    let portfolio = daily_closes(portfolio, cache, registry)?;
    let external = daily_closes(external, cache, registry)?;
    Ok(portfolio_correlations(&portfolio, &external))
}
