//! HTTP request handlers for web adapter.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

use crate::domain::asset::parse_fqn_list;
use crate::domain::portfolio::{
    AssetPrice, AssetStop, correlations_for_ids, price_for_id, prices_for_ids, stop_for_id,
    stops_for_ids,
};
use crate::domain::price::Price;

use super::{AppState, WebError};

pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

pub async fn price(
    State(state): State<Arc<AppState>>,
    Path(fqn_id): Path<String>,
) -> Result<Json<Price>, WebError> {
    info!(asset_id = %fqn_id, "price requested");
    Ok(Json(price_for_id(&fqn_id, state.cache.as_ref(), &state.registry)?))
}

pub async fn price_bulk(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BulkQuery>,
) -> Json<Vec<AssetPrice>> {
    let ids = parse_fqn_list(&query.p);
    Json(prices_for_ids(&ids, state.cache.as_ref(), &state.registry))
}

pub async fn stop_loss_atr(
    State(state): State<Arc<AppState>>,
    Path(fqn_id): Path<String>,
) -> Result<Json<f64>, WebError> {
    info!(asset_id = %fqn_id, "stop loss requested");
    let stop = stop_for_id(
        &fqn_id,
        state.cache.as_ref(),
        &state.registry,
        &state.settings,
        state.clock.now(),
    )?;
    Ok(Json(stop))
}

#[derive(Debug, Deserialize)]
pub struct BulkQuery {
    pub p: String,
}

pub async fn stop_loss_atr_bulk(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BulkQuery>,
) -> Json<Vec<AssetStop>> {
    let ids = parse_fqn_list(&query.p);
    Json(stops_for_ids(
        &ids,
        state.cache.as_ref(),
        &state.registry,
        &state.settings,
        state.clock.now(),
    ))
}

#[derive(Debug, Deserialize)]
pub struct CorrelationQuery {
    pub p: String,
    #[serde(default)]
    pub e: String,
}

pub async fn correlations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CorrelationQuery>,
) -> Result<impl IntoResponse, WebError> {
    let portfolio = parse_fqn_list(&query.p);
    if portfolio.is_empty() {
        return Err(WebError::bad_request("no portfolio assets given"));
    }
    let external = parse_fqn_list(&query.e);

    let matrix = correlations_for_ids(
        &portfolio,
        &external,
        state.cache.as_ref(),
        &state.registry,
    )?;
    let csv = matrix.to_csv(b';')?;

    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], csv))
}

pub async fn not_found() -> WebError {
    WebError::not_found("Not Found")
}
