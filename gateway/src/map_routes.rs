//! Map routes - merged rows, render state and styled polygons
//!
//! - `GET /map-data?year=&metrics=` merged country-year rows
//! - `GET /choropleth?year=&metrics=&cb=&alt=` render state
//! - `GET /choropleth/geojson?...` country polygons with the render state applied
//! - `GET /indicators` metric catalog
//! - `GET /snapshot/cache`, `POST /snapshot/cache/clear` forecast cache control

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use choropleth::{refresh, CountryLayer, RenderRequest, RenderState};
use geojson::FeatureCollection;
use map_data::{CountryYearRow, Metric, MetricFamily, MetricSet};
use serde::{Deserialize, Serialize};

use crate::AppState;

pub fn map_routes(state: AppState) -> Router {
    Router::new()
        .route("/map-data", get(get_map_data))
        .route("/choropleth", get(get_choropleth))
        .route("/choropleth/geojson", get(get_choropleth_geojson))
        .route("/indicators", get(list_indicators))
        .route("/snapshot/cache", get(get_cache_stats))
        .route("/snapshot/cache/clear", post(clear_cache))
        .with_state(state)
}

// ========== Request/Response Types ==========

#[derive(Deserialize, Default)]
pub struct MapQuery {
    pub year: Option<i32>,
    pub metrics: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct ChoroplethQuery {
    pub year: Option<i32>,
    pub metrics: Option<String>,
    /// Colour-blind mode
    pub cb: Option<bool>,
    /// Alternate colour-blind palette
    pub alt: Option<bool>,
}

#[derive(Serialize)]
pub struct IndicatorInfo {
    pub key: Metric,
    pub label: &'static str,
    pub description: &'static str,
    pub family: MetricFamily,
    pub selectable: bool,
}

#[derive(Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub ttl_secs: u64,
}

type ApiError = (StatusCode, String);

// ========== Helpers ==========

fn parse_metrics(raw: Option<&str>) -> Result<MetricSet, ApiError> {
    match raw {
        Some(raw) => MetricSet::parse(raw).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string())),
        None => Ok(MetricSet::default()),
    }
}

/// Run the merge on the blocking pool; it reads the store and the snapshot from disk
async fn merged_rows(state: &AppState, year: i32, metrics: MetricSet) -> Result<Vec<CountryYearRow>, ApiError> {
    let engine = state.engine.clone();
    tokio::task::spawn_blocking(move || engine.merge_rows(year, &metrics))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(|e| {
            tracing::error!("Merge failed for {}: {}", year, e);
            (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
        })
}

async fn render_state(state: &AppState, query: &ChoroplethQuery) -> Result<RenderState, ApiError> {
    let year = query.year.unwrap_or(state.engine.boundary_year());
    let metrics = parse_metrics(query.metrics.as_deref())?;
    let rows = merged_rows(state, year, metrics.clone()).await?;

    let request = RenderRequest::new(year, metrics)
        .with_color_blind(query.cb.unwrap_or(false), query.alt.unwrap_or(false));
    Ok(refresh(&rows, &request, state.engine.boundary_year()))
}

// ========== Route Handlers ==========

/// Merged rows for one year
pub async fn get_map_data(
    State(state): State<AppState>,
    Query(query): Query<MapQuery>,
) -> Result<Json<Vec<CountryYearRow>>, ApiError> {
    let year = query.year.unwrap_or(state.engine.boundary_year());
    let metrics = parse_metrics(query.metrics.as_deref())?;
    let rows = merged_rows(&state, year, metrics).await?;
    Ok(Json(rows))
}

pub async fn get_choropleth(
    State(state): State<AppState>,
    Query(query): Query<ChoroplethQuery>,
) -> Result<Json<RenderState>, ApiError> {
    Ok(Json(render_state(&state, &query).await?))
}

/// Country polygons styled for the requested view
pub async fn get_choropleth_geojson(
    State(state): State<AppState>,
    Query(query): Query<ChoroplethQuery>,
) -> Result<Json<FeatureCollection>, ApiError> {
    let render = render_state(&state, &query).await?;

    let path = state.geojson_path.clone();
    let layer = tokio::task::spawn_blocking(move || CountryLayer::load(path))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(|e| {
            tracing::warn!("Country layer unavailable: {}", e);
            (StatusCode::BAD_GATEWAY, e.to_string())
        })?;

    Ok(Json(layer.styled(&render)))
}

pub async fn list_indicators() -> Json<Vec<IndicatorInfo>> {
    let indicators = Metric::ALL
        .iter()
        .map(|m| IndicatorInfo {
            key: *m,
            label: m.label(),
            description: m.description(),
            family: m.family(),
            selectable: m.is_selectable(),
        })
        .collect();
    Json(indicators)
}

pub async fn get_cache_stats(State(state): State<AppState>) -> Json<CacheStats> {
    let cache = state.engine.cache();
    let (total, valid) = cache.stats();
    Json(CacheStats {
        total_entries: total,
        valid_entries: valid,
        ttl_secs: cache.ttl().as_secs(),
    })
}

/// Drop every cached snapshot; the next forecast request re-reads the file
pub async fn clear_cache(State(state): State<AppState>) -> Json<CacheStats> {
    state.engine.cache().clear();
    tracing::info!("Forecast snapshot cache cleared");
    get_cache_stats(State(state)).await
}
