use anyhow::Result;
use axum::{routing::get, Json, Router};
use map_data::{FileSnapshotSource, JsonFileStore, MergeEngine, TtlSnapshotCache};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod country_routes;
mod map_routes;

use config::GatewayConfig;

#[derive(Clone)]
pub struct AppState {
    pub engine: MergeEngine,
    pub geojson_path: PathBuf,
}

impl AppState {
    pub fn from_config(config: &GatewayConfig) -> Self {
        let store = Arc::new(JsonFileStore::new(&config.dataset_path));
        let snapshots = Arc::new(FileSnapshotSource::new(config.snapshot_candidates.clone()));
        let cache = Arc::new(TtlSnapshotCache::new(config.snapshot_ttl));

        Self {
            engine: MergeEngine::new(store, snapshots, cache).with_boundary_year(config.boundary_year),
            geojson_path: config.geojson_path.clone(),
        }
    }
}

/// API router, with the UI mounted at `/` when its build directory exists
pub fn app(state: AppState, ui_dir: Option<&Path>) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health))
        .nest(
            "/api",
            map_routes::map_routes(state.clone()).merge(country_routes::country_routes(state)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    match ui_dir {
        Some(ui_path) if ui_path.exists() => {
            tracing::info!("   Serving UI from {}", ui_path.display());
            api_routes.nest_service("/", ServeDir::new(ui_path))
        }
        Some(ui_path) => {
            tracing::warn!("   UI not built - {} does not exist", ui_path.display());
            api_routes
        }
        None => api_routes,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "atlas_gateway=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = GatewayConfig::from_env()?;
    let state = AppState::from_config(&config);

    tracing::info!("   Dataset: {}", config.dataset_path.display());
    tracing::info!(
        "   Forecast snapshot candidates: {}",
        config
            .snapshot_candidates
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    tracing::info!(
        "   Boundary year {} (later years are forecasts), snapshot TTL {}s",
        config.boundary_year,
        config.snapshot_ttl.as_secs()
    );

    let app = app(state, Some(&config.ui_dir));

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Atlas Gateway starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "atlas-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
