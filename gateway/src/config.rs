//! Gateway configuration, read once from the environment at start-up

use map_data::snapshot::DEFAULT_CANDIDATES;
use map_data::{LAST_ACTUAL_YEAR, SNAPSHOT_TTL_SECS};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{var} must be a number, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    pub port: u16,
    /// Dataset JSON backing the score store
    pub dataset_path: PathBuf,
    /// Forecast snapshot lookup order
    pub snapshot_candidates: Vec<PathBuf>,
    pub boundary_year: i32,
    pub snapshot_ttl: Duration,
    /// Country polygons for the styled GeoJSON route
    pub geojson_path: PathBuf,
    pub ui_dir: PathBuf,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: 18620,
            dataset_path: PathBuf::from("data/atlas.json"),
            snapshot_candidates: DEFAULT_CANDIDATES.iter().map(PathBuf::from).collect(),
            boundary_year: LAST_ACTUAL_YEAR,
            snapshot_ttl: Duration::from_secs(SNAPSHOT_TTL_SECS),
            geojson_path: PathBuf::from("public/geo/ne_countries.geojson"),
            ui_dir: PathBuf::from("ui/dist"),
        }
    }
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(port) = lookup("ATLAS_GATEWAY_PORT").or_else(|| lookup("PORT")) {
            config.port = parse_number("ATLAS_GATEWAY_PORT", &port)?;
        }
        if let Some(path) = lookup("ATLAS_DATASET_PATH") {
            config.dataset_path = PathBuf::from(path);
        }
        if let Some(paths) = lookup("ATLAS_PREDICTIONS_PATH") {
            let candidates: Vec<PathBuf> = paths
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from)
                .collect();
            if !candidates.is_empty() {
                config.snapshot_candidates = candidates;
            }
        }
        if let Some(year) = lookup("ATLAS_BOUNDARY_YEAR") {
            config.boundary_year = parse_number("ATLAS_BOUNDARY_YEAR", &year)?;
        }
        if let Some(secs) = lookup("ATLAS_SNAPSHOT_TTL_SECS") {
            config.snapshot_ttl = Duration::from_secs(parse_number("ATLAS_SNAPSHOT_TTL_SECS", &secs)?);
        }
        if let Some(path) = lookup("ATLAS_GEOJSON_PATH") {
            config.geojson_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("ATLAS_UI_DIR") {
            config.ui_dir = PathBuf::from(path);
        }

        Ok(config)
    }
}

fn parse_number<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        var,
        value: value.to_string(),
    })
}
