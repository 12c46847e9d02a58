//! Country routes - raw store access
//!
//! - `GET /countries` every known country
//! - `GET /countries/year/:year` every country with all score columns for one year
//! - `GET /countries-with-score?year=` only countries scored that year (default: current year)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Datelike;
use map_data::{Country, CountryScores, Metric};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::AppState;

pub fn country_routes(state: AppState) -> Router {
    Router::new()
        .route("/countries", get(list_countries))
        .route("/countries/year/:year", get(countries_for_year))
        .route("/countries-with-score", get(countries_with_score))
        .with_state(state)
}

#[derive(Deserialize, Default)]
pub struct ScoredQuery {
    pub year: Option<i32>,
}

pub async fn list_countries(State(state): State<AppState>) -> Result<Json<Vec<Country>>, (StatusCode, String)> {
    let store = state.engine.store().clone();
    let countries = tokio::task::spawn_blocking(move || store.countries())
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(|e| (StatusCode::SERVICE_UNAVAILABLE, e.to_string()))?;

    tracing::debug!("Listing {} countries", countries.len());
    Ok(Json(countries))
}

pub async fn countries_for_year(
    State(state): State<AppState>,
    Path(year): Path<i32>,
) -> Result<Json<Vec<Value>>, (StatusCode, String)> {
    let store = state.engine.store().clone();
    let entries = tokio::task::spawn_blocking(move || store.countries_for_year(year))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(|e| (StatusCode::SERVICE_UNAVAILABLE, e.to_string()))?;

    let flat = entries
        .iter()
        .map(flatten_entry)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(flat))
}

/// Countries with a score record for the year: country fields plus `gmi_score` and `year`
pub async fn countries_with_score(
    State(state): State<AppState>,
    Query(query): Query<ScoredQuery>,
) -> Result<Json<Vec<Value>>, (StatusCode, String)> {
    let year = query.year.unwrap_or_else(|| chrono::Utc::now().year());
    let store = state.engine.store().clone();
    let entries = tokio::task::spawn_blocking(move || store.countries_for_year(year))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(|e| (StatusCode::SERVICE_UNAVAILABLE, e.to_string()))?;

    let mut scored = Vec::new();
    for entry in &entries {
        let Some(score) = &entry.score else {
            continue;
        };
        let mut object = country_object(&entry.country)
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
        object.insert(
            Metric::GmiScore.as_str().to_string(),
            serde_json::json!(score.gmi_score),
        );
        object.insert("year".to_string(), Value::from(score.year));
        scored.push(Value::Object(object));
    }

    tracing::debug!("{} of {} countries scored for {}", scored.len(), entries.len(), year);
    Ok(Json(scored))
}

/// Country fields with the optional ones present as null
fn country_object(country: &Country) -> Result<Map<String, Value>, serde_json::Error> {
    let mut object = match serde_json::to_value(country)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    for key in ["region", "latitude", "longitude"] {
        object.entry(key).or_insert(Value::Null);
    }
    Ok(object)
}

/// Country fields and score columns on one object; columns and `year` are
/// null when the country has no record for the year
fn flatten_entry(entry: &CountryScores) -> Result<Value, serde_json::Error> {
    let mut object = country_object(&entry.country)?;

    match &entry.score {
        Some(score) => {
            if let Value::Object(columns) = serde_json::to_value(score)? {
                object.extend(columns);
            }
        }
        None => {
            for metric in Metric::ALL {
                object.insert(metric.as_str().to_string(), Value::Null);
            }
            object.insert("year".to_string(), Value::Null);
        }
    }

    Ok(Value::Object(object))
}
