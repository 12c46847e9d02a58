//! Render state for one map refresh
//!
//! [`refresh`] turns merged rows and the current view options into
//! everything the map needs: composite scores, source tags, the legend and
//! per-country fills and popups. It is a pure function of its inputs.

use crate::palette::{build_color_ranges, color_for, pick_palette, LegendBand, Palette};
use crate::popup::{ci_text, popup_html};
use crate::scores::{build_matrix, build_scores, CountryScores};
use map_data::{CountryYearRow, MetricSet, Source};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// View options driving a refresh
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub year: i32,
    pub metrics: MetricSet,
    pub color_blind: bool,
    /// Second colour-blind palette family
    pub alternate: bool,
}

impl RenderRequest {
    pub fn new(year: i32, metrics: MetricSet) -> Self {
        Self {
            year,
            metrics,
            color_blind: false,
            alternate: false,
        }
    }

    pub fn with_color_blind(mut self, color_blind: bool, alternate: bool) -> Self {
        self.color_blind = color_blind;
        self.alternate = alternate;
        self
    }
}

/// Display state of one country
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryStyle {
    pub score: Option<f64>,
    pub source: Source,
    pub fill_color: String,
    pub popup: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderState {
    pub year: i32,
    pub boundary_year: i32,
    pub metrics: MetricSet,
    pub palette: Palette,
    pub legend: Vec<LegendBand>,
    pub countries: BTreeMap<String, CountryStyle>,
    #[serde(skip)]
    rows: BTreeMap<String, CountryYearRow>,
    #[serde(skip)]
    scores: CountryScores,
}

impl RenderState {
    /// Source assumed for countries without a row
    pub fn default_source(&self) -> Source {
        Source::for_year(self.year, self.boundary_year)
    }

    pub fn get(&self, iso3: &str) -> Option<&CountryStyle> {
        self.countries.get(&iso3.trim().to_uppercase())
    }

    /// Style for a map feature. `display_name` overrides the row name in the
    /// popup; unknown countries get the "no data" fill.
    pub fn style_for(&self, iso3: &str, display_name: Option<&str>) -> CountryStyle {
        let iso = iso3.trim().to_uppercase();
        let row = self.rows.get(&iso);
        let score = self.scores.get(&iso).copied().flatten();
        let source = row.map(|r| r.source).unwrap_or_else(|| self.default_source());

        let name = display_name
            .map(str::to_string)
            .or_else(|| row.and_then(|r| r.name.clone()))
            .unwrap_or_else(|| iso.clone());
        let ci = ci_text(self.year, self.boundary_year, &self.metrics, row);

        CountryStyle {
            score,
            source,
            fill_color: color_for(&self.legend, score).to_string(),
            popup: popup_html(&name, self.year, score, source, &ci),
        }
    }
}

/// Compute the render state for `rows` under `request`
pub fn refresh(rows: &[CountryYearRow], request: &RenderRequest, boundary_year: i32) -> RenderState {
    let by_iso: BTreeMap<String, CountryYearRow> = rows
        .iter()
        .filter_map(|r| {
            let iso = r.iso3.trim().to_uppercase();
            (!iso.is_empty()).then(|| (iso, r.clone()))
        })
        .collect();

    let matrix = build_matrix(rows, &request.metrics);
    let scores = build_scores(rows, &request.metrics, &matrix);

    let palette = *pick_palette(request.year, boundary_year, request.color_blind, request.alternate);
    let legend = build_color_ranges(scores.values().copied(), &palette);

    let mut state = RenderState {
        year: request.year,
        boundary_year,
        metrics: request.metrics.clone(),
        palette,
        legend,
        countries: BTreeMap::new(),
        rows: by_iso,
        scores,
    };

    state.countries = state
        .scores
        .keys()
        .map(|iso| (iso.clone(), state.style_for(iso, None)))
        .collect();

    debug!(
        "Rendered {} countries for {} ({}, palette {})",
        state.countries.len(),
        state.year,
        state.metrics,
        state.palette.name
    );
    state
}
