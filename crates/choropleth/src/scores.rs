//! Indicator matrix and composite country scores

use crate::normalize::normalize;
use map_data::{CountryYearRow, Metric, MetricSet};
use std::collections::BTreeMap;

/// Normalized value per metric, per ISO3
pub type IndicatorMatrix = BTreeMap<Metric, BTreeMap<String, Option<f64>>>;

/// Composite score per ISO3
pub type CountryScores = BTreeMap<String, Option<f64>>;

fn row_iso(row: &CountryYearRow) -> Option<String> {
    let iso = row.iso3.trim().to_uppercase();
    (!iso.is_empty()).then_some(iso)
}

/// Normalize each metric across the given rows only
pub fn build_matrix(rows: &[CountryYearRow], metrics: &MetricSet) -> IndicatorMatrix {
    metrics
        .iter()
        .map(|metric| {
            let per_iso: BTreeMap<String, Option<f64>> = rows
                .iter()
                .filter_map(|r| row_iso(r).map(|iso| (iso, r.value(metric))))
                .collect();
            (metric, normalize(&per_iso))
        })
        .collect()
}

/// Sum of normalized metric values per country.
///
/// A metric missing for a country contributes 0. With no metrics every
/// score is `None`.
pub fn build_scores(rows: &[CountryYearRow], metrics: &MetricSet, matrix: &IndicatorMatrix) -> CountryScores {
    rows.iter()
        .filter_map(row_iso)
        .map(|iso| {
            if metrics.is_empty() {
                return (iso, None);
            }
            let sum: f64 = metrics
                .iter()
                .filter_map(|m| matrix.get(&m).and_then(|col| col.get(&iso)).copied().flatten())
                .sum();
            (iso, Some(sum))
        })
        .collect()
}
