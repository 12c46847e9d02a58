//! Row merge engine
//!
//! Builds the row set for one (year, metrics) request:
//!
//! 1. Actual index: one row per store country, values from its record for the year.
//! 2. Years up to the boundary return the actual index unchanged.
//! 3. Later years read the forecast snapshot and group matching records by ISO3.
//! 4. The union of both indexes is emitted in ISO3 order, every row tagged
//!    predicted and carrying every requested metric. Countries without a
//!    forecast become null-valued skeletons so the map still has a row for them.

use crate::cache::{SharedRecords, SnapshotCache};
use crate::metric::MetricSet;
use crate::model::{CountryYearRow, Source};
use crate::snapshot::SnapshotSource;
use crate::store::{ScoreStore, StoreError};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("Score store failed: {0}")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, MergeError>;

/// Merges store rows with forecast rows
#[derive(Clone)]
pub struct MergeEngine {
    store: Arc<dyn ScoreStore>,
    snapshots: Arc<dyn SnapshotSource>,
    cache: Arc<dyn SnapshotCache>,
    boundary_year: i32,
}

impl MergeEngine {
    pub fn new(
        store: Arc<dyn ScoreStore>,
        snapshots: Arc<dyn SnapshotSource>,
        cache: Arc<dyn SnapshotCache>,
    ) -> Self {
        Self {
            store,
            snapshots,
            cache,
            boundary_year: crate::LAST_ACTUAL_YEAR,
        }
    }

    pub fn with_boundary_year(mut self, boundary_year: i32) -> Self {
        self.boundary_year = boundary_year;
        self
    }

    pub fn boundary_year(&self) -> i32 {
        self.boundary_year
    }

    pub fn store(&self) -> &Arc<dyn ScoreStore> {
        &self.store
    }

    pub fn cache(&self) -> &Arc<dyn SnapshotCache> {
        &self.cache
    }

    /// Rows for `year`, one per ISO3, carrying every metric in `metrics`
    pub fn merge_rows(&self, year: i32, metrics: &MetricSet) -> Result<Vec<CountryYearRow>> {
        let actual = self.actual_rows(year, metrics)?;

        if year <= self.boundary_year {
            debug!("{} actual rows for {} ({})", actual.len(), year, metrics);
            return Ok(actual);
        }

        let records = self.load_snapshot();
        let mut predicted = self.predicted_rows(&records, year, metrics, &actual);

        let mut actual_by_iso: HashMap<String, CountryYearRow> =
            actual.into_iter().map(|r| (r.iso3.clone(), r)).collect();

        let all_isos: BTreeSet<String> = actual_by_iso
            .keys()
            .chain(predicted.keys())
            .cloned()
            .collect();

        let rows: Vec<CountryYearRow> = all_isos
            .into_iter()
            .map(|iso| {
                predicted
                    .remove(&iso)
                    .or_else(|| actual_by_iso.remove(&iso))
                    .unwrap_or_else(|| CountryYearRow::bare(iso, None, year, Source::Predicted))
                    .into_predicted_skeleton(metrics)
            })
            .collect();

        debug!("{} predicted rows for {} ({})", rows.len(), year, metrics);
        Ok(rows)
    }

    /// One row per store country, in store order
    fn actual_rows(&self, year: i32, metrics: &MetricSet) -> Result<Vec<CountryYearRow>> {
        let countries = self.store.countries_for_year(year)?;
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut rows: Vec<CountryYearRow> = Vec::with_capacity(countries.len());

        for entry in countries {
            let row = CountryYearRow::actual(&entry.country, year, metrics, entry.score.as_ref());
            // A repeated ISO3 replaces the earlier row in place
            match positions.get(&row.iso3) {
                Some(&idx) => rows[idx] = row,
                None => {
                    positions.insert(row.iso3.clone(), rows.len());
                    rows.push(row);
                }
            }
        }

        Ok(rows)
    }

    /// Forecast rows grouped by ISO3 (matching year and metrics only)
    fn predicted_rows(
        &self,
        records: &SharedRecords,
        year: i32,
        metrics: &MetricSet,
        actual: &[CountryYearRow],
    ) -> HashMap<String, CountryYearRow> {
        let names: HashMap<&str, &Option<String>> =
            actual.iter().map(|r| (r.iso3.as_str(), &r.name)).collect();

        let mut rows: HashMap<String, CountryYearRow> = HashMap::new();

        for record in records
            .iter()
            .filter(|r| r.year == year && metrics.contains(r.metric))
        {
            let row = rows.entry(record.iso3.clone()).or_insert_with(|| {
                let name = names.get(record.iso3.as_str()).and_then(|n| (*n).clone());
                let mut row = CountryYearRow::bare(record.iso3.clone(), name, year, Source::Predicted);
                row.method = record.method.clone();
                row.version = record.version.clone();
                row
            });

            row.metric_values.insert(record.metric, record.value);
            match record.confidence_interval() {
                Some(ci) => {
                    row.confidence_intervals.insert(record.metric, ci);
                }
                None => {
                    row.confidence_intervals.remove(&record.metric);
                }
            }
        }

        rows
    }

    /// Current snapshot records; empty when none is available or it fails to decode.
    /// A failed decode is cached as empty under the same key, so the file is
    /// not re-parsed until it changes or the entry expires.
    fn load_snapshot(&self) -> SharedRecords {
        let Some(key) = self.snapshots.locate() else {
            debug!("No forecast snapshot available");
            return Arc::new(Vec::new());
        };

        if let Some(records) = self.cache.get(&key) {
            return records;
        }

        let records = match self.snapshots.read(&key) {
            Ok(records) => Arc::new(records),
            Err(e) => {
                warn!("Ignoring forecast snapshot {:?}: {}", key.path, e);
                Arc::new(Vec::new())
            }
        };
        self.cache.put(key, Arc::clone(&records));
        records
    }
}
