//! Score store access
//!
//! The store is the authority for observed country-year values. The gateway
//! reads a JSON dataset from disk on every request; tests use [`MemoryStore`].

use crate::model::{Country, ScoreRecord};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error reading store {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Store data is malformed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// A country paired with its score record for one year, if it has one
#[derive(Debug, Clone, PartialEq)]
pub struct CountryScores {
    pub country: Country,
    pub score: Option<ScoreRecord>,
}

/// A country with all of its yearly score records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryHistory {
    #[serde(flatten)]
    pub country: Country,
    #[serde(default)]
    pub scores: Vec<ScoreRecord>,
}

impl CountryHistory {
    pub fn score_for(&self, year: i32) -> Option<&ScoreRecord> {
        self.scores.iter().find(|s| s.year == year)
    }
}

/// On-disk dataset layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub countries: Vec<CountryHistory>,
}

/// Read access to observed indicator values
pub trait ScoreStore: Send + Sync {
    /// All known countries, in store order
    fn countries(&self) -> Result<Vec<Country>>;

    /// Every country with its record for `year` (None when it has none)
    fn countries_for_year(&self, year: i32) -> Result<Vec<CountryScores>>;

    /// Every country with all of its records, ordered by year
    fn history(&self) -> Result<Vec<CountryHistory>>;
}

/// In-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Vec<CountryHistory>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_dataset(dataset: Dataset) -> Self {
        Self {
            entries: dataset.countries,
        }
    }

    /// Add a country; returns its index
    pub fn add_country(&mut self, country: Country) -> usize {
        self.entries.push(CountryHistory {
            country,
            scores: Vec::new(),
        });
        self.entries.len() - 1
    }

    /// Attach a score record to the country with `iso3`; false if unknown
    pub fn add_score(&mut self, iso3: &str, score: ScoreRecord) -> bool {
        let iso3 = iso3.to_uppercase();
        match self.entries.iter_mut().find(|e| e.country.iso3() == iso3) {
            Some(entry) => {
                entry.scores.push(score);
                true
            }
            None => false,
        }
    }
}

impl ScoreStore for MemoryStore {
    fn countries(&self) -> Result<Vec<Country>> {
        Ok(self.entries.iter().map(|e| e.country.clone()).collect())
    }

    fn countries_for_year(&self, year: i32) -> Result<Vec<CountryScores>> {
        Ok(self
            .entries
            .iter()
            .map(|e| CountryScores {
                country: e.country.clone(),
                score: e.score_for(year).cloned(),
            })
            .collect())
    }

    fn history(&self) -> Result<Vec<CountryHistory>> {
        Ok(self
            .entries
            .iter()
            .map(|e| {
                let mut entry = e.clone();
                entry.scores.sort_by_key(|s| s.year);
                entry
            })
            .collect())
    }
}

/// Store backed by a JSON dataset file, re-read on every call
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<MemoryStore> {
        let file = File::open(&self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        let dataset: Dataset = serde_json::from_reader(BufReader::new(file))?;
        debug!(
            "Read {} countries from store {:?}",
            dataset.countries.len(),
            self.path
        );
        Ok(MemoryStore::from_dataset(dataset))
    }
}

impl ScoreStore for JsonFileStore {
    fn countries(&self) -> Result<Vec<Country>> {
        self.load()?.countries()
    }

    fn countries_for_year(&self, year: i32) -> Result<Vec<CountryScores>> {
        self.load()?.countries_for_year(year)
    }

    fn history(&self) -> Result<Vec<CountryHistory>> {
        self.load()?.history()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::Metric;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn country(iso: &str, name: &str) -> Country {
        Country {
            iso_code: iso.to_string(),
            name: name.to_string(),
            region: None,
            latitude: None,
            longitude: None,
        }
    }

    #[test]
    fn test_memory_store_year_lookup() {
        let mut store = MemoryStore::new();
        store.add_country(country("AFG", "Afghanistan"));
        store.add_country(country("ALB", "Albania"));
        assert!(store.add_score("afg", ScoreRecord::new(2022).with(Metric::GmiScore, 45.2)));
        assert!(!store.add_score("XXX", ScoreRecord::new(2022)));

        let rows = store.countries_for_year(2022).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].score.as_ref().and_then(|s| s.gmi_score), Some(45.2));
        assert!(rows[1].score.is_none());
    }

    #[test]
    fn test_history_sorted_by_year() {
        let mut store = MemoryStore::new();
        store.add_country(country("AFG", "Afghanistan"));
        store.add_score("AFG", ScoreRecord::new(2021));
        store.add_score("AFG", ScoreRecord::new(2019));

        let history = store.history().unwrap();
        let years: Vec<i32> = history[0].scores.iter().map(|s| s.year).collect();
        assert_eq!(years, vec![2019, 2021]);
    }

    #[test]
    fn test_json_file_store() {
        let json = r#"{
            "countries": [
                {"iso_code": "AFG", "name": "Afghanistan", "region": "Asia",
                 "scores": [{"year": 2022, "gmi_score": 45.2, "gmi_rank": 60}]},
                {"iso_code": "ALB", "name": "Albania"}
            ]
        }"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let store = JsonFileStore::new(file.path());
        let rows = store.countries_for_year(2022).unwrap();
        assert_eq!(rows.len(), 2);
        let afg = rows[0].score.as_ref().unwrap();
        assert_eq!(afg.value(Metric::GmiRank), Some(60.0));
        assert_eq!(rows[0].country.region.as_deref(), Some("Asia"));
    }

    #[test]
    fn test_json_file_store_missing_file_is_error() {
        let store = JsonFileStore::new("/nonexistent/atlas/dataset.json");
        assert!(matches!(store.countries(), Err(StoreError::Io { .. })));
    }
}
