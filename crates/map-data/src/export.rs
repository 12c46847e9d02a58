//! Denormalized CSV export of every country-year in the store

use crate::metric::Metric;
use crate::store::{ScoreStore, StoreError};
use std::io::Write;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Score store failed: {0}")]
    Store(#[from] StoreError),
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ExportError>;

/// Identity columns preceding the metric columns
pub const IDENTITY_COLUMNS: [&str; 4] = ["iso3", "name", "region", "year"];

/// Full header row
pub fn header() -> Vec<&'static str> {
    IDENTITY_COLUMNS
        .iter()
        .copied()
        .chain(Metric::ALL.iter().map(|m| m.as_str()))
        .collect()
}

/// Write one CSV line per (country, year) record; returns the number of data rows.
///
/// Rows follow store order for countries and ascending year within a country.
/// Missing values are written as empty cells.
pub fn write_metrics_csv<W: Write>(store: &dyn ScoreStore, writer: W) -> Result<usize> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(header())?;

    let mut written = 0usize;
    for entry in store.history()? {
        let iso3 = entry.country.iso3();
        let region = entry.country.region.clone().unwrap_or_default();

        for score in &entry.scores {
            let mut record: Vec<String> = vec![
                iso3.clone(),
                entry.country.name.clone(),
                region.clone(),
                score.year.to_string(),
            ];
            record.extend(Metric::ALL.iter().map(|m| match (m, score.value(*m)) {
                (Metric::GmiRank, Some(v)) => format!("{}", v as u32),
                (_, Some(v)) => v.to_string(),
                (_, None) => String::new(),
            }));
            csv.write_record(&record)?;
            written += 1;
        }
    }

    csv.flush()?;
    info!("Exported {} country-year rows", written);
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Country, ScoreRecord};
    use crate::store::MemoryStore;

    fn store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.add_country(Country {
            iso_code: "AFG".to_string(),
            name: "Afghanistan".to_string(),
            region: Some("Asia".to_string()),
            latitude: None,
            longitude: None,
        });
        store.add_country(Country {
            iso_code: "CIV".to_string(),
            name: "Côte d'Ivoire, Rep.".to_string(),
            region: None,
            latitude: None,
            longitude: None,
        });
        store.add_score(
            "AFG",
            ScoreRecord::new(2022)
                .with(Metric::GmiScore, 45.2)
                .with(Metric::GmiRank, 60.0),
        );
        store.add_score("AFG", ScoreRecord::new(2021).with(Metric::WriScore, 3.5));
        store.add_score("CIV", ScoreRecord::new(2020));
        store
    }

    #[test]
    fn test_header_covers_every_metric() {
        let header = header();
        assert_eq!(header.len(), 15);
        assert_eq!(&header[..4], &["iso3", "name", "region", "year"]);
        assert_eq!(header[4], "gmi_score");
        assert_eq!(header[14], "wri_adaptive_capacity");
    }

    #[test]
    fn test_export_rows() {
        let mut out = Vec::new();
        let written = write_metrics_csv(&store(), &mut out).unwrap();
        assert_eq!(written, 3);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("AFG,Afghanistan,Asia,2021,,,,,,3.5,"));
        assert!(lines[2].starts_with("AFG,Afghanistan,Asia,2022,45.2,,,,60,"));
        // Quoted because the name contains a comma
        assert!(lines[3].starts_with("CIV,\"Côte d'Ivoire, Rep.\",,2020,"));
    }

    #[test]
    fn test_export_empty_store_writes_header_only() {
        let mut out = Vec::new();
        let written = write_metrics_csv(&MemoryStore::new(), &mut out).unwrap();
        assert_eq!(written, 0);
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    }
}
