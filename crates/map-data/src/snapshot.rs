//! Forecast snapshot loading
//!
//! The snapshot is a JSON array of per (iso3, year, metric) forecast records,
//! written by the offline forecasting job. It may be gzip-compressed and is
//! decoded leniently: invalid UTF-8 is replaced, malformed records skipped.

use crate::model::PredictedRecord;
use flate2::read::GzDecoder;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use tracing::debug;

/// gzip member header
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Default lookup order, relative to the deployment root
pub const DEFAULT_CANDIDATES: [&str; 6] = [
    "public/data/predictions.json",
    "public/data/predictions.json.gz",
    "public/predictions.json",
    "public/predictions.json.gz",
    "storage/app/predictions.json",
    "storage/app/predictions.json.gz",
];

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("gzip decode failed: {0}")]
    Decompress(std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Snapshot is not a JSON array")]
    NotAnArray,
}

pub type Result<T> = std::result::Result<T, SnapshotError>;

/// Identity of one snapshot file version
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnapshotKey {
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
}

impl SnapshotKey {
    pub fn new(path: impl Into<PathBuf>, modified: Option<SystemTime>) -> Self {
        Self {
            path: path.into(),
            modified,
        }
    }
}

/// Where forecast records come from
pub trait SnapshotSource: Send + Sync {
    /// Identify the snapshot currently available, if any
    fn locate(&self) -> Option<SnapshotKey>;

    /// Read and decode the snapshot identified by `key`
    fn read(&self, key: &SnapshotKey) -> Result<Vec<PredictedRecord>>;
}

/// Snapshot read from the first existing file among a list of candidates
#[derive(Debug, Clone)]
pub struct FileSnapshotSource {
    candidates: Vec<PathBuf>,
}

impl FileSnapshotSource {
    pub fn new(candidates: Vec<PathBuf>) -> Self {
        Self { candidates }
    }

    /// Default candidate list below `root`
    pub fn with_defaults(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self::new(DEFAULT_CANDIDATES.iter().map(|c| root.join(c)).collect())
    }
}

impl SnapshotSource for FileSnapshotSource {
    fn locate(&self) -> Option<SnapshotKey> {
        self.candidates.iter().find(|p| p.is_file()).map(|p| {
            let modified = fs::metadata(p).and_then(|m| m.modified()).ok();
            SnapshotKey::new(p.clone(), modified)
        })
    }

    fn read(&self, key: &SnapshotKey) -> Result<Vec<PredictedRecord>> {
        let raw = fs::read(&key.path)?;
        let gzipped = key
            .path
            .extension()
            .map(|ext| ext == "gz")
            .unwrap_or(false);
        decode_snapshot(&raw, gzipped)
    }
}

/// Decode snapshot bytes into records.
///
/// Input is gunzipped when `gzipped` is set or the bytes carry the gzip
/// magic number. Elements that do not form a valid record are dropped.
pub fn decode_snapshot(raw: &[u8], gzipped: bool) -> Result<Vec<PredictedRecord>> {
    let bytes = if gzipped || raw.starts_with(&GZIP_MAGIC) {
        let mut decoded = Vec::new();
        GzDecoder::new(raw)
            .read_to_end(&mut decoded)
            .map_err(SnapshotError::Decompress)?;
        decoded
    } else {
        raw.to_vec()
    };

    let text = String::from_utf8_lossy(&bytes);
    let value: serde_json::Value = serde_json::from_str(&text)?;
    let elements = value.as_array().ok_or(SnapshotError::NotAnArray)?;

    let records: Vec<PredictedRecord> = elements
        .iter()
        .filter_map(PredictedRecord::from_json)
        .collect();

    debug!(
        "Decoded {} forecast records ({} skipped as malformed)",
        records.len(),
        elements.len() - records.len()
    );

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::Metric;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"[
        {"iso3": "AFG", "year": 2030, "metric": "gmi_score", "value": 50.1, "lo_ci": 45, "hi_ci": 55, "method": "ets", "version": "v1"},
        {"iso3": "", "year": 2030, "metric": "gmi_score", "value": 1.0},
        {"iso3": "ALB", "year": 2030, "metric": "wri_score", "value": 3.2}
    ]"#;

    fn gzip(bytes: &[u8]) -> Vec<u8> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(bytes).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn test_decode_plain() {
        let records = decode_snapshot(SAMPLE.as_bytes(), false).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].iso3, "AFG");
        assert_eq!(records[1].metric, Metric::WriScore);
    }

    #[test]
    fn test_decode_gzip_by_flag_and_by_magic() {
        let packed = gzip(SAMPLE.as_bytes());
        assert_eq!(decode_snapshot(&packed, true).unwrap().len(), 2);
        assert_eq!(decode_snapshot(&packed, false).unwrap().len(), 2);
    }

    #[test]
    fn test_corrupt_gzip_is_error() {
        let err = decode_snapshot(b"definitely not gzip", true).unwrap_err();
        assert!(matches!(err, SnapshotError::Decompress(_)));
    }

    #[test]
    fn test_non_array_is_error() {
        let err = decode_snapshot(br#"{"records": []}"#, false).unwrap_err();
        assert!(matches!(err, SnapshotError::NotAnArray));
    }

    #[test]
    fn test_invalid_utf8_substituted() {
        let mut raw = br#"[{"iso3": "CIV", "year": 2030, "metric": "gmi_score", "value": 1.5, "method": "C"#.to_vec();
        raw.push(0xff);
        raw.extend_from_slice(br#"te"}]"#);

        let records = decode_snapshot(&raw, false).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].method.as_deref(), Some("C\u{FFFD}te"));
    }

    #[test]
    fn test_locate_prefers_first_existing_candidate() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("public")).unwrap();
        fs::create_dir_all(dir.path().join("storage/app")).unwrap();
        fs::write(dir.path().join("storage/app/predictions.json"), SAMPLE).unwrap();
        fs::write(dir.path().join("public/predictions.json.gz"), gzip(SAMPLE.as_bytes())).unwrap();

        let source = FileSnapshotSource::with_defaults(dir.path());
        let key = source.locate().unwrap();
        assert!(key.path.ends_with("public/predictions.json.gz"));
        assert!(key.modified.is_some());
        assert_eq!(source.read(&key).unwrap().len(), 2);
    }

    #[test]
    fn test_locate_none_when_no_file() {
        let dir = TempDir::new().unwrap();
        let source = FileSnapshotSource::with_defaults(dir.path());
        assert!(source.locate().is_none());
    }
}
