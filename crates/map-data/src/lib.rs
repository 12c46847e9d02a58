//! Indicator Atlas map data
//!
//! Produces the per-country rows the choropleth frontend draws for a given
//! year. Years up to the boundary year are served from the score store
//! ("actual"); later years come from a forecast snapshot ("predicted").
//!
//! # Pipeline
//!
//! ```text
//! ScoreStore ──► actual index ──┐
//!                               ├──► union by ISO3 ──► Vec<CountryYearRow>
//! SnapshotSource ─► cache ─► predicted index ──┘
//! ```
//!
//! The store, the snapshot reader and the snapshot cache are trait objects
//! handed to [`merge::MergeEngine`], so the gateway wires file-backed
//! implementations and tests wire in-memory ones.

pub mod cache;
pub mod export;
pub mod merge;
pub mod metric;
pub mod model;
pub mod snapshot;
pub mod store;

pub use cache::{NoCache, SnapshotCache, TtlSnapshotCache};
pub use export::{write_metrics_csv, ExportError};
pub use merge::{MergeEngine, MergeError};
pub use metric::{Metric, MetricError, MetricFamily, MetricSet};
pub use model::{ConfidenceInterval, Country, CountryYearRow, PredictedRecord, ScoreRecord, Source};
pub use snapshot::{FileSnapshotSource, SnapshotError, SnapshotKey, SnapshotSource};
pub use store::{CountryScores, JsonFileStore, MemoryStore, ScoreStore, StoreError};

/// Last year with authoritative ("actual") values; later years are forecasts.
pub const LAST_ACTUAL_YEAR: i32 = 2022;

/// How long a parsed forecast snapshot stays cached, in seconds.
pub const SNAPSHOT_TTL_SECS: u64 = 600;
