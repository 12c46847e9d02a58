//! Parsed snapshot cache
//!
//! Keyed by [`SnapshotKey`] (path + modification time), so a rewritten
//! snapshot file misses the cache without explicit invalidation. Entries
//! expire after a fixed TTL. Concurrent misses may parse the same file twice;
//! both parses yield the same records, so the last insert simply wins.

use crate::model::PredictedRecord;
use crate::snapshot::SnapshotKey;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Shared, immutable parsed snapshot
pub type SharedRecords = Arc<Vec<PredictedRecord>>;

pub trait SnapshotCache: Send + Sync {
    fn get(&self, key: &SnapshotKey) -> Option<SharedRecords>;
    fn put(&self, key: SnapshotKey, records: SharedRecords);
    fn clear(&self);

    /// (total entries, unexpired entries)
    fn stats(&self) -> (usize, usize);

    /// Lifetime of an entry
    fn ttl(&self) -> Duration;
}

/// Cache entry with expiry
struct CacheEntry {
    records: SharedRecords,
    expires_at: Instant,
}

/// In-process TTL cache
pub struct TtlSnapshotCache {
    ttl: Duration,
    entries: RwLock<HashMap<SnapshotKey, CacheEntry>>,
}

impl TtlSnapshotCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for TtlSnapshotCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(crate::SNAPSHOT_TTL_SECS))
    }
}

impl SnapshotCache for TtlSnapshotCache {
    fn get(&self, key: &SnapshotKey) -> Option<SharedRecords> {
        let entries = self.entries.read();
        entries
            .get(key)
            .filter(|e| e.expires_at > Instant::now())
            .map(|e| Arc::clone(&e.records))
    }

    fn put(&self, key: SnapshotKey, records: SharedRecords) {
        let now = Instant::now();
        let mut entries = self.entries.write();

        // Expired entries and older versions of the same file can never hit again
        entries.retain(|k, e| e.expires_at > now && k.path != key.path);

        debug!(
            "Caching {} forecast records for {:?}",
            records.len(),
            key.path
        );
        entries.insert(
            key,
            CacheEntry {
                records,
                expires_at: now + self.ttl,
            },
        );
    }

    fn clear(&self) {
        self.entries.write().clear();
    }

    fn stats(&self) -> (usize, usize) {
        let entries = self.entries.read();
        let now = Instant::now();
        let valid = entries.values().filter(|e| e.expires_at > now).count();
        (entries.len(), valid)
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// Cache that never holds anything; every request re-reads the snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl SnapshotCache for NoCache {
    fn get(&self, _key: &SnapshotKey) -> Option<SharedRecords> {
        None
    }

    fn put(&self, _key: SnapshotKey, _records: SharedRecords) {}

    fn clear(&self) {}

    fn stats(&self) -> (usize, usize) {
        (0, 0)
    }

    fn ttl(&self) -> Duration {
        Duration::ZERO
    }
}
