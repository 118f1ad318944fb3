//! Snapshot store: the durable, append-only, size-bounded raw history.
//!
//! One collector process is expected to call [`SnapshotStore::append`] at a
//! time. The store keeps recency over completeness: once the retention entry
//! cap is hit, the oldest entries are dropped whether or not they have been
//! archived, so callers wanting long-term data must run archival before the
//! raw log rolls past the boundary.

use chrono::Utc;
use tracing::{debug, warn};

use crate::config::StorageConfig;
use crate::error::Result;
use crate::models::{HistoryDocument, Snapshot};
use crate::range::RetentionPeriod;
use crate::storage::DocumentStore;

pub struct SnapshotStore {
    docs: DocumentStore,
    storage: StorageConfig,
}

impl SnapshotStore {
    pub fn new(docs: DocumentStore, storage: StorageConfig) -> Self {
        Self { docs, storage }
    }

    /// Hard entry cap of the rolling raw log for a retention period. Derived
    /// from the expected collector cadence; a storage-size heuristic only,
    /// never a time-range semantic.
    pub fn entry_cap(&self, retention: RetentionPeriod) -> usize {
        self.storage.retention_cap(retention)
    }

    /// Load the current history, or an empty document when none exists yet.
    pub fn load(&self, profile: &str) -> Result<HistoryDocument> {
        self.docs.load_history(profile)
    }

    /// Append one snapshot and persist.
    ///
    /// Appending a snapshot whose timestamp exactly matches the latest stored
    /// entry is an idempotent no-op: the document (including `lastUpdated`)
    /// is returned unchanged. This guards against a collection run firing
    /// twice within the same clock second.
    ///
    /// Counters are trusted as given. A non-monotonic decrease (upstream
    /// quota rollover) is stored as-is and will surface as a negative rate
    /// downstream.
    pub fn append(
        &self,
        profile: &str,
        snapshot: Snapshot,
        retention: RetentionPeriod,
    ) -> Result<HistoryDocument> {
        let mut doc = self.docs.load_history(profile)?;

        if let Some(latest) = doc.latest() {
            if latest.timestamp == snapshot.timestamp {
                debug!(
                    profile,
                    timestamp = %snapshot.timestamp,
                    "Duplicate snapshot timestamp, skipping append"
                );
                return Ok(doc);
            }
            if snapshot.tokens_used < latest.tokens_used {
                warn!(
                    profile,
                    previous = latest.tokens_used,
                    current = snapshot.tokens_used,
                    "Cumulative token counter decreased; upstream quota period likely rolled over"
                );
            }
        }

        doc.entries.push(snapshot);

        let cap = self.entry_cap(retention);
        let trimmed = trim_to_cap(&mut doc, cap);
        if trimmed > 0 {
            debug!(profile, trimmed, cap, "Trimmed raw history to retention cap");
        }

        doc.last_updated = Some(Utc::now());
        self.docs.save_history(profile, &doc)?;
        Ok(doc)
    }
}

/// Drop oldest entries until the document fits the cap. Returns how many
/// entries were removed.
pub(crate) fn trim_to_cap(doc: &mut HistoryDocument, cap: usize) -> usize {
    if doc.entries.len() <= cap {
        return 0;
    }
    let excess = doc.entries.len() - cap;
    doc.entries.drain(..excess);
    excess
}
