//! Archival and compaction.
//!
//! Raw snapshots that age past the fixed raw window (24 hours at the expected
//! cadence, independent of the configured long-term retention) are folded
//! into hourly [`Summary`] buckets and merged into the long-term summary log.
//! Buckets are keyed by the start of the local calendar hour; merging
//! deduplicates on the exact bucket timestamp with the newly produced bucket
//! winning, which makes repeated archival runs idempotent. Summaries older
//! than the long-term retention ceiling are pruned on every pass.

use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::config::StorageConfig;
use crate::error::Result;
use crate::models::{CleanupReport, Snapshot, Summary};
use crate::range::RetentionPeriod;
use crate::storage::DocumentStore;
use crate::store::trim_to_cap;
use crate::timeutil::hour_bucket;

pub struct Summarizer {
    docs: DocumentStore,
    storage: StorageConfig,
}

impl Summarizer {
    pub fn new(docs: DocumentStore, storage: StorageConfig) -> Self {
        Self { docs, storage }
    }

    /// Run one archival pass for a profile.
    ///
    /// With 24h retention the raw log alone covers the whole retention
    /// window, so the pass is a no-op. Otherwise raw entries beyond the fixed
    /// raw-window cap are summarized per occupied hour, merged into the
    /// summary document, and trimmed from the raw log. Both documents are
    /// persisted. Safe to re-run: bucket dedup keeps repeated passes from
    /// double-counting.
    pub fn archive(&self, profile: &str, retention: RetentionPeriod) -> Result<CleanupReport> {
        if retention == RetentionPeriod::Day {
            return Ok(CleanupReport::default());
        }

        let mut history = self.docs.load_history(profile)?;
        let cap = self.storage.raw_window_cap();
        if history.entries.len() <= cap {
            debug!(profile, entries = history.entries.len(), cap, "Nothing to archive");
            return Ok(CleanupReport::default());
        }

        let excess = history.entries.len() - cap;
        let fresh = summarize_hourly(&history.entries[..excess]);

        let mut summaries = self.docs.load_summaries(profile)?;
        let mut buckets: BTreeMap<DateTime<Utc>, Summary> = summaries
            .summaries
            .drain(..)
            .map(|s| (s.timestamp, s))
            .collect();
        // New bucket wins on collision: overwrite, not merge-of-merges.
        for summary in fresh {
            buckets.insert(summary.timestamp, summary);
        }

        let cutoff = Utc::now() - Duration::hours(retention.hours());
        let before_prune = buckets.len();
        buckets.retain(|ts, _| *ts >= cutoff);
        let pruned = before_prune - buckets.len();

        summaries.summaries = buckets.into_values().collect();
        summaries.retention_period = retention;
        summaries.last_updated = Some(Utc::now());

        let trimmed = trim_to_cap(&mut history, cap);
        history.last_updated = Some(Utc::now());

        self.docs.save_summaries(profile, &summaries)?;
        self.docs.save_history(profile, &history)?;

        info!(
            profile,
            archived = excess,
            trimmed,
            pruned,
            retention = %retention,
            "Archival pass complete"
        );
        Ok(CleanupReport {
            archived: excess,
            trimmed,
        })
    }
}

/// Fold raw snapshots into one summary per occupied local calendar hour.
/// Empty hours are never emitted. Counters take the running maximum inside a
/// bucket; gauge percentages take the last non-zero reading, so a zero or
/// missing quota sample never regresses an already-observed value.
pub fn summarize_hourly(entries: &[Snapshot]) -> Vec<Summary> {
    let mut buckets: BTreeMap<DateTime<Utc>, Summary> = BTreeMap::new();

    for entry in entries {
        let key = hour_bucket(entry.timestamp);
        let bucket = buckets.entry(key).or_insert_with(|| Summary {
            timestamp: key,
            model_calls: 0,
            tokens_used: 0,
            mcp_calls: 0,
            token_quota_percent: 0.0,
            time_quota_percent: 0.0,
            entry_count: 0,
        });

        bucket.model_calls = bucket.model_calls.max(entry.model_calls);
        bucket.tokens_used = bucket.tokens_used.max(entry.tokens_used);
        bucket.mcp_calls = bucket.mcp_calls.max(entry.mcp_calls);
        if entry.token_quota_percent > 0.0 {
            bucket.token_quota_percent = entry.token_quota_percent;
        }
        if entry.time_quota_percent > 0.0 {
            bucket.time_quota_percent = entry.time_quota_percent;
        }
        bucket.entry_count += 1;
    }

    buckets.into_values().collect()
}
