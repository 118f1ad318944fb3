//! Shared fixtures for the integration suites.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tempfile::TempDir;

use quotawatch::config::StorageConfig;
use quotawatch::models::Snapshot;
use quotawatch::storage::DocumentStore;
use quotawatch::timeutil::hour_bucket;

/// An isolated data directory plus its document store. Keep the TempDir
/// alive for the duration of the test or the files vanish.
pub fn temp_store() -> (TempDir, DocumentStore) {
    let dir = TempDir::new().expect("create temp data dir");
    let docs = DocumentStore::new(dir.path());
    (dir, docs)
}

/// Storage settings pointing at the document store's directory, with the
/// cadence and raw window a test wants.
pub fn storage_config(
    docs: &DocumentStore,
    samples_per_hour: u32,
    raw_window_hours: i64,
) -> StorageConfig {
    StorageConfig {
        data_dir: docs.data_dir().to_path_buf(),
        samples_per_hour,
        raw_window_hours,
    }
}

pub fn snapshot(ts: DateTime<Utc>, tokens: u64, calls: u64, token_pct: f64) -> Snapshot {
    Snapshot {
        timestamp: ts,
        model_calls: calls,
        tokens_used: tokens,
        mcp_calls: calls / 2,
        token_quota_percent: token_pct,
        time_quota_percent: token_pct / 2.0,
        mcp_tool_breakdown: HashMap::new(),
    }
}

/// A bucket-aligned base timestamp `hours_ago` hours in the past. Offsetting
/// samples by a few minutes from this base keeps them inside one local
/// calendar hour on any host timezone.
pub fn aligned_hours_ago(hours_ago: i64) -> DateTime<Utc> {
    hour_bucket(Utc::now() - Duration::hours(hours_ago)) + Duration::minutes(1)
}
