//! Core data models.
//!
//! The data pipeline flows through these types in sequence:
//!
//! 1. **Raw data**: [`Snapshot`] - one usage sample handed over by the collector
//! 2. **Compaction**: [`Summary`] - one hourly aggregate of aged-out snapshots
//! 3. **Persistence**: [`HistoryDocument`], [`SummaryDocument`] - the per-profile
//!    on-disk documents
//! 4. **Derived views**: [`RateStats`], [`PredictionStats`], [`SummaryStats`],
//!    [`PeakReport`], [`HistoryPoint`] - query engine outputs
//!
//! All wire names are camelCase to match the documents the dashboard reads.
//! Numeric snapshot fields default to zero and the tool breakdown to an empty
//! map, so a collector that omits a counter never fails deserialization.
//!
//! `modelCalls`, `tokensUsed` and `mcpCalls` are cumulative counters that only
//! grow until the upstream quota period rolls over. The quota percentages are
//! point-in-time gauges in `[0, 100]`. Counters are stored exactly as
//! delivered: an upstream reset shows up as a decrease here and as a negative
//! rate downstream, by decision (see DESIGN.md).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::range::RetentionPeriod;

/// One usage sample delivered by the collector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub model_calls: u64,
    #[serde(default)]
    pub tokens_used: u64,
    #[serde(default)]
    pub mcp_calls: u64,
    #[serde(default)]
    pub token_quota_percent: f64,
    #[serde(default)]
    pub time_quota_percent: f64,
    #[serde(default)]
    pub mcp_tool_breakdown: HashMap<String, u64>,
}

/// One compacted hour bucket. `timestamp` is the start of the local calendar
/// hour; counters carry the running maximum seen inside the bucket (counters
/// are monotonic, so max is the last known value), gauges carry the last
/// non-zero reading.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub model_calls: u64,
    #[serde(default)]
    pub tokens_used: u64,
    #[serde(default)]
    pub mcp_calls: u64,
    #[serde(default)]
    pub token_quota_percent: f64,
    #[serde(default)]
    pub time_quota_percent: f64,
    #[serde(default)]
    pub entry_count: u32,
}

/// Optional per-profile quota ceilings, carried alongside the raw history for
/// the dashboard. Not interpreted by the core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaLimits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_call_limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mcp_call_limit: Option<u64>,
}

/// The per-profile raw history document. Owned by the snapshot store; mutated
/// only by append/trim.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryDocument {
    #[serde(default)]
    pub entries: Vec<Snapshot>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub quota_limits: QuotaLimits,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota_prediction: Option<PredictionStats>,
}

impl HistoryDocument {
    pub fn latest(&self) -> Option<&Snapshot> {
        self.entries.last()
    }
}

/// The per-profile long-term summary document. Owned by the summarizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryDocument {
    #[serde(default)]
    pub summaries: Vec<Summary>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub retention_period: RetentionPeriod,
}

impl Default for SummaryDocument {
    fn default() -> Self {
        Self {
            summaries: Vec::new(),
            last_updated: None,
            retention_period: RetentionPeriod::default(),
        }
    }
}

/// One named account namespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    pub auth_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Rate-of-change statistics over a trailing window anchored at the latest
/// sample. Rates can be negative after an upstream counter reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateStats {
    pub tokens_per_hour: f64,
    pub calls_per_hour: f64,
    pub avg_tokens_per_call: f64,
    pub elapsed_hours: f64,
    pub sample_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PredictionStatus {
    #[serde(rename = "ok")]
    Ok,
    #[serde(rename = "warning")]
    Warning,
    #[serde(rename = "notDepleting")]
    NotDepleting,
}

/// Linear extrapolation of recent quota-percent growth.
///
/// `hours_until_exhausted` is only present when the quota is actually
/// depleting; a flat or falling percentage yields `NotDepleting` with no ETA
/// rather than a negative or infinite number.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionStats {
    pub status: PredictionStatus,
    pub percent_per_hour: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours_until_exhausted: Option<i64>,
    pub current_percent: f64,
    pub window_hours: u32,
}

/// Aggregate totals for a filtered range, summary format.
///
/// Counters are cumulative, so totals come from the last entry and growth is
/// measured against the first. A zero first counter is treated as 1 for the
/// growth ratio to keep the number finite; an approximation, not a hidden bug.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    pub total_tokens: u64,
    pub total_model_calls: u64,
    pub total_mcp_calls: u64,
    pub token_growth_percent: f64,
    pub call_growth_percent: f64,
    pub token_quota_percent: f64,
    pub time_quota_percent: f64,
    pub entry_count: usize,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointSource {
    #[serde(rename = "raw")]
    Raw,
    #[serde(rename = "summary")]
    Summary,
}

/// One point in a stitched raw+summary history view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPoint {
    pub timestamp: DateTime<Utc>,
    pub model_calls: u64,
    pub tokens_used: u64,
    pub mcp_calls: u64,
    pub token_quota_percent: f64,
    pub time_quota_percent: f64,
    pub source: PointSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_count: Option<u32>,
}

impl From<&Snapshot> for HistoryPoint {
    fn from(s: &Snapshot) -> Self {
        Self {
            timestamp: s.timestamp,
            model_calls: s.model_calls,
            tokens_used: s.tokens_used,
            mcp_calls: s.mcp_calls,
            token_quota_percent: s.token_quota_percent,
            time_quota_percent: s.time_quota_percent,
            source: PointSource::Raw,
            entry_count: None,
        }
    }
}

impl From<&Summary> for HistoryPoint {
    fn from(s: &Summary) -> Self {
        Self {
            timestamp: s.timestamp,
            model_calls: s.model_calls,
            tokens_used: s.tokens_used,
            mcp_calls: s.mcp_calls,
            token_quota_percent: s.token_quota_percent,
            time_quota_percent: s.time_quota_percent,
            source: PointSource::Summary,
            entry_count: Some(s.entry_count),
        }
    }
}

/// Usage attributed to one hour-of-day or day-of-week bucket. Tokens and
/// calls are signed: deltas pass counter resets through as negative usage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketStat {
    pub label: String,
    pub tokens: i64,
    pub model_calls: i64,
    pub samples: usize,
}

/// Peak usage report over a filtered range.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeakReport {
    pub range: String,
    pub peak_hour: BucketStat,
    pub peak_day: BucketStat,
    pub hourly: Vec<BucketStat>,
    pub daily: Vec<BucketStat>,
}

/// Outcome of an archival pass: raw entries folded into summaries, and raw
/// entries removed from the rolling log.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupReport {
    pub archived: usize,
    pub trimmed: usize,
}
