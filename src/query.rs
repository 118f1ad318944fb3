//! Query engine.
//!
//! Serves composite reads over the snapshot store and summary log, and
//! computes derived statistics. The engine is stateless: every call re-reads
//! the persisted documents, trading staleness for correctness since read
//! volume is low.
//!
//! Range filtering is timestamp-based for every token. For ranges beyond the
//! raw window the view stitches hourly summaries in behind the raw entries,
//! deduplicating per hour bucket with raw winning whenever both exist.

use chrono::{Datelike, Duration, Local, Timelike, Utc};
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

use crate::error::{QuotawatchError, Result};
use crate::models::{
    BucketStat, HistoryPoint, PeakReport, PredictionStats, PredictionStatus, RateStats, Snapshot,
    SummaryStats,
};
use crate::range::RangeToken;
use crate::storage::DocumentStore;
use crate::timeutil::{hour_bucket, hours_between};

/// Minimum points for any rate or prediction computation.
const MIN_SAMPLES: usize = 2;

/// Hours-remaining threshold below which a prediction is a warning.
const WARNING_HORIZON_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryFormat {
    Raw,
    Summary,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum HistoryResponse {
    Entries(Vec<HistoryPoint>),
    Stats(SummaryStats),
}

pub struct QueryEngine {
    docs: DocumentStore,
}

impl QueryEngine {
    pub fn new(docs: DocumentStore) -> Self {
        Self { docs }
    }

    /// Latest collected snapshot.
    pub fn current(&self, profile: &str) -> Result<Snapshot> {
        let doc = self.docs.load_history(profile)?;
        doc.latest()
            .cloned()
            .ok_or_else(|| QuotawatchError::NotFound(profile.to_string()))
    }

    /// Range-filtered history, raw entries or aggregate stats.
    pub fn history(
        &self,
        profile: &str,
        range: RangeToken,
        format: HistoryFormat,
    ) -> Result<HistoryResponse> {
        let points = self.points(profile, range)?;
        if points.is_empty() {
            return Err(QuotawatchError::NotFound(profile.to_string()));
        }
        match format {
            HistoryFormat::Raw => Ok(HistoryResponse::Entries(points)),
            HistoryFormat::Summary => Ok(HistoryResponse::Stats(summary_stats(&points))),
        }
    }

    /// Rate of change over a trailing window anchored at the latest sample.
    pub fn rates(&self, profile: &str, window_hours: u32) -> Result<RateStats> {
        let doc = self.docs.load_history(profile)?;
        if doc.entries.is_empty() {
            return Err(QuotawatchError::NotFound(profile.to_string()));
        }
        compute_rates(&doc.entries, window_hours)
    }

    /// Quota-exhaustion estimate from recent token-quota growth.
    pub fn predict(&self, profile: &str, window_hours: u32) -> Result<PredictionStats> {
        let doc = self.docs.load_history(profile)?;
        let current = doc
            .latest()
            .ok_or_else(|| QuotawatchError::NotFound(profile.to_string()))?
            .token_quota_percent;
        compute_prediction(current, &doc.entries, window_hours)
    }

    /// Peak hour-of-day and day-of-week usage over a filtered range.
    pub fn insights(&self, profile: &str, range: RangeToken) -> Result<PeakReport> {
        let points = self.points(profile, range)?;
        if points.is_empty() {
            return Err(QuotawatchError::NotFound(profile.to_string()));
        }
        if points.len() < MIN_SAMPLES {
            return Err(QuotawatchError::InsufficientData {
                needed: MIN_SAMPLES,
                found: points.len(),
            });
        }
        Ok(peak_report(&points, range))
    }

    /// The stitched raw+summary point set for a range, sorted ascending.
    fn points(&self, profile: &str, range: RangeToken) -> Result<Vec<HistoryPoint>> {
        let cutoff = Utc::now() - Duration::hours(range.hours());
        let history = self.docs.load_history(profile)?;

        let raw: Vec<&Snapshot> = history
            .entries
            .iter()
            .filter(|s| s.timestamp >= cutoff)
            .collect();
        let mut points: Vec<HistoryPoint> = raw.iter().map(|s| HistoryPoint::from(*s)).collect();

        if range.spans_summaries() {
            let occupied: HashSet<_> = raw.iter().map(|s| hour_bucket(s.timestamp)).collect();
            let summaries = self.docs.load_summaries(profile)?;
            for summary in &summaries.summaries {
                // Raw wins over summary whenever both cover an hour bucket.
                if summary.timestamp >= cutoff && !occupied.contains(&summary.timestamp) {
                    points.push(HistoryPoint::from(summary));
                }
            }
        }

        points.sort_by_key(|p| p.timestamp);
        debug!(profile, range = %range, points = points.len(), "Resolved history range");
        Ok(points)
    }
}

/// Rate statistics over the trailing `window_hours`, anchored at the latest
/// entry's timestamp.
///
/// Fewer than two entries in the window is `InsufficientData`; a window whose
/// elapsed time is zero or negative (duplicate or out-of-order timestamps) is
/// `InvalidRange`. Never returns infinite or NaN rates.
pub fn compute_rates(entries: &[Snapshot], window_hours: u32) -> Result<RateStats> {
    if window_hours == 0 {
        return Err(QuotawatchError::InvalidRange(
            "rate window must be at least one hour".to_string(),
        ));
    }

    let windowed = trailing_window(entries, window_hours);
    if windowed.len() < MIN_SAMPLES {
        return Err(QuotawatchError::InsufficientData {
            needed: MIN_SAMPLES,
            found: windowed.len(),
        });
    }

    let first = windowed[0];
    let last = windowed[windowed.len() - 1];
    let elapsed = hours_between(first.timestamp, last.timestamp);
    if elapsed <= 0.0 {
        return Err(QuotawatchError::InvalidRange(format!(
            "window elapsed time is {:.3}h; timestamps are duplicated or out of order",
            elapsed
        )));
    }

    let tokens_per_hour = (last.tokens_used as f64 - first.tokens_used as f64) / elapsed;
    let calls_per_hour = (last.model_calls as f64 - first.model_calls as f64) / elapsed;
    let avg_tokens_per_call = if calls_per_hour > 0.0 {
        tokens_per_hour / calls_per_hour
    } else {
        0.0
    };

    Ok(RateStats {
        tokens_per_hour,
        calls_per_hour,
        avg_tokens_per_call,
        elapsed_hours: elapsed,
        sample_count: windowed.len(),
    })
}

/// Linear extrapolation of token-quota growth to 100%.
///
/// A flat or falling percentage (quota rollover) has no finite exhaustion
/// time and yields an explicit `NotDepleting` result, never a negative or
/// infinite ETA.
pub fn compute_prediction(
    current_percent: f64,
    entries: &[Snapshot],
    window_hours: u32,
) -> Result<PredictionStats> {
    if window_hours == 0 {
        return Err(QuotawatchError::InvalidRange(
            "prediction window must be at least one hour".to_string(),
        ));
    }

    let windowed = trailing_window(entries, window_hours);
    if windowed.len() < MIN_SAMPLES {
        return Err(QuotawatchError::InsufficientData {
            needed: MIN_SAMPLES,
            found: windowed.len(),
        });
    }

    let first = windowed[0];
    let last = windowed[windowed.len() - 1];
    let elapsed = hours_between(first.timestamp, last.timestamp);
    if elapsed <= 0.0 {
        return Err(QuotawatchError::InvalidRange(format!(
            "window elapsed time is {:.3}h; timestamps are duplicated or out of order",
            elapsed
        )));
    }

    let percent_per_hour = (last.token_quota_percent - first.token_quota_percent) / elapsed;
    if percent_per_hour <= 0.0 {
        return Ok(PredictionStats {
            status: PredictionStatus::NotDepleting,
            percent_per_hour,
            hours_until_exhausted: None,
            current_percent,
            window_hours,
        });
    }

    let hours_until_exhausted = ((100.0 - current_percent) / percent_per_hour).round() as i64;
    let status = if hours_until_exhausted < WARNING_HORIZON_HOURS {
        PredictionStatus::Warning
    } else {
        PredictionStatus::Ok
    };

    Ok(PredictionStats {
        status,
        percent_per_hour,
        hours_until_exhausted: Some(hours_until_exhausted),
        current_percent,
        window_hours,
    })
}

/// Entries inside the trailing window, anchored at the latest entry.
fn trailing_window(entries: &[Snapshot], window_hours: u32) -> Vec<&Snapshot> {
    let Some(last) = entries.last() else {
        return Vec::new();
    };
    let start = last.timestamp - Duration::hours(window_hours as i64);
    entries.iter().filter(|s| s.timestamp >= start).collect()
}

/// Aggregate totals for a filtered point set. Counters are cumulative, so
/// totals come from the last point; growth is measured against the first,
/// dividing by 1 when the first counter is zero.
fn summary_stats(points: &[HistoryPoint]) -> SummaryStats {
    let first = &points[0];
    let last = &points[points.len() - 1];

    let growth = |first_val: u64, last_val: u64| -> f64 {
        let base = first_val.max(1) as f64;
        (last_val as f64 - first_val as f64) / base * 100.0
    };

    SummaryStats {
        total_tokens: last.tokens_used,
        total_model_calls: last.model_calls,
        total_mcp_calls: last.mcp_calls,
        token_growth_percent: growth(first.tokens_used, last.tokens_used),
        call_growth_percent: growth(first.model_calls, last.model_calls),
        token_quota_percent: last.token_quota_percent,
        time_quota_percent: last.time_quota_percent,
        entry_count: points.len(),
        period_start: first.timestamp,
        period_end: last.timestamp,
    }
}

/// Peak report over per-interval counter deltas.
///
/// Each consecutive pair of points contributes the counter delta to the
/// bucket of the later point's local hour-of-day and day-of-week. Ties keep
/// the first-encountered bucket. Deltas are passed through signed, so an
/// upstream counter reset shows up as negative usage rather than being
/// silently repaired.
fn peak_report(points: &[HistoryPoint], range: RangeToken) -> PeakReport {
    let mut hourly: Vec<BucketStat> = Vec::new();
    let mut daily: Vec<BucketStat> = Vec::new();

    for pair in points.windows(2) {
        let (prev, cur) = (&pair[0], &pair[1]);
        let d_tokens = cur.tokens_used as i64 - prev.tokens_used as i64;
        let d_calls = cur.model_calls as i64 - prev.model_calls as i64;

        let local = cur.timestamp.with_timezone(&Local);
        let hour_label = format!("{:02}:00", local.hour());
        let day_label = local.weekday().to_string();

        fold_bucket(&mut hourly, hour_label, d_tokens, d_calls);
        fold_bucket(&mut daily, day_label, d_tokens, d_calls);
    }

    PeakReport {
        range: range.to_string(),
        peak_hour: peak_of(&hourly),
        peak_day: peak_of(&daily),
        hourly,
        daily,
    }
}

fn fold_bucket(buckets: &mut Vec<BucketStat>, label: String, tokens: i64, calls: i64) {
    match buckets.iter_mut().find(|b| b.label == label) {
        Some(bucket) => {
            bucket.tokens += tokens;
            bucket.model_calls += calls;
            bucket.samples += 1;
        }
        None => buckets.push(BucketStat {
            label,
            tokens,
            model_calls: calls,
            samples: 1,
        }),
    }
}

fn peak_of(buckets: &[BucketStat]) -> BucketStat {
    let mut best = &buckets[0];
    for bucket in &buckets[1..] {
        // Strict comparison keeps the first-encountered bucket on ties.
        if bucket.tokens > best.tokens {
            best = bucket;
        }
    }
    best.clone()
}
