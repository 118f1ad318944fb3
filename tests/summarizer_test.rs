//! Archival and compaction tests: hourly bucketing, merge dedup, pruning,
//! and the raw-window trim.

mod common;

use chrono::{Duration, Utc};

use common::{aligned_hours_ago, snapshot, storage_config, temp_store};
use quotawatch::models::HistoryDocument;
use quotawatch::range::RetentionPeriod;
use quotawatch::storage::DocumentStore;
use quotawatch::summarizer::{summarize_hourly, Summarizer};

/// Seed a raw history document directly, bypassing the append cap.
fn seed_history(docs: &DocumentStore, profile: &str, entries: Vec<quotawatch::models::Snapshot>) {
    let doc = HistoryDocument {
        entries,
        last_updated: Some(Utc::now()),
        ..Default::default()
    };
    docs.save_history(profile, &doc).unwrap();
}

#[test]
fn one_summary_per_occupied_hour_with_exact_entry_counts() {
    // Three samples in one hour, two in the next, none in between hours.
    let h0 = aligned_hours_ago(30);
    let h2 = aligned_hours_ago(28);
    let entries = vec![
        snapshot(h0, 100, 1, 10.0),
        snapshot(h0 + Duration::minutes(5), 200, 2, 11.0),
        snapshot(h0 + Duration::minutes(10), 300, 3, 12.0),
        snapshot(h2, 400, 4, 13.0),
        snapshot(h2 + Duration::minutes(5), 500, 5, 14.0),
    ];

    let summaries = summarize_hourly(&entries);
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].entry_count, 3);
    assert_eq!(summaries[1].entry_count, 2);
}

#[test]
fn counters_take_the_bucket_maximum() {
    let h0 = aligned_hours_ago(30);
    // Out-of-order counters inside the bucket; the max must win.
    let entries = vec![
        snapshot(h0, 500, 5, 10.0),
        snapshot(h0 + Duration::minutes(5), 900, 9, 11.0),
        snapshot(h0 + Duration::minutes(10), 700, 7, 12.0),
    ];

    let summaries = summarize_hourly(&entries);
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].tokens_used, 900);
    assert_eq!(summaries[0].model_calls, 9);
    let max_raw = entries.iter().map(|e| e.tokens_used).max().unwrap();
    assert!(summaries[0].tokens_used >= max_raw);
}

#[test]
fn gauges_keep_the_last_non_zero_reading() {
    let h0 = aligned_hours_ago(30);
    let mut early = snapshot(h0, 100, 1, 40.0);
    early.time_quota_percent = 20.0;
    // A zero/missing quota reading must not regress the gauge.
    let mut late = snapshot(h0 + Duration::minutes(10), 200, 2, 0.0);
    late.time_quota_percent = 0.0;

    let summaries = summarize_hourly(&[early, late]);
    assert_eq!(summaries[0].token_quota_percent, 40.0);
    assert_eq!(summaries[0].time_quota_percent, 20.0);
}

#[test]
fn archive_is_a_no_op_for_day_retention() {
    let (_dir, docs) = temp_store();
    let base = aligned_hours_ago(40);
    seed_history(
        &docs,
        "default",
        (0..20).map(|i| snapshot(base + Duration::hours(i), i as u64, 1, 1.0)).collect(),
    );

    // Tiny raw window so there would be plenty to archive.
    let summarizer = Summarizer::new(docs.clone(), storage_config(&docs, 1, 2));
    let report = summarizer.archive("default", RetentionPeriod::Day).unwrap();

    assert_eq!(report.archived, 0);
    assert_eq!(report.trimmed, 0);
    assert_eq!(docs.load_history("default").unwrap().entries.len(), 20);
    assert!(docs.load_summaries("default").unwrap().summaries.is_empty());
}

#[test]
fn archive_folds_excess_and_trims_to_the_raw_window() {
    let (_dir, docs) = temp_store();
    let base = aligned_hours_ago(40);
    // 10 hourly samples, raw window of 4 entries at 1 sample/hour.
    seed_history(
        &docs,
        "default",
        (0..10)
            .map(|i| snapshot(base + Duration::hours(i), 100 * (i as u64 + 1), i as u64, 5.0))
            .collect(),
    );

    let summarizer = Summarizer::new(docs.clone(), storage_config(&docs, 1, 4));
    let report = summarizer.archive("default", RetentionPeriod::Week).unwrap();

    assert_eq!(report.archived, 6);
    assert_eq!(report.trimmed, 6);

    let history = docs.load_history("default").unwrap();
    assert_eq!(history.entries.len(), 4);
    assert_eq!(history.entries[0].tokens_used, 700);

    let summaries = docs.load_summaries("default").unwrap();
    assert_eq!(summaries.summaries.len(), 6);
    assert_eq!(summaries.retention_period, RetentionPeriod::Week);
    // Buckets ascend and carry the folded counter values.
    assert!(summaries.summaries.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    assert_eq!(summaries.summaries.last().unwrap().tokens_used, 600);
}

#[test]
fn repeated_archival_runs_do_not_duplicate_buckets() {
    let (_dir, docs) = temp_store();
    let base = aligned_hours_ago(40);
    seed_history(
        &docs,
        "default",
        (0..8).map(|i| snapshot(base + Duration::hours(i), 100 * i as u64, 1, 1.0)).collect(),
    );

    let summarizer = Summarizer::new(docs.clone(), storage_config(&docs, 1, 2));
    summarizer.archive("default", RetentionPeriod::Week).unwrap();
    let first = docs.load_summaries("default").unwrap().summaries.len();

    // Re-seed the same raw window and archive again: same buckets, no dupes.
    seed_history(
        &docs,
        "default",
        (0..8).map(|i| snapshot(base + Duration::hours(i), 100 * i as u64, 1, 1.0)).collect(),
    );
    summarizer.archive("default", RetentionPeriod::Week).unwrap();
    let summaries = docs.load_summaries("default").unwrap().summaries;

    assert_eq!(summaries.len(), first);
    let mut keys: Vec<_> = summaries.iter().map(|s| s.timestamp).collect();
    keys.dedup();
    assert_eq!(keys.len(), summaries.len());
}

#[test]
fn summaries_beyond_the_retention_ceiling_are_pruned() {
    let (_dir, docs) = temp_store();

    // An existing summary log with one ancient bucket.
    let ancient = summarize_hourly(&[snapshot(Utc::now() - Duration::hours(200), 50, 1, 1.0)]);
    let mut doc = docs.load_summaries("default").unwrap();
    doc.summaries = ancient;
    docs.save_summaries("default", &doc).unwrap();

    // Fresh raw entries to trigger an archival pass.
    let base = aligned_hours_ago(30);
    seed_history(
        &docs,
        "default",
        (0..6).map(|i| snapshot(base + Duration::hours(i), 100 * i as u64, 1, 1.0)).collect(),
    );

    let summarizer = Summarizer::new(docs.clone(), storage_config(&docs, 1, 2));
    summarizer.archive("default", RetentionPeriod::Week).unwrap();

    let cutoff = Utc::now() - Duration::hours(RetentionPeriod::Week.hours());
    let summaries = docs.load_summaries("default").unwrap().summaries;
    assert!(!summaries.is_empty());
    // The 200h-old bucket fell outside the 168h ceiling.
    assert!(summaries.iter().all(|s| s.timestamp >= cutoff));
}
