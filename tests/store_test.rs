//! Snapshot store integration tests: durability, idempotent append, and the
//! rolling size bound.

mod common;

use chrono::Duration;
use std::fs;

use common::{aligned_hours_ago, snapshot, storage_config, temp_store};
use quotawatch::error::QuotawatchError;
use quotawatch::range::RetentionPeriod;
use quotawatch::store::SnapshotStore;

#[test]
fn load_missing_document_is_empty_not_an_error() {
    let (_dir, docs) = temp_store();
    let store = SnapshotStore::new(docs.clone(), storage_config(&docs, 12, 24));

    let doc = store.load("default").unwrap();
    assert!(doc.entries.is_empty());
    assert!(doc.last_updated.is_none());
}

#[test]
fn append_persists_across_reloads() {
    let (_dir, docs) = temp_store();
    let store = SnapshotStore::new(docs.clone(), storage_config(&docs, 12, 24));
    let base = aligned_hours_ago(2);

    store
        .append("default", snapshot(base, 1_000, 10, 5.0), RetentionPeriod::Day)
        .unwrap();
    store
        .append(
            "default",
            snapshot(base + Duration::minutes(5), 2_000, 20, 6.0),
            RetentionPeriod::Day,
        )
        .unwrap();

    let doc = store.load("default").unwrap();
    assert_eq!(doc.entries.len(), 2);
    assert_eq!(doc.entries[1].tokens_used, 2_000);
    assert!(doc.last_updated.is_some());

    // No stray tmp file left behind by the atomic write.
    let leftovers: Vec<_> = fs::read_dir(docs.data_dir())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().map(|x| x == "tmp").unwrap_or(false))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn duplicate_timestamp_append_is_a_no_op() {
    let (_dir, docs) = temp_store();
    let store = SnapshotStore::new(docs.clone(), storage_config(&docs, 12, 24));
    let base = aligned_hours_ago(1);

    store
        .append("default", snapshot(base, 1_000, 10, 5.0), RetentionPeriod::Day)
        .unwrap();
    let before = store.load("default").unwrap();

    // Same timestamp, different counters: the re-run is skipped entirely.
    let after = store
        .append("default", snapshot(base, 9_999, 99, 50.0), RetentionPeriod::Day)
        .unwrap();

    assert_eq!(after.entries.len(), before.entries.len());
    assert_eq!(after.entries[0].tokens_used, 1_000);
    assert_eq!(after.last_updated, before.last_updated);
}

#[test]
fn raw_log_is_bounded_by_the_retention_cap() {
    let (_dir, docs) = temp_store();
    // One sample per hour, 24h retention: cap of 24 entries.
    let store = SnapshotStore::new(docs.clone(), storage_config(&docs, 1, 24));
    let start = aligned_hours_ago(40);

    for i in 0..30i64 {
        store
            .append(
                "default",
                snapshot(start + Duration::hours(i), 1_000 * i as u64, i as u64, 1.0),
                RetentionPeriod::Day,
            )
            .unwrap();
    }

    let doc = store.load("default").unwrap();
    assert_eq!(doc.entries.len(), 24);
    // Oldest entries were dropped, the newest survived.
    assert_eq!(doc.entries.last().unwrap().tokens_used, 29_000);
    assert_eq!(doc.entries.first().unwrap().tokens_used, 6_000);
}

#[test]
fn longer_retention_allows_a_larger_raw_log() {
    let (_dir, docs) = temp_store();
    let store = SnapshotStore::new(docs.clone(), storage_config(&docs, 1, 24));
    let start = aligned_hours_ago(80);

    for i in 0..60i64 {
        store
            .append(
                "default",
                snapshot(start + Duration::hours(i), i as u64, i as u64, 1.0),
                RetentionPeriod::Week,
            )
            .unwrap();
    }

    // Week retention at 1 sample/hour caps at 168; nothing trimmed yet.
    assert_eq!(store.load("default").unwrap().entries.len(), 60);
}

#[test]
fn corrupt_document_is_propagated_not_replaced() {
    let (_dir, docs) = temp_store();
    fs::create_dir_all(docs.data_dir()).unwrap();
    fs::write(docs.history_path("default"), "{ not json").unwrap();

    let store = SnapshotStore::new(docs.clone(), storage_config(&docs, 12, 24));
    match store.load("default") {
        Err(QuotawatchError::CorruptData { path, .. }) => {
            assert!(path.ends_with("history.json"));
        }
        other => panic!("expected CorruptData, got {:?}", other.map(|d| d.entries.len())),
    }

    // Append goes through load and must refuse to clobber the corrupt file.
    let base = aligned_hours_ago(1);
    assert!(store
        .append("default", snapshot(base, 1, 1, 1.0), RetentionPeriod::Day)
        .is_err());
}

#[test]
fn profiles_are_isolated() {
    let (_dir, docs) = temp_store();
    let store = SnapshotStore::new(docs.clone(), storage_config(&docs, 12, 24));
    let base = aligned_hours_ago(1);

    store
        .append("default", snapshot(base, 111, 1, 1.0), RetentionPeriod::Day)
        .unwrap();
    store
        .append("work", snapshot(base, 222, 2, 2.0), RetentionPeriod::Day)
        .unwrap();

    assert_eq!(store.load("default").unwrap().entries[0].tokens_used, 111);
    assert_eq!(store.load("work").unwrap().entries[0].tokens_used, 222);
}
