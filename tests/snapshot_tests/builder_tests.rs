//! Snapshot Builder Tests
//!
//! Tests verify:
//! - The revision fold in isolation from any file
//! - Revision-boundary equivalence (property)
//! - Tombstoned keys never surface (property)
//! - Filter sets behave as a conjunction (property)

#[path = "../common/mod.rs"]
mod common;

use std::collections::BTreeSet;

use common::History;
use proptest::prelude::*;
use revscope::mvcc::{KeyValue, RevisionKey, Visit};
use revscope::snapshot::SnapshotBuilder;
use revscope::{parse_filters, Filter, KeySummary, Projection, StorageDecoder};

// =============================================================================
// Helper Functions
// =============================================================================

fn put(key: &str, value: &str, version: i64, main: i64) -> (RevisionKey, KeyValue) {
    let kv = KeyValue {
        key: key.as_bytes().to_vec(),
        create_revision: main - version + 1,
        mod_revision: main,
        version,
        value: value.as_bytes().to_vec(),
        lease: 0,
    };
    (RevisionKey::new(main, 0), kv)
}

fn delete(key: &str, main: i64) -> (RevisionKey, KeyValue) {
    let kv = KeyValue {
        key: key.as_bytes().to_vec(),
        ..KeyValue::default()
    };
    (RevisionKey::tombstone(main, 0), kv)
}

fn fold(records: &[(RevisionKey, KeyValue)], at_revision: i64) -> SnapshotBuilder {
    let mut builder = SnapshotBuilder::new(at_revision);
    for (rev, kv) in records {
        builder.observe(*rev, kv.clone());
    }
    builder
}

fn summarize(builder: &SnapshotBuilder, filters: &[Filter]) -> Vec<KeySummary> {
    builder.summarize(&StorageDecoder::new(), filters, &Projection::Everything)
}

fn key_set(summaries: &[KeySummary]) -> BTreeSet<Vec<u8>> {
    summaries.iter().map(|s| s.key.clone()).collect()
}

// =============================================================================
// Fold Tests
// =============================================================================

#[test]
fn test_empty_builder() {
    let builder = SnapshotBuilder::new(0);
    assert!(builder.is_empty());
    assert_eq!(builder.revision(), 0);
    assert!(summarize(&builder, &[]).is_empty());
}

#[test]
fn test_put_overwrites() {
    let builder = fold(&[put("/a", "1", 1, 2), put("/a", "22", 2, 3)], 0);

    assert_eq!(builder.len(), 1);
    let entry = builder.get(b"/a").unwrap();
    assert_eq!(entry.kv.value, b"22");
    assert_eq!(entry.kv.version, 2);
    assert_eq!(entry.stats.value_size, 2);
    assert_eq!(entry.stats.all_versions_value_size, 3);
    assert_eq!(entry.stats.version_count, 2);
}

#[test]
fn test_tombstone_removes() {
    let builder = fold(&[put("/a", "1", 1, 2), put("/b", "1", 1, 3), delete("/a", 4)], 0);

    assert!(builder.get(b"/a").is_none());
    assert!(builder.get(b"/b").is_some());
    assert_eq!(builder.revision(), 4);
}

#[test]
fn test_tombstone_for_unknown_key() {
    let builder = fold(&[delete("/ghost", 2), put("/a", "1", 1, 3)], 0);
    assert_eq!(builder.len(), 1);
}

#[test]
fn test_records_past_target_are_skipped() {
    let records = [put("/a", "1", 1, 2), put("/a", "2", 2, 3), delete("/a", 4)];
    let builder = fold(&records, 3);

    assert_eq!(builder.at_revision(), 3);
    assert_eq!(builder.revision(), 3);
    assert_eq!(builder.skipped(), 1);
    assert_eq!(builder.get(b"/a").unwrap().kv.value, b"2");
}

#[test]
fn test_observe_never_stops_the_walk() {
    let mut builder = SnapshotBuilder::new(2);
    let (rev, kv) = put("/a", "1", 1, 9);
    assert_eq!(builder.observe(rev, kv), Visit::Continue);
}

#[test]
fn test_entries_are_sorted_by_key() {
    let builder = fold(
        &[
            put("/c", "1", 1, 2),
            put("/a", "1", 1, 3),
            put("/b", "1", 1, 4),
        ],
        0,
    );
    let keys: Vec<&[u8]> = builder.entries().map(|(key, _)| key).collect();
    let expected: [&[u8]; 3] = [b"/a", b"/b", b"/c"];
    assert_eq!(keys, expected);
}

#[test]
fn test_decoding_only_when_needed() {
    // Opaque values are fine as long as nothing asks for their payload.
    let builder = fold(&[put("/opaque", "\u{1}\u{2}", 1, 2)], 0);
    let summaries = builder.summarize(
        &StorageDecoder::new(),
        &[Filter::prefix("/op")],
        &Projection::KeysOnly,
    );
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].value, None);
}

// =============================================================================
// Property Tests
// =============================================================================

/// `(key index, is delete, value)`; deletes of absent keys are dropped
fn operations() -> impl Strategy<Value = Vec<(usize, bool, u8)>> {
    prop::collection::vec((0usize..6, any::<bool>(), any::<u8>()), 0..60)
}

fn key_name(index: usize) -> String {
    let group = if index % 2 == 0 { "a" } else { "b" };
    format!("/{}/{}", group, index)
}

fn build_history(ops: &[(usize, bool, u8)]) -> History {
    let mut history = History::new();
    let mut live = BTreeSet::new();
    for &(index, is_delete, value) in ops {
        let key = key_name(index);
        if is_delete {
            if live.remove(&key) {
                history.delete(&key);
            }
        } else {
            live.insert(key.clone());
            history.put(&key, format!("{{\"n\":{}}}", value % 3).as_bytes());
        }
    }
    history
}

proptest! {
    #[test]
    fn prop_revision_boundary_equivalence(ops in operations(), cut in 1i64..64) {
        let history = build_history(&ops);
        let records = history.records();

        let bounded = fold(records, cut);
        let pruned: Vec<_> = records
            .iter()
            .filter(|(rev, _)| rev.main <= cut)
            .cloned()
            .collect();
        let latest = fold(&pruned, 0);

        prop_assert_eq!(
            bounded.entries().collect::<Vec<_>>(),
            latest.entries().collect::<Vec<_>>()
        );
        prop_assert_eq!(summarize(&bounded, &[]), summarize(&latest, &[]));
    }

    #[test]
    fn prop_no_tombstoned_key_survives(ops in operations(), cut in 0i64..64) {
        let history = build_history(&ops);
        let builder = fold(history.records(), cut);

        for summary in summarize(&builder, &[]) {
            let last = history
                .records()
                .iter()
                .filter(|(rev, kv)| kv.key == summary.key && (cut == 0 || rev.main <= cut))
                .last()
                .map(|(rev, _)| *rev);
            prop_assert!(matches!(last, Some(rev) if !rev.tombstone));
        }
    }

    #[test]
    fn prop_filters_are_a_conjunction(ops in operations(), n in 0u8..3) {
        let history = build_history(&ops);
        let builder = fold(history.records(), 0);

        let a = vec![Filter::prefix("/a/")];
        let b = parse_filters(&format!(".Value.n={}", n)).unwrap();
        let both: Vec<Filter> = a.iter().chain(b.iter()).cloned().collect();

        let only_a = key_set(&summarize(&builder, &a));
        let only_b = key_set(&summarize(&builder, &b));
        let expected: BTreeSet<Vec<u8>> = only_a.intersection(&only_b).cloned().collect();

        prop_assert_eq!(key_set(&summarize(&builder, &both)), expected);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_file_and_fold_agree(ops in operations(), cut in 0i64..64) {
        let history = build_history(&ops);
        let (_temp, path) = common::write_history(&history);

        let from_file = revscope::list_key_summaries(
            &StorageDecoder::new(),
            &path,
            &[],
            &Projection::Everything,
            cut,
        )
        .unwrap();
        prop_assert_eq!(from_file, summarize(&fold(history.records(), cut), &[]));
    }
}
