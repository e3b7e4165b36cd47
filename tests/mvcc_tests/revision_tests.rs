//! Revision Key Tests
//!
//! Tests verify:
//! - Packed and delimited layouts round-trip
//! - Length, marker and separator validation
//! - Byte order matches revision order

use proptest::prelude::*;
use revscope::mvcc::{RevisionKey, RevisionLayout};
use revscope::RevscopeError;

// =============================================================================
// Packed Layout Tests
// =============================================================================

#[test]
fn test_decode_live_key() {
    let mut raw = 5i64.to_be_bytes().to_vec();
    raw.extend_from_slice(&2i64.to_be_bytes());

    let rev = RevisionKey::decode(&raw).unwrap();
    assert_eq!(rev, RevisionKey::new(5, 2));
    assert!(!rev.tombstone);
}

#[test]
fn test_decode_tombstone_key() {
    let mut raw = 9i64.to_be_bytes().to_vec();
    raw.extend_from_slice(&0i64.to_be_bytes());
    raw.push(b't');

    let rev = RevisionKey::decode(&raw).unwrap();
    assert_eq!(rev, RevisionKey::tombstone(9, 0));
}

#[test]
fn test_encode_lengths() {
    assert_eq!(RevisionKey::new(1, 0).encode().len(), 16);
    assert_eq!(RevisionKey::tombstone(1, 0).encode().len(), 17);
}

#[test]
fn test_decode_rejects_bad_lengths() {
    for len in [0usize, 8, 15, 18, 32] {
        let raw = vec![0u8; len];
        assert!(
            matches!(RevisionKey::decode(&raw), Err(RevscopeError::CorruptRecord(_))),
            "length {} accepted",
            len
        );
    }
}

#[test]
fn test_decode_rejects_unknown_marker() {
    let mut raw = RevisionKey::new(3, 1).encode();
    raw.push(b'x');
    assert!(matches!(
        RevisionKey::decode(&raw),
        Err(RevscopeError::CorruptRecord(_))
    ));
}

// =============================================================================
// Delimited Layout Tests
// =============================================================================

#[test]
fn test_delimited_encoding() {
    let raw = RevisionKey::tombstone(7, 3).encode_with(RevisionLayout::Delimited);
    assert_eq!(raw.len(), 18);
    assert_eq!(raw[8], b'_');
    assert_eq!(raw[17], b't');
    assert_eq!(
        RevisionKey::decode_with(&raw, RevisionLayout::Delimited).unwrap(),
        RevisionKey::tombstone(7, 3)
    );
}

#[test]
fn test_delimited_rejects_missing_separator() {
    let mut raw = RevisionKey::new(7, 3).encode_with(RevisionLayout::Delimited);
    raw[8] = b'-';
    assert!(matches!(
        RevisionKey::decode_with(&raw, RevisionLayout::Delimited),
        Err(RevscopeError::CorruptRecord(_))
    ));
}

#[test]
fn test_packed_key_is_not_delimited() {
    // A 16 byte packed key is too short for the delimited layout.
    let raw = RevisionKey::new(7, 3).encode();
    assert!(RevisionKey::decode_with(&raw, RevisionLayout::Delimited).is_err());
}

// =============================================================================
// Ordering Tests
// =============================================================================

#[test]
fn test_display() {
    assert_eq!(RevisionKey::new(12, 1).to_string(), "12_1");
    assert_eq!(RevisionKey::tombstone(12, 0).to_string(), "12_0t");
}

#[test]
fn test_ordering_follows_main_then_sub() {
    let mut revs = vec![
        RevisionKey::new(3, 0),
        RevisionKey::new(2, 5),
        RevisionKey::tombstone(2, 1),
        RevisionKey::new(2, 0),
    ];
    revs.sort();
    assert_eq!(
        revs,
        vec![
            RevisionKey::new(2, 0),
            RevisionKey::tombstone(2, 1),
            RevisionKey::new(2, 5),
            RevisionKey::new(3, 0),
        ]
    );
}

// =============================================================================
// Property Tests
// =============================================================================

fn layouts() -> impl Strategy<Value = RevisionLayout> {
    prop_oneof![Just(RevisionLayout::Packed), Just(RevisionLayout::Delimited)]
}

proptest! {
    #[test]
    fn prop_round_trip(main in any::<i64>(), sub in any::<i64>(), tombstone in any::<bool>(), layout in layouts()) {
        let rev = RevisionKey { main, sub, tombstone };
        let raw = rev.encode_with(layout);
        prop_assert_eq!(RevisionKey::decode_with(&raw, layout).unwrap(), rev);
    }

    #[test]
    fn prop_byte_order_matches_revision_order(
        a in (0i64..1 << 40, 0i64..1 << 20),
        b in (0i64..1 << 40, 0i64..1 << 20),
    ) {
        let left = RevisionKey::new(a.0, a.1).encode();
        let right = RevisionKey::new(b.0, b.1).encode();
        prop_assert_eq!(left.cmp(&right), a.cmp(&b));
    }
}
