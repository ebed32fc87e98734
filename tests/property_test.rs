//! Property-based tests using proptest.
//!
//! These tests verify invariants that should hold for any valid input.

use std::collections::HashSet;

use proptest::prelude::*;

use authodox::domain::{Attachment, ContentId, ProofRecord, UploadShape};
use authodox::reconcile::merge;

// ============================================================================
// Custom Strategies
// ============================================================================

/// Generate a wallet-like author
fn arb_author() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("0xA".to_string()),
        Just("0xB".to_string()),
        "0x[0-9a-f]{40}".prop_map(|s| s),
    ]
}

/// Generate a proof record with a small sequence id so lists collide
fn arb_record(tx_prefix: &'static str) -> impl Strategy<Value = ProofRecord> {
    (0u64..32, arb_author(), any::<i64>()).prop_map(move |(sequence_id, author, timestamp)| {
        ProofRecord {
            prompt_content_id: ContentId::from(format!("{tx_prefix}-p{sequence_id}")),
            response_content_id: ContentId::from(format!("{tx_prefix}-r{sequence_id}")),
            metadata_content_id: ContentId::from(format!("{tx_prefix}-m{sequence_id}")),
            optional_link: String::new(),
            author,
            timestamp,
            sequence_id,
            transaction_ref: tx_prefix.to_string(),
        }
    })
}

/// Chain lists never repeat ids
fn arb_chain_list() -> impl Strategy<Value = Vec<ProofRecord>> {
    prop::collection::vec(arb_record(""), 0..24).prop_map(|records| {
        let mut seen = HashSet::new();
        records
            .into_iter()
            .filter(|r| seen.insert(r.sequence_id))
            .collect()
    })
}

fn arb_files() -> impl Strategy<Value = Vec<Attachment>> {
    prop::collection::vec("[a-z]{1,8}\\.(txt|png|pdf)", 0..5).prop_map(|names| {
        names
            .into_iter()
            .map(|name| Attachment::new(name, b"x".to_vec()))
            .collect()
    })
}

// ============================================================================
// Reconciler
// ============================================================================

proptest! {
    #[test]
    fn merge_has_unique_strictly_descending_ids(
        cached in prop::collection::vec(arb_record("0xcache"), 0..24),
        chain in arb_chain_list(),
    ) {
        let merged = merge(cached, chain);

        for pair in merged.windows(2) {
            prop_assert!(pair[0].sequence_id > pair[1].sequence_id);
        }
    }

    #[test]
    fn merge_prefers_first_cached_copy(
        cached in prop::collection::vec(arb_record("0xcache"), 0..24),
        chain in arb_chain_list(),
    ) {
        let merged = merge(cached.clone(), chain.clone());

        let mut first_cached = std::collections::HashMap::new();
        for record in &cached {
            first_cached.entry(record.sequence_id).or_insert(record);
        }

        for record in &merged {
            match first_cached.get(&record.sequence_id) {
                Some(expected) => prop_assert_eq!(record, *expected),
                None => prop_assert!(chain.contains(record)),
            }
        }

        let expected_ids: HashSet<u64> = cached
            .iter()
            .chain(chain.iter())
            .map(|r| r.sequence_id)
            .collect();
        prop_assert_eq!(merged.len(), expected_ids.len());
    }

    #[test]
    fn merge_with_empty_cache_is_sorted_chain(chain in arb_chain_list()) {
        let merged = merge(Vec::new(), chain.clone());

        let mut expected = chain;
        expected.sort_by(|a, b| b.sequence_id.cmp(&a.sequence_id));
        prop_assert_eq!(merged, expected);
    }
}

// ============================================================================
// Upload shape selection
// ============================================================================

proptest! {
    #[test]
    fn upload_shape_follows_branching_rules(text in "[ a-z]{0,12}", files in arb_files()) {
        let has_text = !text.trim().is_empty();
        let shape = UploadShape::select(&text, &files);

        match (has_text, files.len()) {
            (false, 0) => prop_assert_eq!(shape, None),
            (true, 0) => prop_assert_eq!(shape, Some(UploadShape::Text)),
            (false, 1) => prop_assert_eq!(shape, Some(UploadShape::File)),
            (true, 1) => prop_assert_eq!(shape, Some(UploadShape::TextWithFile)),
            (_, _) => prop_assert_eq!(shape, Some(UploadShape::MultiFile)),
        }

        if let Some(shape) = shape {
            let expected_calls = match shape {
                UploadShape::Text | UploadShape::File => 1,
                UploadShape::TextWithFile => 2,
                UploadShape::MultiFile => files.len() + 1,
            };
            prop_assert_eq!(shape.upload_calls(files.len()), expected_calls);
        }
    }
}
