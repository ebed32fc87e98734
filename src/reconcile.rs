//! Reconciler: merges the fast cache with the authoritative chain scan.
//!
//! Cached copies win over chain-scanned copies of the same sequence id. The
//! result holds each sequence id once, ordered strictly descending.

use std::collections::HashSet;

use crate::domain::{ProofRecord, SequenceId};

/// Merge cached and chain-scanned records.
///
/// Cached records are taken first (in the order given, newest row first),
/// then any chain-scanned record whose sequence id is not already present.
/// Duplicate ids inside either list keep their first occurrence.
pub fn merge(cached: Vec<ProofRecord>, chain_scanned: Vec<ProofRecord>) -> Vec<ProofRecord> {
    let mut seen: HashSet<SequenceId> = HashSet::with_capacity(cached.len() + chain_scanned.len());

    let mut merged: Vec<ProofRecord> = cached
        .into_iter()
        .chain(chain_scanned)
        .filter(|record| seen.insert(record.sequence_id))
        .collect();

    merged.sort_by(|a, b| b.sequence_id.cmp(&a.sequence_id));
    merged
}
