//! The proof record: one registered prompt/response pair.

use serde::{Deserialize, Serialize};

use super::types::{ContentId, SequenceId};

/// Canonical record of a registered prompt/response pair.
///
/// The same shape is produced by the submission path (cached, with a
/// transaction reference) and by direct chain enumeration (no transaction
/// reference available).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofRecord {
    /// Content id of the uploaded prompt
    pub prompt_content_id: ContentId,
    /// Content id of the uploaded response
    pub response_content_id: ContentId,
    /// Content id of the uploaded NFT metadata document
    pub metadata_content_id: ContentId,
    /// Free-text link to the originating conversation, may be empty
    pub optional_link: String,
    /// Wallet address of the author
    pub author: String,
    /// Seconds since the Unix epoch
    pub timestamp: i64,
    /// Identifier assigned by the contract at mint time
    pub sequence_id: SequenceId,
    /// Minting transaction hash; empty for chain-enumerated records
    #[serde(default)]
    pub transaction_ref: String,
}

impl ProofRecord {
    /// True when the record went through the cached submission path.
    pub fn has_transaction_ref(&self) -> bool {
        !self.transaction_ref.is_empty()
    }

    /// Case-insensitive author comparison (addresses may be checksummed or lowercase).
    pub fn authored_by(&self, author: &str) -> bool {
        self.author.eq_ignore_ascii_case(author.trim())
    }
}
