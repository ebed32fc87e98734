//! Trait definitions for the external services Autho.D.oX talks to

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::Serialize;

use crate::domain::{Attachment, ContentId, ProofRecord, SequenceId};

use super::Result;

/// Off-chain content store (IPFS pinning service + gateway).
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Upload raw bytes as a named file
    async fn upload_file(&self, file: &Attachment) -> Result<ContentId>;

    /// Upload an arbitrary JSON document
    async fn upload_json(&self, document: &serde_json::Value) -> Result<ContentId>;

    /// Read content back through the gateway
    async fn fetch(&self, id: &ContentId) -> Result<Vec<u8>>;

    /// Public gateway URL for a content id
    fn gateway_url(&self, id: &str) -> String;
}

/// Proof fields as stored by the registry contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnChainProof {
    pub prompt_content_id: String,
    pub response_content_id: String,
    pub metadata_content_id: String,
    pub optional_link: String,
    pub author: String,
    pub timestamp: i64,
}

/// Arguments of `registerProof`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterProofCall {
    pub prompt_content_id: ContentId,
    pub response_content_id: ContentId,
    pub metadata_content_id: ContentId,
    pub optional_link: String,
}

/// Outcome of a confirmed `registerProof` transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationReceipt {
    /// Transaction hash (0x-prefixed hex)
    pub transaction_ref: String,
    /// Sequence id from the `ProofRegistered` event, if the event was found
    pub sequence_id: Option<SequenceId>,
    pub block_number: Option<u64>,
}

/// Client of the deployed proof registry contract.
///
/// The contract's consensus rules are opaque; this is a thin call surface.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProofLedger: Send + Sync {
    /// Address of the NFT contract linked to the registry
    async fn nft_contract(&self) -> Result<String>;

    /// Owner of `token_id`; fails once `token_id` has not been issued
    async fn owner_of(&self, nft_contract: &str, token_id: SequenceId) -> Result<String>;

    /// Read one proof by sequence id
    async fn proof_data(&self, sequence_id: SequenceId) -> Result<OnChainProof>;

    /// Sign and broadcast `registerProof`, returning the transaction hash.
    /// Fails here when the wallet declines or the node refuses the transaction.
    async fn send_registration(&self, call: &RegisterProofCall) -> Result<String>;

    /// Wait for the receipt of a sent registration; fails if it reverted
    async fn await_registration(&self, transaction_ref: &str) -> Result<RegistrationReceipt>;
}

/// Wallet provider: account access and network queries.
///
/// Signing is delegated to whatever backs the provider.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Request account access (may prompt the user)
    async fn request_accounts(&self) -> Result<Vec<String>>;

    /// Accounts already authorised, without prompting
    async fn accounts(&self) -> Result<Vec<String>>;

    /// Chain id the provider is currently connected to
    async fn chain_id(&self) -> Result<u64>;
}

/// Fast read-side cache of proof records.
///
/// `insert` never checks for an existing `sequence_id` and may create
/// duplicates; `upsert_by_sequence_id` replaces the first matching row.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProofCache: Send + Sync {
    /// Insert a new row unconditionally, returning its row id
    async fn insert(&self, record: &ProofRecord) -> Result<i64>;

    /// Replace all fields of the row with the same sequence id, or insert
    async fn upsert_by_sequence_id(&self, record: &ProofRecord) -> Result<i64>;

    /// All cached records, newest first
    async fn query_all(&self) -> Result<Vec<ProofRecord>>;

    /// Records by one author, newest first
    async fn query_by_author(&self, author: &str) -> Result<Vec<ProofRecord>>;

    /// Number of cached rows
    async fn count(&self) -> Result<u64>;
}
