//! Autho.D.oX Library
//!
//! Registers prompt/response pairs as on-chain proofs of authorship: content
//! goes to IPFS, a registry contract mints the record, and a local cache
//! serves fast reads that are reconciled with a direct chain scan.
//!
//! ## Modules
//!
//! - [`domain`] - Core domain types (proof records, content ids, envelopes, metadata)
//! - [`infra`] - Errors, service traits and the SQLite proof cache
//! - [`content`] - Pinata/IPFS client, uploader and content resolver
//! - [`ledger`] - Proof registry contract client
//! - [`chain_reader`] - On-chain record enumeration
//! - [`reconcile`] - Cache/chain merge
//! - [`gallery`] - Reconciled proof listing
//! - [`wallet`] - Wallet session state
//! - [`submission`] - Proof submission flow
//! - [`api`] - REST API routes
//! - [`telemetry`] - Logging and OpenTelemetry integration

pub mod api;
pub mod chain_reader;
pub mod content;
pub mod domain;
pub mod gallery;
pub mod infra;
pub mod ledger;
pub mod migrations;
pub mod reconcile;
pub mod server;
pub mod submission;
pub mod telemetry;
pub mod wallet;

// Re-export commonly used types
pub use domain::{Attachment, ContentId, ProofRecord, SequenceId};

pub use infra::{AuthodoxError, ContentStore, ProofCache, ProofLedger, Result, WalletProvider};
