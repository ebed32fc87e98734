//! Domain types for Autho.D.oX
//!
//! - [`ProofRecord`]: the normalized record shared by cache and chain reads
//! - [`ContentId`] / [`Attachment`]: content-store inputs and outputs
//! - Envelopes bundling text with file ids, and their decoded read-back form
//! - [`ProofMetadata`]: the NFT metadata document

mod envelope;
mod metadata;
mod proof;
mod types;

pub use envelope::*;
pub use metadata::*;
pub use proof::*;
pub use types::*;
