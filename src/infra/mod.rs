//! Infrastructure layer for Autho.D.oX
//!
//! Contains the error taxonomy, trait definitions for the external services
//! (content store, ledger contract, wallet provider, proof cache) and the
//! SQLite proof cache implementation.

mod error;
pub mod sqlite;
mod traits;

pub use error::*;
pub use sqlite::SqliteProofCache;
pub use traits::*;
