//! SQLite implementations
//!
//! Provides the local proof cache used for fast gallery reads.

mod proof_cache;

pub use proof_cache::*;
