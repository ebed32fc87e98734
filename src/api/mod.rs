//! API layer for Autho.D.oX
//!
//! REST endpoints for proof submission, the gallery, content read-back and
//! the wallet session.

pub mod error;
mod rest;
pub mod types;
pub mod utils;

pub use error::{ApiError, ErrorCode};
pub use rest::*;
