//! Off-chain content handling
//!
//! - [`PinataContentStore`]: IPFS pinning + gateway client
//! - [`ContentUploader`]: picks an upload shape and returns one content id
//! - [`ContentResolver`]: reads content back and unpacks envelopes

mod pinata;
mod resolver;
mod uploader;

pub use pinata::*;
pub use resolver::*;
pub use uploader::*;
