//! Core type definitions for Autho.D.oX
//!
//! Identifiers shared by the content store, the ledger contract and the
//! read cache.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Chain ID of the Polygon Amoy testnet, the network the registry lives on.
pub const POLYGON_AMOY_CHAIN_ID: u64 = 80002;

/// Sequence identifier assigned by the ledger contract at mint time.
pub type SequenceId = u64;

/// Opaque identifier addressing a piece of content in the content store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(pub String);

impl ContentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// `ipfs://` URI form used inside NFT metadata.
    pub fn to_ipfs_uri(&self) -> String {
        format!("ipfs://{}", self.0)
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ContentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ContentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for ContentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A file attached to a prompt or response.
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Original file name, used as the uploaded file name
    pub name: String,
    /// MIME type if known
    pub content_type: Option<String>,
    /// Raw file bytes
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Plain-text attachment, as produced when free text is uploaded on its own.
    pub fn text(name: impl Into<String>, text: &str) -> Self {
        Self::new(name, text.as_bytes().to_vec()).with_content_type("text/plain")
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether the file name carries a common image extension.
    pub fn is_image(&self) -> bool {
        const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "svg", "webp"];

        self.name
            .rsplit_once('.')
            .map(|(_, ext)| {
                let ext = ext.to_ascii_lowercase();
                IMAGE_EXTENSIONS.contains(&ext.as_str())
            })
            .unwrap_or(false)
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}
