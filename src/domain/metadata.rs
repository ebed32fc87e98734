//! NFT metadata document minted alongside every proof.

use serde::{Deserialize, Serialize};

use super::types::{Attachment, ContentId};

/// Number of prompt characters quoted in the metadata description.
const DESCRIPTION_PREVIEW_CHARS: usize = 50;

/// ERC-721 style metadata uploaded before the contract call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofMetadata {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub attributes: Vec<MetadataAttribute>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataAttribute {
    pub trait_type: String,
    pub value: serde_json::Value,
}

impl MetadataAttribute {
    fn new(trait_type: &str, value: impl Into<serde_json::Value>) -> Self {
        Self {
            trait_type: trait_type.to_string(),
            value: value.into(),
        }
    }
}

/// Inputs for [`ProofMetadata::build`].
#[derive(Debug, Clone)]
pub struct MetadataInputs<'a> {
    pub prompt_text: &'a str,
    pub prompt_content_id: &'a ContentId,
    pub response_content_id: &'a ContentId,
    /// First response attachment; an image here becomes the NFT image
    pub response_file: Option<&'a Attachment>,
    pub author: &'a str,
    /// Seconds since epoch
    pub timestamp: i64,
    /// Milliseconds since epoch, used in the display name
    pub timestamp_millis: i64,
    pub optional_link: &'a str,
}

impl ProofMetadata {
    pub fn build(inputs: &MetadataInputs<'_>) -> Self {
        let preview: String = inputs
            .prompt_text
            .chars()
            .take(DESCRIPTION_PREVIEW_CHARS)
            .collect();

        let image = inputs
            .response_file
            .filter(|file| file.is_image())
            .map(|_| inputs.response_content_id.to_ipfs_uri());

        let chat_link = if inputs.optional_link.is_empty() {
            "N/A"
        } else {
            inputs.optional_link
        };

        Self {
            name: format!("Autho.D.oX Proof #{}", inputs.timestamp_millis),
            description: format!("Proof of authorship for: {}...", preview),
            image,
            attributes: vec![
                MetadataAttribute::new("Prompt CID", inputs.prompt_content_id.as_str()),
                MetadataAttribute::new("Content CID", inputs.response_content_id.as_str()),
                MetadataAttribute::new("Author", inputs.author),
                MetadataAttribute::new("Timestamp", inputs.timestamp),
                MetadataAttribute::new("Chat Link", chat_link),
            ],
        }
    }
}
