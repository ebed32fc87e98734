//! Shared request and response types for REST API handlers.

use serde::{Deserialize, Serialize};

use crate::content::KeyStatus;
use crate::domain::{Attachment, ProofRecord};
use crate::submission::{SubmissionOutcome, SubmissionRequest, SubmissionStage};

use super::error::{validation_error, ApiError};
use super::utils::decode_base64_any;

// ============================================================================
// Submission types
// ============================================================================

/// A file attached to a submission, base64 encoded.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentPayload {
    pub name: String,
    #[serde(default)]
    pub content_type: Option<String>,
    /// Base64 body; a `data:` URL is accepted
    pub data: String,
}

impl AttachmentPayload {
    pub fn decode(&self) -> Result<Attachment, ApiError> {
        if self.name.trim().is_empty() {
            return Err(validation_error("name", "Attachment name is required"));
        }
        let bytes = decode_base64_any(&self.data)
            .map_err(|e| e.with_resource_id(self.name.clone()))?;
        let attachment = Attachment::new(self.name.clone(), bytes);
        Ok(match &self.content_type {
            Some(content_type) => attachment.with_content_type(content_type.clone()),
            None => attachment,
        })
    }
}

/// Request body for `POST /api/v1/proofs`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitProofRequest {
    #[serde(default)]
    pub prompt_text: String,
    #[serde(default)]
    pub prompt_files: Vec<AttachmentPayload>,
    #[serde(default)]
    pub response_text: String,
    #[serde(default)]
    pub response_files: Vec<AttachmentPayload>,
    /// Shared chat link; also accepted as `chatLink`
    #[serde(default, alias = "chatLink")]
    pub optional_link: String,
}

impl SubmitProofRequest {
    pub fn into_submission(self) -> Result<SubmissionRequest, ApiError> {
        let prompt_files = self
            .prompt_files
            .iter()
            .map(AttachmentPayload::decode)
            .collect::<Result<Vec<_>, _>>()?;
        let response_files = self
            .response_files
            .iter()
            .map(AttachmentPayload::decode)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SubmissionRequest {
            prompt_text: self.prompt_text,
            prompt_files,
            response_text: self.response_text,
            response_files,
            optional_link: self.optional_link.trim().to_string(),
        })
    }
}

/// Response for `POST /api/v1/proofs`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitProofResponse {
    #[serde(flatten)]
    pub outcome: SubmissionOutcome,
    pub stages: Vec<SubmissionStage>,
}

// ============================================================================
// Listing types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct AuthorQuery {
    #[serde(default)]
    pub author: Option<String>,
}

impl AuthorQuery {
    /// The author filter, if one was given.
    pub fn author(&self) -> Option<&str> {
        self.author
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofListResponse {
    pub proofs: Vec<ProofRecord>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_scan_complete: Option<bool>,
}

// ============================================================================
// Debug types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyStatusResponse {
    pub status: KeyStatus,
    pub valid: bool,
    pub message: &'static str,
}

impl From<KeyStatus> for KeyStatusResponse {
    fn from(status: KeyStatus) -> Self {
        Self {
            status,
            valid: status.is_valid(),
            message: status.message(),
        }
    }
}
