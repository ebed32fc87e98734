//! Submission flow: registers a prompt/response pair as an on-chain proof.
//!
//! Stages run strictly in order with no retries. A failure at any stage
//! reports [`SubmissionStage::Error`] and aborts; content already uploaded
//! is left orphaned in the content store.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::content::ContentUploader;
use crate::domain::{Attachment, MetadataInputs, ProofMetadata, ProofRecord};
use crate::infra::{
    AuthodoxError, ProofCache, ProofLedger, RegisterProofCall, Result, WalletProvider,
};
use crate::wallet::WalletSession;

/// Where the user is sent after a successful submission
pub const GALLERY_REDIRECT: &str = "/gallery";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStage {
    Idle,
    ValidatingInput,
    VerifyingNetwork,
    UploadingContent,
    GeneratingMetadata,
    SendingTransaction,
    AwaitingConfirmation,
    CachingResult,
    Done,
    Error,
}

impl SubmissionStage {
    /// Progress notice shown for the stage.
    pub fn notice(&self) -> &'static str {
        match self {
            SubmissionStage::Idle => "Ready",
            SubmissionStage::ValidatingInput => "Checking input...",
            SubmissionStage::VerifyingNetwork => "Verifying network connection...",
            SubmissionStage::UploadingContent => "Uploading prompt & content to IPFS...",
            SubmissionStage::GeneratingMetadata => "Generating NFT metadata...",
            SubmissionStage::SendingTransaction => {
                "Sending transaction to blockchain... Please confirm in wallet."
            }
            SubmissionStage::AwaitingConfirmation => "Waiting for confirmation...",
            SubmissionStage::CachingResult => "Caching proof data...",
            SubmissionStage::Done => "Asset Registered!",
            SubmissionStage::Error => "Transaction Failed",
        }
    }
}

/// Receives stage transitions as the flow progresses.
pub trait ProgressSink: Send + Sync {
    fn stage(&self, stage: SubmissionStage);
}

/// Discards progress.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn stage(&self, _stage: SubmissionStage) {}
}

/// Keeps every reported stage in order.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    stages: Mutex<Vec<SubmissionStage>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stages(&self) -> Vec<SubmissionStage> {
        self.stages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last(&self) -> Option<SubmissionStage> {
        self.stages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .copied()
    }
}

impl ProgressSink for RecordingProgress {
    fn stage(&self, stage: SubmissionStage) {
        self.stages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(stage);
    }
}

/// Everything the user entered.
#[derive(Debug, Clone, Default)]
pub struct SubmissionRequest {
    pub prompt_text: String,
    pub prompt_files: Vec<Attachment>,
    pub response_text: String,
    pub response_files: Vec<Attachment>,
    pub optional_link: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOutcome {
    pub record: ProofRecord,
    /// The mint event was missing and the sequence id defaulted to 0
    pub sequence_id_assumed: bool,
    pub block_number: Option<u64>,
    pub redirect: &'static str,
}

pub struct SubmissionFlow {
    uploader: ContentUploader,
    ledger: Arc<dyn ProofLedger>,
    wallet: Arc<dyn WalletProvider>,
    session: Arc<WalletSession>,
    cache: Arc<dyn ProofCache>,
    required_chain_id: u64,
}

impl SubmissionFlow {
    pub fn new(
        uploader: ContentUploader,
        ledger: Arc<dyn ProofLedger>,
        wallet: Arc<dyn WalletProvider>,
        session: Arc<WalletSession>,
        cache: Arc<dyn ProofCache>,
        required_chain_id: u64,
    ) -> Self {
        Self {
            uploader,
            ledger,
            wallet,
            session,
            cache,
            required_chain_id,
        }
    }

    /// Run the whole flow, reporting each stage to `progress`.
    pub async fn submit(
        &self,
        request: &SubmissionRequest,
        progress: &dyn ProgressSink,
    ) -> Result<SubmissionOutcome> {
        progress.stage(SubmissionStage::Idle);
        match self.run(request, progress).await {
            Ok(outcome) => {
                progress.stage(SubmissionStage::Done);
                info!(
                    sequence_id = outcome.record.sequence_id,
                    tx = %outcome.record.transaction_ref,
                    "Proof registered"
                );
                Ok(outcome)
            }
            Err(e) => {
                progress.stage(SubmissionStage::Error);
                error!(kind = ?e.kind(), "Submission failed: {}", e);
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        request: &SubmissionRequest,
        progress: &dyn ProgressSink,
    ) -> Result<SubmissionOutcome> {
        progress.stage(SubmissionStage::ValidatingInput);
        let author = self.validate(request)?;

        progress.stage(SubmissionStage::VerifyingNetwork);
        self.verify_network().await?;

        progress.stage(SubmissionStage::UploadingContent);
        let prompt_content_id = self
            .uploader
            .upload(&request.prompt_text, &request.prompt_files)
            .await?;
        let response_content_id = self
            .uploader
            .upload(&request.response_text, &request.response_files)
            .await?;

        progress.stage(SubmissionStage::GeneratingMetadata);
        let now = Utc::now();
        let metadata = ProofMetadata::build(&MetadataInputs {
            prompt_text: &request.prompt_text,
            prompt_content_id: &prompt_content_id,
            response_content_id: &response_content_id,
            response_file: request.response_files.first(),
            author: &author,
            timestamp: now.timestamp(),
            timestamp_millis: now.timestamp_millis(),
            optional_link: &request.optional_link,
        });
        let metadata_json = serde_json::to_string(&metadata)
            .map_err(|e| AuthodoxError::Internal(format!("metadata serialization: {e}")))?;
        let metadata_content_id = self.uploader.upload(&metadata_json, &[]).await?;

        progress.stage(SubmissionStage::SendingTransaction);
        let call = RegisterProofCall {
            prompt_content_id,
            response_content_id,
            metadata_content_id,
            optional_link: request.optional_link.clone(),
        };

        let transaction_ref = self.ledger.send_registration(&call).await?;

        progress.stage(SubmissionStage::AwaitingConfirmation);
        let receipt = self.ledger.await_registration(&transaction_ref).await?;

        let sequence_id_assumed = receipt.sequence_id.is_none();
        let sequence_id = receipt.sequence_id.unwrap_or_else(|| {
            warn!(
                tx = %receipt.transaction_ref,
                "ProofRegistered event missing from receipt; defaulting sequence id to 0"
            );
            0
        });

        progress.stage(SubmissionStage::CachingResult);
        let record = ProofRecord {
            prompt_content_id: call.prompt_content_id,
            response_content_id: call.response_content_id,
            metadata_content_id: call.metadata_content_id,
            optional_link: call.optional_link,
            author,
            timestamp: Utc::now().timestamp(),
            sequence_id,
            transaction_ref: receipt.transaction_ref,
        };

        // An assumed id must never replace a real record 0
        let row_id = if sequence_id_assumed {
            self.cache.insert(&record).await?
        } else {
            self.cache.upsert_by_sequence_id(&record).await?
        };
        info!(row_id, sequence_id, "Proof cached");

        Ok(SubmissionOutcome {
            record,
            sequence_id_assumed,
            block_number: receipt.block_number,
            redirect: GALLERY_REDIRECT,
        })
    }

    /// Returns the connected wallet address.
    fn validate(&self, request: &SubmissionRequest) -> Result<String> {
        if request.prompt_text.trim().is_empty() {
            return Err(AuthodoxError::InvalidInput(
                "Please enter your prompt text".to_string(),
            ));
        }
        if request.response_text.trim().is_empty() {
            return Err(AuthodoxError::InvalidInput(
                "Please enter the AI response text".to_string(),
            ));
        }
        self.session
            .current()
            .map(|wallet| wallet.address)
            .ok_or(AuthodoxError::WalletNotConnected)
    }

    async fn verify_network(&self) -> Result<()> {
        let actual = self.wallet.chain_id().await.map_err(|e| {
            AuthodoxError::ReadFailure(format!(
                "Unable to connect to blockchain network: {e}"
            ))
        })?;
        info!(chain_id = actual, "Connected to network");

        if actual != self.required_chain_id {
            return Err(AuthodoxError::NetworkMismatch {
                expected: self.required_chain_id,
                actual,
            });
        }
        Ok(())
    }
}
