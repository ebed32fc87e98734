//! Error types for Autho.D.oX

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while uploading, minting or reading proofs
#[derive(Error, Debug)]
pub enum AuthodoxError {
    /// Missing required text or files
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No wallet account is connected
    #[error("Please connect your wallet first")]
    WalletNotConnected,

    /// Wallet is connected to the wrong chain
    #[error("wrong network: expected chain id {expected}, connected to {actual}")]
    NetworkMismatch { expected: u64, actual: u64 },

    /// Content store unreachable or rejected the upload
    #[error("IPFS Upload Failed: {0}")]
    UploadFailure(String),

    /// User declined the transaction or the chain reverted it
    #[error("transaction rejected: {0}")]
    TransactionRejected(String),

    /// Contract, gateway or cache query error
    #[error("read failure: {0}")]
    ReadFailure(String),

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Requested item not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

/// Coarse error bucket surfaced to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    NetworkMismatch,
    UploadFailure,
    TransactionRejected,
    ReadFailure,
    Internal,
}

impl AuthodoxError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthodoxError::InvalidInput(_) | AuthodoxError::WalletNotConnected => {
                ErrorKind::InvalidInput
            }
            AuthodoxError::NetworkMismatch { .. } => ErrorKind::NetworkMismatch,
            AuthodoxError::UploadFailure(_) => ErrorKind::UploadFailure,
            AuthodoxError::TransactionRejected(_) => ErrorKind::TransactionRejected,
            AuthodoxError::ReadFailure(_)
            | AuthodoxError::Database(_)
            | AuthodoxError::NotFound(_) => ErrorKind::ReadFailure,
            AuthodoxError::Configuration(_) | AuthodoxError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Wrap any error as an upload failure, leaving existing upload failures untouched.
    pub fn into_upload_failure(self) -> Self {
        match self {
            AuthodoxError::UploadFailure(_) => self,
            other => AuthodoxError::UploadFailure(other.to_string()),
        }
    }

    /// Short human-readable notice for display.
    pub fn user_notice(&self) -> String {
        match self {
            AuthodoxError::InvalidInput(msg) => msg.clone(),
            AuthodoxError::WalletNotConnected => self.to_string(),
            AuthodoxError::NetworkMismatch { expected, .. } => format!(
                "Wrong Network: please switch to Polygon Amoy Testnet (Chain ID: {expected}) in your wallet."
            ),
            AuthodoxError::UploadFailure(_) => self.to_string(),
            AuthodoxError::TransactionRejected(msg) => classify_wallet_message(msg),
            AuthodoxError::ReadFailure(_) | AuthodoxError::Database(_) => {
                "Unable to load proofs right now. Please try again.".to_string()
            }
            AuthodoxError::NotFound(what) => format!("{what} not found"),
            AuthodoxError::Configuration(_) | AuthodoxError::Internal(_) => {
                "Please try again".to_string()
            }
        }
    }
}

/// Map raw wallet/provider messages onto notices a user can act on.
pub fn classify_wallet_message(message: &str) -> String {
    let lower = message.to_ascii_lowercase();
    if lower.contains("circuit breaker") {
        "Wallet connection issue. Please reconnect and ensure you're on the correct network."
            .to_string()
    } else if lower.contains("user rejected") || lower.contains("user denied") {
        "Transaction was cancelled".to_string()
    } else if lower.contains("network") {
        "Network connection failed. Please check your wallet is connected to the correct blockchain network."
            .to_string()
    } else {
        message.to_string()
    }
}

/// Result type for Autho.D.oX operations
pub type Result<T> = std::result::Result<T, AuthodoxError>;
