//! Structured API error responses with error codes
//!
//! Every endpoint reports failures as `{ "error": { code, numeric_code,
//! message, ... } }` with an `x-error-code` header.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::infra::AuthodoxError;

// ============================================================================
// Error Codes
// ============================================================================

/// Error codes for API responses
///
/// These codes are stable and can be used by clients for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (3xxx)
    /// Field value is invalid
    InvalidFieldValue,
    /// Attachment could not be decoded
    InvalidAttachment,

    // Resource errors (4xxx)
    /// Requested resource not found
    ResourceNotFound,
    /// No content behind a content id
    ContentNotFound,

    // Wallet / network errors (5xxx)
    /// Wallet is on the wrong chain
    NetworkMismatch,
    /// No wallet connected
    WalletNotConnected,

    // Content store errors (6xxx)
    /// Upload to the content store failed
    UploadFailed,

    // Ledger errors (7xxx)
    /// Transaction declined or reverted
    TransactionRejected,
    /// Ledger client not configured
    LedgerNotConfigured,

    // Infrastructure errors (8xxx)
    /// Contract, gateway or cache read failed
    ReadFailed,
    /// Database operation failed
    DatabaseError,
    /// Internal server error
    InternalError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn numeric_code(&self) -> u32 {
        match self {
            // Validation (3xxx)
            ErrorCode::InvalidFieldValue => 3003,
            ErrorCode::InvalidAttachment => 3004,

            // Resource (4xxx)
            ErrorCode::ResourceNotFound => 4001,
            ErrorCode::ContentNotFound => 4002,

            // Wallet / network (5xxx)
            ErrorCode::NetworkMismatch => 5001,
            ErrorCode::WalletNotConnected => 5002,

            // Content store (6xxx)
            ErrorCode::UploadFailed => 6001,

            // Ledger (7xxx)
            ErrorCode::TransactionRejected => 7001,
            ErrorCode::LedgerNotConfigured => 7002,

            // Infrastructure (8xxx)
            ErrorCode::ReadFailed => 8001,
            ErrorCode::DatabaseError => 8002,
            ErrorCode::InternalError => 8999,
        }
    }

    /// Get the HTTP status code for this error
    pub fn http_status(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidFieldValue | ErrorCode::InvalidAttachment => StatusCode::BAD_REQUEST,

            ErrorCode::ResourceNotFound | ErrorCode::ContentNotFound => StatusCode::NOT_FOUND,

            ErrorCode::NetworkMismatch => StatusCode::CONFLICT,
            ErrorCode::WalletNotConnected => StatusCode::PRECONDITION_FAILED,

            ErrorCode::UploadFailed | ErrorCode::ReadFailed => StatusCode::BAD_GATEWAY,

            ErrorCode::TransactionRejected => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::LedgerNotConfigured => StatusCode::SERVICE_UNAVAILABLE,

            ErrorCode::DatabaseError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code_str = match self {
            ErrorCode::InvalidFieldValue => "INVALID_FIELD_VALUE",
            ErrorCode::InvalidAttachment => "INVALID_ATTACHMENT",
            ErrorCode::ResourceNotFound => "RESOURCE_NOT_FOUND",
            ErrorCode::ContentNotFound => "CONTENT_NOT_FOUND",
            ErrorCode::NetworkMismatch => "NETWORK_MISMATCH",
            ErrorCode::WalletNotConnected => "WALLET_NOT_CONNECTED",
            ErrorCode::UploadFailed => "UPLOAD_FAILED",
            ErrorCode::TransactionRejected => "TRANSACTION_REJECTED",
            ErrorCode::LedgerNotConfigured => "LEDGER_NOT_CONFIGURED",
            ErrorCode::ReadFailed => "READ_FAILED",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", code_str)
    }
}

// ============================================================================
// Structured Error Response
// ============================================================================

/// Structured error response for API endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error details
    pub error: ErrorDetails,
}

/// Detailed error information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Numeric error code for easy categorization
    pub numeric_code: u32,

    /// Human-readable error message
    pub message: String,

    /// Additional error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,

    /// Related resource ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
}

impl ApiError {
    /// Create a new API error
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetails {
                code,
                numeric_code: code.numeric_code(),
                message: message.into(),
                details: None,
                resource_id: None,
            },
        }
    }

    /// Set additional details
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.error.details = Some(details);
        self
    }

    /// Set related resource ID
    pub fn with_resource_id(mut self, id: impl Into<String>) -> Self {
        self.error.resource_id = Some(id.into());
        self
    }

    /// Get the HTTP status code
    pub fn status(&self) -> StatusCode {
        self.error.code.http_status()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code_str = self.error.code.to_string();
        let mut response = (status, Json(self)).into_response();

        // Add error code header for easier debugging
        if let Ok(code_value) = axum::http::HeaderValue::from_str(&code_str) {
            response.headers_mut().insert(
                axum::http::header::HeaderName::from_static("x-error-code"),
                code_value,
            );
        }

        response
    }
}

// ============================================================================
// Conversion from AuthodoxError
// ============================================================================

impl From<AuthodoxError> for ApiError {
    fn from(err: AuthodoxError) -> Self {
        let notice = err.user_notice();
        match err {
            AuthodoxError::InvalidInput(msg) => ApiError::new(ErrorCode::InvalidFieldValue, msg),
            AuthodoxError::WalletNotConnected => {
                ApiError::new(ErrorCode::WalletNotConnected, notice)
            }
            AuthodoxError::NetworkMismatch { expected, actual } => {
                ApiError::new(ErrorCode::NetworkMismatch, notice).with_details(
                    serde_json::json!({
                        "expected_chain_id": expected,
                        "actual_chain_id": actual
                    }),
                )
            }
            AuthodoxError::UploadFailure(_) => ApiError::new(ErrorCode::UploadFailed, notice),
            AuthodoxError::TransactionRejected(msg) => {
                ApiError::new(ErrorCode::TransactionRejected, notice)
                    .with_details(serde_json::json!({ "reason": msg }))
            }
            AuthodoxError::ReadFailure(msg) => ApiError::new(ErrorCode::ReadFailed, msg),
            AuthodoxError::Database(e) => {
                ApiError::new(ErrorCode::DatabaseError, format!("Database error: {}", e))
            }
            AuthodoxError::NotFound(what) => {
                ApiError::new(ErrorCode::ResourceNotFound, notice).with_resource_id(what)
            }
            AuthodoxError::Configuration(msg) => {
                ApiError::new(ErrorCode::InternalError, format!("Configuration error: {}", msg))
            }
            AuthodoxError::Internal(msg) => ApiError::new(ErrorCode::InternalError, msg),
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Create a validation error with field details
pub fn validation_error(field: &str, message: impl Into<String>) -> ApiError {
    ApiError::new(ErrorCode::InvalidFieldValue, message.into())
        .with_details(serde_json::json!({ "field": field }))
}

/// Ledger-backed endpoint called without a configured ledger
pub fn ledger_not_configured() -> ApiError {
    ApiError::new(
        ErrorCode::LedgerNotConfigured,
        "Proof registry is not configured (set PROOF_REGISTRY_ADDRESS)",
    )
}

// ============================================================================
// Tests
// ============================================================================
