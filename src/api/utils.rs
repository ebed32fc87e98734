//! Utility functions for REST API handlers.

use base64::Engine;

use super::error::{ApiError, ErrorCode};

/// Decode base64 with flexible format support (standard, URL-safe, with/without padding).
///
/// A `data:<mime>;base64,` prefix is stripped first.
pub fn decode_base64_any(s: &str) -> Result<Vec<u8>, ApiError> {
    let trimmed = strip_data_url(s.trim());
    base64::engine::general_purpose::STANDARD
        .decode(trimmed)
        .or_else(|_| base64::engine::general_purpose::STANDARD_NO_PAD.decode(trimmed))
        .or_else(|_| base64::engine::general_purpose::URL_SAFE.decode(trimmed))
        .or_else(|_| base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(trimmed))
        .map_err(|e| ApiError::new(ErrorCode::InvalidAttachment, format!("Invalid base64: {e}")))
}

fn strip_data_url(s: &str) -> &str {
    match s.split_once(',') {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => s,
    }
}
