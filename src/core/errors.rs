//! Error taxonomy for link resolution and remote fetches.

use thiserror::Error;

/// Message used when the backend answers with HTTP 403
pub const FORBIDDEN_STATUS_MESSAGE: &str = "Access forbidden by upstream (HTTP 403)";

/// Errors surfaced by the link resolver and the fetch client
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Unrecognized share link")]
    InvalidLink,

    #[error("Request timed out")]
    Timeout,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Response did not match the expected schema")]
    DecodingError,

    #[error("Network error: {0}")]
    NetworkError(String),
}

impl FetchError {
    /// Whether the fetch client should attempt the call again.
    ///
    /// Only `Forbidden` is transient: the upstream proxy pool may hand out
    /// a different egress address on the next attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Forbidden(_))
    }

    /// Classify a message carried in a 2xx error envelope
    pub fn from_envelope_message(message: String) -> Self {
        if is_permission_message(&message) {
            FetchError::Forbidden(message)
        } else {
            FetchError::ServerError(message)
        }
    }

    /// Classify a non-2xx HTTP status
    pub fn from_status(status: u16) -> Self {
        if status == 403 {
            FetchError::Forbidden(FORBIDDEN_STATUS_MESSAGE.to_string())
        } else {
            FetchError::ServerError(status.to_string())
        }
    }
}

/// Heuristic: does an envelope message describe an authorization failure?
///
/// The backend has no structured error code, so this matches on text.
pub fn is_permission_message(message: &str) -> bool {
    message.contains("403") || message.contains("permission")
}
