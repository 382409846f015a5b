//! Common error types shared across crates.

use thiserror::Error;

/// Top-level service error type.
///
/// Variants map to HTTP status codes returned to callers:
/// - [`ServiceError::BadRequest`] → 400
/// - [`ServiceError::DecryptionFailed`] → 422
/// - [`ServiceError::KeyUnavailable`] → 503
/// - [`ServiceError::Internal`] → 500
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request was malformed or the card number failed validation.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The ciphertext could not be authenticated or decoded.
    #[error("decryption failed")]
    DecryptionFailed,

    /// The encryption key could not be loaded or created.
    #[error("encryption key unavailable")]
    KeyUnavailable,

    /// An unexpected internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Returns the HTTP status code that should be sent for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            ServiceError::BadRequest(_) => 400,
            ServiceError::DecryptionFailed => 422,
            ServiceError::KeyUnavailable => 503,
            ServiceError::Internal(_) => 500,
        }
    }

    /// Short machine-readable code used in [`crate::protocol::ErrorResponse`].
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::BadRequest(_) => "bad_request",
            ServiceError::DecryptionFailed => "decryption_failed",
            ServiceError::KeyUnavailable => "key_unavailable",
            ServiceError::Internal(_) => "internal_error",
        }
    }
}
