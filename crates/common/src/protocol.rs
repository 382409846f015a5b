//! Request and response types of the `vault` HTTP API.
//!
//! All bodies are JSON. Ciphertext fields carry the base64 blob format
//! `base64(nonce[12] || ciphertext || tag[16])`; card brands are lowercase
//! strings (`visa`, `mastercard`, `amex`, `elo`, `hipercard`, `other`).

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Field encryption
// ---------------------------------------------------------------------------

/// Request body for `POST /encrypt`.
#[derive(Clone, Serialize, Deserialize)]
pub struct EncryptRequest {
    /// Text to encrypt.
    pub plaintext: String,
}

/// Successful response body for `POST /encrypt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptResponse {
    /// Base64 cipher blob.
    pub ciphertext: String,
}

/// Request body for `POST /decrypt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecryptRequest {
    /// Base64 cipher blob produced by `POST /encrypt`.
    pub ciphertext: String,
}

/// Successful response body for `POST /decrypt`.
#[derive(Clone, Serialize, Deserialize)]
pub struct DecryptResponse {
    /// Recovered text.
    pub plaintext: String,
}

// Plaintext-bearing bodies never print their contents.
impl std::fmt::Debug for EncryptRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EncryptRequest { plaintext: [REDACTED] }")
    }
}

impl std::fmt::Debug for DecryptResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DecryptResponse { plaintext: [REDACTED] }")
    }
}

// ---------------------------------------------------------------------------
// Cards
// ---------------------------------------------------------------------------

/// Request body for `POST /cards/inspect`.
#[derive(Clone, Serialize, Deserialize)]
pub struct InspectCardRequest {
    /// Raw card number as typed; spaces and hyphens allowed.
    pub card_number: String,
}

/// Response body for `POST /cards/inspect`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectCardResponse {
    /// Whether the number passes length and Luhn checks.
    pub valid: bool,
    /// Detected issuer brand.
    pub brand: String,
    /// Number regrouped in blocks of four.
    pub formatted: String,
    /// Number with all but the last four digits hidden.
    pub masked: String,
    /// Last four digits.
    pub last_four: String,
}

/// Request body for `POST /cards/seal`.
#[derive(Clone, Serialize, Deserialize)]
pub struct SealCardRequest {
    /// Raw card number as typed.
    pub card_number: String,
    /// Security code; omitted or blank means none is stored.
    #[serde(default)]
    pub cvv: Option<String>,
    /// Expiry month, 1-12. Required.
    #[serde(default)]
    pub expiry_month: Option<u32>,
    /// Four-digit expiry year. Required.
    #[serde(default)]
    pub expiry_year: Option<i32>,
}

/// Response body for `POST /cards/seal`: the fields safe to persist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SealCardResponse {
    /// Last four digits, kept in clear for display.
    pub last_digits: String,
    /// Detected issuer brand.
    pub brand: String,
    /// Cipher blob of the bare card digits.
    pub card_number_encrypted: String,
    /// Cipher blob of the CVV, if one was supplied.
    pub cvv_encrypted: Option<String>,
    pub expiry_month: u32,
    pub expiry_year: i32,
}

impl std::fmt::Debug for InspectCardRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("InspectCardRequest { card_number: [REDACTED] }")
    }
}

impl std::fmt::Debug for SealCardRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SealCardRequest { card_number: [REDACTED], cvv: [REDACTED] }")
    }
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"bad_request"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<&crate::ServiceError> for ErrorResponse {
    fn from(err: &crate::ServiceError) -> Self {
        Self::new(err.code(), err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall service status: `"ok"` or `"degraded"`.
    pub status: String,
    /// Whether the encryption key is loaded.
    pub key_ready: bool,
    /// Non-secret fingerprint of the loaded key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
}
