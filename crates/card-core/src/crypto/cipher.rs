//! AES-256-GCM encryption and decryption of individual card fields.
//!
//! **Algorithm choice:** AES-256-GCM with a random 96-bit nonce per call and a
//! 128-bit tag. Blobs are interchangeable with those produced by Web Crypto
//! `AES-GCM` using the same key.
//!
//! **Never reuse a nonce under the same key.** GCM nonce reuse is
//! catastrophic: it breaks both confidentiality and authentication.

use aes_gcm::{
    aead::{rand_core::RngCore, Aead, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::keys::{EncryptionKey, KeyError, KeyManager};

/// Byte length of an AES-GCM nonce (12 bytes = 96 bits).
pub const NONCE_LEN: usize = 12;

/// Byte length of the AES-GCM authentication tag (16 bytes = 128 bits).
pub const TAG_LEN: usize = 16;

/// Errors produced by the cipher layer.
#[derive(Debug, Error)]
pub enum CipherError {
    /// The managed key could not be loaded or created.
    #[error("encryption key unavailable: {0}")]
    KeyUnavailable(#[from] KeyError),

    /// The blob is malformed, truncated, tampered with, or was sealed under a
    /// different key.
    #[error("decryption failed")]
    DecryptionFailed,

    /// AES-GCM encryption failed (unreachable with a valid key and nonce).
    #[error("aead operation failed")]
    AeadFailure,
}

/// An encrypted field value: `base64(nonce || ciphertext || tag)`.
///
/// Standard base64 alphabet with padding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CipherBlob(String);

impl CipherBlob {
    /// Assemble a blob from its nonce and ciphertext-with-tag parts.
    pub fn from_parts(nonce: &[u8; NONCE_LEN], ciphertext: &[u8]) -> Self {
        let mut combined = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        combined.extend_from_slice(nonce);
        combined.extend_from_slice(ciphertext);
        Self(STANDARD.encode(combined))
    }

    /// Decode the blob and split it into nonce and ciphertext-with-tag.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::DecryptionFailed`] if the text is not base64 or
    /// decodes to fewer than `NONCE_LEN + TAG_LEN` bytes.
    pub fn split(&self) -> Result<([u8; NONCE_LEN], Vec<u8>), CipherError> {
        let mut bytes = STANDARD
            .decode(self.0.as_bytes())
            .map_err(|_| CipherError::DecryptionFailed)?;
        if bytes.len() < NONCE_LEN + TAG_LEN {
            return Err(CipherError::DecryptionFailed);
        }
        let ciphertext = bytes.split_off(NONCE_LEN);
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&bytes);
        Ok((nonce, ciphertext))
    }

    /// The base64 text of this blob.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the blob, returning its base64 text.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for CipherBlob {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CipherBlob {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl std::fmt::Display for CipherBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Authenticated encryption of short text fields under the managed key.
#[derive(Clone, Debug)]
pub struct CipherService {
    keys: KeyManager,
}

impl CipherService {
    /// Create a cipher that draws its key from `keys`.
    pub fn new(keys: KeyManager) -> Self {
        Self { keys }
    }

    /// The key manager backing this cipher.
    pub fn keys(&self) -> &KeyManager {
        &self.keys
    }

    /// Encrypt `plaintext` with a fresh random nonce.
    ///
    /// May create and persist the key if this is the first use.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::KeyUnavailable`] if the key cannot be loaded or created.
    pub async fn encrypt(&self, plaintext: &str) -> Result<CipherBlob, CipherError> {
        let key = self.keys.get_or_create_key().await?;
        seal(&key, plaintext.as_bytes())
    }

    /// Decrypt a blob produced by [`CipherService::encrypt`].
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::KeyUnavailable`] if the key cannot be loaded, and
    /// [`CipherError::DecryptionFailed`] for malformed base64, a truncated blob,
    /// a tag mismatch, or plaintext that is not UTF-8. No partial plaintext is
    /// ever returned.
    pub async fn decrypt(&self, blob: &CipherBlob) -> Result<String, CipherError> {
        let key = self.keys.get_or_create_key().await?;
        let plaintext = open(&key, blob)?;
        String::from_utf8(plaintext).map_err(|_| CipherError::DecryptionFailed)
    }
}

/// Encrypt raw bytes under `key`.
///
/// # Errors
///
/// Returns [`CipherError::AeadFailure`] only if the plaintext exceeds the GCM
/// length limit.
pub(crate) fn seal(key: &EncryptionKey, plaintext: &[u8]) -> Result<CipherBlob, CipherError> {
    let cipher = build_cipher(key);

    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| CipherError::AeadFailure)?;

    Ok(CipherBlob::from_parts(&nonce_bytes, &ciphertext))
}

/// Decrypt and authenticate `blob` under `key`, returning raw bytes.
pub(crate) fn open(key: &EncryptionKey, blob: &CipherBlob) -> Result<Vec<u8>, CipherError> {
    let (nonce_bytes, ciphertext) = blob.split()?;
    let cipher = build_cipher(key);
    cipher
        .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_ref())
        .map_err(|_| {
            debug!("authenticated decryption rejected blob");
            CipherError::DecryptionFailed
        })
}

fn build_cipher(key: &EncryptionKey) -> Aes256Gcm {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()))
}
