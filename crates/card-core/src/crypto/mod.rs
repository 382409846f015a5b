//! AES-256-GCM field encryption primitives.
//!
//! This module is free of HTTP and storage details. It provides the
//! encrypt/decrypt operations used by the vault facade; the key itself comes
//! from [`crate::keys::KeyManager`].
//!
//! # Ciphertext format
//!
//! ```text
//! base64( nonce[12] || ciphertext || tag[16] )
//! ```

pub mod cipher;

pub use cipher::{CipherBlob, CipherError, CipherService, NONCE_LEN, TAG_LEN};
