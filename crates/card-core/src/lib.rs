//! Client-side protection for payment-card fields.
//!
//! - [`keys`]: lifecycle of the single AES-256 key of a storage scope.
//! - [`crypto`]: AES-256-GCM encryption of short text fields.
//! - [`card`]: card detail validation and issuer-brand detection.
//! - [`format`]: grouped and masked display forms.
//! - [`vault`]: the [`CardVault`] facade collaborators call into.
//!
//! # Invariants
//!
//! - No plaintext, card number, CVV, or key byte is ever logged.
//! - Decryption either authenticates the whole blob or fails; there is no
//!   partial output.

pub mod card;
pub mod crypto;
pub mod format;
pub mod keys;
pub mod vault;

pub use card::{
    detect_card_brand, validate_card_number, validate_cvv, CardBrand, CardError, CardNumber,
    Expiry,
};
pub use crypto::{CipherBlob, CipherError, CipherService};
pub use format::{format_card_number, get_last_four_digits, mask_card_number};
pub use keys::{FileKeyStore, KeyError, KeyManager, KeyStore, MemoryKeyStore, StoreError};
pub use vault::{inspect_card, CardInspection, CardVault, NewCard, SealedCard, VaultError};
