//! [`CardVault`]: the entry point collaborators call into.
//!
//! Bundles the cipher with the pure card helpers and adds card-record
//! preparation: turning what a user typed into the fields that may be stored.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::card::{
    detect_card_brand, strip_separators, validate_card_number, validate_cvv, CardBrand,
    CardError, CardNumber, Expiry,
};
use crate::crypto::{CipherBlob, CipherError, CipherService};
use crate::format::{format_card_number, get_last_four_digits, mask_card_number};
use crate::keys::{KeyManager, KeyStore};

/// Errors from card-record operations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// The card number, CVV, or expiry failed validation.
    #[error("invalid card: {0}")]
    InvalidCard(#[from] CardError),

    /// Encryption failed.
    #[error(transparent)]
    Cipher(#[from] CipherError),
}

/// Sensitive fields of a card as entered by the user.
#[derive(Clone, Default, Deserialize)]
pub struct NewCard {
    pub card_number: String,
    #[serde(default)]
    pub cvv: Option<String>,
    #[serde(default)]
    pub expiry_month: Option<u32>,
    #[serde(default)]
    pub expiry_year: Option<i32>,
}

impl std::fmt::Debug for NewCard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewCard")
            .field("card_number", &"[REDACTED]")
            .field("cvv", &self.cvv.as_ref().map(|_| "[REDACTED]"))
            .field("expiry_month", &self.expiry_month)
            .field("expiry_year", &self.expiry_year)
            .finish()
    }
}

/// Storable projection of a card: no plaintext number or CVV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedCard {
    pub last_digits: String,
    pub brand: CardBrand,
    pub card_number_encrypted: CipherBlob,
    pub cvv_encrypted: Option<CipherBlob>,
    pub expiry_month: u32,
    pub expiry_year: i32,
}

/// Everything the entry form shows about a number while it is being typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardInspection {
    pub valid: bool,
    pub brand: CardBrand,
    pub formatted: String,
    pub masked: String,
    pub last_four: String,
}

/// Inspect a raw card number without encrypting anything.
pub fn inspect_card(raw: &str) -> CardInspection {
    CardInspection {
        valid: validate_card_number(raw),
        brand: detect_card_brand(raw),
        formatted: format_card_number(&strip_separators(raw)),
        masked: mask_card_number(raw),
        last_four: get_last_four_digits(raw),
    }
}

/// Card field protection over one key storage scope.
#[derive(Clone, Debug)]
pub struct CardVault {
    cipher: CipherService,
}

impl CardVault {
    /// Vault whose key lives in `store` under the default storage id.
    pub fn new(store: Arc<dyn KeyStore>) -> Self {
        Self::with_key_manager(KeyManager::new(store))
    }

    /// Vault over an existing key manager.
    pub fn with_key_manager(keys: KeyManager) -> Self {
        Self {
            cipher: CipherService::new(keys),
        }
    }

    /// The key manager backing this vault, for readiness and key-id checks.
    ///
    /// Key material itself is not reachable through it:
    ///
    /// ```compile_fail
    /// # async fn leak(vault: card_core::CardVault) {
    /// let _ = vault.keys().get_or_create_key().await;
    /// # }
    /// ```
    pub fn keys(&self) -> &KeyManager {
        self.cipher.keys()
    }

    /// Load or create the key now instead of on the first encryption.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::KeyUnavailable`] if the key cannot be loaded or created.
    pub async fn warm_up(&self) -> Result<(), CipherError> {
        self.keys().get_or_create_key().await?;
        Ok(())
    }

    /// Encrypt a text field.
    ///
    /// # Errors
    ///
    /// See [`CipherService::encrypt`].
    pub async fn encrypt_data(&self, plaintext: &str) -> Result<CipherBlob, CipherError> {
        self.cipher.encrypt(plaintext).await
    }

    /// Decrypt a text field.
    ///
    /// # Errors
    ///
    /// See [`CipherService::decrypt`].
    pub async fn decrypt_data(&self, blob: &CipherBlob) -> Result<String, CipherError> {
        self.cipher.decrypt(blob).await
    }

    /// Validate a new card and encrypt its number and CVV for storage.
    ///
    /// The number is stored as bare digits. A missing or blank CVV is left
    /// out rather than encrypted; any other CVV must be 3 or 4 digits. The
    /// expiry is required and must not lie in a past month. Nothing is
    /// encrypted until every check has passed.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidCard`] if any field fails validation and
    /// [`VaultError::Cipher`] if encryption fails.
    pub async fn seal_card(&self, card: &NewCard) -> Result<SealedCard, VaultError> {
        let number = CardNumber::parse(&card.card_number)?;
        let cvv = match card.cvv.as_deref().map(str::trim) {
            Some(cvv) if !cvv.is_empty() => {
                validate_cvv(cvv)?;
                Some(cvv)
            }
            _ => None,
        };
        let expiry = Expiry::new(card.expiry_month, card.expiry_year)?;
        expiry.ensure_not_expired()?;

        let brand = detect_card_brand(number.digits());
        let card_number_encrypted = self.cipher.encrypt(number.digits()).await?;
        let cvv_encrypted = match cvv {
            Some(cvv) => Some(self.cipher.encrypt(cvv).await?),
            None => None,
        };

        debug!(%brand, has_cvv = cvv_encrypted.is_some(), "sealed card");
        Ok(SealedCard {
            last_digits: get_last_four_digits(number.digits()),
            brand,
            card_number_encrypted,
            cvv_encrypted,
            expiry_month: expiry.month,
            expiry_year: expiry.year,
        })
    }

    /// Decrypt the full number of a sealed card.
    ///
    /// # Errors
    ///
    /// See [`CipherService::decrypt`].
    pub async fn reveal_card_number(&self, card: &SealedCard) -> Result<String, CipherError> {
        self.cipher.decrypt(&card.card_number_encrypted).await
    }

    /// Decrypt the CVV of a sealed card, if one was stored.
    ///
    /// # Errors
    ///
    /// See [`CipherService::decrypt`].
    pub async fn reveal_cvv(&self, card: &SealedCard) -> Result<Option<String>, CipherError> {
        match &card.cvv_encrypted {
            Some(blob) => Ok(Some(self.cipher.decrypt(blob).await?)),
            None => Ok(None),
        }
    }
}
