//! [`EncryptionKey`] and its JSON Web Key (JWK) persistence form.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// JWK `alg` value for AES-256-GCM.
pub const JWK_ALG: &str = "A256GCM";

/// JWK `kty` value for symmetric ("octet sequence") keys.
pub const JWK_KTY: &str = "oct";

/// Fixed-size key buffer holding exactly [`KEY_LEN`] bytes.
///
/// When this type is dropped, the memory is overwritten with zeroes to
/// minimise the window during which plaintext key material lives in RAM.
#[derive(Clone)]
pub struct EncryptionKey(Box<[u8; KEY_LEN]>);

impl EncryptionKey {
    /// Generate a fresh key from the OS CSPRNG.
    pub fn generate() -> Self {
        use aes_gcm::aead::{rand_core::RngCore, OsRng};
        let mut buf = Box::new([0u8; KEY_LEN]);
        OsRng.fill_bytes(&mut buf[..]);
        Self(buf)
    }

    /// Wrap existing key bytes.
    ///
    /// Returns `None` if `bytes` is not exactly [`KEY_LEN`] long.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != KEY_LEN {
            return None;
        }
        let mut buf = Box::new([0u8; KEY_LEN]);
        buf.copy_from_slice(bytes);
        Some(Self(buf))
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Non-secret identifier for this key: base64url of the first 8 bytes of
    /// its SHA-256 digest. Safe to log.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(&self.0[..]);
        URL_SAFE_NO_PAD.encode(&digest[..8])
    }

    /// Export into the JWK form written to the key store.
    ///
    /// ```compile_fail
    /// let jwk = card_core::keys::EncryptionKey::generate().to_jwk();
    /// ```
    pub(crate) fn to_jwk(&self) -> Jwk {
        Jwk {
            kty: JWK_KTY.to_owned(),
            k: URL_SAFE_NO_PAD.encode(&self.0[..]),
            alg: Some(JWK_ALG.to_owned()),
            ext: Some(true),
            key_ops: vec!["encrypt".to_owned(), "decrypt".to_owned()],
        }
    }

    /// Import a key from its JWK form.
    ///
    /// # Errors
    ///
    /// Returns a short reason if the key type or algorithm is not AES-256-GCM,
    /// or if `k` is not base64url encoding exactly [`KEY_LEN`] bytes.
    pub fn from_jwk(jwk: &Jwk) -> Result<Self, String> {
        if jwk.kty != JWK_KTY {
            return Err(format!("unsupported kty {:?}", jwk.kty));
        }
        if let Some(alg) = &jwk.alg {
            if alg != JWK_ALG {
                return Err(format!("unsupported alg {alg:?}"));
            }
        }
        let mut raw = URL_SAFE_NO_PAD
            .decode(jwk.k.trim_end_matches('='))
            .map_err(|_| "k is not valid base64url".to_owned())?;
        let key = Self::from_slice(&raw);
        raw.iter_mut().for_each(|b| *b = 0);
        key.ok_or_else(|| format!("k must decode to {KEY_LEN} bytes"))
    }
}

impl Drop for EncryptionKey {
    fn drop(&mut self) {
        // Zero the key material on drop.
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material, not even in debug builds.
        f.write_str("EncryptionKey([REDACTED])")
    }
}

/// Portable key-interchange representation of an [`EncryptionKey`].
///
/// Matches what a Web Crypto `exportKey("jwk", ...)` call produces for an
/// AES-GCM key, so descriptors written by either side can be read by the other.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Jwk {
    /// Key type; always `"oct"`.
    pub kty: String,
    /// Raw key bytes, base64url without padding.
    pub k: String,
    /// Algorithm; `"A256GCM"` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    /// Extractable flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<bool>,
    /// Permitted operations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_ops: Vec<String>,
}

impl std::fmt::Debug for Jwk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Jwk")
            .field("kty", &self.kty)
            .field("k", &"[REDACTED]")
            .field("alg", &self.alg)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;

    #[test]
    fn generated_keys_differ() {
        let a = EncryptionKey::generate();
        let b = EncryptionKey::generate();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn jwk_export_shape() {
        let key = EncryptionKey::from_slice(&[0x11; KEY_LEN]).unwrap();
        let json = serde_json::to_value(key.to_jwk()).unwrap();
        assert_eq!(json["kty"], "oct");
        assert_eq!(json["alg"], "A256GCM");
        assert_eq!(json["ext"], true);
        assert_eq!(json["key_ops"], serde_json::json!(["encrypt", "decrypt"]));
        // 32 bytes -> 43 base64url chars without padding.
        assert_eq!(json["k"].as_str().unwrap().len(), 43);
    }

    #[test]
    fn jwk_import_restores_bytes() {
        let key = EncryptionKey::generate();
        let restored = EncryptionKey::from_jwk(&key.to_jwk()).unwrap();
        assert_eq!(restored.as_bytes(), key.as_bytes());
        assert_eq!(restored.fingerprint(), key.fingerprint());
    }

    #[test]
    fn jwk_import_accepts_web_crypto_export() {
        let raw = r#"{"alg":"A256GCM","ext":true,"k":"AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8","key_ops":["encrypt","decrypt"],"kty":"oct"}"#;
        let jwk: Jwk = serde_json::from_str(raw).unwrap();
        let key = EncryptionKey::from_jwk(&jwk).unwrap();
        assert_eq!(key.as_bytes()[0], 0);
        assert_eq!(key.as_bytes()[31], 31);
    }

    #[test]
    fn jwk_import_rejects_wrong_alg() {
        let mut jwk = EncryptionKey::generate().to_jwk();
        jwk.alg = Some("A128GCM".into());
        assert!(EncryptionKey::from_jwk(&jwk).is_err());
    }

    #[test]
    fn jwk_import_rejects_wrong_kty() {
        let mut jwk = EncryptionKey::generate().to_jwk();
        jwk.kty = "RSA".into();
        assert!(EncryptionKey::from_jwk(&jwk).is_err());
    }

    #[test]
    fn jwk_import_rejects_short_key() {
        let mut jwk = EncryptionKey::generate().to_jwk();
        jwk.k = URL_SAFE_NO_PAD.encode([0u8; 16]);
        assert!(EncryptionKey::from_jwk(&jwk).is_err());
    }

    #[test]
    fn key_and_jwk_redacted_in_debug() {
        let key = EncryptionKey::generate();
        assert!(format!("{key:?}").contains("REDACTED"));
        let jwk = key.to_jwk();
        let dbg = format!("{jwk:?}");
        assert!(dbg.contains("REDACTED"));
        assert!(!dbg.contains(&jwk.k));
    }
}
