//! End-to-end card workflows over a file-backed key store.

use std::sync::Arc;

use card_core::keys::DEFAULT_STORAGE_ID;
use card_core::{
    CardBrand, CardVault, CipherBlob, CipherError, FileKeyStore, KeyError, KeyStore, NewCard,
    SealedCard,
};

/// AES-256-GCM blob of "4532015112830366" under key bytes 0..32 and nonce
/// bytes 100..112, produced by an independent implementation.
const KNOWN_BLOB: &str = "ZGVmZ2hpamtsbW5vfC7tVEnYY68PUGfb6lZcyzx3JxfZXSjJr//2CesHLiE=";

/// Web Crypto style JWK export of key bytes 0..32.
const KNOWN_JWK: &str = r#"{"alg":"A256GCM","ext":true,"k":"AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8","key_ops":["encrypt","decrypt"],"kty":"oct"}"#;

fn file_vault(dir: &std::path::Path) -> CardVault {
    CardVault::new(Arc::new(FileKeyStore::new(dir)))
}

#[tokio::test]
async fn key_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    let first = file_vault(dir.path());
    let blob = first.encrypt_data("4111111111111111").await.unwrap();
    let key_id = first.keys().key_id().unwrap();
    drop(first);

    let second = file_vault(dir.path());
    assert_eq!(second.decrypt_data(&blob).await.unwrap(), "4111111111111111");
    assert_eq!(second.keys().key_id().unwrap(), key_id);
}

#[tokio::test]
async fn persisted_descriptor_is_a_jwk() {
    let dir = tempfile::tempdir().unwrap();
    file_vault(dir.path()).warm_up().await.unwrap();

    let raw = std::fs::read(dir.path().join(DEFAULT_STORAGE_ID)).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(json["kty"], "oct");
    assert_eq!(json["alg"], "A256GCM");
}

#[tokio::test]
async fn decrypts_blob_from_existing_key() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileKeyStore::new(dir.path());
    store
        .set(DEFAULT_STORAGE_ID, KNOWN_JWK.as_bytes())
        .await
        .unwrap();

    let vault = CardVault::new(Arc::new(store));
    let plaintext = vault
        .decrypt_data(&CipherBlob::from(KNOWN_BLOB))
        .await
        .unwrap();
    assert_eq!(plaintext, "4532015112830366");
}

#[tokio::test]
async fn corrupted_key_file_blocks_encryption() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(DEFAULT_STORAGE_ID), b"{\"kty\":\"oct\"}").unwrap();

    let vault = file_vault(dir.path());
    let err = vault.encrypt_data("737").await.unwrap_err();
    assert!(matches!(err, CipherError::KeyUnavailable(KeyError::Corrupted(_))));

    // The corrupted descriptor is left for an operator to inspect.
    let raw = std::fs::read(dir.path().join(DEFAULT_STORAGE_ID)).unwrap();
    assert_eq!(raw, b"{\"kty\":\"oct\"}");
}

#[tokio::test]
async fn concurrent_encryptions_share_one_key() {
    let dir = tempfile::tempdir().unwrap();
    let vault = file_vault(dir.path());

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let v = vault.clone();
            tokio::spawn(async move { v.encrypt_data(&format!("cvv-{i}")).await.unwrap() })
        })
        .collect();

    let mut blobs = Vec::new();
    for t in tasks {
        blobs.push(t.await.unwrap());
    }

    // A fresh vault over the same directory reads every blob back.
    let reader = file_vault(dir.path());
    for (i, blob) in blobs.iter().enumerate() {
        assert_eq!(reader.decrypt_data(blob).await.unwrap(), format!("cvv-{i}"));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn separate_vaults_racing_on_one_directory_share_a_key() {
    for round in 0..25 {
        let dir = tempfile::tempdir().unwrap();
        let a = file_vault(dir.path());
        let b = file_vault(dir.path());

        let ta = tokio::spawn(async move { a.encrypt_data("first").await });
        let tb = tokio::spawn(async move { b.encrypt_data("second").await });
        let blob_a = ta.await.unwrap().unwrap();
        let blob_b = tb.await.unwrap().unwrap();

        let reader = file_vault(dir.path());
        assert_eq!(reader.decrypt_data(&blob_a).await.unwrap(), "first", "round {round}");
        assert_eq!(reader.decrypt_data(&blob_b).await.unwrap(), "second", "round {round}");

        // Only the key descriptor remains; no temporaries are left behind.
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1, "round {round}");
    }
}

#[tokio::test]
async fn sealed_card_round_trip_through_json() {
    let dir = tempfile::tempdir().unwrap();
    let vault = file_vault(dir.path());

    let sealed = vault
        .seal_card(&NewCard {
            card_number: "6062 8200 0000 0003".into(),
            cvv: Some("4321".into()),
            expiry_month: Some(6),
            expiry_year: Some(2099),
        })
        .await
        .unwrap();
    assert_eq!(sealed.brand, CardBrand::Hipercard);
    assert_eq!((sealed.expiry_month, sealed.expiry_year), (6, 2099));

    let stored = serde_json::to_string(&sealed).unwrap();
    let loaded: SealedCard = serde_json::from_str(&stored).unwrap();

    assert_eq!(vault.reveal_card_number(&loaded).await.unwrap(), "6062820000000003");
    assert_eq!(vault.reveal_cvv(&loaded).await.unwrap().as_deref(), Some("4321"));
}
