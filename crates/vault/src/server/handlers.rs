//! Axum request handlers for all service endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use card_core::{inspect_card, CipherBlob, CipherError, NewCard, VaultError};
use common::protocol::{
    DecryptRequest, DecryptResponse, EncryptRequest, EncryptResponse, ErrorResponse,
    HealthResponse, InspectCardRequest, InspectCardResponse, SealCardRequest, SealCardResponse,
};
use common::ServiceError;
use tracing::{debug, error, warn};

use super::state::AppState;

/// `POST /encrypt`: encrypt one text field.
pub async fn encrypt(State(state): State<AppState>, Json(req): Json<EncryptRequest>) -> Response {
    match state.vault.encrypt_data(&req.plaintext).await {
        Ok(blob) => {
            let body = EncryptResponse {
                ciphertext: blob.into_string(),
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => error_response(&from_cipher_error(e)),
    }
}

/// `POST /decrypt`: decrypt a blob produced by `/encrypt`.
///
/// A blob that fails authentication yields `422`, never partial plaintext.
pub async fn decrypt(State(state): State<AppState>, Json(req): Json<DecryptRequest>) -> Response {
    let blob = CipherBlob::from(req.ciphertext);
    match state.vault.decrypt_data(&blob).await {
        Ok(plaintext) => (StatusCode::OK, Json(DecryptResponse { plaintext })).into_response(),
        Err(e) => error_response(&from_cipher_error(e)),
    }
}

/// `POST /cards/inspect`: validation, brand, and display forms of a number.
///
/// Pure; touches neither the key nor the store.
pub async fn inspect(Json(req): Json<InspectCardRequest>) -> Response {
    let i = inspect_card(&req.card_number);
    let body = InspectCardResponse {
        valid: i.valid,
        brand: i.brand.to_string(),
        formatted: i.formatted,
        masked: i.masked,
        last_four: i.last_four,
    };
    (StatusCode::OK, Json(body)).into_response()
}

/// `POST /cards/seal`: validate a card and return its storable fields.
///
/// Bad number, CVV, or expiry yields `400` before anything is encrypted.
pub async fn seal(State(state): State<AppState>, Json(req): Json<SealCardRequest>) -> Response {
    let card = NewCard {
        card_number: req.card_number,
        cvv: req.cvv,
        expiry_month: req.expiry_month,
        expiry_year: req.expiry_year,
    };
    match state.vault.seal_card(&card).await {
        Ok(sealed) => {
            let body = SealCardResponse {
                last_digits: sealed.last_digits,
                brand: sealed.brand.to_string(),
                card_number_encrypted: sealed.card_number_encrypted.into_string(),
                cvv_encrypted: sealed.cvv_encrypted.map(CipherBlob::into_string),
                expiry_month: sealed.expiry_month,
                expiry_year: sealed.expiry_year,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(VaultError::InvalidCard(e)) => {
            debug!(reason = %e, "rejected card");
            error_response(&ServiceError::BadRequest(e.to_string()))
        }
        Err(VaultError::Cipher(e)) => error_response(&from_cipher_error(e)),
    }
}

/// `GET /health`: liveness and readiness check.
///
/// Returns `200 OK` once the encryption key is loaded, `503` otherwise.
pub async fn health(State(state): State<AppState>) -> Response {
    let keys = state.vault.keys();
    let key_ready = keys.is_ready();

    let (status_code, status_str) = if key_ready {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    let body = HealthResponse {
        status: status_str.into(),
        key_ready,
        key_id: keys.key_id(),
    };
    (status_code, Json(body)).into_response()
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// Map a cipher failure to the service error reported to callers.
///
/// Key failures are logged here because their detail (store path, parse
/// error) is not returned in the response.
fn from_cipher_error(err: CipherError) -> ServiceError {
    match err {
        CipherError::KeyUnavailable(e) => {
            error!(error = %e, "encryption key unavailable");
            ServiceError::KeyUnavailable
        }
        CipherError::DecryptionFailed => {
            warn!("rejected ciphertext");
            ServiceError::DecryptionFailed
        }
        CipherError::AeadFailure => ServiceError::Internal("encryption failed".into()),
    }
}

fn error_response(err: &ServiceError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorResponse::from(err))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::{get, post};
    use axum::{body::Body, http::Request, Router};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(health))
            .route("/decrypt", post(decrypt))
            .route("/cards/seal", post(seal))
            .with_state(state)
    }

    fn json_request(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(resp: Response) -> Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_returns_503_before_key_load() {
        let app = test_router(AppState::default());
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_json(resp).await;
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["key_ready"], false);
    }

    #[tokio::test]
    async fn health_returns_200_after_warm_up() {
        let state = AppState::default();
        state.vault.warm_up().await.unwrap();
        let app = test_router(state);
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_json(resp).await["key_id"].is_string());
    }

    #[tokio::test]
    async fn tampered_blob_returns_422() {
        let state = AppState::default();
        let blob = state.vault.encrypt_data("123").await.unwrap();
        let mut tampered = blob.into_string();
        // Swap the first base64 character for a different valid one.
        let first = if tampered.starts_with('A') { "B" } else { "A" };
        tampered.replace_range(0..1, first);

        let app = test_router(state);
        let resp = app
            .oneshot(json_request("/decrypt", json!({"ciphertext": tampered})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(resp).await["code"], "decryption_failed");
    }

    #[tokio::test]
    async fn seal_rejects_invalid_card() {
        let app = test_router(AppState::default());
        let resp = app
            .oneshot(json_request(
                "/cards/seal",
                json!({"card_number": "4532015112830367"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert_eq!(body["code"], "bad_request");
        assert!(!body["message"].as_str().unwrap().contains("4532"));
    }

    #[tokio::test]
    async fn seal_rejects_bad_cvv_and_expired_card() {
        let state = AppState::default();
        for body in [
            json!({"card_number": "4111111111111111", "cvv": "not-a-cvv-at-all",
                   "expiry_month": 1, "expiry_year": 2099}),
            json!({"card_number": "4111111111111111", "cvv": "123",
                   "expiry_month": 1, "expiry_year": 2020}),
            json!({"card_number": "4111111111111111", "cvv": "123"}),
        ] {
            let resp = test_router(state.clone())
                .oneshot(json_request("/cards/seal", body))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            assert_eq!(body_json(resp).await["code"], "bad_request");
        }
        assert!(!state.vault.keys().is_ready());
    }

    #[test]
    fn cipher_errors_map_to_distinct_statuses() {
        use card_core::{KeyError, StoreError};
        let unavailable = from_cipher_error(CipherError::KeyUnavailable(KeyError::Store(
            StoreError::Unavailable("offline".into()),
        )));
        assert_eq!(unavailable.http_status(), 503);
        assert_eq!(from_cipher_error(CipherError::DecryptionFailed).http_status(), 422);
        assert_eq!(from_cipher_error(CipherError::AeadFailure).http_status(), 500);
    }
}
