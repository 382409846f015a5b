//! Axum router construction.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer, trace::TraceLayer};

use super::{handlers, middleware, state::AppState};

/// Build the application [`Router`] with all routes and middleware attached.
pub fn build(state: AppState) -> Router {
    Router::new()
        .route("/encrypt", post(handlers::encrypt))
        .route("/decrypt", post(handlers::decrypt))
        .route("/cards/inspect", post(handlers::inspect))
        .route("/cards/seal", post(handlers::seal))
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(middleware::MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(middleware::REQUEST_TIMEOUT))
        .layer(CompressionLayer::new())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use axum_test::TestServer;
    use common::protocol::{
        DecryptResponse, EncryptResponse, ErrorResponse, InspectCardResponse, SealCardResponse,
    };
    use serde_json::json;
    use tower::ServiceExt;

    fn server(state: AppState) -> TestServer {
        TestServer::new(build(state)).unwrap()
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let app = build(AppState::default());
        let req = Request::builder()
            .uri("/unknown")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn health_route_exists() {
        let app = build(AppState::default());
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        // 503 because the key has not been loaded in the test state.
        assert_eq!(resp.status(), 503);
    }

    #[tokio::test]
    async fn encrypt_then_decrypt() {
        let server = server(AppState::default());

        let enc = server
            .post("/encrypt")
            .json(&json!({"plaintext": "4532015112830366"}))
            .await;
        enc.assert_status_ok();
        let EncryptResponse { ciphertext } = enc.json();
        assert!(!ciphertext.contains("4532015112830366"));

        let dec = server
            .post("/decrypt")
            .json(&json!({"ciphertext": ciphertext}))
            .await;
        dec.assert_status_ok();
        let DecryptResponse { plaintext } = dec.json();
        assert_eq!(plaintext, "4532015112830366");
    }

    #[tokio::test]
    async fn decrypt_garbage_returns_422() {
        let server = server(AppState::default());
        let resp = server
            .post("/decrypt")
            .json(&json!({"ciphertext": "not-a-blob"}))
            .await;
        assert_eq!(resp.status_code(), 422);
        let err: ErrorResponse = resp.json();
        assert_eq!(err.code, "decryption_failed");
    }

    #[tokio::test]
    async fn inspect_reports_display_forms() {
        let server = server(AppState::default());
        let resp = server
            .post("/cards/inspect")
            .json(&json!({"card_number": "4111111111111111"}))
            .await;
        resp.assert_status_ok();
        let body: InspectCardResponse = resp.json();
        assert!(body.valid);
        assert_eq!(body.brand, "visa");
        assert_eq!(body.formatted, "4111 1111 1111 1111");
        assert_eq!(body.masked, "•••• •••• •••• 1111");
        assert_eq!(body.last_four, "1111");
    }

    #[tokio::test]
    async fn inspect_groups_hyphenated_input() {
        let server = server(AppState::default());
        let resp = server
            .post("/cards/inspect")
            .json(&json!({"card_number": "4111-1111-1111-1111"}))
            .await;
        let body: InspectCardResponse = resp.json();
        assert_eq!(body.formatted, "4111 1111 1111 1111");
    }

    #[tokio::test]
    async fn seal_returns_storable_fields() {
        let state = AppState::default();
        let server = server(state.clone());
        let resp = server
            .post("/cards/seal")
            .json(&json!({
                "card_number": "5500 0000 0000 0004",
                "cvv": "321",
                "expiry_month": 3,
                "expiry_year": 2099,
            }))
            .await;
        resp.assert_status_ok();
        let body: SealCardResponse = resp.json();
        assert_eq!(body.last_digits, "0004");
        assert_eq!(body.brand, "mastercard");
        assert_eq!((body.expiry_month, body.expiry_year), (3, 2099));

        let cvv = body.cvv_encrypted.expect("cvv blob");
        let plain = state.vault.decrypt_data(&cvv.into()).await.unwrap();
        assert_eq!(plain, "321");

        // Sealing loaded the key, so the service now reports healthy.
        server.get("/health").await.assert_status_ok();
    }

    #[tokio::test]
    async fn oversized_body_rejected() {
        let server = server(AppState::default());
        let huge = "x".repeat(middleware::MAX_BODY_BYTES + 1);
        let resp = server
            .post("/encrypt")
            .json(&json!({"plaintext": huge}))
            .await;
        assert_eq!(resp.status_code(), 413);
    }
}
