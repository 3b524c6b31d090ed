//! Development Signing Backend
//!
//! Answers keygen and sign requests in the `tss-wire` format using a single
//! in-process secp256k1 key per key UID. No multi-party computation takes
//! place; it exists so the validator side can be exercised locally.

pub mod keystore;

use axum::{extract::State, routing::get, routing::post, Json, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tss_wire::{
    KeygenRequest, KeygenResponse, SignRequest, SignResponse, HEALTH_PATH, KEYGEN_PATH, SIGN_PATH,
};

pub use keystore::{Keystore, KeystoreError};

/// Application state
#[derive(Default)]
pub struct AppState {
    pub keystore: Keystore,
}

/// Build the service router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health))
        .route(KEYGEN_PATH, post(keygen))
        .route(SIGN_PATH, post(sign))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "tss-stub-svc",
        "version": env!("CARGO_PKG_VERSION"),
        "keys": state.keystore.len(),
    }))
}

/// Generate a key
async fn keygen(
    State(state): State<Arc<AppState>>,
    Json(req): Json<KeygenRequest>,
) -> Json<KeygenResponse> {
    match state.keystore.generate(&req.key_uid, &req.party_uid) {
        Ok(public_key) => {
            info!(key_uid = %req.key_uid, party_uid = %req.party_uid, "Key generated");
            Json(KeygenResponse::PubKey(public_key))
        }
        Err(e) => {
            warn!(key_uid = %req.key_uid, error = %e, "Keygen refused");
            Json(KeygenResponse::Error(e.to_string()))
        }
    }
}

/// Sign a payload hash
async fn sign(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignRequest>,
) -> Json<SignResponse> {
    match state
        .keystore
        .sign(&req.key_uid, &req.msg_to_sign, &req.pub_key)
    {
        Ok(signature) => {
            info!(key_uid = %req.key_uid, party_uid = %req.party_uid, "Payload signed");
            Json(SignResponse::Signature(signature))
        }
        Err(e) => {
            warn!(key_uid = %req.key_uid, error = %e, "Sign refused");
            Json(SignResponse::Error(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    async fn call(app: Router, path: &str, body: serde_json::Value) -> serde_json::Value {
        let request = Request::post(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_keygen_then_duplicate() {
        let state = Arc::new(AppState::default());
        let req = serde_json::to_value(KeygenRequest {
            key_uid: "key1".into(),
            party_uid: "0101".into(),
        })
        .unwrap();

        let first = call(router(state.clone()), KEYGEN_PATH, req.clone()).await;
        let first: KeygenResponse = serde_json::from_value(first).unwrap();
        assert!(matches!(first, KeygenResponse::PubKey(ref pk) if pk.len() == 33));

        let second = call(router(state), KEYGEN_PATH, req).await;
        assert_eq!(second, serde_json::json!({ "error": "key uid key1 already exists" }));
    }

    #[tokio::test]
    async fn test_sign_unknown_key() {
        let state = Arc::new(AppState::default());
        let req = serde_json::to_value(SignRequest {
            key_uid: "missing".into(),
            msg_to_sign: vec![0u8; 32],
            party_uid: "0101".into(),
            pub_key: vec![2u8; 33],
        })
        .unwrap();

        let answer = call(router(state), SIGN_PATH, req).await;
        assert_eq!(answer, serde_json::json!({ "error": "unknown key uid missing" }));
    }

    #[tokio::test]
    async fn test_health() {
        let state = Arc::new(AppState::default());
        let response = router(state)
            .oneshot(Request::get(HEALTH_PATH).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
