//! REST API integration tests for Autho.D.oX.
//!
//! The full router runs against an in-memory SQLite cache and fake
//! content store, ledger and wallet.

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::json;
use tower::ServiceExt;

use authodox::content::KeyStatus;
use authodox::domain::POLYGON_AMOY_CHAIN_ID;
use authodox::server::{build_router, AppState, Services};
use authodox::wallet::WalletSession;

use common::*;

// ============================================================================
// Test Helpers
// ============================================================================

fn router(state: AppState) -> Router {
    build_router(None).with_state(state)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn submission_body() -> serde_json::Value {
    json!({
        "promptText": "Summarise the borrow checker",
        "responseText": "It enforces aliasing XOR mutability.",
        "responseFiles": [{ "name": "notes.txt", "data": "bm90ZXM=" }],
        "chatLink": "https://chat.example/share/abc"
    })
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_and_ready() {
    let app = router(test_app(POLYGON_AMOY_CHAIN_ID).await.state);

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "authodox");

    let (status, body) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cached_proofs"], 0);
    assert_eq!(body["ledger"], true);
}

// ============================================================================
// Submission
// ============================================================================

#[tokio::test]
async fn test_submit_requires_connected_wallet() {
    let test = test_app(POLYGON_AMOY_CHAIN_ID).await;
    let app = router(test.state);

    let (status, body) = send(&app, Method::POST, "/api/v1/proofs", Some(submission_body())).await;

    assert_eq!(status, StatusCode::PRECONDITION_FAILED);
    assert_eq!(body["error"]["code"], "WALLET_NOT_CONNECTED");
    assert_eq!(body["error"]["message"], "Please connect your wallet first");
    assert_eq!(test.store.upload_count(), 0);
}

#[tokio::test]
async fn test_connect_submit_and_list() {
    let test = test_app(POLYGON_AMOY_CHAIN_ID).await;
    let app = router(test.state);

    let (status, body) = send(&app, Method::POST, "/api/v1/wallet/connect", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isConnected"], true);
    assert_eq!(body["wallet"]["address"], TEST_AUTHOR);

    let (status, body) = send(&app, Method::POST, "/api/v1/proofs", Some(submission_body())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["redirect"], "/gallery");
    assert_eq!(body["sequenceIdAssumed"], false);
    assert_eq!(body["record"]["sequenceId"], 0);
    assert_eq!(body["record"]["optionalLink"], "https://chat.example/share/abc");
    assert_eq!(body["stages"].as_array().unwrap().last().unwrap(), "done");
    // prompt text, response file + envelope, metadata
    assert_eq!(test.store.upload_count(), 4);
    assert_eq!(test.ledger.registrations(), 1);

    let (status, body) = send(&app, Method::GET, "/api/v1/proofs", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["chainScanComplete"], true);
    assert!(body["proofs"][0]["transactionRef"]
        .as_str()
        .unwrap()
        .starts_with("0x"));

    let (_, body) = send(&app, Method::GET, "/api/v1/cache/proofs?author=0xnobody", None).await;
    assert_eq!(body["count"], 0);
    assert!(body.get("chainScanComplete").is_none());

    let response_id = {
        let (_, body) = send(&app, Method::GET, "/api/v1/cache/proofs", None).await;
        body["proofs"][0]["responseContentId"].as_str().unwrap().to_string()
    };
    let (status, body) = send(&app, Method::GET, &format!("/api/v1/content/{response_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isEnvelope"], true);
    assert_eq!(body["text"], "It enforces aliasing XOR mutability.");
    assert_eq!(body["fileUrls"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_wrong_network_is_conflict() {
    let test = test_app(1).await;
    let app = router(test.state);

    send(&app, Method::POST, "/api/v1/wallet/connect", None).await;
    let (status, body) = send(&app, Method::POST, "/api/v1/proofs", Some(submission_body())).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "NETWORK_MISMATCH");
    assert_eq!(body["error"]["details"]["expected_chain_id"], 80002);
    assert_eq!(test.store.upload_count(), 0);
}

#[tokio::test]
async fn test_invalid_attachment_is_bad_request() {
    let app = router(test_app(POLYGON_AMOY_CHAIN_ID).await.state);

    let body = json!({
        "promptText": "p",
        "responseText": "r",
        "promptFiles": [{ "name": "a.bin", "data": "@@@" }]
    });
    let (status, body) = send(&app, Method::POST, "/api/v1/proofs", Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_ATTACHMENT");
}

#[tokio::test]
async fn test_submit_without_ledger_is_unavailable() {
    let state = AppState::new(Services {
        cache: Arc::new(memory_cache().await),
        content: Arc::new(MemoryContentStore::new()),
        ledger: None,
        wallet: None,
        session: Arc::new(WalletSession::new()),
        required_chain_id: POLYGON_AMOY_CHAIN_ID,
        key_status: KeyStatus::Missing,
    });
    let app = router(state);

    let (status, body) = send(&app, Method::POST, "/api/v1/proofs", Some(submission_body())).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "LEDGER_NOT_CONFIGURED");

    let (status, body) = send(&app, Method::GET, "/api/v1/proofs", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["chainScanComplete"], false);

    let (_, body) = send(&app, Method::GET, "/api/v1/debug/key-status", None).await;
    assert_eq!(body["status"], "missing");
    assert_eq!(body["valid"], false);
}

// ============================================================================
// Wallet session and content
// ============================================================================

#[tokio::test]
async fn test_disconnect_is_remembered() {
    let app = router(test_app(POLYGON_AMOY_CHAIN_ID).await.state);

    send(&app, Method::POST, "/api/v1/wallet/connect", None).await;
    let (_, body) = send(&app, Method::POST, "/api/v1/wallet/disconnect", None).await;
    assert_eq!(body["isConnected"], false);
    assert_eq!(body["manuallyDisconnected"], true);

    let (_, body) = send(&app, Method::GET, "/api/v1/wallet", None).await;
    assert_eq!(body["manuallyDisconnected"], true);
}

#[tokio::test]
async fn test_unknown_content_is_not_found() {
    let app = router(test_app(POLYGON_AMOY_CHAIN_ID).await.state);

    let (status, body) = send(&app, Method::GET, "/api/v1/content/bafymissing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "CONTENT_NOT_FOUND");
    assert_eq!(body["error"]["resource_id"], "bafymissing");
}
