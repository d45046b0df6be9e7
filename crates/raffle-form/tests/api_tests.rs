//! Integration tests for the raffle form API.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use raffle_form::{
    api::{create_router_with_rate_limit, AppState, RateLimitState},
    config::RaffleConfig,
    FormController,
};
use raffle_ledger::{MemoryRegistrationLog, NumberLedger};
use receipt_store::LocalReceiptStore;
use secrecy::SecretString;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "raffle-test-boundary";
const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
const ADMIN_TOKEN: &str = "operator-secret";

/// Create a test app state with memory-only storage and receipts on disk.
fn create_test_state(receipts: &TempDir) -> AppState {
    let controller = FormController::new(
        Arc::new(NumberLedger::memory()),
        Arc::new(MemoryRegistrationLog::new()),
        Arc::new(LocalReceiptStore::new(
            receipts.path(),
            Some("https://raffle.example/files".into()),
        )),
        "receipts",
        600,
    );

    AppState::new(controller, RaffleConfig::default())
        .with_admin_token(Some(SecretString::new(ADMIN_TOKEN.to_string())))
}

fn create_test_app(receipts: &TempDir) -> Router {
    create_router_with_rate_limit(create_test_state(receipts), RateLimitState::permissive())
}

/// Build a multipart body with text fields and an optional receipt file.
fn multipart_body(fields: &[(&str, &str)], receipt: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }

    if let Some((file_name, data)) = receipt {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"receipt\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn registration_request(numbers: &str, contact: &str, receipt: Option<&[u8]>) -> Request<Body> {
    let body = multipart_body(
        &[
            ("name", "Maria Silva"),
            ("contact", contact),
            ("numbers", numbers),
        ],
        receipt.map(|data| ("pix.png", data)),
    );

    Request::builder()
        .method("POST")
        .uri("/v1/registrations")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let receipts = TempDir::new().unwrap();
    let app = create_test_app(&receipts);

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["available_count"], 250);
    assert_eq!(json["registration_count"], 0);
}

#[tokio::test]
async fn test_raffle_info() {
    let receipts = TempDir::new().unwrap();
    let app = create_test_app(&receipts);

    let response = app.oneshot(get("/v1/raffle")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["price_cents"], 600);
    assert_eq!(json["currency"], "BRL");
    assert_eq!(json["first_number"], 1);
    assert_eq!(json["last_number"], 250);
}

#[tokio::test]
async fn test_list_numbers_initially_full() {
    let receipts = TempDir::new().unwrap();
    let app = create_test_app(&receipts);

    let response = app.oneshot(get("/v1/numbers")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["total_available"], 250);
    assert_eq!(json["lowest"], 1);
    assert_eq!(json["highest"], 250);
    assert_eq!(json["available"].as_array().unwrap().len(), 250);
}

#[tokio::test]
async fn test_submit_registration() {
    let receipts = TempDir::new().unwrap();
    let app = create_test_app(&receipts);

    let response = app
        .clone()
        .oneshot(registration_request("17, 5", "(11) 98888-7777", Some(PNG)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = json_body(response).await;
    assert_eq!(json["id"], 1);
    assert_eq!(json["numbers"], serde_json::json!([5, 17]));
    assert_eq!(json["amount_due_cents"], 1200);

    let response = app.clone().oneshot(get("/v1/numbers")).await.unwrap();
    let json = json_body(response).await;
    assert_eq!(json["total_available"], 248);
    let available = json["available"].as_array().unwrap();
    assert!(!available.contains(&serde_json::json!(5)));
    assert!(!available.contains(&serde_json::json!(17)));

    let stored: Vec<_> = std::fs::read_dir(receipts.path().join("receipts"))
        .unwrap()
        .collect();
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn test_invalid_contact_rejected() {
    let receipts = TempDir::new().unwrap();
    let app = create_test_app(&receipts);

    let response = app
        .oneshot(registration_request("5", "123", Some(PNG)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let json = json_body(response).await;
    assert_eq!(json["code"], "INVALID_CONTACT");
}

#[tokio::test]
async fn test_out_of_range_numbers_rejected() {
    let receipts = TempDir::new().unwrap();
    let app = create_test_app(&receipts);

    for numbers in ["0", "251", "1, 251"] {
        let response = app
            .clone()
            .oneshot(registration_request(numbers, "11988887777", Some(PNG)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let json = json_body(response).await;
        assert_eq!(json["code"], "INVALID_SELECTION");
    }

    let response = app.oneshot(get("/v1/numbers")).await.unwrap();
    assert_eq!(json_body(response).await["total_available"], 250);
}

#[tokio::test]
async fn test_taken_numbers_conflict() {
    let receipts = TempDir::new().unwrap();
    let app = create_test_app(&receipts);

    let response = app
        .clone()
        .oneshot(registration_request("5, 17", "11988887777", Some(PNG)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(registration_request("3, 5, 17", "21977776666", Some(PNG)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let json = json_body(response).await;
    assert_eq!(json["code"], "NUMBERS_UNAVAILABLE");
    assert_eq!(json["error"], "These numbers are not available: 5, 17");
}

#[tokio::test]
async fn test_missing_receipt_rejected() {
    let receipts = TempDir::new().unwrap();
    let app = create_test_app(&receipts);

    let response = app
        .oneshot(registration_request("5", "11988887777", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json_body(response).await["code"], "MISSING_RECEIPT");
}

#[tokio::test]
async fn test_non_image_receipt_rejected() {
    let receipts = TempDir::new().unwrap();
    let app = create_test_app(&receipts);

    let response = app
        .oneshot(registration_request("5", "11988887777", Some(b"%PDF-1.7")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(!receipts.path().join("receipts").exists());
}

#[tokio::test]
async fn test_list_registrations_requires_token() {
    let receipts = TempDir::new().unwrap();
    let app = create_test_app(&receipts);

    let response = app.clone().oneshot(get("/v1/registrations")).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let request = Request::builder()
        .uri("/v1/registrations")
        .header(header::AUTHORIZATION, "Bearer wrong")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_list_registrations_with_token() {
    let receipts = TempDir::new().unwrap();
    let app = create_test_app(&receipts);

    let response = app
        .clone()
        .oneshot(registration_request("42", "11988887777", Some(PNG)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let request = Request::builder()
        .uri("/v1/registrations")
        .header(header::AUTHORIZATION, format!("Bearer {}", ADMIN_TOKEN))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["total"], 1);
    let registration = &json["registrations"][0];
    assert_eq!(registration["name"], "Maria Silva");
    assert_eq!(registration["numbers"], serde_json::json!([42]));
    assert!(registration["receipt_url"]
        .as_str()
        .unwrap()
        .starts_with("https://raffle.example/files/receipts/receipt_"));
}

#[tokio::test]
async fn test_upload_limit() {
    let receipts = TempDir::new().unwrap();
    let state = create_test_state(&receipts).with_upload_limit(1024);
    let app = create_router_with_rate_limit(state, RateLimitState::permissive());

    let mut large = PNG.to_vec();
    large.resize(4096, 0);

    let response = app
        .oneshot(registration_request("5", "11988887777", Some(&large)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_rate_limiting() {
    let receipts = TempDir::new().unwrap();
    // Very restrictive rate limit: 1 request per minute
    let app = create_router_with_rate_limit(create_test_state(&receipts), RateLimitState::new(1));

    let response = app.clone().oneshot(get("/v1/numbers")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(get("/v1/numbers")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    // Health check is not rate limited
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
