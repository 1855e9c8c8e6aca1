//! Ticket lookup flow over HTTP.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::harness::{TestHarness, CPF};
use axum::http::StatusCode;
use raffle_service::PaymentStatus;
use serde_json::{json, Value};

#[tokio::test]
async fn test_lookup_reconciles_pending_payment() {
    let h = TestHarness::setup();
    let id = h.insert_registration(CPF, "900", PaymentStatus::Pending, json!("[1,2,3,4,5,6,7]"));
    h.provider.set_payment("900", "in_process", None);

    let response = h.server.get(&format!("/tickets/{CPF}")).await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["document"], json!("529.982.247-25"));
    assert_eq!(body["tickets"][0]["payment_status"], json!("approved"));
    assert_eq!(body["tickets"][0]["combinations"], json!([[1, 2, 3, 4, 5, 6, 7]]));
    assert_eq!(h.status_of(&id), PaymentStatus::Approved);
    assert_eq!(h.store.stats().approvals, 1);
}

#[tokio::test]
async fn test_lookup_shows_rejection_without_writing() {
    let h = TestHarness::setup();
    let id = h.insert_registration(CPF, "901", PaymentStatus::Pending, json!([]));
    h.provider.set_payment("901", "rejected", None);

    let body: Value = h.server.get(&format!("/tickets/{CPF}")).await.json();
    assert_eq!(body["tickets"][0]["payment_status"], json!("rejected"));
    assert_eq!(h.status_of(&id), PaymentStatus::Pending);
    assert_eq!(h.store.stats().approvals, 0);
}

#[tokio::test]
async fn test_lookup_matches_masked_legacy_rows() {
    let h = TestHarness::setup();
    h.insert_registration("529.982.247-25", "1", PaymentStatus::Approved, json!([[5, 10, 20, 30, 40, 50, 61]]));
    h.insert_registration(CPF, "2", PaymentStatus::Approved, json!({"a": [1, 2, 3, 4, 5, 6, 7]}));

    let body: Value = h.server.get("/tickets/529.982.247-25").await.json();
    let tickets = body["tickets"].as_array().unwrap();
    assert_eq!(tickets.len(), 2);
    assert!(tickets
        .iter()
        .any(|t| t["combinations"] == json!([[5, 10, 20, 30, 40, 50]])));
    assert_eq!(h.provider.payment_queries(), 0);
}

#[tokio::test]
async fn test_lookup_rejects_incomplete_document() {
    let h = TestHarness::setup();
    let response = h.server.get("/tickets/123.456").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], json!("BAD_REQUEST"));
}

#[tokio::test]
async fn test_lookup_unknown_document_is_empty() {
    let h = TestHarness::setup();
    let body: Value = h.server.get(&format!("/tickets/{CPF}")).await.json();
    assert_eq!(body["tickets"], json!([]));
}
