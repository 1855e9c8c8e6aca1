//! Checkout flow over HTTP.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::harness::{TestHarness, CPF};
use axum::http::StatusCode;
use raffle_service::PaymentStatus;
use rust_decimal::Decimal;
use serde_json::{json, Value};

fn purchase_body(combinations: Value) -> Value {
    json!({
        "participant": {
            "full_name": "Maria Souza",
            "cpf": "529.982.247-25",
            "phone": "(11) 99999-0000",
            "email": "maria@example.com",
            "photo_url": "https://cdn.example.com/p.jpg"
        },
        "combinations": combinations
    })
}

#[tokio::test]
async fn test_purchase_then_webhook_then_lookup() {
    let h = TestHarness::setup();

    let response = h
        .server
        .post("/purchases")
        .json(&purchase_body(json!([[1, 2, 3, 4, 5, 6, 7], [8, 9, 10, 11, 12, 13, 14]])))
        .await;
    response.assert_status(StatusCode::CREATED);
    let receipt: Value = response.json();
    assert_eq!(receipt["total_amount"], json!(19.98));
    let payment_id = receipt["payment_id"].as_str().unwrap().to_string();

    let records = h.store.all();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].payment_status, PaymentStatus::Pending);
    assert_eq!(records[0].cpf, CPF);

    h.provider
        .set_payment(&payment_id, "approved", Some(Decimal::new(1998, 2)));
    h.server
        .post("/webhooks/payments")
        .json(&json!({"type": "payment", "data": {"id": payment_id}}))
        .await
        .assert_status_ok();

    let body: Value = h.server.get(&format!("/tickets/{CPF}")).await.json();
    assert_eq!(body["tickets"][0]["payment_status"], json!("approved"));
    assert_eq!(
        body["tickets"][0]["combinations"],
        json!([[1, 2, 3, 4, 5, 6, 7], [8, 9, 10, 11, 12, 13, 14]])
    );
}

#[tokio::test]
async fn test_purchase_validation_error() {
    let h = TestHarness::setup();
    let response = h
        .server
        .post("/purchases")
        .json(&purchase_body(json!([[1, 2, 3]])))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], json!("VALIDATION_ERROR"));
    assert!(h.provider.created().is_empty());
}

#[tokio::test]
async fn test_purchase_provider_failure_is_bad_gateway() {
    let h = TestHarness::setup();
    h.provider.fail_creation("invalid access token");
    h.server
        .post("/purchases")
        .json(&purchase_body(json!([[1, 2, 3, 4, 5, 6, 7]])))
        .await
        .assert_status(StatusCode::BAD_GATEWAY);
    assert!(h.store.all().is_empty());
}
