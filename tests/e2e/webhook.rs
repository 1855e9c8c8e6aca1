//! Provider notification flow over HTTP.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::harness::{with_signature, TestHarness, CPF, WEBHOOK_SECRET};
use axum::http::StatusCode;
use raffle_service::config::ServiceConfig;
use raffle_service::event::{ApprovalSource, ServiceEvent};
use raffle_service::PaymentStatus;
use rust_decimal::Decimal;
use serde_json::{json, Value};

#[tokio::test]
async fn test_approved_payment_notification_settles_registration() {
    let mut h = TestHarness::setup();
    let id = h.insert_registration(CPF, "1319", PaymentStatus::Pending, json!([1, 2, 3, 4, 5, 6, 7]));
    h.provider
        .set_payment("1319", "approved", Some(Decimal::new(999, 2)));

    let request = h
        .server
        .post("/webhooks/payments")
        .json(&json!({"type": "payment", "data": {"id": "1319"}}));
    let response = with_signature(request, "1319", "req-1", WEBHOOK_SECRET).await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({"received": true}));
    assert_eq!(h.status_of(&id), PaymentStatus::Approved);
    assert!(matches!(
        h.events.try_recv().unwrap(),
        ServiceEvent::PaymentApproved {
            source: ApprovalSource::Webhook,
            ..
        }
    ));
}

#[tokio::test]
async fn test_duplicate_notifications_converge() {
    let h = TestHarness::setup();
    let id = h.insert_registration(CPF, "77", PaymentStatus::Pending, json!([]));
    h.provider
        .set_payment("77", "accredited", Some(Decimal::new(1998, 2)));

    for _ in 0..3 {
        h.server
            .post("/webhooks/payments")
            .json(&json!({"data": {"id": 77}}))
            .await
            .assert_status_ok();
    }

    let record = h.store.get(&id).unwrap();
    assert_eq!(record.payment_status, PaymentStatus::Approved);
    assert_eq!(record.total_amount, Decimal::new(1998, 2));
}

#[tokio::test]
async fn test_bad_signature_is_only_logged_by_default() {
    let mut h = TestHarness::setup();
    let id = h.insert_registration(CPF, "42", PaymentStatus::Pending, json!([]));
    h.provider.set_payment("42", "approved", None);

    let request = h
        .server
        .post("/webhooks/payments")
        .json(&json!({"data": {"id": "42"}}));
    with_signature(request, "42", "req-9", "not-the-secret")
        .await
        .assert_status_ok();

    assert_eq!(h.status_of(&id), PaymentStatus::Approved);
    assert!(matches!(
        h.events.try_recv().unwrap(),
        ServiceEvent::SignatureMismatch { .. }
    ));
}

#[tokio::test]
async fn test_bad_signature_rejected_when_enforced() {
    let mut config = ServiceConfig::default();
    config.webhook.enforce_signature = true;
    let h = TestHarness::setup_with_config(config);
    let id = h.insert_registration(CPF, "42", PaymentStatus::Pending, json!([]));
    h.provider.set_payment("42", "approved", None);

    let request = h
        .server
        .post("/webhooks/payments")
        .json(&json!({"data": {"id": "42"}}));
    let response = with_signature(request, "42", "req-9", "not-the-secret").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(h.status_of(&id), PaymentStatus::Pending);
}

#[tokio::test]
async fn test_non_post_is_acknowledged() {
    let h = TestHarness::setup();
    let response = h.server.get("/webhooks/payments").await;
    response.assert_status_ok();
    assert_eq!(response.text(), "Ok");
    assert_eq!(h.provider.payment_queries(), 0);
}

#[tokio::test]
async fn test_malformed_body_answers_error() {
    let h = TestHarness::setup();
    let response = h
        .server
        .post("/webhooks/payments")
        .text("{not json")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.text(), "Error");
}

#[tokio::test]
async fn test_null_body_answers_error() {
    let h = TestHarness::setup();
    let response = h
        .server
        .post("/webhooks/payments")
        .add_query_param("data.id", "1319")
        .json(&Value::Null)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.text(), "Error");
    assert_eq!(h.provider.payment_queries(), 0);
}

#[tokio::test]
async fn test_provider_failure_answers_error() {
    let h = TestHarness::setup();
    let id = h.insert_registration(CPF, "500", PaymentStatus::Pending, json!([]));
    h.provider.fail_payment("500", "provider unavailable");

    h.server
        .post("/webhooks/payments")
        .json(&json!({"data": {"id": "500"}}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(h.status_of(&id), PaymentStatus::Pending);
}

#[tokio::test]
async fn test_order_notification_via_query_string() {
    let h = TestHarness::setup();
    let id = h.insert_registration(CPF, "ORD123", PaymentStatus::Pending, json!([]));
    h.provider
        .set_order("ORD123", "processed", Some(Decimal::new(2997, 2)));

    h.server
        .post("/webhooks/payments")
        .add_query_param("data.id", "ORD123")
        .add_query_param("type", "order")
        .json(&json!({}))
        .await
        .assert_status_ok();

    let record = h.store.get(&id).unwrap();
    assert_eq!(record.payment_status, PaymentStatus::Approved);
    assert_eq!(record.total_amount, Decimal::new(2997, 2));
}

#[tokio::test]
async fn test_pending_payment_notification_writes_nothing() {
    let h = TestHarness::setup();
    let id = h.insert_registration(CPF, "88", PaymentStatus::Pending, json!([]));
    h.provider.set_payment("88", "pending", None);

    h.server
        .post("/webhooks/payments")
        .json(&json!({"data": {"id": "88"}}))
        .await
        .assert_status_ok();

    assert_eq!(h.status_of(&id), PaymentStatus::Pending);
    assert_eq!(h.store.stats().settlements, 0);
}
