//! Administration listing and summary over HTTP.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::harness::{TestHarness, CPF};
use raffle_service::PaymentStatus;
use serde_json::{json, Value};

fn amount(value: &Value) -> f64 {
    value.as_f64().expect("amount is a number")
}

#[tokio::test]
async fn test_registrations_list_normalizes_every_record() {
    let h = TestHarness::setup();
    h.insert_registration(
        CPF,
        "700",
        PaymentStatus::Approved,
        json!("\"[1,2,3,4,5,6,7,8,9,10,11,12,13,14]\""),
    );
    h.insert_registration("11144477735", "701", PaymentStatus::Pending, Value::Null);

    let response = h.server.get("/registrations").await;
    response.assert_status_ok();

    let body: Value = response.json();
    let rows = body["registrations"].as_array().unwrap();
    assert_eq!(rows.len(), 2);

    let approved = rows.iter().find(|r| r["payment_id"] == json!("700")).unwrap();
    assert_eq!(
        approved["combinations"],
        json!([[1, 2, 3, 4, 5, 6, 7], [8, 9, 10, 11, 12, 13, 14]])
    );
    let pending = rows.iter().find(|r| r["payment_id"] == json!("701")).unwrap();
    assert_eq!(pending["combinations"], json!([]));
    assert_eq!(pending["payment_status"], json!("pending"));

    // listing never asks the provider
    assert_eq!(h.provider.payment_queries(), 0);
}

#[tokio::test]
async fn test_summary_splits_revenue_and_counts_tickets() {
    let h = TestHarness::setup();
    h.insert_registration(
        CPF,
        "800",
        PaymentStatus::Approved,
        json!([[1, 2, 3, 4, 5, 6, 7], [8, 9, 10, 11, 12, 13, 14]]),
    );
    h.insert_registration(CPF, "801", PaymentStatus::Pending, json!("1,2,3,4,5,6,7"));
    h.insert_registration(
        CPF,
        "802",
        PaymentStatus::parse("rejected"),
        json!([1, 2, 3, 4, 5, 6, 7]),
    );

    let response = h.server.get("/summary").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert!((amount(&body["approved_revenue"]) - 9.99).abs() < 1e-9);
    assert!((amount(&body["pending_revenue"]) - 9.99).abs() < 1e-9);
    assert_eq!(body["ticket_count"], json!(4));
    assert_eq!(body["registrations"], json!(3));
    assert_eq!(h.store.stats().approvals, 0);
}

#[tokio::test]
async fn test_summary_of_empty_store() {
    let h = TestHarness::setup();
    let body: Value = h.server.get("/summary").await.json();
    assert!(amount(&body["approved_revenue"]).abs() < f64::EPSILON);
    assert_eq!(body["ticket_count"], json!(0));
}
