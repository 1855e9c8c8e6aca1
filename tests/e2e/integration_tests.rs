//! Service-level endpoints and lifecycle.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::TestHarness;
use axum::http::StatusCode;
use raffle_service::config::ServiceConfig;
use raffle_service::event::ServiceEvent;
use raffle_service::provider::ScriptedProvider;
use raffle_service::store::MemoryStore;
use raffle_service::ServiceBuilder;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_health_check() {
    let h = TestHarness::setup();
    let response = h.server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_settings_defaults_when_unset() {
    let h = TestHarness::setup();
    let body: Value = h.server.get("/settings").await.json();
    assert_eq!(body["is_active"], true);
    assert_eq!(body["winning_numbers"].as_array().unwrap().len(), 7);
}

#[tokio::test]
async fn test_quick_pick() {
    let h = TestHarness::setup();
    let body: Value = h.server.get("/quick-pick").add_query_param("count", 3).await.json();
    let combinations = body["combinations"].as_array().unwrap();
    assert_eq!(combinations.len(), 3);
    for combination in combinations {
        let numbers: Vec<u64> = combination
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n.as_u64().unwrap())
            .collect();
        assert_eq!(numbers.len(), 7);
        assert!(numbers.windows(2).all(|w| w[0] < w[1]));
        assert!(numbers.iter().all(|n| (1..=60).contains(n)));
    }

    h.server
        .get("/quick-pick")
        .add_query_param("count", 0)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_service_serves_until_shutdown() {
    let mut config = ServiceConfig::default();
    config.server.listen = SocketAddr::from(([127, 0, 0, 1], 0));

    let mut service = ServiceBuilder::new(config)
        .with_provider(Arc::new(ScriptedProvider::new()))
        .with_store(Arc::new(MemoryStore::new()))
        .build()
        .await
        .expect("service builds");
    let mut events = service.subscribe_events();
    let shutdown = service.shutdown_handle();

    let task = tokio::spawn(async move { service.run().await });
    assert!(matches!(events.recv().await.unwrap(), ServiceEvent::Started));

    shutdown.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("service stops in time")
        .unwrap()
        .expect("clean shutdown");
}
