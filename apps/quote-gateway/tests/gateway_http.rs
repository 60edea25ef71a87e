//! Gateway REST Integration Tests
//!
//! Drives the router in-process with stub providers.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]

mod common;

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use quote_gateway::infrastructure::gateway::create_router;
use quote_gateway::{GatewayState, HistoryPoint, Quote};
use serde_json::Value;
use tower::ServiceExt;

use common::{StubProvider, stub_hub};

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn app() -> (axum::Router, std::sync::Arc<StubProvider>, std::sync::Arc<StubProvider>) {
    let crypto = StubProvider::new("crypto-stub");
    let equity = StubProvider::new("equity-stub");
    let hub = stub_hub(&crypto, &equity, Duration::from_secs(3600));
    (create_router(GatewayState::new(hub)), crypto, equity)
}

#[tokio::test]
async fn test_root_reports_service() {
    let (app, _, _) = app();
    let (status, body) = get(app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "Finance API");
}

#[tokio::test]
async fn test_quote_routes_by_asset_kind() {
    let (app, crypto, equity) = app();

    let (status, body) = get(app.clone(), "/quote/btc").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ticker"], "BTC/USDT");
    assert_eq!(body["type"], "crypto");
    assert_eq!(crypto.calls(), 1);
    assert_eq!(equity.calls(), 0);

    let (status, body) = get(app, "/quote/aapl").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ticker"], "AAPL");
    assert_eq!(body["type"], "stock");
    assert_eq!(equity.calls(), 1);
}

#[tokio::test]
async fn test_quote_accepts_slash_pairs() {
    let (app, _, _) = app();
    let (status, body) = get(app, "/quote/eth/usdt").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ticker"], "ETH/USDT");
}

#[tokio::test]
async fn test_quote_served_from_live_poller() {
    let crypto = StubProvider::new("crypto-stub");
    let equity = StubProvider::new("equity-stub");
    let hub = stub_hub(&crypto, &equity, Duration::from_secs(3600));
    let app = create_router(GatewayState::new(hub.clone()));

    let mut subscription = hub.subscribe_ticker("BTC");
    let live = subscription.recv().await.unwrap();
    assert_eq!(crypto.calls(), 1);

    let (status, body) = get(app, "/quote/BTCUSDT").await;
    assert_eq!(status, StatusCode::OK);
    let served: Quote = serde_json::from_value(body).unwrap();
    assert_eq!(served, live);
    assert_eq!(crypto.calls(), 1, "cached quote must not hit upstream");
}

#[tokio::test]
async fn test_upstream_failure_maps_to_bad_gateway() {
    let (app, _, equity) = app();
    equity.set_failing(true);

    let (status, body) = get(app, "/quote/MSFT").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "upstream_error");
    assert!(body["message"].as_str().unwrap().contains("stub outage"));
}

#[tokio::test]
async fn test_history_is_sorted_and_defaults_apply() {
    let (app, _, _) = app();
    let (status, body) = get(app, "/history/AAPL").await;

    assert_eq!(status, StatusCode::OK);
    let points: Vec<HistoryPoint> = serde_json::from_value(body).unwrap();
    let times: Vec<f64> = points.iter().map(|p| p.time_seconds).collect();
    assert_eq!(times, vec![1_700_000_000.0, 1_700_000_060.0, 1_700_000_120.0]);
}

#[tokio::test]
async fn test_history_rejects_unknown_interval() {
    let (app, _, _) = app();
    let (status, body) = get(app, "/history/BTC?period=5d&interval=7m").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_parameter");
}

#[tokio::test]
async fn test_search_matches_symbol_and_name() {
    let (app, _, _) = app();

    let (status, body) = get(app.clone(), "/search?q=bitcoin").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["symbol"], "BTC/USDT");
    assert_eq!(body[0]["type"], "Crypto");

    let (_, body) = get(app.clone(), "/search?q=zzzz-not-listed").await;
    assert_eq!(body, serde_json::json!([]));

    let (_, body) = get(app, "/search").await;
    assert_eq!(body.as_array().unwrap().len(), 10);
}
