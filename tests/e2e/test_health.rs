use crate::e2e::helpers;

use helpers::{eventually, ws_client::WsClient, TestContext};
use hyper::StatusCode;
use test_context::test_context;
use tts_relay::domain::relay::ProbeStatus;

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_return_ok_for_health_check(ctx: &TestContext) {
    let response = ctx.client.get("/health").await.unwrap();

    response.assert_status(StatusCode::OK);

    // Health endpoint returns plain text
    let body = String::from_utf8(response.body_bytes.clone()).unwrap();
    assert_eq!(body, "OK");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_report_zero_connections_when_idle(ctx: &TestContext) {
    let response = ctx.client.get("/api/health").await.unwrap();

    response.assert_status(StatusCode::OK);

    let status: ProbeStatus = response.json().unwrap();
    assert_eq!(status.server, "ok");
    assert_eq!(status.websocket, 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_count_open_relay_connections(ctx: &TestContext) {
    let mut ws = WsClient::connect(&ctx.ws_url).await.unwrap();
    ws.recv().await.unwrap();

    let response = ctx.client.get("/api/health").await.unwrap();
    let status: ProbeStatus = response.json().unwrap();
    assert_eq!(status.websocket, 1);

    ws.close().await.unwrap();

    let client = ctx.client.clone();
    let drained = eventually(|| {
        let client = client.clone();
        async move {
            let response = client.get("/api/health").await.unwrap();
            response.json::<ProbeStatus>().unwrap().websocket == 0
        }
    })
    .await;
    assert!(drained, "probe still counts the closed connection");
    assert_eq!(ctx.registry.open_count(), 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_include_request_id_in_health_responses(ctx: &TestContext) {
    let response = ctx.client.get("/health").await.unwrap();
    response.assert_header_exists("x-request-id");

    let response = ctx.client.get("/api/health").await.unwrap();
    response.assert_header_exists("x-request-id");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_propagate_incoming_request_id(ctx: &TestContext) {
    let response = ctx
        .client
        .get_with_headers("/health", &[("x-request-id", "trace-123")])
        .await
        .unwrap();

    assert_eq!(response.header("x-request-id").map(String::as_str), Some("trace-123"));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_allow_cross_origin_probes(ctx: &TestContext) {
    let response = ctx
        .client
        .get_with_headers("/api/health", &[("origin", "http://localhost:3000")])
        .await
        .unwrap();

    response
        .assert_status(StatusCode::OK)
        .assert_header_exists("access-control-allow-origin");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_handle_concurrent_health_checks(ctx: &TestContext) {
    let mut futures = Vec::new();
    for _ in 0..10 {
        let client = ctx.client.clone();
        futures.push(async move { client.get("/api/health").await });
    }

    let results = futures::future::join_all(futures).await;

    for result in results {
        let response = result.unwrap();
        response.assert_status(StatusCode::OK);
    }
}
