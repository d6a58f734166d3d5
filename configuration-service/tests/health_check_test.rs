//! Health, readiness and metrics endpoints.

mod common;

use common::TestApp;

#[tokio::test]
async fn health_check_works() {
    let app = TestApp::spawn().await;

    let response = app.get("/health").await;

    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "configuration-service");
}

#[tokio::test]
async fn readiness_check_works() {
    let app = TestApp::spawn().await;

    let response = app.get("/ready").await;

    assert!(response.status().is_success());
}

#[tokio::test]
async fn metrics_endpoint_reports_requests() {
    let app = TestApp::spawn().await;
    app.get("/nodes").await;

    let response = app.get("/metrics").await;

    assert!(response.status().is_success());
    assert!(response
        .headers()
        .get("content-type")
        .map(|v| v.to_str().unwrap_or("").contains("text/plain"))
        .unwrap_or(false));
    let text = response.text().await.expect("Failed to read body");
    assert!(text.contains("http_requests_total"));
}

#[tokio::test]
async fn responses_carry_request_id() {
    let app = TestApp::spawn().await;

    let generated = app.get("/health").await;
    assert!(generated.headers().contains_key("x-request-id"));

    let echoed = app
        .client
        .get(app.url("/health"))
        .header("x-request-id", "req-42")
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(
        echoed.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
        Some("req-42")
    );
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let app = TestApp::spawn().await;

    let response = app.get("/does-not-exist").await;

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn metrics_endpoint_reports_domain_counters() {
    let app = TestApp::spawn().await;
    let root = app
        .create_node("Metrics Application", "application", None)
        .await;
    let cfg = app
        .create_configuration(&root, "Counted", serde_json::json!({}))
        .await;
    let response = app
        .post(
            &format!("/configurations/{}/clone", cfg),
            &serde_json::json!({ "destinationNodeId": root }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);

    let text = app
        .get("/metrics")
        .await
        .text()
        .await
        .expect("Failed to read body");

    assert!(text.contains("configuration_mutations_total"));
    assert!(text.contains("operation=\"create_node\""));
    assert!(text.contains("configurations_cloned_total"));
    assert!(text.contains("http_request_duration_seconds"));
}
