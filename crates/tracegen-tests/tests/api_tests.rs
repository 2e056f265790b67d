//! API integration tests over real HTTP.
//!
//! Run with: `cargo test -p tracegen-tests --test api_tests`

use opentelemetry::Value as AttrValue;
use opentelemetry::trace::{SpanKind, Status};
use reqwest::StatusCode;
use serde_json::{Value, json};
use std::time::Duration;
use tracegen_tests::{ApiTestClient, TEST_SERVICE, TestServer, init_test_logging, wait_for};
use tracegen_trace::testing::{attribute, children, exception_messages, find, named};

async fn setup() -> (TestServer, ApiTestClient) {
    init_test_logging();
    let server = TestServer::start().await.expect("Failed to start server");
    let client = ApiTestClient::new(server.addr);
    (server, client)
}

async fn wait_for_span(server: &TestServer, name: &str) -> bool {
    wait_for(Duration::from_secs(2), Duration::from_millis(20), || async move {
        find(&server.spans(), name).is_some()
    })
    .await
}

#[tokio::test]
async fn test_home_endpoint() {
    let (server, client) = setup().await;

    let resp = client.get("/").await.expect("Request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse JSON");
    assert_eq!(body["service"], TEST_SERVICE);
    assert_eq!(body["status"], "running");
    assert!(body["message"].as_str().unwrap().contains(TEST_SERVICE));

    assert!(wait_for_span(&server, "GET /").await);
    let spans = server.spans();
    let handler = find(&spans, "home-handler").unwrap();
    assert_eq!(attribute(handler, "endpoint"), Some(&AttrValue::from("/")));
    assert_eq!(attribute(handler, "method"), Some(&AttrValue::from("GET")));
}

#[tokio::test]
async fn test_health_endpoint() {
    let (server, client) = setup().await;

    let resp = client.get("/health").await.expect("Request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse JSON");
    assert_eq!(body, json!({"status": "healthy", "service": TEST_SERVICE}));

    assert!(wait_for_span(&server, "GET /health").await);
    let spans = server.spans();
    let handler = find(&spans, "health-check").unwrap();
    assert_eq!(
        attribute(handler, "health.status"),
        Some(&AttrValue::from("healthy"))
    );
}

#[tokio::test]
async fn test_get_data_endpoint() {
    let (_server, client) = setup().await;

    let resp = client.get("/api/data").await.expect("Request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse JSON");

    let id = body["id"].as_i64().unwrap();
    assert!((1..=1000).contains(&id));
    let value = body["value"].as_f64().unwrap();
    assert!((0.0..=100.0).contains(&value));
    assert!(body["timestamp"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn test_process_data_echoes_json() {
    let (server, client) = setup().await;

    let input = json!({"auto": true, "value": 7});
    let resp = client
        .post("/api/process", &input)
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse JSON");
    assert_eq!(body["processed"], true);
    assert_eq!(body["input"], input);
    assert!((100..=999).contains(&body["result"].as_i64().unwrap()));
    assert!(body["processing_time"].as_f64().unwrap() >= 0.2);

    assert!(wait_for_span(&server, "POST /api/process").await);
    let spans = server.spans();
    let root = find(&spans, "process-data").unwrap();
    let names: Vec<_> = children(&spans, root)
        .iter()
        .map(|s| s.name.to_string())
        .collect();
    assert_eq!(names, vec!["validate-input", "transform-data"]);
}

#[tokio::test]
async fn test_process_data_without_json() {
    let (_server, client) = setup().await;

    let resp = client
        .post_raw("/api/process", "text/plain", "not json at all")
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse JSON");
    assert_eq!(body["processed"], true);
    assert_eq!(body["input"], json!({}));
}

#[tokio::test]
async fn test_chain_endpoint() {
    let (server, client) = setup().await;

    let resp = client.get("/api/chain").await.expect("Request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse JSON");
    assert_eq!(body["total_steps"], 3);

    let operations = body["operations"].as_array().unwrap();
    assert_eq!(operations.len(), 3);
    for (i, op) in operations.iter().enumerate() {
        assert_eq!(op["step"].as_i64().unwrap(), i as i64 + 1);
        assert!((1..=100).contains(&op["value"].as_i64().unwrap()));
    }

    assert!(wait_for_span(&server, "GET /api/chain").await);
    let spans = server.spans();
    let root = find(&spans, "chain-operations").unwrap();
    assert_eq!(children(&spans, root).len(), 3);
}

#[tokio::test]
async fn test_error_endpoint() {
    let (server, client) = setup().await;

    let resp = client.get("/api/error").await.expect("Request failed");
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = resp.json().await.expect("Failed to parse JSON");
    assert_eq!(body["error"], "Intentional error for testing");
    assert_eq!(body["message"], "This is an intentional error for testing");

    assert!(wait_for_span(&server, "GET /api/error").await);
    let spans = server.spans();

    let handler = find(&spans, "error-handler").unwrap();
    assert_eq!(attribute(handler, "error"), Some(&AttrValue::Bool(true)));
    assert_eq!(
        exception_messages(handler),
        vec!["Intentional error for testing".to_string()]
    );

    let server_span = find(&spans, "GET /api/error").unwrap();
    assert_eq!(server_span.span_kind, SpanKind::Server);
    assert!(matches!(server_span.status, Status::Error { .. }));
    assert_eq!(
        attribute(server_span, "http.response.status_code"),
        Some(&AttrValue::I64(500))
    );
}

#[tokio::test]
async fn test_concurrent_requests_keep_separate_traces() {
    let (server, client) = setup().await;

    let (a, b, c) = tokio::join!(
        client.get("/api/chain"),
        client.get("/api/chain"),
        client.get("/api/data"),
    );
    for resp in [a, b, c] {
        assert_eq!(resp.expect("Request failed").status(), StatusCode::OK);
    }

    let observed = &server;
    assert!(
        wait_for(Duration::from_secs(2), Duration::from_millis(20), || async move {
            named(&observed.spans(), "GET /api/chain").len() == 2
        })
        .await
    );

    let spans = server.spans();
    let roots = named(&spans, "chain-operations");
    assert_eq!(roots.len(), 2);
    assert_ne!(
        roots[0].span_context.trace_id(),
        roots[1].span_context.trace_id()
    );
    for root in roots {
        let ops = children(&spans, root);
        assert_eq!(ops.len(), 3);
        for op in ops {
            assert_eq!(op.span_context.trace_id(), root.span_context.trace_id());
        }
    }
}

#[tokio::test]
async fn test_incoming_traceparent_is_honored() {
    let (server, _client) = setup().await;

    let header = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";
    let resp = reqwest::Client::new()
        .get(format!("{}/health", server.base_url()))
        .header("traceparent", header)
        .send()
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    assert!(wait_for_span(&server, "GET /health").await);
    let spans = server.spans();
    let server_span = find(&spans, "GET /health").unwrap();
    assert_eq!(
        server_span.span_context.trace_id().to_string(),
        "4bf92f3577b34da6a3ce929d0e0e4736"
    );
    assert_eq!(server_span.parent_span_id.to_string(), "00f067aa0ba902b7");
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let (server, client) = setup().await;

    let resp = client.get("/does-not-exist").await.expect("Request failed");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.expect("Failed to parse JSON");
    assert_eq!(body["error"], "not found");
    assert_eq!(body["path"], "/does-not-exist");

    assert!(server.spans().is_empty());
}
