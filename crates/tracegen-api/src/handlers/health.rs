//! Root and health check handlers.

use axum::{
    Extension, Json,
    extract::State,
    http::Method,
};
use serde::Serialize;
use tracegen_trace::attr;
use tracing::info;

use crate::middleware::RequestSpan;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub message: String,
    pub service: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

pub async fn home(
    State(state): State<AppState>,
    Extension(RequestSpan(parent)): Extension<RequestSpan>,
    method: Method,
) -> Json<HomeResponse> {
    info!("Root endpoint called");

    let span = state.telemetry.start_span("home-handler", &parent);
    span.set_attribute(attr::ENDPOINT, "/");
    span.set_attribute(attr::METHOD, method.as_str().to_string());

    Json(HomeResponse {
        message: format!("Welcome to {}", state.service_name),
        service: state.service_name.clone(),
        status: "running".to_string(),
    })
}

pub async fn health(
    State(state): State<AppState>,
    Extension(RequestSpan(parent)): Extension<RequestSpan>,
) -> Json<HealthResponse> {
    info!("Health check endpoint called");

    let span = state.telemetry.start_span("health-check", &parent);
    span.set_attribute(attr::ENDPOINT, "/health");
    span.set_attribute(attr::HEALTH_STATUS, "healthy");

    Json(HealthResponse {
        status: "healthy".to_string(),
        service: state.service_name.clone(),
    })
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_support::*;
    use axum::http::StatusCode;
    use opentelemetry::Value;
    use opentelemetry::trace::SpanKind;
    use tracegen_trace::testing::*;

    #[tokio::test]
    async fn test_home() {
        let (router, exporter) = app();
        let (status, body) = get(&router, "/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], SERVICE);
        assert_eq!(body["status"], "running");
        assert!(body["message"].as_str().unwrap().contains(SERVICE));

        let spans = finished_spans(&exporter);
        let handler = find(&spans, "home-handler").unwrap();
        assert_eq!(attribute(handler, "endpoint"), Some(&Value::from("/")));
        assert_eq!(attribute(handler, "method"), Some(&Value::from("GET")));

        let server = find(&spans, "GET /").unwrap();
        assert_eq!(server.span_kind, SpanKind::Server);
        assert_eq!(handler.parent_span_id, server.span_context.span_id());
    }

    #[tokio::test]
    async fn test_health_always_healthy() {
        let (router, exporter) = app();
        for _ in 0..3 {
            let (status, body) = get(&router, "/health").await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["status"], "healthy");
            assert_eq!(body["service"], SERVICE);
        }

        let spans = finished_spans(&exporter);
        let checks = named(&spans, "health-check");
        assert_eq!(checks.len(), 3);
        for span in checks {
            assert_eq!(attribute(span, "endpoint"), Some(&Value::from("/health")));
            assert_eq!(attribute(span, "health.status"), Some(&Value::from("healthy")));
        }
    }

    #[tokio::test]
    async fn test_server_span_attributes() {
        let (router, exporter) = app();
        get(&router, "/health").await;

        let spans = finished_spans(&exporter);
        let server = find(&spans, "GET /health").unwrap();
        assert_eq!(attribute(server, "http.request.method"), Some(&Value::from("GET")));
        assert_eq!(attribute(server, "http.route"), Some(&Value::from("/health")));
        assert_eq!(attribute(server, "url.path"), Some(&Value::from("/health")));
        assert_eq!(
            attribute(server, "http.response.status_code"),
            Some(&Value::I64(200))
        );
        assert_eq!(roots(&spans).len(), 1);
    }
}
