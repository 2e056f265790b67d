//! Test helper functions and utilities.

use opentelemetry_sdk::export::trace::SpanData;
use reqwest::Client;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracegen_api::{AppState, create_router};
use tracegen_core::ports::SeededRandom;
use tracegen_trace::Telemetry;
use tracegen_trace::testing::{InMemorySpanExporter, finished_spans, in_memory};

/// Service name reported by test servers.
pub const TEST_SERVICE: &str = "tracegen-test";

/// A running server with in-memory span capture.
pub struct TestServer {
    pub addr: SocketAddr,
    pub telemetry: Telemetry,
    pub exporter: InMemorySpanExporter,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Bind the router to an ephemeral loopback port and serve it.
    pub async fn start() -> anyhow::Result<Self> {
        let (telemetry, exporter) = in_memory();
        let state = AppState::new(
            TEST_SERVICE,
            telemetry.clone(),
            Arc::new(SeededRandom::new(7)),
        );

        let app = create_router(state);
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            addr,
            telemetry,
            exporter,
            handle,
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Spans finished so far.
    pub fn spans(&self) -> Vec<SpanData> {
        finished_spans(&self.exporter)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// API test client with base URL.
pub struct ApiTestClient {
    client: Client,
    base_url: String,
}

impl ApiTestClient {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            client: Client::new(),
            base_url: format!("http://{}", addr),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Result<reqwest::Response> {
        self.client.get(self.url(path)).send().await
    }

    pub async fn post<T: serde::Serialize>(
        &self,
        path: &str,
        body: &T,
    ) -> reqwest::Result<reqwest::Response> {
        self.client.post(self.url(path)).json(body).send().await
    }

    /// POST a raw body with an explicit content type.
    pub async fn post_raw(
        &self,
        path: &str,
        content_type: &str,
        body: impl Into<reqwest::Body>,
    ) -> reqwest::Result<reqwest::Response> {
        self.client
            .post(self.url(path))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
    }

    /// Check health endpoint.
    pub async fn health(&self) -> anyhow::Result<bool> {
        let resp = self.get("/health").await?;
        Ok(resp.status().is_success())
    }
}

/// Wait for a condition with timeout.
pub async fn wait_for<F, Fut>(timeout: Duration, interval: Duration, mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let start = std::time::Instant::now();
    while start.elapsed() < timeout {
        if condition().await {
            return true;
        }
        tokio::time::sleep(interval).await;
    }
    false
}
