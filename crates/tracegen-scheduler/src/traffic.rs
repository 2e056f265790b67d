//! Self-traffic loop.

use futures::FutureExt;
use opentelemetry::Context;
use opentelemetry::trace::SpanKind;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracegen_core::endpoint::{EndpointDescriptor, HttpMethod, default_endpoints};
use tracegen_core::ports::RandomSource;
use tracegen_core::{Error, Result};
use tracegen_trace::{Telemetry, attr};
use tracing::{debug, error, info};

use crate::config::TrafficConfig;

/// Span wrapping every generated call.
pub const AUTO_TRACE_SPAN: &str = "auto-trace-call";

/// Result of a single generated call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    Completed { endpoint: String, status: u16 },
    Failed { endpoint: String, error: String },
}

/// Background generator that calls the service's own endpoints.
pub struct TrafficGenerator {
    config: TrafficConfig,
    endpoints: Vec<EndpointDescriptor>,
    client: reqwest::Client,
    telemetry: Telemetry,
    random: Arc<dyn RandomSource>,
}

impl TrafficGenerator {
    pub fn new(
        config: TrafficConfig,
        telemetry: Telemetry,
        random: Arc<dyn RandomSource>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            config,
            endpoints: default_endpoints(),
            client,
            telemetry,
            random,
        })
    }

    /// Replace the endpoint set.
    pub fn with_endpoints(mut self, endpoints: Vec<EndpointDescriptor>) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Run the loop until `shutdown` flips to `true`.
    ///
    /// A failed or panicking iteration is logged and followed by the regular
    /// interval; it never ends the loop. Dropping the sender without
    /// signalling leaves the loop running for the life of the runtime.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            base_url = %self.config.base_url,
            interval_secs = self.config.interval.as_secs_f64(),
            startup_delay_secs = self.config.startup_delay.as_secs_f64(),
            "Starting auto trace generator"
        );

        if !pause(self.config.startup_delay, &mut shutdown).await {
            info!("Auto trace generator stopped before first call");
            return;
        }

        info!("Auto trace generator started");

        loop {
            match AssertUnwindSafe(self.tick()).catch_unwind().await {
                Ok(Ok(outcome)) => debug!(?outcome, "Auto trace iteration finished"),
                Ok(Err(e)) => error!(error = %e, "Error in auto trace generator"),
                Err(_) => error!("Auto trace iteration panicked"),
            }

            if !pause(self.config.interval, &mut shutdown).await {
                info!("Auto trace generator shutting down");
                break;
            }
        }
    }

    /// Perform one iteration: pick an endpoint and call it inside an
    /// `auto-trace-call` span.
    ///
    /// Request failures are recorded on the span and reported as
    /// [`CallOutcome::Failed`]; only faults outside the call return `Err`.
    pub async fn tick(&self) -> Result<CallOutcome> {
        let index = self
            .random
            .index(self.endpoints.len())
            .ok_or(Error::NoEndpoints)?;
        let endpoint = &self.endpoints[index];

        let span = self
            .telemetry
            .start_span_with_kind(AUTO_TRACE_SPAN, SpanKind::Client, &Context::new());
        span.set_attribute(attr::AUTO_GENERATED, true);
        span.set_attribute(attr::TARGET_ENDPOINT, endpoint.path.clone());
        span.set_attribute(attr::TARGET_METHOD, endpoint.method.as_str());

        info!(
            method = %endpoint.method,
            path = %endpoint.path,
            "Auto-generating trace"
        );

        let url = self.config.url_for(&endpoint.path);
        let mut request = match endpoint.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
        };
        if let Some(body) = endpoint.request_body(self.random.as_ref()) {
            request = request.json(&body);
        }
        let mut headers = reqwest::header::HeaderMap::new();
        self.telemetry.inject(span.context(), &mut headers);
        request = request.headers(headers);

        match request.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                span.set_attribute(attr::HTTP_STATUS_CODE, i64::from(status));
                info!(
                    endpoint = %endpoint.name,
                    status,
                    "Auto trace completed"
                );
                Ok(CallOutcome::Completed {
                    endpoint: endpoint.path.clone(),
                    status,
                })
            }
            Err(e) => {
                span.record_exception(&e);
                span.set_error(e.to_string());
                let message = if e.is_timeout() {
                    Error::Timeout {
                        seconds: self.config.request_timeout.as_secs(),
                        message: e.to_string(),
                    }
                    .to_string()
                } else {
                    Error::Network(e.to_string()).to_string()
                };
                error!(path = %endpoint.path, error = %message, "Auto trace failed");
                Ok(CallOutcome::Failed {
                    endpoint: endpoint.path.clone(),
                    error: message,
                })
            }
        }
    }
}

/// Sleep for `duration`; `false` when shutdown was requested meanwhile.
async fn pause(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    if *shutdown.borrow() {
        return false;
    }

    let sleep = tokio::time::sleep(duration);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => return true,
            changed = shutdown.changed() => {
                if changed.is_err() {
                    // Sender gone: nobody can stop us any more.
                    (&mut sleep).await;
                    return true;
                }
                if *shutdown.borrow() {
                    return false;
                }
            }
        }
    }
}
