//! Tracer initialization and configuration.

use http::HeaderMap;
use opentelemetry::propagation::TextMapPropagator;
use opentelemetry::trace::{SpanKind, Tracer as _, TracerProvider as _};
use opentelemetry::{Context, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    Resource,
    propagation::TraceContextPropagator,
    runtime,
    trace::{RandomIdGenerator, Sampler, Tracer, TracerProvider},
};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::str::FromStr;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::context::{HeaderExtractor, HeaderInjector};
use crate::spans::ScopedSpan;

/// Instrumentation scope name attached to every span.
const INSTRUMENTATION_SCOPE: &str = "tracegen";

#[derive(Debug, Error)]
pub enum TracerError {
    #[error("Failed to initialize tracer: {0}")]
    Init(String),
    #[error("Failed to shut down tracer: {0}")]
    Shutdown(String),
}

/// OTLP/HTTP exporter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtlpConfig {
    /// Collector base URL; spans are posted to `<endpoint>/v1/traces`.
    pub endpoint: String,
    pub timeout_seconds: u64,
}

impl Default for OtlpConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:4318".to_string(),
            timeout_seconds: 10,
        }
    }
}

impl OtlpConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Full URL of the traces signal.
    pub fn traces_endpoint(&self) -> String {
        format!("{}/v1/traces", self.endpoint.trim_end_matches('/'))
    }
}

/// Tracing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TracingConfig {
    pub enabled: bool,
    pub service_name: String,
    pub service_version: String,
    pub otlp: Option<OtlpConfig>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            service_name: "flask-app".to_string(),
            service_version: "1.0.0".to_string(),
            otlp: Some(OtlpConfig::default()),
        }
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("Invalid log format: {}", other)),
        }
    }
}

/// Handle to the span pipeline.
///
/// Cheap to clone; all clones share one provider and export queue. Passed
/// explicitly to handlers and the traffic generator instead of living in a
/// process-wide global, together with the W3C propagator.
#[derive(Clone)]
pub struct Telemetry {
    provider: TracerProvider,
    tracer: Tracer,
    propagator: TraceContextPropagator,
}

impl Telemetry {
    /// Build the provider described by `config`.
    ///
    /// Without an OTLP section (or when disabled) spans are still created so
    /// handlers behave identically, but nothing is exported.
    pub fn init(config: &TracingConfig) -> Result<Self, TracerError> {
        let resource = build_resource(config);

        let provider = match (&config.otlp, config.enabled) {
            (Some(otlp_config), true) => build_otlp_provider(otlp_config, resource)?,
            _ => TracerProvider::builder().with_resource(resource).build(),
        };

        Ok(Self::from_provider(provider))
    }

    /// Wrap an already configured provider.
    pub fn from_provider(provider: TracerProvider) -> Self {
        let tracer = provider.tracer(INSTRUMENTATION_SCOPE);
        Self {
            provider,
            tracer,
            propagator: TraceContextPropagator::new(),
        }
    }

    /// Parent context carried by `traceparent`/`tracestate` headers; empty
    /// when they are absent or malformed.
    pub fn extract(&self, headers: &HeaderMap) -> Context {
        self.propagator.extract_with_context(&Context::new(), &HeaderExtractor(headers))
    }

    /// Write the span in `cx` into outgoing request headers.
    pub fn inject(&self, cx: &Context, headers: &mut HeaderMap) {
        self.propagator.inject_context(cx, &mut HeaderInjector(headers));
    }

    /// Open an internal span under `parent`.
    pub fn start_span(
        &self,
        name: impl Into<Cow<'static, str>>,
        parent: &Context,
    ) -> ScopedSpan {
        self.start_span_with_kind(name, SpanKind::Internal, parent)
    }

    /// Open a span of the given kind under `parent`.
    pub fn start_span_with_kind(
        &self,
        name: impl Into<Cow<'static, str>>,
        kind: SpanKind,
        parent: &Context,
    ) -> ScopedSpan {
        let span = self
            .tracer
            .span_builder(name)
            .with_kind(kind)
            .start_with_context(&self.tracer, parent);
        ScopedSpan::new(span, parent, self.tracer.clone())
    }

    /// Open a span that starts a new trace.
    pub fn root_span(&self, name: impl Into<Cow<'static, str>>) -> ScopedSpan {
        self.start_span(name, &Context::new())
    }

    /// Flush buffered spans and stop the exporter.
    ///
    /// Blocks until the batch processor drains; call it from a blocking
    /// context when running inside the tokio runtime.
    pub fn shutdown(&self) -> Result<(), TracerError> {
        self.provider
            .shutdown()
            .map_err(|e| TracerError::Shutdown(e.to_string()))
    }
}

fn build_resource(config: &TracingConfig) -> Resource {
    Resource::new([
        KeyValue::new("service.name", config.service_name.clone()),
        KeyValue::new("service.version", config.service_version.clone()),
    ])
}

fn build_otlp_provider(
    otlp_config: &OtlpConfig,
    resource: Resource,
) -> Result<TracerProvider, TracerError> {
    // Export errors stay inside the batch processor; nothing reaches callers.
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(otlp_config.traces_endpoint())
        .with_timeout(std::time::Duration::from_secs(otlp_config.timeout_seconds))
        .build()
        .map_err(|e| TracerError::Init(e.to_string()))?;

    Ok(TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_sampler(Sampler::AlwaysOn)
        .with_id_generator(RandomIdGenerator::default())
        .with_resource(resource)
        .build())
}

/// Install the global log subscriber.
pub fn init_logging(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init(),
    }
}

/// In-memory span capture for tests.
#[cfg(any(test, feature = "testing"))]
pub mod testing {
    use super::{Telemetry, TracerProvider};
    use opentelemetry::Value;
    use opentelemetry::trace::SpanId;
    use opentelemetry_sdk::export::trace::SpanData;

    pub use opentelemetry_sdk::testing::trace::InMemorySpanExporter;

    /// Telemetry whose spans are exported synchronously into memory.
    pub fn in_memory() -> (Telemetry, InMemorySpanExporter) {
        let exporter = InMemorySpanExporter::default();
        let provider = TracerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        (Telemetry::from_provider(provider), exporter)
    }

    pub fn finished_spans(exporter: &InMemorySpanExporter) -> Vec<SpanData> {
        exporter.get_finished_spans().unwrap_or_default()
    }

    pub fn find<'a>(spans: &'a [SpanData], name: &str) -> Option<&'a SpanData> {
        spans.iter().find(|s| s.name == name)
    }

    pub fn named<'a>(spans: &'a [SpanData], name: &str) -> Vec<&'a SpanData> {
        spans.iter().filter(|s| s.name == name).collect()
    }

    pub fn children<'a>(spans: &'a [SpanData], parent: &SpanData) -> Vec<&'a SpanData> {
        let parent_id = parent.span_context.span_id();
        spans
            .iter()
            .filter(|s| s.parent_span_id == parent_id)
            .collect()
    }

    pub fn roots(spans: &[SpanData]) -> Vec<&SpanData> {
        spans
            .iter()
            .filter(|s| s.parent_span_id == SpanId::INVALID)
            .collect()
    }

    pub fn attribute<'a>(span: &'a SpanData, key: &str) -> Option<&'a Value> {
        span.attributes
            .iter()
            .find(|kv| kv.key.as_str() == key)
            .map(|kv| &kv.value)
    }

    pub fn exception_messages(span: &SpanData) -> Vec<String> {
        span.events
            .events
            .iter()
            .filter(|e| e.name == "exception")
            .flat_map(|e| e.attributes.iter())
            .filter(|kv| kv.key.as_str() == "exception.message")
            .map(|kv| kv.value.as_str().into_owned())
            .collect()
    }
}
