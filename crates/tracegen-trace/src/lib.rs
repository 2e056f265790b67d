//! OpenTelemetry integration for tracegen.
//!
//! Provides the injectable [`Telemetry`] handle with OTLP/HTTP export,
//! scoped spans that close on every exit path, and W3C `traceparent`
//! propagation between the self-traffic generator and the HTTP handlers.

pub mod context;
pub mod spans;
pub mod tracer;

pub use context::{HeaderExtractor, HeaderInjector, TRACEPARENT_HEADER, TRACESTATE_HEADER};
pub use spans::{ScopedSpan, attr, server_span_name};
pub use tracer::{LogFormat, OtlpConfig, Telemetry, TracerError, TracingConfig, init_logging};

#[cfg(any(test, feature = "testing"))]
pub use tracer::testing;
