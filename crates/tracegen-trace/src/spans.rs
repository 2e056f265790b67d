//! Scoped spans and shared attribute keys.

use opentelemetry::trace::{
    SpanContext, SpanKind, Status, TraceContextExt, Tracer as _,
};
use opentelemetry::{Context, Key, KeyValue, Value};
use opentelemetry_sdk::trace::{Span, Tracer};
use std::borrow::Cow;

/// Attribute keys shared by handlers and the traffic generator.
pub mod attr {
    pub const ENDPOINT: &str = "endpoint";
    pub const METHOD: &str = "method";
    pub const ERROR: &str = "error";
    pub const ERROR_INTENTIONAL: &str = "error.intentional";
    pub const HEALTH_STATUS: &str = "health.status";
    pub const PROCESSING_TIME_SECONDS: &str = "processing.time_seconds";
    pub const INPUT_SIZE: &str = "input.size";
    pub const TRANSFORM_TIME_SECONDS: &str = "transform.time_seconds";
    pub const OPERATION_NUMBER: &str = "operation.number";

    pub const AUTO_GENERATED: &str = "auto.generated";
    pub const TARGET_ENDPOINT: &str = "target.endpoint";
    pub const TARGET_METHOD: &str = "target.method";
    pub const HTTP_STATUS_CODE: &str = "http.status_code";

    pub const HTTP_REQUEST_METHOD: &str = "http.request.method";
    pub const HTTP_ROUTE: &str = "http.route";
    pub const HTTP_RESPONSE_STATUS_CODE: &str = "http.response.status_code";
    pub const URL_PATH: &str = "url.path";
}

/// Name of the server span wrapping one request, e.g. `GET /api/data`.
pub fn server_span_name(method: &str, route: &str) -> String {
    format!("{} {}", method, route)
}

/// A span that closes when dropped.
///
/// Closing is tied to scope, so early returns and `?` cannot leave a span
/// open. Children opened through [`ScopedSpan::child`] must be dropped
/// before their parent; lexical scoping in the handlers guarantees that.
pub struct ScopedSpan {
    cx: Context,
    tracer: Tracer,
}

impl ScopedSpan {
    pub(crate) fn new(span: Span, parent: &Context, tracer: Tracer) -> Self {
        Self {
            cx: parent.with_span(span),
            tracer,
        }
    }

    pub fn set_attribute(&self, key: impl Into<Key>, value: impl Into<Value>) {
        self.cx.span().set_attribute(KeyValue::new(key, value));
    }

    /// Add an `exception` event carrying the error message.
    pub fn record_exception(&self, err: &dyn std::error::Error) {
        self.cx.span().record_error(err);
    }

    /// Mark the span status as error.
    pub fn set_error(&self, description: impl Into<Cow<'static, str>>) {
        self.cx.span().set_status(Status::error(description));
    }

    /// Open an internal child span.
    pub fn child(&self, name: impl Into<Cow<'static, str>>) -> ScopedSpan {
        self.child_with_kind(name, SpanKind::Internal)
    }

    pub fn child_with_kind(&self, name: impl Into<Cow<'static, str>>, kind: SpanKind) -> ScopedSpan {
        let span = self
            .tracer
            .span_builder(name)
            .with_kind(kind)
            .start_with_context(&self.tracer, &self.cx);
        ScopedSpan::new(span, &self.cx, self.tracer.clone())
    }

    /// Context carrying this span, for parenting work elsewhere.
    pub fn context(&self) -> &Context {
        &self.cx
    }

    pub fn span_context(&self) -> SpanContext {
        self.cx.span().span_context().clone()
    }
}

impl Drop for ScopedSpan {
    fn drop(&mut self) {
        self.cx.span().end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use opentelemetry::trace::Status;

    #[derive(Debug)]
    struct Boom;

    impl std::fmt::Display for Boom {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("boom")
        }
    }

    impl std::error::Error for Boom {}

    fn fallible(telemetry: &crate::Telemetry, fail: bool) -> Result<(), Boom> {
        let span = telemetry.root_span("fallible");
        let _child = span.child("inner");
        if fail {
            span.record_exception(&Boom);
            return Err(Boom);
        }
        Ok(())
    }

    #[test]
    fn test_server_span_name() {
        assert_eq!(server_span_name("GET", "/api/data"), "GET /api/data");
    }

    #[test]
    fn test_children_close_before_parent() {
        let (telemetry, exporter) = in_memory();
        {
            let root = telemetry.root_span("chain-operations");
            for n in 1..=3_i64 {
                let op = root.child(format!("operation-{}", n));
                op.set_attribute(attr::OPERATION_NUMBER, n);
            }
        }

        let spans = finished_spans(&exporter);
        assert_eq!(spans.len(), 4);
        let root = find(&spans, "chain-operations").unwrap();
        let children = children(&spans, root);
        assert_eq!(children.len(), 3);
        for child in children {
            assert_eq!(child.span_context.trace_id(), root.span_context.trace_id());
            assert!(child.end_time <= root.end_time);
        }
        // The in-memory exporter receives spans in close order.
        assert_eq!(spans.last().unwrap().name, "chain-operations");
    }

    #[test]
    fn test_span_closed_on_error_return() {
        let (telemetry, exporter) = in_memory();
        assert!(fallible(&telemetry, true).is_err());
        assert!(fallible(&telemetry, false).is_ok());

        let spans = finished_spans(&exporter);
        assert_eq!(named(&spans, "fallible").len(), 2);
        assert_eq!(named(&spans, "inner").len(), 2);

        let failed: Vec<_> = named(&spans, "fallible")
            .into_iter()
            .filter(|s| !exception_messages(s).is_empty())
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(exception_messages(failed[0]), vec!["boom".to_string()]);
    }

    #[test]
    fn test_set_error_status() {
        let (telemetry, exporter) = in_memory();
        {
            let span = telemetry.root_span("error-handler");
            span.set_error("failed");
        }
        let spans = finished_spans(&exporter);
        assert_eq!(spans[0].status, Status::error("failed"));
    }

    #[test]
    fn test_span_context_is_valid() {
        let (telemetry, _exporter) = in_memory();
        let span = telemetry.root_span("auto-trace-call");
        assert!(span.span_context().is_valid());
        assert!(span.context().has_active_span());
    }
}
