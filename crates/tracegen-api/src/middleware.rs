//! HTTP middleware for the API server.

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use opentelemetry::Context;
use opentelemetry::trace::SpanKind;
use tracegen_trace::{attr, server_span_name};

use crate::state::AppState;

/// Context of the server span, handed to handlers as a request extension.
#[derive(Clone)]
pub struct RequestSpan(pub Context);

/// Wrap each routed request in a server span.
///
/// Incoming `traceparent`/`tracestate` headers become the remote parent, so
/// calls from the traffic generator join the generator's trace.
pub async fn server_span(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let method = request.method().as_str().to_string();
    let path = request.uri().path().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| path.clone());

    let parent = state.telemetry.extract(request.headers());

    let span = state.telemetry.start_span_with_kind(
        server_span_name(&method, &route),
        SpanKind::Server,
        &parent,
    );
    span.set_attribute(attr::HTTP_REQUEST_METHOD, method);
    span.set_attribute(attr::URL_PATH, path);
    span.set_attribute(attr::HTTP_ROUTE, route);

    request
        .extensions_mut()
        .insert(RequestSpan(span.context().clone()));

    let response = next.run(request).await;

    let status = response.status();
    span.set_attribute(attr::HTTP_RESPONSE_STATUS_CODE, i64::from(status.as_u16()));
    if status.is_server_error() {
        span.set_error(status.to_string());
    }

    response
}
