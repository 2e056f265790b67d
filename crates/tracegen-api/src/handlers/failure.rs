//! Deliberately failing endpoint.

use axum::{Extension, extract::State};
use tracegen_core::Error;
use tracegen_trace::attr;
use tracing::error;

use crate::error::ApiError;
use crate::middleware::RequestSpan;
use crate::state::AppState;

/// Fails on every call so exception recording can be exercised on demand.
pub async fn trigger_error(
    State(state): State<AppState>,
    Extension(RequestSpan(parent)): Extension<RequestSpan>,
) -> ApiError {
    error!("Error endpoint called - triggering error");

    let span = state.telemetry.start_span("error-handler", &parent);
    span.set_attribute(attr::ENDPOINT, "/api/error");
    span.set_attribute(attr::ERROR_INTENTIONAL, true);

    let err = Error::intentional();
    span.record_exception(&err);
    span.set_attribute(attr::ERROR, true);
    span.set_error(err.to_string());
    error!(error = %err, "Exception occurred");

    ApiError::from(err)
}
