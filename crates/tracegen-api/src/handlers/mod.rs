//! Request handlers, each building a fixed span tree.

pub mod chain;
pub mod data;
pub mod failure;
pub mod health;

use axum::http::Uri;

use crate::error::ApiError;

/// Seconds since the Unix epoch with microsecond precision.
pub(crate) fn unix_timestamp() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}
