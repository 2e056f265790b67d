//! API error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

const INTENTIONAL_ERROR_DETAIL: &str = "This is an intentional error for testing";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] tracegen_core::Error),

    #[error("not found")]
    NotFound(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Domain(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Domain(err) if err.is_intentional() => ErrorResponse {
                error: err.to_string(),
                message: INTENTIONAL_ERROR_DETAIL.to_string(),
                path: None,
            },
            ApiError::Domain(err) => ErrorResponse {
                error: err.to_string(),
                message: "Internal server error".to_string(),
                path: None,
            },
            ApiError::NotFound(path) => ErrorResponse {
                error: self.to_string(),
                message: format!("No route for {}", path),
                path: Some(path.clone()),
            },
        };

        (status, Json(body)).into_response()
    }
}
