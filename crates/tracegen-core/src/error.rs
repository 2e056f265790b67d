//! Error types for tracegen.

use thiserror::Error;

/// Message carried by the deliberately failing endpoint.
pub const INTENTIONAL_ERROR_MESSAGE: &str = "Intentional error for testing";

#[derive(Debug, Error)]
pub enum Error {
    /// Raised on purpose to exercise exception recording.
    #[error("{0}")]
    Intentional(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {seconds}s: {message}")]
    Timeout { seconds: u64, message: String },

    #[error("No endpoints configured for self-traffic")]
    NoEndpoints,
}

impl Error {
    /// The error produced by the error endpoint on every call.
    pub fn intentional() -> Self {
        Error::Intentional(INTENTIONAL_ERROR_MESSAGE.to_string())
    }

    /// Whether this error was produced deliberately rather than by a fault.
    pub fn is_intentional(&self) -> bool {
        matches!(self, Error::Intentional(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
