//! Integration test infrastructure for tracegen.
//!
//! Starts the real router on an ephemeral port with spans captured in
//! memory, so tests can drive it over HTTP and inspect the resulting traces.
//!
//! # Usage
//!
//! ```ignore
//! use tracegen_tests::{ApiTestClient, TestServer};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let server = TestServer::start().await.unwrap();
//!     let client = ApiTestClient::new(server.addr);
//!     // client.get("/health"), server.spans(), ...
//! }
//! ```

pub mod helpers;

pub use helpers::*;

/// Initialize test logging (call once per test binary).
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,tracegen_tests=debug")),
        )
        .with_test_writer()
        .try_init();
}
