//! HTTP API for tracegen.
//!
//! Every endpoint builds a fixed span tree under the server span opened by
//! [`middleware::server_span`].

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
