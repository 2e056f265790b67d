//! API route definitions.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{chain, data, failure, health, not_found};
use crate::middleware::server_span;
use crate::state::AppState;

/// Create the main router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::home))
        .route("/health", get(health::health))
        .nest("/api", api_routes())
        .route_layer(from_fn_with_state(state.clone(), server_span))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/data", get(data::get_data))
        .route(
            "/process",
            post(data::process_data).layer(DefaultBodyLimit::disable()),
        )
        .route("/error", get(failure::trigger_error))
        .route("/chain", get(chain::chain_operations))
}
