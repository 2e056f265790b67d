//! Application state shared across handlers.

use std::sync::Arc;
use tracegen_core::ports::{RandomSource, ThreadRandom};
use tracegen_trace::Telemetry;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub service_name: String,
    pub telemetry: Telemetry,
    pub random: Arc<dyn RandomSource>,
}

impl AppState {
    pub fn new(
        service_name: impl Into<String>,
        telemetry: Telemetry,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            telemetry,
            random,
        }
    }

    /// State backed by the thread-local random generator.
    pub fn with_thread_random(service_name: impl Into<String>, telemetry: Telemetry) -> Self {
        Self::new(service_name, telemetry, Arc::new(ThreadRandom))
    }
}
