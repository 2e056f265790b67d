//! Self-traffic generator for tracegen.
//!
//! A background task that periodically calls the service's own endpoints so
//! traces accumulate without an external client.

pub mod config;
pub mod traffic;

pub use config::TrafficConfig;
pub use traffic::{AUTO_TRACE_SPAN, CallOutcome, TrafficGenerator};
