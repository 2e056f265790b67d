//! Traffic generator configuration.

use std::time::Duration;

/// Timing and target of the self-traffic loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrafficConfig {
    /// Base URL of the local listener, e.g. `http://localhost:8000`.
    pub base_url: String,
    /// Pause after every iteration, successful or not.
    pub interval: Duration,
    /// Pause before the first iteration so the listener can come up.
    pub startup_delay: Duration,
    /// Per-call timeout.
    pub request_timeout: Duration,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self::for_port(8000)
    }
}

impl TrafficConfig {
    pub fn for_port(port: u16) -> Self {
        Self::new(format!("http://localhost:{}", port))
    }

    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            interval: Duration::from_secs(30),
            startup_delay: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_startup_delay(mut self, startup_delay: Duration) -> Self {
        self.startup_delay = startup_delay;
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}
