//! Server configuration from flags and environment variables.

use clap::{ArgAction, Parser};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use tracegen_scheduler::TrafficConfig;
use tracegen_trace::{LogFormat, OtlpConfig, TracingConfig};

/// Server configuration. Every option can also be set through the
/// environment variable named next to it.
#[derive(Debug, Clone, Parser)]
#[command(name = "tracegen")]
#[command(author, version, about = "Demo service that emits distributed traces", long_about = None)]
pub struct ServerConfig {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// Address to bind to
    #[arg(long, env = "BIND_ADDRESS", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind_address: IpAddr,

    /// OTLP/HTTP collector base URL; spans go to <endpoint>/v1/traces
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT", default_value = "http://localhost:4318")]
    pub otlp_endpoint: String,

    /// Service name reported in the trace resource
    #[arg(long, env = "SERVICE_NAME", default_value = "flask-app")]
    pub service_name: String,

    /// Service version reported in the trace resource
    #[arg(long, env = "SERVICE_VERSION", default_value = "1.0.0")]
    pub service_version: String,

    /// Generate background traffic against our own endpoints
    #[arg(
        long,
        env = "AUTO_TRACE_ENABLED",
        default_value = "true",
        value_parser = parse_enabled,
        action = ArgAction::Set
    )]
    pub auto_trace_enabled: bool,

    /// Seconds between generated calls
    #[arg(
        long,
        env = "AUTO_TRACE_INTERVAL",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub auto_trace_interval: u64,

    /// Seconds to wait before the first generated call
    #[arg(long, env = "AUTO_TRACE_STARTUP_DELAY", default_value_t = 5)]
    pub auto_trace_startup_delay: u64,

    /// Log output format (text or json)
    #[arg(long, env = "LOG_FORMAT", default_value = "text")]
    pub log_format: LogFormat,
}

/// Only a case-insensitive `true` enables the generator.
fn parse_enabled(value: &str) -> Result<bool, String> {
    Ok(value.trim().eq_ignore_ascii_case("true"))
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    pub fn tracing_config(&self) -> TracingConfig {
        TracingConfig {
            service_name: self.service_name.clone(),
            service_version: self.service_version.clone(),
            otlp: Some(OtlpConfig::new(self.otlp_endpoint.clone())),
            ..TracingConfig::default()
        }
    }

    /// The generator always targets the loopback name of our own port.
    pub fn traffic_config(&self) -> TrafficConfig {
        TrafficConfig::for_port(self.port)
            .with_interval(Duration::from_secs(self.auto_trace_interval))
            .with_startup_delay(Duration::from_secs(self.auto_trace_startup_delay))
    }
}
