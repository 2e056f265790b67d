//! Tracegen service entrypoint.

use anyhow::Context as _;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracegen_api::{AppState, create_router};
use tracegen_core::ports::ThreadRandom;
use tracegen_scheduler::TrafficGenerator;
use tracegen_trace::{Telemetry, init_logging};
use tracing::{info, warn};

mod config;

use config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = ServerConfig::parse();
    init_logging(config.log_format);

    info!(service = %config.service_name, port = config.port, "Starting service");
    info!(endpoint = %config.otlp_endpoint, "OTLP endpoint");
    if config.auto_trace_enabled {
        info!(
            interval_secs = config.auto_trace_interval,
            "Auto trace generation enabled"
        );
    } else {
        info!("Auto trace generation disabled");
    }

    let telemetry =
        Telemetry::init(&config.tracing_config()).context("failed to initialize telemetry")?;

    let state = AppState::with_thread_random(config.service_name.clone(), telemetry.clone());
    let app = create_router(state);

    let listener = bind_listener(config.socket_addr()).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    if config.auto_trace_enabled {
        let generator = TrafficGenerator::new(
            config.traffic_config(),
            telemetry.clone(),
            Arc::new(ThreadRandom),
        )
        .context("failed to build traffic generator")?;
        tokio::spawn(generator.run(shutdown_rx));
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Shutting down");
    let _ = shutdown_tx.send(true);

    match tokio::task::spawn_blocking(move || telemetry.shutdown()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "Failed to flush spans"),
        Err(e) => warn!(error = %e, "Telemetry shutdown task failed"),
    }

    Ok(())
}

/// Bind the HTTP listener; failure is fatal to startup.
async fn bind_listener(addr: SocketAddr) -> anyhow::Result<TcpListener> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind listener on {addr}"))?;
    info!(%addr, "Listening");
    Ok(listener)
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
