use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::signal;
use tracing::info;

mod config;
mod engine;
mod models;
mod probes;
mod report;

use crate::config::MonitorConfig;
use crate::engine::Monitor;
use crate::report::ConsoleReporter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.json".to_string());
    let config_content = std::fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read {}", config_path))?;
    let config: MonitorConfig =
        serde_json::from_str(&config_content).with_context(|| "Failed to parse config")?;
    config.validate().context("Invalid configuration")?;

    let monitor = Arc::new(Monitor::new(config, Arc::new(ConsoleReporter))?);

    tokio::select! {
        _ = Arc::clone(&monitor).run() => {}
        _ = shutdown_signal() => {
            info!("Shutdown signal received. Stopping monitor...");
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
