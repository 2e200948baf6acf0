//! Serve command - Run the syslog receiver
//!
//! Starts one receiver on the configured address, writes every metric to
//! stdout and stops cleanly on Ctrl+C or SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};

use sluice_config::{Config, SyslogConfig};
use sluice_sources::syslog::{PemTlsProvider, Receiver, ReceiverConfig};

use crate::output::OutputAccumulator;

/// Run the serve command
pub async fn run(config: Config, source: Option<PathBuf>) -> Result<()> {
    let config_path = source
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(defaults)".to_string());

    info!(
        version = env!("CARGO_PKG_VERSION"),
        platform = std::env::consts::OS,
        arch = std::env::consts::ARCH,
        config = %config_path,
        "Sluice starting"
    );

    if let Err(e) = run_receiver(config).await {
        error!(error = %e, "receiver error");
        return Err(e);
    }

    info!("Sluice shutdown complete");
    Ok(())
}

/// Start the receiver, wait for a shutdown signal, then stop it
async fn run_receiver(config: Config) -> Result<()> {
    let receiver = build_receiver(&config.syslog);
    let sink = Arc::new(OutputAccumulator::stdout(config.output.format));

    receiver
        .start(sink.clone())
        .await
        .with_context(|| format!("failed to start receiver on {}", config.syslog.server))?;

    if let Some(addr) = receiver.local_addr().await {
        info!(local_addr = %addr, tls = config.syslog.tls_enabled(), "accepting syslog traffic");
    }

    let signal = shutdown_signal().await;
    info!("shutdown signal received, stopping receiver");
    receiver.stop().await;

    info!(
        metrics = ?receiver.metrics(),
        lines_written = sink.lines_written(),
        "receiver stopped"
    );
    signal
}

/// Build a receiver from the `[syslog]` section
pub fn build_receiver(config: &SyslogConfig) -> Receiver {
    let receiver_config = ReceiverConfig {
        server: config.server.clone(),
        keep_alive_period: config.keep_alive_period,
        read_timeout: config.read_timeout,
        max_connections: config.max_connections,
        best_effort: config.best_effort,
        sdparam_separator: config.sdparam_separator.clone(),
    };

    let tls = PemTlsProvider::new(
        config.tls_cert.clone(),
        config.tls_key.clone(),
        config.tls_allowed_cacerts.clone(),
    );

    Receiver::new(receiver_config).with_tls(tls)
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("failed to install SIGTERM handler")?;

        tokio::select! {
            result = signal::ctrl_c() => result.context("failed to install Ctrl+C handler")?,
            _ = terminate.recv() => {},
        }
    }

    #[cfg(not(unix))]
    signal::ctrl_c()
        .await
        .context("failed to install Ctrl+C handler")?;

    Ok(())
}
