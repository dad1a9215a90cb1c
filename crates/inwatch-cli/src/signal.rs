//! Signal handling for graceful shutdown.

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Wait for a shutdown signal (SIGINT, SIGTERM, or SIGQUIT on Unix).
#[cfg(unix)]
pub async fn shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = sigint.recv() => {
            info!(message = "Signal received.", signal = "SIGINT");
        }
        _ = sigterm.recv() => {
            info!(message = "Signal received.", signal = "SIGTERM");
        }
        _ = sigquit.recv() => {
            info!(message = "Signal received.", signal = "SIGQUIT");
        }
    }
    Ok(())
}

/// Wait for Ctrl+C.
#[cfg(not(unix))]
pub async fn shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await?;
    info!(message = "Signal received.", signal = "Ctrl+C");
    Ok(())
}

/// Cancel `token` once a shutdown signal arrives.
///
/// If the handlers cannot be installed the token is left alone, so the
/// watcher keeps running until the process is killed.
pub fn cancel_on_signal(token: CancellationToken) {
    tokio::spawn(async move {
        match shutdown_signal().await {
            Ok(()) => token.cancel(),
            Err(e) => error!("Failed to install signal handlers: {}", e),
        }
    });
}
