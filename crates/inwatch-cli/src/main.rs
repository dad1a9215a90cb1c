//! Daemon that records the amount to pay from PDF invoices dropped into a
//! Google Drive folder.

mod signal;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use inwatch_core::{token_source, DriveClient, PdfInvoiceReader, WatchConfig, Watcher};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = WatchConfig::load(None).context("Failed to load configuration")?;
    info!(
        folder_id = %config.drive.folder_id,
        auth_mode = ?config.auth.mode,
        "inwatch starting"
    );

    let http = DriveClient::http_client()?;
    let tokens = token_source(&config.auth, http.clone())
        .context("Failed to set up Google credentials")?;
    let client = DriveClient::new(http, config.drive.api_base.clone(), tokens);

    let mut watcher = Watcher::new(config, client, PdfInvoiceReader::new())
        .context("Failed to initialize watcher")?;

    let shutdown = CancellationToken::new();
    signal::cancel_on_signal(shutdown.clone());

    watcher.run(shutdown).await?;

    info!("inwatch stopped");
    Ok(())
}
