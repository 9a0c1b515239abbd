use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use forkcast::cascade::{metadata, CascadeController};
use forkcast::cli::Cli;
use forkcast::config::Config;
use forkcast::server::{self, diagnostics::Diagnostics, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "forkcast=debug"
    } else {
        "forkcast=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Uptime tracking starts here, before any request can arrive
    let diagnostics = Diagnostics::new();

    let mut config = Config::load_from(cli.config.as_deref()).await?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    if cli.show_config {
        config.display();
        return Ok(());
    }

    // Non-fatal: the renderer and raw-fetch stages work without yt-dlp
    if metadata::yt_dlp_version(&config.extractor.yt_dlp_path).await.is_none() {
        tracing::warn!(
            "yt-dlp not found at '{}'; the metadata stage will fail until it is installed",
            config.extractor.yt_dlp_path
        );
    }

    let cascade = CascadeController::from_config(&config)?;
    tracing::info!(stages = ?cascade.strategy_names(), "cascade configured");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    let state = Arc::new(AppState {
        config,
        cascade,
        diagnostics,
    });

    server::serve(state, addr).await
}
