// Lineup overlay engine entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config
// 3. Load the team catalog (optional, warn when absent)
// 4. Build the live-feed client
// 5. Create channels
// 6. Spawn WebSocket hub task
// 7. Spawn app logic task
// 8. Wait for Ctrl+C
// 9. Cleanup on exit

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};

use pitchboard::app::{self, AppState};
use pitchboard::catalog::TeamCatalog;
use pitchboard::config;
use pitchboard::feed::client::HttpFeedClient;
use pitchboard::ws_server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing (log to file, not terminal)
    init_tracing()?;
    info!("Lineup overlay engine starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: ws port {}, feed {}, poll every {}s",
        config.ws_port, config.feed.base_url, config.feed.poll_interval_secs
    );

    // 3. Load the team catalog (selection stays dead until one exists)
    let catalog = match TeamCatalog::load(std::path::Path::new(&config.catalog_path)) {
        Ok(catalog) => {
            info!("Team catalog loaded: {} entries", catalog.len());
            catalog
        }
        Err(e) => {
            warn!("Team catalog unavailable ({e}); catalog selection disabled");
            TeamCatalog::empty()
        }
    };

    // 4. Build the live-feed client
    let feed_api = Arc::new(HttpFeedClient::from_config(&config.feed));

    // 5. Create channels
    let (ws_tx, ws_rx) = mpsc::channel(256);
    let (feed_tx, feed_rx) = mpsc::channel(64);
    let (out_tx, _out_rx) = broadcast::channel(64);

    // 6. Spawn WebSocket hub task
    let ws_port = config.ws_port;
    let hub_frames = out_tx.clone();
    let ws_handle = tokio::spawn(async move {
        if let Err(e) = ws_server::run(ws_port, ws_tx, hub_frames).await {
            error!("WebSocket hub error: {e}");
        }
    });

    // 7. Spawn app logic task
    let state = AppState::new(config, catalog, feed_api, feed_tx, out_tx);
    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(ws_rx, feed_rx, state).await {
            error!("Application loop error: {e}");
        }
    });

    info!("Engine ready. WebSocket hub listening on 127.0.0.1:{ws_port}");

    // 8. Wait for Ctrl+C
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("Shutdown signal received");

    // 9. Cleanup: abort the long-running tasks
    ws_handle.abort();
    app_handle.abort();

    info!("Lineup overlay engine shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file (the terminal stays free for the
/// hosting process).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("pitchboard.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pitchboard=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
