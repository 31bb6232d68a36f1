//! Screenshare Server - gameplay screen recording capture and replay.
//!
//! This is the main library crate for the screenshare server. It wires the
//! recording store to its HTTP surface and runs the background maintenance
//! tasks.

pub mod config;
pub mod recording;
pub mod server;

use config::Config;
use recording::RecordingStore;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often the stale-session reaper runs
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Initialize logging, open the store, and serve the HTTP API
pub async fn run(config: Config) -> anyhow::Result<()> {
    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "screenshare_server=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting screenshare-server v{}", env!("CARGO_PKG_VERSION"));

    let store = Arc::new(RecordingStore::new(&config.data_dir)?);

    // Reap sessions abandoned without a stop request
    let sweeper = store.clone();
    let max_idle = config.session_ttl();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let reaped = sweeper.sweep_stale(max_idle);
            if reaped > 0 {
                tracing::info!("Reaped {} stale session(s)", reaped);
            }
        }
    });

    let app = server::router(store);
    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
