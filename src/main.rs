// SPDX-License-Identifier: GPL-3.0-only
mod api;
mod config;
mod context;
mod error;
mod logging;
mod nft;
mod repository;
mod service;
mod store;

#[cfg(test)]
mod test_helpers;

use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};

use api::HttpServer;
use config::Config;
use context::Context;
use logging::setup_logging;
use nft::{NftClient, NftGateway};
use repository::{KeyValueEntry, Location, SqlRepository};
use service::{run_retention, DataService, LocationService};
use store::StorageEngine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    setup_logging(&config.log_level, config.log_format)?;

    info!("Starting datastore-daemon v{}", env!("CARGO_PKG_VERSION"));
    info!(config = %config.obfuscated()?, "Configuration loaded");

    // Process liveness; cancelled first on shutdown
    let (server_ctx, cancel) = Context::background().with_cancel();
    let cancel = Arc::new(cancel);

    // One engine per entity family
    let data_repo = Arc::new(
        SqlRepository::<KeyValueEntry>::new(
            StorageEngine::open(&config.dsn, config.quiet_store).await?,
        )
        .await?,
    );
    let location_repo = Arc::new(
        SqlRepository::<Location>::new(
            StorageEngine::open(&config.dsn, config.quiet_store).await?,
        )
        .await?,
    );
    info!("Storage initialized");

    let data_service = Arc::new(DataService::new(server_ctx.clone(), data_repo.clone()));
    let location_service = Arc::new(LocationService::new(
        server_ctx.clone(),
        location_repo.clone(),
    ));
    let nft: Arc<dyn NftGateway> = Arc::new(NftClient::new(config.nft.clone())?);

    let retention_task = config.retention_secs.map(|secs| {
        let every = Duration::from_secs(config.retention_interval_secs.max(1));
        tokio::spawn(run_retention(
            Arc::clone(&data_service),
            server_ctx.clone(),
            Duration::from_secs(secs),
            every,
        ))
    });

    let http_server = HttpServer::new(
        data_service,
        location_service,
        nft,
        config.listen_address,
    );

    let shutdown_cancel = Arc::clone(&cancel);
    let shutdown = async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Received shutdown signal (Ctrl+C)");
            }
            Err(err) => {
                error!(error = %err, "Unable to listen for shutdown signal");
            }
        }
        info!("Initiating graceful shutdown...");
        shutdown_cancel.cancel();
    };

    info!("All services started. Waiting for shutdown signal...");
    if let Err(e) = http_server.serve(shutdown).await {
        error!(error = %e, "HTTP server error");
    }
    // Also reached when the server fails before any signal.
    cancel.cancel();

    if let Some(task) = retention_task {
        if let Err(e) = task.await {
            error!(error = %e, "Retention task failed");
        }
    }

    data_repo.close().await;
    location_repo.close().await;

    info!("Shutdown complete");
    Ok(())
}
