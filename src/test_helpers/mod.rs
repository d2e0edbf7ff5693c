// SPDX-License-Identifier: GPL-3.0-only
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::{Config, NftConfig};
use crate::context::Context;
use crate::repository::{KeyValueEntry, Location, SqlRepository};
use crate::service::{DataService, LocationService};
use crate::store::StorageEngine;

/// DSN of a private in-memory database; every open yields a fresh one.
pub fn memory_dsn() -> String {
    "sqlite::memory:".to_string()
}

/// Create a quiet in-memory storage engine for testing
pub async fn setup_test_engine() -> StorageEngine {
    StorageEngine::open(&memory_dsn(), true)
        .await
        .expect("Failed to open in-memory database")
}

pub async fn setup_data_repository() -> SqlRepository<KeyValueEntry> {
    SqlRepository::new(setup_test_engine().await)
        .await
        .expect("Failed to build data repository")
}

pub async fn setup_location_repository() -> SqlRepository<Location> {
    SqlRepository::new(setup_test_engine().await)
        .await
        .expect("Failed to build location repository")
}

/// Both services over fresh in-memory stores, bound to a live server context
pub async fn setup_services() -> (Arc<DataService>, Arc<LocationService>) {
    let server_ctx = Context::background();
    let data = DataService::new(server_ctx.clone(), Arc::new(setup_data_repository().await));
    let locations =
        LocationService::new(server_ctx, Arc::new(setup_location_repository().await));
    (Arc::new(data), Arc::new(locations))
}

/// Create a test configuration pointing at an in-memory store
pub fn create_test_config() -> Config {
    Config {
        listen_address: SocketAddr::from_str("127.0.0.1:0").unwrap(), // Use port 0 to auto-assign
        dsn: memory_dsn(),
        log_level: "error".to_string(), // Reduce log noise in tests
        log_format: Default::default(),
        quiet_store: true,
        retention_secs: None,
        retention_interval_secs: 3600,
        nft: NftConfig::default(),
    }
}
