//! Shared helpers for simulator integration tests.
#![allow(dead_code)]

use std::time::Duration;

use roomchain_core::handles::AssetRef;
use roomchain_sim::catalog::default_catalog;
use roomchain_sim::config::SimConfig;

/// A configuration with short timings, suited to paused-clock tests.
pub fn fast_config(players: usize) -> SimConfig {
    SimConfig {
        players,
        grace_delay: Duration::from_millis(500),
        spawn_latency: Duration::from_millis(50),
        ..SimConfig::default()
    }
}

/// Assets of the default catalog, in walking order.
pub fn house_assets() -> Vec<AssetRef> {
    default_catalog()
        .unwrap()
        .iter()
        .map(|room| room.asset.clone())
        .collect()
}
