//! Shared helpers for room manager integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use roomchain_core::event::Clock;
use roomchain_core::handles::{AssetRef, SpawnPointHandle};
use roomchain_rooms::application::manager::{
    RoomManagerConfig, RoomManagerHandle, spawn_room_manager,
};
use roomchain_rooms::domain::catalog::{RoomCatalog, RoomDefinition};
use roomchain_test_support::{FixedClock, RecordingNotifier, RecordingWorld};

/// Simulated duration of every world call.
pub const WORLD_LATENCY: Duration = Duration::from_millis(100);

/// Names of the seven-room test catalog, in index order.
pub const ROOM_NAMES: [&str; 7] = [
    "Dining Room",
    "Zig Zag Hallway",
    "Bathroom",
    "Neverending Hallway",
    "Living Room",
    "Split Hallway",
    "Mudroom",
];

/// Asset path of a catalog room.
pub fn asset(name: &str) -> AssetRef {
    AssetRef::new(format!("rooms/{}", name.to_lowercase().replace(' ', "_")))
}

/// Builds a catalog from the first `len` test rooms.
pub fn catalog(len: usize) -> RoomCatalog {
    RoomCatalog::new(
        ROOM_NAMES[..len]
            .iter()
            .map(|name| RoomDefinition::new(*name, asset(name)))
            .collect(),
    )
    .unwrap()
}

/// A running manager wired to recording doubles.
pub struct Harness {
    pub world: Arc<RecordingWorld>,
    pub notifier: Arc<RecordingNotifier>,
    pub manager: RoomManagerHandle,
    pub exit_spawn_point: SpawnPointHandle,
}

/// Starts a manager over the seven-room catalog that resets on start.
pub fn start(world: RecordingWorld) -> Harness {
    start_with(world, 7, true)
}

/// Starts a manager over the first `rooms` catalog entries.
pub fn start_with(world: RecordingWorld, rooms: usize, reset_on_start: bool) -> Harness {
    let world = Arc::new(world);
    let notifier = Arc::new(RecordingNotifier::new());
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::at_noon());
    let exit_spawn_point = SpawnPointHandle::new();
    let config = RoomManagerConfig {
        reset_on_start,
        ..RoomManagerConfig::new(exit_spawn_point)
    };
    let manager = spawn_room_manager(
        catalog(rooms),
        &config,
        world.clone(),
        notifier.clone(),
        clock,
    );
    Harness {
        world,
        notifier,
        manager,
        exit_spawn_point,
    }
}

/// Lets queued world calls finish without reaching the grace delay.
pub async fn settle() {
    tokio::time::sleep(Duration::from_secs(1)).await;
}
