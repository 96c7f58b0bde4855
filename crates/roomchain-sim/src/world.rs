//! In-memory world runtime.
//!
//! Every spawned room gets a fresh spawn point and runs a real room proxy,
//! so the manager and its rooms bind through the same handshake a hosted
//! world would use. Player positions are tracked from teleports.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use roomchain_core::error::WorldError;
use roomchain_core::handles::{AssetRef, ObjectHandle, PlayerHandle, SpawnPointHandle};
use roomchain_core::math::{Rotation, Vec3};
use roomchain_core::protocol::RoomMessage;
use roomchain_core::world::WorldRuntime;
use roomchain_rooms::application::proxy::{RoomProxyHandle, spawn_room_proxy};
use tracing::debug;

/// Where a player currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerLocation {
    /// Inside a spawned room.
    Room(ObjectHandle),
    /// At a spawn point that belongs to no room.
    Outside(SpawnPointHandle),
}

#[derive(Debug)]
struct HostedRoom {
    asset: AssetRef,
    position: Vec3,
    proxy: RoomProxyHandle,
}

#[derive(Debug, Default)]
struct WorldState {
    rooms: HashMap<ObjectHandle, HostedRoom>,
    spawn_points: HashMap<SpawnPointHandle, ObjectHandle>,
    players: HashMap<PlayerHandle, PlayerLocation>,
}

/// A `WorldRuntime` that keeps every room in memory.
#[derive(Debug, Default)]
pub struct InMemoryWorld {
    latency: Duration,
    failing_assets: HashSet<AssetRef>,
    state: Mutex<WorldState>,
}

impl InMemoryWorld {
    /// Creates a world whose spawns and deletes each take `latency`.
    #[must_use]
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    /// Makes spawns of the given assets fail.
    #[must_use]
    pub fn with_failing_assets(mut self, assets: impl IntoIterator<Item = AssetRef>) -> Self {
        self.failing_assets.extend(assets);
        self
    }

    /// Returns where `player` stands, if they have been teleported.
    pub fn locate(&self, player: PlayerHandle) -> Option<PlayerLocation> {
        self.state().players.get(&player).copied()
    }

    /// Returns the asset of the room `player` stands in.
    pub fn room_asset_of(&self, player: PlayerHandle) -> Option<AssetRef> {
        let state = self.state();
        match state.players.get(&player)? {
            PlayerLocation::Room(object) => state.rooms.get(object).map(|room| room.asset.clone()),
            PlayerLocation::Outside(_) => None,
        }
    }

    /// Returns the position of a live room.
    pub fn position_of(&self, object: ObjectHandle) -> Option<Vec3> {
        self.state().rooms.get(&object).map(|room| room.position)
    }

    /// Number of rooms currently alive.
    pub fn live_rooms(&self) -> usize {
        self.state().rooms.len()
    }

    /// Fires the exit trigger of the room `player` stands in.
    ///
    /// # Errors
    ///
    /// Returns `WorldError::Rejected` if the player is not inside a room,
    /// or `WorldError::UnknownObject` if their room has been deleted.
    pub fn trigger_exit(&self, player: PlayerHandle) -> Result<(), WorldError> {
        let state = self.state();
        let Some(PlayerLocation::Room(object)) = state.players.get(&player).copied() else {
            return Err(WorldError::Rejected(format!("{player} is not inside a room")));
        };
        let room = state
            .rooms
            .get(&object)
            .ok_or(WorldError::UnknownObject(object))?;
        room.proxy.trigger_exit(player)
    }

    fn state(&self) -> MutexGuard<'_, WorldState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn wait(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl WorldRuntime for InMemoryWorld {
    async fn spawn_asset(
        &self,
        asset: &AssetRef,
        position: Vec3,
        rotation: Rotation,
    ) -> Result<Vec<ObjectHandle>, WorldError> {
        self.wait().await;
        if self.failing_assets.contains(asset) {
            return Err(WorldError::Rejected(format!("{asset} failed to load")));
        }

        let object = ObjectHandle::new();
        let spawn_point = SpawnPointHandle::new();
        let proxy = spawn_room_proxy(object, spawn_point);
        debug!(%asset, %object, %position, yaw = rotation.yaw, "asset instantiated");

        let mut state = self.state();
        state.spawn_points.insert(spawn_point, object);
        state.rooms.insert(
            object,
            HostedRoom {
                asset: asset.clone(),
                position,
                proxy,
            },
        );
        Ok(vec![object])
    }

    async fn delete_asset(&self, object: ObjectHandle, full_delete: bool) -> Result<(), WorldError> {
        self.wait().await;
        let mut state = self.state();
        state
            .rooms
            .remove(&object)
            .ok_or(WorldError::UnknownObject(object))?;
        state.spawn_points.retain(|_, owner| *owner != object);
        debug!(%object, full_delete, "asset deleted");
        Ok(())
    }

    fn teleport(&self, player: PlayerHandle, spawn_point: SpawnPointHandle) {
        let mut state = self.state();
        let location = state
            .spawn_points
            .get(&spawn_point)
            .map_or(PlayerLocation::Outside(spawn_point), |object| {
                PlayerLocation::Room(*object)
            });
        debug!(%player, ?location, "player teleported");
        state.players.insert(player, location);
    }

    fn send_to_room(&self, room: ObjectHandle, message: RoomMessage) -> Result<(), WorldError> {
        let state = self.state();
        let hosted = state.rooms.get(&room).ok_or(WorldError::UnknownObject(room))?;
        hosted.proxy.deliver(message)
    }
}
