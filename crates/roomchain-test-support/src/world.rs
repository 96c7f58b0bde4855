//! Test world: a `WorldRuntime` that records every call.
//!
//! Spawns and deletes can be delayed per asset and made to fail, and the
//! double tracks how many world mutations were outstanding at once. When a
//! `RegisterManager` message reaches a live object, the double answers with
//! `RegisterRoom` the way a room proxy would, unless the handshake has been
//! switched off.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use roomchain_core::error::WorldError;
use roomchain_core::handles::{AssetRef, ObjectHandle, PlayerHandle, SpawnPointHandle};
use roomchain_core::math::{Rotation, Vec3};
use roomchain_core::protocol::{ManagerHandle, RoomMessage};
use roomchain_core::world::WorldRuntime;

/// A call made against the world, in the order it was issued.
#[derive(Debug, Clone, PartialEq)]
pub enum WorldCall {
    /// `spawn_asset` was called.
    Spawn {
        /// The requested asset.
        asset: AssetRef,
        /// The requested position.
        position: Vec3,
        /// The requested rotation.
        rotation: Rotation,
    },
    /// `delete_asset` was called.
    Delete {
        /// The object to delete.
        object: ObjectHandle,
        /// Whether a full delete was requested.
        full_delete: bool,
    },
    /// `teleport` was called.
    Teleport {
        /// The player moved.
        player: PlayerHandle,
        /// Where they were sent.
        spawn_point: SpawnPointHandle,
    },
    /// `RegisterManager` was delivered to a room.
    RegisterManager {
        /// The receiving room.
        room: ObjectHandle,
        /// The index it was told it has.
        room_index: usize,
    },
}

/// How a world mutation finished, in completion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// A spawn produced `object`.
    Spawned(AssetRef, ObjectHandle),
    /// A spawn failed.
    SpawnFailed(AssetRef),
    /// A delete succeeded.
    Deleted(ObjectHandle),
    /// A delete failed.
    DeleteFailed(ObjectHandle),
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<WorldCall>,
    completions: Vec<Completion>,
    live: HashMap<ObjectHandle, SpawnPointHandle>,
    managers: Vec<ManagerHandle>,
}

/// A recording, scriptable `WorldRuntime`.
#[derive(Debug, Default)]
pub struct RecordingWorld {
    state: Mutex<State>,
    latency: Duration,
    asset_latency: HashMap<AssetRef, Duration>,
    failing_assets: HashSet<AssetRef>,
    silent_rooms: bool,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl RecordingWorld {
    /// Creates a world whose calls complete immediately and always succeed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every spawn and delete by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Delays spawns of `asset` by `latency` instead of the default.
    #[must_use]
    pub fn with_asset_latency(mut self, asset: AssetRef, latency: Duration) -> Self {
        self.asset_latency.insert(asset, latency);
        self
    }

    /// Makes every spawn of `asset` fail.
    #[must_use]
    pub fn failing_spawn(mut self, asset: AssetRef) -> Self {
        self.failing_assets.insert(asset);
        self
    }

    /// Stops rooms from answering `RegisterManager`.
    #[must_use]
    pub fn without_handshake(mut self) -> Self {
        self.silent_rooms = true;
        self
    }

    /// Returns a snapshot of all calls, in issue order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn calls(&self) -> Vec<WorldCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Returns a snapshot of all completions, in completion order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn completions(&self) -> Vec<Completion> {
        self.state.lock().unwrap().completions.clone()
    }

    /// Returns the assets passed to `spawn_asset`, in issue order.
    pub fn spawned_assets(&self) -> Vec<AssetRef> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                WorldCall::Spawn { asset, .. } => Some(asset),
                _ => None,
            })
            .collect()
    }

    /// Returns the positions passed to `spawn_asset`, in issue order.
    pub fn spawn_positions(&self) -> Vec<Vec3> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                WorldCall::Spawn { position, .. } => Some(position),
                _ => None,
            })
            .collect()
    }

    /// Returns the objects passed to `delete_asset`, in issue order.
    pub fn deleted_objects(&self) -> Vec<ObjectHandle> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                WorldCall::Delete { object, .. } => Some(object),
                _ => None,
            })
            .collect()
    }

    /// Returns every teleport, in issue order.
    pub fn teleports(&self) -> Vec<(PlayerHandle, SpawnPointHandle)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                WorldCall::Teleport {
                    player,
                    spawn_point,
                } => Some((player, spawn_point)),
                _ => None,
            })
            .collect()
    }

    /// Returns the spawn point of a live object.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn spawn_point_of(&self, object: ObjectHandle) -> Option<SpawnPointHandle> {
        self.state.lock().unwrap().live.get(&object).copied()
    }

    /// Returns the number of objects currently alive.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn live_count(&self) -> usize {
        self.state.lock().unwrap().live.len()
    }

    /// Returns the managers that rooms were bound to, in delivery order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn managers(&self) -> Vec<ManagerHandle> {
        self.state.lock().unwrap().managers.clone()
    }

    /// Returns the highest number of spawns/deletes that were outstanding at
    /// the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn begin(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
    }

    fn end(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    fn record(&self, call: WorldCall) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn complete(&self, completion: Completion) {
        self.state.lock().unwrap().completions.push(completion);
    }
}

#[async_trait]
impl WorldRuntime for RecordingWorld {
    async fn spawn_asset(
        &self,
        asset: &AssetRef,
        position: Vec3,
        rotation: Rotation,
    ) -> Result<Vec<ObjectHandle>, WorldError> {
        self.begin();
        self.record(WorldCall::Spawn {
            asset: asset.clone(),
            position,
            rotation,
        });

        let delay = self
            .asset_latency
            .get(asset)
            .copied()
            .unwrap_or(self.latency);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let result = if self.failing_assets.contains(asset) {
            self.complete(Completion::SpawnFailed(asset.clone()));
            Err(WorldError::Rejected(format!("cannot spawn {asset}")))
        } else {
            let object = ObjectHandle::new();
            self.state
                .lock()
                .unwrap()
                .live
                .insert(object, SpawnPointHandle::new());
            self.complete(Completion::Spawned(asset.clone(), object));
            Ok(vec![object])
        };

        self.end();
        result
    }

    async fn delete_asset(&self, object: ObjectHandle, full_delete: bool) -> Result<(), WorldError> {
        self.begin();
        self.record(WorldCall::Delete {
            object,
            full_delete,
        });

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let existed = self.state.lock().unwrap().live.remove(&object).is_some();
        let result = if existed {
            self.complete(Completion::Deleted(object));
            Ok(())
        } else {
            self.complete(Completion::DeleteFailed(object));
            Err(WorldError::UnknownObject(object))
        };

        self.end();
        result
    }

    fn teleport(&self, player: PlayerHandle, spawn_point: SpawnPointHandle) {
        self.record(WorldCall::Teleport {
            player,
            spawn_point,
        });
    }

    fn send_to_room(&self, room: ObjectHandle, message: RoomMessage) -> Result<(), WorldError> {
        let RoomMessage::RegisterManager {
            manager,
            room_index,
        } = message;
        self.record(WorldCall::RegisterManager { room, room_index });

        let spawn_point = {
            let mut state = self.state.lock().unwrap();
            let spawn_point = *state
                .live
                .get(&room)
                .ok_or(WorldError::UnknownObject(room))?;
            state.managers.push(manager.clone());
            spawn_point
        };

        if !self.silent_rooms {
            // A stopped manager is indistinguishable from a lost message here.
            let _ = manager.register_room(room_index, spawn_point);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use roomchain_core::protocol::ManagerNotice;
    use tokio::sync::mpsc;

    use super::*;

    fn asset(name: &str) -> AssetRef {
        AssetRef::new(name)
    }

    #[tokio::test]
    async fn test_spawn_then_delete_tracks_liveness() {
        // Arrange
        let world = RecordingWorld::new();

        // Act
        let objects = world
            .spawn_asset(&asset("rooms/bathroom"), Vec3::ZERO, Rotation::IDENTITY)
            .await
            .unwrap();
        let first_delete = world.delete_asset(objects[0], true).await;
        let second_delete = world.delete_asset(objects[0], true).await;

        // Assert
        assert!(first_delete.is_ok());
        assert_eq!(second_delete, Err(WorldError::UnknownObject(objects[0])));
        assert_eq!(world.live_count(), 0);
        assert_eq!(
            world.completions(),
            vec![
                Completion::Spawned(asset("rooms/bathroom"), objects[0]),
                Completion::Deleted(objects[0]),
                Completion::DeleteFailed(objects[0]),
            ]
        );
    }

    #[tokio::test]
    async fn test_failing_spawn_is_rejected() {
        let world = RecordingWorld::new().failing_spawn(asset("rooms/mudroom"));

        let result = world
            .spawn_asset(&asset("rooms/mudroom"), Vec3::ZERO, Rotation::IDENTITY)
            .await;

        assert!(matches!(result, Err(WorldError::Rejected(_))));
        assert_eq!(world.live_count(), 0);
    }

    #[tokio::test]
    async fn test_register_manager_is_answered_with_spawn_point() {
        // Arrange
        let world = RecordingWorld::new();
        let objects = world
            .spawn_asset(&asset("rooms/living_room"), Vec3::ZERO, Rotation::IDENTITY)
            .await
            .unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();

        // Act
        world
            .send_to_room(
                objects[0],
                RoomMessage::RegisterManager {
                    manager: ManagerHandle::new(tx),
                    room_index: 4,
                },
            )
            .unwrap();

        // Assert
        assert_eq!(
            rx.try_recv().unwrap(),
            ManagerNotice::RegisterRoom {
                room_index: 4,
                spawn_point: world.spawn_point_of(objects[0]).unwrap(),
            }
        );
    }

    #[tokio::test]
    async fn test_message_to_deleted_room_fails() {
        let world = RecordingWorld::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let gone = ObjectHandle::new();

        let result = world.send_to_room(
            gone,
            RoomMessage::RegisterManager {
                manager: ManagerHandle::new(tx),
                room_index: 0,
            },
        );

        assert_eq!(result, Err(WorldError::UnknownObject(gone)));
    }
}
