//! Ports onto the host world runtime.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::WorldError;
use crate::handles::{AssetRef, ObjectHandle, PlayerHandle, SpawnPointHandle};
use crate::math::{Rotation, Vec3};
use crate::protocol::RoomMessage;

/// The world runtime that instantiates and destroys room assets.
///
/// Spawn and delete are slow and fallible. The runtime does not guarantee
/// that concurrent creation/destruction is safe, so callers must keep at
/// most one of them outstanding.
#[async_trait]
pub trait WorldRuntime: Send + Sync {
    /// Instantiates `asset` at `position`, resolving to the created objects.
    /// The first object is the room root.
    async fn spawn_asset(
        &self,
        asset: &AssetRef,
        position: Vec3,
        rotation: Rotation,
    ) -> Result<Vec<ObjectHandle>, WorldError>;

    /// Destroys a previously spawned object.
    async fn delete_asset(&self, object: ObjectHandle, full_delete: bool) -> Result<(), WorldError>;

    /// Moves `player` to `spawn_point`.
    fn teleport(&self, player: PlayerHandle, spawn_point: SpawnPointHandle);

    /// Delivers a message to the behavior running inside a room instance.
    ///
    /// # Errors
    ///
    /// Returns `WorldError::UnknownObject` if the object no longer exists.
    fn send_to_room(&self, room: ObjectHandle, message: RoomMessage) -> Result<(), WorldError>;
}

/// User-visible status popups.
pub trait Notifier: Send + Sync {
    /// Shows `text` to every player for `duration`.
    fn show_popup_for_everyone(&self, text: &str, duration: Duration);
}
