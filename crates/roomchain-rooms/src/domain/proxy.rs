//! The behavior attached to each spawned room instance.
//!
//! A room knows its own spawn point but not its catalog index or who owns
//! it. Both arrive with `RegisterManager`; until then exits cannot be
//! reported.

use roomchain_core::error::ChainError;
use roomchain_core::handles::{PlayerHandle, SpawnPointHandle};
use roomchain_core::protocol::ManagerHandle;

/// Handshake and exit-trigger state of one room instance.
#[derive(Debug, Clone)]
pub struct RoomProxy {
    spawn_point: SpawnPointHandle,
    manager: Option<ManagerHandle>,
    room_index: Option<usize>,
}

impl RoomProxy {
    /// Creates an unbound proxy for a room whose entry point is `spawn_point`.
    #[must_use]
    pub fn new(spawn_point: SpawnPointHandle) -> Self {
        Self {
            spawn_point,
            manager: None,
            room_index: None,
        }
    }

    /// The room's entry point.
    #[must_use]
    pub fn spawn_point(&self) -> SpawnPointHandle {
        self.spawn_point
    }

    /// The index assigned by the manager, once bound.
    #[must_use]
    pub fn room_index(&self) -> Option<usize> {
        self.room_index
    }

    /// Returns true once `RegisterManager` has been received.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.manager.is_some()
    }

    /// Stores the manager and index, then answers with `RegisterRoom`.
    ///
    /// A second registration rebinds the room.
    ///
    /// # Errors
    ///
    /// Returns `ChainError::ManagerUnavailable` if the reply cannot be sent.
    pub fn on_register_manager(
        &mut self,
        manager: ManagerHandle,
        room_index: usize,
    ) -> Result<(), ChainError> {
        let reply = manager.register_room(room_index, self.spawn_point);
        self.manager = Some(manager);
        self.room_index = Some(room_index);
        reply
    }

    /// Reports that `player` walked through the exit trigger.
    ///
    /// # Errors
    ///
    /// Returns `ChainError::ManagerNotBound` before the handshake, in which
    /// case the exit is lost, or `ChainError::ManagerUnavailable` if the
    /// manager has stopped.
    pub fn on_exit_trigger(&self, player: PlayerHandle) -> Result<(), ChainError> {
        match (&self.manager, self.room_index) {
            (Some(manager), Some(room_index)) => manager.player_exited(room_index, player),
            _ => Err(ChainError::ManagerNotBound),
        }
    }
}
