//! Messages exchanged between the room manager and room instances.
//!
//! | Message           | Direction       | Payload                     |
//! |-------------------|-----------------|-----------------------------|
//! | `RegisterManager` | manager → room  | manager address, room index |
//! | `RegisterRoom`    | room → manager  | room index, spawn point     |
//! | `PlayerExited`    | room → manager  | room index, player          |
//!
//! The binding is push-based: a spawn call returns a handle before the room's
//! own startup has run, so the manager pushes its identity to the room and
//! the room pushes its discovered spawn point back.

use tokio::sync::mpsc;

use crate::error::ChainError;
use crate::handles::{PlayerHandle, SpawnPointHandle};

/// A message delivered to a room instance.
#[derive(Debug, Clone)]
pub enum RoomMessage {
    /// Binds a freshly spawned room to its owning manager.
    RegisterManager {
        /// Where the room should send its replies.
        manager: ManagerHandle,
        /// The catalog index this instance was spawned for.
        room_index: usize,
    },
}

/// A message delivered from a room instance to the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagerNotice {
    /// Completes the handshake with the spawn point found inside the room.
    RegisterRoom {
        /// The index the room was registered with.
        room_index: usize,
        /// The room's entry point.
        spawn_point: SpawnPointHandle,
    },
    /// A player walked into the room's exit trigger.
    PlayerExited {
        /// The index the room was registered with.
        room_index: usize,
        /// The player who left.
        player: PlayerHandle,
    },
}

/// Address of a running room manager's notice mailbox.
#[derive(Debug, Clone)]
pub struct ManagerHandle {
    tx: mpsc::UnboundedSender<ManagerNotice>,
}

impl ManagerHandle {
    /// Wraps the sending half of a manager's notice mailbox.
    #[must_use]
    pub fn new(tx: mpsc::UnboundedSender<ManagerNotice>) -> Self {
        Self { tx }
    }

    /// Sends `RegisterRoom` to the manager.
    ///
    /// # Errors
    ///
    /// Returns `ChainError::ManagerUnavailable` if the manager has stopped.
    pub fn register_room(
        &self,
        room_index: usize,
        spawn_point: SpawnPointHandle,
    ) -> Result<(), ChainError> {
        self.send(ManagerNotice::RegisterRoom {
            room_index,
            spawn_point,
        })
    }

    /// Sends `PlayerExited` to the manager.
    ///
    /// # Errors
    ///
    /// Returns `ChainError::ManagerUnavailable` if the manager has stopped.
    pub fn player_exited(&self, room_index: usize, player: PlayerHandle) -> Result<(), ChainError> {
        self.send(ManagerNotice::PlayerExited { room_index, player })
    }

    /// Returns true if both handles address the same mailbox.
    #[must_use]
    pub fn same_manager(&self, other: &Self) -> bool {
        self.tx.same_channel(&other.tx)
    }

    fn send(&self, notice: ManagerNotice) -> Result<(), ChainError> {
        self.tx
            .send(notice)
            .map_err(|_| ChainError::ManagerUnavailable)
    }
}
