//! Runtime state of one active room instance.

use roomchain_core::handles::{ObjectHandle, PlayerHandle, SpawnPointHandle};
use serde::{Deserialize, Serialize};

/// A spawned room in the active window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomState {
    /// Catalog index this instance was spawned for.
    pub room_index: usize,
    /// Root object returned by the world runtime.
    pub object: ObjectHandle,
    /// Entry point, known once the room has answered the handshake.
    pub spawn_point: Option<SpawnPointHandle>,
    occupants: Vec<PlayerHandle>,
}

impl RoomState {
    /// Creates an empty, unregistered room.
    #[must_use]
    pub fn new(room_index: usize, object: ObjectHandle) -> Self {
        Self {
            room_index,
            object,
            spawn_point: None,
            occupants: Vec::new(),
        }
    }

    /// Adds `player` to the end of the occupant list. Adding a player who is
    /// already present does nothing.
    pub fn add_occupant(&mut self, player: PlayerHandle) {
        if !self.has_occupant(player) {
            self.occupants.push(player);
        }
    }

    /// Removes `player`, returning whether they were present.
    pub fn remove_occupant(&mut self, player: PlayerHandle) -> bool {
        let before = self.occupants.len();
        self.occupants.retain(|p| *p != player);
        self.occupants.len() != before
    }

    /// Returns true if `player` is in this room.
    #[must_use]
    pub fn has_occupant(&self, player: PlayerHandle) -> bool {
        self.occupants.contains(&player)
    }

    /// Returns true if nobody is in this room.
    #[must_use]
    pub fn is_vacant(&self) -> bool {
        self.occupants.is_empty()
    }

    /// Occupants in arrival order.
    #[must_use]
    pub fn occupants(&self) -> &[PlayerHandle] {
        &self.occupants
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_room_is_vacant_and_unregistered() {
        let room = RoomState::new(3, ObjectHandle::new());

        assert!(room.is_vacant());
        assert!(room.spawn_point.is_none());
    }

    #[test]
    fn test_add_occupant_is_idempotent() {
        // Arrange
        let mut room = RoomState::new(0, ObjectHandle::new());
        let player = PlayerHandle::new();

        // Act
        room.add_occupant(player);
        room.add_occupant(player);

        // Assert
        assert_eq!(room.occupants(), &[player]);
    }

    #[test]
    fn test_occupants_keep_arrival_order() {
        let mut room = RoomState::new(0, ObjectHandle::new());
        let first = PlayerHandle::new();
        let second = PlayerHandle::new();

        room.add_occupant(first);
        room.add_occupant(second);

        assert_eq!(room.occupants(), &[first, second]);
    }

    #[test]
    fn test_remove_occupant_reports_presence() {
        // Arrange
        let mut room = RoomState::new(0, ObjectHandle::new());
        let player = PlayerHandle::new();
        room.add_occupant(player);

        // Act
        let removed = room.remove_occupant(player);
        let removed_again = room.remove_occupant(player);

        // Assert
        assert!(removed);
        assert!(!removed_again);
        assert!(room.is_vacant());
    }
}
