//! Operations waiting in the spawn queue.

use roomchain_core::math::{Rotation, Vec3};
use serde::{Deserialize, Serialize};

use super::catalog::RoomDefinition;
use super::room::RoomState;

/// A request to instantiate one catalog room.
///
/// Position and rotation are fixed when the request is issued, so a queued
/// spawn lands where the placement cursor pointed at that moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnRequest {
    /// The chain run this request belongs to.
    pub generation: u64,
    /// The catalog index allocated for this spawn.
    pub room_index: usize,
    /// What to spawn.
    pub definition: RoomDefinition,
    /// Where to place it.
    pub position: Vec3,
    /// How to orient it.
    pub rotation: Rotation,
}

/// Kind of world mutation, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingOpKind {
    /// Instantiates a room.
    Spawn,
    /// Destroys a room.
    Despawn,
}

impl PendingOpKind {
    /// Lower-case name used as a log field.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Spawn => "spawn",
            Self::Despawn => "despawn",
        }
    }
}

/// One entry in the spawn queue. The executor owns it once dequeued and
/// drops it after the world call completes.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingOp {
    /// Instantiate a room.
    Spawn(SpawnRequest),
    /// Destroy a room that has already left the active window.
    Despawn(RoomState),
}

impl PendingOp {
    /// The catalog index the operation concerns.
    #[must_use]
    pub fn room_index(&self) -> usize {
        match self {
            Self::Spawn(request) => request.room_index,
            Self::Despawn(room) => room.room_index,
        }
    }

    /// Whether this is a spawn or a despawn.
    #[must_use]
    pub fn kind(&self) -> PendingOpKind {
        match self {
            Self::Spawn(_) => PendingOpKind::Spawn,
            Self::Despawn(_) => PendingOpKind::Despawn,
        }
    }
}
