//! Domain events for the room chain context.

use roomchain_core::event::{DomainEvent, EventMetadata};
use roomchain_core::handles::{ObjectHandle, PlayerHandle, SpawnPointHandle};
use serde::{Deserialize, Serialize};

use super::pending::SpawnRequest;
use super::room::RoomState;

/// Emitted when the chain starts a new run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainReset {
    /// The new run generation.
    pub generation: u64,
}

/// Emitted when a catalog index is allocated and a spawn must be queued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnRequested {
    /// The queued request.
    pub request: SpawnRequest,
}

/// Emitted when a room leaves the window and must be destroyed now.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DespawnRequested {
    /// The room being removed.
    pub room: RoomState,
}

/// Emitted when a spawned room joins the tail of the window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomActivated {
    /// The room's catalog index.
    pub room_index: usize,
    /// The room's root object, which must receive `RegisterManager`.
    pub object: ObjectHandle,
}

/// Emitted when a spawn from an earlier run completes after a reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaleRoomDiscarded {
    /// The orphaned room, to be destroyed.
    pub room: RoomState,
    /// The run that requested it.
    pub generation: u64,
}

/// Emitted when the world runtime fails a spawn. The index is not retried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSpawnFailed {
    /// The lost catalog index.
    pub room_index: usize,
}

/// Emitted when a room completes the handshake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnPointRegistered {
    /// The registered room.
    pub room_index: usize,
    /// Its entry point.
    pub spawn_point: SpawnPointHandle,
}

/// Emitted when a player is added to a room's occupants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerEnteredRoom {
    /// The room entered.
    pub room_index: usize,
    /// The player.
    pub player: PlayerHandle,
}

/// Emitted when a player is removed from a room's occupants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerLeftRoom {
    /// The room left.
    pub room_index: usize,
    /// The player.
    pub player: PlayerHandle,
}

/// Emitted when a player must be moved. `room_index` is `None` for the exit
/// spawn point outside the chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerTeleported {
    /// The player.
    pub player: PlayerHandle,
    /// Destination.
    pub spawn_point: SpawnPointHandle,
    /// The destination room, if any.
    pub room_index: Option<usize>,
}

/// Emitted when the vacated head room leaves the window. Its despawn runs
/// after the grace delay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomVacated {
    /// The room removed from the window head.
    pub room: RoomState,
}

/// Event payload variants for the room chain context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChainEventKind {
    /// A new run started.
    ChainReset(ChainReset),
    /// A spawn must be queued.
    SpawnRequested(SpawnRequested),
    /// A despawn must be queued now.
    DespawnRequested(DespawnRequested),
    /// A room joined the window.
    RoomActivated(RoomActivated),
    /// A spawn from an earlier run was discarded.
    StaleRoomDiscarded(StaleRoomDiscarded),
    /// A spawn failed.
    RoomSpawnFailed(RoomSpawnFailed),
    /// A room reported its spawn point.
    SpawnPointRegistered(SpawnPointRegistered),
    /// A player entered a room.
    PlayerEnteredRoom(PlayerEnteredRoom),
    /// A player left a room.
    PlayerLeftRoom(PlayerLeftRoom),
    /// A player must be teleported.
    PlayerTeleported(PlayerTeleported),
    /// The head room was vacated and must be despawned after the grace delay.
    RoomVacated(RoomVacated),
}

impl ChainEventKind {
    /// The event type name for this payload.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::ChainReset(_) => "room_chain.chain_reset",
            Self::SpawnRequested(_) => "room_chain.spawn_requested",
            Self::DespawnRequested(_) => "room_chain.despawn_requested",
            Self::RoomActivated(_) => "room_chain.room_activated",
            Self::StaleRoomDiscarded(_) => "room_chain.stale_room_discarded",
            Self::RoomSpawnFailed(_) => "room_chain.room_spawn_failed",
            Self::SpawnPointRegistered(_) => "room_chain.spawn_point_registered",
            Self::PlayerEnteredRoom(_) => "room_chain.player_entered_room",
            Self::PlayerLeftRoom(_) => "room_chain.player_left_room",
            Self::PlayerTeleported(_) => "room_chain.player_teleported",
            Self::RoomVacated(_) => "room_chain.room_vacated",
        }
    }
}

/// Domain event envelope for the room chain context.
#[derive(Debug, Clone)]
pub struct ChainEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: ChainEventKind,
}

impl DomainEvent for ChainEvent {
    fn event_type(&self) -> &'static str {
        self.kind.type_name()
    }

    fn to_payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(&self.kind)
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
