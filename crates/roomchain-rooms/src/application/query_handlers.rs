//! Query handlers for the room chain context.
//!
//! Builds read-only views of the chain for callers outside the manager.

use roomchain_core::aggregate::AggregateRoot;
use roomchain_core::handles::{ObjectHandle, PlayerHandle, SpawnPointHandle};
use roomchain_core::math::Vec3;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::RoomChain;

/// Read-only view of one active room.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomView {
    /// Catalog index.
    pub room_index: usize,
    /// Catalog name.
    pub name: String,
    /// Root object of the instance.
    pub object: ObjectHandle,
    /// Entry point, once registered.
    pub spawn_point: Option<SpawnPointHandle>,
    /// Occupants in arrival order.
    pub occupants: Vec<PlayerHandle>,
}

/// Read-only view of the room chain aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainView {
    /// The chain identifier.
    pub chain_id: Uuid,
    /// Current run generation.
    pub generation: u64,
    /// Next catalog index to allocate.
    pub next_catalog_index: usize,
    /// Where the next room will be placed.
    pub placement_cursor: Vec3,
    /// Indices requested but not yet spawned.
    pub spawns_in_flight: Vec<usize>,
    /// The active window, head first.
    pub rooms: Vec<RoomView>,
    /// Number of events recorded so far.
    pub version: i64,
}

impl ChainView {
    /// Indices of the active rooms, head first.
    #[must_use]
    pub fn room_indices(&self) -> Vec<usize> {
        self.rooms.iter().map(|room| room.room_index).collect()
    }

    /// The active room with `room_index`.
    #[must_use]
    pub fn room(&self, room_index: usize) -> Option<&RoomView> {
        self.rooms.iter().find(|room| room.room_index == room_index)
    }

    /// Index of the room `player` is in.
    #[must_use]
    pub fn room_of(&self, player: PlayerHandle) -> Option<usize> {
        self.rooms
            .iter()
            .find(|room| room.occupants.contains(&player))
            .map(|room| room.room_index)
    }
}

/// Builds a `ChainView` of `chain`.
#[must_use]
pub fn view_chain(chain: &RoomChain) -> ChainView {
    ChainView {
        chain_id: chain.aggregate_id(),
        generation: chain.generation(),
        next_catalog_index: chain.next_catalog_index(),
        placement_cursor: chain.placement_cursor(),
        spawns_in_flight: chain.spawns_in_flight().collect(),
        rooms: chain
            .window()
            .map(|room| RoomView {
                room_index: room.room_index,
                name: chain.catalog().name_of(room.room_index).to_owned(),
                object: room.object,
                spawn_point: room.spawn_point,
                occupants: room.occupants().to_vec(),
            })
            .collect(),
        version: chain.version(),
    }
}
