//! Aggregate root for the room chain context.

use std::collections::{BTreeSet, VecDeque};

use roomchain_core::aggregate::AggregateRoot;
use roomchain_core::error::ChainError;
use roomchain_core::event::{Clock, EventMetadata};
use roomchain_core::handles::{ObjectHandle, PlayerHandle, SpawnPointHandle};
use roomchain_core::math::{Rotation, Vec3};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::catalog::RoomCatalog;
use super::events::{
    ChainEvent, ChainEventKind, ChainReset, DespawnRequested, PlayerEnteredRoom, PlayerLeftRoom,
    PlayerTeleported, RoomActivated, RoomSpawnFailed, RoomVacated, SpawnPointRegistered,
    SpawnRequested, StaleRoomDiscarded,
};
use super::pending::SpawnRequest;
use super::room::RoomState;

/// Distance between consecutive rooms.
pub const DEFAULT_SPAWN_OFFSET: Vec3 = Vec3::new(0.0, 0.0, 50.0);

/// Orientation given to every spawned room.
pub const DEFAULT_SPAWN_ROTATION: Rotation = Rotation::from_euler_degrees(0.0, 90.0, 0.0);

/// How far ahead of a player's room the chain keeps rooms spawned.
const LOOK_AHEAD: usize = 2;

/// Where rooms are placed and where players leave the chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainLayout {
    /// Position of room 0.
    pub initial_position: Vec3,
    /// Added to the placement cursor after every spawn request.
    pub spawn_offset: Vec3,
    /// Rotation passed to every spawn.
    pub spawn_rotation: Rotation,
    /// Spawn point outside the chain, used when a player leaves the final room.
    pub exit_spawn_point: SpawnPointHandle,
}

impl ChainLayout {
    /// Creates a layout with default placement around `exit_spawn_point`.
    #[must_use]
    pub fn new(exit_spawn_point: SpawnPointHandle) -> Self {
        Self {
            initial_position: Vec3::ZERO,
            spawn_offset: DEFAULT_SPAWN_OFFSET,
            spawn_rotation: DEFAULT_SPAWN_ROTATION,
            exit_spawn_point,
        }
    }
}

/// The aggregate root for one room chain.
///
/// Owns the active window, the catalog cursor, the placement cursor and
/// player occupancy. Operations mutate state synchronously and record
/// `ChainEvent`s describing the world effects the caller must perform.
#[derive(Debug)]
pub struct RoomChain {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Number of events drained so far.
    pub(crate) version: i64,
    catalog: RoomCatalog,
    layout: ChainLayout,
    /// Active rooms, strictly ascending by room index.
    window: VecDeque<RoomState>,
    next_catalog_index: usize,
    placement_cursor: Vec3,
    /// Incremented on every reset; spawns carry the generation they were
    /// requested in.
    generation: u64,
    /// Indices requested in the current generation whose spawn has not
    /// completed yet.
    spawns_in_flight: BTreeSet<usize>,
    uncommitted_events: Vec<ChainEvent>,
}

impl RoomChain {
    /// Creates an empty chain. Nothing is spawned until `reset` is called.
    #[must_use]
    pub fn new(id: Uuid, catalog: RoomCatalog, layout: ChainLayout) -> Self {
        Self {
            id,
            version: 0,
            placement_cursor: layout.initial_position,
            catalog,
            layout,
            window: VecDeque::new(),
            next_catalog_index: 0,
            generation: 0,
            spawns_in_flight: BTreeSet::new(),
            uncommitted_events: Vec::new(),
        }
    }

    /// The catalog this chain draws rooms from.
    #[must_use]
    pub fn catalog(&self) -> &RoomCatalog {
        &self.catalog
    }

    /// The placement configuration.
    #[must_use]
    pub fn layout(&self) -> &ChainLayout {
        &self.layout
    }

    /// Active rooms from head to tail.
    pub fn window(&self) -> impl Iterator<Item = &RoomState> {
        self.window.iter()
    }

    /// The active room with `room_index`, if any.
    #[must_use]
    pub fn room(&self, room_index: usize) -> Option<&RoomState> {
        self.window.iter().find(|room| room.room_index == room_index)
    }

    /// Index of the room `player` currently occupies.
    #[must_use]
    pub fn room_of(&self, player: PlayerHandle) -> Option<usize> {
        self.window
            .iter()
            .find(|room| room.has_occupant(player))
            .map(|room| room.room_index)
    }

    /// The next catalog index `spawn_next` will allocate.
    #[must_use]
    pub fn next_catalog_index(&self) -> usize {
        self.next_catalog_index
    }

    /// Where the next spawned room will be placed.
    #[must_use]
    pub fn placement_cursor(&self) -> Vec3 {
        self.placement_cursor
    }

    /// The current run generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Indices whose spawn has been requested but not completed, ascending.
    pub fn spawns_in_flight(&self) -> impl Iterator<Item = usize> + '_ {
        self.spawns_in_flight.iter().copied()
    }

    /// Returns the next sequence number for a new event.
    #[allow(clippy::cast_possible_wrap)]
    fn next_sequence_number(&self) -> i64 {
        self.version + self.uncommitted_events.len() as i64 + 1
    }

    fn record(&mut self, kind: ChainEventKind, correlation_id: Uuid, clock: &dyn Clock) {
        let metadata = EventMetadata::caused_by(
            kind.type_name(),
            self.id,
            self.next_sequence_number(),
            correlation_id,
            clock,
        );
        self.uncommitted_events.push(ChainEvent { metadata, kind });
    }

    fn position_of(&self, room_index: usize) -> Option<usize> {
        self.window
            .iter()
            .position(|room| room.room_index == room_index)
    }

    /// Starts a new run: every active room is despawned, the cursors return
    /// to their initial values, and rooms 0 and 1 are requested.
    pub fn reset(&mut self, correlation_id: Uuid, clock: &dyn Clock) {
        while let Some(room) = self.window.pop_front() {
            self.record(
                ChainEventKind::DespawnRequested(DespawnRequested { room }),
                correlation_id,
                clock,
            );
        }

        self.generation += 1;
        self.next_catalog_index = 0;
        self.placement_cursor = self.layout.initial_position;
        self.spawns_in_flight.clear();
        self.record(
            ChainEventKind::ChainReset(ChainReset {
                generation: self.generation,
            }),
            correlation_id,
            clock,
        );

        self.spawn_next(correlation_id, clock);
        self.spawn_next(correlation_id, clock);
    }

    /// Allocates the next catalog index and requests its spawn at the
    /// placement cursor, then advances the cursor.
    ///
    /// Returns the allocated index, or `None` once the catalog is exhausted.
    pub fn spawn_next(&mut self, correlation_id: Uuid, clock: &dyn Clock) -> Option<usize> {
        let room_index = self.next_catalog_index;
        let Some(definition) = self.catalog.get(room_index).cloned() else {
            info!(
                next_catalog_index = room_index,
                "room catalog exhausted, nothing left to spawn"
            );
            return None;
        };

        let request = SpawnRequest {
            generation: self.generation,
            room_index,
            definition,
            position: self.placement_cursor,
            rotation: self.layout.spawn_rotation,
        };
        self.next_catalog_index += 1;
        self.placement_cursor += self.layout.spawn_offset;
        self.spawns_in_flight.insert(room_index);

        self.record(
            ChainEventKind::SpawnRequested(SpawnRequested { request }),
            correlation_id,
            clock,
        );
        Some(room_index)
    }

    /// Applies a successful spawn. A room from the current run joins the
    /// window tail; one from an earlier run is discarded for despawn.
    pub fn room_spawned(
        &mut self,
        request: &SpawnRequest,
        object: ObjectHandle,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) {
        let room = RoomState::new(request.room_index, object);
        let out_of_order = self
            .window
            .back()
            .is_some_and(|tail| tail.room_index >= request.room_index);

        if request.generation != self.generation || out_of_order {
            debug!(
                room_index = request.room_index,
                generation = request.generation,
                current_generation = self.generation,
                "spawned room no longer belongs to the chain"
            );
            self.record(
                ChainEventKind::StaleRoomDiscarded(StaleRoomDiscarded {
                    room,
                    generation: request.generation,
                }),
                correlation_id,
                clock,
            );
            return;
        }

        self.spawns_in_flight.remove(&request.room_index);
        self.window.push_back(room);
        self.record(
            ChainEventKind::RoomActivated(RoomActivated {
                room_index: request.room_index,
                object,
            }),
            correlation_id,
            clock,
        );
    }

    /// Applies a failed spawn. The index is consumed and never retried.
    pub fn room_spawn_failed(
        &mut self,
        request: &SpawnRequest,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) {
        if request.generation != self.generation {
            debug!(
                room_index = request.room_index,
                generation = request.generation,
                "ignoring failed spawn from an earlier run"
            );
            return;
        }

        self.spawns_in_flight.remove(&request.room_index);
        self.record(
            ChainEventKind::RoomSpawnFailed(RoomSpawnFailed {
                room_index: request.room_index,
            }),
            correlation_id,
            clock,
        );
    }

    /// Attaches the spawn point reported by a room's handshake. Players who
    /// entered the room before it registered are teleported now.
    ///
    /// # Errors
    ///
    /// Returns `ChainError::RoomNotTracked` if no active room has
    /// `room_index`; nothing is changed.
    pub fn register_room(
        &mut self,
        room_index: usize,
        spawn_point: SpawnPointHandle,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), ChainError> {
        let position = self
            .position_of(room_index)
            .ok_or(ChainError::RoomNotTracked(room_index))?;
        let room = &mut self.window[position];
        let waiting = if room.spawn_point.is_none() {
            room.occupants().to_vec()
        } else {
            Vec::new()
        };
        room.spawn_point = Some(spawn_point);

        self.record(
            ChainEventKind::SpawnPointRegistered(SpawnPointRegistered {
                room_index,
                spawn_point,
            }),
            correlation_id,
            clock,
        );
        for player in waiting {
            self.record(
                ChainEventKind::PlayerTeleported(PlayerTeleported {
                    player,
                    spawn_point,
                    room_index: Some(room_index),
                }),
                correlation_id,
                clock,
            );
        }
        Ok(())
    }

    /// Moves a player from outside the house into room 0.
    ///
    /// # Errors
    ///
    /// Returns `ChainError::InitialRoomMissing` if the window head is not
    /// room 0; nothing is changed.
    pub fn player_enters_house(
        &mut self,
        player: PlayerHandle,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), ChainError> {
        match self.window.front() {
            Some(head) if head.room_index == 0 => {}
            other => {
                return Err(ChainError::InitialRoomMissing {
                    head: other.map(|room| room.room_index),
                });
            }
        }

        for position in 1..self.window.len() {
            if self.window[position].remove_occupant(player) {
                let room_index = self.window[position].room_index;
                self.record(
                    ChainEventKind::PlayerLeftRoom(PlayerLeftRoom { room_index, player }),
                    correlation_id,
                    clock,
                );
            }
        }

        self.enter_room(0, player, correlation_id, clock);
        Ok(())
    }

    /// Handles a player walking out of `room_index`.
    ///
    /// The player moves to the next active room, or to the exit spawn point
    /// if no further room exists or can arrive. If the vacated room is the
    /// window head it leaves the window immediately and is recorded for a
    /// delayed despawn.
    ///
    /// # Errors
    ///
    /// Returns `ChainError::RoomNotTracked` if `room_index` is not active,
    /// or `ChainError::SuccessorPending` if the next room is still being
    /// spawned. Occupancy is unchanged in both cases.
    pub fn player_exited(
        &mut self,
        room_index: usize,
        player: PlayerHandle,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), ChainError> {
        let position = self
            .position_of(room_index)
            .ok_or(ChainError::RoomNotTracked(room_index))?;

        let destination = if room_index >= self.catalog.last_index() {
            None
        } else if position + 1 < self.window.len() {
            Some(position + 1)
        } else if self.spawns_in_flight.range(room_index + 1..).next().is_some() {
            return Err(ChainError::SuccessorPending { room_index });
        } else if self.next_catalog_index < self.catalog.len() {
            // Every requested successor failed; ask for another one.
            self.spawn_next(correlation_id, clock);
            return Err(ChainError::SuccessorPending { room_index });
        } else {
            None
        };

        if self.window[position].remove_occupant(player) {
            self.record(
                ChainEventKind::PlayerLeftRoom(PlayerLeftRoom { room_index, player }),
                correlation_id,
                clock,
            );
        }

        if let Some(next) = destination {
            self.enter_room(next, player, correlation_id, clock);
        } else {
            info!(%player, room_index, "player left the final room");
            self.record(
                ChainEventKind::PlayerTeleported(PlayerTeleported {
                    player,
                    spawn_point: self.layout.exit_spawn_point,
                    room_index: None,
                }),
                correlation_id,
                clock,
            );
        }

        let head_vacated = self
            .window
            .front()
            .is_some_and(|head| head.room_index == room_index && head.is_vacant());
        if head_vacated && let Some(room) = self.window.pop_front() {
            self.record(
                ChainEventKind::RoomVacated(RoomVacated { room }),
                correlation_id,
                clock,
            );
        }

        Ok(())
    }

    fn enter_room(
        &mut self,
        position: usize,
        player: PlayerHandle,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) {
        let room = &mut self.window[position];
        room.add_occupant(player);
        let (room_index, spawn_point) = (room.room_index, room.spawn_point);

        self.record(
            ChainEventKind::PlayerEnteredRoom(PlayerEnteredRoom { room_index, player }),
            correlation_id,
            clock,
        );

        if let Some(spawn_point) = spawn_point {
            self.record(
                ChainEventKind::PlayerTeleported(PlayerTeleported {
                    player,
                    spawn_point,
                    room_index: Some(room_index),
                }),
                correlation_id,
                clock,
            );
        } else {
            warn!(
                %player,
                room_index,
                "room has not registered a spawn point, teleport deferred"
            );
        }

        if room_index + LOOK_AHEAD >= self.next_catalog_index {
            self.spawn_next(correlation_id, clock);
        }
    }
}

impl AggregateRoot for RoomChain {
    type Event = ChainEvent;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    #[allow(clippy::cast_possible_wrap)]
    fn take_uncommitted_events(&mut self) -> Vec<Self::Event> {
        let events = std::mem::take(&mut self.uncommitted_events);
        self.version += events.len() as i64;
        events
    }
}

#[cfg(test)]
mod tests {
    use roomchain_core::event::DomainEvent;
    use roomchain_core::handles::AssetRef;
    use roomchain_test_support::FixedClock;

    use super::*;
    use crate::domain::catalog::RoomDefinition;

    const ROOM_NAMES: [&str; 7] = [
        "Dining Room",
        "Zig Zag Hallway",
        "Bathroom",
        "Neverending Hallway",
        "Living Room",
        "Split Hallway",
        "Mudroom",
    ];

    fn seven_room_chain() -> RoomChain {
        let rooms = ROOM_NAMES
            .iter()
            .map(|name| RoomDefinition::new(*name, AssetRef::new(format!("rooms/{name}"))))
            .collect();
        let catalog = RoomCatalog::new(rooms).unwrap();
        RoomChain::new(
            Uuid::new_v4(),
            catalog,
            ChainLayout::new(SpawnPointHandle::new()),
        )
    }

    fn kinds(chain: &mut RoomChain) -> Vec<ChainEventKind> {
        chain
            .take_uncommitted_events()
            .into_iter()
            .map(|event| event.kind)
            .collect()
    }

    fn spawn_requests(kinds: &[ChainEventKind]) -> Vec<SpawnRequest> {
        kinds
            .iter()
            .filter_map(|kind| match kind {
                ChainEventKind::SpawnRequested(payload) => Some(payload.request.clone()),
                _ => None,
            })
            .collect()
    }

    fn teleports(kinds: &[ChainEventKind]) -> Vec<PlayerTeleported> {
        kinds
            .iter()
            .filter_map(|kind| match kind {
                ChainEventKind::PlayerTeleported(payload) => Some(payload.clone()),
                _ => None,
            })
            .collect()
    }

    fn window_indices(chain: &RoomChain) -> Vec<usize> {
        chain.window().map(|room| room.room_index).collect()
    }

    /// Completes every requested spawn, in order, and registers each room.
    fn complete_spawns(chain: &mut RoomChain, clock: &FixedClock) {
        let pending = kinds(chain);
        for request in spawn_requests(&pending) {
            chain.room_spawned(&request, ObjectHandle::new(), Uuid::new_v4(), clock);
            chain
                .register_room(
                    request.room_index,
                    SpawnPointHandle::new(),
                    Uuid::new_v4(),
                    clock,
                )
                .unwrap();
        }
        chain.take_uncommitted_events();
    }

    fn assert_window_contiguous(chain: &RoomChain) {
        let indices = window_indices(chain);
        for pair in indices.windows(2) {
            assert_eq!(pair[1], pair[0] + 1, "window {indices:?} has a gap");
        }
    }

    #[test]
    fn test_reset_requests_first_two_rooms() {
        // Arrange
        let clock = FixedClock::at_noon();
        let mut chain = seven_room_chain();

        // Act
        chain.reset(Uuid::new_v4(), &clock);

        // Assert
        let requests = spawn_requests(&kinds(&mut chain));
        let indices: Vec<usize> = requests.iter().map(|r| r.room_index).collect();
        assert_eq!(indices, vec![0, 1]);
        assert_eq!(requests[0].position, Vec3::ZERO);
        assert_eq!(requests[1].position, Vec3::new(0.0, 0.0, 50.0));
        assert_eq!(requests[0].rotation, DEFAULT_SPAWN_ROTATION);
        assert_eq!(chain.placement_cursor(), Vec3::new(0.0, 0.0, 100.0));
        assert_eq!(chain.next_catalog_index(), 2);
        assert_eq!(chain.spawns_in_flight().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_window_holds_first_two_rooms_after_spawns_succeed() {
        let clock = FixedClock::at_noon();
        let mut chain = seven_room_chain();
        chain.reset(Uuid::new_v4(), &clock);

        complete_spawns(&mut chain, &clock);

        assert_eq!(window_indices(&chain), vec![0, 1]);
        assert_eq!(chain.next_catalog_index(), 2);
        assert_eq!(chain.spawns_in_flight().count(), 0);
    }

    #[test]
    fn test_events_carry_metadata_and_advance_version() {
        // Arrange
        let clock = FixedClock::at_noon();
        let correlation_id = Uuid::new_v4();
        let mut chain = seven_room_chain();

        // Act
        chain.reset(correlation_id, &clock);

        // Assert
        let events = chain.take_uncommitted_events();
        let types: Vec<&str> = events.iter().map(DomainEvent::event_type).collect();
        assert_eq!(
            types,
            vec![
                "room_chain.chain_reset",
                "room_chain.spawn_requested",
                "room_chain.spawn_requested",
            ]
        );
        for (offset, event) in events.iter().enumerate() {
            let meta = event.metadata();
            assert_eq!(meta.aggregate_id, chain.id);
            assert_eq!(meta.sequence_number, i64::try_from(offset).unwrap() + 1);
            assert_eq!(meta.correlation_id, correlation_id);
            assert_eq!(meta.causation_id, correlation_id);
            assert_eq!(meta.occurred_at, clock.0);
        }
        assert_eq!(chain.version(), 3);
        assert!(chain.uncommitted_events().is_empty());
    }

    #[test]
    fn test_enter_house_teleports_to_first_room_and_looks_ahead() {
        // Arrange
        let clock = FixedClock::at_noon();
        let mut chain = seven_room_chain();
        chain.reset(Uuid::new_v4(), &clock);
        let requests = spawn_requests(&kinds(&mut chain));
        let spawn_point = SpawnPointHandle::new();
        chain.room_spawned(&requests[0], ObjectHandle::new(), Uuid::new_v4(), &clock);
        chain
            .register_room(0, spawn_point, Uuid::new_v4(), &clock)
            .unwrap();
        chain.take_uncommitted_events();
        let player = PlayerHandle::new();

        // Act
        chain
            .player_enters_house(player, Uuid::new_v4(), &clock)
            .unwrap();

        // Assert
        let recorded = kinds(&mut chain);
        assert_eq!(
            teleports(&recorded),
            vec![PlayerTeleported {
                player,
                spawn_point,
                room_index: Some(0),
            }]
        );
        let spawned: Vec<usize> = spawn_requests(&recorded)
            .iter()
            .map(|r| r.room_index)
            .collect();
        assert_eq!(spawned, vec![2]);
        assert_eq!(chain.room_of(player), Some(0));
    }

    #[test]
    fn test_enter_house_without_initial_room_fails() {
        let clock = FixedClock::at_noon();
        let mut chain = seven_room_chain();

        let result = chain.player_enters_house(PlayerHandle::new(), Uuid::new_v4(), &clock);

        assert!(matches!(
            result,
            Err(ChainError::InitialRoomMissing { head: None })
        ));
        assert!(chain.uncommitted_events().is_empty());
    }

    #[test]
    fn test_enter_house_before_handshake_defers_teleport() {
        // Arrange
        let clock = FixedClock::at_noon();
        let mut chain = seven_room_chain();
        chain.reset(Uuid::new_v4(), &clock);
        let requests = spawn_requests(&kinds(&mut chain));
        chain.room_spawned(&requests[0], ObjectHandle::new(), Uuid::new_v4(), &clock);
        chain.take_uncommitted_events();
        let player = PlayerHandle::new();
        let spawn_point = SpawnPointHandle::new();

        // Act
        chain
            .player_enters_house(player, Uuid::new_v4(), &clock)
            .unwrap();
        let on_entry = kinds(&mut chain);
        chain
            .register_room(0, spawn_point, Uuid::new_v4(), &clock)
            .unwrap();
        let on_register = kinds(&mut chain);

        // Assert
        assert!(teleports(&on_entry).is_empty());
        assert_eq!(chain.room_of(player), Some(0));
        assert_eq!(
            teleports(&on_register),
            vec![PlayerTeleported {
                player,
                spawn_point,
                room_index: Some(0),
            }]
        );
    }

    #[test]
    fn test_repeated_registration_does_not_teleport_occupants_again() {
        // Arrange
        let clock = FixedClock::at_noon();
        let mut chain = seven_room_chain();
        chain.reset(Uuid::new_v4(), &clock);
        complete_spawns(&mut chain, &clock);
        chain
            .player_enters_house(PlayerHandle::new(), Uuid::new_v4(), &clock)
            .unwrap();
        chain.take_uncommitted_events();

        // Act
        chain
            .register_room(0, SpawnPointHandle::new(), Uuid::new_v4(), &clock)
            .unwrap();

        // Assert
        assert!(teleports(&kinds(&mut chain)).is_empty());
    }

    #[test]
    fn test_exit_moves_player_to_next_room_and_looks_ahead() {
        // Arrange
        let clock = FixedClock::at_noon();
        let mut chain = seven_room_chain();
        let player = PlayerHandle::new();
        chain.reset(Uuid::new_v4(), &clock);
        complete_spawns(&mut chain, &clock);
        chain
            .player_enters_house(player, Uuid::new_v4(), &clock)
            .unwrap();
        complete_spawns(&mut chain, &clock);
        for room_index in 0..3 {
            chain
                .player_exited(room_index, player, Uuid::new_v4(), &clock)
                .unwrap();
            complete_spawns(&mut chain, &clock);
        }
        assert_eq!(chain.room_of(player), Some(3));
        assert_eq!(chain.next_catalog_index(), 6);
        let next_spawn_point = chain.room(4).unwrap().spawn_point.unwrap();

        // Act
        chain
            .player_exited(3, player, Uuid::new_v4(), &clock)
            .unwrap();

        // Assert
        let recorded = kinds(&mut chain);
        assert_eq!(chain.room_of(player), Some(4));
        assert_eq!(
            teleports(&recorded),
            vec![PlayerTeleported {
                player,
                spawn_point: next_spawn_point,
                room_index: Some(4),
            }]
        );
        let spawned: Vec<usize> = spawn_requests(&recorded)
            .iter()
            .map(|r| r.room_index)
            .collect();
        assert_eq!(spawned, vec![6]);
        assert_window_contiguous(&chain);
    }

    #[test]
    fn test_last_occupant_leaving_head_vacates_it_immediately() {
        // Arrange
        let clock = FixedClock::at_noon();
        let mut chain = seven_room_chain();
        let player = PlayerHandle::new();
        chain.reset(Uuid::new_v4(), &clock);
        complete_spawns(&mut chain, &clock);
        chain
            .player_enters_house(player, Uuid::new_v4(), &clock)
            .unwrap();
        complete_spawns(&mut chain, &clock);
        let head_object = chain.room(0).unwrap().object;

        // Act
        chain
            .player_exited(0, player, Uuid::new_v4(), &clock)
            .unwrap();

        // Assert
        let recorded = kinds(&mut chain);
        let vacated: Vec<&RoomState> = recorded
            .iter()
            .filter_map(|kind| match kind {
                ChainEventKind::RoomVacated(payload) => Some(&payload.room),
                _ => None,
            })
            .collect();
        assert_eq!(vacated.len(), 1);
        assert_eq!(vacated[0].room_index, 0);
        assert_eq!(vacated[0].object, head_object);
        assert!(chain.room(0).is_none());
        assert_eq!(window_indices(&chain)[0], 1);
    }

    #[test]
    fn test_head_stays_until_every_occupant_has_left() {
        // Arrange
        let clock = FixedClock::at_noon();
        let mut chain = seven_room_chain();
        let first = PlayerHandle::new();
        let second = PlayerHandle::new();
        chain.reset(Uuid::new_v4(), &clock);
        complete_spawns(&mut chain, &clock);
        chain
            .player_enters_house(first, Uuid::new_v4(), &clock)
            .unwrap();
        chain
            .player_enters_house(second, Uuid::new_v4(), &clock)
            .unwrap();
        complete_spawns(&mut chain, &clock);

        // Act
        chain
            .player_exited(0, first, Uuid::new_v4(), &clock)
            .unwrap();
        let head_after_first = window_indices(&chain)[0];
        chain
            .player_exited(0, second, Uuid::new_v4(), &clock)
            .unwrap();

        // Assert
        assert_eq!(head_after_first, 0);
        assert_eq!(window_indices(&chain)[0], 1);
        assert_eq!(chain.room(1).unwrap().occupants(), &[first, second]);
    }

    #[test]
    fn test_second_exit_for_vacated_room_is_rejected() {
        // Arrange
        let clock = FixedClock::at_noon();
        let mut chain = seven_room_chain();
        let player = PlayerHandle::new();
        chain.reset(Uuid::new_v4(), &clock);
        complete_spawns(&mut chain, &clock);
        chain
            .player_enters_house(player, Uuid::new_v4(), &clock)
            .unwrap();
        complete_spawns(&mut chain, &clock);
        chain
            .player_exited(0, player, Uuid::new_v4(), &clock)
            .unwrap();
        chain.take_uncommitted_events();

        // Act
        let result = chain.player_exited(0, player, Uuid::new_v4(), &clock);

        // Assert
        assert!(matches!(result, Err(ChainError::RoomNotTracked(0))));
        assert!(chain.uncommitted_events().is_empty());
        assert_eq!(chain.room_of(player), Some(1));
    }

    #[test]
    fn test_exit_from_final_room_sends_player_to_exit_spawn_point() {
        // Arrange
        let clock = FixedClock::at_noon();
        let mut chain = seven_room_chain();
        let player = PlayerHandle::new();
        chain.reset(Uuid::new_v4(), &clock);
        complete_spawns(&mut chain, &clock);
        chain
            .player_enters_house(player, Uuid::new_v4(), &clock)
            .unwrap();
        complete_spawns(&mut chain, &clock);
        for room_index in 0..6 {
            chain
                .player_exited(room_index, player, Uuid::new_v4(), &clock)
                .unwrap();
            complete_spawns(&mut chain, &clock);
            assert_window_contiguous(&chain);
        }
        assert_eq!(chain.room_of(player), Some(6));

        // Act
        chain
            .player_exited(6, player, Uuid::new_v4(), &clock)
            .unwrap();

        // Assert
        let recorded = kinds(&mut chain);
        assert_eq!(
            teleports(&recorded),
            vec![PlayerTeleported {
                player,
                spawn_point: chain.layout().exit_spawn_point,
                room_index: None,
            }]
        );
        assert!(spawn_requests(&recorded).is_empty());
        assert_eq!(chain.room_of(player), None);
        assert_eq!(chain.window().count(), 0);
    }

    #[test]
    fn test_spawn_next_does_nothing_once_catalog_is_exhausted() {
        // Arrange
        let clock = FixedClock::at_noon();
        let mut chain = seven_room_chain();
        chain.reset(Uuid::new_v4(), &clock);
        while chain.spawn_next(Uuid::new_v4(), &clock).is_some() {}
        chain.take_uncommitted_events();
        let cursor = chain.placement_cursor();

        // Act
        let allocated = chain.spawn_next(Uuid::new_v4(), &clock);

        // Assert
        assert_eq!(allocated, None);
        assert_eq!(chain.next_catalog_index(), 7);
        assert_eq!(chain.placement_cursor(), cursor);
        assert!(chain.uncommitted_events().is_empty());
    }

    #[test]
    fn test_register_for_untracked_room_changes_nothing() {
        let clock = FixedClock::at_noon();
        let mut chain = seven_room_chain();
        chain.reset(Uuid::new_v4(), &clock);
        complete_spawns(&mut chain, &clock);

        let result = chain.register_room(5, SpawnPointHandle::new(), Uuid::new_v4(), &clock);

        assert!(matches!(result, Err(ChainError::RoomNotTracked(5))));
        assert!(chain.uncommitted_events().is_empty());
    }

    #[test]
    fn test_failed_spawn_index_is_skipped() {
        // Arrange
        let clock = FixedClock::at_noon();
        let mut chain = seven_room_chain();
        let player = PlayerHandle::new();
        chain.reset(Uuid::new_v4(), &clock);
        let requests = spawn_requests(&kinds(&mut chain));
        chain.room_spawned(&requests[0], ObjectHandle::new(), Uuid::new_v4(), &clock);
        chain
            .register_room(0, SpawnPointHandle::new(), Uuid::new_v4(), &clock)
            .unwrap();
        chain.room_spawn_failed(&requests[1], Uuid::new_v4(), &clock);
        chain.take_uncommitted_events();
        chain
            .player_enters_house(player, Uuid::new_v4(), &clock)
            .unwrap();
        complete_spawns(&mut chain, &clock);

        // Act
        chain
            .player_exited(0, player, Uuid::new_v4(), &clock)
            .unwrap();

        // Assert
        assert_eq!(chain.room_of(player), Some(2));
        assert_eq!(window_indices(&chain)[0], 2);
    }

    #[test]
    fn test_exit_while_successor_is_spawning_is_refused() {
        // Arrange
        let clock = FixedClock::at_noon();
        let mut chain = seven_room_chain();
        let player = PlayerHandle::new();
        chain.reset(Uuid::new_v4(), &clock);
        let requests = spawn_requests(&kinds(&mut chain));
        chain.room_spawned(&requests[0], ObjectHandle::new(), Uuid::new_v4(), &clock);
        chain
            .register_room(0, SpawnPointHandle::new(), Uuid::new_v4(), &clock)
            .unwrap();
        chain
            .player_enters_house(player, Uuid::new_v4(), &clock)
            .unwrap();
        chain.take_uncommitted_events();

        // Act
        let result = chain.player_exited(0, player, Uuid::new_v4(), &clock);

        // Assert
        assert!(matches!(
            result,
            Err(ChainError::SuccessorPending { room_index: 0 })
        ));
        assert!(chain.uncommitted_events().is_empty());
        assert_eq!(chain.room_of(player), Some(0));
    }

    #[test]
    fn test_exit_after_every_successor_failed_requests_another() {
        // Arrange
        let clock = FixedClock::at_noon();
        let mut chain = seven_room_chain();
        let player = PlayerHandle::new();
        chain.reset(Uuid::new_v4(), &clock);
        let requests = spawn_requests(&kinds(&mut chain));
        chain.room_spawned(&requests[0], ObjectHandle::new(), Uuid::new_v4(), &clock);
        chain
            .register_room(0, SpawnPointHandle::new(), Uuid::new_v4(), &clock)
            .unwrap();
        chain.room_spawn_failed(&requests[1], Uuid::new_v4(), &clock);
        chain
            .player_enters_house(player, Uuid::new_v4(), &clock)
            .unwrap();
        let look_ahead = spawn_requests(&kinds(&mut chain));
        chain.room_spawn_failed(&look_ahead[0], Uuid::new_v4(), &clock);
        chain.take_uncommitted_events();

        // Act
        let result = chain.player_exited(0, player, Uuid::new_v4(), &clock);

        // Assert
        assert!(matches!(
            result,
            Err(ChainError::SuccessorPending { room_index: 0 })
        ));
        let spawned: Vec<usize> = spawn_requests(&kinds(&mut chain))
            .iter()
            .map(|r| r.room_index)
            .collect();
        assert_eq!(spawned, vec![3]);
        assert_eq!(chain.room_of(player), Some(0));
    }

    #[test]
    fn test_reset_despawns_active_rooms_in_window_order() {
        // Arrange
        let clock = FixedClock::at_noon();
        let mut chain = seven_room_chain();
        chain.reset(Uuid::new_v4(), &clock);
        complete_spawns(&mut chain, &clock);

        // Act
        chain.reset(Uuid::new_v4(), &clock);

        // Assert
        let recorded = kinds(&mut chain);
        let despawned: Vec<usize> = recorded
            .iter()
            .filter_map(|kind| match kind {
                ChainEventKind::DespawnRequested(payload) => Some(payload.room.room_index),
                _ => None,
            })
            .collect();
        assert_eq!(despawned, vec![0, 1]);
        assert!(matches!(
            recorded[2],
            ChainEventKind::ChainReset(ChainReset { generation: 2 })
        ));
        assert_eq!(chain.window().count(), 0);
        assert_eq!(chain.next_catalog_index(), 2);
        assert_eq!(chain.placement_cursor(), Vec3::new(0.0, 0.0, 100.0));
    }

    #[test]
    fn test_spawn_from_earlier_run_is_discarded() {
        // Arrange
        let clock = FixedClock::at_noon();
        let mut chain = seven_room_chain();
        chain.reset(Uuid::new_v4(), &clock);
        let old_requests = spawn_requests(&kinds(&mut chain));
        chain.reset(Uuid::new_v4(), &clock);
        chain.take_uncommitted_events();
        let orphan = ObjectHandle::new();

        // Act
        chain.room_spawned(&old_requests[0], orphan, Uuid::new_v4(), &clock);

        // Assert
        let recorded = kinds(&mut chain);
        assert_eq!(
            recorded,
            vec![ChainEventKind::StaleRoomDiscarded(StaleRoomDiscarded {
                room: RoomState::new(0, orphan),
                generation: 1,
            })]
        );
        assert_eq!(chain.window().count(), 0);
        assert_eq!(chain.spawns_in_flight().collect::<Vec<_>>(), vec![0, 1]);
    }
}
