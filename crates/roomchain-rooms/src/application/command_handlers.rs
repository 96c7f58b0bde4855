//! Command handlers for the room chain context.
//!
//! Each handler runs one aggregate operation and returns the events it
//! recorded. Performing their effects is left to the caller.

use roomchain_core::aggregate::AggregateRoot;
use roomchain_core::error::ChainError;
use roomchain_core::event::Clock;
use uuid::Uuid;

use crate::application::executor::ExecutorReport;
use crate::domain::aggregates::RoomChain;
use crate::domain::commands::{EnterHouse, ExitRoom, RegisterRoom, ResetChain};
use crate::domain::events::ChainEvent;

/// Handles the `ResetChain` command.
pub fn handle_reset(
    command: &ResetChain,
    chain: &mut RoomChain,
    clock: &dyn Clock,
) -> Vec<ChainEvent> {
    chain.reset(command.correlation_id, clock);
    chain.take_uncommitted_events()
}

/// Handles the `EnterHouse` command.
///
/// # Errors
///
/// Returns `ChainError::InitialRoomMissing` if room 0 is not the window head.
pub fn handle_enter_house(
    command: &EnterHouse,
    chain: &mut RoomChain,
    clock: &dyn Clock,
) -> Result<Vec<ChainEvent>, ChainError> {
    chain.player_enters_house(command.player, command.correlation_id, clock)?;
    Ok(chain.take_uncommitted_events())
}

/// Handles the `ExitRoom` command.
///
/// # Errors
///
/// Returns `ChainError::RoomNotTracked` or `ChainError::SuccessorPending`.
/// A refused exit may still have requested a replacement spawn; those events
/// stay on the aggregate until its next drain.
pub fn handle_exit_room(
    command: &ExitRoom,
    chain: &mut RoomChain,
    clock: &dyn Clock,
) -> Result<Vec<ChainEvent>, ChainError> {
    chain.player_exited(
        command.room_index,
        command.player,
        command.correlation_id,
        clock,
    )?;
    Ok(chain.take_uncommitted_events())
}

/// Handles the `RegisterRoom` command.
///
/// # Errors
///
/// Returns `ChainError::RoomNotTracked` if the room is no longer active.
pub fn handle_register_room(
    command: &RegisterRoom,
    chain: &mut RoomChain,
    clock: &dyn Clock,
) -> Result<Vec<ChainEvent>, ChainError> {
    chain.register_room(
        command.room_index,
        command.spawn_point,
        command.correlation_id,
        clock,
    )?;
    Ok(chain.take_uncommitted_events())
}

/// Applies an executor report to the chain. Despawn outcomes do not change
/// the chain; the room left the window when its despawn was requested.
pub fn handle_spawn_outcome(
    report: &ExecutorReport,
    chain: &mut RoomChain,
    clock: &dyn Clock,
) -> Vec<ChainEvent> {
    let correlation_id = Uuid::new_v4();
    match report {
        ExecutorReport::Spawned { request, object } => {
            chain.room_spawned(request, *object, correlation_id, clock);
        }
        ExecutorReport::SpawnFailed { request, .. } => {
            chain.room_spawn_failed(request, correlation_id, clock);
        }
        ExecutorReport::Despawned { .. } | ExecutorReport::DespawnFailed { .. } => {}
    }
    chain.take_uncommitted_events()
}
