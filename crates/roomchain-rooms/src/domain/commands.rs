//! Commands for the room chain context.

use roomchain_core::aggregate::Command;
use roomchain_core::handles::{PlayerHandle, SpawnPointHandle};
use uuid::Uuid;

/// Command to start a new run of the chain.
#[derive(Debug, Clone)]
pub struct ResetChain {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
}

/// Command to move a player from outside into the first room.
#[derive(Debug, Clone)]
pub struct EnterHouse {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The arriving player.
    pub player: PlayerHandle,
}

/// Command raised when a player walks through a room's exit trigger.
#[derive(Debug, Clone)]
pub struct ExitRoom {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The room the player left.
    pub room_index: usize,
    /// The player.
    pub player: PlayerHandle,
}

/// Command raised when a room answers the handshake.
#[derive(Debug, Clone)]
pub struct RegisterRoom {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The registering room.
    pub room_index: usize,
    /// Its entry point.
    pub spawn_point: SpawnPointHandle,
}

impl Command for ResetChain {
    fn command_type(&self) -> &'static str {
        "room_chain.reset_chain"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

impl Command for EnterHouse {
    fn command_type(&self) -> &'static str {
        "room_chain.enter_house"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

impl Command for ExitRoom {
    fn command_type(&self) -> &'static str {
        "room_chain.exit_room"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

impl Command for RegisterRoom {
    fn command_type(&self) -> &'static str {
        "room_chain.register_room"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
