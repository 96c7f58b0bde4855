//! Error types for the room chain.
//!
//! None of these are fatal. The orchestrator reports every error through
//! the log and carries on with its next message.

use thiserror::Error;

use crate::handles::{AssetRef, ObjectHandle};

/// Failures reported by the host world runtime.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorldError {
    /// The runtime refused or failed the operation.
    #[error("world runtime rejected the operation: {0}")]
    Rejected(String),

    /// The object does not exist (never spawned, or already deleted).
    #[error("unknown world object {0}")]
    UnknownObject(ObjectHandle),

    /// A spawn resolved without producing any object.
    #[error("spawning {0} produced no objects")]
    EmptySpawn(AssetRef),
}

/// Top-level room chain error type.
#[derive(Debug, Error)]
pub enum ChainError {
    /// A message referenced a room index that is not in the active window.
    #[error("room {0} is not in the active window")]
    RoomNotTracked(usize),

    /// A player arrived at the house while the first room was not the window head.
    #[error("initial room not found (window head is {head:?})")]
    InitialRoomMissing {
        /// Index at the window head, if any room is active.
        head: Option<usize>,
    },

    /// The room after `room_index` has been requested but is not active yet.
    #[error("room after {room_index} is still being spawned")]
    SuccessorPending {
        /// The room the player tried to leave.
        room_index: usize,
    },

    /// A room proxy received an exit before being bound to a manager.
    #[error("room has no manager")]
    ManagerNotBound,

    /// The manager's mailbox is closed.
    #[error("room manager is no longer running")]
    ManagerUnavailable,

    /// The spawn queue worker has stopped.
    #[error("spawn queue is closed")]
    QueueClosed,

    /// An operation against the world runtime failed.
    #[error(transparent)]
    World(#[from] WorldError),

    /// A validation error in domain logic or configuration.
    #[error("validation error: {0}")]
    Validation(String),
}
