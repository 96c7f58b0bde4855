//! Runs a `RoomProxy` as an independent task inside a room instance.

use roomchain_core::error::{ChainError, WorldError};
use roomchain_core::handles::{ObjectHandle, PlayerHandle, SpawnPointHandle};
use roomchain_core::protocol::RoomMessage;
use tokio::sync::mpsc;
use tracing::{debug, error, instrument, warn};

use crate::domain::proxy::RoomProxy;

/// Input delivered to a running room.
#[derive(Debug, Clone)]
pub enum RoomInput {
    /// A protocol message from the manager.
    Message(RoomMessage),
    /// The room's exit trigger fired for a player.
    ExitTriggered(PlayerHandle),
}

/// Address of a running room proxy.
#[derive(Debug, Clone)]
pub struct RoomProxyHandle {
    object: ObjectHandle,
    tx: mpsc::UnboundedSender<RoomInput>,
}

impl RoomProxyHandle {
    /// The room instance this proxy runs in.
    #[must_use]
    pub fn object(&self) -> ObjectHandle {
        self.object
    }

    /// Delivers a protocol message.
    ///
    /// # Errors
    ///
    /// Returns `WorldError::UnknownObject` if the room has been torn down.
    pub fn deliver(&self, message: RoomMessage) -> Result<(), WorldError> {
        self.send(RoomInput::Message(message))
    }

    /// Fires the room's exit trigger for `player`.
    ///
    /// # Errors
    ///
    /// Returns `WorldError::UnknownObject` if the room has been torn down.
    pub fn trigger_exit(&self, player: PlayerHandle) -> Result<(), WorldError> {
        self.send(RoomInput::ExitTriggered(player))
    }

    fn send(&self, input: RoomInput) -> Result<(), WorldError> {
        self.tx
            .send(input)
            .map_err(|_| WorldError::UnknownObject(self.object))
    }
}

/// Starts the proxy for room instance `object`, whose entry point is
/// `spawn_point`. The task ends when every handle has been dropped.
///
/// # Panics
///
/// Panics if called outside a Tokio runtime.
#[must_use]
pub fn spawn_room_proxy(object: ObjectHandle, spawn_point: SpawnPointHandle) -> RoomProxyHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(run_room_proxy(object, RoomProxy::new(spawn_point), rx));
    RoomProxyHandle { object, tx }
}

#[instrument(skip(proxy, inbox), fields(%object))]
async fn run_room_proxy(
    object: ObjectHandle,
    mut proxy: RoomProxy,
    mut inbox: mpsc::UnboundedReceiver<RoomInput>,
) {
    while let Some(input) = inbox.recv().await {
        match input {
            RoomInput::Message(RoomMessage::RegisterManager {
                manager,
                room_index,
            }) => match proxy.on_register_manager(manager, room_index) {
                Ok(()) => debug!(room_index, "room bound to manager"),
                Err(err) => warn!(error = %err, room_index, "could not answer RegisterManager"),
            },
            RoomInput::ExitTriggered(player) => match proxy.on_exit_trigger(player) {
                Ok(()) => debug!(%player, room_index = ?proxy.room_index(), "exit reported"),
                Err(ChainError::ManagerNotBound) => {
                    error!(%player, "room has no manager, exit dropped");
                }
                Err(err) => warn!(error = %err, %player, "could not report exit"),
            },
        }
    }
    debug!("room proxy stopped");
}
