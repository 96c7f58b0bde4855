//! The room manager actor.
//!
//! One task owns the `RoomChain` and handles a single message at a time from
//! three mailboxes: executor reports, notices from rooms, and commands from
//! `RoomManagerHandle`. After each message it performs the effects of the
//! events the chain recorded.

use std::sync::Arc;
use std::time::Duration;

use roomchain_core::aggregate::{AggregateRoot, Command};
use roomchain_core::error::ChainError;
use roomchain_core::event::{Clock, DomainEvent};
use roomchain_core::handles::{ObjectHandle, PlayerHandle, SpawnPointHandle};
use roomchain_core::math::{Rotation, Vec3};
use roomchain_core::protocol::{ManagerHandle, ManagerNotice, RoomMessage};
use roomchain_core::world::{Notifier, WorldRuntime};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::application::command_handlers::{
    handle_enter_house, handle_exit_room, handle_register_room, handle_reset,
    handle_spawn_outcome,
};
use crate::application::executor::{ExecutorReport, SpawnExecutor, SpawnQueue};
use crate::application::query_handlers::{ChainView, view_chain};
use crate::domain::aggregates::{
    ChainLayout, DEFAULT_SPAWN_OFFSET, DEFAULT_SPAWN_ROTATION, RoomChain,
};
use crate::domain::catalog::RoomCatalog;
use crate::domain::commands::{EnterHouse, ExitRoom, RegisterRoom, ResetChain};
use crate::domain::events::{ChainEvent, ChainEventKind};
use crate::domain::pending::PendingOp;
use crate::domain::room::RoomState;

/// Wait between a head room being vacated and its despawn being queued.
pub const DEFAULT_GRACE_DELAY: Duration = Duration::from_secs(3);

/// How long spawn/despawn popups stay on screen.
pub const DEFAULT_POPUP_DURATION: Duration = Duration::from_secs(3);

/// Configuration for a room manager.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomManagerConfig {
    /// Position of room 0.
    pub initial_position: Vec3,
    /// Added to the placement cursor after each spawn request.
    pub spawn_offset: Vec3,
    /// Rotation given to every room.
    pub spawn_rotation: Rotation,
    /// Where players go after leaving the final room.
    pub exit_spawn_point: SpawnPointHandle,
    /// Delay before a vacated head room is despawned.
    pub grace_delay: Duration,
    /// Popup display time.
    pub popup_duration: Duration,
    /// Whether the manager resets the chain as soon as it starts.
    pub reset_on_start: bool,
}

impl RoomManagerConfig {
    /// Creates a configuration with default placement and timings.
    #[must_use]
    pub fn new(exit_spawn_point: SpawnPointHandle) -> Self {
        Self {
            initial_position: Vec3::ZERO,
            spawn_offset: DEFAULT_SPAWN_OFFSET,
            spawn_rotation: DEFAULT_SPAWN_ROTATION,
            exit_spawn_point,
            grace_delay: DEFAULT_GRACE_DELAY,
            popup_duration: DEFAULT_POPUP_DURATION,
            reset_on_start: true,
        }
    }

    fn layout(&self) -> ChainLayout {
        ChainLayout {
            initial_position: self.initial_position,
            spawn_offset: self.spawn_offset,
            spawn_rotation: self.spawn_rotation,
            exit_spawn_point: self.exit_spawn_point,
        }
    }
}

#[derive(Debug)]
enum ManagerCommand {
    Reset {
        command: ResetChain,
        reply: oneshot::Sender<()>,
    },
    EnterHouse {
        command: EnterHouse,
        reply: oneshot::Sender<Result<(), ChainError>>,
    },
    Snapshot {
        reply: oneshot::Sender<ChainView>,
    },
}

/// Cloneable handle to a running room manager.
///
/// The manager stops once every handle has been dropped.
#[derive(Debug, Clone)]
pub struct RoomManagerHandle {
    commands: mpsc::UnboundedSender<ManagerCommand>,
    notices: ManagerHandle,
}

impl RoomManagerHandle {
    /// Despawns every active room and starts a new run.
    ///
    /// # Errors
    ///
    /// Returns `ChainError::ManagerUnavailable` if the manager has stopped.
    pub async fn reset(&self) -> Result<(), ChainError> {
        let (reply, response) = oneshot::channel();
        self.send(ManagerCommand::Reset {
            command: ResetChain {
                correlation_id: Uuid::new_v4(),
            },
            reply,
        })?;
        response.await.map_err(|_| ChainError::ManagerUnavailable)
    }

    /// Moves `player` into the first room.
    ///
    /// # Errors
    ///
    /// Returns `ChainError::InitialRoomMissing` if room 0 is not active, or
    /// `ChainError::ManagerUnavailable` if the manager has stopped.
    pub async fn player_enters_house(&self, player: PlayerHandle) -> Result<(), ChainError> {
        let (reply, response) = oneshot::channel();
        self.send(ManagerCommand::EnterHouse {
            command: EnterHouse {
                correlation_id: Uuid::new_v4(),
                player,
            },
            reply,
        })?;
        response.await.map_err(|_| ChainError::ManagerUnavailable)?
    }

    /// Returns a view of the chain as the manager currently sees it.
    ///
    /// # Errors
    ///
    /// Returns `ChainError::ManagerUnavailable` if the manager has stopped.
    pub async fn snapshot(&self) -> Result<ChainView, ChainError> {
        let (reply, response) = oneshot::channel();
        self.send(ManagerCommand::Snapshot { reply })?;
        response.await.map_err(|_| ChainError::ManagerUnavailable)
    }

    /// The address rooms use to reach this manager.
    #[must_use]
    pub fn notices(&self) -> ManagerHandle {
        self.notices.clone()
    }

    fn send(&self, command: ManagerCommand) -> Result<(), ChainError> {
        self.commands
            .send(command)
            .map_err(|_| ChainError::ManagerUnavailable)
    }
}

/// Starts a room manager and its spawn queue worker.
///
/// # Panics
///
/// Panics if called outside a Tokio runtime.
#[must_use]
pub fn spawn_room_manager(
    catalog: RoomCatalog,
    config: &RoomManagerConfig,
    world: Arc<dyn WorldRuntime>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
) -> RoomManagerHandle {
    let (report_tx, reports) = mpsc::unbounded_channel();
    let queue = SpawnExecutor::new(
        world.clone(),
        notifier,
        catalog.clone(),
        config.popup_duration,
    )
    .start(report_tx);

    let (notice_tx, notices) = mpsc::unbounded_channel();
    let address = ManagerHandle::new(notice_tx);
    let (command_tx, commands) = mpsc::unbounded_channel();

    let mut manager = RoomManager {
        chain: RoomChain::new(Uuid::new_v4(), catalog, config.layout()),
        queue,
        world,
        clock,
        address: address.clone(),
        grace_delay: config.grace_delay,
    };
    info!(
        chain_id = %manager.chain.id,
        rooms = manager.chain.catalog().len(),
        "room manager starting"
    );
    if config.reset_on_start {
        manager.reset(&ResetChain {
            correlation_id: Uuid::new_v4(),
        });
    }
    tokio::spawn(manager.run(reports, notices, commands));

    RoomManagerHandle {
        commands: command_tx,
        notices: address,
    }
}

struct RoomManager {
    chain: RoomChain,
    queue: SpawnQueue,
    world: Arc<dyn WorldRuntime>,
    clock: Arc<dyn Clock>,
    address: ManagerHandle,
    grace_delay: Duration,
}

impl RoomManager {
    async fn run(
        mut self,
        mut reports: mpsc::UnboundedReceiver<ExecutorReport>,
        mut notices: mpsc::UnboundedReceiver<ManagerNotice>,
        mut commands: mpsc::UnboundedReceiver<ManagerCommand>,
    ) {
        loop {
            tokio::select! {
                biased;
                Some(report) = reports.recv() => self.on_report(&report),
                Some(notice) = notices.recv() => self.on_notice(&notice),
                command = commands.recv() => match command {
                    Some(command) => self.on_command(command),
                    None => break,
                },
            }
        }
        info!(chain_id = %self.chain.id, "room manager stopped");
    }

    fn on_report(&mut self, report: &ExecutorReport) {
        let events = handle_spawn_outcome(report, &mut self.chain, self.clock.as_ref());
        self.perform(events);
    }

    fn on_notice(&mut self, notice: &ManagerNotice) {
        match *notice {
            ManagerNotice::RegisterRoom {
                room_index,
                spawn_point,
            } => self.register_room(&RegisterRoom {
                correlation_id: Uuid::new_v4(),
                room_index,
                spawn_point,
            }),
            ManagerNotice::PlayerExited { room_index, player } => self.exit_room(&ExitRoom {
                correlation_id: Uuid::new_v4(),
                room_index,
                player,
            }),
        }
    }

    fn on_command(&mut self, command: ManagerCommand) {
        match command {
            ManagerCommand::Reset { command, reply } => {
                self.reset(&command);
                let _ = reply.send(());
            }
            ManagerCommand::EnterHouse { command, reply } => {
                let result = self.enter_house(&command);
                let _ = reply.send(result);
            }
            ManagerCommand::Snapshot { reply } => {
                let _ = reply.send(view_chain(&self.chain));
            }
        }
    }

    #[instrument(skip_all, fields(
        command_type = command.command_type(),
        correlation_id = %command.correlation_id(),
    ))]
    fn reset(&mut self, command: &ResetChain) {
        let events = handle_reset(command, &mut self.chain, self.clock.as_ref());
        info!(generation = self.chain.generation(), "room chain reset");
        self.perform(events);
    }

    #[instrument(skip_all, fields(
        command_type = command.command_type(),
        correlation_id = %command.correlation_id(),
        player = %command.player,
    ))]
    fn enter_house(&mut self, command: &EnterHouse) -> Result<(), ChainError> {
        match handle_enter_house(command, &mut self.chain, self.clock.as_ref()) {
            Ok(events) => {
                info!("player entered the house");
                self.perform(events);
                Ok(())
            }
            Err(err) => {
                error!(error = %err, "player could not enter the house");
                Err(err)
            }
        }
    }

    #[instrument(skip_all, fields(
        command_type = command.command_type(),
        correlation_id = %command.correlation_id(),
        room_index = command.room_index,
        player = %command.player,
    ))]
    fn exit_room(&mut self, command: &ExitRoom) {
        match handle_exit_room(command, &mut self.chain, self.clock.as_ref()) {
            Ok(events) => self.perform(events),
            Err(err @ ChainError::SuccessorPending { .. }) => {
                warn!(error = %err, "exit refused, player stays in the room");
            }
            Err(err) => error!(error = %err, "exit for a room no longer tracked, dropped"),
        }
        let leftover = self.chain.take_uncommitted_events();
        self.perform(leftover);
    }

    #[instrument(skip_all, fields(
        command_type = command.command_type(),
        correlation_id = %command.correlation_id(),
        room_index = command.room_index,
    ))]
    fn register_room(&mut self, command: &RegisterRoom) {
        match handle_register_room(command, &mut self.chain, self.clock.as_ref()) {
            Ok(events) => {
                debug!(spawn_point = %command.spawn_point, "room registered");
                self.perform(events);
            }
            Err(err) => warn!(error = %err, "handshake for a room no longer tracked, dropped"),
        }
    }

    fn perform(&self, events: Vec<ChainEvent>) {
        for event in events {
            match event.to_payload() {
                Ok(payload) => debug!(
                    event_type = event.event_type(),
                    sequence_number = event.metadata().sequence_number,
                    %payload,
                    "performing chain event"
                ),
                Err(err) => warn!(
                    event_type = event.event_type(),
                    sequence_number = event.metadata().sequence_number,
                    error = %err,
                    "performing chain event with unserializable payload"
                ),
            }
            match event.kind {
                ChainEventKind::SpawnRequested(payload) => {
                    self.enqueue(PendingOp::Spawn(payload.request));
                }
                ChainEventKind::DespawnRequested(payload) => {
                    self.enqueue(PendingOp::Despawn(payload.room));
                }
                ChainEventKind::StaleRoomDiscarded(payload) => {
                    self.enqueue(PendingOp::Despawn(payload.room));
                }
                ChainEventKind::RoomVacated(payload) => self.schedule_despawn(payload.room),
                ChainEventKind::RoomActivated(payload) => {
                    self.bind_room(payload.room_index, payload.object);
                }
                ChainEventKind::PlayerTeleported(payload) => {
                    self.world.teleport(payload.player, payload.spawn_point);
                }
                ChainEventKind::ChainReset(_)
                | ChainEventKind::RoomSpawnFailed(_)
                | ChainEventKind::SpawnPointRegistered(_)
                | ChainEventKind::PlayerEnteredRoom(_)
                | ChainEventKind::PlayerLeftRoom(_) => {}
            }
        }
    }

    fn enqueue(&self, op: PendingOp) {
        if let Err(err) = self.queue.enqueue(op) {
            error!(error = %err, "could not enqueue world operation");
        }
    }

    fn bind_room(&self, room_index: usize, object: ObjectHandle) {
        let message = RoomMessage::RegisterManager {
            manager: self.address.clone(),
            room_index,
        };
        if let Err(err) = self.world.send_to_room(object, message) {
            warn!(error = %err, room_index, %object, "could not send RegisterManager");
        }
    }

    fn schedule_despawn(&self, room: RoomState) {
        info!(
            room_index = room.room_index,
            grace_delay_ms = u64::try_from(self.grace_delay.as_millis()).unwrap_or(u64::MAX),
            "room vacated, despawn scheduled"
        );
        let queue = self.queue.clone();
        let delay = self.grace_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(err) = queue.enqueue(PendingOp::Despawn(room)) {
                error!(error = %err, "could not enqueue delayed despawn");
            }
        });
    }
}
