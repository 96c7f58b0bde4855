//! The spawn queue and the worker that drains it.
//!
//! A single task owns the receiving end of the queue and awaits each world
//! call before taking the next op, so at most one spawn or despawn is ever
//! outstanding and ops complete in the order they were enqueued.

use std::sync::Arc;
use std::time::Duration;

use roomchain_core::error::{ChainError, WorldError};
use roomchain_core::handles::ObjectHandle;
use roomchain_core::world::{Notifier, WorldRuntime};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::domain::catalog::RoomCatalog;
use crate::domain::pending::{PendingOp, SpawnRequest};
use crate::domain::room::RoomState;

/// Outcome of one world mutation, reported back to the manager.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutorReport {
    /// The room was instantiated; `object` is its root.
    Spawned {
        /// The completed request.
        request: SpawnRequest,
        /// Root object of the new instance.
        object: ObjectHandle,
    },
    /// The world runtime failed the spawn.
    SpawnFailed {
        /// The failed request.
        request: SpawnRequest,
        /// Why it failed.
        error: WorldError,
    },
    /// The room was destroyed.
    Despawned {
        /// The destroyed room.
        room: RoomState,
    },
    /// The world runtime failed the despawn.
    DespawnFailed {
        /// The room that could not be destroyed.
        room: RoomState,
        /// Why it failed.
        error: WorldError,
    },
}

/// Sending side of the spawn queue.
#[derive(Debug, Clone)]
pub struct SpawnQueue {
    tx: mpsc::UnboundedSender<PendingOp>,
}

impl SpawnQueue {
    /// Appends `op` to the tail of the queue.
    ///
    /// # Errors
    ///
    /// Returns `ChainError::QueueClosed` if the worker has stopped.
    pub fn enqueue(&self, op: PendingOp) -> Result<(), ChainError> {
        debug!(
            kind = op.kind().as_str(),
            room_index = op.room_index(),
            "enqueueing world operation"
        );
        self.tx.send(op).map_err(|_| ChainError::QueueClosed)
    }
}

/// Performs queued spawns and despawns against the world runtime.
pub struct SpawnExecutor {
    world: Arc<dyn WorldRuntime>,
    notifier: Arc<dyn Notifier>,
    catalog: RoomCatalog,
    popup_duration: Duration,
}

impl SpawnExecutor {
    /// Creates an executor. `catalog` supplies room names for popups.
    #[must_use]
    pub fn new(
        world: Arc<dyn WorldRuntime>,
        notifier: Arc<dyn Notifier>,
        catalog: RoomCatalog,
        popup_duration: Duration,
    ) -> Self {
        Self {
            world,
            notifier,
            catalog,
            popup_duration,
        }
    }

    /// Starts the worker task and returns the queue feeding it. Every
    /// outcome is sent to `reports`.
    ///
    /// The worker stops once every `SpawnQueue` clone has been dropped and
    /// the remaining ops have run.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn start(self, reports: mpsc::UnboundedSender<ExecutorReport>) -> SpawnQueue {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(self.run(rx, reports));
        SpawnQueue { tx }
    }

    async fn run(
        self,
        mut queue: mpsc::UnboundedReceiver<PendingOp>,
        reports: mpsc::UnboundedSender<ExecutorReport>,
    ) {
        info!("spawn queue worker started");
        while let Some(op) = queue.recv().await {
            let report = self.execute(op).await;
            if reports.send(report).is_err() {
                debug!("room manager stopped, dropping executor report");
            }
        }
        info!("spawn queue closed, worker stopping");
    }

    /// Runs one op to completion and shows its outcome popup.
    #[instrument(skip_all, fields(kind = op.kind().as_str(), room_index = op.room_index()))]
    pub async fn execute(&self, op: PendingOp) -> ExecutorReport {
        match op {
            PendingOp::Spawn(request) => self.spawn(request).await,
            PendingOp::Despawn(room) => self.despawn(room).await,
        }
    }

    async fn spawn(&self, request: SpawnRequest) -> ExecutorReport {
        let name = request.definition.name.clone();
        self.popup(&format!("Spawning {name}"));

        let result = self
            .world
            .spawn_asset(
                &request.definition.asset,
                request.position,
                request.rotation,
            )
            .await
            .and_then(|objects| {
                objects
                    .first()
                    .copied()
                    .ok_or_else(|| WorldError::EmptySpawn(request.definition.asset.clone()))
            });

        match result {
            Ok(object) => {
                info!(%object, position = %request.position, "room spawned");
                self.popup(&format!("{name} spawned"));
                ExecutorReport::Spawned { request, object }
            }
            Err(error) => {
                warn!(%error, asset = %request.definition.asset, "room spawn failed");
                self.popup(&format!("Failed to spawn {name}"));
                ExecutorReport::SpawnFailed { request, error }
            }
        }
    }

    async fn despawn(&self, room: RoomState) -> ExecutorReport {
        let name = self.catalog.name_of(room.room_index).to_owned();

        match self.world.delete_asset(room.object, true).await {
            Ok(()) => {
                info!(object = %room.object, "room despawned");
                self.popup(&format!("{name} despawned"));
                ExecutorReport::Despawned { room }
            }
            Err(error) => {
                warn!(%error, object = %room.object, "room despawn failed");
                self.popup(&format!("Failed to despawn {name}"));
                ExecutorReport::DespawnFailed { room, error }
            }
        }
    }

    fn popup(&self, text: &str) {
        self.notifier
            .show_popup_for_everyone(text, self.popup_duration);
    }
}

#[cfg(test)]
mod tests {
    use roomchain_core::handles::AssetRef;
    use roomchain_core::math::{Rotation, Vec3};
    use roomchain_test_support::{Completion, RecordingNotifier, RecordingWorld};

    use super::*;
    use crate::domain::catalog::RoomDefinition;

    fn catalog() -> RoomCatalog {
        RoomCatalog::new(vec![
            RoomDefinition::new("Dining Room", AssetRef::new("rooms/dining_room")),
            RoomDefinition::new("Zig Zag Hallway", AssetRef::new("rooms/zig_zag_hallway")),
            RoomDefinition::new("Bathroom", AssetRef::new("rooms/bathroom")),
        ])
        .unwrap()
    }

    fn spawn_op(room_index: usize) -> PendingOp {
        let definition = catalog().get(room_index).unwrap().clone();
        PendingOp::Spawn(SpawnRequest {
            generation: 1,
            room_index,
            definition,
            position: Vec3::new(0.0, 0.0, 50.0),
            rotation: Rotation::IDENTITY,
        })
    }

    fn new_executor(world: &Arc<RecordingWorld>, notifier: &Arc<RecordingNotifier>) -> SpawnExecutor {
        SpawnExecutor::new(
            world.clone(),
            notifier.clone(),
            catalog(),
            Duration::from_secs(3),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_ops_run_one_at_a_time_in_enqueue_order() {
        // Arrange
        let world = Arc::new(
            RecordingWorld::new()
                .with_latency(Duration::from_millis(10))
                .with_asset_latency(
                    AssetRef::new("rooms/dining_room"),
                    Duration::from_millis(500),
                ),
        );
        let notifier = Arc::new(RecordingNotifier::new());
        let (report_tx, mut reports) = mpsc::unbounded_channel();
        let queue = new_executor(&world, &notifier).start(report_tx);

        // Act
        queue.enqueue(spawn_op(0)).unwrap();
        queue.enqueue(spawn_op(1)).unwrap();
        queue.enqueue(spawn_op(2)).unwrap();
        let mut indices = Vec::new();
        for _ in 0..3 {
            match reports.recv().await.unwrap() {
                ExecutorReport::Spawned { request, .. } => indices.push(request.room_index),
                other => panic!("expected Spawned, got {other:?}"),
            }
        }

        // Assert
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(world.max_in_flight(), 1);
        let completed: Vec<AssetRef> = world
            .completions()
            .into_iter()
            .map(|completion| match completion {
                Completion::Spawned(asset, _) => asset,
                other => panic!("expected Spawned, got {other:?}"),
            })
            .collect();
        assert_eq!(completed, world.spawned_assets());
    }

    #[tokio::test(start_paused = true)]
    async fn test_despawn_waits_for_earlier_spawn() {
        // Arrange
        let world = Arc::new(RecordingWorld::new().with_latency(Duration::from_millis(200)));
        let notifier = Arc::new(RecordingNotifier::new());
        let (report_tx, mut reports) = mpsc::unbounded_channel();
        let queue = new_executor(&world, &notifier).start(report_tx);
        queue.enqueue(spawn_op(0)).unwrap();
        let ExecutorReport::Spawned { object, .. } = reports.recv().await.unwrap() else {
            panic!("expected the first spawn to succeed");
        };

        // Act
        queue.enqueue(spawn_op(1)).unwrap();
        queue
            .enqueue(PendingOp::Despawn(RoomState::new(0, object)))
            .unwrap();
        let second = reports.recv().await.unwrap();
        let third = reports.recv().await.unwrap();

        // Assert
        assert!(matches!(second, ExecutorReport::Spawned { .. }));
        assert_eq!(
            third,
            ExecutorReport::Despawned {
                room: RoomState::new(0, object)
            }
        );
        assert_eq!(world.max_in_flight(), 1);
        assert_eq!(world.deleted_objects(), vec![object]);
    }

    #[tokio::test]
    async fn test_spawn_popups_name_the_room() {
        // Arrange
        let world = Arc::new(RecordingWorld::new());
        let notifier = Arc::new(RecordingNotifier::new());

        // Act
        let report = new_executor(&world, &notifier).execute(spawn_op(2)).await;

        // Assert
        assert!(matches!(report, ExecutorReport::Spawned { .. }));
        assert_eq!(
            notifier.popups_with_duration(),
            vec![
                ("Spawning Bathroom".to_owned(), Duration::from_secs(3)),
                ("Bathroom spawned".to_owned(), Duration::from_secs(3)),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_spawn_is_reported_and_announced() {
        // Arrange
        let world = Arc::new(
            RecordingWorld::new().failing_spawn(AssetRef::new("rooms/zig_zag_hallway")),
        );
        let notifier = Arc::new(RecordingNotifier::new());

        // Act
        let report = new_executor(&world, &notifier).execute(spawn_op(1)).await;

        // Assert
        assert!(matches!(
            report,
            ExecutorReport::SpawnFailed {
                error: WorldError::Rejected(_),
                ..
            }
        ));
        assert_eq!(
            notifier.popups(),
            vec!["Spawning Zig Zag Hallway", "Failed to spawn Zig Zag Hallway"]
        );
    }

    #[tokio::test]
    async fn test_duplicate_despawn_fails_cleanly() {
        // Arrange
        let world = Arc::new(RecordingWorld::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let executor = new_executor(&world, &notifier);
        let ExecutorReport::Spawned { object, .. } = executor.execute(spawn_op(0)).await else {
            panic!("expected the spawn to succeed");
        };
        let room = RoomState::new(0, object);
        executor.execute(PendingOp::Despawn(room.clone())).await;

        // Act
        let report = executor.execute(PendingOp::Despawn(room.clone())).await;

        // Assert
        assert_eq!(
            report,
            ExecutorReport::DespawnFailed {
                room,
                error: WorldError::UnknownObject(object),
            }
        );
        assert_eq!(
            notifier.popups(),
            vec![
                "Spawning Dining Room",
                "Dining Room spawned",
                "Dining Room despawned",
                "Failed to despawn Dining Room",
            ]
        );
        assert!(world.calls().iter().all(|call| !matches!(
            call,
            roomchain_test_support::WorldCall::Delete {
                full_delete: false,
                ..
            }
        )));
    }
}
