//! Scripted walkthrough: players enter the house together and keep leaving
//! their room until every one of them is back outside.

use std::sync::Arc;
use std::time::Duration;

use roomchain_core::error::ChainError;
use roomchain_core::event::SystemClock;
use roomchain_core::handles::{AssetRef, PlayerHandle, SpawnPointHandle};
use roomchain_rooms::application::manager::{
    RoomManagerConfig, RoomManagerHandle, spawn_room_manager,
};
use roomchain_rooms::application::query_handlers::ChainView;
use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::default_catalog;
use crate::config::SimConfig;
use crate::error::SimError;
use crate::notifier::LogNotifier;
use crate::world::{InMemoryWorld, PlayerLocation};

/// Polls per step before a move is considered refused.
const POLLS_PER_STEP: u32 = 20;

/// Steps a single player may take before the walkthrough gives up.
const MAX_STEPS_PER_ROOM: usize = 10;

/// What happened during a walkthrough.
#[derive(Debug, Clone, Serialize)]
pub struct WalkthroughReport {
    /// The simulated players.
    pub players: Vec<PlayerHandle>,
    /// Rooms each player stood in, in order, by asset.
    pub visits: Vec<Vec<AssetRef>>,
    /// Exit triggers fired, including refused ones.
    pub exits_triggered: usize,
    /// The chain after every vacated room has been despawned.
    pub final_view: ChainView,
    /// Rooms still alive in the world at the end.
    pub live_rooms: usize,
}

/// Runs a walkthrough of the default house.
///
/// # Errors
///
/// Returns `SimError::Chain` if the chain refuses a player or
/// `SimError::Stalled` if a player stops making progress.
pub async fn run_walkthrough(config: &SimConfig) -> Result<WalkthroughReport, SimError> {
    let catalog = default_catalog()?;
    let room_count = catalog.len();
    let world = Arc::new(
        InMemoryWorld::new(config.spawn_latency)
            .with_failing_assets(config.failing_assets.iter().cloned()),
    );
    let manager_config = RoomManagerConfig {
        spawn_offset: config.spawn_offset,
        grace_delay: config.grace_delay,
        popup_duration: config.popup_duration,
        ..RoomManagerConfig::new(SpawnPointHandle::new())
    };
    let manager = spawn_room_manager(
        catalog,
        &manager_config,
        world.clone(),
        Arc::new(LogNotifier),
        Arc::new(SystemClock),
    );
    let step = config.spawn_latency.max(Duration::from_millis(10));

    wait_for_first_room(&manager, step).await?;

    let players: Vec<PlayerHandle> = (0..config.players).map(|_| PlayerHandle::new()).collect();
    let mut visits = Vec::with_capacity(players.len());
    for player in &players {
        manager.player_enters_house(*player).await?;
        info!(%player, "player entered the house");
        visits.push(world.room_asset_of(*player).into_iter().collect::<Vec<_>>());
    }

    let mut exits_triggered = 0;
    let mut rounds = 0;
    loop {
        let inside: Vec<usize> = (0..players.len())
            .filter(|&i| matches!(world.locate(players[i]), Some(PlayerLocation::Room(_))))
            .collect();
        if inside.is_empty() {
            break;
        }
        rounds += 1;
        if rounds > room_count * MAX_STEPS_PER_ROOM {
            return Err(SimError::Stalled(format!(
                "{} players still inside after {} rounds",
                inside.len(),
                rounds - 1
            )));
        }

        for i in inside {
            let player = players[i];
            let before = world.locate(player);
            world.trigger_exit(player).map_err(ChainError::from)?;
            exits_triggered += 1;

            if wait_for_move(&world, player, before, step).await {
                if let Some(asset) = world.room_asset_of(player) {
                    info!(%player, room = %asset, "player moved");
                    visits[i].push(asset);
                } else {
                    info!(%player, "player left the house");
                }
            } else {
                warn!(%player, "exit refused, retrying next round");
            }
        }
    }

    // Let the last grace timers fire and their despawns run.
    let drain = config.grace_delay + step * u32::try_from(room_count + 2).unwrap_or(u32::MAX);
    tokio::time::sleep(drain).await;

    let final_view = manager.snapshot().await?;
    let live_rooms = world.live_rooms();
    info!(
        players = players.len(),
        exits_triggered,
        live_rooms,
        "walkthrough finished"
    );

    Ok(WalkthroughReport {
        players,
        visits,
        exits_triggered,
        final_view,
        live_rooms,
    })
}

async fn wait_for_first_room(manager: &RoomManagerHandle, step: Duration) -> Result<(), SimError> {
    for _ in 0..POLLS_PER_STEP * 4 {
        let view = manager.snapshot().await?;
        if view.room(0).is_some_and(|room| room.spawn_point.is_some()) {
            return Ok(());
        }
        if view.room(0).is_none() && view.spawns_in_flight.first() != Some(&0) {
            return Err(SimError::Stalled("the first room failed to spawn".to_owned()));
        }
        tokio::time::sleep(step).await;
    }
    Err(SimError::Stalled(
        "the first room never completed its handshake".to_owned(),
    ))
}

async fn wait_for_move(
    world: &InMemoryWorld,
    player: PlayerHandle,
    before: Option<PlayerLocation>,
    step: Duration,
) -> bool {
    let poll = step / POLLS_PER_STEP;
    for _ in 0..POLLS_PER_STEP {
        tokio::time::sleep(poll).await;
        if world.locate(player) != before {
            return true;
        }
    }
    false
}
