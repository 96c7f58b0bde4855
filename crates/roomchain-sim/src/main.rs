//! Room Chain simulator entry point.

use std::error::Error;

use roomchain_sim::config::SimConfig;
use roomchain_sim::walkthrough::run_walkthrough;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting room chain walkthrough");

    // Read configuration from environment.
    let config = SimConfig::from_env()?;
    tracing::info!(
        players = config.players,
        spawn_latency_ms = u64::try_from(config.spawn_latency.as_millis()).unwrap_or(u64::MAX),
        failing_assets = config.failing_assets.len(),
        "configuration loaded"
    );

    let report = run_walkthrough(&config).await?;

    let summary = serde_json::to_string(&report)?;
    tracing::info!(report = %summary, "walkthrough report");

    Ok(())
}
