//! Room Chain simulator error types.

use roomchain_core::error::ChainError;
use thiserror::Error;

/// Startup and runtime errors for the simulator.
#[derive(Debug, Error)]
pub enum SimError {
    /// An environment variable is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The room chain refused an operation.
    #[error("room chain error: {0}")]
    Chain(#[from] ChainError),

    /// A simulated player stopped making progress.
    #[error("walkthrough stalled: {0}")]
    Stalled(String),
}
