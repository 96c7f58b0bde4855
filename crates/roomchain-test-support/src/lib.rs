//! Shared test doubles for the room chain orchestrator.

mod clock;
mod notifier;
mod world;

pub use clock::FixedClock;
pub use notifier::RecordingNotifier;
pub use world::{Completion, RecordingWorld, WorldCall};
