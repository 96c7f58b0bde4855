//! Room Chain: the room orchestration bounded context.
//!
//! Responsible for the active room window, look-ahead spawning, the
//! serialized spawn/despawn queue, player occupancy, and the handshake that
//! binds a spawned room instance to its manager.

pub mod application;
pub mod domain;
