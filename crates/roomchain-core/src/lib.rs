//! Room Chain Core: shared abstractions.
//!
//! This crate defines the handles, protocol messages, ports, and domain
//! primitives that the room chain depends on. It contains no runtime
//! orchestration code.

pub mod aggregate;
pub mod error;
pub mod event;
pub mod handles;
pub mod math;
pub mod protocol;
pub mod world;
