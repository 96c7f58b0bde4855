//! Domain layer for the room chain context.

pub mod aggregates;
pub mod catalog;
pub mod commands;
pub mod events;
pub mod pending;
pub mod proxy;
pub mod room;
