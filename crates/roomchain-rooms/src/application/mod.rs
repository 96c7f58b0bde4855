//! Application layer for the room chain context.

pub mod command_handlers;
pub mod executor;
pub mod manager;
pub mod proxy;
pub mod query_handlers;
