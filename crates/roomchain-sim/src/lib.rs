//! Room Chain simulator.
//!
//! Hosts the room chain on an in-memory world whose rooms run real room
//! proxies, and walks simulated players through the house.

pub mod catalog;
pub mod config;
pub mod error;
pub mod notifier;
pub mod walkthrough;
pub mod world;
