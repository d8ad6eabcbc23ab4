//! Core types and definitions for the Planetz ship and combat simulation.
//!
//! This crate defines the vocabulary shared across the other crates:
//! cards and the card catalog, commands, events, state snapshots,
//! configuration, errors and constants. Pure data and lookups: no ECS,
//! no physics and no frontend framework; only serde, serde_json, glam and toml.

pub mod cards;
pub mod commands;
pub mod config;
pub mod constants;
pub mod enums;
pub mod error;
pub mod events;
pub mod state;
pub mod types;

pub use error::{PlanetzError, PlanetzResult};

#[cfg(test)]
mod tests;
