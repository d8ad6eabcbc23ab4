//! Ship subsystem and combat core for Planetz.
//!
//! Owns the hecs ECS world and the physics world, runs the per-frame
//! pipeline (ship update, physics, collision dispatch, combat, discovery,
//! target refresh) and produces `GameStateSnapshot`s for the frontend.

pub mod combat;
pub mod components;
pub mod engine;
pub mod sector_db;
pub mod ship;
pub mod star_charts;
pub mod system;
pub mod systems;
pub mod targeting;
pub mod weapons;
pub mod world_setup;

pub use engine::SimulationEngine;
pub use planetz_core as core;
pub use planetz_physics as physics;
