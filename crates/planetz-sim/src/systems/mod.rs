//! Per-tick systems operating on the simulation world.
//!
//! Systems are free functions over `&mut World` plus whatever engine-owned
//! state they need. They keep no state of their own.

pub mod cleanup;
pub mod energy;
pub mod movement;
pub mod projectiles;
pub mod snapshot;
pub mod targets;
