//! Zero-gravity rigid-body world for Planetz.
//!
//! Bodies live in a generational arena; the simulation layer refers to them
//! by `BodyHandle` and attaches a `BodyMetadata` record to each. Stepping is
//! sub-divided at a fixed interior rate, fast projectiles use swept-sphere
//! CCD, and projectile hits are dispatched once per pair with a cooldown.

pub mod arena;
pub mod body;
pub mod collision;
pub mod geometry;
pub mod raycast;
pub mod world;

pub use arena::BodyHandle;
pub use body::{BodyConfig, BodyMetadata, GraphicsRef, ProjectileInfo, RigidBody, Shape};
pub use collision::CollisionEvent;
pub use raycast::{RayFilter, RaycastHit, RaycastOutcome};
pub use world::{PhysicsWorld, StepOutput, GRAVITY};

#[cfg(test)]
mod tests;
