//! ECS components for hecs entities.
//!
//! Components are plain data. Ships carry the `Ship` aggregate itself as a
//! component; everything with a physics presence carries a `PhysicsBody`.

use glam::DVec3;

use planetz_core::enums::{DamageType, EntityKind, Faction};
use planetz_physics::BodyHandle;

/// Marks the player's ship.
#[derive(Debug, Clone, Copy)]
pub struct PlayerShip;

/// Sector-scoped identity shared by every targetable entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub kind: EntityKind,
    pub faction: Faction,
}

/// Link to the entity's rigid body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicsBody(pub BodyHandle);

/// Static world furniture loaded from the object database.
#[derive(Debug, Clone, Copy)]
pub struct Celestial {
    pub radius_km: f64,
}

/// A live projectile.
#[derive(Debug, Clone)]
pub struct Projectile {
    pub weapon: String,
    pub damage: f64,
    pub damage_type: DamageType,
    pub owner: hecs::Entity,
    pub spawn_time: f64,
    pub spawn_position: DVec3,
    pub max_lifetime: f64,
    pub range_km: f64,
    pub speed: f64,
    /// Steered toward this entity each tick when set.
    pub homing_target: Option<hecs::Entity>,
    /// System on the target that shares the damage.
    pub sub_target: Option<String>,
    /// Set once the projectile has landed or been stopped.
    pub spent: bool,
}
