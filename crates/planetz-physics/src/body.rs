//! Rigid bodies, their shapes, and the metadata records attached to them.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use planetz_core::enums::EntityKind;
use planetz_core::types::Transform;

use crate::arena::BodyHandle;

/// Opaque handle of the graphics object a body mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GraphicsRef(pub u64);

/// Collision shape in body-local space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Sphere { radius: f64 },
    Box { half_extents: DVec3 },
}

impl Shape {
    /// Radius of the smallest sphere around the body origin enclosing the shape.
    pub fn bounding_radius(&self) -> f64 {
        match self {
            Shape::Sphere { radius } => *radius,
            Shape::Box { half_extents } => half_extents.length(),
        }
    }
}

/// Extra record carried by projectile bodies.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectileInfo {
    /// System name of the weapon that fired it.
    pub weapon: String,
    /// World time at spawn (seconds).
    pub spawn_time: f64,
    /// Seconds before the projectile expires.
    pub max_lifetime: f64,
    pub owner_ship: Option<hecs::Entity>,
    /// Contacts against this body are ignored.
    pub owner_body: Option<BodyHandle>,
}

/// One record per live body.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyMetadata {
    /// Sector-scoped id of the simulated object.
    pub id: String,
    pub kind: EntityKind,
    /// Entity in the simulation world this body belongs to.
    pub entity: Option<hecs::Entity>,
    pub damageable: bool,
    pub projectile: Option<ProjectileInfo>,
}

impl BodyMetadata {
    pub fn new(id: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            id: id.into(),
            kind,
            entity: None,
            damageable: false,
            projectile: None,
        }
    }

    pub fn with_entity(mut self, entity: hecs::Entity) -> Self {
        self.entity = Some(entity);
        self
    }

    pub fn damageable(mut self, damageable: bool) -> Self {
        self.damageable = damageable;
        self
    }

    pub fn with_projectile(mut self, info: ProjectileInfo) -> Self {
        self.projectile = Some(info);
        self
    }

    pub fn is_projectile(&self) -> bool {
        self.projectile.is_some()
    }
}

/// Insertion parameters for `PhysicsWorld::add_rigid_body`.
#[derive(Debug, Clone)]
pub struct BodyConfig {
    pub shape: Shape,
    /// Zero mass makes the body static.
    pub mass: f64,
    pub transform: Transform,
    pub linear_velocity: DVec3,
    /// Swept collision detection for fast movers.
    pub ccd: bool,
    pub metadata: BodyMetadata,
}

impl BodyConfig {
    pub fn sphere(radius: f64, mass: f64, metadata: BodyMetadata) -> Self {
        Self {
            shape: Shape::Sphere { radius },
            mass,
            transform: Transform::default(),
            linear_velocity: DVec3::ZERO,
            ccd: false,
            metadata,
        }
    }

    pub fn cuboid(half_extents: DVec3, mass: f64, metadata: BodyMetadata) -> Self {
        Self {
            shape: Shape::Box { half_extents },
            mass,
            transform: Transform::default(),
            linear_velocity: DVec3::ZERO,
            ccd: false,
            metadata,
        }
    }

    pub fn at(mut self, position: DVec3) -> Self {
        self.transform.position = position;
        self
    }

    pub fn with_velocity(mut self, velocity: DVec3) -> Self {
        self.linear_velocity = velocity;
        self
    }

    pub fn with_ccd(mut self, ccd: bool) -> Self {
        self.ccd = ccd;
        self
    }
}

/// Simulated body state.
#[derive(Debug, Clone)]
pub struct RigidBody {
    pub shape: Shape,
    pub mass: f64,
    pub transform: Transform,
    pub linear_velocity: DVec3,
    pub ccd: bool,
    /// Set when a swept body hits something; it stops advancing.
    pub(crate) halted: bool,
}

impl RigidBody {
    pub(crate) fn from_config(config: &BodyConfig) -> Self {
        Self {
            shape: config.shape,
            mass: config.mass.max(0.0),
            transform: config.transform,
            linear_velocity: if config.mass > 0.0 {
                config.linear_velocity
            } else {
                DVec3::ZERO
            },
            ccd: config.ccd,
            halted: false,
        }
    }

    pub fn is_static(&self) -> bool {
        self.mass <= 0.0
    }

    pub fn inverse_mass(&self) -> f64 {
        if self.is_static() {
            0.0
        } else {
            1.0 / self.mass
        }
    }

    pub fn position(&self) -> DVec3 {
        self.transform.position
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }
}
