//! The physics world: body storage, graphics mapping, stepping.

use std::collections::HashMap;

use glam::DVec3;
use log::debug;

use planetz_core::config::PhysicsConfig;
use planetz_core::error::{PlanetzError, PlanetzResult};
use planetz_core::types::Transform;

use crate::arena::{BodyAllocator, BodyHandle};
use crate::body::{BodyConfig, BodyMetadata, GraphicsRef, RigidBody};
use crate::collision::{self, CollisionEvent, ContactManifold};

/// Space has no gravity.
pub const GRAVITY: DVec3 = DVec3::ZERO;

/// Result of one `step` call.
#[derive(Debug, Default)]
pub struct StepOutput {
    /// Interior sub-steps taken.
    pub substeps: u32,
    /// Projectile hits on damageable bodies, deduplicated.
    pub collisions: Vec<CollisionEvent>,
    /// Projectiles stopped by non-damageable bodies this step.
    pub obstructed: Vec<BodyHandle>,
}

/// Zero-gravity rigid-body world.
///
/// Bodies and their metadata live in parallel slot vectors indexed by
/// `BodyHandle::index`; a slot holds both or neither.
pub struct PhysicsWorld {
    allocator: BodyAllocator,
    pub(crate) bodies: Vec<Option<RigidBody>>,
    pub(crate) metadata: Vec<Option<BodyMetadata>>,
    by_graphics: HashMap<GraphicsRef, BodyHandle>,
    graphics_of: HashMap<BodyHandle, GraphicsRef>,

    substep: f64,
    max_frame_dt: f64,
    pub(crate) pair_cooldown_ms: f64,
    raycast_enabled: bool,
    elapsed_secs: f64,

    pub(crate) manifolds: Vec<ContactManifold>,
    pub(crate) last_dispatch_ms: HashMap<(BodyHandle, BodyHandle), f64>,
}

impl PhysicsWorld {
    pub fn new(config: &PhysicsConfig) -> Self {
        Self {
            allocator: BodyAllocator::new(),
            bodies: Vec::new(),
            metadata: Vec::new(),
            by_graphics: HashMap::new(),
            graphics_of: HashMap::new(),
            substep: 1.0 / config.substep_hz,
            max_frame_dt: config.max_frame_dt,
            pair_cooldown_ms: config.pair_cooldown_ms,
            raycast_enabled: config.raycast_enabled,
            elapsed_secs: 0.0,
            manifolds: Vec::new(),
            last_dispatch_ms: HashMap::new(),
        }
    }

    pub fn gravity(&self) -> DVec3 {
        GRAVITY
    }

    /// World time advanced by `step` (seconds).
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed_secs
    }

    pub fn raycast_enabled(&self) -> bool {
        self.raycast_enabled
    }

    pub fn set_raycast_enabled(&mut self, enabled: bool) {
        self.raycast_enabled = enabled;
    }

    /// Insert a body mirroring a graphics object. An existing body for the same
    /// graphics object is replaced.
    pub fn add_rigid_body(&mut self, graphics: GraphicsRef, config: BodyConfig) -> BodyHandle {
        self.remove_rigid_body(graphics);
        let handle = self.insert_body(config);
        self.by_graphics.insert(graphics, handle);
        self.graphics_of.insert(handle, graphics);
        handle
    }

    /// Insert a body with no graphics counterpart (projectiles).
    pub fn insert_body(&mut self, config: BodyConfig) -> BodyHandle {
        let handle = self.allocator.allocate();
        let idx = handle.index as usize;
        while self.bodies.len() <= idx {
            self.bodies.push(None);
            self.metadata.push(None);
        }
        self.bodies[idx] = Some(RigidBody::from_config(&config));
        self.metadata[idx] = Some(config.metadata);
        handle
    }

    /// Remove the body mirroring `graphics`. Idempotent.
    pub fn remove_rigid_body(&mut self, graphics: GraphicsRef) -> bool {
        match self.by_graphics.get(&graphics).copied() {
            Some(handle) => self.remove_body(handle),
            None => false,
        }
    }

    /// Remove a body by handle. Idempotent; stale handles return false.
    pub fn remove_body(&mut self, handle: BodyHandle) -> bool {
        if !self.allocator.deallocate(handle) {
            return false;
        }
        let idx = handle.index as usize;
        self.bodies[idx] = None;
        self.metadata[idx] = None;
        if let Some(graphics) = self.graphics_of.remove(&handle) {
            self.by_graphics.remove(&graphics);
        }
        self.last_dispatch_ms
            .retain(|(a, b), _| *a != handle && *b != handle);
        true
    }

    pub fn is_alive(&self, handle: BodyHandle) -> bool {
        self.allocator.is_alive(handle)
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        if !self.is_alive(handle) {
            return None;
        }
        self.bodies.get(handle.index as usize)?.as_ref()
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        if !self.is_alive(handle) {
            return None;
        }
        self.bodies.get_mut(handle.index as usize)?.as_mut()
    }

    pub fn metadata(&self, handle: BodyHandle) -> Option<&BodyMetadata> {
        if !self.is_alive(handle) {
            return None;
        }
        self.metadata.get(handle.index as usize)?.as_ref()
    }

    pub fn handle_for(&self, graphics: GraphicsRef) -> Option<BodyHandle> {
        self.by_graphics.get(&graphics).copied()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.iter().filter(|b| b.is_some()).count()
    }

    /// All live bodies with their metadata.
    pub fn iter(&self) -> impl Iterator<Item = (BodyHandle, &RigidBody, &BodyMetadata)> + '_ {
        self.bodies
            .iter()
            .zip(self.metadata.iter())
            .enumerate()
            .filter_map(move |(idx, (body, meta))| {
                let handle = self.allocator.handle_at(idx as u32)?;
                Some((handle, body.as_ref()?, meta.as_ref()?))
            })
    }

    pub(crate) fn live_handles(&self) -> Vec<BodyHandle> {
        self.iter().map(|(handle, _, _)| handle).collect()
    }

    pub fn set_velocity(&mut self, handle: BodyHandle, velocity: DVec3) -> PlanetzResult<()> {
        let body = self
            .body_mut(handle)
            .ok_or_else(|| PlanetzError::UnknownBody(handle.to_string()))?;
        if !body.is_static() {
            body.linear_velocity = velocity;
        }
        Ok(())
    }

    pub fn set_transform(&mut self, handle: BodyHandle, transform: Transform) -> PlanetzResult<()> {
        let body = self
            .body_mut(handle)
            .ok_or_else(|| PlanetzError::UnknownBody(handle.to_string()))?;
        body.transform = transform;
        Ok(())
    }

    /// Push a graphics transform into its body (teleport).
    pub fn sync_from_graphics(
        &mut self,
        graphics: GraphicsRef,
        transform: Transform,
    ) -> PlanetzResult<()> {
        let handle = self
            .handle_for(graphics)
            .ok_or_else(|| PlanetzError::UnknownBody(format!("graphics #{}", graphics.0)))?;
        self.set_transform(handle, transform)
    }

    /// Pull a body transform out for its graphics object.
    pub fn sync_to_graphics(&self, graphics: GraphicsRef) -> PlanetzResult<Transform> {
        self.handle_for(graphics)
            .and_then(|handle| self.body(handle))
            .map(|body| body.transform)
            .ok_or_else(|| PlanetzError::UnknownBody(format!("graphics #{}", graphics.0)))
    }

    /// Advance the world by `dt` seconds.
    ///
    /// The frame is clamped to `max_frame_dt` and split into
    /// `ceil(dt / substep)` equal sub-steps, none longer than the fixed
    /// interior step. Collision dispatch runs once after the last sub-step.
    pub fn step(&mut self, dt: f64) -> StepOutput {
        let dt = dt.clamp(0.0, self.max_frame_dt);
        if dt <= 0.0 {
            return StepOutput::default();
        }
        let substeps = ((dt / self.substep - 1e-9).ceil() as u32).max(1);
        let h = dt / substeps as f64;
        for _ in 0..substeps {
            collision::integrate_substep(self, h);
            self.elapsed_secs += h;
        }
        let (collisions, obstructed) = collision::dispatch(self);
        if !collisions.is_empty() {
            debug!("physics step: {} projectile collisions", collisions.len());
        }
        StepOutput {
            substeps,
            collisions,
            obstructed,
        }
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(&PhysicsConfig::default())
    }
}
