//! Ray casts and spatial queries over the physics world.

use glam::DVec3;

use planetz_core::constants::{RAYCAST_MAX_STEPS, RAYCAST_STEP_PAST_KM};
use planetz_core::enums::EntityKind;

use crate::arena::BodyHandle;
use crate::geometry::ray_shape;
use crate::world::PhysicsWorld;

/// Closest body along a ray.
#[derive(Debug, Clone, PartialEq)]
pub struct RaycastHit {
    pub body: BodyHandle,
    pub point: DVec3,
    pub normal: DVec3,
    /// Distance from the original ray origin (km).
    pub distance: f64,
    pub id: String,
    pub kind: EntityKind,
    pub entity: Option<hecs::Entity>,
    pub damageable: bool,
}

/// Bodies a ray ignores.
#[derive(Debug, Clone, Default)]
pub struct RayFilter {
    pub exclude: Vec<BodyHandle>,
    pub skip_projectiles: bool,
}

impl RayFilter {
    pub fn excluding(body: BodyHandle) -> Self {
        Self {
            exclude: vec![body],
            skip_projectiles: true,
        }
    }
}

/// Outcome of a weapon ray that looks through celestial bodies.
#[derive(Debug, Clone, PartialEq)]
pub enum RaycastOutcome {
    /// A damageable body was reached.
    Hit(RaycastHit),
    /// Walk budget exhausted on non-damageable bodies; the last one stops the ray.
    Blocked(RaycastHit),
    Clear,
}

impl PhysicsWorld {
    /// Closest body whose shape the ray enters within `max_distance`.
    pub fn raycast(
        &self,
        origin: DVec3,
        dir: DVec3,
        max_distance: f64,
        filter: &RayFilter,
    ) -> Option<RaycastHit> {
        let dir = dir.try_normalize()?;
        let mut closest: Option<RaycastHit> = None;
        for (handle, body, meta) in self.iter() {
            if filter.exclude.contains(&handle) || (filter.skip_projectiles && meta.is_projectile())
            {
                continue;
            }
            let Some(hit) = ray_shape(origin, dir, &body.shape, &body.transform, 0.0, max_distance)
            else {
                continue;
            };
            if closest.as_ref().map_or(true, |c| hit.distance < c.distance) {
                closest = Some(RaycastHit {
                    body: handle,
                    point: origin + dir * hit.distance,
                    normal: hit.normal,
                    distance: hit.distance,
                    id: meta.id.clone(),
                    kind: meta.kind,
                    entity: meta.entity,
                    damageable: meta.damageable,
                });
            }
        }
        closest
    }

    /// Weapon ray: step past non-damageable hits (planets, stars, stations)
    /// up to `RAYCAST_MAX_STEPS` times, restarting just beyond each one.
    pub fn raycast_damageable(
        &self,
        origin: DVec3,
        dir: DVec3,
        max_distance: f64,
        filter: &RayFilter,
    ) -> RaycastOutcome {
        let Some(dir) = dir.try_normalize() else {
            return RaycastOutcome::Clear;
        };
        let mut filter = filter.clone();
        let mut start = origin;
        let mut travelled = 0.0;
        let mut last_blocker = None;

        for _ in 0..RAYCAST_MAX_STEPS {
            let remaining = max_distance - travelled;
            if remaining <= 0.0 {
                break;
            }
            let Some(mut hit) = self.raycast(start, dir, remaining, &filter) else {
                return RaycastOutcome::Clear;
            };
            hit.distance += travelled;
            if hit.damageable {
                return RaycastOutcome::Hit(hit);
            }
            filter.exclude.push(hit.body);
            travelled = hit.distance + RAYCAST_STEP_PAST_KM;
            start = origin + dir * travelled;
            last_blocker = Some(hit);
        }

        match last_blocker {
            Some(hit) => RaycastOutcome::Blocked(hit),
            None => RaycastOutcome::Clear,
        }
    }

    /// Every body whose surface lies within `radius` of `position`, nearest first.
    pub fn spatial_query(&self, position: DVec3, radius: f64) -> Vec<BodyHandle> {
        let mut found: Vec<(f64, BodyHandle)> = self
            .iter()
            .filter_map(|(handle, body, _)| {
                let gap = body.position().distance(position) - body.shape.bounding_radius();
                (gap <= radius).then_some((gap.max(0.0), handle))
            })
            .collect();
        found.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        found.into_iter().map(|(_, handle)| handle).collect()
    }
}
