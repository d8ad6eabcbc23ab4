//! Projectile lifecycle: homing guidance, impacts, obstruction and expiry.
//!
//! A projectile is marked `spent` the moment it lands or is stopped and is
//! removed by the cleanup pass. Spent projectiles never apply damage again.

use glam::{DQuat, DVec3};
use hecs::{Entity, World};
use log::debug;
use rand_chacha::ChaCha8Rng;

use planetz_core::config::CombatConfig;
use planetz_core::constants::HOMING_TURN_RATE;
use planetz_core::events::GameEvent;
use planetz_physics::{BodyHandle, CollisionEvent, PhysicsWorld};

use crate::combat::{self, HitSpec};
use crate::components::{PhysicsBody, Projectile};
use crate::targeting::TargetingComputer;

/// Rotate `current` toward `desired` by at most `max_angle` radians.
pub fn turn_toward(current: DVec3, desired: DVec3, max_angle: f64) -> DVec3 {
    let angle = current.angle_between(desired);
    if angle <= max_angle {
        return desired;
    }
    let axis = current.cross(desired);
    let axis = if axis.length_squared() > 1e-18 {
        axis.normalize()
    } else {
        current.any_orthonormal_vector()
    };
    DQuat::from_axis_angle(axis, max_angle) * current
}

/// Pure pursuit at constant speed with a bounded turn rate.
pub fn steer(world: &mut World, physics: &mut PhysicsWorld, dt: f64) {
    let mut steering: Vec<(BodyHandle, Option<BodyHandle>)> = Vec::new();
    for (_entity, (projectile, body)) in world.query::<(&Projectile, &PhysicsBody)>().iter() {
        let Some(target) = projectile.homing_target.filter(|_| !projectile.spent) else {
            continue;
        };
        let target_body = world.get::<&PhysicsBody>(target).ok().map(|b| b.0);
        steering.push((body.0, target_body));
    }

    for (handle, target_body) in steering {
        let Some(target_pos) = target_body
            .and_then(|t| physics.body(t))
            .map(|b| b.position())
        else {
            continue;
        };
        let Some(body) = physics.body_mut(handle) else {
            continue;
        };
        if body.is_halted() {
            continue;
        }
        let speed = body.linear_velocity.length();
        let (Some(current), Some(desired)) = (
            body.linear_velocity.try_normalize(),
            (target_pos - body.position()).try_normalize(),
        ) else {
            continue;
        };
        body.linear_velocity = turn_toward(current, desired, HOMING_TURN_RATE * dt) * speed;
    }
}

fn projectile_entity(physics: &PhysicsWorld, handle: BodyHandle) -> Option<Entity> {
    physics.metadata(handle).and_then(|meta| meta.entity)
}

/// Take the payload out of a live projectile and mark it spent.
fn spend(world: &mut World, entity: Entity) -> Option<Projectile> {
    let mut projectile = world.get::<&mut Projectile>(entity).ok()?;
    if projectile.spent {
        return None;
    }
    projectile.spent = true;
    Some(projectile.clone())
}

/// Apply this step's projectile impacts and retire obstructed projectiles.
#[allow(clippy::too_many_arguments)]
pub fn handle_collisions(
    world: &mut World,
    physics: &PhysicsWorld,
    collisions: &[CollisionEvent],
    obstructed: &[BodyHandle],
    targeting: &TargetingComputer,
    config: &CombatConfig,
    rng: &mut ChaCha8Rng,
    events: &mut Vec<GameEvent>,
) {
    let locked = targeting.current_target_data().and_then(|t| t.entity);
    for collision in collisions {
        let Some(entity) = projectile_entity(physics, collision.projectile) else {
            continue;
        };
        let Some(projectile) = spend(world, entity) else {
            continue;
        };
        let Some(victim) = collision.other_entity else {
            continue;
        };
        let sub_target = projectile
            .sub_target
            .as_deref()
            .filter(|_| locked == Some(victim));
        let spec = HitSpec {
            victim,
            damage: projectile.damage,
            damage_type: projectile.damage_type,
            sub_target,
            attacker: Some(projectile.owner),
            weapon: &projectile.weapon,
            point: collision.contact_point,
        };
        combat::apply_hit(world, &spec, config, rng, events);
    }

    for &handle in obstructed {
        if let Some(entity) = projectile_entity(physics, handle) {
            if spend(world, entity).is_some() {
                debug!("projectile {} obstructed", handle);
            }
        }
    }
}

/// Retire projectiles past their lifetime or their weapon's range.
pub fn expire(world: &mut World, physics: &PhysicsWorld, now_secs: f64) {
    for (_entity, (projectile, body)) in world.query_mut::<(&mut Projectile, &PhysicsBody)>() {
        if projectile.spent {
            continue;
        }
        let aged = now_secs - projectile.spawn_time >= projectile.max_lifetime;
        let travelled = physics
            .body(body.0)
            .map_or(f64::INFINITY, |b| b.position().distance(projectile.spawn_position));
        if aged || travelled > projectile.range_km {
            projectile.spent = true;
        }
    }
}
