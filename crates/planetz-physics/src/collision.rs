//! Sub-step integration, swept and discrete contact generation, and
//! projectile collision dispatch.

use std::collections::HashSet;

use glam::DVec3;

use planetz_core::constants::CONTACT_RESTITUTION;

use crate::arena::BodyHandle;
use crate::body::{BodyMetadata, RigidBody, Shape};
use crate::geometry::{sphere_contact, sweep_sphere, Contact};
use crate::world::PhysicsWorld;

/// A contact found during a sub-step. Cleared after every dispatch.
#[derive(Debug, Clone)]
pub struct ContactManifold {
    pub a: BodyHandle,
    pub b: BodyHandle,
    pub point: DVec3,
    /// Points from `b` toward `a`.
    pub normal: DVec3,
    pub depth: f64,
}

/// A projectile touched a damageable body.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionEvent {
    pub projectile: BodyHandle,
    pub other: BodyHandle,
    pub contact_point: DVec3,
    pub other_id: String,
    pub other_entity: Option<hecs::Entity>,
    pub weapon: String,
    pub owner_ship: Option<hecs::Entity>,
}

/// Pairs that never produce contacts.
fn ignored_pair(a: BodyHandle, ma: &BodyMetadata, b: BodyHandle, mb: &BodyMetadata) -> bool {
    match (&ma.projectile, &mb.projectile) {
        (Some(_), Some(_)) => true,
        (Some(p), None) => p.owner_body == Some(b),
        (None, Some(p)) => p.owner_body == Some(a),
        (None, None) => false,
    }
}

fn pair_metadata<'a>(
    world: &'a PhysicsWorld,
    a: BodyHandle,
    b: BodyHandle,
) -> Option<(&'a BodyMetadata, &'a BodyMetadata)> {
    Some((world.metadata(a)?, world.metadata(b)?))
}

/// Advance every dynamic body by `h` seconds and record contacts.
pub(crate) fn integrate_substep(world: &mut PhysicsWorld, h: f64) {
    let handles = world.live_handles();

    // Pass 1: integrate, sweeping CCD bodies against everything else.
    for &mover in &handles {
        let (start, displacement, radius, ccd) = match world.body(mover) {
            Some(body) if !body.is_static() && !body.halted => (
                body.position(),
                body.linear_velocity * h,
                body.shape.bounding_radius(),
                body.ccd,
            ),
            _ => continue,
        };

        if !ccd {
            if let Some(body) = world.body_mut(mover) {
                body.transform.position = start + displacement;
            }
            continue;
        }

        let mut earliest: Option<(f64, BodyHandle, DVec3, DVec3)> = None;
        for &other in &handles {
            if other == mover {
                continue;
            }
            let Some((mm, mo)) = pair_metadata(world, mover, other) else {
                continue;
            };
            if ignored_pair(mover, mm, other, mo) {
                continue;
            }
            let Some(body) = world.body(other) else {
                continue;
            };
            let relative = displacement - body.linear_velocity * h;
            if let Some((fraction, hit)) =
                sweep_sphere(start, relative, radius, &body.shape, &body.transform)
            {
                if earliest.map_or(true, |(best, ..)| fraction < best) {
                    let center = start + relative * fraction;
                    earliest = Some((fraction, other, center - hit.normal * radius, hit.normal));
                }
            }
        }

        let fraction = earliest.map_or(1.0, |(fraction, ..)| fraction);
        if let Some(body) = world.body_mut(mover) {
            body.transform.position = start + displacement * fraction;
            body.halted = earliest.is_some();
        }
        if let Some((_, other, point, normal)) = earliest {
            world.manifolds.push(ContactManifold {
                a: mover,
                b: other,
                point,
                normal,
                depth: 0.0,
            });
        }
    }

    // Pass 2: discrete overlaps for everything not swept.
    for (i, &a) in handles.iter().enumerate() {
        for &b in &handles[i + 1..] {
            let contact = {
                let (Some(ba), Some(bb)) = (world.body(a), world.body(b)) else {
                    continue;
                };
                if (ba.is_static() && bb.is_static()) || ba.ccd || bb.ccd {
                    continue;
                }
                let Some((ma, mb)) = pair_metadata(world, a, b) else {
                    continue;
                };
                if ignored_pair(a, ma, b, mb) {
                    continue;
                }
                overlap(ba, bb)
            };
            let Some(contact) = contact else {
                continue;
            };
            world.manifolds.push(ContactManifold {
                a,
                b,
                point: contact.point,
                normal: contact.normal,
                depth: contact.depth,
            });
            let projectile_involved = pair_metadata(world, a, b)
                .map_or(false, |(ma, mb)| ma.is_projectile() || mb.is_projectile());
            if !projectile_involved {
                resolve(world, a, b, &contact);
            }
        }
    }
}

/// Overlap of `a` against `b`, normal pointing from `b` toward `a`.
fn overlap(a: &RigidBody, b: &RigidBody) -> Option<Contact> {
    match (&a.shape, &b.shape) {
        (Shape::Box { .. }, Shape::Sphere { radius }) => {
            sphere_contact(b.position(), *radius, &a.shape, &a.transform).map(|c| Contact {
                point: c.point,
                normal: -c.normal,
                depth: c.depth,
            })
        }
        _ => sphere_contact(a.position(), a.shape.bounding_radius(), &b.shape, &b.transform),
    }
}

/// Separate two non-projectile bodies and reflect their closing velocity.
fn resolve(world: &mut PhysicsWorld, a: BodyHandle, b: BodyHandle, contact: &Contact) {
    let (inv_a, inv_b, vel_a, vel_b) = match (world.body(a), world.body(b)) {
        (Some(ba), Some(bb)) => (
            ba.inverse_mass(),
            bb.inverse_mass(),
            ba.linear_velocity,
            bb.linear_velocity,
        ),
        _ => return,
    };
    let total = inv_a + inv_b;
    if total <= 0.0 {
        return;
    }
    let n = contact.normal;
    let closing = (vel_a - vel_b).dot(n);
    let impulse = if closing < 0.0 {
        -(1.0 + CONTACT_RESTITUTION) * closing / total
    } else {
        0.0
    };
    if let Some(body) = world.body_mut(a) {
        body.transform.position += n * contact.depth * inv_a / total;
        body.linear_velocity += n * impulse * inv_a;
    }
    if let Some(body) = world.body_mut(b) {
        body.transform.position -= n * contact.depth * inv_b / total;
        body.linear_velocity -= n * impulse * inv_b;
    }
}

/// Turn this step's manifolds into projectile collision events.
///
/// Each projectile reports at most one damageable hit per dispatch, and a
/// (projectile, target) pair is silenced for the pair cooldown afterwards.
/// Manifolds are consumed, so the next step starts clean.
pub(crate) fn dispatch(world: &mut PhysicsWorld) -> (Vec<CollisionEvent>, Vec<BodyHandle>) {
    let now_ms = world.elapsed_secs() * 1000.0;
    let cooldown = world.pair_cooldown_ms;
    let manifolds = std::mem::take(&mut world.manifolds);

    let mut events = Vec::new();
    let mut obstructed = Vec::new();
    let mut reported: HashSet<BodyHandle> = HashSet::new();

    for manifold in manifolds {
        let Some((ma, mb)) = pair_metadata(world, manifold.a, manifold.b) else {
            continue;
        };
        let (projectile, other, meta_p, meta_o) = match (ma.is_projectile(), mb.is_projectile()) {
            (true, false) => (manifold.a, manifold.b, ma, mb),
            (false, true) => (manifold.b, manifold.a, mb, ma),
            _ => continue,
        };
        if !meta_o.damageable {
            if !obstructed.contains(&projectile) {
                obstructed.push(projectile);
            }
            continue;
        }
        if reported.contains(&projectile) {
            continue;
        }
        let key = (projectile, other);
        if let Some(&last) = world.last_dispatch_ms.get(&key) {
            if now_ms - last < cooldown {
                continue;
            }
        }
        let event = CollisionEvent {
            projectile,
            other,
            contact_point: manifold.point,
            other_id: meta_o.id.clone(),
            other_entity: meta_o.entity,
            weapon: meta_p
                .projectile
                .as_ref()
                .map(|p| p.weapon.clone())
                .unwrap_or_default(),
            owner_ship: meta_p.projectile.as_ref().and_then(|p| p.owner_ship),
        };
        reported.insert(projectile);
        world.last_dispatch_ms.insert(key, now_ms);
        events.push(event);
    }

    world
        .last_dispatch_ms
        .retain(|_, last| now_ms - *last < cooldown);
    (events, obstructed)
}
