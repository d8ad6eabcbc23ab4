//! Target list refresh from the world registry.

use glam::DVec3;
use hecs::World;

use planetz_physics::PhysicsWorld;

use crate::components::{Celestial, Identity, PhysicsBody, PlayerShip};
use crate::ship::Ship;
use crate::targeting::{TargetEntry, TargetingComputer};

/// Everything targetable: celestials in database order, then other ships.
pub fn candidates(world: &World, physics: &PhysicsWorld, from: DVec3) -> Vec<TargetEntry> {
    let entry = |entity, identity: &Identity, body: &PhysicsBody| {
        let position = physics.body(body.0).map_or(DVec3::ZERO, |b| b.position());
        TargetEntry {
            id: identity.id.clone(),
            name: identity.name.clone(),
            kind: identity.kind,
            faction: identity.faction,
            position,
            distance_km: position.distance(from),
            entity: Some(entity),
            body: Some(body.0),
        }
    };

    let mut entries: Vec<TargetEntry> = world
        .query::<(&Identity, &PhysicsBody, &Celestial)>()
        .iter()
        .map(|(entity, (identity, body, _))| entry(entity, identity, body))
        .collect();
    entries.extend(
        world
            .query::<(&Identity, &PhysicsBody, &Ship)>()
            .without::<&PlayerShip>()
            .iter()
            .filter(|(_, (_, _, ship))| !ship.is_destroyed())
            .map(|(entity, (identity, body, _))| entry(entity, identity, body)),
    );
    entries
}

/// Rebuild the list and re-check the sub-target against the locked ship.
pub fn refresh(
    world: &World,
    physics: &PhysicsWorld,
    targeting: &mut TargetingComputer,
    from: DVec3,
) {
    targeting.rebuild(candidates(world, physics, from));
    revalidate_sub_target(world, targeting);
}

/// Move every entry to its body's current position, measured from `from`.
pub fn track(physics: &PhysicsWorld, targeting: &mut TargetingComputer, from: DVec3) {
    targeting.update_tracks(from, |entry| {
        entry.body.and_then(|b| physics.body(b)).map(|b| b.position())
    });
}

/// Drop a sub-target that is DISABLED, core, or gone.
pub fn revalidate_sub_target(world: &World, targeting: &mut TargetingComputer) {
    let candidates = sub_target_candidates(world, targeting);
    targeting.validate_sub_target(&candidates);
}

/// Selectable systems on the locked ship.
pub fn sub_target_candidates(world: &World, targeting: &TargetingComputer) -> Vec<String> {
    targeting
        .current_target_data()
        .and_then(|t| t.entity)
        .and_then(|e| world.get::<&Ship>(e).ok().map(|ship| ship.sub_target_candidates()))
        .unwrap_or_default()
}
