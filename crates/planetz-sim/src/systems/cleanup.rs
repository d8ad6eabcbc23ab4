//! Cleanup system: removes spent projectiles and destroyed ships.

use hecs::{Entity, World};

use planetz_physics::PhysicsWorld;

use crate::components::{Identity, PlayerShip, Projectile};
use crate::ship::Ship;
use crate::world_setup;

/// Despawn spent projectiles and destroyed non-player ships together with
/// their bodies. Returns the ids of the ships removed.
/// Uses a pre-allocated buffer to avoid per-tick allocation.
pub fn run(
    world: &mut World,
    physics: &mut PhysicsWorld,
    despawn_buffer: &mut Vec<Entity>,
) -> Vec<String> {
    despawn_buffer.clear();

    for (entity, projectile) in world.query_mut::<&Projectile>() {
        if projectile.spent {
            despawn_buffer.push(entity);
        }
    }

    let mut removed_ships = Vec::new();
    for (entity, (identity, ship)) in world
        .query_mut::<(&Identity, &Ship)>()
        .without::<&PlayerShip>()
    {
        if ship.is_destroyed() {
            removed_ships.push(identity.id.clone());
            despawn_buffer.push(entity);
        }
    }

    for entity in despawn_buffer.drain(..) {
        world_setup::despawn(world, physics, entity);
    }
    removed_ships
}
