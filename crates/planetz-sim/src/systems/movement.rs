//! Movement: ships drive their bodies, bodies report back positions.

use hecs::World;

use crate::components::PhysicsBody;
use crate::ship::Ship;
use planetz_physics::PhysicsWorld;

/// Push each ship's impulse velocity and heading into its body.
pub fn run(world: &mut World, physics: &mut PhysicsWorld) {
    for (_entity, (ship, body)) in world.query_mut::<(&Ship, &PhysicsBody)>() {
        let Some(rigid) = physics.body_mut(body.0) else {
            continue;
        };
        rigid.linear_velocity = if ship.is_destroyed() {
            glam::DVec3::ZERO
        } else {
            ship.velocity()
        };
        rigid.transform.orientation = ship.transform.orientation;
    }
}

/// Copy stepped body positions back onto the ships.
pub fn sync_positions(world: &mut World, physics: &PhysicsWorld) {
    for (_entity, (ship, body)) in world.query_mut::<(&mut Ship, &PhysicsBody)>() {
        if let Some(rigid) = physics.body(body.0) {
            ship.transform.position = rigid.position();
        }
    }
}
