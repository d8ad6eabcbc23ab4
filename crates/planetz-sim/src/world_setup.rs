//! Entity spawn factories.
//!
//! Every entity with a physics presence is spawned first in the ECS world,
//! then mirrored by a rigid body whose graphics reference is the entity id.

use std::collections::HashSet;

use glam::DVec3;
use hecs::{Entity, World};
use log::info;

use planetz_core::constants::*;
use planetz_core::enums::{EntityKind, Faction, ShipClass};
use planetz_core::error::{PlanetzError, PlanetzResult};
use planetz_core::types::SectorKey;
use planetz_physics::{BodyConfig, BodyMetadata, GraphicsRef, PhysicsWorld, ProjectileInfo};

use crate::components::{Celestial, Identity, PhysicsBody, PlayerShip, Projectile};
use crate::sector_db::ObjectDatabase;
use crate::ship::Ship;

/// Id of the player's own body in the physics world.
pub const PLAYER_ID: &str = "player";

pub fn graphics_ref(entity: Entity) -> GraphicsRef {
    GraphicsRef(entity.to_bits().get())
}

/// Spawn the player's ship with a dynamic body at its current position.
pub fn spawn_player_ship(world: &mut World, physics: &mut PhysicsWorld, ship: Ship) -> Entity {
    let identity = Identity {
        id: PLAYER_ID.to_string(),
        name: ship.name.clone(),
        kind: EntityKind::PlayerShip,
        faction: Faction::Friendly,
    };
    let position = ship.position();
    let entity = world.spawn((PlayerShip, identity, ship));
    let meta = BodyMetadata::new(PLAYER_ID, EntityKind::PlayerShip)
        .with_entity(entity)
        .damageable(true);
    let body = physics.add_rigid_body(
        graphics_ref(entity),
        BodyConfig::sphere(SHIP_HIT_RADIUS_KM, SHIP_MASS, meta).at(position),
    );
    let _ = world.insert_one(entity, PhysicsBody(body));
    entity
}

/// Sector-scoped id for a ship name; repeated names get `_2`, `_3`, ...
fn unique_ship_id(world: &World, sector: &SectorKey, name: &str) -> String {
    let taken: HashSet<String> = world
        .query::<&Identity>()
        .iter()
        .map(|(_, identity)| identity.id.clone())
        .collect();
    let base = sector.scoped_id(name);
    if !taken.contains(&base) {
        return base;
    }
    let mut n = 2;
    loop {
        let id = format!("{base}_{n}");
        if !taken.contains(&id) {
            return id;
        }
        n += 1;
    }
}

/// Spawn a non-player ship with its class loadout.
pub fn spawn_ship(
    world: &mut World,
    physics: &mut PhysicsWorld,
    sector: &SectorKey,
    name: &str,
    class: ShipClass,
    position: DVec3,
    faction: Faction,
) -> PlanetzResult<Entity> {
    let mut ship = Ship::with_default_loadout(name, class)?;
    ship.transform.position = position;
    let identity = Identity {
        id: unique_ship_id(world, sector, name),
        name: name.to_string(),
        kind: EntityKind::EnemyShip,
        faction,
    };
    let meta = BodyMetadata::new(identity.id.clone(), EntityKind::EnemyShip).damageable(true);
    let entity = world.spawn((identity, ship));
    let body = physics.add_rigid_body(
        graphics_ref(entity),
        BodyConfig::sphere(SHIP_HIT_RADIUS_KM, SHIP_MASS, meta.with_entity(entity)).at(position),
    );
    let _ = world.insert_one(entity, PhysicsBody(body));
    Ok(entity)
}

/// Spawn every database object of `sector` as a static body.
/// Stations are boxes; everything else is a sphere.
pub fn populate_sector(
    world: &mut World,
    physics: &mut PhysicsWorld,
    db: &ObjectDatabase,
    sector: &SectorKey,
) -> PlanetzResult<usize> {
    let data = db
        .sector(sector)
        .ok_or_else(|| PlanetzError::UnknownSector(sector.to_string()))?;
    let mut count = 0;
    for object in data.all_objects() {
        let identity = Identity {
            id: object.id.clone(),
            name: object.name.clone(),
            kind: object.kind,
            faction: object.faction,
        };
        let entity = world.spawn((
            identity,
            Celestial {
                radius_km: object.radius_km,
            },
        ));
        let meta = BodyMetadata::new(object.id.clone(), object.kind).with_entity(entity);
        let config = match object.kind {
            EntityKind::Station => BodyConfig::cuboid(DVec3::splat(object.radius_km), 0.0, meta),
            _ => BodyConfig::sphere(object.radius_km, 0.0, meta),
        };
        let body = physics.add_rigid_body(graphics_ref(entity), config.at(object.position));
        let _ = world.insert_one(entity, PhysicsBody(body));
        count += 1;
    }
    info!("sector {sector}: spawned {count} objects");
    Ok(count)
}

/// Launch a projectile body with swept collision.
pub fn spawn_projectile(
    world: &mut World,
    physics: &mut PhysicsWorld,
    projectile: Projectile,
    position: DVec3,
    velocity: DVec3,
    owner_body: Option<PhysicsBody>,
) -> Entity {
    let owner_ship = projectile.owner;
    let info = ProjectileInfo {
        weapon: projectile.weapon.clone(),
        spawn_time: projectile.spawn_time,
        max_lifetime: projectile.max_lifetime,
        owner_ship: Some(owner_ship),
        owner_body: owner_body.map(|b| b.0),
    };
    let entity = world.spawn((projectile,));
    let meta = BodyMetadata::new(format!("projectile_{}", entity.id()), EntityKind::Projectile)
        .with_entity(entity)
        .with_projectile(info);
    let body = physics.insert_body(
        BodyConfig::sphere(PROJECTILE_RADIUS, PROJECTILE_MASS, meta)
            .at(position)
            .with_velocity(velocity)
            .with_ccd(true),
    );
    let _ = world.insert_one(entity, PhysicsBody(body));
    entity
}

/// Remove an entity and its body.
pub fn despawn(world: &mut World, physics: &mut PhysicsWorld, entity: Entity) {
    if let Ok(body) = world.get::<&PhysicsBody>(entity).map(|b| *b) {
        physics.remove_body(body.0);
    }
    let _ = world.despawn(entity);
}

/// Remove everything sector-bound: celestials, other ships, projectiles.
pub fn clear_sector(world: &mut World, physics: &mut PhysicsWorld) -> usize {
    let doomed: Vec<Entity> = world
        .query::<&PhysicsBody>()
        .without::<&PlayerShip>()
        .iter()
        .map(|(entity, _)| entity)
        .collect();
    for &entity in &doomed {
        despawn(world, physics, entity);
    }
    doomed.len()
}
