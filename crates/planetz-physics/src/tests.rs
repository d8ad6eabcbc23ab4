//! Tests for stepping, CCD, collision dispatch, raycasts and queries.

use glam::DVec3;

use planetz_core::config::PhysicsConfig;
use planetz_core::enums::EntityKind;
use planetz_core::types::Transform;

use crate::body::{BodyConfig, BodyMetadata, GraphicsRef, ProjectileInfo};
use crate::raycast::{RayFilter, RaycastOutcome};
use crate::world::{PhysicsWorld, GRAVITY};

fn world() -> PhysicsWorld {
    PhysicsWorld::new(&PhysicsConfig::default())
}

fn target(world: &mut PhysicsWorld, id: &str, at: DVec3, radius: f64) -> crate::BodyHandle {
    let meta = BodyMetadata::new(id, EntityKind::EnemyShip).damageable(true);
    world.insert_body(BodyConfig::sphere(radius, 1000.0, meta).at(at))
}

fn planet(world: &mut PhysicsWorld, id: &str, at: DVec3, radius: f64) -> crate::BodyHandle {
    let meta = BodyMetadata::new(id, EntityKind::Planet);
    world.insert_body(BodyConfig::sphere(radius, 0.0, meta).at(at))
}

fn projectile(world: &mut PhysicsWorld, at: DVec3, velocity: DVec3, ccd: bool) -> crate::BodyHandle {
    let meta = BodyMetadata::new("A0_shot", EntityKind::Projectile).with_projectile(ProjectileInfo {
        weapon: "laser_cannon".into(),
        spawn_time: 0.0,
        max_lifetime: 10.0,
        owner_ship: None,
        owner_body: None,
    });
    world.insert_body(
        BodyConfig::sphere(0.4, 1.0, meta)
            .at(at)
            .with_velocity(velocity)
            .with_ccd(ccd),
    )
}

// ---- Stepping ----

#[test]
fn test_gravity_is_zero() {
    let mut world = world();
    assert_eq!(world.gravity(), DVec3::ZERO);
    assert_eq!(GRAVITY, DVec3::ZERO);

    let body = target(&mut world, "A0_drifter", DVec3::new(1.0, 2.0, 3.0), 1.0);
    for _ in 0..100 {
        world.step(0.016);
    }
    let pos = world.body(body).unwrap().position();
    assert!((pos - DVec3::new(1.0, 2.0, 3.0)).length() < 1e-12);
}

#[test]
fn test_substep_count() {
    let mut world = world();
    assert_eq!(world.step(0.016).substeps, 4);
    assert_eq!(world.step(1.0 / 240.0).substeps, 1);
    // Clamped to the max frame.
    assert_eq!(world.step(1.0).substeps, 24);
    assert_eq!(world.step(0.0).substeps, 0);
}

#[test]
fn test_dynamic_body_integrates_velocity() {
    let mut world = world();
    let body = target(&mut world, "A0_mover", DVec3::ZERO, 1.0);
    world.set_velocity(body, DVec3::new(10.0, 0.0, 0.0)).unwrap();
    world.step(0.05);
    let x = world.body(body).unwrap().position().x;
    assert!((x - 0.5).abs() < 1e-9, "x = {x}");
}

#[test]
fn test_static_body_ignores_velocity() {
    let mut world = world();
    let rock = planet(&mut world, "A0_rock", DVec3::ZERO, 5.0);
    world.set_velocity(rock, DVec3::X * 100.0).unwrap();
    world.step(0.1);
    assert_eq!(world.body(rock).unwrap().position(), DVec3::ZERO);
}

#[test]
fn test_bodies_bounce_apart() {
    let mut world = world();
    let a = target(&mut world, "A0_a", DVec3::new(-1.5, 0.0, 0.0), 1.0);
    let b = target(&mut world, "A0_b", DVec3::new(1.5, 0.0, 0.0), 1.0);
    world.set_velocity(a, DVec3::X * 10.0).unwrap();
    world.set_velocity(b, DVec3::X * -10.0).unwrap();
    for _ in 0..20 {
        world.step(0.016);
    }
    assert!(world.body(a).unwrap().linear_velocity.x < 0.0);
    assert!(world.body(b).unwrap().linear_velocity.x > 0.0);
}

// ---- CCD and dispatch ----

#[test]
fn test_fast_projectile_hits_once() {
    let mut world = world();
    let ship = target(&mut world, "A0_raider", DVec3::new(20.0, 0.0, 0.0), 0.4);
    let shot = projectile(&mut world, DVec3::ZERO, DVec3::new(750.0, 0.0, 0.0), true);

    let mut events = Vec::new();
    for _ in 0..10 {
        events.extend(world.step(0.016).collisions);
    }
    assert_eq!(events.len(), 1, "expected exactly one collision event");
    assert_eq!(events[0].projectile, shot);
    assert_eq!(events[0].other, ship);
    assert_eq!(events[0].other_id, "A0_raider");
    assert_eq!(events[0].weapon, "laser_cannon");

    // Stopped at the contact, not tunnelled through.
    let body = world.body(shot).unwrap();
    assert!(body.is_halted());
    assert!((body.position().x - 19.2).abs() < 1e-6);
    assert!((events[0].contact_point.x - 19.6).abs() < 1e-6);
}

#[test]
fn test_ccd_never_skips_thin_target() {
    // 3 units per sub-step against a 0.8 wide target, several offsets.
    for offset in [10.0, 10.3, 11.7, 13.05, 25.9] {
        let mut world = world();
        target(&mut world, "A0_thin", DVec3::new(offset, 0.0, 0.0), 0.4);
        projectile(&mut world, DVec3::ZERO, DVec3::new(750.0, 0.0, 0.0), true);
        let hits: usize = (0..10).map(|_| world.step(0.016).collisions.len()).sum();
        assert_eq!(hits, 1, "missed target at {offset}");
    }
}

#[test]
fn test_owner_body_is_ignored() {
    let mut world = world();
    let owner = target(&mut world, "A0_player", DVec3::ZERO, 1.0);
    let meta = BodyMetadata::new("A0_shot", EntityKind::Projectile).with_projectile(ProjectileInfo {
        weapon: "standard_missile".into(),
        spawn_time: 0.0,
        max_lifetime: 5.0,
        owner_ship: None,
        owner_body: Some(owner),
    });
    world.insert_body(
        BodyConfig::sphere(0.4, 1.0, meta)
            .with_velocity(DVec3::X * 100.0)
            .with_ccd(true),
    );
    let hits: usize = (0..5).map(|_| world.step(0.016).collisions.len()).sum();
    assert_eq!(hits, 0);
}

#[test]
fn test_pair_cooldown_dedups_across_steps() {
    let mut world = world();
    target(&mut world, "A0_hulk", DVec3::ZERO, 2.0);
    projectile(&mut world, DVec3::new(0.5, 0.0, 0.0), DVec3::ZERO, false);

    let first: usize = (0..7).map(|_| world.step(0.016).collisions.len()).sum();
    assert_eq!(first, 1, "overlap inside the cooldown must report once");

    // 112 ms after the first dispatch the pair may fire again.
    assert_eq!(world.step(0.016).collisions.len(), 1);
}

#[test]
fn test_projectile_blocked_by_planet() {
    let mut world = world();
    planet(&mut world, "A0_terra_prime", DVec3::new(30.0, 0.0, 0.0), 5.0);
    let shot = projectile(&mut world, DVec3::ZERO, DVec3::new(500.0, 0.0, 0.0), true);

    let mut obstructed = Vec::new();
    let mut hits = 0;
    for _ in 0..5 {
        let out = world.step(0.016);
        hits += out.collisions.len();
        obstructed.extend(out.obstructed);
    }
    assert_eq!(hits, 0);
    assert!(obstructed.contains(&shot));
}

// ---- Body bookkeeping ----

#[test]
fn test_remove_is_idempotent() {
    let mut world = world();
    let meta = BodyMetadata::new("A0_alpha_station", EntityKind::Station);
    let handle = world.add_rigid_body(GraphicsRef(7), BodyConfig::cuboid(DVec3::ONE, 0.0, meta));
    assert_eq!(world.body_count(), 1);

    assert!(world.remove_rigid_body(GraphicsRef(7)));
    assert!(!world.remove_rigid_body(GraphicsRef(7)));
    assert!(!world.remove_body(handle));
    assert_eq!(world.body_count(), 0);
    assert!(world.metadata(handle).is_none());
}

#[test]
fn test_stale_handle_after_reuse() {
    let mut world = world();
    let old = planet(&mut world, "A0_luna", DVec3::ZERO, 1.0);
    world.remove_body(old);
    let new = planet(&mut world, "A0_terra_prime", DVec3::ZERO, 1.0);
    assert_eq!(old.index, new.index);
    assert!(world.body(old).is_none());
    assert_eq!(world.metadata(new).unwrap().id, "A0_terra_prime");
}

#[test]
fn test_one_metadata_per_body() {
    let mut world = world();
    for i in 0..5 {
        planet(&mut world, &format!("A0_rock_{i}"), DVec3::X * i as f64 * 10.0, 1.0);
    }
    let count = world.iter().count();
    assert_eq!(count, world.body_count());
    assert_eq!(world.metadata.iter().filter(|m| m.is_some()).count(), 5);
}

#[test]
fn test_graphics_sync_round_trip() {
    let mut world = world();
    let meta = BodyMetadata::new("A0_raider", EntityKind::EnemyShip).damageable(true);
    world.add_rigid_body(GraphicsRef(3), BodyConfig::sphere(0.02, 1000.0, meta));

    let moved = Transform::at(DVec3::new(4.0, 5.0, 6.0));
    world.sync_from_graphics(GraphicsRef(3), moved).unwrap();
    assert_eq!(world.sync_to_graphics(GraphicsRef(3)).unwrap(), moved);
    assert!(world.sync_to_graphics(GraphicsRef(99)).is_err());
}

#[test]
fn test_add_replaces_existing_graphics_mapping() {
    let mut world = world();
    let meta = BodyMetadata::new("A0_beacon", EntityKind::Beacon);
    let first = world.add_rigid_body(GraphicsRef(1), BodyConfig::sphere(1.0, 0.0, meta.clone()));
    let second = world.add_rigid_body(GraphicsRef(1), BodyConfig::sphere(1.0, 0.0, meta));
    assert!(!world.is_alive(first));
    assert_eq!(world.handle_for(GraphicsRef(1)), Some(second));
    assert_eq!(world.body_count(), 1);
}

// ---- Raycast and queries ----

#[test]
fn test_raycast_returns_closest() {
    let mut world = world();
    let near = planet(&mut world, "A0_near", DVec3::new(10.0, 0.0, 0.0), 1.0);
    planet(&mut world, "A0_far", DVec3::new(20.0, 0.0, 0.0), 1.0);
    let hit = world
        .raycast(DVec3::ZERO, DVec3::X, 100.0, &RayFilter::default())
        .unwrap();
    assert_eq!(hit.body, near);
    assert!((hit.distance - 9.0).abs() < 1e-9);
    assert!(world
        .raycast(DVec3::ZERO, DVec3::X, 5.0, &RayFilter::default())
        .is_none());
}

#[test]
fn test_raycast_walks_past_celestials() {
    let mut world = world();
    planet(&mut world, "A0_terra_prime", DVec3::new(10.0, 0.0, 0.0), 2.0);
    planet(&mut world, "A0_luna", DVec3::new(15.0, 0.0, 0.0), 1.0);
    let ship = target(&mut world, "A0_raider", DVec3::new(30.0, 0.0, 0.0), 1.0);

    match world.raycast_damageable(DVec3::ZERO, DVec3::X, 100.0, &RayFilter::default()) {
        RaycastOutcome::Hit(hit) => {
            assert_eq!(hit.body, ship);
            assert!((hit.distance - 29.0).abs() < 1e-9, "distance {}", hit.distance);
        }
        other => panic!("expected hit, got {other:?}"),
    }
}

#[test]
fn test_raycast_walk_budget_exhausted() {
    let mut world = world();
    for i in 0..8 {
        planet(&mut world, &format!("A0_rock_{i}"), DVec3::new(5.0 + 5.0 * i as f64, 0.0, 0.0), 1.0);
    }
    target(&mut world, "A0_raider", DVec3::new(60.0, 0.0, 0.0), 1.0);
    let outcome = world.raycast_damageable(DVec3::ZERO, DVec3::X, 100.0, &RayFilter::default());
    assert!(matches!(outcome, RaycastOutcome::Blocked(_)));
}

#[test]
fn test_raycast_skips_excluded_and_projectiles() {
    let mut world = world();
    let own = target(&mut world, "A0_player", DVec3::ZERO, 1.0);
    projectile(&mut world, DVec3::new(3.0, 0.0, 0.0), DVec3::ZERO, true);
    let enemy = target(&mut world, "A0_raider", DVec3::new(8.0, 0.0, 0.0), 1.0);
    let outcome = world.raycast_damageable(DVec3::ZERO, DVec3::X, 50.0, &RayFilter::excluding(own));
    match outcome {
        RaycastOutcome::Hit(hit) => assert_eq!(hit.body, enemy),
        other => panic!("expected hit, got {other:?}"),
    }
}

#[test]
fn test_spatial_query_sorted_by_distance() {
    let mut world = world();
    let far = planet(&mut world, "A0_far", DVec3::new(20.0, 0.0, 0.0), 1.0);
    let near = planet(&mut world, "A0_near", DVec3::new(5.0, 0.0, 0.0), 1.0);
    planet(&mut world, "A0_outside", DVec3::new(60.0, 0.0, 0.0), 1.0);
    assert_eq!(world.spatial_query(DVec3::ZERO, 25.0), vec![near, far]);
    assert!(world.spatial_query(DVec3::new(0.0, 100.0, 0.0), 1.0).is_empty());
}
