//! Combat coordinator: active weapon, trigger and burst handling, scan-hit
//! resolution, projectile launch, and damage application.
//!
//! Scan-hit resolution order:
//! 1. physics raycast walking past non-damageable bodies (or the bounding
//!    sphere fallback when the raycast path is disabled),
//! 2. near-line tolerance around the ray,
//! 3. lock tolerance around the intended target,
//! 4. crosshair cone.
//!
//! Steps 3 and 4 are assisted hits and roll against
//! `min(0.95, effectiveness * max(0.1, 1 - d / range))`.

use glam::DVec3;
use hecs::{Entity, World};
use log::{debug, info};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use planetz_core::config::CombatConfig;
use planetz_core::constants::{
    MAX_HIT_CHANCE, MIN_RANGE_FACTOR, PROXIMITY_SUPPRESSION_KM, TIME_EPSILON_MS,
};
use planetz_core::enums::{DamageType, WeaponClass};
use planetz_core::events::{DestructionCause, GameEvent};
use planetz_core::types::ray_lateral_distance;
use planetz_physics::geometry::ray_sphere;
use planetz_physics::{BodyHandle, PhysicsWorld, RayFilter, RaycastOutcome};

use crate::components::{Identity, PhysicsBody, Projectile};
use crate::ship::{DamageReport, Ship};
use crate::targeting::{TargetEntry, TargetingComputer};
use crate::weapons::{FireReason, FireResult, Shot};
use crate::world_setup;

/// Which resolution step produced a scan hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitMethod {
    Raycast,
    BoundingSphere,
    NearLine,
    Lock,
    Crosshair,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanHit {
    pub body: BodyHandle,
    pub entity: Option<Entity>,
    pub id: String,
    pub point: DVec3,
    pub distance_km: f64,
    pub method: HitMethod,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScanResolution {
    Hit(ScanHit),
    /// Nothing landed. The reason is `None` for a plain miss.
    Miss(Option<FireReason>),
}

/// Chance an assisted shot lands.
pub fn hit_chance(effectiveness: f64, distance_km: f64, range_km: f64) -> f64 {
    let range_factor = if range_km > 0.0 {
        (1.0 - distance_km / range_km).max(MIN_RANGE_FACTOR)
    } else {
        MIN_RANGE_FACTOR
    };
    (effectiveness * range_factor).min(MAX_HIT_CHANCE)
}

/// Fixed inputs of one scan-hit resolution.
pub struct ScanQuery<'a> {
    pub origin: DVec3,
    pub dir: DVec3,
    pub range_km: f64,
    pub own_body: Option<BodyHandle>,
    pub intended: Option<&'a TargetEntry>,
    pub effectiveness: f64,
}

struct Candidate {
    body: BodyHandle,
    entity: Option<Entity>,
    id: String,
    position: DVec3,
    radius: f64,
}

fn damageable_candidates(physics: &PhysicsWorld, own_body: Option<BodyHandle>) -> Vec<Candidate> {
    physics
        .iter()
        .filter(|(handle, _, meta)| {
            meta.damageable && !meta.is_projectile() && Some(*handle) != own_body
        })
        .map(|(handle, body, meta)| Candidate {
            body: handle,
            entity: meta.entity,
            id: meta.id.clone(),
            position: body.position(),
            radius: body.shape.bounding_radius(),
        })
        .collect()
}

fn scan_hit(c: &Candidate, point: DVec3, distance_km: f64, method: HitMethod) -> ScanResolution {
    ScanResolution::Hit(ScanHit {
        body: c.body,
        entity: c.entity,
        id: c.id.clone(),
        point,
        distance_km,
        method,
    })
}

/// Resolve an instant shot against the just-stepped world.
pub fn resolve_scan_hit(
    physics: &PhysicsWorld,
    query: &ScanQuery<'_>,
    config: &CombatConfig,
    rng: &mut impl Rng,
) -> ScanResolution {
    let Some(dir) = query.dir.try_normalize() else {
        return ScanResolution::Miss(Some(FireReason::NoTarget));
    };
    let origin = query.origin;
    let range = query.range_km;
    let filter = RayFilter {
        exclude: query.own_body.into_iter().collect(),
        skip_projectiles: true,
    };
    let candidates = damageable_candidates(physics, query.own_body);

    // 1. Ray.
    let mut blocked_at = f64::INFINITY;
    if physics.raycast_enabled() {
        match physics.raycast_damageable(origin, dir, range, &filter) {
            RaycastOutcome::Hit(hit) => {
                return ScanResolution::Hit(ScanHit {
                    body: hit.body,
                    entity: hit.entity,
                    id: hit.id,
                    point: hit.point,
                    distance_km: hit.distance,
                    method: HitMethod::Raycast,
                });
            }
            RaycastOutcome::Blocked(hit) => blocked_at = hit.distance,
            RaycastOutcome::Clear => {}
        }
    } else {
        let nearest = candidates
            .iter()
            .filter_map(|c| ray_sphere(origin, dir, c.position, c.radius, range).map(|h| (c, h)))
            .min_by(|a, b| a.1.distance.total_cmp(&b.1.distance));
        if let Some((c, h)) = nearest {
            return scan_hit(c, origin + dir * h.distance, h.distance, HitMethod::BoundingSphere);
        }
    }

    // 2. Near-line tolerance.
    let near = candidates
        .iter()
        .filter_map(|c| {
            let (lateral, t) = ray_lateral_distance(origin, dir, c.position);
            let close = lateral - c.radius <= config.near_line_tolerance_km;
            (t > 0.0 && t <= range && t < blocked_at && close).then_some((c, t))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1));
    if let Some((c, t)) = near {
        return scan_hit(c, origin + dir * t, t, HitMethod::NearLine);
    }

    // 3. Lock tolerance around the intended target.
    let mut out_of_range = false;
    let locked = query
        .intended
        .and_then(|entry| entry.body)
        .and_then(|body| candidates.iter().find(|c| c.body == body));
    if let Some(c) = locked {
        let distance = c.position.distance(origin);
        let (lateral, t) = ray_lateral_distance(origin, dir, c.position);
        if distance > range {
            out_of_range = true;
        } else if t > 0.0 && t < blocked_at && lateral - c.radius <= config.aim_tolerance_km(distance) {
            let chance = hit_chance(query.effectiveness, distance, range);
            if rng.gen::<f64>() < chance {
                return scan_hit(c, c.position, distance, HitMethod::Lock);
            }
            debug!("lock shot on {} missed (p = {:.2})", c.id, chance);
            return ScanResolution::Miss(None);
        }
    }

    // 4. Crosshair cone.
    let max_angle = config.crosshair_angle_deg.to_radians();
    let in_cone = candidates
        .iter()
        .filter_map(|c| {
            let to = c.position - origin;
            let distance = to.length();
            if distance <= PROXIMITY_SUPPRESSION_KM || distance > range || distance >= blocked_at {
                return None;
            }
            let angle = dir.angle_between(to);
            (angle <= max_angle).then_some((c, angle, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1));
    if let Some((c, _, distance)) = in_cone {
        if rng.gen::<f64>() < hit_chance(query.effectiveness, distance, range) {
            return scan_hit(c, c.position, distance, HitMethod::Crosshair);
        }
        return ScanResolution::Miss(None);
    }

    if out_of_range {
        ScanResolution::Miss(Some(FireReason::OutOfRange))
    } else if blocked_at.is_finite() {
        ScanResolution::Miss(Some(FireReason::NoLineOfSight))
    } else if query.intended.is_none() {
        ScanResolution::Miss(Some(FireReason::NoTarget))
    } else {
        ScanResolution::Miss(None)
    }
}

/// A landed hit waiting to be applied.
pub struct HitSpec<'a> {
    pub victim: Entity,
    pub damage: f64,
    pub damage_type: DamageType,
    pub sub_target: Option<&'a str>,
    pub attacker: Option<Entity>,
    pub weapon: &'a str,
    pub point: DVec3,
}

/// Apply a hit to a ship entity. Non-ship victims take nothing.
/// Emits the hit, any state-change side effects, and destruction.
pub fn apply_hit(
    world: &mut World,
    hit: &HitSpec<'_>,
    config: &CombatConfig,
    rng: &mut ChaCha8Rng,
    events: &mut Vec<GameEvent>,
) -> Option<DamageReport> {
    let attacker_id = hit
        .attacker
        .and_then(|a| world.get::<&Identity>(a).ok().map(|i| i.id.clone()));
    let mut query = world.query_one::<(&Identity, &mut Ship)>(hit.victim).ok()?;
    let (identity, ship) = query.get()?;
    if ship.is_destroyed() {
        return None;
    }

    let report = ship.apply_damage(hit.damage, hit.damage_type, rng);
    let sub_target = hit
        .sub_target
        .filter(|name| ship.system(name).is_some())
        .map(str::to_string);
    if let Some(name) = &sub_target {
        ship.damage_system(name, hit.damage * config.sub_target_fraction);
    }

    events.push(GameEvent::Hit {
        target_id: identity.id.clone(),
        weapon: hit.weapon.to_string(),
        damage: report.actual,
        point: hit.point,
        sub_target,
    });
    events.extend(ship.drain_events());
    if report.destroyed {
        info!("{} destroyed by {}", identity.id, hit.weapon);
        events.push(GameEvent::ShipDestroyed {
            victim: identity.id.clone(),
            cause: DestructionCause {
                attacker: attacker_id,
                weapon: Some(hit.weapon.to_string()),
                damage_type: hit.damage_type,
            },
        });
    }
    Some(report)
}

#[derive(Debug, Clone)]
struct Burst {
    weapon: String,
    remaining: u32,
    next_at_ms: f64,
}

/// Per-frame firing state for one shooter.
#[derive(Debug, Clone, Default)]
pub struct CombatCoordinator {
    active_weapon: usize,
    trigger: bool,
    bursts: Vec<Burst>,
}

impl CombatCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_weapon_name(&self, ship: &Ship) -> Option<String> {
        let names = ship.weapon_names();
        if names.is_empty() {
            return None;
        }
        names.get(self.active_weapon.min(names.len() - 1)).cloned()
    }

    pub fn select_weapon(&mut self, index: usize, ship: &Ship) -> bool {
        if index < ship.weapon_names().len() {
            self.active_weapon = index;
            true
        } else {
            false
        }
    }

    pub fn cycle_weapon(&mut self, direction: i32, ship: &Ship) -> Option<String> {
        let n = ship.weapon_names().len() as i64;
        if n == 0 {
            return None;
        }
        let current = (self.active_weapon as i64).min(n - 1);
        self.active_weapon = (current + direction.signum() as i64).rem_euclid(n) as usize;
        self.active_weapon_name(ship)
    }

    /// Queue a trigger pull for the next combat pass.
    pub fn pull_trigger(&mut self) {
        self.trigger = true;
    }

    pub fn pending_burst_shots(&self) -> u32 {
        self.bursts.iter().map(|b| b.remaining).sum()
    }

    /// Drop queued shots (sector change, ship rebuilt).
    pub fn reset(&mut self) {
        self.trigger = false;
        self.bursts.clear();
    }

    /// Fire the pulled trigger and any burst shots that are due.
    #[allow(clippy::too_many_arguments)]
    pub fn run(
        &mut self,
        shooter: Entity,
        world: &mut World,
        physics: &mut PhysicsWorld,
        targeting: &TargetingComputer,
        rng: &mut ChaCha8Rng,
        config: &CombatConfig,
        now_ms: f64,
        events: &mut Vec<GameEvent>,
    ) -> Vec<FireResult> {
        let mut results = Vec::new();

        // Due follow-up shots fire in queue order; a refused shot ends its burst.
        self.bursts.retain_mut(|burst| {
            if burst.next_at_ms > now_ms + TIME_EPSILON_MS {
                return true;
            }
            let result = fire_weapon(
                shooter,
                &burst.weapon,
                world,
                physics,
                targeting,
                rng,
                config,
                now_ms,
                events,
            );
            let fired = result.fired;
            results.push(result);
            if !fired {
                return false;
            }
            burst.remaining = burst.remaining.saturating_sub(1);
            burst.next_at_ms = now_ms + weapon_cooldown(world, shooter, &burst.weapon);
            burst.remaining > 0
        });

        if std::mem::take(&mut self.trigger) {
            let weapon = world
                .get::<&Ship>(shooter)
                .ok()
                .and_then(|ship| self.active_weapon_name(&ship));
            let Some(weapon) = weapon else {
                let energy = world.get::<&Ship>(shooter).map_or(0.0, |s| s.energy());
                results.push(FireResult::refused(None, FireReason::NoWeapon, energy));
                return results;
            };
            let result =
                fire_weapon(shooter, &weapon, world, physics, targeting, rng, config, now_ms, events);
            let burst_shots = world
                .get::<&Ship>(shooter)
                .ok()
                .and_then(|ship| ship.system(&weapon).and_then(|s| s.weapon_stats()).map(|w| w.max_burst_shots))
                .unwrap_or(1);
            if result.fired && burst_shots > 1 && !self.bursts.iter().any(|b| b.weapon == weapon) {
                self.bursts.push(Burst {
                    next_at_ms: now_ms + weapon_cooldown(world, shooter, &weapon),
                    weapon,
                    remaining: burst_shots - 1,
                });
            }
            results.push(result);
        }
        results
    }
}

fn weapon_cooldown(world: &World, shooter: Entity, weapon: &str) -> f64 {
    world
        .get::<&Ship>(shooter)
        .ok()
        .and_then(|ship| ship.system(weapon).map(|s| s.shot_cooldown_ms()))
        .unwrap_or(f64::INFINITY)
}

/// One shot of `weapon` from `shooter`: gate, pay, then resolve or launch.
#[allow(clippy::too_many_arguments)]
pub fn fire_weapon(
    shooter: Entity,
    weapon: &str,
    world: &mut World,
    physics: &mut PhysicsWorld,
    targeting: &TargetingComputer,
    rng: &mut ChaCha8Rng,
    config: &CombatConfig,
    now_ms: f64,
    events: &mut Vec<GameEvent>,
) -> FireResult {
    let own_body = world.get::<&PhysicsBody>(shooter).ok().map(|b| *b);
    let (shot, origin, dir, energy) = {
        let Ok(mut ship) = world.get::<&mut Ship>(shooter) else {
            return FireResult::refused(Some(weapon), FireReason::NoWeapon, 0.0);
        };
        match ship.fire_weapon(weapon, now_ms) {
            Ok(shot) => (shot, ship.position(), ship.forward(), ship.energy()),
            Err(reason) => {
                debug!("{weapon}: not fired ({reason})");
                return FireResult::refused(Some(weapon), reason, ship.energy());
            }
        }
    };
    events.push(GameEvent::WeaponFired {
        weapon: weapon.to_string(),
        class: shot.stats.class,
    });
    let result = FireResult::fired(&shot, energy);

    match shot.stats.class {
        WeaponClass::ScanHit => {
            let query = ScanQuery {
                origin,
                dir,
                range_km: shot.stats.range_km,
                own_body: own_body.map(|b| b.0),
                intended: targeting.current_target_data(),
                effectiveness: shot.effectiveness,
            };
            match resolve_scan_hit(physics, &query, config, rng) {
                ScanResolution::Hit(hit) => {
                    land_scan_hit(shooter, &shot, hit, result, world, targeting, rng, config, events)
                }
                ScanResolution::Miss(reason) => result.with_miss(reason),
            }
        }
        WeaponClass::Projectile => {
            let homing_target = if shot.stats.homing {
                targeting.current_target_data().and_then(|t| t.entity)
            } else {
                None
            };
            let projectile = Projectile {
                weapon: shot.weapon.clone(),
                damage: shot.damage(),
                damage_type: shot.stats.damage_type,
                owner: shooter,
                spawn_time: now_ms / 1000.0,
                spawn_position: origin,
                max_lifetime: shot.stats.projectile_lifetime_secs,
                range_km: shot.stats.range_km,
                speed: shot.stats.projectile_speed,
                homing_target,
                sub_target: targeting.sub_target().map(str::to_string),
                spent: false,
            };
            let velocity = dir * shot.stats.projectile_speed;
            world_setup::spawn_projectile(world, physics, projectile, origin, velocity, own_body);
            result
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn land_scan_hit(
    shooter: Entity,
    shot: &Shot,
    hit: ScanHit,
    mut result: FireResult,
    world: &mut World,
    targeting: &TargetingComputer,
    rng: &mut ChaCha8Rng,
    config: &CombatConfig,
    events: &mut Vec<GameEvent>,
) -> FireResult {
    result.hit = true;
    result.target_id = Some(hit.id.clone());
    result.point = Some(hit.point);
    result.distance_km = Some(hit.distance_km);
    let Some(victim) = hit.entity else {
        return result;
    };
    let locked = targeting.current_target_data().and_then(|t| t.entity) == Some(victim);
    let spec = HitSpec {
        victim,
        damage: shot.damage(),
        damage_type: shot.stats.damage_type,
        sub_target: if locked { targeting.sub_target() } else { None },
        attacker: Some(shooter),
        weapon: &shot.weapon,
        point: hit.point,
    };
    if let Some(report) = apply_hit(world, &spec, config, rng, events) {
        result.damage = report.actual;
    }
    debug!(
        "{} hit {} at {:.2} km via {:?}",
        shot.weapon, hit.id, hit.distance_km, hit.method
    );
    result
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use planetz_core::cards::{Card, InstalledCards};
    use planetz_core::enums::{CardType, ShipClass};
    use planetz_core::types::SectorKey;

    use super::*;

    #[test]
    fn due_bursts_fire_in_queue_order() {
        let mut ship = Ship::new("Test", ShipClass::LightFighter);
        let cards: InstalledCards = [
            (CardType::EnergyReactor, 1),
            (CardType::LaserCannon, 2),
            (CardType::PulseCannon, 2),
        ]
        .into_iter()
        .enumerate()
        .map(|(i, (card_type, level))| (format!("slot_{i:02}"), Card::new(card_type, level).unwrap()))
        .collect();
        ship.install_cards(&cards).unwrap();
        ship.set_energy(100.0);

        let mut world = World::new();
        let shooter = world.spawn((ship,));
        let mut physics = PhysicsWorld::default();
        let targeting = TargetingComputer::new(SectorKey::parse("A0").unwrap());
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut events = Vec::new();

        let mut coordinator = CombatCoordinator::new();
        coordinator.bursts = ["laser_cannon", "pulse_cannon"]
            .into_iter()
            .map(|weapon| Burst {
                weapon: weapon.to_string(),
                remaining: 1,
                next_at_ms: 0.0,
            })
            .collect();

        let results = coordinator.run(
            shooter,
            &mut world,
            &mut physics,
            &targeting,
            &mut rng,
            &CombatConfig::default(),
            0.0,
            &mut events,
        );

        let order: Vec<_> = results.iter().map(|r| r.weapon.as_deref()).collect();
        assert_eq!(order, vec![Some("laser_cannon"), Some("pulse_cannon")]);
        assert!(results.iter().all(|r| r.fired));
        assert_eq!(coordinator.pending_burst_shots(), 0);
    }
}
