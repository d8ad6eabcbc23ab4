//! Snapshot system: reads the world and engine state into a GameStateSnapshot.
//!
//! This system is read-only.

use hecs::World;

use planetz_core::enums::EngineState;
use planetz_core::events::GameEvent;
use planetz_core::state::*;
use planetz_core::types::SimTime;
use planetz_physics::PhysicsWorld;

use crate::combat::CombatCoordinator;
use crate::components::PlayerShip;
use crate::ship::Ship;
use crate::star_charts::StarCharts;
use crate::targeting::TargetingComputer;

/// Engine-owned state the snapshot reads besides the world.
pub struct SnapshotInputs<'a> {
    pub time: &'a SimTime,
    pub engine_state: EngineState,
    pub targeting: &'a TargetingComputer,
    pub star_charts: &'a StarCharts,
    pub combat: &'a CombatCoordinator,
    pub diagnostics: &'a [String],
}

/// Build a complete GameStateSnapshot.
pub fn build_snapshot(
    world: &World,
    physics: &PhysicsWorld,
    inputs: SnapshotInputs<'_>,
    events: Vec<GameEvent>,
) -> GameStateSnapshot {
    let mut player_query = world.query::<(&PlayerShip, &Ship)>();
    let player = player_query.iter().next().map(|(_, (_, ship))| ship);

    GameStateSnapshot {
        time: *inputs.time,
        engine_state: inputs.engine_state,
        sector: inputs.targeting.sector().to_string(),
        player: player.map(Ship::view).unwrap_or_default(),
        active_weapon: player.and_then(|ship| inputs.combat.active_weapon_name(ship)),
        target: player.and_then(|ship| build_target(world, physics, ship, &inputs)),
        target_ids: inputs.targeting.ids(),
        discovered: inputs.star_charts.discovered_list(),
        events,
        diagnostics: inputs.diagnostics.to_vec(),
    }
}

/// The locked target as the HUD sees it. Undiscovered objects stay "Unknown".
fn build_target(
    world: &World,
    physics: &PhysicsWorld,
    player: &Ship,
    inputs: &SnapshotInputs<'_>,
) -> Option<TargetView> {
    let entry = inputs.targeting.current_target_data()?;
    let position = entry
        .body
        .and_then(|b| physics.body(b))
        .map_or(entry.position, |b| b.position());
    let distance_km = position.distance(player.position());
    let discovered = entry.is_ship() || inputs.star_charts.is_discovered(&entry.id);
    let hull_fraction = entry
        .entity
        .and_then(|e| world.get::<&Ship>(e).ok())
        .map(|ship| {
            if ship.max_hull() > 0.0 {
                ship.hull() / ship.max_hull()
            } else {
                0.0
            }
        });

    Some(TargetView {
        id: entry.id.clone(),
        name: if discovered {
            entry.name.clone()
        } else {
            "Unknown".to_string()
        },
        kind: entry.kind,
        faction: entry.faction,
        distance_km,
        discovered,
        in_range: distance_km <= inputs.targeting.range_km(),
        sub_target: inputs.targeting.sub_target().map(str::to_string),
        hull_fraction,
    })
}
