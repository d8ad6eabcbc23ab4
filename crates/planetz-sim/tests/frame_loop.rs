//! End-to-end runs of the frame loop through its public command interface.

use glam::DVec3;

use planetz_sim::core::commands::PlayerCommand;
use planetz_sim::core::config::SimConfig;
use planetz_sim::core::enums::{EngineState, Faction, ShipClass};
use planetz_sim::core::events::GameEvent;
use planetz_sim::sector_db::ObjectDatabase;
use planetz_sim::SimulationEngine;

fn engine_in(sector: &str, db: ObjectDatabase) -> SimulationEngine {
    let mut engine = SimulationEngine::new(SimConfig {
        start_sector: sector.to_string(),
        ..Default::default()
    })
    .unwrap();
    engine.start(Ok(db)).unwrap();
    engine
}

fn discoveries(events: &[GameEvent], id: &str) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, GameEvent::ObjectDiscovered { id: found, .. } if found == id))
        .count()
}

#[test]
fn sector_transition_replaces_target_list() {
    let mut engine = engine_in("A0", ObjectDatabase::builtin());
    engine.queue_command(PlayerCommand::ToggleTargetComputer);
    let snap = engine.tick();
    assert!(snap.target_ids.contains(&"A0_terra_prime".to_string()));
    assert!(snap.target_ids.contains(&"A0_luna".to_string()));

    engine.queue_command(PlayerCommand::ChangeSector {
        sector: "B1".to_string(),
    });
    let snap = engine.tick();

    assert_eq!(snap.sector, "B1");
    assert_eq!(snap.target_ids, vec!["B1_star", "B1_alpha_station"]);
    assert!(snap.events.iter().any(|e| matches!(
        e,
        GameEvent::SectorChanged { from, to } if from == "A0" && to == "B1"
    )));
}

#[test]
fn discovery_on_approach() {
    let db = ObjectDatabase::from_json_str(
        r#"{ "B1": {
            "star": { "id": "B1_star", "name": "Star", "type": "star", "position": [0, 0, -500] },
            "objects": [],
            "infrastructure": {
                "stations": [ { "id": "B1_mining_platform", "name": "Mining Platform",
                                "type": "station", "position": [100, 0, 0] } ] } } }"#,
    )
    .unwrap();
    let mut engine = engine_in("B1", db);
    assert_eq!(engine.star_charts().discovery_radius_km(), 50.0);

    engine.place_player(DVec3::new(200.0, 0.0, 0.0));
    let mut events = Vec::new();
    for _ in 0..90 {
        events.extend(engine.tick().events);
    }
    assert!(!engine.star_charts().is_discovered("B1_mining_platform"));
    assert_eq!(discoveries(&events, "B1_mining_platform"), 0);

    engine.place_player(DVec3::new(140.0, 0.0, 0.0));
    let mut events = Vec::new();
    for _ in 0..90 {
        events.extend(engine.tick().events);
    }
    assert!(engine.star_charts().is_discovered("B1_mining_platform"));
    assert_eq!(discoveries(&events, "B1_mining_platform"), 1);

    // Leaving range does not forget.
    engine.place_player(DVec3::new(400.0, 0.0, 0.0));
    for _ in 0..90 {
        engine.tick();
    }
    assert!(engine.star_charts().is_discovered("B1_mining_platform"));
}

#[test]
fn discovered_ids_persist_across_engines() {
    let mut engine = engine_in("A0", ObjectDatabase::builtin());
    engine.place_player(DVec3::new(125.0, 0.0, 5.0));
    engine.tick();
    let exported = engine.export_discovered();
    assert!(exported.contains(&"A0_terra_prime".to_string()));

    let mut restored = engine_in("A0", ObjectDatabase::builtin());
    let mut ids = exported.clone();
    ids.push("Q7_nowhere".to_string());
    let report = restored.import_discovered(&ids);
    assert_eq!(report.accepted, exported.len());
    assert_eq!(report.rejected, 1);
    assert!(restored.star_charts().is_discovered("A0_terra_prime"));
}

#[test]
fn same_seed_same_run() {
    let run = |seed: u64| {
        let mut engine = SimulationEngine::new(SimConfig {
            seed,
            ship_class: ShipClass::LightFighter,
            ..Default::default()
        })
        .unwrap();
        engine.start(Ok(ObjectDatabase::builtin())).unwrap();
        engine.place_player(DVec3::new(0.0, 0.0, 300.0));
        for (i, z) in [285.0, 288.0, 291.0].iter().enumerate() {
            engine
                .spawn_ship(
                    &format!("Raider {i}"),
                    ShipClass::StarterShip,
                    DVec3::new(0.3 * i as f64, 0.0, *z),
                    Faction::Hostile,
                )
                .unwrap();
        }
        engine.queue_commands([
            PlayerCommand::ToggleTargetComputer,
            PlayerCommand::ToggleShields,
        ]);
        let mut log = Vec::new();
        for tick in 0..240 {
            if tick == 2 {
                engine.queue_command(PlayerCommand::CycleTarget { direction: 1 });
            }
            if tick % 20 == 5 {
                engine.queue_command(PlayerCommand::Fire);
            }
            if tick == 100 {
                engine.queue_command(PlayerCommand::SelectWeapon { index: 1 });
            }
            log.push(serde_json::to_string(&engine.tick()).unwrap());
        }
        log
    };

    assert_eq!(run(12345), run(12345));
}

#[test]
fn degraded_start_keeps_flying() {
    let mut engine = SimulationEngine::new(SimConfig::default()).unwrap();
    let outcome = engine.start(ObjectDatabase::from_json_str("not json"));
    assert!(outcome.is_err());

    engine.queue_command(PlayerCommand::SetImpulse { speed: 2 });
    let before = engine.player_ship().unwrap().position();
    let mut snap = engine.tick();
    for _ in 0..59 {
        snap = engine.tick();
    }
    assert_eq!(snap.engine_state, EngineState::Degraded);
    assert_eq!(snap.player.impulse, 2);
    let travelled = engine.player_ship().unwrap().position().distance(before);
    assert!((travelled - 1.0).abs() < 1e-6, "travelled {travelled}");
}

#[test]
fn config_from_toml() {
    let config = SimConfig::from_toml_str(
        r#"
        seed = 7
        start_sector = "B1"

        [combat]
        shield_absorb = 30.0
        "#,
    )
    .unwrap();
    assert_eq!(config.seed, 7);
    assert_eq!(config.combat.shield_absorb, 30.0);
    assert_eq!(config.physics.substep_hz, 240.0);

    let engine = SimulationEngine::new(config).unwrap();
    assert_eq!(engine.sector().to_string(), "B1");
    assert!(SimConfig::from_toml_str("start_sector = \"b1\"").is_err());
}
