#[cfg(test)]
mod tests {
    use crate::cards::*;
    use crate::commands::PlayerCommand;
    use crate::constants::IMPULSE_ENERGY_SCALING;
    use crate::enums::*;
    use crate::error::PlanetzError;
    use crate::events::{DestructionCause, GameEvent};

    fn weapon(card_type: CardType, level: u8) -> WeaponStats {
        match card_stats(card_type, level, Rarity::Common) {
            CardStats::Weapon(w) => w,
            other => panic!("expected weapon stats, got {other:?}"),
        }
    }

    // ---- Catalog ----

    #[test]
    fn test_laser_level_one_stats() {
        let laser = weapon(CardType::LaserCannon, 1);
        assert_eq!(laser.class, WeaponClass::ScanHit);
        assert_eq!(laser.damage, 50.0);
        assert_eq!(laser.fire_rate, 2.0);
        assert_eq!(laser.energy_per_shot, 15.0);
        assert_eq!(laser.max_burst_shots, 1);
        assert!((laser.shot_cooldown_ms() - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_burst_shots_follow_level() {
        for level in 1..=5 {
            assert_eq!(weapon(CardType::PulseCannon, level).max_burst_shots, level as u32);
        }
    }

    #[test]
    fn test_projectile_weapons_have_speed() {
        let missile = weapon(CardType::StandardMissile, 1);
        assert_eq!(missile.class, WeaponClass::Projectile);
        assert_eq!(missile.projectile_speed, 750.0);
        assert!(missile.projectile_lifetime_secs > 0.0);
        assert!(weapon(CardType::HomingMissile, 1).homing);
    }

    #[test]
    fn test_engine_impulse_caps_by_level() {
        let caps: Vec<u8> = (1..=5)
            .map(|level| match card_stats(CardType::ImpulseEngines, level, Rarity::Common) {
                CardStats::Engine(e) => e.max_impulse,
                _ => 0,
            })
            .collect();
        assert_eq!(caps, vec![6, 7, 8, 9, 9]);
    }

    #[test]
    fn test_engine_energy_scaling_table() {
        assert_eq!(
            IMPULSE_ENERGY_SCALING,
            [0.0, 1.0, 1.5, 2.2, 3.0, 4.0, 5.5, 7.5, 10.0, 15.0]
        );
        let CardStats::Engine(engines) = card_stats(CardType::ImpulseEngines, 1, Rarity::Common)
        else {
            panic!("engines");
        };
        assert_eq!(engines.draw_at(0), 0.0);
        assert!((engines.draw_at(9) / engines.draw_at(1) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_cargo_capacity_scaling() {
        for level in 1..=5u8 {
            let CardStats::Cargo(cargo) = card_stats(CardType::CargoHold, level, Rarity::Common)
            else {
                panic!("cargo");
            };
            let expected = (10.0 * (1.0 + (level as f64 - 1.0) * 0.3)).floor() as u32;
            assert_eq!(cargo.capacity, expected);
            assert!(cargo.features.contains(&CargoFeature::BasicStorage));
        }
    }

    #[test]
    fn test_legendary_doubles_damage() {
        let common = weapon(CardType::PlasmaCannon, 3);
        let card = Card::new(CardType::PlasmaCannon, 3)
            .unwrap()
            .with_rarity(Rarity::Legendary);
        let CardStats::Weapon(legendary) = card.stats() else {
            panic!("weapon");
        };
        assert!((legendary.damage - common.damage * 2.0).abs() < 1e-9);
        assert_eq!(legendary.fire_rate, common.fire_rate);
    }

    #[test]
    fn test_catalog_is_pure() {
        for card_type in CardType::ALL {
            for level in 1..=5 {
                assert_eq!(
                    card_stats(card_type, level, Rarity::Rare),
                    card_stats(card_type, level, Rarity::Rare)
                );
            }
        }
    }

    #[test]
    fn test_card_level_validation() {
        assert!(Card::new(CardType::LaserCannon, 1).is_ok());
        assert_eq!(
            Card::new(CardType::LaserCannon, 6),
            Err(PlanetzError::InvalidCardLevel(6))
        );
        assert!(Card::new(CardType::LaserCannon, 0).is_err());
    }

    #[test]
    fn test_default_loadouts_fit_their_hulls() {
        for class in [
            ShipClass::StarterShip,
            ShipClass::Scout,
            ShipClass::LightFighter,
            ShipClass::HeavyFighter,
            ShipClass::LightFreighter,
            ShipClass::HeavyFreighter,
        ] {
            let used: u32 = default_loadout(class).values().map(|c| c.slot_cost()).sum();
            assert!(used <= total_slots(class), "{class:?} loadout overflows");
        }
    }

    #[test]
    fn test_core_categories() {
        assert!(CardType::HullPlating.is_core());
        assert!(CardType::EnergyReactor.is_core());
        assert!(!CardType::ShieldGenerator.is_core());
        assert_eq!(CardType::DamageControl.category(), CardCategory::Experimental);
    }

    // ---- Serde ----

    #[test]
    fn test_command_tagging() {
        let json = serde_json::to_string(&PlayerCommand::CycleTarget { direction: 1 }).unwrap();
        assert_eq!(json, r#"{"type":"CycleTarget","direction":1}"#);
        let back: PlayerCommand = serde_json::from_str(r#"{"type":"Fire"}"#).unwrap();
        assert!(matches!(back, PlayerCommand::Fire));
    }

    #[test]
    fn test_card_json_defaults_rarity() {
        let card: Card =
            serde_json::from_str(r#"{"card_type":"laser_cannon","level":2}"#).unwrap();
        assert_eq!(card.card_type, CardType::LaserCannon);
        assert_eq!(card.rarity, Rarity::Common);
    }

    #[test]
    fn test_system_state_names() {
        let json = serde_json::to_string(&SystemState::Critical).unwrap();
        assert_eq!(json, "\"CRITICAL\"");
    }

    #[test]
    fn test_destruction_event_serde() {
        let event = GameEvent::ShipDestroyed {
            victim: "A0_raider".into(),
            cause: DestructionCause {
                attacker: Some("player".into()),
                weapon: Some("laser_cannon".into()),
                damage_type: DamageType::Energy,
            },
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: GameEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }
}
