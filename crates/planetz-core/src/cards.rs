//! Cards and the card catalog.
//!
//! The catalog is a pure lookup: `(card_type, level, rarity) -> CardStats`.
//! Every ship system is instantiated from one card through this table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{IMPULSE_ENERGY_SCALING, SHIELD_ABSORB};
use crate::enums::*;
use crate::error::{PlanetzError, PlanetzResult};

pub const MIN_CARD_LEVEL: u8 = 1;
pub const MAX_CARD_LEVEL: u8 = 5;

/// Immutable card descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub card_type: CardType,
    pub level: u8,
    #[serde(default)]
    pub rarity: Rarity,
}

impl Card {
    pub fn new(card_type: CardType, level: u8) -> PlanetzResult<Self> {
        if !(MIN_CARD_LEVEL..=MAX_CARD_LEVEL).contains(&level) {
            return Err(PlanetzError::InvalidCardLevel(level));
        }
        Ok(Self {
            card_type,
            level,
            rarity: Rarity::Common,
        })
    }

    pub fn with_rarity(mut self, rarity: Rarity) -> Self {
        self.rarity = rarity;
        self
    }

    pub fn validate(&self) -> PlanetzResult<()> {
        if (MIN_CARD_LEVEL..=MAX_CARD_LEVEL).contains(&self.level) {
            Ok(())
        } else {
            Err(PlanetzError::InvalidCardLevel(self.level))
        }
    }

    pub fn stats(&self) -> CardStats {
        card_stats(self.card_type, self.level, self.rarity)
    }

    pub fn slot_cost(&self) -> u32 {
        slot_cost(self.card_type)
    }
}

/// Installed-cards input: slot id -> card. Ordered so rebuilds are deterministic.
pub type InstalledCards = BTreeMap<String, Card>;

/// Cargo hold special features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CargoFeature {
    BasicStorage,
    EnvironmentalControl,
    ScanResistance,
    MagneticContainment,
    DamageResistance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponStats {
    pub class: WeaponClass,
    pub damage: f64,
    pub damage_type: DamageType,
    /// Shots per second.
    pub fire_rate: f64,
    pub energy_per_shot: f64,
    pub range_km: f64,
    pub accuracy: f64,
    /// Shots fired per trigger pull (= card level).
    pub max_burst_shots: u32,
    /// Projectile speed (km/s); zero for scan-hit weapons.
    pub projectile_speed: f64,
    /// Projectile lifetime (seconds); zero for scan-hit weapons.
    pub projectile_lifetime_secs: f64,
    pub homing: bool,
}

impl WeaponStats {
    /// Minimum interval between shots in milliseconds (`1000 / fire_rate`).
    pub fn shot_cooldown_ms(&self) -> f64 {
        if self.fire_rate <= 0.0 {
            f64::INFINITY
        } else {
            1000.0 / self.fire_rate
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineStats {
    pub max_impulse: u8,
    /// Energy per second at impulse 1 before efficiency.
    pub base_draw: f64,
    /// Fractional draw reduction.
    pub efficiency_bonus: f64,
}

impl EngineStats {
    /// Energy per second at a given impulse level.
    pub fn draw_at(&self, impulse: u8) -> f64 {
        let idx = (impulse as usize).min(IMPULSE_ENERGY_SCALING.len() - 1);
        self.base_draw * IMPULSE_ENERGY_SCALING[idx] * (1.0 - self.efficiency_bonus)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactorStats {
    pub max_energy: f64,
    pub recharge_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HullStats {
    pub max_hull: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShieldStats {
    /// Flat damage absorbed per hit at full effectiveness.
    pub absorb: f64,
    pub energy_draw: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorStats {
    pub range_km: f64,
    pub update_hz: f64,
    pub energy_draw: f64,
    /// Target computers from level 2 can lock individual systems.
    pub sub_targeting: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CargoStats {
    pub capacity: u32,
    pub features: Vec<CargoFeature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarpStats {
    pub energy_per_jump: f64,
    pub cooldown_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairStats {
    /// Health restored per second at full effectiveness.
    pub repair_rate: f64,
    pub energy_draw: f64,
}

/// Derived stats for one card, by category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CardStats {
    Weapon(WeaponStats),
    Engine(EngineStats),
    Reactor(ReactorStats),
    Hull(HullStats),
    Shield(ShieldStats),
    Sensor(SensorStats),
    Cargo(CargoStats),
    Warp(WarpStats),
    Repair(RepairStats),
}

/// `1 + (level - 1) * per_level`.
pub fn level_factor(level: u8, per_level: f64) -> f64 {
    1.0 + (level.max(1) - 1) as f64 * per_level
}

/// Slots a card occupies.
pub fn slot_cost(card_type: CardType) -> u32 {
    match card_type {
        CardType::ParticleBeam | CardType::PhotonTorpedo => 2,
        _ => 1,
    }
}

/// Pure catalog lookup.
pub fn card_stats(card_type: CardType, level: u8, rarity: Rarity) -> CardStats {
    use CardType::*;
    let level = level.clamp(MIN_CARD_LEVEL, MAX_CARD_LEVEL);
    let r = rarity.multiplier();
    match card_type {
        HullPlating => CardStats::Hull(HullStats {
            max_hull: 500.0 * level_factor(level, 0.2) * r,
        }),
        EnergyReactor => CardStats::Reactor(ReactorStats {
            max_energy: 500.0 * level_factor(level, 0.25) * r,
            recharge_rate: 10.0 * level_factor(level, 0.2),
        }),
        LaserCannon | PulseCannon | PlasmaCannon | PhaserArray | DisruptorCannon
        | ParticleBeam | StandardMissile | HomingMissile | PhotonTorpedo | ProximityMine => {
            CardStats::Weapon(weapon_stats(card_type, level, r))
        }
        ImpulseEngines => CardStats::Engine(EngineStats {
            max_impulse: match level {
                1 => 6,
                2 => 7,
                3 => 8,
                _ => 9,
            },
            base_draw: 2.0,
            efficiency_bonus: 0.05 * (level - 1) as f64,
        }),
        WarpDrive => CardStats::Warp(WarpStats {
            energy_per_jump: 200.0 * (1.0 - 0.1 * (level - 1) as f64),
            cooldown_secs: 60.0 / level as f64,
        }),
        ShieldGenerator => CardStats::Shield(ShieldStats {
            absorb: SHIELD_ABSORB * level_factor(level, 0.25) * r,
            energy_draw: 5.0 * level_factor(level, 0.1),
        }),
        LongRangeScanner => CardStats::Sensor(SensorStats {
            range_km: 50.0 + 25.0 * (level - 1) as f64,
            update_hz: level_factor(level, 0.5),
            energy_draw: 1.0,
            sub_targeting: false,
        }),
        TargetComputer => CardStats::Sensor(SensorStats {
            range_km: 20.0 + 10.0 * (level - 1) as f64,
            update_hz: 2.0 * level_factor(level, 0.5),
            energy_draw: 2.0,
            sub_targeting: level >= 2,
        }),
        SubspaceRadar => CardStats::Sensor(SensorStats {
            range_km: 25.0 * level as f64,
            update_hz: level as f64,
            energy_draw: 1.5,
            sub_targeting: false,
        }),
        CargoHold | ReinforcedCargoHold | ShieldedCargoHold => {
            CardStats::Cargo(cargo_stats(card_type, level, r))
        }
        DamageControl => CardStats::Repair(RepairStats {
            repair_rate: 2.0 * level_factor(level, 0.5),
            energy_draw: 3.0,
        }),
    }
}

fn weapon_stats(card_type: CardType, level: u8, rarity_mult: f64) -> WeaponStats {
    use CardType::*;
    use DamageType::*;
    use WeaponClass::*;
    // class, damage, type, rate, energy, range, accuracy, speed, lifetime, homing
    let (class, damage, damage_type, fire_rate, energy, range, accuracy, speed, lifetime, homing) =
        match card_type {
            LaserCannon => (ScanHit, 50.0, Energy, 2.0, 15.0, 20.0, 0.9, 0.0, 0.0, false),
            PulseCannon => (ScanHit, 35.0, Energy, 4.0, 8.0, 15.0, 0.85, 0.0, 0.0, false),
            PlasmaCannon => (ScanHit, 80.0, Energy, 1.0, 30.0, 25.0, 0.8, 0.0, 0.0, false),
            PhaserArray => (ScanHit, 60.0, Energy, 1.5, 20.0, 30.0, 0.9, 0.0, 0.0, false),
            DisruptorCannon => (ScanHit, 100.0, Energy, 0.8, 40.0, 25.0, 0.85, 0.0, 0.0, false),
            ParticleBeam => (ScanHit, 120.0, Energy, 0.5, 50.0, 35.0, 0.95, 0.0, 0.0, false),
            StandardMissile => (Projectile, 150.0, Explosive, 0.5, 10.0, 40.0, 0.8, 750.0, 8.0, false),
            HomingMissile => (Projectile, 120.0, Explosive, 0.4, 12.0, 50.0, 0.95, 600.0, 10.0, true),
            PhotonTorpedo => (Projectile, 300.0, Energy, 0.2, 60.0, 60.0, 0.85, 500.0, 12.0, false),
            ProximityMine => (Projectile, 200.0, Explosive, 0.25, 20.0, 5.0, 0.7, 50.0, 30.0, false),
            _ => (ScanHit, 0.0, Kinetic, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, false),
        };
    WeaponStats {
        class,
        damage: damage * level_factor(level, 0.2) * rarity_mult,
        damage_type,
        fire_rate: fire_rate * level_factor(level, 0.1),
        energy_per_shot: energy,
        range_km: range * level_factor(level, 0.1),
        accuracy: (accuracy + 0.02 * (level - 1) as f64).min(0.99),
        max_burst_shots: level as u32,
        projectile_speed: speed,
        projectile_lifetime_secs: lifetime,
        homing,
    }
}

fn cargo_stats(card_type: CardType, level: u8, rarity_mult: f64) -> CargoStats {
    use CargoFeature::*;
    let (base, features) = match card_type {
        CardType::ReinforcedCargoHold => (8.0, vec![BasicStorage, DamageResistance]),
        CardType::ShieldedCargoHold => (
            6.0,
            vec![BasicStorage, ScanResistance, MagneticContainment],
        ),
        _ => (10.0, vec![BasicStorage, EnvironmentalControl]),
    };
    CargoStats {
        capacity: (base * rarity_mult * level_factor(level, 0.3)).floor() as u32,
        features,
    }
}

/// Slot budget of a hull class.
pub fn total_slots(class: ShipClass) -> u32 {
    match class {
        ShipClass::StarterShip => 10,
        ShipClass::Scout => 12,
        ShipClass::LightFighter => 14,
        ShipClass::HeavyFighter => 18,
        ShipClass::LightFreighter => 16,
        ShipClass::HeavyFreighter => 20,
    }
}

/// Loadout a freshly issued hull comes with.
pub fn default_loadout(class: ShipClass) -> InstalledCards {
    use CardType::*;
    let mut cards: Vec<(CardType, u8)> = vec![
        (HullPlating, 1),
        (EnergyReactor, 1),
        (ImpulseEngines, 1),
        (ShieldGenerator, 1),
        (TargetComputer, 1),
        (LongRangeScanner, 1),
    ];
    match class {
        ShipClass::StarterShip => cards.push((LaserCannon, 1)),
        ShipClass::Scout => {
            cards.push((PulseCannon, 1));
            cards.push((SubspaceRadar, 2));
            cards.push((WarpDrive, 1));
        }
        ShipClass::LightFighter => {
            cards.push((LaserCannon, 2));
            cards.push((StandardMissile, 1));
            cards.push((WarpDrive, 1));
        }
        ShipClass::HeavyFighter => {
            cards.push((PlasmaCannon, 2));
            cards.push((LaserCannon, 2));
            cards.push((HomingMissile, 2));
            cards.push((WarpDrive, 1));
            cards.push((DamageControl, 1));
        }
        ShipClass::LightFreighter => {
            cards.push((LaserCannon, 1));
            cards.push((CargoHold, 1));
            cards.push((CargoHold, 1));
            cards.push((WarpDrive, 1));
        }
        ShipClass::HeavyFreighter => {
            cards.push((PulseCannon, 1));
            cards.push((CargoHold, 2));
            cards.push((ReinforcedCargoHold, 1));
            cards.push((ShieldedCargoHold, 1));
            cards.push((WarpDrive, 1));
        }
    }
    cards
        .into_iter()
        .enumerate()
        .map(|(i, (card_type, level))| {
            (
                format!("slot_{:02}", i),
                Card {
                    card_type,
                    level,
                    rarity: Rarity::Common,
                },
            )
        })
        .collect()
}
