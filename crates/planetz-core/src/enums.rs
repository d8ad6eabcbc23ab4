//! Enumeration types used throughout the simulation.

use serde::{Deserialize, Serialize};

/// Card rarity. Higher rarity multiplies base stats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    #[default]
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    /// Multiplier applied to "size" stats (damage, hull, capacity, energy).
    pub fn multiplier(self) -> f64 {
        match self {
            Rarity::Common => 1.0,
            Rarity::Rare => 1.25,
            Rarity::Epic => 1.5,
            Rarity::Legendary => 2.0,
        }
    }
}

/// Broad card grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardCategory {
    Core,
    Weapons,
    Operational,
    Sensor,
    Cargo,
    Experimental,
}

/// Every installable card type. Serialized names double as system names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardType {
    // core
    HullPlating,
    EnergyReactor,
    // scan-hit weapons
    LaserCannon,
    PulseCannon,
    PlasmaCannon,
    PhaserArray,
    DisruptorCannon,
    ParticleBeam,
    // projectile weapons
    StandardMissile,
    HomingMissile,
    PhotonTorpedo,
    ProximityMine,
    // operational
    ImpulseEngines,
    WarpDrive,
    ShieldGenerator,
    // sensors
    LongRangeScanner,
    TargetComputer,
    SubspaceRadar,
    // cargo
    CargoHold,
    ReinforcedCargoHold,
    ShieldedCargoHold,
    // experimental
    DamageControl,
}

impl CardType {
    pub const ALL: [CardType; 22] = [
        CardType::HullPlating,
        CardType::EnergyReactor,
        CardType::LaserCannon,
        CardType::PulseCannon,
        CardType::PlasmaCannon,
        CardType::PhaserArray,
        CardType::DisruptorCannon,
        CardType::ParticleBeam,
        CardType::StandardMissile,
        CardType::HomingMissile,
        CardType::PhotonTorpedo,
        CardType::ProximityMine,
        CardType::ImpulseEngines,
        CardType::WarpDrive,
        CardType::ShieldGenerator,
        CardType::LongRangeScanner,
        CardType::TargetComputer,
        CardType::SubspaceRadar,
        CardType::CargoHold,
        CardType::ReinforcedCargoHold,
        CardType::ShieldedCargoHold,
        CardType::DamageControl,
    ];

    pub fn category(self) -> CardCategory {
        use CardType::*;
        match self {
            HullPlating | EnergyReactor => CardCategory::Core,
            LaserCannon | PulseCannon | PlasmaCannon | PhaserArray | DisruptorCannon
            | ParticleBeam | StandardMissile | HomingMissile | PhotonTorpedo | ProximityMine => {
                CardCategory::Weapons
            }
            ImpulseEngines | WarpDrive | ShieldGenerator => CardCategory::Operational,
            LongRangeScanner | TargetComputer | SubspaceRadar => CardCategory::Sensor,
            CargoHold | ReinforcedCargoHold | ShieldedCargoHold => CardCategory::Cargo,
            DamageControl => CardCategory::Experimental,
        }
    }

    /// Core systems are never picked for random collateral damage
    /// and never offered as sub-targets.
    pub fn is_core(self) -> bool {
        self.category() == CardCategory::Core
    }

    /// Snake-case slug, used as the base system name on a ship.
    pub fn slug(self) -> &'static str {
        use CardType::*;
        match self {
            HullPlating => "hull_plating",
            EnergyReactor => "energy_reactor",
            LaserCannon => "laser_cannon",
            PulseCannon => "pulse_cannon",
            PlasmaCannon => "plasma_cannon",
            PhaserArray => "phaser_array",
            DisruptorCannon => "disruptor_cannon",
            ParticleBeam => "particle_beam",
            StandardMissile => "standard_missile",
            HomingMissile => "homing_missile",
            PhotonTorpedo => "photon_torpedo",
            ProximityMine => "proximity_mine",
            ImpulseEngines => "impulse_engines",
            WarpDrive => "warp_drive",
            ShieldGenerator => "shields",
            LongRangeScanner => "long_range_scanner",
            TargetComputer => "target_computer",
            SubspaceRadar => "subspace_radar",
            CargoHold => "cargo_hold",
            ReinforcedCargoHold => "reinforced_cargo_hold",
            ShieldedCargoHold => "shielded_cargo_hold",
            DamageControl => "damage_control",
        }
    }
}

/// How a weapon resolves its hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponClass {
    /// Instant resolution by raycast.
    ScanHit,
    /// Spawns a physics body that must collide to deal damage.
    Projectile,
}

/// Health-derived operating state of a ship system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SystemState {
    /// healthPercent > 75%.
    Operational,
    /// 25% < healthPercent <= 75%.
    Damaged,
    /// 0 < healthPercent <= 25%.
    Critical,
    /// healthPercent == 0.
    Disabled,
}

/// Damage flavour carried with every hit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageType {
    #[default]
    Kinetic,
    Energy,
    Explosive,
}

/// Physics-level entity classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    PlayerShip,
    EnemyShip,
    Station,
    Beacon,
    Planet,
    Moon,
    Star,
    Projectile,
}

impl EntityKind {
    pub fn is_ship(self) -> bool {
        matches!(self, EntityKind::PlayerShip | EntityKind::EnemyShip)
    }
}

/// Diplomatic stance of a target toward the player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Faction {
    Friendly,
    #[default]
    Neutral,
    Hostile,
    Unknown,
}

/// Hull configuration the card slots are laid out on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipClass {
    #[default]
    StarterShip,
    Scout,
    LightFighter,
    HeavyFighter,
    LightFreighter,
    HeavyFreighter,
}

/// Top-level engine lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    /// Waiting for the object database and physics world.
    #[default]
    Loading,
    /// Fully operational.
    Ready,
    /// A startup resource failed; combat is disabled.
    Degraded,
}
