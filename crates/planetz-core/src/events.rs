//! Events emitted by the simulation for mission, achievement, audio and UI layers.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::enums::*;

/// What destroyed a ship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestructionCause {
    /// Id of the attacking ship, if known.
    pub attacker: Option<String>,
    /// System name of the weapon that landed the final hit.
    pub weapon: Option<String>,
    pub damage_type: DamageType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameEvent {
    WeaponFired {
        weapon: String,
        class: WeaponClass,
    },
    /// A shot or projectile landed on a damageable body.
    Hit {
        target_id: String,
        weapon: String,
        damage: f64,
        point: DVec3,
        sub_target: Option<String>,
    },
    ShipDestroyed {
        victim: String,
        cause: DestructionCause,
    },
    ObjectDiscovered {
        id: String,
        name: String,
        kind: EntityKind,
    },
    SystemStateChanged {
        ship: String,
        system: String,
        from: SystemState,
        to: SystemState,
    },
    /// Engines went offline and impulse was forced to zero.
    EmergencyStop { ship: String },
    /// Continuous drain exceeded supply; continuous systems shut down.
    PowerFailure { ship: String },
    SectorChanged { from: String, to: String },
    TargetChanged { id: Option<String> },
    /// Cross-sector ids removed by a cleaner pass.
    ContaminationCleaned { removed: Vec<String> },
}
