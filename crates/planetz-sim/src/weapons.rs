//! Fire-path outcome records.
//!
//! Every trigger pull yields a `FireResult`; refusals and misses carry a
//! `FireReason` instead of propagating an error.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use planetz_core::cards::WeaponStats;
use planetz_core::enums::WeaponClass;

/// Why a shot did not fire or did not land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FireReason {
    Cooldown,
    InsufficientEnergy,
    Disabled,
    OutOfRange,
    NoTarget,
    NoLineOfSight,
    /// No weapon is installed under the requested name.
    NoWeapon,
    /// The engine is not Ready.
    CombatUnavailable,
}

impl FireReason {
    pub fn as_str(self) -> &'static str {
        match self {
            FireReason::Cooldown => "cooldown",
            FireReason::InsufficientEnergy => "insufficient_energy",
            FireReason::Disabled => "disabled",
            FireReason::OutOfRange => "out_of_range",
            FireReason::NoTarget => "no_target",
            FireReason::NoLineOfSight => "no_line_of_sight",
            FireReason::NoWeapon => "no_weapon",
            FireReason::CombatUnavailable => "combat_unavailable",
        }
    }
}

impl std::fmt::Display for FireReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FireResult {
    pub fired: bool,
    pub hit: bool,
    pub reason: Option<FireReason>,
    pub weapon: Option<String>,
    pub class: Option<WeaponClass>,
    pub target_id: Option<String>,
    pub point: Option<DVec3>,
    pub distance_km: Option<f64>,
    /// Damage applied to the hull path (0 for misses and projectile launches).
    pub damage: f64,
    /// Ship energy after the attempt.
    pub energy: f64,
}

impl FireResult {
    /// Refused before any energy was spent.
    pub fn refused(weapon: Option<&str>, reason: FireReason, energy: f64) -> Self {
        Self {
            fired: false,
            hit: false,
            reason: Some(reason),
            weapon: weapon.map(str::to_string),
            class: None,
            target_id: None,
            point: None,
            distance_km: None,
            damage: 0.0,
            energy,
        }
    }

    /// Fired; hit resolution fills in the rest.
    pub fn fired(shot: &Shot, energy: f64) -> Self {
        Self {
            fired: true,
            hit: false,
            reason: None,
            weapon: Some(shot.weapon.clone()),
            class: Some(shot.stats.class),
            target_id: None,
            point: None,
            distance_km: None,
            damage: 0.0,
            energy,
        }
    }

    pub fn with_miss(mut self, reason: Option<FireReason>) -> Self {
        self.hit = false;
        self.reason = reason;
        self
    }
}

/// A shot the ship has paid for, ready for hit resolution or launch.
#[derive(Debug, Clone, PartialEq)]
pub struct Shot {
    pub weapon: String,
    pub stats: WeaponStats,
    /// Weapon effectiveness at the moment of firing.
    pub effectiveness: f64,
}

impl Shot {
    /// Damage scaled by the firing weapon's condition.
    pub fn damage(&self) -> f64 {
        self.stats.damage * self.effectiveness
    }
}
