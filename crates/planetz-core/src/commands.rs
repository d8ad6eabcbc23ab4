//! Player commands delivered by the input layer.
//!
//! Commands are queued and processed at the next tick boundary.

use serde::{Deserialize, Serialize};

use crate::cards::InstalledCards;

/// All possible player actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerCommand {
    // --- Weapons ---
    /// Pull the trigger on the active weapon.
    Fire,
    /// Make the weapon at `index` (slot order) active.
    SelectWeapon { index: usize },
    /// Step the active weapon pointer (+1 / -1).
    CycleWeapon { direction: i32 },

    // --- Targeting ---
    CycleTarget { direction: i32 },
    CycleSubTarget { direction: i32 },
    /// Select a target by id or display name.
    SetTarget { id: String },
    SetSubTarget { system: String },
    ClearTarget,
    ToggleTargetComputer,

    // --- Flight ---
    /// Request impulse 0..=9.
    SetImpulse { speed: u8 },
    /// Absolute heading in radians.
    SetOrientation { yaw: f64, pitch: f64 },

    // --- Systems ---
    ToggleShields,
    ToggleDamageControl,
    /// Replace the installed card set (full ship rebuild).
    InstallCards { cards: InstalledCards },

    // --- World ---
    /// Sector-change signal from the navigation layer.
    ChangeSector { sector: String },
}
