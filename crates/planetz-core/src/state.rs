//! Game state snapshot: the visible state handed to the presentation layer each tick.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::events::GameEvent;
use crate::types::SimTime;

/// Complete state broadcast after each tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameStateSnapshot {
    pub time: SimTime,
    pub engine_state: EngineState,
    pub sector: String,
    pub player: ShipView,
    pub active_weapon: Option<String>,
    pub target: Option<TargetView>,
    /// Ids of every entry in the targeting computer, in cycle order.
    pub target_ids: Vec<String>,
    /// Discovered ids in the current sector.
    pub discovered: Vec<String>,
    pub events: Vec<GameEvent>,
    pub diagnostics: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShipView {
    pub name: String,
    pub class: ShipClass,
    pub position: DVec3,
    pub hull: f64,
    pub max_hull: f64,
    pub energy: f64,
    pub max_energy: f64,
    pub impulse: u8,
    pub used_slots: u32,
    pub total_slots: u32,
    pub destroyed: bool,
    pub systems: Vec<SystemView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemView {
    pub name: String,
    pub card_type: CardType,
    pub level: u8,
    pub health: f64,
    pub max_health: f64,
    pub state: SystemState,
    pub effectiveness: f64,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetView {
    pub id: String,
    /// Display name; "Unknown" until the object is discovered.
    pub name: String,
    pub kind: EntityKind,
    pub faction: Faction,
    pub distance_km: f64,
    pub discovered: bool,
    pub in_range: bool,
    pub sub_target: Option<String>,
    /// Hull fraction for ship targets.
    pub hull_fraction: Option<f64>,
}
