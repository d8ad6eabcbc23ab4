//! Runtime configuration loaded from TOML.
//!
//! Every field defaults to the matching constant in [`crate::constants`], so a
//! minimal file only needs the keys it wants to override:
//!
//! ```toml
//! seed = 7
//! start_sector = "B1"
//!
//! [combat]
//! shield_absorb = 25.0
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::enums::ShipClass;
use crate::error::{PlanetzError, PlanetzResult};
use crate::types::SectorKey;

/// Configuration for starting a new simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// RNG seed for determinism. Same seed = same simulation.
    pub seed: u64,
    /// Frame loop rate (Hz).
    pub tick_rate: u32,
    /// Sector the player starts in.
    pub start_sector: String,
    /// Hull class of the player ship.
    pub ship_class: ShipClass,
    pub physics: PhysicsConfig,
    pub combat: CombatConfig,
    pub discovery: DiscoveryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Interior sub-step rate (Hz).
    pub substep_hz: f64,
    /// Longest frame accepted before clamping (seconds).
    pub max_frame_dt: f64,
    /// Per-pair collision dispatch cooldown (ms).
    pub pair_cooldown_ms: f64,
    /// When false, scan-hit resolution uses the graphics-ray fallback.
    pub raycast_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    pub shield_absorb: f64,
    pub system_damage_threshold: f64,
    pub collateral_fraction: f64,
    pub sub_target_fraction: f64,
    pub near_line_tolerance_km: f64,
    pub aim_tolerance_base_km: f64,
    pub aim_tolerance_per_km: f64,
    pub crosshair_angle_deg: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Radius used when no scanner is installed (km).
    pub default_radius_km: f64,
    /// Scan cadence used when no scanner is installed (Hz).
    pub default_hz: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            tick_rate: TICK_RATE,
            start_sector: DEFAULT_START_SECTOR.to_string(),
            ship_class: ShipClass::default(),
            physics: PhysicsConfig::default(),
            combat: CombatConfig::default(),
            discovery: DiscoveryConfig::default(),
        }
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            substep_hz: 1.0 / PHYSICS_SUBSTEP,
            max_frame_dt: MAX_FRAME_DT,
            pair_cooldown_ms: COLLISION_PAIR_COOLDOWN_MS,
            raycast_enabled: true,
        }
    }
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            shield_absorb: SHIELD_ABSORB,
            system_damage_threshold: SYSTEM_DAMAGE_THRESHOLD,
            collateral_fraction: COLLATERAL_DAMAGE_FRACTION,
            sub_target_fraction: SUB_TARGET_DAMAGE_FRACTION,
            near_line_tolerance_km: NEAR_LINE_TOLERANCE_KM,
            aim_tolerance_base_km: AIM_TOLERANCE_BASE_KM,
            aim_tolerance_per_km: AIM_TOLERANCE_PER_KM,
            crosshair_angle_deg: CROSSHAIR_ANGLE_DEG,
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            default_radius_km: DEFAULT_DISCOVERY_RADIUS_KM,
            default_hz: DEFAULT_DISCOVERY_HZ,
        }
    }
}

impl SimConfig {
    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> PlanetzResult<Self> {
        let config: SimConfig =
            toml::from_str(text).map_err(|e| PlanetzError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> PlanetzResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| PlanetzError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// Reject values the frame loop cannot run with.
    pub fn validate(&self) -> PlanetzResult<()> {
        if self.tick_rate == 0 {
            return Err(PlanetzError::Config("tick_rate must be > 0".into()));
        }
        if self.physics.substep_hz <= 0.0 || self.physics.max_frame_dt <= 0.0 {
            return Err(PlanetzError::Config(
                "physics substep_hz and max_frame_dt must be > 0".into(),
            ));
        }
        SectorKey::parse(&self.start_sector)?;
        Ok(())
    }

    /// Seconds per frame.
    pub fn dt(&self) -> f64 {
        1.0 / self.tick_rate as f64
    }
}

impl CombatConfig {
    /// Lock tolerance around an intended target, strictly increasing with distance.
    pub fn aim_tolerance_km(&self, distance_km: f64) -> f64 {
        self.aim_tolerance_base_km + self.aim_tolerance_per_km * distance_km.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = SimConfig::from_toml_str(
            r#"
            seed = 7
            start_sector = "B1"

            [combat]
            shield_absorb = 25.0
            "#,
        )
        .unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.start_sector, "B1");
        assert_eq!(config.combat.shield_absorb, 25.0);
        assert_eq!(config.combat.system_damage_threshold, SYSTEM_DAMAGE_THRESHOLD);
        assert_eq!(config.tick_rate, TICK_RATE);
        assert!(config.physics.raycast_enabled);
    }

    #[test]
    fn bad_sector_rejected() {
        let err = SimConfig::from_toml_str("start_sector = \"zz\"").unwrap_err();
        assert_eq!(err, PlanetzError::InvalidSectorKey("zz".into()));
    }

    #[test]
    fn aim_tolerance_increases_with_distance() {
        let combat = CombatConfig::default();
        let near = combat.aim_tolerance_km(1.0);
        let far = combat.aim_tolerance_km(20.0);
        assert!(far > near);
        assert!((combat.aim_tolerance_km(0.0) - AIM_TOLERANCE_BASE_KM).abs() < 1e-12);
    }
}
