//! Fundamental geometric, timing, and sector types.
//!
//! World space is measured in kilometres. One world unit == 1 km.

use std::fmt;
use std::str::FromStr;

use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

use crate::error::PlanetzError;

/// Forward axis of a ship in its local frame (camera convention: -Z).
pub const FORWARD: DVec3 = DVec3::NEG_Z;

/// World transform shared by physics bodies and their graphics counterparts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: DVec3,
    pub orientation: DQuat,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: DVec3::ZERO,
            orientation: DQuat::IDENTITY,
        }
    }
}

impl Transform {
    pub fn new(position: DVec3, orientation: DQuat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    pub fn at(position: DVec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Unit forward vector in world space.
    pub fn forward(&self) -> DVec3 {
        (self.orientation * FORWARD).normalize_or_zero()
    }
}

/// Simulation time tracking.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SimTime {
    /// Current tick number (increments by 1 each tick).
    pub tick: u64,
    /// Elapsed simulation time in seconds.
    pub elapsed_secs: f64,
}

impl SimTime {
    /// Advance by one tick. Elapsed time is derived from the tick count so
    /// it never drifts.
    pub fn advance(&mut self, tick_rate: u32) {
        self.tick += 1;
        self.elapsed_secs = self.tick as f64 / tick_rate.max(1) as f64;
    }

    /// Elapsed time in milliseconds (weapon cooldowns are kept in ms).
    pub fn now_ms(&self) -> f64 {
        self.elapsed_secs * 1000.0
    }
}

/// Named region of space, `[A-Z][0-9]+` (e.g. `A0`, `B12`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SectorKey(String);

impl SectorKey {
    pub fn parse(raw: &str) -> Result<Self, PlanetzError> {
        let mut chars = raw.chars();
        let valid = matches!(chars.next(), Some(c) if c.is_ascii_uppercase())
            && raw.len() > 1
            && chars.all(|c| c.is_ascii_digit());
        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(PlanetzError::InvalidSectorKey(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Id prefix for objects in this sector, e.g. `"A0_"`.
    pub fn prefix(&self) -> String {
        format!("{}_", self.0)
    }

    /// Whether `id` is scoped to this sector.
    pub fn owns(&self, id: &str) -> bool {
        id.len() > self.0.len() + 1 && id.starts_with(&self.0) && id[self.0.len()..].starts_with('_')
    }

    /// Build a sector-scoped id from a display name.
    pub fn scoped_id(&self, name: &str) -> String {
        format!("{}_{}", self.0, slugify(name))
    }
}

impl fmt::Display for SectorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SectorKey {
    type Err = PlanetzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SectorKey {
    type Error = PlanetzError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SectorKey> for String {
    fn from(key: SectorKey) -> Self {
        key.0
    }
}

/// Lowercase, spaces to `_`, anything else non-alphanumeric dropped.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if (c == ' ' || c == '_' || c == '-') && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    slug.trim_end_matches('_').to_string()
}

/// Extract the sector key an id is prefixed with, if it has a well-formed one.
pub fn sector_of_id(id: &str) -> Option<SectorKey> {
    let (prefix, rest) = id.split_once('_')?;
    if rest.is_empty() {
        return None;
    }
    SectorKey::parse(prefix).ok()
}

/// Perpendicular distance from `point` to the ray, and the ray parameter of
/// the closest approach (negative when the point is behind the origin).
pub fn ray_lateral_distance(origin: DVec3, dir: DVec3, point: DVec3) -> (f64, f64) {
    let to_point = point - origin;
    let t = to_point.dot(dir);
    let closest = origin + dir * t;
    (closest.distance(point), t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sector_key_validation() {
        assert!(SectorKey::parse("A0").is_ok());
        assert!(SectorKey::parse("Z99").is_ok());
        assert!(SectorKey::parse("a0").is_err());
        assert!(SectorKey::parse("A").is_err());
        assert!(SectorKey::parse("AB1").is_err());
        assert!(SectorKey::parse("").is_err());
    }

    #[test]
    fn slugify_names() {
        assert_eq!(slugify("Terra Prime"), "terra_prime");
        assert_eq!(slugify("  Alpha  Station "), "alpha_station");
        assert_eq!(slugify("Europa Research-Station"), "europa_research_station");
    }

    #[test]
    fn sector_ownership() {
        let a0 = SectorKey::parse("A0").unwrap();
        assert!(a0.owns("A0_luna"));
        assert!(!a0.owns("A01_luna"));
        assert!(!a0.owns("B1_luna"));
        assert!(!a0.owns("A0_"));
        assert_eq!(sector_of_id("B1_star").map(|k| k.to_string()), Some("B1".into()));
        assert_eq!(sector_of_id("42"), None);
    }

    #[test]
    fn sim_time_does_not_drift() {
        let mut time = SimTime::default();
        for _ in 0..30 {
            time.advance(60);
        }
        assert_eq!(time.now_ms(), 500.0);
        for _ in 30..3600 {
            time.advance(60);
        }
        assert_eq!(time.tick, 3600);
        assert_eq!(time.elapsed_secs, 60.0);
    }

    #[test]
    fn lateral_distance() {
        let (d, t) = ray_lateral_distance(DVec3::ZERO, DVec3::X, DVec3::new(5.0, 2.0, 0.0));
        assert!((d - 2.0).abs() < 1e-9);
        assert!((t - 5.0).abs() < 1e-9);
    }
}
