//! Error type for invariant violations and resource failures.
//!
//! Gating outcomes on the fire path (cooldown, insufficient energy, ...) are
//! not errors; they travel in-band as `FireReason` values.

use std::fmt;

/// Top-level error enum for the simulation core.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanetzError {
    /// Installing a card set would exceed the hull's slot budget.
    SlotOverflow { required: u32, available: u32 },

    /// Card level outside 1..=5.
    InvalidCardLevel(u8),

    /// Sector key not of the form `[A-Z][0-9]+`.
    InvalidSectorKey(String),

    /// Target id that cannot be normalized (e.g. purely numeric, empty).
    InvalidTargetId(String),

    /// Id scoped to a sector other than the current one.
    SectorContamination { id: String, current: String },

    /// Sector not present in the object database.
    UnknownSector(String),

    /// Named system not installed on the ship.
    UnknownSystem(String),

    /// Physics handle or graphics reference does not resolve to a live body.
    UnknownBody(String),

    /// Object database could not be read or parsed.
    ObjectDatabase(String),

    /// Configuration could not be read or parsed.
    Config(String),

    /// Operation requires the engine to be Ready.
    NotReady,
}

impl fmt::Display for PlanetzError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanetzError::SlotOverflow {
                required,
                available,
            } => write!(
                f,
                "card set needs {} slots but the hull only has {}",
                required, available
            ),
            PlanetzError::InvalidCardLevel(level) => {
                write!(f, "card level {} is outside 1..=5", level)
            }
            PlanetzError::InvalidSectorKey(key) => write!(f, "'{}' is not a sector key", key),
            PlanetzError::InvalidTargetId(id) => write!(f, "target id '{}' is invalid", id),
            PlanetzError::SectorContamination { id, current } => {
                write!(f, "id '{}' does not belong to current sector {}", id, current)
            }
            PlanetzError::UnknownSector(key) => write!(f, "sector {} is not in the database", key),
            PlanetzError::UnknownSystem(name) => write!(f, "no system named '{}'", name),
            PlanetzError::UnknownBody(what) => write!(f, "no live body for {}", what),
            PlanetzError::ObjectDatabase(msg) => write!(f, "object database: {}", msg),
            PlanetzError::Config(msg) => write!(f, "config: {}", msg),
            PlanetzError::NotReady => write!(f, "engine is not ready"),
        }
    }
}

impl std::error::Error for PlanetzError {}

/// Convenience alias: a `Result` using `PlanetzError` as the error type.
pub type PlanetzResult<T> = Result<T, PlanetzError>;
