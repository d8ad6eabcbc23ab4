//! Simulation constants and tuning parameters.
//!
//! These are the authoritative defaults; `SimConfig` mirrors the tunable ones.

/// Frame loop rate (Hz).
pub const TICK_RATE: u32 = 60;

/// Seconds per frame at the default tick rate.
pub const DT: f64 = 1.0 / TICK_RATE as f64;

/// Slack on millisecond comparisons between frame times (ms).
pub const TIME_EPSILON_MS: f64 = 1e-6;

// --- Physics ---

/// Fixed interior physics timestep (seconds).
pub const PHYSICS_SUBSTEP: f64 = 1.0 / 240.0;

/// Frames longer than this are clamped before sub-stepping.
pub const MAX_FRAME_DT: f64 = 0.1;

/// Cooldown before the same body pair may dispatch another collision (ms).
pub const COLLISION_PAIR_COOLDOWN_MS: f64 = 100.0;

/// Maximum celestial hits a raycast walks past before giving up.
pub const RAYCAST_MAX_STEPS: usize = 6;

/// How far past a non-damageable hit the next ray segment starts (km).
pub const RAYCAST_STEP_PAST_KM: f64 = 0.1;

/// Restitution for non-projectile contacts.
pub const CONTACT_RESTITUTION: f64 = 0.2;

// --- Ships ---

/// Hull when no plating is installed.
pub const SHIP_BASE_HULL: f64 = 100.0;

/// Energy pool when no reactor is installed.
pub const SHIP_BASE_ENERGY: f64 = 0.0;

/// Base health of a level-1 system.
pub const SYSTEM_BASE_HEALTH: f64 = 100.0;

/// Health gained per level above 1, as a fraction of base.
pub const SYSTEM_HEALTH_PER_LEVEL: f64 = 0.1;

/// Hit radius of a ship body (km).
pub const SHIP_HIT_RADIUS_KM: f64 = 0.02;

/// Ship mass used for the dynamic physics body.
pub const SHIP_MASS: f64 = 1000.0;

// --- System state thresholds (fraction of max health) ---

pub const OPERATIONAL_THRESHOLD: f64 = 0.75;
pub const CRITICAL_THRESHOLD: f64 = 0.25;

/// Effectiveness floor while DAMAGED or CRITICAL (never applies to DISABLED).
pub const DEGRADED_EFFECTIVENESS_FLOOR: f64 = 0.1;

/// Max impulse while engines are CRITICAL.
pub const CRITICAL_IMPULSE_CAP: u8 = 2;

/// Weapon energy multiplier while CRITICAL.
pub const CRITICAL_WEAPON_ENERGY_PENALTY: f64 = 1.3;

/// Weapon fire-rate multiplier while CRITICAL.
pub const CRITICAL_FIRE_RATE_FACTOR: f64 = 0.5;

// --- Damage model ---

/// Flat shield absorption at level 1.
pub const SHIELD_ABSORB: f64 = 20.0;

/// Hull damage above which a random system takes collateral damage.
pub const SYSTEM_DAMAGE_THRESHOLD: f64 = 10.0;

/// Share of hull damage passed on as collateral system damage.
pub const COLLATERAL_DAMAGE_FRACTION: f64 = 0.2;

/// Share of a hit routed to the selected sub-target system.
pub const SUB_TARGET_DAMAGE_FRACTION: f64 = 0.3;

// --- Engines ---

/// Energy draw multiplier per impulse level 0..=9.
pub const IMPULSE_ENERGY_SCALING: [f64; 10] = [0.0, 1.0, 1.5, 2.2, 3.0, 4.0, 5.5, 7.5, 10.0, 15.0];

/// World speed per impulse level (km/s).
pub const IMPULSE_SPEED_KMPS: f64 = 0.5;

// --- Scan-hit resolution ---

/// Lateral tolerance for the near-line scan (km).
pub const NEAR_LINE_TOLERANCE_KM: f64 = 0.03;

/// Aim tolerance at zero distance (km).
pub const AIM_TOLERANCE_BASE_KM: f64 = 0.05;

/// Aim tolerance growth per km of distance.
pub const AIM_TOLERANCE_PER_KM: f64 = 0.015;

/// Crosshair half-angle for the last-resort match (degrees).
pub const CROSSHAIR_ANGLE_DEG: f64 = 2.0;

/// Bodies closer than this are inside our own hull for the crosshair match (km).
pub const PROXIMITY_SUPPRESSION_KM: f64 = 0.05;

/// Upper bound of the tolerance hit roll.
pub const MAX_HIT_CHANCE: f64 = 0.95;

/// Lower bound of the range falloff term in the hit roll.
pub const MIN_RANGE_FACTOR: f64 = 0.1;

// --- Projectiles ---

/// Collision radius of a projectile body (km).
pub const PROJECTILE_RADIUS: f64 = 0.4;

/// Projectile mass.
pub const PROJECTILE_MASS: f64 = 1.0;

/// Homing turn rate (radians per second).
pub const HOMING_TURN_RATE: f64 = 1.5;

// --- Discovery ---

/// Discovery radius with no scanner installed (km).
pub const DEFAULT_DISCOVERY_RADIUS_KM: f64 = 50.0;

/// Discovery scan cadence with no scanner installed (Hz).
pub const DEFAULT_DISCOVERY_HZ: f64 = 1.0;

// --- Starting state ---

pub const DEFAULT_START_SECTOR: &str = "A0";
