//! Live ship subsystems built from cards.
//!
//! A system's capability is the catalog stats record of its card. Health
//! drives a four-state machine and an effectiveness scalar that multiplies
//! every capability output; a DISABLED system outputs nothing but stays
//! installed and repairable.

use planetz_core::cards::{Card, CardStats, WeaponStats};
use planetz_core::constants::*;
use planetz_core::enums::{CardType, SystemState};
use planetz_core::state::SystemView;

/// A state change produced by damage or repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: SystemState,
    pub to: SystemState,
}

/// State for a health fraction in `[0, 1]`.
pub fn state_for(health_percent: f64) -> SystemState {
    if health_percent <= 0.0 {
        SystemState::Disabled
    } else if health_percent <= CRITICAL_THRESHOLD {
        SystemState::Critical
    } else if health_percent <= OPERATIONAL_THRESHOLD {
        SystemState::Damaged
    } else {
        SystemState::Operational
    }
}

#[derive(Debug, Clone)]
pub struct ShipSystem {
    pub name: String,
    pub card: Card,
    stats: CardStats,
    health: f64,
    max_health: f64,
    state: SystemState,
    active: bool,
    last_fire_ms: Option<f64>,
}

impl ShipSystem {
    pub fn new(name: impl Into<String>, card: Card) -> Self {
        let max_health =
            SYSTEM_BASE_HEALTH * (1.0 + SYSTEM_HEALTH_PER_LEVEL * (card.level as f64 - 1.0));
        let toggleable = is_toggleable(card.card_type);
        Self {
            name: name.into(),
            stats: card.stats(),
            card,
            health: max_health,
            max_health,
            state: SystemState::Operational,
            active: !toggleable,
            last_fire_ms: None,
        }
    }

    pub fn card_type(&self) -> CardType {
        self.card.card_type
    }

    pub fn level(&self) -> u8 {
        self.card.level
    }

    pub fn stats(&self) -> &CardStats {
        &self.stats
    }

    pub fn health(&self) -> f64 {
        self.health
    }

    pub fn max_health(&self) -> f64 {
        self.max_health
    }

    pub fn health_percent(&self) -> f64 {
        if self.max_health <= 0.0 {
            0.0
        } else {
            self.health / self.max_health
        }
    }

    pub fn state(&self) -> SystemState {
        self.state
    }

    /// Anything but DISABLED.
    pub fn is_operational(&self) -> bool {
        self.state != SystemState::Disabled
    }

    pub fn is_core(&self) -> bool {
        self.card.card_type.is_core()
    }

    /// Capability multiplier: 1 when OPERATIONAL, 0 when DISABLED, and a
    /// linear ramp floored at `DEGRADED_EFFECTIVENESS_FLOOR` in between.
    pub fn effectiveness(&self) -> f64 {
        match self.state {
            SystemState::Operational => 1.0,
            SystemState::Disabled => 0.0,
            SystemState::Damaged | SystemState::Critical => {
                let ramp = (self.health_percent() - CRITICAL_THRESHOLD) / (1.0 - CRITICAL_THRESHOLD);
                ramp.clamp(DEGRADED_EFFECTIVENESS_FLOOR, 1.0)
            }
        }
    }

    /// Shields, target computer and damage control are switched by the pilot;
    /// everything else is always on.
    pub fn is_toggleable(&self) -> bool {
        is_toggleable(self.card.card_type)
    }

    pub fn is_active(&self) -> bool {
        self.active && self.is_operational()
    }

    /// Returns the new activation state. DISABLED systems cannot be switched on.
    pub fn set_active(&mut self, active: bool) -> bool {
        if self.is_toggleable() {
            self.active = active && self.is_operational();
        }
        self.active
    }

    /// Continuous energy draw per second. Weapons pay per shot and return 0;
    /// engines draw according to the impulse level.
    pub fn energy_consumption_rate(&self, impulse: u8) -> f64 {
        if !self.is_active() {
            return 0.0;
        }
        match &self.stats {
            CardStats::Engine(engine) => engine.draw_at(impulse),
            CardStats::Shield(shield) => shield.energy_draw,
            CardStats::Sensor(sensor) => sensor.energy_draw,
            CardStats::Repair(repair) => repair.energy_draw,
            CardStats::Weapon(_)
            | CardStats::Reactor(_)
            | CardStats::Hull(_)
            | CardStats::Cargo(_)
            | CardStats::Warp(_) => 0.0,
        }
    }

    /// Lose health, clamped at zero. Returns the state change, if any.
    pub fn take_damage(&mut self, amount: f64) -> Option<Transition> {
        self.set_health(self.health - amount.max(0.0))
    }

    /// Regain health, clamped at the maximum. Returns the state change, if any.
    pub fn repair(&mut self, amount: f64) -> Option<Transition> {
        self.set_health(self.health + amount.max(0.0))
    }

    pub fn set_health(&mut self, health: f64) -> Option<Transition> {
        self.health = health.clamp(0.0, self.max_health);
        let to = state_for(self.health_percent());
        let from = self.state;
        if from == to {
            return None;
        }
        self.state = to;
        if to == SystemState::Disabled {
            self.active = !self.is_toggleable();
        }
        Some(Transition { from, to })
    }

    // ---- Weapon capability ----

    pub fn weapon_stats(&self) -> Option<&WeaponStats> {
        match &self.stats {
            CardStats::Weapon(weapon) => Some(weapon),
            _ => None,
        }
    }

    pub fn is_weapon(&self) -> bool {
        self.weapon_stats().is_some()
    }

    /// Minimum time between shots; doubled while CRITICAL.
    pub fn shot_cooldown_ms(&self) -> f64 {
        let base = self
            .weapon_stats()
            .map_or(f64::INFINITY, WeaponStats::shot_cooldown_ms);
        if self.state == SystemState::Critical {
            base / CRITICAL_FIRE_RATE_FACTOR
        } else {
            base
        }
    }

    /// Energy per shot including the CRITICAL inefficiency penalty.
    pub fn shot_energy_cost(&self) -> f64 {
        let base = self.weapon_stats().map_or(0.0, |w| w.energy_per_shot);
        if self.state == SystemState::Critical {
            base * CRITICAL_WEAPON_ENERGY_PENALTY
        } else {
            base
        }
    }

    pub fn cooldown_ready(&self, now_ms: f64) -> bool {
        match self.last_fire_ms {
            Some(last) => now_ms - last + TIME_EPSILON_MS >= self.shot_cooldown_ms(),
            None => true,
        }
    }

    pub fn can_fire(&self, now_ms: f64) -> bool {
        self.is_weapon() && self.is_operational() && self.cooldown_ready(now_ms)
    }

    pub fn last_fire_ms(&self) -> Option<f64> {
        self.last_fire_ms
    }

    pub(crate) fn record_shot(&mut self, now_ms: f64) {
        self.last_fire_ms = Some(now_ms);
    }

    pub fn view(&self) -> SystemView {
        SystemView {
            name: self.name.clone(),
            card_type: self.card.card_type,
            level: self.card.level,
            health: self.health,
            max_health: self.max_health,
            state: self.state,
            effectiveness: self.effectiveness(),
            active: self.is_active(),
        }
    }
}

fn is_toggleable(card_type: CardType) -> bool {
    matches!(
        card_type,
        CardType::ShieldGenerator | CardType::TargetComputer | CardType::DamageControl
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn laser() -> ShipSystem {
        ShipSystem::new("laser_cannon", Card::new(CardType::LaserCannon, 1).unwrap())
    }

    #[test]
    fn test_state_thresholds() {
        let mut sys = laser();
        assert_eq!(sys.take_damage(25.0), Some(Transition {
            from: SystemState::Operational,
            to: SystemState::Damaged,
        }));
        assert_eq!(sys.take_damage(50.0).map(|t| t.to), Some(SystemState::Critical));
        assert_eq!(sys.take_damage(26.0).map(|t| t.to), Some(SystemState::Disabled));
        assert_eq!(sys.health(), 0.0);
        assert_eq!(sys.repair(80.0).map(|t| t.to), Some(SystemState::Operational));
    }

    #[test]
    fn test_effectiveness_curve() {
        let mut sys = laser();
        assert_eq!(sys.effectiveness(), 1.0);
        sys.set_health(55.0);
        assert!((sys.effectiveness() - 0.4).abs() < 1e-9);
        sys.set_health(20.0);
        assert!(sys.effectiveness() <= 0.33);
        sys.set_health(0.0);
        assert_eq!(sys.effectiveness(), 0.0);
    }

    #[test]
    fn test_critical_weapon_penalties() {
        let mut sys = laser();
        sys.set_health(10.0);
        assert_eq!(sys.state(), SystemState::Critical);
        assert!((sys.shot_energy_cost() - 19.5).abs() < 1e-9);
        assert!((sys.shot_cooldown_ms() - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_disabled_toggleable_switches_off() {
        let mut shields = ShipSystem::new("shields", Card::new(CardType::ShieldGenerator, 1).unwrap());
        assert!(!shields.is_active());
        assert!(shields.set_active(true));
        assert!(shields.energy_consumption_rate(0) > 0.0);
        shields.set_health(0.0);
        assert!(!shields.is_active());
        assert!(!shields.set_active(true));
        assert_eq!(shields.energy_consumption_rate(0), 0.0);
    }
}
