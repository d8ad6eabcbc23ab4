//! The ship aggregate: systems built from cards, hull, energy pool, cargo.
//!
//! Only methods on `Ship` mutate its systems map. Side effects of state
//! transitions (emergency stop, forced deactivation) are applied here and
//! queued as events for the frame loop to collect.

use std::collections::BTreeMap;

use glam::{DQuat, DVec3, EulerRot};
use log::{debug, info, warn};
use rand::seq::SliceRandom;
use rand::Rng;

use planetz_core::cards::{self, CardStats, InstalledCards};
use planetz_core::config::CombatConfig;
use planetz_core::constants::*;
use planetz_core::enums::{CardType, DamageType, ShipClass, SystemState};
use planetz_core::error::{PlanetzError, PlanetzResult};
use planetz_core::events::GameEvent;
use planetz_core::state::ShipView;
use planetz_core::types::Transform;

use crate::system::{ShipSystem, Transition};
use crate::weapons::{FireReason, Shot};

/// What one `apply_damage` call did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DamageReport {
    pub absorbed: f64,
    /// Damage that reached the hull after shields.
    pub actual: f64,
    /// System picked for collateral damage and the amount it took.
    pub collateral: Option<(String, f64)>,
    /// True only on the call that brought the hull to zero.
    pub destroyed: bool,
}

/// Result of the per-tick energy update.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnergyTick {
    pub consumed: f64,
    pub recharged: f64,
    pub power_failure: bool,
}

#[derive(Debug, Clone)]
pub struct Ship {
    pub name: String,
    pub class: ShipClass,
    systems: BTreeMap<String, ShipSystem>,
    /// System names in slot order.
    slot_order: Vec<String>,
    hull: f64,
    max_hull: f64,
    energy: f64,
    max_energy: f64,
    total_slots: u32,
    used_slots: u32,
    impulse: u8,
    pub transform: Transform,
    cargo: BTreeMap<String, u32>,
    destroyed: bool,
    rules: CombatConfig,
    events: Vec<GameEvent>,
}

impl Ship {
    pub fn new(name: impl Into<String>, class: ShipClass) -> Self {
        Self {
            name: name.into(),
            class,
            systems: BTreeMap::new(),
            slot_order: Vec::new(),
            hull: SHIP_BASE_HULL,
            max_hull: SHIP_BASE_HULL,
            energy: SHIP_BASE_ENERGY,
            max_energy: SHIP_BASE_ENERGY,
            total_slots: cards::total_slots(class),
            used_slots: 0,
            impulse: 0,
            transform: Transform::default(),
            cargo: BTreeMap::new(),
            destroyed: false,
            rules: CombatConfig::default(),
            events: Vec::new(),
        }
    }

    /// A ship of `class` carrying its stock loadout.
    pub fn with_default_loadout(name: impl Into<String>, class: ShipClass) -> PlanetzResult<Self> {
        let mut ship = Self::new(name, class);
        ship.install_cards(&cards::default_loadout(class))?;
        Ok(ship)
    }

    /// Damage rules used by `apply_damage`.
    pub fn with_rules(mut self, rules: CombatConfig) -> Self {
        self.rules = rules;
        self
    }

    // ---- Build ----

    /// Rebuild every system from `installed`. Rejected sets leave the ship
    /// untouched. Hull and energy are refilled to the new maxima.
    pub fn install_cards(&mut self, installed: &InstalledCards) -> PlanetzResult<()> {
        let mut required = 0;
        for card in installed.values() {
            card.validate()?;
            required += card.slot_cost();
        }
        if required > self.total_slots {
            warn!(
                "{}: card set needs {} slots, hull has {}",
                self.name, required, self.total_slots
            );
            return Err(PlanetzError::SlotOverflow {
                required,
                available: self.total_slots,
            });
        }

        let mut systems = BTreeMap::new();
        let mut slot_order = Vec::with_capacity(installed.len());
        for card in installed.values() {
            let base = card.card_type.slug();
            let mut name = base.to_string();
            let mut n = 2;
            while systems.contains_key(&name) {
                name = format!("{base}_{n}");
                n += 1;
            }
            slot_order.push(name.clone());
            systems.insert(name.clone(), ShipSystem::new(name, card.clone()));
        }

        self.max_hull = systems
            .values()
            .find_map(|s: &ShipSystem| match s.stats() {
                CardStats::Hull(hull) => Some(hull.max_hull),
                _ => None,
            })
            .unwrap_or(SHIP_BASE_HULL);
        self.max_energy = systems
            .values()
            .find_map(|s: &ShipSystem| match s.stats() {
                CardStats::Reactor(reactor) => Some(reactor.max_energy),
                _ => None,
            })
            .unwrap_or(SHIP_BASE_ENERGY);
        self.systems = systems;
        self.slot_order = slot_order;
        self.used_slots = required;
        self.hull = self.max_hull;
        self.energy = self.max_energy;
        self.impulse = 0;
        self.destroyed = false;
        info!(
            "{}: rebuilt with {} systems ({}/{} slots)",
            self.name,
            self.systems.len(),
            self.used_slots,
            self.total_slots
        );
        Ok(())
    }

    // ---- Accessors ----

    pub fn system(&self, name: &str) -> Option<&ShipSystem> {
        self.systems.get(name)
    }

    /// Systems in slot order.
    pub fn systems(&self) -> impl Iterator<Item = &ShipSystem> + '_ {
        self.slot_order.iter().filter_map(|name| self.systems.get(name))
    }

    /// First installed system of a card type.
    pub fn system_of(&self, card_type: CardType) -> Option<&ShipSystem> {
        self.systems().find(|s| s.card_type() == card_type)
    }

    fn system_of_mut(&mut self, card_type: CardType) -> Option<&mut ShipSystem> {
        let name = self
            .slot_order
            .iter()
            .find(|n| self.systems.get(*n).map(|s| s.card_type()) == Some(card_type))?
            .clone();
        self.systems.get_mut(&name)
    }

    pub fn hull(&self) -> f64 {
        self.hull
    }

    pub fn max_hull(&self) -> f64 {
        self.max_hull
    }

    pub fn energy(&self) -> f64 {
        self.energy
    }

    pub fn max_energy(&self) -> f64 {
        self.max_energy
    }

    pub fn total_slots(&self) -> u32 {
        self.total_slots
    }

    pub fn used_slots(&self) -> u32 {
        self.used_slots
    }

    pub fn impulse(&self) -> u8 {
        self.impulse
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn position(&self) -> DVec3 {
        self.transform.position
    }

    pub fn forward(&self) -> DVec3 {
        self.transform.forward()
    }

    pub fn set_hull(&mut self, hull: f64) {
        self.hull = hull.clamp(0.0, self.max_hull);
    }

    pub fn set_energy(&mut self, energy: f64) {
        self.energy = energy.clamp(0.0, self.max_energy);
    }

    /// Queued side-effect events since the last drain.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // ---- Energy ----

    /// Reactor output per second, scaled by reactor condition.
    pub fn recharge_rate(&self) -> f64 {
        self.system_of(CardType::EnergyReactor)
            .and_then(|s| match s.stats() {
                CardStats::Reactor(reactor) => Some(reactor.recharge_rate * s.effectiveness()),
                _ => None,
            })
            .unwrap_or(0.0)
    }

    /// Sum of continuous draws of all active systems.
    pub fn energy_consumption_rate(&self) -> f64 {
        self.systems
            .values()
            .map(|s| s.energy_consumption_rate(self.impulse))
            .sum()
    }

    /// Deduct `amount` if the pool covers it.
    pub fn consume_energy(&mut self, amount: f64) -> bool {
        if amount < 0.0 || amount > self.energy {
            return false;
        }
        self.energy -= amount;
        true
    }

    pub fn recharge_energy(&mut self, dt: f64) -> f64 {
        self.energy = (self.energy + self.recharge_rate() * dt).min(self.max_energy);
        self.energy
    }

    /// One tick of continuous drain and recharge:
    /// `energy = clamp(E0 - drain*dt + recharge*dt, 0, max)`. When the drain
    /// outruns the pool, continuous-draw systems shut down afterwards.
    pub fn update_energy(&mut self, dt: f64) -> EnergyTick {
        let consumed = self.energy_consumption_rate() * dt;
        let recharged = self.recharge_rate() * dt;
        let available = self.energy + recharged;
        self.energy = (available - consumed).clamp(0.0, self.max_energy);
        let power_failure = consumed > available;
        if power_failure {
            warn!("{}: power failure, continuous systems offline", self.name);
            for system in self.systems.values_mut() {
                if system.is_toggleable() {
                    system.set_active(false);
                }
            }
            self.events.push(GameEvent::PowerFailure {
                ship: self.name.clone(),
            });
        }
        EnergyTick {
            consumed,
            recharged,
            power_failure,
        }
    }

    /// Energy update followed by damage-control repairs.
    pub fn update(&mut self, dt: f64) -> EnergyTick {
        let tick = self.update_energy(dt);
        self.run_damage_control(dt);
        tick
    }

    fn run_damage_control(&mut self, dt: f64) {
        let rate = match self.system_of(CardType::DamageControl) {
            Some(dc) if dc.is_active() => match dc.stats() {
                CardStats::Repair(repair) => repair.repair_rate * dc.effectiveness(),
                _ => return,
            },
            _ => return,
        };
        // DISABLED systems need a dock.
        let worst = self
            .systems
            .values()
            .filter(|s| s.is_operational() && s.health() < s.max_health())
            .min_by(|a, b| a.health_percent().total_cmp(&b.health_percent()))
            .map(|s| s.name.clone());
        if let Some(name) = worst {
            self.repair_system(&name, rate * dt);
        }
    }

    // ---- Toggles ----

    /// Switch a toggleable system of `card_type`. Returns the new state.
    pub fn set_system_active(&mut self, card_type: CardType, active: bool) -> bool {
        self.system_of_mut(card_type)
            .map_or(false, |system| system.set_active(active))
    }

    pub fn toggle_system(&mut self, card_type: CardType) -> bool {
        let current = self.system_of(card_type).map_or(false, ShipSystem::is_active);
        self.set_system_active(card_type, !current)
    }

    pub fn shields_up(&self) -> bool {
        self.system_of(CardType::ShieldGenerator)
            .map_or(false, ShipSystem::is_active)
    }

    // ---- Damage ----

    /// Apply a hit. Active shields absorb first; the rest comes off the hull.
    /// Heavy hits also damage one random operational non-core system.
    pub fn apply_damage(
        &mut self,
        amount: f64,
        damage_type: DamageType,
        rng: &mut impl Rng,
    ) -> DamageReport {
        if self.destroyed || amount <= 0.0 {
            return DamageReport::default();
        }

        let absorb = self
            .system_of(CardType::ShieldGenerator)
            .filter(|s| s.is_active())
            .and_then(|s| match s.stats() {
                CardStats::Shield(shield) => Some(
                    shield.absorb * (self.rules.shield_absorb / SHIELD_ABSORB) * s.effectiveness(),
                ),
                _ => None,
            })
            .unwrap_or(0.0);
        let absorbed = absorb.min(amount);
        let actual = amount - absorbed;
        self.hull = (self.hull - actual).max(0.0);

        let mut collateral = None;
        if actual > self.rules.system_damage_threshold {
            let candidates: Vec<String> = self
                .systems()
                .filter(|s| !s.is_core() && s.is_operational())
                .map(|s| s.name.clone())
                .collect();
            if let Some(name) = candidates.choose(rng) {
                let share = actual * self.rules.collateral_fraction;
                self.damage_system(name, share);
                collateral = Some((name.clone(), share));
            }
        }

        let destroyed = self.hull <= 0.0;
        if destroyed {
            self.destroyed = true;
            self.impulse = 0;
            info!("{} destroyed ({:?} damage)", self.name, damage_type);
        }
        debug!(
            "{}: {:.1} damage, {:.1} absorbed, hull {:.1}/{:.1}",
            self.name, amount, absorbed, self.hull, self.max_hull
        );
        DamageReport {
            absorbed,
            actual,
            collateral,
            destroyed,
        }
    }

    /// Damage a named system directly (sub-target hits, collateral).
    pub fn damage_system(&mut self, name: &str, amount: f64) -> Option<Transition> {
        let transition = self.systems.get_mut(name)?.take_damage(amount);
        if let Some(t) = transition {
            self.on_transition(name, t);
        }
        transition
    }

    pub fn repair_system(&mut self, name: &str, amount: f64) -> Option<Transition> {
        let transition = self.systems.get_mut(name)?.repair(amount);
        if let Some(t) = transition {
            self.on_transition(name, t);
        }
        transition
    }

    pub fn repair_hull(&mut self, amount: f64) -> f64 {
        if !self.destroyed {
            self.hull = (self.hull + amount.max(0.0)).min(self.max_hull);
        }
        self.hull
    }

    /// Set a system's health outright (e.g. knocked out by a scripted event).
    pub fn set_system_health(&mut self, name: &str, health: f64) -> PlanetzResult<()> {
        let system = self
            .systems
            .get_mut(name)
            .ok_or_else(|| PlanetzError::UnknownSystem(name.to_string()))?;
        if let Some(t) = system.set_health(health) {
            self.on_transition(name, t);
        }
        Ok(())
    }

    fn on_transition(&mut self, name: &str, t: Transition) {
        let card_type = match self.systems.get(name) {
            Some(system) => system.card_type(),
            None => return,
        };
        self.events.push(GameEvent::SystemStateChanged {
            ship: self.name.clone(),
            system: name.to_string(),
            from: t.from,
            to: t.to,
        });
        if card_type == CardType::ImpulseEngines {
            match t.to {
                SystemState::Disabled => {
                    if self.impulse > 0 {
                        info!("{}: engines offline, emergency stop", self.name);
                    }
                    self.impulse = 0;
                    self.events.push(GameEvent::EmergencyStop {
                        ship: self.name.clone(),
                    });
                }
                SystemState::Critical => self.impulse = self.impulse.min(CRITICAL_IMPULSE_CAP),
                _ => {}
            }
        }
    }

    /// Candidate sub-targets: non-core systems that are not DISABLED.
    pub fn sub_target_candidates(&self) -> Vec<String> {
        self.systems()
            .filter(|s| !s.is_core() && s.is_operational())
            .map(|s| s.name.clone())
            .collect()
    }

    // ---- Flight ----

    /// Request impulse `speed`. Fails without side effects when the engines
    /// are missing or DISABLED; CRITICAL engines cap at impulse 2.
    pub fn set_impulse_speed(&mut self, speed: u8) -> bool {
        let cap = match self.system_of(CardType::ImpulseEngines) {
            Some(engines) if engines.is_operational() && !self.destroyed => {
                let max = match engines.stats() {
                    CardStats::Engine(e) => e.max_impulse,
                    _ => 0,
                };
                if engines.state() == SystemState::Critical {
                    max.min(CRITICAL_IMPULSE_CAP)
                } else {
                    max
                }
            }
            _ => return false,
        };
        self.impulse = speed.min(cap).min(9);
        true
    }

    /// Current speed in km/s; zero unless the engines are operational.
    pub fn speed_kmps(&self) -> f64 {
        match self.system_of(CardType::ImpulseEngines) {
            Some(engines) if engines.is_operational() => self.impulse as f64 * IMPULSE_SPEED_KMPS,
            _ => 0.0,
        }
    }

    pub fn velocity(&self) -> DVec3 {
        self.forward() * self.speed_kmps()
    }

    pub fn set_orientation(&mut self, yaw: f64, pitch: f64) {
        self.transform.orientation = DQuat::from_euler(EulerRot::YXZ, yaw, pitch, 0.0);
    }

    // ---- Weapons ----

    /// Weapon system names in slot order.
    pub fn weapon_names(&self) -> Vec<String> {
        self.systems()
            .filter(|s| s.is_weapon())
            .map(|s| s.name.clone())
            .collect()
    }

    /// Gate and pay for one shot: disabled, then cooldown, then energy.
    /// Refusals leave the pool and cooldown untouched.
    pub fn fire_weapon(&mut self, name: &str, now_ms: f64) -> Result<Shot, FireReason> {
        let (cost, shot) = {
            let system = self.systems.get(name).ok_or(FireReason::NoWeapon)?;
            let stats = system.weapon_stats().ok_or(FireReason::NoWeapon)?;
            if !system.is_operational() || self.destroyed {
                return Err(FireReason::Disabled);
            }
            if !system.cooldown_ready(now_ms) {
                return Err(FireReason::Cooldown);
            }
            (
                system.shot_energy_cost(),
                Shot {
                    weapon: name.to_string(),
                    stats: stats.clone(),
                    effectiveness: system.effectiveness(),
                },
            )
        };
        if !self.consume_energy(cost) {
            return Err(FireReason::InsufficientEnergy);
        }
        if let Some(system) = self.systems.get_mut(name) {
            system.record_shot(now_ms);
        }
        Ok(shot)
    }

    // ---- Cargo ----

    /// Combined capacity of holds that are not DISABLED.
    pub fn cargo_capacity(&self) -> u32 {
        self.systems()
            .filter(|s| s.is_operational())
            .filter_map(|s| match s.stats() {
                CardStats::Cargo(cargo) => Some(cargo.capacity),
                _ => None,
            })
            .sum()
    }

    pub fn cargo_used(&self) -> u32 {
        self.cargo.values().sum()
    }

    pub fn cargo(&self) -> &BTreeMap<String, u32> {
        &self.cargo
    }

    /// Load up to `units`; returns how many fit.
    pub fn load_cargo(&mut self, commodity: &str, units: u32) -> u32 {
        let free = self.cargo_capacity().saturating_sub(self.cargo_used());
        let loaded = units.min(free);
        if loaded > 0 {
            *self.cargo.entry(commodity.to_string()).or_insert(0) += loaded;
        }
        loaded
    }

    /// Unload up to `units`; nothing moves without an operational hold.
    pub fn unload_cargo(&mut self, commodity: &str, units: u32) -> u32 {
        if self.cargo_capacity() == 0 {
            return 0;
        }
        let Some(stored) = self.cargo.get_mut(commodity) else {
            return 0;
        };
        let unloaded = units.min(*stored);
        *stored -= unloaded;
        if *stored == 0 {
            self.cargo.remove(commodity);
        }
        unloaded
    }

    pub fn view(&self) -> ShipView {
        ShipView {
            name: self.name.clone(),
            class: self.class,
            position: self.position(),
            hull: self.hull,
            max_hull: self.max_hull,
            energy: self.energy,
            max_energy: self.max_energy,
            impulse: self.impulse,
            used_slots: self.used_slots,
            total_slots: self.total_slots,
            destroyed: self.destroyed,
            systems: self.systems().map(ShipSystem::view).collect(),
        }
    }
}
