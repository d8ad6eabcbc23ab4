//! Simulation engine: the frame loop.
//!
//! `SimulationEngine` owns the hecs world, the physics world, the targeting
//! computer, the star charts and the combat coordinator. Commands queue up
//! between ticks and are applied at the next tick boundary; every tick then
//! runs the systems in a fixed order and returns a `GameStateSnapshot`.
//! Completely headless, so runs with the same seed are reproducible.

use std::collections::VecDeque;

use glam::DVec3;
use hecs::{Entity, World};
use log::{debug, info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use planetz_core::commands::PlayerCommand;
use planetz_core::config::SimConfig;
use planetz_core::enums::{CardType, EngineState, Faction, ShipClass};
use planetz_core::error::{PlanetzError, PlanetzResult};
use planetz_core::events::GameEvent;
use planetz_core::state::GameStateSnapshot;
use planetz_core::types::{SectorKey, SimTime};
use planetz_physics::PhysicsWorld;

use crate::combat::CombatCoordinator;
use crate::components::PhysicsBody;
use crate::sector_db::ObjectDatabase;
use crate::ship::Ship;
use crate::star_charts::{ImportReport, StarCharts};
use crate::systems;
use crate::systems::snapshot::SnapshotInputs;
use crate::targeting::TargetingComputer;
use crate::weapons::{FireReason, FireResult};
use crate::world_setup;

/// Where a new player ship starts in its first sector.
pub const PLAYER_SPAWN_POSITION: DVec3 = DVec3::new(100.0, 0.0, 60.0);

/// The simulation engine. Owns the ECS world and all sim state.
pub struct SimulationEngine {
    config: SimConfig,
    state: EngineState,
    world: World,
    physics: PhysicsWorld,
    database: ObjectDatabase,
    sector: SectorKey,
    pending_sector: Option<SectorKey>,
    player: Entity,
    time: SimTime,
    rng: ChaCha8Rng,
    command_queue: VecDeque<PlayerCommand>,
    despawn_buffer: Vec<Entity>,

    targeting: TargetingComputer,
    star_charts: StarCharts,
    combat: CombatCoordinator,
    registry_dirty: bool,
    last_target: Option<String>,

    events: Vec<GameEvent>,
    diagnostics: Vec<String>,
    fire_results: Vec<FireResult>,
}

impl SimulationEngine {
    /// Build the engine and the player's ship. The engine stays `Loading`
    /// until `start` hands it the object database.
    pub fn new(config: SimConfig) -> PlanetzResult<Self> {
        config.validate()?;
        let sector = SectorKey::parse(&config.start_sector)?;
        let mut world = World::new();
        let mut physics = PhysicsWorld::new(&config.physics);

        let mut ship = Ship::with_default_loadout("Player", config.ship_class)?
            .with_rules(config.combat.clone());
        ship.transform.position = PLAYER_SPAWN_POSITION;
        let player = world_setup::spawn_player_ship(&mut world, &mut physics, ship);

        Ok(Self {
            state: EngineState::Loading,
            world,
            physics,
            database: ObjectDatabase::default(),
            targeting: TargetingComputer::new(sector.clone()),
            star_charts: StarCharts::new(sector.clone(), config.discovery.clone()),
            sector,
            pending_sector: None,
            player,
            time: SimTime::default(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            command_queue: VecDeque::new(),
            despawn_buffer: Vec::new(),
            combat: CombatCoordinator::new(),
            registry_dirty: true,
            last_target: None,
            events: Vec::new(),
            diagnostics: Vec::new(),
            fire_results: Vec::new(),
            config,
        })
    }

    /// Finish initialization with the result of the object-database load.
    ///
    /// A failed load, or a database without the start sector, leaves the
    /// engine `Degraded`: ships still fly and recharge, combat is disabled.
    /// The failure is returned once here and kept in the diagnostics.
    pub fn start(&mut self, database: PlanetzResult<ObjectDatabase>) -> PlanetzResult<()> {
        if self.state != EngineState::Loading {
            warn!("engine already started ({:?})", self.state);
            return Ok(());
        }
        let database = match database {
            Ok(db) if db.contains_sector(&self.sector) => db,
            Ok(db) => {
                let err = PlanetzError::UnknownSector(self.sector.to_string());
                self.database = db;
                self.degrade(err.to_string());
                return Err(err);
            }
            Err(err) => {
                self.degrade(err.to_string());
                return Err(err);
            }
        };
        self.database = database;
        world_setup::populate_sector(
            &mut self.world,
            &mut self.physics,
            &self.database,
            &self.sector,
        )?;
        self.registry_dirty = true;
        self.state = EngineState::Ready;
        info!("engine ready in sector {}", self.sector);
        Ok(())
    }

    /// Record a resource failure and disable combat.
    pub fn degrade(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        warn!("engine degraded: {reason}");
        self.diagnostics.push(reason);
        self.state = EngineState::Degraded;
    }

    /// Queue a player command for processing at the next tick boundary.
    pub fn queue_command(&mut self, command: PlayerCommand) {
        self.command_queue.push_back(command);
    }

    /// Queue multiple commands.
    pub fn queue_commands(&mut self, commands: impl IntoIterator<Item = PlayerCommand>) {
        self.command_queue.extend(commands);
    }

    /// Advance the simulation by one frame and return the resulting snapshot.
    pub fn tick(&mut self) -> GameStateSnapshot {
        self.fire_results.clear();
        self.process_commands();

        if self.state != EngineState::Loading {
            self.apply_pending_sector();
            self.run_systems();
            self.time.advance(self.config.tick_rate);
        }
        self.note_target_change();

        let events = std::mem::take(&mut self.events);
        systems::snapshot::build_snapshot(
            &self.world,
            &self.physics,
            SnapshotInputs {
                time: &self.time,
                engine_state: self.state,
                targeting: &self.targeting,
                star_charts: &self.star_charts,
                combat: &self.combat,
                diagnostics: &self.diagnostics,
            },
            events,
        )
    }

    // ---- Accessors ----

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn sector(&self) -> &SectorKey {
        &self.sector
    }

    /// Get a read-only reference to the ECS world.
    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    pub fn database(&self) -> &ObjectDatabase {
        &self.database
    }

    pub fn targeting(&self) -> &TargetingComputer {
        &self.targeting
    }

    pub fn star_charts(&self) -> &StarCharts {
        &self.star_charts
    }

    pub fn combat(&self) -> &CombatCoordinator {
        &self.combat
    }

    pub fn player(&self) -> Entity {
        self.player
    }

    pub fn player_ship(&self) -> Option<hecs::Ref<'_, Ship>> {
        self.world.get::<&Ship>(self.player).ok()
    }

    /// Fire outcomes produced during the last tick.
    pub fn last_fire_results(&self) -> &[FireResult] {
        &self.fire_results
    }

    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    // ---- Host operations ----

    /// Spawn another ship in the current sector. It joins the target list
    /// on the next tick. Refused while the engine is still loading.
    pub fn spawn_ship(
        &mut self,
        name: &str,
        class: ShipClass,
        position: DVec3,
        faction: Faction,
    ) -> PlanetzResult<Entity> {
        if self.state == EngineState::Loading {
            return Err(PlanetzError::NotReady);
        }
        let entity = world_setup::spawn_ship(
            &mut self.world,
            &mut self.physics,
            &self.sector,
            name,
            class,
            position,
            faction,
        )?;
        self.registry_dirty = true;
        Ok(entity)
    }

    /// Move the player's ship and body (warp arrival, docking release).
    pub fn place_player(&mut self, position: DVec3) {
        if let Ok(mut ship) = self.world.get::<&mut Ship>(self.player) {
            ship.transform.position = position;
        }
        if let Ok(body) = self.world.get::<&PhysicsBody>(self.player) {
            if let Some(rigid) = self.physics.body_mut(body.0) {
                rigid.transform.position = position;
            }
        }
    }

    /// Apply `f` to the player's ship.
    pub fn with_player_ship<R>(&mut self, f: impl FnOnce(&mut Ship) -> R) -> Option<R> {
        let mut ship = self.world.get::<&mut Ship>(self.player).ok()?;
        Some(f(&mut *ship))
    }

    pub fn export_discovered(&self) -> Vec<String> {
        self.star_charts.export_discovered()
    }

    pub fn import_discovered<I, S>(&mut self, ids: I) -> ImportReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.star_charts.import_discovered(ids, &self.database)
    }

    // ---- Commands ----

    /// Process all queued commands.
    fn process_commands(&mut self) {
        while let Some(command) = self.command_queue.pop_front() {
            self.handle_command(command);
        }
    }

    /// Handle a single player command.
    fn handle_command(&mut self, command: PlayerCommand) {
        match command {
            PlayerCommand::Fire => {
                if self.state == EngineState::Ready {
                    self.combat.pull_trigger();
                } else {
                    let (weapon, energy) = self
                        .player_ship()
                        .map(|ship| (self.combat.active_weapon_name(&ship), ship.energy()))
                        .unwrap_or((None, 0.0));
                    self.fire_results.push(FireResult::refused(
                        weapon.as_deref(),
                        FireReason::CombatUnavailable,
                        energy,
                    ));
                }
            }
            PlayerCommand::SelectWeapon { index } => {
                if let Ok(ship) = self.world.get::<&Ship>(self.player) {
                    if !self.combat.select_weapon(index, &ship) {
                        debug!("no weapon at index {index}");
                    }
                }
            }
            PlayerCommand::CycleWeapon { direction } => {
                if let Ok(ship) = self.world.get::<&Ship>(self.player) {
                    self.combat.cycle_weapon(direction, &ship);
                }
            }
            PlayerCommand::CycleTarget { direction } => {
                self.targeting.cycle_target(direction);
            }
            PlayerCommand::CycleSubTarget { direction } => {
                let candidates = systems::targets::sub_target_candidates(&self.world, &self.targeting);
                self.targeting.cycle_sub_target(direction, &candidates);
            }
            PlayerCommand::SetTarget { id } => match self.targeting.set_target(&id) {
                Ok(true) => {}
                Ok(false) => debug!("no target matches {id:?}"),
                Err(e) => warn!("set target rejected: {e}"),
            },
            PlayerCommand::SetSubTarget { system } => {
                let candidates = systems::targets::sub_target_candidates(&self.world, &self.targeting);
                if !self.targeting.set_sub_target(&system, &candidates) {
                    debug!("sub-target {system:?} not selectable");
                }
            }
            PlayerCommand::ClearTarget => self.targeting.clear_target(),
            PlayerCommand::ToggleTargetComputer => {
                self.toggle_player_system(CardType::TargetComputer);
            }
            PlayerCommand::SetImpulse { speed } => {
                self.with_player_ship(|ship| ship.set_impulse_speed(speed));
            }
            PlayerCommand::SetOrientation { yaw, pitch } => {
                self.with_player_ship(|ship| ship.set_orientation(yaw, pitch));
            }
            PlayerCommand::ToggleShields => {
                self.toggle_player_system(CardType::ShieldGenerator);
            }
            PlayerCommand::ToggleDamageControl => {
                self.toggle_player_system(CardType::DamageControl);
            }
            PlayerCommand::InstallCards { cards } => {
                match self.with_player_ship(|ship| ship.install_cards(&cards)) {
                    Some(Ok(())) => {
                        self.combat.reset();
                        self.couple_player_sensors();
                        info!("player ship rebuilt with {} cards", cards.len());
                    }
                    Some(Err(e)) => warn!("card install rejected: {e}"),
                    None => {}
                }
            }
            PlayerCommand::ChangeSector { sector } => match SectorKey::parse(&sector) {
                Ok(key) => self.pending_sector = Some(key),
                Err(e) => warn!("sector change ignored: {e}"),
            },
        }
    }

    fn toggle_player_system(&mut self, card_type: CardType) {
        let active = self.with_player_ship(|ship| {
            let active = ship.toggle_system(card_type);
            (active, ship.drain_events())
        });
        if let Some((active, events)) = active {
            debug!("{card_type:?} -> {}", if active { "on" } else { "off" });
            self.events.extend(events);
        }
        self.couple_player_sensors();
    }

    fn couple_player_sensors(&mut self) {
        if let Ok(ship) = self.world.get::<&Ship>(self.player) {
            systems::energy::couple_sensors(&ship, &mut self.targeting, &mut self.star_charts);
        }
    }

    fn player_position(&self) -> DVec3 {
        self.player_ship().map_or(DVec3::ZERO, |ship| ship.position())
    }

    // ---- Frame ----

    /// Switch sectors at the tick boundary: swap the world contents, then
    /// flush and rebuild TC and DC for the new sector.
    fn apply_pending_sector(&mut self) {
        let Some(next) = self.pending_sector.take() else {
            return;
        };
        if next == self.sector {
            return;
        }
        if !self.database.contains_sector(&next) {
            let err = PlanetzError::UnknownSector(next.to_string());
            warn!("sector change refused: {err}");
            self.diagnostics.push(err.to_string());
            return;
        }

        let cleared = world_setup::clear_sector(&mut self.world, &mut self.physics);
        let from = std::mem::replace(&mut self.sector, next.clone());
        if let Err(e) =
            world_setup::populate_sector(&mut self.world, &mut self.physics, &self.database, &next)
        {
            warn!("sector {next}: {e}");
            self.diagnostics.push(e.to_string());
        }
        self.star_charts.on_sector_change(next.clone());
        let candidates =
            systems::targets::candidates(&self.world, &self.physics, self.player_position());
        self.targeting.on_sector_change(next.clone(), candidates);
        self.combat.reset();
        self.registry_dirty = false;

        info!("sector {from} -> {next} ({cleared} bodies cleared)");
        self.events.push(GameEvent::SectorChanged {
            from: from.to_string(),
            to: next.to_string(),
        });
    }

    /// Run all systems in order.
    fn run_systems(&mut self) {
        let dt = self.config.dt();
        let now_ms = self.time.now_ms();

        // 1. Ship update: drain, recharge, damage control, sensor power
        systems::energy::run(
            &mut self.world,
            &mut self.targeting,
            &mut self.star_charts,
            dt,
            &mut self.events,
        );
        // 2. Physics step
        systems::movement::run(&mut self.world, &mut self.physics);
        systems::projectiles::steer(&mut self.world, &mut self.physics, dt);
        let output = self.physics.step(dt);
        systems::movement::sync_positions(&mut self.world, &self.physics);
        // 3. Collision dispatch
        systems::projectiles::handle_collisions(
            &mut self.world,
            &self.physics,
            &output.collisions,
            &output.obstructed,
            &self.targeting,
            &self.config.combat,
            &mut self.rng,
            &mut self.events,
        );
        // 4. Combat against the just-stepped world
        if self.state == EngineState::Ready {
            let results = self.combat.run(
                self.player,
                &mut self.world,
                &mut self.physics,
                &self.targeting,
                &mut self.rng,
                &self.config.combat,
                now_ms,
                &mut self.events,
            );
            self.fire_results.extend(results);
        }
        // 5. Discovery
        let position = self.player_position();
        let found = self.star_charts.update(dt, position, &self.database);
        self.events.extend(found);
        // 6. Expiry and cleanup
        systems::projectiles::expire(&mut self.world, &self.physics, now_ms / 1000.0 + dt);
        let removed = systems::cleanup::run(
            &mut self.world,
            &mut self.physics,
            &mut self.despawn_buffer,
        );
        for id in &removed {
            self.targeting.on_target_lost(id);
        }
        // 7. Target list refresh
        if self.registry_dirty || !removed.is_empty() {
            systems::targets::refresh(&self.world, &self.physics, &mut self.targeting, position);
            self.registry_dirty = false;
        } else {
            systems::targets::track(&self.physics, &mut self.targeting, position);
            systems::targets::revalidate_sub_target(&self.world, &mut self.targeting);
        }
        let contaminated = self.targeting.clean_contamination();
        if !contaminated.is_empty() {
            self.events.push(GameEvent::ContaminationCleaned {
                removed: contaminated,
            });
        }
    }

    fn note_target_change(&mut self) {
        let current = self.targeting.current_target_id().map(str::to_string);
        if current != self.last_target {
            self.events.push(GameEvent::TargetChanged {
                id: current.clone(),
            });
            self.last_target = current;
        }
    }

    /// Mutable access for tests that set up damage or inject bad entries.
    #[cfg(test)]
    pub(crate) fn targeting_mut(&mut self) -> &mut TargetingComputer {
        &mut self.targeting
    }

    #[cfg(test)]
    pub(crate) fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}
