//! Targeting computer: the sector-scoped target list, current target and
//! sub-target.
//!
//! Every entry passes through `normalize_target` on the way in, so all ids
//! carry the current sector prefix. The list is flushed and rebuilt on a
//! sector change, and `clean_contamination` removes any stragglers.

use std::collections::HashMap;

use glam::DVec3;
use log::{debug, warn};

use planetz_core::cards::SensorStats;
use planetz_core::enums::{EntityKind, Faction};
use planetz_core::error::{PlanetzError, PlanetzResult};
use planetz_core::types::{sector_of_id, slugify, SectorKey};
use planetz_physics::BodyHandle;

#[derive(Debug, Clone, PartialEq)]
pub struct TargetEntry {
    pub id: String,
    pub name: String,
    pub kind: EntityKind,
    pub faction: Faction,
    pub position: DVec3,
    pub distance_km: f64,
    pub entity: Option<hecs::Entity>,
    pub body: Option<BodyHandle>,
}

impl TargetEntry {
    pub fn is_ship(&self) -> bool {
        self.kind.is_ship()
    }
}

#[derive(Debug, Clone)]
pub struct TargetingComputer {
    sector: SectorKey,
    targets: Vec<TargetEntry>,
    known: HashMap<String, TargetEntry>,
    current: Option<String>,
    sub_target: Option<String>,
    active: bool,
    range_km: f64,
    sub_targeting: bool,
}

impl TargetingComputer {
    pub fn new(sector: SectorKey) -> Self {
        Self {
            sector,
            targets: Vec::new(),
            known: HashMap::new(),
            current: None,
            sub_target: None,
            active: false,
            range_km: 0.0,
            sub_targeting: false,
        }
    }

    pub fn sector(&self) -> &SectorKey {
        &self.sector
    }

    /// Take range and sub-targeting ability from the installed card.
    pub fn configure(&mut self, stats: Option<&SensorStats>) {
        match stats {
            Some(stats) => {
                self.range_km = stats.range_km;
                self.sub_targeting = stats.sub_targeting;
            }
            None => {
                self.range_km = 0.0;
                self.sub_targeting = false;
            }
        }
        if !self.sub_targeting {
            self.sub_target = None;
        }
    }

    pub fn range_km(&self) -> f64 {
        self.range_km
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Power the computer up or down. Powering down drops the lock.
    pub fn set_active(&mut self, active: bool) {
        if self.active && !active {
            self.clear_target();
        }
        self.active = active;
    }

    // ---- Normalization ----

    /// Canonical id for a raw id and optional display name.
    ///
    /// Ids already scoped to the current sector pass through. Otherwise the
    /// slug of the name (or of the raw id when there is no name) is scoped to
    /// the current sector. Purely numeric ids without a name are rejected, and
    /// ids scoped to another sector are contamination.
    pub fn normalize_target_id(&self, raw: &str, name: Option<&str>) -> PlanetzResult<String> {
        let raw = raw.trim();
        if self.sector.owns(raw) {
            return Ok(raw.to_string());
        }
        if sector_of_id(raw).is_some() {
            return Err(PlanetzError::SectorContamination {
                id: raw.to_string(),
                current: self.sector.to_string(),
            });
        }
        let numeric = !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit());
        let source = match name {
            Some(name) if !name.trim().is_empty() => name,
            _ if raw.is_empty() || numeric => {
                return Err(PlanetzError::InvalidTargetId(raw.to_string()))
            }
            _ => raw,
        };
        let slug = slugify(source);
        if slug.is_empty() || slug.chars().all(|c| c.is_ascii_digit()) {
            return Err(PlanetzError::InvalidTargetId(raw.to_string()));
        }
        Ok(self.sector.scoped_id(&slug))
    }

    pub fn normalize_target(&self, mut entry: TargetEntry) -> PlanetzResult<TargetEntry> {
        entry.id = self.normalize_target_id(&entry.id, Some(&entry.name))?;
        Ok(entry)
    }

    // ---- List maintenance ----

    /// Replace the list with `candidates`, normalized, in the given order.
    /// The current target survives if it is still present.
    pub fn rebuild(&mut self, candidates: impl IntoIterator<Item = TargetEntry>) {
        self.targets.clear();
        self.known.clear();
        for candidate in candidates {
            match self.normalize_target(candidate) {
                Ok(entry) => {
                    if self.known.contains_key(&entry.id) {
                        continue;
                    }
                    self.known.insert(entry.id.clone(), entry.clone());
                    self.targets.push(entry);
                }
                Err(e) => warn!("targeting: rejected entry: {e}"),
            }
        }
        if let Some(current) = &self.current {
            if !self.known.contains_key(current) {
                debug!("targeting: {current} left the list");
                self.current = None;
                self.sub_target = None;
            }
        }
    }

    /// Move to a new sector: flush everything, then rebuild.
    pub fn on_sector_change(
        &mut self,
        sector: SectorKey,
        candidates: impl IntoIterator<Item = TargetEntry>,
    ) {
        self.sector = sector;
        self.targets.clear();
        self.known.clear();
        self.current = None;
        self.sub_target = None;
        self.rebuild(candidates);
    }

    /// Drop every entry not scoped to the current sector. Returns removed ids.
    pub fn clean_contamination(&mut self) -> Vec<String> {
        let sector = self.sector.clone();
        let mut removed: Vec<String> = self
            .targets
            .iter()
            .filter(|t| !sector.owns(&t.id))
            .map(|t| t.id.clone())
            .collect();
        self.targets.retain(|t| sector.owns(&t.id));
        self.known.retain(|id, _| {
            let keep = sector.owns(id);
            if !keep && !removed.contains(id) {
                removed.push(id.clone());
            }
            keep
        });
        if self.current.as_ref().is_some_and(|id| !sector.owns(id)) {
            self.current = None;
            self.sub_target = None;
        }
        if !removed.is_empty() {
            warn!("targeting: removed {} cross-sector entries", removed.len());
        }
        removed
    }

    #[cfg(test)]
    pub(crate) fn inject_unchecked(&mut self, entry: TargetEntry) {
        self.known.insert(entry.id.clone(), entry.clone());
        self.targets.push(entry);
    }

    /// Refresh positions and distances without rebuilding the list.
    /// Entries `locate` cannot place keep their last known position.
    pub fn update_tracks(
        &mut self,
        from: DVec3,
        mut locate: impl FnMut(&TargetEntry) -> Option<DVec3>,
    ) {
        for entry in self.targets.iter_mut() {
            if let Some(position) = locate(entry) {
                entry.position = position;
            }
            entry.distance_km = entry.position.distance(from);
            if let Some(known) = self.known.get_mut(&entry.id) {
                known.position = entry.position;
                known.distance_km = entry.distance_km;
            }
        }
    }

    pub fn targets(&self) -> &[TargetEntry] {
        &self.targets
    }

    pub fn ids(&self) -> Vec<String> {
        self.targets.iter().map(|t| t.id.clone()).collect()
    }

    // ---- Selection ----

    /// Step through the list. No-op when inactive or empty.
    pub fn cycle_target(&mut self, direction: i32) -> Option<&TargetEntry> {
        if !self.active || self.targets.is_empty() {
            return None;
        }
        let n = self.targets.len() as i64;
        let current = self
            .current
            .as_ref()
            .and_then(|id| self.targets.iter().position(|t| &t.id == id));
        let next = match current {
            Some(i) => (i as i64 + direction.signum() as i64).rem_euclid(n) as usize,
            None if direction < 0 => (n - 1) as usize,
            None => 0,
        };
        self.current = Some(self.targets[next].id.clone());
        self.sub_target = None;
        self.targets.get(next)
    }

    /// Lock onto an entry by id or display name. `Ok(false)` when the
    /// computer is off or nothing matches.
    pub fn set_target(&mut self, id_or_name: &str) -> PlanetzResult<bool> {
        if !self.active {
            return Ok(false);
        }
        let found = match self.targets.iter().find(|t| t.id == id_or_name) {
            Some(entry) => Some(entry.id.clone()),
            None => {
                let by_name = self
                    .targets
                    .iter()
                    .find(|t| t.name.eq_ignore_ascii_case(id_or_name))
                    .map(|t| t.id.clone());
                match by_name {
                    Some(id) => Some(id),
                    None => {
                        let id = self.normalize_target_id(id_or_name, None)?;
                        self.known.contains_key(&id).then_some(id)
                    }
                }
            }
        };
        match found {
            Some(id) => {
                if self.current.as_ref() != Some(&id) {
                    self.sub_target = None;
                }
                self.current = Some(id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn clear_target(&mut self) {
        self.current = None;
        self.sub_target = None;
    }

    /// Forget a target that left the world (destroyed ship).
    pub fn on_target_lost(&mut self, id: &str) {
        if self.current.as_deref() == Some(id) {
            self.clear_target();
        }
        self.targets.retain(|t| t.id != id);
        self.known.remove(id);
    }

    pub fn current_target_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// The locked entry, if any.
    pub fn current_target_data(&self) -> Option<&TargetEntry> {
        let id = self.current.as_ref()?;
        self.targets.iter().find(|t| &t.id == id)
    }

    // ---- Sub-targeting ----

    pub fn sub_target(&self) -> Option<&str> {
        self.sub_target.as_deref()
    }

    fn sub_targeting_ready(&self) -> bool {
        self.active
            && self.sub_targeting
            && self.current_target_data().is_some_and(TargetEntry::is_ship)
    }

    /// Select a system on the locked ship. `candidates` are its non-core,
    /// non-DISABLED systems.
    pub fn set_sub_target(&mut self, system: &str, candidates: &[String]) -> bool {
        if !self.sub_targeting_ready() || !candidates.iter().any(|c| c == system) {
            return false;
        }
        self.sub_target = Some(system.to_string());
        true
    }

    pub fn cycle_sub_target(&mut self, direction: i32, candidates: &[String]) -> Option<&str> {
        if !self.sub_targeting_ready() || candidates.is_empty() {
            return None;
        }
        let n = candidates.len() as i64;
        let current = self
            .sub_target
            .as_ref()
            .and_then(|s| candidates.iter().position(|c| c == s));
        let next = match current {
            Some(i) => (i as i64 + direction.signum() as i64).rem_euclid(n) as usize,
            None if direction < 0 => (n - 1) as usize,
            None => 0,
        };
        self.sub_target = Some(candidates[next].clone());
        self.sub_target.as_deref()
    }

    /// Drop the sub-target if it is no longer a valid candidate.
    pub fn validate_sub_target(&mut self, candidates: &[String]) {
        if let Some(sub) = &self.sub_target {
            if !self.sub_targeting_ready() || !candidates.contains(sub) {
                self.sub_target = None;
            }
        }
    }
}
