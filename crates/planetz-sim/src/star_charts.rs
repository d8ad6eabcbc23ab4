//! Star charts: proximity discovery against the sector object database.
//!
//! The discovered set is partitioned by sector. Only the current sector's
//! partition is active; the others persist untouched until the ship returns.

use std::collections::{BTreeMap, BTreeSet};

use glam::DVec3;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use planetz_core::cards::SensorStats;
use planetz_core::config::DiscoveryConfig;
use planetz_core::error::{PlanetzError, PlanetzResult};
use planetz_core::events::GameEvent;
use planetz_core::types::{sector_of_id, SectorKey};

use crate::sector_db::ObjectDatabase;

/// Outcome of `import_discovered`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub accepted: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone)]
pub struct StarCharts {
    sector: SectorKey,
    discovered: BTreeMap<SectorKey, BTreeSet<String>>,
    radius_km: f64,
    update_hz: f64,
    since_scan: f64,
    defaults: DiscoveryConfig,
}

impl StarCharts {
    pub fn new(sector: SectorKey, defaults: DiscoveryConfig) -> Self {
        Self {
            sector,
            discovered: BTreeMap::new(),
            radius_km: defaults.default_radius_km,
            update_hz: defaults.default_hz,
            // First update scans immediately.
            since_scan: f64::INFINITY,
            defaults,
        }
    }

    /// Radius and cadence from the installed scanner, or the defaults.
    pub fn configure(&mut self, scanner: Option<&SensorStats>, effectiveness: f64) {
        match scanner {
            Some(stats) if effectiveness > 0.0 => {
                self.radius_km = stats.range_km * effectiveness;
                self.update_hz = stats.update_hz;
            }
            _ => {
                self.radius_km = self.defaults.default_radius_km;
                self.update_hz = self.defaults.default_hz;
            }
        }
    }

    pub fn sector(&self) -> &SectorKey {
        &self.sector
    }

    pub fn discovery_radius_km(&self) -> f64 {
        self.radius_km
    }

    pub fn update_hz(&self) -> f64 {
        self.update_hz
    }

    /// Throttled discovery pass.
    pub fn update(&mut self, dt: f64, ship_position: DVec3, db: &ObjectDatabase) -> Vec<GameEvent> {
        self.since_scan += dt;
        let interval = if self.update_hz > 0.0 {
            1.0 / self.update_hz
        } else {
            f64::INFINITY
        };
        if self.since_scan < interval {
            return Vec::new();
        }
        self.since_scan = 0.0;
        self.scan(ship_position, db)
    }

    /// Unthrottled discovery pass over the current sector.
    pub fn scan(&mut self, ship_position: DVec3, db: &ObjectDatabase) -> Vec<GameEvent> {
        let Some(sector) = db.sector(&self.sector) else {
            return Vec::new();
        };
        let radius = self.radius_km;
        let set = self.discovered.entry(self.sector.clone()).or_default();
        let mut events = Vec::new();
        for object in sector.all_objects() {
            if object.position.distance(ship_position) > radius || set.contains(&object.id) {
                continue;
            }
            set.insert(object.id.clone());
            debug!("discovered {} ({})", object.name, object.id);
            events.push(GameEvent::ObjectDiscovered {
                id: object.id.clone(),
                name: object.name.clone(),
                kind: object.kind,
            });
        }
        events
    }

    pub fn on_sector_change(&mut self, sector: SectorKey) {
        self.sector = sector;
        self.since_scan = f64::INFINITY;
    }

    pub fn is_discovered(&self, id: &str) -> bool {
        self.discovered
            .get(&self.sector)
            .is_some_and(|set| set.contains(id))
    }

    /// Discovered ids in the current sector.
    pub fn discovered_list(&self) -> Vec<String> {
        self.discovered
            .get(&self.sector)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Every discovered id across all sectors.
    pub fn export_discovered(&self) -> Vec<String> {
        self.discovered.values().flatten().cloned().collect()
    }

    /// Merge ids from persistence. Ids whose sector prefix is not in the
    /// database are rejected.
    pub fn import_discovered<I, S>(&mut self, ids: I, db: &ObjectDatabase) -> ImportReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut report = ImportReport::default();
        for id in ids {
            let id = id.as_ref();
            match sector_of_id(id).filter(|key| db.contains_sector(key)) {
                Some(key) => {
                    self.discovered.entry(key).or_default().insert(id.to_string());
                    report.accepted += 1;
                }
                None => {
                    warn!("star charts: rejected discovered id {id:?}");
                    report.rejected += 1;
                }
            }
        }
        report
    }

    pub fn export_json(&self) -> PlanetzResult<String> {
        serde_json::to_string(&self.export_discovered())
            .map_err(|e| PlanetzError::ObjectDatabase(e.to_string()))
    }

    pub fn import_json(&mut self, text: &str, db: &ObjectDatabase) -> PlanetzResult<ImportReport> {
        let ids: Vec<String> =
            serde_json::from_str(text).map_err(|e| PlanetzError::ObjectDatabase(e.to_string()))?;
        Ok(self.import_discovered(ids, db))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b1_db() -> ObjectDatabase {
        ObjectDatabase::from_json_str(
            r#"{ "B1": {
                "star": { "id": "B1_star", "name": "Star", "type": "star", "position": [0, 0, -500] },
                "objects": [ { "id": "B1_mining_platform", "name": "Mining Platform",
                               "type": "station", "position": [100, 0, 0] } ] } }"#,
        )
        .unwrap()
    }

    fn new_charts() -> StarCharts {
        StarCharts::new(SectorKey::parse("B1").unwrap(), DiscoveryConfig::default())
    }

    #[test]
    fn test_discovery_on_approach() {
        let db = b1_db();
        let mut charts = new_charts();
        assert!(charts.scan(DVec3::new(200.0, 0.0, 0.0), &db).is_empty());
        assert!(!charts.is_discovered("B1_mining_platform"));

        let events = charts.scan(DVec3::new(140.0, 0.0, 0.0), &db);
        assert_eq!(events.len(), 1);
        assert!(charts.is_discovered("B1_mining_platform"));

        // Already known: no second event.
        assert!(charts.scan(DVec3::new(100.0, 0.0, 0.0), &db).is_empty());
    }

    #[test]
    fn test_update_is_throttled() {
        let db = b1_db();
        let mut charts = new_charts();
        let far = DVec3::new(1000.0, 0.0, 0.0);
        charts.update(0.016, far, &db);
        // Inside the 1 s interval nothing is scanned even when close.
        let near = DVec3::new(100.0, 0.0, 0.0);
        assert!(charts.update(0.5, near, &db).is_empty());
        assert_eq!(charts.update(0.5, near, &db).len(), 1);
    }

    #[test]
    fn test_partitions_survive_sector_change() {
        let db = b1_db();
        let mut charts = new_charts();
        charts.scan(DVec3::new(100.0, 0.0, 0.0), &db);
        charts.on_sector_change(SectorKey::parse("A0").unwrap());
        assert!(!charts.is_discovered("B1_mining_platform"));
        assert!(charts.discovered_list().is_empty());
        charts.on_sector_change(SectorKey::parse("B1").unwrap());
        assert!(charts.is_discovered("B1_mining_platform"));
    }

    #[test]
    fn test_import_rejects_unknown_prefix() {
        let db = b1_db();
        let mut charts = new_charts();
        let report = charts.import_discovered(["B1_star", "Z9_nowhere", "garbage"], &db);
        assert_eq!(report, ImportReport { accepted: 1, rejected: 2 });
        assert!(charts.is_discovered("B1_star"));

        let json = charts.export_json().unwrap();
        let mut restored = new_charts();
        restored.import_json(&json, &db).unwrap();
        assert_eq!(restored.export_discovered(), vec!["B1_star".to_string()]);
    }

    #[test]
    fn test_scanner_sets_radius() {
        let mut charts = new_charts();
        let stats = SensorStats {
            range_km: 100.0,
            update_hz: 2.0,
            energy_draw: 1.0,
            sub_targeting: false,
        };
        charts.configure(Some(&stats), 1.0);
        assert_eq!(charts.discovery_radius_km(), 100.0);
        charts.configure(None, 0.0);
        assert_eq!(
            charts.discovery_radius_km(),
            planetz_core::constants::DEFAULT_DISCOVERY_RADIUS_KM
        );
    }
}
