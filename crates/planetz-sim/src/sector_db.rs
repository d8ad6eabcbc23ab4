//! Per-sector static object database.
//!
//! Loaded from JSON keyed by sector:
//!
//! ```json
//! { "B1": { "star": { "id": "B1_star", "name": "Star", "type": "star",
//!                     "position": [0, 0, 0], "radius_km": 5 },
//!           "objects": [],
//!           "infrastructure": { "stations": [], "beacons": [] } } }
//! ```
//!
//! Ids without a sector prefix are scoped to their sector on load; ids
//! carrying another sector's prefix are rejected.

use std::collections::BTreeMap;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use planetz_core::enums::{EntityKind, Faction};
use planetz_core::error::{PlanetzError, PlanetzResult};
use planetz_core::types::{sector_of_id, SectorKey};

fn default_radius() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CelestialObject {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub position: DVec3,
    #[serde(default = "default_radius")]
    pub radius_km: f64,
    #[serde(default)]
    pub faction: Faction,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Infrastructure {
    #[serde(default)]
    pub stations: Vec<CelestialObject>,
    #[serde(default)]
    pub beacons: Vec<CelestialObject>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorData {
    pub star: CelestialObject,
    #[serde(default)]
    pub objects: Vec<CelestialObject>,
    #[serde(default)]
    pub infrastructure: Infrastructure,
}

impl SectorData {
    /// Star, then objects, then stations, then beacons.
    pub fn all_objects(&self) -> impl Iterator<Item = &CelestialObject> + '_ {
        std::iter::once(&self.star)
            .chain(self.objects.iter())
            .chain(self.infrastructure.stations.iter())
            .chain(self.infrastructure.beacons.iter())
    }

    fn all_objects_mut(&mut self) -> impl Iterator<Item = &mut CelestialObject> + '_ {
        std::iter::once(&mut self.star)
            .chain(self.objects.iter_mut())
            .chain(self.infrastructure.stations.iter_mut())
            .chain(self.infrastructure.beacons.iter_mut())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectDatabase {
    sectors: BTreeMap<SectorKey, SectorData>,
}

impl ObjectDatabase {
    pub fn from_json_str(text: &str) -> PlanetzResult<Self> {
        let mut db: ObjectDatabase =
            serde_json::from_str(text).map_err(|e| PlanetzError::ObjectDatabase(e.to_string()))?;
        db.canonicalize()?;
        Ok(db)
    }

    pub fn load(path: impl AsRef<std::path::Path>) -> PlanetzResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| PlanetzError::ObjectDatabase(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> PlanetzResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| PlanetzError::ObjectDatabase(e.to_string()))
    }

    fn canonicalize(&mut self) -> PlanetzResult<()> {
        for (key, sector) in self.sectors.iter_mut() {
            for object in sector.all_objects_mut() {
                if key.owns(&object.id) {
                    continue;
                }
                if let Some(other) = sector_of_id(&object.id) {
                    return Err(PlanetzError::SectorContamination {
                        id: object.id.clone(),
                        current: other.to_string(),
                    });
                }
                let raw = if object.id.is_empty() {
                    object.name.as_str()
                } else {
                    object.id.as_str()
                };
                object.id = key.scoped_id(raw);
            }
        }
        Ok(())
    }

    pub fn insert_sector(&mut self, key: SectorKey, data: SectorData) {
        self.sectors.insert(key, data);
    }

    pub fn sector(&self, key: &SectorKey) -> Option<&SectorData> {
        self.sectors.get(key)
    }

    pub fn contains_sector(&self, key: &SectorKey) -> bool {
        self.sectors.contains_key(key)
    }

    pub fn object(&self, id: &str) -> Option<&CelestialObject> {
        let key = sector_of_id(id)?;
        self.sectors.get(&key)?.all_objects().find(|o| o.id == id)
    }

    /// The database shipped with the game: the home sector and its neighbour.
    pub fn builtin() -> Self {
        let mut db = Self::default();
        let a0 = SectorKey::parse("A0").ok();
        let b1 = SectorKey::parse("B1").ok();
        if let Some(a0) = a0 {
            db.insert_sector(
                a0.clone(),
                SectorData {
                    star: object(&a0, "Sol", EntityKind::Star, DVec3::ZERO, 20.0),
                    objects: vec![
                        object(&a0, "Terra Prime", EntityKind::Planet, DVec3::new(120.0, 0.0, 0.0), 6.0),
                        object(&a0, "Luna", EntityKind::Moon, DVec3::new(130.0, 0.0, 15.0), 1.7),
                        object(&a0, "Ares", EntityKind::Planet, DVec3::new(-60.0, 0.0, -240.0), 3.4),
                    ],
                    infrastructure: Infrastructure {
                        stations: vec![CelestialObject {
                            faction: Faction::Friendly,
                            ..object(&a0, "Terra Station", EntityKind::Station, DVec3::new(110.0, 0.0, 12.0), 0.5)
                        }],
                        beacons: vec![object(&a0, "Sol Beacon", EntityKind::Beacon, DVec3::new(0.0, 0.0, -80.0), 0.05)],
                    },
                },
            );
        }
        if let Some(b1) = b1 {
            db.insert_sector(
                b1.clone(),
                SectorData {
                    star: object(&b1, "Star", EntityKind::Star, DVec3::ZERO, 15.0),
                    objects: Vec::new(),
                    infrastructure: Infrastructure {
                        stations: vec![CelestialObject {
                            faction: Faction::Neutral,
                            ..object(&b1, "Alpha Station", EntityKind::Station, DVec3::new(80.0, 0.0, 40.0), 0.5)
                        }],
                        beacons: Vec::new(),
                    },
                },
            );
        }
        db
    }
}

fn object(sector: &SectorKey, name: &str, kind: EntityKind, position: DVec3, radius_km: f64) -> CelestialObject {
    CelestialObject {
        id: sector.scoped_id(name),
        name: name.to_string(),
        kind,
        position,
        radius_km,
        faction: Faction::Neutral,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unprefixed_ids_are_scoped() {
        let json = r#"{ "B1": {
            "star": { "id": "", "name": "Star", "type": "star", "position": [0, 0, 0] },
            "objects": [ { "id": "mining_platform", "name": "Mining Platform",
                           "type": "station", "position": [100, 0, 0] } ] } }"#;
        let db = ObjectDatabase::from_json_str(json).unwrap();
        let b1 = SectorKey::parse("B1").unwrap();
        let ids: Vec<_> = db.sector(&b1).unwrap().all_objects().map(|o| o.id.clone()).collect();
        assert_eq!(ids, vec!["B1_star", "B1_mining_platform"]);
        assert!(db.object("B1_mining_platform").is_some());
    }

    #[test]
    fn test_foreign_prefix_rejected() {
        let json = r#"{ "B1": {
            "star": { "id": "A0_sol", "name": "Sol", "type": "star", "position": [0, 0, 0] } } }"#;
        assert!(matches!(
            ObjectDatabase::from_json_str(json),
            Err(PlanetzError::SectorContamination { .. })
        ));
    }

    #[test]
    fn test_bad_sector_key_rejected() {
        let json = r#"{ "sector9": {
            "star": { "id": "x", "name": "X", "type": "star", "position": [0, 0, 0] } } }"#;
        assert!(ObjectDatabase::from_json_str(json).is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let db = ObjectDatabase::builtin();
        let text = db.to_json_string().unwrap();
        assert_eq!(ObjectDatabase::from_json_str(&text).unwrap(), db);
    }

    #[test]
    fn test_builtin_sectors() {
        let db = ObjectDatabase::builtin();
        let b1 = SectorKey::parse("B1").unwrap();
        let ids: Vec<_> = db.sector(&b1).unwrap().all_objects().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["B1_star", "B1_alpha_station"]);
        assert!(db.object("A0_terra_prime").is_some());
        assert!(db.object("A0_luna").is_some());
    }
}
