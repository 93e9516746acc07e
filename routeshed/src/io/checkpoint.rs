use std::{
    collections::{BTreeMap, BTreeSet},
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use geo::Geometry;
use geojson::{Feature, FeatureCollection, GeoJson, JsonObject, JsonValue};
use itertools::Itertools;
use routeshed_core::{
    model::{Geoid, PartitionError, RouteId, UnitAssignment, Zone},
    util::geo_utils::try_into_multipolygon,
};

use crate::algorithm::dissolve::group_members;

const ROUTE_ID_PROPERTY: &str = "route_id";
/// collection-level member holding the GEOIDs of every zone, keyed by route id
const UNIT_IDS_MEMBER: &str = "unit_ids";

/// the persisted output of the dissolve step. dissolving is the most expensive
/// stage, so an existing checkpoint is reused until it is invalidated explicitly.
/// the file doubles as the zone boundary output, one feature per route carrying
/// only the route id. zone membership is stored on the feature collection so a
/// reused checkpoint can be checked against the current assignment table.
pub struct ZoneCheckpoint {
    path: PathBuf,
}

impl ZoneCheckpoint {
    pub const FILENAME: &'static str = "zones.geojson";

    pub fn new(output_directory: &Path) -> ZoneCheckpoint {
        ZoneCheckpoint {
            path: output_directory.join(Self::FILENAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// removes the checkpoint so the next run recomputes the dissolve.
    pub fn invalidate(&self) -> Result<(), PartitionError> {
        if self.exists() {
            log::info!("invalidating zone checkpoint '{}'", self.path.to_string_lossy());
            std::fs::remove_file(&self.path).map_err(|e| PartitionError::Write {
                path: self.path.clone(),
                message: format!("unable to remove checkpoint: {e}"),
            })?;
        }
        Ok(())
    }

    /// writes zones as a GeoJSON FeatureCollection. an existing checkpoint is
    /// only replaced when `overwrite` is set.
    pub fn store(&self, zones: &[Zone], overwrite: bool) -> Result<(), PartitionError> {
        if self.exists() && !overwrite {
            return Err(PartitionError::Write {
                path: self.path.clone(),
                message: String::from("checkpoint exists and overwrite was not requested"),
            });
        }
        let features = zones
            .iter()
            .map(|zone| {
                let mut properties = JsonObject::new();
                properties.insert(
                    ROUTE_ID_PROPERTY.to_string(),
                    JsonValue::String(zone.route_id.0.clone()),
                );
                Feature {
                    bbox: None,
                    geometry: Some(geojson::Geometry::new(geojson::Value::from(&zone.geometry))),
                    id: None,
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect_vec();
        let unit_ids = zones
            .iter()
            .map(|zone| {
                let ids = zone
                    .unit_ids
                    .iter()
                    .map(|g| JsonValue::String(g.0.clone()))
                    .collect_vec();
                (zone.route_id.0.clone(), JsonValue::Array(ids))
            })
            .collect::<JsonObject>();
        let mut foreign_members = JsonObject::new();
        foreign_members.insert(UNIT_IDS_MEMBER.to_string(), JsonValue::Object(unit_ids));
        let collection = FeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(foreign_members),
        };
        let file = File::create(&self.path).map_err(|e| PartitionError::Write {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &collection).map_err(|e| PartitionError::Write {
            path: self.path.clone(),
            message: format!("failed to serialize zones: {e}"),
        })?;
        writer.flush().map_err(|e| PartitionError::Write {
            path: self.path.clone(),
            message: format!("failed to flush: {e}"),
        })?;
        log::info!(
            "wrote {} zones to checkpoint '{}'",
            zones.len(),
            self.path.to_string_lossy()
        );
        Ok(())
    }

    /// reads the zones stored in the checkpoint, or None if there is no checkpoint.
    /// a checkpoint without a member list for each of its zones cannot be
    /// validated and is rejected as stale.
    pub fn load(&self) -> Result<Option<Vec<Zone>>, PartitionError> {
        if !self.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path).map_err(|e| PartitionError::Read {
            path: self.path.clone(),
            source: e,
        })?;
        let collection = match contents.parse::<GeoJson>() {
            Ok(GeoJson::FeatureCollection(fc)) => Ok(fc),
            Ok(_) => Err(PartitionError::Parse {
                path: self.path.clone(),
                message: "geojson in file must be a FeatureCollection".to_string(),
            }),
            Err(e) => Err(PartitionError::Parse {
                path: self.path.clone(),
                message: e.to_string(),
            }),
        }?;

        let mut members = self.read_members(&collection)?;
        let zones = collection
            .features
            .into_iter()
            .enumerate()
            .map(|(n, feature)| -> Result<Zone, PartitionError> {
                let route_id = feature
                    .property(ROUTE_ID_PROPERTY)
                    .and_then(|v| v.as_str())
                    .map(RouteId::from)
                    .ok_or_else(|| PartitionError::Deserialize {
                        col: ROUTE_ID_PROPERTY.to_string(),
                        path: self.path.clone(),
                        message: format!("feature {n} has no string route id"),
                    })?;
                let geometry: Geometry = feature
                    .geometry
                    .ok_or_else(|| PartitionError::Deserialize {
                        col: "geometry".to_string(),
                        path: self.path.clone(),
                        message: format!("no geometry in feature {n}"),
                    })?
                    .try_into()
                    .map_err(|e| PartitionError::Deserialize {
                        col: "geometry".to_string(),
                        path: self.path.clone(),
                        message: format!("failure decoding zone {route_id}: {e}"),
                    })?;
                let geometry = try_into_multipolygon(geometry).map_err(|e| {
                    PartitionError::InvalidGeometry(format!("zone {route_id}: {e}"))
                })?;
                let unit_ids =
                    members
                        .remove(&route_id)
                        .ok_or_else(|| PartitionError::StaleCheckpoint {
                            path: self.path.clone(),
                            message: format!("no member list stored for zone {route_id}"),
                        })?;
                Ok(Zone {
                    route_id,
                    geometry,
                    unit_ids,
                })
            })
            .collect::<Result<Vec<_>, PartitionError>>()?;
        Ok(Some(zones))
    }

    /// loads the checkpoint as zones for the given assignment table. the stored
    /// members of every zone must equal the units the table assigns to its
    /// route, otherwise the checkpoint was built from other inputs and is rejected.
    pub fn load_zones(
        &self,
        assignments: &[UnitAssignment],
    ) -> Result<Option<Vec<Zone>>, PartitionError> {
        let zones = match self.load()? {
            Some(zones) => zones,
            None => return Ok(None),
        };
        let expected = group_members(assignments);
        let stored: BTreeMap<&RouteId, &BTreeSet<Geoid>> =
            zones.iter().map(|z| (&z.route_id, &z.unit_ids)).collect();
        if stored.len() != zones.len() {
            return Err(PartitionError::StaleCheckpoint {
                path: self.path.clone(),
                message: format!(
                    "checkpoint has {} zones for {} distinct routes",
                    zones.len(),
                    stored.len()
                ),
            });
        }
        let changed = expected
            .keys()
            .chain(stored.keys().copied())
            .unique()
            .filter(|route_id| expected.get(*route_id) != stored.get(*route_id).copied())
            .map(|route_id| route_id.to_string())
            .sorted()
            .collect_vec();
        if !changed.is_empty() {
            return Err(PartitionError::StaleCheckpoint {
                path: self.path.clone(),
                message: format!(
                    "zone membership differs from the assignment table for routes {}",
                    changed.iter().take(5).join(", ")
                ),
            });
        }
        let zones = zones
            .into_iter()
            .sorted_by(|a, b| a.route_id.cmp(&b.route_id))
            .collect_vec();
        log::info!(
            "loaded {} zones from checkpoint '{}'",
            zones.len(),
            self.path.to_string_lossy()
        );
        Ok(Some(zones))
    }

    fn read_members(
        &self,
        collection: &FeatureCollection,
    ) -> Result<BTreeMap<RouteId, BTreeSet<Geoid>>, PartitionError> {
        let stale = |message: String| PartitionError::StaleCheckpoint {
            path: self.path.clone(),
            message,
        };
        let table = collection
            .foreign_members
            .as_ref()
            .and_then(|m| m.get(UNIT_IDS_MEMBER))
            .and_then(|v| v.as_object())
            .ok_or_else(|| stale(format!("no '{UNIT_IDS_MEMBER}' member table")))?;
        table
            .iter()
            .map(|(route_id, ids)| -> Result<(RouteId, BTreeSet<Geoid>), PartitionError> {
                let ids = ids
                    .as_array()
                    .ok_or_else(|| stale(format!("members of zone {route_id} are not a list")))?;
                let unit_ids = ids
                    .iter()
                    .map(|id| {
                        id.as_str().map(Geoid::from).ok_or_else(|| {
                            stale(format!("zone {route_id} has a non-string member {id}"))
                        })
                    })
                    .collect::<Result<BTreeSet<_>, _>>()?;
                Ok((RouteId::from(route_id.as_str()), unit_ids))
            })
            .collect()
    }
}
