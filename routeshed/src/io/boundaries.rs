use std::{collections::HashSet, path::Path};

use geo::Geometry;
use kdam::tqdm;
use routeshed_core::{
    model::{AreaUnit, Geoid, PartitionError},
    util::geo_utils::try_into_multipolygon,
};

use crate::config::BoundaryInputConfig;

/// reads areal units and their GEOIDs from a GeoJSON feature collection.
pub fn read_area_units(config: &BoundaryInputConfig) -> Result<Vec<AreaUnit>, PartitionError> {
    let geom_path = Path::new(&config.input_file);
    let geojson_str = std::fs::read_to_string(geom_path).map_err(|e| PartitionError::Read {
        path: geom_path.to_path_buf(),
        source: e,
    })?;
    let units = parse_area_units(&geojson_str, &config.id_property, geom_path)?;
    log::info!(
        "read {} area units from '{}'",
        units.len(),
        geom_path.to_string_lossy()
    );
    Ok(units)
}

/// decodes areal units from GeoJSON text. every feature must carry a polygonal
/// geometry and a unique id property.
pub fn parse_area_units(
    geojson_str: &str,
    id_property: &str,
    geom_path: &Path,
) -> Result<Vec<AreaUnit>, PartitionError> {
    let geojson_value = geojson_str
        .parse::<geojson::GeoJson>()
        .map_err(|e| PartitionError::Parse {
            message: e.to_string(),
            path: geom_path.to_path_buf(),
        })?;

    let feature_collection = match geojson_value {
        geojson::GeoJson::FeatureCollection(fc) => Ok(fc),
        _ => Err(PartitionError::Parse {
            path: geom_path.to_path_buf(),
            message: "geojson in file must be a FeatureCollection".to_string(),
        }),
    }?;

    let n_features = feature_collection.features.len();
    let mut units = Vec::with_capacity(n_features);
    let mut seen: HashSet<Geoid> = HashSet::with_capacity(n_features);
    let iter = tqdm!(
        feature_collection.features.into_iter().enumerate(),
        total = n_features,
        desc = "decode area units"
    );
    for (n, feature) in iter {
        let geoid = read_geoid(&feature, id_property, geom_path)?;
        let geom_json = feature
            .geometry
            .ok_or_else(|| PartitionError::Deserialize {
                col: "geometry".to_string(),
                path: geom_path.to_path_buf(),
                message: format!("no geometry in feature {n}"),
            })?;
        let geometry: Geometry = geom_json.try_into().map_err(|e| PartitionError::Deserialize {
            col: "geometry".to_string(),
            path: geom_path.to_path_buf(),
            message: format!("failure decoding GeoJson geometry to geo-types for GEOID {geoid}: {e}"),
        })?;
        let multipolygon = try_into_multipolygon(geometry).map_err(|e| {
            PartitionError::InvalidGeometry(format!("GEOID {geoid} in '{}': {e}", geom_path.to_string_lossy()))
        })?;
        if !seen.insert(geoid.clone()) {
            return Err(PartitionError::Deserialize {
                col: id_property.to_string(),
                path: geom_path.to_path_buf(),
                message: format!("duplicate GEOID {geoid}"),
            });
        }
        units.push(AreaUnit::new(geoid, multipolygon));
    }
    eprintln!();
    Ok(units)
}

/// GEOIDs are usually stored as strings, but some exports write them as numbers.
fn read_geoid(
    feature: &geojson::Feature,
    id_property: &str,
    geom_path: &Path,
) -> Result<Geoid, PartitionError> {
    let value = feature
        .property(id_property)
        .ok_or_else(|| PartitionError::Deserialize {
            col: id_property.to_string(),
            path: geom_path.to_path_buf(),
            message: "column missing".to_string(),
        })?;
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Ok(Geoid(s.trim().to_string())),
        serde_json::Value::Number(n) => Ok(Geoid(n.to_string())),
        other => Err(PartitionError::Deserialize {
            col: id_property.to_string(),
            path: geom_path.to_path_buf(),
            message: format!("cannot read '{other}' as a GEOID"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Area;

    const TRACTS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "GEOID": "17031010100" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]]]
                }
            },
            {
                "type": "Feature",
                "properties": { "GEOID": 17031010200 },
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[20.0, 0.0], [30.0, 0.0], [30.0, 10.0], [20.0, 10.0], [20.0, 0.0]]],
                        [[[40.0, 0.0], [45.0, 0.0], [45.0, 10.0], [40.0, 10.0], [40.0, 0.0]]]
                    ]
                }
            }
        ]
    }"#;

    #[test]
    fn test_parse_area_units() {
        let units = parse_area_units(TRACTS, "GEOID", Path::new("tracts.geojson")).unwrap();
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].geoid, Geoid::from("17031010100"));
        assert_eq!(units[1].geoid, Geoid::from("17031010200"));
        assert!((units[0].geometry.unsigned_area() - 100.0).abs() < 1e-9);
        assert!((units[1].geometry.unsigned_area() - 150.0).abs() < 1e-9);
        assert!(units.iter().all(|u| u.population.is_none()));
    }

    #[test]
    fn test_parse_missing_id_property() {
        let result = parse_area_units(TRACTS, "GEOID20", Path::new("tracts.geojson"));
        assert!(matches!(result, Err(PartitionError::Deserialize { .. })));
    }

    #[test]
    fn test_parse_rejects_non_polygons() {
        let points = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "GEOID": "1" },
                "geometry": { "type": "Point", "coordinates": [0.0, 0.0] }
            }]
        }"#;
        let result = parse_area_units(points, "GEOID", Path::new("points.geojson"));
        assert!(matches!(result, Err(PartitionError::InvalidGeometry(_))));
    }
}
