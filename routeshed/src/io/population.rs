use std::{collections::HashMap, path::Path};

use routeshed_core::model::{AreaUnit, Geoid, PartitionError};

use crate::{
    config::PopulationInputConfig,
    io::stops::{build_header_lookup, column_index},
};

/// reads a GEOID-keyed population table.
pub fn read_population(
    config: &PopulationInputConfig,
) -> Result<HashMap<Geoid, f64>, PartitionError> {
    let path = Path::new(&config.input_file);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| PartitionError::Parse {
            path: path.to_path_buf(),
            message: format!("failed to open population table: {e}"),
        })?;
    let headers = build_header_lookup(&mut reader, path)?;
    let geoid_index = column_index(&headers, &config.geoid_column, path)?;
    let population_index = column_index(&headers, &config.population_column, path)?;

    let mut table = HashMap::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| PartitionError::Parse {
            path: path.to_path_buf(),
            message: format!("row {row}: {e}"),
        })?;
        let geoid = record.get(geoid_index).unwrap_or_default().trim();
        let raw_population = record.get(population_index).unwrap_or_default().trim();
        let population = raw_population
            .parse::<f64>()
            .ok()
            .filter(|p| p.is_finite() && *p >= 0.0)
            .ok_or_else(|| PartitionError::Deserialize {
                col: config.population_column.clone(),
                path: path.to_path_buf(),
                message: format!("row {row} has invalid population '{raw_population}'"),
            })?;
        if table.insert(Geoid(geoid.to_string()), population).is_some() {
            return Err(PartitionError::Deserialize {
                col: config.geoid_column.clone(),
                path: path.to_path_buf(),
                message: format!("duplicate GEOID {geoid}"),
            });
        }
    }
    log::info!(
        "read population for {} GEOIDs from '{}'",
        table.len(),
        path.to_string_lossy()
    );
    Ok(table)
}

/// attaches population counts to area units. every unit must find a row in the
/// table; unmatched units abort the join. table rows with no matching unit are
/// expected (the table usually covers a wider extent) and are ignored.
pub fn join_population(
    units: Vec<AreaUnit>,
    table: &HashMap<Geoid, f64>,
) -> Result<Vec<AreaUnit>, PartitionError> {
    let unmatched = units
        .iter()
        .filter(|u| !table.contains_key(&u.geoid))
        .map(|u| u.geoid.to_string())
        .collect::<Vec<_>>();
    if !unmatched.is_empty() {
        return Err(PartitionError::UnmatchedKeys {
            key_name: String::from("population GEOID"),
            keys: unmatched,
        });
    }
    let joined = units
        .into_iter()
        .map(|unit| {
            let population = table.get(&unit.geoid).copied();
            AreaUnit { population, ..unit }
        })
        .collect();
    Ok(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};

    fn unit(geoid: &str) -> AreaUnit {
        let square = polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 1.0),
            (x: 0.0, y: 0.0),
        ];
        AreaUnit::new(Geoid::from(geoid), MultiPolygon::new(vec![square]))
    }

    #[test]
    fn test_join_population() {
        let table = HashMap::from([
            (Geoid::from("A"), 120.0),
            (Geoid::from("B"), 80.0),
            (Geoid::from("C"), 5.0),
        ]);
        let joined = join_population(vec![unit("A"), unit("B")], &table).unwrap();
        assert_eq!(joined[0].population, Some(120.0));
        assert_eq!(joined[1].population, Some(80.0));
    }

    #[test]
    fn test_join_population_unmatched_key() {
        let table = HashMap::from([(Geoid::from("A"), 120.0)]);
        let result = join_population(vec![unit("A"), unit("Z")], &table);
        match result {
            Err(PartitionError::UnmatchedKeys { keys, .. }) => assert_eq!(keys, vec!["Z"]),
            other => panic!("expected unmatched keys error, found {other:?}"),
        }
    }

    #[test]
    fn test_read_population() {
        let dir = std::env::temp_dir().join("routeshed_population_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("population.csv");
        std::fs::write(&path, "GEOID,NAME,population\n17031010100,Tract 101,4210\n17031010200,Tract 102,0\n").unwrap();
        let config = PopulationInputConfig {
            input_file: path.to_str().unwrap().to_string(),
            geoid_column: "GEOID".to_string(),
            population_column: "population".to_string(),
        };
        let table = read_population(&config).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(&Geoid::from("17031010100")), Some(&4210.0));
        assert_eq!(table.get(&Geoid::from("17031010200")), Some(&0.0));
    }
}
