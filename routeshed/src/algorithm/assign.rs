use std::{
    collections::{BTreeSet, HashSet},
    sync::{Arc, Mutex},
};

use itertools::Itertools;
use kdam::{tqdm, Bar, BarExt};
use rayon::prelude::*;
use routeshed_core::model::{AreaUnit, Geoid, PartitionError, UnitAssignment};

use super::StopIndex;

/// labels each fine areal unit of the study area with the route of its nearest stop.
pub struct UnitToZoneAssigner {
    coarse_id_length: usize,
    parallel_execution: bool,
}

impl UnitToZoneAssigner {
    pub fn new(coarse_id_length: usize, parallel_execution: bool) -> UnitToZoneAssigner {
        UnitToZoneAssigner {
            coarse_id_length,
            parallel_execution,
        }
    }

    /// keeps the fine units whose coarse ancestor is in the study area.
    ///
    /// # Errors
    ///
    /// * a fine GEOID too short to carry an ancestor prefix
    /// * a duplicate fine GEOID
    /// * a study area unit with no fine units, which would leave a hole in the partition
    pub fn select_units(
        &self,
        units: Vec<AreaUnit>,
        study_area: &BTreeSet<Geoid>,
    ) -> Result<Vec<AreaUnit>, PartitionError> {
        let mut seen: HashSet<Geoid> = HashSet::with_capacity(units.len());
        let mut covered: HashSet<Geoid> = HashSet::with_capacity(study_area.len());
        let mut selected = vec![];
        let mut invalid = vec![];
        for unit in units.into_iter() {
            let ancestor = match unit.geoid.ancestor(self.coarse_id_length) {
                Ok(a) => a,
                Err(_) => {
                    invalid.push(unit.geoid.to_string());
                    continue;
                }
            };
            if !seen.insert(unit.geoid.clone()) {
                return Err(PartitionError::InvalidUserInput(format!(
                    "fine area unit GEOID {} appears more than once",
                    unit.geoid
                )));
            }
            if study_area.contains(&ancestor) {
                covered.insert(ancestor);
                selected.push(unit);
            }
        }
        if !invalid.is_empty() {
            return Err(PartitionError::UnmatchedKeys {
                key_name: format!(
                    "fine unit GEOID ancestor prefix of length {}",
                    self.coarse_id_length
                ),
                keys: invalid,
            });
        }
        let uncovered = study_area
            .iter()
            .filter(|g| !covered.contains(*g))
            .map(|g| g.to_string())
            .collect_vec();
        if !uncovered.is_empty() {
            return Err(PartitionError::UnmatchedKeys {
                key_name: String::from("study area GEOID with no fine units"),
                keys: uncovered,
            });
        }
        log::info!(
            "{} fine units fall within the {} study area units",
            selected.len(),
            study_area.len()
        );
        Ok(selected)
    }

    /// finds the nearest stop of every unit, unbounded by distance, and copies
    /// its route onto the unit. equidistant stops are broken by smallest stop id.
    ///
    /// # Returns
    ///
    /// * one assignment per unit in input order
    pub fn assign(
        &self,
        units: &[AreaUnit],
        index: &StopIndex,
    ) -> Result<Vec<UnitAssignment>, PartitionError> {
        let assign_unit = |unit: &AreaUnit| -> Result<UnitAssignment, PartitionError> {
            let nearest = index
                .nearest(&unit.geometry)
                .ok_or_else(|| PartitionError::UnreachableUnit(unit.geoid.clone()))?;
            Ok(UnitAssignment {
                geoid: unit.geoid.clone(),
                geometry: unit.geometry.clone(),
                route_id: nearest.stop.route_id.clone(),
                stop_id: nearest.stop.stop_id.clone(),
                distance: nearest.distance,
            })
        };

        let result = if self.parallel_execution {
            let bar = Arc::new(Mutex::new(
                Bar::builder()
                    .desc("assign units to nearest stop")
                    .total(units.len())
                    .build()
                    .map_err(|e| {
                        PartitionError::InternalError(format!("error building progress bar: {e}"))
                    })?,
            ));
            units
                .par_iter()
                .map(|unit| {
                    if let Ok(mut bar) = bar.clone().lock() {
                        let _ = bar.update(1);
                    }
                    assign_unit(unit)
                })
                .collect::<Result<Vec<_>, _>>()
        } else {
            tqdm!(
                units.iter(),
                total = units.len(),
                desc = "assign units to nearest stop"
            )
            .map(assign_unit)
            .collect::<Result<Vec<_>, _>>()
        };
        eprintln!();
        let assignments = result?;

        let n_routes = assignments.iter().map(|a| &a.route_id).unique().count();
        log::info!(
            "assigned {} units to {} routes",
            assignments.len(),
            n_routes
        );
        Ok(assignments)
    }
}
