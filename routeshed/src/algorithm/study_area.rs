use std::{
    collections::BTreeSet,
    sync::{Arc, Mutex},
};

use geo::Area;
use kdam::{tqdm, Bar, BarExt};
use rayon::prelude::*;
use routeshed_core::model::{AreaUnit, Geoid, PartitionError};
use serde::{Deserialize, Serialize};
use uom::si::f64::Length;

use super::StopIndex;

/// selects the coarse units lying within a fixed distance of any stop.
pub struct StudyAreaFilter {
    threshold: Length,
    parallel_execution: bool,
}

/// the coarse units of the study area with their coverage of the full extent.
#[derive(Clone, Debug)]
pub struct StudyArea {
    pub unit_ids: BTreeSet<Geoid>,
    pub coverage: CoverageSummary,
}

/// informational coverage statistics of a study area relative to all coarse units.
/// population figures are only present when every coarse unit has a population.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CoverageSummary {
    pub proximity_threshold_meters: f64,
    pub total_units: usize,
    pub selected_units: usize,
    pub total_area: f64,
    pub selected_area: f64,
    pub area_fraction: f64,
    pub total_population: Option<f64>,
    pub selected_population: Option<f64>,
    pub population_fraction: Option<f64>,
}

impl StudyAreaFilter {
    pub fn new(threshold: Length, parallel_execution: bool) -> StudyAreaFilter {
        StudyAreaFilter {
            threshold,
            parallel_execution,
        }
    }

    pub fn threshold_meters(&self) -> f64 {
        self.threshold.get::<uom::si::length::meter>()
    }

    /// tests every coarse unit against the stop index. a unit is selected iff at
    /// least one stop lies within the threshold distance of its geometry.
    pub fn apply(
        &self,
        units: &[AreaUnit],
        index: &StopIndex,
    ) -> Result<StudyArea, PartitionError> {
        let threshold = self.threshold_meters();
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(PartitionError::InvalidUserInput(format!(
                "proximity threshold must be a non-negative distance, found {threshold}"
            )));
        }

        let selected: Vec<bool> = if self.parallel_execution {
            let bar = Arc::new(Mutex::new(
                Bar::builder()
                    .desc("select study area units")
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
                    index.any_within(&unit.geometry, threshold)
                })
                .collect()
        } else {
            tqdm!(units.iter(), total = units.len(), desc = "select study area units")
                .map(|unit| index.any_within(&unit.geometry, threshold))
                .collect()
        };
        eprintln!();

        let unit_ids = units
            .iter()
            .zip(selected.iter())
            .filter(|(_, is_selected)| **is_selected)
            .map(|(unit, _)| unit.geoid.clone())
            .collect::<BTreeSet<_>>();
        let coverage = CoverageSummary::new(threshold, units, &selected);
        log::info!(
            "study area has {} of {} units within {threshold} of a stop ({:.1}% of area{})",
            coverage.selected_units,
            coverage.total_units,
            coverage.area_fraction * 100.0,
            match coverage.population_fraction {
                Some(f) => format!(", {:.1}% of population", f * 100.0),
                None => String::new(),
            }
        );
        Ok(StudyArea { unit_ids, coverage })
    }
}

impl CoverageSummary {
    fn new(threshold: f64, units: &[AreaUnit], selected: &[bool]) -> CoverageSummary {
        let mut total_area = 0.0;
        let mut selected_area = 0.0;
        let mut total_population = Some(0.0);
        let mut selected_population = Some(0.0);
        for (unit, is_selected) in units.iter().zip(selected.iter()) {
            let area = unit.geometry.unsigned_area();
            total_area += area;
            if *is_selected {
                selected_area += area;
            }
            match unit.population {
                Some(p) => {
                    total_population = total_population.map(|t| t + p);
                    if *is_selected {
                        selected_population = selected_population.map(|t| t + p);
                    }
                }
                None => {
                    total_population = None;
                    selected_population = None;
                }
            }
        }
        if units.is_empty() {
            total_population = None;
            selected_population = None;
        }
        let population_fraction = match (total_population, selected_population) {
            (Some(total), Some(sel)) if total > 0.0 => Some(sel / total),
            _ => None,
        };
        CoverageSummary {
            proximity_threshold_meters: threshold,
            total_units: units.len(),
            selected_units: selected.iter().filter(|s| **s).count(),
            total_area,
            selected_area,
            area_fraction: if total_area > 0.0 {
                selected_area / total_area
            } else {
                0.0
            },
            total_population,
            selected_population,
            population_fraction,
        }
    }
}
