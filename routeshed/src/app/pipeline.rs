use routeshed_core::model::{AreaUnit, PartitionError, ResolvedStop, Stop, UnitAssignment, Zone};

use crate::{
    algorithm::{
        dissolve::verify_partition, StopIndex, StopRouteResolver, StudyArea, StudyAreaFilter,
        UnitToZoneAssigner, ZoneDissolver,
    },
    config::PipelineConfig,
};

/// the four partition stages, run in strict sequence. each stage consumes the
/// previous stage's artifact and returns a new one.
pub struct Pipeline {
    pub resolver: StopRouteResolver,
    pub study_area_filter: StudyAreaFilter,
    pub assigner: UnitToZoneAssigner,
    pub dissolver: ZoneDissolver,
}

/// every artifact produced by a complete in-memory run.
pub struct PipelineArtifacts {
    pub resolved_stops: Vec<ResolvedStop>,
    pub study_area: StudyArea,
    pub assignments: Vec<UnitAssignment>,
    pub zones: Vec<Zone>,
}

impl From<&PipelineConfig> for Pipeline {
    fn from(config: &PipelineConfig) -> Self {
        let parallel = config.parallel_execution;
        Pipeline {
            resolver: StopRouteResolver::new(&config.stops.route_label_delimiter),
            study_area_filter: StudyAreaFilter::new(
                config.study_area.proximity_threshold,
                parallel,
            ),
            assigner: UnitToZoneAssigner::new(config.study_area.coarse_id_length, parallel),
            dissolver: ZoneDissolver::new(parallel),
        }
    }
}

impl Pipeline {
    /// stages 1 and 2: resolves stop routes and selects the study area.
    pub fn select_study_area(
        &self,
        stops: &[Stop],
        tracts: &[AreaUnit],
    ) -> Result<(Vec<ResolvedStop>, StudyArea), PartitionError> {
        let resolved = self.resolver.resolve(stops)?;
        let index = StopIndex::new(&resolved);
        let study_area = self.study_area_filter.apply(tracts, &index)?;
        if study_area.unit_ids.is_empty() {
            return Err(PartitionError::EmptyStudyArea(format!(
                "none of {} coarse units lie within {} meters of the {} stops",
                tracts.len(),
                self.study_area_filter.threshold_meters(),
                resolved.len()
            )));
        }
        Ok((resolved, study_area))
    }

    /// stage 3: assigns the study area's fine units to the route of their nearest stop.
    pub fn assign(
        &self,
        resolved: &[ResolvedStop],
        blocks: Vec<AreaUnit>,
        study_area: &StudyArea,
    ) -> Result<Vec<UnitAssignment>, PartitionError> {
        let selected = self.assigner.select_units(blocks, &study_area.unit_ids)?;
        let index = StopIndex::new(resolved);
        self.assigner.assign(&selected, &index)
    }

    /// stage 4: dissolves the assignment table into zones and confirms they
    /// partition the assigned units.
    pub fn dissolve(&self, assignments: &[UnitAssignment]) -> Result<Vec<Zone>, PartitionError> {
        let zones = self.dissolver.dissolve(assignments)?;
        verify_partition(&zones, assignments)?;
        Ok(zones)
    }

    /// runs all four stages without touching the filesystem.
    pub fn execute(
        &self,
        stops: &[Stop],
        tracts: &[AreaUnit],
        blocks: Vec<AreaUnit>,
    ) -> Result<PipelineArtifacts, PartitionError> {
        let (resolved_stops, study_area) = self.select_study_area(stops, tracts)?;
        let assignments = self.assign(&resolved_stops, blocks, &study_area)?;
        let zones = self.dissolve(&assignments)?;
        Ok(PipelineArtifacts {
            resolved_stops,
            study_area,
            assignments,
            zones,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::test_fixtures::{area_unit, square, stop};
    use geo::{unary_union, Area, BooleanOps};
    use itertools::Itertools;
    use routeshed_core::model::{Geoid, RouteId};
    use uom::si::f64::Length;

    fn pipeline(parallel: bool) -> Pipeline {
        Pipeline {
            resolver: StopRouteResolver::new("-"),
            study_area_filter: StudyAreaFilter::new(
                Length::new::<uom::si::length::meter>(500.0),
                parallel,
            ),
            assigner: UnitToZoneAssigner::new(4, parallel),
            dissolver: ZoneDissolver::new(parallel),
        }
    }

    /// stop A (route1:100), stop B (route1:50, route2:80), stop C (route3:10),
    /// five 100m blocks in one tract, nearest to A, A, B, B, C respectively.
    fn scenario() -> (Vec<Stop>, Vec<AreaUnit>, Vec<AreaUnit>) {
        let stops = vec![
            stop("A", 100.0, 150.0, &[("route1-N", Some(100.0))]),
            stop(
                "B",
                300.0,
                150.0,
                &[("route1-S", Some(50.0)), ("route2-E", Some(80.0))],
            ),
            stop("C", 450.0, 150.0, &[("route3-W", Some(10.0))]),
        ];
        let tracts = vec![
            area_unit("T001", square(0.0, 0.0, 500.0)),
            area_unit("T002", square(5000.0, 5000.0, 500.0)),
        ];
        let blocks = (0..5)
            .map(|i| area_unit(&format!("T0010{i}"), square(i as f64 * 100.0, 100.0, 100.0)))
            .chain(std::iter::once(area_unit(
                "T00200",
                square(5000.0, 5000.0, 100.0),
            )))
            .collect_vec();
        (stops, tracts, blocks)
    }

    #[test]
    fn test_end_to_end_scenario() {
        let (stops, tracts, blocks) = scenario();
        for parallel in [false, true] {
            let artifacts = pipeline(parallel)
                .execute(&stops, &tracts, blocks.clone())
                .unwrap();

            let routes = artifacts
                .resolved_stops
                .iter()
                .map(|s| s.route_id.0.as_str())
                .collect_vec();
            assert_eq!(routes, vec!["route1", "route2", "route3"]);

            assert_eq!(
                artifacts.study_area.unit_ids.iter().collect_vec(),
                vec![&Geoid::from("T001")]
            );
            assert_eq!(artifacts.assignments.len(), 5);

            let sizes = artifacts
                .zones
                .iter()
                .map(|z| (z.route_id.0.as_str(), z.unit_ids.len()))
                .collect_vec();
            assert_eq!(sizes, vec![("route1", 2), ("route2", 2), ("route3", 1)]);

            let units_union = unary_union(artifacts.assignments.iter().map(|a| &a.geometry));
            let zones_union = unary_union(artifacts.zones.iter().map(|z| &z.geometry));
            assert!(units_union.xor(&zones_union).unsigned_area() < 1e-6);
            assert!((zones_union.unsigned_area() - 50_000.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_every_unit_takes_route_of_nearest_stop() {
        let (stops, tracts, blocks) = scenario();
        let artifacts = pipeline(false).execute(&stops, &tracts, blocks).unwrap();
        let expected = ["route1", "route1", "route2", "route2", "route3"];
        for (assignment, route) in artifacts.assignments.iter().zip(expected.iter()) {
            assert_eq!(assignment.route_id, RouteId::from(*route));
        }
    }

    #[test]
    fn test_empty_study_area_is_an_error() {
        let (stops, _, blocks) = scenario();
        let tracts = vec![area_unit("T002", square(5000.0, 5000.0, 500.0))];
        let result = pipeline(false).execute(&stops, &tracts, blocks);
        assert!(matches!(result, Err(PartitionError::EmptyStudyArea(_))));
    }

    #[test]
    fn test_unresolvable_stop_aborts_run() {
        let (mut stops, tracts, blocks) = scenario();
        stops.push(stop("D", 10.0, 10.0, &[("route4-N", None)]));
        let result = pipeline(false).execute(&stops, &tracts, blocks);
        assert!(matches!(result, Err(PartitionError::UnresolvableStops(_))));
    }
}
