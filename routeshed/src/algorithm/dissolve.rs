use std::collections::{BTreeMap, BTreeSet};

use geo::unary_union;
use itertools::Itertools;
use kdam::tqdm;
use rayon::prelude::*;
use routeshed_core::model::{Geoid, PartitionError, RouteId, UnitAssignment, Zone};

/// merges same-route units into one (possibly multi-part) polygon per route.
pub struct ZoneDissolver {
    parallel_execution: bool,
}

impl ZoneDissolver {
    pub fn new(parallel_execution: bool) -> ZoneDissolver {
        ZoneDissolver { parallel_execution }
    }

    /// groups the assignment table by route id and unions each group's
    /// geometries. routes whose units are not adjacent produce multi-part zones.
    ///
    /// # Returns
    ///
    /// * one zone per distinct route id, sorted by route id
    pub fn dissolve(&self, assignments: &[UnitAssignment]) -> Result<Vec<Zone>, PartitionError> {
        let groups = group_by_route(assignments);
        log::info!(
            "dissolving {} units into {} zones",
            assignments.len(),
            groups.len()
        );

        let dissolve_group = |(route_id, members): (&&RouteId, &Vec<&UnitAssignment>)| {
            let geometry = unary_union(members.iter().map(|a| &a.geometry));
            let unit_ids = members.iter().map(|a| a.geoid.clone()).collect();
            Zone {
                route_id: RouteId::clone(route_id),
                geometry,
                unit_ids,
            }
        };

        let mut zones: Vec<Zone> = if self.parallel_execution {
            groups.par_iter().map(dissolve_group).collect()
        } else {
            tqdm!(groups.iter(), total = groups.len(), desc = "dissolve zones")
                .map(dissolve_group)
                .collect()
        };
        if !self.parallel_execution {
            eprintln!();
        }
        zones.sort_by(|a, b| a.route_id.cmp(&b.route_id));

        if let Some(empty) = zones.iter().find(|z| z.geometry.0.is_empty()) {
            return Err(PartitionError::InvalidGeometry(format!(
                "dissolving route {} produced an empty zone from {} units",
                empty.route_id,
                empty.unit_ids.len()
            )));
        }
        Ok(zones)
    }
}

/// rebuilds zone membership from the assignment table, for zones loaded from
/// a checkpoint which only carry route ids and geometries.
pub fn group_members(assignments: &[UnitAssignment]) -> BTreeMap<RouteId, BTreeSet<Geoid>> {
    let mut members: BTreeMap<RouteId, BTreeSet<Geoid>> = BTreeMap::new();
    for a in assignments.iter() {
        members
            .entry(a.route_id.clone())
            .or_default()
            .insert(a.geoid.clone());
    }
    members
}

/// confirms the zones partition the assigned units: every unit belongs to the
/// zone of its assigned route and to no other zone.
pub fn verify_partition(
    zones: &[Zone],
    assignments: &[UnitAssignment],
) -> Result<(), PartitionError> {
    let mut owner: BTreeMap<&Geoid, &RouteId> = BTreeMap::new();
    for zone in zones.iter() {
        for geoid in zone.unit_ids.iter() {
            if let Some(previous) = owner.insert(geoid, &zone.route_id) {
                return Err(PartitionError::InternalError(format!(
                    "unit {geoid} belongs to zones {previous} and {}",
                    zone.route_id
                )));
            }
        }
    }
    let misplaced = assignments
        .iter()
        .filter(|a| owner.get(&a.geoid) != Some(&&a.route_id))
        .map(|a| a.geoid.to_string())
        .collect_vec();
    if !misplaced.is_empty() || owner.len() != assignments.len() {
        return Err(PartitionError::InternalError(format!(
            "zones do not partition the assignment table: {} zone members, {} assigned units, misplaced: {}",
            owner.len(),
            assignments.len(),
            misplaced.iter().take(5).join(", ")
        )));
    }
    Ok(())
}

fn group_by_route(assignments: &[UnitAssignment]) -> BTreeMap<&RouteId, Vec<&UnitAssignment>> {
    let mut groups: BTreeMap<&RouteId, Vec<&UnitAssignment>> = BTreeMap::new();
    for a in assignments.iter() {
        groups.entry(&a.route_id).or_default().push(a);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::test_fixtures::square;
    use geo::{Area, BooleanOps};
    use routeshed_core::model::StopId;

    fn assignment(geoid: &str, route_id: &str, x: f64, y: f64) -> UnitAssignment {
        UnitAssignment {
            geoid: Geoid::from(geoid),
            geometry: square(x, y, 10.0),
            route_id: RouteId::from(route_id),
            stop_id: StopId::from("s"),
            distance: 0.0,
        }
    }

    fn table() -> Vec<UnitAssignment> {
        vec![
            assignment("b1", "red", 0.0, 0.0),
            assignment("b2", "red", 10.0, 0.0),
            assignment("b3", "blue", 20.0, 0.0),
            assignment("b4", "red", 30.0, 0.0),
            assignment("b5", "blue", 0.0, 10.0),
            assignment("b6", "blue", 10.0, 10.0),
        ]
    }

    #[test]
    fn test_one_zone_per_route_sorted() {
        let zones = ZoneDissolver::new(false).dissolve(&table()).unwrap();
        let routes = zones.iter().map(|z| z.route_id.0.as_str()).collect_vec();
        assert_eq!(routes, vec!["blue", "red"]);
        let red = &zones[1];
        assert_eq!(
            red.unit_ids.iter().map(|g| g.0.as_str()).collect_vec(),
            vec!["b1", "b2", "b4"]
        );
        assert!((red.area() - 300.0).abs() < 1e-6);
    }

    #[test]
    fn test_non_adjacent_units_produce_multipart_zone() {
        let zones = ZoneDissolver::new(false).dissolve(&table()).unwrap();
        let red = &zones[1];
        // b1 and b2 share an edge and merge, b4 stands alone
        assert_eq!(red.geometry.0.len(), 2);
    }

    #[test]
    fn test_zones_are_exclusive_and_complete() {
        let assignments = table();
        let zones = ZoneDissolver::new(true).dissolve(&assignments).unwrap();
        verify_partition(&zones, &assignments).unwrap();

        for (a, b) in zones.iter().tuple_combinations() {
            let overlap = a.geometry.intersection(&b.geometry).unsigned_area();
            assert!(overlap < 1e-6, "zones {} and {} overlap", a.route_id, b.route_id);
        }

        let units_union = unary_union(assignments.iter().map(|a| &a.geometry));
        let zones_union = unary_union(zones.iter().map(|z| &z.geometry));
        let difference = units_union.xor(&zones_union).unsigned_area();
        assert!(difference < 1e-6);
        assert!((zones_union.unsigned_area() - 600.0).abs() < 1e-6);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let assignments = table();
        let sequential = ZoneDissolver::new(false).dissolve(&assignments).unwrap();
        let parallel = ZoneDissolver::new(true).dissolve(&assignments).unwrap();
        assert_eq!(sequential.len(), parallel.len());
        for (s, p) in sequential.iter().zip(parallel.iter()) {
            assert_eq!(s.route_id, p.route_id);
            assert_eq!(s.unit_ids, p.unit_ids);
            assert!((s.area() - p.area()).abs() < 1e-9);
        }
    }

    #[test]
    fn test_verify_partition_detects_duplicates() {
        let assignments = table();
        let mut zones = ZoneDissolver::new(false).dissolve(&assignments).unwrap();
        zones[0].unit_ids.insert(Geoid::from("b1"));
        assert!(verify_partition(&zones, &assignments).is_err());
    }

    #[test]
    fn test_group_members() {
        let members = group_members(&table());
        assert_eq!(members.len(), 2);
        assert_eq!(members[&RouteId::from("blue")].len(), 3);
        assert_eq!(members[&RouteId::from("red")].len(), 3);
    }
}
