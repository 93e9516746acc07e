use std::collections::HashSet;

use itertools::Itertools;
use routeshed_core::model::{
    PartitionError, ResolvedStop, RouteId, RouteLabel, Stop, StopId,
};

/// collapses each multi-route stop to the single route with the most activity.
pub struct StopRouteResolver {
    delimiter: String,
}

/// counts of entries removed by the data-quality filter during resolution.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DiscardedEntries {
    pub missing_activity: usize,
    pub invalid_label: usize,
}

impl StopRouteResolver {
    pub fn new(delimiter: &str) -> StopRouteResolver {
        StopRouteResolver {
            delimiter: delimiter.to_string(),
        }
    }

    /// resolves every stop to its dominant route. entries with a missing
    /// activity or an unparseable route label are discarded before comparison.
    ///
    /// # Arguments
    ///
    /// * `stops` - stop ridership records
    ///
    /// # Returns
    ///
    /// * one resolved stop per input stop in input order, or an error listing
    ///   every stop left without a valid entry
    pub fn resolve(&self, stops: &[Stop]) -> Result<Vec<ResolvedStop>, PartitionError> {
        let mut seen: HashSet<&StopId> = HashSet::with_capacity(stops.len());
        let duplicates = stops
            .iter()
            .filter(|s| !seen.insert(&s.stop_id))
            .map(|s| s.stop_id.to_string())
            .unique()
            .collect_vec();
        if !duplicates.is_empty() {
            return Err(PartitionError::InvalidUserInput(format!(
                "stop ids must be unique, found duplicates: {}",
                duplicates.iter().take(5).join(", ")
            )));
        }

        let mut discarded = DiscardedEntries::default();
        let mut resolved = Vec::with_capacity(stops.len());
        let mut unresolvable = vec![];
        for stop in stops.iter() {
            match self.resolve_stop(stop, &mut discarded)? {
                Some(r) => resolved.push(r),
                None => unresolvable.push(stop.stop_id.clone()),
            }
        }
        if discarded.missing_activity > 0 || discarded.invalid_label > 0 {
            log::warn!(
                "discarded {} route entries with missing activity and {} with invalid route labels",
                discarded.missing_activity,
                discarded.invalid_label
            );
        }
        if !unresolvable.is_empty() {
            return Err(PartitionError::UnresolvableStops(unresolvable));
        }

        let n_routes = resolved.iter().map(|s| &s.route_id).unique().count();
        log::info!(
            "resolved {} stops to {} distinct routes",
            resolved.len(),
            n_routes
        );
        Ok(resolved)
    }

    /// selects the entry with maximum activity for a single stop. ties on
    /// activity go to the lexicographically smallest route id, so the result
    /// does not depend on slot order.
    ///
    /// # Returns
    ///
    /// * the resolved stop, or None if no entry survives the data-quality filter
    pub fn resolve_stop(
        &self,
        stop: &Stop,
        discarded: &mut DiscardedEntries,
    ) -> Result<Option<ResolvedStop>, PartitionError> {
        let mut best: Option<(RouteId, f64)> = None;
        for entry in stop.entries.iter() {
            let activity = match entry.activity {
                Some(a) => a,
                None => {
                    discarded.missing_activity += 1;
                    continue;
                }
            };
            let label = match RouteLabel::parse(&entry.label, &self.delimiter) {
                Ok(label) => label,
                Err(PartitionError::InvalidRouteLabel { label, message }) => {
                    log::debug!("stop {}: skipping route label '{label}': {message}", stop.stop_id);
                    discarded.invalid_label += 1;
                    continue;
                }
                Err(other) => return Err(other),
            };
            let replace = match &best {
                None => true,
                Some((best_route, best_activity)) => {
                    activity > *best_activity
                        || (activity == *best_activity && label.route_id < *best_route)
                }
            };
            if replace {
                best = Some((label.route_id, activity));
            }
        }

        let resolved = best.map(|(route_id, activity)| ResolvedStop {
            stop_id: stop.stop_id.clone(),
            route_id,
            activity,
            x: stop.location.x(),
            y: stop.location.y(),
        });
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::test_fixtures::stop;

    #[test]
    fn test_resolves_max_activity() {
        let stops = vec![stop(
            "s1",
            0.0,
            0.0,
            &[("routeA-N", Some(100.0)), ("routeB-S", Some(80.0))],
        )];
        let resolved = StopRouteResolver::new("-").resolve(&stops).unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].route_id, RouteId::from("routeA"));
        assert_eq!(resolved[0].activity, 100.0);
    }

    #[test]
    fn test_missing_activity_is_discarded_before_comparison() {
        let stops = vec![stop(
            "s1",
            0.0,
            0.0,
            &[("9-E", None), ("12-W", Some(3.0))],
        )];
        let resolved = StopRouteResolver::new("-").resolve(&stops).unwrap();
        assert_eq!(resolved[0].route_id, RouteId::from("12"));
    }

    #[test]
    fn test_tie_break_is_deterministic_and_order_independent() {
        let resolver = StopRouteResolver::new("-");
        let forward = vec![stop(
            "s1",
            0.0,
            0.0,
            &[("B-N", Some(50.0)), ("A-S", Some(50.0)), ("C-E", Some(10.0))],
        )];
        let backward = vec![stop(
            "s1",
            0.0,
            0.0,
            &[("C-E", Some(10.0)), ("A-S", Some(50.0)), ("B-N", Some(50.0))],
        )];
        let first = resolver.resolve(&forward).unwrap();
        let second = resolver.resolve(&forward).unwrap();
        let third = resolver.resolve(&backward).unwrap();
        assert_eq!(first[0].route_id, RouteId::from("A"));
        assert_eq!(first, second);
        assert_eq!(first[0].route_id, third[0].route_id);
    }

    #[test]
    fn test_stop_without_valid_entries_is_an_error() {
        let stops = vec![
            stop("ok", 0.0, 0.0, &[("1-N", Some(5.0))]),
            stop("empty", 1.0, 1.0, &[]),
            stop("missing", 2.0, 2.0, &[("2-N", None)]),
            stop("bad_label", 3.0, 3.0, &[("-N", Some(4.0))]),
        ];
        let result = StopRouteResolver::new("-").resolve(&stops);
        match result {
            Err(PartitionError::UnresolvableStops(ids)) => {
                let ids = ids.iter().map(|s| s.0.as_str()).collect_vec();
                assert_eq!(ids, vec!["empty", "missing", "bad_label"]);
            }
            other => panic!("expected unresolvable stops error, found {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_stop_ids_rejected() {
        let stops = vec![
            stop("s1", 0.0, 0.0, &[("1-N", Some(5.0))]),
            stop("s1", 1.0, 1.0, &[("2-N", Some(5.0))]),
        ];
        let result = StopRouteResolver::new("-").resolve(&stops);
        assert!(matches!(result, Err(PartitionError::InvalidUserInput(_))));
    }

    #[test]
    fn test_discard_counts() {
        let resolver = StopRouteResolver::new("-");
        let s = stop(
            "s1",
            0.0,
            0.0,
            &[("1-N", None), ("-S", Some(2.0)), ("3-E", Some(1.0))],
        );
        let mut discarded = DiscardedEntries::default();
        let resolved = resolver.resolve_stop(&s, &mut discarded).unwrap().unwrap();
        assert_eq!(resolved.route_id, RouteId::from("3"));
        assert_eq!(
            discarded,
            DiscardedEntries {
                missing_activity: 1,
                invalid_label: 1
            }
        );
    }
}
