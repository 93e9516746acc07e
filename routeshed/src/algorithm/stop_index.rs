use geo::{MultiPolygon, Point};
use ordered_float::OrderedFloat;
use routeshed_core::{
    model::ResolvedStop,
    util::geo_utils::{distance_to_point, envelope_center, expanded_envelope},
};
use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// a resolved stop location with its index into the stop collection
#[derive(Debug, Clone, Copy)]
struct IndexedStop {
    idx: usize,
    x: f64,
    y: f64,
}

impl IndexedStop {
    fn point(&self) -> Point<f64> {
        Point::new(self.x, self.y)
    }
}

impl RTreeObject for IndexedStop {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.x, self.y])
    }
}

impl PointDistance for IndexedStop {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.x - point[0];
        let dy = self.y - point[1];
        dx * dx + dy * dy
    }
}

/// the closest stop to some areal unit, with the planar distance between them.
#[derive(Debug, Clone, Copy)]
pub struct NearestStop<'a> {
    pub stop: &'a ResolvedStop,
    pub distance: f64,
}

/// spatial index over resolved stop locations supporting polygon-to-point
/// proximity and nearest-neighbor queries.
pub struct StopIndex<'a> {
    stops: &'a [ResolvedStop],
    rtree: RTree<IndexedStop>,
}

impl<'a> StopIndex<'a> {
    pub fn new(stops: &'a [ResolvedStop]) -> StopIndex<'a> {
        let indexed = stops
            .iter()
            .enumerate()
            .map(|(idx, s)| IndexedStop {
                idx,
                x: s.x,
                y: s.y,
            })
            .collect();
        StopIndex {
            stops,
            rtree: RTree::bulk_load(indexed),
        }
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// true if any stop lies within `distance` of the geometry. stops inside
    /// the geometry are at distance zero.
    pub fn any_within(&self, geometry: &MultiPolygon<f64>, distance: f64) -> bool {
        let envelope = match expanded_envelope(geometry, distance) {
            Some(e) => e,
            None => return false,
        };
        self.rtree
            .locate_in_envelope_intersecting(&envelope)
            .any(|s| distance_to_point(geometry, &s.point()) <= distance)
    }

    /// finds the stop nearest to a geometry, without any distance limit.
    ///
    /// the search is seeded with the stop nearest to the center of the geometry's
    /// bounding box. the distance from that stop to the geometry bounds the
    /// distance of the true nearest stop, so only stops inside the geometry's
    /// envelope expanded by that bound are compared exactly.
    ///
    /// equidistant stops are broken by the smallest stop id.
    ///
    /// # Returns
    ///
    /// * the nearest stop, or None if the index is empty or the geometry has no extent
    pub fn nearest(&self, geometry: &MultiPolygon<f64>) -> Option<NearestStop<'a>> {
        let center = envelope_center(geometry)?;
        let seed = self.rtree.nearest_neighbor(&[center.x(), center.y()])?;
        let seed_distance = distance_to_point(geometry, &seed.point());
        // widen slightly so rounding never excludes a stop at exactly the bound
        let search_distance = seed_distance + seed_distance.abs() * 1e-9 + 1e-9;
        let envelope = expanded_envelope(geometry, search_distance)?;

        let stops = self.stops;
        let (distance, _, idx) = self
            .rtree
            .locate_in_envelope_intersecting(&envelope)
            .map(|s| {
                let d = distance_to_point(geometry, &s.point());
                (OrderedFloat(d), &stops[s.idx].stop_id, s.idx)
            })
            .min()
            .unwrap_or((OrderedFloat(seed_distance), &stops[seed.idx].stop_id, seed.idx));

        Some(NearestStop {
            stop: &stops[idx],
            distance: distance.into_inner(),
        })
    }
}
