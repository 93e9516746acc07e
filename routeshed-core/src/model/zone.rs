use std::collections::BTreeSet;

use geo::{Area, MultiPolygon};

use super::{Geoid, RouteId};

/// the merged service area of a single route.
#[derive(Clone, Debug)]
pub struct Zone {
    pub route_id: RouteId,
    pub geometry: MultiPolygon<f64>,
    pub unit_ids: BTreeSet<Geoid>,
}

impl Zone {
    pub fn area(&self) -> f64 {
        self.geometry.unsigned_area()
    }
}
