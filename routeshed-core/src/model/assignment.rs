use geo::MultiPolygon;

use super::{Geoid, RouteId, StopId};

/// a fine areal unit labeled with the route of its nearest stop. the stop id
/// is retained for reporting and verification only.
#[derive(Clone, Debug)]
pub struct UnitAssignment {
    pub geoid: Geoid,
    pub geometry: MultiPolygon<f64>,
    pub route_id: RouteId,
    pub stop_id: StopId,
    pub distance: f64,
}
