use geo::{polygon, MultiPolygon, Point};
use routeshed_core::model::{
    AreaUnit, Geoid, ResolvedStop, RouteActivity, RouteId, Stop, StopId,
};

/// an axis-aligned square with its lower-left corner at (x, y)
pub fn square(x: f64, y: f64, size: f64) -> MultiPolygon<f64> {
    MultiPolygon::new(vec![polygon![
        (x: x, y: y),
        (x: x + size, y: y),
        (x: x + size, y: y + size),
        (x: x, y: y + size),
        (x: x, y: y),
    ]])
}

pub fn area_unit(geoid: &str, geometry: MultiPolygon<f64>) -> AreaUnit {
    AreaUnit::new(Geoid::from(geoid), geometry)
}

pub fn resolved_stop(stop_id: &str, route_id: &str, x: f64, y: f64) -> ResolvedStop {
    ResolvedStop {
        stop_id: StopId::from(stop_id),
        route_id: RouteId::from(route_id),
        activity: 1.0,
        x,
        y,
    }
}

pub fn stop(stop_id: &str, x: f64, y: f64, entries: &[(&str, Option<f64>)]) -> Stop {
    Stop {
        stop_id: StopId::from(stop_id),
        location: Point::new(x, y),
        entries: entries
            .iter()
            .map(|(label, activity)| RouteActivity::new(label, *activity))
            .collect(),
    }
}
