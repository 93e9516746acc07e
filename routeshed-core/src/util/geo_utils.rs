use geo::{BoundingRect, Distance, Euclidean, Geometry, MultiPolygon, Point};
use rstar::AABB;

/// coerces a decoded geometry into a MultiPolygon. areal units may be stored as
/// either POLYGON or MULTIPOLYGON, anything else is rejected.
pub fn try_into_multipolygon(geometry: Geometry<f64>) -> Result<MultiPolygon<f64>, String> {
    match geometry {
        Geometry::Polygon(p) => Ok(MultiPolygon::new(vec![p])),
        Geometry::MultiPolygon(mp) => Ok(mp),
        Geometry::Rect(r) => Ok(MultiPolygon::new(vec![r.to_polygon()])),
        Geometry::Triangle(t) => Ok(MultiPolygon::new(vec![t.to_polygon()])),
        other => Err(format!(
            "expected POLYGON or MULTIPOLYGON, found {}",
            geometry_type_name(&other)
        )),
    }
}

/// creates the bounding envelope of a geometry extended on all sides by
/// some distance, in the units of the projected CRS.
///
/// since a bounding rectangle may not exist (for example, empty geometries),
/// the result may be None
pub fn expanded_envelope(geometry: &MultiPolygon<f64>, distance: f64) -> Option<AABB<[f64; 2]>> {
    let rect = geometry.bounding_rect()?;
    let (min, max) = (rect.min(), rect.max());
    Some(AABB::from_corners(
        [min.x - distance, min.y - distance],
        [max.x + distance, max.y + distance],
    ))
}

/// planar distance from a point to the nearest boundary of a (multi)polygon,
/// or zero when the point lies inside it.
pub fn distance_to_point(geometry: &MultiPolygon<f64>, point: &Point<f64>) -> f64 {
    geometry
        .iter()
        .map(|polygon| Euclidean.distance(point, polygon))
        .fold(f64::INFINITY, f64::min)
}

/// center of the bounding rectangle, used to seed nearest-neighbor searches.
pub fn envelope_center(geometry: &MultiPolygon<f64>) -> Option<Point<f64>> {
    geometry.bounding_rect().map(|r| r.center().into())
}

fn geometry_type_name(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "POINT",
        Geometry::Line(_) => "LINE",
        Geometry::LineString(_) => "LINESTRING",
        Geometry::Polygon(_) => "POLYGON",
        Geometry::MultiPoint(_) => "MULTIPOINT",
        Geometry::MultiLineString(_) => "MULTILINESTRING",
        Geometry::MultiPolygon(_) => "MULTIPOLYGON",
        Geometry::GeometryCollection(_) => "GEOMETRYCOLLECTION",
        Geometry::Rect(_) => "RECT",
        Geometry::Triangle(_) => "TRIANGLE",
    }
}
