use geo::Point;
use serde::{Deserialize, Serialize};

use super::RouteId;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StopId(pub String);

impl std::fmt::Display for StopId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StopId {
    fn from(value: &str) -> Self {
        StopId(value.to_string())
    }
}

/// one (route label, activity) slot of a stop's ridership record. the activity
/// is None when the source value was empty or not a valid count.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteActivity {
    pub label: String,
    pub activity: Option<f64>,
}

impl RouteActivity {
    pub fn new(label: &str, activity: Option<f64>) -> RouteActivity {
        RouteActivity {
            label: label.to_string(),
            activity,
        }
    }
}

/// a transit stop as read from the ridership dataset. coordinates are in the
/// common projected CRS shared with the boundary datasets.
#[derive(Clone, Debug)]
pub struct Stop {
    pub stop_id: StopId,
    pub location: Point<f64>,
    pub entries: Vec<RouteActivity>,
}

/// a stop collapsed to its dominant route.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ResolvedStop {
    pub stop_id: StopId,
    pub route_id: RouteId,
    pub activity: f64,
    pub x: f64,
    pub y: f64,
}

impl ResolvedStop {
    pub fn location(&self) -> Point<f64> {
        Point::new(self.x, self.y)
    }
}

/// reads an activity count from its textual representation. boardings and
/// alightings may be averaged upstream, so fractional values are accepted.
/// empty, non-numeric, non-finite and negative values are treated as missing.
pub fn parse_activity(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    // thousands separators show up in exported spreadsheets
    let cleaned = trimmed.replace(',', "");
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Some(v),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_activity() {
        assert_eq!(parse_activity("100"), Some(100.0));
        assert_eq!(parse_activity(" 12.5 "), Some(12.5));
        assert_eq!(parse_activity("1,204"), Some(1204.0));
        assert_eq!(parse_activity("0"), Some(0.0));
    }

    #[test]
    fn test_parse_activity_missing_values() {
        assert_eq!(parse_activity(""), None);
        assert_eq!(parse_activity("   "), None);
        assert_eq!(parse_activity("n/a"), None);
        assert_eq!(parse_activity("-3"), None);
        assert_eq!(parse_activity("NaN"), None);
        assert_eq!(parse_activity("inf"), None);
    }
}
