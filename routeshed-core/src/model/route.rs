use serde::{Deserialize, Serialize};

use super::PartitionError;

/// identifier of a transit line. routes are never first-class records, only a
/// grouping key shared by stops, unit assignments and zones.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId(pub String);

impl std::fmt::Display for RouteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RouteId {
    fn from(value: &str) -> Self {
        RouteId(value.to_string())
    }
}

/// a composite ridership label such as "22-N", made of a route identifier and
/// an optional direction separated by a delimiter. only the route id is used
/// downstream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteLabel {
    pub route_id: RouteId,
    pub direction: Option<String>,
}

impl RouteLabel {
    /// splits a raw label on the first occurrence of the delimiter. the first
    /// segment is the route id, the remainder (if non-empty) the direction.
    ///
    /// # Arguments
    ///
    /// * `raw`       - label as it appears in the ridership dataset
    /// * `delimiter` - separator between route id and direction
    ///
    /// # Returns
    ///
    /// * the parsed label, or an error if the route id segment is empty
    pub fn parse(raw: &str, delimiter: &str) -> Result<RouteLabel, PartitionError> {
        if delimiter.is_empty() {
            return Err(PartitionError::InvalidUserInput(String::from(
                "route label delimiter cannot be empty",
            )));
        }
        let trimmed = raw.trim();
        let (route, direction) = match trimmed.split_once(delimiter) {
            Some((route, direction)) => (route.trim(), Some(direction.trim())),
            None => (trimmed, None),
        };
        if route.is_empty() {
            return Err(PartitionError::InvalidRouteLabel {
                label: raw.to_string(),
                message: String::from("route id segment is empty"),
            });
        }
        let direction = direction.filter(|d| !d.is_empty()).map(String::from);
        Ok(RouteLabel {
            route_id: RouteId(route.to_string()),
            direction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_route_and_direction() {
        let label = RouteLabel::parse("22-N", "-").unwrap();
        assert_eq!(label.route_id, RouteId::from("22"));
        assert_eq!(label.direction.as_deref(), Some("N"));
    }

    #[test]
    fn test_parse_keeps_first_segment_only() {
        let label = RouteLabel::parse(" X9-Express-S ", "-").unwrap();
        assert_eq!(label.route_id, RouteId::from("X9"));
        assert_eq!(label.direction.as_deref(), Some("Express-S"));
    }

    #[test]
    fn test_parse_without_delimiter() {
        let label = RouteLabel::parse("147", "-").unwrap();
        assert_eq!(label.route_id, RouteId::from("147"));
        assert!(label.direction.is_none());
    }

    #[test]
    fn test_parse_empty_route_segment_fails() {
        assert!(RouteLabel::parse("-N", "-").is_err());
        assert!(RouteLabel::parse("   ", "-").is_err());
    }

    #[test]
    fn test_parse_rejects_empty_delimiter() {
        let result = RouteLabel::parse("22-N", "");
        assert!(matches!(result, Err(PartitionError::InvalidUserInput(_))));
    }
}
