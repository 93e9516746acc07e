use geo::MultiPolygon;
use serde::{Deserialize, Serialize};

use super::PartitionError;

/// unique geographic identifier of an areal unit. fine-grained identifiers
/// encode their coarse ancestor as a fixed-length prefix, for example a
/// 15-digit census block GEOID begins with the 11-digit GEOID of its tract.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Geoid(pub String);

impl Geoid {
    /// truncates this identifier to the ancestor prefix of the given length.
    pub fn ancestor(&self, prefix_length: usize) -> Result<Geoid, PartitionError> {
        if self.0.len() <= prefix_length {
            return Err(PartitionError::InvalidUserInput(format!(
                "geoid '{}' has {} characters, must be longer than the ancestor prefix length {}",
                self.0,
                self.0.len(),
                prefix_length
            )));
        }
        match self.0.get(..prefix_length) {
            Some(prefix) => Ok(Geoid(prefix.to_string())),
            None => Err(PartitionError::InvalidUserInput(format!(
                "geoid '{}' cannot be split at byte {prefix_length}",
                self.0
            ))),
        }
    }
}

impl std::fmt::Display for Geoid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Geoid {
    fn from(value: &str) -> Self {
        Geoid(value.to_string())
    }
}

/// a polygonal subdivision of the county extent. the same shape is used for
/// coarse (tract) and fine (block) units.
#[derive(Clone, Debug)]
pub struct AreaUnit {
    pub geoid: Geoid,
    pub geometry: MultiPolygon<f64>,
    pub population: Option<f64>,
}

impl AreaUnit {
    pub fn new(geoid: Geoid, geometry: MultiPolygon<f64>) -> AreaUnit {
        AreaUnit {
            geoid,
            geometry,
            population: None,
        }
    }
}
