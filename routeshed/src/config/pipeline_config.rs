use std::path::Path;

use config::{Config, File};
use routeshed_core::model::PartitionError;
use serde::{Deserialize, Serialize};
use uom::si::f64::Length;

/// configuration for a full partition run, loaded from a TOML file.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct PipelineConfig {
    pub stops: StopInputConfig,
    /// coarse areal units used to delimit the study area
    pub tracts: BoundaryInputConfig,
    /// fine areal units assigned to routes
    pub blocks: BoundaryInputConfig,
    /// population table joined onto tracts for coverage reporting
    #[serde(default)]
    pub population: Option<PopulationInputConfig>,
    #[serde(default)]
    pub study_area: StudyAreaConfig,
    /// run per-unit spatial queries and per-route dissolves on the rayon thread pool
    #[serde(default = "default_parallel_execution")]
    pub parallel_execution: bool,
}

/// describes the wide stop ridership table. each stop row carries any number of
/// parallel route/activity slots, named `<route_column_prefix><k>` and
/// `<activity_column_prefix><k>`.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct StopInputConfig {
    pub input_file: String,
    #[serde(default = "default_stop_id_column")]
    pub id_column: String,
    #[serde(default = "default_x_column")]
    pub x_column: String,
    #[serde(default = "default_y_column")]
    pub y_column: String,
    #[serde(default = "default_route_column_prefix")]
    pub route_column_prefix: String,
    #[serde(default = "default_activity_column_prefix")]
    pub activity_column_prefix: String,
    /// separates the route id from the direction in a route label
    #[serde(default = "default_route_label_delimiter")]
    pub route_label_delimiter: String,
}

/// a GeoJSON FeatureCollection of polygonal units
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct BoundaryInputConfig {
    pub input_file: String,
    /// feature property holding the unit's GEOID. if not provided, "GEOID" will be used.
    #[serde(default = "default_geoid_property")]
    pub id_property: String,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct PopulationInputConfig {
    pub input_file: String,
    #[serde(default = "default_geoid_property")]
    pub geoid_column: String,
    #[serde(default = "default_population_column")]
    pub population_column: String,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct StudyAreaConfig {
    /// tracts within this distance of any stop are in the study area. stored
    /// in meters, which must match the unit of the projected CRS.
    #[serde(default = "default_proximity_threshold")]
    pub proximity_threshold: Length,
    /// number of leading GEOID characters identifying a block's tract
    #[serde(default = "default_coarse_id_length")]
    pub coarse_id_length: usize,
}

impl Default for StudyAreaConfig {
    fn default() -> Self {
        Self {
            proximity_threshold: default_proximity_threshold(),
            coarse_id_length: default_coarse_id_length(),
        }
    }
}

impl PipelineConfig {
    pub fn from_file(configuration_file: &str) -> Result<PipelineConfig, PartitionError> {
        let filepath = Path::new(configuration_file);
        let config = Config::builder()
            .add_source(File::from(filepath))
            .build()
            .map_err(|e| {
                let msg = format!("file '{configuration_file}' produced error: {e}");
                PartitionError::InvalidUserInput(msg)
            })?;
        let pipeline_config = config.try_deserialize::<PipelineConfig>().map_err(|e| {
            let msg = format!("error reading pipeline configuration in '{configuration_file}': {e}");
            PartitionError::InvalidUserInput(msg)
        })?;
        pipeline_config.validate()?;
        Ok(pipeline_config)
    }

    pub fn validate(&self) -> Result<(), PartitionError> {
        let threshold = self.study_area.proximity_threshold.get::<uom::si::length::meter>();
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(PartitionError::InvalidUserInput(format!(
                "study_area.proximity_threshold must be a non-negative distance, found {threshold}"
            )));
        }
        if self.study_area.coarse_id_length == 0 {
            return Err(PartitionError::InvalidUserInput(String::from(
                "study_area.coarse_id_length must be positive",
            )));
        }
        if self.stops.route_label_delimiter.is_empty() {
            return Err(PartitionError::InvalidUserInput(String::from(
                "stops.route_label_delimiter cannot be empty",
            )));
        }
        Ok(())
    }
}

fn default_parallel_execution() -> bool {
    true
}

fn default_stop_id_column() -> String {
    "stop_id".to_string()
}

fn default_x_column() -> String {
    "x".to_string()
}

fn default_y_column() -> String {
    "y".to_string()
}

fn default_route_column_prefix() -> String {
    "route".to_string()
}

fn default_activity_column_prefix() -> String {
    "activity".to_string()
}

fn default_route_label_delimiter() -> String {
    "-".to_string()
}

fn default_geoid_property() -> String {
    "GEOID".to_string()
}

fn default_population_column() -> String {
    "population".to_string()
}

fn default_proximity_threshold() -> Length {
    Length::new::<uom::si::length::meter>(500.0)
}

fn default_coarse_id_length() -> usize {
    11
}
