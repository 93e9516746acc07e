mod pipeline_config;

pub use pipeline_config::{
    BoundaryInputConfig, PipelineConfig, PopulationInputConfig, StopInputConfig, StudyAreaConfig,
};
