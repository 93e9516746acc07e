mod pipeline;
mod routeshed_app;
pub mod run;

pub use pipeline::{Pipeline, PipelineArtifacts};
pub use routeshed_app::{RouteshedApp, RouteshedOperation};
