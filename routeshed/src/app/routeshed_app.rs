use std::path::Path;

use clap::{Parser, Subcommand};
use routeshed_core::model::PartitionError;
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;

/// Command line tool that partitions a transit study area into one service zone per route
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct RouteshedApp {
    #[command(subcommand)]
    pub op: RouteshedOperation,
}

#[derive(Debug, Clone, Serialize, Deserialize, Subcommand)]
pub enum RouteshedOperation {
    /// resolve stop routes, select the study area, assign blocks to routes and
    /// dissolve them into zones
    Run {
        /// TOML file describing the stop, boundary and population inputs
        #[arg(short, long)]
        configuration_file: String,

        /// location on disk to write output files. if not provided,
        /// use the current working directory.
        #[arg(short, long)]
        output_directory: Option<String>,

        /// discard an existing zones.geojson checkpoint and dissolve again
        #[arg(long)]
        overwrite: bool,
    },
    /// resolve stop routes and select the study area only
    StudyArea {
        /// TOML file describing the stop, boundary and population inputs
        #[arg(short, long)]
        configuration_file: String,

        /// location on disk to write output files. if not provided,
        /// use the current working directory.
        #[arg(short, long)]
        output_directory: Option<String>,
    },
}

impl RouteshedOperation {
    pub fn run(&self) -> Result<(), PartitionError> {
        match self {
            RouteshedOperation::Run {
                configuration_file,
                output_directory,
                overwrite,
            } => {
                let config = PipelineConfig::from_file(configuration_file)?;
                let outdir = output_path(output_directory);
                crate::app::run::run(&config, outdir, *overwrite)
            }
            RouteshedOperation::StudyArea {
                configuration_file,
                output_directory,
            } => {
                let config = PipelineConfig::from_file(configuration_file)?;
                let outdir = output_path(output_directory);
                crate::app::run::run_study_area(&config, outdir).map(|_| ())
            }
        }
    }
}

fn output_path(output_directory: &Option<String>) -> &Path {
    match output_directory {
        Some(out) => Path::new(out),
        None => Path::new(""),
    }
}
