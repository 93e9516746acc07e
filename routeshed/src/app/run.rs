use std::path::Path;

use routeshed_core::model::{AreaUnit, Geoid, PartitionError, ResolvedStop, RouteId};
use serde::{Deserialize, Serialize};

use crate::{
    algorithm::{dissolve::verify_partition, StudyArea},
    app::Pipeline,
    config::PipelineConfig,
    io::{
        boundaries::read_area_units,
        fs,
        population::{join_population, read_population},
        stops::read_stops,
        ZoneCheckpoint,
    },
};

pub const RESOLVED_STOPS_FILENAME: &str = "resolved_stops.csv";
pub const STUDY_AREA_FILENAME: &str = "study_area.csv";
pub const STUDY_AREA_SUMMARY_FILENAME: &str = "study_area_summary.json";
pub const ASSIGNMENTS_FILENAME: &str = "assignments.csv";

#[derive(Serialize, Deserialize, Clone, Debug)]
struct StudyAreaRow {
    geoid: Geoid,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct AssignmentRow {
    geoid: Geoid,
    route_id: RouteId,
}

/// runs the full partition and writes every output table plus the zone
/// checkpoint. an existing checkpoint is reused unless `overwrite` is set.
/// the checkpoint is validated before any table is written, so a stale
/// checkpoint leaves the previous outputs untouched.
pub fn run(
    config: &PipelineConfig,
    output_directory: &Path,
    overwrite: bool,
) -> Result<(), PartitionError> {
    fs::create_dirs(output_directory)?;
    let pipeline = Pipeline::from(config);
    let (resolved, study_area) = select_study_area(&pipeline, config)?;

    let blocks = read_area_units(&config.blocks)?;
    let assignments = pipeline.assign(&resolved, blocks, &study_area)?;

    let checkpoint = ZoneCheckpoint::new(output_directory);
    if overwrite {
        checkpoint.invalidate()?;
    }
    let zones = match checkpoint.load_zones(&assignments)? {
        Some(zones) => {
            verify_partition(&zones, &assignments)?;
            zones
        }
        None => {
            let zones = pipeline.dissolve(&assignments)?;
            checkpoint.store(&zones, overwrite)?;
            zones
        }
    };

    write_study_area(&resolved, &study_area, output_directory)?;
    let rows = assignments
        .iter()
        .map(|a| AssignmentRow {
            geoid: a.geoid.clone(),
            route_id: a.route_id.clone(),
        })
        .collect::<Vec<_>>();
    fs::serialize_into_csv(
        rows,
        ASSIGNMENTS_FILENAME,
        output_directory,
        "write unit assignments",
    )?;
    log::info!(
        "partitioned {} units into {} route zones, see '{}'",
        assignments.len(),
        zones.len(),
        checkpoint.path().to_string_lossy()
    );
    Ok(())
}

/// resolves stop routes and selects the study area, writing the resolved stop
/// table, the study area GEOID list and its coverage summary.
pub fn run_study_area(
    config: &PipelineConfig,
    output_directory: &Path,
) -> Result<(Vec<ResolvedStop>, StudyArea), PartitionError> {
    fs::create_dirs(output_directory)?;
    let pipeline = Pipeline::from(config);
    let (resolved, study_area) = select_study_area(&pipeline, config)?;
    write_study_area(&resolved, &study_area, output_directory)?;
    Ok((resolved, study_area))
}

fn select_study_area(
    pipeline: &Pipeline,
    config: &PipelineConfig,
) -> Result<(Vec<ResolvedStop>, StudyArea), PartitionError> {
    let stops = read_stops(&config.stops)?;
    let tracts = read_tracts(config)?;
    pipeline.select_study_area(&stops, &tracts)
}

fn write_study_area(
    resolved: &[ResolvedStop],
    study_area: &StudyArea,
    output_directory: &Path,
) -> Result<(), PartitionError> {
    fs::serialize_into_csv(
        resolved.iter(),
        RESOLVED_STOPS_FILENAME,
        output_directory,
        "write resolved stops",
    )?;
    let rows = study_area
        .unit_ids
        .iter()
        .map(|geoid| StudyAreaRow {
            geoid: geoid.clone(),
        })
        .collect::<Vec<_>>();
    fs::serialize_into_csv(
        rows,
        STUDY_AREA_FILENAME,
        output_directory,
        "write study area",
    )?;
    fs::write_json(
        &study_area.coverage,
        STUDY_AREA_SUMMARY_FILENAME,
        output_directory,
    )
}

fn read_tracts(config: &PipelineConfig) -> Result<Vec<AreaUnit>, PartitionError> {
    let tracts = read_area_units(&config.tracts)?;
    match &config.population {
        Some(population_config) => {
            let table = read_population(population_config)?;
            join_population(tracts, &table)
        }
        None => Ok(tracts),
    }
}
