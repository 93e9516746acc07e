use std::path::PathBuf;

use super::{Geoid, StopId};

#[derive(thiserror::Error, Debug)]
pub enum PartitionError {
    #[error("Invalid input: {0}")]
    InvalidUserInput(String),
    #[error("failure reading file from {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse '{path}' due to: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("failed to deserialize column {col} in file '{path}' due to: {message}")]
    Deserialize {
        col: String,
        path: PathBuf,
        message: String,
    },
    #[error("Error writing to '{path}': {message}")]
    Write { path: PathBuf, message: String },
    #[error("invalid route label '{label}': {message}")]
    InvalidRouteLabel { label: String, message: String },
    #[error("{} stop(s) have no valid route activity entries, first few: {}", .0.len(), format_ids(.0))]
    UnresolvableStops(Vec<StopId>),
    #[error("no stop is reachable from area unit {0}")]
    UnreachableUnit(Geoid),
    #[error("join on {key_name} failed, {} unmatched key(s), first few: {}", .keys.len(), format_ids(.keys))]
    UnmatchedKeys { key_name: String, keys: Vec<String> },
    #[error("study area is empty: {0}")]
    EmptyStudyArea(String),
    #[error("Invalid or empty geometry: {0}")]
    InvalidGeometry(String),
    #[error("zone checkpoint '{path}' is stale: {message}. rerun with --overwrite to rebuild it")]
    StaleCheckpoint { path: PathBuf, message: String },
    #[error("{0}")]
    InternalError(String),
}

/// renders at most five identifiers for error messages.
fn format_ids<T: std::fmt::Display>(ids: &[T]) -> String {
    ids.iter()
        .take(5)
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
