use std::{collections::HashMap, fs::File, path::Path};

use csv::Reader;
use geo::Point;
use kdam::{Bar, BarExt};
use routeshed_core::model::{parse_activity, PartitionError, RouteActivity, Stop, StopId};

use crate::config::StopInputConfig;

/// a (route label, activity) column pair discovered in the stop table header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotColumns {
    pub slot: usize,
    pub route_index: usize,
    pub activity_index: usize,
}

/// reads the wide stop ridership table. every row becomes a Stop whose route
/// activity entries are the non-empty route slots in slot order. activity
/// values that are empty or not numeric are kept as None so the resolver can
/// discard them.
pub fn read_stops(config: &StopInputConfig) -> Result<Vec<Stop>, PartitionError> {
    let path = Path::new(&config.input_file);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| PartitionError::Parse {
            path: path.to_path_buf(),
            message: format!("failed to open stop table: {e}"),
        })?;
    let headers = build_header_lookup(&mut reader, path)?;
    let id_index = column_index(&headers, &config.id_column, path)?;
    let x_index = column_index(&headers, &config.x_column, path)?;
    let y_index = column_index(&headers, &config.y_column, path)?;
    let slots = discover_slots(
        &headers,
        &config.route_column_prefix,
        &config.activity_column_prefix,
    )
    .map_err(|message| PartitionError::Parse {
        path: path.to_path_buf(),
        message,
    })?;
    log::debug!(
        "stop table '{}' has {} route/activity slots",
        path.to_string_lossy(),
        slots.len()
    );

    let mut bar = Bar::builder()
        .desc("read stops")
        .build()
        .map_err(|e| PartitionError::InternalError(format!("error building progress bar: {e}")))?;
    let mut stops = vec![];
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| PartitionError::Parse {
            path: path.to_path_buf(),
            message: format!("row {row}: {e}"),
        })?;
        let field = |index: usize| record.get(index).unwrap_or_default().trim();

        let stop_id = field(id_index);
        if stop_id.is_empty() {
            return Err(PartitionError::Deserialize {
                col: config.id_column.clone(),
                path: path.to_path_buf(),
                message: format!("row {row} has an empty stop id"),
            });
        }
        let x = parse_coordinate(field(x_index), &config.x_column, row, path)?;
        let y = parse_coordinate(field(y_index), &config.y_column, row, path)?;

        let entries = slots
            .iter()
            .filter_map(|slot| {
                let label = field(slot.route_index);
                if label.is_empty() {
                    // unused slot capacity
                    None
                } else {
                    let activity = parse_activity(field(slot.activity_index));
                    Some(RouteActivity::new(label, activity))
                }
            })
            .collect::<Vec<_>>();

        stops.push(Stop {
            stop_id: StopId(stop_id.to_string()),
            location: Point::new(x, y),
            entries,
        });
        let _ = bar.update(1);
    }
    eprintln!();
    log::info!(
        "read {} stops from '{}'",
        stops.len(),
        path.to_string_lossy()
    );
    Ok(stops)
}

/// finds every `<route_prefix><k>` column with a matching `<activity_prefix><k>`
/// column, ordered by k. a route column without its activity partner is an error.
pub fn discover_slots(
    headers: &HashMap<String, usize>,
    route_prefix: &str,
    activity_prefix: &str,
) -> Result<Vec<SlotColumns>, String> {
    let mut slots = vec![];
    for (name, route_index) in headers.iter() {
        let slot = match name
            .strip_prefix(route_prefix)
            .and_then(|suffix| suffix.parse::<usize>().ok())
        {
            Some(slot) => slot,
            None => continue,
        };
        let activity_column = format!("{activity_prefix}{slot}");
        let activity_index = headers.get(&activity_column).ok_or_else(|| {
            format!("route column '{name}' has no matching activity column '{activity_column}'")
        })?;
        slots.push(SlotColumns {
            slot,
            route_index: *route_index,
            activity_index: *activity_index,
        });
    }
    if slots.is_empty() {
        return Err(format!(
            "no route slot columns found matching '{route_prefix}<n>'"
        ));
    }
    slots.sort_by_key(|s| s.slot);
    Ok(slots)
}

pub fn build_header_lookup(
    reader: &mut Reader<File>,
    path: &Path,
) -> Result<HashMap<String, usize>, PartitionError> {
    // We nest this call in its own scope because of lifetimes.
    let headers = reader.headers().map_err(|e| PartitionError::Parse {
        path: path.to_path_buf(),
        message: format!("failure retrieving headers: {e}"),
    })?;
    let lookup: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(idx, col)| (String::from(col.trim()), idx))
        .collect::<HashMap<_, _>>();

    Ok(lookup)
}

pub fn column_index(
    headers: &HashMap<String, usize>,
    column: &str,
    path: &Path,
) -> Result<usize, PartitionError> {
    headers
        .get(column)
        .copied()
        .ok_or_else(|| PartitionError::Deserialize {
            col: column.to_string(),
            path: path.to_path_buf(),
            message: "column missing".to_string(),
        })
}

fn parse_coordinate(value: &str, col: &str, row: usize, path: &Path) -> Result<f64, PartitionError> {
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(PartitionError::Deserialize {
            col: col.to_string(),
            path: path.to_path_buf(),
            message: format!("row {row} has invalid coordinate '{value}'"),
        }),
    }
}
