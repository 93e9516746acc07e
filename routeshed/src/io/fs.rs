use std::{fs::File, path::Path};

use csv::QuoteStyle;
use kdam::tqdm;
use routeshed_core::model::PartitionError;
use serde::Serialize;

/// helper function to "mkdir -p path" - make all directories along a path
pub fn create_dirs<P>(path: P) -> Result<(), PartitionError>
where
    P: AsRef<Path>,
{
    let dirspath = path.as_ref();
    if !dirspath.is_dir() {
        std::fs::create_dir_all(dirspath).map_err(|e| {
            let msg = format!(
                "error building output directory '{}': {e}",
                dirspath.to_str().unwrap_or_default()
            );
            PartitionError::InvalidUserInput(msg)
        })
    } else {
        Ok(())
    }
}

/// writes each element as a CSV row with a header derived from the element's
/// serialized field names.
pub fn serialize_into_csv<I>(
    iterable: I,
    filename: &str,
    output_directory: &Path,
    desc: &str,
) -> Result<(), PartitionError>
where
    I: IntoIterator,
    I::IntoIter: ExactSizeIterator,
    I::Item: Serialize,
{
    let filepath = output_directory.join(filename);
    let mut writer = create_writer(&filepath)?;
    let iter = iterable.into_iter();
    let total = iter.len();
    let bar_iter = tqdm!(iter, total = total, desc = desc);
    for element in bar_iter {
        writer
            .serialize(element)
            .map_err(|e| PartitionError::Write {
                path: filepath.clone(),
                message: e.to_string(),
            })?;
    }
    eprintln!();
    writer.flush().map_err(|e| PartitionError::Write {
        path: filepath.clone(),
        message: format!("failed to flush: {e}"),
    })?;
    log::info!("wrote {total} rows to '{}'", filepath.to_string_lossy());
    Ok(())
}

/// writes a value as pretty-printed JSON.
pub fn write_json<T: Serialize>(
    value: &T,
    filename: &str,
    output_directory: &Path,
) -> Result<(), PartitionError> {
    let filepath = output_directory.join(filename);
    let file = File::create(&filepath).map_err(|e| PartitionError::Write {
        path: filepath.clone(),
        message: e.to_string(),
    })?;
    serde_json::to_writer_pretty(file, value).map_err(|e| PartitionError::Write {
        path: filepath.clone(),
        message: e.to_string(),
    })
}

fn create_writer(filepath: &Path) -> Result<csv::Writer<File>, PartitionError> {
    let file = File::create(filepath).map_err(|e| PartitionError::Write {
        path: filepath.to_path_buf(),
        message: e.to_string(),
    })?;
    let writer = csv::WriterBuilder::new()
        .has_headers(true)
        .quote_style(QuoteStyle::Necessary)
        .from_writer(file);
    Ok(writer)
}
