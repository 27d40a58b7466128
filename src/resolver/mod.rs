//! Reference table loading.
//!
//! Both lookup tables are read once from CSV at startup and are
//! immutable afterwards.

pub mod protocol;
pub mod tag;

pub use protocol::ProtocolTable;
pub use tag::TagTable;

use crate::error::{FlowTagError, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Open a reference file, mapping open failures to `UnreadableSource`.
fn open_source(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| FlowTagError::UnreadableSource {
        path: path.to_path_buf(),
        source,
    })
}

/// Build a header-aware CSV reader over any byte source.
fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::Headers)
        .flexible(true)
        .from_reader(reader)
}

/// Locate the required columns by header name.
fn column_indices<const N: usize>(
    headers: &StringRecord,
    required: [&str; N],
    source_name: &str,
) -> Result<[usize; N]> {
    let mut indices = [0usize; N];
    for (slot, name) in indices.iter_mut().zip(required) {
        *slot = headers.iter().position(|h| h == name).ok_or_else(|| {
            FlowTagError::malformed(source_name, 1, format!("missing column '{}'", name))
        })?;
    }
    Ok(indices)
}

/// Fetch a column from a row, failing when the row is too short.
///
/// Values are returned untrimmed; callers trim the columns they parse.
fn field<'r>(
    record: &'r StringRecord,
    index: usize,
    name: &str,
    source_name: &str,
) -> Result<&'r str> {
    record.get(index).ok_or_else(|| {
        FlowTagError::malformed(
            source_name,
            line_of(record),
            format!("missing column '{}'", name),
        )
    })
}

/// 1-based line number of a record, for error messages.
fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

/// Convert a CSV read error into reference-data corruption.
fn csv_error(err: csv::Error, source_name: &str) -> FlowTagError {
    let line = err.position().map(|p| p.line()).unwrap_or(0);
    FlowTagError::malformed(source_name, line, err.to_string())
}
