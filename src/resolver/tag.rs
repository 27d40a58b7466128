//! (destination port, protocol name) to tag lookup.
//!
//! Loaded from a CSV with `dstport`, `protocol` and `tag` columns.

use super::{column_indices, csv_error, csv_reader, field, line_of, open_source};
use crate::error::{FlowTagError, Result};
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

const PORT_COLUMN: &str = "dstport";
const PROTOCOL_COLUMN: &str = "protocol";
const TAG_COLUMN: &str = "tag";

/// Immutable (port, protocol) → tag table.
#[derive(Debug, Clone, Default)]
pub struct TagTable {
    entries: HashMap<u16, HashMap<String, String>>,
    /// Distinct tags in the order they were first seen.
    tags: Vec<String>,
}

impl TagTable {
    /// Load the table from a CSV file.
    pub fn load(path: &Path) -> Result<Self> {
        let file = open_source(path)?;
        let table = Self::from_reader(file, &path.display().to_string())?;
        info!(
            "Loaded {} tag mappings ({} distinct tags) from {}",
            table.len(),
            table.tags.len(),
            path.display()
        );
        Ok(table)
    }

    /// Load the table from any CSV byte source.
    pub fn from_reader<R: Read>(reader: R, source_name: &str) -> Result<Self> {
        let mut rdr = csv_reader(reader);
        let headers = rdr.headers().map_err(|e| csv_error(e, source_name))?.clone();
        let [port_idx, protocol_idx, tag_idx] = column_indices(
            &headers,
            [PORT_COLUMN, PROTOCOL_COLUMN, TAG_COLUMN],
            source_name,
        )?;

        let mut table = Self::default();
        let mut seen_tags = HashSet::new();

        for result in rdr.records() {
            let record = result.map_err(|e| csv_error(e, source_name))?;
            let line = line_of(&record);
            let port = field(&record, port_idx, PORT_COLUMN, source_name)?.trim();
            let protocol = field(&record, protocol_idx, PROTOCOL_COLUMN, source_name)?.trim();
            let tag = field(&record, tag_idx, TAG_COLUMN, source_name)?;

            let port: u16 = port.parse().map_err(|_| {
                FlowTagError::malformed(
                    source_name,
                    line,
                    format!("'{}' is not a port number (0-65535)", port),
                )
            })?;

            if protocol != protocol.to_lowercase() {
                warn!(
                    "Protocol '{}' on line {} of {} is not lowercase and will never match",
                    protocol, line, source_name
                );
            }

            if seen_tags.insert(tag.to_string()) {
                table.tags.push(tag.to_string());
            }

            let previous = table
                .entries
                .entry(port)
                .or_default()
                .insert(protocol.to_string(), tag.to_string());

            if let Some(previous) = previous {
                warn!(
                    "Duplicate mapping {},{} on line {} of {} ('{}' replaced by '{}')",
                    port, protocol, line, source_name, previous, tag
                );
            }
        }

        Ok(table)
    }

    /// Exact-match lookup; the protocol name is compared case-sensitively.
    pub fn lookup(&self, port: u16, protocol: &str) -> Option<&str> {
        self.entries
            .get(&port)
            .and_then(|by_protocol| by_protocol.get(protocol))
            .map(String::as_str)
    }

    /// Distinct tags in first-seen order.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Number of (port, protocol) mappings.
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    #[allow(dead_code)] // Pairs with len()
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
