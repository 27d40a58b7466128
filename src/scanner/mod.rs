//! Flow log scanner.
//!
//! Reads a whitespace-delimited flow log one line at a time and yields
//! parsed [`FlowRecord`]s. Malformed lines are skipped and counted, or
//! abort the scan in strict mode.

use crate::config::FlowLogConfig;
use crate::error::{FlowTagError, Result};
use crate::models::{field_name, FlowRecord, ScanStats};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Positional layout of a flow log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowLogLayout {
    /// 0-based index of the destination port field.
    pub port_field: usize,
    /// 0-based index of the protocol number field.
    pub protocol_field: usize,
    /// Exact number of fields required, if any.
    pub expected_fields: Option<usize>,
    /// Abort on the first malformed line instead of skipping it.
    pub strict: bool,
}

impl Default for FlowLogLayout {
    fn default() -> Self {
        Self {
            port_field: 5,
            protocol_field: 7,
            expected_fields: None,
            strict: false,
        }
    }
}

impl From<&FlowLogConfig> for FlowLogLayout {
    fn from(config: &FlowLogConfig) -> Self {
        Self {
            port_field: config.port_field,
            protocol_field: config.protocol_field,
            expected_fields: config.expected_fields,
            strict: config.strict,
        }
    }
}

impl FlowLogLayout {
    /// Parse one non-empty line into a flow record.
    pub fn parse_line(&self, line: &str) -> std::result::Result<FlowRecord, String> {
        let fields: Vec<&str> = line.split_whitespace().collect();

        if let Some(expected) = self.expected_fields {
            if fields.len() != expected {
                return Err(format!("expected {} fields, found {}", expected, fields.len()));
            }
        }

        let needed = self.port_field.max(self.protocol_field) + 1;
        if fields.len() < needed {
            return Err(format!(
                "expected at least {} fields, found {}",
                needed,
                fields.len()
            ));
        }

        let port = fields[self.port_field];
        let destination_port: u16 = port.parse().map_err(|_| {
            format!(
                "{} '{}' is not a port number",
                field_name(self.port_field),
                port
            )
        })?;

        let protocol = fields[self.protocol_field];
        let protocol_number: u8 = protocol.parse().map_err(|_| {
            format!(
                "{} '{}' is not a protocol number",
                field_name(self.protocol_field),
                protocol
            )
        })?;

        Ok(FlowRecord::new(destination_port, protocol_number))
    }
}

/// Lazy iterator over the flow records of a log source.
pub struct FlowLogScanner<R> {
    reader: R,
    source: PathBuf,
    layout: FlowLogLayout,
    line_number: u64,
    buffer: Vec<u8>,
    stats: ScanStats,
}

impl FlowLogScanner<BufReader<File>> {
    /// Open a flow log file for scanning.
    pub fn open(path: &Path, layout: FlowLogLayout) -> Result<Self> {
        let file = File::open(path).map_err(|source| FlowTagError::UnreadableSource {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Reading flow logs from {}", path.display());
        Ok(Self::new(BufReader::new(file), path, layout))
    }
}

impl<R: BufRead> FlowLogScanner<R> {
    /// Scan any buffered reader; `source` is used in error messages.
    pub fn new(reader: R, source: impl Into<PathBuf>, layout: FlowLogLayout) -> Self {
        Self {
            reader,
            source: source.into(),
            layout,
            line_number: 0,
            buffer: Vec::new(),
            stats: ScanStats::default(),
        }
    }

    /// Lines parsed and skipped so far.
    pub fn stats(&self) -> ScanStats {
        self.stats
    }

    /// Read the next raw line, returning `false` at end of input.
    ///
    /// Bytes are read undecoded so that a line with invalid UTF-8 is
    /// handled like any other malformed line.
    fn read_line(&mut self) -> Result<bool> {
        self.buffer.clear();
        let read = self
            .reader
            .read_until(b'\n', &mut self.buffer)
            .map_err(|source| FlowTagError::UnreadableSource {
                path: self.source.clone(),
                source,
            })?;
        if read > 0 {
            self.line_number += 1;
        }
        Ok(read > 0)
    }
}

impl<R: BufRead> Iterator for FlowLogScanner<R> {
    type Item = Result<FlowRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.read_line() {
                Ok(true) => {}
                Ok(false) => {
                    if self.stats.skipped > 0 {
                        warn!(
                            "Skipped {} malformed line(s) in {}",
                            self.stats.skipped,
                            self.source.display()
                        );
                    }
                    return None;
                }
                Err(e) => return Some(Err(e)),
            }

            let parsed = match std::str::from_utf8(&self.buffer) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    self.layout.parse_line(line)
                }
                Err(e) => Err(format!("invalid UTF-8: {}", e)),
            };

            match parsed {
                Ok(record) => {
                    self.stats.parsed += 1;
                    return Some(Ok(record));
                }
                Err(reason) if self.layout.strict => {
                    return Some(Err(FlowTagError::MalformedLine {
                        line: self.line_number,
                        reason,
                    }));
                }
                Err(reason) => {
                    debug!("Skipping line {}: {}", self.line_number, reason);
                    self.stats.skipped += 1;
                }
            }
        }
    }
}
