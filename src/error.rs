//! Error types for flow tagging.
//!
//! Reference-table and I/O failures are fatal for the whole run; a
//! malformed log line only becomes an error in strict mode.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, scanning, or writing.
#[derive(Error, Debug)]
pub enum FlowTagError {
    /// A reference table row is missing a column or holds a bad number.
    #[error("Malformed reference data in {source_name} (line {line}): {reason}")]
    MalformedReferenceData {
        source_name: String,
        line: u64,
        reason: String,
    },

    /// An input or output file could not be opened.
    #[error("Cannot open {}: {source}", path.display())]
    UnreadableSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing the report failed partway.
    #[error("Failed to write report to {}: {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A flow log line could not be parsed (strict mode only).
    #[error("Malformed flow log line {line}: {reason}")]
    MalformedLine { line: u64, reason: String },

    /// The JSON report could not be serialized.
    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl FlowTagError {
    pub(crate) fn malformed(source_name: &str, line: u64, reason: impl Into<String>) -> Self {
        FlowTagError::MalformedReferenceData {
            source_name: source_name.to_string(),
            line,
            reason: reason.into(),
        }
    }
}

/// Result type alias for flow tagging operations.
pub type Result<T> = std::result::Result<T, FlowTagError>;
