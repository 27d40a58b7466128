//! Data models for flow tagging.
//!
//! This module contains the flow log layout, the parsed flow record, and
//! the small value types shared between the scanner, the aggregator and
//! the report writer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Field names of the 18-field flow log layout, in positional order.
pub const FLOW_LOG_FIELDS: [&str; 18] = [
    "version",
    "account-id",
    "interface-id",
    "srcaddr",
    "dstaddr",
    "srcport",
    "dstport",
    "protocol",
    "packets",
    "bytes",
    "start",
    "end",
    "action",
    "log-status",
    "vpc-id",
    "subnet-id",
    "instance-id",
    "tcp-flags",
];

/// Name of a positional field, or `"?"` past the end of the layout.
pub fn field_name(index: usize) -> &'static str {
    FLOW_LOG_FIELDS.get(index).copied().unwrap_or("?")
}

/// The parts of one flow log line the classifier consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlowRecord {
    /// Destination port the record is classified by.
    pub destination_port: u16,
    /// IANA protocol number.
    pub protocol_number: u8,
}

impl FlowRecord {
    pub fn new(destination_port: u16, protocol_number: u8) -> Self {
        Self {
            destination_port,
            protocol_number,
        }
    }
}

/// Key of the port/protocol counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortProtocol {
    pub port: u16,
    pub protocol: String,
}

impl PortProtocol {
    pub fn new(port: u16, protocol: impl Into<String>) -> Self {
        Self {
            port,
            protocol: protocol.into(),
        }
    }
}

impl fmt::Display for PortProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.port, self.protocol)
    }
}

/// Counts of log lines read by the scanner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    /// Lines parsed into a flow record.
    pub parsed: u64,
    /// Non-empty lines that could not be parsed.
    pub skipped: u64,
}

/// Report output format.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Plain text sections (default)
    #[default]
    Text,
    /// JSON document
    Json,
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFormat::Text => write!(f, "text"),
            ReportFormat::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names() {
        assert_eq!(field_name(6), "dstport");
        assert_eq!(field_name(7), "protocol");
        assert_eq!(field_name(17), "tcp-flags");
        assert_eq!(field_name(18), "?");
    }

    #[test]
    fn test_port_protocol_display() {
        assert_eq!(PortProtocol::new(443, "tcp").to_string(), "443,tcp");
    }

    #[test]
    fn test_report_format_serde() {
        #[derive(Deserialize)]
        struct Wrapper {
            format: ReportFormat,
        }
        let parsed: Wrapper = toml::from_str("format = \"json\"").unwrap();
        assert_eq!(parsed.format, ReportFormat::Json);
        assert_eq!(ReportFormat::default().to_string(), "text");
    }
}
