//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap. Path and
//! layout options are optional here so that values from the config file
//! are only overridden when given explicitly.

use crate::models::ReportFormat;
use clap::Parser;
use std::path::PathBuf;

/// FlowTagger - tag and count flow log records
///
/// Reads a flow log, maps each record's destination port and protocol to a
/// tag using a lookup table, and writes tag and port/protocol counts.
///
/// Examples:
///   flowtagger
///   flowtagger --logs flow_logs.txt --lookup lookup.csv --output output.txt
///   flowtagger --format json --output report.json
///   flowtagger --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Protocol number reference CSV (Decimal, Keyword columns)
    #[arg(long, value_name = "FILE")]
    pub protocols: Option<PathBuf>,

    /// Tag lookup CSV (dstport, protocol, tag columns)
    #[arg(short, long, value_name = "FILE")]
    pub lookup: Option<PathBuf>,

    /// Flow log file to process
    #[arg(short = 'i', long, value_name = "FILE")]
    pub logs: Option<PathBuf>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .flowtagger.toml in the current directory
    #[arg(short, long, value_name = "FILE", env = "FLOWTAGGER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Report format (text, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<ReportFormat>,

    /// 0-based index of the destination port field in a log line
    #[arg(long, value_name = "INDEX")]
    pub port_field: Option<usize>,

    /// 0-based index of the protocol number field in a log line
    #[arg(long, value_name = "INDEX")]
    pub protocol_field: Option<usize>,

    /// Require every log line to have exactly this many fields
    #[arg(long, value_name = "COUNT")]
    pub expected_fields: Option<usize>,

    /// Abort on the first malformed log line instead of skipping it
    #[arg(long)]
    pub strict: bool,

    /// Include tags with a zero count in the report
    #[arg(long)]
    pub include_zero: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .flowtagger.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let (Some(port), Some(protocol)) = (self.port_field, self.protocol_field) {
            if port == protocol {
                return Err("--port-field and --protocol-field must differ".to_string());
            }
        }

        if self.expected_fields == Some(0) {
            return Err("--expected-fields must be at least 1".to_string());
        }

        for path in [&self.protocols, &self.lookup, &self.logs].into_iter().flatten() {
            if !path.is_file() {
                return Err(format!("Input file does not exist: {}", path.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
