//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.flowtagger.toml` files.

use crate::models::ReportFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".flowtagger.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Input and output locations.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Flow log layout settings.
    #[serde(default)]
    pub flow_log: FlowLogConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Locations of the three inputs and the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Protocol number reference CSV.
    #[serde(default = "default_protocols")]
    pub protocols: PathBuf,

    /// Tag lookup CSV.
    #[serde(default = "default_lookup")]
    pub lookup: PathBuf,

    /// Flow log input.
    #[serde(default = "default_logs")]
    pub logs: PathBuf,

    /// Report destination.
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            protocols: default_protocols(),
            lookup: default_lookup(),
            logs: default_logs(),
            output: default_output(),
        }
    }
}

fn default_protocols() -> PathBuf {
    PathBuf::from("protocol-numbers.csv")
}

fn default_lookup() -> PathBuf {
    PathBuf::from("lookup.csv")
}

fn default_logs() -> PathBuf {
    PathBuf::from("flow_logs.txt")
}

fn default_output() -> PathBuf {
    PathBuf::from("output.txt")
}

/// Flow log layout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowLogConfig {
    /// 0-based field index holding the destination port.
    #[serde(default = "default_port_field")]
    pub port_field: usize,

    /// 0-based field index holding the protocol number.
    #[serde(default = "default_protocol_field")]
    pub protocol_field: usize,

    /// Exact field count a line must have (unset: any count that
    /// reaches both fields).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_fields: Option<usize>,

    /// Abort on the first malformed line.
    #[serde(default)]
    pub strict: bool,
}

impl Default for FlowLogConfig {
    fn default() -> Self {
        Self {
            port_field: default_port_field(),
            protocol_field: default_protocol_field(),
            expected_fields: None,
            strict: false,
        }
    }
}

fn default_port_field() -> usize {
    5
}

fn default_protocol_field() -> usize {
    7
}

/// Report generation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format.
    #[serde(default)]
    pub format: ReportFormat,

    /// List tags that never matched with a count of 0.
    #[serde(default)]
    pub include_zero_counts: bool,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from a path that may not exist.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_if_exists(path: &Path) -> Result<Option<Self>> {
        if path.exists() {
            Ok(Some(Self::load(path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref path) = args.protocols {
            self.paths.protocols = path.clone();
        }
        if let Some(ref path) = args.lookup {
            self.paths.lookup = path.clone();
        }
        if let Some(ref path) = args.logs {
            self.paths.logs = path.clone();
        }
        if let Some(ref path) = args.output {
            self.paths.output = path.clone();
        }

        if let Some(index) = args.port_field {
            self.flow_log.port_field = index;
        }
        if let Some(index) = args.protocol_field {
            self.flow_log.protocol_field = index;
        }
        if let Some(count) = args.expected_fields {
            self.flow_log.expected_fields = Some(count);
        }

        if let Some(format) = args.format {
            self.report.format = format;
        }

        // Flags only ever switch behavior on
        if args.strict {
            self.flow_log.strict = true;
        }
        if args.include_zero {
            self.report.include_zero_counts = true;
        }
    }

    /// Check settings that cannot be expressed in the types.
    pub fn validate(&self) -> Result<()> {
        if self.flow_log.port_field == self.flow_log.protocol_field {
            anyhow::bail!(
                "Port and protocol fields must differ (both are {})",
                self.flow_log.port_field
            );
        }

        if let Some(expected) = self.flow_log.expected_fields {
            let needed = self.flow_log.port_field.max(self.flow_log.protocol_field) + 1;
            if expected < needed {
                anyhow::bail!(
                    "expected_fields = {} cannot reach field index {}",
                    expected,
                    needed - 1
                );
            }
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
