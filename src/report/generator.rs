//! Report generation.
//!
//! The text report has two sections, tag counts and port/protocol
//! counts, listed in counter insertion order. The JSON report carries the
//! same data plus the scanner's line statistics.

use crate::analysis::{PortProtocolCounts, RunSummary, TagCounts};
use crate::error::{FlowTagError, Result};
use crate::models::ReportFormat;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Generate the plain text report.
pub fn generate_text_report(summary: &RunSummary, include_zero: bool) -> String {
    let mut output = String::new();

    output.push_str(&generate_tag_section(summary.tag_counts(), include_zero));
    output.push('\n');
    output.push_str(&generate_port_protocol_section(
        summary.port_protocol_counts(),
    ));

    output
}

/// Generate the tag count section.
fn generate_tag_section(tag_counts: &TagCounts, include_zero: bool) -> String {
    let mut section = String::new();

    section.push_str("Tag Counts:\n\n");
    for (tag, count) in tag_counts.iter() {
        if count > 0 || include_zero {
            section.push_str(&format!("{},{}\n", tag, count));
        }
    }

    section
}

/// Generate the port/protocol section.
fn generate_port_protocol_section(counts: &PortProtocolCounts) -> String {
    let mut section = String::new();

    section.push_str("Port/Protocol Combination Counts:\n\n");
    for (key, count) in counts.iter() {
        section.push_str(&format!("{},{},{}\n", key.port, key.protocol, count));
    }

    section
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    tag_counts: Vec<TagEntry<'a>>,
    port_protocol_counts: Vec<PortProtocolEntry<'a>>,
    lines_parsed: u64,
    lines_skipped: u64,
}

#[derive(Debug, Serialize)]
struct TagEntry<'a> {
    tag: &'a str,
    count: u64,
}

#[derive(Debug, Serialize)]
struct PortProtocolEntry<'a> {
    port: u16,
    protocol: &'a str,
    count: u64,
}

/// Generate a JSON report.
pub fn generate_json_report(summary: &RunSummary, include_zero: bool) -> Result<String> {
    let report = JsonReport {
        tag_counts: summary
            .tag_counts()
            .iter()
            .filter(|(_, count)| *count > 0 || include_zero)
            .map(|(tag, count)| TagEntry {
                tag: tag.as_str(),
                count,
            })
            .collect(),
        port_protocol_counts: summary
            .port_protocol_counts()
            .iter()
            .map(|(key, count)| PortProtocolEntry {
                port: key.port,
                protocol: key.protocol.as_str(),
                count,
            })
            .collect(),
        lines_parsed: summary.stats.parsed,
        lines_skipped: summary.stats.skipped,
    };

    let mut json = serde_json::to_string_pretty(&report)?;
    json.push('\n');
    Ok(json)
}

/// Render the report in the requested format.
pub fn render_report(
    summary: &RunSummary,
    format: ReportFormat,
    include_zero: bool,
) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(summary, include_zero)),
        ReportFormat::Json => generate_json_report(summary, include_zero),
    }
}

/// Write rendered report content to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|source| FlowTagError::UnreadableSource {
        path: path.to_path_buf(),
        source,
    })?;

    let mut writer = BufWriter::new(file);
    writer
        .write_all(content.as_bytes())
        .and_then(|_| writer.flush())
        .map_err(|source| FlowTagError::WriteFailure {
            path: path.to_path_buf(),
            source,
        })?;

    info!("Report written to {}", path.display());
    Ok(())
}
