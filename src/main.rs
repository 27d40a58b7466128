//! FlowTagger - flow log tagging and counting
//!
//! A CLI tool that reads a flow log, tags each record by destination port
//! and protocol using a lookup table, and writes tag counts and
//! port/protocol combination counts.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (unreadable input, malformed reference data, write failure)

mod analysis;
mod cli;
mod config;
mod error;
mod models;
mod report;
mod resolver;
mod scanner;

use analysis::{FlowClassifier, RunSummary};
use anyhow::{Context, Result};
use cli::Args;
use config::{Config, DEFAULT_CONFIG_FILE};
use resolver::{ProtocolTable, TagTable};
use scanner::{FlowLogLayout, FlowLogScanner};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        if let Err(e) = handle_init_config() {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
        return;
    }

    init_logging(&args);

    info!("FlowTagger v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(&args) {
        error!("Run failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Handle --init-config: generate a default .flowtagger.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        anyhow::bail!(
            "{} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// `RUST_LOG` takes precedence over `--verbose`/`--quiet` when set.
fn init_logging(args: &Args) {
    let level = args.log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load configuration, process the flow log, and print a summary.
fn run(args: &Args) -> Result<()> {
    let start_time = Instant::now();

    let mut config = load_config(args, Path::new(DEFAULT_CONFIG_FILE))?;
    config.merge_with_args(args);
    config.validate()?;

    let summary = process(&config)?;

    if !args.quiet {
        let stats = summary.stats;
        println!("📊 Flow log summary:");
        println!("   Records processed: {}", stats.parsed);
        if stats.skipped > 0 {
            println!("   Malformed lines skipped: {}", stats.skipped);
        }
        println!(
            "   Distinct port/protocol pairs: {}",
            summary.port_protocol_counts().len()
        );
        println!("   Duration: {:.2}s", start_time.elapsed().as_secs_f64());
        println!(
            "\n✅ Report saved to: {}",
            config.paths.output.display()
        );
    }

    Ok(())
}

/// Load both reference tables, classify the flow log, and write the report.
fn process(config: &Config) -> Result<RunSummary> {
    let paths = &config.paths;

    let protocols = ProtocolTable::load(&paths.protocols)
        .context("Failed to load protocol reference table")?;
    let tags = TagTable::load(&paths.lookup).context("Failed to load tag lookup table")?;

    let layout = FlowLogLayout::from(&config.flow_log);
    debug!("Flow log layout: {:?}", layout);

    let classifier = FlowClassifier::new(&protocols, &tags);
    let mut scanner = FlowLogScanner::open(&paths.logs, layout)?;
    let summary = analysis::run_pipeline(&classifier, &tags, &mut scanner)
        .with_context(|| format!("Failed to process {}", paths.logs.display()))?;

    let content = report::render_report(
        &summary,
        config.report.format,
        config.report.include_zero_counts,
    )?;
    report::write_report(&content, &paths.output)?;

    Ok(summary)
}

/// Load configuration from file or use defaults.
///
/// A config file that exists but cannot be parsed is fatal, since it may
/// name the input and output paths.
fn load_config(args: &Args, default_path: &Path) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_if_exists(default_path)? {
        Some(config) => {
            info!("Loaded default config from {}", default_path.display());
            Ok(config)
        }
        None => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReportFormat;
    use clap::Parser;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const PROTOCOLS: &str = "\
Decimal,Keyword,Protocol,IPv6 Extension Header,Reference
6,TCP,Transmission Control,,[RFC9293]
17,UDP,User Datagram,,[RFC768]
146-252,,Unassigned,,[Internet_Assigned_Numbers_Authority]
";

    const LOOKUP: &str = "\
dstport,protocol,tag
443,tcp,web
53,udp,dns
";

    fn flow_line(port: u16, protocol: u8) -> String {
        format!(
            "2 123456789012 eni-0a1b2c3d 10.0.1.201 198.51.100.2 {} 49153 {} 25 20000 1620140761 1620140821 ACCEPT OK vpc-1 subnet-1 i-1 0\n",
            port, protocol
        )
    }

    fn setup(logs: &str) -> (TempDir, Config) {
        let dir = tempfile::tempdir().unwrap();
        let write = |name: &str, content: &str| -> PathBuf {
            let path = dir.path().join(name);
            std::fs::write(&path, content).unwrap();
            path
        };

        let mut config = Config::default();
        config.paths.protocols = write("protocol-numbers.csv", PROTOCOLS);
        config.paths.lookup = write("lookup.csv", LOOKUP);
        config.paths.logs = write("flow_logs.txt", logs);
        config.paths.output = dir.path().join("output.txt");

        (dir, config)
    }

    #[test]
    fn test_process_writes_expected_report() {
        let logs = [
            flow_line(443, 6),
            flow_line(443, 6),
            flow_line(443, 6),
            flow_line(53, 17),
            flow_line(9999, 6),
        ]
        .concat();
        let (_dir, config) = setup(&logs);

        process(&config).unwrap();

        let report = std::fs::read_to_string(&config.paths.output).unwrap();
        assert_eq!(
            report,
            "Tag Counts:\n\nweb,3\ndns,1\nUntagged,1\n\n\
             Port/Protocol Combination Counts:\n\n443,tcp,3\n53,udp,1\n9999,tcp,1\n"
        );
    }

    #[test]
    fn test_process_is_idempotent() {
        let logs = [flow_line(53, 17), "bad line\n".to_string(), flow_line(8, 200)].concat();
        let (_dir, config) = setup(&logs);

        process(&config).unwrap();
        let first = std::fs::read(&config.paths.output).unwrap();
        process(&config).unwrap();
        let second = std::fs::read(&config.paths.output).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_process_json_report() {
        let (_dir, mut config) = setup(&flow_line(443, 6));
        config.report.format = ReportFormat::Json;

        let summary = process(&config).unwrap();
        assert_eq!(summary.stats.parsed, 1);

        let json = std::fs::read_to_string(&config.paths.output).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["tag_counts"][0]["tag"], "web");
    }

    #[test]
    fn test_process_malformed_lookup_is_fatal() {
        let (_dir, config) = setup(&flow_line(443, 6));
        std::fs::write(&config.paths.lookup, "dstport,protocol,tag\nhttps,tcp,web\n").unwrap();

        assert!(process(&config).is_err());
        assert!(!config.paths.output.exists());
    }

    #[test]
    fn test_load_config_invalid_default_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "[paths]\noutput = \"keep/report.txt\"\nlookup = 5\n").unwrap();

        let args = Args::parse_from(["flowtagger"]);
        assert!(load_config(&args, &path).is_err());
    }

    #[test]
    fn test_load_config_reads_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "[paths]\noutput = \"keep/report.txt\"\n").unwrap();

        let args = Args::parse_from(["flowtagger"]);
        let config = load_config(&args, &path).unwrap();
        assert_eq!(config.paths.output, PathBuf::from("keep/report.txt"));
    }

    #[test]
    fn test_load_config_missing_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let args = Args::parse_from(["flowtagger"]);

        let config = load_config(&args, &dir.path().join(DEFAULT_CONFIG_FILE)).unwrap();
        assert_eq!(config.paths.output, PathBuf::from("output.txt"));
    }

    #[test]
    fn test_process_missing_log_is_fatal() {
        let (_dir, mut config) = setup("");
        config.paths.logs = PathBuf::from("/nonexistent/flow_logs.txt");

        assert!(process(&config).is_err());
    }
}
