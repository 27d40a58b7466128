//! Classification and aggregation of flow records.

pub mod aggregator;
pub mod classifier;

pub use aggregator::{Aggregator, PortProtocolCounts, TagCounts};
pub use classifier::{FlowClassifier, UNTAGGED};

use crate::error::Result;
use crate::models::{FlowRecord, ScanStats};
use crate::resolver::TagTable;
use crate::scanner::FlowLogScanner;
use std::io::BufRead;
use tracing::info;

/// Result of one pass over a flow log.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub aggregator: Aggregator,
    pub stats: ScanStats,
}

impl RunSummary {
    pub fn tag_counts(&self) -> &TagCounts {
        self.aggregator.tag_counts()
    }

    pub fn port_protocol_counts(&self) -> &PortProtocolCounts {
        self.aggregator.port_protocol_counts()
    }
}

/// Classify every record the scanner yields and count the results.
///
/// Any scanner error (unreadable input, or a malformed line in strict
/// mode) aborts the run.
pub fn run_pipeline<R: BufRead>(
    classifier: &FlowClassifier<'_>,
    tags: &TagTable,
    scanner: &mut FlowLogScanner<R>,
) -> Result<RunSummary> {
    let mut aggregator = Aggregator::new(tags);

    for record in scanner.by_ref() {
        let record: FlowRecord = record?;
        let tag = classifier.classify(&record);
        let protocol = classifier.protocol_name(&record);
        aggregator.record(tag, record.destination_port, protocol);
    }

    let stats = scanner.stats();
    info!(
        "Processed {} flow records ({} skipped)",
        stats.parsed, stats.skipped
    );

    Ok(RunSummary { aggregator, stats })
}
