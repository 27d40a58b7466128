//! Flow record classification.

use crate::models::FlowRecord;
use crate::resolver::{ProtocolTable, TagTable};

/// Tag given to records with no lookup entry.
pub const UNTAGGED: &str = "Untagged";

/// Maps flow records to tags using the two reference tables.
#[derive(Debug, Clone, Copy)]
pub struct FlowClassifier<'a> {
    protocols: &'a ProtocolTable,
    tags: &'a TagTable,
}

impl<'a> FlowClassifier<'a> {
    pub fn new(protocols: &'a ProtocolTable, tags: &'a TagTable) -> Self {
        Self { protocols, tags }
    }

    /// Lowercase protocol name of a record, possibly `"unknown"`.
    pub fn protocol_name(&self, record: &FlowRecord) -> &'a str {
        self.protocols.resolve(record.protocol_number)
    }

    /// Resolve the protocol name, then look up the (port, name) pair.
    /// Returns [`UNTAGGED`] when there is no entry.
    pub fn classify(&self, record: &FlowRecord) -> &'a str {
        self.tags
            .lookup(record.destination_port, self.protocol_name(record))
            .unwrap_or(UNTAGGED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> (ProtocolTable, TagTable) {
        let protocols = ProtocolTable::from_reader(
            "Decimal,Keyword\n6,TCP\n17,UDP\n146-252,\n".as_bytes(),
            "protocols.csv",
        )
        .unwrap();
        let tags = TagTable::from_reader(
            "dstport,protocol,tag\n443,tcp,web\n53,udp,dns\n".as_bytes(),
            "lookup.csv",
        )
        .unwrap();
        (protocols, tags)
    }

    #[test]
    fn test_classify_matches() {
        let (protocols, tags) = tables();
        let classifier = FlowClassifier::new(&protocols, &tags);

        assert_eq!(classifier.classify(&FlowRecord::new(443, 6)), "web");
        assert_eq!(classifier.classify(&FlowRecord::new(53, 17)), "dns");
    }

    #[test]
    fn test_classify_untagged() {
        let (protocols, tags) = tables();
        let classifier = FlowClassifier::new(&protocols, &tags);

        // Port known, protocol differs
        assert_eq!(classifier.classify(&FlowRecord::new(443, 17)), UNTAGGED);
        assert_eq!(classifier.classify(&FlowRecord::new(9999, 6)), UNTAGGED);
    }

    #[test]
    fn test_reserved_protocol_is_untagged() {
        let (protocols, tags) = tables();
        let classifier = FlowClassifier::new(&protocols, &tags);

        let record = FlowRecord::new(443, 200);
        assert_eq!(classifier.protocol_name(&record), "reserved");
        assert_eq!(classifier.classify(&record), UNTAGGED);
    }

    #[test]
    fn test_unknown_protocol_name() {
        let (protocols, tags) = tables();
        let classifier = FlowClassifier::new(&protocols, &tags);

        let record = FlowRecord::new(53, 99);
        assert_eq!(classifier.protocol_name(&record), "unknown");
        assert_eq!(classifier.classify(&record), UNTAGGED);
    }
}
