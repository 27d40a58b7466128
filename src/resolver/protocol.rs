//! Protocol number to protocol name resolution.
//!
//! Loaded from an IANA-style `protocol-numbers.csv` with `Decimal` and
//! `Keyword` columns. Names are stored lowercase.

use super::{column_indices, csv_error, csv_reader, field, line_of, open_source};
use crate::error::{FlowTagError, Result};
use std::collections::HashMap;
use std::io::Read;
use std::ops::RangeInclusive;
use std::path::Path;
use tracing::{debug, info, warn};

/// Range token in the `Decimal` column that expands to a block of numbers.
pub const RESERVED_RANGE_TOKEN: &str = "146-252";

/// Numbers covered by the range token.
pub const RESERVED_RANGE: RangeInclusive<u8> = 146..=252;

/// Name given to every number in the reserved range.
pub const RESERVED_NAME: &str = "reserved";

/// Name returned for numbers missing from the table.
pub const UNKNOWN_PROTOCOL: &str = "unknown";

const DECIMAL_COLUMN: &str = "Decimal";
const KEYWORD_COLUMN: &str = "Keyword";

/// Immutable protocol number → lowercase name table.
#[derive(Debug, Clone, Default)]
pub struct ProtocolTable {
    names: HashMap<u8, String>,
}

impl ProtocolTable {
    /// Load the table from a CSV file.
    pub fn load(path: &Path) -> Result<Self> {
        let file = open_source(path)?;
        let table = Self::from_reader(file, &path.display().to_string())?;
        info!(
            "Loaded {} protocol numbers from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    /// Load the table from any CSV byte source.
    pub fn from_reader<R: Read>(reader: R, source_name: &str) -> Result<Self> {
        let mut rdr = csv_reader(reader);
        let headers = rdr.headers().map_err(|e| csv_error(e, source_name))?.clone();
        let [decimal_idx, keyword_idx] =
            column_indices(&headers, [DECIMAL_COLUMN, KEYWORD_COLUMN], source_name)?;

        let mut names = HashMap::new();

        for result in rdr.records() {
            let record = result.map_err(|e| csv_error(e, source_name))?;
            let decimal = field(&record, decimal_idx, DECIMAL_COLUMN, source_name)?.trim();
            let keyword = field(&record, keyword_idx, KEYWORD_COLUMN, source_name)?.trim();

            if decimal == RESERVED_RANGE_TOKEN {
                for number in RESERVED_RANGE {
                    names.insert(number, RESERVED_NAME.to_string());
                }
                continue;
            }

            let number: u8 = decimal.parse().map_err(|_| {
                FlowTagError::malformed(
                    source_name,
                    line_of(&record),
                    format!("'{}' is not a protocol number (0-255)", decimal),
                )
            })?;

            // Unassigned rows carry no keyword and stay unresolved.
            if keyword.is_empty() {
                debug!("Protocol {} has no keyword, leaving it unknown", number);
                continue;
            }

            if let Some(previous) = names.insert(number, keyword.to_lowercase()) {
                warn!(
                    "Protocol {} listed twice in {} ('{}' replaced)",
                    number, source_name, previous
                );
            }
        }

        Ok(Self { names })
    }

    /// Resolve a protocol number to its lowercase name, or `"unknown"`.
    pub fn resolve(&self, number: u8) -> &str {
        self.names
            .get(&number)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_PROTOCOL)
    }

    /// Number of protocol numbers with a known name.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[allow(dead_code)] // Pairs with len()
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Decimal,Keyword,Protocol,IPv6 Extension Header,Reference
1,ICMP,Internet Control Message,,[RFC792]
6,TCP,Transmission Control,,[RFC9293]
17,UDP,User Datagram,,[RFC768]
61,,any host internal protocol,,[Internet_Assigned_Numbers_Authority]
146-252,,Unassigned,,[Internet_Assigned_Numbers_Authority]
";

    fn load(content: &str) -> Result<ProtocolTable> {
        ProtocolTable::from_reader(content.as_bytes(), "protocols.csv")
    }

    #[test]
    fn test_resolve_lowercases_keywords() {
        let table = load(SAMPLE).unwrap();
        assert_eq!(table.resolve(6), "tcp");
        assert_eq!(table.resolve(17), "udp");
        assert_eq!(table.resolve(1), "icmp");
    }

    #[test]
    fn test_reserved_range_expands() {
        let table = load(SAMPLE).unwrap();
        for number in RESERVED_RANGE {
            assert_eq!(table.resolve(number), "reserved");
        }
        assert_eq!(table.resolve(145), "unknown");
        assert_eq!(table.resolve(253), "unknown");
    }

    #[test]
    fn test_unknown_numbers() {
        let table = load(SAMPLE).unwrap();
        assert_eq!(table.resolve(2), "unknown");
        assert_eq!(table.resolve(255), "unknown");
        // Rows without a keyword are not entered.
        assert_eq!(table.resolve(61), "unknown");
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let err = load("Decimal,Protocol\n6,Transmission Control\n").unwrap_err();
        match err {
            FlowTagError::MalformedReferenceData { reason, .. } => {
                assert!(reason.contains("Keyword"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_non_numeric_decimal_is_fatal() {
        let err = load("Decimal,Keyword\nsix,TCP\n").unwrap_err();
        assert!(matches!(
            err,
            FlowTagError::MalformedReferenceData { line: 2, .. }
        ));
    }

    #[test]
    fn test_other_ranges_are_rejected() {
        assert!(load("Decimal,Keyword\n10-20,FOO\n").is_err());
        assert!(load("Decimal,Keyword\n256,FOO\n").is_err());
    }

    #[test]
    fn test_short_row_is_fatal() {
        assert!(load("Decimal,Keyword\n6\n").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = ProtocolTable::load(Path::new("/nonexistent/protocols.csv")).unwrap_err();
        assert!(matches!(err, FlowTagError::UnreadableSource { .. }));
    }
}
