//! Tag and port/protocol aggregation.
//!
//! Both counters keep their keys in insertion order, which is the order
//! the report lists them in.

use super::classifier::UNTAGGED;
use crate::models::PortProtocol;
use crate::resolver::TagTable;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

/// Counter that remembers the order keys were first inserted.
#[derive(Debug, Clone)]
pub struct OrderedCounts<K> {
    entries: Vec<(K, u64)>,
    index: HashMap<K, usize>,
}

impl<K> Default for OrderedCounts<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<K: Clone + Eq + Hash> OrderedCounts<K> {
    /// Insert a key at zero if it is not present yet.
    pub fn seed(&mut self, key: K) {
        if !self.index.contains_key(&key) {
            self.index.insert(key.clone(), self.entries.len());
            self.entries.push((key, 0));
        }
    }

    /// Add one to a key's count, creating it at 1 if absent.
    pub fn increment<Q>(&mut self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
    {
        match self.index.get(key) {
            Some(&slot) => self.entries[slot].1 += 1,
            None => {
                let owned = key.to_owned();
                self.index.insert(owned.clone(), self.entries.len());
                self.entries.push((owned, 1));
            }
        }
    }

    /// Current count for a key (0 when never seen).
    #[allow(dead_code)] // Lookup utility; the report walks iter()
    pub fn get<Q>(&self, key: &Q) -> u64
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index
            .get(key)
            .map(|&slot| self.entries[slot].1)
            .unwrap_or(0)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, u64)> {
        self.entries.iter().map(|(key, count)| (key, *count))
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)] // Pairs with len()
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Count of records per tag, including [`UNTAGGED`].
pub type TagCounts = OrderedCounts<String>;

/// Count of records per observed (port, protocol name) pair.
pub type PortProtocolCounts = OrderedCounts<PortProtocol>;

/// Running totals for one pass over a flow log.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    tag_counts: TagCounts,
    port_protocol_counts: PortProtocolCounts,
}

impl Aggregator {
    /// Seed every tag of the table at zero, followed by `Untagged`.
    pub fn new(tags: &TagTable) -> Self {
        let mut tag_counts = TagCounts::default();
        for tag in tags.tags() {
            tag_counts.seed(tag.clone());
        }
        tag_counts.seed(UNTAGGED.to_string());

        Self {
            tag_counts,
            port_protocol_counts: PortProtocolCounts::default(),
        }
    }

    /// Count one classified record.
    pub fn record(&mut self, tag: &str, port: u16, protocol: &str) {
        self.tag_counts.increment(tag);
        self.port_protocol_counts
            .increment(&PortProtocol::new(port, protocol));
    }

    pub fn tag_counts(&self) -> &TagCounts {
        &self.tag_counts
    }

    pub fn port_protocol_counts(&self) -> &PortProtocolCounts {
        &self.port_protocol_counts
    }
}
