//! Query context elements and their ordering key

use serde::{Deserialize, Serialize};

/// One cached slot of opaque session metadata the server wants echoed back
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryContextElement {
    /// Database object id
    pub id: u64,

    /// Server time at which this context was read
    pub read_timestamp: u64,

    /// Eviction rank, 0 is the most important
    pub priority: u64,

    /// Opaque context bytes, already decoded
    pub context: Vec<u8>,
}

impl QueryContextElement {
    /// Create a new element
    pub fn new(id: u64, read_timestamp: u64, priority: u64, context: impl Into<Vec<u8>>) -> Self {
        Self {
            id,
            read_timestamp,
            priority,
            context: context.into(),
        }
    }

    pub(crate) fn key(&self) -> ElementKey {
        ElementKey {
            priority: self.priority,
            id: self.id,
            read_timestamp: self.read_timestamp,
        }
    }

    pub(crate) fn from_parts(key: ElementKey, context: Vec<u8>) -> Self {
        Self {
            id: key.id,
            read_timestamp: key.read_timestamp,
            priority: key.priority,
            context,
        }
    }
}

/// Position of an element in the cache's total order.
///
/// Field order matters: the derived `Ord` compares priority, then id, then
/// read timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct ElementKey {
    pub priority: u64,
    pub id: u64,
    pub read_timestamp: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_orders_by_priority_then_id_then_timestamp() {
        let mut keys = vec![
            QueryContextElement::new(1, 10, 5, "a").key(),
            QueryContextElement::new(9, 10, 1, "b").key(),
            QueryContextElement::new(2, 30, 1, "c").key(),
            QueryContextElement::new(2, 20, 1, "d").key(),
        ];
        keys.sort();

        let order: Vec<(u64, u64, u64)> = keys
            .iter()
            .map(|k| (k.priority, k.id, k.read_timestamp))
            .collect();
        assert_eq!(order, vec![(1, 2, 20), (1, 2, 30), (1, 9, 10), (5, 1, 10)]);
    }

    #[test]
    fn test_from_parts_restores_element() {
        let element = QueryContextElement::new(4, 100, 2, b"ctx".to_vec());
        let rebuilt = QueryContextElement::from_parts(element.key(), element.context.clone());
        assert_eq!(rebuilt, element);
    }
}
