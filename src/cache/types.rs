//! Core type definitions for the cache system

use crate::cache::element::QueryContextElement;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Counters describing what merge rounds have done to the cache
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Total number of `merge` calls
    pub merges: u64,

    /// Elements added for a previously unseen id
    pub inserts: u64,

    /// Elements replaced because their priority slot changed
    pub replacements: u64,

    /// Elements refreshed in place (same priority, new read)
    pub updates: u64,

    /// Elements removed by capacity enforcement
    pub evictions: u64,

    /// Completed priority syncs
    pub rounds: u64,

    /// Number of explicit clears
    pub clears: u64,

    /// Number of elements currently committed
    pub entries: usize,
}

impl CacheStats {
    /// Merges that changed nothing
    pub fn unchanged(&self) -> u64 {
        self.merges
            .saturating_sub(self.inserts + self.replacements + self.updates)
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CacheStats {{ merges: {}, inserts: {}, replacements: {}, updates: {}, evictions: {}, rounds: {}, entries: {} }}",
            self.merges,
            self.inserts,
            self.replacements,
            self.updates,
            self.evictions,
            self.rounds,
            self.entries
        )
    }
}

/// Committed elements split into parallel columns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementColumns {
    pub ids: Vec<u64>,
    pub read_timestamps: Vec<u64>,
    pub priorities: Vec<u64>,
    pub contexts: Vec<Vec<u8>>,
}

impl ElementColumns {
    /// Number of rows
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<QueryContextElement> for ElementColumns {
    fn from_iter<I: IntoIterator<Item = QueryContextElement>>(iter: I) -> Self {
        let mut columns = ElementColumns::default();
        for element in iter {
            columns.ids.push(element.id);
            columns.read_timestamps.push(element.read_timestamp);
            columns.priorities.push(element.priority);
            columns.contexts.push(element.context);
        }
        columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_stats_unchanged() {
        let stats = CacheStats {
            merges: 10,
            inserts: 4,
            replacements: 1,
            updates: 2,
            ..Default::default()
        };

        assert_eq!(stats.unchanged(), 3);
    }

    #[test]
    fn test_cache_stats_display() {
        let stats = CacheStats {
            merges: 7,
            evictions: 2,
            entries: 5,
            ..Default::default()
        };

        let display = format!("{}", stats);
        assert!(display.contains("merges: 7"));
        assert!(display.contains("evictions: 2"));
        assert!(display.contains("entries: 5"));
    }

    #[test]
    fn test_columns_from_elements() {
        let columns: ElementColumns = vec![
            QueryContextElement::new(1, 10, 0, "a"),
            QueryContextElement::new(2, 20, 1, "b"),
        ]
        .into_iter()
        .collect();

        assert_eq!(columns.len(), 2);
        assert_eq!(columns.ids, vec![1, 2]);
        assert_eq!(columns.read_timestamps, vec![10, 20]);
        assert_eq!(columns.priorities, vec![0, 1]);
        assert_eq!(columns.contexts, vec![b"a".to_vec(), b"b".to_vec()]);
    }
}
