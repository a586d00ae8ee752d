//! Main cache store implementation with priority-ordered eviction

use crate::cache::{
    config::QueryContextConfig,
    element::{ElementKey, QueryContextElement},
    types::{CacheStats, ElementColumns},
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Bounded, priority-ordered cache of query context elements for one session
///
/// The server reports its query context as a batch of elements on every
/// response. Each batch is applied as one merge round:
///
/// 1. [`merge`](Self::merge) once per element, in the order the server listed them
/// 2. [`sync_priority_map`](Self::sync_priority_map)
/// 3. [`check_cache_capacity`](Self::check_cache_capacity)
///
/// [`merge_round`](Self::merge_round) performs all three steps under a single
/// lock acquisition and is what the wire layer uses.
///
/// All state sits behind one mutex taken at the public-method boundary;
/// internal helpers work on the locked store, so no method ever re-locks.
#[derive(Debug)]
pub struct QueryContextCache {
    store: Mutex<CacheStore>,
}

/// Internal cache storage
#[derive(Debug)]
struct CacheStore {
    /// Maximum number of elements kept after a round
    capacity: usize,

    /// Committed elements in eviction order: key -> context bytes
    elements: BTreeMap<ElementKey, Vec<u8>>,

    /// id -> position of that id's element in `elements`
    id_index: HashMap<u64, ElementKey>,

    /// Committed priority slots: priority -> id
    priority_index: HashMap<u64, u64>,

    /// Priority slots reported during the current round
    pending_priorities: HashMap<u64, u64>,

    stats: CacheStats,
}

impl QueryContextCache {
    /// Create an empty cache holding at most `capacity` elements between rounds
    pub fn new(capacity: usize) -> Self {
        info!("Initializing query context cache with capacity {}", capacity);

        let store = CacheStore {
            capacity,
            elements: BTreeMap::new(),
            id_index: HashMap::new(),
            priority_index: HashMap::new(),
            pending_priorities: HashMap::new(),
            stats: CacheStats::default(),
        };

        Self {
            store: Mutex::new(store),
        }
    }

    /// Create a cache sized by the session configuration
    pub fn from_config(config: &QueryContextConfig) -> Self {
        Self::new(config.capacity)
    }

    /// Merge one element received from the server
    ///
    /// For a known id the read timestamp decides between refresh and no-op,
    /// and a priority change moves the element to its new slot. An unknown id
    /// is added; if its priority slot was committed to another id that still
    /// occupies it, that element is replaced.
    pub fn merge(&self, id: u64, read_timestamp: u64, priority: u64, context: impl Into<Vec<u8>>) {
        let element = QueryContextElement::new(id, read_timestamp, priority, context);
        self.lock().merge(element);
    }

    /// Commit the priority slots reported during the current round
    ///
    /// Slots not reported this round are dropped from the priority index.
    pub fn sync_priority_map(&self) {
        self.lock().sync_priority_map();
    }

    /// Evict the least important elements until the cache fits its capacity
    pub fn check_cache_capacity(&self) {
        self.lock().check_cache_capacity();
    }

    /// Apply a full merge round atomically
    pub fn merge_round<I>(&self, elements: I)
    where
        I: IntoIterator<Item = QueryContextElement>,
    {
        let mut store = self.lock();
        for element in elements {
            store.merge(element);
        }
        store.sync_priority_map();
        store.check_cache_capacity();
        store.log_cache_entries();
    }

    /// Remove every element and reset all indexes
    pub fn clear_cache(&self) {
        let mut store = self.lock();
        let count = store.elements.len();
        store.clear();
        info!("Cleared {} query context elements", count);
    }

    /// Change the capacity; enforced at the next capacity check
    pub fn set_capacity(&self, capacity: usize) {
        let mut store = self.lock();
        if store.capacity != capacity {
            info!(
                "Query context cache capacity changed from {} to {}",
                store.capacity, capacity
            );
            store.capacity = capacity;
        }
    }

    /// Current capacity bound
    pub fn capacity(&self) -> usize {
        self.lock().capacity
    }

    /// Number of committed elements
    pub fn size(&self) -> usize {
        self.lock().elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().elements.is_empty()
    }

    /// Look up the committed element for an id
    pub fn get(&self, id: u64) -> Option<QueryContextElement> {
        let store = self.lock();
        let key = store.id_index.get(&id)?;
        store
            .elements
            .get(key)
            .map(|context| QueryContextElement::from_parts(*key, context.clone()))
    }

    /// Snapshot of the committed elements in eviction order
    pub fn elements(&self) -> Vec<QueryContextElement> {
        self.lock().snapshot()
    }

    /// Committed elements as parallel columns, in eviction order
    pub fn get_elements(&self) -> ElementColumns {
        self.lock().snapshot().into_iter().collect()
    }

    /// Cache counters
    pub fn stats(&self) -> CacheStats {
        let store = self.lock();
        CacheStats {
            entries: store.elements.len(),
            ..store.stats.clone()
        }
    }

    /// Log every committed element at debug level
    pub fn log_cache_entries(&self) {
        self.lock().log_cache_entries();
    }

    fn lock(&self) -> MutexGuard<'_, CacheStore> {
        // Helpers never leave the store half-updated; a poisoned guard is usable.
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CacheStore {
    fn merge(&mut self, element: QueryContextElement) {
        self.stats.merges += 1;
        let (id, priority) = (element.id, element.priority);

        match self.id_index.get(&id).copied() {
            Some(stored) if stored.read_timestamp != element.read_timestamp => {
                if stored.priority == priority {
                    debug!("Refreshing query context in place: id {}", id);
                    self.update(stored, element.read_timestamp, element.context);
                } else {
                    debug!(
                        "Query context id {} moved from priority {} to {}",
                        id, stored.priority, priority
                    );
                    self.replace(stored, element);
                }
            }
            Some(stored) if stored.priority != priority => {
                // Same read reported at another slot: only the position changes.
                debug!(
                    "Query context id {} re-ranked from priority {} to {}",
                    id, stored.priority, priority
                );
                let context = self.elements.get(&stored).cloned().unwrap_or_default();
                self.replace(stored, QueryContextElement { context, ..element });
            }
            Some(_) => {
                debug!("Query context id {} unchanged", id);
            }
            None => {
                let holder = self
                    .priority_index
                    .get(&priority)
                    .and_then(|held| self.id_index.get(held))
                    .copied()
                    .filter(|key| key.priority == priority);

                match holder {
                    Some(old) => {
                        debug!(
                            "Query context id {} takes priority {} from id {}",
                            id, priority, old.id
                        );
                        self.replace(old, element);
                    }
                    None => {
                        debug!("Adding query context id {} at priority {}", id, priority);
                        self.add(element);
                        self.stats.inserts += 1;
                    }
                }
            }
        }

        self.pending_priorities.insert(priority, id);
    }

    fn add(&mut self, element: QueryContextElement) {
        let key = element.key();
        self.id_index.insert(key.id, key);
        self.elements.insert(key, element.context);
    }

    /// Remove the element stored under exactly `key`
    fn remove(&mut self, key: ElementKey) -> Option<Vec<u8>> {
        let context = self.elements.remove(&key)?;

        if self.id_index.get(&key.id) == Some(&key) {
            self.id_index.remove(&key.id);
        }
        if self.priority_index.get(&key.priority) == Some(&key.id) {
            self.priority_index.remove(&key.priority);
        }
        if self.pending_priorities.get(&key.priority) == Some(&key.id) {
            self.pending_priorities.remove(&key.priority);
        }

        Some(context)
    }

    /// New read at an unchanged priority; priority indexes stay untouched
    fn update(&mut self, stored: ElementKey, read_timestamp: u64, context: Vec<u8>) {
        self.elements.remove(&stored);
        let key = ElementKey {
            read_timestamp,
            ..stored
        };
        self.elements.insert(key, context);
        self.id_index.insert(key.id, key);
        self.stats.updates += 1;
    }

    fn replace(&mut self, old: ElementKey, new: QueryContextElement) {
        self.remove(old);
        self.add(new);
        self.stats.replacements += 1;
    }

    fn sync_priority_map(&mut self) {
        let dropped = self
            .priority_index
            .iter()
            .filter(|&(priority, id)| self.pending_priorities.get(priority) != Some(id))
            .count();

        debug!(
            "syncPriorityMap: {} committed slots, {} reported this round, {} dropped",
            self.priority_index.len(),
            self.pending_priorities.len(),
            dropped
        );

        self.priority_index = std::mem::take(&mut self.pending_priorities);
        self.stats.rounds += 1;
    }

    fn check_cache_capacity(&mut self) {
        debug!(
            "checkCacheCapacity: {} elements, capacity {}",
            self.elements.len(),
            self.capacity
        );

        while self.elements.len() > self.capacity {
            let Some(key) = self.elements.keys().next_back().copied() else {
                break;
            };
            debug!(
                "Evicting query context id {} (priority {})",
                key.id, key.priority
            );
            self.remove(key);
            self.stats.evictions += 1;
        }
    }

    fn clear(&mut self) {
        self.elements.clear();
        self.id_index.clear();
        self.priority_index.clear();
        self.pending_priorities.clear();
        self.stats.clears += 1;
    }

    fn snapshot(&self) -> Vec<QueryContextElement> {
        self.elements
            .iter()
            .map(|(key, context)| QueryContextElement::from_parts(*key, context.clone()))
            .collect()
    }

    fn log_cache_entries(&self) {
        for key in self.elements.keys() {
            debug!(
                "Cache entry: id: {} readTimestamp: {} priority: {}",
                key.id, key.read_timestamp, key.priority
            );
        }
    }
}
