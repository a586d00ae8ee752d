//! Session-side ownership of the query context cache
//!
//! A session owns at most one cache for its whole lifetime. It attaches the
//! committed query context to outgoing requests and feeds the query context of
//! every response back into the cache.

use crate::cache::{QueryContextCache, QueryContextConfig};
use crate::error::Result;
use crate::wire::{QueryContextDto, REQUEST_KEY, RESPONSE_KEY};
use serde_json::{Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

/// A database session carrying its own query context cache
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    config: QueryContextConfig,
    cache: Option<QueryContextCache>,
}

impl Session {
    /// Create a session, building its cache unless the configuration disables it
    pub fn new(config: QueryContextConfig) -> Self {
        let mut session = Self {
            id: Uuid::new_v4(),
            config,
            cache: None,
        };
        let capacity = session.config.capacity;
        session.initialize_query_context_cache(capacity);
        session
    }

    /// Create a session configured from the environment
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(QueryContextConfig::from_env()?))
    }

    /// Session identifier
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &QueryContextConfig {
        &self.config
    }

    /// Borrow the cache, if the session has one
    pub fn query_context_cache(&self) -> Option<&QueryContextCache> {
        self.cache.as_ref()
    }

    /// Create a fresh cache of the given size, dropping any previous one
    pub fn initialize_query_context_cache(&mut self, size: usize) {
        if self.config.disabled {
            info!(
                "Query context cache initialization skipped as it is disabled for session {}",
                self.id
            );
            self.cache = None;
            return;
        }

        debug!("Creating query context cache of size {} for session {}", size, self.id);
        self.cache = Some(QueryContextCache::new(size));
    }

    /// Payload to send with the next request, if any
    pub fn query_context_dto(&self) -> Option<QueryContextDto> {
        self.cache
            .as_ref()
            .and_then(QueryContextCache::serialize_query_context_dto)
    }

    /// Merge the query context of a response; a disabled cache ignores it
    pub fn deserialize_query_context(&self, data: Option<&Value>) -> Result<()> {
        match &self.cache {
            Some(cache) => cache.deserialize_query_context(data),
            None => Ok(()),
        }
    }

    pub fn clear_query_context_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear_cache();
        }
    }

    /// Number of committed elements, 0 without a cache
    pub fn query_context_cache_size(&self) -> usize {
        self.cache.as_ref().map_or(0, QueryContextCache::size)
    }

    pub fn set_query_context_cache_capacity(&self, capacity: usize) {
        if let Some(cache) = &self.cache {
            cache.set_capacity(capacity);
        }
    }

    /// Add the query context field to an outgoing request body
    ///
    /// The field is left out entirely when there is nothing to send.
    pub fn attach_query_context(&self, body: &mut Map<String, Value>) -> Result<()> {
        let payload = match &self.cache {
            Some(cache) => cache.serialize_query_context()?,
            None => None,
        };

        if let Some(payload) = payload {
            body.insert(REQUEST_KEY.to_string(), payload);
        }
        Ok(())
    }

    /// Apply the query context field of a response body
    pub fn handle_response(&self, body: &Value) -> Result<()> {
        self.deserialize_query_context(body.get(RESPONSE_KEY))
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        debug!(
            "Closing session {} with {} query context elements",
            self.id,
            self.query_context_cache_size()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_session_creates_cache() {
        let session = Session::new(QueryContextConfig::builder().capacity(3).build());
        let cache = session.query_context_cache().unwrap();
        assert_eq!(cache.capacity(), 3);
        assert_eq!(session.query_context_cache_size(), 0);
    }

    #[test]
    fn test_disabled_session_has_no_cache() {
        let session = Session::new(QueryContextConfig::builder().disabled(true).build());
        assert!(session.query_context_cache().is_none());

        let response = json!({ "queryContext": { "entries": [
            { "id": 1, "timestamp": 1, "priority": 0 }
        ] } });
        session.handle_response(&response).unwrap();
        assert_eq!(session.query_context_cache_size(), 0);

        let mut body = Map::new();
        session.attach_query_context(&mut body).unwrap();
        assert!(body.is_empty());
    }

    #[test]
    fn test_reinitialize_drops_previous_cache() {
        let mut session = Session::new(QueryContextConfig::default());
        session
            .handle_response(&json!({ "queryContext": { "entries": [
                { "id": 1, "timestamp": 1, "priority": 0 }
            ] } }))
            .unwrap();
        assert_eq!(session.query_context_cache_size(), 1);

        session.initialize_query_context_cache(8);
        assert_eq!(session.query_context_cache_size(), 0);
        assert_eq!(session.query_context_cache().unwrap().capacity(), 8);
    }

    #[test]
    fn test_sessions_have_distinct_ids() {
        let a = Session::new(QueryContextConfig::default());
        let b = Session::new(QueryContextConfig::default());
        assert_ne!(a.id(), b.id());
    }
}
