//! # query-context-cache
//!
//! Client-side cache for the "query context" a database server attaches to its
//! responses and expects back on the following requests.
//!
//! ## Features
//!
//! - One bounded cache per session, no global state
//! - Id-keyed merge driven by read timestamps
//! - Priority-ordered eviction down to a configurable capacity
//! - Round-based commits of priority slots
//! - JSON wire encoding with base64 opaque contexts
//! - Thread-safe: every operation runs under the cache's own lock
//!
//! ## Merge Rounds
//!
//! Each server response is one merge round. The session hands the response's
//! query context to the cache and echoes the committed set on the next request:
//!
//! ```no_run
//! use query_context_cache::{QueryContextConfig, Session};
//! use serde_json::{json, Map};
//!
//! fn main() -> anyhow::Result<()> {
//!     let session = Session::new(QueryContextConfig::builder().capacity(2).build());
//!
//!     session.handle_response(&json!({
//!         "queryContext": {
//!             "entries": [
//!                 { "id": 1, "timestamp": 10, "priority": 5, "context": { "base64Data": "YQ==" } },
//!                 { "id": 2, "timestamp": 10, "priority": 1, "context": { "base64Data": "Yg==" } },
//!                 { "id": 3, "timestamp": 10, "priority": 3, "context": { "base64Data": "Yw==" } }
//!             ]
//!         }
//!     }))?;
//!     assert_eq!(session.query_context_cache_size(), 2);
//!
//!     let mut request = Map::new();
//!     session.attach_query_context(&mut request)?;
//!     println!("{}", serde_json::to_string_pretty(&request)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Direct Cache Use
//!
//! ```rust
//! use query_context_cache::QueryContextCache;
//!
//! let cache = QueryContextCache::new(5);
//! cache.merge(7, 100, 2, b"ctx".to_vec());
//! cache.sync_priority_map();
//! cache.check_cache_capacity();
//!
//! assert_eq!(cache.size(), 1);
//! ```

pub mod cache;
pub mod error;
pub mod session;
pub mod wire;

// Re-export main types for convenience
pub use cache::{
    CacheStats, ElementColumns, QueryContextCache, QueryContextConfig, QueryContextConfigBuilder,
    QueryContextElement,
};
pub use error::{QueryContextError, Result};
pub use session::Session;
pub use wire::{OpaqueContextDto, QueryContextDto, QueryContextEntryDto};
