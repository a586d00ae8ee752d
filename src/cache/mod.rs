//! # Query Context Cache
//!
//! The server attaches a set of "query context" elements to its responses and
//! expects the client to echo the latest set back on the next request. This
//! module keeps that set for one session.
//!
//! ## Features
//!
//! - **Id-keyed merge**: at most one element per id; the read timestamp decides
//!   whether a reported element refreshes the stored one
//! - **Priority ordering**: elements are ordered by priority, then id, then read
//!   timestamp; priority 0 is the most important
//! - **Round-based commits**: priority slots reported during a round are
//!   committed together once the round ends
//! - **Bounded size**: after each round the least important elements are evicted
//!   down to the configured capacity
//!
//! ## Example
//!
//! ```rust
//! use query_context_cache::cache::{QueryContextCache, QueryContextElement};
//!
//! let cache = QueryContextCache::new(2);
//!
//! cache.merge_round(vec![
//!     QueryContextElement::new(1, 10, 5, "a"),
//!     QueryContextElement::new(2, 10, 1, "b"),
//!     QueryContextElement::new(3, 10, 3, "c"),
//! ]);
//!
//! assert_eq!(cache.size(), 2);
//! assert_eq!(cache.get_elements().ids, vec![2, 3]);
//! ```

pub mod config;
pub mod element;
pub mod store;
pub mod types;

pub use config::{QueryContextConfig, QueryContextConfigBuilder, DEFAULT_CAPACITY};
pub use element::QueryContextElement;
pub use store::QueryContextCache;
pub use types::{CacheStats, ElementColumns};
