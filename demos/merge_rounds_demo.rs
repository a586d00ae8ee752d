//! Merge Rounds Demo
//!
//! Walks a session through a few server responses and prints the query
//! context it would send back after each one.
//!
//! Usage:
//!   cargo run --example merge_rounds_demo
//!
//! Environment variables:
//!   QUERY_CONTEXT_CACHE_SIZE    - cache capacity (default: 5)
//!   DISABLE_QUERY_CONTEXT_CACHE - set to true to run without a cache
//!   RUST_LOG                    - log filter (default: info)

use query_context_cache::Session;
use serde_json::{json, Map};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("=== Query Context Merge Rounds Demo ===");

    let session = Session::from_env()?;
    info!("Session {} using {:?}", session.id(), session.config());

    let responses = [
        json!({ "queryContext": { "entries": [
            { "id": 1, "timestamp": 10, "priority": 5, "context": { "base64Data": "YQ==" } },
            { "id": 2, "timestamp": 10, "priority": 1, "context": { "base64Data": "Yg==" } },
            { "id": 3, "timestamp": 10, "priority": 3, "context": { "base64Data": "Yw==" } }
        ] } }),
        json!({ "queryContext": { "entries": [
            { "id": 2, "timestamp": 20, "priority": 1, "context": { "base64Data": "YjI=" } },
            { "id": 3, "timestamp": 10, "priority": 0 },
            { "id": 4, "timestamp": 20, "priority": 5 }
        ] } }),
        json!({ "success": true }),
    ];

    for (round, response) in responses.iter().enumerate() {
        info!("\n--- Round {} ---", round + 1);
        session.handle_response(response)?;

        let mut request = Map::new();
        session.attach_query_context(&mut request)?;
        info!("Cache size: {}", session.query_context_cache_size());
        info!("Next request: {}", serde_json::to_string_pretty(&request)?);
    }

    if let Some(cache) = session.query_context_cache() {
        info!("{}", cache.stats());
    }

    Ok(())
}
