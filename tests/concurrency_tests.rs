//! Concurrent access to a shared session
//!
//! Response handling and request building run on different worker threads;
//! every observation must see a completed merge round.

use query_context_cache::{QueryContextConfig, Session};
use serde_json::{json, Map};
use std::collections::HashSet;
use std::sync::Arc;

const CAPACITY: usize = 4;

fn response(round: u64) -> serde_json::Value {
    let entries: Vec<_> = (0..8u64)
        .map(|i| {
            json!({
                "id": (round + i) % 12,
                "timestamp": round,
                "priority": (i * 7 + round) % 10,
            })
        })
        .collect();
    json!({ "queryContext": { "entries": entries } })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_rounds_and_requests() {
    let session = Arc::new(Session::new(
        QueryContextConfig::builder().capacity(CAPACITY).build(),
    ));

    let mut handles = Vec::new();

    for worker in 0..4u64 {
        let session = Arc::clone(&session);
        handles.push(tokio::task::spawn_blocking(move || {
            for round in 0..50u64 {
                session
                    .handle_response(&response(worker * 100 + round))
                    .expect("well-formed response");
            }
        }));
    }

    for _ in 0..4 {
        let session = Arc::clone(&session);
        handles.push(tokio::task::spawn_blocking(move || {
            for _ in 0..50 {
                let mut request = Map::new();
                session
                    .attach_query_context(&mut request)
                    .expect("serializable cache");

                if let Some(payload) = request.get("queryContextDTO") {
                    let entries = payload["entries"].as_array().expect("entries");
                    assert!(entries.len() <= CAPACITY);

                    let ids: HashSet<u64> =
                        entries.iter().filter_map(|e| e["id"].as_u64()).collect();
                    assert_eq!(ids.len(), entries.len());
                }
            }
        }));
    }

    for handle in handles {
        handle.await.expect("worker panicked");
    }

    let cache = session.query_context_cache().expect("cache enabled");
    assert!(cache.size() <= CAPACITY);
    assert_eq!(cache.stats().rounds, 200);
}
