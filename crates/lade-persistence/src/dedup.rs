//! In-memory [`DedupStore`]: a single-key compare-and-set primitive with
//! TTL, the only shared mutable resource in the job-enqueue hot path.
//!
//! Production deployments would point this interface at the same shared KV
//! store the design notes call out (Redis, etc); this implementation is the
//! deterministic in-memory substitute the design notes say tests should use,
//! and is also adequate for a single-process worker deployment.

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

// Layer 2: Third-party crate imports
use async_trait::async_trait;

// Layer 3: Internal module imports
use lade_core::traits::DedupStore;

#[derive(Debug, Default)]
pub struct InMemoryDedupStore {
    held: Mutex<HashMap<String, Instant>>,
}

impl InMemoryDedupStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn is_expired(expires_at: Instant, now: Instant) -> bool {
        expires_at <= now
    }
}

#[async_trait]
impl DedupStore for InMemoryDedupStore {
    async fn try_acquire(&self, key: &str, ttl: Duration) -> bool {
        let mut held = self.held.lock().expect("dedup store lock poisoned");
        let now = Instant::now();
        held.retain(|_, expires_at| !Self::is_expired(*expires_at, now));
        if held.contains_key(key) {
            return false;
        }
        held.insert(key.to_string(), now + ttl);
        true
    }

    async fn release(&self, key: &str) {
        self.held.lock().expect("dedup store lock poisoned").remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn concurrent_duplicate_enqueues_collapse_to_one_winner() {
        let store = std::sync::Arc::new(InMemoryDedupStore::new());
        let key = "dedup:task:full_discovery:lease:NMSLO/12345";
        let mut tasks = Vec::new();
        for _ in 0..5 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store.try_acquire(key, Duration::from_secs(120)).await
            }));
        }
        let mut won = 0;
        for task in tasks {
            if task.await.expect("task panicked") {
                won += 1;
            }
        }
        assert_eq!(won, 1);
    }

    #[tokio::test]
    async fn expired_key_can_be_reacquired() {
        let store = InMemoryDedupStore::new();
        let key = "dedup:task:x:lease:NMSLO/1";
        assert!(store.try_acquire(key, Duration::from_millis(10)).await);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(store.try_acquire(key, Duration::from_secs(120)).await);
    }

    #[tokio::test]
    async fn release_allows_immediate_reacquire() {
        let store = InMemoryDedupStore::new();
        let key = "dedup:task:x:lease:NMSLO/1";
        assert!(store.try_acquire(key, Duration::from_secs(120)).await);
        store.release(key).await;
        assert!(store.try_acquire(key, Duration::from_secs(120)).await);
    }
}
