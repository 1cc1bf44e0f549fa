//! Shared holder of the current cookie snapshot.
//!
//! Single writer (the refresher), many readers (request handlers). The lock
//! only guards an `Arc` swap, so neither side ever waits on the other for
//! longer than a pointer copy. Readiness is tracked separately with a
//! `watch` channel that flips once, on the first publish.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;

use crate::cookies::CookieSet;

/// The only mutable shared state in the proxy.
#[derive(Debug)]
pub struct CookieStore {
    current: RwLock<Arc<CookieSet>>,
    generation: AtomicU64,
    ready: watch::Sender<bool>,
}

impl Default for CookieStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CookieStore {
    /// Creates a store holding the empty snapshot, not yet ready.
    #[must_use]
    pub fn new() -> Self {
        let (ready, _) = watch::channel(false);
        Self {
            current: RwLock::new(Arc::new(CookieSet::empty())),
            generation: AtomicU64::new(0),
            ready,
        }
    }

    /// Atomically replaces the current snapshot and marks the store ready.
    pub fn publish(&self, cookies: CookieSet) {
        let next = Arc::new(cookies);
        let records = next.len();
        {
            // A poisoned lock still holds a whole Arc; keep serving it.
            let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
            *guard = next;
        }
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.ready.send_replace(true);
        debug!(generation, records, "published cookie snapshot");
    }

    /// Returns the latest published snapshot.
    ///
    /// The returned set is shared and immutable; later publishes do not
    /// affect it.
    #[must_use]
    pub fn current(&self) -> Arc<CookieSet> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Whether at least one snapshot has been published.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// Number of publishes so far.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Waits until the first publish, up to `timeout`.
    ///
    /// Returns `true` when the store is ready.
    pub async fn wait_ready(&self, timeout: Duration) -> bool {
        let mut ready = self.ready.subscribe();
        tokio::time::timeout(timeout, ready.wait_for(|ready| *ready))
            .await
            .is_ok_and(|changed| changed.is_ok())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use crate::cookies::CookieRecord;

    fn set_of(tag: &str, count: usize) -> CookieSet {
        (0..count)
            .map(|i| CookieRecord::new("api.example.com", "/", false, 0, format!("c{i}"), tag))
            .collect()
    }

    #[test]
    fn test_new_store_is_empty_and_not_ready() {
        let store = CookieStore::new();
        assert!(store.current().is_empty());
        assert!(!store.is_ready());
        assert_eq!(store.generation(), 0);
    }

    #[test]
    fn test_publish_replaces_snapshot_and_sets_ready() {
        let store = CookieStore::new();
        store.publish(set_of("a", 2));
        assert!(store.is_ready());
        assert_eq!(store.current().len(), 2);
        assert_eq!(store.generation(), 1);

        store.publish(set_of("b", 3));
        assert_eq!(store.current().len(), 3);
        assert_eq!(store.generation(), 2);
    }

    #[test]
    fn test_held_snapshot_survives_later_publish() {
        let store = CookieStore::new();
        store.publish(set_of("old", 1));
        let held = store.current();
        store.publish(set_of("new", 4));

        assert_eq!(held.len(), 1);
        assert_eq!(held.iter().next().unwrap().value(), "old");
    }

    #[test]
    fn test_publishing_empty_set_still_marks_ready() {
        let store = CookieStore::new();
        store.publish(CookieSet::empty());
        assert!(store.is_ready());
    }

    #[tokio::test]
    async fn test_wait_ready_times_out_before_first_publish() {
        let store = CookieStore::new();
        assert!(!store.wait_ready(Duration::from_millis(20)).await);
    }

    #[tokio::test]
    async fn test_wait_ready_wakes_on_publish() {
        let store = Arc::new(CookieStore::new());
        let waiter = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.wait_ready(Duration::from_secs(5)).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        store.publish(set_of("x", 1));
        assert!(waiter.await.unwrap());
    }

    #[tokio::test]
    async fn test_wait_ready_returns_immediately_when_ready() {
        let store = CookieStore::new();
        store.publish(set_of("x", 1));
        assert!(store.wait_ready(Duration::from_millis(1)).await);
    }

    #[test]
    fn test_concurrent_readers_never_see_mixed_snapshots() {
        let store = Arc::new(CookieStore::new());
        store.publish(set_of("gen-0", 8));

        let writer = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for generation in 1..=500 {
                    store.publish(set_of(&format!("gen-{generation}"), 8));
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..2_000 {
                        let snapshot = store.current();
                        assert_eq!(snapshot.len(), 8);
                        let first = snapshot.iter().next().unwrap().value().to_string();
                        assert!(snapshot.iter().all(|record| record.value() == first));
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(store.generation(), 501);
    }
}
