//! Time-bounded snapshot cache for the raw detections relation.
//!
//! One process-wide snapshot serves every filter combination. Refreshes are
//! single-flight behind an async mutex and readers only ever receive a
//! complete snapshot through an `Arc`, so a refresh swaps the pointer rather
//! than mutating shared data.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

// ---

struct Entry<T> {
    fetched_at: Instant,
    data: Arc<T>,
}

/// Cache owning the last fetched snapshot and when it was fetched.
pub struct SnapshotCache<T> {
    slot: Mutex<Option<Entry<T>>>,
}

impl<T> Default for SnapshotCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SnapshotCache<T> {
    // ---
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Return the cached snapshot, calling `fetch` first if it is missing or
    /// at least `ttl` old as of `now`.
    ///
    /// A failed fetch is returned as-is and leaves the cache unchanged.
    pub async fn get_or_refresh<F, Fut, E>(
        &self,
        now: Instant,
        ttl: Duration,
        fetch: F,
    ) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        // ---
        let mut slot = self.slot.lock().await;

        if let Some(entry) = slot.as_ref() {
            if now.saturating_duration_since(entry.fetched_at) < ttl {
                return Ok(Arc::clone(&entry.data));
            }
            tracing::debug!("Snapshot expired, refreshing");
        }

        let data = Arc::new(fetch().await?);
        *slot = Some(Entry {
            fetched_at: now,
            data: Arc::clone(&data),
        });
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TTL: Duration = Duration::from_secs(30);

    async fn counted(calls: &AtomicUsize) -> Result<usize, String> {
        Ok(calls.fetch_add(1, Ordering::SeqCst) + 1)
    }

    #[test]
    fn test_reuses_snapshot_within_ttl() {
        // ---
        tokio_test::block_on(async {
            let cache = SnapshotCache::new();
            let calls = AtomicUsize::new(0);
            let t0 = Instant::now();

            let first = cache.get_or_refresh(t0, TTL, || counted(&calls)).await.unwrap();
            let second = cache
                .get_or_refresh(t0 + Duration::from_secs(29), TTL, || counted(&calls))
                .await
                .unwrap();

            assert_eq!(*first, 1);
            assert!(Arc::ptr_eq(&first, &second));
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        });
    }

    #[test]
    fn test_refreshes_once_expired() {
        // ---
        tokio_test::block_on(async {
            let cache = SnapshotCache::new();
            let calls = AtomicUsize::new(0);
            let t0 = Instant::now();

            cache.get_or_refresh(t0, TTL, || counted(&calls)).await.unwrap();
            let refreshed = cache
                .get_or_refresh(t0 + TTL, TTL, || counted(&calls))
                .await
                .unwrap();
            assert_eq!(*refreshed, 2);

            // The new fetch time restarts the window.
            let reused = cache
                .get_or_refresh(t0 + TTL + Duration::from_secs(10), TTL, || counted(&calls))
                .await
                .unwrap();
            assert_eq!(*reused, 2);
        });
    }

    #[test]
    fn test_failed_fetch_is_returned_then_retried() {
        // ---
        tokio_test::block_on(async {
            let cache: SnapshotCache<usize> = SnapshotCache::new();
            let t0 = Instant::now();

            cache
                .get_or_refresh(t0, TTL, || async { Ok::<_, String>(7) })
                .await
                .unwrap();

            let err = cache
                .get_or_refresh(t0 + TTL, TTL, || async { Err::<usize, _>("offline".to_string()) })
                .await
                .unwrap_err();
            assert_eq!(err, "offline");

            let next = cache
                .get_or_refresh(t0 + TTL, TTL, || async { Ok::<_, String>(8) })
                .await
                .unwrap();
            assert_eq!(*next, 8);
        });
    }
}
