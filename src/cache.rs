//! Single-slot, time-boxed memoization.
//!
//! Used by the HTTP layer to share one camera list across requests. The slot
//! is process-wide and unpartitioned. Reads and writes are not coordinated:
//! two requests that miss at the same time will both fetch, and the last
//! write wins. A slightly stale camera list is acceptable for enrichment.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

/// Default lifetime of the cached camera list.
pub const DEFAULT_CAMERA_TTL: Duration = Duration::from_secs(5 * 60);

struct Entry<T> {
    value: T,
    written_at: Instant,
}

/// Holds at most one value, valid for `ttl` after it was written.
pub struct TimedCache<T> {
    slot: Arc<RwLock<Option<Entry<T>>>>,
    ttl: Duration,
}

impl<T> Clone for TimedCache<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
            ttl: self.ttl,
        }
    }
}

impl<T: Clone> TimedCache<T> {
    /// Create an empty cache.
    pub fn new(ttl: Duration) -> Self {
        Self {
            slot: Arc::new(RwLock::new(None)),
            ttl,
        }
    }

    /// The cached value, if one was written less than `ttl` ago.
    pub async fn get(&self) -> Option<T> {
        let slot = self.slot.read().await;
        match &*slot {
            Some(entry) if entry.written_at.elapsed() < self.ttl => Some(entry.value.clone()),
            _ => None,
        }
    }

    /// Replace the cached value and restart its lifetime.
    pub async fn set(&self, value: T) {
        let mut slot = self.slot.write().await;
        *slot = Some(Entry {
            value,
            written_at: Instant::now(),
        });
    }

    /// Return the fresh cached value, or run `fetch` and cache its result.
    ///
    /// Errors from `fetch` are returned as-is and leave the slot untouched.
    /// The lock is not held while `fetch` runs.
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, fetch: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get().await {
            tracing::debug!("Cache hit");
            return Ok(value);
        }

        tracing::debug!("Cache miss");
        let value = fetch().await?;
        self.set(value.clone()).await;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_value_expires_after_ttl() {
        let cache = TimedCache::new(Duration::from_secs(300));
        assert_eq!(cache.get().await, None::<u32>);

        cache.set(7).await;
        assert_eq!(cache.get().await, Some(7));

        tokio::time::advance(Duration::from_secs(299)).await;
        assert_eq!(cache.get().await, Some(7));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_restarts_lifetime() {
        let cache = TimedCache::new(Duration::from_secs(10));
        cache.set("old").await;

        tokio::time::advance(Duration::from_secs(8)).await;
        cache.set("new").await;

        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(cache.get().await, Some("new"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_or_try_insert_with() {
        let cache = TimedCache::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: Result<u32, String> = cache
                .get_or_try_insert_with(|| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(42)
                })
                .await;
            assert_eq!(value, Ok(42));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(60)).await;
        let value: Result<u32, String> = cache
            .get_or_try_insert_with(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(43)
            })
            .await;
        assert_eq!(value, Ok(43));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let cache: TimedCache<u32> = TimedCache::new(DEFAULT_CAMERA_TTL);

        let value = cache
            .get_or_try_insert_with(|| async { Err::<u32, _>("upstream down") })
            .await;
        tokio_test::assert_err!(value);
        assert_eq!(cache.get().await, None);
    }

    #[tokio::test]
    async fn test_clones_share_the_slot() {
        let cache = TimedCache::new(DEFAULT_CAMERA_TTL);
        let other = cache.clone();

        cache.set(5).await;
        assert_eq!(other.get().await, Some(5));
    }
}
