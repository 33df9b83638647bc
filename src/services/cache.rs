//! TTL cache over catalog and ledger listings
//!
//! Read paths go through the cache; the lending engine invalidates after
//! every mutating operation, so readers in the same process never see a
//! listing older than the last committed write.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::{
    error::AppResult,
    models::{Book, Member, Transaction},
};

/// One cached value with an expiry clock
pub struct TtlCache<T> {
    ttl: Duration,
    slot: RwLock<Option<(Instant, Arc<T>)>>,
}

impl<T> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
        }
    }

    /// Return the cached value if fresh, otherwise load and cache it
    pub async fn get_or_load<F, Fut>(&self, load: F) -> AppResult<Arc<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        {
            let slot = self.slot.read().await;
            if let Some((stored_at, value)) = slot.as_ref() {
                if stored_at.elapsed() < self.ttl {
                    return Ok(Arc::clone(value));
                }
            }
        }

        let value = Arc::new(load().await?);
        let mut slot = self.slot.write().await;
        *slot = Some((Instant::now(), Arc::clone(&value)));
        Ok(value)
    }

    pub async fn invalidate(&self) {
        let mut slot = self.slot.write().await;
        *slot = None;
    }
}

/// Cache slots for the three storage listings
pub struct CatalogCache {
    pub books: TtlCache<Vec<Book>>,
    pub members: TtlCache<Vec<Member>>,
    pub transactions: TtlCache<Vec<Transaction>>,
}

impl CatalogCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            books: TtlCache::new(ttl),
            members: TtlCache::new(ttl),
            transactions: TtlCache::new(ttl),
        }
    }

    /// Drop everything touched by a lend/return write
    pub async fn invalidate_writes(&self) {
        self.books.invalidate().await;
        self.transactions.invalidate().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn serves_cached_value_within_ttl() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let loads = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = cache
                .get_or_load(|| async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok(42u32)
                })
                .await
                .unwrap();
            assert_eq!(*value, 42);
        }

        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expires_after_ttl() {
        let cache = TtlCache::new(Duration::from_millis(10));
        let loads = AtomicUsize::new(0);

        let load = || async {
            loads.fetch_add(1, Ordering::SeqCst);
            Ok(1u32)
        };

        cache.get_or_load(load).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        cache.get_or_load(load).await.unwrap();

        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidate_forces_reload() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let loads = AtomicUsize::new(0);

        let load = || async {
            loads.fetch_add(1, Ordering::SeqCst);
            Ok(1u32)
        };

        cache.get_or_load(load).await.unwrap();
        cache.invalidate().await;
        cache.get_or_load(load).await.unwrap();

        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }
}
