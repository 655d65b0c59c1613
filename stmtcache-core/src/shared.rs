use crate::error::{OfferError, Result};
use crate::listener::EvictionListener;
use crate::{CacheConfig, LruStatementCache, Offer, StatementHandle};
use parking_lot::Mutex;
use std::sync::Arc;

#[cfg(feature = "stats")]
use crate::CacheStats;

/// A [`LruStatementCache`] that can be shared between the threads using one connection.
///
/// Every operation, including the eviction pass triggered by `offer`, runs
/// under a single `parking_lot::Mutex`, so lookups, offers and clears never
/// interleave. Eviction listeners run while the lock is held.
///
/// Cloning is cheap and yields another handle to the same cache.
///
/// # Examples
///
/// ```
/// use stmtcache_core::{PreparedStatementKey, SharedStatementCache};
/// use std::thread;
///
/// let cache = SharedStatementCache::new(8);
/// cache.offer(PreparedStatementKey::new("SELECT 1").with_delegate(1u32)).unwrap();
///
/// let worker = cache.clone();
/// thread::spawn(move || {
///     let handle = worker.lookup(PreparedStatementKey::new("SELECT 1")).unwrap();
///     worker.offer(handle).unwrap();
/// })
/// .join()
/// .unwrap();
///
/// assert_eq!(cache.len(), 1);
/// ```
pub struct SharedStatementCache<H: StatementHandle> {
    inner: Arc<Mutex<LruStatementCache<H>>>,
    #[cfg(feature = "stats")]
    stats: Arc<CacheStats>,
}

impl<H: StatementHandle> SharedStatementCache<H> {
    pub fn new(max_size: i32) -> Self {
        Self::from_cache(LruStatementCache::new(max_size))
    }

    pub fn with_config(config: CacheConfig) -> Self {
        Self::from_cache(LruStatementCache::with_config(config))
    }

    pub fn from_cache(cache: LruStatementCache<H>) -> Self {
        #[cfg(feature = "stats")]
        let stats = cache.stats().clone();
        Self {
            inner: Arc::new(Mutex::new(cache)),
            #[cfg(feature = "stats")]
            stats,
        }
    }

    /// See [`LruStatementCache::lookup`].
    pub fn lookup(&self, key: H) -> Option<H> {
        self.inner.lock().lookup(key)
    }

    /// See [`LruStatementCache::offer`].
    pub fn offer(&self, key: H) -> std::result::Result<Offer<H>, OfferError<H>> {
        self.inner.lock().offer(key)
    }

    /// See [`LruStatementCache::clear`].
    pub fn clear(&self) -> Result<()> {
        self.inner.lock().clear()
    }

    /// Registers `listener`; see [`LruStatementCache::add_eviction_listener`].
    ///
    /// The listener runs with this cache's lock held, and the lock is not
    /// reentrant: a listener must not call back into this `SharedStatementCache`
    /// or any clone of it, or the calling thread deadlocks.
    pub fn add_eviction_listener(&self, listener: Arc<dyn EvictionListener<H::Delegate>>) {
        self.inner.lock().add_eviction_listener(listener);
    }

    pub fn remove_eviction_listener(&self, listener: &Arc<dyn EvictionListener<H::Delegate>>) -> bool {
        self.inner.lock().remove_eviction_listener(listener)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn usage_count(&self, key: &H) -> Option<u32> {
        self.inner.lock().usage_count(key)
    }

    /// Runs `f` with exclusive access to the underlying cache.
    pub fn with_cache<T>(&self, f: impl FnOnce(&mut LruStatementCache<H>) -> T) -> T {
        f(&mut self.inner.lock())
    }

    /// Statistics handle, readable without taking the cache lock.
    #[cfg(feature = "stats")]
    pub fn stats(&self) -> &Arc<CacheStats> {
        &self.stats
    }
}

impl<H: StatementHandle> Clone for SharedStatementCache<H> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            #[cfg(feature = "stats")]
            stats: self.stats.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ListenerError, PreparedStatementKey};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    type Key = PreparedStatementKey<Arc<String>>;

    fn key(sql: &str) -> Key {
        PreparedStatementKey::new(sql)
    }

    #[test]
    fn test_concurrent_lookup_offer_keeps_usage_balanced() {
        let cache: SharedStatementCache<Key> = SharedStatementCache::new(4);
        let sqls: Vec<String> = (0..4).map(|i| format!("SELECT {}", i)).collect();
        for sql in &sqls {
            cache
                .offer(key(sql).with_delegate(Arc::new(sql.clone())))
                .unwrap();
        }

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = cache.clone();
                let sqls = sqls.clone();
                thread::spawn(move || {
                    for i in 0..500 {
                        let sql = &sqls[(t + i) % sqls.len()];
                        let handle = cache.lookup(key(sql)).expect("statement cached");
                        assert_eq!(handle.delegate().map(|d| d.as_str()), Some(sql.as_str()));
                        cache.offer(handle).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        for sql in &sqls {
            assert_eq!(cache.usage_count(&key(sql)), Some(1));
        }
        assert_eq!(cache.len(), 4);
        #[cfg(feature = "stats")]
        assert_eq!(cache.stats().hits(), 4000);
    }

    #[test]
    fn test_clear_through_shared_handle() {
        let disposed = Arc::new(AtomicUsize::new(0));
        let counter = disposed.clone();
        let cache: SharedStatementCache<Key> =
            SharedStatementCache::with_config(CacheConfig::new(2).with_name("shared"));
        cache.add_eviction_listener(Arc::new(
            move |_: &Arc<String>| -> std::result::Result<(), ListenerError> {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        ));

        cache
            .offer(key("A").with_delegate(Arc::new("a".to_string())))
            .unwrap();
        cache
            .offer(key("B").with_delegate(Arc::new("b".to_string())))
            .unwrap();
        cache.clone().clear().unwrap();

        assert!(cache.is_empty());
        assert_eq!(disposed.load(Ordering::SeqCst), 2);
        assert_eq!(cache.with_cache(|c| c.name().to_string()), "shared");
    }

    #[test]
    fn test_rejected_offer_hands_delegate_back() {
        let cache: SharedStatementCache<Key> = SharedStatementCache::new(2);
        cache
            .offer(key("A").with_delegate(Arc::new("a".to_string())))
            .unwrap();

        let err = cache
            .offer(key("A").with_delegate(Arc::new("foreign".to_string())))
            .unwrap_err();
        assert!(err.error().is_protocol_violation());
        let rejected = err.into_key();
        assert_eq!(rejected.delegate().map(|d| d.as_str()), Some("foreign"));
        assert_eq!(cache.usage_count(&key("A")), Some(1));
    }
}
