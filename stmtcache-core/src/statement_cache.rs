use crate::error::{CacheError, OfferError, Result};
use crate::listener::{EvictionListener, EvictionListeners};
use crate::tracker::StatementTracker;
use crate::{CacheConfig, StatementHandle};
use hashlink::LinkedHashMap;
use log::{debug, trace, warn};
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "stats")]
use crate::CacheStats;

const DEFAULT_NAME: &str = "statement-cache";

/// Outcome of a successful [`LruStatementCache::offer`].
#[derive(Debug)]
pub enum Offer<H> {
    /// The cache tracks the statement; the caller must not close it.
    Cached(H),
    /// Caching is disabled; the handle is given back and the caller closes it.
    NotCached(H),
}

impl<H> Offer<H> {
    pub fn is_cached(&self) -> bool {
        matches!(self, Offer::Cached(_))
    }

    /// The handle, whichever way the offer went.
    pub fn into_inner(self) -> H {
        match self {
            Offer::Cached(key) | Offer::NotCached(key) => key,
        }
    }
}

/// Least-recently-used statement cache that never evicts a statement in use.
///
/// Each pooled connection owns one cache. A statement handle is looked up before
/// preparing; on a hit the cached delegate is attached to the handle and its
/// usage count goes up. On a miss the caller prepares the statement and offers
/// it right away, which registers it with a usage count of one for that caller.
/// Closing a statement offers its handle again, bringing the count back down.
///
/// # Eviction Behavior
///
/// Eviction runs only from [`offer`](Self::offer), when the cache holds more than
/// `max_size` entries. Entries are scanned from least- to most-recently used and
/// every entry with a usage count of zero is removed until the size is back at
/// `max_size`. Entries in use are skipped, so the cache may stay above
/// `max_size` until statements are returned; a later offer shrinks it again.
///
/// Every removed delegate, whether evicted or cleared, is handed to the
/// registered [`EvictionListener`]s, which are responsible for closing it.
///
/// # Thread Safety
///
/// All operations take `&mut self`. Wrap the cache in a
/// [`SharedStatementCache`](crate::SharedStatementCache) when the owning
/// connection is used from several threads.
///
/// # Examples
///
/// ```
/// use stmtcache_core::{LruStatementCache, PreparedStatementKey, StatementHandle};
///
/// let mut cache = LruStatementCache::new(2);
///
/// // Nothing cached yet: prepare the statement and register it
/// let shell = PreparedStatementKey::new("SELECT * FROM users WHERE id = ?");
/// assert!(cache.lookup(shell.clone()).is_none());
/// let handle = cache.offer(shell.clone().with_delegate(101)).unwrap().into_inner();
/// assert_eq!(cache.usage_count(&shell), Some(1));
///
/// // Closing the statement gives it back
/// cache.offer(handle).unwrap();
/// assert_eq!(cache.usage_count(&shell), Some(0));
///
/// // Same definition again: the prepared delegate is reused
/// let handle = cache.lookup(shell.clone()).unwrap();
/// assert_eq!(handle.delegate(), Some(&101));
/// assert_eq!(cache.usage_count(&shell), Some(1));
/// cache.offer(handle).unwrap();
/// ```
pub struct LruStatementCache<H: StatementHandle> {
    name: String,
    max_size: i32,
    size: usize,
    entries: LinkedHashMap<H, StatementTracker<H::Delegate>>,
    listeners: EvictionListeners<H::Delegate>,
    #[cfg(feature = "stats")]
    stats: Arc<CacheStats>,
}

impl<H: StatementHandle> LruStatementCache<H> {
    /// Creates a cache holding up to `max_size` statements.
    ///
    /// A `max_size` below one disables caching.
    pub fn new(max_size: i32) -> Self {
        Self::with_config(CacheConfig::new(max_size))
    }

    pub fn with_config(config: CacheConfig) -> Self {
        let capacity = usize::try_from(config.max_size).unwrap_or(0);
        Self {
            name: config.name.unwrap_or_else(|| DEFAULT_NAME.to_string()),
            max_size: config.max_size,
            size: 0,
            entries: LinkedHashMap::with_capacity(capacity),
            listeners: EvictionListeners::new(),
            #[cfg(feature = "stats")]
            stats: Arc::new(CacheStats::new()),
        }
    }

    /// Looks up a cached statement matching the definition carried by `key`.
    ///
    /// `key` is usually a shell handle without a delegate. On a hit the entry
    /// becomes most-recently used, its usage count is incremented, the cached
    /// delegate is attached to `key` and `key` is returned. On a miss nothing
    /// changes and `None` is returned.
    ///
    /// An entry whose usage count cannot grow any further is not delivered:
    /// the lookup is logged and answered like a miss, leaving the count as is.
    pub fn lookup(&mut self, mut key: H) -> Option<H> {
        match self.entries.to_back(&key) {
            Some(tracker) => {
                if !tracker.acquire() {
                    warn!(
                        "usage count of statement <{}> exhausted, not delivering it from {}",
                        key, self.name
                    );
                    #[cfg(feature = "stats")]
                    self.stats.record_miss();
                    return None;
                }
                key.set_delegate(tracker.delegate().clone());
                debug!(
                    "delivered from cache with usage count {} statement <{}> in {}",
                    tracker.usage_count(),
                    key,
                    self.name
                );
                #[cfg(feature = "stats")]
                self.stats.record_hit();
                Some(key)
            }
            None => {
                trace!("no cached statement <{}> in {}", key, self.name);
                #[cfg(feature = "stats")]
                self.stats.record_miss();
                None
            }
        }
    }

    /// Registers a freshly prepared statement, or gives back one that was checked out.
    ///
    /// A definition the cache does not know yet is inserted with a usage count
    /// of one, standing for the caller that just prepared it. A known definition
    /// has its usage count decremented. Either way the entry becomes
    /// most-recently used, and an eviction pass runs if the cache is over size.
    ///
    /// # Returns
    ///
    /// * `Ok(Offer::Cached(key))` - The statement is tracked by the cache
    /// * `Ok(Offer::NotCached(key))` - Caching is disabled; the caller closes the statement itself
    ///
    /// # Errors
    ///
    /// Every error carries `key` back in an [`OfferError`]:
    ///
    /// * [`CacheError::MissingDelegate`] - `key` is new but carries no delegate
    /// * [`CacheError::UsageUnderflow`] - `key` is tracked but nobody holds it
    /// * [`CacheError::DelegateMismatch`] - `key` carries a delegate other than the tracked one
    /// * [`CacheError::Listener`] - a listener failed while evicting to make room
    ///
    /// Protocol violations leave the cache untouched and the delegate in `key`
    /// is the caller's to close.
    pub fn offer(&mut self, key: H) -> std::result::Result<Offer<H>, OfferError<H>> {
        if !self.is_enabled() {
            trace!(
                "caching disabled, not caching statement <{}> in {}",
                key,
                self.name
            );
            return Ok(Offer::NotCached(key));
        }

        if let Some(tracker) = self.entries.get_mut(&key) {
            if key.delegate().is_some_and(|d| d != tracker.delegate()) {
                warn!(
                    "statement <{}> returned with a foreign delegate in {}",
                    key, self.name
                );
                let error = CacheError::DelegateMismatch {
                    key: key.to_string(),
                };
                return Err(OfferError::new(error, key));
            }
            if !tracker.release() {
                warn!(
                    "statement <{}> returned with usage count already at 0 in {}",
                    key, self.name
                );
                let error = CacheError::UsageUnderflow {
                    key: key.to_string(),
                };
                return Err(OfferError::new(error, key));
            }
            debug!(
                "returning to cache statement <{}> with usage count {} in {}",
                key,
                tracker.usage_count(),
                self.name
            );
            self.entries.to_back(&key);
        } else {
            let mut stored = key.clone();
            let Some(delegate) = stored.take_delegate() else {
                warn!(
                    "statement <{}> offered without a delegate in {}",
                    key, self.name
                );
                let error = CacheError::MissingDelegate {
                    key: key.to_string(),
                };
                return Err(OfferError::new(error, key));
            };
            debug!("adding to cache statement <{}> in {}", key, self.name);
            self.entries.insert(stored, StatementTracker::new(delegate));
            self.size += 1;
            #[cfg(feature = "stats")]
            self.stats.record_insertion();
        }

        if self.size > self.capacity() {
            if let Err(error) = self.try_eviction() {
                return Err(OfferError::new(error, key));
            }
        }

        Ok(Offer::Cached(key))
    }

    /// Removes every statement, in use or not, handing each delegate to the listeners.
    ///
    /// Called when the owning connection is closed. If a listener fails, the
    /// statement being disposed is already gone, the error is returned, and the
    /// remaining statements stay cached for a later `clear`.
    pub fn clear(&mut self) -> Result<()> {
        debug!("clearing {} statement(s) from {}", self.size, self.name);
        while let Some((key, tracker)) = self.entries.pop_front() {
            self.size -= 1;
            if !tracker.is_evictable() {
                debug!(
                    "discarding statement <{}> still in use (usage count {}) from {}",
                    key,
                    tracker.usage_count(),
                    self.name
                );
            }
            self.listeners
                .notify_all(tracker.delegate())
                .map_err(CacheError::Listener)?;
        }
        self.size = 0;
        Ok(())
    }

    /// Evicts idle statements, oldest first, until the cache is back at `max_size`.
    fn try_eviction(&mut self) -> Result<()> {
        let capacity = self.capacity();
        let victims: Vec<H> = self
            .entries
            .iter()
            .filter(|(_, tracker)| tracker.is_evictable())
            .map(|(key, _)| key.clone())
            .take(self.size - capacity)
            .collect();

        for key in victims {
            let Some(tracker) = self.entries.remove(&key) else {
                continue;
            };
            self.size -= 1;
            #[cfg(feature = "stats")]
            self.stats.record_eviction();
            debug!("evicting from cache statement <{}> in {}", key, self.name);
            self.listeners
                .notify_all(tracker.delegate())
                .map_err(CacheError::Listener)?;
        }

        if self.size > capacity {
            debug!(
                "every statement in use, {} holds {} over a maximum of {}",
                self.name, self.size, self.max_size
            );
        }
        Ok(())
    }

    pub fn add_eviction_listener(&mut self, listener: Arc<dyn EvictionListener<H::Delegate>>) {
        self.listeners.register(listener);
    }

    /// Removes the first registration of `listener`. Returns false if it was not registered.
    pub fn remove_eviction_listener(
        &mut self,
        listener: &Arc<dyn EvictionListener<H::Delegate>>,
    ) -> bool {
        self.listeners.unregister(listener)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Number of tracked statements. May exceed `max_size` while statements are in use.
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn max_size(&self) -> i32 {
        self.max_size
    }

    pub fn is_enabled(&self) -> bool {
        self.max_size >= 1
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if a statement with the same definition is tracked. Does not touch it.
    pub fn contains(&self, key: &H) -> bool {
        self.entries.contains_key(key)
    }

    /// Current usage count of the statement matching `key`, without touching it.
    pub fn usage_count(&self, key: &H) -> Option<u32> {
        self.entries.get(key).map(StatementTracker::usage_count)
    }

    /// Tracked statement keys from least- to most-recently used.
    pub fn keys(&self) -> impl Iterator<Item = &H> + '_ {
        self.entries.keys()
    }

    #[cfg(feature = "stats")]
    pub fn stats(&self) -> &Arc<CacheStats> {
        &self.stats
    }

    fn capacity(&self) -> usize {
        usize::try_from(self.max_size).unwrap_or(0)
    }
}

impl<H: StatementHandle> fmt::Debug for LruStatementCache<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruStatementCache")
            .field("name", &self.name)
            .field("max_size", &self.max_size)
            .field("size", &self.size)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
