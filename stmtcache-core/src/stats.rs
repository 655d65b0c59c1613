use std::sync::atomic::{AtomicU64, Ordering};

/// Statement cache statistics.
///
/// Counters use atomic operations with `Relaxed` ordering so a handle to the
/// statistics can be read from any thread without taking the cache lock.
///
/// # Examples
///
/// ```
/// use stmtcache_core::CacheStats;
///
/// let stats = CacheStats::new();
///
/// stats.record_hit();
/// stats.record_hit();
/// stats.record_miss();
///
/// assert_eq!(stats.hits(), 2);
/// assert_eq!(stats.misses(), 1);
/// assert_eq!(stats.total_lookups(), 3);
/// assert!((stats.hit_rate() - 0.6666).abs() < 0.001);
/// ```
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    insertions: AtomicU64,
    evictions: AtomicU64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a lookup that delivered a cached statement.
    #[inline]
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a lookup that found nothing to reuse.
    #[inline]
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a new statement entering the cache.
    #[inline]
    pub fn record_insertion(&self) {
        self.insertions.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a statement removed because the cache was over capacity.
    ///
    /// Removals done by `clear` are not counted.
    #[inline]
    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn insertions(&self) -> u64 {
        self.insertions.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn total_lookups(&self) -> u64 {
        self.hits() + self.misses()
    }

    /// Fraction of lookups that were hits, `0.0` when nothing was looked up yet.
    #[inline]
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_lookups();
        if total == 0 {
            0.0
        } else {
            self.hits() as f64 / total as f64
        }
    }

    /// Resets all counters to zero.
    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.insertions.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_empty_stats() {
        let stats = CacheStats::new();
        assert_eq!(stats.total_lookups(), 0);
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_counters_and_reset() {
        let stats = CacheStats::new();
        stats.record_insertion();
        stats.record_insertion();
        stats.record_eviction();
        stats.record_miss();
        assert_eq!(stats.insertions(), 2);
        assert_eq!(stats.evictions(), 1);
        assert_eq!(stats.misses(), 1);

        stats.reset();
        assert_eq!(stats.insertions(), 0);
        assert_eq!(stats.evictions(), 0);
        assert_eq!(stats.misses(), 0);
    }

    #[test]
    fn test_concurrent_recording() {
        let stats = Arc::new(CacheStats::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let stats = stats.clone();
                thread::spawn(move || {
                    for _ in 0..1000 {
                        stats.record_hit();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(stats.hits(), 4000);
    }
}
