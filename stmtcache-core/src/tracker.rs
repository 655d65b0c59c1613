/// A cached delegate together with the number of callers currently holding it.
///
/// An entry is eligible for eviction only while `usage_count` is zero.
///
/// # Examples
///
/// ```
/// use stmtcache_core::StatementTracker;
///
/// let mut tracker = StatementTracker::new("stmt");
/// assert_eq!(tracker.usage_count(), 1);
///
/// assert!(tracker.release());
/// assert!(tracker.is_evictable());
///
/// assert!(tracker.acquire());
/// assert_eq!(tracker.usage_count(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct StatementTracker<D> {
    delegate: D,
    usage_count: u32,
}

impl<D> StatementTracker<D> {
    /// Starts tracking `delegate` with a usage count of one.
    ///
    /// A statement enters the cache on behalf of the caller that prepared it,
    /// so that caller's release is still outstanding at insertion time.
    pub fn new(delegate: D) -> Self {
        Self {
            delegate,
            usage_count: 1,
        }
    }

    pub fn delegate(&self) -> &D {
        &self.delegate
    }

    pub fn usage_count(&self) -> u32 {
        self.usage_count
    }

    pub fn is_evictable(&self) -> bool {
        self.usage_count == 0
    }

    /// Records one more holder of the delegate.
    ///
    /// Returns `false`, leaving the count untouched, when it cannot grow any further.
    pub fn acquire(&mut self) -> bool {
        match self.usage_count.checked_add(1) {
            Some(count) => {
                self.usage_count = count;
                true
            }
            None => false,
        }
    }

    /// Records that one holder gave the delegate back.
    ///
    /// Returns `false`, leaving the count untouched, when no holder was outstanding.
    pub fn release(&mut self) -> bool {
        match self.usage_count.checked_sub(1) {
            Some(count) => {
                self.usage_count = count;
                true
            }
            None => false,
        }
    }
}
