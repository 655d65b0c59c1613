/// Configuration for a [`LruStatementCache`](crate::LruStatementCache).
///
/// # Fields
///
/// * `max_size` - Target number of cached statements. Zero or negative disables
///   caching: nothing is ever inserted and every lookup misses. The cache can
///   briefly hold more than `max_size` entries while all of them are in use.
/// * `name` - Label included in log lines, usually the owning connection or pool.
///
/// # Examples
///
/// ```
/// use stmtcache_core::CacheConfig;
///
/// let config = CacheConfig::new(50).with_name("orders-pool#3");
/// assert_eq!(config.max_size, 50);
/// assert!(config.is_enabled());
///
/// // Caching is off unless a size is configured
/// assert!(!CacheConfig::default().is_enabled());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheConfig {
    pub max_size: i32,
    pub name: Option<String>,
}

impl CacheConfig {
    pub fn new(max_size: i32) -> Self {
        Self {
            max_size,
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.max_size >= 1
    }
}
