//! # Stmtcache
//!
//! A usage-aware, least-recently-used cache for prepared statements owned by a
//! pooled database connection.
//!
//! ## Features
//!
//! - **Never evicts in-use statements**: a statement checked out by a caller stays
//!   cached even if the cache has to grow past its configured size
//! - **Converges back to size**: idle statements are evicted oldest first as soon
//!   as the cache is over capacity
//! - **Eviction listeners**: disposed statements are handed to listeners that close them
//! - **Protocol checks**: returning a statement twice is reported, not hidden
//! - **Thread-safe wrapper**: [`SharedStatementCache`] serializes every operation
//!
//! ## Quick Start
//!
//! ```rust
//! use stmtcache::{LruStatementCache, PreparedStatementKey, StatementHandle};
//! use std::sync::Arc;
//!
//! let mut cache: LruStatementCache<PreparedStatementKey<u64>> = LruStatementCache::new(16);
//! cache.add_eviction_listener(Arc::new(|stmt: &u64| -> Result<(), stmtcache::ListenerError> {
//!     println!("closing server statement {}", stmt);
//!     Ok(())
//! }));
//!
//! let sql = "SELECT name FROM users WHERE id = ?";
//!
//! // Miss: prepare the statement and register it with the cache
//! let handle = match cache.lookup(PreparedStatementKey::new(sql)) {
//!     Some(handle) => handle,
//!     None => cache
//!         .offer(PreparedStatementKey::new(sql).with_delegate(42))
//!         .unwrap()
//!         .into_inner(),
//! };
//! // ... execute ..., then close: the statement goes back to the cache
//! cache.offer(handle).unwrap();
//!
//! // Hit: the prepared statement is reused
//! let handle = cache.lookup(PreparedStatementKey::new(sql)).unwrap();
//! assert_eq!(handle.delegate(), Some(&42));
//! cache.offer(handle).unwrap();
//! ```
//!
//! ## Prepare Flags Are Part Of The Key
//!
//! ```rust
//! use stmtcache::{PreparedStatementKey, ResultSetType};
//!
//! let plain: PreparedStatementKey<u64> = PreparedStatementKey::new("SELECT * FROM t");
//! let scrollable = PreparedStatementKey::new("SELECT * FROM t")
//!     .result_set_type(ResultSetType::ScrollInsensitive);
//! assert_ne!(plain, scrollable);
//! ```
//!
//! ## Disabling The Cache
//!
//! A maximum size of zero or less turns every `offer` into a no-op that hands
//! the statement back as [`Offer::NotCached`]; the caller then closes it itself.
//!
//! ```rust
//! use stmtcache::{LruStatementCache, Offer, PreparedStatementKey, StatementHandle};
//!
//! let mut cache = LruStatementCache::new(0);
//! let offered = cache.offer(PreparedStatementKey::new("SELECT 1").with_delegate(1u64));
//! match offered.unwrap() {
//!     Offer::NotCached(handle) => assert_eq!(handle.delegate(), Some(&1)),
//!     Offer::Cached(_) => unreachable!(),
//! }
//! assert!(cache.is_empty());
//! ```
//!
//! ## Error Handling
//!
//! Offering a statement that nobody holds, or with a delegate other than the
//! cached one, fails and leaves the cache untouched. The [`OfferError`] carries
//! the [`CacheError`] and gives the offered handle back, so the caller can close
//! a delegate the cache refused. A failing eviction listener is reported through
//! the `offer` or `clear` call that triggered the eviction.
//!
//! ## Logging
//!
//! The cache logs through the [`log`](https://docs.rs/log) facade: `debug` for
//! deliveries, returns and evictions, `trace` for misses, `warn` for protocol
//! violations. Install any `log` backend to see them.

pub use stmtcache_core::*;
