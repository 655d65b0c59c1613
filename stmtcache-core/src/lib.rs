//! # Stmtcache Core
//!
//! Core data structures for the stmtcache statement cache.
//!
//! A pooled connection owns one [`LruStatementCache`] so that executing the same
//! statement definition twice on that connection reuses the prepared statement
//! instead of preparing it again. Unlike a textbook LRU cache, statements that
//! are checked out are never evicted; the cache may temporarily grow past its
//! configured size and shrinks back once statements are returned.
//!
//! ## Features
//!
//! - **Usage-aware eviction**: only statements nobody holds are evicted
//! - **Strict LRU order**: eviction candidates are scanned oldest first
//! - **O(1) touch and removal**: entries kept in a `hashlink::LinkedHashMap` in access order
//! - **Eviction listeners**: every disposed delegate is handed to registered listeners
//! - **Protocol checks**: double releases and foreign delegates are reported as errors
//! - **Statistics**: optional hit/miss/eviction counters (with `stats` feature)
//!
//! ## Module Organization
//!
//! - [`handle`] - The statement handle trait and a reference key implementation
//! - [`listener`] - Eviction listener trait and registry
//! - `statement_cache` - The cache itself
//! - `shared` - Mutex-protected cache shared across threads
//!
mod config;
mod error;
mod shared;
mod statement_cache;
mod tracker;

pub mod handle;
pub mod listener;

#[cfg(feature = "stats")]
mod stats;

pub use config::CacheConfig;
pub use error::{CacheError, ListenerError, OfferError, Result};
pub use handle::{
    Holdability, PreparedStatementKey, ResultSetConcurrency, ResultSetType, StatementHandle,
};
pub use listener::{EvictionListener, EvictionListeners};
pub use shared::SharedStatementCache;
pub use statement_cache::{LruStatementCache, Offer};
pub use tracker::StatementTracker;

#[cfg(feature = "stats")]
pub use stats::CacheStats;
