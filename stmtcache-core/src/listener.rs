//! # Eviction Listeners
//!
//! Observers told about every delegate the cache gives up, whether through
//! capacity-driven eviction or an explicit clear. A listener owns the real
//! disposal of the delegate (closing the driver statement, freeing a server
//! cursor), so its failures are propagated to whoever triggered the removal.
//!
//! # Examples
//!
//! ```rust
//! use stmtcache_core::{EvictionListeners, ListenerError};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let closed = Arc::new(AtomicUsize::new(0));
//! let counter = closed.clone();
//!
//! let mut listeners: EvictionListeners<u32> = EvictionListeners::new();
//! listeners.register(Arc::new(move |_stmt: &u32| -> Result<(), ListenerError> {
//!     counter.fetch_add(1, Ordering::SeqCst);
//!     Ok(())
//! }));
//!
//! listeners.notify_all(&7).unwrap();
//! assert_eq!(closed.load(Ordering::SeqCst), 1);
//! ```

use crate::error::ListenerError;
use std::fmt;
use std::sync::Arc;

/// Receives delegates that left the cache and releases the underlying resource.
pub trait EvictionListener<D>: Send + Sync {
    fn on_eviction(&self, delegate: &D) -> Result<(), ListenerError>;
}

impl<D, F> EvictionListener<D> for F
where
    F: Fn(&D) -> Result<(), ListenerError> + Send + Sync,
{
    fn on_eviction(&self, delegate: &D) -> Result<(), ListenerError> {
        self(delegate)
    }
}

/// Ordered list of eviction listeners.
///
/// Registration order is notification order. The same listener may be
/// registered more than once and is then notified once per registration.
pub struct EvictionListeners<D> {
    listeners: Vec<Arc<dyn EvictionListener<D>>>,
}

impl<D> EvictionListeners<D> {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn register(&mut self, listener: Arc<dyn EvictionListener<D>>) {
        self.listeners.push(listener);
    }

    /// Removes the first registration of `listener` (compared by pointer).
    ///
    /// Returns `true` if a registration was removed.
    pub fn unregister(&mut self, listener: &Arc<dyn EvictionListener<D>>) -> bool {
        match self
            .listeners
            .iter()
            .position(|registered| Arc::ptr_eq(registered, listener))
        {
            Some(pos) => {
                self.listeners.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Invokes every listener with `delegate`, in registration order.
    ///
    /// Stops at the first listener that fails and returns its error; later
    /// listeners are not invoked for this delegate.
    pub fn notify_all(&self, delegate: &D) -> Result<(), ListenerError> {
        for listener in &self.listeners {
            listener.on_eviction(delegate)?;
        }
        Ok(())
    }
}

impl<D> Default for EvictionListeners<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> fmt::Debug for EvictionListeners<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvictionListeners")
            .field("len", &self.listeners.len())
            .finish()
    }
}
