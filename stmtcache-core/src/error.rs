use std::fmt;
use thiserror::Error;

/// Boxed error returned by an eviction listener that failed to dispose a delegate.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by the statement cache.
///
/// Protocol violations are reported instead of being clamped away: a usage count
/// that would go negative or a delegate that does not match the tracked one points
/// to a double release in the connection layer.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("statement <{key}> returned more times than it was delivered (usage count already 0)")]
    UsageUnderflow { key: String },

    #[error("statement <{key}> returned with a delegate that differs from the cached one")]
    DelegateMismatch { key: String },

    #[error("statement <{key}> offered for caching without a delegate")]
    MissingDelegate { key: String },

    #[error("eviction listener failed: {0}")]
    Listener(#[source] ListenerError),
}

impl CacheError {
    /// Returns true for errors caused by a caller breaking the lookup/offer protocol.
    pub fn is_protocol_violation(&self) -> bool {
        !matches!(self, CacheError::Listener(_))
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;

/// A failed `offer`, carrying the offered handle back to the caller.
///
/// For protocol violations the cache did not keep the handle, so the caller
/// still owns its delegate and is responsible for closing it. For
/// [`CacheError::Listener`] the statement itself was accepted and is tracked;
/// the failure belongs to the eviction the offer triggered.
#[derive(Error)]
#[error("{error}")]
pub struct OfferError<H> {
    error: CacheError,
    key: H,
}

impl<H> OfferError<H> {
    pub(crate) fn new(error: CacheError, key: H) -> Self {
        Self { error, key }
    }

    pub fn error(&self) -> &CacheError {
        &self.error
    }

    pub fn key(&self) -> &H {
        &self.key
    }

    /// Gives the handle back, discarding the error.
    pub fn into_key(self) -> H {
        self.key
    }

    pub fn into_parts(self) -> (CacheError, H) {
        (self.error, self.key)
    }
}

impl<H> fmt::Debug for OfferError<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OfferError")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<H> From<OfferError<H>> for CacheError {
    fn from(err: OfferError<H>) -> Self {
        err.error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_violation_classification() {
        let underflow = CacheError::UsageUnderflow {
            key: "SELECT 1".to_string(),
        };
        assert!(underflow.is_protocol_violation());

        let listener = CacheError::Listener("close failed".into());
        assert!(!listener.is_protocol_violation());
        assert_eq!(listener.to_string(), "eviction listener failed: close failed");
    }

    #[test]
    fn test_offer_error_hands_key_back() {
        let err = OfferError::new(
            CacheError::DelegateMismatch {
                key: "SELECT 1".to_string(),
            },
            7u32,
        );
        assert!(err.error().is_protocol_violation());
        assert_eq!(*err.key(), 7);
        assert_eq!(
            err.to_string(),
            "statement <SELECT 1> returned with a delegate that differs from the cached one"
        );

        let (error, key) = err.into_parts();
        assert!(matches!(error, CacheError::DelegateMismatch { .. }));
        assert_eq!(key, 7);
    }
}
