use std::fmt;
use std::hash::{Hash, Hasher};

/// A statement handle that doubles as its own cache key.
///
/// Equality and hashing must cover only the attributes that define how the
/// statement is prepared; the delegate slot is never part of the identity. A
/// "shell" handle (no delegate attached) built from the same definition is
/// therefore interchangeable with the handle the cache stores.
///
/// The cache writes the tracked delegate into the caller's handle on a hit and
/// reads it back when a handle is offered. `Delegate` should be cheap to clone,
/// typically an `Arc` around the driver statement or a server-side statement id.
///
/// # Examples
///
/// ```
/// use stmtcache_core::{PreparedStatementKey, StatementHandle};
///
/// let mut key: PreparedStatementKey<u32> = PreparedStatementKey::new("SELECT 1");
/// assert!(key.delegate().is_none());
///
/// key.set_delegate(7);
/// assert_eq!(key.delegate(), Some(&7));
/// ```
pub trait StatementHandle: Clone + Eq + Hash + fmt::Display {
    type Delegate: Clone + PartialEq;

    /// The delegate currently attached to this handle, if any.
    fn delegate(&self) -> Option<&Self::Delegate>;

    /// Attaches `delegate` to this handle, replacing any previous one.
    fn set_delegate(&mut self, delegate: Self::Delegate);

    /// Detaches and returns the delegate, leaving a shell handle behind.
    fn take_delegate(&mut self) -> Option<Self::Delegate>;
}

/// Result set scrolling behaviour requested at prepare time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ResultSetType {
    #[default]
    ForwardOnly,
    ScrollInsensitive,
    ScrollSensitive,
}

/// Result set concurrency requested at prepare time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ResultSetConcurrency {
    #[default]
    ReadOnly,
    Updatable,
}

/// Cursor holdability requested at prepare time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Holdability {
    #[default]
    HoldCursorsOverCommit,
    CloseCursorsAtCommit,
}

/// Reference [`StatementHandle`] keyed by the full prepare definition.
///
/// Two keys are equal when the SQL text and every prepare flag match:
/// result set type, concurrency, holdability, auto-generated keys, and the
/// requested generated-key columns (by index or by name).
#[derive(Clone, Debug)]
pub struct PreparedStatementKey<D> {
    sql: String,
    result_set_type: ResultSetType,
    concurrency: ResultSetConcurrency,
    holdability: Holdability,
    auto_generated_keys: bool,
    column_indexes: Option<Vec<u32>>,
    column_names: Option<Vec<String>>,
    delegate: Option<D>,
}

impl<D> PreparedStatementKey<D> {
    /// Creates a shell key for `sql` with default prepare flags and no delegate.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            result_set_type: ResultSetType::default(),
            concurrency: ResultSetConcurrency::default(),
            holdability: Holdability::default(),
            auto_generated_keys: false,
            column_indexes: None,
            column_names: None,
            delegate: None,
        }
    }

    pub fn result_set_type(mut self, result_set_type: ResultSetType) -> Self {
        self.result_set_type = result_set_type;
        self
    }

    pub fn concurrency(mut self, concurrency: ResultSetConcurrency) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn holdability(mut self, holdability: Holdability) -> Self {
        self.holdability = holdability;
        self
    }

    pub fn auto_generated_keys(mut self, enabled: bool) -> Self {
        self.auto_generated_keys = enabled;
        self
    }

    pub fn column_indexes(mut self, indexes: Vec<u32>) -> Self {
        self.column_indexes = Some(indexes);
        self
    }

    pub fn column_names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.column_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Attaches a delegate, for handing a freshly prepared statement to the cache.
    pub fn with_delegate(mut self, delegate: D) -> Self {
        self.delegate = Some(delegate);
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }
}

impl<D> PartialEq for PreparedStatementKey<D> {
    fn eq(&self, other: &Self) -> bool {
        self.sql == other.sql
            && self.result_set_type == other.result_set_type
            && self.concurrency == other.concurrency
            && self.holdability == other.holdability
            && self.auto_generated_keys == other.auto_generated_keys
            && self.column_indexes == other.column_indexes
            && self.column_names == other.column_names
    }
}

impl<D> Eq for PreparedStatementKey<D> {}

impl<D> Hash for PreparedStatementKey<D> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sql.hash(state);
        self.result_set_type.hash(state);
        self.concurrency.hash(state);
        self.holdability.hash(state);
        self.auto_generated_keys.hash(state);
        self.column_indexes.hash(state);
        self.column_names.hash(state);
    }
}

impl<D> fmt::Display for PreparedStatementKey<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

impl<D: Clone + PartialEq> StatementHandle for PreparedStatementKey<D> {
    type Delegate = D;

    fn delegate(&self) -> Option<&D> {
        self.delegate.as_ref()
    }

    fn set_delegate(&mut self, delegate: D) {
        self.delegate = Some(delegate);
    }

    fn take_delegate(&mut self) -> Option<D> {
        self.delegate.take()
    }
}
