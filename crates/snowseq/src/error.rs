/// A result type defaulting to the crate [`enum@Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Failures reported by a [`CoordinationStore`] adapter.
///
/// These are transport or protocol level problems. A lost compare-and-swap
/// race is *not* an error; it is reported as `Ok(false)` by
/// [`CoordinationStore::cas`].
///
/// [`CoordinationStore`]: crate::store::CoordinationStore
/// [`CoordinationStore::cas`]: crate::store::CoordinationStore::cas
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum StoreError {
    /// The store could not be reached.
    #[error("coordination store unavailable: {reason}")]
    Unavailable { reason: String },

    /// The store answered with an unexpected HTTP status.
    #[error("coordination store returned status {status} for `{key}`")]
    Status { key: String, status: u16 },

    /// The store answered, but the response could not be understood.
    #[error("coordination store protocol error for `{key}`: {reason}")]
    Protocol { key: String, reason: String },
}

/// Errors surfaced to callers of the counter service and the ID actor.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The counter key has never been initialized in the store.
    #[error("key `{key}` does not exist, it must be created first")]
    NotFound { key: String },

    /// The stored value is not a decimal integer.
    #[error("malformed value {value:?} stored under `{key}`")]
    Corrupt { key: String, value: String },

    /// The requested counter name is not usable as a key.
    #[error("invalid key: {reason}")]
    InvalidKey { reason: String },

    /// The configured attempt cap was reached before a compare-and-swap won.
    #[error("gave up on `{key}` after {attempts} conflicting attempts")]
    Contended { key: String, attempts: u32 },

    /// The coordination store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The ID actor is no longer running.
    #[error("id actor is not running")]
    ActorClosed,
}

/// Startup failures. Any of these means the service must not start serving.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum InitError {
    /// The static node ID override is not an integer.
    #[error("invalid node id override {value:?}")]
    InvalidNodeId { value: String },

    /// The bootstrap key holds something other than an integer.
    #[error("malformed value {value:?} stored under bootstrap key `{key}`")]
    Corrupt { key: String, value: String },

    /// The store failed while claiming a node ID.
    #[error("node id allocation failed: {0}")]
    Store(#[from] StoreError),

    /// Allocation gave up under contention (only with an attempt cap).
    #[error("node id allocation gave up on `{key}` after {attempts} attempts")]
    Contended { key: String, attempts: u32 },

    /// Allocation failed in a way the bootstrap protocol does not expect.
    #[error("node id allocation failed unexpectedly: {0}")]
    Unexpected(Error),
}
