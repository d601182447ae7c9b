use crate::{
    error::{Error, Result},
    retry::{RetryPolicy, Updated, increment, optimistic_update},
    store::CoordinationStore,
};

/// Default namespace that counter keys and the bootstrap key live under.
pub const DEFAULT_NAMESPACE: &str = "seqs/";

/// Hands out strictly increasing values per named key.
///
/// Every call round-trips to the store; there is no local caching or
/// batching, so values are strictly increasing across all processes sharing
/// the store. Keys must be created out of band; this service never creates
/// them.
///
/// Cloning is cheap when `S` is, and all methods take `&self`, so one
/// instance can serve any number of concurrent callers.
#[derive(Clone, Debug)]
pub struct CounterService<S> {
    store: S,
    namespace: String,
    policy: RetryPolicy,
}

impl<S> CounterService<S>
where
    S: CoordinationStore,
{
    pub fn new(store: S, namespace: impl Into<String>, policy: RetryPolicy) -> Self {
        Self {
            store,
            namespace: namespace.into(),
            policy,
        }
    }

    /// Full store key for a counter name.
    pub fn key(&self, name: &str) -> String {
        format!("{}{}", self.namespace, name)
    }

    /// Increments the counter `name` and returns its new value.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidKey`] if `name` is empty.
    /// - [`Error::NotFound`] if the key was never initialized.
    /// - [`Error::Corrupt`] if the stored value is not an integer.
    /// - [`Error::Contended`] if an attempt cap is configured and reached.
    /// - [`Error::Store`] if the store fails.
    pub async fn next(&self, name: &str) -> Result<i64> {
        self.next_detailed(name).await.map(|updated| updated.value)
    }

    /// Like [`Self::next`], also reporting how many attempts it took.
    ///
    /// # Errors
    ///
    /// See [`Self::next`].
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip(self)))]
    pub async fn next_detailed(&self, name: &str) -> Result<Updated> {
        if name.is_empty() {
            return Err(Error::InvalidKey {
                reason: "counter name must not be empty".to_string(),
            });
        }

        let key = self.key(name);
        optimistic_update(&self.store, &key, &self.policy, increment).await
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
