//! Startup-time node ID acquisition.
//!
//! A node ID either comes from static configuration or is claimed from the
//! coordination store by atomically incrementing a shared bootstrap key.

use crate::{
    counter::DEFAULT_NAMESPACE,
    error::{Error, InitError},
    id::NodeId,
    retry::{RetryPolicy, increment, optimistic_update},
    store::CoordinationStore,
};

/// Default name of the bootstrap key, relative to the namespace.
pub const DEFAULT_BOOTSTRAP_KEY: &str = "snowflake-uuid";

/// Where a node ID came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeIdSource {
    /// Parsed from the static override.
    Static,
    /// Claimed from the coordination store.
    Allocated,
}

/// A node ID together with its origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Acquired {
    pub node: NodeId,
    pub source: NodeIdSource,
}

/// Claims a node ID once per process.
#[derive(Clone, Debug)]
pub struct NodeIdAllocator<S> {
    store: S,
    bootstrap_key: String,
    policy: RetryPolicy,
}

impl<S> NodeIdAllocator<S>
where
    S: CoordinationStore,
{
    /// `bootstrap_key` is the full key, namespace included.
    pub fn new(store: S, bootstrap_key: impl Into<String>, policy: RetryPolicy) -> Self {
        Self {
            store,
            bootstrap_key: bootstrap_key.into(),
            policy,
        }
    }

    /// Uses `<namespace><name>` as the bootstrap key.
    pub fn with_namespace(store: S, namespace: &str, name: &str, policy: RetryPolicy) -> Self {
        Self::new(store, format!("{namespace}{name}"), policy)
    }

    pub fn bootstrap_key(&self) -> &str {
        &self.bootstrap_key
    }

    /// Returns the node ID for this process.
    ///
    /// With `static_override` the store is never contacted. Otherwise the
    /// bootstrap key is created with value `0` by a create-if-absent
    /// compare-and-swap and then incremented with compare-and-swap; the new
    /// value modulo 1024 is the node ID.
    ///
    /// # Errors
    ///
    /// Every error is fatal for startup:
    /// - [`InitError::InvalidNodeId`] if the override is not an integer.
    /// - [`InitError::Corrupt`] if the bootstrap key holds a non-integer.
    /// - [`InitError::Store`] if the store cannot be reached. This is not
    ///   retried.
    /// - [`InitError::Contended`] only when an attempt cap is configured.
    pub async fn acquire(&self, static_override: Option<&str>) -> Result<Acquired, InitError> {
        let acquired = match static_override {
            Some(raw) => Acquired {
                node: raw.parse()?,
                source: NodeIdSource::Static,
            },
            None => Acquired {
                node: self.allocate().await?,
                source: NodeIdSource::Allocated,
            },
        };

        #[cfg(feature = "tracing")]
        tracing::info!(
            node_id = acquired.node.get(),
            source = ?acquired.source,
            "node id acquired"
        );

        Ok(acquired)
    }

    async fn allocate(&self) -> Result<NodeId, InitError> {
        let key = self.bootstrap_key.as_str();

        loop {
            if self.store.get(key).await?.is_none() {
                // Losing this race means another process created the key.
                if self.store.cas(key, "0", 0).await? {
                    #[cfg(feature = "tracing")]
                    tracing::info!(key, "created node id bootstrap key");
                }
            }

            match optimistic_update(&self.store, key, &self.policy, increment).await {
                Ok(updated) => {
                    return Ok(NodeId::new(
                        updated.value.rem_euclid(NodeId::CAPACITY as i64) as u64,
                    ));
                }
                // Deleted between creation and the update; create it again.
                Err(Error::NotFound { .. }) => {}
                Err(err) => return Err(init_error(err)),
            }
        }
    }

    /// Allocator over `store` using the default namespace and key.
    pub fn with_defaults(store: S) -> Self {
        Self::with_namespace(
            store,
            DEFAULT_NAMESPACE,
            DEFAULT_BOOTSTRAP_KEY,
            RetryPolicy::default(),
        )
    }
}

fn init_error(err: Error) -> InitError {
    match err {
        Error::Corrupt { key, value } => InitError::Corrupt { key, value },
        Error::Store(e) => InitError::Store(e),
        Error::Contended { key, attempts } => InitError::Contended { key, attempts },
        other => InitError::Unexpected(other),
    }
}
