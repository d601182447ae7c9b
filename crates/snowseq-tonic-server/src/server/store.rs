//! The coordination store chosen at startup.

use std::sync::Arc;

use snowseq::{ConsulStore, CoordinationStore, KvPair, MemoryStore, StoreError};

use crate::server::config::{StoreConfig, StoreKind};

/// Either backend behind one concrete type, so the service is built once.
#[derive(Clone, Debug)]
pub enum ServerStore {
    Consul(ConsulStore),
    Memory(Arc<MemoryStore>),
}

impl ServerStore {
    /// Builds the configured backend.
    ///
    /// For the memory store every name in `memory_counters` is created under
    /// `namespace` with value `0`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the Consul address is invalid.
    pub fn from_config(config: &StoreConfig, namespace: &str) -> Result<Self, StoreError> {
        match config.kind {
            StoreKind::Consul => {
                let store = ConsulStore::new(&config.consul_address)?;
                let store = match &config.consul_token {
                    Some(token) => store.with_token(token.clone()),
                    None => store,
                };
                Ok(Self::Consul(store))
            }
            StoreKind::Memory => {
                let store = MemoryStore::new();
                for name in &config.memory_counters {
                    store.seed(&format!("{namespace}{name}"), "0");
                }
                Ok(Self::Memory(Arc::new(store)))
            }
        }
    }
}

impl CoordinationStore for ServerStore {
    async fn get(&self, key: &str) -> Result<Option<KvPair>, StoreError> {
        match self {
            Self::Consul(store) => store.get(key).await,
            Self::Memory(store) => store.get(key).await,
        }
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        match self {
            Self::Consul(store) => store.put(key, value).await,
            Self::Memory(store) => store.put(key, value).await,
        }
    }

    async fn cas(&self, key: &str, value: &str, version: u64) -> Result<bool, StoreError> {
        match self {
            Self::Consul(store) => store.cas(key, value, version).await,
            Self::Memory(store) => store.cas(key, value, version).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_config(counters: &[&str]) -> StoreConfig {
        StoreConfig {
            kind: StoreKind::Memory,
            consul_address: String::new(),
            consul_token: None,
            memory_counters: counters.iter().map(ToString::to_string).collect(),
        }
    }

    #[tokio::test]
    async fn memory_store_seeds_counters_under_namespace() {
        let store = ServerStore::from_config(&memory_config(&["orders"]), "seqs/").unwrap();

        let pair = store.get("seqs/orders").await.unwrap().unwrap();
        assert_eq!(pair.value, "0");
        assert!(store.get("orders").await.unwrap().is_none());
    }

    #[test]
    fn consul_store_accepts_bare_address() {
        let config = StoreConfig {
            kind: StoreKind::Consul,
            consul_address: "127.0.0.1:8500".to_string(),
            consul_token: Some("secret".to_string()),
            memory_counters: Vec::new(),
        };
        assert!(matches!(
            ServerStore::from_config(&config, "seqs/"),
            Ok(ServerStore::Consul(_))
        ));
    }
}
