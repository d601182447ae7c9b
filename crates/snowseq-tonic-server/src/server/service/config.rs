use core::time::Duration;

use snowseq::{DEFAULT_BOOTSTRAP_KEY, DEFAULT_NAMESPACE, DEFAULT_QUEUE_CAPACITY, RetryPolicy};

/// Settings for one [`IdService`] instance.
///
/// [`IdService`]: super::handler::IdService
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Prefix for every counter key and the bootstrap key.
    pub namespace: String,
    /// Bootstrap key name, relative to `namespace`.
    pub uuid_key: String,
    /// Static node ID; when unset a node ID is claimed from the store.
    pub machine_id: Option<String>,
    /// Conflict handling for counters and node ID allocation.
    pub retry: RetryPolicy,
    /// Bound of the ID actor's request queue.
    pub queue_capacity: usize,
    /// How long shutdown waits for in-flight requests.
    pub shutdown_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            uuid_key: DEFAULT_BOOTSTRAP_KEY.to_string(),
            machine_id: None,
            retry: RetryPolicy::default(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            shutdown_timeout: Duration::from_secs(3),
        }
    }
}
