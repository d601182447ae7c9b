use core::{fmt, time::Duration};

use anyhow::bail;
use clap::{Parser, ValueEnum};
use snowseq::{DEFAULT_BOOTSTRAP_KEY, DEFAULT_NAMESPACE, DEFAULT_QUEUE_CAPACITY, RetryPolicy};

use crate::server::service::config::ServiceConfig;

/// Which coordination store backs node ID allocation and counters.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// Consul KV over HTTP.
    Consul,
    /// Process-local store. Only useful for development, since nothing is
    /// shared between processes.
    Memory,
}

/// Runtime configuration for the `snowseq-tonic-server` binary.
///
/// All values are parsed from CLI arguments or environment variables (a
/// `.env` file is loaded first).
#[derive(Parser, Debug, Clone)]
#[command(
    name = "snowseq-tonic-server",
    version,
    about = "A gRPC service for Snowflake IDs and monotonic counters"
)]
pub struct CliArgs {
    /// Static node ID for this process. Values above 1023 are masked to 10
    /// bits.
    ///
    /// When unset, a node ID is claimed from the coordination store by
    /// incrementing the bootstrap key. Two processes must never share a
    /// node ID.
    ///
    /// Environment variable: `MACHINE_ID`
    #[arg(long, env = "MACHINE_ID")]
    pub machine_id: Option<String>,

    /// Prefix prepended to every counter name and to the bootstrap key.
    ///
    /// Environment variable: `NAMESPACE`
    #[arg(long, env = "NAMESPACE", default_value_t = String::from(DEFAULT_NAMESPACE))]
    pub namespace: String,

    /// Name of the bootstrap key used to claim node IDs, relative to
    /// `--namespace`.
    ///
    /// Environment variable: `UUID_KEY`
    #[arg(long, env = "UUID_KEY", default_value_t = String::from(DEFAULT_BOOTSTRAP_KEY))]
    pub uuid_key: String,

    /// Coordination store backend.
    ///
    /// Environment variable: `STORE`
    #[arg(long, env = "STORE", value_enum, default_value_t = StoreKind::Consul)]
    pub store: StoreKind,

    /// Address of the Consul agent, with or without a scheme.
    ///
    /// Environment variable: `CONSUL_ADDRESS`
    #[arg(long, env = "CONSUL_ADDRESS", default_value_t = String::from("127.0.0.1:8500"))]
    pub consul_address: String,

    /// Consul ACL token, sent as `X-Consul-Token`.
    ///
    /// Environment variable: `CONSUL_TOKEN`
    #[arg(long, env = "CONSUL_TOKEN", hide_env_values = true)]
    pub consul_token: Option<String>,

    /// Counters to create with value 0 when using the memory store.
    ///
    /// Environment variable: `MEMORY_COUNTERS` (comma separated)
    #[arg(long, env = "MEMORY_COUNTERS", value_delimiter = ',')]
    pub memory_counters: Vec<String>,

    /// Address to listen on (TCP or Unix socket path; use --uds for Unix
    /// socket).
    ///
    /// Example: "0.0.0.0:50051" or "/tmp/snowseq.sock"
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:50051"))]
    pub server_addr: String,

    /// Listen on a Unix socket instead of TCP. If set, `SERVER_ADDR` must be
    /// a file path.
    #[arg(short, long, default_value_t = false)]
    pub uds: bool,

    /// Maximum number of `GenerateOne` requests waiting for the ID actor.
    /// Further requests wait for room.
    ///
    /// Environment variable: `QUEUE_CAPACITY`
    #[arg(long, env = "QUEUE_CAPACITY", default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,

    /// Upper bound, in milliseconds, of the random delay after a lost
    /// compare-and-swap.
    ///
    /// Environment variable: `MAX_BACKOFF_MS`
    #[arg(long, env = "MAX_BACKOFF_MS", default_value_t = 100)]
    pub max_backoff_ms: u64,

    /// Give up after this many conflicting compare-and-swap attempts. When
    /// unset, retries continue until one succeeds.
    ///
    /// Environment variable: `MAX_CAS_ATTEMPTS`
    #[arg(long, env = "MAX_CAS_ATTEMPTS")]
    pub max_cas_attempts: Option<u32>,

    /// Seconds to wait for in-flight requests during shutdown.
    ///
    /// Environment variable: `SHUTDOWN_TIMEOUT`
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value_t = 3)]
    pub shutdown_timeout: u64,
}

/// Connection settings for the coordination store.
#[derive(Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub kind: StoreKind,
    pub consul_address: String,
    pub consul_token: Option<String>,
    pub memory_counters: Vec<String>,
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("kind", &self.kind)
            .field("consul_address", &self.consul_address)
            .field("consul_token", &self.consul_token.as_ref().map(|_| "<redacted>"))
            .field("memory_counters", &self.memory_counters)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_addr: String,
    pub uds: bool,
    pub store: StoreConfig,
    pub service: ServiceConfig,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.namespace.is_empty() {
            bail!("NAMESPACE must not be empty");
        }

        if args.uuid_key.is_empty() {
            bail!("UUID_KEY must not be empty");
        }

        if args.queue_capacity == 0 {
            bail!("QUEUE_CAPACITY must be greater than 0");
        }

        if args.max_backoff_ms == 0 {
            bail!("MAX_BACKOFF_MS must be greater than 0");
        }

        let mut retry =
            RetryPolicy::default().with_max_backoff(Duration::from_millis(args.max_backoff_ms));
        match args.max_cas_attempts {
            Some(0) => bail!("MAX_CAS_ATTEMPTS must be greater than 0 when set"),
            Some(n) => retry = retry.with_max_attempts(n),
            None => {}
        }

        if args.store == StoreKind::Consul && !args.memory_counters.is_empty() {
            bail!("MEMORY_COUNTERS only applies to the memory store");
        }

        Ok(Self {
            server_addr: args.server_addr,
            uds: args.uds,
            store: StoreConfig {
                kind: args.store,
                consul_address: args.consul_address,
                consul_token: args.consul_token,
                memory_counters: args.memory_counters,
            },
            service: ServiceConfig {
                namespace: args.namespace,
                uuid_key: args.uuid_key,
                machine_id: args.machine_id,
                retry,
                queue_capacity: args.queue_capacity,
                shutdown_timeout: Duration::from_secs(args.shutdown_timeout),
            },
        })
    }
}
