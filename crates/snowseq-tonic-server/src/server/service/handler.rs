//! gRPC service implementation for counters and Snowflake IDs.
//!
//! This module defines [`IdService`], the concrete implementation of the
//! [`Snowflake`] gRPC service defined in the protobuf definition.
//!
//! ## Responsibilities
//!
//! - Acquire this process's node ID and spawn the ID actor.
//! - Route `Next` to the counter service and `GenerateOne` to the actor.
//! - Map failures to gRPC status codes and record metrics.
//! - Refuse new work and drain in-flight requests on shutdown.

use crate::server::{
    service::config::ServiceConfig,
    telemetry::{
        decrement_requests_inflight, increment_counter_increments, increment_errors,
        increment_ids_generated, increment_requests, increment_requests_inflight,
        record_cas_conflicts, record_request_duration,
    },
};
use core::time::Duration;
use portable_atomic::{AtomicUsize, Ordering};
use snowseq_tonic_core::{
    Error,
    proto::{Key, NullRequest, Uuid, Value, snowflake_server::Snowflake},
    snowseq::{
        ActorStats, CoordinationStore, CounterService, IdActor, IdActorHandle, InitError, NodeId,
        NodeIdAllocator, SnowflakeGenerator,
    },
    types::{Clock, Generator},
};
use std::{sync::Arc, time::Instant};
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tonic::{Request, Response, Status};

/// gRPC service handing out counter values and Snowflake IDs.
///
/// Cloning is cheap; all clones share the counter service, the ID actor and
/// the shutdown state.
#[derive(Clone)]
pub struct IdService<S> {
    counters: CounterService<S>,
    actor: IdActorHandle,
    node: NodeId,
    shutdown_token: CancellationToken,
    inflight: Arc<AtomicUsize>,
    shutdown_timeout: Duration,
}

impl<S> IdService<S>
where
    S: CoordinationStore + Clone + 'static,
{
    /// Acquires a node ID (from `config.machine_id` or the store) and
    /// builds the service around it.
    ///
    /// # Errors
    ///
    /// Any [`InitError`] means the process must not start serving.
    pub async fn bootstrap(store: S, config: ServiceConfig) -> Result<Self, InitError> {
        let allocator = NodeIdAllocator::with_namespace(
            store.clone(),
            &config.namespace,
            &config.uuid_key,
            config.retry,
        );
        let acquired = allocator.acquire(config.machine_id.as_deref()).await?;

        Ok(Self::new(store, acquired.node, config))
    }

    /// Builds the service for an already known node ID and spawns the ID
    /// actor.
    pub fn new(store: S, node: NodeId, config: ServiceConfig) -> Self {
        let generator: Generator = SnowflakeGenerator::new(node, Clock::default());
        let actor = IdActor::spawn(generator, config.queue_capacity);

        Self {
            counters: CounterService::new(store, config.namespace, config.retry),
            actor,
            node,
            shutdown_token: CancellationToken::new(),
            inflight: Arc::new(AtomicUsize::new(0)),
            shutdown_timeout: config.shutdown_timeout,
        }
    }

    pub const fn node(&self) -> NodeId {
        self.node
    }

    pub fn actor_stats(&self) -> Arc<ActorStats> {
        self.actor.shared_stats()
    }

    /// Gracefully shuts the service down.
    ///
    /// - Refuses new requests.
    /// - Waits up to the configured timeout for in-flight requests.
    /// - Stops the ID actor after it has answered everything queued.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor had already stopped.
    pub async fn shutdown(&self) -> Result<(), Error> {
        // === Phase 0: Stop accepting new requests ===
        #[cfg(feature = "tracing")]
        tracing::info!("Refusing new requests");
        self.shutdown_token.cancel();

        // === Phase 1: Wait for in-flight requests to drain ===
        #[cfg(feature = "tracing")]
        tracing::info!(
            "Draining in-flight requests ({} active)",
            self.inflight.load(Ordering::Relaxed)
        );
        let drained = timeout(self.shutdown_timeout, async {
            while self.inflight.load(Ordering::Relaxed) > 0 {
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await;

        match drained {
            Ok(()) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("All in-flight requests drained");
            }
            Err(_) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    "Graceful drain timed out ({} requests still active)",
                    self.inflight.load(Ordering::Relaxed)
                );
            }
        }

        // === Phase 2: Stop the actor ===
        #[cfg(feature = "tracing")]
        tracing::debug!("Stopping the id actor");
        self.actor.shutdown().await.map_err(Error::from)
    }

    fn admit(&self) -> Result<InflightGuard, Error> {
        if self.shutdown_token.is_cancelled() {
            return Err(Error::ServiceShutdown);
        }
        Ok(InflightGuard::new(Arc::clone(&self.inflight)))
    }

    fn fail(rpc: &'static str, err: Error) -> Status {
        increment_errors(rpc, err.kind());
        #[cfg(feature = "tracing")]
        tracing::warn!(rpc, kind = err.kind(), "request failed: {err}");
        err.into()
    }
}

#[tonic::async_trait]
impl<S> Snowflake for IdService<S>
where
    S: CoordinationStore + Clone + 'static,
{
    /// Increments the named counter.
    ///
    /// If `metrics` is enabled, emits telemetry for:
    /// - request rate and duration, failed requests included
    /// - successful increments
    /// - lost compare-and-swap races
    /// - errors by kind
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(name = %req.get_ref().name)))]
    async fn next(&self, req: Request<Key>) -> Result<Response<Value>, Status> {
        const RPC: &str = "next";
        let _timer = RequestTimer::start(RPC);
        increment_requests(RPC);
        let _guard = self.admit().map_err(|e| Self::fail(RPC, e))?;

        let name = req.into_inner().name;
        let updated = self
            .counters
            .next_detailed(&name)
            .await
            .map_err(|e| Self::fail(RPC, e.into()))?;

        increment_counter_increments();
        record_cas_conflicts(updated.conflicts());

        Ok(Response::new(Value {
            value: updated.value,
        }))
    }

    /// Returns one Snowflake ID from this node's actor.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
    async fn generate_one(&self, _req: Request<NullRequest>) -> Result<Response<Uuid>, Status> {
        const RPC: &str = "generate_one";
        let _timer = RequestTimer::start(RPC);
        increment_requests(RPC);
        let _guard = self.admit().map_err(|e| Self::fail(RPC, e))?;

        let id = self
            .actor
            .generate_one()
            .await
            .map_err(|e| Self::fail(RPC, e.into()))?;

        increment_ids_generated(1);

        Ok(Response::new(Uuid { uuid: id.to_raw() }))
    }
}

/// Records a request's duration when dropped, whether it succeeded or not.
struct RequestTimer {
    rpc: &'static str,
    start: Instant,
    record: fn(&'static str, f64),
}

impl RequestTimer {
    fn start(rpc: &'static str) -> Self {
        Self::with_recorder(rpc, record_request_duration)
    }

    fn with_recorder(rpc: &'static str, record: fn(&'static str, f64)) -> Self {
        Self {
            rpc,
            start: Instant::now(),
            record,
        }
    }
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        (self.record)(self.rpc, self.start.elapsed().as_secs_f64() * 1_000.0);
    }
}

/// Counts a request as in flight until dropped.
struct InflightGuard {
    inflight: Arc<AtomicUsize>,
}

impl InflightGuard {
    fn new(inflight: Arc<AtomicUsize>) -> Self {
        inflight.fetch_add(1, Ordering::Relaxed);
        increment_requests_inflight();
        Self { inflight }
    }
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        self.inflight.fetch_sub(1, Ordering::Relaxed);
        decrement_requests_inflight();
    }
}
