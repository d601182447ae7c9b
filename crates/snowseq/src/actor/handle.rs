use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::{
    actor::{ActorStats, IdRequest, worker::worker_loop},
    error::{Error, Result},
    generator::SnowflakeGenerator,
    id::SnowflakeId,
    time::TimeSource,
};

/// Default bound of the actor's request queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Starts the ID actor.
pub struct IdActor;

impl IdActor {
    /// Moves `generator` into a new Tokio task and returns a handle to it.
    ///
    /// When `capacity` requests are queued, further callers wait for room.
    /// Must be called from within a Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn spawn<T>(generator: SnowflakeGenerator<T>, capacity: usize) -> IdActorHandle
    where
        T: TimeSource + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(capacity);
        let stats = Arc::new(ActorStats::default());
        tokio::spawn(worker_loop(rx, generator, Arc::clone(&stats)));
        IdActorHandle { tx, stats }
    }
}

/// A cloneable handle for requesting IDs from the actor.
#[derive(Clone, Debug)]
pub struct IdActorHandle {
    tx: mpsc::Sender<IdRequest>,
    stats: Arc<ActorStats>,
}

impl IdActorHandle {
    /// Requests one ID and waits for it.
    ///
    /// IDs are handed out in the order requests reach the queue.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ActorClosed`] if the actor has stopped.
    pub async fn generate_one(&self) -> Result<SnowflakeId> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(IdRequest::Generate { reply })
            .await
            .map_err(|_| Error::ActorClosed)?;
        rx.await.map_err(|_| Error::ActorClosed)
    }

    /// Asks the actor to stop and waits until it has.
    ///
    /// Requests queued before this one are still answered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ActorClosed`] if the actor had already stopped.
    pub async fn shutdown(&self) -> Result<()> {
        let (response, rx) = oneshot::channel();
        self.tx
            .send(IdRequest::Shutdown { response })
            .await
            .map_err(|_| Error::ActorClosed)?;
        rx.await.map_err(|_| Error::ActorClosed)
    }

    /// Returns `true` once the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub fn stats(&self) -> &ActorStats {
        &self.stats
    }

    /// Shared ownership of the counters, for exporters that outlive the
    /// handle.
    pub fn shared_stats(&self) -> Arc<ActorStats> {
        Arc::clone(&self.stats)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use portable_atomic::{AtomicU64, Ordering};

    use super::*;
    use crate::{id::NodeId, time::SystemClock};

    /// A clock the test moves by hand.
    #[derive(Debug, Default)]
    struct ManualClock(AtomicU64);

    impl ManualClock {
        fn set(&self, millis: u64) {
            self.0.store(millis, Ordering::Relaxed);
        }
    }

    impl TimeSource for ManualClock {
        fn current_millis(&self) -> u64 {
            self.0.load(Ordering::Relaxed)
        }
    }

    fn system_actor(node: u64) -> IdActorHandle {
        IdActor::spawn(
            SnowflakeGenerator::new(NodeId::new(node), SystemClock),
            DEFAULT_QUEUE_CAPACITY,
        )
    }

    #[tokio::test]
    async fn sequential_ids_strictly_increase() {
        let actor = system_actor(9);

        let mut last = actor.generate_one().await.unwrap();
        assert_eq!(last.node_id(), 9);
        for _ in 0..10_000 {
            let before = SystemClock.current_millis() & SnowflakeId::TIMESTAMP_MASK;
            let id = actor.generate_one().await.unwrap();
            let after = SystemClock.current_millis() & SnowflakeId::TIMESTAMP_MASK;

            assert!(id > last, "{id:?} is not after {last:?}");
            assert!(
                (before..=after).contains(&id.timestamp()),
                "{id:?} stamped outside [{before}, {after}]"
            );
            last = id;
        }
        assert_eq!(actor.stats().issued(), 10_001);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_get_unique_ids() {
        const TASKS: usize = 32;
        const PER_TASK: usize = 500;

        let actor = system_actor(1);

        let handles: Vec<_> = (0..TASKS)
            .map(|_| {
                let actor = actor.clone();
                tokio::spawn(async move {
                    let mut ids = Vec::with_capacity(PER_TASK);
                    for _ in 0..PER_TASK {
                        ids.push(actor.generate_one().await.unwrap());
                    }
                    ids
                })
            })
            .collect();

        let mut seen = HashSet::with_capacity(TASKS * PER_TASK);
        for ids in futures::future::try_join_all(handles).await.unwrap() {
            // Each caller observes its own IDs in increasing order.
            assert!(ids.windows(2).all(|w| w[0] < w[1]));
            for id in ids {
                assert!(seen.insert(id), "duplicate id {id:?}");
            }
        }
        assert_eq!(seen.len(), TASKS * PER_TASK);
    }

    #[tokio::test]
    async fn exhausted_sequence_waits_for_next_millisecond() {
        let clock = Arc::new(ManualClock::default());
        clock.set(50);
        let actor = IdActor::spawn(
            SnowflakeGenerator::new(NodeId::new(0), Arc::clone(&clock)),
            DEFAULT_QUEUE_CAPACITY,
        );

        for seq in 0..=SnowflakeId::max_sequence() {
            let id = actor.generate_one().await.unwrap();
            assert_eq!(id.timestamp(), 50);
            assert_eq!(id.sequence(), seq);
        }

        let waiting = {
            let actor = actor.clone();
            tokio::spawn(async move { actor.generate_one().await.unwrap() })
        };
        while actor.stats().sequence_exhaustions() == 0 {
            tokio::task::yield_now().await;
        }
        assert!(!waiting.is_finished());

        clock.set(51);
        let id = waiting.await.unwrap();
        assert_eq!(id.timestamp(), 51);
        assert_eq!(id.sequence(), 0);
    }

    #[tokio::test]
    async fn clock_regression_is_waited_out() {
        let clock = Arc::new(ManualClock::default());
        clock.set(100);
        let actor = IdActor::spawn(
            SnowflakeGenerator::new(NodeId::new(0), Arc::clone(&clock)),
            DEFAULT_QUEUE_CAPACITY,
        );
        let first = actor.generate_one().await.unwrap();

        clock.set(90);
        let waiting = {
            let actor = actor.clone();
            tokio::spawn(async move { actor.generate_one().await.unwrap() })
        };
        while actor.stats().clock_regressions() == 0 {
            tokio::task::yield_now().await;
        }
        assert!(!waiting.is_finished());

        clock.set(101);
        let second = waiting.await.unwrap();
        assert!(second > first);
        assert_eq!(second.timestamp(), 101);
        assert_eq!(actor.stats().clock_regressions(), 1);
    }

    #[tokio::test]
    async fn abandoned_request_does_not_stop_the_actor() {
        let actor = system_actor(2);

        let (reply, rx) = oneshot::channel();
        drop(rx);
        actor
            .tx
            .send(IdRequest::Generate { reply })
            .await
            .unwrap();

        let id = actor.generate_one().await.unwrap();
        assert_eq!(id.node_id(), 2);
        assert_eq!(actor.stats().issued(), 2);
    }

    #[tokio::test]
    async fn shutdown_closes_the_actor() {
        let actor = system_actor(3);
        actor.generate_one().await.unwrap();

        actor.shutdown().await.unwrap();
        assert!(actor.is_closed());
        assert_eq!(actor.generate_one().await, Err(Error::ActorClosed));
        assert_eq!(actor.shutdown().await, Err(Error::ActorClosed));
    }
}
