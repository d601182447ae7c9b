use std::sync::Arc;

use tokio::sync::mpsc;

use crate::{
    actor::{ActorStats, IdRequest},
    generator::{PendingCause, Poll, SnowflakeGenerator},
    id::SnowflakeId,
    time::TimeSource,
};

/// Serves [`IdRequest`]s until a shutdown request arrives or every sender is
/// gone.
pub(crate) async fn worker_loop<T>(
    mut rx: mpsc::Receiver<IdRequest>,
    mut generator: SnowflakeGenerator<T>,
    stats: Arc<ActorStats>,
) where
    T: TimeSource,
{
    #[cfg(feature = "tracing")]
    tracing::debug!(node_id = generator.node().get(), "id actor started");

    while let Some(request) = rx.recv().await {
        match request {
            IdRequest::Generate { reply } => {
                let id = generate(&mut generator, &stats).await;
                // The caller may have given up; the ID is simply dropped.
                if reply.send(id).is_err() {
                    #[cfg(feature = "tracing")]
                    tracing::trace!(%id, "caller went away before the reply");
                }
            }
            IdRequest::Shutdown { response } => {
                #[cfg(feature = "tracing")]
                tracing::debug!("id actor received shutdown signal");

                if response.send(()).is_err() {
                    #[cfg(feature = "tracing")]
                    tracing::error!("id actor failed to acknowledge shutdown");
                }
                break;
            }
        }
    }

    #[cfg(feature = "tracing")]
    tracing::debug!("id actor stopped");
}

/// Polls the generator until it is ready, yielding to the runtime between
/// polls.
#[allow(clippy::used_underscore_binding)]
async fn generate<T>(generator: &mut SnowflakeGenerator<T>, stats: &ActorStats) -> SnowflakeId
where
    T: TimeSource,
{
    let mut regressed = false;
    let mut exhausted = false;

    loop {
        match generator.poll_id() {
            Poll::Ready { id } => {
                stats.record_issued();
                return id;
            }
            Poll::Pending {
                yield_for: _behind,
                cause,
            } => {
                match cause {
                    PendingCause::ClockRegressed if !regressed => {
                        regressed = true;
                        stats.record_clock_regression();
                        #[cfg(feature = "tracing")]
                        tracing::warn!(
                            last_timestamp = generator.last_timestamp(),
                            behind_ms = _behind,
                            "clock moved backwards, waiting for it to catch up"
                        );
                    }
                    PendingCause::SequenceExhausted if !exhausted => {
                        exhausted = true;
                        stats.record_sequence_exhaustion();
                    }
                    _ => {}
                }
                tokio::task::yield_now().await;
            }
        }
    }
}
