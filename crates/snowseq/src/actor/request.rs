use tokio::sync::oneshot;

use crate::id::SnowflakeId;

/// A message to the ID actor.
#[derive(Debug)]
pub enum IdRequest {
    /// Produce one ID and send it back on `reply`.
    ///
    /// If the caller stops waiting, the ID is still produced and then
    /// discarded.
    Generate { reply: oneshot::Sender<SnowflakeId> },
    /// Stop the actor once every earlier request has been answered.
    Shutdown { response: oneshot::Sender<()> },
}
