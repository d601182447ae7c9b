//! Error types for the gRPC front door.
//!
//! [`Error`] wraps failures from the core library together with the
//! service's own rejections, and converts into a [`tonic::Status`] with a
//! code a client can act on.
//!
//! ## Status Codes
//! - `NOT_FOUND`: the counter key was never initialized.
//! - `DATA_LOSS`: the stored counter is not an integer.
//! - `INVALID_ARGUMENT`: the request is malformed.
//! - `ABORTED`: contention exceeded the configured attempt cap.
//! - `UNAVAILABLE`: the store or ID actor is down, or the service is shutting
//!   down.

use tonic::Status;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the gRPC service.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// Failure from the counter service or ID actor.
    #[error(transparent)]
    Core(#[from] snowseq::Error),

    /// The client request was invalid.
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// The service is in the process of shutting down.
    #[error("Service is shutting down")]
    ServiceShutdown,
}

impl From<Error> for Status {
    fn from(err: Error) -> Self {
        match err {
            Error::Core(e) => match e {
                snowseq::Error::NotFound { .. } => Status::not_found(e.to_string()),
                snowseq::Error::Corrupt { .. } => Status::data_loss(e.to_string()),
                snowseq::Error::InvalidKey { .. } => Status::invalid_argument(e.to_string()),
                snowseq::Error::Contended { .. } => Status::aborted(e.to_string()),
                snowseq::Error::Store(_) | snowseq::Error::ActorClosed => {
                    Status::unavailable(e.to_string())
                }
                _ => Status::internal(e.to_string()),
            },
            Error::InvalidRequest { reason } => Status::invalid_argument(reason),
            Error::ServiceShutdown => Status::unavailable("Service is shutting down"),
        }
    }
}

impl Error {
    /// Short label for metrics and logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Core(snowseq::Error::NotFound { .. }) => "not_found",
            Self::Core(snowseq::Error::Corrupt { .. }) => "corrupt",
            Self::Core(snowseq::Error::InvalidKey { .. }) | Self::InvalidRequest { .. } => {
                "invalid_argument"
            }
            Self::Core(snowseq::Error::Contended { .. }) => "contended",
            Self::Core(snowseq::Error::Store(_)) => "store_unavailable",
            Self::Core(snowseq::Error::ActorClosed) | Self::ServiceShutdown => "unavailable",
            Self::Core(_) => "internal",
        }
    }
}
