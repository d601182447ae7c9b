//! The task that owns the node's [`SnowflakeGenerator`].
//!
//! Callers never touch the generator directly. They send an [`IdRequest`]
//! over a bounded queue and the single worker task answers each one in
//! arrival order, so every ID this node issues passes through one place.
//!
//! [`SnowflakeGenerator`]: crate::generator::SnowflakeGenerator

mod handle;
mod request;
mod stats;
mod worker;

pub use handle::*;
pub use request::*;
pub use stats::*;
