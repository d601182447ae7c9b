//! Shared type aliases and defaults for the gRPC service.

use snowseq::{SnowflakeGenerator, SystemClock};

/// The clock every server-side generator reads.
pub type Clock = SystemClock;

/// The generator owned by the server's ID actor.
pub type Generator = SnowflakeGenerator<Clock>;

