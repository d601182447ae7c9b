use crate::id::SnowflakeId;

/// Why the generator could not produce an ID right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PendingCause {
    /// The clock reads earlier than the last issued timestamp.
    ClockRegressed,
    /// All 4096 sequence values of the current millisecond are used.
    SequenceExhausted,
}

/// Represents the result of attempting to generate a new Snowflake ID.
///
/// - [`Poll::Ready`] indicates a new ID was successfully generated.
/// - [`Poll::Pending`] means the generator cannot produce a new ID until the
///   clock advances by at least `yield_for` milliseconds.
///
/// This allows non-blocking generation loops and clean backoff strategies.
///
/// # Example
///
/// ```
/// use snowseq::{NodeId, Poll, SnowflakeGenerator, TimeSource};
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1
///     }
/// }
///
/// let mut generator = SnowflakeGenerator::new(NodeId::new(1), FixedTime);
/// match generator.poll_id() {
///     Poll::Ready { id } => println!("ID: {}", id.timestamp()),
///     Poll::Pending { yield_for, cause } => println!("{cause:?}, back off {yield_for}ms"),
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    /// A unique ID was generated and is ready to use.
    Ready {
        /// The generated Snowflake ID.
        id: SnowflakeId,
    },
    /// No ID could be generated at the current clock reading.
    Pending {
        /// Minimum number of milliseconds the clock must advance before an ID
        /// can be produced.
        yield_for: u64,
        /// What is being waited out.
        cause: PendingCause,
    },
}
