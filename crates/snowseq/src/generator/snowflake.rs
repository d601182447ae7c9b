use core::cmp::Ordering;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    generator::{PendingCause, Poll},
    id::{NodeId, SnowflakeId},
    time::TimeSource,
};

/// A single-owner Snowflake ID generator.
///
/// The generator holds the only copy of the per-node state (the last issued
/// timestamp and its sequence number) and is mutated through `&mut self`, so
/// it must be owned by exactly one task. [`IdActor`] provides that owner for
/// concurrent callers.
///
/// ## Behavior
///
/// - A newer millisecond restarts the sequence at zero.
/// - Within one millisecond the sequence counts up to 4095, after which the
///   generator waits for the next millisecond.
/// - A clock reading older than the last issued timestamp is waited out; the
///   timestamp component of issued IDs never decreases.
///
/// [`IdActor`]: crate::actor::IdActor
#[derive(Debug)]
pub struct SnowflakeGenerator<T>
where
    T: TimeSource,
{
    node: NodeId,
    last_timestamp: u64,
    sequence: u16,
    time: T,
}

impl<T> SnowflakeGenerator<T>
where
    T: TimeSource,
{
    /// Creates a new [`SnowflakeGenerator`] for the given node.
    ///
    /// The first ID produced carries sequence zero at the clock's current
    /// millisecond.
    ///
    /// # Example
    /// ```
    /// use snowseq::{NodeId, SnowflakeGenerator, SystemClock};
    ///
    /// let mut generator = SnowflakeGenerator::new(NodeId::new(3), SystemClock);
    /// let id = generator.next_id(|_, _| std::thread::yield_now());
    /// assert_eq!(id.node_id(), 3);
    /// ```
    pub fn new(node: NodeId, time: T) -> Self {
        // Starting "exhausted" at timestamp zero makes the very first poll
        // take the new-millisecond branch.
        Self::from_components(0, node, SnowflakeId::SEQUENCE_MASK as u16, time)
    }

    /// Creates a generator from explicit state.
    ///
    /// This constructor is primarily useful for tests that need to start the
    /// generator at a given point.
    pub fn from_components(last_timestamp: u64, node: NodeId, sequence: u16, time: T) -> Self {
        debug_assert!(u64::from(sequence) <= SnowflakeId::SEQUENCE_MASK);
        Self {
            node,
            last_timestamp,
            sequence,
            time,
        }
    }

    /// The node this generator stamps into every ID.
    pub const fn node(&self) -> NodeId {
        self.node
    }

    /// The timestamp of the most recently issued ID.
    pub const fn last_timestamp(&self) -> u64 {
        self.last_timestamp
    }

    /// Generates a new ID, calling `f` every time the generator has to wait
    /// for the clock.
    ///
    /// `f` receives the minimum wait in milliseconds and the reason. It may
    /// spin, yield or sleep; the clock is re-read after it returns.
    ///
    /// # Example
    /// ```
    /// use snowseq::{NodeId, SnowflakeGenerator, SystemClock};
    ///
    /// let mut generator = SnowflakeGenerator::new(NodeId::new(0), SystemClock);
    /// let a = generator.next_id(|_, _| core::hint::spin_loop());
    /// let b = generator.next_id(|_, _| core::hint::spin_loop());
    /// assert!(a < b);
    /// ```
    pub fn next_id(&mut self, mut f: impl FnMut(u64, PendingCause)) -> SnowflakeId {
        loop {
            match self.poll_id() {
                Poll::Ready { id } => break id,
                Poll::Pending { yield_for, cause } => f(yield_for, cause),
            }
        }
    }

    /// Attempts to generate the next ID without waiting.
    ///
    /// Returns [`Poll::Ready`] with a new ID, or [`Poll::Pending`] when the
    /// clock has to advance first. A pending poll leaves the state untouched.
    ///
    /// # Example
    /// ```
    /// use snowseq::{NodeId, Poll, SnowflakeGenerator, SystemClock};
    ///
    /// let mut generator = SnowflakeGenerator::new(NodeId::new(0), SystemClock);
    ///
    /// let id = loop {
    ///     match generator.poll_id() {
    ///         Poll::Ready { id } => break id,
    ///         Poll::Pending { .. } => std::thread::yield_now(),
    ///     }
    /// };
    /// assert_eq!(id.sequence(), 0);
    /// ```
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn poll_id(&mut self) -> Poll {
        let now = self.time.current_millis();

        match now.cmp(&self.last_timestamp) {
            Ordering::Equal => {
                if u64::from(self.sequence) < SnowflakeId::SEQUENCE_MASK {
                    self.sequence += 1;
                    Poll::Ready { id: self.current() }
                } else {
                    Poll::Pending {
                        yield_for: 1,
                        cause: PendingCause::SequenceExhausted,
                    }
                }
            }
            Ordering::Greater => {
                self.last_timestamp = now;
                self.sequence = 0;
                Poll::Ready { id: self.current() }
            }
            Ordering::Less => Self::cold_clock_behind(now, self.last_timestamp),
        }
    }

    fn current(&self) -> SnowflakeId {
        SnowflakeId::assemble(self.last_timestamp, self.node, self.sequence)
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(now: u64, last_timestamp: u64) -> Poll {
        Poll::Pending {
            yield_for: last_timestamp - now,
            cause: PendingCause::ClockRegressed,
        }
    }
}
