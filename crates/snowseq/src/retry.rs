//! The read-modify-CAS loop shared by node ID allocation and counters.

use core::time::Duration;

use rand::Rng;

use crate::{
    error::{Error, Result},
    store::{CoordinationStore, KvPair},
};

/// Default upper bound (exclusive) of the random delay after a lost
/// compare-and-swap.
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_millis(100);

/// How to behave after losing a compare-and-swap race.
///
/// Every conflict sleeps for a uniformly random duration in
/// `[0, max_backoff)` and then starts over with a fresh read. With
/// `max_attempts` unset the loop never gives up, so a caller under sustained
/// contention can stall indefinitely.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_backoff: Duration,
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_backoff: DEFAULT_MAX_BACKOFF,
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    /// Caps the number of compare-and-swap attempts.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Sets the backoff upper bound.
    #[must_use]
    pub const fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    /// Draws a random delay in `[0, max_backoff)`.
    pub fn jitter(&self) -> Duration {
        let bound = self.max_backoff.as_micros() as u64;
        if bound == 0 {
            return Duration::ZERO;
        }
        Duration::from_micros(rand::rng().random_range(0..bound))
    }

    fn exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }
}

/// Outcome of a successful [`optimistic_update`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Updated {
    /// The value now stored under the key.
    pub value: i64,
    /// Number of compare-and-swap calls it took, including the winning one.
    pub attempts: u32,
}

impl Updated {
    /// Number of lost races before the winning attempt.
    pub const fn conflicts(&self) -> u32 {
        self.attempts - 1
    }
}

/// Replaces the integer under `key` with `next(current)` using
/// compare-and-swap, retrying with jittered backoff on conflicts.
///
/// Each attempt re-reads the key, so a retry never reuses a stale value or
/// version.
///
/// # Errors
///
/// - [`Error::NotFound`] if the key does not exist.
/// - Whatever `next` returns, which aborts the loop.
/// - [`Error::Contended`] if `policy.max_attempts` is reached.
/// - [`Error::Store`] on any store failure. Store failures are not retried.
pub async fn optimistic_update<S, F>(
    store: &S,
    key: &str,
    policy: &RetryPolicy,
    mut next: F,
) -> Result<Updated>
where
    S: CoordinationStore,
    F: FnMut(&KvPair) -> Result<i64>,
{
    let mut attempts = 0_u32;

    loop {
        let pair = store.get(key).await?.ok_or_else(|| Error::NotFound {
            key: key.to_string(),
        })?;
        let value = next(&pair)?;

        attempts += 1;
        if store.cas(key, &value.to_string(), pair.version).await? {
            return Ok(Updated { value, attempts });
        }

        if policy.exhausted(attempts) {
            #[cfg(feature = "tracing")]
            tracing::warn!(key, attempts, "giving up after repeated cas conflicts");
            return Err(Error::Contended {
                key: key.to_string(),
                attempts,
            });
        }

        let delay = policy.jitter();
        #[cfg(feature = "tracing")]
        tracing::debug!(key, attempts, ?delay, "cas conflict, backing off");
        tokio::time::sleep(delay).await;
    }
}

/// Parses a stored value as a decimal integer.
///
/// # Errors
///
/// Returns [`Error::Corrupt`] if the value is not an integer.
pub fn parse_counter(pair: &KvPair) -> Result<i64> {
    pair.parse_value().ok_or_else(|| Error::Corrupt {
        key: pair.key.clone(),
        value: pair.value.clone(),
    })
}

/// Parses a stored counter and returns its successor.
///
/// # Errors
///
/// Returns [`Error::Corrupt`] if the value is not an integer or is already
/// `i64::MAX`.
pub fn increment(pair: &KvPair) -> Result<i64> {
    parse_counter(pair)?
        .checked_add(1)
        .ok_or_else(|| Error::Corrupt {
            key: pair.key.clone(),
            value: pair.value.clone(),
        })
}
