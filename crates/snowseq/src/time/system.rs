use std::time::{SystemTime, UNIX_EPOCH};

use crate::time::TimeSource;

/// The system wall clock.
///
/// Unlike a monotonic ticker this follows NTP corrections, which is what the
/// generator needs in order to notice the clock stepping backwards.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn current_millis(&self) -> u64 {
        // A clock set before 1970 reads as the epoch itself; the generator
        // then waits for it like any other backward step.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_after_2024() {
        // 2024-01-01T00:00:00Z
        assert!(SystemClock.current_millis() > 1_704_067_200_000);
    }
}
