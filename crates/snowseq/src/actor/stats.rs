use portable_atomic::{AtomicU64, Ordering};

/// Counters kept by the ID actor.
///
/// Waits are counted once per request, however many times the clock had to
/// be re-read.
#[derive(Debug, Default)]
pub struct ActorStats {
    issued: AtomicU64,
    clock_regressions: AtomicU64,
    sequence_exhaustions: AtomicU64,
}

impl ActorStats {
    /// IDs produced so far, including ones whose caller went away.
    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::Relaxed)
    }

    /// Requests that found the clock behind the last issued timestamp.
    pub fn clock_regressions(&self) -> u64 {
        self.clock_regressions.load(Ordering::Relaxed)
    }

    /// Requests that had to wait for the next millisecond because the
    /// sequence was used up.
    pub fn sequence_exhaustions(&self) -> u64 {
        self.sequence_exhaustions.load(Ordering::Relaxed)
    }

    pub(crate) fn record_issued(&self) {
        self.issued.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_clock_regression(&self) {
        self.clock_regressions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_sequence_exhaustion(&self) {
        self.sequence_exhaustions.fetch_add(1, Ordering::Relaxed);
    }
}
