use std::{cell::Cell, rc::Rc};

use crate::{NodeId, PendingCause, Poll, SnowflakeGenerator, SnowflakeId, SystemClock, TimeSource};

struct FixedTime {
    millis: u64,
}

impl TimeSource for FixedTime {
    fn current_millis(&self) -> u64 {
        self.millis
    }
}

struct MockStepTime {
    values: Vec<u64>,
    index: Cell<usize>,
}

#[derive(Clone)]
struct SharedMockStepTime {
    clock: Rc<MockStepTime>,
}

impl SharedMockStepTime {
    fn new(values: Vec<u64>) -> Self {
        Self {
            clock: Rc::new(MockStepTime {
                values,
                index: Cell::new(0),
            }),
        }
    }

    fn step(&self) {
        let next = self.clock.index.get() + 1;
        assert!(next < self.clock.values.len(), "mock clock ran out of steps");
        self.clock.index.set(next);
    }
}

impl TimeSource for SharedMockStepTime {
    fn current_millis(&self) -> u64 {
        self.clock.values[self.clock.index.get()]
    }
}

trait PollExt {
    fn unwrap_ready(self) -> SnowflakeId;
    fn unwrap_pending(self) -> (u64, PendingCause);
}

impl PollExt for Poll {
    fn unwrap_ready(self) -> SnowflakeId {
        match self {
            Self::Ready { id } => id,
            Self::Pending { yield_for, cause } => {
                panic!("unexpected pending ({cause:?}, yield for: {yield_for})")
            }
        }
    }

    fn unwrap_pending(self) -> (u64, PendingCause) {
        match self {
            Self::Ready { id } => panic!("unexpected ready ({id})"),
            Self::Pending { yield_for, cause } => (yield_for, cause),
        }
    }
}

#[test]
fn first_id_starts_at_sequence_zero() {
    let mut generator = SnowflakeGenerator::new(NodeId::new(1), FixedTime { millis: 42 });
    let id = generator.poll_id().unwrap_ready();

    assert_eq!(id.timestamp(), 42);
    assert_eq!(id.node_id(), 1);
    assert_eq!(id.sequence(), 0);
}

#[test]
fn sequence_increments_within_same_tick() {
    let mut generator = SnowflakeGenerator::new(NodeId::new(1), FixedTime { millis: 42 });

    let id1 = generator.poll_id().unwrap_ready();
    let id2 = generator.poll_id().unwrap_ready();
    let id3 = generator.poll_id().unwrap_ready();

    assert_eq!(id1.timestamp(), 42);
    assert_eq!(id2.timestamp(), 42);
    assert_eq!(id3.timestamp(), 42);
    assert_eq!(id1.sequence(), 0);
    assert_eq!(id2.sequence(), 1);
    assert_eq!(id3.sequence(), 2);
    assert!(id1 < id2 && id2 < id3);
}

#[test]
fn pending_when_sequence_exhausted() {
    let mut generator = SnowflakeGenerator::from_components(
        0,
        NodeId::new(0),
        SnowflakeId::max_sequence() as u16,
        FixedTime { millis: 0 },
    );

    let (yield_for, cause) = generator.poll_id().unwrap_pending();
    assert_eq!(yield_for, 1);
    assert_eq!(cause, PendingCause::SequenceExhausted);
}

#[test]
fn rollover_advances_timestamp_and_resets_sequence() {
    let time = SharedMockStepTime::new(vec![42, 43]);
    let mut generator = SnowflakeGenerator::new(NodeId::new(1), time.clone());

    for i in 0..=SnowflakeId::max_sequence() {
        let id = generator.poll_id().unwrap_ready();
        assert_eq!(id.sequence(), i);
        assert_eq!(id.timestamp(), 42);
    }

    let (yield_for, cause) = generator.poll_id().unwrap_pending();
    assert_eq!(yield_for, 1);
    assert_eq!(cause, PendingCause::SequenceExhausted);

    time.step();

    let id = generator.poll_id().unwrap_ready();
    assert_eq!(id.timestamp(), 43);
    assert_eq!(id.sequence(), 0);
}

#[test]
fn id_4097_in_one_millisecond_waits_for_the_next() {
    let time = SharedMockStepTime::new(vec![7, 7, 8]);
    let mut generator = SnowflakeGenerator::new(NodeId::new(9), time.clone());
    let mut waits = Vec::new();

    let mut last = None;
    for _ in 0..4096 {
        let id = generator.next_id(|_, cause| panic!("unexpected wait: {cause:?}"));
        assert!(last < Some(id));
        last = Some(id);
    }

    let id = generator.next_id(|yield_for, cause| {
        waits.push((yield_for, cause));
        time.step();
    });

    // The first step re-reads the same millisecond, the second one moves on.
    assert_eq!(
        waits,
        vec![
            (1, PendingCause::SequenceExhausted),
            (1, PendingCause::SequenceExhausted)
        ]
    );
    assert_eq!(id.timestamp(), 8);
    assert_eq!(id.sequence(), 0);
    assert!(last < Some(id));
}

#[test]
fn clock_regression_is_waited_out() {
    let time = SharedMockStepTime::new(vec![100, 90, 95, 100]);
    let mut generator = SnowflakeGenerator::new(NodeId::new(2), time.clone());

    let before = generator.poll_id().unwrap_ready();
    assert_eq!(before.timestamp(), 100);

    time.step();
    let (yield_for, cause) = generator.poll_id().unwrap_pending();
    assert_eq!(yield_for, 10);
    assert_eq!(cause, PendingCause::ClockRegressed);
    assert_eq!(generator.last_timestamp(), 100);

    let mut regressions = 0;
    let after = generator.next_id(|_, cause| {
        assert_eq!(cause, PendingCause::ClockRegressed);
        regressions += 1;
        time.step();
    });

    assert_eq!(regressions, 2);
    assert!(after.timestamp() >= before.timestamp());
    assert_eq!(after.timestamp(), 100);
    assert_eq!(after.sequence(), 1);
    assert!(after > before);
}

#[test]
fn node_id_is_embedded_in_every_id() {
    let node = NodeId::new(1023);
    let mut generator = SnowflakeGenerator::new(node, FixedTime { millis: 5 });

    for _ in 0..100 {
        let id = generator.poll_id().unwrap_ready();
        assert_eq!(id.node_id(), 1023);
        assert_eq!(id.to_raw() & (0x3FF << 12), node.positioned());
    }
}

#[test]
fn monotonic_with_system_clock() {
    const TOTAL_IDS: usize = 4096 * 64;

    let mut generator = SnowflakeGenerator::new(NodeId::new(1), SystemClock);
    let mut last = generator.next_id(|_, _| core::hint::spin_loop());

    for _ in 1..TOTAL_IDS {
        let id = generator.next_id(|_, _| core::hint::spin_loop());
        assert!(id > last, "{id:?} is not greater than {last:?}");
        assert!(id.sequence() <= SnowflakeId::max_sequence());
        last = id;
    }
}
