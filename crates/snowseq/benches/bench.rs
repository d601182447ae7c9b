use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use futures::future::try_join_all;
use snowseq::{
    CounterService, DEFAULT_NAMESPACE, DEFAULT_QUEUE_CAPACITY, IdActor, MemoryStore, NodeId, Poll,
    RetryPolicy, SnowflakeGenerator, SystemClock, TimeSource,
};
use std::{sync::Arc, time::Instant};
use tokio::runtime::Builder;

struct FixedMockTime {
    millis: u64,
}

impl TimeSource for FixedMockTime {
    fn current_millis(&self) -> u64 {
        self.millis
    }
}

// Number of IDs generated per benchmark iteration. One full millisecond of
// sequence space.
const TOTAL_IDS: usize = 4096;

/// Benchmarks the hot path where every poll is `Ready`.
fn benchmark_mock_sequential(c: &mut Criterion) {
    let mut group = c.benchmark_group("mock/sequential/generator");
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    group.bench_function(format!("elems/{TOTAL_IDS}"), |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();

            for _ in 0..iters {
                let mut generator =
                    SnowflakeGenerator::new(NodeId::new(0), FixedMockTime { millis: 1 });
                for _ in 0..TOTAL_IDS {
                    match generator.poll_id() {
                        Poll::Ready { id } => {
                            black_box(id);
                        }
                        Poll::Pending { .. } => unreachable!(),
                    }
                }
            }

            start.elapsed()
        });
    });

    group.finish();
}

/// Benchmarks the generator against the wall clock, spinning while pending.
fn benchmark_system_sequential(c: &mut Criterion) {
    let mut group = c.benchmark_group("system/sequential/generator");
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    group.bench_function(format!("elems/{TOTAL_IDS}"), |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();

            for _ in 0..iters {
                let mut generator = SnowflakeGenerator::new(NodeId::new(0), SystemClock);
                for _ in 0..TOTAL_IDS {
                    black_box(generator.next_id(|_, _| core::hint::spin_loop()));
                }
            }

            start.elapsed()
        });
    });

    group.finish();
}

/// Benchmarks request/reply round trips through the ID actor from a growing
/// number of concurrent callers.
fn benchmark_actor_callers(c: &mut Criterion) {
    let mut group = c.benchmark_group("system/actor");
    group.sample_size(10);
    group.sampling_mode(criterion::SamplingMode::Flat);

    let total_ids = TOTAL_IDS * 64;

    for callers in [1, 4, 16, 64, 256] {
        let ids_per_caller = total_ids / callers;

        group.throughput(Throughput::Elements(total_ids as u64));
        group.bench_function(format!("elems/{total_ids}/callers/{callers}"), |b| {
            let rt = Builder::new_multi_thread().enable_all().build().unwrap();

            b.to_async(&rt).iter_custom(move |iters| async move {
                let actor = IdActor::spawn(
                    SnowflakeGenerator::new(NodeId::new(0), SystemClock),
                    DEFAULT_QUEUE_CAPACITY,
                );
                let start = Instant::now();

                for _ in 0..iters {
                    let tasks: Vec<_> = (0..callers)
                        .map(|_| {
                            let actor = actor.clone();
                            tokio::spawn(async move {
                                for _ in 0..ids_per_caller {
                                    black_box(actor.generate_one().await.unwrap());
                                }
                            })
                        })
                        .collect();

                    try_join_all(tasks).await.unwrap();
                }

                let elapsed = start.elapsed();
                actor.shutdown().await.unwrap();
                elapsed
            });
        });
    }

    group.finish();
}

/// Benchmarks contended counter increments against the in-memory store.
fn benchmark_memory_counter(c: &mut Criterion) {
    let mut group = c.benchmark_group("memory/counter");
    group.sample_size(10);

    const INCREMENTS: usize = 1024;

    for callers in [1, 8, 32] {
        let per_caller = INCREMENTS / callers;

        group.throughput(Throughput::Elements(INCREMENTS as u64));
        group.bench_function(format!("elems/{INCREMENTS}/callers/{callers}"), |b| {
            let rt = Builder::new_multi_thread().enable_all().build().unwrap();

            b.to_async(&rt).iter_custom(move |iters| async move {
                let store = Arc::new(MemoryStore::new());
                store.seed("seqs/bench", "0");
                let counters = CounterService::new(
                    store,
                    DEFAULT_NAMESPACE,
                    RetryPolicy::default().with_max_backoff(core::time::Duration::from_micros(50)),
                );
                let start = Instant::now();

                for _ in 0..iters {
                    let tasks: Vec<_> = (0..callers)
                        .map(|_| {
                            let counters = counters.clone();
                            tokio::spawn(async move {
                                for _ in 0..per_caller {
                                    black_box(counters.next("bench").await.unwrap());
                                }
                            })
                        })
                        .collect();

                    try_join_all(tasks).await.unwrap();
                }

                start.elapsed()
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_mock_sequential,
    benchmark_system_sequential,
    benchmark_actor_callers,
    benchmark_memory_counter,
);
criterion_main!(benches);
