use core::{fmt, hint::black_box};
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use snowseq_tonic_core::{
    proto::{Key, NullRequest, snowflake_client::SnowflakeClient},
    snowseq::SnowflakeId,
};

use futures::stream::{FuturesUnordered, StreamExt};
use std::{
    net::TcpStream,
    process::{Command, Stdio},
    thread,
    time::{Duration, Instant},
};
use tokio::runtime::Builder;
use tonic::{
    codec::CompressionEncoding,
    transport::{Channel, Uri},
};

#[derive(Clone, Copy, Debug)]
enum Compression {
    None,
    Zstd,
    Gzip,
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compression::None => write!(f, "none"),
            Compression::Zstd => write!(f, "zstd"),
            Compression::Gzip => write!(f, "gzip"),
        }
    }
}

impl From<Compression> for Option<CompressionEncoding> {
    fn from(value: Compression) -> Self {
        match value {
            Compression::None => None,
            Compression::Zstd => Some(CompressionEncoding::Zstd),
            Compression::Gzip => Some(CompressionEncoding::Gzip),
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Rpc {
    GenerateOne,
    Next,
}

impl fmt::Display for Rpc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rpc::GenerateOne => write!(f, "generate_one"),
            Rpc::Next => write!(f, "next"),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct GrpcBenchParams {
    rpc: Rpc,
    requests_per_client: usize,
    concurrency: usize,
    compression: Compression,
}

fn grpc_bench(c: &mut Criterion) {
    let uri = Uri::try_from("http://127.0.0.1:50051").expect("Invalid URI");
    // Start the server against the in-memory store. This may require a full
    // compilation so set the timeout high.
    let mut server = Command::new("cargo")
        .args([
            "run",
            "--bin",
            "snowseq-tonic-server",
            "--release",
            "--",
            "--store",
            "memory",
            "--machine-id",
            "1",
            "--memory-counters",
            "bench",
        ])
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("Failed to start snowseq-tonic-server");
    wait_for_port(uri.authority().expect("missing authority").as_str(), 300);

    let rpc_cases = [Rpc::GenerateOne, Rpc::Next];
    let concurrency_cases = [1, 4, 16, 64];
    let compression_cases = [Compression::None, Compression::Zstd, Compression::Gzip];

    // Generate cartesian product of all param combinations
    let mut cases = Vec::new();
    for &rpc in &rpc_cases {
        for &concurrency in &concurrency_cases {
            for &compression in &compression_cases {
                cases.push(GrpcBenchParams {
                    rpc,
                    requests_per_client: 1_000,
                    concurrency,
                    compression,
                });
            }
        }
    }
    let rt = Builder::new_multi_thread().enable_all().build().unwrap();

    for params in &cases {
        let mut group = c.benchmark_group(format!("grpc/{}", params.rpc));
        group.sample_size(10);
        group.throughput(Throughput::Elements(
            (params.requests_per_client * params.concurrency) as u64,
        ));

        group.bench_function(
            format!(
                "reqs/{}/conc/{}/comp/{}",
                params.requests_per_client, params.concurrency, params.compression,
            ),
            |b| {
                b.to_async(&rt).iter_custom(|iters| {
                    let uri = uri.clone();
                    async move {
                        let channel = Channel::builder(uri)
                            .connect()
                            .await
                            .expect("Failed to connect to server");

                        let start = Instant::now();

                        for _ in 0..iters {
                            run_grpc_bench(&channel, params).await;
                        }

                        start.elapsed()
                    }
                });
            },
        );

        group.finish();
    }

    if server.kill().is_err() {
        eprintln!("failed to kill server");
    }
}

async fn run_grpc_bench(channel: &Channel, params: &GrpcBenchParams) {
    let mut tasks = FuturesUnordered::new();

    for _ in 0..params.concurrency {
        let channel = channel.clone();
        let params = *params;

        tasks.push(tokio::spawn(async move {
            let mut client = SnowflakeClient::new(channel);
            if let Some(encoding) = params.compression.into() {
                client = client.accept_compressed(encoding).send_compressed(encoding);
            }

            for _ in 0..params.requests_per_client {
                match params.rpc {
                    Rpc::GenerateOne => {
                        let uuid = client
                            .generate_one(NullRequest {})
                            .await
                            .expect("generate_one failed")
                            .into_inner()
                            .uuid;
                        black_box(SnowflakeId::from_raw(uuid));
                    }
                    Rpc::Next => {
                        let value = client
                            .next(Key {
                                name: "bench".to_string(),
                            })
                            .await
                            .expect("next failed")
                            .into_inner()
                            .value;
                        black_box(value);
                    }
                }
            }
        }));
    }

    // Wait for all tasks to complete
    while let Some(res) = tasks.next().await {
        res.unwrap();
    }
}

pub fn wait_for_port(addr: &str, timeout_secs: u64) {
    let start = Instant::now();
    while start.elapsed().as_secs() < timeout_secs {
        if TcpStream::connect(addr).is_ok() {
            return;
        }
        thread::sleep(Duration::from_millis(100));
    }
    panic!("Server did not start listening on {}", addr);
}

criterion_group!(grpc_benches, grpc_bench);
criterion_main!(grpc_benches);
