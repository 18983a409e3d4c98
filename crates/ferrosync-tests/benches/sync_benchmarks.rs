//! Performance benchmarks for ferrosync
//!
//! Measures content hashing throughput and complete sync passes over small
//! trees in both comparison modes.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ferrosync_sync::{digest_file, SyncConfig, SyncEngine, ThreadCount};
use ferrosync_tests::{write_file, SyncFixture};
use std::hint::black_box;
use tempfile::TempDir;
use tokio::runtime::Runtime;

/// Deterministic, poorly compressible content
fn create_test_data(size: usize) -> Vec<u8> {
    (0..size).map(|i| ((i * 7 + 13) % 251) as u8).collect()
}

fn benchmark_digest(c: &mut Criterion) {
    let mut group = c.benchmark_group("digest_file");

    for size in [64 * 1024, 1024 * 1024, 8 * 1024 * 1024] {
        let temp_dir = TempDir::new().unwrap();
        let path = write_file(temp_dir.path(), "data.bin", create_test_data(size));

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &path, |b, path| {
            b.iter(|| digest_file(black_box(path)).unwrap());
        });
    }

    group.finish();
}

fn populate(fixture: &SyncFixture, files: usize) {
    for i in 0..files {
        write_file(
            &fixture.source,
            &format!("dir{}/file{}.dat", i % 8, i),
            create_test_data(16 * 1024),
        );
    }
}

fn benchmark_sync(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("sync_pass");
    group.sample_size(20);

    for verify in [false, true] {
        let fixture = SyncFixture::new();
        populate(&fixture, 200);
        let config = SyncConfig::new(&fixture.source, &fixture.destination)
            .with_workers(ThreadCount::new(8).unwrap())
            .with_verify(verify);

        // Seed the destination so every pass measures an up-to-date tree
        rt.block_on(SyncEngine::new(config.clone()).run()).unwrap();

        let label = if verify { "verify" } else { "fast" };
        group.bench_function(BenchmarkId::new("up_to_date", label), |b| {
            b.iter(|| {
                rt.block_on(SyncEngine::new(config.clone()).run()).unwrap()
            });
        });
    }

    group.bench_function("initial_copy", |b| {
        b.iter_batched(
            || {
                let fixture = SyncFixture::new();
                populate(&fixture, 50);
                fixture
            },
            |fixture| rt.block_on(fixture.run(fixture.config())).unwrap(),
            criterion::BatchSize::PerIteration,
        );
    });

    group.finish();
}

criterion_group!(benches, benchmark_digest, benchmark_sync);
criterion_main!(benches);
