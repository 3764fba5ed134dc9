//! Criterion-based throughput benchmark for `Pool::dispatch_bulk`, in the
//! same style as the teacher crate's `bench_criterion.rs`.

use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use cryptopool::cipher::{CipherEngine, XorStreamCipher};
use cryptopool::config::PoolConfig;
use cryptopool::constants::DATA_UNIT_SIZE;
use cryptopool::pool::{BulkKind, Pool};

const UNIT_COUNT: usize = 32_768;

fn bench_dispatch_bulk_by_thread_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch_bulk by thread count");
    group.throughput(Throughput::Bytes((UNIT_COUNT * DATA_UNIT_SIZE) as u64));
    group.sample_size(20);

    for thread_count in [1usize, 2, 4, 8] {
        let pool = Pool::new();
        pool.start(PoolConfig::new().with_cpu_count_override(thread_count));
        let cipher: Arc<dyn CipherEngine> = Arc::new(XorStreamCipher::new(vec![0x5A; 32]));
        let mut data = vec![0u8; UNIT_COUNT * DATA_UNIT_SIZE];

        group.bench_function(BenchmarkId::new("encrypt", thread_count), |b| {
            b.iter(|| {
                pool.dispatch_bulk(BulkKind::Encrypt, &mut data, 0, UNIT_COUNT, cipher.clone());
            })
        });

        pool.stop();
    }

    group.finish();
}

fn bench_dispatch_bulk_by_unit_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch_bulk by unit count");
    group.sample_size(20);

    let pool = Pool::new();
    pool.start(PoolConfig::new().with_cpu_count_override(4));
    let cipher: Arc<dyn CipherEngine> = Arc::new(XorStreamCipher::new(vec![0x5A; 32]));

    for unit_count in [1usize, 100, 1_000, 10_000] {
        let mut data = vec![0u8; unit_count * DATA_UNIT_SIZE];
        group.throughput(Throughput::Bytes((unit_count * DATA_UNIT_SIZE) as u64));
        group.bench_function(BenchmarkId::new("encrypt", unit_count), |b| {
            b.iter(|| {
                pool.dispatch_bulk(BulkKind::Encrypt, &mut data, 0, unit_count, cipher.clone());
            })
        });
    }

    pool.stop();
    group.finish();
}

criterion_group!(benches, bench_dispatch_bulk_by_thread_count, bench_dispatch_bulk_by_unit_count);
criterion_main!(benches);
