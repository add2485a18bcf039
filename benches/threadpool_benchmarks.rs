use criterion::{criterion_group, criterion_main, Criterion, BenchmarkId, Throughput};
use worker_pool::pool::{WorkerPool, Config as PoolConfig};
use std::{
    hint::black_box,
    time::Duration,
};

// Benchmark 1: Submit + join overhead
fn bench_spawn_overhead(c: &mut Criterion) {
    let mut group = c.benchmark_group("spawn_overhead");

    for size in [100, 1000, 10000] {
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(
            BenchmarkId::new("submit", size),
            &size,
            |b, &size| {
                let pool = WorkerPool::with_config(PoolConfig::default()).unwrap();

                b.iter(|| {
                    let handles: Vec<_> = (0..size)
                        .map(|i| pool.submit(move || black_box(i)).unwrap())
                        .collect();

                    for handle in handles {
                        black_box(handle.join().unwrap());
                    }
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("map", size),
            &size,
            |b, &size| {
                let pool = WorkerPool::with_config(PoolConfig::default()).unwrap();

                b.iter(|| {
                    let handles = pool.map(0..size, |i| black_box(i)).unwrap();
                    for handle in handles {
                        black_box(handle.join().unwrap());
                    }
                });
            },
        );
    }

    group.finish();
}

// Benchmark 2: Thread count scaling on CPU work
fn bench_thread_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("thread_scaling");
    let tasks = 1000u64;
    group.throughput(Throughput::Elements(tasks));

    for threads in [1, 2, 4, 8] {
        group.bench_with_input(
            BenchmarkId::from_parameter(threads),
            &threads,
            |b, &threads| {
                let pool = WorkerPool::new(threads).unwrap();

                b.iter(|| {
                    let handles = pool.map(0..tasks, |x| {
                        let mut acc = 0u64;
                        for i in 0..1_000 {
                            acc = acc.wrapping_add(black_box(x * i));
                        }
                        acc
                    }).unwrap();

                    for handle in handles {
                        black_box(handle.join().unwrap());
                    }
                });
            },
        );
    }

    group.finish();
}

// Benchmark 3: CPU- vs IO-bound presets on blocking tasks
fn bench_config_comparison(c: &mut Criterion) {
    let mut group = c.benchmark_group("config_comparison");
    group.sample_size(10);

    let configs = [
        ("cpu_bound", PoolConfig::cpu_bound()),
        ("io_bound", PoolConfig::io_bound()),
    ];

    for (name, config) in configs {
        group.bench_function(name, |b| {
            let pool = WorkerPool::with_config(config.clone()).unwrap();

            b.iter(|| {
                let handles = pool.map(0..64u32, |i| {
                    std::thread::sleep(Duration::from_micros(500));
                    i
                }).unwrap();

                for handle in handles {
                    black_box(handle.join().unwrap());
                }
            });
        });
    }

    group.finish();
}

// Benchmark 4: Latency of one task behind a loaded queue
fn bench_latency_under_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("latency_under_load");

    for background in [0usize, 100, 1000] {
        group.bench_with_input(
            BenchmarkId::from_parameter(background),
            &background,
            |b, &background| {
                let pool = WorkerPool::new(4).unwrap();

                b.iter(|| {
                    let load = pool.map(0..background, |i| black_box(i)).unwrap();
                    let probe = pool.submit(|| black_box(1)).unwrap();
                    black_box(probe.join().unwrap());

                    for handle in load {
                        black_box(handle.join().unwrap());
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_spawn_overhead,
    bench_thread_scaling,
    bench_config_comparison,
    bench_latency_under_load,
);

criterion_main!(benches);
