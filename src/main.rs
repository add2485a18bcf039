use worker_pool::{Config, WorkerPool};
use std::{
    thread,
    time::{Duration, Instant},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};


fn complex_calculation(a: u64, b: u64) -> u64 {
    thread::sleep(Duration::from_millis(10));
    a * b
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "worker_pool=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::cpu_bound();
    tracing::info!(cores = config.num_threads, "creating worker pool");
    let pool = WorkerPool::with_config(config)?;

    let now = Instant::now();
    let handles = (0..100u64)
        .map(|i| pool.submit(move || complex_calculation(i, i)))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::info!(queued = pool.queue_depth(), "submitted 100 tasks");

    let mut sum = 0;
    for handle in handles {
        sum += handle.join()?;
    }

    pool.shutdown();
    tracing::info!(sum, elapsed = ?now.elapsed(), "all tasks completed");
    Ok(())
}
