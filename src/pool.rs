use super::{
    errors::PoolError,
    handle::{panic_message, JoinHandle, Task},
    model::PoolMetrics,
    queue::TaskQueue,
};
use std::{
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread::{self, ThreadId},
    time::Duration,
};
use crossbeam::channel::{self, Sender};
use parking_lot::{Condvar, Mutex};
use tokio::sync::oneshot;


/// Pool configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub num_threads: usize,
    pub thread_name_prefix: String,
    pub stack_size: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_threads: num_cpus::get(),
            thread_name_prefix: "worker-pool".to_string(),
            stack_size: None,
        }
    }
}

impl Config {
    pub fn cpu_bound() -> Self {
        Self {
            num_threads: num_cpus::get(),
            ..Default::default()
        }
    }

    /// Twice the CPU count, for tasks that spend most of their time blocked.
    pub fn io_bound() -> Self {
        Self {
            num_threads: num_cpus::get() * 2,
            ..Default::default()
        }
    }
}


#[derive(Debug, Default)]
struct Counters {
    active: AtomicUsize,
    total_submitted: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
}

/// State shared between the pool handle and its workers.
///
/// `shutdown` doubles as the coordination lock: pushes and pops both happen
/// while it is held, so a worker can never miss the wake-up for a task that
/// was queued between its emptiness check and its wait.
struct Shared {
    queue: TaskQueue<Task>,
    shutdown: Mutex<bool>,
    available: Condvar,
    counters: Arc<Counters>,
    worker_count: usize,
}

enum Next {
    Run(Task),
    Exit,
}

impl Shared {
    fn new(worker_count: usize) -> Self {
        Self {
            queue: TaskQueue::new(),
            shutdown: Mutex::new(false),
            available: Condvar::new(),
            counters: Arc::new(Counters::default()),
            worker_count,
        }
    }

    fn enqueue(&self, task: Task) -> Result<(), PoolError> {
        {
            let shutdown = self.shutdown.lock();
            if *shutdown {
                return Err(PoolError::ShutDown);
            }
            self.queue.push(task);
            self.counters.total_submitted.fetch_add(1, Ordering::Relaxed);
        }
        self.available.notify_one();
        Ok(())
    }

    /// Blocks until there is a task to run or the pool is drained and shut down.
    fn next_task(&self) -> Next {
        let mut shutdown = self.shutdown.lock();
        loop {
            if let Some(task) = self.queue.pop_if_available() {
                self.counters.active.fetch_add(1, Ordering::Relaxed);
                return Next::Run(task);
            }
            if *shutdown {
                return Next::Exit;
            }
            self.available.wait(&mut shutdown);
        }
    }

    /// Returns `true` on the call that flipped the flag.
    fn signal_shutdown(&self) -> bool {
        let first = {
            let mut shutdown = self.shutdown.lock();
            !std::mem::replace(&mut *shutdown, true)
        };
        if first {
            tracing::debug!(queued = self.queue.len(), "shutdown signalled");
            self.available.notify_all();
        }
        first
    }

    fn is_shutdown(&self) -> bool {
        *self.shutdown.lock()
    }

    fn metrics(&self) -> PoolMetrics {
        let active_tasks = self.counters.active.load(Ordering::Relaxed);
        PoolMetrics {
            worker_count: self.worker_count,
            active_tasks,
            idle_workers: self.worker_count.saturating_sub(active_tasks),
            queued_tasks: self.queue.len(),
            total_submitted: self.counters.total_submitted.load(Ordering::Relaxed),
            completed_tasks: self.counters.completed.load(Ordering::Relaxed),
            failed_tasks: self.counters.failed.load(Ordering::Relaxed),
        }
    }
}

fn worker_loop(shared: &Shared, index: usize) {
    tracing::debug!(worker = index, "worker started");

    while let Next::Run(task) = shared.next_task() {
        tracing::trace!(worker = index, "task picked up");
        task();
        shared.counters.active.fetch_sub(1, Ordering::Relaxed);
    }

    tracing::debug!(worker = index, "worker exiting");
}


/// Fixed-size pool of OS threads consuming tasks from one FIFO queue.
///
/// Workers are started by the constructor and live until [`shutdown`]
/// (or drop). Tasks are dequeued in submission order; completion order
/// across workers is unspecified.
///
/// [`shutdown`]: WorkerPool::shutdown
pub struct WorkerPool {
    shared: Arc<Shared>,
    workers: Mutex<Vec<thread::JoinHandle<()>>>,
    worker_ids: Vec<ThreadId>,
}

impl WorkerPool {
    pub fn new(num_threads: usize) -> Result<Self, PoolError> {
        let config = Config {
            num_threads,
            ..Default::default()
        };
        Self::with_config(config)
    }

    pub fn with_config(config: Config) -> Result<Self, PoolError> {
        if config.num_threads == 0 {
            return Err(PoolError::ZeroWorkers);
        }
        // std panics on a NUL in a thread name instead of returning an error
        if config.thread_name_prefix.contains('\0') {
            return Err(PoolError::InvalidConfig(
                "thread name prefix contains a NUL byte".to_string(),
            ));
        }

        let shared = Arc::new(Shared::new(config.num_threads));
        let mut workers = Vec::with_capacity(config.num_threads);

        for index in 0..config.num_threads {
            let mut builder = thread::Builder::new()
                .name(format!("{}-{}", config.thread_name_prefix, index));
            if let Some(size) = config.stack_size {
                builder = builder.stack_size(size);
            }

            let worker_shared = Arc::clone(&shared);
            match builder.spawn(move || worker_loop(&worker_shared, index)) {
                Ok(handle) => workers.push(handle),
                Err(err) => {
                    tracing::error!(worker = index, error = %err, "failed to spawn worker thread");
                    shared.signal_shutdown();
                    for handle in workers {
                        let _ = handle.join();
                    }
                    return Err(PoolError::ThreadSpawn(err.to_string()));
                }
            }
        }

        tracing::info!(
            workers = config.num_threads,
            prefix = %config.thread_name_prefix,
            "worker pool started"
        );

        let worker_ids = workers.iter().map(|h| h.thread().id()).collect();
        Ok(Self {
            shared,
            workers: Mutex::new(workers),
            worker_ids,
        })
    }

    /// Queues `f` and returns a handle to its eventual result.
    ///
    /// Never blocks. A panic inside `f` is caught on the worker and delivered
    /// through the handle, payload included; the worker keeps running.
    ///
    /// Once shutdown has been signalled the closure is dropped unexecuted and
    /// [`PoolError::ShutDown`] is returned. A task that was accepted is always
    /// run, shutdown drains the queue before workers exit.
    pub fn submit<T, F>(&self, f: F) -> Result<JoinHandle<T>, PoolError>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, rx) = oneshot::channel::<thread::Result<T>>();
        let counters = Arc::clone(&self.shared.counters);

        let task: Task = Box::new(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(f));

            match &result {
                Ok(_) => {
                    counters.completed.fetch_add(1, Ordering::Relaxed);
                }
                Err(payload) => {
                    counters.failed.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(panic = %panic_message(payload.as_ref()), "task panicked");
                }
            }

            // receiver may already be gone, the result is simply discarded
            let _ = tx.send(result);
        });

        if let Err(err) = self.shared.enqueue(task) {
            tracing::warn!("submission rejected, pool is shut down");
            return Err(err);
        }

        Ok(JoinHandle::new(rx))
    }

    /// Binds `f` to `arg` and submits the call.
    pub fn submit_with<A, T, F>(&self, f: F, arg: A) -> Result<JoinHandle<T>, PoolError>
    where
        A: Send + 'static,
        T: Send + 'static,
        F: FnOnce(A) -> T + Send + 'static,
    {
        self.submit(move || f(arg))
    }

    /// Submits one task per item, returning handles in item order.
    ///
    /// Stops at the first rejected submission; tasks queued before it still run.
    pub fn map<I, A, T, F>(&self, items: I, f: F) -> Result<Vec<JoinHandle<T>>, PoolError>
    where
        I: IntoIterator<Item = A>,
        A: Send + 'static,
        T: Send + 'static,
        F: Fn(A) -> T + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        items
            .into_iter()
            .map(|item| {
                let f = Arc::clone(&f);
                self.submit(move || f(item))
            })
            .collect()
    }

    /// Stops accepting work, lets workers drain the queue and joins them.
    ///
    /// Idempotent. Concurrent callers all return once the workers are gone.
    /// Called from a task running on this pool, it only signals shutdown;
    /// the workers are joined by whoever calls it from outside (or by drop).
    pub fn shutdown(&self) {
        if self.worker_ids.contains(&thread::current().id()) {
            if self.shared.signal_shutdown() {
                tracing::debug!("shutdown requested from a worker thread, not joining");
            }
            return;
        }

        let mut workers = self.workers.lock();
        if workers.is_empty() {
            return;
        }

        self.shared.signal_shutdown();
        for handle in workers.drain(..) {
            if handle.join().is_err() {
                tracing::error!("worker thread panicked");
            }
        }

        tracing::info!(
            completed = self.shared.counters.completed.load(Ordering::Relaxed),
            failed = self.shared.counters.failed.load(Ordering::Relaxed),
            "worker pool shut down"
        );
    }

    #[inline]
    pub fn is_shutdown(&self) -> bool {
        self.shared.is_shutdown()
    }

    /// Tasks queued but not yet picked up by a worker.
    #[inline]
    pub fn queue_depth(&self) -> usize {
        self.shared.queue.len()
    }

    #[inline]
    pub fn worker_count(&self) -> usize {
        self.shared.worker_count
    }

    #[inline]
    pub fn metrics(&self) -> PoolMetrics {
        self.shared.metrics()
    }

    /// Read-only handle for presentation layers that poll the pool.
    pub fn monitor(&self) -> Monitor {
        Monitor {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Calls `callback` with a metrics snapshot every `interval` on a
    /// background thread until the returned guard is stopped or dropped.
    pub fn start_monitoring<F>(&self, interval: Duration, mut callback: F) -> Result<MonitorGuard, PoolError>
    where
        F: FnMut(PoolMetrics) + Send + 'static,
    {
        if interval.is_zero() {
            return Err(PoolError::InvalidConfig(
                "monitoring interval must be non-zero".to_string(),
            ));
        }

        let monitor = self.monitor();
        let (stop_tx, stop_rx) = channel::bounded::<()>(0);

        let handle = thread::Builder::new()
            .name("worker-pool-monitor".to_string())
            .spawn(move || {
                let ticker = channel::tick(interval);
                loop {
                    crossbeam::select! {
                        recv(ticker) -> _ => callback(monitor.metrics()),
                        recv(stop_rx) -> _ => break,
                    }
                }
            })
            .map_err(|err| PoolError::ThreadSpawn(err.to_string()))?;

        Ok(MonitorGuard {
            stop: Some(stop_tx),
            handle: Some(handle),
        })
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("worker_count", &self.worker_count())
            .field("queue_depth", &self.queue_depth())
            .field("is_shutdown", &self.is_shutdown())
            .finish()
    }
}


/// Cloneable read-only view of a pool's monitoring counters.
#[derive(Clone)]
pub struct Monitor {
    shared: Arc<Shared>,
}

impl Monitor {
    #[inline]
    pub fn queue_depth(&self) -> usize {
        self.shared.queue.len()
    }

    #[inline]
    pub fn worker_count(&self) -> usize {
        self.shared.worker_count
    }

    #[inline]
    pub fn is_shutdown(&self) -> bool {
        self.shared.is_shutdown()
    }

    #[inline]
    pub fn metrics(&self) -> PoolMetrics {
        self.shared.metrics()
    }
}

impl fmt::Debug for Monitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("metrics", &self.metrics())
            .finish()
    }
}


/// Keeps a monitoring thread alive; stops and joins it on drop.
#[derive(Debug)]
pub struct MonitorGuard {
    stop: Option<Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl MonitorGuard {
    pub fn stop(mut self) {
        self.stop_inner();
    }

    fn stop_inner(&mut self) {
        // dropping the sender disconnects the channel and wakes the sampler
        drop(self.stop.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("monitoring callback panicked");
            }
        }
    }
}

impl Drop for MonitorGuard {
    fn drop(&mut self) {
        self.stop_inner();
    }
}
