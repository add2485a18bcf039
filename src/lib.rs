//! Fixed-size worker pool backed by OS threads.
//!
//! # Features
//! - One shared FIFO queue, tasks are dequeued in submission order
//! - Typed one-shot result handles, usable blocking or with `.await`
//! - Panics inside tasks are captured and delivered through the handle
//! - Graceful, idempotent shutdown that drains queued work
//! - Read-only monitoring handle and periodic metrics sampling

pub mod errors;
pub mod handle;
pub mod model;
pub mod pool;
pub mod queue;
pub mod result;

pub use errors::{PoolError, SpawnError};
pub use handle::{join_handles, JoinHandle};
pub use model::{JoinOrdering, PoolMetrics};
pub use pool::{Config, Monitor, MonitorGuard, WorkerPool};
pub use queue::TaskQueue;
pub use result::SpawnResult;
