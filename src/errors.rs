use thiserror::Error;

/// Errors raised by the pool itself, at construction or submission time.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum PoolError {
    #[error("worker pool requires at least one worker thread")]
    ZeroWorkers,

    #[error("invalid pool configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to spawn worker thread: {0}")]
    ThreadSpawn(String),

    #[error("worker pool is shut down")]
    ShutDown,
}

/// Errors delivered through a task's [`JoinHandle`](crate::handle::JoinHandle).
#[derive(Debug, Error, PartialEq, PartialOrd, Eq, Ord, Clone)]
pub enum SpawnError {
    #[error("task panicked: {0}")]
    Panic(String),

    #[error("task was dropped before producing a result")]
    ChannelClosed,
}
