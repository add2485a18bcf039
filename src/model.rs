/// Point-in-time view of a pool's counters.
///
/// Fields are read independently, so under load they need not add up exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolMetrics {
    pub worker_count: usize,
    pub active_tasks: usize,
    pub idle_workers: usize,
    pub queued_tasks: usize,
    pub total_submitted: usize,
    pub completed_tasks: usize,
    pub failed_tasks: usize,
}

impl PoolMetrics {
    pub fn utilization(&self) -> f64 {
        if self.worker_count == 0 {
            return 0.0;
        }
        self.active_tasks as f64 / self.worker_count as f64
    }

    pub fn queue_pressure(&self) -> f64 {
        if self.worker_count == 0 {
            return self.queued_tasks as f64;
        }
        self.queued_tasks as f64 / self.worker_count as f64
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.completed_tasks + self.failed_tasks;
        if total == 0 {
            return 1.0;
        }
        self.completed_tasks as f64 / total as f64
    }

    /// Tasks submitted but not yet finished, running ones included.
    pub fn outstanding(&self) -> usize {
        self.total_submitted
            .saturating_sub(self.completed_tasks + self.failed_tasks)
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOrdering {
    Ordered,
    UnOrdered,
}
