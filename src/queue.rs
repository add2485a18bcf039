use crossbeam::deque::{Injector, Steal};
use std::fmt;


/// Unbounded FIFO queue shared between producers and worker threads.
///
/// All operations are linearizable and never block. `len` and `is_empty` are
/// snapshots: by the time the caller looks at the answer another thread may
/// already have pushed or popped.
pub struct TaskQueue<T> {
    inner: Injector<T>,
}

impl<T> TaskQueue<T> {
    pub fn new() -> Self {
        Self {
            inner: Injector::new(),
        }
    }

    /// Appends `item` at the tail.
    #[inline]
    pub fn push(&self, item: T) {
        self.inner.push(item);
    }

    /// Removes and returns the head, or `None` when nothing is queued.
    #[inline]
    pub fn pop_if_available(&self) -> Option<T> {
        loop {
            match self.inner.steal() {
                Steal::Success(item) => return Some(item),
                Steal::Empty => return None,
                // lost a race with a concurrent pop, the queue is not known to be empty
                Steal::Retry => std::hint::spin_loop(),
            }
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for TaskQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue")
            .field("len", &self.len())
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::TaskQueue;
    use parking_lot::Mutex;
    use std::{
        collections::HashSet,
        sync::atomic::{AtomicUsize, Ordering},
        thread,
    };

    #[test]
    fn pop_on_empty_reports_absence() {
        let queue: TaskQueue<u32> = TaskQueue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
        assert_eq!(queue.pop_if_available(), None);
    }

    #[test]
    fn preserves_push_order() {
        let queue = TaskQueue::new();
        for i in 0..10 {
            queue.push(i);
        }
        assert_eq!(queue.len(), 10);

        let drained: Vec<_> = std::iter::from_fn(|| queue.pop_if_available()).collect();
        assert_eq!(drained, (0..10).collect::<Vec<_>>());
        assert!(queue.is_empty());
    }

    #[test]
    fn concurrent_consumers_see_each_item_once() {
        const PRODUCERS: usize = 4;
        const PER_PRODUCER: usize = 2_500;

        let queue = TaskQueue::new();
        let seen = Mutex::new(Vec::with_capacity(PRODUCERS * PER_PRODUCER));
        let finished_producers = AtomicUsize::new(0);

        // consumers start before producers and pop while pushes are in flight
        thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    let mut local = Vec::new();
                    loop {
                        if let Some(item) = queue.pop_if_available() {
                            local.push(item);
                            continue;
                        }
                        if finished_producers.load(Ordering::Acquire) == PRODUCERS {
                            // every push happened before the final count was observed
                            while let Some(item) = queue.pop_if_available() {
                                local.push(item);
                            }
                            break;
                        }
                        std::hint::spin_loop();
                    }
                    seen.lock().extend(local);
                });
            }

            for p in 0..PRODUCERS {
                let queue = &queue;
                let finished_producers = &finished_producers;
                s.spawn(move || {
                    for i in 0..PER_PRODUCER {
                        queue.push(p * PER_PRODUCER + i);
                    }
                    finished_producers.fetch_add(1, Ordering::Release);
                });
            }
        });

        let seen = seen.into_inner();
        assert_eq!(seen.len(), PRODUCERS * PER_PRODUCER);
        let unique: HashSet<_> = seen.into_iter().collect();
        assert_eq!(unique.len(), PRODUCERS * PER_PRODUCER);
        assert!(queue.is_empty());
    }
}
