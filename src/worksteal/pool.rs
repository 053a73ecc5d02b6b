//! Worker pool draining work-stealing deques
//!
//! The executor behind the language's `spawn` primitive. Spawned tasks
//! land on a shared FIFO injector stack; each worker thread owns one
//! [`WorkStealingDeque`], refills it in batches from the injector, and
//! pops it LIFO. A worker whose deque and the injector are both dry
//! steals the oldest task from a sibling's deque.
//!
//! Routing everything through the injector keeps the deque's single-owner
//! discipline intact: only the owning worker ever pushes or pops a deque,
//! and other threads touch it exclusively through `steal`.
//!
//! Shutdown is cooperative: workers finish the queued work, then exit.

use crate::encoding::ElementKind;
use crate::stack::{Perspective, Stack};
use crate::worksteal::{Task, WorkStealingDeque};
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How long an idle worker sleeps before rechecking for work.
const IDLE_WAIT: Duration = Duration::from_millis(1);

/// How many tasks a worker moves from the injector per refill.
const REFILL_BATCH: usize = 16;

/// Worker pool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerPoolConfig {
    /// Number of worker threads
    pub workers: usize,

    /// Capacity of each worker's deque
    pub deque_capacity: usize,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            deque_capacity: 256,
        }
    }
}

/// Task callback run on worker threads
pub type TaskHandler = Arc<dyn Fn(Task) -> Result<(), String> + Send + Sync>;

/// Counters accumulated over the pool's lifetime
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Tasks that ran to completion
    pub completed: u64,
    /// Tasks whose handler returned an error or panicked
    pub failed: u64,
    /// Tasks a worker took from a sibling's deque
    pub stolen: u64,
}

#[derive(Default)]
struct Counters {
    completed: AtomicU64,
    failed: AtomicU64,
    stolen: AtomicU64,
}

/// OS-thread executor over per-worker work-stealing deques
pub struct WorkerPool {
    injector: Arc<Stack>,
    workers: Vec<JoinHandle<()>>,
    running: Arc<AtomicBool>,
    counters: Arc<Counters>,
    deques: Vec<Arc<WorkStealingDeque>>,
}

impl WorkerPool {
    /// Start the pool. Worker threads run until [`shutdown`](Self::shutdown).
    pub fn new(config: WorkerPoolConfig, handler: TaskHandler) -> Self {
        let worker_count = config.workers.max(1);
        let injector = Arc::new(Stack::new(Perspective::Fifo, ElementKind::Bytes));
        let deques: Vec<_> = (0..worker_count)
            .map(|_| Arc::new(WorkStealingDeque::new(config.deque_capacity.max(1))))
            .collect();
        let running = Arc::new(AtomicBool::new(true));
        let counters = Arc::new(Counters::default());

        let workers = (0..worker_count)
            .map(|index| {
                let worker = Worker {
                    index,
                    injector: Arc::clone(&injector),
                    deques: deques.clone(),
                    running: Arc::clone(&running),
                    counters: Arc::clone(&counters),
                    handler: Arc::clone(&handler),
                };
                std::thread::Builder::new()
                    .name(format!("strata-worker-{index}"))
                    .spawn(move || worker.run())
                    .expect("spawning worker thread")
            })
            .collect();

        info!(workers = worker_count, "worker pool started");
        Self {
            injector,
            workers,
            running,
            counters,
            deques,
        }
    }

    /// Queue a task. Returns `false` once the pool is stopped.
    pub fn spawn(&self, task: Task) -> bool {
        if !self.running.load(Ordering::Acquire) {
            return false;
        }
        self.injector.push(task.to_bytes()).is_ok()
    }

    /// Tasks queued but not yet picked up by a worker.
    pub fn queued(&self) -> usize {
        self.injector.len() + self.deques.iter().map(|d| d.len()).sum::<usize>()
    }

    /// Snapshot of the lifetime counters.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            completed: self.counters.completed.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            stolen: self.counters.stolen.load(Ordering::Relaxed),
        }
    }

    /// Drain the queued work and join the worker threads.
    pub fn shutdown(mut self) -> PoolStats {
        self.running.store(false, Ordering::Release);
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
        info!(
            completed = self.counters.completed.load(Ordering::Relaxed),
            failed = self.counters.failed.load(Ordering::Relaxed),
            "worker pool stopped"
        );
        self.stats()
    }
}

struct Worker {
    index: usize,
    injector: Arc<Stack>,
    deques: Vec<Arc<WorkStealingDeque>>,
    running: Arc<AtomicBool>,
    counters: Arc<Counters>,
    handler: TaskHandler,
}

impl Worker {
    fn run(self) {
        debug!(worker = self.index, "worker started");
        loop {
            match self.next_task() {
                Some(task) => self.execute(task),
                None => {
                    if !self.running.load(Ordering::Acquire) {
                        break;
                    }
                    std::thread::sleep(IDLE_WAIT);
                }
            }
        }
        debug!(worker = self.index, "worker stopped");
    }

    fn next_task(&self) -> Option<Task> {
        if let Some(task) = self.deques[self.index].pop() {
            return Some(task);
        }
        if self.refill() {
            return self.deques[self.index].pop();
        }
        for offset in 1..self.deques.len() {
            let victim = &self.deques[(self.index + offset) % self.deques.len()];
            if let Some(task) = victim.steal() {
                self.counters.stolen.fetch_add(1, Ordering::Relaxed);
                return Some(task);
            }
        }
        None
    }

    /// Move a batch from the injector into this worker's own deque. Only
    /// the owner pushes here, so the deque discipline holds.
    fn refill(&self) -> bool {
        let mut moved = false;
        for _ in 0..REFILL_BATCH {
            let Ok(bytes) = self.injector.pop() else {
                break;
            };
            let Some(task) = Task::from_bytes(&bytes) else {
                continue;
            };
            if !self.deques[self.index].push(task.clone()) {
                // Own deque saturated; put the task back for a sibling.
                let _ = self.injector.push(task.to_bytes());
                break;
            }
            moved = true;
        }
        moved
    }

    fn execute(&self, task: Task) {
        let id = task.id;
        match catch_unwind(AssertUnwindSafe(|| (self.handler)(task))) {
            Ok(Ok(())) => {
                self.counters.completed.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Err(message)) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                warn!(worker = self.index, task = id, %message, "task failed");
            }
            Err(_) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                warn!(worker = self.index, task = id, "task handler panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_every_spawned_task_runs_once() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let handler: TaskHandler = {
            let seen = Arc::clone(&seen);
            Arc::new(move |task| {
                seen.lock().push(task.id);
                Ok(())
            })
        };
        let pool = WorkerPool::new(
            WorkerPoolConfig {
                workers: 3,
                deque_capacity: 8,
            },
            handler,
        );
        for id in 0..300 {
            assert!(pool.spawn(Task::new(id, vec![])));
        }
        let stats = pool.shutdown();
        let mut ids = seen.lock().clone();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 300);
        assert_eq!(stats.completed, 300);
        assert_eq!(stats.failed, 0);
    }

    #[test]
    fn test_failures_are_counted_not_fatal() {
        let handler: TaskHandler = Arc::new(|task| {
            if task.id % 2 == 0 {
                Err("even task".to_string())
            } else {
                Ok(())
            }
        });
        let pool = WorkerPool::new(WorkerPoolConfig::default(), handler);
        for id in 0..10 {
            assert!(pool.spawn(Task::new(id, vec![])));
        }
        let stats = pool.shutdown();
        assert_eq!(stats.completed, 5);
        assert_eq!(stats.failed, 5);
    }

    #[test]
    fn test_single_worker_pool_drains() {
        let handler: TaskHandler = Arc::new(|_| Ok(()));
        let pool = WorkerPool::new(
            WorkerPoolConfig {
                workers: 1,
                deque_capacity: 4,
            },
            handler,
        );
        for id in 0..50 {
            assert!(pool.spawn(Task::new(id, vec![])));
        }
        let stats = pool.shutdown();
        assert_eq!(stats.completed, 50);
        assert_eq!(stats.stolen, 0);
    }
}
