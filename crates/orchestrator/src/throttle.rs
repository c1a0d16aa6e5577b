//! Bounded worker pool for async task-functions.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::future::join_all;
use futures::FutureExt;
use parking_lot::Mutex;
use pipeline::{panic_message, RelayConfig};
use thiserror::Error;
use tracing::{debug, trace};

/// Why a throttled task produced no value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThrottleError {
    /// The task panicked; siblings were unaffected.
    #[error("task {index} panicked: {message}")]
    TaskPanicked {
        /// Position of the task in the input list.
        index: usize,
        /// The panic payload, if it was a string.
        message: String,
    },
}

/// Runs task-functions with at most `concurrency_limit` in flight.
///
/// Workers share one queue of indexed tasks: each pops the next task, awaits
/// it, keeps the outcome with its index, sleeps `queue_interval`, and pops
/// again until the queue is empty. Outcomes are reordered by index at the end,
/// so they come back in input order no matter which task finishes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    concurrency_limit: usize,
    queue_interval: Duration,
}

impl Throttle {
    /// Creates a throttle. A limit of zero is treated as one.
    pub fn new(concurrency_limit: usize, queue_interval: Duration) -> Self {
        Self {
            concurrency_limit: concurrency_limit.max(1),
            queue_interval,
        }
    }

    /// Creates a throttle from the configured limits.
    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(config.concurrency_limit, config.queue_interval())
    }

    /// Maximum number of tasks in flight.
    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    /// Delay a worker waits after each task.
    pub fn queue_interval(&self) -> Duration {
        self.queue_interval
    }

    /// Returns `true` when `task_count` tasks need the worker pool.
    pub fn should_throttle(&self, task_count: usize) -> bool {
        task_count > self.concurrency_limit
    }

    /// Runs every task through `min(concurrency_limit, tasks.len())` workers.
    pub async fn run_all<F, Fut, T>(&self, tasks: Vec<F>) -> Vec<Result<T, ThrottleError>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let total = tasks.len();
        if total == 0 {
            return Vec::new();
        }

        let queue = Mutex::new(tasks.into_iter().enumerate());
        let workers = self.concurrency_limit.min(total);
        debug!(total, workers, "starting throttled run");

        let queue = &queue;
        let interval = self.queue_interval;

        let finished = join_all((0..workers).map(|worker| async move {
            let mut done = Vec::new();
            loop {
                let next = queue.lock().next();
                let Some((index, task)) = next else {
                    break;
                };
                trace!(worker, index, "worker claimed task");

                let outcome = AssertUnwindSafe(async move { task().await })
                    .catch_unwind()
                    .await
                    .map_err(|panic| ThrottleError::TaskPanicked {
                        index,
                        message: panic_message(&*panic),
                    });
                done.push((index, outcome));

                if !interval.is_zero() {
                    tokio::time::sleep(interval).await;
                }
            }
            done
        }))
        .await;

        let mut outcomes: Vec<_> = finished.into_iter().flatten().collect();
        outcomes.sort_unstable_by_key(|(index, _)| *index);
        debug_assert_eq!(outcomes.len(), total);
        outcomes.into_iter().map(|(_, outcome)| outcome).collect()
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::from_config(&RelayConfig::default())
    }
}
