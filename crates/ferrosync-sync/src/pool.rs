//! Worker pools
//!
//! Transfers and deletions are I/O bound and run on [`IoPool`], a tokio
//! semaphore bounding blocking tasks. Hashing is CPU bound and runs on
//! [`CpuPool`], a dedicated rayon pool. The two never share threads.

use ferrosync_types::{Error, Result, TaskKind, TaskOutcome, ThreadCount};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Executes one kind of task on a blocking thread
pub trait TaskExecutor: Send + Sync + 'static {
    /// Task consumed by [`TaskExecutor::execute`]
    type Task: Send + 'static;

    /// Kind reported in every outcome
    const KIND: TaskKind;

    /// Destination path the task targets
    fn target(task: &Self::Task) -> &Path;

    /// Run the task to completion; failures are returned as outcomes
    fn execute(&self, task: Self::Task) -> TaskOutcome;
}

/// Bounded pool for I/O-bound tasks
#[derive(Debug, Clone)]
pub struct IoPool {
    permits: Arc<Semaphore>,
    workers: usize,
}

impl IoPool {
    /// Create a pool running at most `workers` tasks at once
    pub fn new(workers: ThreadCount) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(workers.get())),
            workers: workers.get(),
        }
    }

    /// Maximum number of concurrent tasks
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run every task and hand each outcome to `sink` in completion order
    ///
    /// Returns once every task has produced exactly one outcome. A task
    /// that panics yields a failed outcome.
    pub async fn execute_all<E, F>(&self, tasks: Vec<E::Task>, executor: Arc<E>, mut sink: F)
    where
        E: TaskExecutor,
        F: FnMut(TaskOutcome),
    {
        let mut join_set = JoinSet::new();
        debug!(
            kind = %E::KIND,
            tasks = tasks.len(),
            workers = self.workers,
            "Submitting tasks"
        );

        for task in tasks {
            let target = E::target(&task).to_path_buf();
            let permits = Arc::clone(&self.permits);
            let executor = Arc::clone(&executor);

            join_set.spawn(async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return TaskOutcome::failed(E::KIND, target, "worker pool closed");
                };
                match tokio::task::spawn_blocking(move || executor.execute(task)).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!("{} worker for {} failed: {}", E::KIND, target.display(), e);
                        let message = Error::task(&target, format!("worker failed: {}", e));
                        TaskOutcome::failed(E::KIND, target, message.to_string())
                    }
                }
            });
        }

        while let Some(joined) = join_set.join_next().await {
            let outcome = joined.unwrap_or_else(|e| {
                warn!("{} task failed to join: {}", E::KIND, e);
                TaskOutcome::failed(E::KIND, "", format!("{} task lost: {}", E::KIND, e))
            });
            sink(outcome);
        }
    }
}

/// Dedicated pool for CPU-bound work
#[derive(Debug)]
pub struct CpuPool {
    pool: rayon::ThreadPool,
}

impl CpuPool {
    /// Create a pool of `threads` workers, one per processor when `None`
    pub fn new(threads: Option<ThreadCount>) -> Result<Self> {
        let threads = threads.map_or_else(num_cpus::get, ThreadCount::get).max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|index| format!("ferrosync-hash-{}", index))
            .panic_handler(|_| warn!("Hash worker panicked"))
            .build()
            .map_err(|e| Error::sync(format!("Failed to build hashing pool: {}", e)))?;

        debug!(threads, "Created hashing pool");
        Ok(Self { pool })
    }

    /// Number of worker threads
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Apply `job` to every item, returning pairs in completion order
    ///
    /// An item whose job panicked is absent from the result.
    pub async fn map<T, R, F>(&self, items: Vec<T>, job: F) -> Vec<(T, R)>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(&T) -> R + Send + Sync + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let job = Arc::new(job);
        let expected = items.len();

        for item in items {
            let tx = tx.clone();
            let job = Arc::clone(&job);
            self.pool.spawn(move || {
                let result = job(&item);
                // The receiver only goes away if the caller stopped waiting
                let _ = tx.send((item, result));
            });
        }
        drop(tx);

        let mut results = Vec::with_capacity(expected);
        while let Some(pair) = rx.recv().await {
            results.push(pair);
        }
        results
    }
}
