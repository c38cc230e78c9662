//! Bounded worker pool for blocking OS calls
//!
//! Frame capture, display-geometry queries and input injection all shell out
//! or touch the display server synchronously. They run on tokio's blocking
//! threads, gated by a fair semaphore so at most `workers` run at once and
//! waiters are admitted in FIFO order.
//!
//! A caller that stops awaiting its result does not cancel the job: the
//! permit travels with the blocking closure and is released when it returns.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// Default number of concurrent blocking jobs
pub const DEFAULT_WORKERS: usize = 4;

/// Worker pool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum concurrent blocking jobs
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
        }
    }
}

/// Process-wide pool shared by every session
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    workers: usize,
}

impl WorkerPool {
    /// Create a pool; a worker count of zero is raised to one.
    #[must_use]
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(workers)),
            workers,
        }
    }

    /// Create a pool from configuration
    #[must_use]
    pub fn from_config(config: &PoolConfig) -> Self {
        Self::new(config.workers)
    }

    /// Run a blocking job and await its result.
    ///
    /// A job that returns an error or panics surfaces as `Err`; the pool keeps
    /// serving later jobs either way.
    pub async fn submit<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| Error::pool("worker pool closed"))?;

        debug!(available = self.semaphore.available_permits(), "Worker slot acquired");

        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            job()
        });

        match handle.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => {
                warn!(error = %e, "Worker job panicked");
                Err(Error::pool("worker job panicked"))
            }
            Err(e) => Err(Error::pool(format!("worker job failed: {e}"))),
        }
    }

    /// Configured worker count
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Slots not currently held by a job
    #[must_use]
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[tokio::test]
    async fn test_submit_returns_value() {
        let pool = WorkerPool::new(2);
        let value = pool.submit(|| Ok(21 * 2)).await.unwrap();
        assert_eq!(value, 42);
        assert_eq!(pool.available(), 2);
    }

    #[tokio::test]
    async fn test_job_error_propagates() {
        let pool = WorkerPool::new(1);
        let err = pool
            .submit::<_, ()>(|| Err(Error::desktop("display unavailable")))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "desktop_error");
    }

    #[tokio::test]
    async fn test_panicking_job_does_not_poison_pool() {
        let pool = WorkerPool::new(1);
        let err = pool
            .submit::<_, ()>(|| panic!("capture exploded"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "pool_error");

        let ok = pool.submit(|| Ok("still alive")).await.unwrap();
        assert_eq!(ok, "still alive");
        assert_eq!(pool.available(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_is_bounded() {
        let pool = Arc::new(WorkerPool::new(2));
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..6 {
            let pool = pool.clone();
            let running = running.clone();
            let peak = peak.clone();
            handles.push(tokio::spawn(async move {
                pool.submit(move || {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(40));
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                })
                .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(pool.available(), 2);
    }

    #[tokio::test]
    async fn test_single_worker_runs_jobs_in_order() {
        let pool = WorkerPool::new(1);
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..5 {
            let order = order.clone();
            pool.submit(move || {
                order.lock().unwrap().push(i);
                Ok(())
            })
            .await
            .unwrap();
        }

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_zero_workers_clamped() {
        assert_eq!(WorkerPool::new(0).workers(), 1);
        assert_eq!(WorkerPool::default().workers(), DEFAULT_WORKERS);
    }
}
