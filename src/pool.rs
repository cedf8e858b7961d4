//! Bounded pool for blocking image work.
//!
//! Decoding and encoding are CPU-bound and must not run on the async
//! runtime's threads. [`WorkerPool`] owns a dedicated rayon pool sized by
//! [`effective_threads`](crate::config::effective_threads) and hands results
//! back to the awaiting request over a oneshot channel.
//!
//! A request whose client has gone away drops its receiver. Jobs that have
//! not started by then are skipped. Jobs already running finish and their
//! result is discarded.

use rayon::{ThreadPool, ThreadPoolBuilder};
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, error};

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Failed to build worker pool: {0}")]
    Build(#[from] rayon::ThreadPoolBuildError),
    #[error("Worker stopped before producing a result")]
    WorkerLost,
}

pub struct WorkerPool {
    pool: ThreadPool,
}

impl WorkerPool {
    pub fn new(threads: usize) -> Result<Self, PoolError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("iiif-worker-{i}"))
            .panic_handler(|payload| {
                let msg = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(panic = %msg, "image worker panicked");
            })
            .build()?;
        Ok(Self { pool })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `job` on the pool and wait for its result.
    pub async fn run<T, F>(&self, job: F) -> Result<T, PoolError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.pool.spawn(move || {
            if tx.is_closed() {
                debug!("request cancelled before work started");
                return;
            }
            // A failed send means the requester disconnected mid-job.
            let _ = tx.send(job());
        });
        rx.await.map_err(|_| PoolError::WorkerLost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc;
    use std::time::Duration;

    #[tokio::test]
    async fn runs_job_and_returns_result() {
        let pool = WorkerPool::new(2).unwrap();
        let value = pool.run(|| 6 * 7).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn runs_off_the_calling_thread() {
        let pool = WorkerPool::new(1).unwrap();
        let name = pool
            .run(|| std::thread::current().name().map(str::to_string))
            .await
            .unwrap();
        assert_eq!(name.as_deref(), Some("iiif-worker-0"));
    }

    #[test]
    fn thread_count_is_respected() {
        let pool = WorkerPool::new(3).unwrap();
        assert_eq!(pool.threads(), 3);
    }

    #[tokio::test]
    async fn panicking_job_reports_worker_lost() {
        let pool = WorkerPool::new(1).unwrap();
        let result = pool.run(|| -> u32 { panic!("boom") }).await;
        assert!(matches!(result, Err(PoolError::WorkerLost)));

        // The pool survives the panic.
        assert_eq!(pool.run(|| 1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn cancelled_request_skips_queued_job() {
        let pool = WorkerPool::new(1).unwrap();

        // Occupy the single worker until released.
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let mut blocker = Box::pin(pool.run(move || {
            let _ = release_rx.recv();
        }));
        // Poll once so the blocking job is submitted.
        assert!(
            tokio::time::timeout(Duration::from_millis(10), &mut blocker)
                .await
                .is_err()
        );

        // Queue a second job, then drop its future before it can start.
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        let mut queued = Box::pin(pool.run(move || flag.store(true, Ordering::SeqCst)));
        assert!(
            tokio::time::timeout(Duration::from_millis(10), &mut queued)
                .await
                .is_err()
        );
        drop(queued);

        release_tx.send(()).unwrap();
        blocker.await.unwrap();
        // Anything queued after the cancelled job runs after it too.
        pool.run(|| ()).await.unwrap();

        assert!(!ran.load(Ordering::SeqCst));
    }
}
