//! Bounded worker pool for crawl sessions
//!
//! At most `max_concurrent` sessions crawl at once; up to `queue_capacity` more may wait for
//! a permit. Anything beyond that is rejected at submission instead of being dropped later.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// Errors returned when submitting work to the pool
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("Worker pool saturated ({capacity} sessions running or queued)")]
    Saturated { capacity: usize },
}

/// Releases an admission slot when the job ends, panicking or not
struct AdmissionGuard {
    admitted: Arc<AtomicUsize>,
}

impl Drop for AdmissionGuard {
    fn drop(&mut self) {
        self.admitted.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Clone)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    admitted: Arc<AtomicUsize>,
    capacity: usize,
}

impl WorkerPool {
    pub fn new(max_concurrent: usize, queue_capacity: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            admitted: Arc::new(AtomicUsize::new(0)),
            capacity: max_concurrent + queue_capacity,
        }
    }

    /// Spawns `job` once a worker is free
    ///
    /// Fails with `PoolError::Saturated` when running plus queued jobs already fill the pool.
    pub fn submit<F>(&self, job: F) -> Result<JoinHandle<()>, PoolError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let capacity = self.capacity;
        self.admitted
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < capacity).then_some(n + 1)
            })
            .map_err(|_| PoolError::Saturated { capacity })?;

        let guard = AdmissionGuard {
            admitted: self.admitted.clone(),
        };
        let semaphore = self.semaphore.clone();

        Ok(tokio::spawn(async move {
            let _guard = guard;
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    tracing::error!("Worker pool semaphore closed, dropping job");
                    return;
                }
            };
            job.await;
        }))
    }

    /// Jobs currently running or waiting for a worker
    #[cfg(test)]
    fn admitted(&self) -> usize {
        self.admitted.load(Ordering::SeqCst)
    }
}
