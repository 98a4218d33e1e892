//! Bounded-parallel chunk dispatch.
//!
//! The dispatcher runs a per-chunk operation over all chunk indices in
//! ordered batches no larger than the concurrency limit. Chunk ciphering is
//! CPU-bound, so every worker runs on its own OS thread via the blocking
//! pool; completion is signaled through join handles, never by polling
//! artifact files.
//!
//! # Failure policy
//!
//! The first failure in a batch flips a shared cancellation flag: workers
//! that have not started yet return immediately, and no further batch is
//! launched. Workers already inside the operation run to completion; their
//! artifacts are discarded by the caller. A per-worker timeout, when
//! configured, is treated as a worker failure.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::error::{CryptError, Result};

pub mod artifact;
pub mod merge;

pub struct Dispatcher {
    /// Maximum number of simultaneously active workers.
    concurrency: usize,

    /// Optional deadline applied to every worker of a batch.
    timeout: Option<Duration>,
}

impl Dispatcher {
    pub fn new(concurrency: usize, timeout: Option<Duration>) -> Result<Self> {
        if concurrency == 0 {
            return Err(CryptError::Configuration("concurrency limit must be a positive integer".into()));
        }

        Ok(Self { concurrency, timeout })
    }

    /// Runs `op` once per chunk index in `0..chunk_count`.
    ///
    /// Indices are partitioned into ordered batches of at most the
    /// concurrency limit; every join handle of a batch is awaited (barrier)
    /// before the next batch starts. The first error is returned after its
    /// batch has fully drained.
    pub async fn run<F>(&self, chunk_count: u64, op: F) -> Result<()>
    where
        F: Fn(u64) -> Result<()> + Send + Sync + 'static,
    {
        let op = Arc::new(op);
        let cancelled = Arc::new(AtomicBool::new(false));

        let mut indices = 0..chunk_count;
        loop {
            let batch: Vec<u64> = indices.by_ref().take(self.concurrency).collect();
            if batch.is_empty() {
                break;
            }

            debug!(first = batch[0], len = batch.len(), "dispatching batch");

            let deadline = self.timeout.map(|t| Instant::now() + t);
            let handles: Vec<_> = batch
                .into_iter()
                .map(|index| {
                    let op = Arc::clone(&op);
                    let cancelled = Arc::clone(&cancelled);
                    let handle = tokio::task::spawn_blocking(move || {
                        if cancelled.load(Ordering::Acquire) {
                            return Err(CryptError::worker(format!("chunk {index}: cancelled after sibling failure")));
                        }
                        op(index)
                    });
                    (index, handle)
                })
                .collect();

            let mut first_error: Option<CryptError> = None;
            for (index, handle) in handles {
                let joined = match deadline {
                    Some(at) => match tokio::time::timeout_at(at, handle).await {
                        Ok(joined) => joined,
                        Err(_) => {
                            cancelled.store(true, Ordering::Release);
                            first_error.get_or_insert_with(|| CryptError::worker(format!("chunk {index}: worker timed out")));
                            continue;
                        }
                    },
                    None => handle.await,
                };

                let result = joined.unwrap_or_else(|e| Err(CryptError::worker(format!("chunk {index}: worker panicked: {e}"))));
                if let Err(e) = result {
                    cancelled.store(true, Ordering::Release);
                    first_error.get_or_insert(e);
                }
            }

            if let Some(e) = first_error {
                return Err(e);
            }
        }

        Ok(())
    }
}
