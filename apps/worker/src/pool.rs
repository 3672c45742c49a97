//! Bounded CPU worker pool for the scoring stages
//!
//! Corpus builds, prefilter batches and DTW reranking all run inside one
//! dedicated rayon pool so a query never competes with the tokio runtime's
//! own threads.

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{MatchError, MatchResult};

/// Dedicated thread pool with a fixed partition count
pub struct WorkerPool {
    pool: ThreadPool,
    threads: usize,
}

impl WorkerPool {
    /// Create a pool with `threads` workers
    pub fn new(threads: usize) -> MatchResult<Self> {
        if threads == 0 {
            return Err(MatchError::invalid_parameters(
                "worker pool needs at least one thread",
            ));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("cantus-worker-{}", i))
            .build()?;
        tracing::debug!(threads, "Worker pool started");
        Ok(Self { pool, threads })
    }

    /// Create a pool sized to the machine's available parallelism
    pub fn with_available_parallelism() -> MatchResult<Self> {
        Self::new(default_threads())
    }

    /// Number of partitions work should be split into (one per thread)
    pub fn partitions(&self) -> usize {
        self.threads
    }

    /// Run a closure inside the pool; rayon iterators used within it are
    /// scheduled on this pool's threads
    pub fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.threads)
            .finish()
    }
}

/// Available parallelism, falling back to a single thread
pub fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn test_zero_threads_rejected() {
        assert!(matches!(
            WorkerPool::new(0),
            Err(MatchError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_install_runs_on_pool() {
        let pool = WorkerPool::new(2).unwrap();
        assert_eq!(pool.partitions(), 2);
        let name = pool.install(|| std::thread::current().name().map(str::to_string));
        assert_eq!(name.as_deref().map(|n| n.starts_with("cantus-worker-")), Some(true));

        let total: u64 = pool.install(|| (1..=100u64).into_par_iter().sum());
        assert_eq!(total, 5050);
    }
}
