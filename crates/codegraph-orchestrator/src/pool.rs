//! Worker pool for Pass-1 (spec §4.9): a dedicated rayon thread pool sized
//! by `PipelineConfig::workers`, not the global pool, so a process running
//! multiple `ingest()` calls (as the integration tests do) never fights
//! itself over `rayon::ThreadPoolBuilder::build_global`. Grounded on the
//! teacher's own dedicated-pool pattern (`codegraph-ir`'s
//! `infrastructure::python_adapter::init_rayon`), generalized from a
//! process-wide singleton to a per-run instance.

use codegraph_model::{CodegraphError, Result};
use rayon::ThreadPool;

pub struct WorkerPool {
    pool: ThreadPool,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .build()
            .map_err(|err| CodegraphError::configuration(format!("failed to build worker pool: {err}")))?;
        Ok(Self { pool })
    }

    /// Run `work` once per item of `items`, across the pool, preserving
    /// input order in the returned vector (spec §4.9: "the aggregator...
    /// proceeds to pass-2" only after all per-file results are collected;
    /// order matters downstream for the lexicographic-file-order guarantee
    /// in §5).
    pub fn map<T, R, F>(&self, items: Vec<T>, work: F) -> Vec<R>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Send + Sync,
    {
        use rayon::prelude::*;
        self.pool.install(|| items.into_par_iter().map(work).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_preserves_input_order() {
        let pool = WorkerPool::new(2).unwrap();
        let items = vec![1, 2, 3, 4, 5];
        let doubled = pool.map(items, |x| x * 2);
        assert_eq!(doubled, vec![2, 4, 6, 8, 10]);
    }

    #[test]
    fn zero_workers_is_clamped_to_one() {
        assert!(WorkerPool::new(0).is_ok());
    }
}
