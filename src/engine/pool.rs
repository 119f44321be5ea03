// src/engine/pool.rs
//
// Global thread pool for batch processing. One pool shared by every batch
// instead of a fresh pool per call: rayon pool construction is 10-20x the
// dispatch cost of a small batch, and a single pool keeps the thread count
// tied to available parallelism.
//
// The pool is initialized lazily on first use; changes to the environment
// after initialization have no effect.

use rayon::ThreadPool;
use std::sync::OnceLock;

/// Upper bound on the per-batch worker count.
pub const MAX_CONCURRENCY: usize = 1024;

/// Minimum number of rayon threads to ensure at least some parallelism
const MIN_RAYON_THREADS: usize = 1;

static GLOBAL_THREAD_POOL: OnceLock<ThreadPool> = OnceLock::new();

pub fn get_pool() -> &'static ThreadPool {
    GLOBAL_THREAD_POOL.get_or_init(|| {
        let num_threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(MIN_RAYON_THREADS);

        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()
            .unwrap_or_else(|e| {
                // Fallback: minimal pool if the preferred configuration fails
                rayon::ThreadPoolBuilder::new()
                    .num_threads(MIN_RAYON_THREADS)
                    .build()
                    .unwrap_or_else(|fallback| {
                        panic!(
                            "failed to create fallback thread pool with {} threads: {} (after {})",
                            MIN_RAYON_THREADS, fallback, e
                        )
                    })
            })
    })
}
