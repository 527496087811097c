//! Shared thread pool for bootstrap repetitions.
//!
//! Repetition loops in the noise ceiling and evaluation drivers run on one
//! pool with an enlarged stack, since every repetition pools and compares
//! whole RDM collections.

#[cfg(feature = "parallel")]
use rayon::ThreadPool;

#[cfg(feature = "parallel")]
use std::sync::OnceLock;

#[cfg(feature = "parallel")]
static THREAD_POOL: OnceLock<Option<ThreadPool>> = OnceLock::new();

/// Get or initialize the shared thread pool.
///
/// The pool uses an 8 MB stack per thread (vs rayon's default 2 MB) and one
/// thread per logical CPU. Returns `None` if the pool could not be built, in
/// which case callers fall back to rayon's global pool.
#[cfg(feature = "parallel")]
pub fn get_thread_pool() -> Option<&'static ThreadPool> {
    THREAD_POOL
        .get_or_init(|| {
            rayon::ThreadPoolBuilder::new()
                .stack_size(8 * 1024 * 1024)
                .thread_name(|i| format!("rdm-inference-{}", i))
                .build()
                .map_err(|err| tracing::warn!(error = %err, "falling back to the global rayon pool"))
                .ok()
        })
        .as_ref()
}

/// Execute a parallel operation on the shared thread pool.
#[cfg(feature = "parallel")]
pub fn install<OP, R>(op: OP) -> R
where
    OP: FnOnce() -> R + Send,
    R: Send,
{
    match get_thread_pool() {
        Some(pool) => pool.install(op),
        None => op(),
    }
}

/// Execute `op` directly; the `parallel` feature is disabled.
#[cfg(not(feature = "parallel"))]
pub fn install<OP, R>(op: OP) -> R
where
    OP: FnOnce() -> R,
{
    op()
}

#[cfg(all(test, feature = "parallel"))]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn test_install_preserves_order() {
        let out: Vec<usize> = install(|| (0..100).into_par_iter().map(|i| i * 2).collect());
        assert_eq!(out, (0..100).map(|i| i * 2).collect::<Vec<_>>());
    }
}
