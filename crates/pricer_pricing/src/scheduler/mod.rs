//! Task scheduling for independent valuations.
//!
//! [`TaskScheduler`] runs a closure over a slice of items either on the
//! calling thread or on a rayon thread pool. Both modes return results in
//! input order, so the choice never changes what is computed, only when.
//!
//! # Example
//!
//! ```rust
//! use pricer_pricing::scheduler::TaskScheduler;
//!
//! let items = [1.0, 2.0, 3.0];
//! let inline = TaskScheduler::inline();
//! let pool = TaskScheduler::with_threads(2).unwrap();
//!
//! let a = inline.map(&items, |_, x| x * 2.0);
//! let b = pool.map(&items, |_, x| x * 2.0);
//! assert_eq!(a, vec![2.0, 4.0, 6.0]);
//! assert_eq!(a, b);
//! ```

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Scheduler construction failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// The thread pool could not be built.
    #[error("Failed to build thread pool: {0}")]
    PoolBuild(String),
}

impl From<rayon::ThreadPoolBuildError> for SchedulerError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        Self::PoolBuild(err.to_string())
    }
}

/// Inline or thread pool execution of independent tasks.
///
/// Cloning shares the pool; its threads are released when the last handle
/// is dropped.
#[derive(Clone, Default)]
pub enum TaskScheduler {
    /// Run every task sequentially on the calling thread.
    #[default]
    Inline,
    /// Run tasks on a dedicated rayon pool.
    Pool(Arc<ThreadPool>),
}

impl TaskScheduler {
    /// Sequential scheduler.
    pub fn inline() -> Self {
        Self::Inline
    }

    /// Scheduler with `threads` workers; zero selects [`TaskScheduler::Inline`].
    ///
    /// # Errors
    ///
    /// `SchedulerError::PoolBuild` if the operating system refuses the threads.
    pub fn with_threads(threads: usize) -> Result<Self, SchedulerError> {
        if threads == 0 {
            return Ok(Self::Inline);
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("valuation-{i}"))
            .build()?;
        Ok(Self::Pool(Arc::new(pool)))
    }

    /// Scheduler sized to the available hardware parallelism.
    pub fn available_parallelism() -> Result<Self, SchedulerError> {
        Self::with_threads(num_cpus::get())
    }

    /// Number of worker threads; 0 for inline.
    pub fn thread_count(&self) -> usize {
        match self {
            Self::Inline => 0,
            Self::Pool(pool) => pool.current_num_threads(),
        }
    }

    /// Whether tasks run on the calling thread.
    pub fn is_inline(&self) -> bool {
        matches!(self, Self::Inline)
    }

    /// Apply `task` to every item, returning results in input order.
    ///
    /// `task` receives the item's index and the item.
    pub fn map<T, R, F>(&self, items: &[T], task: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(usize, &T) -> R + Sync,
    {
        match self {
            Self::Inline => items.iter().enumerate().map(|(i, x)| task(i, x)).collect(),
            Self::Pool(pool) => pool.install(|| {
                items
                    .par_iter()
                    .enumerate()
                    .map(|(i, x)| task(i, x))
                    .collect()
            }),
        }
    }

    /// Like [`map`](Self::map), dispatching higher priority items first.
    ///
    /// Ties keep input order. The returned vector is still in input order.
    pub fn map_prioritised<T, R, P, F>(&self, items: &[T], priority: P, task: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        P: Fn(&T) -> i32,
        F: Fn(usize, &T) -> R + Sync,
    {
        let mut order: Vec<usize> = (0..items.len()).collect();
        order.sort_by_key(|&i| std::cmp::Reverse(priority(&items[i])));

        let mut results: Vec<(usize, R)> = match self {
            Self::Inline => order.iter().map(|&i| (i, task(i, &items[i]))).collect(),
            Self::Pool(pool) => pool.install(|| {
                order
                    .par_iter()
                    .map(|&i| (i, task(i, &items[i])))
                    .collect()
            }),
        };
        results.sort_unstable_by_key(|(i, _)| *i);
        results.into_iter().map(|(_, r)| r).collect()
    }
}

impl fmt::Debug for TaskScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline => f.write_str("TaskScheduler::Inline"),
            Self::Pool(pool) => f
                .debug_tuple("TaskScheduler::Pool")
                .field(&pool.current_num_threads())
                .finish(),
        }
    }
}
