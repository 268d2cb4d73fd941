//! Bounded concurrency executor
//!
//! Runs a collection of independent unit-of-work closures with a fixed
//! ceiling on how many are in flight at once. Exactly one result is
//! produced per input; the executor never interprets failures, so a
//! worker that wants to report one must encode it in its return value.

use futures::stream::{self, StreamExt};

/// Executes batches of async work under a concurrency ceiling
#[derive(Debug, Clone)]
pub struct BoundedExecutor {
    limit: usize,
}

impl BoundedExecutor {
    /// Create an executor with the given concurrency limit (minimum 1)
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
        }
    }

    /// Concurrency ceiling
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Run `worker` over every item, at most `limit` in flight
    ///
    /// Returns only after every item has produced a result. Results
    /// are sorted by input index before being returned; downstream
    /// tallying must not depend on this, but it keeps error output
    /// stable for humans.
    pub async fn run<T, R, F, Fut>(&self, items: Vec<T>, worker: F) -> Vec<R>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(usize, T) -> Fut + Send + Sync + Clone + 'static,
        Fut: std::future::Future<Output = R> + Send,
    {
        let indexed: Vec<(usize, T)> = items.into_iter().enumerate().collect();

        let mut results: Vec<(usize, R)> = stream::iter(indexed)
            .map(|(index, item)| {
                let worker = worker.clone();
                async move { (index, worker(index, item).await) }
            })
            .buffer_unordered(self.limit)
            .collect()
            .await;

        results.sort_by_key(|(index, _)| *index);
        results.into_iter().map(|(_, result)| result).collect()
    }
}
