//! Batch executor.

use futures::future::join_all;
use std::future::Future;
use std::sync::Mutex;
use tokio::sync::Semaphore;

/// Runs a list of items through an async function with at most
/// `max_concurrency` calls in flight.
///
/// Results keep input order. A failing item never cancels its siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchExecutor {
    max_concurrency: usize,
}

impl BatchExecutor {
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// `on_complete(completed, total, &result)` fires once per finished item.
    /// The counter increment and the callback run under one lock, so `completed`
    /// is strictly increasing from 1 to `total`.
    pub async fn execute<T, R, E, F, Fut, C>(
        &self,
        items: Vec<T>,
        executor_fn: F,
        on_complete: C,
    ) -> Vec<Result<R, E>>
    where
        F: Fn(usize, T) -> Fut,
        Fut: Future<Output = Result<R, E>>,
        C: Fn(usize, usize, &Result<R, E>),
    {
        let total = items.len();
        let gate = Semaphore::new(self.max_concurrency);
        let completed = Mutex::new(0usize);

        let gate = &gate;
        let completed = &completed;
        let executor_fn = &executor_fn;
        let on_complete = &on_complete;

        let tasks = items.into_iter().enumerate().map(|(index, item)| async move {
            // The gate is never closed, so acquire only fails if that changes.
            let _permit = gate.acquire().await.ok();
            let result = executor_fn(index, item).await;
            let mut done = completed.lock().unwrap_or_else(|p| p.into_inner());
            *done += 1;
            on_complete(*done, total, &result);
            result
        });

        join_all(tasks).await
    }
}

impl Default for BatchExecutor {
    fn default() -> Self {
        Self::new(3)
    }
}
