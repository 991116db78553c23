//! Sequential and parallel iteration primitives.
//!
//! The predecessor system expressed these as continuation-passing helpers
//! over callbacks; here the sequential runner is ordered awaiting and the
//! parallel runner is fire-and-join over a [`JoinSet`].

use std::future::Future;

use tokio::task::JoinSet;

/// The "continue" signal of the sequential runner. Returning [`Step::Stop`]
/// ends the run early; there is no other cancellation mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Stop,
}

/// Process `items` one at a time: each worker future completes before the
/// next one starts. Returns the number of items the worker ran for.
pub async fn run_sequential<I, F, Fut>(items: I, mut worker: F) -> usize
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = Step>,
{
    let mut processed = 0;
    for item in items {
        processed += 1;
        if worker(item).await == Step::Stop {
            break;
        }
    }
    processed
}

/// Start a worker for every item without waiting between them, then wait
/// for all of them to finish. Completion order is unspecified; nothing per
/// element is aggregated, only the completion count is returned.
pub async fn run_parallel<I, F, Fut>(items: I, worker: F) -> usize
where
    I: IntoIterator,
    F: Fn(I::Item) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    let mut set = JoinSet::new();
    for item in items {
        set.spawn(worker(item));
    }

    let mut completed = 0;
    while let Some(result) = set.join_next().await {
        if result.is_ok() {
            completed += 1;
        }
    }
    completed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn sequential_runner_preserves_order() {
        let seen = std::cell::RefCell::new(Vec::new());
        run_sequential(1..=5, |n| {
            seen.borrow_mut().push(n);
            async { Step::Continue }
        })
        .await;
        assert_eq!(*seen.borrow(), vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn sequential_runner_stops_early() {
        let processed = run_sequential(1..=10, |n| async move {
            if n == 3 {
                Step::Stop
            } else {
                Step::Continue
            }
        })
        .await;
        assert_eq!(processed, 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn parallel_runner_joins_every_worker_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let completed = run_parallel(0..16, |_| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        })
        .await;
        assert_eq!(completed, 16);
        assert_eq!(counter.load(Ordering::SeqCst), 16);
    }

    #[tokio::test]
    async fn parallel_runner_on_empty_input_returns_zero() {
        let completed = run_parallel(Vec::<u8>::new(), |_| async {}).await;
        assert_eq!(completed, 0);
    }
}
