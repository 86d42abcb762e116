//! Sequential and concurrent execution of statement lists.
//!
//! Both modes hand back one [`QueryResult`] per executed statement, in input
//! order. The executor is injected as a closure so the scheduling policy is
//! independent of the transport.

use std::future::Future;
use std::sync::Arc;

use tokio::{sync::Semaphore, task::JoinHandle};

use crate::{FeatureBaseError, QueryResult};

/// How a batch is dispatched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BatchMode {
    /// One statement at a time, in input order.
    #[default]
    Sequential,
    /// All statements in flight at once; results still in input order.
    Concurrent,
}

/// Run-mode configuration for [`crate::FeatureBaseClient::query_batch`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchOptions {
    pub mode: BatchMode,
    /// Halt at the first failed statement. Sequential mode only; concurrent
    /// batches always run every statement.
    pub stop_on_error: bool,
    /// Upper bound on in-flight statements in concurrent mode. `None` means
    /// unbounded; `Some(0)` is treated as 1.
    pub max_concurrency: Option<usize>,
}

impl BatchOptions {
    pub fn sequential() -> Self {
        Self::default()
    }

    pub fn concurrent() -> Self {
        Self {
            mode: BatchMode::Concurrent,
            ..Self::default()
        }
    }

    pub fn stop_on_error(mut self, stop_on_error: bool) -> Self {
        self.stop_on_error = stop_on_error;
        self
    }

    pub fn max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = Some(limit);
        self
    }
}

/// Runs `statements` one after another on the caller's task.
///
/// With `stop_on_error`, the output ends at the first failed result.
pub(crate) async fn run_sequential<F, Fut>(
    statements: Vec<String>,
    stop_on_error: bool,
    mut execute: F,
) -> Vec<QueryResult>
where
    F: FnMut(usize, String) -> Fut,
    Fut: Future<Output = QueryResult>,
{
    let mut results = Vec::with_capacity(statements.len());
    for (index, sql) in statements.into_iter().enumerate() {
        let result = execute(index, sql).await;
        let failed = !result.ok;
        results.push(result);
        if failed && stop_on_error {
            #[cfg(feature = "tracing")]
            tracing::debug!(index, "stopping batch at first failed statement");
            break;
        }
    }
    results
}

/// Spawns one task per statement and collects results by input index.
///
/// A task that panics or is cancelled fills its slot with a failed result;
/// siblings are unaffected. Dropping the returned future aborts every
/// statement still in flight.
pub(crate) async fn run_concurrent<F, Fut>(
    statements: Vec<String>,
    max_concurrency: Option<usize>,
    execute: F,
) -> Vec<QueryResult>
where
    F: Fn(usize, String) -> Fut,
    Fut: Future<Output = QueryResult> + Send + 'static,
{
    // A limit the batch can never reach is the same as no limit.
    let permits = max_concurrency
        .filter(|&limit| limit < statements.len())
        .map(|limit| Arc::new(Semaphore::new(limit.clamp(1, Semaphore::MAX_PERMITS))));

    let mut tasks = AbortOnDrop(Vec::with_capacity(statements.len()));
    for (index, sql) in statements.into_iter().enumerate() {
        let work = execute(index, sql.clone());
        let permits = permits.clone();
        let handle = tokio::spawn(async move {
            let _permit = match permits {
                Some(permits) => permits.acquire_owned().await.ok(),
                None => None,
            };
            work.await
        });
        tasks.0.push((sql, handle));
    }

    let mut results = Vec::with_capacity(tasks.0.len());
    for (sql, handle) in tasks.0.iter_mut() {
        let result = match handle.await {
            Ok(result) => result,
            Err(err) => {
                let err = FeatureBaseError::Task(err.to_string());
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %err, "batch statement task did not complete");
                QueryResult::failure(sql.as_str(), &err)
            }
        };
        results.push(result);
    }
    results
}

/// Aborts spawned statements that have not finished when dropped.
struct AbortOnDrop(Vec<(String, JoinHandle<QueryResult>)>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        for (_, handle) in &self.0 {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    };
    use std::time::Duration;

    use tokio::sync::Semaphore;

    use super::{run_concurrent, run_sequential, BatchMode, BatchOptions};
    use crate::{FailureKind, FeatureBaseError, QueryResult, Value};

    fn succeeded(sql: String, index: usize) -> QueryResult {
        QueryResult::success(sql, None, Some(vec![vec![Value::Integer(index as i64)]]))
    }

    fn statements(count: usize) -> Vec<String> {
        (0..count).map(|index| format!("SELECT {index};")).collect()
    }

    #[test]
    fn options_builders() {
        assert_eq!(BatchOptions::default().mode, BatchMode::Sequential);
        let options = BatchOptions::concurrent().max_concurrency(4);
        assert_eq!(options.mode, BatchMode::Concurrent);
        assert_eq!(options.max_concurrency, Some(4));
        assert!(BatchOptions::sequential().stop_on_error(true).stop_on_error);
    }

    #[tokio::test]
    async fn sequential_without_stop_runs_every_statement() {
        let results = run_sequential(statements(5), false, |index, sql| async move {
            if index == 1 || index == 3 {
                QueryResult::failure(sql, &FeatureBaseError::Query("boom".to_owned()))
            } else {
                succeeded(sql, index)
            }
        })
        .await;

        assert_eq!(results.len(), 5);
        let oks: Vec<_> = results.iter().map(|result| result.ok).collect();
        assert_eq!(oks, vec![true, false, true, false, true]);
    }

    #[tokio::test]
    async fn sequential_stop_on_error_truncates_after_failure() {
        let dispatched = Arc::new(Mutex::new(Vec::new()));
        let seen = dispatched.clone();
        let results = run_sequential(statements(4), true, move |index, sql| {
            seen.lock().expect("mutex must not be poisoned").push(index);
            async move {
                if index == 2 {
                    QueryResult::failure(sql, &FeatureBaseError::Query("syntax".to_owned()))
                } else {
                    succeeded(sql, index)
                }
            }
        })
        .await;

        assert_eq!(results.len(), 3);
        assert!(results[0].ok && results[1].ok);
        assert!(!results[2].ok);
        assert!(results[2]
            .error_message
            .as_deref()
            .is_some_and(|message| !message.is_empty()));
        assert_eq!(
            *dispatched.lock().expect("mutex must not be poisoned"),
            vec![0, 1, 2]
        );
    }

    #[tokio::test]
    async fn sequential_stop_on_error_keeps_full_length_on_success() {
        let results = run_sequential(statements(3), true, |index, sql| async move {
            succeeded(sql, index)
        })
        .await;
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn empty_batch_yields_empty_results() {
        let sequential =
            run_sequential(Vec::new(), true, |index, sql| async move { succeeded(sql, index) })
                .await;
        let concurrent =
            run_concurrent(Vec::new(), None, |index, sql| async move { succeeded(sql, index) })
                .await;
        assert!(sequential.is_empty());
        assert!(concurrent.is_empty());
    }

    #[tokio::test]
    async fn concurrent_results_follow_input_order_not_completion_order() {
        let completions = Arc::new(Mutex::new(Vec::new()));
        let order = completions.clone();
        let count = 6;

        let results = run_concurrent(statements(count), None, move |index, sql| {
            let order = order.clone();
            async move {
                // Earlier statements finish last.
                let delay = (count - index) as u64 * 15;
                tokio::time::sleep(Duration::from_millis(delay)).await;
                order.lock().expect("mutex must not be poisoned").push(index);
                succeeded(sql, index)
            }
        })
        .await;

        assert_eq!(results.len(), count);
        for (index, result) in results.iter().enumerate() {
            assert_eq!(result.sql, format!("SELECT {index};"));
            assert_eq!(result.data, Some(vec![vec![Value::Integer(index as i64)]]));
        }
        let completed = completions.lock().expect("mutex must not be poisoned").clone();
        assert_eq!(completed, (0..count).rev().collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn concurrent_failures_do_not_affect_siblings() {
        let results = run_concurrent(statements(3), None, |index, sql| async move {
            if index == 1 {
                QueryResult::failure(sql, &FeatureBaseError::Decode("eof".to_owned()))
            } else {
                succeeded(sql, index)
            }
        })
        .await;

        assert_eq!(results.len(), 3);
        assert!(results[0].ok);
        assert_eq!(results[1].failure, Some(FailureKind::Decode));
        assert!(results[2].ok);
    }

    #[tokio::test]
    async fn panicking_task_fills_its_slot_with_task_failure() {
        let results = run_concurrent(statements(3), None, |index, sql| async move {
            if index == 0 {
                panic!("executor blew up");
            }
            succeeded(sql, index)
        })
        .await;

        assert_eq!(results.len(), 3);
        assert!(!results[0].ok);
        assert_eq!(results[0].failure, Some(FailureKind::Task));
        assert_eq!(results[0].sql, "SELECT 0;");
        assert!(results[1].ok && results[2].ok);
    }

    #[tokio::test]
    async fn concurrent_runs_statements_in_parallel() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (current, highest) = (in_flight.clone(), peak.clone());

        run_concurrent(statements(5), None, move |index, sql| {
            let (current, highest) = (current.clone(), highest.clone());
            async move {
                let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                highest.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(40)).await;
                current.fetch_sub(1, Ordering::SeqCst);
                succeeded(sql, index)
            }
        })
        .await;

        assert!(peak.load(Ordering::SeqCst) > 1);
    }

    #[tokio::test]
    async fn oversized_concurrency_limit_runs_unbounded() {
        for limit in [usize::MAX, Semaphore::MAX_PERMITS + 1, 3] {
            let results = run_concurrent(statements(3), Some(limit), |index, sql| async move {
                succeeded(sql, index)
            })
            .await;
            assert_eq!(results.len(), 3);
            assert!(results.iter().all(|result| result.ok));
        }
    }

    #[tokio::test]
    async fn zero_concurrency_limit_still_makes_progress() {
        let results = run_concurrent(statements(3), Some(0), |index, sql| async move {
            succeeded(sql, index)
        })
        .await;
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn dropping_the_batch_aborts_statements_in_flight() {
        let finished = Arc::new(AtomicUsize::new(0));
        let done = finished.clone();

        let batch = run_concurrent(statements(3), None, move |index, sql| {
            let done = done.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(150)).await;
                done.fetch_add(1, Ordering::SeqCst);
                succeeded(sql, index)
            }
        });
        let outcome = tokio::time::timeout(Duration::from_millis(20), batch).await;
        assert!(outcome.is_err());

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn max_concurrency_bounds_in_flight_statements() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (current, highest) = (in_flight.clone(), peak.clone());

        let results = run_concurrent(statements(6), Some(2), move |index, sql| {
            let (current, highest) = (current.clone(), highest.clone());
            async move {
                let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                highest.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                current.fetch_sub(1, Ordering::SeqCst);
                succeeded(sql, index)
            }
        })
        .await;

        assert_eq!(results.len(), 6);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }
}
