//! Fan-out executor
//!
//! Runs one batch of fetch tasks concurrently and returns their outcomes in
//! input order. Tasks bound to an unavailable slot become `Skipped` without
//! being scheduled. Every scheduled task is spawned on the runtime and awaited
//! with its own timeout: a panic or error in one task is converted into that
//! task's `Failed` outcome and never reaches its siblings. When a timeout
//! fires the executor stops waiting and detaches the task; the adapter call
//! may keep running in the background.

use futures::future::{BoxFuture, FutureExt, join_all};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::capability::SourceData;
use crate::error::{FailureKind, TaskError};
use crate::outcome::FetchOutcome;
use crate::registry::AdapterSlot;
use crate::source::SourceId;

type TaskFuture = BoxFuture<'static, Result<Option<SourceData>, TaskError>>;

/// Attribution for one task: which source, and which section of the result
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskKey {
    pub source: SourceId,
    pub section: String,
}

enum TaskWork {
    Ready(TaskFuture),
    Unavailable(String),
}

/// One unit of work bound to an adapter slot
pub struct FetchTask {
    key: TaskKey,
    timeout: Option<Duration>,
    work: TaskWork,
}

impl FetchTask {
    /// Bind a call to an adapter slot
    ///
    /// `call` is only invoked when the slot is available; otherwise the task
    /// is created pre-resolved as skipped, with the slot's reason.
    pub fn bind<A, F, Fut>(slot: &AdapterSlot<A>, section: impl Into<String>, call: F) -> Self
    where
        A: ?Sized + Send + Sync + 'static,
        F: FnOnce(Arc<A>) -> Fut,
        Fut: Future<Output = Result<Option<SourceData>, TaskError>> + Send + 'static,
    {
        let key = TaskKey {
            source: slot.source(),
            section: section.into(),
        };

        let work = match (slot.adapter(), slot.unavailable_reason()) {
            (Some(adapter), _) => TaskWork::Ready(call(Arc::clone(adapter)).boxed()),
            (None, Some(reason)) => TaskWork::Unavailable(reason.to_string()),
            (None, None) => TaskWork::Unavailable("adapter unavailable".to_string()),
        };

        Self {
            key,
            timeout: None,
            work,
        }
    }

    /// A task that will not be attempted
    pub fn skipped(
        source: SourceId,
        section: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            key: TaskKey {
                source,
                section: section.into(),
            },
            timeout: None,
            work: TaskWork::Unavailable(reason.into()),
        }
    }

    /// Override the executor's per-task timeout for this task
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn key(&self) -> TaskKey {
        self.key.clone()
    }

    pub fn source(&self) -> SourceId {
        self.key.source
    }

    /// Whether the task will be dispatched at all
    pub fn is_runnable(&self) -> bool {
        matches!(self.work, TaskWork::Ready(_))
    }
}

impl std::fmt::Debug for FetchTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchTask")
            .field("key", &self.key)
            .field("timeout", &self.timeout)
            .field("runnable", &self.is_runnable())
            .finish()
    }
}

/// Concurrent, order-preserving task runner
#[derive(Debug, Clone, Copy)]
pub struct FanOutExecutor {
    timeout: Duration,
}

impl FanOutExecutor {
    /// Create an executor with the default per-task timeout
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run every task and return one outcome per task, in input order
    pub async fn run(&self, tasks: Vec<FetchTask>) -> Vec<FetchOutcome> {
        let started = Instant::now();
        let total = tasks.len();
        let pending = tasks
            .into_iter()
            .map(|task| self.execute(task))
            .collect::<Vec<_>>();

        let outcomes = join_all(pending).await;

        debug!(
            tasks = total,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "fan-out batch finished"
        );
        outcomes
    }

    async fn execute(&self, task: FetchTask) -> FetchOutcome {
        let FetchTask { key, timeout, work } = task;
        let budget = timeout.unwrap_or(self.timeout);

        let future = match work {
            TaskWork::Unavailable(reason) => {
                debug!(source = %key.source, section = %key.section, %reason, "skipped");
                return FetchOutcome::Skipped { reason };
            }
            TaskWork::Ready(future) => future,
        };

        let handle = tokio::spawn(future);
        let outcome = match tokio::time::timeout(budget, handle).await {
            Ok(Ok(result)) => FetchOutcome::from(result),
            Ok(Err(join_error)) => FetchOutcome::failed(
                FailureKind::UpstreamError,
                format!("adapter task aborted: {join_error}"),
            ),
            // Dropping the JoinHandle detaches the task; we only stop waiting.
            Err(_) => FetchOutcome::failed(
                FailureKind::Timeout,
                format!("timed out after {:.1}s", budget.as_secs_f64()),
            ),
        };

        match &outcome {
            FetchOutcome::Failed { kind, message } => {
                warn!(source = %key.source, section = %key.section, %kind, "{message}");
            }
            other => {
                debug!(
                    source = %key.source,
                    section = %key.section,
                    status = other.status(),
                    "completed"
                );
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{Headline, NewsSource};
    use crate::error::{AdapterError, AdapterResult, Unavailable};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// News fake that sleeps, then answers with one headline named after the query
    struct SlowNews {
        calls: AtomicUsize,
    }

    impl SlowNews {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl NewsSource for SlowNews {
        async fn headlines(
            &self,
            query: Option<&str>,
            _limit: usize,
        ) -> AdapterResult<Vec<Headline>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let query = query.unwrap_or_default();
            let delay_ms: u64 = query.parse().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            if query == "error" {
                return Err(AdapterError::Network("connection reset".to_string()));
            }
            if query == "none" {
                return Ok(Vec::new());
            }
            Ok(vec![Headline {
                title: query.to_string(),
                source_name: None,
                published: None,
                url: None,
            }])
        }
    }

    fn news_slot(news: &Arc<SlowNews>) -> AdapterSlot<dyn NewsSource> {
        let adapter = Arc::clone(news) as Arc<dyn NewsSource>;
        AdapterSlot::resolve(SourceId::News, move || Ok(adapter))
    }

    fn headline_task(slot: &AdapterSlot<dyn NewsSource>, query: &str) -> FetchTask {
        let query = query.to_string();
        FetchTask::bind(slot, query.clone(), move |news| async move {
            Ok(SourceData::headlines(news.headlines(Some(&query), 1).await?))
        })
    }

    fn title_of(outcome: &FetchOutcome) -> &str {
        match outcome.data() {
            Some(SourceData::Headlines(items)) => &items[0].title,
            other => panic!("expected headlines, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_zero_tasks() {
        let outcomes = FanOutExecutor::new(Duration::from_secs(1)).run(Vec::new()).await;
        assert!(outcomes.is_empty());
    }

    #[tokio::test]
    async fn test_output_order_matches_input_order() {
        let news = SlowNews::new();
        let slot = news_slot(&news);
        // Non-monotonic latencies: completion order differs from input order
        let delays = ["120", "10", "80", "0", "40", "60"];
        let tasks = delays.iter().map(|d| headline_task(&slot, d)).collect();

        let outcomes = FanOutExecutor::new(Duration::from_secs(5)).run(tasks).await;

        let titles: Vec<&str> = outcomes.iter().map(title_of).collect();
        assert_eq!(titles, delays.to_vec());
    }

    #[tokio::test]
    async fn test_unavailable_slot_is_skipped_and_never_invoked() {
        let calls = Arc::new(AtomicUsize::new(0));
        let spy = Arc::clone(&calls);
        let slot: AdapterSlot<dyn NewsSource> = AdapterSlot::resolve(SourceId::News, || {
            Err(Unavailable::MissingCredential("NEWS_API_KEY".to_string()))
        });

        let task = FetchTask::bind(&slot, "headlines", move |_news| {
            spy.fetch_add(1, Ordering::SeqCst);
            async { Ok(None) }
        });
        assert!(!task.is_runnable());

        let outcomes = FanOutExecutor::new(Duration::from_secs(1)).run(vec![task]).await;

        assert_eq!(
            outcomes,
            vec![FetchOutcome::skipped("missing credential: NEWS_API_KEY")]
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_all_unavailable_is_all_skipped() {
        let tasks = SourceId::ALL
            .iter()
            .map(|&source| FetchTask::skipped(source, source.as_str(), "not configured"))
            .collect();

        let outcomes = FanOutExecutor::new(Duration::from_secs(1)).run(tasks).await;

        assert_eq!(outcomes.len(), 6);
        assert!(outcomes.iter().all(|o| matches!(o, FetchOutcome::Skipped { .. })));
    }

    #[tokio::test]
    async fn test_timeout_bounds_total_latency() {
        let news = SlowNews::new();
        let slot = news_slot(&news);
        let tasks = vec![
            headline_task(&slot, "5000"),
            headline_task(&slot, "5000"),
            headline_task(&slot, "0"),
        ];

        let started = Instant::now();
        let outcomes = FanOutExecutor::new(Duration::from_millis(100)).run(tasks).await;
        let elapsed = started.elapsed();

        assert_eq!(outcomes[0].failure_kind(), Some(FailureKind::Timeout));
        assert_eq!(outcomes[1].failure_kind(), Some(FailureKind::Timeout));
        assert!(outcomes[2].is_success());
        // max of the timeouts, not their sum, and nowhere near the 5s sleeps
        assert!(elapsed < Duration::from_secs(2), "took {elapsed:?}");
    }

    #[tokio::test]
    async fn test_per_task_timeout_override() {
        let news = SlowNews::new();
        let slot = news_slot(&news);
        let tasks = vec![headline_task(&slot, "150").with_timeout(Duration::from_secs(2))];

        let outcomes = FanOutExecutor::new(Duration::from_millis(50)).run(tasks).await;
        assert!(outcomes[0].is_success());
    }

    #[tokio::test]
    async fn test_errors_and_empty_are_isolated() {
        let news = SlowNews::new();
        let slot = news_slot(&news);
        let tasks = vec![
            headline_task(&slot, "error"),
            headline_task(&slot, "none"),
            headline_task(&slot, "7"),
        ];

        let outcomes = FanOutExecutor::new(Duration::from_secs(1)).run(tasks).await;

        assert_eq!(outcomes[0].failure_kind(), Some(FailureKind::UpstreamError));
        assert_eq!(outcomes[1], FetchOutcome::Empty);
        assert_eq!(title_of(&outcomes[2]), "7");
        assert_eq!(news.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_panicking_task_is_contained() {
        let news = SlowNews::new();
        let slot = news_slot(&news);
        let panicking = FetchTask::bind(&slot, "boom", |_news| async {
            if true {
                panic!("parser exploded");
            }
            Ok(None)
        });
        let tasks = vec![panicking, headline_task(&slot, "3")];

        let outcomes = FanOutExecutor::new(Duration::from_secs(1)).run(tasks).await;

        assert_eq!(outcomes[0].failure_kind(), Some(FailureKind::UpstreamError));
        assert_eq!(title_of(&outcomes[1]), "3");
    }
}
