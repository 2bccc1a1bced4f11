use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use futures::future::BoxFuture;
use log::{error, warn};
use tokio::time::Instant;

use crate::{
    basic_types::{ActionResult, NodeStatus},
    nodes::{NodeData, NodeResult},
};

pub type SyncActionFn = dyn Fn() -> anyhow::Result<ActionResult> + Send + Sync;
pub type AsyncActionFn = dyn Fn() -> BoxFuture<'static, anyhow::Result<ActionResult>> + Send + Sync;

/// A user action, either a plain function offloaded to the worker pool or
/// a future-returning function polled on the scheduler.
#[derive(Clone)]
pub enum ActionCallback {
    Sync(Arc<SyncActionFn>),
    Async(Arc<AsyncActionFn>),
}

/// Per-leaf execution counters, one record per callback invocation.
#[derive(Debug, Clone, Default)]
pub struct ActionStats {
    pub total_runs: u64,
    pub successful_runs: u64,
    pub failed_runs: u64,
    pub error_runs: u64,
    pub average_duration: Duration,
    pub last_result: Option<ActionResult>,
    pub last_error: Option<String>,
}

impl ActionStats {
    fn record(&mut self, result: ActionResult, duration: Duration) {
        self.total_runs += 1;
        match result {
            ActionResult::Success => self.successful_runs += 1,
            ActionResult::Failure => self.failed_runs += 1,
            ActionResult::Error => self.error_runs += 1,
            _ => {}
        }

        let total = self.total_runs as f64;
        let mean = self.average_duration.as_secs_f64();
        self.average_duration =
            Duration::from_secs_f64((mean * (total - 1.0) + duration.as_secs_f64()) / total);
        self.last_result = Some(result);
    }
}

/// One-shot cancellation handle for a cancellable leaf ([`ActionNode`],
/// [`WaitNode`](super::WaitNode)). Requesting a cancel makes the leaf's
/// next tick return `FAILURE` without doing its work.
#[derive(Clone)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub(crate) fn new(flag: Arc<AtomicBool>) -> CancelHandle {
        Self { flag }
    }

    pub fn request_cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

/// Wraps a user callback into a tickable leaf.
///
/// The callback's return value decides the status: an [`ActionResult`]
/// maps directly (`ERROR`/`CANCELLED` collapse to `FAILURE` at the tree
/// level), and `bool`/`()` convert through `Into<ActionResult>`. A node
/// with no callback succeeds.
///
/// `retry_count` re-invokes the callback on `FAILURE` within the same tick
/// (never on `RUNNING`); `timeout` bounds each invocation; `ignore_errors`
/// demotes callback errors to `SUCCESS` instead of `FAILURE`.
pub struct ActionNode {
    callback: Option<ActionCallback>,
    timeout: Option<Duration>,
    retry_count: u32,
    ignore_errors: bool,
    current_retry: u32,
    cancel_requested: Arc<AtomicBool>,
    stats: ActionStats,
}

impl ActionNode {
    pub fn new() -> ActionNode {
        Self {
            callback: None,
            timeout: None,
            retry_count: 0,
            ignore_errors: false,
            current_retry: 0,
            cancel_requested: Arc::new(AtomicBool::new(false)),
            stats: ActionStats::default(),
        }
    }

    pub fn with_callback(callback: ActionCallback) -> ActionNode {
        let mut node = Self::new();
        node.callback = Some(callback);
        node
    }

    /// Infallible synchronous callback; anything convertible to an
    /// [`ActionResult`] works, including `bool` and `()`.
    pub fn from_sync<F, R>(callback: F) -> ActionNode
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: Into<ActionResult>,
    {
        Self::with_callback(ActionCallback::Sync(Arc::new(move || {
            Ok(callback().into())
        })))
    }

    /// Synchronous callback that may fail.
    pub fn from_fallible<F>(callback: F) -> ActionNode
    where
        F: Fn() -> anyhow::Result<ActionResult> + Send + Sync + 'static,
    {
        Self::with_callback(ActionCallback::Sync(Arc::new(callback)))
    }

    /// Future-returning callback, polled on the tree's scheduler.
    pub fn from_async<F>(callback: F) -> ActionNode
    where
        F: Fn() -> BoxFuture<'static, anyhow::Result<ActionResult>> + Send + Sync + 'static,
    {
        Self::with_callback(ActionCallback::Async(Arc::new(callback)))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> ActionNode {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_retry_count(mut self, retry_count: u32) -> ActionNode {
        self.retry_count = retry_count;
        self
    }

    pub fn with_ignore_errors(mut self, ignore_errors: bool) -> ActionNode {
        self.ignore_errors = ignore_errors;
        self
    }

    pub fn stats(&self) -> &ActionStats {
        &self.stats
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle::new(Arc::clone(&self.cancel_requested))
    }

    pub fn request_cancel(&self) {
        self.cancel_requested.store(true, Ordering::SeqCst);
    }

    /// Runs the callback once; callback errors become outcomes, never
    /// `Err`.
    async fn execute(&mut self, data: &NodeData) -> ActionResult {
        let Some(callback) = &self.callback else {
            return ActionResult::Success;
        };

        let outcome = match callback {
            ActionCallback::Sync(callback) => {
                let callback = Arc::clone(callback);
                data.workers()
                    .run(move || callback())
                    .await
                    .and_then(|result| result)
            }
            ActionCallback::Async(callback) => callback().await,
        };

        match outcome {
            Ok(result) => result,
            Err(err) => {
                if self.ignore_errors {
                    warn!("[{}] ignored error in action: {err:#}", data.path());
                    ActionResult::Success
                } else {
                    error!("[{}] error in action: {err:#}", data.path());
                    self.stats.last_error = Some(format!("{err:#}"));
                    ActionResult::Error
                }
            }
        }
    }

    pub(crate) async fn tick(&mut self, data: &mut NodeData) -> NodeResult {
        if self.cancel_requested.swap(false, Ordering::SeqCst) {
            return Ok(NodeStatus::Failure);
        }

        loop {
            let start = Instant::now();

            let result = match self.timeout {
                Some(limit) => match tokio::time::timeout(limit, self.execute(data)).await {
                    Ok(result) => result,
                    Err(_) => {
                        warn!(
                            "[{}] action timed out after {:.3}s",
                            data.path(),
                            limit.as_secs_f64()
                        );
                        ActionResult::Failure
                    }
                },
                None => self.execute(data).await,
            };

            self.stats.record(result, start.elapsed());

            match result {
                ActionResult::Success | ActionResult::Running => {
                    self.current_retry = 0;
                    return Ok(result.into_status());
                }
                ActionResult::Failure if self.current_retry < self.retry_count => {
                    self.current_retry += 1;
                }
                other => {
                    self.current_retry = 0;
                    return Ok(other.into_status());
                }
            }
        }
    }

    pub(crate) fn reset(&mut self) {
        self.current_retry = 0;
        self.cancel_requested.store(false, Ordering::SeqCst);
    }
}

impl Default for ActionNode {
    fn default() -> Self {
        Self::new()
    }
}
