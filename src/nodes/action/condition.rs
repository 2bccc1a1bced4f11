use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use log::error;
use serde_json::Value;
use tokio::time::{sleep, Instant};

use crate::{
    basic_types::{compare_values, CompareOp, NodeStatus},
    blackboard::DEFAULT_NAMESPACE,
    nodes::{NodeData, NodeResult},
};

pub type SyncConditionFn = dyn Fn() -> anyhow::Result<bool> + Send + Sync;
pub type AsyncConditionFn = dyn Fn() -> BoxFuture<'static, anyhow::Result<bool>> + Send + Sync;

#[derive(Clone)]
pub enum ConditionCallback {
    Sync(Arc<SyncConditionFn>),
    Async(Arc<AsyncConditionFn>),
}

#[derive(Debug, Clone, Default)]
pub struct ConditionStats {
    pub total_checks: u64,
    pub true_results: u64,
    pub false_results: u64,
    pub error_checks: u64,
    pub last_result: Option<bool>,
    pub last_error: Option<String>,
}

/// Checks a predicate and maps it to `SUCCESS`/`FAILURE`.
///
/// The predicate is either a user callback or a blackboard comparison
/// (`blackboard[namespace][key] <op> expected`) with the full operator
/// table, including membership and substring operators. Errors never leave
/// the leaf: they are recorded in `error_checks` and count as false. With
/// neither callback nor key the condition is vacuously true.
pub struct ConditionNode {
    callback: Option<ConditionCallback>,
    blackboard_key: Option<String>,
    expected: Value,
    operator: CompareOp,
    namespace: String,
    stats: ConditionStats,
}

impl ConditionNode {
    pub fn new() -> ConditionNode {
        Self {
            callback: None,
            blackboard_key: None,
            expected: Value::Null,
            operator: CompareOp::Eq,
            namespace: DEFAULT_NAMESPACE.to_string(),
            stats: ConditionStats::default(),
        }
    }

    pub fn with_callback(callback: ConditionCallback) -> ConditionNode {
        let mut node = Self::new();
        node.callback = Some(callback);
        node
    }

    pub fn from_sync<F>(callback: F) -> ConditionNode
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Self::with_callback(ConditionCallback::Sync(Arc::new(move || Ok(callback()))))
    }

    pub fn from_fallible<F>(callback: F) -> ConditionNode
    where
        F: Fn() -> anyhow::Result<bool> + Send + Sync + 'static,
    {
        Self::with_callback(ConditionCallback::Sync(Arc::new(callback)))
    }

    pub fn from_async<F>(callback: F) -> ConditionNode
    where
        F: Fn() -> BoxFuture<'static, anyhow::Result<bool>> + Send + Sync + 'static,
    {
        Self::with_callback(ConditionCallback::Async(Arc::new(callback)))
    }

    /// Blackboard comparison instead of a callback.
    pub fn for_key(
        key: impl AsRef<str>,
        operator: CompareOp,
        expected: impl Into<Value>,
    ) -> ConditionNode {
        let mut node = Self::new();
        node.blackboard_key = Some(key.as_ref().to_string());
        node.operator = operator;
        node.expected = expected.into();
        node
    }

    pub fn with_namespace(mut self, namespace: impl AsRef<str>) -> ConditionNode {
        self.namespace = namespace.as_ref().to_string();
        self
    }

    pub fn stats(&self) -> &ConditionStats {
        &self.stats
    }

    /// Evaluates the predicate once and records the outcome in the stats.
    pub(crate) async fn evaluate(&mut self, data: &NodeData) -> bool {
        let outcome = self.evaluate_inner(data).await;

        self.stats.total_checks += 1;
        match outcome {
            Ok(result) => {
                if result {
                    self.stats.true_results += 1;
                } else {
                    self.stats.false_results += 1;
                }
                self.stats.last_result = Some(result);
                result
            }
            Err(err) => {
                error!("[{}] error in condition: {err:#}", data.path());
                self.stats.error_checks += 1;
                self.stats.false_results += 1;
                self.stats.last_error = Some(format!("{err:#}"));
                self.stats.last_result = Some(false);
                false
            }
        }
    }

    async fn evaluate_inner(&self, data: &NodeData) -> anyhow::Result<bool> {
        if let Some(callback) = &self.callback {
            return match callback {
                ConditionCallback::Sync(callback) => {
                    let callback = Arc::clone(callback);
                    data.workers().run(move || callback()).await?
                }
                ConditionCallback::Async(callback) => callback().await,
            };
        }

        if let Some(key) = &self.blackboard_key {
            let value = data
                .blackboard()
                .get(key, &self.namespace)?
                .unwrap_or(Value::Null);
            return compare_values(&value, self.operator, &self.expected);
        }

        Ok(true)
    }

    pub(crate) async fn tick(&mut self, data: &mut NodeData) -> NodeResult {
        let result = self.evaluate(data).await;
        Ok(if result {
            NodeStatus::Success
        } else {
            NodeStatus::Failure
        })
    }
}

impl Default for ConditionNode {
    fn default() -> Self {
        Self::new()
    }
}

/// Samples a condition repeatedly over a time window.
///
/// The predicate is evaluated every `check_interval` for `duration` total;
/// the tick succeeds iff the fraction of true evaluations reaches
/// `required_success_ratio`. At least one check always runs, even when the
/// interval exceeds the window.
pub struct TimedConditionNode {
    inner: ConditionNode,
    duration: Duration,
    check_interval: Duration,
    required_success_ratio: f64,
}

impl TimedConditionNode {
    pub fn new(inner: ConditionNode, duration: Duration, check_interval: Duration) -> Self {
        Self {
            inner,
            duration,
            check_interval,
            required_success_ratio: 1.0,
        }
    }

    pub fn with_required_success_ratio(mut self, ratio: f64) -> TimedConditionNode {
        self.required_success_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    pub fn stats(&self) -> &ConditionStats {
        self.inner.stats()
    }

    pub(crate) async fn tick(&mut self, data: &mut NodeData) -> NodeResult {
        let start = Instant::now();
        let mut checks: u64 = 0;
        let mut successes: u64 = 0;

        loop {
            if self.inner.evaluate(data).await {
                successes += 1;
            }
            checks += 1;

            if start.elapsed() >= self.duration {
                break;
            }
            sleep(self.check_interval).await;
        }

        let ratio = successes as f64 / checks as f64;
        Ok(if ratio >= self.required_success_ratio {
            NodeStatus::Success
        } else {
            NodeStatus::Failure
        })
    }
}
