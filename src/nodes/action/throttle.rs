use std::time::Duration;

use tokio::time::Instant;

use crate::{
    basic_types::NodeStatus,
    nodes::{NodeData, NodeResult},
};

use super::{ActionNode, CancelHandle};

/// Rate-limits a wrapped action.
///
/// Two gates apply: a minimum interval since the last completed execution,
/// and a maximum number of executions within a sliding window. When either
/// gate is closed the tick fails without invoking the inner action.
/// `RUNNING` outcomes do not count as completed executions.
pub struct ThrottleNode {
    inner: ActionNode,
    min_interval: Duration,
    max_executions: Option<usize>,
    window_size: Option<Duration>,
    last_execution: Option<Instant>,
    executions: Vec<Instant>,
}

impl ThrottleNode {
    pub fn new(inner: ActionNode) -> ThrottleNode {
        Self {
            inner,
            min_interval: Duration::ZERO,
            max_executions: None,
            window_size: None,
            last_execution: None,
            executions: Vec::new(),
        }
    }

    pub fn with_min_interval(mut self, min_interval: Duration) -> ThrottleNode {
        self.min_interval = min_interval;
        self
    }

    /// Allows at most `max_executions` completed runs per `window`.
    pub fn with_window(mut self, max_executions: usize, window: Duration) -> ThrottleNode {
        self.max_executions = Some(max_executions);
        self.window_size = Some(window);
        self
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.inner.cancel_handle()
    }

    fn can_execute(&mut self) -> bool {
        let now = Instant::now();

        if !self.min_interval.is_zero() {
            if let Some(last) = self.last_execution {
                if now.duration_since(last) < self.min_interval {
                    return false;
                }
            }
        }

        if let (Some(max_executions), Some(window)) = (self.max_executions, self.window_size) {
            let window_start = now.checked_sub(window);
            self.executions
                .retain(|t| window_start.map_or(true, |start| *t >= start));
            if self.executions.len() >= max_executions {
                return false;
            }
        }

        true
    }

    pub(crate) async fn tick(&mut self, data: &mut NodeData) -> NodeResult {
        if !self.can_execute() {
            return Ok(NodeStatus::Failure);
        }

        let status = self.inner.tick(data).await?;

        if !status.is_running() {
            let now = Instant::now();
            self.last_execution = Some(now);
            self.executions.push(now);
        }

        Ok(status)
    }

    /// The gate clocks are wall-time and deliberately survive a reset;
    /// only the inner action's retry/cancel state is cleared.
    pub(crate) fn reset(&mut self) {
        self.inner.reset();
    }
}
