use std::collections::HashMap;

use futures::future::join_all;

use crate::{
    basic_types::{NodeStatus, ParallelPolicy},
    nodes::{NodeData, NodeResult},
};

/// Ticks every child concurrently on the same scheduler (no extra threads)
/// and reduces the collected statuses by policy.
///
/// Per-child statuses are collected in a map keyed by path. When
/// `synchronized` is set, children that already reported a terminal status
/// keep it and are not re-ticked until the whole composite resolves;
/// otherwise the map is cleared and every child runs on each tick.
///
/// `success_threshold`/`failure_threshold` short-circuit the policy when
/// the respective count is reached, success first. A terminal reduction
/// clears the map and resets any child still `RUNNING`. No children means
/// `SUCCESS`.
pub struct ParallelNode {
    policy: ParallelPolicy,
    success_threshold: Option<usize>,
    failure_threshold: Option<usize>,
    synchronized: bool,
    child_status: HashMap<String, NodeStatus>,
}

impl ParallelNode {
    pub fn new(policy: ParallelPolicy) -> ParallelNode {
        Self {
            policy,
            success_threshold: None,
            failure_threshold: None,
            synchronized: false,
            child_status: HashMap::new(),
        }
    }

    pub fn with_success_threshold(mut self, threshold: usize) -> ParallelNode {
        self.success_threshold = Some(threshold);
        self
    }

    pub fn with_failure_threshold(mut self, threshold: usize) -> ParallelNode {
        self.failure_threshold = Some(threshold);
        self
    }

    pub fn synchronized(mut self, synchronized: bool) -> ParallelNode {
        self.synchronized = synchronized;
        self
    }

    pub(crate) async fn tick(&mut self, data: &mut NodeData) -> NodeResult {
        if data.children.is_empty() {
            return Ok(NodeStatus::Success);
        }

        if !self.synchronized {
            self.child_status.clear();
        }

        let settled = &self.child_status;
        let ticks = data
            .children
            .iter_mut()
            .filter(|child| {
                !settled
                    .get(child.path())
                    .map_or(false, |status| status.is_terminal())
            })
            .map(|child| async move {
                let path = child.path().to_string();
                let status = child.tick().await;
                (path, status)
            });

        for (path, status) in join_all(ticks).await {
            self.child_status.insert(path, status);
        }

        let reduced = self.evaluate(data.children.len());
        if reduced.is_terminal() {
            self.child_status.clear();
            data.reset_running_children();
        }

        Ok(reduced)
    }

    /// Pure reduction over the collected status set.
    fn evaluate(&self, child_count: usize) -> NodeStatus {
        let mut success_count = 0;
        let mut failure_count = 0;
        let mut running_count = 0;

        for status in self.child_status.values() {
            match status {
                NodeStatus::Success => success_count += 1,
                NodeStatus::Failure | NodeStatus::Error => failure_count += 1,
                NodeStatus::Running => running_count += 1,
                _ => {}
            }
        }

        // Thresholds trump the policy; success is checked first.
        if let Some(threshold) = self.success_threshold {
            if success_count >= threshold {
                return NodeStatus::Success;
            }
        }
        if let Some(threshold) = self.failure_threshold {
            if failure_count >= threshold {
                return NodeStatus::Failure;
            }
        }

        match self.policy {
            ParallelPolicy::RequireAll => {
                if failure_count > 0 {
                    NodeStatus::Failure
                } else if running_count > 0 {
                    NodeStatus::Running
                } else {
                    NodeStatus::Success
                }
            }
            ParallelPolicy::RequireOne => {
                if success_count > 0 {
                    NodeStatus::Success
                } else if running_count > 0 {
                    NodeStatus::Running
                } else {
                    NodeStatus::Failure
                }
            }
            ParallelPolicy::SequenceStar => {
                if running_count > 0 {
                    NodeStatus::Running
                } else if success_count == child_count {
                    NodeStatus::Success
                } else {
                    NodeStatus::Failure
                }
            }
            ParallelPolicy::SelectorStar => {
                if running_count > 0 {
                    NodeStatus::Running
                } else if success_count > 0 {
                    NodeStatus::Success
                } else {
                    NodeStatus::Failure
                }
            }
        }
    }

    pub(crate) fn reset(&mut self) {
        self.child_status.clear();
    }
}

impl Default for ParallelNode {
    fn default() -> Self {
        Self::new(ParallelPolicy::RequireAll)
    }
}
