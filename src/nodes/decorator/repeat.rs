use crate::{
    basic_types::NodeStatus,
    nodes::{NodeData, NodeResult},
};

/// Runs the child for a number of cycles; a cycle is one terminal child
/// resolution (`RUNNING` ticks continue the current cycle).
///
/// `num_cycles == -1` repeats without bound; such a repeat only resolves
/// through `success_threshold`/`failure_threshold`, which terminate early
/// once the respective count of child outcomes is reached. A bounded
/// repeat returns `RUNNING` until the cycle bound is met, then the last
/// child status. `reset_after = n` resets the child every `n` cycles.
pub struct RepeatNode {
    num_cycles: i64,
    success_threshold: Option<u64>,
    failure_threshold: Option<u64>,
    reset_after: Option<u64>,
    current_cycle: u64,
    success_count: u64,
    failure_count: u64,
}

impl RepeatNode {
    pub fn new(num_cycles: i64) -> RepeatNode {
        Self {
            num_cycles,
            success_threshold: None,
            failure_threshold: None,
            reset_after: None,
            current_cycle: 0,
            success_count: 0,
            failure_count: 0,
        }
    }

    pub fn with_success_threshold(mut self, threshold: u64) -> RepeatNode {
        self.success_threshold = Some(threshold);
        self
    }

    pub fn with_failure_threshold(mut self, threshold: u64) -> RepeatNode {
        self.failure_threshold = Some(threshold);
        self
    }

    pub fn with_reset_after(mut self, cycles: u64) -> RepeatNode {
        self.reset_after = Some(cycles);
        self
    }

    pub(crate) async fn tick(&mut self, data: &mut NodeData) -> NodeResult {
        if data.children.is_empty() {
            return Ok(NodeStatus::Failure);
        }

        if let Some(every) = self.reset_after {
            if every > 0 && self.current_cycle % every == 0 {
                data.child_mut().expect("checked above").reset();
            }
        }

        let status = data.child_mut().expect("checked above").tick().await;

        if status.is_running() {
            return Ok(NodeStatus::Running);
        }

        self.current_cycle += 1;
        match status {
            NodeStatus::Success => self.success_count += 1,
            NodeStatus::Failure | NodeStatus::Error => self.failure_count += 1,
            _ => {}
        }

        if let Some(threshold) = self.success_threshold {
            if self.success_count >= threshold {
                self.reset();
                return Ok(NodeStatus::Success);
            }
        }
        if let Some(threshold) = self.failure_threshold {
            if self.failure_count >= threshold {
                self.reset();
                return Ok(NodeStatus::Failure);
            }
        }

        if self.num_cycles != -1 && self.current_cycle >= self.num_cycles as u64 {
            self.reset();
            return Ok(status);
        }

        Ok(NodeStatus::Running)
    }

    pub(crate) fn reset(&mut self) {
        self.current_cycle = 0;
        self.success_count = 0;
        self.failure_count = 0;
    }
}
