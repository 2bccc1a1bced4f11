use crate::{
    basic_types::{MemoryPolicy, NodeStatus},
    nodes::{NodeData, NodeResult},
};

/// Ticks children in index order until one succeeds; the logical "OR".
///
/// - The first succeeding child stops the loop with `SUCCESS`.
/// - A `RUNNING` child propagates `RUNNING`.
/// - `FAILURE` only when every child has failed.
///
/// Memory policy works as in [`SequenceNode`](super::SequenceNode). No
/// children means `FAILURE`.
pub struct SelectorNode {
    pub(crate) memory_policy: MemoryPolicy,
    pub(crate) current_child: usize,
}

impl SelectorNode {
    pub fn new(memory_policy: MemoryPolicy) -> SelectorNode {
        Self {
            memory_policy,
            current_child: 0,
        }
    }

    pub(crate) async fn tick(&mut self, data: &mut NodeData) -> NodeResult {
        if data.children.is_empty() {
            return Ok(NodeStatus::Failure);
        }

        if self.memory_policy == MemoryPolicy::Fresh {
            self.current_child = 0;
        }

        while self.current_child < data.children.len() {
            let status = data.children[self.current_child].tick().await;

            match status {
                NodeStatus::Running => return Ok(NodeStatus::Running),
                NodeStatus::Success => {
                    self.current_child = 0;
                    return Ok(NodeStatus::Success);
                }
                // Failure, Error and Skipped all try the next alternative.
                _ => self.current_child += 1,
            }
        }

        self.current_child = 0;
        Ok(NodeStatus::Failure)
    }

    pub(crate) fn reset(&mut self) {
        self.current_child = 0;
    }
}

impl Default for SelectorNode {
    fn default() -> Self {
        Self::new(MemoryPolicy::Fresh)
    }
}
