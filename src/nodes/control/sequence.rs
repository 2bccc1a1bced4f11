use crate::{
    basic_types::{MemoryPolicy, NodeStatus},
    nodes::{NodeData, NodeResult},
};

/// Ticks children in index order; the logical "AND".
///
/// - A `RUNNING` child makes this node return `RUNNING` without advancing.
/// - The first failing child stops the loop with `FAILURE`.
/// - When every child has succeeded (or was skipped), returns `SUCCESS`.
///
/// With [`MemoryPolicy::Fresh`] the child index restarts at 0 on every
/// tick; with [`MemoryPolicy::Persistent`] the index survives `RUNNING`
/// returns, so a long-running child resumes where it left off. The index
/// always resets on a terminal resolution. No children means `SUCCESS`.
pub struct SequenceNode {
    pub(crate) memory_policy: MemoryPolicy,
    pub(crate) current_child: usize,
}

impl SequenceNode {
    pub fn new(memory_policy: MemoryPolicy) -> SequenceNode {
        Self {
            memory_policy,
            current_child: 0,
        }
    }

    pub(crate) async fn tick(&mut self, data: &mut NodeData) -> NodeResult {
        if data.children.is_empty() {
            return Ok(NodeStatus::Success);
        }

        if self.memory_policy == MemoryPolicy::Fresh {
            self.current_child = 0;
        }

        while self.current_child < data.children.len() {
            let status = data.children[self.current_child].tick().await;

            match status {
                NodeStatus::Running => return Ok(NodeStatus::Running),
                NodeStatus::Failure | NodeStatus::Error => {
                    self.current_child = 0;
                    return Ok(NodeStatus::Failure);
                }
                // Success and Skipped both advance.
                _ => self.current_child += 1,
            }
        }

        self.current_child = 0;
        Ok(NodeStatus::Success)
    }

    pub(crate) fn reset(&mut self) {
        self.current_child = 0;
    }
}

impl Default for SequenceNode {
    fn default() -> Self {
        Self::new(MemoryPolicy::Fresh)
    }
}
