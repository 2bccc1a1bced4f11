use crate::{
    basic_types::{MemoryPolicy, NodeStatus},
    nodes::{NodeData, NodeResult},
};

use super::SequenceNode;

/// A sequence that re-checks its earlier siblings on every tick.
///
/// Before continuing with the current child, children `[0, current)` are
/// ticked again; if any of them now fails, the whole sequence aborts with
/// `FAILURE` and restarts from the first child on the next tick. This is
/// how an upstream guard condition preempts in-progress work.
pub struct ReactiveSequenceNode {
    seq: SequenceNode,
}

impl ReactiveSequenceNode {
    pub fn new() -> ReactiveSequenceNode {
        // Reactivity only makes sense with a remembered index; the prefix
        // re-check supplies the freshness.
        Self {
            seq: SequenceNode::new(MemoryPolicy::Persistent),
        }
    }

    pub(crate) async fn tick(&mut self, data: &mut NodeData) -> NodeResult {
        if data.children.is_empty() {
            return Ok(NodeStatus::Success);
        }

        let watched = self.seq.current_child.min(data.children.len());
        for index in 0..watched {
            let status = data.children[index].tick().await;
            if matches!(status, NodeStatus::Failure | NodeStatus::Error) {
                self.seq.current_child = 0;
                return Ok(NodeStatus::Failure);
            }
        }

        self.seq.tick(data).await
    }

    pub(crate) fn reset(&mut self) {
        self.seq.reset();
    }
}

impl Default for ReactiveSequenceNode {
    fn default() -> Self {
        Self::new()
    }
}
