use crate::{
    basic_types::{MemoryPolicy, NodeStatus},
    nodes::{NodeData, NodeResult},
};

use super::SelectorNode;

/// A selector that re-checks its earlier siblings on every tick.
///
/// If a higher-priority child that previously failed now succeeds, it
/// preempts whatever the selector was working on: the tick returns
/// `SUCCESS` and the current index snaps back to the winning child.
pub struct ReactiveSelectorNode {
    sel: SelectorNode,
}

impl ReactiveSelectorNode {
    pub fn new() -> ReactiveSelectorNode {
        Self {
            sel: SelectorNode::new(MemoryPolicy::Persistent),
        }
    }

    pub(crate) async fn tick(&mut self, data: &mut NodeData) -> NodeResult {
        if data.children.is_empty() {
            return Ok(NodeStatus::Failure);
        }

        let watched = self.sel.current_child.min(data.children.len());
        for index in 0..watched {
            let status = data.children[index].tick().await;
            if status == NodeStatus::Success {
                self.sel.current_child = index;
                return Ok(NodeStatus::Success);
            }
        }

        self.sel.tick(data).await
    }

    pub(crate) fn reset(&mut self) {
        self.sel.reset();
    }
}

impl Default for ReactiveSelectorNode {
    fn default() -> Self {
        Self::new()
    }
}
