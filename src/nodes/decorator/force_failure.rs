use crate::{
    basic_types::NodeStatus,
    nodes::{NodeData, NodeResult},
};

/// Turns a child `SUCCESS` into `FAILURE`; everything else passes through.
#[derive(Default)]
pub struct ForceFailureNode;

impl ForceFailureNode {
    pub fn new() -> ForceFailureNode {
        Self
    }

    pub(crate) async fn tick(&mut self, data: &mut NodeData) -> NodeResult {
        let Some(child) = data.child_mut() else {
            return Ok(NodeStatus::Failure);
        };

        let status = match child.tick().await {
            NodeStatus::Success => NodeStatus::Failure,
            other => other,
        };

        Ok(status)
    }
}
