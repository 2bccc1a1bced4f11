use crate::{
    basic_types::NodeStatus,
    nodes::{NodeData, NodeResult},
};

/// Turns a child `FAILURE` into `SUCCESS`; everything else passes through.
#[derive(Default)]
pub struct ForceSuccessNode;

impl ForceSuccessNode {
    pub fn new() -> ForceSuccessNode {
        Self
    }

    pub(crate) async fn tick(&mut self, data: &mut NodeData) -> NodeResult {
        let Some(child) = data.child_mut() else {
            return Ok(NodeStatus::Success);
        };

        let status = match child.tick().await {
            NodeStatus::Failure => NodeStatus::Success,
            other => other,
        };

        Ok(status)
    }
}
