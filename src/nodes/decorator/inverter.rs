use crate::{
    basic_types::NodeStatus,
    nodes::{NodeData, NodeResult},
};

/// Swaps `SUCCESS` and `FAILURE`; everything else passes through.
#[derive(Default)]
pub struct InverterNode;

impl InverterNode {
    pub fn new() -> InverterNode {
        Self
    }

    pub(crate) async fn tick(&mut self, data: &mut NodeData) -> NodeResult {
        let Some(child) = data.child_mut() else {
            return Ok(NodeStatus::Failure);
        };

        let status = match child.tick().await {
            NodeStatus::Success => NodeStatus::Failure,
            NodeStatus::Failure => NodeStatus::Success,
            other => other,
        };

        Ok(status)
    }
}
