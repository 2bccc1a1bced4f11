use std::time::Duration;

use tokio::time::sleep;

use crate::{
    basic_types::NodeStatus,
    nodes::{NodeData, NodeResult},
};

/// Sleeps before and/or after ticking the child; the child status passes
/// through unchanged.
pub struct DelayNode {
    pre_delay: Duration,
    post_delay: Duration,
}

impl DelayNode {
    pub fn new(pre_delay: Duration, post_delay: Duration) -> DelayNode {
        Self {
            pre_delay,
            post_delay,
        }
    }

    pub(crate) async fn tick(&mut self, data: &mut NodeData) -> NodeResult {
        if data.children.is_empty() {
            return Ok(NodeStatus::Failure);
        }

        if !self.pre_delay.is_zero() {
            sleep(self.pre_delay).await;
        }

        let status = data.child_mut().expect("checked above").tick().await;

        if !self.post_delay.is_zero() {
            sleep(self.post_delay).await;
        }

        Ok(status)
    }
}
