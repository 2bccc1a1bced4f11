use std::time::Duration;

use tokio::time::Instant;

use crate::{
    basic_types::NodeStatus,
    nodes::{NodeData, NodeResult},
};

/// Suppresses the child for a period after each success.
///
/// While the cooldown clock is hot, ticks return `FAILURE` without
/// invoking the child. With `reset_on_failure`, a child `FAILURE` clears
/// the clock so the next success can happen immediately.
pub struct CooldownNode {
    cooldown: Duration,
    reset_on_failure: bool,
    last_success: Option<Instant>,
}

impl CooldownNode {
    pub fn new(cooldown: Duration) -> CooldownNode {
        Self {
            cooldown,
            reset_on_failure: false,
            last_success: None,
        }
    }

    pub fn with_reset_on_failure(mut self, enabled: bool) -> CooldownNode {
        self.reset_on_failure = enabled;
        self
    }

    pub(crate) async fn tick(&mut self, data: &mut NodeData) -> NodeResult {
        if data.children.is_empty() {
            return Ok(NodeStatus::Failure);
        }

        if let Some(last_success) = self.last_success {
            if last_success.elapsed() < self.cooldown {
                return Ok(NodeStatus::Failure);
            }
        }

        let status = data.child_mut().expect("checked above").tick().await;

        match status {
            NodeStatus::Success => self.last_success = Some(Instant::now()),
            NodeStatus::Failure if self.reset_on_failure => self.last_success = None,
            _ => {}
        }

        Ok(status)
    }

    pub(crate) fn reset(&mut self) {
        self.last_success = None;
    }
}
