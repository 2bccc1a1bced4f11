use std::time::Duration;

use log::warn;
use tokio::time::timeout;

use crate::{
    basic_types::NodeStatus,
    nodes::{NodeData, NodeResult},
};

/// Races the child tick against a deadline.
///
/// On expiry the in-flight child tick is cancelled (its future is
/// dropped) and the configured `on_timeout` status is returned. A
/// cancellable leaf child is handed the cancellation and re-ticked so it
/// records a terminal `FAILURE`; any other child subtree is reset.
pub struct TimeoutNode {
    timeout: Duration,
    on_timeout: NodeStatus,
}

impl TimeoutNode {
    pub fn new(timeout: Duration) -> TimeoutNode {
        Self {
            timeout,
            on_timeout: NodeStatus::Failure,
        }
    }

    pub fn with_on_timeout(mut self, status: NodeStatus) -> TimeoutNode {
        self.on_timeout = status;
        self
    }

    pub(crate) async fn tick(&mut self, data: &mut NodeData) -> NodeResult {
        let Some(child) = data.child_mut() else {
            return Ok(NodeStatus::Failure);
        };

        match timeout(self.timeout, child.tick()).await {
            Ok(status) => Ok(status),
            Err(_) => {
                warn!(
                    "[{}] timed out after {:.3}s",
                    child.path(),
                    self.timeout.as_secs_f64()
                );
                match child.cancel_handle() {
                    Some(handle) => {
                        // Deliver the cancellation; the re-tick completes
                        // immediately with FAILURE.
                        handle.request_cancel();
                        child.tick().await;
                    }
                    None => child.reset(),
                }
                Ok(self.on_timeout)
            }
        }
    }
}
