use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use rand::Rng;
use tokio::time::sleep;

use crate::{
    basic_types::NodeStatus,
    nodes::{NodeData, NodeResult},
};

use super::CancelHandle;

/// Suspends for `duration`, optionally spread by a random variance, then
/// succeeds, or fails when cancelled.
///
/// Cancellation is the same one-shot flag as [`ActionNode`](super::ActionNode):
/// once requested, the next tick returns `FAILURE` without sleeping. A
/// cancelling decorator uses this to drive the wait to a terminal status
/// after dropping its in-flight sleep.
pub struct WaitNode {
    duration: Duration,
    random_variance: f64,
    cancel_requested: Arc<AtomicBool>,
}

impl WaitNode {
    pub fn new(duration: Duration) -> WaitNode {
        Self {
            duration,
            random_variance: 0.0,
            cancel_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Fraction of `duration` (0..=1) by which the actual wait may deviate
    /// in either direction.
    pub fn with_random_variance(mut self, variance: f64) -> WaitNode {
        self.random_variance = variance.clamp(0.0, 1.0);
        self
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle::new(Arc::clone(&self.cancel_requested))
    }

    pub fn request_cancel(&self) {
        self.cancel_requested.store(true, Ordering::SeqCst);
    }

    pub(crate) async fn tick(&mut self, _data: &mut NodeData) -> NodeResult {
        if self.cancel_requested.swap(false, Ordering::SeqCst) {
            return Ok(NodeStatus::Failure);
        }

        let duration = if self.random_variance > 0.0 {
            let base = self.duration.as_secs_f64();
            let spread = base * self.random_variance;
            let sampled = rand::thread_rng().gen_range(base - spread..=base + spread);
            Duration::from_secs_f64(sampled.max(0.0))
        } else {
            self.duration
        };

        sleep(duration).await;
        Ok(NodeStatus::Success)
    }

    pub(crate) fn reset(&mut self) {
        self.cancel_requested.store(false, Ordering::SeqCst);
    }
}
