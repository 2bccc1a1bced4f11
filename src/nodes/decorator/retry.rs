use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;

use crate::{
    basic_types::NodeStatus,
    nodes::{NodeData, NodeResult},
};

/// Re-ticks a failing child, sleeping between attempts.
///
/// `max_attempts` bounds the total number of child invocations, including
/// the first. The wait before retry `n` is
/// `delay * (exponential_backoff ? 2^n : 1) + uniform(-jitter, +jitter)`,
/// clamped to zero, so an exponential schedule runs `d, 2d, 4d, …`. There
/// is no sleep after the final failed attempt. `RUNNING` propagates with
/// the attempt counter intact; a child `SUCCESS` resets it.
pub struct RetryNode {
    max_attempts: u32,
    delay: Duration,
    exponential_backoff: bool,
    jitter: f64,
    attempt: u32,
}

impl RetryNode {
    pub fn new(max_attempts: u32) -> RetryNode {
        Self {
            max_attempts,
            delay: Duration::ZERO,
            exponential_backoff: false,
            jitter: 0.0,
            attempt: 0,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> RetryNode {
        self.delay = delay;
        self
    }

    pub fn with_exponential_backoff(mut self, enabled: bool) -> RetryNode {
        self.exponential_backoff = enabled;
        self
    }

    /// Uniform jitter amplitude in seconds, added to every wait.
    pub fn with_jitter(mut self, jitter: f64) -> RetryNode {
        self.jitter = jitter;
        self
    }

    fn backoff_delay(&self) -> Duration {
        if self.delay.is_zero() {
            return Duration::ZERO;
        }

        let mut secs = self.delay.as_secs_f64();
        if self.exponential_backoff {
            secs *= 2f64.powi(self.attempt as i32);
        }
        if self.jitter > 0.0 {
            secs += rand::thread_rng().gen_range(-self.jitter..=self.jitter);
        }

        Duration::from_secs_f64(secs.max(0.0))
    }

    pub(crate) async fn tick(&mut self, data: &mut NodeData) -> NodeResult {
        if data.children.is_empty() {
            return Ok(NodeStatus::Failure);
        }

        while self.attempt < self.max_attempts {
            let status = data.child_mut().expect("checked above").tick().await;

            match status {
                NodeStatus::Success => {
                    self.attempt = 0;
                    return Ok(NodeStatus::Success);
                }
                NodeStatus::Running => return Ok(NodeStatus::Running),
                _ => {
                    let wait = self.backoff_delay();
                    self.attempt += 1;
                    if self.attempt < self.max_attempts && !wait.is_zero() {
                        sleep(wait).await;
                    }
                }
            }
        }

        self.attempt = 0;
        Ok(NodeStatus::Failure)
    }

    pub(crate) fn reset(&mut self) {
        self.attempt = 0;
    }
}
