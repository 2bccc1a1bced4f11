use rand::seq::SliceRandom;

use crate::{
    basic_types::NodeStatus,
    nodes::{NodeData, NodeResult},
};

/// A selector that tries its children in a uniformly sampled order.
///
/// A fresh permutation is sampled whenever the queue is empty. The child
/// at the front of the queue is ticked; `RUNNING` leaves the queue intact
/// so the same child resumes next tick, `SUCCESS` clears the queue, and a
/// failing child is popped so the next candidate runs. When the
/// permutation is exhausted the tick fails and the next one resamples.
pub struct RandomSelectorNode {
    shuffled: Vec<usize>,
}

impl RandomSelectorNode {
    pub fn new() -> RandomSelectorNode {
        Self { shuffled: Vec::new() }
    }

    pub(crate) async fn tick(&mut self, data: &mut NodeData) -> NodeResult {
        if data.children.is_empty() {
            return Ok(NodeStatus::Failure);
        }

        if self.shuffled.is_empty() {
            self.shuffled = (0..data.children.len()).collect();
            self.shuffled.shuffle(&mut rand::thread_rng());
        }

        while let Some(&index) = self.shuffled.first() {
            let status = data.children[index].tick().await;

            match status {
                NodeStatus::Running => return Ok(NodeStatus::Running),
                NodeStatus::Success => {
                    self.shuffled.clear();
                    return Ok(NodeStatus::Success);
                }
                _ => {
                    self.shuffled.remove(0);
                }
            }
        }

        Ok(NodeStatus::Failure)
    }

    pub(crate) fn reset(&mut self) {
        self.shuffled.clear();
    }
}

impl Default for RandomSelectorNode {
    fn default() -> Self {
        Self::new()
    }
}
