use chrono::Utc;
use log::Level;

use crate::{
    basic_types::{NodeEvent, NodeStatus},
    nodes::{NodeData, NodeResult},
};

/// Logs a fixed message at a configured level; always succeeds.
pub struct DebugLogNode {
    message: String,
    level: Level,
    include_timestamp: bool,
}

impl DebugLogNode {
    pub fn new(message: impl AsRef<str>) -> DebugLogNode {
        Self {
            message: message.as_ref().to_string(),
            level: Level::Info,
            include_timestamp: true,
        }
    }

    pub fn with_level(mut self, level: Level) -> DebugLogNode {
        self.level = level;
        self
    }

    pub fn with_timestamp(mut self, include_timestamp: bool) -> DebugLogNode {
        self.include_timestamp = include_timestamp;
        self
    }

    pub(crate) async fn tick(&mut self, data: &mut NodeData) -> NodeResult {
        if self.include_timestamp {
            log::log!(
                self.level,
                "[{}] [{}] {}",
                data.path(),
                Utc::now().to_rfc3339(),
                self.message
            );
        } else {
            log::log!(self.level, "[{}] {}", data.path(), self.message);
        }
        Ok(NodeStatus::Success)
    }
}

/// Emits a configured lifecycle event on itself; always succeeds.
pub struct EventEmitNode {
    event: NodeEvent,
}

impl EventEmitNode {
    pub fn new(event: NodeEvent) -> EventEmitNode {
        Self { event }
    }

    pub(crate) async fn tick(&mut self, data: &mut NodeData) -> NodeResult {
        data.emit(self.event);
        Ok(NodeStatus::Success)
    }
}
