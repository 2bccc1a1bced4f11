use serde_json::Value;

use crate::{
    basic_types::NodeStatus,
    blackboard::DEFAULT_NAMESPACE,
    nodes::{NodeData, NodeResult},
};

/// Writes a fixed `(key, value)` into a blackboard namespace.
pub struct BlackboardSetNode {
    key: String,
    value: Value,
    namespace: String,
}

impl BlackboardSetNode {
    pub fn new(key: impl AsRef<str>, value: impl Into<Value>) -> BlackboardSetNode {
        Self {
            key: key.as_ref().to_string(),
            value: value.into(),
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }

    pub fn with_namespace(mut self, namespace: impl AsRef<str>) -> BlackboardSetNode {
        self.namespace = namespace.as_ref().to_string();
        self
    }

    pub(crate) async fn tick(&mut self, data: &mut NodeData) -> NodeResult {
        data.blackboard()
            .set(&self.key, self.value.clone(), &self.namespace);
        Ok(NodeStatus::Success)
    }
}

/// Removes a key from a blackboard namespace; fails when the key was
/// absent.
pub struct BlackboardDeleteNode {
    key: String,
    namespace: String,
}

impl BlackboardDeleteNode {
    pub fn new(key: impl AsRef<str>) -> BlackboardDeleteNode {
        Self {
            key: key.as_ref().to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }

    pub fn with_namespace(mut self, namespace: impl AsRef<str>) -> BlackboardDeleteNode {
        self.namespace = namespace.as_ref().to_string();
        self
    }

    pub(crate) async fn tick(&mut self, data: &mut NodeData) -> NodeResult {
        if data.blackboard().unset(&self.key, &self.namespace) {
            Ok(NodeStatus::Success)
        } else {
            Ok(NodeStatus::Failure)
        }
    }
}
