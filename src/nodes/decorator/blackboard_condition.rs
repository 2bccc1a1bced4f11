use serde_json::Value;

use crate::{
    basic_types::{compare_values, CompareOp, NodeStatus},
    blackboard::DEFAULT_NAMESPACE,
    nodes::{NodeData, NodeError, NodeResult},
};

/// Gates the child on a blackboard comparison.
///
/// The child only runs when `blackboard[namespace][key] <op> value` holds;
/// otherwise the tick fails without touching the child. A missing key is
/// `FAILURE`. Only the ordering operators are accepted; construction
/// rejects the membership and substring operators, which belong to
/// [`ConditionNode`](crate::nodes::ConditionNode).
pub struct BlackboardConditionNode {
    key: String,
    expected: Value,
    operator: CompareOp,
    namespace: String,
}

impl BlackboardConditionNode {
    pub fn new(
        key: impl AsRef<str>,
        operator: CompareOp,
        expected: impl Into<Value>,
    ) -> NodeResult<BlackboardConditionNode> {
        if !operator.is_ordering_op() {
            return Err(NodeError::InvalidOperator(operator));
        }

        Ok(Self {
            key: key.as_ref().to_string(),
            expected: expected.into(),
            operator,
            namespace: DEFAULT_NAMESPACE.to_string(),
        })
    }

    pub fn with_namespace(mut self, namespace: impl AsRef<str>) -> Self {
        self.namespace = namespace.as_ref().to_string();
        self
    }

    pub(crate) async fn tick(&mut self, data: &mut NodeData) -> NodeResult {
        if data.children.is_empty() {
            return Ok(NodeStatus::Failure);
        }

        let value = data.blackboard().get(&self.key, &self.namespace)?;
        let holds = match value {
            Some(value) => compare_values(&value, self.operator, &self.expected)?,
            None => false,
        };

        if !holds {
            return Ok(NodeStatus::Failure);
        }

        let status = data.child_mut().expect("checked above").tick().await;
        Ok(status)
    }
}
