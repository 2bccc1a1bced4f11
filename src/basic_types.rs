use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;

/// Specifies the outcome of a node's execution. Returned from `tick()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeStatus {
    /// Finished and succeeded.
    Success,
    /// Finished and failed.
    Failure,
    /// Still working; will be ticked again.
    Running,
    /// Never ticked, or reset since the last tick.
    Invalid,
    /// A precondition rejected the tick.
    Skipped,
    /// The tick raised an error that was captured at the node boundary.
    Error,
}

impl NodeStatus {
    /// Terminal resolution: the node finished with a definite answer.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

impl std::fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
            Self::Running => "RUNNING",
            Self::Invalid => "INVALID",
            Self::Skipped => "SKIPPED",
            Self::Error => "ERROR",
        };

        write!(f, "{text}")
    }
}

#[derive(Error, Debug)]
#[error("string didn't match any NodeStatus values")]
pub struct ParseNodeStatusError;

impl FromStr for NodeStatus {
    type Err = ParseNodeStatusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "SUCCESS" | "Success" => Ok(Self::Success),
            "FAILURE" | "Failure" => Ok(Self::Failure),
            "RUNNING" | "Running" => Ok(Self::Running),
            "INVALID" | "Invalid" => Ok(Self::Invalid),
            "SKIPPED" | "Skipped" => Ok(Self::Skipped),
            "ERROR" | "Error" => Ok(Self::Error),
            _ => Err(ParseNodeStatusError),
        }
    }
}

/// Lifecycle events observable on any node through registered handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeEvent {
    Initialized,
    /// About to run the node-specific tick.
    Entering,
    /// Tick finished, metadata already updated.
    Exiting,
    Setup,
    Shutdown,
    StatusChanged,
    Error,
}

impl std::fmt::Display for NodeEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Initialized => "INITIALIZED",
            Self::Entering => "ENTERING",
            Self::Exiting => "EXITING",
            Self::Setup => "SETUP",
            Self::Shutdown => "SHUTDOWN",
            Self::StatusChanged => "STATUS_CHANGED",
            Self::Error => "ERROR",
        };

        write!(f, "{text}")
    }
}

#[derive(Error, Debug)]
#[error("string didn't match any NodeEvent values")]
pub struct ParseNodeEventError;

impl FromStr for NodeEvent {
    type Err = ParseNodeEventError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "INITIALIZED" => Ok(Self::Initialized),
            "ENTERING" => Ok(Self::Entering),
            "EXITING" => Ok(Self::Exiting),
            "SETUP" => Ok(Self::Setup),
            "SHUTDOWN" => Ok(Self::Shutdown),
            "STATUS_CHANGED" => Ok(Self::StatusChanged),
            "ERROR" => Ok(Self::Error),
            _ => Err(ParseNodeEventError),
        }
    }
}

/// Result of a user action callback, one step richer than `NodeStatus`.
///
/// `Error` and `Cancelled` both collapse to `FAILURE` at the tree level;
/// the distinction only survives in the per-leaf stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionResult {
    Success,
    Failure,
    Running,
    Error,
    Cancelled,
}

impl ActionResult {
    pub fn into_status(self) -> NodeStatus {
        match self {
            Self::Success => NodeStatus::Success,
            Self::Failure => NodeStatus::Failure,
            Self::Running => NodeStatus::Running,
            Self::Error | Self::Cancelled => NodeStatus::Failure,
        }
    }
}

impl From<bool> for ActionResult {
    fn from(value: bool) -> Self {
        if value {
            Self::Success
        } else {
            Self::Failure
        }
    }
}

impl From<()> for ActionResult {
    fn from(_: ()) -> Self {
        Self::Success
    }
}

impl std::fmt::Display for ActionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
            Self::Running => "RUNNING",
            Self::Error => "ERROR",
            Self::Cancelled => "CANCELLED",
        };

        write!(f, "{text}")
    }
}

/// Reduction policy of the parallel composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParallelPolicy {
    /// Fail if any child failed, otherwise run until all succeed.
    RequireAll,
    /// Succeed if any child succeeded, otherwise run until all fail.
    RequireOne,
    /// Wait for every child, then succeed iff all succeeded.
    SequenceStar,
    /// Wait for every child, then succeed iff any succeeded.
    SelectorStar,
}

impl std::fmt::Display for ParallelPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::RequireAll => "REQUIRE_ALL",
            Self::RequireOne => "REQUIRE_ONE",
            Self::SequenceStar => "SEQUENCE_STAR",
            Self::SelectorStar => "SELECTOR_STAR",
        };

        write!(f, "{text}")
    }
}

#[derive(Error, Debug)]
#[error("string didn't match any ParallelPolicy values")]
pub struct ParseParallelPolicyError;

impl FromStr for ParallelPolicy {
    type Err = ParseParallelPolicyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "REQUIRE_ALL" => Ok(Self::RequireAll),
            "REQUIRE_ONE" => Ok(Self::RequireOne),
            "SEQUENCE_STAR" => Ok(Self::SequenceStar),
            "SELECTOR_STAR" => Ok(Self::SelectorStar),
            _ => Err(ParseParallelPolicyError),
        }
    }
}

/// Whether a sequence/selector remembers its child index across ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemoryPolicy {
    /// Restart from the first child on every tick.
    #[default]
    Fresh,
    /// Keep the index until the composite resolves terminally.
    Persistent,
}

impl std::fmt::Display for MemoryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Fresh => "FRESH",
            Self::Persistent => "PERSISTENT",
        };

        write!(f, "{text}")
    }
}

#[derive(Error, Debug)]
#[error("string didn't match any MemoryPolicy values")]
pub struct ParseMemoryPolicyError;

impl FromStr for MemoryPolicy {
    type Err = ParseMemoryPolicyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "FRESH" => Ok(Self::Fresh),
            "PERSISTENT" => Ok(Self::Persistent),
            _ => Err(ParseMemoryPolicyError),
        }
    }
}

/// Comparison operators accepted by condition leaves and the blackboard
/// condition decorator. The decorator only allows the ordering subset;
/// `ConditionNode` accepts the whole table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    In,
    NotIn,
    Contains,
    StartsWith,
    EndsWith,
}

impl CompareOp {
    /// The subset valid for `BlackboardConditionNode`.
    pub fn is_ordering_op(&self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Ne | Self::Gt | Self::Lt | Self::Ge | Self::Le
        )
    }
}

impl std::fmt::Display for CompareOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::In => "in",
            Self::NotIn => "not in",
            Self::Contains => "contains",
            Self::StartsWith => "startswith",
            Self::EndsWith => "endswith",
        };

        write!(f, "{text}")
    }
}

#[derive(Error, Debug)]
#[error("string didn't match any CompareOp values")]
pub struct ParseCompareOpError;

impl FromStr for CompareOp {
    type Err = ParseCompareOpError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "==" => Ok(Self::Eq),
            "!=" => Ok(Self::Ne),
            ">" => Ok(Self::Gt),
            "<" => Ok(Self::Lt),
            ">=" => Ok(Self::Ge),
            "<=" => Ok(Self::Le),
            "in" => Ok(Self::In),
            "not in" => Ok(Self::NotIn),
            "contains" => Ok(Self::Contains),
            "startswith" => Ok(Self::StartsWith),
            "endswith" => Ok(Self::EndsWith),
            _ => Err(ParseCompareOpError),
        }
    }
}

/// Applies `op` to a blackboard value and an expected operand.
///
/// Ordering comparisons work on numbers and on strings; the membership and
/// substring operators follow their usual container semantics. A type
/// mismatch is an error, which condition leaves record and treat as false.
pub fn compare_values(lhs: &Value, op: CompareOp, rhs: &Value) -> anyhow::Result<bool> {
    match op {
        CompareOp::Eq => Ok(lhs == rhs),
        CompareOp::Ne => Ok(lhs != rhs),
        CompareOp::Gt | CompareOp::Lt | CompareOp::Ge | CompareOp::Le => {
            if let (Some(a), Some(b)) = (lhs.as_f64(), rhs.as_f64()) {
                Ok(apply_ordering(op, a.partial_cmp(&b)))
            } else if let (Some(a), Some(b)) = (lhs.as_str(), rhs.as_str()) {
                Ok(apply_ordering(op, a.partial_cmp(b)))
            } else {
                anyhow::bail!("cannot order {lhs} against {rhs}")
            }
        }
        CompareOp::In => value_contains(rhs, lhs),
        CompareOp::NotIn => value_contains(rhs, lhs).map(|found| !found),
        CompareOp::Contains => value_contains(lhs, rhs),
        CompareOp::StartsWith => Ok(value_to_text(lhs).starts_with(&value_to_text(rhs))),
        CompareOp::EndsWith => Ok(value_to_text(lhs).ends_with(&value_to_text(rhs))),
    }
}

fn apply_ordering(op: CompareOp, ordering: Option<std::cmp::Ordering>) -> bool {
    use std::cmp::Ordering::*;

    match (op, ordering) {
        (CompareOp::Gt, Some(Greater)) => true,
        (CompareOp::Lt, Some(Less)) => true,
        (CompareOp::Ge, Some(Greater | Equal)) => true,
        (CompareOp::Le, Some(Less | Equal)) => true,
        _ => false,
    }
}

/// Membership check: does `container` hold `item`?
fn value_contains(container: &Value, item: &Value) -> anyhow::Result<bool> {
    match container {
        Value::Array(items) => Ok(items.contains(item)),
        Value::Object(map) => match item.as_str() {
            Some(key) => Ok(map.contains_key(key)),
            None => anyhow::bail!("object membership requires a string key"),
        },
        Value::String(text) => Ok(text.contains(&value_to_text(item))),
        other => anyhow::bail!("{other} is not a container"),
    }
}

/// String rendition used by the substring operators; bare strings are
/// rendered without JSON quotes.
fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
