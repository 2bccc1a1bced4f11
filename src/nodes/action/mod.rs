//! Leaf nodes: user callbacks, condition checks and blackboard side
//! effects. Leaves never have children.

mod action;
mod blackboard_ops;
mod condition;
mod debug_log;
mod throttle;
mod wait;

pub use action::{
    ActionCallback, ActionNode, ActionStats, AsyncActionFn, CancelHandle, SyncActionFn,
};
pub use blackboard_ops::{BlackboardDeleteNode, BlackboardSetNode};
pub use condition::{
    AsyncConditionFn, ConditionCallback, ConditionNode, ConditionStats, SyncConditionFn,
    TimedConditionNode,
};
pub use debug_log::{DebugLogNode, EventEmitNode};
pub use throttle::ThrottleNode;
pub use wait::WaitNode;
