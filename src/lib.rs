/*!
# ticktree

Asynchronous behavior-tree engine for coordinating autonomous agents
(robots, NPCs, control loops). A tree is a hierarchy of tickable nodes:
composites (sequence, selector, parallel and their reactive variants)
combine the statuses of their children, decorators (retry, timeout,
repeat, cooldown, …) reshape a single child, and leaves run user callbacks
or check conditions. Every node in a tree shares one namespaced
[`Blackboard`] with change subscriptions and an activity log, and a
[`TreeManager`] drives the root at a fixed rate, keeps execution stats,
takes snapshots, and loads declarative tree descriptions from JSON or
YAML.

Ticks are futures: a node may suspend while awaiting a child, a sleep, or
an async callback, and the parallel composite runs its children
concurrently on the same scheduler. Synchronous callbacks are offloaded to
a bounded worker pool so they never block ticking.

## Building a tree in code

```no_run
use ticktree::{ActionNode, ConditionNode, SequenceNode, TreeManager, TreeNode};

# async fn demo() {
let mut manager = TreeManager::new().with_tick_rate(30.0);
manager.blackboard().set("armed", true, "default");

let mut root = TreeNode::new("patrol", SequenceNode::default());
root.add_child(TreeNode::new(
    "armed?",
    ConditionNode::for_key("armed", ticktree::CompareOp::Eq, true),
))
.unwrap();
root.add_child(TreeNode::new("advance", ActionNode::from_sync(|| true)))
    .unwrap();

manager.set_root(root);
let status = manager.tick_tree().await;
# let _ = status;
# }
```

## Loading a tree from a file

Tree descriptions are JSON or YAML with the shape
`{ "metadata": …, "tree": <node>, "subtrees": { name: <node> } }`, where
each `<node>` is `{ "name", "type", "properties"?, "children"? }` and
`type` names a registered node class (see [`config::NodeRegistry`]).

```json
{
  "tree": {
    "name": "root",
    "type": "SelectorNode",
    "children": [
      { "name": "gate", "type": "BlackboardConditionNode",
        "properties": { "key": "armed", "operator": "==", "value": true },
        "children": [ { "name": "fire", "type": "ActionNode" } ] },
      { "name": "idle", "type": "WaitNode", "properties": { "duration": 0.5 } }
    ]
  }
}
```
*/

pub mod basic_types;
pub mod blackboard;
pub mod config;
pub mod manager;
pub mod nodes;

// Re-exports for convenience
pub use basic_types::{
    ActionResult, CompareOp, MemoryPolicy, NodeEvent, NodeStatus, ParallelPolicy,
};
pub use blackboard::{Blackboard, BlackboardClient, BlackboardEntry, BlackboardError};
pub use config::{ConfigError, NodeRegistry, NodeSpec, TreeDescription};
pub use manager::{TreeManager, TreeManagerHandle, TreeSnapshot, TreeStats, WorkerPool};
pub use nodes::{
    ActionNode, Behavior, BlackboardConditionNode, BlackboardDeleteNode, BlackboardSetNode,
    ConditionNode, CooldownNode, DebugLogNode, DelayNode, EventEmitNode, ForceFailureNode,
    ForceSuccessNode, InverterNode, NodeError, NodeResult, ParallelNode, RandomSelectorNode,
    ReactiveSelectorNode, ReactiveSequenceNode, RepeatNode, RetryNode, SelectorNode, SequenceNode,
    ThrottleNode, TimedConditionNode, TimeoutNode, TreeNode, WaitNode,
};
