use std::{collections::HashMap, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use log::{debug, error};
use thiserror::Error;
use tokio::time::Instant;

use crate::{
    basic_types::{CompareOp, NodeEvent, NodeStatus},
    blackboard::{Blackboard, BlackboardError},
    manager::WorkerPool,
};

pub mod action;
pub mod control;
pub mod decorator;

pub use action::{
    ActionCallback, ActionNode, ActionStats, BlackboardDeleteNode, BlackboardSetNode,
    CancelHandle, ConditionCallback, ConditionNode, ConditionStats, DebugLogNode, EventEmitNode,
    ThrottleNode, TimedConditionNode, WaitNode,
};
pub use control::{
    ParallelNode, RandomSelectorNode, ReactiveSelectorNode, ReactiveSequenceNode, SelectorNode,
    SequenceNode,
};
pub use decorator::{
    BlackboardConditionNode, CooldownNode, DelayNode, ForceFailureNode, ForceSuccessNode,
    InverterNode, RepeatNode, RetryNode, TimeoutNode,
};

pub type NodeResult<Output = NodeStatus> = Result<Output, NodeError>;

/// Free-form configuration map carried by every node.
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// Predicate evaluated around a tick; `false` or `Err` rejects.
pub type Predicate = Arc<dyn Fn() -> anyhow::Result<bool> + Send + Sync>;

/// Event sink. An `Err` is logged and swallowed; it never reaches the tick.
pub type EventHandler = Arc<dyn Fn(&NodeEventInfo) -> anyhow::Result<()> + Send + Sync>;

/// Snapshot of the emitting node handed to event handlers.
#[derive(Debug, Clone, Copy)]
pub struct NodeEventInfo<'a> {
    pub name: &'a str,
    pub path: &'a str,
    pub status: NodeStatus,
    pub event: NodeEvent,
}

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("node [{0}] rejected child: {1}")]
    StructureError(String, String),
    #[error("operator [{0}] is not allowed in a blackboard gate")]
    InvalidOperator(CompareOp),
    #[error("{0}")]
    Blackboard(#[from] BlackboardError),
    #[error("{0}")]
    UserError(#[from] anyhow::Error),
}

/// Arity class of a node kind; `add_child` enforces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Leaf,
    Composite,
    Decorator,
}

/// Running execution statistics kept on every node.
#[derive(Debug, Clone)]
pub struct NodeMetadata {
    pub created_at: DateTime<Utc>,
    pub last_tick_time: Option<DateTime<Utc>>,
    pub total_ticks: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub running_count: u64,
    pub error_count: u64,
    pub skipped_count: u64,
    pub average_tick_duration: Duration,
    pub last_status: Option<NodeStatus>,
}

impl Default for NodeMetadata {
    fn default() -> Self {
        Self {
            created_at: Utc::now(),
            last_tick_time: None,
            total_ticks: 0,
            success_count: 0,
            failure_count: 0,
            running_count: 0,
            error_count: 0,
            skipped_count: 0,
            average_tick_duration: Duration::ZERO,
            last_status: None,
        }
    }
}

impl NodeMetadata {
    fn record_tick(&mut self, duration: Duration, status: NodeStatus) {
        self.last_tick_time = Some(Utc::now());
        self.total_ticks += 1;

        match status {
            NodeStatus::Success => self.success_count += 1,
            NodeStatus::Failure => self.failure_count += 1,
            NodeStatus::Running => self.running_count += 1,
            NodeStatus::Error => self.error_count += 1,
            NodeStatus::Skipped => self.skipped_count += 1,
            NodeStatus::Invalid => {}
        }

        let total = self.total_ticks as f64;
        let mean = self.average_tick_duration.as_secs_f64();
        self.average_tick_duration =
            Duration::from_secs_f64((mean * (total - 1.0) + duration.as_secs_f64()) / total);
        self.last_status = Some(status);
    }
}

/// State shared by every node kind: identity, configuration, lifecycle
/// flags, hooks, stats, and the owned children.
pub struct NodeData {
    name: String,
    path: String,
    parent_path: Option<String>,
    pub properties: Properties,
    pub(crate) status: NodeStatus,
    pub(crate) blackboard: Option<Blackboard>,
    pub(crate) workers: Option<WorkerPool>,
    preconditions: Vec<Predicate>,
    postconditions: Vec<Predicate>,
    event_handlers: HashMap<NodeEvent, Vec<EventHandler>>,
    pub metadata: NodeMetadata,
    initialized: bool,
    setup_done: bool,
    pub(crate) children: Vec<TreeNode>,
}

impl std::fmt::Debug for NodeData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeData")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("parent_path", &self.parent_path)
            .field("properties", &self.properties)
            .field("status", &self.status)
            .field("metadata", &self.metadata)
            .field("initialized", &self.initialized)
            .field("setup_done", &self.setup_done)
            .field("children", &self.children)
            .finish()
    }
}

impl NodeData {
    fn new(name: &str) -> NodeData {
        Self {
            name: name.to_string(),
            path: name.to_string(),
            parent_path: None,
            properties: Properties::new(),
            status: NodeStatus::Invalid,
            blackboard: None,
            workers: None,
            preconditions: Vec::new(),
            postconditions: Vec::new(),
            event_handlers: HashMap::new(),
            metadata: NodeMetadata::default(),
            initialized: false,
            setup_done: false,
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Shared blackboard handle. Available once the node is initialized,
    /// which the tick contract guarantees before any behavior runs.
    pub(crate) fn blackboard(&self) -> &Blackboard {
        self.blackboard
            .as_ref()
            .expect("node is initialized before its behavior ticks")
    }

    pub(crate) fn workers(&self) -> &WorkerPool {
        self.workers
            .as_ref()
            .expect("node is initialized before its behavior ticks")
    }

    /// First child, for decorators.
    pub(crate) fn child_mut(&mut self) -> Option<&mut TreeNode> {
        self.children.get_mut(0)
    }

    /// Resets any child still reported `RUNNING`; used by composites after
    /// a terminal reduction to cancel in-flight work.
    pub(crate) fn reset_running_children(&mut self) {
        for child in &mut self.children {
            if child.status().is_running() {
                child.reset();
            }
        }
    }

    /// Invokes the registered handlers for `event` in insertion order.
    /// Handler failures are logged and swallowed.
    pub(crate) fn emit(&self, event: NodeEvent) {
        let Some(handlers) = self.event_handlers.get(&event) else {
            return;
        };

        let info = NodeEventInfo {
            name: &self.name,
            path: &self.path,
            status: self.status,
            event,
        };

        for handler in handlers {
            if let Err(err) = handler(&info) {
                error!("[{}] error in {event} handler: {err:#}", self.path);
            }
        }
    }

    fn check_predicates(&self, predicates: &[Predicate], what: &str) -> bool {
        for predicate in predicates {
            match predicate() {
                Ok(true) => {}
                Ok(false) => return false,
                Err(err) => {
                    error!("[{}] error in {what}: {err:#}", self.path);
                    return false;
                }
            }
        }
        true
    }
}

/// A single node of a behavior tree: common [`NodeData`] plus the tagged
/// behavior that gives it its semantics.
///
/// Nodes own their children exclusively; the back reference to the parent
/// is a path, never ownership, so the tree is a forest of plain values.
pub struct TreeNode {
    pub(crate) data: NodeData,
    pub(crate) behavior: Behavior,
}

impl std::fmt::Debug for TreeNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeNode")
            .field("data", &self.data)
            .field("behavior", &self.behavior)
            .finish()
    }
}

impl TreeNode {
    pub fn new(name: impl AsRef<str>, behavior: impl Into<Behavior>) -> TreeNode {
        Self {
            data: NodeData::new(name.as_ref()),
            behavior: behavior.into(),
        }
    }

    /// Attaches the free-form configuration map; used by the config loader
    /// and handy when building trees in code.
    pub fn with_properties(mut self, properties: Properties) -> TreeNode {
        self.data.properties = properties;
        self
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    /// Slash-separated path from the root, derived from the ancestry at
    /// attach time.
    pub fn path(&self) -> &str {
        &self.data.path
    }

    pub fn parent_path(&self) -> Option<&str> {
        self.data.parent_path.as_deref()
    }

    pub fn status(&self) -> NodeStatus {
        self.data.status
    }

    pub fn metadata(&self) -> &NodeMetadata {
        &self.data.metadata
    }

    pub fn properties(&self) -> &Properties {
        &self.data.properties
    }

    pub fn kind(&self) -> NodeKind {
        self.behavior.kind()
    }

    /// The tagged behavior, for callers that need kind-specific state such
    /// as per-leaf stats.
    pub fn behavior(&self) -> &Behavior {
        &self.behavior
    }

    /// Registered type name, as used by the configuration format.
    pub fn type_name(&self) -> &'static str {
        self.behavior.type_name()
    }

    pub fn children(&self) -> impl Iterator<Item = &TreeNode> {
        self.data.children.iter()
    }

    pub fn add_precondition(&mut self, predicate: Predicate) {
        self.data.preconditions.push(predicate);
    }

    pub fn add_postcondition(&mut self, predicate: Predicate) {
        self.data.postconditions.push(predicate);
    }

    pub fn add_event_handler(&mut self, event: NodeEvent, handler: EventHandler) {
        self.data.event_handlers.entry(event).or_default().push(handler);
    }

    /// Removes a previously registered handler by identity.
    pub fn remove_event_handler(&mut self, event: NodeEvent, handler: &EventHandler) {
        if let Some(handlers) = self.data.event_handlers.get_mut(&event) {
            handlers.retain(|existing| !Arc::ptr_eq(existing, handler));
        }
    }

    /// Cancellation handle of a cancellable leaf, if this node is one.
    pub fn cancel_handle(&self) -> Option<CancelHandle> {
        match &self.behavior {
            Behavior::Action(node) => Some(node.cancel_handle()),
            Behavior::Throttle(node) => Some(node.cancel_handle()),
            Behavior::Wait(node) => Some(node.cancel_handle()),
            _ => None,
        }
    }

    /// Adds `child` under this node, enforcing the arity of the node kind:
    /// leaves take none, decorators at most one, composites any number.
    ///
    /// If this node is already initialized the child is initialized into
    /// the same blackboard and worker pool immediately.
    pub fn add_child(&mut self, mut child: TreeNode) -> NodeResult<()> {
        match self.behavior.kind() {
            NodeKind::Leaf => {
                return Err(NodeError::StructureError(
                    self.data.name.clone(),
                    "leaf nodes cannot have children".to_string(),
                ))
            }
            NodeKind::Decorator if !self.data.children.is_empty() => {
                return Err(NodeError::StructureError(
                    self.data.name.clone(),
                    "decorator nodes can only have one child".to_string(),
                ))
            }
            _ => {}
        }

        child.data.parent_path = Some(self.data.path.clone());
        child.refresh_path(&self.data.path);

        if self.data.initialized {
            let blackboard = self.data.blackboard().clone();
            let workers = self.data.workers().clone();
            child.initialize(&blackboard, &workers);
        }

        self.data.children.push(child);
        Ok(())
    }

    fn refresh_path(&mut self, parent_path: &str) {
        self.data.path = format!("{parent_path}/{}", self.data.name);
        let own_path = self.data.path.clone();
        for child in &mut self.data.children {
            child.data.parent_path = Some(own_path.clone());
            child.refresh_path(&own_path);
        }
    }

    /// Attaches the node (and recursively its children) to the tree's
    /// shared blackboard and worker pool, emitting `INITIALIZED`.
    pub fn initialize(&mut self, blackboard: &Blackboard, workers: &WorkerPool) {
        self.data.blackboard = Some(blackboard.clone());
        self.data.workers = Some(workers.clone());
        self.data.initialized = true;
        self.data.emit(NodeEvent::Initialized);

        for child in &mut self.data.children {
            child.initialize(blackboard, workers);
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.data.initialized
    }

    /// One-time setup, run before the first tick and idempotent per node.
    /// Recurses into children.
    pub fn setup(&mut self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            if !self.data.setup_done {
                self.data.emit(NodeEvent::Setup);
                self.data.setup_done = true;
            }
            for child in &mut self.data.children {
                child.setup().await;
            }
        })
    }

    /// Teardown counterpart of [`setup`](Self::setup); children first.
    pub fn shutdown(&mut self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            for child in &mut self.data.children {
                child.shutdown().await;
            }
            if self.data.setup_done {
                self.data.emit(NodeEvent::Shutdown);
                self.data.setup_done = false;
            }
        })
    }

    /// Returns the node and its subtree to the unstarted state: status back
    /// to `INVALID`, behavior-internal counters and indices cleared.
    pub fn reset(&mut self) {
        self.data.status = NodeStatus::Invalid;
        self.behavior.reset();
        for child in &mut self.data.children {
            child.reset();
        }
    }

    /// Ticks the node once and returns the resulting status.
    ///
    /// The contract, in order: uninitialized nodes report `ERROR`; setup
    /// runs lazily before the first tick; a failing precondition skips the
    /// tick; the behavior runs between `ENTERING` and `EXITING`; a failing
    /// postcondition after a terminal status forces `FAILURE`; behavior
    /// errors are captured as status `ERROR` and never escape.
    pub fn tick(&mut self) -> BoxFuture<'_, NodeStatus> {
        Box::pin(async move {
            if !self.data.initialized {
                error!("[{}] ticked before initialize()", self.data.path);
                self.data.status = NodeStatus::Error;
                return NodeStatus::Error;
            }

            if !self.data.setup_done {
                self.setup().await;
            }

            if !self
                .data
                .check_predicates(&self.data.preconditions, "precondition")
            {
                self.data.status = NodeStatus::Skipped;
                self.data.metadata.record_tick(Duration::ZERO, NodeStatus::Skipped);
                return NodeStatus::Skipped;
            }

            let tick_start = Instant::now();
            let previous = self.data.status;
            self.data.emit(NodeEvent::Entering);

            let result = {
                let TreeNode { data, behavior } = self;
                behavior.tick(data).await
            };

            let mut status = match result {
                Ok(status) => status,
                Err(err) => {
                    error!("[{}] error during tick: {err:#}", self.data.path);
                    self.data.status = NodeStatus::Error;
                    self.data.emit(NodeEvent::Error);
                    NodeStatus::Error
                }
            };

            if status.is_terminal()
                && !self
                    .data
                    .check_predicates(&self.data.postconditions, "postcondition")
            {
                status = NodeStatus::Failure;
            }

            self.data.status = status;
            self.data.metadata.record_tick(tick_start.elapsed(), status);

            if status != previous {
                self.data.emit(NodeEvent::StatusChanged);
            }
            self.data.emit(NodeEvent::Exiting);

            debug!("[{}] tick -> {status}", self.data.path);
            status
        })
    }

    /// Finds a node in this subtree by its full path.
    pub fn find_node(&self, path: &str) -> Option<&TreeNode> {
        if self.data.path == path {
            return Some(self);
        }
        self.data.children.iter().find_map(|child| child.find_node(path))
    }

    pub fn find_node_mut(&mut self, path: &str) -> Option<&mut TreeNode> {
        if self.data.path == path {
            return Some(self);
        }
        self.data
            .children
            .iter_mut()
            .find_map(|child| child.find_node_mut(path))
    }

    /// Depth-first visit of this node and all descendants.
    pub fn for_each(&self, visit: &mut dyn FnMut(&TreeNode)) {
        visit(self);
        for child in &self.data.children {
            child.for_each(visit);
        }
    }

    pub(crate) fn for_each_mut(&mut self, visit: &mut dyn FnMut(&mut TreeNode)) {
        visit(self);
        for child in &mut self.data.children {
            child.for_each_mut(visit);
        }
    }
}

/// The tagged behavior of a node. Composites own ordering/reduction state,
/// decorators own their timing state, leaves own callbacks and stats; the
/// shared state lives in [`NodeData`].
pub enum Behavior {
    // Leaves
    Action(ActionNode),
    Condition(ConditionNode),
    Wait(WaitNode),
    Throttle(ThrottleNode),
    BlackboardSet(BlackboardSetNode),
    BlackboardDelete(BlackboardDeleteNode),
    TimedCondition(TimedConditionNode),
    DebugLog(DebugLogNode),
    EventEmit(EventEmitNode),
    // Composites
    Sequence(SequenceNode),
    Selector(SelectorNode),
    ReactiveSequence(ReactiveSequenceNode),
    ReactiveSelector(ReactiveSelectorNode),
    RandomSelector(RandomSelectorNode),
    Parallel(ParallelNode),
    // Decorators
    Inverter(InverterNode),
    ForceSuccess(ForceSuccessNode),
    ForceFailure(ForceFailureNode),
    Repeat(RepeatNode),
    Retry(RetryNode),
    Timeout(TimeoutNode),
    Delay(DelayNode),
    Cooldown(CooldownNode),
    BlackboardCondition(BlackboardConditionNode),
}

impl std::fmt::Debug for Behavior {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let variant = match self {
            Behavior::Action(_) => "Action",
            Behavior::Condition(_) => "Condition",
            Behavior::Wait(_) => "Wait",
            Behavior::Throttle(_) => "Throttle",
            Behavior::BlackboardSet(_) => "BlackboardSet",
            Behavior::BlackboardDelete(_) => "BlackboardDelete",
            Behavior::TimedCondition(_) => "TimedCondition",
            Behavior::DebugLog(_) => "DebugLog",
            Behavior::EventEmit(_) => "EventEmit",
            Behavior::Sequence(_) => "Sequence",
            Behavior::Selector(_) => "Selector",
            Behavior::ReactiveSequence(_) => "ReactiveSequence",
            Behavior::ReactiveSelector(_) => "ReactiveSelector",
            Behavior::RandomSelector(_) => "RandomSelector",
            Behavior::Parallel(_) => "Parallel",
            Behavior::Inverter(_) => "Inverter",
            Behavior::ForceSuccess(_) => "ForceSuccess",
            Behavior::ForceFailure(_) => "ForceFailure",
            Behavior::Repeat(_) => "Repeat",
            Behavior::Retry(_) => "Retry",
            Behavior::Timeout(_) => "Timeout",
            Behavior::Delay(_) => "Delay",
            Behavior::Cooldown(_) => "Cooldown",
            Behavior::BlackboardCondition(_) => "BlackboardCondition",
        };
        f.write_str(variant)
    }
}

impl Behavior {
    pub(crate) fn tick<'a>(&'a mut self, data: &'a mut NodeData) -> BoxFuture<'a, NodeResult> {
        match self {
            Self::Action(node) => Box::pin(node.tick(data)),
            Self::Condition(node) => Box::pin(node.tick(data)),
            Self::Wait(node) => Box::pin(node.tick(data)),
            Self::Throttle(node) => Box::pin(node.tick(data)),
            Self::BlackboardSet(node) => Box::pin(node.tick(data)),
            Self::BlackboardDelete(node) => Box::pin(node.tick(data)),
            Self::TimedCondition(node) => Box::pin(node.tick(data)),
            Self::DebugLog(node) => Box::pin(node.tick(data)),
            Self::EventEmit(node) => Box::pin(node.tick(data)),
            Self::Sequence(node) => Box::pin(node.tick(data)),
            Self::Selector(node) => Box::pin(node.tick(data)),
            Self::ReactiveSequence(node) => Box::pin(node.tick(data)),
            Self::ReactiveSelector(node) => Box::pin(node.tick(data)),
            Self::RandomSelector(node) => Box::pin(node.tick(data)),
            Self::Parallel(node) => Box::pin(node.tick(data)),
            Self::Inverter(node) => Box::pin(node.tick(data)),
            Self::ForceSuccess(node) => Box::pin(node.tick(data)),
            Self::ForceFailure(node) => Box::pin(node.tick(data)),
            Self::Repeat(node) => Box::pin(node.tick(data)),
            Self::Retry(node) => Box::pin(node.tick(data)),
            Self::Timeout(node) => Box::pin(node.tick(data)),
            Self::Delay(node) => Box::pin(node.tick(data)),
            Self::Cooldown(node) => Box::pin(node.tick(data)),
            Self::BlackboardCondition(node) => Box::pin(node.tick(data)),
        }
    }

    /// Clears behavior-internal state (indices, attempt counters, clocks).
    pub(crate) fn reset(&mut self) {
        match self {
            Self::Action(node) => node.reset(),
            Self::Condition(_) => {}
            Self::Wait(node) => node.reset(),
            Self::Throttle(node) => node.reset(),
            Self::BlackboardSet(_) | Self::BlackboardDelete(_) => {}
            Self::TimedCondition(_) => {}
            Self::DebugLog(_) | Self::EventEmit(_) => {}
            Self::Sequence(node) => node.reset(),
            Self::Selector(node) => node.reset(),
            Self::ReactiveSequence(node) => node.reset(),
            Self::ReactiveSelector(node) => node.reset(),
            Self::RandomSelector(node) => node.reset(),
            Self::Parallel(node) => node.reset(),
            Self::Inverter(_) | Self::ForceSuccess(_) | Self::ForceFailure(_) => {}
            Self::Repeat(node) => node.reset(),
            Self::Retry(node) => node.reset(),
            Self::Timeout(_) => {}
            Self::Delay(_) => {}
            Self::Cooldown(node) => node.reset(),
            Self::BlackboardCondition(_) => {}
        }
    }

    pub(crate) fn kind(&self) -> NodeKind {
        match self {
            Self::Action(_)
            | Self::Condition(_)
            | Self::Wait(_)
            | Self::Throttle(_)
            | Self::BlackboardSet(_)
            | Self::BlackboardDelete(_)
            | Self::TimedCondition(_)
            | Self::DebugLog(_)
            | Self::EventEmit(_) => NodeKind::Leaf,
            Self::Sequence(_)
            | Self::Selector(_)
            | Self::ReactiveSequence(_)
            | Self::ReactiveSelector(_)
            | Self::RandomSelector(_)
            | Self::Parallel(_) => NodeKind::Composite,
            Self::Inverter(_)
            | Self::ForceSuccess(_)
            | Self::ForceFailure(_)
            | Self::Repeat(_)
            | Self::Retry(_)
            | Self::Timeout(_)
            | Self::Delay(_)
            | Self::Cooldown(_)
            | Self::BlackboardCondition(_) => NodeKind::Decorator,
        }
    }

    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            Self::Action(_) => "ActionNode",
            Self::Condition(_) => "ConditionNode",
            Self::Wait(_) => "WaitNode",
            Self::Throttle(_) => "ThrottleNode",
            Self::BlackboardSet(_) => "BlackboardSetNode",
            Self::BlackboardDelete(_) => "BlackboardDeleteNode",
            Self::TimedCondition(_) => "TimedConditionNode",
            Self::DebugLog(_) => "DebugLogNode",
            Self::EventEmit(_) => "EventEmitNode",
            Self::Sequence(_) => "SequenceNode",
            Self::Selector(_) => "SelectorNode",
            Self::ReactiveSequence(_) => "ReactiveSequence",
            Self::ReactiveSelector(_) => "ReactiveSelector",
            Self::RandomSelector(_) => "RandomSelector",
            Self::Parallel(_) => "ParallelNode",
            Self::Inverter(_) => "InverterNode",
            Self::ForceSuccess(_) => "ForceSuccessNode",
            Self::ForceFailure(_) => "ForceFailureNode",
            Self::Repeat(_) => "RepeatNode",
            Self::Retry(_) => "RetryNode",
            Self::Timeout(_) => "TimeoutNode",
            Self::Delay(_) => "DelayNode",
            Self::Cooldown(_) => "CooldownNode",
            Self::BlackboardCondition(_) => "BlackboardConditionNode",
        }
    }
}

macro_rules! impl_into_behavior {
    ( $($node:ident => $variant:ident),* $(,)? ) => {
        $(
            impl From<$node> for Behavior {
                fn from(node: $node) -> Behavior {
                    Behavior::$variant(node)
                }
            }
        )*
    };
}

impl_into_behavior!(
    ActionNode => Action,
    ConditionNode => Condition,
    WaitNode => Wait,
    ThrottleNode => Throttle,
    BlackboardSetNode => BlackboardSet,
    BlackboardDeleteNode => BlackboardDelete,
    TimedConditionNode => TimedCondition,
    DebugLogNode => DebugLog,
    EventEmitNode => EventEmit,
    SequenceNode => Sequence,
    SelectorNode => Selector,
    ReactiveSequenceNode => ReactiveSequence,
    ReactiveSelectorNode => ReactiveSelector,
    RandomSelectorNode => RandomSelector,
    ParallelNode => Parallel,
    InverterNode => Inverter,
    ForceSuccessNode => ForceSuccess,
    ForceFailureNode => ForceFailure,
    RepeatNode => Repeat,
    RetryNode => Retry,
    TimeoutNode => Timeout,
    DelayNode => Delay,
    CooldownNode => Cooldown,
    BlackboardConditionNode => BlackboardCondition,
);
