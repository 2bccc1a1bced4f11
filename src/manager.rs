use std::{
    collections::HashMap,
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde_json::Value;
use tokio::{
    sync::Semaphore,
    time::{sleep, Instant},
};

use crate::{
    basic_types::NodeStatus,
    blackboard::Blackboard,
    config::{ConfigError, NodeRegistry, TreeDescription, TreeMetadata},
    nodes::TreeNode,
};

/// Bounded pool for offloading synchronous user callbacks so they never
/// block the scheduler. A semaphore caps how many blocking tasks run at
/// once; the closure itself executes on the runtime's blocking threads.
#[derive(Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
}

impl WorkerPool {
    pub fn new(max_workers: usize) -> WorkerPool {
        Self {
            permits: Arc::new(Semaphore::new(max_workers.max(1))),
        }
    }

    pub async fn run<F, T>(&self, task: F) -> anyhow::Result<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let _permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .expect("worker pool semaphore is never closed");
        Ok(tokio::task::spawn_blocking(task).await?)
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(4)
    }
}

/// Immutable record of every node's status plus the blackboard contents,
/// usable for rewind or diagnostics.
#[derive(Clone)]
pub struct TreeSnapshot {
    pub timestamp: DateTime<Utc>,
    pub node_states: HashMap<String, NodeStatus>,
    pub blackboard_data: HashMap<String, HashMap<String, Value>>,
}

impl TreeSnapshot {
    fn capture(root: Option<&TreeNode>, blackboard: &Blackboard) -> TreeSnapshot {
        let mut node_states = HashMap::new();
        if let Some(root) = root {
            root.for_each(&mut |node| {
                node_states.insert(node.path().to_string(), node.status());
            });
        }

        Self {
            timestamp: Utc::now(),
            node_states,
            blackboard_data: blackboard.contents(),
        }
    }
}

/// Aggregate execution bookkeeping for one manager.
pub struct TreeExecutionContext {
    pub start_time: DateTime<Utc>,
    pub total_ticks: u64,
    pub snapshots: Vec<TreeSnapshot>,
    pub last_tick_duration: Duration,
    pub average_tick_duration: Duration,
    pub error_count: u64,
    pub success_count: u64,
    pub failure_count: u64,
}

impl Default for TreeExecutionContext {
    fn default() -> Self {
        Self {
            start_time: Utc::now(),
            total_ticks: 0,
            snapshots: Vec::new(),
            last_tick_duration: Duration::ZERO,
            average_tick_duration: Duration::ZERO,
            error_count: 0,
            success_count: 0,
            failure_count: 0,
        }
    }
}

/// Diagnostic projection returned by [`TreeManager::get_stats`].
#[derive(Debug, Clone)]
pub struct TreeStats {
    pub total_ticks: u64,
    pub last_tick_duration: Duration,
    pub average_tick_duration: Duration,
    pub error_count: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub uptime: Duration,
    pub snapshot_count: usize,
    pub current_status: Option<NodeStatus>,
}

/// Control handle usable from outside the `run()` loop.
#[derive(Clone)]
pub struct TreeManagerHandle {
    running: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
}

impl TreeManagerHandle {
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        info!("stopping behavior tree");
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
        info!("pausing behavior tree");
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
        info!("resuming behavior tree");
    }
}

/// Owns a behavior tree and everything around it: the shared blackboard,
/// the worker pool, the fixed-rate tick loop, snapshots, a registry of
/// named subtrees, and configuration load/save.
pub struct TreeManager {
    tick_rate: f64,
    root: Option<TreeNode>,
    blackboard: Blackboard,
    workers: WorkerPool,
    running: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    enable_snapshots: bool,
    snapshot_interval: u64,
    max_history: usize,
    context: TreeExecutionContext,
    subtrees: HashMap<String, Arc<Mutex<TreeNode>>>,
    registry: NodeRegistry,
}

impl TreeManager {
    pub fn new() -> TreeManager {
        Self {
            tick_rate: 60.0,
            root: None,
            blackboard: Blackboard::new(),
            workers: WorkerPool::default(),
            running: Arc::new(AtomicBool::new(false)),
            paused: Arc::new(AtomicBool::new(false)),
            enable_snapshots: false,
            snapshot_interval: 100,
            max_history: 100,
            context: TreeExecutionContext::default(),
            subtrees: HashMap::new(),
            registry: NodeRegistry::new(),
        }
    }

    /// Target frequency of [`run`](Self::run) in Hz.
    pub fn with_tick_rate(mut self, tick_rate: f64) -> TreeManager {
        self.tick_rate = tick_rate;
        self
    }

    /// Size of the bounded pool for synchronous callbacks. Applies to
    /// nodes initialized after this call.
    pub fn with_max_workers(mut self, max_workers: usize) -> TreeManager {
        self.workers = WorkerPool::new(max_workers);
        self
    }

    /// Enables periodic snapshots, one every `interval` ticks.
    pub fn with_snapshots(mut self, interval: u64) -> TreeManager {
        self.enable_snapshots = true;
        self.snapshot_interval = interval.max(1);
        self
    }

    /// Bounds the retained snapshot history.
    pub fn with_max_history(mut self, max_history: usize) -> TreeManager {
        self.max_history = max_history.max(1);
        self
    }

    pub fn blackboard(&self) -> &Blackboard {
        &self.blackboard
    }

    pub fn tick_rate(&self) -> f64 {
        self.tick_rate
    }

    pub fn workers(&self) -> &WorkerPool {
        &self.workers
    }

    pub fn context(&self) -> &TreeExecutionContext {
        &self.context
    }

    pub fn registry_mut(&mut self) -> &mut NodeRegistry {
        &mut self.registry
    }

    pub fn root(&self) -> Option<&TreeNode> {
        self.root.as_ref()
    }

    pub fn root_mut(&mut self) -> Option<&mut TreeNode> {
        self.root.as_mut()
    }

    /// Installs `root`, initializing it against the shared blackboard and
    /// worker pool.
    pub fn set_root(&mut self, mut root: TreeNode) {
        root.initialize(&self.blackboard, &self.workers);
        self.root = Some(root);
    }

    /// Single tick of the root. Updates execution stats and, when enabled,
    /// appends a periodic snapshot. Paused managers return the root's last
    /// status without ticking.
    pub async fn tick_tree(&mut self) -> NodeStatus {
        let Some(root) = self.root.as_mut() else {
            warn!("no root node set");
            return NodeStatus::Invalid;
        };

        if self.paused.load(Ordering::SeqCst) {
            return root.status();
        }

        let start = Instant::now();
        let status = root.tick().await;

        self.context.total_ticks += 1;
        self.context.last_tick_duration = start.elapsed();
        let total = self.context.total_ticks as f64;
        let mean = self.context.average_tick_duration.as_secs_f64();
        self.context.average_tick_duration = Duration::from_secs_f64(
            (mean * (total - 1.0) + self.context.last_tick_duration.as_secs_f64()) / total,
        );

        match status {
            NodeStatus::Success => self.context.success_count += 1,
            NodeStatus::Failure => self.context.failure_count += 1,
            NodeStatus::Error => self.context.error_count += 1,
            _ => {}
        }

        if self.enable_snapshots && self.context.total_ticks % self.snapshot_interval == 0 {
            self.take_snapshot();
        }

        status
    }

    /// Fixed-rate loop: tick, then sleep out the rest of the interval. A tick
    /// that overruns its interval is logged and the next one starts
    /// immediately; there is no catch-up. Runs the root's `setup()` on
    /// entry and `shutdown()` on exit.
    pub async fn run(&mut self) {
        if self.root.is_none() {
            error!("cannot run tree: no root node set");
            return;
        }

        self.running.store(true, Ordering::SeqCst);
        let tick_interval = Duration::from_secs_f64(1.0 / self.tick_rate);

        info!("starting behavior tree with tick rate: {} Hz", self.tick_rate);

        if let Some(root) = self.root.as_mut() {
            root.setup().await;
        }

        while self.running.load(Ordering::SeqCst) {
            let start = Instant::now();

            let status = self.tick_tree().await;
            debug!("tree tick completed with status: {status}");

            let elapsed = start.elapsed();
            if elapsed < tick_interval {
                sleep(tick_interval - elapsed).await;
            } else {
                warn!(
                    "tick took longer than interval: {:.4}s",
                    elapsed.as_secs_f64()
                );
            }
        }

        if let Some(root) = self.root.as_mut() {
            root.shutdown().await;
        }
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        info!("stopping behavior tree");
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
        info!("pausing behavior tree");
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
        info!("resuming behavior tree");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Cloneable stop/pause/resume handle for use while `run()` holds the
    /// manager.
    pub fn handle(&self) -> TreeManagerHandle {
        TreeManagerHandle {
            running: Arc::clone(&self.running),
            paused: Arc::clone(&self.paused),
        }
    }

    /// Captures and retains a snapshot; history is bounded and drops the
    /// oldest entry on overflow.
    pub fn take_snapshot(&mut self) -> TreeSnapshot {
        let snapshot = TreeSnapshot::capture(self.root.as_ref(), &self.blackboard);
        self.context.snapshots.push(snapshot.clone());
        if self.context.snapshots.len() > self.max_history {
            self.context.snapshots.remove(0);
        }
        snapshot
    }

    /// Rewrites node statuses by path and writes the snapshot's blackboard
    /// values back.
    pub fn restore_snapshot(&mut self, snapshot: &TreeSnapshot) {
        if let Some(root) = self.root.as_mut() {
            root.for_each_mut(&mut |node| {
                if let Some(status) = snapshot.node_states.get(node.path()) {
                    node.data.status = *status;
                }
            });
        }

        for (namespace, values) in &snapshot.blackboard_data {
            for (key, value) in values {
                self.blackboard.set(key, value.clone(), namespace);
            }
        }
    }

    /// Registers a reusable subtree by name, initializing it against the
    /// shared blackboard. Each subtree sits behind its own lock.
    pub fn register_subtree(&mut self, name: impl AsRef<str>, mut root: TreeNode) {
        root.initialize(&self.blackboard, &self.workers);
        self.subtrees
            .insert(name.as_ref().to_string(), Arc::new(Mutex::new(root)));
    }

    pub fn get_subtree(&self, name: &str) -> Option<Arc<Mutex<TreeNode>>> {
        self.subtrees.get(name).cloned()
    }

    /// Serializes the tree structure (and registered subtrees) to a
    /// `.json`/`.yml`/`.yaml` file.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let description = TreeDescription {
            metadata: Some(TreeMetadata {
                created_at: Some(Utc::now()),
                tick_rate: Some(self.tick_rate),
                total_ticks: Some(self.context.total_ticks),
            }),
            tree: self.root.as_ref().map(|root| root.describe()),
            subtrees: self
                .subtrees
                .iter()
                .map(|(name, root)| (name.clone(), root.lock().unwrap().describe()))
                .collect(),
        };

        crate::config::save_description(&description, path)
    }

    /// Loads a tree description, builds it through the node registry, and
    /// installs it as the new root. `metadata.tick_rate` overrides the
    /// configured rate; `subtrees` are registered by name.
    pub fn load_from_file(&mut self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let description = crate::config::load_description(path)?;
        self.apply_description(description)
    }

    /// In-memory counterpart of [`load_from_file`](Self::load_from_file);
    /// accepts a description a caller assembled in code.
    pub fn apply_description(&mut self, description: TreeDescription) -> Result<(), ConfigError> {
        if let Some(metadata) = &description.metadata {
            if let Some(tick_rate) = metadata.tick_rate {
                self.tick_rate = tick_rate;
            }
        }

        if let Some(tree) = &description.tree {
            let root = self.registry.build_tree(tree)?;
            self.set_root(root);
        }

        for (name, spec) in &description.subtrees {
            let subtree = self.registry.build_tree(spec)?;
            self.register_subtree(name, subtree);
        }

        Ok(())
    }

    pub fn get_stats(&self) -> TreeStats {
        TreeStats {
            total_ticks: self.context.total_ticks,
            last_tick_duration: self.context.last_tick_duration,
            average_tick_duration: self.context.average_tick_duration,
            error_count: self.context.error_count,
            success_count: self.context.success_count,
            failure_count: self.context.failure_count,
            uptime: (Utc::now() - self.context.start_time)
                .to_std()
                .unwrap_or(Duration::ZERO),
            snapshot_count: self.context.snapshots.len(),
            current_status: self.root.as_ref().map(|root| root.status()),
        }
    }
}

impl Default for TreeManager {
    fn default() -> Self {
        Self::new()
    }
}
