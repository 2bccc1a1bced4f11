#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use ticktree::{ActionNode, ActionResult, Blackboard, TreeNode, WorkerPool};

pub fn test_setup() {
    let _ = pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

/// Initializes a detached tree against a fresh blackboard and worker pool.
pub fn init(root: &mut TreeNode) -> Blackboard {
    let blackboard = Blackboard::new();
    root.initialize(&blackboard, &WorkerPool::default());
    blackboard
}

/// Action leaf that always returns `result` and counts its invocations.
/// The callback is async so timing tests stay deterministic under a
/// paused clock.
pub fn counted_action(name: &str, result: ActionResult, counter: &Arc<AtomicUsize>) -> TreeNode {
    let counter = Arc::clone(counter);
    TreeNode::new(
        name,
        ActionNode::from_async(move || {
            let counter = Arc::clone(&counter);
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(result)
            })
        }),
    )
}

/// Action leaf that appends its name to `trace` and returns `result`.
pub fn traced_action(name: &str, result: ActionResult, trace: &Arc<Mutex<Vec<String>>>) -> TreeNode {
    let trace = Arc::clone(trace);
    let tag = name.to_string();
    TreeNode::new(
        name,
        ActionNode::from_async(move || {
            let trace = Arc::clone(&trace);
            let tag = tag.clone();
            Box::pin(async move {
                trace.lock().unwrap().push(tag);
                Ok(result)
            })
        }),
    )
}

/// Action leaf that returns `RUNNING` for `runs` invocations, then the
/// final result. Counts every invocation.
pub fn running_for(
    name: &str,
    runs: usize,
    then: ActionResult,
    counter: &Arc<AtomicUsize>,
) -> TreeNode {
    let counter = Arc::clone(counter);
    let remaining = Arc::new(AtomicUsize::new(runs));
    TreeNode::new(
        name,
        ActionNode::from_async(move || {
            let counter = Arc::clone(&counter);
            let remaining = Arc::clone(&remaining);
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                if remaining
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                    .is_ok()
                {
                    Ok(ActionResult::Running)
                } else {
                    Ok(then)
                }
            })
        }),
    )
}

/// Action leaf that fails `failures` times, then succeeds.
pub fn fail_then_succeed(name: &str, failures: usize, counter: &Arc<AtomicUsize>) -> TreeNode {
    let counter = Arc::clone(counter);
    let remaining = Arc::new(AtomicUsize::new(failures));
    TreeNode::new(
        name,
        ActionNode::from_async(move || {
            let counter = Arc::clone(&counter);
            let remaining = Arc::clone(&remaining);
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                if remaining
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                    .is_ok()
                {
                    Ok(ActionResult::Failure)
                } else {
                    Ok(ActionResult::Success)
                }
            })
        }),
    )
}

pub fn new_counter() -> Arc<AtomicUsize> {
    Arc::new(AtomicUsize::new(0))
}

pub fn count(counter: &Arc<AtomicUsize>) -> usize {
    counter.load(Ordering::SeqCst)
}
