use std::sync::{Arc, Mutex};

use ticktree::{
    ActionResult, Blackboard, BlackboardConditionNode, CompareOp, NodeEvent, NodeStatus,
    SequenceNode, TreeNode, WorkerPool,
};

mod common;

use common::*;

fn record_events(node: &mut TreeNode, log: &Arc<Mutex<Vec<NodeEvent>>>) {
    for event in [
        NodeEvent::Initialized,
        NodeEvent::Entering,
        NodeEvent::Exiting,
        NodeEvent::Setup,
        NodeEvent::Shutdown,
        NodeEvent::StatusChanged,
        NodeEvent::Error,
    ] {
        let log = Arc::clone(log);
        node.add_event_handler(
            event,
            Arc::new(move |info| {
                log.lock().unwrap().push(info.event);
                Ok(())
            }),
        );
    }
}

#[tokio::test]
async fn tick_before_initialize_is_an_error() {
    test_setup();

    let mut root = counted_action("task", ActionResult::Success, &new_counter());
    assert_eq!(root.tick().await, NodeStatus::Error);
}

#[tokio::test]
async fn lifecycle_event_order() {
    test_setup();

    let log = Arc::new(Mutex::new(Vec::new()));
    let mut root = counted_action("task", ActionResult::Success, &new_counter());
    record_events(&mut root, &log);

    init(&mut root);
    assert_eq!(*log.lock().unwrap(), vec![NodeEvent::Initialized]);

    root.tick().await;
    assert_eq!(
        *log.lock().unwrap(),
        vec![
            NodeEvent::Initialized,
            NodeEvent::Setup,
            NodeEvent::Entering,
            NodeEvent::StatusChanged,
            NodeEvent::Exiting,
        ]
    );

    // Second tick: setup is one-time, and the status did not change.
    log.lock().unwrap().clear();
    root.tick().await;
    assert_eq!(
        *log.lock().unwrap(),
        vec![NodeEvent::Entering, NodeEvent::Exiting]
    );

    root.shutdown().await;
    assert!(log.lock().unwrap().contains(&NodeEvent::Shutdown));
}

#[tokio::test]
async fn failing_event_handler_is_swallowed() {
    test_setup();

    let mut root = counted_action("task", ActionResult::Success, &new_counter());
    root.add_event_handler(
        NodeEvent::Entering,
        Arc::new(|_| anyhow::bail!("handler exploded")),
    );
    let later = new_counter();
    let seen = Arc::clone(&later);
    root.add_event_handler(
        NodeEvent::Entering,
        Arc::new(move |_| {
            seen.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        }),
    );
    init(&mut root);

    // The tick completes and later handlers still run.
    assert_eq!(root.tick().await, NodeStatus::Success);
    assert_eq!(count(&later), 1);
}

#[tokio::test]
async fn failed_precondition_skips_without_entering() {
    test_setup();

    let calls = new_counter();
    let entered = new_counter();
    let mut root = counted_action("task", ActionResult::Success, &calls);

    let seen = Arc::clone(&entered);
    root.add_event_handler(
        NodeEvent::Entering,
        Arc::new(move |_| {
            seen.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        }),
    );
    root.add_precondition(Arc::new(|| Ok(false)));
    init(&mut root);

    assert_eq!(root.tick().await, NodeStatus::Skipped);
    assert_eq!(count(&calls), 0);
    assert_eq!(count(&entered), 0);
    assert_eq!(root.metadata().skipped_count, 1);
    assert_eq!(root.metadata().total_ticks, 1);
}

#[tokio::test]
async fn throwing_precondition_skips() {
    test_setup();

    let mut root = counted_action("task", ActionResult::Success, &new_counter());
    root.add_precondition(Arc::new(|| anyhow::bail!("broken predicate")));
    init(&mut root);

    assert_eq!(root.tick().await, NodeStatus::Skipped);
}

#[tokio::test]
async fn failed_postcondition_forces_failure() {
    test_setup();

    let mut root = counted_action("task", ActionResult::Success, &new_counter());
    root.add_postcondition(Arc::new(|| Ok(false)));
    init(&mut root);

    assert_eq!(root.tick().await, NodeStatus::Failure);
}

#[tokio::test]
async fn postconditions_ignore_running() {
    test_setup();

    let mut root = running_for("task", 1, ActionResult::Success, &new_counter());
    root.add_postcondition(Arc::new(|| Ok(false)));
    init(&mut root);

    // Non-terminal statuses bypass postconditions.
    assert_eq!(root.tick().await, NodeStatus::Running);
    assert_eq!(root.tick().await, NodeStatus::Failure);
}

#[tokio::test]
async fn behavior_errors_become_error_status() {
    test_setup();

    let log = Arc::new(Mutex::new(Vec::new()));
    // Reading from a namespace that was never created is the one
    // blackboard error that propagates, and the tick captures it.
    let mut root = TreeNode::new(
        "gate",
        BlackboardConditionNode::new("armed", CompareOp::Eq, true)
            .unwrap()
            .with_namespace("ghost"),
    );
    root.add_child(counted_action("fire", ActionResult::Success, &new_counter())).unwrap();
    record_events(&mut root, &log);
    init(&mut root);

    assert_eq!(root.tick().await, NodeStatus::Error);
    assert_eq!(root.status(), NodeStatus::Error);
    assert!(log.lock().unwrap().contains(&NodeEvent::Error));
    assert_eq!(root.metadata().error_count, 1);
}

#[tokio::test]
async fn metadata_counters_sum_to_total_ticks() {
    test_setup();

    let mut root = fail_then_succeed("flaky", 2, &new_counter());
    root.add_precondition(Arc::new(|| Ok(true)));
    init(&mut root);

    root.tick().await; // failure
    root.tick().await; // failure
    root.tick().await; // success
    root.tick().await; // success

    let meta = root.metadata();
    assert_eq!(meta.total_ticks, 4);
    assert_eq!(
        meta.total_ticks,
        meta.success_count
            + meta.failure_count
            + meta.running_count
            + meta.error_count
            + meta.skipped_count
    );
    assert_eq!(meta.success_count, 2);
    assert_eq!(meta.failure_count, 2);
    assert_eq!(meta.last_status, Some(NodeStatus::Success));
    assert!(meta.last_tick_time.is_some());
}

#[tokio::test]
async fn paths_follow_the_ancestry() {
    test_setup();

    let mut inner = TreeNode::new("inner", SequenceNode::default());
    inner.add_child(counted_action("leaf", ActionResult::Success, &new_counter())).unwrap();

    let mut root = TreeNode::new("root", SequenceNode::default());
    root.add_child(inner).unwrap();

    assert_eq!(root.path(), "root");
    let leaf = root.find_node("root/inner/leaf").expect("leaf is reachable by path");
    assert_eq!(leaf.name(), "leaf");
    assert_eq!(leaf.parent_path(), Some("root/inner"));
}

#[tokio::test]
async fn arity_is_enforced() {
    test_setup();

    let mut leaf = counted_action("leaf", ActionResult::Success, &new_counter());
    assert!(leaf
        .add_child(counted_action("child", ActionResult::Success, &new_counter()))
        .is_err());

    let mut decorator = TreeNode::new("inv", ticktree::InverterNode::new());
    decorator
        .add_child(counted_action("first", ActionResult::Success, &new_counter()))
        .unwrap();
    assert!(decorator
        .add_child(counted_action("second", ActionResult::Success, &new_counter()))
        .is_err());
}

#[tokio::test]
async fn add_child_after_initialize_attaches_it() {
    test_setup();

    let blackboard = Blackboard::new();
    let mut root = TreeNode::new("root", SequenceNode::default());
    root.initialize(&blackboard, &WorkerPool::default());

    let counter = new_counter();
    root.add_child(counted_action("late", ActionResult::Success, &counter)).unwrap();

    assert_eq!(root.tick().await, NodeStatus::Success);
    assert_eq!(count(&counter), 1);
}

#[tokio::test]
async fn reset_recurses_and_clears_state() {
    test_setup();

    let mut root = TreeNode::new("seq", SequenceNode::default());
    root.add_child(counted_action("a", ActionResult::Success, &new_counter())).unwrap();
    root.add_child(running_for("b", 5, ActionResult::Success, &new_counter())).unwrap();
    init(&mut root);

    assert_eq!(root.tick().await, NodeStatus::Running);
    assert_ne!(root.status(), NodeStatus::Invalid);

    root.reset();
    assert_eq!(root.status(), NodeStatus::Invalid);
    let mut statuses = Vec::new();
    root.for_each(&mut |node| statuses.push(node.status()));
    assert!(statuses.iter().all(|status| *status == NodeStatus::Invalid));
}

#[tokio::test]
async fn remove_event_handler_by_identity() {
    test_setup();

    let fired = new_counter();
    let seen = Arc::clone(&fired);
    let handler: ticktree::nodes::EventHandler = Arc::new(move |_| {
        seen.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    });

    let mut root = counted_action("task", ActionResult::Success, &new_counter());
    root.add_event_handler(NodeEvent::Entering, Arc::clone(&handler));
    init(&mut root);

    root.tick().await;
    assert_eq!(count(&fired), 1);

    root.remove_event_handler(NodeEvent::Entering, &handler);
    root.tick().await;
    assert_eq!(count(&fired), 1);
}

#[tokio::test]
async fn sequence_error_child_reads_as_failure() {
    test_setup();

    // A child that returns ERROR aborts the sequence like a failure.
    let never = new_counter();
    let mut root = TreeNode::new("seq", SequenceNode::default());

    let mut gate = TreeNode::new(
        "gate",
        BlackboardConditionNode::new("k", CompareOp::Eq, 1)
            .unwrap()
            .with_namespace("ghost"),
    );
    gate.add_child(counted_action("inner", ActionResult::Success, &new_counter())).unwrap();
    root.add_child(gate).unwrap();
    root.add_child(counted_action("never", ActionResult::Success, &never)).unwrap();
    init(&mut root);

    assert_eq!(root.tick().await, NodeStatus::Failure);
    assert_eq!(count(&never), 0);
    assert_eq!(
        root.find_node("seq/gate").unwrap().status(),
        NodeStatus::Error
    );
}
