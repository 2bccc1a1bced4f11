use std::sync::{atomic::AtomicBool, Arc, Mutex};

use ticktree::{
    ActionResult, ConditionNode, MemoryPolicy, NodeStatus, ParallelNode, ParallelPolicy,
    RandomSelectorNode, ReactiveSelectorNode, ReactiveSequenceNode, SelectorNode, SequenceNode,
    TreeNode,
};

mod common;

use common::*;

#[tokio::test]
async fn sequence_of_three_success() {
    test_setup();

    let trace = Arc::new(Mutex::new(Vec::new()));
    let mut root = TreeNode::new("seq", SequenceNode::default());
    root.add_child(traced_action("a", ActionResult::Success, &trace)).unwrap();
    root.add_child(traced_action("b", ActionResult::Success, &trace)).unwrap();
    root.add_child(traced_action("c", ActionResult::Success, &trace)).unwrap();
    init(&mut root);

    assert_eq!(root.tick().await, NodeStatus::Success);
    assert_eq!(*trace.lock().unwrap(), vec!["a", "b", "c"]);
}

#[tokio::test]
async fn sequence_stops_at_first_failure() {
    test_setup();

    let failed = new_counter();
    let never = new_counter();
    let mut root = TreeNode::new("seq", SequenceNode::default());
    root.add_child(counted_action("ok", ActionResult::Success, &new_counter())).unwrap();
    root.add_child(counted_action("bad", ActionResult::Failure, &failed)).unwrap();
    root.add_child(counted_action("never", ActionResult::Success, &never)).unwrap();
    init(&mut root);

    assert_eq!(root.tick().await, NodeStatus::Failure);
    assert_eq!(count(&failed), 1);
    assert_eq!(count(&never), 0);
}

#[tokio::test]
async fn empty_composites() {
    test_setup();

    let mut seq = TreeNode::new("seq", SequenceNode::default());
    init(&mut seq);
    assert_eq!(seq.tick().await, NodeStatus::Success);

    let mut sel = TreeNode::new("sel", SelectorNode::default());
    init(&mut sel);
    assert_eq!(sel.tick().await, NodeStatus::Failure);
}

#[tokio::test]
async fn selector_short_circuit() {
    test_setup();

    let third = new_counter();
    let mut root = TreeNode::new("sel", SelectorNode::default());
    root.add_child(counted_action("a", ActionResult::Failure, &new_counter())).unwrap();
    root.add_child(counted_action("b", ActionResult::Success, &new_counter())).unwrap();
    root.add_child(counted_action("c", ActionResult::Success, &third)).unwrap();
    init(&mut root);

    assert_eq!(root.tick().await, NodeStatus::Success);
    assert_eq!(count(&third), 0);
}

#[tokio::test]
async fn persistent_sequence_resumes_running_child() {
    test_setup();

    let first = new_counter();
    let worker = new_counter();
    let mut root = TreeNode::new("seq", SequenceNode::new(MemoryPolicy::Persistent));
    root.add_child(counted_action("first", ActionResult::Success, &first)).unwrap();
    root.add_child(running_for("worker", 1, ActionResult::Success, &worker)).unwrap();
    init(&mut root);

    assert_eq!(root.tick().await, NodeStatus::Running);
    assert_eq!(count(&first), 1);

    // The resolved child is not reinvoked while the worker finishes.
    assert_eq!(root.tick().await, NodeStatus::Success);
    assert_eq!(count(&first), 1);
    assert_eq!(count(&worker), 2);
}

#[tokio::test]
async fn fresh_sequence_restarts_each_tick() {
    test_setup();

    let first = new_counter();
    let worker = new_counter();
    let mut root = TreeNode::new("seq", SequenceNode::new(MemoryPolicy::Fresh));
    root.add_child(counted_action("first", ActionResult::Success, &first)).unwrap();
    root.add_child(running_for("worker", 1, ActionResult::Success, &worker)).unwrap();
    init(&mut root);

    assert_eq!(root.tick().await, NodeStatus::Running);
    assert_eq!(root.tick().await, NodeStatus::Success);
    assert_eq!(count(&first), 2);
}

#[tokio::test]
async fn reactive_sequence_aborts_on_guard_failure() {
    test_setup();

    let armed = Arc::new(AtomicBool::new(true));
    let worker = new_counter();

    let guard_flag = Arc::clone(&armed);
    let mut root = TreeNode::new("seq", ReactiveSequenceNode::new());
    root.add_child(TreeNode::new(
        "guard",
        ConditionNode::from_sync(move || guard_flag.load(std::sync::atomic::Ordering::SeqCst)),
    ))
    .unwrap();
    root.add_child(running_for("worker", 100, ActionResult::Success, &worker)).unwrap();
    init(&mut root);

    assert_eq!(root.tick().await, NodeStatus::Running);
    assert_eq!(count(&worker), 1);

    // Guard flips; the in-progress worker must not be ticked again.
    armed.store(false, std::sync::atomic::Ordering::SeqCst);
    assert_eq!(root.tick().await, NodeStatus::Failure);
    assert_eq!(count(&worker), 1);
}

#[tokio::test]
async fn reactive_selector_preempts_on_earlier_success() {
    test_setup();

    let preferred_ok = Arc::new(AtomicBool::new(false));
    let fallback = new_counter();

    let flag = Arc::clone(&preferred_ok);
    let mut root = TreeNode::new("sel", ReactiveSelectorNode::new());
    root.add_child(TreeNode::new(
        "preferred",
        ConditionNode::from_sync(move || flag.load(std::sync::atomic::Ordering::SeqCst)),
    ))
    .unwrap();
    root.add_child(running_for("fallback", 100, ActionResult::Success, &fallback)).unwrap();
    init(&mut root);

    assert_eq!(root.tick().await, NodeStatus::Running);
    let fallback_ticks = count(&fallback);

    // The higher-priority child recovers and wins the next tick.
    preferred_ok.store(true, std::sync::atomic::Ordering::SeqCst);
    assert_eq!(root.tick().await, NodeStatus::Success);
    assert_eq!(count(&fallback), fallback_ticks);
}

#[tokio::test]
async fn random_selector_tries_every_child_once() {
    test_setup();

    let counters: Vec<_> = (0..4).map(|_| new_counter()).collect();
    let mut root = TreeNode::new("sel", RandomSelectorNode::new());
    for (i, counter) in counters.iter().enumerate() {
        root.add_child(counted_action(&format!("c{i}"), ActionResult::Failure, counter)).unwrap();
    }
    init(&mut root);

    assert_eq!(root.tick().await, NodeStatus::Failure);
    for counter in &counters {
        assert_eq!(count(counter), 1);
    }
}

#[tokio::test]
async fn random_selector_stops_on_success() {
    test_setup();

    let counter = new_counter();
    let mut root = TreeNode::new("sel", RandomSelectorNode::new());
    root.add_child(counted_action("only", ActionResult::Success, &counter)).unwrap();
    init(&mut root);

    assert_eq!(root.tick().await, NodeStatus::Success);
    assert_eq!(root.tick().await, NodeStatus::Success);
    assert_eq!(count(&counter), 2);
}

#[tokio::test]
async fn parallel_require_one_cancels_the_laggard() {
    test_setup();

    let mut root = TreeNode::new(
        "par",
        ParallelNode::new(ParallelPolicy::RequireOne),
    );
    root.add_child(running_for("slow", 100, ActionResult::Success, &new_counter())).unwrap();
    root.add_child(counted_action("fast", ActionResult::Success, &new_counter())).unwrap();
    init(&mut root);

    assert_eq!(root.tick().await, NodeStatus::Success);
    // The slow branch was cancelled and reset, not left running.
    assert_eq!(
        root.find_node("par/slow").unwrap().status(),
        NodeStatus::Invalid
    );
}

#[tokio::test]
async fn parallel_require_all_waits_for_everyone() {
    test_setup();

    let mut root = TreeNode::new("par", ParallelNode::new(ParallelPolicy::RequireAll));
    root.add_child(counted_action("a", ActionResult::Success, &new_counter())).unwrap();
    root.add_child(running_for("b", 1, ActionResult::Success, &new_counter())).unwrap();
    init(&mut root);

    assert_eq!(root.tick().await, NodeStatus::Running);
    assert_eq!(root.tick().await, NodeStatus::Success);
}

#[tokio::test]
async fn parallel_empty_is_success() {
    test_setup();

    let mut root = TreeNode::new("par", ParallelNode::default());
    init(&mut root);
    assert_eq!(root.tick().await, NodeStatus::Success);
}

#[tokio::test]
async fn parallel_success_threshold_beats_policy() {
    test_setup();

    let mut root = TreeNode::new(
        "par",
        ParallelNode::new(ParallelPolicy::RequireAll).with_success_threshold(1),
    );
    root.add_child(counted_action("ok", ActionResult::Success, &new_counter())).unwrap();
    root.add_child(counted_action("bad", ActionResult::Failure, &new_counter())).unwrap();
    init(&mut root);

    // REQUIRE_ALL alone would fail; the success threshold wins the tie.
    assert_eq!(root.tick().await, NodeStatus::Success);
}

#[tokio::test]
async fn synchronized_parallel_keeps_terminal_children_settled() {
    test_setup();

    let failed = new_counter();
    let runner = new_counter();
    let mut root = TreeNode::new(
        "par",
        ParallelNode::new(ParallelPolicy::SequenceStar).synchronized(true),
    );
    root.add_child(counted_action("bad", ActionResult::Failure, &failed)).unwrap();
    root.add_child(running_for("runner", 1, ActionResult::Success, &runner)).unwrap();
    init(&mut root);

    assert_eq!(root.tick().await, NodeStatus::Running);
    assert_eq!(root.tick().await, NodeStatus::Failure);
    // The already-failed child was not re-ticked while the runner finished.
    assert_eq!(count(&failed), 1);
    assert_eq!(count(&runner), 2);
}
