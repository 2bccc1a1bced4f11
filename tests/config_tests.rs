use serde_json::json;

use ticktree::{
    config::{description_from_value, load_description, save_description},
    ConfigError, NodeRegistry, NodeStatus, TreeNode, WorkerPool,
};

mod common;

use common::*;

fn build(registry: &NodeRegistry, value: serde_json::Value) -> Result<TreeNode, ConfigError> {
    let spec = serde_json::from_value(value).expect("spec shape is valid");
    registry.build_tree(&spec)
}

#[tokio::test]
async fn builds_and_ticks_a_declarative_tree() {
    test_setup();

    let registry = NodeRegistry::new();
    let mut root = build(
        &registry,
        json!({
            "name": "root",
            "type": "SelectorNode",
            "properties": { "memory_policy": "PERSISTENT" },
            "children": [
                { "name": "gate", "type": "BlackboardConditionNode",
                  "properties": { "key": "armed", "operator": "==", "value": true },
                  "children": [ { "name": "fire", "type": "ActionNode" } ] },
                { "name": "fallback", "type": "DebugLogNode",
                  "properties": { "message": "holding position", "level": "DEBUG" } }
            ]
        }),
    )
    .unwrap();

    let blackboard = init(&mut root);

    // Gate closed: the selector falls through to the log leaf.
    assert_eq!(root.tick().await, NodeStatus::Success);

    blackboard.set("armed", true, "default");
    assert_eq!(root.tick().await, NodeStatus::Success);
    assert_eq!(root.find_node("root/gate").unwrap().status(), NodeStatus::Success);
}

#[tokio::test]
async fn unknown_node_type_is_rejected() {
    test_setup();

    let registry = NodeRegistry::new();
    let err = build(
        &registry,
        json!({ "name": "x", "type": "TeleportNode" }),
    )
    .unwrap_err();

    assert!(matches!(err, ConfigError::UnknownNodeType(name) if name == "TeleportNode"));
}

#[tokio::test]
async fn invalid_enum_properties_are_rejected() {
    test_setup();

    let registry = NodeRegistry::new();

    let err = build(
        &registry,
        json!({ "name": "x", "type": "SequenceNode",
                "properties": { "memory_policy": "SOMETIMES" } }),
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidProperty { ref key, .. } if key == "memory_policy"));

    let err = build(
        &registry,
        json!({ "name": "x", "type": "ParallelNode",
                "properties": { "parallel_policy": "REQUIRE_MOST" } }),
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidProperty { ref key, .. } if key == "parallel_policy"));
}

#[tokio::test]
async fn arity_is_validated() {
    test_setup();

    let registry = NodeRegistry::new();

    let err = build(
        &registry,
        json!({ "name": "inv", "type": "InverterNode", "children": [
            { "name": "a", "type": "ActionNode" },
            { "name": "b", "type": "ActionNode" }
        ]}),
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidStructure { .. }));

    let err = build(
        &registry,
        json!({ "name": "leaf", "type": "WaitNode", "children": [
            { "name": "a", "type": "ActionNode" }
        ]}),
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidStructure { .. }));
}

#[tokio::test]
async fn blackboard_gate_operator_subset() {
    test_setup();

    let registry = NodeRegistry::new();
    let err = build(
        &registry,
        json!({ "name": "gate", "type": "BlackboardConditionNode",
                "properties": { "key": "mode", "operator": "contains", "value": "pat" },
                "children": [ { "name": "go", "type": "ActionNode" } ] }),
    )
    .unwrap_err();

    assert!(matches!(err, ConfigError::InvalidProperty { ref key, .. } if key == "operator"));
}

#[tokio::test]
async fn missing_required_property() {
    test_setup();

    let registry = NodeRegistry::new();
    let err = build(
        &registry,
        json!({ "name": "set", "type": "BlackboardSetNode" }),
    )
    .unwrap_err();

    assert!(matches!(err, ConfigError::InvalidProperty { ref key, .. } if key == "key"));
}

#[tokio::test]
async fn negative_durations_are_rejected() {
    test_setup();

    let registry = NodeRegistry::new();
    let err = build(
        &registry,
        json!({ "name": "wait", "type": "WaitNode", "properties": { "duration": -1.0 } }),
    )
    .unwrap_err();

    assert!(matches!(err, ConfigError::InvalidProperty { ref key, .. } if key == "duration"));
}

#[tokio::test]
async fn custom_validators_run_before_construction() {
    test_setup();

    let mut registry = NodeRegistry::new();
    registry.add_validator("WaitNode", |properties| {
        let duration = properties.get("duration").and_then(|v| v.as_f64()).unwrap_or(1.0);
        anyhow::ensure!(duration <= 60.0, "waits longer than a minute are a config smell");
        Ok(())
    });

    let err = build(
        &registry,
        json!({ "name": "wait", "type": "WaitNode", "properties": { "duration": 3600.0 } }),
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::CustomValidation { .. }));

    build(
        &registry,
        json!({ "name": "wait", "type": "WaitNode", "properties": { "duration": 5.0 } }),
    )
    .unwrap();
}

#[tokio::test]
async fn custom_node_types_can_be_registered() {
    test_setup();

    let mut registry = NodeRegistry::new();
    registry.register("AlwaysSucceed", |spec| {
        Ok(TreeNode::new(&spec.name, ticktree::ActionNode::from_sync(|| true)))
    });

    let mut root = build(
        &registry,
        json!({ "name": "custom", "type": "AlwaysSucceed" }),
    )
    .unwrap();
    root.initialize(&ticktree::Blackboard::new(), &WorkerPool::default());

    assert_eq!(root.tick().await, NodeStatus::Success);
}

#[tokio::test]
async fn describe_round_trips_through_the_registry() {
    test_setup();

    let registry = NodeRegistry::new();
    let original = json!({
        "name": "root",
        "type": "SequenceNode",
        "properties": { "memory_policy": "PERSISTENT" },
        "children": [
            { "name": "wait", "type": "WaitNode", "properties": { "duration": 0.5 } },
            { "name": "repeat", "type": "RepeatNode", "properties": { "num_cycles": 3 },
              "children": [ { "name": "step", "type": "ActionNode" } ] }
        ]
    });

    let tree = build(&registry, original.clone()).unwrap();
    let described = serde_json::to_value(tree.describe()).unwrap();
    assert_eq!(described, original);

    // And the description builds again.
    build(&registry, described).unwrap();
}

#[tokio::test]
async fn file_encodings_share_one_shape() {
    test_setup();

    let dir = tempfile::tempdir().unwrap();
    let description = description_from_value(json!({
        "metadata": { "tick_rate": 20.0 },
        "tree": { "name": "root", "type": "SelectorNode", "children": [
            { "name": "idle", "type": "WaitNode", "properties": { "duration": 0.25 } }
        ]}
    }))
    .unwrap();

    let json_path = dir.path().join("tree.json");
    let yaml_path = dir.path().join("tree.yml");
    save_description(&description, &json_path).unwrap();
    save_description(&description, &yaml_path).unwrap();

    let from_json = load_description(&json_path).unwrap();
    let from_yaml = load_description(&yaml_path).unwrap();

    assert_eq!(
        serde_json::to_value(&from_json).unwrap(),
        serde_json::to_value(&from_yaml).unwrap()
    );
    assert_eq!(from_yaml.metadata.unwrap().tick_rate, Some(20.0));

    let err = load_description(dir.path().join("tree.xml")).unwrap_err();
    assert!(matches!(err, ConfigError::UnsupportedExtension(_)));
}
