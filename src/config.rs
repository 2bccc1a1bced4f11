use std::{collections::HashMap, path::Path, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{
    basic_types::{CompareOp, MemoryPolicy, NodeEvent, NodeStatus, ParallelPolicy},
    blackboard::DEFAULT_NAMESPACE,
    nodes::{
        ActionNode, BlackboardConditionNode, BlackboardDeleteNode, BlackboardSetNode,
        ConditionNode, CooldownNode, DebugLogNode, DelayNode, EventEmitNode, ForceFailureNode,
        ForceSuccessNode, InverterNode, NodeKind, ParallelNode, Properties, RandomSelectorNode,
        ReactiveSelectorNode, ReactiveSequenceNode, RepeatNode, RetryNode, SelectorNode,
        SequenceNode, ThrottleNode, TimedConditionNode, TimeoutNode, TreeNode, WaitNode,
    },
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("i/o error reading configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unsupported configuration format: [{0}]")]
    UnsupportedExtension(String),
    #[error("unknown node type: {0}")]
    UnknownNodeType(String),
    #[error("invalid property [{key}] for node [{node}]: {message}")]
    InvalidProperty {
        node: String,
        key: String,
        message: String,
    },
    #[error("invalid structure at node [{node}] ({node_type}): {message}")]
    InvalidStructure {
        node: String,
        node_type: String,
        message: String,
    },
    #[error("invalid properties for node [{node}]: {reason}")]
    CustomValidation {
        node: String,
        reason: anyhow::Error,
    },
}

/// Declarative description of a single node: its registered type name, a
/// free-form properties map, and child descriptions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<NodeSpec>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreeMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tick_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_ticks: Option<u64>,
}

/// Top-level shape of a tree configuration file: optional metadata, the
/// main tree, and named subtrees.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreeDescription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TreeMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree: Option<NodeSpec>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub subtrees: HashMap<String, NodeSpec>,
}

/// Reads a tree description from a `.json`, `.yml` or `.yaml` file. Any
/// other extension is a validation error.
pub fn load_description(path: impl AsRef<Path>) -> Result<TreeDescription, ConfigError> {
    let path = path.as_ref();
    let format = extension(path)?;
    let text = std::fs::read_to_string(path)?;

    match format {
        Format::Json => Ok(serde_json::from_str(&text)?),
        Format::Yaml => Ok(serde_yaml::from_str(&text)?),
    }
}

/// Writes a tree description, choosing the encoding from the extension.
pub fn save_description(
    description: &TreeDescription,
    path: impl AsRef<Path>,
) -> Result<(), ConfigError> {
    let path = path.as_ref();
    let text = match extension(path)? {
        Format::Json => serde_json::to_string_pretty(description)?,
        Format::Yaml => serde_yaml::to_string(description)?,
    };

    std::fs::write(path, text)?;
    Ok(())
}

/// Decodes a description a caller assembled in code (the equivalent of a
/// config module exporting a tree constant).
pub fn description_from_value(value: Value) -> Result<TreeDescription, ConfigError> {
    Ok(serde_json::from_value(value)?)
}

enum Format {
    Json,
    Yaml,
}

fn extension(path: &Path) -> Result<Format, ConfigError> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("yml") | Some("yaml") => Ok(Format::Yaml),
        other => Err(ConfigError::UnsupportedExtension(
            other.unwrap_or("<none>").to_string(),
        )),
    }
}

impl TreeNode {
    /// Serializes this node and its subtree back into the declarative
    /// shape; inverse of [`NodeRegistry::build_tree`] for config-built
    /// trees.
    pub fn describe(&self) -> NodeSpec {
        let children: Vec<NodeSpec> = self.children().map(|child| child.describe()).collect();

        NodeSpec {
            name: self.name().to_string(),
            node_type: self.type_name().to_string(),
            properties: if self.properties().is_empty() {
                None
            } else {
                Some(self.properties().clone())
            },
            children: if children.is_empty() {
                None
            } else {
                Some(children)
            },
        }
    }
}

type BuilderFn = Arc<dyn Fn(&NodeSpec) -> Result<TreeNode, ConfigError> + Send + Sync>;
type ValidatorFn = Arc<dyn Fn(&Properties) -> anyhow::Result<()> + Send + Sync>;

/// Maps registered type names to node constructors and instantiates whole
/// trees from [`NodeSpec`]s, validating as it goes: the type must be
/// known, enum-typed properties must parse, per-type custom validators
/// must pass, and child arity must match the node kind.
pub struct NodeRegistry {
    builders: HashMap<String, BuilderFn>,
    validators: HashMap<String, ValidatorFn>,
}

impl NodeRegistry {
    pub fn new() -> NodeRegistry {
        let mut registry = Self {
            builders: HashMap::new(),
            validators: HashMap::new(),
        };
        registry.register_builtins();
        registry
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.builders.contains_key(type_name)
    }

    pub fn register<F>(&mut self, type_name: impl AsRef<str>, builder: F)
    where
        F: Fn(&NodeSpec) -> Result<TreeNode, ConfigError> + Send + Sync + 'static,
    {
        self.builders
            .insert(type_name.as_ref().to_string(), Arc::new(builder));
    }

    /// Plugs a custom property validator for one node type; it runs before
    /// the node is constructed.
    pub fn add_validator<F>(&mut self, type_name: impl AsRef<str>, validator: F)
    where
        F: Fn(&Properties) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.validators
            .insert(type_name.as_ref().to_string(), Arc::new(validator));
    }

    pub fn build_tree(&self, spec: &NodeSpec) -> Result<TreeNode, ConfigError> {
        let builder = self
            .builders
            .get(&spec.node_type)
            .ok_or_else(|| ConfigError::UnknownNodeType(spec.node_type.clone()))?;

        validate_enum_properties(spec)?;

        if let Some(validator) = self.validators.get(&spec.node_type) {
            let empty = Properties::new();
            let properties = spec.properties.as_ref().unwrap_or(&empty);
            validator(properties).map_err(|reason| ConfigError::CustomValidation {
                node: spec.name.clone(),
                reason,
            })?;
        }

        let mut node = builder(spec)?;

        let children = spec.children.as_deref().unwrap_or(&[]);
        match node.kind() {
            NodeKind::Leaf if !children.is_empty() => {
                return Err(ConfigError::InvalidStructure {
                    node: spec.name.clone(),
                    node_type: spec.node_type.clone(),
                    message: "leaf nodes must omit children".to_string(),
                })
            }
            NodeKind::Decorator if children.len() > 1 => {
                return Err(ConfigError::InvalidStructure {
                    node: spec.name.clone(),
                    node_type: spec.node_type.clone(),
                    message: format!("decorators take at most one child, got {}", children.len()),
                })
            }
            _ => {}
        }

        for child_spec in children {
            let child = self.build_tree(child_spec)?;
            node.add_child(child)
                .map_err(|err| ConfigError::InvalidStructure {
                    node: spec.name.clone(),
                    node_type: spec.node_type.clone(),
                    message: err.to_string(),
                })?;
        }

        Ok(node)
    }

    fn register_builtins(&mut self) {
        // Composites
        self.register("SequenceNode", |spec| {
            let policy = enum_prop::<MemoryPolicy>(spec, "memory_policy")?.unwrap_or_default();
            Ok(node_from(spec, SequenceNode::new(policy)))
        });
        self.register("SelectorNode", |spec| {
            let policy = enum_prop::<MemoryPolicy>(spec, "memory_policy")?.unwrap_or_default();
            Ok(node_from(spec, SelectorNode::new(policy)))
        });
        self.register("ReactiveSequence", |spec| {
            Ok(node_from(spec, ReactiveSequenceNode::new()))
        });
        self.register("ReactiveSelector", |spec| {
            Ok(node_from(spec, ReactiveSelectorNode::new()))
        });
        self.register("RandomSelector", |spec| {
            Ok(node_from(spec, RandomSelectorNode::new()))
        });
        self.register("ParallelNode", |spec| {
            let policy =
                enum_prop::<ParallelPolicy>(spec, "parallel_policy")?.unwrap_or(ParallelPolicy::RequireAll);
            let mut node = ParallelNode::new(policy);
            if let Some(threshold) = usize_prop(spec, "success_threshold")? {
                node = node.with_success_threshold(threshold);
            }
            if let Some(threshold) = usize_prop(spec, "failure_threshold")? {
                node = node.with_failure_threshold(threshold);
            }
            node = node.synchronized(bool_prop(spec, "synchronized")?.unwrap_or(false));
            Ok(node_from(spec, node))
        });

        // Decorators
        self.register("InverterNode", |spec| Ok(node_from(spec, InverterNode::new())));
        self.register("ForceSuccessNode", |spec| {
            Ok(node_from(spec, ForceSuccessNode::new()))
        });
        self.register("ForceFailureNode", |spec| {
            Ok(node_from(spec, ForceFailureNode::new()))
        });
        self.register("RepeatNode", |spec| {
            let mut node = RepeatNode::new(i64_prop(spec, "num_cycles")?.unwrap_or(-1));
            if let Some(threshold) = u64_prop(spec, "success_threshold")? {
                node = node.with_success_threshold(threshold);
            }
            if let Some(threshold) = u64_prop(spec, "failure_threshold")? {
                node = node.with_failure_threshold(threshold);
            }
            if let Some(cycles) = u64_prop(spec, "reset_after")? {
                node = node.with_reset_after(cycles);
            }
            Ok(node_from(spec, node))
        });
        self.register("RetryNode", |spec| {
            let max_attempts = u64_prop(spec, "max_attempts")?.unwrap_or(3) as u32;
            let node = RetryNode::new(max_attempts)
                .with_delay(duration_prop(spec, "delay")?.unwrap_or(Duration::ZERO))
                .with_exponential_backoff(
                    bool_prop(spec, "exponential_backoff")?.unwrap_or(false),
                )
                .with_jitter(f64_prop(spec, "jitter")?.unwrap_or(0.0));
            Ok(node_from(spec, node))
        });
        self.register("TimeoutNode", |spec| {
            let timeout = duration_prop(spec, "timeout")?.unwrap_or(Duration::from_secs(1));
            let on_timeout = enum_prop::<NodeStatus>(spec, "on_timeout")?
                .unwrap_or(NodeStatus::Failure);
            Ok(node_from(
                spec,
                TimeoutNode::new(timeout).with_on_timeout(on_timeout),
            ))
        });
        self.register("DelayNode", |spec| {
            let pre = duration_prop(spec, "pre_delay")?.unwrap_or(Duration::ZERO);
            let post = duration_prop(spec, "post_delay")?.unwrap_or(Duration::ZERO);
            Ok(node_from(spec, DelayNode::new(pre, post)))
        });
        self.register("CooldownNode", |spec| {
            let cooldown = duration_prop(spec, "cooldown")?.unwrap_or(Duration::from_secs(1));
            let node = CooldownNode::new(cooldown)
                .with_reset_on_failure(bool_prop(spec, "reset_on_failure")?.unwrap_or(false));
            Ok(node_from(spec, node))
        });
        self.register("BlackboardConditionNode", |spec| {
            let key = require_str_prop(spec, "key")?;
            let operator = enum_prop::<CompareOp>(spec, "operator")?.unwrap_or(CompareOp::Eq);
            let expected = value_prop(spec, "value").unwrap_or(Value::Null);
            let namespace = str_prop(spec, "namespace")?
                .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
            let gate = BlackboardConditionNode::new(key, operator, expected)
                .map_err(|err| ConfigError::InvalidProperty {
                    node: spec.name.clone(),
                    key: "operator".to_string(),
                    message: err.to_string(),
                })?
                .with_namespace(namespace);
            Ok(node_from(spec, gate))
        });

        // Leaves. Config-built actions and conditions have no callback
        // attached; callers graft callbacks on after loading if they need
        // them.
        self.register("ActionNode", |spec| {
            let mut node = ActionNode::new();
            if let Some(timeout) = duration_prop(spec, "timeout")? {
                node = node.with_timeout(timeout);
            }
            node = node
                .with_retry_count(u64_prop(spec, "retry_count")?.unwrap_or(0) as u32)
                .with_ignore_errors(bool_prop(spec, "ignore_errors")?.unwrap_or(false));
            Ok(node_from(spec, node))
        });
        self.register("ConditionNode", |spec| {
            let node = condition_from_spec(spec)?;
            Ok(node_from(spec, node))
        });
        self.register("WaitNode", |spec| {
            let duration = duration_prop(spec, "duration")?.unwrap_or(Duration::from_secs(1));
            let node = WaitNode::new(duration)
                .with_random_variance(f64_prop(spec, "random_variance")?.unwrap_or(0.0));
            Ok(node_from(spec, node))
        });
        self.register("ThrottleNode", |spec| {
            let mut node = ThrottleNode::new(ActionNode::new()).with_min_interval(
                duration_prop(spec, "min_interval")?.unwrap_or(Duration::ZERO),
            );
            if let (Some(max_executions), Some(window)) = (
                usize_prop(spec, "max_executions")?,
                duration_prop(spec, "window_size")?,
            ) {
                node = node.with_window(max_executions, window);
            }
            Ok(node_from(spec, node))
        });
        self.register("BlackboardSetNode", |spec| {
            let key = require_str_prop(spec, "key")?;
            let value = value_prop(spec, "value").unwrap_or(Value::Null);
            let namespace = str_prop(spec, "namespace")?
                .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
            Ok(node_from(
                spec,
                BlackboardSetNode::new(key, value).with_namespace(namespace),
            ))
        });
        self.register("BlackboardDeleteNode", |spec| {
            let key = require_str_prop(spec, "key")?;
            let namespace = str_prop(spec, "namespace")?
                .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
            Ok(node_from(
                spec,
                BlackboardDeleteNode::new(key).with_namespace(namespace),
            ))
        });
        self.register("TimedConditionNode", |spec| {
            let inner = condition_from_spec(spec)?;
            let duration = duration_prop(spec, "duration")?.unwrap_or(Duration::from_secs(1));
            let interval =
                duration_prop(spec, "check_interval")?.unwrap_or(Duration::from_millis(100));
            let node = TimedConditionNode::new(inner, duration, interval)
                .with_required_success_ratio(
                    f64_prop(spec, "required_success_ratio")?.unwrap_or(1.0),
                );
            Ok(node_from(spec, node))
        });
        self.register("DebugLogNode", |spec| {
            let message = str_prop(spec, "message")?.unwrap_or_default();
            let level = match str_prop(spec, "level")? {
                Some(text) => text.parse::<log::Level>().map_err(|_| {
                    ConfigError::InvalidProperty {
                        node: spec.name.clone(),
                        key: "level".to_string(),
                        message: format!("unknown log level [{text}]"),
                    }
                })?,
                None => log::Level::Info,
            };
            let node = DebugLogNode::new(message)
                .with_level(level)
                .with_timestamp(bool_prop(spec, "include_timestamp")?.unwrap_or(true));
            Ok(node_from(spec, node))
        });
        self.register("EventEmitNode", |spec| {
            let event = require_str_prop(spec, "event")?;
            let event = event
                .parse::<NodeEvent>()
                .map_err(|_| ConfigError::InvalidProperty {
                    node: spec.name.clone(),
                    key: "event".to_string(),
                    message: format!("unknown event [{event}]"),
                })?;
            Ok(node_from(spec, EventEmitNode::new(event)))
        });
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn condition_from_spec(spec: &NodeSpec) -> Result<ConditionNode, ConfigError> {
    let node = match str_prop(spec, "key")? {
        Some(key) => {
            let operator = enum_prop::<CompareOp>(spec, "operator")?.unwrap_or(CompareOp::Eq);
            let expected = value_prop(spec, "expected_value").unwrap_or(Value::Null);
            let namespace = str_prop(spec, "namespace")?
                .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
            ConditionNode::for_key(key, operator, expected).with_namespace(namespace)
        }
        None => ConditionNode::new(),
    };
    Ok(node)
}

fn node_from(spec: &NodeSpec, behavior: impl Into<crate::nodes::Behavior>) -> TreeNode {
    TreeNode::new(&spec.name, behavior)
        .with_properties(spec.properties.clone().unwrap_or_default())
}

/// The two enum-typed properties every description may carry are checked
/// up front so a typo is reported as a validation error, not silently
/// defaulted at construction time.
fn validate_enum_properties(spec: &NodeSpec) -> Result<(), ConfigError> {
    enum_prop::<ParallelPolicy>(spec, "parallel_policy")?;
    enum_prop::<MemoryPolicy>(spec, "memory_policy")?;
    Ok(())
}

fn raw_prop<'a>(spec: &'a NodeSpec, key: &str) -> Option<&'a Value> {
    spec.properties.as_ref().and_then(|props| props.get(key))
}

fn value_prop(spec: &NodeSpec, key: &str) -> Option<Value> {
    raw_prop(spec, key).cloned()
}

fn invalid(spec: &NodeSpec, key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidProperty {
        node: spec.name.clone(),
        key: key.to_string(),
        message: message.into(),
    }
}

fn str_prop(spec: &NodeSpec, key: &str) -> Result<Option<String>, ConfigError> {
    match raw_prop(spec, key) {
        None => Ok(None),
        Some(Value::String(text)) => Ok(Some(text.clone())),
        Some(other) => Err(invalid(spec, key, format!("expected a string, got {other}"))),
    }
}

fn require_str_prop(spec: &NodeSpec, key: &str) -> Result<String, ConfigError> {
    str_prop(spec, key)?.ok_or_else(|| invalid(spec, key, "property must be specified"))
}

fn f64_prop(spec: &NodeSpec, key: &str) -> Result<Option<f64>, ConfigError> {
    match raw_prop(spec, key) {
        None => Ok(None),
        Some(value) => value
            .as_f64()
            .map(Some)
            .ok_or_else(|| invalid(spec, key, format!("expected a number, got {value}"))),
    }
}

fn i64_prop(spec: &NodeSpec, key: &str) -> Result<Option<i64>, ConfigError> {
    match raw_prop(spec, key) {
        None => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or_else(|| invalid(spec, key, format!("expected an integer, got {value}"))),
    }
}

fn u64_prop(spec: &NodeSpec, key: &str) -> Result<Option<u64>, ConfigError> {
    match raw_prop(spec, key) {
        None => Ok(None),
        Some(value) => value.as_u64().map(Some).ok_or_else(|| {
            invalid(spec, key, format!("expected a non-negative integer, got {value}"))
        }),
    }
}

fn usize_prop(spec: &NodeSpec, key: &str) -> Result<Option<usize>, ConfigError> {
    Ok(u64_prop(spec, key)?.map(|value| value as usize))
}

fn bool_prop(spec: &NodeSpec, key: &str) -> Result<Option<bool>, ConfigError> {
    match raw_prop(spec, key) {
        None => Ok(None),
        Some(Value::Bool(value)) => Ok(Some(*value)),
        Some(other) => Err(invalid(spec, key, format!("expected a boolean, got {other}"))),
    }
}

/// Durations are written as seconds; negatives are rejected.
fn duration_prop(spec: &NodeSpec, key: &str) -> Result<Option<Duration>, ConfigError> {
    match f64_prop(spec, key)? {
        None => Ok(None),
        Some(secs) if secs >= 0.0 => Ok(Some(Duration::from_secs_f64(secs))),
        Some(secs) => Err(invalid(spec, key, format!("must not be negative, got {secs}"))),
    }
}

fn enum_prop<T>(spec: &NodeSpec, key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
{
    match raw_prop(spec, key) {
        None => Ok(None),
        Some(Value::String(text)) => text.parse::<T>().map(Some).map_err(|_| {
            invalid(spec, key, format!("[{text}] is not a valid value"))
        }),
        Some(other) => Err(invalid(spec, key, format!("expected a string, got {other}"))),
    }
}
