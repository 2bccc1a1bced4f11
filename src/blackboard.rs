use std::{
    collections::{HashMap, HashSet},
    path::Path,
    sync::{Arc, Mutex, RwLock},
};

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// The namespace every unscoped read and write lands in. It exists from
/// construction and survives `clear_namespace`.
pub const DEFAULT_NAMESPACE: &str = "default";

#[derive(Error, Debug)]
pub enum BlackboardError {
    #[error("namespace [{0}] not found")]
    NamespaceNotFound(String),
    #[error("i/o error accessing blackboard state: {0}")]
    Io(#[from] std::io::Error),
    #[error("error serializing blackboard state: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A stored value plus the bookkeeping the engine keeps per key.
#[derive(Debug, Clone)]
pub struct BlackboardEntry {
    pub value: Value,
    pub timestamp: DateTime<Utc>,
    pub namespace: String,
    pub access_count: u64,
    pub last_modified_by: Option<String>,
}

/// What happened in a single activity-log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Set,
    Unset,
    ClearNamespace,
}

/// Append-only audit record of a blackboard mutation.
#[derive(Debug, Clone)]
pub struct ActivityRecord {
    pub timestamp: DateTime<Utc>,
    pub action: ActivityKind,
    pub namespace: String,
    pub key: Option<String>,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
    pub client_id: Option<String>,
}

/// Change-notification callback: `(key, new_value, old_value)`.
pub type Subscriber = Arc<dyn Fn(&str, &Value, Option<&Value>) + Send + Sync>;

type Namespace = HashMap<String, BlackboardEntry>;

/// Entry layout used by `save_state`/`load_state`.
#[derive(Serialize, Deserialize)]
struct PersistedEntry {
    value: Value,
    timestamp: DateTime<Utc>,
    access_count: u64,
    last_modified_by: Option<String>,
}

struct Shared {
    /// Each namespace is independently lockable; the outer map only guards
    /// namespace creation and enumeration.
    namespaces: RwLock<HashMap<String, Arc<Mutex<Namespace>>>>,
    subscribers: Mutex<HashMap<String, HashMap<String, Vec<Subscriber>>>>,
    activity_log: Mutex<Vec<ActivityRecord>>,
}

/// Namespaced shared key/value store for a single tree.
///
/// Cloning a `Blackboard` clones a handle to the same store, which is how
/// every node in a tree ends up talking to one blackboard. Mutations take a
/// per-namespace lock; subscriber callbacks are invoked after that lock is
/// released, so a callback may read the blackboard without deadlocking.
///
/// `get` on a namespace that was never created is the one operation that
/// returns an error to the caller. Everything else auto-creates namespaces.
#[derive(Clone)]
pub struct Blackboard {
    shared: Arc<Shared>,
}

impl Default for Blackboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Blackboard {
    pub fn new() -> Blackboard {
        let blackboard = Self {
            shared: Arc::new(Shared {
                namespaces: RwLock::new(HashMap::new()),
                subscribers: Mutex::new(HashMap::new()),
                activity_log: Mutex::new(Vec::new()),
            }),
        };
        blackboard.create_namespace(DEFAULT_NAMESPACE);
        blackboard
    }

    pub fn create_namespace(&self, namespace: &str) {
        let mut namespaces = self.shared.namespaces.write().unwrap();
        if !namespaces.contains_key(namespace) {
            namespaces.insert(namespace.to_string(), Arc::new(Mutex::new(HashMap::new())));
            debug!("created blackboard namespace: {namespace}");
        }
    }

    pub fn namespaces(&self) -> Vec<String> {
        self.shared.namespaces.read().unwrap().keys().cloned().collect()
    }

    pub fn keys(&self, namespace: &str) -> Vec<String> {
        match self.namespace_handle(namespace) {
            Some(ns) => ns.lock().unwrap().keys().cloned().collect(),
            None => Vec::new(),
        }
    }

    fn namespace_handle(&self, namespace: &str) -> Option<Arc<Mutex<Namespace>>> {
        self.shared.namespaces.read().unwrap().get(namespace).cloned()
    }

    fn ensure_namespace(&self, namespace: &str) -> Arc<Mutex<Namespace>> {
        if let Some(ns) = self.namespace_handle(namespace) {
            return ns;
        }
        self.create_namespace(namespace);
        self.namespace_handle(namespace).expect("namespace was just created")
    }

    /// Reads `key` from `namespace`, bumping the entry's access count.
    ///
    /// A missing namespace is an error; a missing key is `Ok(None)`.
    pub fn get(&self, key: &str, namespace: &str) -> Result<Option<Value>, BlackboardError> {
        let ns = self
            .namespace_handle(namespace)
            .ok_or_else(|| BlackboardError::NamespaceNotFound(namespace.to_string()))?;

        let mut entries = ns.lock().unwrap();
        Ok(entries.get_mut(key).map(|entry| {
            entry.access_count += 1;
            entry.value.clone()
        }))
    }

    /// Returns a copy of the full entry, without touching the access count.
    pub fn entry(&self, key: &str, namespace: &str) -> Option<BlackboardEntry> {
        let ns = self.namespace_handle(namespace)?;
        let entries = ns.lock().unwrap();
        entries.get(key).cloned()
    }

    pub fn set(&self, key: &str, value: impl Into<Value>, namespace: &str) {
        self.set_entry(key, value, namespace, None)
    }

    /// `set` with attribution; used by [`BlackboardClient`] so the entry and
    /// the activity log record who wrote it.
    pub fn set_entry(
        &self,
        key: &str,
        value: impl Into<Value>,
        namespace: &str,
        client_id: Option<&str>,
    ) {
        let value = value.into();
        let ns = self.ensure_namespace(namespace);

        let old_value;
        let entry = BlackboardEntry {
            value: value.clone(),
            timestamp: Utc::now(),
            namespace: namespace.to_string(),
            access_count: 0,
            last_modified_by: client_id.map(str::to_string),
        };

        {
            let mut entries = ns.lock().unwrap();
            old_value = entries.get(key).map(|existing| existing.value.clone());
            entries.insert(key.to_string(), entry);
        }

        self.record_activity(ActivityRecord {
            timestamp: Utc::now(),
            action: ActivityKind::Set,
            namespace: namespace.to_string(),
            key: Some(key.to_string()),
            old_value: old_value.clone(),
            new_value: Some(value.clone()),
            client_id: client_id.map(str::to_string),
        });

        // Notify outside the namespace lock so callbacks may read the
        // blackboard themselves.
        for callback in self.subscribers_for(namespace, key) {
            callback(key, &value, old_value.as_ref());
        }
    }

    pub fn exists(&self, key: &str, namespace: &str) -> bool {
        match self.namespace_handle(namespace) {
            Some(ns) => ns.lock().unwrap().contains_key(key),
            None => false,
        }
    }

    /// Removes `key`; returns whether an entry was actually removed.
    pub fn unset(&self, key: &str, namespace: &str) -> bool {
        let Some(ns) = self.namespace_handle(namespace) else {
            return false;
        };

        let removed = ns.lock().unwrap().remove(key);
        let was_present = removed.is_some();

        if was_present {
            self.record_activity(ActivityRecord {
                timestamp: Utc::now(),
                action: ActivityKind::Unset,
                namespace: namespace.to_string(),
                key: Some(key.to_string()),
                old_value: removed.map(|entry| entry.value),
                new_value: None,
                client_id: None,
            });
        }

        was_present
    }

    /// Drops every entry and every subscription in `namespace`.
    pub fn clear_namespace(&self, namespace: &str) {
        let Some(ns) = self.namespace_handle(namespace) else {
            return;
        };

        ns.lock().unwrap().clear();
        self.shared.subscribers.lock().unwrap().remove(namespace);

        self.record_activity(ActivityRecord {
            timestamp: Utc::now(),
            action: ActivityKind::ClearNamespace,
            namespace: namespace.to_string(),
            key: None,
            old_value: None,
            new_value: None,
            client_id: None,
        });
    }

    pub fn subscribe(&self, key: &str, callback: Subscriber, namespace: &str) {
        let mut subscribers = self.shared.subscribers.lock().unwrap();
        subscribers
            .entry(namespace.to_string())
            .or_default()
            .entry(key.to_string())
            .or_default()
            .push(callback);
    }

    /// Drops every callback registered for `key` in `namespace`.
    pub fn unsubscribe_key(&self, key: &str, namespace: &str) {
        let mut subscribers = self.shared.subscribers.lock().unwrap();
        if let Some(by_key) = subscribers.get_mut(namespace) {
            by_key.remove(key);
        }
    }

    fn subscribers_for(&self, namespace: &str, key: &str) -> Vec<Subscriber> {
        let subscribers = self.shared.subscribers.lock().unwrap();
        subscribers
            .get(namespace)
            .and_then(|by_key| by_key.get(key))
            .map(|callbacks| callbacks.to_vec())
            .unwrap_or_default()
    }

    fn record_activity(&self, record: ActivityRecord) {
        self.shared.activity_log.lock().unwrap().push(record);
    }

    pub fn activity_log(&self) -> Vec<ActivityRecord> {
        self.shared.activity_log.lock().unwrap().clone()
    }

    /// Scoped handle bound to `(namespace, client_id)`.
    pub fn client(&self, namespace: &str, client_id: &str) -> BlackboardClient {
        self.create_namespace(namespace);
        BlackboardClient {
            blackboard: self.clone(),
            namespace: namespace.to_string(),
            client_id: client_id.to_string(),
            subscriptions: HashSet::new(),
        }
    }

    /// Deep copy of all contents, grouped by namespace. Does not count as
    /// an access.
    pub fn contents(&self) -> HashMap<String, HashMap<String, Value>> {
        let namespaces = self.shared.namespaces.read().unwrap();
        namespaces
            .iter()
            .map(|(name, ns)| {
                let entries = ns.lock().unwrap();
                let values = entries
                    .iter()
                    .map(|(key, entry)| (key.clone(), entry.value.clone()))
                    .collect();
                (name.clone(), values)
            })
            .collect()
    }

    /// Writes all namespaces to `path` as JSON, preserving per-entry
    /// bookkeeping.
    pub fn save_state(&self, path: impl AsRef<Path>) -> Result<(), BlackboardError> {
        let mut state: HashMap<String, HashMap<String, PersistedEntry>> = HashMap::new();

        let namespaces = self.shared.namespaces.read().unwrap();
        for (name, ns) in namespaces.iter() {
            let entries = ns.lock().unwrap();
            let persisted = entries
                .iter()
                .map(|(key, entry)| {
                    (
                        key.clone(),
                        PersistedEntry {
                            value: entry.value.clone(),
                            timestamp: entry.timestamp,
                            access_count: entry.access_count,
                            last_modified_by: entry.last_modified_by.clone(),
                        },
                    )
                })
                .collect();
            state.insert(name.clone(), persisted);
        }
        drop(namespaces);

        let text = serde_json::to_string_pretty(&state)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Inverse of [`save_state`](Self::save_state): restores entries with
    /// their original access counts and attribution. Does not touch the
    /// activity log.
    pub fn load_state(&self, path: impl AsRef<Path>) -> Result<(), BlackboardError> {
        let text = std::fs::read_to_string(path)?;
        let state: HashMap<String, HashMap<String, PersistedEntry>> =
            serde_json::from_str(&text)?;

        for (name, persisted) in state {
            let ns = self.ensure_namespace(&name);
            let mut entries = ns.lock().unwrap();
            for (key, entry) in persisted {
                entries.insert(
                    key,
                    BlackboardEntry {
                        value: entry.value,
                        timestamp: entry.timestamp,
                        namespace: name.clone(),
                        access_count: entry.access_count,
                        last_modified_by: entry.last_modified_by,
                    },
                );
            }
        }

        Ok(())
    }
}

/// Scoped blackboard handle bound to a `(namespace, client_id)` pair.
///
/// Writes through a client are attributed to its `client_id`; reads and
/// subscriptions are confined to its namespace. The client remembers its
/// own subscriptions so they can be dropped in bulk.
pub struct BlackboardClient {
    blackboard: Blackboard,
    namespace: String,
    client_id: String,
    subscriptions: HashSet<String>,
}

impl BlackboardClient {
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn get(&self, key: &str) -> Result<Option<Value>, BlackboardError> {
        self.blackboard.get(key, &self.namespace)
    }

    pub fn set(&self, key: &str, value: impl Into<Value>) {
        self.blackboard
            .set_entry(key, value, &self.namespace, Some(&self.client_id))
    }

    pub fn unset(&self, key: &str) -> bool {
        self.blackboard.unset(key, &self.namespace)
    }

    pub fn exists(&self, key: &str) -> bool {
        self.blackboard.exists(key, &self.namespace)
    }

    pub fn subscribe(&mut self, key: &str, callback: Subscriber) {
        self.blackboard.subscribe(key, callback, &self.namespace);
        self.subscriptions.insert(key.to_string());
    }

    pub fn unsubscribe_all(&mut self) {
        for key in self.subscriptions.drain() {
            self.blackboard.unsubscribe_key(&key, &self.namespace);
        }
    }
}
