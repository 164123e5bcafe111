//! MemoryNode: an in-process document node that speaks the
//! [`ObserverService`] protocol.
//!
//! The node holds a flat map of children. Observers are notified
//! synchronously on the thread that mutates the node, after the node's lock
//! has been released, so callbacks may read or mutate the node again.
//!
//! Attach semantics follow realtime-database conventions:
//!   - `Value` observers receive the current node value immediately.
//!   - `ChildAdded` observers receive one event per existing child.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::{error::Result, listenable::ConnectionToken};

use super::adapter::{ErrorCallback, EventKind, ObserverFailure, ObserverService, ValueCallback};

/// One observed change: the key it concerns and the value at that key.
///
/// For `Value` events the key is the node's own key and the value is the
/// whole node.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSnapshot {
    pub key: String,
    pub value: Value,
}

impl DataSnapshot {
    /// Deserialize the snapshot value into `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.value.clone())?)
    }
}

struct Observer {
    token: ConnectionToken,
    kind: EventKind,
    on_value: ValueCallback<DataSnapshot>,
    on_error: ErrorCallback,
}

#[derive(Default)]
struct NodeState {
    children: BTreeMap<String, Value>,
    observers: Vec<Observer>,
}

/// Notifications computed under the lock and delivered after releasing it.
type Pending = Vec<(ValueCallback<DataSnapshot>, DataSnapshot)>;

/// In-memory node with observer support.
pub struct MemoryNode {
    key: String,
    state: Mutex<NodeState>,
    next_token: AtomicU64,
}

impl MemoryNode {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            state: Mutex::new(NodeState::default()),
            next_token: AtomicU64::new(1),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The whole node as a JSON object.
    pub fn value(&self) -> Value {
        let st = self.state.lock();
        Self::node_value(&st.children)
    }

    pub fn child(&self, key: &str) -> Option<Value> {
        self.state.lock().children.get(key).cloned()
    }

    /// Number of currently attached observers.
    pub fn observer_count(&self) -> usize {
        self.state.lock().observers.len()
    }

    /// Write `value` at `key`, notifying observers. Writing an identical
    /// value is not a change and notifies nobody.
    pub fn set_child(&self, key: impl Into<String>, value: Value) {
        let key = key.into();
        let pending = {
            let mut st = self.state.lock();
            let previous = st.children.insert(key.clone(), value.clone());
            let kind = match previous {
                Some(ref old) if *old == value => return,
                Some(_) => EventKind::ChildChanged,
                None => EventKind::ChildAdded,
            };
            self.collect(&st, kind, &key, &value)
        };
        Self::deliver(pending);
    }

    /// Remove the child at `key`. Returns whether it existed.
    pub fn remove_child(&self, key: &str) -> bool {
        let pending = {
            let mut st = self.state.lock();
            let Some(old) = st.children.remove(key) else {
                return false;
            };
            self.collect(&st, EventKind::ChildRemoved, key, &old)
        };
        Self::deliver(pending);
        true
    }

    /// Report `code` / `message` to every observer's error callback.
    /// Observers stay attached.
    pub fn fail(&self, code: impl Into<String>, message: impl Into<String>) {
        let failure = ObserverFailure {
            code: code.into(),
            message: message.into(),
        };
        let callbacks: Vec<ErrorCallback> = {
            let st = self.state.lock();
            st.observers.iter().map(|o| o.on_error.clone()).collect()
        };
        tracing::debug!(
            node = %self.key,
            observers = callbacks.len(),
            code = %failure.code,
            "node failure"
        );
        for cb in callbacks {
            cb(failure.clone());
        }
    }

    fn collect(&self, st: &NodeState, kind: EventKind, key: &str, value: &Value) -> Pending {
        let child = DataSnapshot {
            key: key.to_string(),
            value: value.clone(),
        };
        let whole = DataSnapshot {
            key: self.key.clone(),
            value: Self::node_value(&st.children),
        };
        st.observers
            .iter()
            .filter_map(|o| {
                if o.kind == kind {
                    Some((o.on_value.clone(), child.clone()))
                } else if o.kind == EventKind::Value {
                    Some((o.on_value.clone(), whole.clone()))
                } else {
                    None
                }
            })
            .collect()
    }

    fn deliver(pending: Pending) {
        for (cb, snapshot) in pending {
            cb(snapshot);
        }
    }

    fn node_value(children: &BTreeMap<String, Value>) -> Value {
        let map: Map<String, Value> = children
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Value::Object(map)
    }
}

impl ObserverService for MemoryNode {
    type Snapshot = DataSnapshot;

    fn attach(
        &self,
        kind: EventKind,
        on_value: ValueCallback<DataSnapshot>,
        on_error: ErrorCallback,
    ) -> ConnectionToken {
        let token = ConnectionToken::from_raw(self.next_token.fetch_add(1, Ordering::Relaxed));
        let initial: Vec<DataSnapshot> = {
            let mut st = self.state.lock();
            st.observers.push(Observer {
                token,
                kind,
                on_value: on_value.clone(),
                on_error,
            });
            match kind {
                EventKind::Value => vec![DataSnapshot {
                    key: self.key.clone(),
                    value: Self::node_value(&st.children),
                }],
                EventKind::ChildAdded => st
                    .children
                    .iter()
                    .map(|(k, v)| DataSnapshot {
                        key: k.clone(),
                        value: v.clone(),
                    })
                    .collect(),
                EventKind::ChildChanged | EventKind::ChildRemoved => Vec::new(),
            }
        };
        for snapshot in initial {
            on_value(snapshot);
        }
        token
    }

    fn detach(&self, token: ConnectionToken) {
        self.state.lock().observers.retain(|o| o.token != token);
    }
}

impl std::fmt::Debug for MemoryNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryNode")
            .field("key", &self.key)
            .field("observers", &self.observer_count())
            .finish()
    }
}
