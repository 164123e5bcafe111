//! Tests for the observer-service adapter.

use std::sync::{Arc, Mutex};

use less_stream::{
    observer::{observe, DataSnapshot, EventKind, MemoryNode, ObserverService},
    ConnectionToken, Event, LiveStrategy, StreamError,
};
use serde::Deserialize;
use serde_json::json;

/// Records attach/detach calls and lets the test drive callbacks by hand.
#[derive(Default)]
struct ScriptedService {
    calls: Mutex<Vec<String>>,
    on_value: Mutex<Option<Arc<dyn Fn(u32) + Send + Sync>>>,
    on_error: Mutex<Option<less_stream::observer::ErrorCallback>>,
}

impl ScriptedService {
    fn push(&self, v: u32) {
        let cb = self.on_value.lock().unwrap().clone();
        if let Some(cb) = cb {
            cb(v);
        }
    }

    fn fail(&self, code: &str) {
        let cb = self.on_error.lock().unwrap().clone();
        if let Some(cb) = cb {
            cb(less_stream::observer::ObserverFailure {
                code: code.to_string(),
                message: "scripted".to_string(),
            });
        }
    }
}

impl ObserverService for ScriptedService {
    type Snapshot = u32;

    fn attach(
        &self,
        kind: EventKind,
        on_value: less_stream::observer::ValueCallback<u32>,
        on_error: less_stream::observer::ErrorCallback,
    ) -> ConnectionToken {
        let mut calls = self.calls.lock().unwrap();
        let token = ConnectionToken::from_raw(100 + calls.len() as u64);
        calls.push(format!("attach {kind:?} -> {}", token.as_u64()));
        *self.on_value.lock().unwrap() = Some(on_value);
        *self.on_error.lock().unwrap() = Some(on_error);
        token
    }

    fn detach(&self, token: ConnectionToken) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("detach {}", token.as_u64()));
        *self.on_value.lock().unwrap() = None;
        *self.on_error.lock().unwrap() = None;
    }
}

fn make_log<T: Send + 'static>() -> Arc<Mutex<Vec<T>>> {
    Arc::new(Mutex::new(Vec::new()))
}

// ============================================================================
// listening
// ============================================================================

#[test]
fn listening_attaches_lazily_and_detaches_by_token() {
    let service = Arc::new(ScriptedService::default());
    let stream = observe(Arc::clone(&service), EventKind::Value);
    assert!(service.calls.lock().unwrap().is_empty());

    let d = stream.listening(|_| {});
    d.dispose();
    d.dispose();

    assert_eq!(
        *service.calls.lock().unwrap(),
        vec!["attach Value -> 100", "detach 100"]
    );
}

#[test]
fn callbacks_become_events() {
    let service = Arc::new(ScriptedService::default());
    let log = make_log::<Event<u32>>();
    let _d = {
        let log = Arc::clone(&log);
        observe(Arc::clone(&service), EventKind::ChildAdded)
            .listening(move |e| log.lock().unwrap().push(e.clone()))
    };

    service.push(1);
    service.fail("permission-denied");
    service.push(2);

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            Event::Value(1),
            Event::Error(StreamError::remote("permission-denied", "scripted")),
            Event::Value(2),
        ]
    );
}

// ============================================================================
// listening_item
// ============================================================================

#[test]
fn listening_item_pause_and_resume_reattach() {
    let service = Arc::new(ScriptedService::default());
    let log = make_log::<u32>();
    let item = {
        let log = Arc::clone(&log);
        observe(Arc::clone(&service), EventKind::Value).listening_item(move |e| {
            if let Some(v) = e.value() {
                log.lock().unwrap().push(*v);
            }
        })
    };
    assert_eq!(item.token(), Some(ConnectionToken::from_raw(100)));

    service.push(1);
    item.pause();
    assert_eq!(item.token(), None);
    service.push(2);
    item.resume();
    service.push(3);

    assert_eq!(item.token(), Some(ConnectionToken::from_raw(102)));
    assert_eq!(*log.lock().unwrap(), vec![1, 3]);
    assert_eq!(
        *service.calls.lock().unwrap(),
        vec!["attach Value -> 100", "detach 100", "attach Value -> 102"]
    );
}

// ============================================================================
// End to end over MemoryNode
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct Profile {
    name: String,
    age: u32,
}

#[test]
fn shared_memory_node_value_stream_decodes_and_refcounts() {
    let node = Arc::new(MemoryNode::new("profile"));
    node.set_child("name", json!("Ada"));
    node.set_child("age", json!(36));

    let profiles = observe(Arc::clone(&node), EventKind::Value)
        .try_map(|snap: &DataSnapshot| snap.decode::<Profile>())
        .shared(LiveStrategy::Repeatable);
    assert_eq!(node.observer_count(), 0);

    let log = make_log::<Event<Profile>>();
    let d = {
        let log = Arc::clone(&log);
        profiles.listening(move |e| log.lock().unwrap().push(e.clone()))
    };
    assert_eq!(node.observer_count(), 1);

    node.set_child("age", json!(37));
    node.set_child("age", json!("old"));

    d.dispose();
    assert_eq!(node.observer_count(), 0);

    let log = log.lock().unwrap();
    assert_eq!(log.len(), 3);
    assert_eq!(
        log[0],
        Event::Value(Profile {
            name: "Ada".into(),
            age: 36
        })
    );
    assert_eq!(
        log[1],
        Event::Value(Profile {
            name: "Ada".into(),
            age: 37
        })
    );
    assert!(matches!(log[2], Event::Error(StreamError::Mapping(_))));
}

#[test]
fn combined_memory_nodes_emit_once_both_have_reported() {
    let left = Arc::new(MemoryNode::new("left"));
    let right = Arc::new(MemoryNode::new("right"));

    let left_keys =
        observe(Arc::clone(&left), EventKind::ChildAdded).map(|s: &DataSnapshot| s.key.clone());
    let right_keys =
        observe(Arc::clone(&right), EventKind::ChildAdded).map(|s: &DataSnapshot| s.key.clone());
    let keys = left_keys.combine(&right_keys);

    let log = make_log::<(String, String)>();
    let _d = {
        let log = Arc::clone(&log);
        keys.listening_values(move |pair| log.lock().unwrap().push(pair.clone()))
    };

    left.set_child("a", json!(1));
    right.set_child("b", json!(2));
    left.set_child("c", json!(3));

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            ("a".to_string(), "b".to_string()),
            ("c".to_string(), "b".to_string()),
        ]
    );
}
