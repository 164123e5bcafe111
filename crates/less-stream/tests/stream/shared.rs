//! Tests for `Shared<T>`, the adapter-owned multicast.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use less_stream::{Event, LiveStrategy, Repeater, ShareOptions, StreamError};

fn hits() -> Arc<AtomicUsize> {
    Arc::new(AtomicUsize::new(0))
}

fn bump(count: &Arc<AtomicUsize>) -> impl Fn(&Event<i32>) + Send + Sync + 'static {
    let count = Arc::clone(count);
    move |_: &Event<i32>| {
        count.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Continuous
// ============================================================================

#[test]
fn continuous_fans_out_and_stops_when_adapter_is_dropped() {
    let source: Repeater<i32> = Repeater::new();
    let shared = source.listenable().shared(LiveStrategy::Continuous);
    let count = hits();

    let first = shared.listening(bump(&count));
    let _second = shared.listening(bump(&count));

    source.send_value(1);
    assert_eq!(count.load(Ordering::SeqCst), 2);

    first.dispose();
    source.send_value(2);
    assert_eq!(count.load(Ordering::SeqCst), 3);

    drop(shared);
    source.send_value(3);
    assert_eq!(
        count.load(Ordering::SeqCst),
        3,
        "dropping the adapter must cut the still-attached listener off"
    );
    assert_eq!(source.handler_count(), 0, "upstream connection torn down");
}

#[test]
fn continuous_opens_one_connection_on_first_listener() {
    let source: Repeater<i32> = Repeater::new();
    let shared = source.listenable().shared(LiveStrategy::Continuous);

    let state = shared.live_state();
    assert!(!state.connected, "nothing is opened before first use");
    assert_eq!(state.strategy, LiveStrategy::Continuous);

    let a = shared.listening(|_| {});
    let b = shared.listening(|_| {});
    assert_eq!(source.handler_count(), 1, "at most one upstream connection");
    assert_eq!(shared.live_state().listeners, 2);

    a.dispose();
    b.dispose();
    let state = shared.live_state();
    assert_eq!(state.listeners, 0);
    assert!(state.connected, "continuous stays open with zero listeners");
    assert_eq!(source.handler_count(), 1);
}

#[test]
fn disposing_after_adapter_drop_is_safe() {
    let source: Repeater<i32> = Repeater::new();
    let shared = source.listenable().shared(LiveStrategy::Continuous);
    let d = shared.listening(|_| {});

    drop(shared);
    d.dispose();
    d.dispose();

    assert!(d.is_disposed());
}

// ============================================================================
// Repeatable
// ============================================================================

#[test]
fn repeatable_connection_tracks_listener_count() {
    let source: Repeater<i32> = Repeater::new();
    let shared = source.listenable().shared(LiveStrategy::Repeatable);
    let count = hits();

    assert!(!shared.live_state().connected);

    let a = shared.listening(bump(&count));
    assert!(shared.live_state().connected);
    let b = shared.listening(bump(&count));
    assert_eq!(source.handler_count(), 1);

    source.send_value(1);
    assert_eq!(count.load(Ordering::SeqCst), 2);

    a.dispose();
    assert!(shared.live_state().connected, "one listener left");

    b.dispose();
    let state = shared.live_state();
    assert_eq!(state.listeners, 0);
    assert!(!state.connected, "cleared when the count returns to zero");
    assert_eq!(source.handler_count(), 0);

    source.send_value(2);
    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[test]
fn repeatable_reopens_after_idle_interval() {
    let source: Repeater<i32> = Repeater::new();
    let shared = source.listenable().shared(LiveStrategy::Repeatable);
    let count = hits();

    shared.listening(|_| {}).dispose();
    assert!(!shared.live_state().connected);

    let _again = shared.listening(bump(&count));
    assert!(shared.live_state().connected);
    source.send_value(9);
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn double_dispose_does_not_double_decrement() {
    let source: Repeater<i32> = Repeater::new();
    let shared = source.listenable().shared(LiveStrategy::Repeatable);

    let a = shared.listening(|_| {});
    let _b = shared.listening(|_| {});
    a.dispose();
    a.dispose();

    let state = shared.live_state();
    assert_eq!(state.listeners, 1);
    assert!(state.connected);
}

// ============================================================================
// Listenable view / options
// ============================================================================

#[test]
fn listenable_view_does_not_keep_adapter_alive() {
    let source: Repeater<i32> = Repeater::new();
    let shared = source
        .listenable()
        .shared_with(ShareOptions::new(LiveStrategy::Repeatable).with_label("profile"));
    let view = shared.listenable().map(|v| v * 2);
    let count = hits();

    let d = {
        let count = Arc::clone(&count);
        view.listening(move |_| {
            count.fetch_add(1, Ordering::SeqCst);
        })
    };
    source.send_value(1);
    assert_eq!(count.load(Ordering::SeqCst), 1);
    d.dispose();
    assert!(!shared.live_state().connected);

    drop(shared);
    let late = view.listening(|_| {});
    source.send_value(2);
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(source.handler_count(), 0);
    late.dispose();
}

#[test]
fn subscribing_through_view_after_drop_reports_disconnected() {
    let source: Repeater<i32> = Repeater::new();
    let shared = source.listenable().shared(LiveStrategy::Continuous);
    let view = shared.listenable();
    drop(shared);

    let log = Arc::new(Mutex::new(Vec::new()));
    let d = {
        let log = Arc::clone(&log);
        view.listening(move |e: &Event<i32>| log.lock().unwrap().push(e.clone()))
    };
    source.send_value(1);

    assert_eq!(
        *log.lock().unwrap(),
        vec![Event::Error(StreamError::Disconnected)]
    );
    assert_eq!(source.handler_count(), 0);
    d.dispose();
}

// ============================================================================
// Threads
// ============================================================================

#[test]
fn concurrent_attach_and_dispose_leaves_nothing_connected() {
    let source: Repeater<i32> = Repeater::new();
    let shared = source.listenable().shared(LiveStrategy::Repeatable);

    thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for i in 0..200 {
                    let d = shared.listening(|_| {});
                    source.send_value(i);
                    d.dispose();
                }
            });
        }
    });

    let state = shared.live_state();
    assert_eq!(state.listeners, 0);
    assert!(!state.connected);
    assert_eq!(source.handler_count(), 0);
}
