//! Unit tests for the dispatcher and notification types.
//! No filesystem or external dependencies.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use serde_json::{Value, json};
use tokio::sync::{Notify, Semaphore};

use crate::state::{
    Dispatcher, Notification, ObserverError, ObserverRef, ObserverRegistry, StateChange,
    StateError,
};

fn counting(name: &str, counter: &Arc<AtomicUsize>) -> ObserverRef<Value> {
    let counter = Arc::clone(counter);
    ObserverRef::from_fn(name.to_string(), move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    })
}

#[test]
fn state_change_new() {
    let change = StateChange::new("city".to_string(), Some(json!("Rome")), json!("Paris"));

    assert_eq!(change.key, "city");
    assert_eq!(change.old_value, Some(json!("Rome")));
    assert_eq!(change.new_value, json!("Paris"));
    assert!(change.timestamp.elapsed().as_secs() < 1);
}

#[test]
fn state_change_extract() {
    let change = StateChange::new("using_location".to_string(), None, json!(true));
    let value: bool = change.extract().unwrap();
    assert!(value);

    let result: Result<String, _> = change.extract();
    assert!(matches!(result, Err(StateError::InvalidValue { .. })));
}

#[test]
fn notification_accessors() {
    let broadcast = Notification::Broadcast(json!({"language": "it"}));
    assert_eq!(broadcast.as_broadcast(), Some(&json!({"language": "it"})));
    assert!(broadcast.as_change().is_none());

    let changed = Notification::Changed(StateChange::new("unit".to_string(), None, json!("metric")));
    assert_eq!(changed.as_change().and_then(StateChange::as_str), Some("metric"));
    assert!(changed.as_broadcast().is_none());
}

#[test]
fn dispatcher_requires_runtime() {
    let registry = Arc::new(ObserverRegistry::<Value>::new());
    let result = Dispatcher::new(registry, 8);
    assert!(matches!(result, Err(StateError::NoRuntime { .. })));
}

#[tokio::test]
async fn notify_without_observers_schedules_nothing() {
    let registry = Arc::new(ObserverRegistry::<Value>::new());
    let dispatcher = Dispatcher::new(registry, 8).unwrap();

    assert_eq!(dispatcher.notify_all("nobody", json!(1)), 0);
    assert_eq!(dispatcher.pending(), 0);
}

#[tokio::test]
async fn notify_fans_out_to_every_observer() {
    let registry = Arc::new(ObserverRegistry::new());
    let dispatcher = Dispatcher::new(Arc::clone(&registry), 8).unwrap();
    let counter = Arc::new(AtomicUsize::new(0));

    registry.register("city", &counting("a", &counter));
    registry.register("city", &counting("b", &counter));
    registry.register("unit", &counting("c", &counter));

    let event = Notification::Changed(StateChange::new(
        "city".to_string(),
        Some(json!("Rome")),
        json!("Paris"),
    ));
    assert_eq!(dispatcher.notify("city", event), 2);

    dispatcher.drain().await;
    assert_eq!(counter.load(Ordering::SeqCst), 2);
    assert_eq!(dispatcher.pending(), 0);
}

#[tokio::test]
async fn failing_and_panicking_observers_are_isolated() {
    let registry = Arc::new(ObserverRegistry::new());
    let dispatcher = Dispatcher::new(Arc::clone(&registry), 8).unwrap();
    let counter = Arc::new(AtomicUsize::new(0));

    let failing = ObserverRef::from_fn("failing", |_: Notification<Value>| {
        Err::<(), ObserverError>("refresh failed".into())
    });
    let panicking = ObserverRef::from_fn(
        "panicking",
        |_: Notification<Value>| -> Result<(), ObserverError> {
            panic!("widget already disposed");
        },
    );
    let async_failing = ObserverRef::from_async("async_failing", |_: Notification<Value>| async {
        Err::<(), ObserverError>("fetch failed".into())
    });

    registry.register("theme_event", &failing);
    registry.register("theme_event", &panicking);
    registry.register("theme_event", &async_failing);
    registry.register("theme_event", &counting("healthy", &counter));

    assert_eq!(dispatcher.notify_all("theme_event", json!({"is_dark": true})), 4);
    dispatcher.drain().await;

    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn drain_waits_for_units_scheduled_while_draining() {
    let registry = Arc::new(ObserverRegistry::new());
    let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&registry), 8).unwrap());
    let counter = Arc::new(AtomicUsize::new(0));

    let relay = {
        let dispatcher = Arc::clone(&dispatcher);
        ObserverRef::from_fn("relay", move |_: Notification<Value>| {
            dispatcher.notify_all("second", json!("relayed"));
        })
    };
    registry.register("first", &relay);
    registry.register("second", &counting("sink", &counter));

    dispatcher.notify_all("first", json!("start"));
    dispatcher.drain().await;

    assert_eq!(counter.load(Ordering::SeqCst), 1);

    // The relay holds the dispatcher; break the cycle.
    registry.unregister("first", &relay);
}

#[tokio::test]
async fn abort_all_cancels_outstanding_units() {
    let registry = Arc::new(ObserverRegistry::new());
    let dispatcher = Dispatcher::new(Arc::clone(&registry), 8).unwrap();
    let gate = Arc::new(Notify::new());
    let finished = Arc::new(AtomicUsize::new(0));

    let blocked = {
        let gate = Arc::clone(&gate);
        let finished = Arc::clone(&finished);
        ObserverRef::from_async("blocked", move |_: Notification<Value>| {
            let gate = Arc::clone(&gate);
            let finished = Arc::clone(&finished);
            async move {
                gate.notified().await;
                finished.fetch_add(1, Ordering::SeqCst);
            }
        })
    };
    registry.register("city", &blocked);

    dispatcher.notify_all("city", json!("Oslo"));
    tokio::task::yield_now().await;
    assert_eq!(dispatcher.pending(), 1);

    assert_eq!(dispatcher.abort_all(), 1);
    gate.notify_waiters();
    dispatcher.drain().await;

    assert_eq!(finished.load(Ordering::SeqCst), 0);
    assert_eq!(dispatcher.pending(), 0);
}

#[tokio::test]
async fn backlog_above_high_water_mark_still_dispatches() {
    let registry = Arc::new(ObserverRegistry::new());
    let dispatcher = Dispatcher::new(Arc::clone(&registry), 1).unwrap();
    let counter = Arc::new(AtomicUsize::new(0));

    for name in ["a", "b", "c"] {
        registry.register("unit", &counting(name, &counter));
    }

    dispatcher.notify_all("unit", json!("imperial"));
    assert_eq!(dispatcher.pending(), 3);

    dispatcher.drain().await;
    assert_eq!(counter.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn concurrent_drains_wait_for_the_same_units() {
    let registry = Arc::new(ObserverRegistry::new());
    let dispatcher = Dispatcher::new(Arc::clone(&registry), 8).unwrap();
    let gate = Arc::new(Semaphore::new(0));
    let finished = Arc::new(AtomicUsize::new(0));

    let gated = {
        let gate = Arc::clone(&gate);
        let finished = Arc::clone(&finished);
        ObserverRef::from_async("gated", move |_: Notification<Value>| {
            let gate = Arc::clone(&gate);
            let finished = Arc::clone(&finished);
            async move {
                let _permit = gate.acquire().await;
                finished.fetch_add(1, Ordering::SeqCst);
            }
        })
    };
    registry.register("city", &gated);
    dispatcher.notify_all("city", json!("Oslo"));

    let release = async {
        tokio::task::yield_now().await;
        assert_eq!(dispatcher.pending(), 1);
        gate.add_permits(1);
    };
    tokio::join!(dispatcher.drain(), dispatcher.drain(), release);

    assert_eq!(finished.load(Ordering::SeqCst), 1);
    assert_eq!(dispatcher.pending(), 0);
}
