use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use tracing::trace;

use super::ObserverRef;

/// Immutable view of a topic's observers at one point in time.
pub type ObserverSnapshot<V> = Arc<Vec<ObserverRef<V>>>;

/// Topic to observer-list mapping.
///
/// Each topic's list is kept behind an `Arc` and mutated copy-on-write, so a
/// snapshot handed to the dispatcher is never changed by a later
/// register/unregister.
pub struct ObserverRegistry<V: Send + 'static> {
    topics: RwLock<HashMap<String, ObserverSnapshot<V>>>,
}

impl<V: Send + 'static> ObserverRegistry<V> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
        }
    }

    /// Appends `observer` to `topic` unless it is already registered there.
    ///
    /// Returns `true` if the observer was added.
    pub fn register(&self, topic: &str, observer: &ObserverRef<V>) -> bool {
        let mut topics = match self.topics.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let observers = topics.entry(topic.to_string()).or_default();
        if observers.contains(observer) {
            trace!(topic, observer = %observer, "observer already registered");
            return false;
        }

        Arc::make_mut(observers).push(observer.clone());
        true
    }

    /// Removes `observer` from `topic` if present.
    ///
    /// Returns `true` if the observer was removed. Topics left without
    /// observers are dropped.
    pub fn unregister(&self, topic: &str, observer: &ObserverRef<V>) -> bool {
        let mut topics = match self.topics.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let Some(observers) = topics.get_mut(topic) else {
            return false;
        };

        let Some(position) = observers.iter().position(|entry| entry == observer) else {
            return false;
        };

        Arc::make_mut(observers).remove(position);
        if observers.is_empty() {
            topics.remove(topic);
        }
        true
    }

    /// Returns the observers registered on `topic`, in registration order.
    pub fn snapshot(&self, topic: &str) -> ObserverSnapshot<V> {
        let topics = match self.topics.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        topics.get(topic).cloned().unwrap_or_default()
    }

    /// Number of observers registered on `topic`.
    pub fn observer_count(&self, topic: &str) -> usize {
        self.snapshot(topic).len()
    }

    /// Topics that currently have at least one observer.
    pub fn topics(&self) -> Vec<String> {
        let topics = match self.topics.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let mut names: Vec<String> = topics.keys().cloned().collect();
        names.sort();
        names
    }
}

impl<V: Send + 'static> Default for ObserverRegistry<V> {
    fn default() -> Self {
        Self::new()
    }
}
