use std::{collections::BTreeMap, sync::Arc};

use tracing::{debug, info, instrument};

use crate::config::Config;

use super::{
    Dispatcher, Notification, ObserverRef, ObserverRegistry, SlotStore, StateError, Subscription,
    dispatch::DEFAULT_HIGH_WATER_MARK,
};

struct Inner<V: Send + 'static> {
    store: SlotStore<V>,
    registry: Arc<ObserverRegistry<V>>,
    dispatcher: Dispatcher<V>,
}

/// Application-wide state shared by UI components.
///
/// Built once at startup and handed to every component that needs it;
/// cloning is cheap and every clone sees the same slots and observers.
///
/// Writes return as soon as observers are scheduled. Call
/// [`shutdown`](Self::shutdown) before exit to let them finish.
pub struct StateManager<V: Send + 'static = serde_json::Value> {
    inner: Arc<Inner<V>>,
}

impl<V: Send + 'static> Clone for StateManager<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl StateManager<serde_json::Value> {
    /// Builds the manager from the `[state]` and `[dispatch]` sections of
    /// the configuration.
    ///
    /// # Errors
    /// Returns `StateError::NoRuntime` if called outside a tokio runtime.
    pub fn from_config(config: &Config) -> Result<Self, StateError> {
        Self::with_high_water_mark(
            config.state.to_slots(),
            config.dispatch.high_water_mark,
        )
    }
}

impl<V> StateManager<V>
where
    V: Clone + PartialEq + Send + Sync + 'static,
{
    /// Creates a manager holding `defaults` as the initial slots.
    ///
    /// # Errors
    /// Returns `StateError::NoRuntime` if called outside a tokio runtime.
    pub fn new(defaults: impl IntoIterator<Item = (String, V)>) -> Result<Self, StateError> {
        Self::with_high_water_mark(defaults, DEFAULT_HIGH_WATER_MARK)
    }

    /// Like [`new`](Self::new) with an explicit dispatch backlog warning
    /// threshold.
    ///
    /// # Errors
    /// Returns `StateError::NoRuntime` if called outside a tokio runtime.
    pub fn with_high_water_mark(
        defaults: impl IntoIterator<Item = (String, V)>,
        high_water_mark: usize,
    ) -> Result<Self, StateError> {
        let registry = Arc::new(ObserverRegistry::new());
        let dispatcher = Dispatcher::new(Arc::clone(&registry), high_water_mark)?;
        let store = SlotStore::new(defaults);

        info!(slots = store.keys().len(), "State manager initialized");

        Ok(Self {
            inner: Arc::new(Inner {
                store,
                registry,
                dispatcher,
            }),
        })
    }

    /// Current value of `key`, `None` if the slot does not exist.
    pub fn get_state(&self, key: &str) -> Option<V> {
        self.inner.store.get(key)
    }

    /// Writes `key` and, if `notify` is set and the value changed, schedules
    /// the key's observers.
    #[instrument(skip(self, value), fields(key = %key))]
    pub async fn set_state(&self, key: &str, value: V, notify: bool) {
        let Some(change) = self.inner.store.set(key, value) else {
            debug!("Value unchanged, skipping notification");
            return;
        };

        if notify {
            self.inner
                .dispatcher
                .notify(key, Notification::Changed(change));
        } else {
            debug!("Silent write");
        }
    }

    /// Writes `key` without notifying anyone.
    ///
    /// Usable from code that cannot await, including threads outside the
    /// runtime.
    pub fn set_state_sync(&self, key: &str, value: V) {
        self.inner.store.set(key, value);
    }

    /// Writes every entry, then notifies each changed key in iteration order.
    ///
    /// All writes land before the first notification is scheduled, so an
    /// observer of one key sees the whole batch already applied.
    #[instrument(skip_all)]
    pub async fn update_state<K>(&self, mapping: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
    {
        let changes = self
            .inner
            .store
            .set_many(mapping.into_iter().map(|(key, value)| (key.into(), value)));

        debug!(changed = changes.len(), "Batch written");
        for change in changes {
            let key = change.key.clone();
            self.inner
                .dispatcher
                .notify(&key, Notification::Changed(change));
        }
    }

    /// Adds `observer` to `topic`; a no-op if it is already there.
    pub fn register_observer(&self, topic: &str, observer: &ObserverRef<V>) {
        if self.inner.registry.register(topic, observer) {
            debug!(topic, observer = %observer, "Observer registered");
        }
    }

    /// Removes `observer` from `topic`; a no-op if it is not there.
    pub fn unregister_observer(&self, topic: &str, observer: &ObserverRef<V>) {
        if self.inner.registry.unregister(topic, observer) {
            debug!(topic, observer = %observer, "Observer unregistered");
        }
    }

    /// Delivers `data` as-is to every observer on `topic`.
    #[instrument(skip(self, data), fields(topic = %topic))]
    pub async fn notify_all(&self, topic: &str, data: V) {
        self.inner.dispatcher.notify_all(topic, data);
    }

    /// Registers a channel-backed observer on `topic`.
    ///
    /// The observer is removed when the returned subscription is dropped.
    pub fn subscribe(&self, topic: &str) -> Subscription<V> {
        debug!(topic, "Subscription created");
        Subscription::register(Arc::clone(&self.inner.registry), topic)
    }

    /// Copy of every slot, sorted by key.
    pub fn snapshot(&self) -> BTreeMap<String, V> {
        self.inner.store.snapshot()
    }

    /// Number of observers currently registered on `topic`.
    pub fn observer_count(&self, topic: &str) -> usize {
        self.inner.registry.observer_count(topic)
    }

    /// Number of scheduled observer invocations that have not finished.
    pub fn pending_dispatches(&self) -> usize {
        self.inner.dispatcher.pending()
    }

    /// Waits for every scheduled observer invocation to finish.
    pub async fn shutdown(&self) {
        let pending = self.inner.dispatcher.pending();
        if pending > 0 {
            info!(pending, "Waiting for outstanding notifications");
        }
        self.inner.dispatcher.drain().await;
    }

    /// Cancels every scheduled observer invocation that has not finished.
    ///
    /// Returns how many were cancelled.
    pub fn abort_dispatches(&self) -> usize {
        self.inner.dispatcher.abort_all()
    }
}
