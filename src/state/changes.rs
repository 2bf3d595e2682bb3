use std::time::Instant;

/// Represents a change to a single state slot.
///
/// Produced by the store only when the written value differs from the
/// slot's previous value.
#[derive(Debug, Clone, PartialEq)]
pub struct StateChange<V> {
    /// Key of the slot that changed (e.g. "city").
    pub key: String,
    /// The previous value of the slot, `None` if the slot did not exist.
    pub old_value: Option<V>,
    /// The value now held by the slot.
    pub new_value: V,
    /// Timestamp when the change was recorded.
    pub timestamp: Instant,
}

impl<V> StateChange<V> {
    /// Creates a new state change.
    ///
    /// # Arguments
    ///
    /// * `key` - The slot key
    /// * `old_value` - The previous value of the slot (if any)
    /// * `new_value` - The new value of the slot
    pub fn new(key: String, old_value: Option<V>, new_value: V) -> Self {
        Self {
            key,
            old_value,
            new_value,
            timestamp: Instant::now(),
        }
    }
}

impl StateChange<serde_json::Value> {
    /// Extracts the new value as a specific type.
    ///
    /// # Errors
    ///
    /// Returns `StateError::InvalidValue` if the value cannot be deserialized
    /// into the requested type.
    pub fn extract<T>(&self) -> Result<T, StateError>
    where
        T: serde::de::DeserializeOwned,
    {
        T::deserialize(&self.new_value).map_err(|e| StateError::InvalidValue {
            key: self.key.clone(),
            details: format!("expected {}: {e}", std::any::type_name::<T>()),
        })
    }

    /// Attempts to extract the new value as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        self.new_value.as_str()
    }
}

/// The payload delivered to an observer.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification<V> {
    /// A slot's value changed.
    Changed(StateChange<V>),
    /// An explicit broadcast, carrying the caller's payload verbatim.
    Broadcast(V),
}

impl<V> Notification<V> {
    /// Returns the value-change pair, if this is a value-change notification.
    pub fn as_change(&self) -> Option<&StateChange<V>> {
        match self {
            Notification::Changed(change) => Some(change),
            Notification::Broadcast(_) => None,
        }
    }

    /// Returns the broadcast payload, if this is a broadcast.
    pub fn as_broadcast(&self) -> Option<&V> {
        match self {
            Notification::Broadcast(data) => Some(data),
            Notification::Changed(_) => None,
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Notification::Changed(_) => "changed",
            Notification::Broadcast(_) => "broadcast",
        }
    }
}

/// Errors that can occur while setting up or feeding the state core.
///
/// Observer failures are not represented here: they are recovered and
/// logged at the dispatch boundary and never reach the writer.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// The dispatcher needs a tokio runtime to schedule observers on.
    #[error("no tokio runtime available for {component}: {details}")]
    NoRuntime {
        /// Component that attempted to capture the runtime
        component: &'static str,
        /// Details from the runtime lookup
        details: String,
    },

    /// A value could not be parsed or converted for a slot.
    #[error("invalid value for '{key}': {details}")]
    InvalidValue {
        /// Slot key the value was meant for
        key: String,
        /// Conversion error details
        details: String,
    },
}
