use std::{
    collections::{BTreeMap, HashMap},
    sync::RwLock,
};

use super::StateChange;

/// Current values of the application's named slots.
///
/// Pure get/set with change detection; knows nothing about observers.
pub struct SlotStore<V> {
    slots: RwLock<HashMap<String, V>>,
}

impl<V: Clone + PartialEq> SlotStore<V> {
    /// Creates a store holding the given initial slots.
    pub fn new(defaults: impl IntoIterator<Item = (String, V)>) -> Self {
        Self {
            slots: RwLock::new(defaults.into_iter().collect()),
        }
    }

    /// Returns the current value of `key`, or `None` for an unknown key.
    pub fn get(&self, key: &str) -> Option<V> {
        match self.slots.read() {
            Ok(guard) => guard.get(key).cloned(),
            Err(poisoned) => poisoned.into_inner().get(key).cloned(),
        }
    }

    /// Overwrites `key` with `value`.
    ///
    /// Returns the change if the value differs from the previous one, `None`
    /// for a no-op write.
    pub fn set(&self, key: &str, value: V) -> Option<StateChange<V>> {
        let mut slots = match self.slots.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        Self::write_slot(&mut slots, key, value)
    }

    /// Writes every entry in order and returns the changes, in the same order.
    ///
    /// All writes land before the caller sees any change, so whoever reacts
    /// to the first change already observes the whole batch.
    pub fn set_many(&self, entries: impl IntoIterator<Item = (String, V)>) -> Vec<StateChange<V>> {
        let mut slots = match self.slots.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        entries
            .into_iter()
            .filter_map(|(key, value)| Self::write_slot(&mut slots, &key, value))
            .collect()
    }

    /// Returns a copy of every slot, sorted by key.
    pub fn snapshot(&self) -> BTreeMap<String, V> {
        let slots = match self.slots.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        slots
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Keys of every slot currently held, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.snapshot().into_keys().collect()
    }

    fn write_slot(
        slots: &mut HashMap<String, V>,
        key: &str,
        value: V,
    ) -> Option<StateChange<V>> {
        match slots.get_mut(key) {
            Some(current) if *current == value => None,
            Some(current) => {
                let old_value = std::mem::replace(current, value.clone());
                Some(StateChange::new(key.to_string(), Some(old_value), value))
            }
            None => {
                slots.insert(key.to_string(), value.clone());
                Some(StateChange::new(key.to_string(), None, value))
            }
        }
    }
}
