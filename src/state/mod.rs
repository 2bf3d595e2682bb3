//! Application-wide state synchronization.
//!
//! A keyed store of slot values, a registry of observers per topic, and a
//! dispatcher that runs each observer as its own task whenever a slot
//! changes or a topic is broadcast to.

mod changes;
mod dispatch;
pub mod keys;
mod manager;
mod observer;
mod registry;
mod store;
mod subscription;

#[cfg(test)]
mod tests;

pub use changes::{Notification, StateChange, StateError};
pub use dispatch::{DEFAULT_HIGH_WATER_MARK, Dispatcher};
pub use manager::StateManager;
pub use observer::{
    AsyncFnObserver, FnObserver, Observer, ObserverError, ObserverId, ObserverOutput, ObserverRef,
};
pub use registry::{ObserverRegistry, ObserverSnapshot};
pub use store::SlotStore;
pub use subscription::Subscription;
