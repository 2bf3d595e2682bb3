use std::{
    fmt,
    future::Future,
    hash::{Hash, Hasher},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use async_trait::async_trait;

use super::Notification;

/// Error type an observer reports back to the dispatcher.
pub type ObserverError = Box<dyn std::error::Error + Send + Sync>;

/// A callback interested in a topic.
///
/// The dispatcher only ever calls `invoke` and awaits it; whether the
/// observer does its work synchronously or not is decided by the
/// implementation, not detected at dispatch time.
#[async_trait]
pub trait Observer<V: Send + 'static>: Send + Sync {
    /// Handle one notification.
    ///
    /// # Errors
    /// Any error is logged by the dispatcher together with the observer's
    /// identity and then dropped.
    async fn invoke(&self, payload: Notification<V>) -> Result<(), ObserverError>;
}

/// Return values accepted from callback observers.
///
/// Lets a closure return either `()` or a `Result`.
pub trait ObserverOutput {
    /// Normalize into the dispatcher's result type.
    ///
    /// # Errors
    /// Returns the callback's own error, boxed.
    fn into_result(self) -> Result<(), ObserverError>;
}

impl ObserverOutput for () {
    fn into_result(self) -> Result<(), ObserverError> {
        Ok(())
    }
}

impl<E: Into<ObserverError>> ObserverOutput for Result<(), E> {
    fn into_result(self) -> Result<(), ObserverError> {
        self.map_err(Into::into)
    }
}

/// Direct-call adapter: runs a plain closure to completion when invoked.
pub struct FnObserver<F>(F);

#[async_trait]
impl<V, F, O> Observer<V> for FnObserver<F>
where
    V: Send + 'static,
    F: Fn(Notification<V>) -> O + Send + Sync,
    O: ObserverOutput,
{
    async fn invoke(&self, payload: Notification<V>) -> Result<(), ObserverError> {
        (self.0)(payload).into_result()
    }
}

/// Awaitable-call adapter: calls a closure returning a future and awaits it.
pub struct AsyncFnObserver<F>(F);

#[async_trait]
impl<V, F, Fut, O> Observer<V> for AsyncFnObserver<F>
where
    V: Send + 'static,
    F: Fn(Notification<V>) -> Fut + Send + Sync,
    Fut: Future<Output = O> + Send,
    O: ObserverOutput,
{
    async fn invoke(&self, payload: Notification<V>) -> Result<(), ObserverError> {
        (self.0)(payload).await.into_result()
    }
}

static NEXT_OBSERVER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of an observer handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

impl ObserverId {
    fn next() -> Self {
        Self(NEXT_OBSERVER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Cloneable handle to a registered observer.
///
/// Clones share the same identity, so a component can keep one handle,
/// register it on mount and unregister it on unmount. Two handles built
/// from identical closures are still distinct observers.
pub struct ObserverRef<V: Send + 'static> {
    id: ObserverId,
    name: Arc<str>,
    inner: Arc<dyn Observer<V>>,
}

impl<V: Send + 'static> ObserverRef<V> {
    /// Wrap a hand-written observer.
    pub fn new(name: impl Into<Arc<str>>, observer: impl Observer<V> + 'static) -> Self {
        Self {
            id: ObserverId::next(),
            name: name.into(),
            inner: Arc::new(observer),
        }
    }

    /// Wrap a synchronous callback.
    ///
    /// The closure may return `()` or `Result<(), E>`.
    pub fn from_fn<F, O>(name: impl Into<Arc<str>>, callback: F) -> Self
    where
        F: Fn(Notification<V>) -> O + Send + Sync + 'static,
        O: ObserverOutput + 'static,
    {
        Self::new(name, FnObserver(callback))
    }

    /// Wrap an asynchronous callback.
    ///
    /// The closure returns a future resolving to `()` or `Result<(), E>`.
    pub fn from_async<F, Fut, O>(name: impl Into<Arc<str>>, callback: F) -> Self
    where
        F: Fn(Notification<V>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = O> + Send + 'static,
        O: ObserverOutput + 'static,
    {
        Self::new(name, AsyncFnObserver(callback))
    }

    /// Identity used for deduplication and removal.
    pub fn id(&self) -> ObserverId {
        self.id
    }

    /// Human-readable name used in logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) async fn invoke(&self, payload: Notification<V>) -> Result<(), ObserverError> {
        self.inner.invoke(payload).await
    }
}

impl<V: Send + 'static> Clone for ObserverRef<V> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: Arc::clone(&self.name),
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: Send + 'static> PartialEq for ObserverRef<V> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<V: Send + 'static> Eq for ObserverRef<V> {}

impl<V: Send + 'static> Hash for ObserverRef<V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<V: Send + 'static> fmt::Debug for ObserverRef<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRef")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

impl<V: Send + 'static> fmt::Display for ObserverRef<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.id)
    }
}
