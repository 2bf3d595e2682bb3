use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio::sync::mpsc::{self, UnboundedReceiver, error::TryRecvError};
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::{Notification, ObserverRef, ObserverRegistry};

/// A channel-backed observer that unregisters itself when dropped.
///
/// Lets a component consume notifications as a stream instead of a
/// callback, and ties the registration to the component's lifetime.
pub struct Subscription<V: Send + 'static> {
    registration: Registration<V>,
    receiver: UnboundedReceiver<Notification<V>>,
}

impl<V: Send + 'static> Subscription<V> {
    pub(crate) fn register(registry: Arc<ObserverRegistry<V>>, topic: &str) -> Self {
        let (tx, receiver) = mpsc::unbounded_channel();
        let observer = ObserverRef::from_fn(format!("subscription:{topic}"), move |payload| {
            tx.send(payload)
                .map_err(|_| "subscription receiver closed".to_string())
        });

        registry.register(topic, &observer);

        Self {
            registration: Registration {
                topic: topic.to_string(),
                observer,
                registry,
            },
            receiver,
        }
    }

    /// Topic this subscription listens on.
    pub fn topic(&self) -> &str {
        &self.registration.topic
    }

    /// Waits for the next notification.
    pub async fn recv(&mut self) -> Option<Notification<V>> {
        self.receiver.recv().await
    }

    /// Returns a notification that has already been delivered, if any.
    ///
    /// # Errors
    /// Returns `TryRecvError::Empty` when nothing is queued.
    pub fn try_recv(&mut self) -> Result<Notification<V>, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Converts the subscription into a stream of notifications.
    ///
    /// The observer stays registered until the stream is dropped.
    pub fn into_stream(self) -> impl Stream<Item = Notification<V>> + Send {
        let Self {
            registration,
            receiver,
        } = self;

        futures::stream::unfold(
            (UnboundedReceiverStream::new(receiver), registration),
            |(mut stream, registration)| async move {
                stream
                    .next()
                    .await
                    .map(|item| (item, (stream, registration)))
            },
        )
    }
}

/// Keeps an observer registered for as long as it lives.
struct Registration<V: Send + 'static> {
    topic: String,
    observer: ObserverRef<V>,
    registry: Arc<ObserverRegistry<V>>,
}

impl<V: Send + 'static> Drop for Registration<V> {
    fn drop(&mut self) {
        self.registry.unregister(&self.topic, &self.observer);
    }
}
