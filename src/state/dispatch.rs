use std::{
    any::Any,
    panic::AssertUnwindSafe,
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicUsize, Ordering},
    },
};

use futures::FutureExt;
use tokio::{
    runtime::Handle,
    sync::Notify,
    task::{JoinError, JoinSet},
};
use tracing::{debug, error, trace, warn};

use super::{Notification, ObserverRef, ObserverRegistry, StateError};

/// Default number of outstanding dispatch units before a warning is logged.
pub const DEFAULT_HIGH_WATER_MARK: usize = 256;

/// Fans a notification out to a topic's observers.
///
/// Every observer gets its own task on the runtime captured at construction.
/// The tasks are owned by the dispatcher rather than detached: finished ones
/// are reaped on each fan-out, and the owner can [`drain`](Self::drain) or
/// [`abort_all`](Self::abort_all) the rest. Dropping the dispatcher aborts
/// whatever is still outstanding.
pub struct Dispatcher<V: Send + 'static> {
    registry: Arc<ObserverRegistry<V>>,
    runtime: Handle,
    tasks: Mutex<JoinSet<()>>,
    in_flight: Arc<InFlight>,
    high_water_mark: usize,
}

/// Count of unfinished units, shared with the units themselves.
#[derive(Default)]
struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

/// Held by one dispatch unit; released when the unit completes or is
/// cancelled.
struct InFlightGuard(Arc<InFlight>);

impl InFlightGuard {
    fn acquire(in_flight: &Arc<InFlight>) -> Self {
        in_flight.count.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(in_flight))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.0.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

impl<V> Dispatcher<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates a dispatcher reading observers from `registry`.
    ///
    /// # Errors
    /// Returns `StateError::NoRuntime` if called outside a tokio runtime.
    pub fn new(
        registry: Arc<ObserverRegistry<V>>,
        high_water_mark: usize,
    ) -> Result<Self, StateError> {
        let runtime = Handle::try_current().map_err(|e| StateError::NoRuntime {
            component: "dispatcher",
            details: e.to_string(),
        })?;

        Ok(Self {
            registry,
            runtime,
            tasks: Mutex::new(JoinSet::new()),
            in_flight: Arc::new(InFlight::default()),
            high_water_mark,
        })
    }

    /// Schedules one dispatch unit per observer currently on `topic`.
    ///
    /// The observer list is snapshotted before anything is scheduled.
    /// Returns the number of units scheduled; none of them has necessarily
    /// run when this returns.
    pub fn notify(&self, topic: &str, event: Notification<V>) -> usize {
        let observers = self.registry.snapshot(topic);
        if observers.is_empty() {
            trace!(topic, "No observers registered");
            return 0;
        }

        let mut tasks = self.lock_tasks();
        reap_finished(&mut tasks);

        for observer in observers.iter() {
            let guard = InFlightGuard::acquire(&self.in_flight);
            let unit = dispatch_unit(topic.to_string(), observer.clone(), event.clone(), guard);
            tasks.spawn_on(unit, &self.runtime);
        }

        let outstanding = self.in_flight.count.load(Ordering::SeqCst);
        if outstanding > self.high_water_mark {
            warn!(
                topic,
                outstanding,
                high_water_mark = self.high_water_mark,
                "Dispatch backlog above high-water mark"
            );
        }

        debug!(
            topic,
            kind = event.kind(),
            observers = observers.len(),
            "Scheduled notification"
        );
        observers.len()
    }

    /// Broadcasts `data` verbatim to every observer on `topic`.
    pub fn notify_all(&self, topic: &str, data: V) -> usize {
        self.notify(topic, Notification::Broadcast(data))
    }

    /// Number of dispatch units that have not finished yet.
    pub fn pending(&self) -> usize {
        reap_finished(&mut self.lock_tasks());
        self.in_flight.count.load(Ordering::SeqCst)
    }

    /// Waits for every outstanding dispatch unit, including units scheduled
    /// by observers while draining.
    ///
    /// The units stay owned by the dispatcher meanwhile, so concurrent
    /// drains all wait and [`abort_all`](Self::abort_all) still reaches them.
    pub async fn drain(&self) {
        loop {
            let idle = self.in_flight.idle.notified();
            tokio::pin!(idle);
            idle.as_mut().enable();

            if self.in_flight.count.load(Ordering::SeqCst) == 0 {
                break;
            }
            idle.await;
        }

        reap_finished(&mut self.lock_tasks());
    }

    /// Cancels every outstanding dispatch unit.
    ///
    /// Returns how many units were still outstanding. Cancelled units are
    /// released asynchronously; [`drain`](Self::drain) waits for that.
    pub fn abort_all(&self) -> usize {
        let mut tasks = self.lock_tasks();
        reap_finished(&mut tasks);

        let outstanding = tasks.len();
        if outstanding > 0 {
            warn!(outstanding, "Aborting outstanding notifications");
        }
        tasks.abort_all();
        outstanding
    }

    fn lock_tasks(&self) -> MutexGuard<'_, JoinSet<()>> {
        match self.tasks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// One observer, one event. Never lets a failure escape.
async fn dispatch_unit<V>(
    topic: String,
    observer: ObserverRef<V>,
    payload: Notification<V>,
    _guard: InFlightGuard,
) where
    V: Send + 'static,
{
    let outcome = AssertUnwindSafe(observer.invoke(payload))
        .catch_unwind()
        .await;

    match outcome {
        Ok(Ok(())) => trace!(topic = %topic, observer = %observer, "Observer finished"),
        Ok(Err(e)) => error!(
            topic = %topic,
            observer = %observer,
            error = %e,
            "Observer failed"
        ),
        Err(panic) => error!(
            topic = %topic,
            observer = %observer,
            panic = panic_message(panic.as_ref()),
            "Observer panicked"
        ),
    }
}

fn reap_finished(tasks: &mut JoinSet<()>) {
    while let Some(result) = tasks.try_join_next() {
        if let Err(e) = result {
            log_join_error(&e);
        }
    }
}

fn log_join_error(error: &JoinError) {
    if error.is_cancelled() {
        trace!("Dispatch unit cancelled");
    } else {
        error!(error = %error, "Dispatch unit terminated abnormally");
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
