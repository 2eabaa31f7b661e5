//! Domain events and the synchronous in-process event bus.
//!
//! Producers publish a [`DomainEvent`]; every subscribed [`EventListener`] runs
//! on the publishing thread, in subscription order, before `publish` returns.
//!
//! ```text
//! DispatchEngine → EventBus::publish(&event) → listener 1 → listener 2 → ...
//! ```
//!
//! The listener set is snapshotted when `publish` starts, so a listener that
//! subscribes or unsubscribes during delivery only affects later events.
//! Listener failures (an `Err` or a panic) are logged and collected in the
//! returned [`DeliveryReport`]; they never stop delivery to the others.
//!
//! A listener must not publish an event that would be delivered back to
//! itself: its mutex is held for the duration of its handler.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::error::BrokerError;
use crate::core::work::{WorkItem, Worker};
use crate::util::serde::{WorkId, WorkerId};

/// Classification of domain events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Every expected worker has been provisioned.
    AllWorkersProvisioned,
    /// A unit of work was bound to and handed to a worker.
    WorkBoundToWorker,
    /// A worker reported a unit of work as finished.
    WorkerFinishedWork,
    /// An item was appended to the backlog.
    BacklogContentAdded,
    /// An item left the backlog.
    BacklogContentRemoved,
    /// The backlog was cleared or replaced wholesale.
    BacklogContentChanged,
}

/// Event published by the broker, tagged with its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEvent {
    /// Every expected worker has been provisioned.
    AllWorkersProvisioned {
        /// Provisioned workers in provisioning order.
        workers: Vec<Worker>,
    },
    /// A unit of work was bound to and handed to a worker.
    WorkBoundToWorker {
        /// Receiving worker.
        worker: WorkerId,
        /// Bound work item.
        work: WorkId,
    },
    /// A worker reported a unit of work as finished.
    WorkerFinishedWork {
        /// Worker that finished.
        worker: WorkerId,
        /// Finished work item.
        work: WorkId,
    },
    /// An item was appended to the backlog.
    BacklogContentAdded {
        /// The appended item.
        item: WorkItem,
    },
    /// An item left the backlog.
    BacklogContentRemoved {
        /// The removed item.
        item: WorkItem,
    },
    /// The backlog was cleared or replaced wholesale.
    BacklogContentChanged,
}

impl DomainEvent {
    /// Kind of this event.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::AllWorkersProvisioned { .. } => EventKind::AllWorkersProvisioned,
            Self::WorkBoundToWorker { .. } => EventKind::WorkBoundToWorker,
            Self::WorkerFinishedWork { .. } => EventKind::WorkerFinishedWork,
            Self::BacklogContentAdded { .. } => EventKind::BacklogContentAdded,
            Self::BacklogContentRemoved { .. } => EventKind::BacklogContentRemoved,
            Self::BacklogContentChanged => EventKind::BacklogContentChanged,
        }
    }

    /// Worker this event refers to, if any.
    #[must_use]
    pub const fn worker(&self) -> Option<WorkerId> {
        match self {
            Self::WorkBoundToWorker { worker, .. } | Self::WorkerFinishedWork { worker, .. } => {
                Some(*worker)
            }
            Self::BacklogContentAdded { item } | Self::BacklogContentRemoved { item } => {
                item.worker
            }
            Self::AllWorkersProvisioned { .. } | Self::BacklogContentChanged => None,
        }
    }

    /// Work item id this event refers to, if any.
    #[must_use]
    pub const fn work(&self) -> Option<WorkId> {
        match self {
            Self::WorkBoundToWorker { work, .. } | Self::WorkerFinishedWork { work, .. } => {
                Some(*work)
            }
            Self::BacklogContentAdded { item } | Self::BacklogContentRemoved { item } => {
                Some(item.id)
            }
            Self::AllWorkersProvisioned { .. } | Self::BacklogContentChanged => None,
        }
    }
}

/// Component reacting to domain events.
pub trait EventListener {
    /// Handle one event. An `Err` is logged and reported by the bus; it does
    /// not stop delivery to other listeners.
    fn on_event(&mut self, event: &DomainEvent) -> Result<(), BrokerError>;

    /// Name used in logs and failure reports.
    fn name(&self) -> &str {
        "listener"
    }
}

/// Listener shared between the bus and its owner.
pub type SharedListener = Arc<Mutex<dyn EventListener + Send>>;

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Listener adapter over a closure.
pub struct FnListener<F> {
    name: String,
    handler: F,
}

impl<F> FnListener<F>
where
    F: FnMut(&DomainEvent) -> Result<(), BrokerError>,
{
    /// Wrap a closure as a named listener.
    pub fn new(name: impl Into<String>, handler: F) -> Self {
        Self {
            name: name.into(),
            handler,
        }
    }
}

impl<F> EventListener for FnListener<F>
where
    F: FnMut(&DomainEvent) -> Result<(), BrokerError>,
{
    fn on_event(&mut self, event: &DomainEvent) -> Result<(), BrokerError> {
        (self.handler)(event)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// One listener failure observed during a publish.
#[derive(Debug)]
pub struct ListenerFailure {
    /// Failing listener.
    pub listener: ListenerId,
    /// Listener name at the time of failure.
    pub name: String,
    /// Returned error, or [`BrokerError::Listener`] for a panic.
    pub error: BrokerError,
}

/// Outcome of delivering one event.
#[derive(Debug, Default)]
pub struct DeliveryReport {
    /// Listeners that handled the event successfully.
    pub delivered: usize,
    /// Listeners that failed.
    pub failures: Vec<ListenerFailure>,
}

impl DeliveryReport {
    /// True when no listener failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// First failure's error, if any.
    #[must_use]
    pub fn into_first_error(self) -> Option<BrokerError> {
        self.failures.into_iter().next().map(|f| f.error)
    }
}

#[derive(Default)]
struct BusInner {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(ListenerId, SharedListener)>>,
}

/// Synchronous publish/subscribe channel. Cloning yields another handle to
/// the same listener set.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    /// Create a bus with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener at the end of the delivery order.
    pub fn subscribe(&self, listener: SharedListener) -> ListenerId {
        let id = ListenerId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner.listeners.lock().push((id, listener));
        id
    }

    /// Register a closure as a listener.
    pub fn subscribe_fn<F>(&self, name: impl Into<String>, handler: F) -> ListenerId
    where
        F: FnMut(&DomainEvent) -> Result<(), BrokerError> + Send + 'static,
    {
        self.subscribe(Arc::new(Mutex::new(FnListener::new(name, handler))))
    }

    /// Remove a listener. Returns false if it was not subscribed.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.inner.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    /// Number of subscribed listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.listeners.lock().len()
    }

    /// True when nobody is subscribed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver an event to every listener subscribed at call time.
    pub fn publish(&self, event: &DomainEvent) -> DeliveryReport {
        let snapshot: Vec<(ListenerId, SharedListener)> = self.inner.listeners.lock().clone();
        let mut report = DeliveryReport::default();

        for (id, listener) in snapshot {
            let name = listener.lock().name().to_owned();
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| listener.lock().on_event(event)));
            match outcome {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(error)) => {
                    tracing::warn!("listener {} failed on {:?}: {}", name, event.kind(), error);
                    report.failures.push(ListenerFailure {
                        listener: id,
                        name,
                        error,
                    });
                }
                Err(panic) => {
                    let reason = panic_message(panic.as_ref());
                    tracing::error!("listener {} panicked on {:?}: {}", name, event.kind(), reason);
                    report.failures.push(ListenerFailure {
                        listener: id,
                        name: name.clone(),
                        error: BrokerError::Listener {
                            listener: name,
                            reason,
                        },
                    });
                }
            }
        }

        report
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "panic".to_string()
    }
}
