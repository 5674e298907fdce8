//! Completion notifications emitted by the persistence worker
//!
//! Notifications are delivered in processing order. The worker never waits for a
//! subscriber to observe a notification before moving on to the next request.

use crate::document::{DocumentHandle, SceneHandle};
use crate::error::PersistenceError;
use crate::request::RequestKind;
use crossbeam::channel::Sender;
use parking_lot::RwLock;

/// Outcome of a processed request, or the worker's final notification
#[derive(Debug)]
pub enum Notification {
    /// A page was written
    ScenePersisted { document: DocumentHandle, scene: SceneHandle, page_index: usize },

    /// A document's metadata was written
    MetadataPersisted { document: DocumentHandle },

    /// An adaptor failed; the request is dropped and later requests still run
    PersistFailed {
        kind: RequestKind,
        document: DocumentHandle,
        page_index: Option<usize>,
        error: PersistenceError,
    },

    /// Emitted exactly once, after the queue was drained following a shutdown request
    WorkerFinished,
}

impl Notification {
    pub fn is_failure(&self) -> bool {
        matches!(self, Notification::PersistFailed { .. })
    }
}

/// Sink for worker notifications
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

impl Notifier for Sender<Notification> {
    fn notify(&self, notification: Notification) {
        // Nobody listening is not an error for the worker
        if self.send(notification).is_err() {
            tracing::trace!("Notification receiver dropped");
        }
    }
}

/// Discards every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _notification: Notification) {}
}

type Callback = Box<dyn Fn(&Notification) + Send + Sync>;

/// Ordered list of subscriber callbacks, invoked synchronously on the worker thread
#[derive(Default)]
pub struct CallbackNotifier {
    subscribers: RwLock<Vec<Callback>>,
}

impl CallbackNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback; callbacks run in subscription order
    pub fn subscribe(&self, callback: impl Fn(&Notification) + Send + Sync + 'static) {
        self.subscribers.write().push(Box::new(callback));
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl std::fmt::Debug for CallbackNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackNotifier").field("subscribers", &self.subscriber_count()).finish()
    }
}

impl Notifier for CallbackNotifier {
    fn notify(&self, notification: Notification) {
        for subscriber in self.subscribers.read().iter() {
            subscriber(&notification);
        }
    }
}

impl<N: Notifier + ?Sized> Notifier for std::sync::Arc<N> {
    fn notify(&self, notification: Notification) {
        (**self).notify(notification);
    }
}
