//! Persistence queue and producer API
//!
//! The queue is a FIFO of pending [`Request`]s, a shutdown flag and the worker's
//! current [`WorkerState`], all behind a single lock. A condition variable wakes the
//! worker after every append or shutdown request. Wake-ups are only hints: the worker
//! always re-derives what to do from the locked state, so a request can never be
//! skipped by an early shutdown and a pop can never hit an empty queue.

use crate::document::{DocumentHandle, SceneHandle};
use crate::metrics::{MetricsSnapshot, WorkerMetrics};
use crate::request::Request;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

/// Lifecycle of the persistence worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Blocked, waiting for work or shutdown
    Idle,
    /// Processing queued requests
    Draining,
    /// Queue drained after shutdown; the worker has exited its loop
    Terminated,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerState::Idle => write!(f, "idle"),
            WorkerState::Draining => write!(f, "draining"),
            WorkerState::Terminated => write!(f, "terminated"),
        }
    }
}

#[derive(Debug)]
struct QueueState {
    requests: VecDeque<Request>,
    shutdown_requested: bool,
    worker_state: WorkerState,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<QueueState>,
    wakeup: Condvar,
    metrics: WorkerMetrics,
}

/// Thread-safe handle to the persistence queue
///
/// Cloning is cheap; every producer can hold its own clone. All producer operations
/// return as soon as the request is appended and never wait on the worker.
#[derive(Debug, Clone)]
pub struct PersistenceQueue {
    shared: Arc<Shared>,
}

impl Default for PersistenceQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl PersistenceQueue {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(QueueState {
                    requests: VecDeque::new(),
                    shutdown_requested: false,
                    worker_state: WorkerState::Idle,
                }),
                wakeup: Condvar::new(),
                metrics: WorkerMetrics::new(),
            }),
        }
    }

    /// Queue a write of page `page_index` of `document`
    pub fn enqueue_scene(&self, document: DocumentHandle, scene: SceneHandle, page_index: usize) {
        self.push(Request::SceneWrite { document, scene, page_index });
    }

    /// Queue a write of `document`'s metadata
    pub fn enqueue_metadata(&self, document: DocumentHandle) {
        self.push(Request::MetadataWrite { document });
    }

    /// Ask the worker to stop once every request queued so far has been processed
    ///
    /// Calling this more than once has the same effect as calling it once.
    pub fn request_shutdown(&self) {
        let mut state = self.shared.state.lock();
        if !state.shutdown_requested {
            state.shutdown_requested = true;
            tracing::info!(
                pending = state.requests.len(),
                "Shutdown requested, draining persistence queue"
            );
        }
        self.shared.wakeup.notify_one();
    }

    fn push(&self, request: Request) {
        let mut state = self.shared.state.lock();

        if state.worker_state == WorkerState::Terminated {
            tracing::warn!(
                kind = %request.kind(),
                document_id = %request.document().id(),
                "Request enqueued after the persistence worker terminated; it will not be written"
            );
        } else if state.shutdown_requested {
            tracing::warn!(
                kind = %request.kind(),
                document_id = %request.document().id(),
                "Request enqueued after shutdown was requested"
            );
        }

        tracing::debug!(
            kind = %request.kind(),
            document_id = %request.document().id(),
            page_index = ?request.page_index(),
            pending = state.requests.len() + 1,
            "Enqueued persistence request"
        );

        state.requests.push_back(request);
        self.shared.metrics.requests_enqueued.inc();
        self.shared.wakeup.notify_one();
    }

    /// Block until there is a request to process or the worker must terminate
    ///
    /// Returns `None` only when the queue is empty and shutdown has been requested,
    /// observed together under the lock. From then on the state is `Terminated`.
    pub(crate) fn next_request(&self) -> Option<Request> {
        let mut state = self.shared.state.lock();
        loop {
            if let Some(request) = state.requests.pop_front() {
                state.worker_state = WorkerState::Draining;
                return Some(request);
            }

            if state.shutdown_requested {
                state.worker_state = WorkerState::Terminated;
                return None;
            }

            state.worker_state = WorkerState::Idle;
            self.shared.wakeup.wait(&mut state);
        }
    }

    /// Number of requests waiting to be processed
    pub fn pending(&self) -> usize {
        self.shared.state.lock().requests.len()
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shared.state.lock().shutdown_requested
    }

    pub fn worker_state(&self) -> WorkerState {
        self.shared.state.lock().worker_state
    }

    pub(crate) fn worker_metrics(&self) -> &WorkerMetrics {
        &self.shared.metrics
    }

    /// Current counters for enqueued and processed requests
    pub fn metrics(&self) -> MetricsSnapshot {
        self.shared.metrics.snapshot()
    }
}
