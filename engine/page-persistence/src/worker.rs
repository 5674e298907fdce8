//! The persistence worker: a single consumer draining the queue on its own thread

use crate::adaptor::{MetadataAdaptor, SceneAdaptor};
use crate::config::WorkerConfig;
use crate::error::{PersistenceError, Result};
use crate::notifier::{Notification, Notifier};
use crate::queue::{PersistenceQueue, WorkerState};
use crate::request::Request;
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Totals reported by a worker once it has terminated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerSummary {
    pub scenes_persisted: u64,
    pub metadata_persisted: u64,
    pub failures: u64,
}

impl WorkerSummary {
    pub fn processed(&self) -> u64 {
        self.scenes_persisted + self.metadata_persisted + self.failures
    }
}

/// Consumer side of a [`PersistenceQueue`]
pub struct PersistenceWorker {
    queue: PersistenceQueue,
    scene_adaptor: Box<dyn SceneAdaptor>,
    metadata_adaptor: Box<dyn MetadataAdaptor>,
    notifier: Box<dyn Notifier>,
}

impl PersistenceWorker {
    pub fn new(
        queue: PersistenceQueue,
        scene_adaptor: impl SceneAdaptor + 'static,
        metadata_adaptor: impl MetadataAdaptor + 'static,
        notifier: impl Notifier + 'static,
    ) -> Self {
        Self {
            queue,
            scene_adaptor: Box::new(scene_adaptor),
            metadata_adaptor: Box::new(metadata_adaptor),
            notifier: Box::new(notifier),
        }
    }

    /// Run the worker on a dedicated thread
    pub fn spawn(self, config: &WorkerConfig) -> Result<WorkerHandle> {
        let queue = self.queue.clone();

        let mut builder = thread::Builder::new().name(config.thread_name.clone());
        if let Some(stack_size) = config.stack_size {
            builder = builder.stack_size(stack_size);
        }

        let thread =
            builder.spawn(move || self.run()).map_err(PersistenceError::ResourceExhausted)?;

        Ok(WorkerHandle { queue, thread })
    }

    /// Process requests on the current thread until the queue is drained after shutdown
    pub fn run(mut self) -> WorkerSummary {
        tracing::info!("Persistence worker started");

        let mut summary = WorkerSummary::default();
        while let Some(request) = self.queue.next_request() {
            self.process(request, &mut summary);
        }

        tracing::info!(
            scenes = summary.scenes_persisted,
            metadata = summary.metadata_persisted,
            failures = summary.failures,
            "Persistence worker finished"
        );
        self.notifier.notify(Notification::WorkerFinished);

        summary
    }

    fn process(&mut self, request: Request, summary: &mut WorkerSummary) {
        let kind = request.kind();
        let page_index = request.page_index();
        let started = Instant::now();

        let (document, outcome) = match request {
            Request::SceneWrite { document, scene, page_index } => {
                tracing::debug!(document_id = %document.id(), page_index, "Persisting scene");
                match self.scene_adaptor.persist_scene(&document, &scene, page_index) {
                    Ok(()) => {
                        summary.scenes_persisted += 1;
                        self.queue.worker_metrics().scenes_persisted.inc();
                        let notification = Notification::ScenePersisted {
                            document: document.clone(),
                            scene,
                            page_index,
                        };
                        (document, Ok(notification))
                    }
                    Err(e) => (document, Err(e)),
                }
            }
            Request::MetadataWrite { document } => {
                tracing::debug!(document_id = %document.id(), "Persisting metadata");
                match self.metadata_adaptor.persist_metadata(&document) {
                    Ok(()) => {
                        summary.metadata_persisted += 1;
                        self.queue.worker_metrics().metadata_persisted.inc();
                        let notification =
                            Notification::MetadataPersisted { document: document.clone() };
                        (document, Ok(notification))
                    }
                    Err(e) => (document, Err(e)),
                }
            }
        };

        self.queue.worker_metrics().record_latency(started.elapsed());

        let notification = match outcome {
            Ok(notification) => notification,
            Err(source) => {
                let error =
                    PersistenceError::adaptor_failure(kind, document.id(), page_index, source);
                tracing::error!("{}", error);

                summary.failures += 1;
                self.queue.worker_metrics().failures.inc();
                Notification::PersistFailed { kind, document, page_index, error }
            }
        };

        self.notifier.notify(notification);
    }
}

/// Handle to a worker running on its own thread
#[derive(Debug)]
pub struct WorkerHandle {
    queue: PersistenceQueue,
    thread: JoinHandle<WorkerSummary>,
}

impl WorkerHandle {
    /// Producer handle for the queue this worker drains
    pub fn queue(&self) -> &PersistenceQueue {
        &self.queue
    }

    pub fn state(&self) -> WorkerState {
        self.queue.worker_state()
    }

    /// Whether the worker thread has exited
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the worker to terminate
    ///
    /// Only returns once shutdown has been requested through some queue handle.
    pub fn join(self) -> Result<WorkerSummary> {
        self.thread.join().map_err(|_| PersistenceError::WorkerPanicked)
    }

    /// Request shutdown and wait for the queue to drain
    pub fn shutdown(self) -> Result<WorkerSummary> {
        self.queue.request_shutdown();
        self.join()
    }
}
