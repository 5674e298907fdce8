//! # Page Persistence
//!
//! Background persistence for documents edited on an interactive thread. Producers
//! queue "write this page" and "write this document's metadata" requests; a single
//! worker thread performs them in submission order and reports each outcome.
//!
//! ## Architecture
//!
//! - **PersistenceQueue**: FIFO of pending requests plus the shutdown flag, shared by
//!   every producer
//! - **PersistenceWorker**: the only consumer, draining the queue on its own thread
//! - **SceneAdaptor / MetadataAdaptor**: how a page or metadata is actually stored
//! - **Notifier**: where completion notifications go (channel or callbacks)
//!
//! Shutdown never loses work: after [`PersistenceQueue::request_shutdown`] the worker
//! keeps going until the queue is empty, then emits [`Notification::WorkerFinished`].
//!
//! ## Usage
//!
//! ```rust
//! use page_persistence::{
//!     DocumentProxy, JsonMetadataAdaptor, JsonSceneAdaptor, Notification, PersistenceConfig,
//!     PersistenceQueue, PersistenceWorker, Scene,
//! };
//! use tempfile::TempDir;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let temp_dir = TempDir::new()?;
//!     let config = PersistenceConfig::default();
//!
//!     let queue = PersistenceQueue::new();
//!     let (tx, rx) = crossbeam::channel::unbounded::<Notification>();
//!     let handle = PersistenceWorker::new(
//!         queue.clone(),
//!         JsonSceneAdaptor::new(config.storage.clone()),
//!         JsonMetadataAdaptor::new(config.storage.clone()),
//!         tx,
//!     )
//!     .spawn(&config.worker)?;
//!
//!     let document = DocumentProxy::new_handle("Lesson", temp_dir.path());
//!     queue.enqueue_scene(document.clone(), Scene::new_handle(), 0);
//!     queue.enqueue_metadata(document);
//!
//!     let summary = handle.shutdown()?;
//!     assert_eq!(summary.processed(), 2);
//!     assert!(matches!(rx.iter().last(), Some(Notification::WorkerFinished)));
//!     Ok(())
//! }
//! ```

pub mod adaptor;
pub mod config;
pub mod document;
pub mod error;
pub mod metrics;
pub mod notifier;
pub mod queue;
pub mod request;
pub mod worker;

pub use adaptor::{
    metadata_adaptor_fn, scene_adaptor_fn, JsonMetadataAdaptor, JsonSceneAdaptor, MetadataAdaptor,
    SceneAdaptor,
};
pub use config::{PersistenceConfig, StorageConfig, WorkerConfig};
pub use document::{
    DocumentHandle, DocumentMetadata, DocumentProxy, Scene, SceneHandle, SceneItem, SceneItemKind,
    SceneSnapshot,
};
pub use error::{PersistenceError, Result};
pub use metrics::MetricsSnapshot;
pub use notifier::{CallbackNotifier, Notification, Notifier, NullNotifier};
pub use queue::{PersistenceQueue, WorkerState};
pub use request::{Request, RequestKind};
pub use worker::{PersistenceWorker, WorkerHandle, WorkerSummary};

/// Current version of the page persistence crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
