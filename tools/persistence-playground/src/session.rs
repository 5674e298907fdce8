//! Simulated editing session: an editor thread and an autosave timer feeding the worker

use anyhow::{anyhow, Context, Result};
use crossbeam::channel::{self, Receiver};
use page_persistence::{
    DocumentHandle, DocumentProxy, JsonMetadataAdaptor, JsonSceneAdaptor, MetricsSnapshot,
    Notification, PersistenceConfig, PersistenceQueue, PersistenceWorker, Scene, SceneHandle,
    SceneItem, SceneItemKind, WorkerSummary,
};
use serde_json::json;
use std::path::Path;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Shape of a simulated session
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub pages: usize,
    pub edits: usize,
    pub edit_interval: Duration,
    pub autosave_interval: Duration,
}

/// What the notification consumer observed
#[derive(Debug, Default, Clone, Copy)]
pub struct NotificationCounts {
    pub scenes: u64,
    pub metadata: u64,
    pub failures: u64,
    pub finished: u64,
}

#[derive(Debug)]
pub struct SessionReport {
    pub summary: WorkerSummary,
    pub observed: NotificationCounts,
    pub metrics: MetricsSnapshot,
}

impl SessionReport {
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "worker": {
                "scenes_persisted": self.summary.scenes_persisted,
                "metadata_persisted": self.summary.metadata_persisted,
                "failures": self.summary.failures,
            },
            "notifications": {
                "scenes": self.observed.scenes,
                "metadata": self.observed.metadata,
                "failures": self.observed.failures,
                "finished": self.observed.finished,
            },
            "metrics": self.metrics,
        })
    }
}

/// Run one editing session against a document stored under `data_dir`
pub fn run_session(
    config: &PersistenceConfig,
    data_dir: &Path,
    options: &SessionOptions,
) -> Result<SessionReport> {
    if options.pages == 0 {
        return Err(anyhow!("A session needs at least one page"));
    }

    let document = DocumentProxy::new_handle("playground", data_dir.join("playground-document"));
    let pages: Vec<SceneHandle> = (0..options.pages).map(|_| Scene::new_handle()).collect();
    document.set_page_count(pages.len());
    document.set_metadata_value("origin", "persistence-playground");

    let (notification_tx, notification_rx) = channel::unbounded::<Notification>();
    let queue = PersistenceQueue::new();
    let worker = PersistenceWorker::new(
        queue.clone(),
        JsonSceneAdaptor::new(config.storage.clone()),
        JsonMetadataAdaptor::new(config.storage.clone()),
        notification_tx,
    )
    .spawn(&config.worker)
    .context("Failed to start persistence worker")?;

    info!(
        document_id = %document.id(),
        path = ?document.persistence_path(),
        pages = options.pages,
        "Session started"
    );

    let consumer = thread::Builder::new()
        .name("save-indicator".to_string())
        .spawn(move || consume_notifications(notification_rx))
        .context("Failed to start notification consumer")?;

    let (stop_tx, stop_rx) = channel::bounded::<()>(0);
    let autosave = {
        let queue = queue.clone();
        let document = document.clone();
        let interval = options.autosave_interval;
        thread::Builder::new()
            .name("autosave".to_string())
            .spawn(move || autosave_loop(queue, document, interval, stop_rx))
            .context("Failed to start autosave timer")?
    };

    edit_pages(&queue, &document, &pages, options);

    drop(stop_tx);
    autosave.join().map_err(|_| anyhow!("Autosave thread panicked"))?;

    // Final save of anything still dirty, then close
    for (page_index, page) in pages.iter().enumerate() {
        if page.is_modified() {
            queue.enqueue_scene(document.clone(), page.clone(), page_index);
        }
    }
    queue.enqueue_metadata(document.clone());
    info!(pending = queue.pending(), "Closing document");

    let summary = worker.shutdown()?;
    let observed = consumer.join().map_err(|_| anyhow!("Notification consumer panicked"))?;

    Ok(SessionReport { summary, observed, metrics: queue.metrics() })
}

/// Interactive producer: random strokes on random pages, each followed by a save request
fn edit_pages(
    queue: &PersistenceQueue,
    document: &DocumentHandle,
    pages: &[SceneHandle],
    options: &SessionOptions,
) {
    for edit in 0..options.edits {
        let page_index = fastrand::usize(..pages.len());
        let points = (0..fastrand::usize(2..8))
            .map(|_| (fastrand::f64() * 800.0, fastrand::f64() * 600.0))
            .collect();

        pages[page_index].add_item(SceneItem::new(
            edit as i32,
            SceneItemKind::Stroke { points, width: 1.0 + fastrand::f64() * 4.0 },
        ));
        queue.enqueue_scene(document.clone(), pages[page_index].clone(), page_index);
        debug!(edit, page_index, "Page edited");

        if !options.edit_interval.is_zero() {
            thread::sleep(options.edit_interval);
        }
    }
}

/// Timer producer: saves metadata on every tick until the stop channel closes
fn autosave_loop(
    queue: PersistenceQueue,
    document: DocumentHandle,
    interval: Duration,
    stop: Receiver<()>,
) {
    let ticker = channel::tick(interval);
    let mut autosaves = 0u64;
    loop {
        channel::select! {
            recv(ticker) -> _ => {
                autosaves += 1;
                document.set_metadata_value("autosave_count", autosaves.to_string());
                queue.enqueue_metadata(document.clone());
            }
            recv(stop) -> _ => break,
        }
    }
}

fn consume_notifications(rx: Receiver<Notification>) -> NotificationCounts {
    let mut counts = NotificationCounts::default();

    for notification in rx {
        match notification {
            Notification::ScenePersisted { page_index, .. } => {
                counts.scenes += 1;
                debug!(page_index, "Page saved");
            }
            Notification::MetadataPersisted { .. } => {
                counts.metadata += 1;
                debug!("Metadata saved");
            }
            Notification::PersistFailed { kind, page_index, error, .. } => {
                counts.failures += 1;
                warn!(%kind, ?page_index, "Save failed: {}", error);
            }
            Notification::WorkerFinished => {
                counts.finished += 1;
                info!("All pending saves completed");
            }
        }
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use page_persistence::adaptor::{metadata_file_path, page_file_path};
    use tempfile::TempDir;

    fn quick_options() -> SessionOptions {
        SessionOptions {
            pages: 3,
            edits: 20,
            edit_interval: Duration::ZERO,
            autosave_interval: Duration::from_millis(5),
        }
    }

    #[test]
    fn test_session_persists_every_edit() {
        let temp_dir = TempDir::new().unwrap();
        let options = quick_options();

        let report = run_session(&PersistenceConfig::default(), temp_dir.path(), &options).unwrap();

        assert_eq!(report.summary.failures, 0);
        assert!(report.summary.scenes_persisted >= options.edits as u64);
        assert!(report.summary.metadata_persisted >= 1);
        assert_eq!(report.observed.finished, 1);
        assert_eq!(report.observed.scenes, report.summary.scenes_persisted);
        assert_eq!(report.observed.metadata, report.summary.metadata_persisted);
        assert_eq!(report.metrics.requests_enqueued, report.summary.processed());

        let document_dir = temp_dir.path().join("playground-document");
        assert!(metadata_file_path(&document_dir).exists());
        let written = (0..options.pages).filter(|i| page_file_path(&document_dir, *i).exists());
        assert!(written.count() >= 1);
    }

    #[test]
    fn test_session_requires_pages() {
        let temp_dir = TempDir::new().unwrap();
        let options = SessionOptions { pages: 0, ..quick_options() };
        assert!(run_session(&PersistenceConfig::default(), temp_dir.path(), &options).is_err());
    }

    #[test]
    fn test_report_json_shape() {
        let report = SessionReport {
            summary: WorkerSummary { scenes_persisted: 2, metadata_persisted: 1, failures: 0 },
            observed: NotificationCounts { scenes: 2, metadata: 1, failures: 0, finished: 1 },
            metrics: PersistenceQueue::new().metrics(),
        };

        let value = report.to_json();
        assert_eq!(value["worker"]["scenes_persisted"], 2);
        assert_eq!(value["notifications"]["finished"], 1);
        assert_eq!(value["metrics"]["requests_enqueued"], 0);
    }
}
