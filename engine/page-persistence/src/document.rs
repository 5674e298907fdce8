//! Live in-memory document and page models shared between producers and the worker
//!
//! Requests hold these through [`DocumentHandle`] and [`SceneHandle`], so a model stays
//! alive until every request referencing it has been processed. Adaptors read the
//! current state when they run, not a copy taken at enqueue time.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Shared-ownership reference to a document being persisted
pub type DocumentHandle = Arc<DocumentProxy>;

/// Shared-ownership reference to one page's live model
pub type SceneHandle = Arc<Scene>;

/// Document metadata written by the metadata adaptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Document identifier
    pub id: Uuid,

    /// Human readable name
    pub name: String,

    /// Number of pages in the document
    pub page_count: usize,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,

    /// Free-form key/value metadata (author, subject, ...)
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

/// In-memory document: a storage location plus its metadata
#[derive(Debug)]
pub struct DocumentProxy {
    id: Uuid,
    persistence_path: PathBuf,
    metadata: RwLock<DocumentMetadata>,
    modified: AtomicBool,
}

impl DocumentProxy {
    /// Create a new document stored under `persistence_path`
    pub fn new(name: impl Into<String>, persistence_path: impl Into<PathBuf>) -> Self {
        let id = Uuid::new_v4();
        let now = Utc::now();

        Self {
            id,
            persistence_path: persistence_path.into(),
            metadata: RwLock::new(DocumentMetadata {
                id,
                name: name.into(),
                page_count: 0,
                created_at: now,
                updated_at: now,
                extra: BTreeMap::new(),
            }),
            modified: AtomicBool::new(false),
        }
    }

    /// Create a new document and wrap it in a handle
    pub fn new_handle(
        name: impl Into<String>,
        persistence_path: impl Into<PathBuf>,
    ) -> DocumentHandle {
        Arc::new(Self::new(name, persistence_path))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Directory the document's pages and metadata are written to
    pub fn persistence_path(&self) -> &Path {
        &self.persistence_path
    }

    pub fn name(&self) -> String {
        self.metadata.read().name.clone()
    }

    /// Current metadata state
    pub fn metadata(&self) -> DocumentMetadata {
        self.metadata.read().clone()
    }

    pub fn set_page_count(&self, page_count: usize) {
        self.update_metadata(|metadata| metadata.page_count = page_count);
    }

    /// Set a free-form metadata entry
    pub fn set_metadata_value(&self, key: impl Into<String>, value: impl Into<String>) {
        let (key, value) = (key.into(), value.into());
        self.update_metadata(|metadata| {
            metadata.extra.insert(key, value);
        });
    }

    fn update_metadata(&self, update: impl FnOnce(&mut DocumentMetadata)) {
        let mut metadata = self.metadata.write();
        update(&mut metadata);
        metadata.updated_at = Utc::now();
        self.modified.store(true, Ordering::Release);
    }

    pub fn is_modified(&self) -> bool {
        self.modified.load(Ordering::Acquire)
    }

    pub fn set_modified(&self, modified: bool) {
        self.modified.store(modified, Ordering::Release);
    }
}

/// Kind of graphical item on a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SceneItemKind {
    /// Freehand stroke
    Stroke { points: Vec<(f64, f64)>, width: f64 },
    /// Text block
    Text { position: (f64, f64), content: String },
    /// Embedded image referenced by path
    Image { position: (f64, f64), source: PathBuf },
}

/// A single item on a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneItem {
    pub id: Uuid,
    /// Stacking order, higher is drawn later
    pub z: i32,
    #[serde(flatten)]
    pub kind: SceneItemKind,
}

impl SceneItem {
    pub fn new(z: i32, kind: SceneItemKind) -> Self {
        Self { id: Uuid::new_v4(), z, kind }
    }
}

/// Serializable state of a scene at the moment it is captured
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub id: Uuid,
    pub captured_at: DateTime<Utc>,
    pub items: Vec<SceneItem>,
}

/// Live model of one page
#[derive(Debug)]
pub struct Scene {
    id: Uuid,
    items: RwLock<Vec<SceneItem>>,
    modified: AtomicBool,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            items: RwLock::new(Vec::new()),
            modified: AtomicBool::new(false),
        }
    }

    /// Create an empty scene and wrap it in a handle
    pub fn new_handle() -> SceneHandle {
        Arc::new(Self::new())
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Add an item and mark the page modified
    pub fn add_item(&self, item: SceneItem) {
        self.items.write().push(item);
        self.modified.store(true, Ordering::Release);
    }

    /// Remove every item and mark the page modified
    pub fn clear(&self) {
        self.items.write().clear();
        self.modified.store(true, Ordering::Release);
    }

    pub fn item_count(&self) -> usize {
        self.items.read().len()
    }

    /// Capture the current items, ordered by z
    pub fn snapshot(&self) -> SceneSnapshot {
        let mut items = self.items.read().clone();
        items.sort_by_key(|item| item.z);

        SceneSnapshot { id: self.id, captured_at: Utc::now(), items }
    }

    pub fn is_modified(&self) -> bool {
        self.modified.load(Ordering::Acquire)
    }

    pub fn set_modified(&self, modified: bool) {
        self.modified.store(modified, Ordering::Release);
    }
}
