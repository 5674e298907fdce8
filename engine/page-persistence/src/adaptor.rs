//! Adaptors that turn live models into their stored form
//!
//! The worker only knows the two traits below. [`JsonSceneAdaptor`] and
//! [`JsonMetadataAdaptor`] store a document as a directory of JSON files:
//!
//! ```text
//! <document dir>/
//!     metadata.json
//!     page-000.json
//!     page-001.json
//! ```

use crate::config::StorageConfig;
use crate::document::{DocumentProxy, Scene};
use crate::error::Result;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// File name of a document's metadata
pub const METADATA_FILE_NAME: &str = "metadata.json";

/// Writes one page of a document to storage
pub trait SceneAdaptor: Send {
    fn persist_scene(
        &mut self,
        document: &DocumentProxy,
        scene: &Scene,
        page_index: usize,
    ) -> Result<()>;
}

/// Writes a document's metadata to storage
pub trait MetadataAdaptor: Send {
    fn persist_metadata(&mut self, document: &DocumentProxy) -> Result<()>;
}

/// [`SceneAdaptor`] backed by a closure
pub struct FnSceneAdaptor<F>(F);

/// Wrap a closure as a [`SceneAdaptor`]
pub fn scene_adaptor_fn<F>(persist: F) -> FnSceneAdaptor<F>
where
    F: FnMut(&DocumentProxy, &Scene, usize) -> Result<()> + Send,
{
    FnSceneAdaptor(persist)
}

impl<F> SceneAdaptor for FnSceneAdaptor<F>
where
    F: FnMut(&DocumentProxy, &Scene, usize) -> Result<()> + Send,
{
    fn persist_scene(
        &mut self,
        document: &DocumentProxy,
        scene: &Scene,
        page_index: usize,
    ) -> Result<()> {
        (self.0)(document, scene, page_index)
    }
}

/// [`MetadataAdaptor`] backed by a closure
pub struct FnMetadataAdaptor<F>(F);

/// Wrap a closure as a [`MetadataAdaptor`]
pub fn metadata_adaptor_fn<F>(persist: F) -> FnMetadataAdaptor<F>
where
    F: FnMut(&DocumentProxy) -> Result<()> + Send,
{
    FnMetadataAdaptor(persist)
}

impl<F> MetadataAdaptor for FnMetadataAdaptor<F>
where
    F: FnMut(&DocumentProxy) -> Result<()> + Send,
{
    fn persist_metadata(&mut self, document: &DocumentProxy) -> Result<()> {
        (self.0)(document)
    }
}

/// Path of the file holding page `page_index`
pub fn page_file_path(document_dir: &Path, page_index: usize) -> PathBuf {
    document_dir.join(format!("page-{page_index:03}.json"))
}

/// Path of the file holding the document's metadata
pub fn metadata_file_path(document_dir: &Path) -> PathBuf {
    document_dir.join(METADATA_FILE_NAME)
}

/// Stores each page as `page-NNN.json` in the document directory
#[derive(Debug, Clone, Default)]
pub struct JsonSceneAdaptor {
    storage: StorageConfig,
}

impl JsonSceneAdaptor {
    pub fn new(storage: StorageConfig) -> Self {
        Self { storage }
    }
}

impl SceneAdaptor for JsonSceneAdaptor {
    fn persist_scene(
        &mut self,
        document: &DocumentProxy,
        scene: &Scene,
        page_index: usize,
    ) -> Result<()> {
        // Cleared before capture so edits racing with the write re-mark the page
        scene.set_modified(false);
        let snapshot = scene.snapshot();
        let path = page_file_path(document.persistence_path(), page_index);

        if let Err(e) = write_json_atomically(&path, &snapshot, &self.storage) {
            scene.set_modified(true);
            return Err(e);
        }

        tracing::trace!(path = ?path, items = snapshot.items.len(), "Scene written");
        Ok(())
    }
}

/// Stores document metadata as `metadata.json` in the document directory
#[derive(Debug, Clone, Default)]
pub struct JsonMetadataAdaptor {
    storage: StorageConfig,
}

impl JsonMetadataAdaptor {
    pub fn new(storage: StorageConfig) -> Self {
        Self { storage }
    }
}

impl MetadataAdaptor for JsonMetadataAdaptor {
    fn persist_metadata(&mut self, document: &DocumentProxy) -> Result<()> {
        document.set_modified(false);
        let metadata = document.metadata();
        let path = metadata_file_path(document.persistence_path());

        if let Err(e) = write_json_atomically(&path, &metadata, &self.storage) {
            document.set_modified(true);
            return Err(e);
        }

        tracing::trace!(path = ?path, "Metadata written");
        Ok(())
    }
}

/// Write `value` to a temporary sibling of `path`, then rename it into place
fn write_json_atomically<T: Serialize>(
    path: &Path,
    value: &T,
    storage: &StorageConfig,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let bytes = if storage.pretty_json {
        serde_json::to_vec_pretty(value)?
    } else {
        serde_json::to_vec(value)?
    };

    let tmp_path = path.with_extension("json.tmp");
    {
        let mut file = File::create(&tmp_path)?;
        file.write_all(&bytes)?;

        if storage.fsync_every_write {
            file.sync_all()?;
        }
    }

    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentMetadata, SceneItem, SceneItemKind, SceneSnapshot};
    use tempfile::TempDir;

    #[test]
    fn test_page_file_names_are_zero_padded() {
        let dir = Path::new("/docs/a");
        assert_eq!(page_file_path(dir, 0), PathBuf::from("/docs/a/page-000.json"));
        assert_eq!(page_file_path(dir, 42), PathBuf::from("/docs/a/page-042.json"));
        assert_eq!(page_file_path(dir, 1234), PathBuf::from("/docs/a/page-1234.json"));
        assert_eq!(metadata_file_path(dir), PathBuf::from("/docs/a/metadata.json"));
    }

    #[test]
    fn test_json_scene_adaptor_writes_page() {
        let temp_dir = TempDir::new().unwrap();
        let document = DocumentProxy::new("doc", temp_dir.path().join("doc"));
        let scene = Scene::new();
        scene.add_item(SceneItem::new(
            0,
            SceneItemKind::Text { position: (1.0, 2.0), content: "hello".to_string() },
        ));

        let mut adaptor = JsonSceneAdaptor::new(StorageConfig::default());
        adaptor.persist_scene(&document, &scene, 2).unwrap();

        let path = page_file_path(document.persistence_path(), 2);
        let stored: SceneSnapshot =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(stored.id, scene.id());
        assert_eq!(stored.items, scene.snapshot().items);
        assert!(!scene.is_modified());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_json_metadata_adaptor_writes_metadata() {
        let temp_dir = TempDir::new().unwrap();
        let document = DocumentProxy::new("Geometry", temp_dir.path());
        document.set_page_count(5);
        document.set_metadata_value("subject", "math");

        let storage = StorageConfig { pretty_json: false, fsync_every_write: true };
        let mut adaptor = JsonMetadataAdaptor::new(storage);
        adaptor.persist_metadata(&document).unwrap();

        let stored: DocumentMetadata = serde_json::from_slice(
            &fs::read(metadata_file_path(temp_dir.path())).unwrap(),
        )
        .unwrap();
        assert_eq!(stored, document.metadata());
        assert!(!document.is_modified());
    }

    #[test]
    fn test_failed_write_keeps_scene_modified() {
        let temp_dir = TempDir::new().unwrap();
        // A regular file where the document directory should be
        let blocker = temp_dir.path().join("not-a-dir");
        fs::write(&blocker, b"x").unwrap();

        let document = DocumentProxy::new("doc", &blocker);
        let scene = Scene::new();
        scene.add_item(SceneItem::new(0, SceneItemKind::Stroke { points: vec![], width: 1.0 }));

        let mut adaptor = JsonSceneAdaptor::default();
        assert!(adaptor.persist_scene(&document, &scene, 0).is_err());
        assert!(scene.is_modified());
    }

    #[test]
    fn test_closure_adaptors() {
        let mut pages = Vec::new();
        {
            let mut adaptor = scene_adaptor_fn(|_: &DocumentProxy, _: &Scene, index: usize| {
                pages.push(index);
                Ok(())
            });
            let document = DocumentProxy::new("doc", "/tmp/doc");
            let scene = Scene::new();
            adaptor.persist_scene(&document, &scene, 7).unwrap();
        }
        assert_eq!(pages, vec![7]);

        let mut adaptor = metadata_adaptor_fn(|_: &DocumentProxy| {
            Err(crate::error::PersistenceError::adaptor("read-only"))
        });
        assert!(adaptor.persist_metadata(&DocumentProxy::new("doc", "/tmp/doc")).is_err());
    }
}
