//! Units of persistence work

use crate::document::{DocumentHandle, SceneHandle};
use std::fmt;

/// One unit of persistence work, owned by the queue until the worker takes it
#[derive(Debug, Clone)]
pub enum Request {
    /// Write one page of a document
    SceneWrite { document: DocumentHandle, scene: SceneHandle, page_index: usize },

    /// Write a document's metadata
    MetadataWrite { document: DocumentHandle },
}

/// Which kind of write a request performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Scene,
    Metadata,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestKind::Scene => write!(f, "scene"),
            RequestKind::Metadata => write!(f, "metadata"),
        }
    }
}

impl Request {
    pub fn kind(&self) -> RequestKind {
        match self {
            Request::SceneWrite { .. } => RequestKind::Scene,
            Request::MetadataWrite { .. } => RequestKind::Metadata,
        }
    }

    pub fn document(&self) -> &DocumentHandle {
        match self {
            Request::SceneWrite { document, .. } | Request::MetadataWrite { document } => document,
        }
    }

    /// Page index for scene writes
    pub fn page_index(&self) -> Option<usize> {
        match self {
            Request::SceneWrite { page_index, .. } => Some(*page_index),
            Request::MetadataWrite { .. } => None,
        }
    }
}
