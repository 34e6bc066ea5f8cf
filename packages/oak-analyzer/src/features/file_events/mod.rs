//! File change events consumed by the analysis session
//!
//! Watching itself lives in the editor layer; it hands over created,
//! modified and deleted paths through [`FileEventHandler`].

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::errors::Result;
use crate::shared::models::DiagnosticsMap;
use crate::shared::utils::normalize_path;

/// Extensions whose changes can affect an analysis
pub const WATCHED_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "json", "xml"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "path", rename_all = "lowercase")]
pub enum FileChangeEvent {
    Created(PathBuf),
    Modified(PathBuf),
    Deleted(PathBuf),
}

impl FileChangeEvent {
    pub fn created(path: impl AsRef<Path>) -> Self {
        FileChangeEvent::Created(normalize_path(path))
    }

    pub fn modified(path: impl AsRef<Path>) -> Self {
        FileChangeEvent::Modified(normalize_path(path))
    }

    pub fn deleted(path: impl AsRef<Path>) -> Self {
        FileChangeEvent::Deleted(normalize_path(path))
    }

    pub fn path(&self) -> &Path {
        match self {
            FileChangeEvent::Created(p)
            | FileChangeEvent::Modified(p)
            | FileChangeEvent::Deleted(p) => p,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            FileChangeEvent::Created(_) => "created",
            FileChangeEvent::Modified(_) => "modified",
            FileChangeEvent::Deleted(_) => "deleted",
        }
    }

    pub fn is_deletion(&self) -> bool {
        matches!(self, FileChangeEvent::Deleted(_))
    }

    /// Whether the path has a watched extension. Extensionless paths count
    /// too: a deleted directory arrives without one.
    pub fn is_relevant(&self) -> bool {
        match self.path().extension().and_then(|e| e.to_str()) {
            Some(ext) => WATCHED_EXTENSIONS.contains(&ext),
            None => self.is_deletion(),
        }
    }
}

/// Receiver of file change events
pub trait FileEventHandler {
    /// Apply one change; returns the diagnostics to publish for it
    fn handle_event(&mut self, event: FileChangeEvent) -> Result<DiagnosticsMap>;

    /// Called when the watcher itself fails
    fn handle_error(&mut self, error: String) {
        tracing::warn!("file watcher error: {}", error);
    }
}
