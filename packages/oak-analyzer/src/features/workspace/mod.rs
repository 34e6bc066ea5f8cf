//! Workspace - shared, lazily populated source cache
//!
//! Every resolver in a session goes through one [`Workspace`]: a file is parsed
//! once, cached by normalized path and shared as `Arc<SourceUnit>` by the
//! trigger index, the checker index and any ad-hoc lookup. An edit replaces
//! exactly one cache entry ([`Workspace::refresh`]); every other unit keeps
//! being served from the cache.

mod loader;
mod program;

pub use loader::UnitLoader;
pub use program::Program;

use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::Result;
use crate::features::parsing::SourceUnit;
use crate::shared::utils::normalize_path;

#[derive(Debug, Default)]
pub struct Workspace {
    units: DashMap<PathBuf, Arc<SourceUnit>>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached unit for `path`, parsing it on first use
    pub fn load(&self, path: &Path) -> Result<Arc<SourceUnit>> {
        let path = normalize_path(path);
        if let Some(unit) = self.units.get(&path) {
            return Ok(Arc::clone(unit.value()));
        }
        let unit = Arc::new(SourceUnit::read(&path)?);
        tracing::trace!("workspace parsed {}", path.display());
        self.units.insert(path, Arc::clone(&unit));
        Ok(unit)
    }

    /// Re-read and re-parse one file, replacing its cache entry
    pub fn refresh(&self, path: &Path) -> Result<Arc<SourceUnit>> {
        let path = normalize_path(path);
        match SourceUnit::read(&path) {
            Ok(unit) => Ok(self.insert(unit)),
            Err(err) => {
                self.units.remove(&path);
                Err(err)
            }
        }
    }

    /// Install an already parsed unit under its own path
    pub fn insert(&self, unit: SourceUnit) -> Arc<SourceUnit> {
        let unit = Arc::new(unit);
        self.units
            .insert(unit.path().to_path_buf(), Arc::clone(&unit));
        unit
    }

    /// Cached unit without touching the disk
    pub fn get(&self, path: &Path) -> Option<Arc<SourceUnit>> {
        let path = normalize_path(path);
        self.units.get(&path).map(|unit| Arc::clone(unit.value()))
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.units.contains_key(&normalize_path(path))
    }

    pub fn evict(&self, path: &Path) -> bool {
        self.units.remove(&normalize_path(path)).is_some()
    }

    pub fn evict_all<'a>(&self, paths: impl IntoIterator<Item = &'a Path>) {
        for path in paths {
            self.evict(path);
        }
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_is_cached_until_refresh() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.ts");
        fs::write(&file, "export const a = 1;").unwrap();

        let workspace = Workspace::new();
        let first = workspace.load(&file).unwrap();
        fs::write(&file, "export const a = 2;").unwrap();
        let cached = workspace.load(&file).unwrap();
        assert!(Arc::ptr_eq(&first, &cached));

        let refreshed = workspace.refresh(&file).unwrap();
        assert!(!Arc::ptr_eq(&first, &refreshed));
        assert!(refreshed.text().contains('2'));
        assert_eq!(workspace.len(), 1);
    }

    #[test]
    fn test_refresh_of_deleted_file_evicts() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("gone.ts");
        fs::write(&file, "export {};").unwrap();

        let workspace = Workspace::new();
        workspace.load(&file).unwrap();
        fs::remove_file(&file).unwrap();
        assert!(workspace.refresh(&file).is_err());
        assert!(!workspace.contains(&file));
    }
}
