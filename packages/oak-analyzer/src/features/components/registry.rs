//! ComponentMap - entity name -> component descriptors
//!
//! Unlike the entity dictionary, the map is patched per component
//! directory: an edited entry file replaces its own descriptor, a deleted
//! directory drops every descriptor under it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::model::ComponentDescriptor;
use super::scanner::{is_entry_file, render_files, scan_components, scan_file};
use crate::shared::utils::{normalize_path, path_starts_with};

#[derive(Debug, Clone, Default)]
pub struct ComponentMap {
    by_entity: BTreeMap<String, Vec<ComponentDescriptor>>,
}

impl ComponentMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full scan of `dirs`
    pub fn scan(dirs: &[PathBuf]) -> Self {
        let mut map = Self::new();
        map.replace_all(scan_components(dirs));
        map
    }

    pub fn replace_all(&mut self, components: Vec<ComponentDescriptor>) {
        self.by_entity.clear();
        for component in components {
            self.insert(component);
        }
    }

    /// Insert `component`, replacing the descriptor of the same directory
    pub fn insert(&mut self, component: ComponentDescriptor) {
        self.remove_dir(&component.path);
        self.by_entity
            .entry(component.entity_name.clone())
            .or_default()
            .push(component);
    }

    /// React to a created or changed file.
    ///
    /// An entry file is re-parsed; any other file refreshes the render
    /// siblings of the component in its directory. Returns whether the map
    /// may have changed.
    pub fn rescan_file(&mut self, path: &Path) -> bool {
        let path = normalize_path(path);
        let Some(dir) = path.parent() else {
            return false;
        };
        if is_entry_file(&path) {
            let removed = self.remove_dir(dir);
            return match scan_file(&path) {
                Some(component) => {
                    self.insert(component);
                    true
                }
                None => removed,
            };
        }
        match self.find_dir_mut(dir) {
            Some(component) => {
                component.components = render_files(dir);
                true
            }
            None => false,
        }
    }

    /// Drop every descriptor whose directory starts with `prefix`
    pub fn remove_under(&mut self, prefix: &Path) -> usize {
        let mut removed = 0;
        for components in self.by_entity.values_mut() {
            let before = components.len();
            components.retain(|c| !path_starts_with(&c.path, prefix));
            removed += before - components.len();
        }
        self.by_entity.retain(|_, components| !components.is_empty());
        removed
    }

    /// React to a deleted file: a deleted entry file or directory removes
    /// its components, a deleted render file refreshes its component
    pub fn remove_file(&mut self, path: &Path) -> bool {
        let path = normalize_path(path);
        if is_entry_file(&path) {
            return path.parent().is_some_and(|dir| self.remove_dir(dir));
        }
        if self.remove_under(&path) > 0 {
            return true;
        }
        self.rescan_file(&path)
    }

    pub fn get(&self, entity: &str) -> &[ComponentDescriptor] {
        self.by_entity.get(entity).map_or(&[], Vec::as_slice)
    }

    pub fn by_dir(&self, dir: &Path) -> Option<&ComponentDescriptor> {
        let dir = normalize_path(dir);
        self.all().find(|c| c.path == dir)
    }

    pub fn all(&self) -> impl Iterator<Item = &ComponentDescriptor> {
        self.by_entity.values().flatten()
    }

    pub fn entities(&self) -> impl Iterator<Item = &str> {
        self.by_entity.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_entity.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_entity.is_empty()
    }

    fn remove_dir(&mut self, dir: &Path) -> bool {
        let mut removed = false;
        for components in self.by_entity.values_mut() {
            let before = components.len();
            components.retain(|c| c.path != dir);
            removed |= components.len() != before;
        }
        self.by_entity.retain(|_, components| !components.is_empty());
        removed
    }

    fn find_dir_mut(&mut self, dir: &Path) -> Option<&mut ComponentDescriptor> {
        self.by_entity.values_mut().flatten().find(|c| c.path == dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::components::Platform;
    use std::fs;
    use tempfile::TempDir;

    fn write_component(root: &Path, rel: &str, entity: &str) -> PathBuf {
        let dir = root.join(rel);
        fs::create_dir_all(&dir).unwrap();
        let index = dir.join("index.ts");
        fs::write(
            &index,
            format!("OakComponent({{ entity: '{}', isList: true }});", entity),
        )
        .unwrap();
        index
    }

    #[test]
    fn test_rescan_replaces_component_of_directory() {
        let dir = TempDir::new().unwrap();
        let index = write_component(dir.path(), "pages/a", "user");
        write_component(dir.path(), "pages/b", "user");
        let mut map = ComponentMap::scan(&[dir.path().join("pages")]);
        assert_eq!(map.get("user").len(), 2);

        fs::write(&index, "OakComponent({ entity: 'order' });").unwrap();
        assert!(map.rescan_file(&index));
        assert_eq!(map.get("user").len(), 1);
        assert_eq!(map.get("order").len(), 1);
        assert!(!map.get("order")[0].is_list);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_render_file_changes_refresh_siblings() {
        let dir = TempDir::new().unwrap();
        let index = write_component(dir.path(), "pages/a", "user");
        let mut map = ComponentMap::scan(&[dir.path().join("pages")]);
        let component_dir = index.parent().unwrap().to_path_buf();

        let web = component_dir.join("web.tsx");
        fs::write(&web, "").unwrap();
        assert!(map.rescan_file(&web));
        assert!(map.by_dir(&component_dir).unwrap().render_file(Platform::Web).is_some());

        fs::remove_file(&web).unwrap();
        assert!(map.remove_file(&web));
        assert!(map.by_dir(&component_dir).unwrap().components.is_empty());
    }

    #[test]
    fn test_remove_under_prefix() {
        let dir = TempDir::new().unwrap();
        write_component(dir.path(), "pages/user/list", "user");
        write_component(dir.path(), "pages/user/detail", "user");
        write_component(dir.path(), "pages/order/list", "order");
        let mut map = ComponentMap::scan(&[dir.path().join("pages")]);

        assert_eq!(map.remove_under(&dir.path().join("pages/user")), 2);
        assert!(map.get("user").is_empty());
        assert_eq!(map.entities().collect::<Vec<_>>(), vec!["order"]);
    }
}
