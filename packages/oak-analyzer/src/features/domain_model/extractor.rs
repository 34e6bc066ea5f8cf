//! Domain model extraction
//!
//! Reads the generated schema registry (`Storage.ts`), follows each entity's
//! `desc` import to its description module, folds the exported `desc` object
//! and adds the projection fields of the sibling `Schema.ts` and the locale
//! files of the sibling `locales/` directory.
//!
//! One failing entity is logged and left out; only a missing or unusable
//! registry fails the whole scan.

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tree_sitter::Node;

use super::entity::{EntityDescriptor, EntityDict};
use super::schema::projection_fields;
use crate::config::ProjectLayout;
use crate::errors::DomainError;
use crate::features::cross_file::{resolve_module_path, ImportBindingMeta, ImportResolver};
use crate::features::literal_eval::evaluate;
use crate::features::parsing::{node_kinds, ImportedName, SourceUnit};
use crate::features::workspace::Workspace;
use crate::shared::utils::normalize_path;
use crate::shared::utils::tree_sitter::{
    find_children_by_kind, named_children, node_text, property_key_name, unwrap_expression,
};

/// Export name of an entity's description object
pub const DESC_SYMBOL: &str = "desc";

/// `<entity>: <desc import>` pair of the registry object
#[derive(Debug, Clone, PartialEq, Eq)]
struct RegistryEntry {
    entity: String,
    specifier: String,
}

pub struct DomainExtractor {
    layout: ProjectLayout,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when a scan ends, however it ends
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl DomainExtractor {
    pub fn new(layout: ProjectLayout) -> Self {
        Self {
            layout,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Scan the domain of the project at `root`.
    ///
    /// A call made while another scan runs fails with
    /// [`DomainError::InProgress`].
    pub fn analyze(&self, root: &Path) -> Result<EntityDict, DomainError> {
        let _guard = self.begin()?;
        let started = Instant::now();

        let registry_path = normalize_path(self.layout.registry_path(root));
        if !registry_path.is_file() {
            tracing::warn!("schema registry {} not found", registry_path.display());
            return Err(DomainError::RegistryMissing(registry_path));
        }

        let workspace = Workspace::new();
        let registry = workspace
            .load(&registry_path)
            .map_err(|err| DomainError::RegistryInvalid {
                path: registry_path.clone(),
                reason: err.to_string(),
            })?;
        let entries = registry_entries(&registry, &self.layout.registry_export).ok_or_else(|| {
            DomainError::RegistryInvalid {
                path: registry_path.clone(),
                reason: format!("no '{}' object literal", self.layout.registry_export),
            }
        })?;

        let dict: EntityDict = entries
            .par_iter()
            .filter_map(|entry| {
                self.extract_entity(&workspace, &registry_path, entry)
                    .map(|descriptor| (descriptor.name.clone(), descriptor))
            })
            .collect();

        tracing::info!(
            "domain scan: {}/{} entities in {:?}",
            dict.len(),
            entries.len(),
            started.elapsed()
        );
        Ok(dict)
    }

    fn begin(&self) -> Result<InFlight<'_>, DomainError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| DomainError::InProgress)?;
        Ok(InFlight(&self.in_flight))
    }

    fn extract_entity(
        &self,
        workspace: &Workspace,
        registry_path: &Path,
        entry: &RegistryEntry,
    ) -> Option<EntityDescriptor> {
        let name = &entry.entity;
        let Some(path) = resolve_module_path(registry_path, &entry.specifier) else {
            tracing::warn!("entity {}: '{}' is not a relative import", name, entry.specifier);
            return None;
        };
        let unit = match workspace.load(&path) {
            Ok(unit) => unit,
            Err(err) => {
                tracing::warn!("entity {}: {}", name, err);
                return None;
            }
        };
        if unit.has_errors() {
            tracing::warn!("entity {}: {} has syntax errors", name, path.display());
            return None;
        }

        let mut loader = workspace;
        let mut resolver = ImportResolver::new(&mut loader);
        let exported =
            resolver.find_export(Arc::clone(&unit), ImportBindingMeta::named(DESC_SYMBOL));
        let Some(exported) = exported else {
            tracing::warn!("entity {}: {} exports no '{}'", name, path.display(), DESC_SYMBOL);
            return None;
        };
        let folded = exported
            .unit
            .resolve(exported.value)
            .and_then(|node| evaluate(&exported.unit, node, &mut resolver));
        let Some(Value::Object(storage_desc)) = folded else {
            tracing::warn!("entity {}: description is not a foldable object", name);
            return None;
        };

        let mut descriptor = EntityDescriptor::new(name.clone(), storage_desc);
        if let Some(dir) = path.parent() {
            descriptor.projection_list = self.read_projection(workspace, dir, name);
            descriptor.locales = read_locales(&dir.join(&self.layout.locales_dir));
        }
        Some(descriptor)
    }

    fn read_projection(&self, workspace: &Workspace, dir: &Path, entity: &str) -> Vec<String> {
        let schema_path = dir.join(&self.layout.schema_file);
        if !schema_path.is_file() {
            tracing::debug!("entity {}: no {}", entity, self.layout.schema_file);
            return Vec::new();
        }
        match workspace.load(&schema_path) {
            Ok(unit) => projection_fields(&unit, &self.layout.projection_type).unwrap_or_else(|| {
                tracing::debug!(
                    "entity {}: no object '{}' in {}",
                    entity,
                    self.layout.projection_type,
                    schema_path.display()
                );
                Vec::new()
            }),
            Err(err) => {
                tracing::warn!("entity {}: {}", entity, err);
                Vec::new()
            }
        }
    }
}

impl std::fmt::Debug for DomainExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainExtractor")
            .field("registry", &self.layout.registry_file)
            .field("running", &self.is_running())
            .finish()
    }
}

/// Entity -> desc import pairs of the registry object.
///
/// The object is the declarator named `export_name`, or else the first
/// top-level object literal declarator. Entries whose value is not a `desc`
/// import are skipped.
fn registry_entries(unit: &SourceUnit, export_name: &str) -> Option<Vec<RegistryEntry>> {
    let source = unit.text();
    let desc_imports: FxHashMap<&str, &str> = unit
        .symbols()
        .imports()
        .filter(|import| import.imported == ImportedName::Named(DESC_SYMBOL.to_string()))
        .map(|import| (import.local.as_str(), import.specifier.as_str()))
        .collect();

    let object = unit
        .symbols()
        .declaration(export_name)
        .and_then(|decl| unit.resolve(decl))
        .and_then(object_initializer)
        .or_else(|| top_level_declarators(unit.root()).into_iter().find_map(object_initializer))?;

    let mut entries = Vec::new();
    for member in named_children(object) {
        let (entity, local) = match member.kind() {
            node_kinds::PAIR => {
                let key = member
                    .child_by_field_name("key")
                    .and_then(|k| property_key_name(k, source));
                let value = member.child_by_field_name("value").map(unwrap_expression);
                match (key, value) {
                    (Some(key), Some(value)) if value.kind() == node_kinds::IDENTIFIER => {
                        (key, node_text(&value, source))
                    }
                    _ => continue,
                }
            }
            node_kinds::SHORTHAND_PROPERTY_IDENTIFIER => {
                let local = node_text(&member, source);
                (local.to_string(), local)
            }
            _ => continue,
        };
        match desc_imports.get(local) {
            Some(specifier) => entries.push(RegistryEntry {
                entity,
                specifier: specifier.to_string(),
            }),
            None => tracing::debug!("registry entry {} is not a '{}' import", entity, DESC_SYMBOL),
        }
    }
    Some(entries)
}

fn object_initializer(declarator: Node) -> Option<Node> {
    let value = unwrap_expression(declarator.child_by_field_name("value")?);
    (value.kind() == node_kinds::OBJECT).then_some(value)
}

fn top_level_declarators(root: Node) -> Vec<Node> {
    let mut declarators = Vec::new();
    for statement in named_children(root) {
        let declaration = if statement.kind() == node_kinds::EXPORT_STATEMENT {
            match statement.child_by_field_name("declaration") {
                Some(decl) => decl,
                None => continue,
            }
        } else {
            statement
        };
        if matches!(
            declaration.kind(),
            node_kinds::LEXICAL_DECLARATION | node_kinds::VARIABLE_DECLARATION
        ) {
            declarators.extend(find_children_by_kind(declaration, node_kinds::VARIABLE_DECLARATOR));
        }
    }
    declarators
}

/// `<lang>.json` files of a locale directory, keyed by file stem
fn read_locales(dir: &Path) -> BTreeMap<String, Value> {
    let mut locales = BTreeMap::new();
    let Ok(listing) = std::fs::read_dir(dir) else {
        return locales;
    };
    let mut files: Vec<PathBuf> = listing
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();

    for file in files {
        let Some(lang) = file.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let parsed = std::fs::read_to_string(&file)
            .map_err(|err| err.to_string())
            .and_then(|text| serde_json::from_str::<Value>(&text).map_err(|err| err.to_string()));
        match parsed {
            Ok(value) => {
                locales.insert(lang.to_string(), value);
            }
            Err(reason) => tracing::warn!("locale {} skipped: {}", file.display(), reason),
        }
    }
    locales
}
