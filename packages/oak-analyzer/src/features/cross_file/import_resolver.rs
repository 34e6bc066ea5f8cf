//! Import Resolver
//!
//! Follows an identifier to the expression that gives it its value, crossing
//! file boundaries through relative imports and re-export chains. Every file
//! entered on the way is recorded with the [`ImportBindingMeta`] it was
//! entered through; the program index keeps those records to re-run a scoped
//! aggregation when one file changes.
//!
//! Records go to one of two tables. Files entered while walking definition
//! lists land in [`BindingTable::Definitions`]; files entered while folding a
//! field value (`entity: ENTITY`) land in [`BindingTable::Values`]. A scoped
//! re-run from a value file yields nothing, so the index rebuilds instead.
//!
//! Only relative specifiers are followed. Package imports resolve to
//! [`Resolution::Unresolved`].

use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tree_sitter::Node;

use super::scope::{self, Binding};
use super::types::{BindingRecords, ExportedValue, ImportBindingMeta, Resolution};
use crate::features::parsing::{
    node_kinds, DefaultExport, ExportEntry, ImportEntry, ImportedName, NodeRef, SourceUnit,
};
use crate::features::workspace::UnitLoader;
use crate::shared::utils::normalize_path;

/// Suffixes tried, in order, for an extensionless relative specifier
const SPECIFIER_CANDIDATES: &[&str] = &[".ts", ".tsx", "/index.ts", "/index.tsx"];

/// Which binding table new records go to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingTable {
    Definitions,
    Values,
}

pub struct ImportResolver<'l> {
    loader: &'l mut dyn UnitLoader,
    bindings: BindingRecords,
    value_bindings: BindingRecords,
    recording: BindingTable,
}

impl<'l> ImportResolver<'l> {
    pub fn new(loader: &'l mut dyn UnitLoader) -> Self {
        Self {
            loader,
            bindings: BindingRecords::default(),
            value_bindings: BindingRecords::default(),
            recording: BindingTable::Definitions,
        }
    }

    /// Send subsequent records to `table`, returning the previous target
    pub fn record_into(&mut self, table: BindingTable) -> BindingTable {
        std::mem::replace(&mut self.recording, table)
    }

    /// Resolve identifier node `ident` of `unit`
    pub fn resolve_identifier(&mut self, unit: &SourceUnit, ident: Node) -> Resolution {
        match scope::lookup(unit, ident) {
            Some(Binding::Declaration(decl)) => {
                if decl.kind() != node_kinds::VARIABLE_DECLARATOR {
                    return Resolution::Unresolved;
                }
                match decl.child_by_field_name("value") {
                    Some(value) => Resolution::Local(NodeRef::new(&value)),
                    None => Resolution::Unresolved,
                }
            }
            Some(Binding::Import(entry)) => self.resolve_import(unit.path(), entry),
            Some(Binding::Parameter) | None => Resolution::Unresolved,
        }
    }

    /// Resolve what an import statement binds
    pub fn resolve_import(&mut self, from: &Path, entry: &ImportEntry) -> Resolution {
        let Some(target) = resolve_module_path(from, &entry.specifier) else {
            tracing::trace!("import '{}' is a package import, not followed", entry.specifier);
            return Resolution::Unresolved;
        };
        self.loader.record_edge(from, &target);

        let Some(meta) = ImportBindingMeta::for_import(entry) else {
            debug_assert_eq!(entry.imported, ImportedName::Namespace);
            return Resolution::Namespace(target);
        };
        let Some(unit) = self.load(&target) else {
            return Resolution::Unresolved;
        };
        match self.find_export(unit, meta) {
            Some(exported) => Resolution::Exported(exported),
            None => Resolution::Unresolved,
        }
    }

    /// `ns.member` where `ns` is a namespace import of `target`
    pub fn resolve_namespace_member(
        &mut self,
        target: &Path,
        member: &str,
    ) -> Option<ExportedValue> {
        let unit = self.load(target)?;
        self.find_export(unit, ImportBindingMeta::named(member))
    }

    /// Locate the value exported from `unit` under `meta`, recording the
    /// binding for `unit` and for every file a re-export chain passes through
    pub fn find_export(
        &mut self,
        unit: Arc<SourceUnit>,
        meta: ImportBindingMeta,
    ) -> Option<ExportedValue> {
        let mut chain = FxHashSet::default();
        self.find_export_in(unit, meta, &mut chain)
    }

    /// Record a binding without resolving anything (program entry files)
    pub fn record_binding(&mut self, path: &Path, meta: ImportBindingMeta) {
        let table = match self.recording {
            BindingTable::Definitions => &mut self.bindings,
            BindingTable::Values => &mut self.value_bindings,
        };
        let metas = table.entry(normalize_path(path)).or_default();
        if !metas.contains(&meta) {
            metas.push(meta);
        }
    }

    pub fn bindings(&self) -> &BindingRecords {
        &self.bindings
    }

    pub fn take_bindings(&mut self) -> BindingRecords {
        std::mem::take(&mut self.bindings)
    }

    pub fn take_value_bindings(&mut self) -> BindingRecords {
        std::mem::take(&mut self.value_bindings)
    }

    fn find_export_in(
        &mut self,
        unit: Arc<SourceUnit>,
        meta: ImportBindingMeta,
        chain: &mut FxHashSet<(PathBuf, String)>,
    ) -> Option<ExportedValue> {
        let name = meta.export_name().to_string();
        if !chain.insert((unit.path().to_path_buf(), name.clone())) {
            tracing::debug!("re-export cycle through {} ('{}')", unit.path().display(), name);
            return None;
        }
        self.record_binding(unit.path(), meta.clone());

        if meta.is_default {
            match unit.symbols().default_export() {
                Some(DefaultExport::Expression(value)) => {
                    return Some(ExportedValue { unit, value })
                }
                Some(DefaultExport::Declaration(_)) => return None,
                // `export { x as default }` lands in the export table
                None => {}
            }
        }

        match unit.symbols().export(&name).cloned() {
            Some(ExportEntry::Local { local }) => self.local_value(unit, &local, chain),
            Some(ExportEntry::ReExport { specifier, imported }) => {
                let target = self.follow(unit.path(), &specifier)?;
                let next = ImportBindingMeta {
                    is_default: imported == "default",
                    import_name: imported,
                    identifier: name,
                };
                self.find_export_in(target, next, chain)
            }
            Some(ExportEntry::Namespace { .. }) => None,
            None if name == "default" => None,
            None => {
                for specifier in unit.symbols().star_exports().to_vec() {
                    let Some(target) = self.follow(unit.path(), &specifier) else {
                        continue;
                    };
                    if let Some(found) = self.find_export_in(target, meta.clone(), chain) {
                        return Some(found);
                    }
                }
                None
            }
        }
    }

    /// Value of a module-level name that is exported from `unit`
    fn local_value(
        &mut self,
        unit: Arc<SourceUnit>,
        local: &str,
        chain: &mut FxHashSet<(PathBuf, String)>,
    ) -> Option<ExportedValue> {
        if let Some(decl) = unit.symbols().declaration(local) {
            let value = {
                let node = unit.resolve(decl)?;
                if node.kind() != node_kinds::VARIABLE_DECLARATOR {
                    return None;
                }
                NodeRef::new(&node.child_by_field_name("value")?)
            };
            return Some(ExportedValue { unit, value });
        }

        // `import { x } from './y'; export { x };`
        let entry = unit.symbols().import(local)?.clone();
        let meta = ImportBindingMeta::for_import(&entry)?;
        let target = self.follow(unit.path(), &entry.specifier)?;
        self.find_export_in(target, meta, chain)
    }

    fn follow(&mut self, from: &Path, specifier: &str) -> Option<Arc<SourceUnit>> {
        let target = resolve_module_path(from, specifier)?;
        self.loader.record_edge(from, &target);
        self.load(&target)
    }

    fn load(&mut self, path: &Path) -> Option<Arc<SourceUnit>> {
        match self.loader.load_unit(path) {
            Ok(unit) => Some(unit),
            Err(err) => {
                tracing::warn!("cannot follow import into {}: {}", path.display(), err);
                None
            }
        }
    }
}

/// Map a relative module specifier to a file path.
///
/// Returns `None` for package specifiers. When no candidate exists on disk
/// the `.ts` form is returned so that the failure surfaces as a load error
/// naming the expected file.
pub fn resolve_module_path(from: &Path, specifier: &str) -> Option<PathBuf> {
    let relative = specifier.starts_with("./")
        || specifier.starts_with("../")
        || specifier == "."
        || specifier == "..";
    if !relative {
        return None;
    }
    let base = normalize_path(from.parent()?.join(specifier));

    match base.extension().and_then(|e| e.to_str()) {
        Some("ts") | Some("tsx") if base.is_file() => return Some(base),
        // ESM-style `./a.js` pointing at `a.ts`
        Some("js") => {
            let ts = base.with_extension("ts");
            if ts.is_file() {
                return Some(ts);
            }
        }
        _ => {}
    }

    let raw = base.to_string_lossy();
    for suffix in SPECIFIER_CANDIDATES {
        let candidate = PathBuf::from(format!("{}{}", raw, suffix));
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    Some(PathBuf::from(format!("{}.ts", raw)))
}
