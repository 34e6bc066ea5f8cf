//! Module symbol table
//!
//! Collected once per [`SourceUnit`](super::SourceUnit) from the top level of
//! the program:
//! - Default imports: `import foo from './m'`
//! - Named imports (optionally aliased): `import { foo as bar } from './m'`
//! - Namespace imports: `import * as foo from './m'`
//! - Top-level declarations (`const`/`let`/`var`, functions, classes)
//! - Named exports, re-exports, star re-exports and the default export
//!
//! Type-only imports are skipped; they never carry runtime values.

use rustc_hash::FxHashMap;
use tree_sitter::Node;

use super::node_kinds;
use super::source_unit::NodeRef;
use crate::shared::utils::tree_sitter::{
    find_child_by_kind, find_children_by_kind, has_child_kind, named_children, node_text,
    string_value,
};

/// Name bound by an import, as seen from the exporting module
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportedName {
    Default,
    Named(String),
    Namespace,
}

#[derive(Debug, Clone)]
pub struct ImportEntry {
    /// Local binding name
    pub local: String,
    pub imported: ImportedName,
    /// Module specifier exactly as written
    pub specifier: String,
    /// The binding identifier inside the import statement
    pub binding: NodeRef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportEntry {
    /// `export const x`, `export { y as x }`
    Local { local: String },
    /// `export { y as x } from './m'`
    ReExport { specifier: String, imported: String },
    /// `export * as x from './m'`
    Namespace { specifier: String },
}

#[derive(Debug, Clone, Copy)]
pub enum DefaultExport {
    /// `export default <expr>`
    Expression(NodeRef),
    /// `export default function f() {}` / `export default class C {}`
    Declaration(NodeRef),
}

#[derive(Debug, Default)]
pub struct ModuleSymbols {
    imports: FxHashMap<String, ImportEntry>,
    declarations: FxHashMap<String, NodeRef>,
    exports: FxHashMap<String, ExportEntry>,
    star_exports: Vec<String>,
    default_export: Option<DefaultExport>,
}

impl ModuleSymbols {
    pub fn collect(root: Node, source: &str) -> Self {
        let mut symbols = ModuleSymbols::default();
        for statement in named_children(root) {
            match statement.kind() {
                node_kinds::IMPORT_STATEMENT => symbols.collect_import(statement, source),
                node_kinds::EXPORT_STATEMENT => symbols.collect_export(statement, source),
                _ => symbols.collect_declaration(statement, source, false),
            }
        }
        symbols
    }

    /// Import bound to `local`, if any
    pub fn import(&self, local: &str) -> Option<&ImportEntry> {
        self.imports.get(local)
    }

    pub fn imports(&self) -> impl Iterator<Item = &ImportEntry> {
        self.imports.values()
    }

    /// Top-level declaration node (`variable_declarator`, function or class)
    pub fn declaration(&self, name: &str) -> Option<NodeRef> {
        self.declarations.get(name).copied()
    }

    pub fn export(&self, name: &str) -> Option<&ExportEntry> {
        self.exports.get(name)
    }

    pub fn star_exports(&self) -> &[String] {
        &self.star_exports
    }

    pub fn default_export(&self) -> Option<DefaultExport> {
        self.default_export
    }

    fn collect_import(&mut self, node: Node, source: &str) {
        // `import type { X } from ...`
        if has_child_kind(node, node_kinds::TYPE) {
            return;
        }
        let Some(specifier) = node
            .child_by_field_name("source")
            .and_then(|s| string_value(s, source))
        else {
            return;
        };
        let Some(clause) = find_child_by_kind(node, node_kinds::IMPORT_CLAUSE) else {
            // Side-effect import
            return;
        };

        for part in named_children(clause) {
            match part.kind() {
                node_kinds::IDENTIFIER => {
                    self.add_import(part, source, ImportedName::Default, &specifier);
                }
                node_kinds::NAMESPACE_IMPORT => {
                    if let Some(ident) = find_child_by_kind(part, node_kinds::IDENTIFIER) {
                        self.add_import(ident, source, ImportedName::Namespace, &specifier);
                    }
                }
                node_kinds::NAMED_IMPORTS => {
                    for spec in find_children_by_kind(part, node_kinds::IMPORT_SPECIFIER) {
                        if has_child_kind(spec, node_kinds::TYPE) {
                            continue;
                        }
                        let Some(name) = spec.child_by_field_name("name") else {
                            continue;
                        };
                        let imported = module_export_name(name, source);
                        let local = spec.child_by_field_name("alias").unwrap_or(name);
                        self.add_import(local, source, ImportedName::Named(imported), &specifier);
                    }
                }
                _ => {}
            }
        }
    }

    fn add_import(&mut self, local: Node, source: &str, imported: ImportedName, specifier: &str) {
        let name = node_text(&local, source).to_string();
        self.imports.insert(
            name.clone(),
            ImportEntry {
                local: name,
                imported,
                specifier: specifier.to_string(),
                binding: NodeRef::new(&local),
            },
        );
    }

    fn collect_export(&mut self, node: Node, source: &str) {
        let specifier = node
            .child_by_field_name("source")
            .and_then(|s| string_value(s, source));

        if has_child_kind(node, node_kinds::DEFAULT) {
            if let Some(value) = node.child_by_field_name("value") {
                self.default_export = Some(DefaultExport::Expression(NodeRef::new(&value)));
            } else if let Some(decl) = node.child_by_field_name("declaration") {
                self.collect_declaration(decl, source, false);
                self.default_export = Some(DefaultExport::Declaration(NodeRef::new(&decl)));
            }
            return;
        }

        if let Some(decl) = node.child_by_field_name("declaration") {
            self.collect_declaration(decl, source, true);
            return;
        }

        if let Some(clause) = find_child_by_kind(node, node_kinds::EXPORT_CLAUSE) {
            for spec in find_children_by_kind(clause, node_kinds::EXPORT_SPECIFIER) {
                let Some(name) = spec.child_by_field_name("name") else {
                    continue;
                };
                let inner = module_export_name(name, source);
                let exported = spec
                    .child_by_field_name("alias")
                    .map(|a| module_export_name(a, source))
                    .unwrap_or_else(|| inner.clone());
                let entry = match &specifier {
                    Some(specifier) => ExportEntry::ReExport {
                        specifier: specifier.clone(),
                        imported: inner,
                    },
                    None => ExportEntry::Local { local: inner },
                };
                self.exports.insert(exported, entry);
            }
            return;
        }

        if let Some(specifier) = specifier {
            if let Some(ns) = find_child_by_kind(node, node_kinds::NAMESPACE_EXPORT) {
                if let Some(name) = ns.named_child(0) {
                    self.exports.insert(
                        module_export_name(name, source),
                        ExportEntry::Namespace { specifier },
                    );
                }
            } else if has_child_kind(node, node_kinds::STAR) {
                self.star_exports.push(specifier);
            }
        }
    }

    fn collect_declaration(&mut self, node: Node, source: &str, exported: bool) {
        match node.kind() {
            node_kinds::LEXICAL_DECLARATION | node_kinds::VARIABLE_DECLARATION => {
                for declarator in find_children_by_kind(node, node_kinds::VARIABLE_DECLARATOR) {
                    let Some(name) = declarator.child_by_field_name("name") else {
                        continue;
                    };
                    // Destructuring patterns do not bind a single value
                    if name.kind() != node_kinds::IDENTIFIER {
                        continue;
                    }
                    self.add_declaration(node_text(&name, source), &declarator, exported);
                }
            }
            node_kinds::FUNCTION_DECLARATION | node_kinds::CLASS_DECLARATION => {
                if let Some(name) = node.child_by_field_name("name") {
                    self.add_declaration(node_text(&name, source), &node, exported);
                }
            }
            _ => {}
        }
    }

    fn add_declaration(&mut self, name: &str, node: &Node, exported: bool) {
        self.declarations.insert(name.to_string(), NodeRef::new(node));
        if exported {
            self.exports.insert(
                name.to_string(),
                ExportEntry::Local {
                    local: name.to_string(),
                },
            );
        }
    }
}

/// Export names may be identifiers or (ES2022) string literals
fn module_export_name(node: Node, source: &str) -> String {
    string_value(node, source).unwrap_or_else(|| node_text(&node, source).to_string())
}
