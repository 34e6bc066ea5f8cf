//! Cross-file types
//!
//! Core data structures for following identifiers across module boundaries.

use rustc_hash::FxHashMap;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::features::parsing::{ImportEntry, ImportedName, NodeRef, SourceUnit};

/// How a file was reached while aggregating a program.
///
/// Recorded per file so that an edit to that file can re-run the aggregation
/// starting at exactly the export that was followed into it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportBindingMeta {
    /// Exported name looked up in the file (the local name for default imports)
    pub import_name: String,

    /// Local alias under which the importer sees the value
    pub identifier: String,

    /// Follow the default export instead of `import_name`
    pub is_default: bool,
}

impl ImportBindingMeta {
    /// Binding of a program entry file: its default export
    pub fn entry() -> Self {
        Self {
            import_name: "default".to_string(),
            identifier: "default".to_string(),
            is_default: true,
        }
    }

    /// Binding for a named export looked up directly
    pub fn named(name: &str) -> Self {
        Self {
            import_name: name.to_string(),
            identifier: name.to_string(),
            is_default: name == "default",
        }
    }

    /// Binding created by an import statement; namespace imports have none
    pub fn for_import(entry: &ImportEntry) -> Option<Self> {
        match &entry.imported {
            ImportedName::Default => Some(Self {
                import_name: entry.local.clone(),
                identifier: entry.local.clone(),
                is_default: true,
            }),
            ImportedName::Named(name) => Some(Self {
                import_name: name.clone(),
                identifier: entry.local.clone(),
                is_default: name == "default",
            }),
            ImportedName::Namespace => None,
        }
    }

    /// Name to look up in the exporting module's export table
    pub fn export_name(&self) -> &str {
        if self.is_default {
            "default"
        } else {
            &self.import_name
        }
    }
}

/// Per-file binding records collected during one aggregation run
pub type BindingRecords = FxHashMap<PathBuf, Vec<ImportBindingMeta>>;

/// A value expression exported by some unit
#[derive(Debug, Clone)]
pub struct ExportedValue {
    pub unit: Arc<SourceUnit>,
    pub value: NodeRef,
}

/// What an identifier evaluates to
#[derive(Debug, Clone)]
pub enum Resolution {
    /// Initializer of a declaration in the same unit
    Local(NodeRef),

    /// Value exported by another unit
    Exported(ExportedValue),

    /// `import * as ns` - the module itself
    Namespace(PathBuf),

    /// Parameter, package import, missing file or unknown name
    Unresolved,
}
