//! Parsing
//!
//! tree-sitter-typescript front end: [`SourceUnit`] (one parsed file), the
//! [`ModuleSymbols`] table built alongside it and the node kind constants
//! every walker matches on.

pub mod functions;
pub mod module_symbols;
pub mod node_kinds;
mod source_unit;

pub use module_symbols::{DefaultExport, ExportEntry, ImportEntry, ImportedName, ModuleSymbols};
pub use source_unit::{Dialect, NodeRef, SourceUnit};
