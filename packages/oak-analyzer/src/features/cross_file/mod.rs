//! Cross-file resolution
//!
//! - [`scope`]: lexical lookup inside one unit
//! - [`ImportResolver`]: identifier -> value expression across files
//! - [`ImportBindingMeta`]: how each file was entered, kept for scoped
//!   re-aggregation

pub mod import_resolver;
pub mod scope;
pub mod types;

pub use import_resolver::{resolve_module_path, BindingTable, ImportResolver};
pub use scope::Binding;
pub use types::{BindingRecords, ExportedValue, ImportBindingMeta, Resolution};
