//! Components
//!
//! `OakComponent` declarations found under the configured component
//! directories, grouped by entity in a [`ComponentMap`].

pub mod model;
pub mod registry;
pub mod scanner;
pub mod validate;

pub use model::{ComponentDescriptor, Platform, RenderFile, INDEX_FILES};
pub use registry::ComponentMap;
pub use scanner::{is_entry_file, parse_component, scan_components, scan_file, COMPONENT_FUNCTION};
pub use validate::validate_components;
