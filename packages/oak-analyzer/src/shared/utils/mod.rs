//! Shared helpers

pub mod path;
pub mod tree_sitter;

pub use path::{normalize_path, path_starts_with};
