//! SourceUnit - one parsed file
//!
//! A unit owns its text, its syntax tree and the module symbol table built
//! once at parse time. Units are immutable; an edited file gets a new unit.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tree_sitter::{Language, Node, Parser, Tree};

use super::module_symbols::ModuleSymbols;
use crate::errors::{AnalyzerError, Result};
use crate::shared::utils::normalize_path;

/// Grammar flavour used for a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    TypeScript,
    Tsx,
}

impl Dialect {
    /// Pick the grammar from the file extension (`.tsx`/`.jsx` use TSX)
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("tsx") | Some("jsx") => Dialect::Tsx,
            _ => Dialect::TypeScript,
        }
    }

    fn language(&self) -> Language {
        match self {
            Dialect::TypeScript => tree_sitter_typescript::language_typescript(),
            Dialect::Tsx => tree_sitter_typescript::language_tsx(),
        }
    }
}

/// Lightweight handle to a node inside a specific unit.
///
/// Nodes borrow their tree, so anything that outlives a walk (definition
/// objects, resolved bindings) stores a `NodeRef` next to the owning
/// `Arc<SourceUnit>` and re-materializes the node on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub start_byte: usize,
    pub end_byte: usize,
    kind_id: u16,
}

impl NodeRef {
    pub fn new(node: &Node) -> Self {
        Self {
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            kind_id: node.kind_id(),
        }
    }
}

pub struct SourceUnit {
    path: PathBuf,
    text: Arc<str>,
    tree: Tree,
    dialect: Dialect,
    symbols: ModuleSymbols,
}

impl SourceUnit {
    /// Parse `text` as the contents of `path`.
    ///
    /// Never fails on syntax errors (tree-sitter recovers); see
    /// [`SourceUnit::has_errors`].
    pub fn parse_text(
        path: impl AsRef<Path>,
        text: impl Into<Arc<str>>,
        dialect: Dialect,
    ) -> Result<Self> {
        let path = normalize_path(path);
        let text: Arc<str> = text.into();

        let mut parser = Parser::new();
        parser
            .set_language(&dialect.language())
            .map_err(|e| AnalyzerError::parse_error(format!("grammar load failed: {}", e)))?;
        let tree = parser.parse(text.as_bytes(), None).ok_or_else(|| {
            AnalyzerError::parse_error(format!("parser gave up on {}", path.display()))
        })?;

        let symbols = ModuleSymbols::collect(tree.root_node(), &text);

        Ok(Self {
            path,
            text,
            tree,
            dialect,
            symbols,
        })
    }

    /// Read and parse a file from disk
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = normalize_path(path);
        let text = std::fs::read_to_string(&path).map_err(|source| AnalyzerError::Read {
            path: path.clone(),
            source,
        })?;
        let dialect = Dialect::from_path(&path);
        Self::parse_text(path, text, dialect)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn symbols(&self) -> &ModuleSymbols {
        &self.symbols
    }

    /// True when the tree contains error or missing nodes
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    /// Re-materialize a node handle taken from this unit
    pub fn resolve(&self, node_ref: NodeRef) -> Option<Node<'_>> {
        let mut node = self
            .root()
            .descendant_for_byte_range(node_ref.start_byte, node_ref.end_byte)?;
        loop {
            let same_range =
                node.start_byte() == node_ref.start_byte && node.end_byte() == node_ref.end_byte;
            if same_range && node.kind_id() == node_ref.kind_id {
                return Some(node);
            }
            // Wrappers sharing the same range sit above the smallest match
            let parent = node.parent()?;
            if parent.start_byte() != node_ref.start_byte
                || parent.end_byte() != node_ref.end_byte
            {
                return None;
            }
            node = parent;
        }
    }
}

impl fmt::Debug for SourceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceUnit")
            .field("path", &self.path)
            .field("dialect", &self.dialect)
            .field("bytes", &self.text.len())
            .finish()
    }
}
