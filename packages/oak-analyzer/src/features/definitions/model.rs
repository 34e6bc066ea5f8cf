//! Definition objects

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tree_sitter::Node;

use super::kind::DefinitionKind;
use crate::features::parsing::{NodeRef, SourceUnit};
use crate::shared::models::Range;

/// Back-reference to the object literal a definition was folded from.
///
/// Used for positions and for re-walking the handler; the unit is shared,
/// never owned exclusively by the definition.
#[derive(Clone)]
pub struct SyntaxRef {
    pub unit: Arc<SourceUnit>,
    pub node: NodeRef,
    pub range: Range,
}

impl SyntaxRef {
    pub fn node(&self) -> Option<Node<'_>> {
        self.unit.resolve(self.node)
    }
}

impl fmt::Debug for SyntaxRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxRef")
            .field("path", &self.unit.path())
            .field("range", &self.range)
            .finish()
    }
}

/// One trigger or checker declared somewhere in a program
#[derive(Serialize)]
#[serde(rename_all = "camelCase", bound(serialize = ""))]
pub struct DefinitionObject<K: DefinitionKind> {
    /// Normalized path of the file declaring the object literal
    pub path: PathBuf,
    pub entity: String,
    pub action: Vec<String>,
    #[serde(flatten)]
    pub extra: K::Extra,
    #[serde(skip)]
    pub syntax: SyntaxRef,
}

impl<K: DefinitionKind> DefinitionObject<K> {
    pub fn range(&self) -> Range {
        self.syntax.range
    }
}

impl<K: DefinitionKind> Clone for DefinitionObject<K> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            entity: self.entity.clone(),
            action: self.action.clone(),
            extra: self.extra.clone(),
            syntax: self.syntax.clone(),
        }
    }
}

/// Equality ignores syntax-tree identity: same file, same span, same fields.
impl<K: DefinitionKind> PartialEq for DefinitionObject<K> {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
            && self.syntax.range == other.syntax.range
            && self.entity == other.entity
            && self.action == other.action
            && self.extra == other.extra
    }
}

impl<K: DefinitionKind> fmt::Debug for DefinitionObject<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefinitionObject")
            .field("path", &self.path)
            .field("entity", &self.entity)
            .field("action", &self.action)
            .field("extra", &self.extra)
            .field("range", &self.syntax.range)
            .finish()
    }
}
