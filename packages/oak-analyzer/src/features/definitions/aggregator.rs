//! Definition Aggregator
//!
//! Flattens a composition of definition objects into one ordered list:
//!
//! ```text
//! export default [
//!     ...userTriggers,            // identifier, followed across files
//!     ...(orderTriggers as T[]),  // casts and parentheses are transparent
//!     { entity: 'x', ... },       // object literal: one definition
//! ];
//! ```
//!
//! Array order is preserved. Every value expression is entered at most once
//! per run, which both breaks import cycles and keeps a module imported from
//! two places from contributing twice.

use rustc_hash::FxHashSet;
use serde_json::{Map, Value};
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Arc;
use tree_sitter::Node;

use super::kind::DefinitionKind;
use super::model::{DefinitionObject, SyntaxRef};
use crate::features::cross_file::{
    BindingRecords, ExportedValue, ImportBindingMeta, ImportResolver, Resolution,
};
use crate::features::literal_eval::evaluate;
use crate::features::parsing::{node_kinds, NodeRef, SourceUnit};
use crate::features::workspace::UnitLoader;
use crate::shared::utils::tree_sitter::{
    has_child_kind, named_children, node_range, node_text, property_key_name, unwrap_expression,
};

/// Definitions plus the binding records collected while producing them
#[derive(Debug)]
pub struct AggregationResult<K: DefinitionKind> {
    pub definitions: Vec<DefinitionObject<K>>,
    /// Files entered while walking definition lists
    pub bindings: BindingRecords,
    /// Files entered only to fold field values
    pub value_bindings: BindingRecords,
}

pub struct Aggregator<'l, K: DefinitionKind> {
    resolver: ImportResolver<'l>,
    visited: FxHashSet<(PathBuf, NodeRef)>,
    definitions: Vec<DefinitionObject<K>>,
    _kind: PhantomData<K>,
}

impl<'l, K: DefinitionKind> Aggregator<'l, K> {
    pub fn new(loader: &'l mut dyn UnitLoader) -> Self {
        Self {
            resolver: ImportResolver::new(loader),
            visited: FxHashSet::default(),
            definitions: Vec::new(),
            _kind: PhantomData,
        }
    }

    /// Aggregate the value `unit` exports under `meta`
    pub fn collect_export(&mut self, unit: Arc<SourceUnit>, meta: ImportBindingMeta) {
        let path = unit.path().to_path_buf();
        match self.resolver.find_export(unit, meta.clone()) {
            Some(ExportedValue { unit, value }) => self.enter(&unit, value),
            None => tracing::debug!(
                "{}: no value exported as '{}' from {}",
                K::INDEX_NAME,
                meta.export_name(),
                path.display()
            ),
        }
    }

    pub fn finish(mut self) -> AggregationResult<K> {
        AggregationResult {
            definitions: self.definitions,
            bindings: self.resolver.take_bindings(),
            value_bindings: self.resolver.take_value_bindings(),
        }
    }

    fn enter(&mut self, unit: &Arc<SourceUnit>, value: NodeRef) {
        if !self.visited.insert((unit.path().to_path_buf(), value)) {
            tracing::debug!(
                "{}: {} reached again, skipping",
                K::INDEX_NAME,
                unit.path().display()
            );
            return;
        }
        if let Some(node) = unit.resolve(value) {
            self.walk(unit, node);
        }
    }

    fn walk(&mut self, unit: &Arc<SourceUnit>, node: Node) {
        let node = unwrap_expression(node);
        match node.kind() {
            node_kinds::SPREAD_ELEMENT => {
                if let Some(inner) = node.named_child(0) {
                    self.walk(unit, inner);
                }
            }
            node_kinds::ARRAY => {
                for element in named_children(node) {
                    if element.kind() != node_kinds::COMMENT {
                        self.walk(unit, element);
                    }
                }
            }
            node_kinds::OBJECT => {
                if let Some(definition) = self.analyze_object(unit, node) {
                    self.definitions.push(definition);
                }
            }
            node_kinds::IDENTIFIER => match self.resolver.resolve_identifier(unit, node) {
                Resolution::Local(value) => self.enter(unit, value),
                Resolution::Exported(ExportedValue { unit: target, value }) => {
                    self.enter(&target, value)
                }
                Resolution::Namespace(_) | Resolution::Unresolved => {
                    self.reject(unit, node, "identifier does not resolve to a definition list")
                }
            },
            node_kinds::MEMBER_EXPRESSION => self.walk_namespace_member(unit, node),
            _ => self.reject(unit, node, "unsupported definition expression"),
        }
    }

    /// `ns.triggers` where `ns` is `import * as ns from './x'`
    fn walk_namespace_member(&mut self, unit: &Arc<SourceUnit>, node: Node) {
        let object = node.child_by_field_name("object");
        let property = node.child_by_field_name("property");
        let (Some(object), Some(property)) = (object, property) else {
            return self.reject(unit, node, "unsupported member expression");
        };
        if object.kind() != node_kinds::IDENTIFIER {
            return self.reject(unit, node, "unsupported member expression");
        }
        let Resolution::Namespace(target) = self.resolver.resolve_identifier(unit, object) else {
            return self.reject(unit, node, "member access on a non-namespace value");
        };
        let member = node_text(&property, unit.text()).to_string();
        match self.resolver.resolve_namespace_member(&target, &member) {
            Some(ExportedValue { unit: target, value }) => self.enter(&target, value),
            None => self.reject(unit, node, "namespace member not found"),
        }
    }

    /// Fold one object literal into a definition.
    ///
    /// Shorthand properties, spreads and accessors make the shape ambiguous;
    /// such objects are dropped whole.
    fn analyze_object(
        &mut self,
        unit: &Arc<SourceUnit>,
        node: Node,
    ) -> Option<DefinitionObject<K>> {
        let source = unit.text();
        let mut fields = Map::new();
        for member in named_children(node) {
            match member.kind() {
                node_kinds::PAIR => {
                    let Some(key) = member
                        .child_by_field_name("key")
                        .and_then(|k| property_key_name(k, source))
                    else {
                        continue;
                    };
                    let value = member
                        .child_by_field_name("value")
                        .and_then(|v| evaluate(unit, v, &mut self.resolver));
                    // Unfoldable values still count as present
                    fields.insert(key, value.unwrap_or(Value::Null));
                }
                node_kinds::METHOD_DEFINITION => {
                    if has_child_kind(member, node_kinds::GET)
                        || has_child_kind(member, node_kinds::SET)
                    {
                        self.reject(unit, member, "accessor in definition object");
                        return None;
                    }
                }
                node_kinds::SHORTHAND_PROPERTY_IDENTIFIER => {
                    self.reject(unit, member, "shorthand property in definition object");
                    return None;
                }
                node_kinds::SPREAD_ELEMENT => {
                    self.reject(unit, member, "spread in definition object");
                    return None;
                }
                _ => {}
            }
        }

        let Some(entity) = fields.get("entity").and_then(Value::as_str).map(str::to_string) else {
            self.reject(unit, node, "definition object without a literal entity");
            return None;
        };
        let action = match fields.get("action") {
            Some(Value::String(action)) => vec![action.clone()],
            Some(Value::Array(actions)) => actions
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        };

        Some(DefinitionObject {
            path: unit.path().to_path_buf(),
            entity,
            action,
            extra: K::read_extra(&fields),
            syntax: SyntaxRef {
                unit: Arc::clone(unit),
                node: NodeRef::new(&node),
                range: node_range(&node),
            },
        })
    }

    fn reject(&self, unit: &SourceUnit, node: Node, reason: &str) {
        let at = node.start_position();
        tracing::warn!(
            "{}: {} at {}:{}:{}",
            K::INDEX_NAME,
            reason,
            unit.path().display(),
            at.row + 1,
            at.column + 1
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::definitions::{Checker, Trigger};
    use crate::features::workspace::Workspace;
    use crate::shared::utils::normalize_path;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn aggregate<K: DefinitionKind>(dir: &TempDir, files: &[(&str, &str)]) -> AggregationResult<K> {
        for (name, text) in files {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, text).unwrap();
        }
        let workspace = Workspace::new();
        let entry = workspace.load(&dir.path().join(files[0].0)).unwrap();
        let mut loader = &workspace;
        let mut aggregator = Aggregator::<K>::new(&mut loader);
        aggregator.collect_export(entry, ImportBindingMeta::entry());
        aggregator.finish()
    }

    fn entities<K: DefinitionKind>(result: &AggregationResult<K>) -> Vec<&str> {
        result.definitions.iter().map(|d| d.entity.as_str()).collect()
    }

    #[test]
    fn test_spread_cast_and_order() {
        let dir = TempDir::new().unwrap();
        let result = aggregate::<Trigger>(
            &dir,
            &[
                (
                    "index.ts",
                    "import user from './user';\nimport { orderTriggers } from './order';\n\
                     export default [...user, ...(orderTriggers as Trigger[]), { entity: 'tail', action: 'create', when: 'after', fn: async () => 0 }];",
                ),
                (
                    "user.ts",
                    "const triggers = [{ name: 'u', entity: 'user', action: ['create', 'update'], when: 'before', fn: async (e, ctx) => 1 }];\nexport default triggers;",
                ),
                (
                    "order/index.ts",
                    "export const orderTriggers = [{ entity: 'order', action: 'remove', cs: true, fn: async () => 0 }];",
                ),
            ],
        );
        assert_eq!(entities(&result), vec!["user", "order", "tail"]);

        let user = &result.definitions[0];
        assert_eq!(user.action, vec!["create".to_string(), "update".to_string()]);
        assert_eq!(user.extra.name.as_deref(), Some("u"));
        assert_eq!(user.path, normalize_path(dir.path().join("user.ts")));
        assert!(result.definitions[1].extra.cs);

        let order = normalize_path(dir.path().join("order/index.ts"));
        assert_eq!(result.bindings[&order][0].import_name, "orderTriggers");
        assert!(result.bindings[&normalize_path(dir.path().join("user.ts"))][0].is_default);
    }

    #[test]
    fn test_malformed_objects_are_dropped() {
        let dir = TempDir::new().unwrap();
        let result = aggregate::<Checker>(
            &dir,
            &[(
                "index.ts",
                "const entity = 'x';\nconst base = {};\nexport default [\n  { entity, action: 'create', checker: () => {} },\n  { ...base, entity: 'y' },\n  { get entity() { return 'z'; } },\n  { action: 'create' },\n  makeChecker(),\n  { entity: 'ok', action: 'update', type: 'row', checker: () => {} },\n];",
            )],
        );
        assert_eq!(entities(&result), vec!["ok"]);
        assert_eq!(result.definitions[0].extra.checker_type.as_deref(), Some("row"));
    }

    #[test]
    fn test_mutual_imports_terminate() {
        let dir = TempDir::new().unwrap();
        let result = aggregate::<Trigger>(
            &dir,
            &[
                ("index.ts", "import a from './a';\nexport default [...a];"),
                (
                    "a.ts",
                    "import b from './b';\nexport default [...b, { entity: 'a', fn: async () => 0 }];",
                ),
                (
                    "b.ts",
                    "import a from './a';\nexport default [...a, { entity: 'b', fn: async () => 0 }];",
                ),
            ],
        );
        assert_eq!(entities(&result), vec!["b", "a"]);
    }

    #[test]
    fn test_namespace_member() {
        let dir = TempDir::new().unwrap();
        let result = aggregate::<Trigger>(
            &dir,
            &[
                ("index.ts", "import * as all from './all';\nexport default all.list;"),
                ("all.ts", "export const list = [{ entity: 'n', fn: async () => 0 }];"),
            ],
        );
        assert_eq!(entities(&result), vec!["n"]);
    }
}
