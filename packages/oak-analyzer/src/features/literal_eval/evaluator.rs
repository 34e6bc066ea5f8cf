//! Best-effort folding of declarative TypeScript values into JSON.
//!
//! Unsupported shapes (calls, computed access, substituted templates) fold to
//! `None` and simply go missing from the enclosing object or array.

use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;
use serde_json::{Map, Number, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tree_sitter::Node;

use crate::features::cross_file::{scope, Binding, BindingTable, ImportResolver, Resolution};
use crate::features::parsing::{node_kinds, ImportedName, NodeRef, SourceUnit};
use crate::shared::utils::tree_sitter::{
    named_children, node_text, property_key_name, string_value, unwrap_expression,
};

/// Framework helper constant that has no foldable source of its own
pub const GENERIC_ACTIONS_SYMBOL: &str = "genericActions";

pub static GENERIC_ACTIONS: Lazy<Value> = Lazy::new(|| {
    Value::Array(
        [
            "count", "stat", "download", "select", "aggregate", "create", "remove", "update",
        ]
        .into_iter()
        .map(|a| Value::String(a.to_string()))
        .collect(),
    )
});

/// Fold `node` of `unit`, following identifiers through `resolver`.
///
/// Files entered on the way are recorded as value bindings.
pub fn evaluate(
    unit: &Arc<SourceUnit>,
    node: Node,
    resolver: &mut ImportResolver,
) -> Option<Value> {
    let previous = resolver.record_into(BindingTable::Values);
    let value = Evaluation {
        resolver: &mut *resolver,
        active: FxHashSet::default(),
    }
    .eval(unit, node);
    resolver.record_into(previous);
    value
}

struct Evaluation<'r, 'l> {
    resolver: &'r mut ImportResolver<'l>,
    /// Declarations currently being folded; re-entry means a cycle
    active: FxHashSet<(PathBuf, NodeRef)>,
}

impl Evaluation<'_, '_> {
    fn eval(&mut self, unit: &Arc<SourceUnit>, node: Node) -> Option<Value> {
        let node = unwrap_expression(node);
        let source = unit.text();
        match node.kind() {
            node_kinds::STRING | node_kinds::TEMPLATE_STRING => {
                string_value(node, source).map(Value::String)
            }
            node_kinds::NUMBER => parse_number(node_text(&node, source)).map(Value::Number),
            node_kinds::TRUE => Some(Value::Bool(true)),
            node_kinds::FALSE => Some(Value::Bool(false)),
            node_kinds::NULL => Some(Value::Null),
            node_kinds::UNDEFINED => None,
            node_kinds::UNARY_EXPRESSION => self.eval_unary(unit, node),
            node_kinds::ARRAY => Some(self.eval_array(unit, node)),
            node_kinds::OBJECT => Some(self.eval_object(unit, node)),
            node_kinds::IDENTIFIER => self.eval_identifier(unit, node),
            node_kinds::VARIABLE_DECLARATOR => {
                let value = node.child_by_field_name("value")?;
                self.eval(unit, value)
            }
            _ => None,
        }
    }

    fn eval_unary(&mut self, unit: &Arc<SourceUnit>, node: Node) -> Option<Value> {
        let operator = node.child_by_field_name("operator")?;
        let argument = node.child_by_field_name("argument")?;
        let value = self.eval(unit, argument)?;
        match (node_text(&operator, unit.text()), value) {
            ("-", Value::Number(n)) => {
                if let Some(i) = n.as_i64() {
                    Some(Value::from(-i))
                } else {
                    n.as_f64().and_then(|f| Number::from_f64(-f)).map(Value::Number)
                }
            }
            ("+", Value::Number(n)) => Some(Value::Number(n)),
            ("!", Value::Bool(b)) => Some(Value::Bool(!b)),
            _ => None,
        }
    }

    fn eval_array(&mut self, unit: &Arc<SourceUnit>, node: Node) -> Value {
        let mut items = Vec::new();
        for element in named_children(node) {
            match element.kind() {
                node_kinds::COMMENT => {}
                node_kinds::SPREAD_ELEMENT => {
                    let spread = element.named_child(0).and_then(|inner| self.eval(unit, inner));
                    if let Some(Value::Array(spread)) = spread {
                        items.extend(spread);
                    }
                }
                _ => {
                    if let Some(value) = self.eval(unit, element) {
                        items.push(value);
                    }
                }
            }
        }
        Value::Array(items)
    }

    fn eval_object(&mut self, unit: &Arc<SourceUnit>, node: Node) -> Value {
        let source = unit.text();
        let mut map = Map::new();
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
                        .and_then(|v| self.eval(unit, v));
                    if let Some(value) = value {
                        map.insert(key, value);
                    }
                }
                node_kinds::SHORTHAND_PROPERTY_IDENTIFIER => {
                    let key = node_text(&member, source).to_string();
                    if let Some(value) = self.eval_identifier(unit, member) {
                        map.insert(key, value);
                    }
                }
                node_kinds::SPREAD_ELEMENT => {
                    let spread = member.named_child(0).and_then(|inner| self.eval(unit, inner));
                    if let Some(Value::Object(spread)) = spread {
                        map.extend(spread);
                    }
                }
                // Methods and accessors carry no data
                _ => {}
            }
        }
        Value::Object(map)
    }

    fn eval_identifier(&mut self, unit: &Arc<SourceUnit>, ident: Node) -> Option<Value> {
        let name = node_text(&ident, unit.text());
        if name == "undefined" {
            return None;
        }
        if is_generic_actions(unit, ident) {
            return Some(GENERIC_ACTIONS.clone());
        }

        match self.resolver.resolve_identifier(unit, ident) {
            Resolution::Local(value) => self.eval_guarded(unit, value),
            Resolution::Exported(exported) => self.eval_guarded(&exported.unit, exported.value),
            Resolution::Namespace(_) | Resolution::Unresolved => None,
        }
    }

    fn eval_guarded(&mut self, unit: &Arc<SourceUnit>, value: NodeRef) -> Option<Value> {
        let key = (unit.path().to_path_buf(), value);
        if !self.active.insert(key.clone()) {
            tracing::debug!("cyclic value reference in {}", unit.path().display());
            return None;
        }
        let folded = unit.resolve(value).and_then(|node| self.eval(unit, node));
        self.active.remove(&key);
        folded
    }
}

/// `genericActions` used directly or imported under any alias
fn is_generic_actions(unit: &SourceUnit, ident: Node) -> bool {
    match scope::lookup(unit, ident) {
        Some(Binding::Import(entry)) => {
            entry.imported == ImportedName::Named(GENERIC_ACTIONS_SYMBOL.to_string())
                || entry.local == GENERIC_ACTIONS_SYMBOL
        }
        Some(_) => false,
        None => node_text(&ident, unit.text()) == GENERIC_ACTIONS_SYMBOL,
    }
}

/// Parse a JS numeric literal (`1_000`, `0x1f`, `1e3`, `.5`)
fn parse_number(text: &str) -> Option<Number> {
    let cleaned: String = text.chars().filter(|c| *c != '_').collect();
    let lower = cleaned.to_ascii_lowercase();
    let radix = match lower.get(..2) {
        Some("0x") => Some(16),
        Some("0o") => Some(8),
        Some("0b") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return i64::from_str_radix(&lower[2..], radix).ok().map(Number::from);
    }
    if let Ok(i) = lower.parse::<i64>() {
        return Some(Number::from(i));
    }
    let f: f64 = lower.parse().ok()?;
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        return Some(Number::from(f as i64));
    }
    Number::from_f64(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::parsing::Dialect;
    use crate::features::workspace::Workspace;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    /// Fold the initializer of the last top-level `const` in `text`
    fn fold(text: &str) -> Option<Value> {
        let unit = Arc::new(SourceUnit::parse_text("/eval.ts", text, Dialect::TypeScript).unwrap());
        let workspace = Workspace::new();
        let mut loader = &workspace;
        let mut resolver = ImportResolver::new(&mut loader);
        let last = named_children(unit.root()).into_iter().last().unwrap();
        let declarator = last.named_child(0).unwrap();
        evaluate(&unit, declarator, &mut resolver)
    }

    #[test]
    fn test_literals() {
        assert_eq!(fold("const v = 'a';"), Some(json!("a")));
        assert_eq!(fold("const v = -1.5;"), Some(json!(-1.5)));
        assert_eq!(fold("const v = 0x10;"), Some(json!(16)));
        assert_eq!(fold("const v = 1_000;"), Some(json!(1000)));
        assert_eq!(fold("const v = null;"), Some(Value::Null));
        assert_eq!(fold("const v = undefined;"), None);
        assert_eq!(fold("const v = `t${x}`;"), None);
        assert_eq!(fold("const v = f();"), None);
    }

    #[test]
    fn test_objects_arrays_and_spreads() {
        let value = fold(
            r#"
const base = { a: 1, list: [1, 2] };
const more = [3];
const v = { ...base, b: [...more, 'x', call()], c: base.a, 'd-e': true } as const;
"#,
        );
        assert_eq!(
            value,
            Some(json!({ "a": 1, "list": [1, 2], "b": [3, "x"], "d-e": true }))
        );
    }

    #[test]
    fn test_generic_actions_forms() {
        assert_eq!(
            fold("const v = { actions: genericActions };"),
            Some(json!({ "actions": GENERIC_ACTIONS.clone() }))
        );
        assert_eq!(
            fold(
                "import { genericActions as ga } from 'oak-domain/lib/actions/action';\nconst v = ga;"
            ),
            Some(GENERIC_ACTIONS.clone())
        );
        assert_eq!(
            fold("import { genericActions } from 'oak-domain';\nconst v = { genericActions };"),
            Some(json!({ "genericActions": GENERIC_ACTIONS.clone() }))
        );
    }

    #[test]
    fn test_cycle_folds_to_missing() {
        let value = fold("const a = { b };\nconst b = { a };\nconst v = a;");
        assert_eq!(value, Some(json!({ "b": {} })));
    }

    #[test]
    fn test_follows_relative_imports() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("consts.ts"), "export const LIMIT = 10;").unwrap();
        let main = dir.path().join("main.ts");
        fs::write(
            &main,
            "import { LIMIT } from './consts';\nexport const v = { limit: LIMIT };",
        )
        .unwrap();

        let workspace = Workspace::new();
        let unit = workspace.load(&main).unwrap();
        let mut loader = &workspace;
        let mut resolver = ImportResolver::new(&mut loader);
        let declarator = unit.resolve(unit.symbols().declaration("v").unwrap()).unwrap();
        assert_eq!(
            evaluate(&unit, declarator, &mut resolver),
            Some(json!({ "limit": 10 }))
        );
    }
}
