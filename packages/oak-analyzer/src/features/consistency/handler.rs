//! Handler lookup inside a definition object

use tree_sitter::Node;

use crate::features::cross_file::{scope, Binding};
use crate::features::parsing::{node_kinds, SourceUnit};
use crate::shared::utils::tree_sitter::{
    named_children, node_text, property_key_name, unwrap_expression,
};

/// Function node of property `name` in `object`.
///
/// Accepts `name: async (...) => {}`, `name: function () {}`,
/// `async name() {}` and `name: someFunction` where `someFunction` is
/// declared in the same file.
pub fn find_handler<'u>(unit: &'u SourceUnit, object: Node<'u>, name: &str) -> Option<Node<'u>> {
    let source = unit.text();
    for member in named_children(object) {
        match member.kind() {
            node_kinds::PAIR => {
                let key = member
                    .child_by_field_name("key")
                    .and_then(|k| property_key_name(k, source));
                if key.as_deref() != Some(name) {
                    continue;
                }
                let value = unwrap_expression(member.child_by_field_name("value")?);
                return function_value(unit, value);
            }
            node_kinds::METHOD_DEFINITION => {
                let method = member.child_by_field_name("name");
                if method.is_some_and(|m| node_text(&m, source) == name) {
                    return Some(member);
                }
            }
            _ => {}
        }
    }
    None
}

fn function_value<'u>(unit: &'u SourceUnit, value: Node<'u>) -> Option<Node<'u>> {
    if node_kinds::is_function_like(value.kind()) {
        return Some(value);
    }
    if value.kind() != node_kinds::IDENTIFIER {
        return None;
    }
    match scope::lookup(unit, value)? {
        Binding::Declaration(decl) if decl.kind() == node_kinds::FUNCTION_DECLARATION => Some(decl),
        Binding::Declaration(decl) if decl.kind() == node_kinds::VARIABLE_DECLARATOR => decl
            .child_by_field_name("value")
            .map(unwrap_expression)
            .filter(|v| node_kinds::is_function_like(v.kind())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::parsing::Dialect;

    fn object_of(unit: &SourceUnit) -> Node<'_> {
        let declarator = unit
            .root()
            .named_child(unit.root().named_child_count() - 1)
            .unwrap()
            .named_child(0)
            .unwrap();
        declarator.child_by_field_name("value").unwrap()
    }

    #[test]
    fn test_handler_forms() {
        for text in [
            "const o = { fn: async (e, ctx) => 0 };",
            "const o = { fn: (async function (e, ctx) { return 0; }) };",
            "const o = { async fn(e, ctx) { return 0; } };",
            "async function handle(e, ctx) { return 0; }\nconst o = { fn: handle };",
        ] {
            let unit = SourceUnit::parse_text("/h.ts", text, Dialect::TypeScript).unwrap();
            let handler = find_handler(&unit, object_of(&unit), "fn");
            assert!(handler.is_some(), "no handler in {text}");
        }

        let unit = SourceUnit::parse_text("/h.ts", "const o = { checker: 1 };", Dialect::TypeScript)
            .unwrap();
        assert!(find_handler(&unit, object_of(&unit), "checker").is_none());
    }
}
