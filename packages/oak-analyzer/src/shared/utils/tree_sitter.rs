//! Tree-sitter helpers
//!
//! Shared helper functions used by every walker in the crate:
//! - Node traversal
//! - Text extraction
//! - Range conversion
//! - Literal/key decoding

use tree_sitter::Node;

use crate::features::parsing::node_kinds;
use crate::shared::models::{Position, Range};

/// Convert a tree-sitter node to a zero-based [`Range`]
pub fn node_range(node: &Node) -> Range {
    let start = node.start_position();
    let end = node.end_position();
    Range::new(
        Position::new(start.row as u32, start.column as u32),
        Position::new(end.row as u32, end.column as u32),
    )
}

/// Extract text from a node
pub fn node_text<'a>(node: &Node, source: &'a str) -> &'a str {
    source.get(node.start_byte()..node.end_byte()).unwrap_or("")
}

/// Find first child of a specific kind (named or anonymous)
pub fn find_child_by_kind<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find(|child| child.kind() == kind);
    found
}

/// Find all children of a specific kind
pub fn find_children_by_kind<'t>(node: Node<'t>, kind: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    let children = node
        .children(&mut cursor)
        .filter(|child| child.kind() == kind)
        .collect();
    children
}

/// All named children, in source order
pub fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    let children = node.named_children(&mut cursor).collect();
    children
}

/// Check for a direct child token/node of the given kind
pub fn has_child_kind(node: Node, kind: &str) -> bool {
    find_child_by_kind(node, kind).is_some()
}

/// Check if a function-like node carries the `async` modifier
pub fn is_async(node: Node) -> bool {
    has_child_kind(node, node_kinds::ASYNC)
}

/// Strip wrappers that do not change the value of an expression:
/// parentheses, `as`, `satisfies` and non-null assertions.
pub fn unwrap_expression(node: Node) -> Node {
    let mut current = node;
    loop {
        let inner = match current.kind() {
            node_kinds::PARENTHESIZED_EXPRESSION
            | node_kinds::AS_EXPRESSION
            | node_kinds::SATISFIES_EXPRESSION
            | node_kinds::NON_NULL_EXPRESSION => current.named_child(0),
            _ => None,
        };
        match inner {
            Some(inner) => current = inner,
            None => return current,
        }
    }
}

/// Decode a string literal node (`'a'`, `"a"`) into its value.
///
/// Template strings are accepted only when they contain no substitution.
pub fn string_value(node: Node, source: &str) -> Option<String> {
    match node.kind() {
        node_kinds::STRING => {
            let text = node_text(&node, source);
            if text.len() < 2 {
                return None;
            }
            Some(unescape(&text[1..text.len() - 1]))
        }
        node_kinds::TEMPLATE_STRING => {
            if has_child_kind(node, node_kinds::TEMPLATE_SUBSTITUTION) {
                return None;
            }
            let text = node_text(&node, source);
            if text.len() < 2 {
                return None;
            }
            Some(unescape(&text[1..text.len() - 1]))
        }
        _ => None,
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Name of an object/type property key.
///
/// Identifiers and string/number literals yield a name; computed keys yield
/// `None`.
pub fn property_key_name(key: Node, source: &str) -> Option<String> {
    match key.kind() {
        node_kinds::PROPERTY_IDENTIFIER
        | node_kinds::IDENTIFIER
        | node_kinds::SHORTHAND_PROPERTY_IDENTIFIER
        | node_kinds::PRIVATE_PROPERTY_IDENTIFIER
        | node_kinds::NUMBER => Some(node_text(&key, source).to_string()),
        node_kinds::STRING => string_value(key, source),
        _ => None,
    }
}

/// Walk up from `node` and return the first ancestor accepted by `pred`.
pub fn find_ancestor<'t>(node: Node<'t>, pred: impl Fn(&Node<'t>) -> bool) -> Option<Node<'t>> {
    let mut current = node.parent();
    while let Some(candidate) = current {
        if pred(&candidate) {
            return Some(candidate);
        }
        current = candidate.parent();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::parsing::{Dialect, SourceUnit};

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r#"a\"b\\c\n"#), "a\"b\\c\n");
    }

    #[test]
    fn test_string_value_and_ranges() {
        let unit = SourceUnit::parse_text(
            "/t.ts",
            "const a = 'x\\'y';\nconst b = `plain`;",
            Dialect::TypeScript,
        )
        .unwrap();
        let root = unit.root();
        let mut values = Vec::new();
        for decl in named_children(root) {
            let declarator = decl.named_child(0).unwrap();
            let value = declarator.child_by_field_name("value").unwrap();
            values.push(string_value(value, unit.text()).unwrap());
        }
        assert_eq!(values, vec!["x'y".to_string(), "plain".to_string()]);

        let second = root.named_child(1).unwrap();
        assert_eq!(node_range(&second).start, Position::new(1, 0));
    }

    #[test]
    fn test_unwrap_expression() {
        let unit = SourceUnit::parse_text("/t.ts", "const a = ([1] as any);", Dialect::TypeScript)
            .unwrap();
        let declarator = unit.root().named_child(0).unwrap().named_child(0).unwrap();
        let value = declarator.child_by_field_name("value").unwrap();
        assert_eq!(unwrap_expression(value).kind(), node_kinds::ARRAY);
    }
}
