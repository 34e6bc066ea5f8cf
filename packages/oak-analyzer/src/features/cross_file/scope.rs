//! Lexical scope lookup
//!
//! Finds what an identifier refers to by walking enclosing blocks outward to
//! the module scope. Only bindings that can carry a foldable value matter
//! here, so the walk knows three outcomes: a declaration, an import, or a
//! function parameter that shadows everything further out.

use tree_sitter::Node;

use crate::features::parsing::{node_kinds, ImportEntry, SourceUnit};
use crate::shared::utils::tree_sitter::{find_children_by_kind, named_children, node_text};

#[derive(Debug, Clone, Copy)]
pub enum Binding<'u> {
    /// `variable_declarator`, function or class declaration
    Declaration(Node<'u>),
    Import(&'u ImportEntry),
    Parameter,
}

/// Binding of identifier node `ident`
pub fn lookup<'u>(unit: &'u SourceUnit, ident: Node<'u>) -> Option<Binding<'u>> {
    let name = node_text(&ident, unit.text());
    lookup_name(unit, ident, name)
}

/// Binding of `name` as seen from `from`
pub fn lookup_name<'u>(unit: &'u SourceUnit, from: Node<'u>, name: &str) -> Option<Binding<'u>> {
    let source = unit.text();
    let mut scope = from.parent();
    while let Some(node) = scope {
        match node.kind() {
            node_kinds::PROGRAM => break,
            node_kinds::STATEMENT_BLOCK | node_kinds::SWITCH_CASE | node_kinds::SWITCH_DEFAULT => {
                if let Some(decl) = block_declaration(node, source, name) {
                    return Some(Binding::Declaration(decl));
                }
            }
            kind if binds_parameters(kind) => {
                if has_parameter(node, source, name) {
                    return Some(Binding::Parameter);
                }
            }
            _ => {}
        }
        scope = node.parent();
    }

    let symbols = unit.symbols();
    if let Some(decl) = symbols.declaration(name) {
        return unit.resolve(decl).map(Binding::Declaration);
    }
    symbols.import(name).map(Binding::Import)
}

fn binds_parameters(kind: &str) -> bool {
    node_kinds::is_function_like(kind)
        || kind == node_kinds::FUNCTION_DECLARATION
        || kind == node_kinds::METHOD_DEFINITION
}

fn block_declaration<'t>(block: Node<'t>, source: &str, name: &str) -> Option<Node<'t>> {
    for statement in named_children(block) {
        match statement.kind() {
            node_kinds::LEXICAL_DECLARATION | node_kinds::VARIABLE_DECLARATION => {
                let declarators =
                    find_children_by_kind(statement, node_kinds::VARIABLE_DECLARATOR);
                for declarator in declarators {
                    let declared = declarator
                        .child_by_field_name("name")
                        .filter(|n| n.kind() == node_kinds::IDENTIFIER);
                    if declared.is_some_and(|n| node_text(&n, source) == name) {
                        return Some(declarator);
                    }
                }
            }
            node_kinds::FUNCTION_DECLARATION | node_kinds::CLASS_DECLARATION => {
                let declared = statement.child_by_field_name("name");
                if declared.is_some_and(|n| node_text(&n, source) == name) {
                    return Some(statement);
                }
            }
            _ => {}
        }
    }
    None
}

fn has_parameter(function: Node, source: &str, name: &str) -> bool {
    // `x => ...`
    if let Some(single) = function.child_by_field_name("parameter") {
        return node_text(&single, source) == name;
    }
    let Some(params) = function.child_by_field_name("parameters") else {
        return false;
    };
    named_children(params).into_iter().any(|param| {
        param
            .child_by_field_name("pattern")
            .filter(|p| p.kind() == node_kinds::IDENTIFIER)
            .is_some_and(|p| node_text(&p, source) == name)
    })
}
