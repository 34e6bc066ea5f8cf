//! Handler checks
//!
//! Each rule walks the handler of one definition object:
//! - async modifier
//! - literal returns (`return 0` is the accepted no-op value)
//! - bare `return;` outside commit-phase or cross-transaction triggers
//! - context calls (`ctx.select(...)` and friends) that are neither awaited
//!   nor returned

use tree_sitter::Node;

use super::handler::find_handler;
use super::rules::{BoundResultPolicy, DiagnosticSink, CONTEXT_METHODS};
use crate::config::CheckSeverities;
use crate::features::definitions::{DefinitionKind, DefinitionObject};
use crate::features::parsing::functions::{
    concise_body, opens_function_scope, parameter_name, return_statements, returned_expression,
    visit_descendants,
};
use crate::features::parsing::{node_kinds, SourceUnit};
use crate::shared::models::Diagnostic;
use crate::shared::utils::tree_sitter::{is_async, node_range, node_text, unwrap_expression};

/// Source text of the one numeric literal a handler may return
const NO_OP_RETURN: &str = "0";

/// Run every rule of `K` against one definition
pub fn check_definition<K: DefinitionKind>(
    definition: &DefinitionObject<K>,
    severities: &CheckSeverities,
) -> Vec<Diagnostic> {
    let mut sink = DiagnosticSink::new(severities);
    let unit = &definition.syntax.unit;
    let Some(object) = definition.syntax.node() else {
        tracing::debug!("definition node vanished from {}", unit.path().display());
        return Vec::new();
    };
    let rules = K::RULES;

    let Some(handler) = find_handler(unit, object, K::HANDLER) else {
        if let Some(code) = rules.missing_handler {
            sink.push(
                definition.range(),
                code,
                format!(
                    "Definition on '{}' has no '{}' handler function",
                    definition.entity,
                    K::HANDLER
                ),
            );
        }
        return sink.finish();
    };

    if let Some(code) = rules.require_async {
        if !is_async(handler) {
            sink.push(node_range(&handler), code, "Handler must be declared async");
        }
    }

    if rules.literal_return.is_some() || rules.missing_return_value.is_some() {
        check_returns(definition, handler, unit, &mut sink);
    }

    if let Some(ctx) = parameter_name(handler, unit.text(), 1) {
        check_context_calls::<K>(handler, unit, ctx, &mut sink);
    }

    sink.finish()
}

fn check_returns<K: DefinitionKind>(
    definition: &DefinitionObject<K>,
    handler: Node,
    unit: &SourceUnit,
    sink: &mut DiagnosticSink,
) {
    let rules = K::RULES;
    if let (Some(code), Some(body)) = (rules.literal_return, concise_body(handler)) {
        if is_literal(body, unit.text()) {
            sink.push(node_range(&body), code, literal_message(body, unit.text()));
        }
    }

    for statement in return_statements(handler) {
        match returned_expression(statement) {
            Some(value) => {
                if let Some(code) = rules.literal_return {
                    if is_literal(value, unit.text()) {
                        sink.push(
                            node_range(&statement),
                            code,
                            literal_message(value, unit.text()),
                        );
                    }
                }
            }
            None => {
                if let Some(code) = rules.missing_return_value {
                    if !K::bare_return_allowed(&definition.extra) {
                        sink.push(
                            node_range(&statement),
                            code,
                            "Handler must return the execution result; a bare return is only allowed for commit-phase or cross-transaction triggers",
                        );
                    }
                }
            }
        }
    }
}

/// Bare number, string or object literal, except the source text `0`
fn is_literal(expression: Node, source: &str) -> bool {
    let value = unwrap_expression(expression);
    match value.kind() {
        node_kinds::NUMBER => node_text(&value, source) != NO_OP_RETURN,
        node_kinds::STRING | node_kinds::TEMPLATE_STRING | node_kinds::OBJECT => true,
        _ => false,
    }
}

fn literal_message(value: Node, source: &str) -> String {
    format!(
        "Handler returns literal `{}`; return the affected row count or 0",
        node_text(&unwrap_expression(value), source)
    )
}

fn check_context_calls<K: DefinitionKind>(
    handler: Node,
    unit: &SourceUnit,
    ctx: &str,
    sink: &mut DiagnosticSink,
) {
    let source = unit.text();
    let Some(body) = handler.child_by_field_name("body") else {
        return;
    };
    let mut calls = Vec::new();
    if body.kind() == node_kinds::CALL_EXPRESSION {
        calls.push(body);
    }
    // Callbacks inside the handler still use the same context
    visit_descendants(body, true, &mut |node| {
        if node.kind() == node_kinds::CALL_EXPRESSION {
            calls.push(node);
        }
    });

    for call in calls {
        let Some(method) = context_method(call, source, ctx) else {
            continue;
        };
        let label = format!("{}.{}", ctx, method);
        check_context_call::<K>(call, &label, source, sink);
    }
}

/// Method name when `call` is `<ctx>.<method>(...)` for a known method
fn context_method<'s>(call: Node, source: &'s str, ctx: &str) -> Option<&'s str> {
    let callee = call.child_by_field_name("function")?;
    if callee.kind() != node_kinds::MEMBER_EXPRESSION {
        return None;
    }
    let object = callee.child_by_field_name("object")?;
    let property = callee.child_by_field_name("property")?;
    if object.kind() != node_kinds::IDENTIFIER || node_text(&object, source) != ctx {
        return None;
    }
    let method = node_text(&property, source);
    CONTEXT_METHODS.contains(method).then_some(method)
}

fn check_context_call<K: DefinitionKind>(
    call: Node,
    label: &str,
    source: &str,
    sink: &mut DiagnosticSink,
) {
    let rules = K::RULES;
    let top = promise_chain_top(call);
    let Some(parent) = top.parent() else {
        return;
    };

    match parent.kind() {
        node_kinds::AWAIT_EXPRESSION | node_kinds::RETURN_STATEMENT => {}
        node_kinds::ARROW_FUNCTION if parent.child_by_field_name("body") == Some(top) => {}
        node_kinds::VARIABLE_DECLARATOR if parent.child_by_field_name("value") == Some(top) => {
            match rules.bound_result {
                BoundResultPolicy::Reject => sink.push(
                    node_range(&call),
                    rules.context_call,
                    format!(
                        "`{}` result is bound without await; await it or return it directly",
                        label
                    ),
                ),
                BoundResultPolicy::RequireGuard { unguarded, destructured } => {
                    let Some(name) = parent.child_by_field_name("name") else {
                        return;
                    };
                    if name.kind() != node_kinds::IDENTIFIER {
                        sink.push(
                            node_range(&name),
                            destructured,
                            format!("Destructuring the result of `{}` is not supported", label),
                        );
                    } else if !guarded_in_block(parent, node_text(&name, source), source) {
                        sink.push(
                            node_range(&call),
                            unguarded,
                            format!(
                                "`{}` may return a Promise; guard `{}` with `instanceof Promise` in the same block",
                                label,
                                node_text(&name, source)
                            ),
                        );
                    }
                }
            }
        }
        _ => sink.push(
            node_range(&call),
            rules.context_call,
            format!("`{}` must be awaited or returned", label),
        ),
    }
}

/// Climb through transparent wrappers and `.then(...)`-style chains
fn promise_chain_top(call: Node) -> Node {
    let mut top = call;
    while let Some(parent) = top.parent() {
        match parent.kind() {
            node_kinds::PARENTHESIZED_EXPRESSION
            | node_kinds::AS_EXPRESSION
            | node_kinds::SATISFIES_EXPRESSION
            | node_kinds::NON_NULL_EXPRESSION => top = parent,
            node_kinds::MEMBER_EXPRESSION if parent.child_by_field_name("object") == Some(top) => {
                let chained = parent.parent().filter(|grand| {
                    grand.kind() == node_kinds::CALL_EXPRESSION
                        && grand.child_by_field_name("function") == Some(parent)
                });
                match chained {
                    Some(grand) => top = grand,
                    None => break,
                }
            }
            _ => break,
        }
    }
    top
}

/// Look for `<name> instanceof Promise` among the statements of the block
/// directly enclosing `declarator`; nested blocks do not count
fn guarded_in_block(declarator: Node, name: &str, source: &str) -> bool {
    let Some(block) = declarator.parent().and_then(|declaration| declaration.parent()) else {
        return false;
    };
    let mut cursor = block.walk();
    let statements: Vec<Node> = block.named_children(&mut cursor).collect();
    statements.into_iter().any(|statement| {
        is_promise_guard(statement, name, source) || contains_guard(statement, name, source)
    })
}

fn contains_guard(node: Node, name: &str, source: &str) -> bool {
    let mut cursor = node.walk();
    let children: Vec<Node> = node.named_children(&mut cursor).collect();
    children.into_iter().any(|child| {
        if child.kind() == node_kinds::STATEMENT_BLOCK || opens_function_scope(child.kind()) {
            return false;
        }
        is_promise_guard(child, name, source) || contains_guard(child, name, source)
    })
}

fn is_promise_guard(node: Node, name: &str, source: &str) -> bool {
    if node.kind() != node_kinds::BINARY_EXPRESSION {
        return false;
    }
    let operator = node.child_by_field_name("operator");
    let left = node.child_by_field_name("left").map(unwrap_expression);
    let right = node.child_by_field_name("right").map(unwrap_expression);
    match (operator, left, right) {
        (Some(op), Some(left), Some(right)) => {
            op.kind() == node_kinds::INSTANCEOF
                && left.kind() == node_kinds::IDENTIFIER
                && node_text(&left, source) == name
                && node_text(&right, source) == "Promise"
        }
        _ => false,
    }
}
