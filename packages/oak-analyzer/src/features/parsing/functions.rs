//! Function node helpers shared by the handler checks and the component
//! scanner.

use tree_sitter::Node;

use super::node_kinds;
use crate::shared::utils::tree_sitter::{named_children, node_text};

/// True for nodes that open a new function (or class) body
pub fn opens_function_scope(kind: &str) -> bool {
    node_kinds::is_function_like(kind)
        || matches!(
            kind,
            node_kinds::FUNCTION_DECLARATION
                | node_kinds::METHOD_DEFINITION
                | node_kinds::CLASS_DECLARATION
                | node_kinds::CLASS
        )
}

/// Name of the `index`-th declared parameter, if it is a plain identifier
pub fn parameter_name<'s>(function: Node, source: &'s str, index: usize) -> Option<&'s str> {
    // `x => ...`
    if let Some(single) = function.child_by_field_name("parameter") {
        return (index == 0).then(|| node_text(&single, source));
    }
    let params = function.child_by_field_name("parameters")?;
    let param = named_children(params)
        .into_iter()
        .filter(|p| {
            matches!(
                p.kind(),
                node_kinds::REQUIRED_PARAMETER | node_kinds::OPTIONAL_PARAMETER
            )
        })
        .nth(index)?;
    let pattern = param.child_by_field_name("pattern")?;
    (pattern.kind() == node_kinds::IDENTIFIER).then(|| node_text(&pattern, source))
}

/// Visit every descendant of `node` in source order.
///
/// `enter_functions` decides whether nested function bodies are walked.
pub fn visit_descendants<'t>(
    node: Node<'t>,
    enter_functions: bool,
    visit: &mut impl FnMut(Node<'t>),
) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        visit(child);
        if !enter_functions && opens_function_scope(child.kind()) {
            continue;
        }
        visit_descendants(child, enter_functions, visit);
    }
}

/// `return` statements belonging to `function` itself (nested functions
/// excluded), in source order
pub fn return_statements<'t>(function: Node<'t>) -> Vec<Node<'t>> {
    let Some(body) = function.child_by_field_name("body") else {
        return Vec::new();
    };
    let mut returns = Vec::new();
    if body.kind() == node_kinds::RETURN_STATEMENT {
        returns.push(body);
    }
    visit_descendants(body, false, &mut |node| {
        if node.kind() == node_kinds::RETURN_STATEMENT {
            returns.push(node);
        }
    });
    returns
}

/// Value of a `return` statement, skipping comments; `None` for a bare
/// `return;`
pub fn returned_expression(statement: Node) -> Option<Node> {
    let mut cursor = statement.walk();
    let value = statement
        .named_children(&mut cursor)
        .find(|child| child.kind() != node_kinds::COMMENT);
    value
}

/// Body expression of an arrow function written without braces
pub fn concise_body(function: Node) -> Option<Node> {
    if function.kind() != node_kinds::ARROW_FUNCTION {
        return None;
    }
    function
        .child_by_field_name("body")
        .filter(|body| body.kind() != node_kinds::STATEMENT_BLOCK)
}
