//! TypeScript tree-sitter node kinds
//!
//! These constants match the exact node type names from the
//! tree-sitter-typescript grammar.
//! Source: https://github.com/tree-sitter/tree-sitter-typescript/blob/master/common/define-grammar.js

// Program structure
pub const PROGRAM: &str = "program";
pub const COMMENT: &str = "comment";

// Import/Export
pub const IMPORT_STATEMENT: &str = "import_statement";
pub const IMPORT_CLAUSE: &str = "import_clause";
pub const NAMED_IMPORTS: &str = "named_imports";
pub const IMPORT_SPECIFIER: &str = "import_specifier";
pub const NAMESPACE_IMPORT: &str = "namespace_import";
pub const EXPORT_STATEMENT: &str = "export_statement";
pub const EXPORT_CLAUSE: &str = "export_clause";
pub const EXPORT_SPECIFIER: &str = "export_specifier";
pub const NAMESPACE_EXPORT: &str = "namespace_export";

// Declarations
pub const LEXICAL_DECLARATION: &str = "lexical_declaration";
pub const VARIABLE_DECLARATION: &str = "variable_declaration";
pub const VARIABLE_DECLARATOR: &str = "variable_declarator";
pub const FUNCTION_DECLARATION: &str = "function_declaration";
pub const CLASS_DECLARATION: &str = "class_declaration";
pub const CLASS: &str = "class";
pub const TYPE_ALIAS_DECLARATION: &str = "type_alias_declaration";

// Literals
pub const OBJECT: &str = "object";
pub const PAIR: &str = "pair";
pub const ARRAY: &str = "array";
pub const STRING: &str = "string";
pub const TEMPLATE_STRING: &str = "template_string";
pub const TEMPLATE_SUBSTITUTION: &str = "template_substitution";
pub const NUMBER: &str = "number";
pub const TRUE: &str = "true";
pub const FALSE: &str = "false";
pub const NULL: &str = "null";
pub const UNDEFINED: &str = "undefined";

// Object members
pub const SHORTHAND_PROPERTY_IDENTIFIER: &str = "shorthand_property_identifier";
pub const SPREAD_ELEMENT: &str = "spread_element";
pub const METHOD_DEFINITION: &str = "method_definition";
pub const COMPUTED_PROPERTY_NAME: &str = "computed_property_name";

// Names
pub const IDENTIFIER: &str = "identifier";
pub const PROPERTY_IDENTIFIER: &str = "property_identifier";
pub const PRIVATE_PROPERTY_IDENTIFIER: &str = "private_property_identifier";

// Expression wrappers
pub const AS_EXPRESSION: &str = "as_expression";
pub const SATISFIES_EXPRESSION: &str = "satisfies_expression";
pub const NON_NULL_EXPRESSION: &str = "non_null_expression";
pub const PARENTHESIZED_EXPRESSION: &str = "parenthesized_expression";

// Expressions
pub const UNARY_EXPRESSION: &str = "unary_expression";
pub const AWAIT_EXPRESSION: &str = "await_expression";
pub const CALL_EXPRESSION: &str = "call_expression";
pub const MEMBER_EXPRESSION: &str = "member_expression";
pub const BINARY_EXPRESSION: &str = "binary_expression";
pub const ARGUMENTS: &str = "arguments";

// Functions
pub const ARROW_FUNCTION: &str = "arrow_function";
pub const FUNCTION_EXPRESSION: &str = "function_expression";
/// Older grammar revisions name function expressions `function`
pub const FUNCTION: &str = "function";
pub const FORMAL_PARAMETERS: &str = "formal_parameters";
pub const REQUIRED_PARAMETER: &str = "required_parameter";
pub const OPTIONAL_PARAMETER: &str = "optional_parameter";

// Patterns
pub const OBJECT_PATTERN: &str = "object_pattern";
pub const ARRAY_PATTERN: &str = "array_pattern";

// Statements
pub const STATEMENT_BLOCK: &str = "statement_block";
pub const EXPRESSION_STATEMENT: &str = "expression_statement";
pub const RETURN_STATEMENT: &str = "return_statement";
pub const IF_STATEMENT: &str = "if_statement";
pub const ELSE_CLAUSE: &str = "else_clause";
pub const SWITCH_STATEMENT: &str = "switch_statement";
pub const SWITCH_BODY: &str = "switch_body";
pub const SWITCH_CASE: &str = "switch_case";
pub const SWITCH_DEFAULT: &str = "switch_default";
pub const TRY_STATEMENT: &str = "try_statement";
pub const CATCH_CLAUSE: &str = "catch_clause";
pub const FINALLY_CLAUSE: &str = "finally_clause";
pub const FOR_STATEMENT: &str = "for_statement";
pub const FOR_IN_STATEMENT: &str = "for_in_statement";
pub const WHILE_STATEMENT: &str = "while_statement";
pub const DO_STATEMENT: &str = "do_statement";
pub const LABELED_STATEMENT: &str = "labeled_statement";

// Types
pub const INTERSECTION_TYPE: &str = "intersection_type";
pub const OBJECT_TYPE: &str = "object_type";
pub const PROPERTY_SIGNATURE: &str = "property_signature";
pub const PARENTHESIZED_TYPE: &str = "parenthesized_type";

// Keywords / modifiers (anonymous tokens)
pub const ASYNC: &str = "async";
pub const DEFAULT: &str = "default";
pub const TYPE: &str = "type";
pub const GET: &str = "get";
pub const SET: &str = "set";
pub const STAR: &str = "*";
pub const INSTANCEOF: &str = "instanceof";

/// True for every node kind that is a function value
pub fn is_function_like(kind: &str) -> bool {
    matches!(kind, ARROW_FUNCTION | FUNCTION_EXPRESSION | FUNCTION)
}
