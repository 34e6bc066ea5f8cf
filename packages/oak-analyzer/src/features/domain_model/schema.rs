//! Projection field names from an entity's `Schema.ts`

use tree_sitter::Node;

use crate::features::parsing::{node_kinds, SourceUnit};
use crate::shared::utils::tree_sitter::{named_children, node_text, property_key_name};

/// Field names of the first intersection member of type alias `alias`.
///
/// `type Projection = { id: string; 'a-b'?: number } & Other` yields
/// `["id", "a-b"]`. Index signatures and methods are skipped. `None` when
/// the alias is absent or its first member is not an object type.
pub fn projection_fields(unit: &SourceUnit, alias: &str) -> Option<Vec<String>> {
    let source = unit.text();
    let declaration = find_type_alias(unit.root(), alias, source)?;
    let mut ty = declaration.child_by_field_name("value")?;

    loop {
        ty = match ty.kind() {
            node_kinds::PARENTHESIZED_TYPE => ty.named_child(0)?,
            // `A & B & C` nests to the left
            node_kinds::INTERSECTION_TYPE => ty.named_child(0)?,
            node_kinds::OBJECT_TYPE => break,
            _ => return None,
        };
    }

    Some(
        named_children(ty)
            .into_iter()
            .filter(|member| member.kind() == node_kinds::PROPERTY_SIGNATURE)
            .filter_map(|member| member.child_by_field_name("name"))
            .filter_map(|name| property_key_name(name, source))
            .collect(),
    )
}

fn find_type_alias<'t>(root: Node<'t>, alias: &str, source: &str) -> Option<Node<'t>> {
    for statement in named_children(root) {
        let declaration = match statement.kind() {
            node_kinds::TYPE_ALIAS_DECLARATION => statement,
            node_kinds::EXPORT_STATEMENT => match statement.child_by_field_name("declaration") {
                Some(decl) if decl.kind() == node_kinds::TYPE_ALIAS_DECLARATION => decl,
                _ => continue,
            },
            _ => continue,
        };
        let named = declaration
            .child_by_field_name("name")
            .is_some_and(|name| node_text(&name, source) == alias);
        if named {
            return Some(declaration);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::parsing::Dialect;

    fn fields(text: &str) -> Option<Vec<String>> {
        let unit = SourceUnit::parse_text("/Schema.ts", text, Dialect::TypeScript).unwrap();
        projection_fields(&unit, "Projection")
    }

    #[test]
    fn test_first_intersection_member() {
        let text = r#"
export type OpSchema = { id: string };
export type Projection = {
    id?: number;
    name: string;
    "$$createAt$$"?: number;
    [k: string]: any;
} & Partial<ExprOp<Attr>> & { extra: 1 };
"#;
        assert_eq!(
            fields(text),
            Some(vec!["id".to_string(), "name".to_string(), "$$createAt$$".to_string()])
        );
    }

    #[test]
    fn test_plain_object_alias() {
        assert_eq!(
            fields("type Projection = { id: string; name: string } & {};"),
            Some(vec!["id".to_string(), "name".to_string()])
        );
        assert_eq!(fields("type Projection = Other;"), None);
        assert_eq!(fields("type Nothing = {};"), None);
    }
}
