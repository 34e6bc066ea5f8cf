//! Component scanner
//!
//! Finds `OakComponent({ ... })` calls in component entry files and reads
//! the options object: `entity` and `isList` as plain properties, the keys
//! returned by `formData` and the names declared under `methods`.

use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tree_sitter::Node;
use walkdir::WalkDir;

use super::model::{ComponentDescriptor, Platform, RenderFile, INDEX_FILES};
use crate::features::consistency::find_handler;
use crate::features::parsing::functions::{
    concise_body, return_statements, returned_expression, visit_descendants,
};
use crate::features::parsing::{node_kinds, SourceUnit};
use crate::shared::utils::normalize_path;
use crate::shared::utils::tree_sitter::{
    named_children, node_range, node_text, property_key_name, string_value, unwrap_expression,
};

/// Component declaration function
pub const COMPONENT_FUNCTION: &str = "OakComponent";

/// Entry files under `dirs`, skipping hidden directories and `node_modules`
pub fn discover_entry_files(dirs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for dir in dirs {
        if !dir.is_dir() {
            tracing::debug!("component directory {} does not exist", dir.display());
            continue;
        }
        let walker = WalkDir::new(dir).follow_links(false).into_iter().filter_entry(|e| {
            let name = e.file_name().to_string_lossy();
            e.depth() == 0 || (!name.starts_with('.') && name != "node_modules")
        });
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!("component walk error: {}", err);
                    continue;
                }
            };
            if entry.file_type().is_file() && is_entry_file(entry.path()) {
                files.push(normalize_path(entry.path()));
            }
        }
    }
    files.sort();
    files
}

pub fn is_entry_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| INDEX_FILES.contains(&name))
}

/// Scan every component under `dirs`
pub fn scan_components(dirs: &[PathBuf]) -> Vec<ComponentDescriptor> {
    let started = Instant::now();
    let files = discover_entry_files(dirs);
    let components: Vec<_> = files.par_iter().filter_map(|file| scan_file(file)).collect();
    tracing::info!(
        "component scan: {} components in {} entry files ({:?})",
        components.len(),
        files.len(),
        started.elapsed()
    );
    components
}

/// Scan one entry file, render siblings included
pub fn scan_file(path: &Path) -> Option<ComponentDescriptor> {
    let unit = match SourceUnit::read(path) {
        Ok(unit) => unit,
        Err(err) => {
            tracing::debug!("component file skipped: {}", err);
            return None;
        }
    };
    let mut descriptor = parse_component(&unit)?;
    descriptor.components = render_files(&descriptor.path);
    Some(descriptor)
}

/// Descriptor of the first `OakComponent` call in `unit`, without render
/// files
pub fn parse_component(unit: &SourceUnit) -> Option<ComponentDescriptor> {
    let source = unit.text();
    let mut options = None;
    visit_descendants(unit.root(), true, &mut |node| {
        if options.is_none() && node.kind() == node_kinds::CALL_EXPRESSION {
            options = component_options(node, source);
        }
    });
    let options = options?;

    let mut entity = None;
    let mut is_list = false;
    for member in named_children(options) {
        match member.kind() {
            node_kinds::PAIR => {
                let key = member
                    .child_by_field_name("key")
                    .and_then(|k| property_key_name(k, source));
                let Some(value) = member.child_by_field_name("value").map(unwrap_expression) else {
                    continue;
                };
                match key.as_deref() {
                    Some("entity") => match string_value(value, source) {
                        Some(name) => entity = Some((name, node_range(&value))),
                        None => tracing::debug!(
                            "{}: entity is not a string literal",
                            unit.path().display()
                        ),
                    },
                    Some("isList") => is_list = value.kind() == node_kinds::TRUE,
                    _ => {}
                }
            }
            node_kinds::SHORTHAND_PROPERTY_IDENTIFIER => {
                let name = node_text(&member, source);
                if name == "entity" || name == "isList" {
                    tracing::warn!(
                        "{}: shorthand '{}' is not supported",
                        unit.path().display(),
                        name
                    );
                }
            }
            node_kinds::SPREAD_ELEMENT => {
                tracing::warn!(
                    "{}: spread in component options is not supported",
                    unit.path().display()
                );
            }
            node_kinds::METHOD_DEFINITION if is_accessor(member) => {
                let name = member
                    .child_by_field_name("name")
                    .map(|n| node_text(&n, source))
                    .unwrap_or_default();
                if name == "entity" || name == "isList" {
                    tracing::warn!(
                        "{}: accessor '{}' is not supported",
                        unit.path().display(),
                        name
                    );
                }
            }
            _ => {}
        }
    }

    let Some((entity_name, entity_range)) = entity else {
        tracing::debug!("{}: component without entity skipped", unit.path().display());
        return None;
    };
    let path = unit
        .path()
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| unit.path().to_path_buf());

    Some(ComponentDescriptor {
        path,
        entry_file: unit.path().to_path_buf(),
        entity_name,
        entity_range,
        is_list,
        form_data_attrs: form_data_attrs(unit, options),
        method_names: method_names(options, source),
        components: Vec::new(),
    })
}

/// Render siblings present in `dir`
pub fn render_files(dir: &Path) -> Vec<RenderFile> {
    Platform::ALL
        .into_iter()
        .filter_map(|platform| {
            let path = dir.join(platform.file_name());
            path.is_file().then(|| RenderFile {
                platform,
                path: normalize_path(path),
            })
        })
        .collect()
}

/// `OakComponent(<object>)` -> the object
fn component_options<'t>(call: Node<'t>, source: &str) -> Option<Node<'t>> {
    let callee = call.child_by_field_name("function")?;
    if callee.kind() != node_kinds::IDENTIFIER || node_text(&callee, source) != COMPONENT_FUNCTION {
        return None;
    }
    let args = named_children(call.child_by_field_name("arguments")?);
    match args.as_slice() {
        [only] => {
            let only = unwrap_expression(*only);
            (only.kind() == node_kinds::OBJECT).then_some(only)
        }
        _ => None,
    }
}

fn is_accessor(method: Node) -> bool {
    let mut cursor = method.walk();
    let accessor = method
        .children(&mut cursor)
        .any(|child| matches!(child.kind(), node_kinds::GET | node_kinds::SET));
    accessor
}

/// Keys of the object(s) returned by `formData`
fn form_data_attrs(unit: &SourceUnit, options: Node) -> Option<Vec<String>> {
    let function = find_handler(unit, options, "formData")?;
    let source = unit.text();

    let mut returned: Vec<Node> = return_statements(function)
        .into_iter()
        .filter_map(returned_expression)
        .collect();
    returned.extend(concise_body(function));

    let mut attrs = Vec::new();
    for value in returned {
        let value = unwrap_expression(value);
        if value.kind() == node_kinds::OBJECT {
            collect_object_keys(value, source, &mut attrs);
        }
    }
    Some(attrs)
}

fn collect_object_keys(object: Node, source: &str, keys: &mut Vec<String>) {
    for member in named_children(object) {
        let key = match member.kind() {
            node_kinds::PAIR | node_kinds::METHOD_DEFINITION => {
                let field = if member.kind() == node_kinds::PAIR { "key" } else { "name" };
                member.child_by_field_name(field).and_then(|k| property_key_name(k, source))
            }
            node_kinds::SHORTHAND_PROPERTY_IDENTIFIER => {
                Some(node_text(&member, source).to_string())
            }
            node_kinds::SPREAD_ELEMENT => {
                if let Some(inner) = member.named_child(0).map(unwrap_expression) {
                    if inner.kind() == node_kinds::OBJECT {
                        collect_object_keys(inner, source, keys);
                    }
                }
                None
            }
            _ => None,
        };
        if let Some(key) = key {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
    }
}

/// Names declared in the `methods` object
fn method_names(options: Node, source: &str) -> Option<Vec<String>> {
    let methods = named_children(options).into_iter().find_map(|member| {
        if member.kind() != node_kinds::PAIR {
            return None;
        }
        let key = member.child_by_field_name("key").and_then(|k| property_key_name(k, source))?;
        let value = unwrap_expression(member.child_by_field_name("value")?);
        (key == "methods" && value.kind() == node_kinds::OBJECT).then_some(value)
    })?;

    let names = named_children(methods)
        .into_iter()
        .filter_map(|member| match member.kind() {
            node_kinds::METHOD_DEFINITION => member.child_by_field_name("name"),
            node_kinds::PAIR => {
                let value = unwrap_expression(member.child_by_field_name("value")?);
                node_kinds::is_function_like(value.kind())
                    .then(|| member.child_by_field_name("key"))
                    .flatten()
            }
            _ => None,
        })
        .filter_map(|name| property_key_name(name, source))
        .collect();
    Some(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::parsing::Dialect;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn parse(text: &str) -> Option<ComponentDescriptor> {
        let unit =
            SourceUnit::parse_text("/app/src/pages/user/list/index.ts", text, Dialect::TypeScript)
                .unwrap();
        parse_component(&unit)
    }

    #[test]
    fn test_reads_component_options() {
        let descriptor = parse(
            r#"
export default OakComponent({
    entity: 'user',
    isList: true,
    projection: { id: 1 },
    formData({ data }) {
        const base = { count: data.length };
        if (!data) {
            return { empty: true };
        }
        return { users: data, ...{ total: 1, users: 2 }, ...base };
    },
    methods: {
        async refresh() {},
        select: (id: string) => id,
        label: 'x',
    },
});
"#,
        )
        .unwrap();
        assert_eq!(descriptor.entity_name, "user");
        assert!(descriptor.is_list);
        assert_eq!(descriptor.path, PathBuf::from("/app/src/pages/user/list"));
        assert_eq!(
            descriptor.form_data_attrs,
            Some(vec!["empty".to_string(), "users".to_string(), "total".to_string()])
        );
        assert_eq!(
            descriptor.method_names,
            Some(vec!["refresh".to_string(), "select".to_string()])
        );
    }

    #[test]
    fn test_form_data_keys_behind_comments() {
        let descriptor = parse(
            "OakComponent({\n    entity: 'user',\n    formData() {\n        return /* rows */ { rows: [], total: 0 };\n    },\n});",
        )
        .unwrap();
        assert_eq!(
            descriptor.form_data_attrs,
            Some(vec!["rows".to_string(), "total".to_string()])
        );
    }

    #[test]
    fn test_unsupported_entity_forms_skip_component() {
        assert!(
            parse("const entity = 'user';\nOakComponent({ entity, isList: false });").is_none()
        );
        assert!(parse("OakComponent({ get entity() { return 'user'; } });").is_none());
        assert!(parse("OakComponent({ ...base });").is_none());
        assert!(parse("Other({ entity: 'user' });").is_none());

        let plain = parse("OakComponent({ entity: 'user' });").unwrap();
        assert!(!plain.is_list);
        assert_eq!(plain.form_data_attrs, None);
        assert_eq!(plain.method_names, None);
    }

    #[test]
    fn test_scan_attaches_render_files() {
        let dir = TempDir::new().unwrap();
        let component = dir.path().join("pages/user/detail");
        fs::create_dir_all(&component).unwrap();
        fs::write(
            component.join("index.ts"),
            "OakComponent({ entity: 'user', isList: false });",
        )
        .unwrap();
        fs::write(component.join("web.tsx"), "").unwrap();
        fs::write(component.join("index.xml"), "").unwrap();
        let ignored = dir.path().join("pages/node_modules/x");
        fs::create_dir_all(&ignored).unwrap();
        fs::write(ignored.join("index.ts"), "OakComponent({ entity: 'x' });").unwrap();

        let components = scan_components(&[dir.path().join("pages")]);
        assert_eq!(components.len(), 1);
        let platforms: Vec<_> = components[0].components.iter().map(|r| r.platform).collect();
        assert_eq!(platforms, vec![Platform::Web, Platform::WechatMp]);
        assert!(components[0].render_file(Platform::Web).is_some());
    }
}
