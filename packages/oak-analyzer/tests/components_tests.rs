//! Component map maintenance and entity validation

mod common;

use common::*;
use oak_analyzer::features::components::{validate_components, Platform};
use oak_analyzer::{CheckSeverities, ComponentMap, DomainExtractor, IssueCode, ProjectLayout};
use pretty_assertions::assert_eq;

fn component(entity: &str, is_list: bool) -> String {
    format!(
        r#"export default OakComponent({{
    entity: '{entity}',
    isList: {is_list},
    projection: {{ id: 1 }},
    formData({{ data }}) {{
        return {{ items: data }};
    }},
    methods: {{
        reload() {{}},
    }},
}});
"#
    )
}

fn layout_dirs(project: &Project) -> Vec<std::path::PathBuf> {
    ProjectLayout::default().component_dirs(&project.root())
}

#[test]
fn test_scan_groups_components_by_entity() {
    let project = Project::new();
    project.write("src/pages/user/list/index.ts", &component("user", true));
    project.write("src/pages/user/list/web.pc.tsx", "");
    project.write("src/pages/user/list/index.xml", "");
    project.write("src/components/user/detail/index.tsx", &component("user", false));
    project.write("src/components/order/list/index.js", &component("order", true));
    project.write("src/components/plain/index.ts", "export const x = 1;\n");
    project.write("src/pages/.cache/index.ts", &component("cache", true));

    let map = ComponentMap::scan(&layout_dirs(&project));
    assert_eq!(map.len(), 3);
    assert_eq!(map.entities().collect::<Vec<_>>(), vec!["order", "user"]);

    let list = map.by_dir(&project.path("src/pages/user/list")).unwrap();
    assert!(list.is_list);
    assert_eq!(list.form_data_attrs, Some(vec!["items".to_string()]));
    assert_eq!(list.method_names, Some(vec!["reload".to_string()]));
    let platforms: Vec<_> = list.components.iter().map(|r| r.platform).collect();
    assert_eq!(platforms, vec![Platform::WebPc, Platform::WechatMp]);

    let json = serde_json::to_value(list).unwrap();
    assert_eq!(json["entityName"], "user");
    assert_eq!(json["components"][0]["type"], "web.pc");
}

#[test]
fn test_edits_patch_the_map() {
    let project = Project::new();
    let entry = project.write("src/pages/user/list/index.ts", &component("user", true));
    project.write("src/pages/order/list/index.ts", &component("order", true));
    let mut map = ComponentMap::scan(&layout_dirs(&project));

    project.write("src/pages/user/list/index.ts", &component("account", true));
    assert!(map.rescan_file(&entry));
    assert_eq!(map.get("user").len(), 0);
    assert_eq!(map.get("account").len(), 1);
    assert_eq!(map.len(), 2);

    let web = project.write("src/pages/user/list/web.tsx", "");
    assert!(map.rescan_file(&web));
    assert_eq!(map.get("account")[0].components.len(), 1);

    project.remove("src/pages/user/list/web.tsx");
    assert!(map.remove_file(&web));
    assert!(map.get("account")[0].components.is_empty());

    project.write("src/pages/user/list/index.ts", "export default {};\n");
    assert!(map.rescan_file(&entry));
    assert_eq!(map.len(), 1);
}

#[test]
fn test_directory_removal_drops_nested_components() {
    let project = Project::new();
    project.write("src/pages/user/list/index.ts", &component("user", true));
    project.write("src/pages/user/detail/index.ts", &component("user", false));
    project.write("src/pages/order/list/index.ts", &component("order", true));
    let mut map = ComponentMap::scan(&layout_dirs(&project));

    let removed = project.remove("src/pages/user");
    assert!(map.remove_file(&removed));
    assert_eq!(map.entities().collect::<Vec<_>>(), vec!["order"]);
}

#[test]
fn test_unknown_entities_are_flagged() {
    let project = Project::new();
    write_domain(&project, &[("user", "{ attributes: {}, actions: [] }", &["id"])]);
    let known = project.write("src/pages/user/list/index.ts", &component("user", true));
    let unknown = project.write("src/pages/ghost/list/index.ts", &component("ghost", true));

    let dict = DomainExtractor::new(ProjectLayout::default())
        .analyze(&project.root())
        .unwrap();
    let map = ComponentMap::scan(&layout_dirs(&project));
    let diagnostics = validate_components(&map, &dict, &CheckSeverities::default());

    assert!(diagnostics[&known].is_empty());
    let flagged = &diagnostics[&unknown];
    assert_eq!(flagged.len(), 1);
    assert_eq!(flagged[0].code, IssueCode::ComponentUnknownEntity);
    assert_eq!(flagged[0].range.start.line, 1);
}
