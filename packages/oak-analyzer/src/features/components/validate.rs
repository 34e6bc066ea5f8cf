//! Component checks against the entity dictionary

use super::registry::ComponentMap;
use crate::config::CheckSeverities;
use crate::features::consistency::rules::DiagnosticSink;
use crate::features::domain_model::{lookup_entity, EntityDict};
use crate::shared::models::{DiagnosticsMap, IssueCode};

/// Diagnostics for every component entry file; files without findings map
/// to an empty list
pub fn validate_components(
    components: &ComponentMap,
    entities: &EntityDict,
    severities: &CheckSeverities,
) -> DiagnosticsMap {
    let mut map = DiagnosticsMap::new();
    for component in components.all() {
        let mut sink = DiagnosticSink::new(severities);
        if lookup_entity(entities, &component.entity_name).is_none() {
            sink.push(
                component.entity_range,
                IssueCode::ComponentUnknownEntity,
                format!("entity '{}' is not declared in the domain", component.entity_name),
            );
        }
        map.entry(component.entry_file.clone())
            .or_default()
            .extend(sink.finish());
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SeverityLevel;
    use crate::features::components::parse_component;
    use crate::features::domain_model::EntityDescriptor;
    use crate::features::parsing::{Dialect, SourceUnit};
    use serde_json::Map;

    fn component_map(entities: &[&str]) -> ComponentMap {
        let mut map = ComponentMap::new();
        for (i, entity) in entities.iter().enumerate() {
            let unit = SourceUnit::parse_text(
                format!("/app/pages/c{}/index.ts", i),
                format!("OakComponent({{ entity: '{}' }});", entity),
                Dialect::TypeScript,
            )
            .unwrap();
            map.insert(parse_component(&unit).unwrap());
        }
        map
    }

    #[test]
    fn test_unknown_entity_flagged() {
        let entities = EntityDict::from([(
            "user".to_string(),
            EntityDescriptor::new("user", Map::new()),
        )]);
        let map = validate_components(
            &component_map(&["user", "ghost"]),
            &entities,
            &CheckSeverities::default(),
        );
        assert_eq!(map.len(), 2);
        let flagged: Vec<_> = map.values().flatten().collect();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].code, IssueCode::ComponentUnknownEntity);
        assert_eq!(flagged[0].range.start.character, 23);
    }

    #[test]
    fn test_ignored_rule_yields_empty_lists() {
        let severities = CheckSeverities {
            unknown_entity: SeverityLevel::Ignore,
            ..CheckSeverities::default()
        };
        let map = validate_components(&component_map(&["ghost"]), &EntityDict::new(), &severities);
        assert!(map.values().all(Vec::is_empty));
    }
}
