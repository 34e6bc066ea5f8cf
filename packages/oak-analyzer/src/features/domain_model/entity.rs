//! Entity descriptors and projection path resolution

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Entity name -> descriptor, keyed exactly as in the schema registry
pub type EntityDict = BTreeMap<String, EntityDescriptor>;

/// One entity of the domain.
///
/// Serializes as the folded description object with `projectionList` and
/// `locales` added next to its own fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDescriptor {
    #[serde(skip)]
    pub name: String,

    /// Folded `desc` object of the entity's description module
    #[serde(flatten)]
    pub storage_desc: Map<String, Value>,

    pub projection_list: Vec<String>,

    /// Language -> locale object, from `locales/<lang>.json`
    pub locales: BTreeMap<String, Value>,
}

impl EntityDescriptor {
    pub fn new(name: impl Into<String>, storage_desc: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            storage_desc,
            projection_list: Vec::new(),
            locales: BTreeMap::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.storage_desc.get("attributes")?.get(name)
    }

    pub fn has_projection(&self, field: &str) -> bool {
        self.projection_list.iter().any(|f| f == field)
    }

    /// Entity referenced by `field`, through a `<field>Id` attribute of
    /// type `ref`
    pub fn ref_target(&self, field: &str) -> Option<&str> {
        let attr = self.attribute(&format!("{}Id", field))?;
        if attr.get("type")?.as_str()? != "ref" {
            return None;
        }
        attr.get("ref")?.as_str()
    }
}

/// Look up an entity by name, falling back to a case-insensitive match
pub fn lookup_entity<'d>(dict: &'d EntityDict, name: &str) -> Option<&'d EntityDescriptor> {
    dict.get(name).or_else(|| {
        dict.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, descriptor)| descriptor)
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PathResolution {
    /// `attr` is a projection field of `entity`
    Resolved { entity: String, attr: String },
    /// First segment that does not resolve, with its index in the path
    Unresolved { segment: String, position: usize },
}

/// Walk a dotted attribute path (`"creator.mobile"`) from `entity`.
///
/// Every segment must be a projection field of the current entity; every
/// segment but the last must also reference another entity.
pub fn resolve_projection_path(dict: &EntityDict, entity: &str, path: &str) -> PathResolution {
    let segments: Vec<&str> = path.split('.').collect();
    let mut current = lookup_entity(dict, entity);

    for (position, segment) in segments.iter().enumerate() {
        let unresolved = || PathResolution::Unresolved {
            segment: segment.to_string(),
            position,
        };
        let Some(descriptor) = current else {
            return unresolved();
        };
        if segment.is_empty() || !descriptor.has_projection(segment) {
            return unresolved();
        }
        if position + 1 == segments.len() {
            return PathResolution::Resolved {
                entity: descriptor.name.clone(),
                attr: segment.to_string(),
            };
        }
        match descriptor.ref_target(segment) {
            Some(target) => current = lookup_entity(dict, target),
            None => return unresolved(),
        }
    }
    // `split` always yields at least one segment
    PathResolution::Unresolved {
        segment: String::new(),
        position: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn entity(name: &str, desc: Value, projection: &[&str]) -> (String, EntityDescriptor) {
        let Value::Object(desc) = desc else {
            panic!("description must be an object");
        };
        let mut descriptor = EntityDescriptor::new(name, desc);
        descriptor.projection_list = projection.iter().map(|s| s.to_string()).collect();
        (name.to_string(), descriptor)
    }

    fn dict() -> EntityDict {
        EntityDict::from([
            entity(
                "order",
                json!({ "attributes": {
                    "creatorId": { "type": "ref", "ref": "user" },
                    "price": { "type": "money" }
                }}),
                &["id", "price", "creator", "creatorId"],
            ),
            entity("user", json!({ "attributes": {} }), &["id", "name", "mobile"]),
        ])
    }

    #[test]
    fn test_descriptor_serializes_flat() {
        let (_, descriptor) = entity("user", json!({ "entity": "user" }), &["id"]);
        assert_eq!(
            serde_json::to_value(&descriptor).unwrap(),
            json!({ "entity": "user", "projectionList": ["id"], "locales": {} })
        );
    }

    #[test]
    fn test_resolves_through_ref_attribute() {
        assert_eq!(
            resolve_projection_path(&dict(), "order", "creator.mobile"),
            PathResolution::Resolved {
                entity: "user".to_string(),
                attr: "mobile".to_string()
            }
        );
        assert_eq!(
            resolve_projection_path(&dict(), "Order", "price"),
            PathResolution::Resolved {
                entity: "order".to_string(),
                attr: "price".to_string()
            }
        );
    }

    #[test]
    fn test_reports_first_failing_segment() {
        assert_eq!(
            resolve_projection_path(&dict(), "order", "creator.email"),
            PathResolution::Unresolved {
                segment: "email".to_string(),
                position: 1
            }
        );
        // `price` is a field but not a reference
        assert_eq!(
            resolve_projection_path(&dict(), "order", "price.amount"),
            PathResolution::Unresolved {
                segment: "price".to_string(),
                position: 0
            }
        );
        assert_eq!(
            resolve_projection_path(&dict(), "missing", "id"),
            PathResolution::Unresolved {
                segment: "id".to_string(),
                position: 0
            }
        );
    }
}
