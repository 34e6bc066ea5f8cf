//! Domain model: entities, their projections and locales

pub mod entity;
pub mod extractor;
pub mod schema;

pub use entity::{
    lookup_entity, resolve_projection_path, EntityDescriptor, EntityDict, PathResolution,
};
pub use extractor::{DomainExtractor, DESC_SYMBOL};
pub use schema::projection_fields;
