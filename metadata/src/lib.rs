//! Strand Metadata
//!
//! Immutable lookup of entity descriptors, keyed by type name.
//!
//! Responsibilities:
//! - Describe node entities (labels) and relationship entities (type name)
//! - Describe identity, property and relationship fields, with name overrides
//! - Resolve graph labels and relationship types back to descriptors
//! - Build and validate the lookup once, before any session uses it

mod builder;
mod metadata;
mod types;

pub use builder::{EntityBuilder, MetaDataBuilder, MetaDataError, MetaDataResult};
pub use metadata::MetaData;
pub use types::{
    infer_relationship_type, Direction, EntityDescriptor, EntityFactory, EntityKind,
    PropertyField, RelationshipField,
};
