//! MetaDataBuilder for constructing an immutable MetaData.

use crate::{
    infer_relationship_type, Direction, EntityDescriptor, EntityFactory, EntityKind, MetaData,
    PropertyField, RelationshipField,
};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during metadata construction.
#[derive(Debug, Error, PartialEq)]
pub enum MetaDataError {
    #[error("Duplicate entity type: {0}")]
    DuplicateType(String),

    #[error("Entity type {0} declares no identity field")]
    MissingIdentity(String),

    #[error("Relationship entity {name} declares no {endpoint} node field")]
    MissingEndpoint { name: String, endpoint: &'static str },

    #[error("Field {owner}.{field} targets unknown entity type: {target}")]
    UnknownTargetType {
        owner: String,
        field: String,
        target: String,
    },
}

/// Result type for metadata construction.
pub type MetaDataResult<T> = Result<T, MetaDataError>;

/// Builder for constructing an immutable MetaData.
#[derive(Debug, Default)]
pub struct MetaDataBuilder {
    /// Descriptors being built, in declaration order.
    descriptors: Vec<EntityDescriptor>,
    /// Type name to descriptor index.
    names: HashMap<String, usize>,
}

impl MetaDataBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node entity. Without an explicit label the type name is used.
    pub fn add_node_entity(
        &mut self,
        name: impl Into<String>,
        factory: EntityFactory,
    ) -> EntityBuilder<'_> {
        EntityBuilder::new(self, name.into(), None, factory)
    }

    /// Add a relationship entity of the given relationship type.
    pub fn add_relationship_entity(
        &mut self,
        name: impl Into<String>,
        rel_type: impl Into<String>,
        factory: EntityFactory,
    ) -> EntityBuilder<'_> {
        EntityBuilder::new(self, name.into(), Some(rel_type.into()), factory)
    }

    /// Build the immutable MetaData.
    ///
    /// Relationship fields whose target is a relationship entity take that
    /// entity's relationship type.
    pub fn build(self) -> MetaDataResult<MetaData> {
        let rel_types: HashMap<String, String> = self
            .descriptors
            .iter()
            .filter_map(|d| d.rel_type().map(|t| (d.name.clone(), t.to_string())))
            .collect();

        let mut descriptors = self.descriptors;
        for descriptor in &mut descriptors {
            for field in &mut descriptor.relationships {
                if !self.names.contains_key(&field.target_type) {
                    return Err(MetaDataError::UnknownTargetType {
                        owner: descriptor.name.clone(),
                        field: field.name.clone(),
                        target: field.target_type.clone(),
                    });
                }
                if let Some(rel_type) = rel_types.get(&field.target_type) {
                    field.rel_type = rel_type.clone();
                }
            }
        }

        Ok(MetaData::new(descriptors))
    }
}

/// Builder for one entity descriptor.
pub struct EntityBuilder<'a> {
    builder: &'a mut MetaDataBuilder,
    name: String,
    rel_type: Option<String>,
    labels: Vec<String>,
    identity_field: Option<String>,
    properties: Vec<PropertyField>,
    relationships: Vec<RelationshipField>,
    start_field: Option<String>,
    end_field: Option<String>,
    factory: EntityFactory,
}

impl<'a> EntityBuilder<'a> {
    fn new(
        builder: &'a mut MetaDataBuilder,
        name: String,
        rel_type: Option<String>,
        factory: EntityFactory,
    ) -> Self {
        Self {
            builder,
            name,
            rel_type,
            labels: Vec::new(),
            identity_field: None,
            properties: Vec::new(),
            relationships: Vec::new(),
            start_field: None,
            end_field: None,
            factory,
        }
    }

    /// Add a node label. The first label added is the primary one.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    /// Set the identity field.
    pub fn identity(mut self, field: impl Into<String>) -> Self {
        self.identity_field = Some(field.into());
        self
    }

    /// Add a property stored under its field name.
    pub fn property(mut self, field: impl Into<String>) -> Self {
        self.properties.push(PropertyField::new(field));
        self
    }

    /// Add a property stored under a different graph property name.
    pub fn property_as(mut self, field: impl Into<String>, property_name: impl Into<String>) -> Self {
        self.properties.push(PropertyField::renamed(field, property_name));
        self
    }

    /// Add an unannotated relationship field: the type is inferred from the
    /// field name and the direction is undirected.
    pub fn relationship(mut self, field: impl Into<String>, target: impl Into<String>) -> Self {
        let field = field.into();
        self.relationships.push(RelationshipField {
            rel_type: infer_relationship_type(&field),
            name: field,
            direction: Direction::Undirected,
            target_type: target.into(),
        });
        self
    }

    /// Add a relationship field with an explicit type and direction.
    pub fn relationship_with(
        mut self,
        field: impl Into<String>,
        rel_type: impl Into<String>,
        direction: Direction,
        target: impl Into<String>,
    ) -> Self {
        self.relationships.push(RelationshipField {
            name: field.into(),
            rel_type: rel_type.into(),
            direction,
            target_type: target.into(),
        });
        self
    }

    /// Set the start node field of a relationship entity.
    pub fn start(mut self, field: impl Into<String>) -> Self {
        self.start_field = Some(field.into());
        self
    }

    /// Set the end node field of a relationship entity.
    pub fn end(mut self, field: impl Into<String>) -> Self {
        self.end_field = Some(field.into());
        self
    }

    /// Finish building this entity.
    pub fn done(self) -> MetaDataResult<()> {
        if self.builder.names.contains_key(&self.name) {
            return Err(MetaDataError::DuplicateType(self.name));
        }

        let identity_field = match self.identity_field {
            Some(field) => field,
            None => return Err(MetaDataError::MissingIdentity(self.name)),
        };

        let kind = match self.rel_type {
            Some(rel_type) => {
                if self.start_field.is_none() {
                    return Err(MetaDataError::MissingEndpoint {
                        name: self.name,
                        endpoint: "start",
                    });
                }
                if self.end_field.is_none() {
                    return Err(MetaDataError::MissingEndpoint {
                        name: self.name,
                        endpoint: "end",
                    });
                }
                EntityKind::Relationship { rel_type }
            }
            None => {
                let mut labels = self.labels;
                if labels.is_empty() {
                    labels.push(self.name.clone());
                }
                EntityKind::Node { labels }
            }
        };

        let descriptor = EntityDescriptor {
            name: self.name.clone(),
            kind,
            identity_field,
            properties: self.properties,
            relationships: self.relationships,
            start_field: self.start_field,
            end_field: self.end_field,
            factory: self.factory,
        };

        let index = self.builder.descriptors.len();
        self.builder.descriptors.push(descriptor);
        self.builder.names.insert(self.name, index);

        Ok(())
    }
}
