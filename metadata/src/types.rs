//! Entity descriptor types.

use convert_case::{Case, Casing};
use std::fmt;
use strand_core::EntityRef;

/// Creates an empty instance of a mapped type when reading results.
pub type EntityFactory = fn() -> EntityRef;

/// Direction of a relationship field, seen from the owning entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// `(owner)-[:TYPE]->(target)`
    Outgoing,
    /// `(owner)<-[:TYPE]-(target)`
    Incoming,
    /// Either way. Written as outgoing.
    Undirected,
}

impl Direction {
    /// Check if this field accepts a relationship leaving the owner.
    pub fn accepts_outgoing(&self) -> bool {
        matches!(self, Direction::Outgoing | Direction::Undirected)
    }

    /// Check if this field accepts a relationship arriving at the owner.
    pub fn accepts_incoming(&self) -> bool {
        matches!(self, Direction::Incoming | Direction::Undirected)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Outgoing => write!(f, "OUTGOING"),
            Direction::Incoming => write!(f, "INCOMING"),
            Direction::Undirected => write!(f, "UNDIRECTED"),
        }
    }
}

/// What a descriptor maps onto.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityKind {
    /// A node with one or more labels. The first label is the primary one.
    Node { labels: Vec<String> },
    /// A relationship of the given type.
    Relationship { rel_type: String },
}

/// Property field definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyField {
    /// Field name on the domain object.
    pub name: String,
    /// Graph property name, if it differs from the field name.
    pub property_name: Option<String>,
}

impl PropertyField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            property_name: None,
        }
    }

    pub fn renamed(name: impl Into<String>, property_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            property_name: Some(property_name.into()),
        }
    }

    /// The name this field is stored under in the graph.
    pub fn graph_name(&self) -> &str {
        self.property_name.as_deref().unwrap_or(&self.name)
    }
}

/// Relationship field definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipField {
    /// Field name on the domain object.
    pub name: String,
    /// Relationship type written to the graph.
    pub rel_type: String,
    /// Direction seen from the owner.
    pub direction: Direction,
    /// Type name of the field's elements: a node entity, or a relationship
    /// entity whose start or end is the owner.
    pub target_type: String,
}

/// Descriptor of a mapped type.
#[derive(Debug, Clone)]
pub struct EntityDescriptor {
    /// Type name (the key of the lookup).
    pub name: String,
    /// Node labels or relationship type.
    pub kind: EntityKind,
    /// Name of the identity field.
    pub identity_field: String,
    /// Property fields, in declaration order.
    pub properties: Vec<PropertyField>,
    /// Relationship fields, in declaration order.
    pub relationships: Vec<RelationshipField>,
    /// Start node field of a relationship entity.
    pub start_field: Option<String>,
    /// End node field of a relationship entity.
    pub end_field: Option<String>,
    /// Instantiates the type when reading results.
    pub factory: EntityFactory,
}

impl EntityDescriptor {
    /// Check if this describes a relationship entity.
    pub fn is_relationship_entity(&self) -> bool {
        matches!(self.kind, EntityKind::Relationship { .. })
    }

    /// Node labels; empty for relationship entities.
    pub fn labels(&self) -> &[String] {
        match &self.kind {
            EntityKind::Node { labels } => labels,
            EntityKind::Relationship { .. } => &[],
        }
    }

    /// Relationship type of a relationship entity.
    pub fn rel_type(&self) -> Option<&str> {
        match &self.kind {
            EntityKind::Node { .. } => None,
            EntityKind::Relationship { rel_type } => Some(rel_type),
        }
    }

    /// The primary label of a node entity, or the type of a relationship entity.
    pub fn entity_type(&self) -> &str {
        match &self.kind {
            EntityKind::Node { labels } => labels
                .first()
                .map(String::as_str)
                .unwrap_or(self.name.as_str()),
            EntityKind::Relationship { rel_type } => rel_type,
        }
    }

    /// Get a property field by field name.
    pub fn property_field(&self, name: &str) -> Option<&PropertyField> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Resolve a field name to its graph property name, honouring overrides.
    ///
    /// Unknown names are returned unchanged.
    pub fn graph_property_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.property_field(name)
            .map(PropertyField::graph_name)
            .unwrap_or(name)
    }

    /// Get a relationship field by field name.
    pub fn relationship_field(&self, name: &str) -> Option<&RelationshipField> {
        self.relationships.iter().find(|r| r.name == name)
    }
}

/// Infer a relationship type from a field name: `worksWith` becomes `WORKS_WITH`.
pub fn infer_relationship_type(field_name: &str) -> String {
    field_name.to_case(Case::Constant)
}
