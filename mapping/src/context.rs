//! The mapping context: identity map of persisted objects.
//!
//! Each tracked object carries a snapshot of its mapped property values as
//! last read from or written to the server. The graph mapper diffs against
//! these snapshots to decide what a save must write.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use strand_core::{same_object, Entity, EntityRef, Properties};
use strand_metadata::EntityDescriptor;
use tracing::debug;

/// A persisted object as last observed.
#[derive(Clone)]
pub struct TrackedEntity {
    pub id: i64,
    pub type_name: String,
    pub entity: EntityRef,
    /// Graph property name to value.
    pub snapshot: Properties,
}

impl fmt::Debug for TrackedEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedEntity")
            .field("id", &self.id)
            .field("type_name", &self.type_name)
            .field("snapshot", &self.snapshot)
            .finish()
    }
}

/// A relationship known to exist on the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MappedRelationship {
    pub start: i64,
    pub rel_type: String,
    pub end: i64,
    pub id: Option<i64>,
}

impl MappedRelationship {
    pub fn new(start: i64, rel_type: impl Into<String>, end: i64) -> Self {
        Self {
            start,
            rel_type: rel_type.into(),
            end,
            id: None,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Check if the node is either endpoint.
    pub fn touches(&self, node: i64) -> bool {
        self.start == node || self.end == node
    }

    /// Same endpoints and type, ignoring the relationship id.
    pub fn same_shape(&self, other: &MappedRelationship) -> bool {
        self.start == other.start && self.end == other.end && self.rel_type == other.rel_type
    }
}

/// Identity map of one session.
#[derive(Debug, Default)]
pub struct MappingContext {
    nodes: HashMap<i64, TrackedEntity>,
    relationship_entities: HashMap<i64, TrackedEntity>,
    relationships: BTreeSet<MappedRelationship>,
}

impl MappingContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the mapped properties of an object, keyed by graph name.
    pub fn snapshot(descriptor: &EntityDescriptor, entity: &dyn Entity) -> Properties {
        descriptor
            .properties
            .iter()
            .map(|field| (field.graph_name().to_string(), entity.property(&field.name)))
            .collect()
    }

    // ==================== Entities ====================

    /// Get a tracked node by id.
    pub fn node(&self, id: i64) -> Option<&TrackedEntity> {
        self.nodes.get(&id)
    }

    /// Get a tracked relationship entity by id.
    pub fn relationship_entity(&self, id: i64) -> Option<&TrackedEntity> {
        self.relationship_entities.get(&id)
    }

    /// Get the tracked object for a descriptor's kind and id.
    pub fn tracked(&self, descriptor: &EntityDescriptor, id: i64) -> Option<&TrackedEntity> {
        if descriptor.is_relationship_entity() {
            self.relationship_entity(id)
        } else {
            self.node(id)
        }
    }

    /// Register or refresh an object under its identity.
    ///
    /// A different object already tracked under the same identity is replaced.
    pub fn register(&mut self, id: i64, descriptor: &EntityDescriptor, entity: &EntityRef) {
        let snapshot = Self::snapshot(descriptor, &*entity.borrow());
        let tracked = TrackedEntity {
            id,
            type_name: descriptor.name.clone(),
            entity: entity.clone(),
            snapshot,
        };
        let map = if descriptor.is_relationship_entity() {
            &mut self.relationship_entities
        } else {
            &mut self.nodes
        };
        if let Some(previous) = map.insert(id, tracked) {
            if !same_object(&previous.entity, entity) {
                debug!(id, type_name = %descriptor.name, "replaced tracked object with a different instance");
            }
        }
    }

    /// Check whether an object differs from its snapshot.
    ///
    /// Objects without identity, or not tracked, are dirty.
    pub fn is_dirty(&self, descriptor: &EntityDescriptor, entity: &dyn Entity) -> bool {
        let id = match entity.id() {
            Some(id) => id,
            None => return true,
        };
        match self.tracked(descriptor, id) {
            Some(tracked) => tracked.snapshot != Self::snapshot(descriptor, entity),
            None => true,
        }
    }

    /// Drop the snapshot of a tracked object so the next save rewrites it.
    pub fn invalidate(&mut self, descriptor: &EntityDescriptor, id: i64) {
        let map = if descriptor.is_relationship_entity() {
            &mut self.relationship_entities
        } else {
            &mut self.nodes
        };
        if let Some(tracked) = map.get_mut(&id) {
            tracked.snapshot.clear();
        }
    }

    /// Stop tracking a node and every relationship touching it.
    pub fn remove_node(&mut self, id: i64) -> Option<TrackedEntity> {
        self.relationships.retain(|r| !r.touches(id));
        self.nodes.remove(&id)
    }

    /// Stop tracking a relationship entity and its relationship.
    pub fn remove_relationship_entity(&mut self, id: i64) -> Option<TrackedEntity> {
        self.relationships.retain(|r| r.id != Some(id));
        self.relationship_entities.remove(&id)
    }

    /// Stop tracking an object, if it has an identity.
    pub fn remove_entity(&mut self, descriptor: &EntityDescriptor, entity: &dyn Entity) {
        if let Some(id) = entity.id() {
            if descriptor.is_relationship_entity() {
                self.remove_relationship_entity(id);
            } else {
                self.remove_node(id);
            }
        }
    }

    /// Stop tracking every object of a type. Returns how many were dropped.
    pub fn remove_type(&mut self, descriptor: &EntityDescriptor) -> usize {
        let ids: Vec<i64> = {
            let map = if descriptor.is_relationship_entity() {
                &self.relationship_entities
            } else {
                &self.nodes
            };
            map.values()
                .filter(|t| t.type_name == descriptor.name)
                .map(|t| t.id)
                .collect()
        };
        for &id in &ids {
            if descriptor.is_relationship_entity() {
                self.remove_relationship_entity(id);
            } else {
                self.remove_node(id);
            }
        }
        ids.len()
    }

    // ==================== Relationships ====================

    /// Remember a relationship. An entry of the same shape without an id is
    /// superseded by one with an id.
    pub fn remember(&mut self, relationship: MappedRelationship) {
        if relationship.id.is_some() {
            self.relationships
                .retain(|r| !(r.id.is_none() && r.same_shape(&relationship)));
        } else if self.relationships.iter().any(|r| r.same_shape(&relationship)) {
            return;
        }
        self.relationships.insert(relationship);
    }

    /// Forget a relationship: by id when it has one, otherwise by shape.
    pub fn forget(&mut self, relationship: &MappedRelationship) -> bool {
        let before = self.relationships.len();
        match relationship.id {
            Some(id) => self.relationships.retain(|r| r.id != Some(id)),
            None => self.relationships.retain(|r| !r.same_shape(relationship)),
        }
        self.relationships.len() != before
    }

    /// Check if a relationship of this shape is known, in either direction
    /// when `undirected`.
    pub fn is_remembered(&self, start: i64, rel_type: &str, end: i64, undirected: bool) -> bool {
        self.relationships.iter().any(|r| {
            r.rel_type == rel_type
                && ((r.start == start && r.end == end)
                    || (undirected && r.start == end && r.end == start))
        })
    }

    /// All remembered relationships.
    pub fn relationships(&self) -> impl Iterator<Item = &MappedRelationship> {
        self.relationships.iter()
    }

    // ==================== Bulk ====================

    /// Drop all state.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.relationship_entities.clear();
        self.relationships.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.relationship_entities.is_empty() && self.relationships.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn relationship_entity_count(&self) -> usize {
        self.relationship_entities.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }
}
