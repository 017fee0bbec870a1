//! Reconstructs objects from graph results.
//!
//! Nodes resolve to descriptors by their labels, relationships attach to the
//! relationship fields whose type and direction accept them. Objects already
//! tracked under an identity are reused and refreshed, so a load never hands
//! out two objects for one node.

use crate::{MappedRelationship, MappingContext};
use std::collections::HashMap;
use strand_core::{same_object, EntityRef, GraphModel, Properties, RelationshipModel};
use strand_metadata::{EntityDescriptor, MetaData};
use tracing::debug;

/// A node object produced by a read.
#[derive(Clone)]
struct ReadNode {
    id: i64,
    entity: EntityRef,
    labels: Vec<String>,
}

impl ReadNode {
    fn is_a(&self, descriptor: &EntityDescriptor) -> bool {
        descriptor.labels().iter().all(|l| self.labels.contains(l))
    }
}

/// Objects produced by one read, in result order.
#[derive(Clone, Default)]
pub struct ReadResult {
    nodes: Vec<ReadNode>,
    relationship_entities: Vec<(i64, String, EntityRef)>,
}

impl ReadResult {
    /// Objects of a mapped type. Nodes match when they carry every label of
    /// the type, so a more specific type is returned for a general one.
    pub fn of_type(&self, descriptor: &EntityDescriptor) -> Vec<EntityRef> {
        if descriptor.is_relationship_entity() {
            return self
                .relationship_entities
                .iter()
                .filter(|(_, name, _)| *name == descriptor.name)
                .map(|(_, _, e)| e.clone())
                .collect();
        }
        self.nodes
            .iter()
            .filter(|n| n.is_a(descriptor))
            .map(|n| n.entity.clone())
            .collect()
    }

    /// The object read for an identity, if it is of the descriptor's type.
    pub fn by_id(&self, descriptor: &EntityDescriptor, id: i64) -> Option<EntityRef> {
        if descriptor.is_relationship_entity() {
            self.relationship_entities
                .iter()
                .find(|(rid, _, _)| *rid == id)
                .map(|(_, _, e)| e.clone())
        } else {
            self.nodes
                .iter()
                .find(|n| n.id == id && n.is_a(descriptor))
                .map(|n| n.entity.clone())
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.relationship_entities.is_empty()
    }
}

/// Reads graph results into objects, refreshing the mapping context.
pub struct GraphReader<'a> {
    metadata: &'a MetaData,
    context: &'a mut MappingContext,
}

impl<'a> GraphReader<'a> {
    /// Create a new reader.
    pub fn new(metadata: &'a MetaData, context: &'a mut MappingContext) -> Self {
        Self { metadata, context }
    }

    /// Read a graph fragment.
    pub fn read(&mut self, graph: &GraphModel) -> ReadResult {
        let mut result = ReadResult::default();
        let mut nodes: HashMap<i64, (EntityRef, &'a EntityDescriptor)> = HashMap::new();

        for node in &graph.nodes {
            let descriptor = match self.metadata.resolve_labels(&node.labels) {
                Some(d) => d,
                None => {
                    debug!(id = node.id, labels = ?node.labels, "no entity mapped for node labels");
                    continue;
                }
            };
            let entity = self.instance(descriptor, node.id, &node.properties);
            nodes.insert(node.id, (entity.clone(), descriptor));
            result.nodes.push(ReadNode {
                id: node.id,
                entity,
                labels: node.labels.clone(),
            });
        }

        let mut links: Vec<(EntityRef, String, EntityRef)> = Vec::new();
        for rel in &graph.relationships {
            let (start, start_descriptor) = match self.endpoint(&nodes, rel.start_node) {
                Some(found) => found,
                None => continue,
            };
            let (end, end_descriptor) = match self.endpoint(&nodes, rel.end_node) {
                Some(found) => found,
                None => continue,
            };

            match self.metadata.relationship_entity(&rel.rel_type) {
                Some(descriptor) => {
                    let entity = self.relationship_instance(descriptor, rel, &start, &end);
                    for field in &start_descriptor.relationships {
                        if field.rel_type == rel.rel_type
                            && field.direction.accepts_outgoing()
                            && field.target_type == descriptor.name
                        {
                            links.push((start.clone(), field.name.clone(), entity.clone()));
                        }
                    }
                    for field in &end_descriptor.relationships {
                        if field.rel_type == rel.rel_type
                            && field.direction.accepts_incoming()
                            && field.target_type == descriptor.name
                        {
                            links.push((end.clone(), field.name.clone(), entity.clone()));
                        }
                    }
                    result
                        .relationship_entities
                        .push((rel.id, descriptor.name.clone(), entity));
                }
                None => {
                    for field in &start_descriptor.relationships {
                        if field.rel_type == rel.rel_type
                            && field.direction.accepts_outgoing()
                            && self.accepts(&field.target_type, end_descriptor)
                        {
                            links.push((start.clone(), field.name.clone(), end.clone()));
                        }
                    }
                    for field in &end_descriptor.relationships {
                        if field.rel_type == rel.rel_type
                            && field.direction.accepts_incoming()
                            && self.accepts(&field.target_type, start_descriptor)
                        {
                            links.push((end.clone(), field.name.clone(), start.clone()));
                        }
                    }
                }
            }

            self.context.remember(
                MappedRelationship::new(rel.start_node, rel.rel_type.clone(), rel.end_node)
                    .with_id(rel.id),
            );
        }

        for (owner, field, target) in links {
            let mut current = owner.borrow().related(&field);
            if !current.iter().any(|e| same_object(e, &target)) {
                current.push(target);
                owner.borrow_mut().set_related(&field, current);
            }
        }

        result
    }

    /// Reuse the tracked object for a node, or instantiate one, then load
    /// its properties and refresh its snapshot.
    fn instance(&mut self, descriptor: &EntityDescriptor, id: i64, properties: &Properties) -> EntityRef {
        let entity = match self.context.tracked(descriptor, id) {
            Some(tracked) if tracked.type_name == descriptor.name => tracked.entity.clone(),
            _ => (descriptor.factory)(),
        };
        {
            let mut borrowed = entity.borrow_mut();
            borrowed.set_id(Some(id));
            // Properties the server lacks are null there, so the snapshot
            // must not keep a local value for them.
            for field in &descriptor.properties {
                let value = properties.get(field.graph_name()).cloned().unwrap_or_default();
                borrowed.set_property(&field.name, value);
            }
        }
        self.context.register(id, descriptor, &entity);
        entity
    }

    fn relationship_instance(
        &mut self,
        descriptor: &EntityDescriptor,
        rel: &RelationshipModel,
        start: &EntityRef,
        end: &EntityRef,
    ) -> EntityRef {
        let entity = self.instance(descriptor, rel.id, &rel.properties);
        {
            let mut borrowed = entity.borrow_mut();
            if let Some(field) = &descriptor.start_field {
                borrowed.set_related(field, vec![start.clone()]);
            }
            if let Some(field) = &descriptor.end_field {
                borrowed.set_related(field, vec![end.clone()]);
            }
        }
        entity
    }

    /// A relationship endpoint read now, or tracked from an earlier read.
    fn endpoint(
        &self,
        nodes: &HashMap<i64, (EntityRef, &'a EntityDescriptor)>,
        id: i64,
    ) -> Option<(EntityRef, &'a EntityDescriptor)> {
        if let Some((entity, descriptor)) = nodes.get(&id) {
            return Some((entity.clone(), *descriptor));
        }
        let tracked = self.context.node(id)?;
        let descriptor = self.metadata.descriptor(&tracked.type_name)?;
        Some((tracked.entity.clone(), descriptor))
    }

    /// Check whether a field typed `target_type` can hold an object of `candidate`.
    fn accepts(&self, target_type: &str, candidate: &EntityDescriptor) -> bool {
        if target_type == candidate.name {
            return true;
        }
        match self.metadata.descriptor(target_type) {
            Some(target) => target
                .labels()
                .iter()
                .all(|l| candidate.labels().contains(l)),
            None => false,
        }
    }
}
