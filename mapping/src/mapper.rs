//! The graph mapper: compiles an object graph into a statement batch.
//!
//! Objects are visited breadth-first from the root along declared
//! relationship fields, up to the requested depth (-1 for no bound). The
//! visited set is keyed by object reference, since new objects have no
//! server identity yet. Each visited element is compared with its snapshot
//! in the mapping context:
//!
//! - no identity: create it
//! - identity, changed properties: update it
//! - identity, unchanged: nothing
//!
//! Relationships remembered by the context for an expanded field, but no
//! longer present in the object graph, are deleted. A persisted relationship
//! entity whose start or end node changed is deleted and created again.

use crate::compiler::{CreateStatementBuilder, Updated};
use crate::{
    Binding, CompiledBatch, CompiledStatement, MappedRelationship, MappingContext, MappingError,
    MappingResult, NodeRef,
};
use std::collections::{HashMap, HashSet, VecDeque};
use strand_core::{props, EntityRef, ObjectKey, Properties};
use strand_cypher::Statement;
use strand_metadata::{Direction, EntityDescriptor, MetaData};
use tracing::{debug, info};

/// A relationship field expanded on a persisted owner.
struct Expanded {
    owner: i64,
    rel_type: String,
    direction: Direction,
    relationship_entities: bool,
}

/// Compilation state of one save.
#[derive(Default)]
struct CompileState {
    create: CreateStatementBuilder,
    /// Alias of every new node, by object.
    aliases: HashMap<ObjectKey, String>,
    updates: Vec<CompiledStatement>,
    updated: Vec<Updated>,
    /// Relationships already planned in this batch.
    planned: HashSet<(ObjectKey, String, ObjectKey)>,
    /// Persisted relationships still present in the object graph.
    present: HashSet<(i64, String, i64)>,
    present_relationship_entities: HashSet<i64>,
    /// Persisted relationship entities whose endpoints changed.
    moved: Vec<MappedRelationship>,
    expanded: Vec<Expanded>,
}

impl CompileState {
    fn new_alias(&mut self, entity: &EntityRef) -> String {
        let next = self.aliases.len();
        self.aliases
            .entry(ObjectKey::of(entity))
            .or_insert_with(|| format!("n{}", next))
            .clone()
    }

    /// Alias and batch reference of a relationship endpoint.
    fn endpoint(&mut self, entity: &EntityRef) -> (String, NodeRef) {
        let id = entity.borrow().id();
        match id {
            Some(id) => (self.create.matched(id), NodeRef::Existing(id)),
            None => {
                let alias = self.new_alias(entity);
                (alias.clone(), NodeRef::New(alias))
            }
        }
    }
}

/// Compiles saves against one metadata lookup and mapping context.
pub struct GraphMapper<'a> {
    metadata: &'a MetaData,
    context: &'a MappingContext,
}

impl<'a> GraphMapper<'a> {
    /// Create a new mapper.
    pub fn new(metadata: &'a MetaData, context: &'a MappingContext) -> Self {
        Self { metadata, context }
    }

    /// Compile the save of `root` to `depth` hops.
    ///
    /// Depth 0 writes only the root's own properties. A relationship entity
    /// root is written together with its start and end nodes.
    pub fn map(&self, root: &EntityRef, depth: i32) -> MappingResult<CompiledBatch> {
        let mut state = CompileState::default();
        let mut visited: HashSet<ObjectKey> = HashSet::new();
        let mut queue: VecDeque<(EntityRef, i32)> = VecDeque::new();

        visited.insert(ObjectKey::of(root));
        queue.push_back((root.clone(), 0));

        while let Some((entity, level)) = queue.pop_front() {
            let descriptor = match self.descriptor_of(&entity) {
                Some(descriptor) => descriptor,
                None => continue,
            };

            if descriptor.is_relationship_entity() {
                for endpoint in self.map_relationship_entity(&entity, descriptor, &mut state)? {
                    if visited.insert(ObjectKey::of(&endpoint)) {
                        queue.push_back((endpoint, level));
                    }
                }
                continue;
            }

            self.map_node(&entity, descriptor, &mut state);

            if depth >= 0 && level >= depth {
                continue;
            }

            let owner_id = entity.borrow().id();
            for field in &descriptor.relationships {
                let targets = entity.borrow().related(&field.name);
                let target_is_relationship = self.metadata.is_relationship_entity(&field.target_type);
                if let Some(owner) = owner_id {
                    state.expanded.push(Expanded {
                        owner,
                        rel_type: field.rel_type.clone(),
                        direction: field.direction,
                        relationship_entities: target_is_relationship,
                    });
                }

                for target in targets {
                    let target_descriptor = match self.descriptor_of(&target) {
                        Some(d) => d,
                        None => continue,
                    };

                    if target_descriptor.is_relationship_entity() {
                        if let Some(id) = target.borrow().id() {
                            state.present_relationship_entities.insert(id);
                        }
                        if visited.insert(ObjectKey::of(&target)) {
                            for endpoint in
                                self.map_relationship_entity(&target, target_descriptor, &mut state)?
                            {
                                if visited.insert(ObjectKey::of(&endpoint)) {
                                    queue.push_back((endpoint, level + 1));
                                }
                            }
                        }
                        continue;
                    }

                    let (start, end) = match field.direction {
                        Direction::Incoming => (&target, &entity),
                        Direction::Outgoing | Direction::Undirected => (&entity, &target),
                    };
                    let undirected = field.direction == Direction::Undirected;
                    self.map_relationship(start, &field.rel_type, end, undirected, &mut state);

                    if visited.insert(ObjectKey::of(&target)) {
                        queue.push_back((target, level + 1));
                    }
                }
            }
        }

        let obsolete = self.obsolete_relationships(&state);
        Ok(Self::finish(state, obsolete))
    }

    fn descriptor_of(&self, entity: &EntityRef) -> Option<&'a EntityDescriptor> {
        let borrowed = entity.borrow();
        let descriptor = self.metadata.descriptor_for(&*borrowed);
        if descriptor.is_none() {
            info!(type_name = borrowed.type_name(), "skipping object of unmapped type");
        }
        descriptor
    }

    fn map_node(&self, entity: &EntityRef, descriptor: &EntityDescriptor, state: &mut CompileState) {
        let borrowed = entity.borrow();
        match borrowed.id() {
            None => {
                let alias = state.new_alias(entity);
                let properties = Self::create_properties(descriptor, entity);
                state.create.create_node(
                    alias.clone(),
                    descriptor.labels(),
                    properties,
                    Binding::Node {
                        alias,
                        type_name: descriptor.name.clone(),
                        entity: entity.clone(),
                    },
                );
            }
            Some(id) if self.context.is_dirty(descriptor, &*borrowed) => {
                let properties = MappingContext::snapshot(descriptor, &*borrowed);
                state.updates.push(CompiledStatement {
                    statement: Statement::new(
                        "MATCH (n) WHERE ID(n) = $id SET n += $props",
                        props! { "id" => id, "props" => properties },
                    )
                    .with_stats(),
                    bindings: Vec::new(),
                });
                state.updated.push(Updated {
                    id,
                    type_name: descriptor.name.clone(),
                    entity: entity.clone(),
                });
            }
            Some(_) => {}
        }
    }

    fn map_relationship(
        &self,
        start: &EntityRef,
        rel_type: &str,
        end: &EntityRef,
        undirected: bool,
        state: &mut CompileState,
    ) {
        let start_key = ObjectKey::of(start);
        let end_key = ObjectKey::of(end);
        if state.planned.contains(&(start_key, rel_type.to_string(), end_key))
            || (undirected && state.planned.contains(&(end_key, rel_type.to_string(), start_key)))
        {
            return;
        }
        state.planned.insert((start_key, rel_type.to_string(), end_key));

        let start_id = start.borrow().id();
        let end_id = end.borrow().id();
        if let (Some(s), Some(e)) = (start_id, end_id) {
            state.present.insert((s, rel_type.to_string(), e));
            if self.context.is_remembered(s, rel_type, e, undirected) {
                return;
            }
        }

        let (start_alias, start_ref) = state.endpoint(start);
        let (end_alias, end_ref) = state.endpoint(end);
        let alias = state.create.relationship_alias();
        debug!(%alias, rel_type, "new relationship");
        state.create.create_relationship(
            alias.clone(),
            start_alias,
            rel_type,
            end_alias,
            None,
            Binding::Relationship {
                alias,
                start: start_ref,
                rel_type: rel_type.to_string(),
                end: end_ref,
            },
        );
    }

    /// Compile a relationship entity and return its start and end nodes.
    fn map_relationship_entity(
        &self,
        entity: &EntityRef,
        descriptor: &EntityDescriptor,
        state: &mut CompileState,
    ) -> MappingResult<Vec<EntityRef>> {
        let rel_type = descriptor.entity_type().to_string();
        let start = self.endpoint_of(entity, descriptor, descriptor.start_field.as_deref(), "start")?;
        let end = self.endpoint_of(entity, descriptor, descriptor.end_field.as_deref(), "end")?;

        let borrowed = entity.borrow();
        let moved = borrowed.id().and_then(|id| self.moved_relationship(id, &start, &end));
        match borrowed.id() {
            Some(id) if moved.is_none() => {
                state.present_relationship_entities.insert(id);
                if self.context.is_dirty(descriptor, &*borrowed) {
                    let properties = MappingContext::snapshot(descriptor, &*borrowed);
                    state.updates.push(CompiledStatement {
                        statement: Statement::new(
                            "MATCH ()-[r]->() WHERE ID(r) = $id SET r += $props",
                            props! { "id" => id, "props" => properties },
                        )
                        .with_stats(),
                        bindings: Vec::new(),
                    });
                    state.updated.push(Updated {
                        id,
                        type_name: descriptor.name.clone(),
                        entity: entity.clone(),
                    });
                }
            }
            _ => {
                // A relationship cannot change its endpoints in place: the old
                // one is deleted and a new one created with the properties.
                if let Some(old) = moved {
                    if !state.moved.contains(&old) {
                        state.moved.push(old);
                    }
                }
                let (start_alias, start_ref) = state.endpoint(&start);
                let (end_alias, end_ref) = state.endpoint(&end);
                let alias = state.create.relationship_alias();
                state.create.create_relationship(
                    alias.clone(),
                    start_alias,
                    &rel_type,
                    end_alias,
                    Some(Self::create_properties(descriptor, entity)),
                    Binding::RelationshipEntity {
                        alias,
                        type_name: descriptor.name.clone(),
                        entity: entity.clone(),
                        start: start_ref,
                        rel_type: rel_type.clone(),
                        end: end_ref,
                    },
                );
            }
        }

        Ok(vec![start, end])
    }

    /// The remembered relationship with this id, if its endpoints are no
    /// longer the ones the object refers to.
    fn moved_relationship(&self, id: i64, start: &EntityRef, end: &EntityRef) -> Option<MappedRelationship> {
        let current = (start.borrow().id(), end.borrow().id());
        self.context
            .relationships()
            .find(|r| r.id == Some(id))
            .filter(|r| (Some(r.start), Some(r.end)) != current)
            .cloned()
    }

    fn endpoint_of(
        &self,
        entity: &EntityRef,
        descriptor: &EntityDescriptor,
        field: Option<&str>,
        endpoint: &'static str,
    ) -> MappingResult<EntityRef> {
        let node = field.and_then(|f| entity.borrow().related(f).into_iter().next());
        let node = node.ok_or_else(|| MappingError::missing_endpoint(&descriptor.name, endpoint))?;
        let type_name = node.borrow().type_name();
        match self.metadata.descriptor(type_name) {
            Some(d) if !d.is_relationship_entity() => Ok(node),
            _ => Err(MappingError::unknown_type(type_name)),
        }
    }

    /// Properties for a create: nulls are left out.
    fn create_properties(descriptor: &EntityDescriptor, entity: &EntityRef) -> Properties {
        let mut properties = MappingContext::snapshot(descriptor, &*entity.borrow());
        properties.retain(|_, v| !v.is_null());
        properties
    }

    fn obsolete_relationships(&self, state: &CompileState) -> Vec<MappedRelationship> {
        let mut obsolete: Vec<MappedRelationship> = Vec::new();
        for relationship in self.context.relationships() {
            for expanded in &state.expanded {
                if relationship.rel_type != expanded.rel_type {
                    continue;
                }
                let owned = (expanded.direction.accepts_outgoing() && relationship.start == expanded.owner)
                    || (expanded.direction.accepts_incoming() && relationship.end == expanded.owner);
                if !owned {
                    continue;
                }
                let still_present = if expanded.relationship_entities {
                    match relationship.id {
                        Some(id) => state.present_relationship_entities.contains(&id),
                        None => true,
                    }
                } else {
                    let forward = (relationship.start, relationship.rel_type.clone(), relationship.end);
                    let backward = (relationship.end, relationship.rel_type.clone(), relationship.start);
                    state.present.contains(&forward)
                        || (expanded.direction == Direction::Undirected
                            && state.present.contains(&backward))
                };
                if !still_present && !obsolete.contains(relationship) {
                    obsolete.push(relationship.clone());
                }
            }
        }
        for relationship in &state.moved {
            if !obsolete.contains(relationship) {
                obsolete.push(relationship.clone());
            }
        }
        obsolete
    }

    fn finish(state: CompileState, obsolete: Vec<MappedRelationship>) -> CompiledBatch {
        let mut statements = Vec::new();
        if let Some(create) = state.create.build() {
            statements.push(create);
        }
        statements.extend(state.updates);
        for relationship in &obsolete {
            let statement = match relationship.id {
                Some(id) => Statement::new(
                    "MATCH ()-[r]->() WHERE ID(r) = $id DELETE r",
                    props! { "id" => id },
                ),
                None => Statement::new(
                    format!(
                        "MATCH (a)-[r:`{}`]->(b) WHERE ID(a) = $start AND ID(b) = $end DELETE r",
                        relationship.rel_type
                    ),
                    props! { "start" => relationship.start, "end" => relationship.end },
                ),
            };
            statements.push(CompiledStatement {
                statement: statement.with_stats(),
                bindings: Vec::new(),
            });
        }

        CompiledBatch {
            statements,
            updated: state.updated,
            obsolete,
        }
    }
}
