//! Compiled statement batches.
//!
//! A batch holds the write statements for one save, in execution order, and
//! the bindings that carry identities returned by the create statement back
//! onto the saved objects.

use crate::{MappedRelationship, MappingContext, MappingError, MappingResult};
use std::collections::HashMap;
use std::fmt;
use strand_core::{EntityRef, Properties, Value};
use strand_cypher::Statement;
use strand_metadata::MetaData;

/// A relationship endpoint inside a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeRef {
    /// A node that already has an identity.
    Existing(i64),
    /// A node created by this batch, by result alias.
    New(String),
}

impl NodeRef {
    fn resolve(&self, ids: &HashMap<String, i64>) -> MappingResult<i64> {
        match self {
            NodeRef::Existing(id) => Ok(*id),
            NodeRef::New(alias) => ids
                .get(alias)
                .copied()
                .ok_or_else(|| MappingError::unbound_alias(alias)),
        }
    }
}

/// Receiver of an identity returned under a result alias.
#[derive(Clone)]
pub enum Binding {
    Node {
        alias: String,
        type_name: String,
        entity: EntityRef,
    },
    RelationshipEntity {
        alias: String,
        type_name: String,
        entity: EntityRef,
        start: NodeRef,
        rel_type: String,
        end: NodeRef,
    },
    Relationship {
        alias: String,
        start: NodeRef,
        rel_type: String,
        end: NodeRef,
    },
}

impl Binding {
    pub fn alias(&self) -> &str {
        match self {
            Binding::Node { alias, .. }
            | Binding::RelationshipEntity { alias, .. }
            | Binding::Relationship { alias, .. } => alias,
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Node { alias, type_name, .. } => write!(f, "Node({} -> {})", alias, type_name),
            Binding::RelationshipEntity {
                alias, type_name, ..
            } => write!(f, "RelationshipEntity({} -> {})", alias, type_name),
            Binding::Relationship { alias, rel_type, .. } => {
                write!(f, "Relationship({} -> {})", alias, rel_type)
            }
        }
    }
}

/// A statement and the bindings fed by its result row.
#[derive(Debug, Clone)]
pub struct CompiledStatement {
    pub statement: Statement,
    pub bindings: Vec<Binding>,
}

/// A persisted object rewritten by an update statement.
#[derive(Clone)]
pub(crate) struct Updated {
    pub id: i64,
    pub type_name: String,
    pub entity: EntityRef,
}

/// The ordered write statements of one save.
#[derive(Clone, Default)]
pub struct CompiledBatch {
    pub(crate) statements: Vec<CompiledStatement>,
    pub(crate) updated: Vec<Updated>,
    pub(crate) obsolete: Vec<MappedRelationship>,
}

impl fmt::Debug for CompiledBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledBatch")
            .field("statements", &self.statements)
            .field("updated", &self.updated.len())
            .field("obsolete", &self.obsolete)
            .finish()
    }
}

impl CompiledBatch {
    /// Check if the save has nothing to write.
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn compiled(&self) -> &[CompiledStatement] {
        &self.statements
    }

    /// The statements to send, in execution order.
    pub fn statements(&self) -> Vec<Statement> {
        self.statements.iter().map(|c| c.statement.clone()).collect()
    }

    /// Relationships this batch deletes.
    pub fn obsolete(&self) -> &[MappedRelationship] {
        &self.obsolete
    }

    /// Apply a successful execution.
    ///
    /// `ids` maps every alias returned by the batch to the identity the server
    /// assigned. New objects get their identity bound; created, updated and
    /// deleted elements are reflected in the context.
    pub fn apply(
        self,
        ids: &HashMap<String, i64>,
        context: &mut MappingContext,
        metadata: &MetaData,
    ) -> MappingResult<BatchRecord> {
        let mut record = BatchRecord::default();

        for binding in self.statements.into_iter().flat_map(|c| c.bindings) {
            let id = ids
                .get(binding.alias())
                .copied()
                .ok_or_else(|| MappingError::unbound_alias(binding.alias()))?;
            match binding {
                Binding::Node {
                    type_name, entity, ..
                } => {
                    let descriptor = metadata
                        .descriptor(&type_name)
                        .ok_or_else(|| MappingError::unknown_type(&type_name))?;
                    entity.borrow_mut().set_id(Some(id));
                    context.register(id, descriptor, &entity);
                    record.created.push(entity);
                }
                Binding::RelationshipEntity {
                    type_name,
                    entity,
                    start,
                    rel_type,
                    end,
                    ..
                } => {
                    let descriptor = metadata
                        .descriptor(&type_name)
                        .ok_or_else(|| MappingError::unknown_type(&type_name))?;
                    let relationship =
                        MappedRelationship::new(start.resolve(ids)?, rel_type, end.resolve(ids)?)
                            .with_id(id);
                    let previous = entity.borrow().id();
                    entity.borrow_mut().set_id(Some(id));
                    context.register(id, descriptor, &entity);
                    context.remember(relationship.clone());
                    if let Some(previous) = previous {
                        record.rebound.push((entity.clone(), previous));
                    }
                    record.created.push(entity);
                    record.relationships.push(relationship);
                }
                Binding::Relationship {
                    start,
                    rel_type,
                    end,
                    ..
                } => {
                    let relationship =
                        MappedRelationship::new(start.resolve(ids)?, rel_type, end.resolve(ids)?)
                            .with_id(id);
                    context.remember(relationship.clone());
                    record.relationships.push(relationship);
                }
            }
        }

        for updated in self.updated {
            let descriptor = metadata
                .descriptor(&updated.type_name)
                .ok_or_else(|| MappingError::unknown_type(&updated.type_name))?;
            context.register(updated.id, descriptor, &updated.entity);
            record.updated.push(updated.entity);
        }

        for relationship in self.obsolete {
            if let Some(id) = relationship.id {
                context.remove_relationship_entity(id);
            }
            context.forget(&relationship);
            record.forgotten.push(relationship);
        }

        Ok(record)
    }
}

/// What one applied batch changed locally.
///
/// Explicit transactions keep these so a rollback can undo the local effects
/// of every save made inside them.
#[derive(Clone, Default)]
pub struct BatchRecord {
    /// Objects that received a new identity.
    pub created: Vec<EntityRef>,
    /// Persisted objects whose snapshot was refreshed.
    pub updated: Vec<EntityRef>,
    /// Relationships registered as created.
    pub relationships: Vec<MappedRelationship>,
    /// Relationships forgotten as deleted.
    pub forgotten: Vec<MappedRelationship>,
    /// Relationship entities recreated between new endpoints, with the
    /// identity they had before.
    pub rebound: Vec<(EntityRef, i64)>,
}

impl fmt::Debug for BatchRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchRecord")
            .field("created", &self.created.len())
            .field("updated", &self.updated.len())
            .field("relationships", &self.relationships)
            .field("forgotten", &self.forgotten)
            .field("rebound", &self.rebound.len())
            .finish()
    }
}

impl BatchRecord {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty()
            && self.updated.is_empty()
            && self.relationships.is_empty()
            && self.forgotten.is_empty()
            && self.rebound.is_empty()
    }

    /// Undo the local effects after the server rolled the batch back.
    ///
    /// Created objects lose their identity and tracking, refreshed snapshots
    /// are invalidated, and relationship bookkeeping is reversed.
    pub fn revert(&self, context: &mut MappingContext, metadata: &MetaData) {
        for relationship in &self.relationships {
            context.forget(relationship);
        }
        for relationship in &self.forgotten {
            context.remember(relationship.clone());
        }
        for entity in &self.updated {
            let borrowed = entity.borrow();
            if let (Some(descriptor), Some(id)) = (metadata.descriptor_for(&*borrowed), borrowed.id()) {
                context.invalidate(descriptor, id);
            }
        }
        for entity in &self.created {
            if let Some(descriptor) = metadata.descriptor_for(&*entity.borrow()) {
                context.remove_entity(descriptor, &*entity.borrow());
            }
            entity.borrow_mut().set_id(None);
        }
        for (entity, id) in &self.rebound {
            entity.borrow_mut().set_id(Some(*id));
        }
    }
}

// ==================== Statement Text ====================

/// A relationship planned for the create statement.
struct PlannedRelationship {
    alias: String,
    start: String,
    rel_type: String,
    end: String,
    /// Relationship entities are created with their properties; plain
    /// relationships are merged.
    properties: Option<Properties>,
}

/// Accumulates the single create statement of a batch.
///
/// Persisted endpoints are matched first, then every new node is created,
/// then every new relationship, so a node always exists before a
/// relationship refers to it.
#[derive(Default)]
pub(crate) struct CreateStatementBuilder {
    matched: Vec<(String, i64)>,
    nodes: Vec<(String, String, Properties)>,
    relationships: Vec<PlannedRelationship>,
    bindings: Vec<Binding>,
    next_relationship: usize,
}

impl CreateStatementBuilder {
    /// Alias of a persisted node, matched by id.
    pub fn matched(&mut self, id: i64) -> String {
        if let Some((alias, _)) = self.matched.iter().find(|(_, m)| *m == id) {
            return alias.clone();
        }
        let alias = format!("e{}", self.matched.len());
        self.matched.push((alias.clone(), id));
        alias
    }

    /// Schedule creation of a new node under an alias.
    pub fn create_node(
        &mut self,
        alias: String,
        labels: &[String],
        properties: Properties,
        binding: Binding,
    ) {
        let labels: String = labels.iter().map(|l| format!(":`{}`", l)).collect();
        self.nodes.push((alias, labels, properties));
        self.bindings.push(binding);
    }

    /// Next relationship alias.
    pub fn relationship_alias(&mut self) -> String {
        let alias = format!("r{}", self.next_relationship);
        self.next_relationship += 1;
        alias
    }

    /// Schedule a relationship between two node aliases.
    pub fn create_relationship(
        &mut self,
        alias: String,
        start: String,
        rel_type: &str,
        end: String,
        properties: Option<Properties>,
        binding: Binding,
    ) {
        self.relationships.push(PlannedRelationship {
            alias,
            start,
            rel_type: rel_type.to_string(),
            end,
            properties,
        });
        self.bindings.push(binding);
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.relationships.is_empty()
    }

    pub fn build(self) -> Option<CompiledStatement> {
        if self.is_empty() {
            return None;
        }

        let mut clauses = Vec::new();
        let mut returns = Vec::new();
        let mut params = Properties::new();

        for (alias, id) in &self.matched {
            clauses.push(format!("MATCH ({0}) WHERE ID({0}) = ${0}", alias));
            params.insert(alias.clone(), Value::Int(*id));
        }
        for (alias, labels, properties) in self.nodes {
            clauses.push(format!("CREATE ({0}{1} ${0}_props)", alias, labels));
            returns.push(format!("id({0}) AS {0}", alias));
            params.insert(format!("{}_props", alias), Value::Map(properties));
        }
        for rel in self.relationships {
            match rel.properties {
                Some(properties) => {
                    clauses.push(format!(
                        "CREATE ({})-[{}:`{}` ${}_props]->({})",
                        rel.start, rel.alias, rel.rel_type, rel.alias, rel.end
                    ));
                    params.insert(format!("{}_props", rel.alias), Value::Map(properties));
                }
                None => clauses.push(format!(
                    "MERGE ({})-[{}:`{}`]->({})",
                    rel.start, rel.alias, rel.rel_type, rel.end
                )),
            }
            returns.push(format!("id({0}) AS {0}", rel.alias));
        }

        let text = format!("{} RETURN {}", clauses.join(" "), returns.join(", "));
        Some(CompiledStatement {
            statement: Statement::new(text, params).with_stats(),
            bindings: self.bindings,
        })
    }
}
