//! Statement strategies.
//!
//! Node entities and relationship entities are read and deleted with
//! different statement shapes. A [`StatementStrategy`] picks one of the two
//! implementations for a descriptor; sessions resolve it once per type.
//!
//! Depth is embedded in the variable-length pattern of read statements:
//! `[*0..d]` for a bounded depth, `[*0..]` for depth -1, and no expansion at
//! depth 0.

use crate::{CypherError, CypherResult, Filter, Statement};
use std::fmt::Write;
use strand_core::{props, Properties};
use strand_metadata::{Direction, EntityDescriptor};

/// Variable-length range for a traversal depth; `None` means no expansion.
pub fn depth_range(depth: i32) -> Option<String> {
    match depth {
        0 => None,
        d if d < 0 => Some("*0..".to_string()),
        d => Some(format!("*0..{}", d)),
    }
}

/// Read statements for one entity kind.
pub trait QueryStatements {
    /// Find one entity by id.
    fn find_one(&self, id: i64, depth: i32) -> Statement;

    /// Find entities by a set of ids.
    fn find_all(&self, ids: &[i64], depth: i32) -> Statement;

    /// Find all entities of a label (node) or relationship type.
    fn find_by_type(&self, entity_type: &str, depth: i32) -> Statement;

    /// Find entities matching resolved property filters.
    ///
    /// Returns a graph-row statement: the graph carries the fragments, the
    /// row carries the id of each matched root.
    fn find_by_properties(
        &self,
        entity_type: &str,
        filters: &[Filter],
        depth: i32,
    ) -> CypherResult<Statement>;
}

/// Delete statements for one entity kind.
pub trait DeleteStatements {
    /// Delete one entity by id.
    fn delete(&self, id: i64) -> Statement;

    /// Delete every entity of a label (node) or relationship type.
    fn delete_by_type(&self, entity_type: &str) -> Statement;
}

/// Statements for node entities.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeStatements;

/// Statements for relationship entities.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationshipStatements;

/// Strategy for one mapped type.
#[derive(Debug, Clone, Copy)]
pub enum StatementStrategy {
    Node(NodeStatements),
    Relationship(RelationshipStatements),
}

impl StatementStrategy {
    /// Select the strategy for a descriptor's kind.
    pub fn for_descriptor(descriptor: &EntityDescriptor) -> Self {
        if descriptor.is_relationship_entity() {
            StatementStrategy::Relationship(RelationshipStatements)
        } else {
            StatementStrategy::Node(NodeStatements)
        }
    }

    pub fn queries(&self) -> &dyn QueryStatements {
        match self {
            StatementStrategy::Node(s) => s,
            StatementStrategy::Relationship(s) => s,
        }
    }

    pub fn deletes(&self) -> &dyn DeleteStatements {
        match self {
            StatementStrategy::Node(s) => s,
            StatementStrategy::Relationship(s) => s,
        }
    }

    pub fn is_relationship(&self) -> bool {
        matches!(self, StatementStrategy::Relationship(_))
    }
}

// ==================== Node Entities ====================

impl NodeStatements {
    /// Delete every node and relationship.
    pub fn purge(&self) -> Statement {
        Statement::new("MATCH (n) OPTIONAL MATCH (n)-[r]-() DELETE r, n", props!()).with_stats()
    }

    fn expand(matched: &str, depth: i32, extra_return: &str) -> String {
        match depth_range(depth) {
            None => format!("{} RETURN n{}", matched, extra_return),
            Some(range) => format!(
                "{} WITH n MATCH p=(n)-[{}]-(m) RETURN p{}",
                matched, range, extra_return
            ),
        }
    }
}

impl QueryStatements for NodeStatements {
    fn find_one(&self, id: i64, depth: i32) -> Statement {
        let text = Self::expand("MATCH (n) WHERE ID(n) = $id", depth, "");
        Statement::graph(text, props! { "id" => id })
    }

    fn find_all(&self, ids: &[i64], depth: i32) -> Statement {
        let text = Self::expand("MATCH (n) WHERE ID(n) IN $ids", depth, "");
        Statement::graph(text, props! { "ids" => ids.to_vec() })
    }

    fn find_by_type(&self, entity_type: &str, depth: i32) -> Statement {
        let text = Self::expand(&format!("MATCH (n:`{}`)", entity_type), depth, "");
        Statement::graph(text, props!())
    }

    fn find_by_properties(
        &self,
        entity_type: &str,
        filters: &[Filter],
        depth: i32,
    ) -> CypherResult<Statement> {
        let mut params = Properties::new();
        let mut counter = 0;

        let own: Vec<&Filter> = filters.iter().filter(|f| !f.is_nested()).collect();
        let mut text = format!("MATCH (n:`{}`)", entity_type);
        text.push_str(&where_clause("n", &own, &mut params, &mut counter));

        // One match group per nested relationship field, in first-seen order.
        let mut groups: Vec<(&str, Vec<&Filter>)> = Vec::new();
        for filter in filters.iter().filter(|f| f.is_nested()) {
            let field = filter
                .nested
                .as_ref()
                .map(|n| n.relationship_field.as_str())
                .unwrap_or_default();
            match groups.iter_mut().find(|(name, _)| *name == field) {
                Some((_, members)) => members.push(filter),
                None => groups.push((field, vec![filter])),
            }
        }

        for (i, (_, members)) in groups.iter().enumerate() {
            let nested = match members[0].nested.as_ref() {
                Some(nested) => nested,
                None => continue,
            };
            let alias = format!("m{}", i);
            let label = nested.label.as_deref().unwrap_or(&nested.nested_type);
            let rel_type = nested.rel_type.as_deref().unwrap_or_default();
            let _ = write!(text, " MATCH ({}:`{}`)", alias, label);
            text.push_str(&where_clause(&alias, members, &mut params, &mut counter));
            let arrow = match nested.direction.unwrap_or(Direction::Undirected) {
                Direction::Outgoing => format!("-[:`{}`]->", rel_type),
                Direction::Incoming => format!("<-[:`{}`]-", rel_type),
                Direction::Undirected => format!("-[:`{}`]-", rel_type),
            };
            let _ = write!(text, " MATCH (n){}({})", arrow, alias);
        }

        let text = Self::expand(&text, depth, ", ID(n)");
        Ok(Statement::graph_row(text, params))
    }
}

impl DeleteStatements for NodeStatements {
    fn delete(&self, id: i64) -> Statement {
        Statement::new(
            "MATCH (n) WHERE ID(n) = $id OPTIONAL MATCH (n)-[r]-() DELETE r, n",
            props! { "id" => id },
        )
        .with_stats()
    }

    fn delete_by_type(&self, entity_type: &str) -> Statement {
        Statement::new(
            format!(
                "MATCH (n:`{}`) OPTIONAL MATCH (n)-[r]-() DELETE r, n",
                entity_type
            ),
            props!(),
        )
        .with_stats()
    }
}

// ==================== Relationship Entities ====================

impl RelationshipStatements {
    /// A relationship entity is always read with its start and end node,
    /// so the expansion from the start node covers at least one hop.
    fn range(depth: i32) -> String {
        if depth < 0 {
            "*0..".to_string()
        } else {
            format!("*0..{}", depth.max(1))
        }
    }

    fn expand(matched: &str, depth: i32) -> String {
        format!(
            "{} WITH n MATCH p=(n)-[{}]-() RETURN p",
            matched,
            Self::range(depth)
        )
    }
}

impl QueryStatements for RelationshipStatements {
    fn find_one(&self, id: i64, depth: i32) -> Statement {
        let text = Self::expand("MATCH (n)-[r]->() WHERE ID(r) = $id", depth);
        Statement::graph(text, props! { "id" => id })
    }

    fn find_all(&self, ids: &[i64], depth: i32) -> Statement {
        let text = Self::expand("MATCH (n)-[r]->() WHERE ID(r) IN $ids", depth);
        Statement::graph(text, props! { "ids" => ids.to_vec() })
    }

    fn find_by_type(&self, entity_type: &str, depth: i32) -> Statement {
        let text = format!(
            "MATCH (n)-[:`{}`]->() WITH DISTINCT n MATCH p=(n)-[{}]-() RETURN p",
            entity_type,
            Self::range(depth)
        );
        Statement::graph(text, props!())
    }

    fn find_by_properties(
        &self,
        entity_type: &str,
        filters: &[Filter],
        depth: i32,
    ) -> CypherResult<Statement> {
        if filters.iter().any(Filter::is_nested) {
            return Err(CypherError::UnsupportedNestedFilter {
                name: entity_type.to_string(),
            });
        }

        let mut params = Properties::new();
        let mut counter = 0;
        let own: Vec<&Filter> = filters.iter().collect();
        let text = format!(
            "MATCH (n)-[r:`{}`]->(){} WITH n, ID(r) AS rid MATCH p=(n)-[{}]-() RETURN p, rid",
            entity_type,
            where_clause("r", &own, &mut params, &mut counter),
            Self::range(depth)
        );
        Ok(Statement::graph_row(text, params))
    }
}

impl DeleteStatements for RelationshipStatements {
    fn delete(&self, id: i64) -> Statement {
        Statement::new(
            "MATCH (n)-[r]->() WHERE ID(r) = $id DELETE r",
            props! { "id" => id },
        )
        .with_stats()
    }

    fn delete_by_type(&self, entity_type: &str) -> Statement {
        Statement::new(
            format!("MATCH (n)-[r:`{}`]-() DELETE r", entity_type),
            props!(),
        )
        .with_stats()
    }
}

// ==================== Aggregates ====================

/// Count statements.
#[derive(Debug, Clone, Copy, Default)]
pub struct AggregateStatements;

impl AggregateStatements {
    /// Count nodes carrying all the given labels.
    pub fn count_nodes(&self, labels: &[String]) -> Statement {
        let labels: String = labels.iter().map(|l| format!(":`{}`", l)).collect();
        Statement::new(format!("MATCH (n{}) RETURN COUNT(n)", labels), props!())
    }

    /// Count relationships of a type.
    pub fn count_relationships(&self, rel_type: &str) -> Statement {
        Statement::new(
            format!("MATCH ()-[r:`{}`]->() RETURN COUNT(r)", rel_type),
            props!(),
        )
    }
}

/// Render ` WHERE a.`prop` = $p0 AND ...` for a group of filters, or nothing.
///
/// Parameter keys are numbered so graph names that are not identifiers
/// stay valid.
fn where_clause(
    alias: &str,
    filters: &[&Filter],
    params: &mut Properties,
    counter: &mut usize,
) -> String {
    let mut clause = String::new();
    for (i, filter) in filters.iter().enumerate() {
        let key = format!("p{}", counter);
        *counter += 1;
        if i == 0 {
            clause.push_str(" WHERE ");
        } else {
            let _ = write!(clause, " {} ", filter.boolean_operator);
        }
        let _ = write!(
            clause,
            "{}.`{}` {} ${}",
            alias, filter.property, filter.comparison, key
        );
        params.insert(key, filter.value.clone());
    }
    clause
}
