//! Result models returned by the transactional endpoint.
//!
//! A statement asks for `graph` and/or `row` result contents. Graph results
//! carry node and relationship fragments, row results carry column values,
//! graph-row results carry both per row.

use crate::{Properties, Value};
use serde::{Deserialize, Deserializer, Serialize};

/// A node fragment of a graph result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeModel {
    #[serde(deserialize_with = "server_id")]
    pub id: i64,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub properties: Properties,
}

/// A relationship fragment of a graph result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipModel {
    #[serde(deserialize_with = "server_id")]
    pub id: i64,
    #[serde(rename = "type")]
    pub rel_type: String,
    #[serde(rename = "startNode", deserialize_with = "server_id")]
    pub start_node: i64,
    #[serde(rename = "endNode", deserialize_with = "server_id")]
    pub end_node: i64,
    #[serde(default)]
    pub properties: Properties,
}

/// Nodes and relationships of one or more result rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphModel {
    #[serde(default)]
    pub nodes: Vec<NodeModel>,
    #[serde(default)]
    pub relationships: Vec<RelationshipModel>,
}

impl GraphModel {
    /// Create an empty graph model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold another fragment into this one, skipping elements already present.
    pub fn merge(&mut self, other: GraphModel) {
        for node in other.nodes {
            if self.node(node.id).is_none() {
                self.nodes.push(node);
            }
        }
        for rel in other.relationships {
            if self.relationship(rel.id).is_none() {
                self.relationships.push(rel);
            }
        }
    }

    /// Find a node by id.
    pub fn node(&self, id: i64) -> Option<&NodeModel> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Find a relationship by id.
    pub fn relationship(&self, id: i64) -> Option<&RelationshipModel> {
        self.relationships.iter().find(|r| r.id == id)
    }

    /// Check if the model holds nothing.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.relationships.is_empty()
    }
}

/// One row of a tabular result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowModel {
    pub values: Vec<Value>,
}

impl RowModel {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }
}

/// One row of a graph-row result: the graph fragment plus the row values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphRowModel {
    pub graph: GraphModel,
    pub row: Vec<Value>,
}

/// Update counters reported for a statement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryStatistics {
    pub contains_updates: bool,
    pub nodes_created: u64,
    pub nodes_deleted: u64,
    pub properties_set: u64,
    pub relationships_created: u64,
    #[serde(alias = "relationship_deleted")]
    pub relationships_deleted: u64,
    pub labels_added: u64,
    pub labels_removed: u64,
}

impl QueryStatistics {
    /// Merge another statistics block into this one.
    pub fn merge(&mut self, other: &QueryStatistics) {
        self.contains_updates |= other.contains_updates;
        self.nodes_created += other.nodes_created;
        self.nodes_deleted += other.nodes_deleted;
        self.properties_set += other.properties_set;
        self.relationships_created += other.relationships_created;
        self.relationships_deleted += other.relationships_deleted;
        self.labels_added += other.labels_added;
        self.labels_removed += other.labels_removed;
    }
}

/// Graph results report ids as strings, row results as numbers.
fn server_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(id) => Ok(id),
        RawId::Text(text) => text.parse().map_err(serde::de::Error::custom),
    }
}
