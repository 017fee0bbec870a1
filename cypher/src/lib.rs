//! Strand Cypher
//!
//! Builds the parameterized statements a session sends to the server.
//!
//! Responsibilities:
//! - Statement value type (text, parameters, requested result contents)
//! - Property filters for find-by-property, with name and nested resolution
//! - Read and delete strategies for node and relationship entities
//! - Aggregate counts
//! - Guards for ad-hoc statements (read-only, nothing returned)

mod error;
mod filter;
mod guard;
mod statement;
mod strategy;

pub use error::{CypherError, CypherResult};
pub use filter::{BooleanOperator, Comparison, Filter, NestedFilter};
pub use guard::{check_nothing_returned, check_not_empty, check_read_only};
pub use statement::{ResultContent, Statement};
pub use strategy::{
    depth_range, AggregateStatements, DeleteStatements, NodeStatements, QueryStatements,
    RelationshipStatements, StatementStrategy,
};
