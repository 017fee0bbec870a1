//! Common error messages used across Strand components.
//!
//! These constants keep the wording of usage errors identical between the
//! statement guards and the session.

/// Error: statement text is empty.
pub const ERR_EMPTY_STATEMENT: &str = "Supplied cypher statement must not be null or empty";

/// Error: write clause inside a read-only query.
pub const ERR_READ_ONLY: &str =
    "query() only allows read only cypher. To make modifications use execute()";

/// Error: RETURN clause inside a fire-and-forget statement.
pub const ERR_NOTHING_RETURNED: &str = "execute() must not return data. Use query() instead";

/// Error: typed query without a type.
pub const ERR_TYPE_REQUIRED: &str = "Supplied type must not be null or void";

/// Error: named query lookup.
pub const ERR_NAMED_QUERIES: &str = "Named queries are not supported";

/// Error: scalar row mapping over more than one column.
pub const ERR_SCALAR_COLUMNS: &str = "Scalar response queries must only return one column";
