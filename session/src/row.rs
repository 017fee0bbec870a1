//! Row mapping for queries over unmapped result types.

use crate::{SessionError, SessionResult};
use std::fmt;
use strand_core::{messages, EntityRef, Properties, Value};

/// A result row keyed by column name.
pub type RowMap = Properties;

/// Turns one result row into a caller value.
pub trait RowMapper {
    type Output;

    fn map_row(&self, columns: &[String], row: &[Value]) -> SessionResult<Self::Output>;
}

/// Maps a row to a column → value map.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapRowMapper;

impl RowMapper for MapRowMapper {
    type Output = RowMap;

    fn map_row(&self, columns: &[String], row: &[Value]) -> SessionResult<RowMap> {
        Ok(columns.iter().cloned().zip(row.iter().cloned()).collect())
    }
}

/// Maps a single-column row to its value.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarRowMapper;

impl RowMapper for ScalarRowMapper {
    type Output = Value;

    fn map_row(&self, _columns: &[String], row: &[Value]) -> SessionResult<Value> {
        match row {
            [] => Ok(Value::Null),
            [value] => Ok(value.clone()),
            _ => Err(SessionError::row_shape(messages::ERR_SCALAR_COLUMNS)),
        }
    }
}

/// One result of a typed query: a mapped object, or a row-mapped value.
#[derive(Clone)]
pub enum QueryItem<V> {
    Entity(EntityRef),
    Value(V),
}

impl<V> QueryItem<V> {
    pub fn as_entity(&self) -> Option<&EntityRef> {
        match self {
            QueryItem::Entity(entity) => Some(entity),
            QueryItem::Value(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&V> {
        match self {
            QueryItem::Entity(_) => None,
            QueryItem::Value(value) => Some(value),
        }
    }

    pub fn into_value(self) -> Option<V> {
        match self {
            QueryItem::Entity(_) => None,
            QueryItem::Value(value) => Some(value),
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for QueryItem<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryItem::Entity(entity) => {
                let borrowed = entity.borrow();
                f.debug_tuple("Entity")
                    .field(&borrowed.type_name())
                    .field(&borrowed.id())
                    .finish()
            }
            QueryItem::Value(value) => f.debug_tuple("Value").field(value).finish(),
        }
    }
}
