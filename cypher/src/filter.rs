//! Property filters for find-by-property statements.

use crate::{CypherError, CypherResult};
use std::fmt;
use strand_core::Value;
use strand_metadata::{Direction, EntityDescriptor, MetaData};

/// Comparison between a property and the filter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Comparison {
    #[default]
    Equals,
    GreaterThan,
    LessThan,
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparison::Equals => write!(f, "="),
            Comparison::GreaterThan => write!(f, ">"),
            Comparison::LessThan => write!(f, "<"),
        }
    }
}

/// How a filter chains onto the filters before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BooleanOperator {
    #[default]
    And,
    Or,
}

impl fmt::Display for BooleanOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BooleanOperator::And => write!(f, "AND"),
            BooleanOperator::Or => write!(f, "OR"),
        }
    }
}

/// Filter on a property of a related entity.
#[derive(Debug, Clone, PartialEq)]
pub struct NestedFilter {
    /// Relationship field on the owner.
    pub relationship_field: String,
    /// Type name of the related entity.
    pub nested_type: String,
    /// Filled by resolution.
    pub rel_type: Option<String>,
    /// Filled by resolution.
    pub direction: Option<Direction>,
    /// Filled by resolution: the related entity's primary label.
    pub label: Option<String>,
}

/// A property filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Field name before resolution, graph property name after.
    pub property: String,
    pub value: Value,
    pub comparison: Comparison,
    /// Ignored on the first filter of a list.
    pub boolean_operator: BooleanOperator,
    /// Type the filter applies to. Filled by resolution when absent.
    pub owner_type: Option<String>,
    pub nested: Option<NestedFilter>,
}

impl Filter {
    /// Create an equality filter.
    pub fn new(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
            comparison: Comparison::Equals,
            boolean_operator: BooleanOperator::And,
            owner_type: None,
            nested: None,
        }
    }

    pub fn with_comparison(mut self, comparison: Comparison) -> Self {
        self.comparison = comparison;
        self
    }

    /// Chain with OR instead of AND.
    pub fn or(mut self) -> Self {
        self.boolean_operator = BooleanOperator::Or;
        self
    }

    /// Apply the filter to an entity reached through a relationship field.
    pub fn nested(mut self, relationship_field: impl Into<String>, nested_type: impl Into<String>) -> Self {
        self.nested = Some(NestedFilter {
            relationship_field: relationship_field.into(),
            nested_type: nested_type.into(),
            rel_type: None,
            direction: None,
            label: None,
        });
        self
    }

    pub fn is_nested(&self) -> bool {
        self.nested.is_some()
    }

    /// Resolve against the metadata for a query over `owner`.
    ///
    /// The property name takes any declared override. A nested filter gets the
    /// relationship type and direction of the owner's field and the nested
    /// entity's label; its property is resolved on the nested type.
    pub fn resolve(&self, owner: &EntityDescriptor, metadata: &MetaData) -> CypherResult<Filter> {
        let mut resolved = self.clone();
        let owner_name = self.owner_type.clone().unwrap_or_else(|| owner.name.clone());
        let owner_descriptor = metadata
            .descriptor(&owner_name)
            .ok_or_else(|| CypherError::unknown_type(&owner_name))?;

        match &mut resolved.nested {
            None => {
                resolved.property = owner_descriptor.graph_property_name(&self.property).to_string();
            }
            Some(nested) => {
                if owner_descriptor.is_relationship_entity() {
                    return Err(CypherError::UnsupportedNestedFilter { name: owner_name });
                }
                let field = owner_descriptor
                    .relationship_field(&nested.relationship_field)
                    .ok_or_else(|| {
                        CypherError::unknown_relationship_field(&owner_name, &nested.relationship_field)
                    })?;
                let nested_descriptor = metadata
                    .descriptor(&nested.nested_type)
                    .ok_or_else(|| CypherError::unknown_type(&nested.nested_type))?;

                nested.rel_type = Some(field.rel_type.clone());
                nested.direction = Some(field.direction);
                nested.label = Some(nested_descriptor.entity_type().to_string());
                resolved.property = nested_descriptor
                    .graph_property_name(&self.property)
                    .to_string();
            }
        }

        resolved.owner_type = Some(owner_name);
        Ok(resolved)
    }
}
