//! MetaData - immutable descriptor lookup.

use crate::EntityDescriptor;
use std::collections::HashMap;
use strand_core::Entity;

/// Runtime lookup of entity descriptors.
/// It is immutable after construction.
#[derive(Debug)]
pub struct MetaData {
    /// Descriptors in declaration order.
    descriptors: Vec<EntityDescriptor>,
    /// Type name to descriptor index.
    by_name: HashMap<String, usize>,
    /// Relationship type to relationship entity index.
    by_rel_type: HashMap<String, usize>,
}

impl MetaData {
    /// Create the lookup (use MetaDataBuilder for construction).
    pub(crate) fn new(descriptors: Vec<EntityDescriptor>) -> Self {
        let by_name = descriptors
            .iter()
            .enumerate()
            .map(|(i, d)| (d.name.clone(), i))
            .collect();
        let by_rel_type = descriptors
            .iter()
            .enumerate()
            .filter_map(|(i, d)| d.rel_type().map(|t| (t.to_string(), i)))
            .collect();

        Self {
            descriptors,
            by_name,
            by_rel_type,
        }
    }

    // ==================== Type Lookups ====================

    /// Get a descriptor by type name.
    pub fn descriptor(&self, name: &str) -> Option<&EntityDescriptor> {
        self.by_name.get(name).map(|&i| &self.descriptors[i])
    }

    /// Get the descriptor an object is mapped by.
    pub fn descriptor_for(&self, entity: &dyn Entity) -> Option<&EntityDescriptor> {
        self.descriptor(entity.type_name())
    }

    /// Check if a type name is mapped.
    pub fn is_mapped(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Check if a type name is mapped as a relationship entity.
    pub fn is_relationship_entity(&self, name: &str) -> bool {
        self.descriptor(name)
            .map(EntityDescriptor::is_relationship_entity)
            .unwrap_or(false)
    }

    /// Get all descriptors, in declaration order.
    pub fn all(&self) -> impl Iterator<Item = &EntityDescriptor> {
        self.descriptors.iter()
    }

    /// Get the number of mapped types.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    // ==================== Graph Lookups ====================

    /// Resolve the labels of a result node to a node entity.
    ///
    /// A descriptor matches when all its labels are present on the node; the
    /// most specific match (most labels) wins, ties go to the first declared.
    pub fn resolve_labels(&self, labels: &[String]) -> Option<&EntityDescriptor> {
        let mut best: Option<&EntityDescriptor> = None;
        for descriptor in &self.descriptors {
            let own = descriptor.labels();
            if own.is_empty() || !own.iter().all(|l| labels.contains(l)) {
                continue;
            }
            let better = best.map(|b| own.len() > b.labels().len()).unwrap_or(true);
            if better {
                best = Some(descriptor);
            }
        }
        best
    }

    /// Get the relationship entity mapped to a relationship type.
    pub fn relationship_entity(&self, rel_type: &str) -> Option<&EntityDescriptor> {
        self.by_rel_type.get(rel_type).map(|&i| &self.descriptors[i])
    }
}
