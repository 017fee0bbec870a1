//! The entity capability.
//!
//! Mapped domain objects implement [`Entity`] so the mapper can read and write
//! their identity, their mapped properties and their relationship fields by
//! name. Objects are shared through [`EntityRef`] handles because object
//! graphs routinely contain cycles (a person's friend lists the person back).

use crate::Value;
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

/// Shared handle to a mapped domain object.
pub type EntityRef = Rc<RefCell<dyn Entity>>;

/// Field access capability of a mapped domain object.
///
/// Field names are the names declared in the entity descriptor, not the
/// graph property names (those may be overridden in the descriptor).
pub trait Entity: Any {
    /// Name of the descriptor this object is mapped by.
    fn type_name(&self) -> &'static str;

    /// Server-assigned identity, `None` until first persisted.
    fn id(&self) -> Option<i64>;

    /// Bind or reset the identity.
    fn set_id(&mut self, id: Option<i64>);

    /// Read a mapped property field. Unknown fields read as `Value::Null`.
    fn property(&self, field: &str) -> Value;

    /// Write a mapped property field. Unknown fields are ignored.
    fn set_property(&mut self, field: &str, value: Value);

    /// Read a relationship field (a collection, or zero/one element for
    /// single-valued fields such as a relationship entity's start and end).
    fn related(&self, _field: &str) -> Vec<EntityRef> {
        Vec::new()
    }

    /// Replace the contents of a relationship field.
    fn set_related(&mut self, _field: &str, _targets: Vec<EntityRef>) {}

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Wrap a domain object into a shared handle.
pub fn shared<E: Entity>(entity: E) -> EntityRef {
    Rc::new(RefCell::new(entity))
}

/// Reference identity of an in-memory object.
///
/// Two handles have the same key only if they point at the same allocation.
/// Used for visited sets, where new objects have no server identity yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey(usize);

impl ObjectKey {
    /// Key of the object behind a handle.
    pub fn of(entity: &EntityRef) -> Self {
        Self(Rc::as_ptr(entity) as *const () as usize)
    }
}

/// Check whether two handles point at the same object.
pub fn same_object(a: &EntityRef, b: &EntityRef) -> bool {
    ObjectKey::of(a) == ObjectKey::of(b)
}

/// Borrow the concrete type behind a handle.
///
/// Returns `None` if the object is not a `T`.
pub fn with_entity<T: Entity, R>(entity: &EntityRef, f: impl FnOnce(&T) -> R) -> Option<R> {
    let borrowed = entity.borrow();
    borrowed.as_any().downcast_ref::<T>().map(f)
}

/// Mutably borrow the concrete type behind a handle.
pub fn with_entity_mut<T: Entity, R>(
    entity: &EntityRef,
    f: impl FnOnce(&mut T) -> R,
) -> Option<R> {
    let mut borrowed = entity.borrow_mut();
    borrowed.as_any_mut().downcast_mut::<T>().map(f)
}
