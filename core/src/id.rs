//! Identity types for model elements.

use std::fmt;

/// Unique identifier for a model element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

impl ObjectId {
    /// Create a new ObjectId from a raw value.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "o{}", self.0)
    }
}

impl From<u64> for ObjectId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Reference to a model element together with its concrete class.
///
/// Identity is the id alone; the class name travels with the reference so
/// type tests do not need a round trip through the access port.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub id: ObjectId,
    pub class: String,
}

impl ObjectRef {
    pub fn new(id: impl Into<ObjectId>, class: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            class: class.into(),
        }
    }

    /// Returns true if both references point at the same element.
    pub fn same_as(&self, other: &ObjectRef) -> bool {
        self.id == other.id
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id, self.class)
    }
}

/// An object seen through a declared ancestor type.
///
/// Produced by `oclAsType`. Member access on a view dispatches using
/// `view_type`; type tests still see the real class of `object`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectView {
    pub object: ObjectRef,
    pub view_type: String,
}

impl ObjectView {
    pub fn new(object: ObjectRef, view_type: impl Into<String>) -> Self {
        Self {
            object,
            view_type: view_type.into(),
        }
    }
}

impl fmt::Display for ObjectView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} as {}", self.object, self.view_type)
    }
}
