//! Class definitions.

use mrepo_core::{NamedArgs, ObjectRef, PortResult, Properties, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Body of a user-defined operation.
///
/// Receives the target object, its stored properties and the named arguments.
pub type OperationFn =
    Arc<dyn Fn(&ObjectRef, &Properties, &NamedArgs) -> PortResult<Value> + Send + Sync>;

/// Body of a derived property, computed from the object's stored properties.
pub type DerivedFn = Arc<dyn Fn(&ObjectRef, &Properties) -> Value + Send + Sync>;

/// A user-defined operation owned by a class.
#[derive(Clone)]
pub struct OperationDef {
    /// Operation name.
    pub name: String,
    /// Declared parameter names, in order.
    pub params: Vec<String>,
    /// Implementation.
    pub body: OperationFn,
}

impl fmt::Debug for OperationDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationDef")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// A class of the metamodel.
#[derive(Clone, Default)]
pub struct ClassDef {
    /// Class name.
    pub name: String,
    /// Direct parent class names, in declaration order.
    pub parents: Vec<String>,
    /// Operations defined (or redefined) by this class.
    pub operations: HashMap<String, OperationDef>,
    /// Derived properties defined (or redefined) by this class.
    pub derived: HashMap<String, DerivedFn>,
}

impl ClassDef {
    /// Get an operation defined directly on this class.
    pub fn get_operation(&self, name: &str) -> Option<&OperationDef> {
        self.operations.get(name)
    }

    /// Get a derived property defined directly on this class.
    pub fn get_derived(&self, name: &str) -> Option<&DerivedFn> {
        self.derived.get(name)
    }
}

impl fmt::Debug for ClassDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut derived: Vec<&String> = self.derived.keys().collect();
        derived.sort();
        f.debug_struct("ClassDef")
            .field("name", &self.name)
            .field("parents", &self.parents)
            .field("operations", &self.operations)
            .field("derived", &derived)
            .finish()
    }
}
