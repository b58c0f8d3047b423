//! The access port: the narrow interface both evaluators use to reach the model.

use crate::{ObjectId, ObjectRef, PortResult, Value};

/// Named arguments passed to a user-defined operation, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedArgs {
    entries: Vec<(String, Value)>,
}

impl NamedArgs {
    /// Create empty arguments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an argument.
    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.entries.push((name.into(), value));
    }

    /// Get an argument by parameter name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Iterate over (name, value) pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, Value)> for NamedArgs {
    fn from_iter<I: IntoIterator<Item = (S, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(n, v)| (n.into(), v)).collect(),
        }
    }
}

/// Reflective access to the model.
///
/// Reads never fail: an unresolved property is `Value::Null` and an absent
/// association is an empty list. Only operation invocation reports errors.
/// Implementations must return elements in a stable order so that query
/// results are repeatable.
pub trait AccessPort {
    /// Read a property of an element.
    fn get_property(&self, id: ObjectId, name: &str) -> Value;

    /// Read a property resolving its definition from `view_type` instead of the real class.
    fn get_property_as(&self, id: ObjectId, name: &str, view_type: &str) -> Value;

    /// Elements linked from `source` through the association (or association end) `assoc`.
    fn linked_targets(&self, assoc: &str, source: ObjectId) -> Vec<ObjectRef>;

    /// Elements linking to `target` through `assoc`.
    fn linked_sources(&self, assoc: &str, target: ObjectId) -> Vec<ObjectRef>;

    /// Reflexive, transitive subclass test over class names.
    fn is_subclass_of(&self, class: &str, ancestor: &str) -> bool;

    /// All instances of a class, including instances of its subclasses.
    fn elements_by_class(&self, class: &str) -> Vec<ObjectRef>;

    /// All elements of the model.
    fn all_elements(&self) -> Vec<ObjectRef>;

    /// Names of every association, used for unlabeled edge patterns.
    fn association_names(&self) -> Vec<String>;

    /// Invoke a user-defined operation dispatching on the element's real class.
    fn invoke_operation(&self, id: ObjectId, op: &str, args: &NamedArgs) -> PortResult<Value>;

    /// Invoke a user-defined operation starting dispatch at `view_type`.
    fn invoke_operation_as(
        &self,
        id: ObjectId,
        op: &str,
        view_type: &str,
        args: &NamedArgs,
    ) -> PortResult<Value>;

    /// Declared parameter names of an operation, `None` if the class has no such operation.
    fn operation_parameter_names(&self, class: &str, op: &str) -> Option<Vec<String>>;
}
