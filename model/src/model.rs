//! In-memory model storage and its access port implementation.

use crate::index::{AdjacencyIndex, SubclassIndex};
use crate::{ClassDef, OperationDef};
use mrepo_core::{
    AccessPort, NamedArgs, ObjectId, ObjectRef, PortError, PortResult, Properties, Value,
};
use std::collections::HashMap;

/// A stored model element.
#[derive(Debug, Clone)]
pub(crate) struct ObjectData {
    pub(crate) object: ObjectRef,
    pub(crate) properties: Properties,
}

/// An immutable in-memory model. Use [`crate::ModelBuilder`] to construct one.
#[derive(Debug)]
pub struct Model {
    /// Class definitions by name.
    classes: HashMap<String, ClassDef>,
    /// Precomputed inheritance relationships.
    subclass_index: SubclassIndex,
    /// Association names in declaration order.
    associations: Vec<String>,
    /// Objects in creation order.
    objects: Vec<ObjectData>,
    /// Object position lookup by id.
    object_index: HashMap<ObjectId, usize>,
    /// Link adjacency.
    adjacency: AdjacencyIndex,
}

impl Model {
    pub(crate) fn new(
        classes: HashMap<String, ClassDef>,
        associations: Vec<String>,
        objects: Vec<ObjectData>,
        adjacency: AdjacencyIndex,
    ) -> Self {
        let subclass_index = SubclassIndex::build(&classes);
        let object_index = objects
            .iter()
            .enumerate()
            .map(|(i, data)| (data.object.id, i))
            .collect();
        Self {
            classes,
            subclass_index,
            associations,
            objects,
            object_index,
            adjacency,
        }
    }

    /// Get a class definition by name.
    pub fn get_class(&self, name: &str) -> Option<&ClassDef> {
        self.classes.get(name)
    }

    /// Get the reference for an object id.
    pub fn get_object(&self, id: ObjectId) -> Option<&ObjectRef> {
        self.data(id).map(|d| &d.object)
    }

    /// Get the number of objects.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    fn data(&self, id: ObjectId) -> Option<&ObjectData> {
        self.object_index.get(&id).map(|&i| &self.objects[i])
    }

    fn refs(&self, ids: &[ObjectId]) -> Vec<ObjectRef> {
        ids.iter()
            .filter_map(|id| self.get_object(*id).cloned())
            .collect()
    }

    /// Find the first operation definition along the dispatch order of `class`.
    fn resolve_operation(&self, class: &str, op: &str) -> Option<&OperationDef> {
        self.subclass_index
            .linearization(class)
            .iter()
            .filter_map(|name| self.classes.get(name))
            .find_map(|c| c.get_operation(op))
    }

    /// Read a property, resolving derived definitions starting from `dispatch_class`.
    fn read_property(&self, id: ObjectId, name: &str, dispatch_class: &str) -> Value {
        let Some(data) = self.data(id) else {
            return Value::Null;
        };
        let derived = self
            .subclass_index
            .linearization(dispatch_class)
            .iter()
            .filter_map(|c| self.classes.get(c))
            .find_map(|c| c.get_derived(name));
        match derived {
            Some(body) => body(&data.object, &data.properties),
            None => data.properties.get(name).cloned().unwrap_or(Value::Null),
        }
    }

    fn invoke(
        &self,
        id: ObjectId,
        op: &str,
        dispatch_class: &str,
        args: &NamedArgs,
    ) -> PortResult<Value> {
        let data = self.data(id).ok_or(PortError::UnknownObject(id))?;
        let operation = self
            .resolve_operation(dispatch_class, op)
            .ok_or_else(|| PortError::unknown_operation(dispatch_class, op))?;
        (operation.body)(&data.object, &data.properties, args)
    }
}

impl AccessPort for Model {
    fn get_property(&self, id: ObjectId, name: &str) -> Value {
        match self.data(id) {
            Some(data) => self.read_property(id, name, &data.object.class),
            None => Value::Null,
        }
    }

    fn get_property_as(&self, id: ObjectId, name: &str, view_type: &str) -> Value {
        self.read_property(id, name, view_type)
    }

    fn linked_targets(&self, assoc: &str, source: ObjectId) -> Vec<ObjectRef> {
        self.refs(self.adjacency.targets(assoc, source))
    }

    fn linked_sources(&self, assoc: &str, target: ObjectId) -> Vec<ObjectRef> {
        self.refs(self.adjacency.sources(assoc, target))
    }

    fn is_subclass_of(&self, class: &str, ancestor: &str) -> bool {
        self.subclass_index.is_subclass(class, ancestor)
    }

    fn elements_by_class(&self, class: &str) -> Vec<ObjectRef> {
        self.objects
            .iter()
            .filter(|d| self.subclass_index.is_subclass(&d.object.class, class))
            .map(|d| d.object.clone())
            .collect()
    }

    fn all_elements(&self) -> Vec<ObjectRef> {
        self.objects.iter().map(|d| d.object.clone()).collect()
    }

    fn association_names(&self) -> Vec<String> {
        self.associations.clone()
    }

    fn invoke_operation(&self, id: ObjectId, op: &str, args: &NamedArgs) -> PortResult<Value> {
        let class = self
            .data(id)
            .map(|d| d.object.class.clone())
            .ok_or(PortError::UnknownObject(id))?;
        self.invoke(id, op, &class, args)
    }

    fn invoke_operation_as(
        &self,
        id: ObjectId,
        op: &str,
        view_type: &str,
        args: &NamedArgs,
    ) -> PortResult<Value> {
        self.invoke(id, op, view_type, args)
    }

    fn operation_parameter_names(&self, class: &str, op: &str) -> Option<Vec<String>> {
        self.resolve_operation(class, op).map(|o| o.params.clone())
    }
}
