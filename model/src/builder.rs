//! ModelBuilder for constructing an immutable Model.

use crate::index::AdjacencyIndex;
use crate::model::ObjectData;
use crate::{ClassDef, DerivedFn, Model, ModelError, ModelResult, OperationDef, OperationFn};
use mrepo_core::{NamedArgs, ObjectId, ObjectRef, PortResult, Properties, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Builder for constructing an immutable Model.
#[derive(Debug, Default)]
pub struct ModelBuilder {
    /// Next object ID to allocate.
    next_object_id: u64,
    /// Classes being built.
    classes: HashMap<String, ClassDef>,
    /// Associations in declaration order.
    associations: Vec<String>,
    /// Objects in creation order.
    objects: Vec<ObjectData>,
    /// Link adjacency.
    adjacency: AdjacencyIndex,
}

impl ModelBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            next_object_id: 1,
            ..Default::default()
        }
    }

    /// Add a class definition.
    pub fn add_class(&mut self, name: impl Into<String>) -> ClassBuilder<'_> {
        ClassBuilder {
            builder: self,
            class: ClassDef {
                name: name.into(),
                ..Default::default()
            },
        }
    }

    /// Declare an association.
    pub fn add_association(&mut self, name: impl Into<String>) -> ModelResult<()> {
        let name = name.into();
        if self.associations.contains(&name) {
            return Err(ModelError::DuplicateAssociation(name));
        }
        self.associations.push(name);
        Ok(())
    }

    /// Create an instance of a declared class.
    pub fn create_object(&mut self, class: &str, properties: Properties) -> ModelResult<ObjectRef> {
        if !self.classes.contains_key(class) {
            return Err(ModelError::UnknownClass(class.to_string()));
        }
        let object = ObjectRef::new(self.next_object_id, class);
        self.next_object_id += 1;
        self.objects.push(ObjectData {
            object: object.clone(),
            properties,
        });
        Ok(object)
    }

    /// Link two objects through a declared association.
    pub fn link(&mut self, assoc: &str, source: ObjectId, target: ObjectId) -> ModelResult<()> {
        if !self.associations.iter().any(|a| a == assoc) {
            return Err(ModelError::UnknownAssociation(assoc.to_string()));
        }
        for id in [source, target] {
            if !self.objects.iter().any(|d| d.object.id == id) {
                return Err(ModelError::UnknownObject(id));
            }
        }
        self.adjacency.insert(assoc, source, target);
        Ok(())
    }

    /// Build the immutable Model.
    pub fn build(self) -> Model {
        Model::new(self.classes, self.associations, self.objects, self.adjacency)
    }
}

/// Builder for a class definition.
pub struct ClassBuilder<'a> {
    builder: &'a mut ModelBuilder,
    class: ClassDef,
}

impl<'a> ClassBuilder<'a> {
    /// Add a parent class by name.
    pub fn extends(mut self, parent_name: impl Into<String>) -> Self {
        self.class.parents.push(parent_name.into());
        self
    }

    /// Define (or redefine) an operation.
    pub fn operation<F>(mut self, name: impl Into<String>, params: &[&str], body: F) -> Self
    where
        F: Fn(&ObjectRef, &Properties, &NamedArgs) -> PortResult<Value> + Send + Sync + 'static,
    {
        let name = name.into();
        let body: OperationFn = Arc::new(body);
        self.class.operations.insert(
            name.clone(),
            OperationDef {
                name,
                params: params.iter().map(|p| p.to_string()).collect(),
                body,
            },
        );
        self
    }

    /// Define (or redefine) a derived property.
    pub fn derived<F>(mut self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&ObjectRef, &Properties) -> Value + Send + Sync + 'static,
    {
        let body: DerivedFn = Arc::new(body);
        self.class.derived.insert(name.into(), body);
        self
    }

    /// Finish building this class.
    pub fn done(self) -> ModelResult<()> {
        if self.builder.classes.contains_key(&self.class.name) {
            return Err(ModelError::DuplicateClass(self.class.name));
        }
        for parent in &self.class.parents {
            if !self.builder.classes.contains_key(parent) {
                return Err(ModelError::UnknownParentClass(parent.clone()));
            }
        }
        self.builder
            .classes
            .insert(self.class.name.clone(), self.class);
        Ok(())
    }
}
