//! Indexes for inheritance and link lookups.

use crate::ClassDef;
use mrepo_core::ObjectId;
use std::collections::{HashMap, HashSet};

/// Precomputed class relationships.
#[derive(Debug, Default)]
pub struct SubclassIndex {
    /// For each class, the set of all its ancestors (transitive, excluding itself).
    ancestors: HashMap<String, HashSet<String>>,
    /// For each class, its dispatch order: itself, then ancestors breadth first.
    linearization: HashMap<String, Vec<String>>,
}

impl SubclassIndex {
    /// Build the index from class definitions.
    pub fn build(classes: &HashMap<String, ClassDef>) -> Self {
        let mut index = Self::default();

        for name in classes.keys() {
            let order = Self::linearize(name, classes);
            let ancestors = order.iter().skip(1).cloned().collect();
            index.ancestors.insert(name.clone(), ancestors);
            index.linearization.insert(name.clone(), order);
        }

        index
    }

    /// Breadth-first walk over parents in declaration order, first visit wins.
    fn linearize(name: &str, classes: &HashMap<String, ClassDef>) -> Vec<String> {
        let mut order = vec![name.to_string()];
        let mut seen: HashSet<String> = HashSet::from([name.to_string()]);
        let mut cursor = 0;

        while cursor < order.len() {
            if let Some(class) = classes.get(&order[cursor]) {
                for parent in &class.parents {
                    if seen.insert(parent.clone()) {
                        order.push(parent.clone());
                    }
                }
            }
            cursor += 1;
        }

        order
    }

    /// Check if `class` is `ancestor` or one of its descendants.
    pub fn is_subclass(&self, class: &str, ancestor: &str) -> bool {
        class == ancestor
            || self
                .ancestors
                .get(class)
                .is_some_and(|set| set.contains(ancestor))
    }

    /// Dispatch order for a class, starting with the class itself.
    pub fn linearization(&self, class: &str) -> &[String] {
        self.linearization
            .get(class)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

/// Adjacency index: (association, object) -> linked objects, in link order.
#[derive(Debug, Default)]
pub struct AdjacencyIndex {
    outgoing: HashMap<(String, ObjectId), Vec<ObjectId>>,
    incoming: HashMap<(String, ObjectId), Vec<ObjectId>>,
}

impl AdjacencyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, assoc: &str, source: ObjectId, target: ObjectId) {
        self.outgoing
            .entry((assoc.to_string(), source))
            .or_default()
            .push(target);
        self.incoming
            .entry((assoc.to_string(), target))
            .or_default()
            .push(source);
    }

    pub fn targets(&self, assoc: &str, source: ObjectId) -> &[ObjectId] {
        self.outgoing
            .get(&(assoc.to_string(), source))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn sources(&self, assoc: &str, target: ObjectId) -> &[ObjectId] {
        self.incoming
            .get(&(assoc.to_string(), target))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}
