//! Pattern matching against the model.

use crate::eval::Evaluator;
use crate::{
    Binding, EdgePattern, ExecutorConfig, NodePattern, PathElement, PathPattern, QueryError,
    QueryResult, Quantifier,
};
use mrepo_core::{AccessPort, ObjectId, ObjectRef, Value};
use std::collections::HashSet;
use tracing::trace;

/// A path match in progress.
#[derive(Debug, Clone)]
struct Partial {
    binding: Binding,
    /// Element bound by the most recent node pattern.
    cursor: Option<ObjectRef>,
    /// Values of the elements matched so far, for path variables.
    trail: Vec<Value>,
}

/// Pattern matcher that extends rows with every match of a pattern.
pub(crate) struct Matcher<'p> {
    port: &'p dyn AccessPort,
    config: ExecutorConfig,
}

impl<'p> Matcher<'p> {
    pub(crate) fn new(port: &'p dyn AccessPort, config: ExecutorConfig) -> Self {
        Self { port, config }
    }

    /// Extend `row` with every joint match of the patterns.
    pub(crate) fn match_patterns(
        &self,
        patterns: &[PathPattern],
        row: Binding,
    ) -> QueryResult<Vec<Binding>> {
        let mut rows = vec![row];
        for pattern in patterns {
            let mut next = Vec::new();
            for row in rows {
                next.extend(self.match_path(pattern, row)?);
            }
            rows = next;
            if rows.is_empty() {
                break;
            }
        }
        Ok(rows)
    }

    /// Extend `row` with every match of one path pattern.
    pub(crate) fn match_path(&self, pattern: &PathPattern, row: Binding) -> QueryResult<Vec<Binding>> {
        let start = vec![Partial {
            binding: row,
            cursor: None,
            trail: Vec::new(),
        }];
        let (partials, pending) = self.match_elements(&pattern.elements, start, None)?;
        if pending.is_some() {
            return Err(QueryError::invalid_pattern(
                "edge pattern must be followed by a node pattern",
            ));
        }

        let rows: Vec<Binding> = partials
            .into_iter()
            .map(|partial| {
                let mut binding = partial.binding;
                if let Some(var) = &pattern.variable {
                    binding.insert(var.as_str(), Value::list(partial.trail));
                }
                binding
            })
            .collect();
        trace!(rows = rows.len(), path = ?pattern.variable, "matched path pattern");
        Ok(rows)
    }

    fn match_elements<'a>(
        &self,
        elements: &'a [PathElement],
        mut partials: Vec<Partial>,
        mut pending: Option<&'a EdgePattern>,
    ) -> QueryResult<(Vec<Partial>, Option<&'a EdgePattern>)> {
        for element in elements {
            let Some(first) = partials.first() else {
                return Ok((partials, None));
            };
            match element {
                PathElement::Edge(edge) => {
                    if pending.is_some() {
                        return Err(QueryError::invalid_pattern(
                            "two consecutive edge patterns",
                        ));
                    }
                    if first.cursor.is_none() {
                        return Err(QueryError::invalid_pattern(
                            "path pattern must start with a node pattern",
                        ));
                    }
                    pending = Some(edge);
                }
                PathElement::Node(node) => {
                    partials = match pending.take() {
                        Some(edge) => self.traverse(edge, node, partials)?,
                        None => self.bind_node(node, partials)?,
                    };
                }
                PathElement::Path(inner) => {
                    let mark = first.trail.len();
                    let (matched, still_pending) =
                        self.match_elements(&inner.elements, partials, pending)?;
                    if still_pending.is_some() {
                        return Err(QueryError::invalid_pattern(
                            "nested path must end with a node pattern",
                        ));
                    }
                    pending = None;
                    partials = matched
                        .into_iter()
                        .map(|mut partial| {
                            let value = Value::list(partial.trail.split_off(mark));
                            if let Some(var) = &inner.variable {
                                partial.binding.insert(var.as_str(), value.clone());
                            }
                            partial.trail.push(value);
                            partial
                        })
                        .collect();
                }
            }
        }
        Ok((partials, pending))
    }

    /// A node pattern not reached through an edge.
    fn bind_node(&self, node: &NodePattern, partials: Vec<Partial>) -> QueryResult<Vec<Partial>> {
        let mut result = Vec::new();
        for partial in partials {
            let bound = node
                .variable
                .as_ref()
                .and_then(|var| partial.binding.get(var));
            let candidates = match bound {
                // Null or scalar bindings cannot match a node.
                Some(value) => value.as_object().cloned().into_iter().collect(),
                None => self.candidates(&node.labels),
            };
            for candidate in candidates {
                if let Some(next) = self.accept_node(node, &partial, candidate)? {
                    result.push(next);
                }
            }
        }
        Ok(result)
    }

    /// Label-matching candidates; every element when unlabeled.
    fn candidates(&self, labels: &[String]) -> Vec<ObjectRef> {
        if labels.is_empty() {
            return self.port.all_elements();
        }
        let mut result: Vec<ObjectRef> = Vec::new();
        for label in labels {
            for object in self.port.elements_by_class(label) {
                if !result.iter().any(|o| o.same_as(&object)) {
                    result.push(object);
                }
            }
        }
        result
    }

    /// Check labels and property predicates, then bind the node.
    fn accept_node(
        &self,
        node: &NodePattern,
        partial: &Partial,
        candidate: ObjectRef,
    ) -> QueryResult<Option<Partial>> {
        let labelled = node.labels.is_empty()
            || node
                .labels
                .iter()
                .any(|label| self.port.is_subclass_of(&candidate.class, label));
        if !labelled {
            return Ok(None);
        }

        let mut binding = partial.binding.clone();
        if let Some(var) = &node.variable {
            if !binding.contains(var) {
                binding.insert(var.as_str(), Value::Object(candidate.clone()));
            }
        }

        let evaluator = Evaluator::new(self.port, self.config);
        for (name, expr) in &node.properties {
            let expected = evaluator.eval(expr, &binding)?;
            if !self.port.get_property(candidate.id, name).equals(&expected) {
                return Ok(None);
            }
        }

        let mut trail = partial.trail.clone();
        trail.push(Value::Object(candidate.clone()));
        Ok(Some(Partial {
            binding,
            cursor: Some(candidate),
            trail,
        }))
    }

    /// Follow an edge pattern from each cursor into the next node pattern.
    fn traverse(
        &self,
        edge: &EdgePattern,
        node: &NodePattern,
        partials: Vec<Partial>,
    ) -> QueryResult<Vec<Partial>> {
        let hops = match edge.quantifier {
            Some(quantifier) => Some(self.hop_range(quantifier)?),
            None => None,
        };
        let evaluator = Evaluator::new(self.port, self.config);

        let mut result = Vec::new();
        for partial in partials {
            let Some(source) = partial.cursor.clone() else {
                return Err(QueryError::invalid_pattern(
                    "path pattern must start with a node pattern",
                ));
            };

            // Links carry no properties, so every edge predicate compares against null.
            let mut edge_props_hold = true;
            for (_, expr) in &edge.properties {
                if !evaluator.eval(expr, &partial.binding)?.is_null() {
                    edge_props_hold = false;
                    break;
                }
            }
            if !edge_props_hold {
                continue;
            }

            let reached = match hops {
                Some((min, max)) => self.reachable(edge, &source, min, max),
                None => self
                    .neighbors(edge, &source)
                    .into_iter()
                    .map(|target| (target.clone(), vec![source.clone(), target]))
                    .collect(),
            };

            let bound_target = node
                .variable
                .as_ref()
                .and_then(|var| partial.binding.get(var));
            for (target, path) in reached {
                if let Some(bound) = bound_target {
                    if !bound.as_object().is_some_and(|b| b.same_as(&target)) {
                        continue;
                    }
                }

                let edge_value = Value::list(path.into_iter().map(Value::Object).collect());
                let mut base = partial.clone();
                if let Some(var) = &edge.variable {
                    match base.binding.get(var) {
                        Some(existing) if !existing.equals(&edge_value) => continue,
                        Some(_) => {}
                        None => base.binding.insert(var.as_str(), edge_value.clone()),
                    }
                }
                base.trail.push(edge_value);

                if let Some(next) = self.accept_node(node, &base, target)? {
                    result.push(next);
                }
            }
        }
        Ok(result)
    }

    fn hop_range(&self, quantifier: Quantifier) -> QueryResult<(u32, u32)> {
        let (min, max) = match quantifier {
            Quantifier::Fixed(n) => (n, n),
            Quantifier::Range { min, max } => {
                (min, max.unwrap_or(self.config.max_path_depth))
            }
        };
        if min > max {
            return Err(QueryError::invalid_quantifier(format!(
                "lower bound {} exceeds upper bound {}",
                min, max
            )));
        }
        Ok((min, max))
    }

    /// Elements one hop away, deduplicated by identity.
    fn neighbors(&self, edge: &EdgePattern, from: &ObjectRef) -> Vec<ObjectRef> {
        let associations = if edge.labels.is_empty() {
            self.port.association_names()
        } else {
            edge.labels.clone()
        };

        let mut result: Vec<ObjectRef> = Vec::new();
        let mut add = |objects: Vec<ObjectRef>| {
            for object in objects {
                if !result.iter().any(|o| o.same_as(&object)) {
                    result.push(object);
                }
            }
        };
        for assoc in &associations {
            if edge.direction.follows_targets() {
                add(self.port.linked_targets(assoc, from.id));
            }
            if edge.direction.follows_sources() {
                add(self.port.linked_sources(assoc, from.id));
            }
        }
        result
    }

    /// Breadth-first expansion of a quantified edge.
    ///
    /// Each path keeps its own visited set; every distinct node reachable at a
    /// hop count within `min..=max` is reported once with the first path found.
    fn reachable(
        &self,
        edge: &EdgePattern,
        source: &ObjectRef,
        min: u32,
        max: u32,
    ) -> Vec<(ObjectRef, Vec<ObjectRef>)> {
        let mut reported: HashSet<ObjectId> = HashSet::new();
        let mut result = Vec::new();
        if min == 0 {
            reported.insert(source.id);
            result.push((source.clone(), vec![source.clone()]));
        }

        let mut frontier = vec![vec![source.clone()]];
        for depth in 1..=max {
            let mut next_frontier = Vec::new();
            for path in &frontier {
                let Some(last) = path.last() else {
                    continue;
                };
                for neighbor in self.neighbors(edge, last) {
                    if path.iter().any(|visited| visited.same_as(&neighbor)) {
                        continue;
                    }
                    let mut extended = path.clone();
                    extended.push(neighbor.clone());
                    if depth >= min && reported.insert(neighbor.id) {
                        result.push((neighbor, extended.clone()));
                    }
                    next_frontier.push(extended);
                }
            }
            trace!(depth, frontier = next_frontier.len(), "quantified edge expansion");
            if next_frontier.is_empty() {
                break;
            }
            frontier = next_frontier;
        }
        result
    }
}
