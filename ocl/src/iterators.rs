//! Iterator expressions and `iterate`.

use crate::eval::{is_type_of, to_collection};
use crate::{EvalError, EvalResult, Evaluator, Expr, IteratorKind, Scope};
use mrepo_core::{Collection, CollectionKind, Value};
use std::cmp::Ordering;
use std::collections::VecDeque;
use tracing::trace;

impl<'p> Evaluator<'p> {
    pub(crate) fn eval_iterator(
        &self,
        source: &Expr,
        kind: IteratorKind,
        var: &str,
        body: &Expr,
        scope: &Scope<'_>,
    ) -> EvalResult<Value> {
        let source = to_collection(self.eval(source, scope)?);

        match kind {
            IteratorKind::Select | IteratorKind::Reject => {
                let keep = kind == IteratorKind::Select;
                let mut items = Vec::new();
                for item in source.items {
                    if self.eval_predicate(kind, body, var, &item, scope)? == keep {
                        items.push(item);
                    }
                }
                Ok(Value::Collection(Collection::new(source.kind, items)))
            }
            IteratorKind::Collect => {
                let mut items = Vec::new();
                for item in &source.items {
                    match self.eval_body(body, var, item, scope)? {
                        Value::Null => {}
                        Value::Collection(inner) => items.extend(inner.items),
                        other => items.push(other),
                    }
                }
                Ok(Value::Collection(Collection::new(
                    source.kind.collect_kind(),
                    items,
                )))
            }
            IteratorKind::ForAll => {
                for item in &source.items {
                    if !self.eval_predicate(kind, body, var, item, scope)? {
                        return Ok(Value::Bool(false));
                    }
                }
                Ok(Value::Bool(true))
            }
            IteratorKind::Exists => {
                for item in &source.items {
                    if self.eval_predicate(kind, body, var, item, scope)? {
                        return Ok(Value::Bool(true));
                    }
                }
                Ok(Value::Bool(false))
            }
            IteratorKind::Exists1 | IteratorKind::One => {
                let mut matches = 0;
                for item in &source.items {
                    if self.eval_predicate(kind, body, var, item, scope)? {
                        matches += 1;
                        if matches > 1 {
                            break;
                        }
                    }
                }
                Ok(Value::Bool(matches == 1))
            }
            IteratorKind::Any => {
                for item in source.items {
                    if self.eval_predicate(kind, body, var, &item, scope)? {
                        return Ok(item);
                    }
                }
                Ok(Value::Null)
            }
            IteratorKind::IsUnique => {
                let mut seen: Vec<Value> = Vec::with_capacity(source.len());
                for item in &source.items {
                    let value = self.eval_body(body, var, item, scope)?;
                    if seen.iter().any(|v| v.equals(&value)) {
                        return Ok(Value::Bool(false));
                    }
                    seen.push(value);
                }
                Ok(Value::Bool(true))
            }
            IteratorKind::SortedBy => self.sorted_by(source, var, body, scope),
            IteratorKind::Closure => self.closure(source, var, body, scope),
            IteratorKind::SelectByKind | IteratorKind::SelectAsKind | IteratorKind::SelectByType => {
                let mut items = Vec::new();
                for item in source.items {
                    let mut frame = scope.child();
                    frame.bind(var, item.clone());
                    frame.bind("_it", item.clone());
                    let type_name = self.type_name_of(body, &frame)?;
                    match kind {
                        IteratorKind::SelectByType => {
                            if is_type_of(&item, &type_name) {
                                items.push(item);
                            }
                        }
                        _ if self.is_kind_of(&item, &type_name) => {
                            if kind == IteratorKind::SelectAsKind {
                                items.push(self.cast(item, &type_name)?);
                            } else {
                                items.push(item);
                            }
                        }
                        _ => {}
                    }
                }
                Ok(Value::Collection(Collection::new(source.kind, items)))
            }
        }
    }

    /// `source->iterate(iter_var; acc_var = init | body)`.
    pub(crate) fn eval_iterate(
        &self,
        source: &Expr,
        iter_var: &str,
        acc_var: &str,
        init: &Expr,
        body: &Expr,
        scope: &Scope<'_>,
    ) -> EvalResult<Value> {
        let source = to_collection(self.eval(source, scope)?);
        let mut acc = self.eval(init, scope)?;
        for item in source.items {
            let mut frame = scope.child();
            frame.bind(iter_var, item.clone());
            frame.bind("_it", item);
            frame.bind(acc_var, acc);
            acc = self.eval(body, &frame)?;
        }
        Ok(acc)
    }

    fn eval_body(&self, body: &Expr, var: &str, item: &Value, scope: &Scope<'_>) -> EvalResult<Value> {
        let mut frame = scope.child();
        frame.bind(var, item.clone());
        frame.bind("_it", item.clone());
        self.eval(body, &frame)
    }

    fn eval_predicate(
        &self,
        kind: IteratorKind,
        body: &Expr,
        var: &str,
        item: &Value,
        scope: &Scope<'_>,
    ) -> EvalResult<bool> {
        match self.eval_body(body, var, item, scope)? {
            Value::Bool(b) => Ok(b),
            Value::Null => Ok(false),
            other => Err(EvalError::type_mismatch(format!(
                "{} body must be Boolean, got {}",
                kind.name(),
                other.type_name()
            ))),
        }
    }

    fn sorted_by(
        &self,
        source: Collection,
        var: &str,
        body: &Expr,
        scope: &Scope<'_>,
    ) -> EvalResult<Value> {
        let result_kind = if source.kind.is_unique() {
            CollectionKind::OrderedSet
        } else {
            CollectionKind::Sequence
        };

        let mut keyed = Vec::with_capacity(source.len());
        for item in source.items {
            let key = self.eval_body(body, var, &item, scope)?;
            keyed.push((key, item));
        }
        // Keys must be mutually comparable for the order to be total.
        for (i, (left, _)) in keyed.iter().enumerate() {
            for (right, _) in &keyed[i + 1..] {
                if left.compare(right).is_none() {
                    return Err(EvalError::not_comparable(left.to_string(), right.to_string()));
                }
            }
        }
        keyed.sort_by(|(a, _), (b, _)| a.compare(b).unwrap_or(Ordering::Equal));

        let items = keyed.into_iter().map(|(_, item)| item).collect();
        Ok(Value::Collection(Collection::new(result_kind, items)))
    }

    /// Breadth-first transitive closure seeded with the source elements.
    fn closure(
        &self,
        source: Collection,
        var: &str,
        body: &Expr,
        scope: &Scope<'_>,
    ) -> EvalResult<Value> {
        let mut result = Collection::ordered_set(Vec::new());
        let mut queue = VecDeque::new();
        for item in source.items {
            if !result.contains(&item) {
                result.push(item.clone());
                queue.push_back(item);
            }
        }

        let mut steps = 0usize;
        while let Some(item) = queue.pop_front() {
            steps += 1;
            for next in self.eval_body(body, var, &item, scope)?.into_items() {
                if !result.contains(&next) {
                    result.push(next.clone());
                    queue.push_back(next);
                }
            }
            trace!(steps, discovered = result.len(), "closure step");
        }

        Ok(Value::Collection(result))
    }
}
