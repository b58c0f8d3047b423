//! Expression evaluation.

use crate::library::{collection_op, expect_arity, numeric_op, string_op};
use crate::operators::{apply_infix, apply_prefix};
use crate::{
    CollectionPart, EvalConfig, EvalError, EvalResult, Expr, InfixOp, Literal, Scope, TypeName,
    TypeOpKind,
};
use mrepo_core::{AccessPort, Collection, CollectionKind, NamedArgs, ObjectRef, ObjectView, Value};
use std::cell::Cell;
use tracing::debug;

/// Constraint expression evaluator.
///
/// Bound to one context element (`self`) and one access port. The evaluator
/// keeps a recursion counter, so create one per concurrent evaluation.
pub struct Evaluator<'p> {
    pub(crate) port: &'p dyn AccessPort,
    root: Scope<'static>,
    config: EvalConfig,
    depth: Cell<usize>,
}

impl<'p> Evaluator<'p> {
    /// Create an evaluator with `self` bound to `self_value`.
    pub fn new(port: &'p dyn AccessPort, self_value: Value) -> Self {
        Self {
            port,
            root: Scope::root(self_value),
            config: EvalConfig::default(),
            depth: Cell::new(0),
        }
    }

    pub fn with_config(mut self, config: EvalConfig) -> Self {
        self.config = config;
        self
    }

    /// Bind an additional variable in the outermost scope.
    pub fn with_variable(mut self, name: impl Into<String>, value: Value) -> Self {
        self.root.bind(name, value);
        self
    }

    /// Evaluate an expression.
    pub fn evaluate(&self, expr: &Expr) -> EvalResult<Value> {
        self.depth.set(0);
        let result = self.eval(expr, &self.root);
        match &result {
            Ok(value) => debug!(result = %value, "evaluated expression"),
            Err(err) => debug!(error = %err, "expression evaluation failed"),
        }
        result
    }

    /// Evaluate a constraint. Null counts as not satisfied.
    pub fn check(&self, expr: &Expr) -> EvalResult<bool> {
        match self.evaluate(expr)? {
            Value::Bool(b) => Ok(b),
            Value::Null => Ok(false),
            other => Err(EvalError::type_mismatch(format!(
                "constraint must be Boolean, got {}",
                other.type_name()
            ))),
        }
    }

    pub(crate) fn eval(&self, expr: &Expr, scope: &Scope<'_>) -> EvalResult<Value> {
        let depth = self.depth.get() + 1;
        if depth > self.config.max_depth {
            return Err(EvalError::DepthExceeded {
                limit: self.config.max_depth,
            });
        }
        self.depth.set(depth);
        let result = self.eval_node(expr, scope);
        self.depth.set(depth - 1);
        result
    }

    fn eval_node(&self, expr: &Expr, scope: &Scope<'_>) -> EvalResult<Value> {
        match expr {
            Expr::Literal(lit) => eval_literal(lit),
            Expr::CollectionLiteral { kind, parts } => {
                self.eval_collection_literal(*kind, parts, scope)
            }
            Expr::Variable(name) => self.eval_variable(name, scope),
            Expr::Property { source, name } => {
                let source = self.eval(source, scope)?;
                Ok(self.member(source, name, false))
            }
            Expr::Navigation { source, name } => {
                let source = self.eval(source, scope)?;
                Ok(self.member(source, name, true))
            }
            Expr::OperationCall { source, name, args } => {
                self.eval_operation_call(source.as_deref(), name, args, scope)
            }
            Expr::ArrowCall { source, name, args } => {
                let source = to_collection(self.eval(source, scope)?);
                let args = self.eval_args(args, scope)?;
                collection_op(name, source, args)
            }
            Expr::Iterator {
                source,
                kind,
                var,
                body,
            } => self.eval_iterator(source, *kind, var, body, scope),
            Expr::Iterate {
                source,
                iter_var,
                acc_var,
                init,
                body,
            } => self.eval_iterate(source, iter_var, acc_var, init, body, scope),
            Expr::If {
                cond,
                then_branch,
                else_branch,
            } => match self.eval(cond, scope)? {
                Value::Bool(true) => self.eval(then_branch, scope),
                Value::Bool(false) => self.eval(else_branch, scope),
                other => Err(EvalError::type_mismatch(format!(
                    "if condition must be Boolean, got {}",
                    other.type_name()
                ))),
            },
            Expr::Let { var, value, body } => {
                let value = self.eval(value, scope)?;
                let mut frame = scope.child();
                frame.bind(var.as_str(), value);
                self.eval(body, &frame)
            }
            Expr::TypeOp {
                source,
                op,
                type_name,
            } => {
                let value = self.eval(source, scope)?;
                let type_name = match type_name {
                    TypeName::Static(name) => name.clone(),
                    TypeName::Dynamic(expr) => self.type_name_of(expr, scope)?,
                };
                self.apply_type_op(value, *op, &type_name)
            }
            Expr::Infix { left, op, right } => self.eval_infix(left, *op, right, scope),
            Expr::Prefix { op, operand } => {
                let value = self.eval(operand, scope)?;
                apply_prefix(*op, &value)
            }
        }
    }

    fn eval_args(&self, args: &[Expr], scope: &Scope<'_>) -> EvalResult<Vec<Value>> {
        args.iter().map(|a| self.eval(a, scope)).collect()
    }

    fn eval_collection_literal(
        &self,
        kind: CollectionKind,
        parts: &[CollectionPart],
        scope: &Scope<'_>,
    ) -> EvalResult<Value> {
        let mut items = Vec::new();
        for part in parts {
            match part {
                CollectionPart::Item(expr) => items.push(self.eval(expr, scope)?),
                CollectionPart::Range(first, last) => {
                    let first = self.eval(first, scope)?;
                    let last = self.eval(last, scope)?;
                    match (first.as_int(), last.as_int()) {
                        (Some(a), Some(b)) => items.extend((a..=b).map(Value::Int)),
                        _ => {
                            return Err(EvalError::type_mismatch(format!(
                                "range bounds must be Integer, got {} and {}",
                                first.type_name(),
                                last.type_name()
                            )))
                        }
                    }
                }
            }
        }
        Ok(Value::Collection(Collection::new(kind, items)))
    }

    fn eval_variable(&self, name: &str, scope: &Scope<'_>) -> EvalResult<Value> {
        if let Some(value) = scope.lookup(name) {
            return Ok(value.clone());
        }
        // A bare name is a property of an object-valued `self`.
        match scope.lookup("self") {
            Some(receiver @ (Value::Object(_) | Value::View(_))) => {
                Ok(self.member(receiver.clone(), name, false))
            }
            _ => Err(EvalError::unbound_variable(name)),
        }
    }

    /// Property or navigation access with implicit collect over collections.
    fn member(&self, source: Value, name: &str, navigate: bool) -> Value {
        match source {
            Value::Object(object) => {
                if navigate {
                    self.navigate(&object, name)
                } else {
                    self.port.get_property(object.id, name)
                }
            }
            Value::View(view) => {
                if navigate {
                    self.navigate(&view.object, name)
                } else {
                    self.port
                        .get_property_as(view.object.id, name, &view.view_type)
                }
            }
            Value::Collection(collection) => {
                let kind = collection.kind.collect_kind();
                let mut items = Vec::new();
                for item in collection.items {
                    match self.member(item, name, navigate) {
                        Value::Null => {}
                        Value::Collection(inner) => items.extend(inner.items),
                        other => items.push(other),
                    }
                }
                Value::Collection(Collection::new(kind, items))
            }
            _ => Value::Null,
        }
    }

    /// Linked targets as an ordered set, falling back to a stored property of the same name.
    fn navigate(&self, object: &ObjectRef, name: &str) -> Value {
        let targets = self.port.linked_targets(name, object.id);
        if targets.is_empty() {
            return self.port.get_property(object.id, name);
        }
        Value::Collection(Collection::ordered_set(
            targets.into_iter().map(Value::Object).collect(),
        ))
    }

    fn eval_operation_call(
        &self,
        source: Option<&Expr>,
        name: &str,
        args: &[Expr],
        scope: &Scope<'_>,
    ) -> EvalResult<Value> {
        match name {
            "allInstances" => {
                expect_arity(name, args.len(), 0)?;
                let class = match source {
                    Some(expr) => self.type_name_of(expr, scope)?,
                    None => return Err(EvalError::unknown_operation(name, "self")),
                };
                let instances = self
                    .port
                    .elements_by_class(&class)
                    .into_iter()
                    .map(Value::Object)
                    .collect();
                return Ok(Value::Collection(Collection::set(instances)));
            }
            "oclIsKindOf" | "oclIsTypeOf" | "oclAsType" => {
                expect_arity(name, args.len(), 1)?;
                let receiver = self.receiver(source, scope)?;
                let type_name = self.type_name_of(&args[0], scope)?;
                let op = match name {
                    "oclIsKindOf" => TypeOpKind::OclIsKindOf,
                    "oclIsTypeOf" => TypeOpKind::OclIsTypeOf,
                    _ => TypeOpKind::OclAsType,
                };
                return self.apply_type_op(receiver, op, &type_name);
            }
            _ => {}
        }

        let receiver = self.receiver(source, scope)?;
        let args = self.eval_args(args, scope)?;
        self.call_on(receiver, name, args)
    }

    fn receiver(&self, source: Option<&Expr>, scope: &Scope<'_>) -> EvalResult<Value> {
        match source {
            Some(expr) => self.eval(expr, scope),
            None => scope
                .lookup("self")
                .cloned()
                .ok_or_else(|| EvalError::unbound_variable("self")),
        }
    }

    fn call_on(&self, receiver: Value, name: &str, args: Vec<Value>) -> EvalResult<Value> {
        match name {
            "oclIsUndefined" => {
                expect_arity(name, args.len(), 0)?;
                return Ok(Value::Bool(receiver.is_null()));
            }
            "oclIsInvalid" => {
                expect_arity(name, args.len(), 0)?;
                return Ok(Value::Bool(false));
            }
            "toString" => {
                expect_arity(name, args.len(), 0)?;
                return Ok(Value::String(receiver.to_string()));
            }
            _ => {}
        }

        match receiver {
            Value::Null => Ok(Value::Null),
            Value::String(s) => string_op(name, &s, &args)
                .unwrap_or_else(|| Err(EvalError::unknown_operation(name, "String"))),
            Value::Int(_) | Value::Real(_) => numeric_op(name, &receiver, &args)
                .unwrap_or_else(|| Err(EvalError::unknown_operation(name, receiver.type_name()))),
            Value::Object(object) => self.invoke_user_operation(&object, None, name, args),
            Value::View(view) => {
                self.invoke_user_operation(&view.object, Some(&view.view_type), name, args)
            }
            Value::Collection(collection) => {
                let kind = collection.kind.collect_kind();
                let mut items = Vec::new();
                for item in collection.items {
                    match self.call_on(item, name, args.clone())? {
                        Value::Null => {}
                        Value::Collection(inner) => items.extend(inner.items),
                        other => items.push(other),
                    }
                }
                Ok(Value::Collection(Collection::new(kind, items)))
            }
            other => Err(EvalError::unknown_operation(name, other.type_name())),
        }
    }

    /// Call a model-defined operation, matching arguments to declared parameters by position.
    fn invoke_user_operation(
        &self,
        object: &ObjectRef,
        view_type: Option<&str>,
        name: &str,
        args: Vec<Value>,
    ) -> EvalResult<Value> {
        let dispatch_class = view_type.unwrap_or(&object.class);
        let params = self
            .port
            .operation_parameter_names(dispatch_class, name)
            .ok_or_else(|| EvalError::unknown_operation(name, dispatch_class))?;
        if args.len() > params.len() {
            return Err(EvalError::too_many_arguments(name, params.len(), args.len()));
        }
        if let Some(missing) = params.get(args.len()) {
            return Err(EvalError::missing_argument(name, missing.as_str()));
        }

        let named: NamedArgs = params.into_iter().zip(args).collect();
        debug!(object = %object, operation = name, dispatch_class, "invoking operation");
        let result = match view_type {
            Some(view_type) => self
                .port
                .invoke_operation_as(object.id, name, view_type, &named)?,
            None => self.port.invoke_operation(object.id, name, &named)?,
        };
        Ok(result)
    }

    /// Resolve an expression used as a type name.
    ///
    /// An unbound bare name is the type name itself; anything else must
    /// evaluate to a string.
    pub(crate) fn type_name_of(&self, expr: &Expr, scope: &Scope<'_>) -> EvalResult<String> {
        match expr {
            Expr::Variable(name) if !scope.is_bound(name) => Ok(name.clone()),
            Expr::Literal(Literal::String(name)) => Ok(name.clone()),
            other => match self.eval(other, scope)? {
                Value::String(name) => Ok(name),
                value => Err(EvalError::invalid_type_expression(value.type_name())),
            },
        }
    }

    pub(crate) fn apply_type_op(
        &self,
        value: Value,
        op: TypeOpKind,
        type_name: &str,
    ) -> EvalResult<Value> {
        match op {
            TypeOpKind::OclIsKindOf => Ok(Value::Bool(self.is_kind_of(&value, type_name))),
            TypeOpKind::OclIsTypeOf => Ok(Value::Bool(is_type_of(&value, type_name))),
            TypeOpKind::OclAsType => self.cast(value, type_name),
            TypeOpKind::SelectByKind | TypeOpKind::SelectByType => {
                let mut collection = to_collection(value);
                collection.items.retain(|item| match op {
                    TypeOpKind::SelectByKind => self.is_kind_of(item, type_name),
                    _ => is_type_of(item, type_name),
                });
                Ok(Value::Collection(collection))
            }
        }
    }

    /// Kind test; views test their real class.
    pub(crate) fn is_kind_of(&self, value: &Value, type_name: &str) -> bool {
        match value {
            Value::Null => type_name == "OclVoid",
            _ if type_name == "OclAny" => true,
            Value::Object(object) => self.port.is_subclass_of(&object.class, type_name),
            Value::View(view) => self.port.is_subclass_of(&view.object.class, type_name),
            Value::Int(_) => type_name == "Integer" || type_name == "Real",
            Value::Collection(collection) => {
                type_name == "Collection" || type_name == collection.kind.name()
            }
            other => other.type_name() == type_name,
        }
    }

    /// `oclAsType`: objects become views, Integer widens to Real.
    pub(crate) fn cast(&self, value: Value, type_name: &str) -> EvalResult<Value> {
        if !value.is_null() && !self.is_kind_of(&value, type_name) {
            return Err(EvalError::type_mismatch(format!(
                "cannot cast {} to {}",
                value.type_name(),
                type_name
            )));
        }
        Ok(match value {
            Value::Object(object) => Value::View(ObjectView::new(object, type_name)),
            Value::View(view) => Value::View(ObjectView::new(view.object, type_name)),
            Value::Int(i) if type_name == "Real" => Value::Real(i as f64),
            other => other,
        })
    }

    fn eval_infix(
        &self,
        left: &Expr,
        op: InfixOp,
        right: &Expr,
        scope: &Scope<'_>,
    ) -> EvalResult<Value> {
        match op {
            InfixOp::And => {
                let l = boolean_operand(op, self.eval(left, scope)?)?;
                if l == Some(false) {
                    return Ok(Value::Bool(false));
                }
                let r = boolean_operand(op, self.eval(right, scope)?)?;
                Ok(match (l, r) {
                    (_, Some(false)) => Value::Bool(false),
                    (Some(true), Some(true)) => Value::Bool(true),
                    _ => Value::Null,
                })
            }
            InfixOp::Or => {
                let l = boolean_operand(op, self.eval(left, scope)?)?;
                if l == Some(true) {
                    return Ok(Value::Bool(true));
                }
                let r = boolean_operand(op, self.eval(right, scope)?)?;
                Ok(match (l, r) {
                    (_, Some(true)) => Value::Bool(true),
                    (Some(false), Some(false)) => Value::Bool(false),
                    _ => Value::Null,
                })
            }
            InfixOp::Implies => {
                let l = boolean_operand(op, self.eval(left, scope)?)?;
                if l == Some(false) {
                    return Ok(Value::Bool(true));
                }
                let r = boolean_operand(op, self.eval(right, scope)?)?;
                Ok(match (l, r) {
                    (_, Some(true)) => Value::Bool(true),
                    (Some(true), Some(false)) => Value::Bool(false),
                    _ => Value::Null,
                })
            }
            _ => {
                let l = self.eval(left, scope)?;
                let r = self.eval(right, scope)?;
                apply_infix(op, &l, &r)
            }
        }
    }
}

fn eval_literal(lit: &Literal) -> EvalResult<Value> {
    Ok(match lit {
        Literal::Null => Value::Null,
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Int(i) => Value::Int(*i),
        Literal::Real(r) => Value::Real(*r),
        Literal::String(s) => Value::String(s.clone()),
        Literal::UnlimitedNatural(None) => Value::Unlimited,
        Literal::UnlimitedNatural(Some(n)) => Value::Int(i64::try_from(*n).map_err(|_| {
            EvalError::type_mismatch(format!("unlimited natural {} out of range", n))
        })?),
        Literal::Enum(qualified) => match qualified.rsplit_once("::") {
            Some((kind, literal)) if !kind.is_empty() && !literal.is_empty() => {
                Value::String(literal.to_string())
            }
            _ => return Err(EvalError::malformed_enum_literal(qualified.as_str())),
        },
    })
}

/// Coerce to a collection: null is empty, a scalar is a one-element set.
pub(crate) fn to_collection(value: Value) -> Collection {
    match value {
        Value::Collection(collection) => collection,
        Value::Null => Collection::set(Vec::new()),
        other => Collection::set(vec![other]),
    }
}

/// Exact type test; views test their real class.
pub(crate) fn is_type_of(value: &Value, type_name: &str) -> bool {
    value.type_name() == type_name
}

fn boolean_operand(op: InfixOp, value: Value) -> EvalResult<Option<bool>> {
    match value {
        Value::Bool(b) => Ok(Some(b)),
        Value::Null => Ok(None),
        other => Err(EvalError::type_mismatch(format!(
            "'{}' expects Boolean operands, got {}",
            op,
            other.type_name()
        ))),
    }
}
