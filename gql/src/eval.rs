//! WHERE and RETURN expression evaluation.

use crate::functions::call_function;
use crate::matcher::Matcher;
use crate::{
    BinaryOp, Binding, ExecutorConfig, Expr, QueryError, QueryResult, UnaryOp,
};
use mrepo_core::{AccessPort, Value};
use std::cmp::Ordering;

/// Expression evaluator over one binding row.
pub(crate) struct Evaluator<'p> {
    port: &'p dyn AccessPort,
    config: ExecutorConfig,
}

impl<'p> Evaluator<'p> {
    pub(crate) fn new(port: &'p dyn AccessPort, config: ExecutorConfig) -> Self {
        Self { port, config }
    }

    /// Evaluate an expression with the given bindings.
    pub(crate) fn eval(&self, expr: &Expr, binding: &Binding) -> QueryResult<Value> {
        match expr {
            Expr::Variable(name) => binding
                .get(name)
                .cloned()
                .ok_or_else(|| QueryError::unbound_variable(name)),

            Expr::Property(source, name) => {
                let source = self.eval(source, binding)?;
                self.eval_property(&source, name)
            }

            Expr::Literal(value) => Ok(value.clone()),

            Expr::Binary(BinaryOp::And, left, right) => self.eval_and(left, right, binding),
            Expr::Binary(BinaryOp::Or, left, right) => self.eval_or(left, right, binding),
            Expr::Binary(op, left, right) => {
                let l = self.eval(left, binding)?;
                let r = self.eval(right, binding)?;
                apply_binary(*op, &l, &r)
            }

            Expr::Unary(op, operand) => {
                let value = self.eval(operand, binding)?;
                apply_unary(*op, value)
            }

            Expr::FunctionCall(name, args) => {
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg, binding))
                    .collect::<QueryResult<Vec<_>>>()?;
                call_function(self.port, name, args)
            }

            Expr::List(items) => {
                let items = items
                    .iter()
                    .map(|item| self.eval(item, binding))
                    .collect::<QueryResult<Vec<_>>>()?;
                Ok(Value::list(items))
            }

            Expr::In(item, list) => {
                let item = self.eval(item, binding)?;
                let list = self.eval(list, binding)?;
                eval_in(&item, &list)
            }

            Expr::IsNull(expr, negated) => {
                let is_null = self.eval(expr, binding)?.is_null();
                Ok(Value::Bool(is_null != *negated))
            }

            Expr::Case {
                operand,
                whens,
                otherwise,
            } => self.eval_case(operand.as_deref(), whens, otherwise.as_deref(), binding),

            Expr::LabelCheck(var, labels) => {
                let value = binding
                    .get(var)
                    .ok_or_else(|| QueryError::unbound_variable(var))?;
                match value {
                    Value::Null => Ok(Value::Null),
                    other => match other.as_object() {
                        Some(obj) => Ok(Value::Bool(
                            labels
                                .iter()
                                .any(|label| self.port.is_subclass_of(&obj.class, label)),
                        )),
                        None => Err(QueryError::type_error(format!(
                            "label check on non-element value of type {}",
                            other.type_name()
                        ))),
                    },
                }
            }

            Expr::Exists(pattern) => {
                let matcher = Matcher::new(self.port, self.config);
                let rows = matcher.match_path(pattern, binding.clone())?;
                Ok(Value::Bool(!rows.is_empty()))
            }

            Expr::CountStar => Ok(Value::Int(1)),
        }
    }

    fn eval_property(&self, source: &Value, name: &str) -> QueryResult<Value> {
        match source {
            Value::Null => Ok(Value::Null),
            Value::Object(obj) => Ok(self.port.get_property(obj.id, name)),
            Value::View(view) => Ok(self
                .port
                .get_property_as(view.object.id, name, &view.view_type)),
            other => Err(QueryError::type_error(format!(
                "cannot read property '{}' of {}",
                name,
                other.type_name()
            ))),
        }
    }

    fn eval_and(&self, left: &Expr, right: &Expr, binding: &Binding) -> QueryResult<Value> {
        let l = truth(self.eval(left, binding)?, "AND")?;
        if l == Some(false) {
            return Ok(Value::Bool(false));
        }
        let r = truth(self.eval(right, binding)?, "AND")?;
        Ok(match (l, r) {
            (_, Some(false)) => Value::Bool(false),
            (Some(true), Some(true)) => Value::Bool(true),
            _ => Value::Null,
        })
    }

    fn eval_or(&self, left: &Expr, right: &Expr, binding: &Binding) -> QueryResult<Value> {
        let l = truth(self.eval(left, binding)?, "OR")?;
        if l == Some(true) {
            return Ok(Value::Bool(true));
        }
        let r = truth(self.eval(right, binding)?, "OR")?;
        Ok(match (l, r) {
            (_, Some(true)) => Value::Bool(true),
            (Some(false), Some(false)) => Value::Bool(false),
            _ => Value::Null,
        })
    }

    fn eval_case(
        &self,
        operand: Option<&Expr>,
        whens: &[(Expr, Expr)],
        otherwise: Option<&Expr>,
        binding: &Binding,
    ) -> QueryResult<Value> {
        let subject = match operand {
            Some(expr) => Some(self.eval(expr, binding)?),
            None => None,
        };
        for (when, then) in whens {
            let candidate = self.eval(when, binding)?;
            let hit = match &subject {
                Some(subject) => subject.equals(&candidate),
                None => candidate.as_bool() == Some(true),
            };
            if hit {
                return self.eval(then, binding);
            }
        }
        match otherwise {
            Some(expr) => self.eval(expr, binding),
            None => Ok(Value::Null),
        }
    }
}

/// Three-valued truth of an operand: `None` is unknown.
fn truth(value: Value, op: &str) -> QueryResult<Option<bool>> {
    match value {
        Value::Bool(b) => Ok(Some(b)),
        Value::Null => Ok(None),
        other => Err(QueryError::type_error(format!(
            "{} expects boolean operands, got {}",
            op,
            other.type_name()
        ))),
    }
}

fn eval_in(item: &Value, list: &Value) -> QueryResult<Value> {
    match list {
        Value::Null => Ok(Value::Null),
        Value::Collection(c) => {
            if item.is_null() {
                return Ok(Value::Null);
            }
            Ok(Value::Bool(c.iter().any(|v| v.equals(item))))
        }
        other => Err(QueryError::type_error(format!(
            "IN expects a list, got {}",
            other.type_name()
        ))),
    }
}

fn apply_unary(op: UnaryOp, value: Value) -> QueryResult<Value> {
    match (op, value) {
        (_, Value::Null) => Ok(Value::Null),
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::Neg, Value::Int(i)) => i
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| QueryError::type_error("integer overflow")),
        (UnaryOp::Neg, Value::Real(r)) => Ok(Value::Real(-r)),
        (UnaryOp::Plus, v @ (Value::Int(_) | Value::Real(_))) => Ok(v),
        (op, other) => Err(QueryError::type_error(format!(
            "unary {:?} not applicable to {}",
            op,
            other.type_name()
        ))),
    }
}

/// Apply a strict binary operator. `AND` and `OR` are handled lazily by the evaluator.
pub(crate) fn apply_binary(op: BinaryOp, l: &Value, r: &Value) -> QueryResult<Value> {
    if l.is_null() || r.is_null() {
        return Ok(Value::Null);
    }
    match op {
        BinaryOp::Add => match (l, r) {
            (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
            (Value::Collection(_), Value::Collection(_)) => Ok(concat_lists(l, r)),
            _ => arithmetic(op, l, r),
        },
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod | BinaryOp::Pow => {
            arithmetic(op, l, r)
        }
        BinaryOp::Concat => match (l, r) {
            (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
            (Value::Collection(_), Value::Collection(_)) => Ok(concat_lists(l, r)),
            _ => Err(mismatch(op, l, r)),
        },
        BinaryOp::Eq => Ok(Value::Bool(l.equals(r))),
        BinaryOp::Ne => Ok(Value::Bool(!l.equals(r))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = l.compare(r).ok_or_else(|| mismatch(op, l, r))?;
            Ok(Value::Bool(match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::Le => ordering != Ordering::Greater,
                BinaryOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            }))
        }
        BinaryOp::And | BinaryOp::Or | BinaryOp::Xor => match (l, r) {
            (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(match op {
                BinaryOp::And => *a && *b,
                BinaryOp::Or => *a || *b,
                _ => a != b,
            })),
            _ => Err(mismatch(op, l, r)),
        },
        BinaryOp::Like => match (l, r) {
            (Value::String(s), Value::String(pattern)) => Ok(Value::Bool(like(s, pattern)?)),
            _ => Err(mismatch(op, l, r)),
        },
        BinaryOp::StartsWith | BinaryOp::EndsWith => match (l, r) {
            (Value::String(s), Value::String(affix)) => Ok(Value::Bool(
                if op == BinaryOp::StartsWith {
                    s.starts_with(affix.as_str())
                } else {
                    s.ends_with(affix.as_str())
                },
            )),
            _ => Err(mismatch(op, l, r)),
        },
        BinaryOp::Contains => match (l, r) {
            (Value::String(s), Value::String(needle)) => {
                Ok(Value::Bool(s.contains(needle.as_str())))
            }
            (Value::Collection(c), item) => Ok(Value::Bool(c.iter().any(|v| v.equals(item)))),
            _ => Err(mismatch(op, l, r)),
        },
    }
}

fn arithmetic(op: BinaryOp, l: &Value, r: &Value) -> QueryResult<Value> {
    match (l, r) {
        (Value::Int(a), Value::Int(b)) => {
            let (a, b) = (*a, *b);
            let result = match op {
                BinaryOp::Add => a.checked_add(b),
                BinaryOp::Sub => a.checked_sub(b),
                BinaryOp::Mul => a.checked_mul(b),
                BinaryOp::Div => {
                    if b == 0 {
                        return Err(QueryError::DivisionByZero);
                    }
                    a.checked_div(b)
                }
                BinaryOp::Mod => {
                    if b == 0 {
                        return Err(QueryError::DivisionByZero);
                    }
                    a.checked_rem(b)
                }
                BinaryOp::Pow => return Ok(Value::Real((a as f64).powf(b as f64))),
                _ => return Err(mismatch(op, l, r)),
            };
            result
                .map(Value::Int)
                .ok_or_else(|| QueryError::type_error(format!("integer overflow in {}", op.symbol())))
        }
        _ => {
            let (Some(a), Some(b)) = (l.as_real(), r.as_real()) else {
                return Err(mismatch(op, l, r));
            };
            match op {
                BinaryOp::Add => Ok(Value::Real(a + b)),
                BinaryOp::Sub => Ok(Value::Real(a - b)),
                BinaryOp::Mul => Ok(Value::Real(a * b)),
                BinaryOp::Div | BinaryOp::Mod if b == 0.0 => Err(QueryError::DivisionByZero),
                BinaryOp::Div => Ok(Value::Real(a / b)),
                BinaryOp::Mod => Ok(Value::Real(a % b)),
                BinaryOp::Pow => Ok(Value::Real(a.powf(b))),
                _ => Err(mismatch(op, l, r)),
            }
        }
    }
}

fn concat_lists(l: &Value, r: &Value) -> Value {
    let mut items = l.clone().into_items();
    items.extend(r.clone().into_items());
    Value::list(items)
}

/// SQL `LIKE`: `%` matches any run, `_` any single character.
fn like(s: &str, pattern: &str) -> QueryResult<bool> {
    let mut regex = String::from("(?s)^");
    for c in pattern.chars() {
        match c {
            '%' => regex.push_str(".*"),
            '_' => regex.push('.'),
            c => regex.push_str(&regex_lite::escape(&c.to_string())),
        }
    }
    regex.push('$');
    let compiled = regex_lite::Regex::new(&regex)
        .map_err(|e| QueryError::invalid_argument("LIKE", format!("invalid pattern: {}", e)))?;
    Ok(compiled.is_match(s))
}

fn mismatch(op: BinaryOp, l: &Value, r: &Value) -> QueryError {
    QueryError::type_error(format!(
        "operator {} not applicable to {} and {}",
        op.symbol(),
        l.type_name(),
        r.type_name()
    ))
}
