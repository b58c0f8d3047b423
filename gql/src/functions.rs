//! Built-in query functions.
//!
//! Function names are case-insensitive. Aggregates work per row: over a list
//! argument they aggregate its non-null items, over a scalar they see a
//! one-element group.

use crate::{QueryError, QueryResult};
use mrepo_core::{AccessPort, Value};
use std::cmp::Ordering;

/// Call a built-in function on already evaluated arguments.
pub(crate) fn call_function(
    port: &dyn AccessPort,
    name: &str,
    args: Vec<Value>,
) -> QueryResult<Value> {
    let name_upper = name.to_uppercase();
    let f = name_upper.as_str();

    match f {
        // Aggregates
        "COUNT" => Ok(Value::Int(group(unary(f, args)?).len() as i64)),
        "SUM" => sum(f, group(unary(f, args)?)),
        "AVG" => {
            let items = group(unary(f, args)?);
            if items.is_empty() {
                return Ok(Value::Null);
            }
            let count = items.len() as f64;
            let total = sum(f, items)?;
            Ok(Value::Real(numeric(f, &total)? / count))
        }
        "MIN" => extremum(f, group(unary(f, args)?), Ordering::Less),
        "MAX" => extremum(f, group(unary(f, args)?), Ordering::Greater),
        "COLLECT" => Ok(Value::list(group(unary(f, args)?))),

        // Strings
        "UPPER" => map_str(f, args, |s| Value::String(s.to_uppercase())),
        "LOWER" => map_str(f, args, |s| Value::String(s.to_lowercase())),
        "TRIM" => map_str(f, args, |s| Value::from(s.trim())),
        "LTRIM" => map_str(f, args, |s| Value::from(s.trim_start())),
        "RTRIM" => map_str(f, args, |s| Value::from(s.trim_end())),
        "LENGTH" => match unary(f, args)? {
            Value::Null => Ok(Value::Null),
            Value::String(s) => Ok(Value::Int(s.chars().count() as i64)),
            Value::Collection(c) => Ok(Value::Int(c.len() as i64)),
            other => Err(expected(f, "a string or list", &other)),
        },
        "REVERSE" => match unary(f, args)? {
            Value::Null => Ok(Value::Null),
            Value::String(s) => Ok(Value::String(s.chars().rev().collect())),
            Value::Collection(c) => Ok(Value::list(c.iter().rev().cloned().collect())),
            other => Err(expected(f, "a string or list", &other)),
        },
        "SUBSTRING" => {
            arity(f, &args, 2, 3)?;
            if args.iter().any(Value::is_null) {
                return Ok(Value::Null);
            }
            let s = string(f, &args[0])?;
            let start = index(f, &args[1])?;
            let chars: Vec<char> = s.chars().collect();
            let from = start.min(chars.len());
            let to = match args.get(2) {
                Some(len) => from.saturating_add(index(f, len)?).min(chars.len()),
                None => chars.len(),
            };
            Ok(Value::String(chars[from..to].iter().collect()))
        }
        "LEFT" | "RIGHT" => {
            let (s, n) = binary(f, args)?;
            if s.is_null() || n.is_null() {
                return Ok(Value::Null);
            }
            let chars: Vec<char> = string(f, &s)?.chars().collect();
            let n = index(f, &n)?.min(chars.len());
            let slice = if f == "LEFT" {
                &chars[..n]
            } else {
                &chars[chars.len() - n..]
            };
            Ok(Value::String(slice.iter().collect()))
        }
        "REPLACE" => {
            arity(f, &args, 3, 3)?;
            if args.iter().any(Value::is_null) {
                return Ok(Value::Null);
            }
            let s = string(f, &args[0])?;
            let from = string(f, &args[1])?;
            let to = string(f, &args[2])?;
            Ok(Value::String(s.replace(from, to)))
        }
        "SPLIT" => {
            let (s, delimiter) = binary(f, args)?;
            if s.is_null() || delimiter.is_null() {
                return Ok(Value::Null);
            }
            let parts = string(f, &s)?
                .split(string(f, &delimiter)?)
                .map(Value::from)
                .collect();
            Ok(Value::list(parts))
        }
        "CONCAT" => {
            let mut result = String::new();
            for arg in &args {
                match arg {
                    Value::Null => {}
                    Value::Collection(_) => return Err(expected(f, "scalar arguments", arg)),
                    other => result.push_str(&other.to_string()),
                }
            }
            Ok(Value::String(result))
        }
        "TOSTRING" => match unary(f, args)? {
            Value::Null => Ok(Value::Null),
            other => Ok(Value::String(other.to_string())),
        },
        "STARTSWITH" | "ENDSWITH" => {
            let (s, affix) = binary(f, args)?;
            if s.is_null() || affix.is_null() {
                return Ok(Value::Null);
            }
            let (s, affix) = (string(f, &s)?, string(f, &affix)?);
            Ok(Value::Bool(if f == "STARTSWITH" {
                s.starts_with(affix)
            } else {
                s.ends_with(affix)
            }))
        }

        // Numbers
        "ABS" => match unary(f, args)? {
            Value::Null => Ok(Value::Null),
            Value::Int(i) => i
                .checked_abs()
                .map(Value::Int)
                .ok_or_else(|| QueryError::invalid_argument(f, "integer overflow")),
            Value::Real(r) => Ok(Value::Real(r.abs())),
            other => Err(expected(f, "a number", &other)),
        },
        "CEIL" => map_real(f, args, |r| Value::Real(r.ceil())),
        "FLOOR" => map_real(f, args, |r| Value::Real(r.floor())),
        "ROUND" => match unary(f, args)? {
            Value::Null => Ok(Value::Null),
            Value::Int(i) => Ok(Value::Int(i)),
            Value::Real(r) => Ok(Value::Real(r.round())),
            other => Err(expected(f, "a number", &other)),
        },
        "SIGN" => match unary(f, args)? {
            Value::Null => Ok(Value::Null),
            Value::Int(i) => Ok(Value::Int(i.signum())),
            Value::Real(r) if r == 0.0 => Ok(Value::Int(0)),
            Value::Real(r) => Ok(Value::Int(if r > 0.0 { 1 } else { -1 })),
            other => Err(expected(f, "a number", &other)),
        },
        "SQRT" => map_real(f, args, |r| Value::Real(r.sqrt())),
        "EXP" => map_real(f, args, |r| Value::Real(r.exp())),
        "LOG" => map_real(f, args, |r| Value::Real(r.ln())),
        "LOG10" => map_real(f, args, |r| Value::Real(r.log10())),
        "POWER" => {
            let (base, exponent) = binary(f, args)?;
            if base.is_null() || exponent.is_null() {
                return Ok(Value::Null);
            }
            Ok(Value::Real(numeric(f, &base)?.powf(numeric(f, &exponent)?)))
        }
        "TOINTEGER" => match unary(f, args)? {
            Value::Null => Ok(Value::Null),
            Value::Int(i) => Ok(Value::Int(i)),
            Value::Real(r) => Ok(Value::Int(r.trunc() as i64)),
            Value::String(s) => Ok(s
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .unwrap_or(Value::Null)),
            other => Err(expected(f, "a number or string", &other)),
        },
        "TOFLOAT" => match unary(f, args)? {
            Value::Null => Ok(Value::Null),
            Value::Int(i) => Ok(Value::Real(i as f64)),
            Value::Real(r) => Ok(Value::Real(r)),
            Value::String(s) => Ok(s
                .trim()
                .parse::<f64>()
                .map(Value::Real)
                .unwrap_or(Value::Null)),
            other => Err(expected(f, "a number or string", &other)),
        },

        // Lists
        "SIZE" => match unary(f, args)? {
            Value::Null => Ok(Value::Null),
            Value::Collection(c) => Ok(Value::Int(c.len() as i64)),
            Value::String(s) => Ok(Value::Int(s.chars().count() as i64)),
            other => Err(expected(f, "a list", &other)),
        },
        "HEAD" => Ok(list(f, unary(f, args)?)?
            .into_iter()
            .next()
            .unwrap_or(Value::Null)),
        "LAST" => Ok(list(f, unary(f, args)?)?.pop().unwrap_or(Value::Null)),
        "TAIL" => Ok(Value::list(
            list(f, unary(f, args)?)?.into_iter().skip(1).collect(),
        )),
        "RANGE" => range(f, args),
        "INCLUDING" => {
            let (items, item) = binary(f, args)?;
            let mut items = list(f, items)?;
            items.push(item);
            Ok(Value::list(items))
        }
        "EXCLUDING" => {
            let (items, item) = binary(f, args)?;
            let items = list(f, items)?
                .into_iter()
                .filter(|v| !v.equals(&item))
                .collect();
            Ok(Value::list(items))
        }
        "UNION" => {
            let (left, right) = binary(f, args)?;
            let mut items = list(f, left)?;
            items.extend(list(f, right)?);
            Ok(Value::list(items))
        }
        "ELEMENT_AT" => {
            let (items, position) = binary(f, args)?;
            if position.is_null() {
                return Ok(Value::Null);
            }
            let position = position
                .as_int()
                .ok_or_else(|| expected(f, "an integer index", &position))?;
            let items = list(f, items)?;
            Ok(usize::try_from(position)
                .ok()
                .and_then(|i| items.into_iter().nth(i))
                .unwrap_or(Value::Null))
        }

        // Introspection
        "LABELS" => match unary(f, args)? {
            Value::Null => Ok(Value::Null),
            other => match other.as_object() {
                Some(obj) => Ok(Value::list(vec![Value::from(obj.class.as_str())])),
                None => Err(expected(f, "an element", &other)),
            },
        },
        "TYPE" => match unary(f, args)? {
            Value::Null => Ok(Value::Null),
            other => Ok(Value::from(other.type_name())),
        },
        "ID" => match unary(f, args)? {
            Value::Null => Ok(Value::Null),
            other => match other.as_object() {
                Some(obj) => i64::try_from(obj.id.raw())
                    .map(Value::Int)
                    .map_err(|_| QueryError::invalid_argument(f, "id out of range")),
                None => Err(expected(f, "an element", &other)),
            },
        },
        "COALESCE" => Ok(args
            .into_iter()
            .find(|v| !v.is_null())
            .unwrap_or(Value::Null)),
        "IS_KIND_OF" => {
            let (value, class) = binary(f, args)?;
            if value.is_null() {
                return Ok(Value::Null);
            }
            let class = string(f, &class)?;
            match value.as_object() {
                Some(obj) => Ok(Value::Bool(port.is_subclass_of(&obj.class, class))),
                None => Ok(Value::Bool(value.type_name() == class)),
            }
        }
        "NODES" => {
            let mut nodes: Vec<Value> = Vec::new();
            collect_nodes(unary(f, args)?, &mut nodes);
            Ok(Value::list(nodes))
        }

        _ => Err(QueryError::unknown_function(name)),
    }
}

fn arity(f: &str, args: &[Value], min: usize, max: usize) -> QueryResult<()> {
    if args.len() < min || args.len() > max {
        let expected = if min == max {
            min.to_string()
        } else {
            format!("{} to {}", min, max)
        };
        return Err(QueryError::invalid_argument(
            f,
            format!("expects {} argument(s), got {}", expected, args.len()),
        ));
    }
    Ok(())
}

fn unary(f: &str, args: Vec<Value>) -> QueryResult<Value> {
    arity(f, &args, 1, 1)?;
    Ok(args.into_iter().next().unwrap_or(Value::Null))
}

fn binary(f: &str, args: Vec<Value>) -> QueryResult<(Value, Value)> {
    arity(f, &args, 2, 2)?;
    let mut args = args.into_iter();
    match (args.next(), args.next()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(QueryError::invalid_argument(f, "expects 2 argument(s)")),
    }
}

fn expected(f: &str, what: &str, found: &Value) -> QueryError {
    QueryError::invalid_argument(f, format!("expects {}, got {}", what, found.type_name()))
}

fn string<'v>(f: &str, value: &'v Value) -> QueryResult<&'v str> {
    value.as_str().ok_or_else(|| expected(f, "a string", value))
}

fn numeric(f: &str, value: &Value) -> QueryResult<f64> {
    value.as_real().ok_or_else(|| expected(f, "a number", value))
}

fn index(f: &str, value: &Value) -> QueryResult<usize> {
    value
        .as_int()
        .and_then(|i| usize::try_from(i).ok())
        .ok_or_else(|| expected(f, "a non-negative integer", value))
}

fn list(f: &str, value: Value) -> QueryResult<Vec<Value>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Collection(c) => Ok(c.iter().cloned().collect()),
        other => Err(expected(f, "a list", &other)),
    }
}

fn map_str(f: &str, args: Vec<Value>, op: impl Fn(&str) -> Value) -> QueryResult<Value> {
    match unary(f, args)? {
        Value::Null => Ok(Value::Null),
        Value::String(s) => Ok(op(&s)),
        other => Err(expected(f, "a string", &other)),
    }
}

fn map_real(f: &str, args: Vec<Value>, op: impl Fn(f64) -> Value) -> QueryResult<Value> {
    match unary(f, args)? {
        Value::Null => Ok(Value::Null),
        other => Ok(op(numeric(f, &other)?)),
    }
}

/// The group an aggregate sees for one row.
fn group(value: Value) -> Vec<Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Collection(c) => c.iter().filter(|v| !v.is_null()).cloned().collect(),
        other => vec![other],
    }
}

fn sum(f: &str, items: Vec<Value>) -> QueryResult<Value> {
    let mut int_total: i64 = 0;
    let mut real_total: Option<f64> = None;
    for item in &items {
        real_total = match (item, real_total) {
            (Value::Int(i), None) => {
                int_total = int_total
                    .checked_add(*i)
                    .ok_or_else(|| QueryError::invalid_argument(f, "integer overflow"))?;
                None
            }
            (other, Some(total)) => Some(total + numeric(f, other)?),
            // First non-integer switches the running total to Real.
            (other, None) => Some(int_total as f64 + numeric(f, other)?),
        };
    }
    Ok(match real_total {
        Some(total) => Value::Real(total),
        None => Value::Int(int_total),
    })
}

fn extremum(f: &str, items: Vec<Value>, wanted: Ordering) -> QueryResult<Value> {
    let mut best: Option<Value> = None;
    for item in items {
        best = Some(match best {
            None => item,
            Some(current) => {
                let ordering = item.compare(&current).ok_or_else(|| {
                    QueryError::invalid_argument(
                        f,
                        format!(
                            "cannot compare {} with {}",
                            item.type_name(),
                            current.type_name()
                        ),
                    )
                })?;
                if ordering == wanted {
                    item
                } else {
                    current
                }
            }
        });
    }
    Ok(best.unwrap_or(Value::Null))
}

/// Longest list `RANGE` will build.
const MAX_RANGE_LEN: usize = 1_000_000;

fn range(f: &str, args: Vec<Value>) -> QueryResult<Value> {
    arity(f, &args, 2, 3)?;
    let bound = |value: &Value| {
        value
            .as_int()
            .ok_or_else(|| expected(f, "integer bounds", value))
    };
    let start = bound(&args[0])?;
    let end = bound(&args[1])?;
    let step = match args.get(2) {
        Some(step) => bound(step)?,
        None => 1,
    };
    if step == 0 {
        return Err(QueryError::invalid_argument(f, "step must not be zero"));
    }
    let span = (i128::from(end) - i128::from(start)) / i128::from(step);
    if span >= MAX_RANGE_LEN as i128 {
        return Err(QueryError::invalid_argument(
            f,
            format!("range exceeds {} elements", MAX_RANGE_LEN),
        ));
    }

    let mut items = Vec::with_capacity(usize::try_from(span + 1).unwrap_or(0));
    let mut current = start;
    while (step > 0 && current <= end) || (step < 0 && current >= end) {
        items.push(Value::Int(current));
        match current.checked_add(step) {
            Some(next) => current = next,
            None => break,
        }
    }
    Ok(Value::list(items))
}

/// Flatten a path value into its elements, dropping consecutive repeats
/// where an edge list and its end nodes overlap.
fn collect_nodes(value: Value, nodes: &mut Vec<Value>) {
    match value {
        Value::Collection(c) => {
            for item in c.iter() {
                collect_nodes(item.clone(), nodes);
            }
        }
        Value::Null => {}
        other => {
            if !nodes.last().is_some_and(|last| last.equals(&other)) {
                nodes.push(other);
            }
        }
    }
}
