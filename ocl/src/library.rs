//! Standard library operations on collections, strings and numbers.
//!
//! Every function here works on already-evaluated arguments. Indices are
//! 1-based and out-of-range indices are errors.

use crate::operators::apply_infix;
use crate::{EvalError, EvalResult, InfixOp};
use mrepo_core::{Collection, CollectionKind, Value};
use std::cmp::Ordering;

/// Arrow operation on a (coerced) collection.
pub(crate) fn collection_op(name: &str, source: Collection, args: Vec<Value>) -> EvalResult<Value> {
    let mut args = args.into_iter();
    let arity = args.len();
    let kind = source.kind;

    let result = match name {
        "size" => {
            expect_arity(name, arity, 0)?;
            Value::Int(source.len() as i64)
        }
        "isEmpty" => {
            expect_arity(name, arity, 0)?;
            Value::Bool(source.is_empty())
        }
        "notEmpty" => {
            expect_arity(name, arity, 0)?;
            Value::Bool(!source.is_empty())
        }
        "includes" | "excludes" => {
            expect_arity(name, arity, 1)?;
            let found = source.contains(&next(&mut args));
            Value::Bool(if name == "includes" { found } else { !found })
        }
        "includesAll" => {
            expect_arity(name, arity, 1)?;
            let other = next(&mut args).into_items();
            Value::Bool(other.iter().all(|v| source.contains(v)))
        }
        "excludesAll" => {
            expect_arity(name, arity, 1)?;
            let other = next(&mut args).into_items();
            Value::Bool(!other.iter().any(|v| source.contains(v)))
        }
        "count" => {
            expect_arity(name, arity, 1)?;
            Value::Int(source.count(&next(&mut args)) as i64)
        }
        "sum" => {
            expect_arity(name, arity, 0)?;
            let mut total = Value::Int(0);
            for item in &source.items {
                total = apply_infix(InfixOp::Add, &total, item)?;
            }
            total
        }
        "max" | "min" => {
            expect_arity(name, arity, 0)?;
            extremum(&source.items, name == "max")?
        }
        "first" => {
            expect_arity(name, arity, 0)?;
            source.items.first().cloned().unwrap_or(Value::Null)
        }
        "last" => {
            expect_arity(name, arity, 0)?;
            source.items.last().cloned().unwrap_or(Value::Null)
        }
        "at" => {
            expect_arity(name, arity, 1)?;
            let index = int_arg(name, &next(&mut args))?;
            let position = checked_index(index, source.len())?;
            source.items[position].clone()
        }
        "indexOf" => {
            expect_arity(name, arity, 1)?;
            let wanted = next(&mut args);
            source
                .items
                .iter()
                .position(|v| v.equals(&wanted))
                .map(|p| Value::Int(p as i64 + 1))
                .unwrap_or(Value::Null)
        }
        "asSet" => convert(name, arity, source, CollectionKind::Set)?,
        "asOrderedSet" => convert(name, arity, source, CollectionKind::OrderedSet)?,
        "asSequence" => convert(name, arity, source, CollectionKind::Sequence)?,
        "asBag" => convert(name, arity, source, CollectionKind::Bag)?,
        "including" => {
            expect_arity(name, arity, 1)?;
            let mut result = source;
            result.push(next(&mut args));
            Value::Collection(result)
        }
        "excluding" => {
            expect_arity(name, arity, 1)?;
            let removed = next(&mut args);
            let mut result = source;
            result.items.retain(|v| !v.equals(&removed));
            Value::Collection(result)
        }
        "union" => {
            expect_arity(name, arity, 1)?;
            let mut items = source.items;
            items.extend(next(&mut args).into_items());
            Value::Collection(Collection::new(kind, items))
        }
        "intersection" => {
            expect_arity(name, arity, 1)?;
            let other = Collection::bag(next(&mut args).into_items());
            let items = source
                .items
                .into_iter()
                .filter(|v| other.contains(v))
                .collect();
            Value::Collection(Collection::new(kind, items))
        }
        "symmetricDifference" => {
            expect_arity(name, arity, 1)?;
            let other = Collection::set(next(&mut args).into_items());
            let mut items: Vec<Value> = source
                .items
                .iter()
                .filter(|v| !other.contains(v))
                .cloned()
                .collect();
            items.extend(other.items.into_iter().filter(|v| !source.contains(v)));
            Value::Collection(Collection::set(items))
        }
        "flatten" => {
            expect_arity(name, arity, 0)?;
            let mut items = Vec::new();
            flatten_into(source.items, &mut items);
            Value::Collection(Collection::new(kind, items))
        }
        "append" => {
            expect_arity(name, arity, 1)?;
            let mut items = source.items;
            items.push(next(&mut args));
            Value::Collection(Collection::new(kind, items))
        }
        "prepend" => {
            expect_arity(name, arity, 1)?;
            let mut items = vec![next(&mut args)];
            items.extend(source.items);
            Value::Collection(Collection::new(kind, items))
        }
        "insertAt" => {
            expect_arity(name, arity, 2)?;
            let index = int_arg(name, &next(&mut args))?;
            let value = next(&mut args);
            let mut items = source.items;
            if index < 1 || index as usize > items.len() + 1 {
                return Err(EvalError::index_out_of_range(index, items.len()));
            }
            items.insert(index as usize - 1, value);
            Value::Collection(Collection::new(kind, items))
        }
        "subSequence" | "subOrderedSet" => {
            expect_arity(name, arity, 2)?;
            let lower = int_arg(name, &next(&mut args))?;
            let upper = int_arg(name, &next(&mut args))?;
            let (from, to) = checked_range(lower, upper, source.len())?;
            let items = source.items[from..=to].to_vec();
            Value::Collection(Collection::new(kind, items))
        }
        "reverse" => {
            expect_arity(name, arity, 0)?;
            let mut items = source.items;
            items.reverse();
            Value::Collection(Collection::new(kind, items))
        }
        _ => return Err(EvalError::unknown_operation(name, kind.name())),
    };
    Ok(result)
}

/// Dot operation on a string receiver, `None` if `name` is not a string operation.
pub(crate) fn string_op(name: &str, s: &str, args: &[Value]) -> Option<EvalResult<Value>> {
    let arity = args.len();
    let result = (|| -> EvalResult<Value> {
        Ok(match name {
            "size" => {
                expect_arity(name, arity, 0)?;
                Value::Int(s.chars().count() as i64)
            }
            "concat" => {
                expect_arity(name, arity, 1)?;
                Value::String(format!("{}{}", s, str_arg(name, &args[0])?))
            }
            "substring" => {
                expect_arity(name, arity, 2)?;
                let chars: Vec<char> = s.chars().collect();
                let lower = int_arg(name, &args[0])?;
                let upper = int_arg(name, &args[1])?;
                let (from, to) = checked_range(lower, upper, chars.len())?;
                Value::String(chars[from..=to].iter().collect())
            }
            "toUpper" | "toUpperCase" => {
                expect_arity(name, arity, 0)?;
                Value::String(s.to_uppercase())
            }
            "toLower" | "toLowerCase" => {
                expect_arity(name, arity, 0)?;
                Value::String(s.to_lowercase())
            }
            "indexOf" => {
                expect_arity(name, arity, 1)?;
                let needle = str_arg(name, &args[0])?;
                let index = s
                    .find(needle)
                    .map(|byte| s[..byte].chars().count() as i64 + 1)
                    .unwrap_or(0);
                Value::Int(index)
            }
            "startsWith" => {
                expect_arity(name, arity, 1)?;
                Value::Bool(s.starts_with(str_arg(name, &args[0])?))
            }
            "endsWith" => {
                expect_arity(name, arity, 1)?;
                Value::Bool(s.ends_with(str_arg(name, &args[0])?))
            }
            "contains" => {
                expect_arity(name, arity, 1)?;
                Value::Bool(s.contains(str_arg(name, &args[0])?))
            }
            "equalsIgnoreCase" => {
                expect_arity(name, arity, 1)?;
                Value::Bool(s.to_lowercase() == str_arg(name, &args[0])?.to_lowercase())
            }
            "trim" => {
                expect_arity(name, arity, 0)?;
                Value::String(s.trim().to_string())
            }
            "toInteger" => {
                expect_arity(name, arity, 0)?;
                s.trim().parse::<i64>().map(Value::Int).unwrap_or(Value::Null)
            }
            "toReal" => {
                expect_arity(name, arity, 0)?;
                s.trim().parse::<f64>().map(Value::Real).unwrap_or(Value::Null)
            }
            "toBoolean" => {
                expect_arity(name, arity, 0)?;
                match s {
                    "true" => Value::Bool(true),
                    "false" => Value::Bool(false),
                    _ => Value::Null,
                }
            }
            "at" => {
                expect_arity(name, arity, 1)?;
                let index = int_arg(name, &args[0])?;
                let size = s.chars().count();
                let position = checked_index(index, size)?;
                s.chars()
                    .nth(position)
                    .map(|c| Value::String(c.to_string()))
                    .unwrap_or(Value::Null)
            }
            "characters" => {
                expect_arity(name, arity, 0)?;
                Value::list(s.chars().map(|c| Value::String(c.to_string())).collect())
            }
            _ => return Err(EvalError::unknown_operation(name, "String")),
        })
    })();
    match result {
        Err(EvalError::UnknownOperation { .. }) => None,
        other => Some(other),
    }
}

/// Dot operation on an Integer or Real receiver, `None` if `name` is not numeric.
pub(crate) fn numeric_op(name: &str, n: &Value, args: &[Value]) -> Option<EvalResult<Value>> {
    let arity = args.len();
    let result = match name {
        "abs" => expect_arity(name, arity, 0).map(|_| match n {
            Value::Int(i) => Value::Int(i.saturating_abs()),
            other => Value::Real(other.as_real().unwrap_or_default().abs()),
        }),
        "floor" => expect_arity(name, arity, 0).map(|_| match n {
            Value::Int(i) => Value::Int(*i),
            other => Value::Int(other.as_real().unwrap_or_default().floor() as i64),
        }),
        "round" => expect_arity(name, arity, 0).map(|_| match n {
            Value::Int(i) => Value::Int(*i),
            // Halves round towards positive infinity.
            other => Value::Int((other.as_real().unwrap_or_default() + 0.5).floor() as i64),
        }),
        "max" | "min" => expect_arity(name, arity, 1).and_then(|_| {
            let other = &args[0];
            let ordering = n
                .compare(other)
                .ok_or_else(|| EvalError::not_comparable(n.to_string(), other.to_string()))?;
            let pick_self = (ordering != Ordering::Less) == (name == "max");
            let picked = if pick_self { n } else { other };
            // Mixed operands promote to Real.
            Ok(match (n, other) {
                (Value::Int(_), Value::Int(_)) => picked.clone(),
                _ => Value::Real(picked.as_real().unwrap_or_default()),
            })
        }),
        "div" => expect_arity(name, arity, 1).and_then(|_| apply_infix(InfixOp::IntDiv, n, &args[0])),
        "mod" => expect_arity(name, arity, 1).and_then(|_| apply_infix(InfixOp::Mod, n, &args[0])),
        _ => return None,
    };
    Some(result)
}

pub(crate) fn expect_arity(op: &str, found: usize, expected: usize) -> EvalResult<()> {
    match found.cmp(&expected) {
        Ordering::Equal => Ok(()),
        Ordering::Greater => Err(EvalError::too_many_arguments(op, expected, found)),
        Ordering::Less => Err(EvalError::missing_argument(op, format!("#{}", found + 1))),
    }
}

fn next(args: &mut impl Iterator<Item = Value>) -> Value {
    args.next().unwrap_or(Value::Null)
}

fn convert(name: &str, arity: usize, source: Collection, kind: CollectionKind) -> EvalResult<Value> {
    expect_arity(name, arity, 0)?;
    Ok(Value::Collection(source.convert(kind)))
}

fn int_arg(op: &str, value: &Value) -> EvalResult<i64> {
    value.as_int().ok_or_else(|| {
        EvalError::type_mismatch(format!(
            "'{}' expects an Integer argument, got {}",
            op,
            value.type_name()
        ))
    })
}

fn str_arg<'v>(op: &str, value: &'v Value) -> EvalResult<&'v str> {
    value.as_str().ok_or_else(|| {
        EvalError::type_mismatch(format!(
            "'{}' expects a String argument, got {}",
            op,
            value.type_name()
        ))
    })
}

/// Zero-based position of a 1-based index.
fn checked_index(index: i64, size: usize) -> EvalResult<usize> {
    if index < 1 || index as usize > size {
        return Err(EvalError::index_out_of_range(index, size));
    }
    Ok(index as usize - 1)
}

/// Zero-based inclusive bounds of a 1-based inclusive range.
fn checked_range(lower: i64, upper: i64, size: usize) -> EvalResult<(usize, usize)> {
    let from = checked_index(lower, size)?;
    let to = checked_index(upper, size)?;
    if from > to {
        return Err(EvalError::index_out_of_range(lower, size));
    }
    Ok((from, to))
}

fn extremum(items: &[Value], max: bool) -> EvalResult<Value> {
    let mut best: Option<&Value> = None;
    for item in items {
        best = Some(match best {
            None => item,
            Some(current) => {
                let ordering = item.compare(current).ok_or_else(|| {
                    EvalError::not_comparable(item.to_string(), current.to_string())
                })?;
                let better = if max {
                    ordering == Ordering::Greater
                } else {
                    ordering == Ordering::Less
                };
                if better {
                    item
                } else {
                    current
                }
            }
        });
    }
    Ok(best.cloned().unwrap_or(Value::Null))
}

fn flatten_into(items: Vec<Value>, out: &mut Vec<Value>) {
    for item in items {
        match item {
            Value::Collection(inner) => flatten_into(inner.items, out),
            other => out.push(other),
        }
    }
}
