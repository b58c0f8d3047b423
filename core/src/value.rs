//! Value types shared by both evaluators.
//!
//! Values are what expressions produce and what the model stores in
//! properties. Besides scalars there are object references, type-cast views
//! and the four OCL collection kinds (GQL lists are sequences).

use crate::{ObjectId, ObjectRef, ObjectView};
use std::cmp::Ordering;
use std::fmt;

/// The four collection kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Set,
    OrderedSet,
    Sequence,
    Bag,
}

impl CollectionKind {
    /// Returns true if element order is significant.
    pub fn is_ordered(self) -> bool {
        matches!(self, CollectionKind::OrderedSet | CollectionKind::Sequence)
    }

    /// Returns true if duplicates are collapsed.
    pub fn is_unique(self) -> bool {
        matches!(self, CollectionKind::Set | CollectionKind::OrderedSet)
    }

    /// The kind produced by `collect` over a collection of this kind.
    pub fn collect_kind(self) -> CollectionKind {
        if self.is_ordered() {
            CollectionKind::Sequence
        } else {
            CollectionKind::Bag
        }
    }

    /// The OCL spelling of the kind.
    pub fn name(self) -> &'static str {
        match self {
            CollectionKind::Set => "Set",
            CollectionKind::OrderedSet => "OrderedSet",
            CollectionKind::Sequence => "Sequence",
            CollectionKind::Bag => "Bag",
        }
    }
}

/// A typed collection of values.
///
/// Construction through [`Collection::new`] enforces uniqueness for Set and
/// OrderedSet, keeping the first occurrence of each element.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    pub kind: CollectionKind,
    pub items: Vec<Value>,
}

impl Collection {
    /// Create a collection, deduplicating if the kind requires it.
    pub fn new(kind: CollectionKind, items: Vec<Value>) -> Self {
        let mut collection = Self {
            kind,
            items: Vec::with_capacity(items.len()),
        };
        for item in items {
            collection.push(item);
        }
        collection
    }

    pub fn set(items: Vec<Value>) -> Self {
        Self::new(CollectionKind::Set, items)
    }

    pub fn ordered_set(items: Vec<Value>) -> Self {
        Self::new(CollectionKind::OrderedSet, items)
    }

    pub fn sequence(items: Vec<Value>) -> Self {
        Self {
            kind: CollectionKind::Sequence,
            items,
        }
    }

    pub fn bag(items: Vec<Value>) -> Self {
        Self {
            kind: CollectionKind::Bag,
            items,
        }
    }

    /// Append an element, skipping it if the kind is unique and it is already present.
    pub fn push(&mut self, value: Value) {
        if self.kind.is_unique() && self.contains(&value) {
            return;
        }
        self.items.push(value);
    }

    /// Membership under language equality.
    pub fn contains(&self, value: &Value) -> bool {
        self.items.iter().any(|item| item.equals(value))
    }

    /// Number of occurrences under language equality.
    pub fn count(&self, value: &Value) -> usize {
        self.items.iter().filter(|item| item.equals(value)).count()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }

    /// Re-type the collection, deduplicating when the target kind is unique.
    pub fn convert(self, kind: CollectionKind) -> Self {
        Self::new(kind, self.items)
    }

    /// Deep equality: ordered kinds compare positionally, unordered kinds as multisets.
    fn deep_equals(&self, other: &Collection) -> bool {
        if self.items.len() != other.items.len() {
            return false;
        }
        if self.kind.is_ordered() && other.kind.is_ordered() {
            return self
                .items
                .iter()
                .zip(other.items.iter())
                .all(|(a, b)| a.equals(b));
        }
        let mut matched = vec![false; other.items.len()];
        'outer: for item in &self.items {
            for (i, candidate) in other.items.iter().enumerate() {
                if !matched[i] && item.equals(candidate) {
                    matched[i] = true;
                    continue 'outer;
                }
            }
            return false;
        }
        true
    }
}

/// A dynamically typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null / undefined.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point.
    Real(f64),
    /// UTF-8 string.
    String(String),
    /// The unlimited natural `*`.
    Unlimited,
    /// Reference to a model element.
    Object(ObjectRef),
    /// Model element seen through a declared type.
    View(ObjectView),
    /// Collection of values.
    Collection(Collection),
}

impl Value {
    /// Shorthand for a sequence (GQL list).
    pub fn list(items: Vec<Value>) -> Self {
        Value::Collection(Collection::sequence(items))
    }

    /// Shorthand for an object reference.
    pub fn object(id: impl Into<ObjectId>, class: impl Into<String>) -> Self {
        Value::Object(ObjectRef::new(id, class))
    }

    /// Returns true if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true if this is a collection.
    pub fn is_collection(&self) -> bool {
        matches!(self, Value::Collection(_))
    }

    /// Get as boolean if this is a Bool value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as integer if this is an Int value.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as a floating point number if this is numeric (Int widens).
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Real(r) => Some(*r),
            _ => None,
        }
    }

    /// Get as string reference if this is a String value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The underlying object of a reference or a view.
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            Value::View(view) => Some(&view.object),
            _ => None,
        }
    }

    /// Get as collection if this is a Collection value.
    pub fn as_collection(&self) -> Option<&Collection> {
        match self {
            Value::Collection(c) => Some(c),
            _ => None,
        }
    }

    /// Returns the type name of this value.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => "OclVoid",
            Value::Bool(_) => "Boolean",
            Value::Int(_) => "Integer",
            Value::Real(_) => "Real",
            Value::String(_) => "String",
            Value::Unlimited => "UnlimitedNatural",
            Value::Object(obj) => &obj.class,
            Value::View(view) => &view.object.class,
            Value::Collection(c) => c.kind.name(),
        }
    }

    /// Coerce to a list of elements: null is empty, a collection yields its
    /// items, anything else is a single element.
    pub fn into_items(self) -> Vec<Value> {
        match self {
            Value::Null => Vec::new(),
            Value::Collection(c) => c.items,
            other => vec![other],
        }
    }

    /// Language-level equality.
    ///
    /// Numbers compare across Int/Real, objects and views compare by id,
    /// collections compare deeply, null equals only null.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Null, _) | (_, Value::Null) => false,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Int(_) | Value::Real(_), Value::Int(_) | Value::Real(_)) => {
                self.as_real() == other.as_real()
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Unlimited, Value::Unlimited) => true,
            (Value::Collection(a), Value::Collection(b)) => a.deep_equals(b),
            _ => match (self.as_object(), other.as_object()) {
                (Some(a), Some(b)) => a.same_as(b),
                _ => false,
            },
        }
    }

    /// Ordering between mutually comparable values, `None` otherwise.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Int(_) | Value::Real(_), Value::Int(_) | Value::Real(_)) => {
                self.as_real()?.partial_cmp(&other.as_real()?)
            }
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Unlimited, Value::Unlimited) => Some(Ordering::Equal),
            (Value::Unlimited, Value::Int(_)) => Some(Ordering::Greater),
            (Value::Int(_), Value::Unlimited) => Some(Ordering::Less),
            _ => None,
        }
    }

    /// Sort key comparison: null first, incomparable values are equal.
    pub fn cmp_sortable(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Less,
            (_, Value::Null) => Ordering::Greater,
            _ => self.compare(other).unwrap_or(Ordering::Equal),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::String(s) => write!(f, "{}", s),
            Value::Unlimited => write!(f, "*"),
            Value::Object(obj) => write!(f, "{}", obj),
            Value::View(view) => write!(f, "{}", view),
            Value::Collection(c) => {
                write!(f, "{}{{", c.kind.name())?;
                for (i, item) in c.items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "}}")
            }
        }
    }
}

// Convenient From implementations
impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Real(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}

impl From<Collection> for Value {
    fn from(c: Collection) -> Self {
        Value::Collection(c)
    }
}

/// Type alias for property storage.
pub type Properties = std::collections::HashMap<String, Value>;

/// Helper macro to create property maps.
#[macro_export]
macro_rules! props {
    () => {
        std::collections::HashMap::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        {
            let mut map = std::collections::HashMap::new();
            $(
                map.insert($key.to_string(), $crate::Value::from($value));
            )+
            map
        }
    };
}
