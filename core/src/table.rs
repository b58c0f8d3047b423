//! Query result types.

use crate::Value;
use std::collections::HashMap;

/// A row of values, one per declared column in column order.
pub type Row = Vec<Value>;

/// Column-named, row-oriented query result.
///
/// Every row carries exactly the declared columns. Column names need not be
/// unique; values are stored by position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindingTable {
    /// Column names in projection order.
    columns: Vec<String>,
    /// Rows of results.
    rows: Vec<Row>,
}

impl BindingTable {
    /// Create an empty table with the given columns.
    pub fn with_columns(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Add a row given values in column order. Short rows are padded with null
    /// and surplus values are dropped.
    pub fn push_values(&mut self, mut values: Vec<Value>) {
        values.resize(self.columns.len(), Value::Null);
        self.rows.push(values);
    }

    /// Add a row keyed by column name. Missing columns are null and
    /// undeclared keys are dropped.
    pub fn push_named(&mut self, named: &HashMap<String, Value>) {
        let row = self
            .columns
            .iter()
            .map(|c| named.get(c).cloned().unwrap_or(Value::Null))
            .collect();
        self.rows.push(row);
    }

    /// Column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All rows.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Get the number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Value at a row index and column name. With repeated names the first
    /// such column wins.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.position(column)?;
        self.rows.get(row).and_then(|r| r.get(index))
    }

    /// All values of one column, in row order.
    pub fn column<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a Value> + 'a {
        let index = self.position(name);
        self.rows
            .iter()
            .filter_map(move |r| index.and_then(|i| r.get(i)))
    }

    /// First row's first column, or null for an empty table.
    pub fn scalar(&self) -> Value {
        self.rows
            .first()
            .and_then(|r| r.first())
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Render the rows as an array of JSON objects.
    pub fn to_json(&self) -> serde_json::Value {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let object = self
                    .columns
                    .iter()
                    .zip(row)
                    .map(|(c, v)| (c.clone(), value_to_json(v)))
                    .collect();
                serde_json::Value::Object(object)
            })
            .collect();
        serde_json::Value::Array(rows)
    }
}

fn value_to_json(v: &Value) -> serde_json::Value {
    match v {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::json!(*i),
        Value::Real(r) => serde_json::json!(*r),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Unlimited => serde_json::Value::String("*".to_string()),
        Value::Object(obj) => {
            serde_json::json!({ "_type": "object", "_id": obj.id.raw(), "_class": obj.class })
        }
        Value::View(view) => serde_json::json!({
            "_type": "object",
            "_id": view.object.id.raw(),
            "_class": view.object.class,
            "_view": view.view_type,
        }),
        Value::Collection(c) => serde_json::Value::Array(c.items.iter().map(value_to_json).collect()),
    }
}
