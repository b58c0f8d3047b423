//! Query execution.

use crate::eval::Evaluator;
use crate::matcher::Matcher;
use crate::{
    Binding, ExecutorConfig, MatchClause, Projection, Query, QueryResult, ReturnClause,
};
use mrepo_core::{AccessPort, BindingTable, Value};
use tracing::{debug, trace};

/// Query executor.
pub struct QueryExecutor<'p> {
    port: &'p dyn AccessPort,
    config: ExecutorConfig,
}

impl<'p> QueryExecutor<'p> {
    /// Create a new executor.
    pub fn new(port: &'p dyn AccessPort) -> Self {
        Self {
            port,
            config: ExecutorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// Execute a query.
    pub fn execute(&self, query: &Query) -> QueryResult<BindingTable> {
        debug!(clauses = query.matches.len(), "executing query");

        let mut rows = vec![Binding::new()];
        for (i, clause) in query.matches.iter().enumerate() {
            rows = self.execute_clause(clause, rows)?;
            trace!(clause = i, optional = clause.optional, rows = rows.len(), "match clause done");
        }

        if let Some(filter) = &query.filter {
            let evaluator = Evaluator::new(self.port, self.config);
            let mut kept = Vec::with_capacity(rows.len());
            for row in rows {
                // Only a literal true keeps the row; null and false drop it.
                if evaluator.eval(filter, &row)? == Value::Bool(true) {
                    kept.push(row);
                }
            }
            rows = kept;
        }

        let table = self.project(query, &rows)?;
        debug!(rows = table.len(), columns = table.columns().len(), "query finished");
        Ok(table)
    }

    fn execute_clause(&self, clause: &MatchClause, rows: Vec<Binding>) -> QueryResult<Vec<Binding>> {
        let matcher = Matcher::new(self.port, self.config);
        let mut matched = Vec::new();
        for row in &rows {
            matched.extend(matcher.match_patterns(&clause.patterns, row.clone())?);
        }
        if !clause.optional || !matched.is_empty() {
            return Ok(matched);
        }

        // Optional clause with no match anywhere: keep the input rows.
        let variables = clause.variables();
        let filled = rows
            .into_iter()
            .map(|mut row| {
                for var in &variables {
                    if !row.contains(var) {
                        row.insert(var.as_str(), Value::Null);
                    }
                }
                row
            })
            .collect();
        Ok(filled)
    }

    fn project(&self, query: &Query, rows: &[Binding]) -> QueryResult<BindingTable> {
        let ReturnClause {
            projection,
            distinct,
        } = &query.ret;

        let (columns, values) = match projection {
            Projection::All => {
                let columns = star_columns(query, rows);
                let values: Vec<Vec<Value>> = rows
                    .iter()
                    .map(|row| {
                        columns
                            .iter()
                            .map(|c| row.get(c).cloned().unwrap_or(Value::Null))
                            .collect()
                    })
                    .collect();
                (columns, values)
            }
            Projection::Items(items) => {
                let evaluator = Evaluator::new(self.port, self.config);
                let columns: Vec<String> = items.iter().map(|item| item.column_name()).collect();
                let values = rows
                    .iter()
                    .map(|row| {
                        items
                            .iter()
                            .map(|item| evaluator.eval(&item.expr, row))
                            .collect::<QueryResult<Vec<Value>>>()
                    })
                    .collect::<QueryResult<Vec<_>>>()?;
                (columns, values)
            }
        };

        let mut table = BindingTable::with_columns(columns);
        let mut emitted: Vec<Vec<Value>> = Vec::new();
        for row in values {
            if *distinct {
                if emitted.iter().any(|seen| rows_equal(seen, &row)) {
                    continue;
                }
                emitted.push(row.clone());
            }
            table.push_values(row);
        }
        Ok(table)
    }
}

/// Columns for `RETURN *`: every bound variable in first-bound order.
fn star_columns(query: &Query, rows: &[Binding]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    if rows.is_empty() {
        for clause in &query.matches {
            for var in clause.variables() {
                if !columns.contains(&var) {
                    columns.push(var);
                }
            }
        }
        return columns;
    }
    for row in rows {
        for name in row.names() {
            if !columns.iter().any(|c| c == name) {
                columns.push(name.to_string());
            }
        }
    }
    columns
}

fn rows_equal(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.equals(y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        BinaryOp, EdgePattern, Expr, NodePattern, PathPattern, QueryError, Quantifier,
        ReturnItem,
    };
    use mrepo_core::props;
    use mrepo_model::{Model, ModelBuilder};
    use pretty_assertions::assert_eq;

    /// Two buses, a display and a sensor; the sensor sits on the first bus.
    fn devices() -> Model {
        let mut builder = ModelBuilder::new();
        builder.add_class("Device").done().unwrap();
        builder.add_class("Sensor").extends("Device").done().unwrap();
        builder.add_class("Bus").done().unwrap();
        builder.add_association("attached").unwrap();

        let can = builder.create_object("Bus", props! { "name" => "can" }).unwrap();
        builder.create_object("Bus", props! { "name" => "lin" }).unwrap();
        let display = builder
            .create_object("Device", props! { "name" => "display", "watts" => 12 })
            .unwrap();
        let sensor = builder
            .create_object("Sensor", props! { "name" => "lidar", "watts" => 8 })
            .unwrap();
        builder.link("attached", sensor.id, can.id).unwrap();
        builder.link("attached", display.id, can.id).unwrap();
        builder.build()
    }

    fn node(var: &str) -> NodePattern {
        NodePattern::new().var(var)
    }

    fn strings(table: &BindingTable, column: &str) -> Vec<String> {
        table.column(column).map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_match_label_includes_subclasses() {
        // GIVEN
        let model = devices();
        let query = Query::new()
            .matching(vec![PathPattern::node(node("d").label("Device"))])
            .returning(ReturnClause::items(vec![ReturnItem::new(
                Expr::var("d").prop("name"),
            )]));

        // WHEN
        let table = QueryExecutor::new(&model).execute(&query).unwrap();

        // THEN
        assert_eq!(table.columns(), &["d.name".to_string()]);
        assert_eq!(strings(&table, "d.name"), vec!["display", "lidar"]);
    }

    #[test]
    fn test_where_filters_on_true_only() {
        let model = devices();
        let query = Query::new()
            .matching(vec![PathPattern::node(node("d"))])
            .filter(Expr::var("d").prop("watts").binary(BinaryOp::Gt, Expr::lit(10)))
            .returning(ReturnClause::items(vec![ReturnItem::aliased(
                Expr::var("d").prop("name"),
                "name",
            )]));

        let table = QueryExecutor::new(&model).execute(&query).unwrap();

        // Buses have no watts; the comparison is null and drops them.
        assert_eq!(strings(&table, "name"), vec!["display"]);
    }

    #[test]
    fn test_optional_match_keeps_only_matched_rows() {
        // GIVEN MATCH (b:Bus) OPTIONAL MATCH (d)-[:attached]->(b)
        let model = devices();
        let query = Query::new()
            .matching(vec![PathPattern::node(node("b").label("Bus"))])
            .optional_matching(vec![PathPattern::node(node("d"))
                .then(EdgePattern::right().label("attached"), node("b"))])
            .returning(ReturnClause::items(vec![
                ReturnItem::aliased(Expr::var("b").prop("name"), "bus"),
                ReturnItem::aliased(Expr::var("d").prop("name"), "device"),
            ]));

        // WHEN
        let table = QueryExecutor::new(&model).execute(&query).unwrap();

        // THEN the clause matched somewhere, so the unattached bus is gone
        assert_eq!(strings(&table, "bus"), vec!["can", "can"]);
        assert_eq!(strings(&table, "device"), vec!["display", "lidar"]);
    }

    #[test]
    fn test_optional_match_without_any_match_fills_nulls() {
        // GIVEN MATCH (b:Bus) OPTIONAL MATCH (b)-[:attached]->(d)
        let model = devices();
        let query = Query::new()
            .matching(vec![PathPattern::node(node("b").label("Bus"))])
            .optional_matching(vec![PathPattern::node(node("b"))
                .then(EdgePattern::right().label("attached"), node("d"))])
            .returning(ReturnClause::items(vec![
                ReturnItem::aliased(Expr::var("b").prop("name"), "bus"),
                ReturnItem::aliased(Expr::var("d").prop("name"), "device"),
            ]));

        // WHEN
        let table = QueryExecutor::new(&model).execute(&query).unwrap();

        // THEN every bus survives with a null device
        assert_eq!(strings(&table, "bus"), vec!["can", "lin"]);
        assert_eq!(strings(&table, "device"), vec!["null", "null"]);
    }

    #[test]
    fn test_repeated_projection_keeps_both_columns() {
        let model = devices();
        let query = Query::new()
            .matching(vec![PathPattern::node(node("s").label("Sensor"))])
            .returning(ReturnClause::items(vec![
                ReturnItem::new(Expr::var("s").prop("name")),
                ReturnItem::new(Expr::var("s").prop("name")),
            ]));

        let table = QueryExecutor::new(&model).execute(&query).unwrap();

        assert_eq!(table.columns(), &["s.name", "s.name"].map(String::from));
        assert_eq!(table.rows()[0], vec![Value::from("lidar"), Value::from("lidar")]);
    }

    #[test]
    fn test_return_star_uses_binding_order() {
        let model = devices();
        let query = Query::new().matching(vec![PathPattern::node(node("s").label("Sensor"))
            .then(EdgePattern::right().var("e"), node("b"))]);

        let table = QueryExecutor::new(&model).execute(&query).unwrap();

        assert_eq!(table.columns(), &["s", "e", "b"].map(String::from));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_return_star_without_rows_lists_pattern_variables() {
        let model = devices();
        let query = Query::new().matching(vec![PathPattern::node(node("x").label("Missing"))]);

        let table = QueryExecutor::new(&model).execute(&query).unwrap();

        assert!(table.is_empty());
        assert_eq!(table.columns(), &["x".to_string()]);
    }

    #[test]
    fn test_distinct() {
        let model = devices();
        let query = Query::new()
            .matching(vec![PathPattern::node(node("d"))
                .then(EdgePattern::right().label("attached"), node("b"))])
            .returning(
                ReturnClause::items(vec![ReturnItem::new(Expr::var("b").prop("name"))]).distinct(),
            );

        let table = QueryExecutor::new(&model).execute(&query).unwrap();

        assert_eq!(strings(&table, "b.name"), vec!["can"]);
    }

    #[test]
    fn test_count_star_and_aggregate_over_list() {
        let model = devices();
        let query = Query::new()
            .matching(vec![PathPattern::node(node("b").label("Bus"))])
            .filter(Expr::var("b").prop("name").binary(BinaryOp::Eq, Expr::lit("can")))
            .returning(ReturnClause::items(vec![
                ReturnItem::new(Expr::CountStar),
                ReturnItem::aliased(
                    Expr::call(
                        "sum",
                        vec![Expr::List(vec![Expr::lit(1), Expr::lit(2)])],
                    ),
                    "total",
                ),
            ]));

        let table = QueryExecutor::new(&model).execute(&query).unwrap();

        assert_eq!(table.get(0, "COUNT(*)"), Some(&Value::Int(1)));
        assert_eq!(table.get(0, "total"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_unbounded_quantifier_uses_configured_ceiling() {
        let model = devices();
        let query = Query::new().matching(vec![PathPattern::node(node("s").label("Sensor"))
            .then(
                EdgePattern::new(crate::Direction::Any)
                    .quantified(Quantifier::Range { min: 1, max: None }),
                node("x"),
            )]);

        let shallow = QueryExecutor::new(&model)
            .with_config(ExecutorConfig::new().with_max_path_depth(1))
            .execute(&query)
            .unwrap();
        let deep = QueryExecutor::new(&model).execute(&query).unwrap();

        // lidar -> can, then can <- display at the second hop
        assert_eq!(shallow.len(), 1);
        assert_eq!(deep.len(), 2);
    }

    #[test]
    fn test_errors_abort_the_query() {
        let model = devices();
        let query = Query::new()
            .matching(vec![PathPattern::node(node("d"))])
            .filter(Expr::call("nonsense", vec![]));

        assert_eq!(
            QueryExecutor::new(&model).execute(&query),
            Err(QueryError::unknown_function("nonsense"))
        );
    }
}
