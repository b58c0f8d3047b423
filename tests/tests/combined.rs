//! Queries select elements, constraints judge them.

use mrepo_gql::{Expr as Gql, PathPattern, NodePattern, Query, QueryExecutor, ReturnClause, ReturnItem};
use mrepo_ocl::{Evaluator, Expr, InfixOp, IteratorKind};
use mrepo_tests::prelude::*;
use pretty_assertions::assert_eq;

#[test]
fn test_constraint_over_query_results() {
    // GIVEN every subsystem found by MATCH (s:Subsystem) RETURN s
    init_tracing();
    let fx = satellite();
    let query = Query::new()
        .matching(vec![PathPattern::node(NodePattern::new().var("s").label("Subsystem"))])
        .returning(ReturnClause::items(vec![ReturnItem::new(Gql::var("s"))]));
    let table = QueryExecutor::new(&fx.model).execute(&query).unwrap();

    // WHEN checking self.parts->notEmpty() and every part is lighter than 10
    let constraint = Expr::infix(
        Expr::self_ref().nav("parts").arrow("notEmpty", vec![]),
        InfixOp::And,
        Expr::self_ref().nav("parts").iter(
            IteratorKind::ForAll,
            "p",
            Expr::infix(Expr::var("p").prop("mass"), InfixOp::Lt, Expr::int(10)),
        ),
    );
    let verdicts: Vec<(String, bool)> = table
        .column("s")
        .map(|s| {
            let name = s
                .as_object()
                .map(|o| fx.model.get_property(o.id, "name").to_string())
                .unwrap_or_default();
            let ok = Evaluator::new(&fx.model, s.clone()).check(&constraint).unwrap();
            (name, ok)
        })
        .collect();

    // THEN the root fails on power's mass, the others hold
    assert_eq!(
        verdicts,
        vec![
            ("satellite".to_string(), false),
            ("power".to_string(), true),
            ("comms".to_string(), true),
        ]
    );
}

#[test]
fn test_both_evaluators_agree_on_instance_counts() {
    let fx = satellite();
    for class in ["Element", "Part", "Subsystem", "Requirement"] {
        let ocl = Evaluator::new(&fx.model, Value::Null)
            .evaluate(&Expr::var(class).call("allInstances", vec![]).arrow("size", vec![]))
            .unwrap();

        let query = Query::new()
            .matching(vec![PathPattern::node(NodePattern::new().var("n").label(class))])
            .returning(ReturnClause::items(vec![ReturnItem::new(Gql::call(
                "COUNT",
                vec![Gql::var("n")],
            ))]));
        let rows = QueryExecutor::new(&fx.model).execute(&query).unwrap().len();

        assert_eq!(ocl, Value::Int(rows as i64), "instance count of {}", class);
    }
}
