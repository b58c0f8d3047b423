//! Graph query scenarios over the satellite model.

use mrepo_gql::{
    BinaryOp, Direction, EdgePattern, Expr, NodePattern, PathElement, PathPattern, Quantifier,
    Query, QueryError, QueryExecutor, ReturnClause, ReturnItem,
};
use mrepo_tests::prelude::*;
use serde_json::json;

fn run(fx: &Satellite, query: &Query) -> BindingTable {
    init_tracing();
    QueryExecutor::new(&fx.model).execute(query).unwrap()
}

fn node(var: &str) -> NodePattern {
    NodePattern::new().var(var)
}

fn named(var: &str, name: &str) -> NodePattern {
    node(var).prop("name", Expr::lit(name))
}

fn returning(items: Vec<ReturnItem>) -> ReturnClause {
    ReturnClause::items(items)
}

fn column(table: &BindingTable, name: &str) -> Vec<String> {
    table.column(name).map(|v| v.to_string()).collect()
}

mod matching {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_label_match_returns_every_instance_including_subclasses() {
        // MATCH (p:Part) RETURN p.name
        let fx = satellite();
        let query = Query::new()
            .matching(vec![PathPattern::node(node("p").label("Part"))])
            .returning(returning(vec![ReturnItem::new(Expr::var("p").prop("name"))]));

        let table = run(&fx, &query);

        assert_eq!(
            column(&table, "p.name"),
            vec!["satellite", "power", "battery", "panel", "comms", "antenna"]
        );
    }

    #[test]
    fn test_edge_traversal_with_where() {
        // MATCH (s:Subsystem)-[:parts]->(p:Part) WHERE p.mass > 4 RETURN s.name, p.name
        let fx = satellite();
        let query = Query::new()
            .matching(vec![PathPattern::node(node("s").label("Subsystem"))
                .then(EdgePattern::right().label("parts"), node("p").label("Part"))])
            .filter(Expr::var("p").prop("mass").binary(BinaryOp::Gt, Expr::lit(4)))
            .returning(returning(vec![
                ReturnItem::new(Expr::var("s").prop("name")),
                ReturnItem::new(Expr::var("p").prop("name")),
            ]));

        let table = run(&fx, &query);

        assert_eq!(column(&table, "s.name"), vec!["satellite", "power", "power"]);
        assert_eq!(column(&table, "p.name"), vec!["power", "battery", "panel"]);
    }

    #[test]
    fn test_left_edge_and_label_alternatives() {
        // MATCH (r {name:'R1'})<-[:satisfies]-(p:Subsystem|Part) RETURN p.name
        let fx = satellite();
        let query = Query::new()
            .matching(vec![PathPattern::node(named("r", "R1")).then(
                EdgePattern::left().label("satisfies"),
                node("p").label("Subsystem").label("Part"),
            )])
            .returning(returning(vec![ReturnItem::aliased(
                Expr::var("p").prop("name"),
                "part",
            )]));

        let table = run(&fx, &query);

        assert_eq!(column(&table, "part"), vec!["panel", "battery"]);
    }

    #[test]
    fn test_comma_patterns_join_on_shared_variables() {
        // MATCH (a)-[:satisfies]->(r), (b)-[:satisfies]->(r) WHERE a <> b RETURN a.name, b.name
        let fx = satellite();
        let query = Query::new()
            .matching(vec![
                PathPattern::node(node("a"))
                    .then(EdgePattern::right().label("satisfies"), node("r")),
                PathPattern::node(node("b"))
                    .then(EdgePattern::right().label("satisfies"), node("r")),
            ])
            .filter(Expr::var("a").binary(BinaryOp::Ne, Expr::var("b")))
            .returning(returning(vec![
                ReturnItem::new(Expr::var("a").prop("name")),
                ReturnItem::new(Expr::var("b").prop("name")),
            ]));

        let table = run(&fx, &query);

        assert_eq!(column(&table, "a.name"), vec!["battery", "panel"]);
        assert_eq!(column(&table, "b.name"), vec!["panel", "battery"]);
    }

    fn optional_satisfies(target: &str) -> Query {
        // MATCH (p:Part) OPTIONAL MATCH (p)-[:satisfies]->(r:<target>) RETURN p.name, r.name
        Query::new()
            .matching(vec![PathPattern::node(node("p").label("Part"))])
            .optional_matching(vec![PathPattern::node(node("p")).then(
                EdgePattern::right().label("satisfies"),
                node("r").label(target),
            )])
            .returning(returning(vec![
                ReturnItem::new(Expr::var("p").prop("name")),
                ReturnItem::new(Expr::var("r").prop("name")),
            ]))
    }

    #[test]
    fn test_optional_match_with_some_matches_drops_unmatched_rows() {
        let fx = satellite();

        let table = run(&fx, &optional_satisfies("Requirement"));

        assert_eq!(column(&table, "p.name"), vec!["battery", "panel", "antenna"]);
        assert_eq!(column(&table, "r.name"), vec!["R1", "R1", "R2"]);
    }

    #[test]
    fn test_optional_match_without_matches_fills_nulls() {
        let fx = satellite();

        let table = run(&fx, &optional_satisfies("Subsystem"));

        assert_eq!(table.len(), 6);
        assert!(table.column("r.name").all(|v| v.is_null()));
        assert_eq!(table.get(0, "p.name"), Some(&Value::from("satellite")));
    }

    #[test]
    fn test_repeated_projection_keeps_every_value() {
        // MATCH (p:Part) RETURN p.name, p.name
        let fx = satellite();
        let query = Query::new()
            .matching(vec![PathPattern::node(node("p").label("Part"))])
            .returning(returning(vec![
                ReturnItem::new(Expr::var("p").prop("name")),
                ReturnItem::new(Expr::var("p").prop("name")),
            ]));

        let table = run(&fx, &query);

        assert_eq!(table.columns(), &["p.name", "p.name"].map(String::from));
        assert_eq!(
            table.rows()[0],
            vec![Value::from("satellite"), Value::from("satellite")]
        );
    }

    #[test]
    fn test_invalid_patterns_are_rejected() {
        let fx = satellite();
        let leading_edge = Query::new().matching(vec![PathPattern::new(vec![
            PathElement::Edge(EdgePattern::right()),
            PathElement::Node(node("x")),
        ])]);

        assert!(matches!(
            QueryExecutor::new(&fx.model).execute(&leading_edge),
            Err(QueryError::InvalidPattern { .. })
        ));
    }
}

mod paths {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bounded_quantifier_walks_levels_in_order() {
        // MATCH (s {name:'satellite'})-[:parts*1..2]->(x) RETURN x.name
        let fx = satellite();
        let query = Query::new()
            .matching(vec![PathPattern::node(named("s", "satellite")).then(
                EdgePattern::right()
                    .label("parts")
                    .quantified(Quantifier::Range { min: 1, max: Some(2) }),
                node("x"),
            )])
            .returning(returning(vec![ReturnItem::new(Expr::var("x").prop("name"))]));

        let table = run(&fx, &query);

        assert_eq!(
            column(&table, "x.name"),
            vec!["power", "comms", "battery", "panel", "antenna"]
        );
    }

    #[test]
    fn test_quantifier_yields_each_reachable_node_once() {
        // GIVEN power and comms are reachable both by parts and by depends
        let fx = satellite();
        let query = Query::new()
            .matching(vec![PathPattern::node(named("s", "satellite")).then(
                EdgePattern::right().quantified(Quantifier::Range { min: 1, max: Some(2) }),
                node("x"),
            )])
            .returning(returning(vec![ReturnItem::new(Expr::var("x").prop("name"))]));

        // WHEN
        let table = run(&fx, &query);

        // THEN
        assert_eq!(table.len(), 5);
        assert_eq!(
            column(&table, "x.name"),
            vec!["power", "comms", "battery", "panel", "antenna"]
        );
    }

    #[test]
    fn test_fixed_quantifier_and_zero_hops() {
        let fx = satellite();
        let reach = |quantifier: Quantifier| {
            let query = Query::new()
                .matching(vec![PathPattern::node(named("s", "satellite")).then(
                    EdgePattern::right().label("parts").quantified(quantifier),
                    node("x"),
                )])
                .returning(returning(vec![ReturnItem::new(Expr::var("x").prop("name"))]));
            column(&run(&fx, &query), "x.name")
        };

        assert_eq!(reach(Quantifier::Fixed(2)), vec!["battery", "panel", "antenna"]);
        assert_eq!(
            reach(Quantifier::Range { min: 0, max: Some(1) }),
            vec!["satellite", "power", "comms"]
        );
    }

    #[test]
    fn test_undirected_edges_follow_both_ways() {
        // MATCH (b {name:'battery'})-[:depends|parts]-(x) RETURN x.name
        let fx = satellite();
        let query = Query::new()
            .matching(vec![PathPattern::node(named("b", "battery")).then(
                EdgePattern::new(Direction::Any).label("depends").label("parts"),
                node("x"),
            )])
            .returning(returning(vec![ReturnItem::new(Expr::var("x").prop("name"))]));

        let table = run(&fx, &query);

        assert_eq!(column(&table, "x.name"), vec!["antenna", "power"]);
    }

    #[test]
    fn test_path_and_edge_variables() {
        // MATCH p = (a {name:'antenna'})-[e:satisfies]->(r) RETURN e, SIZE(NODES(p))
        let fx = satellite();
        let query = Query::new()
            .matching(vec![PathPattern::node(named("a", "antenna"))
                .then(EdgePattern::right().var("e").label("satisfies"), node("r"))
                .named("p")])
            .returning(returning(vec![
                ReturnItem::new(Expr::var("e")),
                ReturnItem::aliased(
                    Expr::call("SIZE", vec![Expr::call("NODES", vec![Expr::var("p")])]),
                    "hops",
                ),
            ]));

        let table = run(&fx, &query);

        let edge = Value::list(vec![
            Value::Object(fx.antenna.clone()),
            Value::Object(fx.r2.clone()),
        ]);
        assert_eq!(table.get(0, "e"), Some(&edge));
        assert_eq!(table.get(0, "hops"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_exists_subpattern_in_where() {
        // MATCH (r:Requirement) WHERE EXISTS { (r)<-[:satisfies]-({name:'panel'}) } RETURN r.name
        let fx = satellite();
        let exists = PathPattern::node(node("r")).then(
            EdgePattern::left().label("satisfies"),
            NodePattern::new().prop("name", Expr::lit("panel")),
        );
        let query = Query::new()
            .matching(vec![PathPattern::node(node("r").label("Requirement"))])
            .filter(Expr::Exists(Box::new(exists)))
            .returning(returning(vec![ReturnItem::new(Expr::var("r").prop("name"))]));

        let table = run(&fx, &query);

        assert_eq!(column(&table, "r.name"), vec!["R1"]);
    }
}

mod projection {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_distinct_keeps_first_occurrences() {
        // MATCH (p)-[:satisfies]->(r) RETURN DISTINCT r.name
        let fx = satellite();
        let query = Query::new()
            .matching(vec![PathPattern::node(node("p"))
                .then(EdgePattern::right().label("satisfies"), node("r"))])
            .returning(
                returning(vec![ReturnItem::new(Expr::var("r").prop("name"))]).distinct(),
            );

        let table = run(&fx, &query);

        assert_eq!(column(&table, "r.name"), vec!["R1", "R2"]);
    }

    #[test]
    fn test_label_check_and_string_functions() {
        // MATCH (p:Part) WHERE p:Subsystem AND p.name STARTS WITH 'p' RETURN UPPER(p.name)
        let fx = satellite();
        let query = Query::new()
            .matching(vec![PathPattern::node(node("p").label("Part"))])
            .filter(
                Expr::LabelCheck("p".into(), vec!["Subsystem".into()]).binary(
                    BinaryOp::And,
                    Expr::var("p")
                        .prop("name")
                        .binary(BinaryOp::StartsWith, Expr::lit("p")),
                ),
            )
            .returning(returning(vec![ReturnItem::new(Expr::call(
                "UPPER",
                vec![Expr::var("p").prop("name")],
            ))]));

        let table = run(&fx, &query);

        assert_eq!(table.columns(), &["UPPER(p.name)".to_string()]);
        assert_eq!(column(&table, "UPPER(p.name)"), vec!["POWER"]);
    }

    #[test]
    fn test_like_filter() {
        let fx = satellite();
        let query = Query::new()
            .matching(vec![PathPattern::node(node("r").label("Requirement"))])
            .filter(Expr::var("r").prop("text").binary(BinaryOp::Like, Expr::lit("%W")))
            .returning(returning(vec![ReturnItem::new(Expr::var("r").prop("name"))]));

        assert_eq!(column(&run(&fx, &query), "r.name"), vec!["R1"]);
    }

    #[test]
    fn test_list_functions_keep_duplicates() {
        // RETURN INCLUDING([1, 2], 2) AS xs
        let fx = satellite();
        let list = Expr::List(vec![Expr::lit(1), Expr::lit(2)]);
        let query = Query::new().returning(returning(vec![ReturnItem::aliased(
            Expr::call("INCLUDING", vec![list, Expr::lit(2)]),
            "xs",
        )]));

        let table = run(&fx, &query);

        assert_eq!(
            table.scalar(),
            Value::list(vec![Value::Int(1), Value::Int(2), Value::Int(2)])
        );
    }

    #[test]
    fn test_errors_abort_the_whole_query() {
        let fx = satellite();
        let query = Query::new()
            .matching(vec![PathPattern::node(node("p").label("Part"))])
            .returning(returning(vec![ReturnItem::new(
                Expr::var("p").prop("mass").binary(BinaryOp::Div, Expr::lit(0)),
            )]));

        assert_eq!(
            QueryExecutor::new(&fx.model).execute(&query),
            Err(QueryError::DivisionByZero)
        );
    }

    #[test]
    fn test_json_rendering() {
        let fx = satellite();
        let query = Query::new()
            .matching(vec![PathPattern::node(named("r", "R2").label("Requirement"))])
            .returning(returning(vec![
                ReturnItem::new(Expr::var("r")),
                ReturnItem::aliased(Expr::var("r").prop("priority"), "priority"),
            ]));

        let table = run(&fx, &query);

        assert_eq!(
            table.to_json(),
            json!([{
                "r": { "_type": "object", "_id": fx.r2.id.raw(), "_class": "Requirement" },
                "priority": 2
            }])
        );
    }
}
