//! Randomly generated graphs: closure and quantified paths must agree.

use mrepo_core::props;
use mrepo_gql::{
    EdgePattern, ExecutorConfig, Expr as Gql, NodePattern, PathPattern, Quantifier, Query,
    QueryExecutor,
};
use mrepo_model::ModelBuilder;
use mrepo_ocl::{Evaluator, Expr, IteratorKind};
use mrepo_tests::prelude::*;
use rand::{Rng, SeedableRng};

const NODES: usize = 10;

fn generate(seed: u64) -> (Model, Vec<ObjectRef>) {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let mut builder = ModelBuilder::new();
    builder.add_class("Node").done().unwrap();
    builder.add_association("next").unwrap();

    let nodes: Vec<ObjectRef> = (0..NODES)
        .map(|i| {
            builder
                .create_object("Node", props! { "key" => i as i64 })
                .unwrap()
        })
        .collect();
    for source in &nodes {
        for _ in 0..rng.gen_range(0..=2) {
            let target = &nodes[rng.gen_range(0..NODES)];
            builder.link("next", source.id, target.id).unwrap();
        }
    }
    (builder.build(), nodes)
}

#[test]
fn test_closure_matches_unbounded_reachability() {
    init_tracing();
    for seed in [7, 42, 1234] {
        let (model, nodes) = generate(seed);
        let closure = Expr::self_ref()
            .iter(IteratorKind::Closure, "n", Expr::var("n").nav("next"))
            .arrow("size", vec![]);
        let executor = QueryExecutor::new(&model)
            .with_config(ExecutorConfig::new().with_max_path_depth(NODES as u32));

        for (i, node) in nodes.iter().enumerate() {
            let ocl = Evaluator::new(&model, Value::Object(node.clone()))
                .evaluate(&closure)
                .unwrap();

            // MATCH ({key: i})-[:next*0..]->(m) RETURN m
            let query = Query::new().matching(vec![PathPattern::node(
                NodePattern::new().prop("key", Gql::lit(i as i64)),
            )
            .then(
                EdgePattern::right()
                    .label("next")
                    .quantified(Quantifier::Range { min: 0, max: None }),
                NodePattern::new().var("m"),
            )]);
            let reached = executor.execute(&query).unwrap().len();

            assert_eq!(
                ocl,
                Value::Int(reached as i64),
                "seed {} node {}",
                seed,
                i
            );
        }
    }
}
