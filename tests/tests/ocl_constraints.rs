//! Constraint scenarios over the satellite model.

use mrepo_ocl::{EvalConfig, EvalError, Evaluator, Expr, InfixOp, IteratorKind, TypeOpKind};
use mrepo_tests::prelude::*;

fn on<'m>(fx: &'m Satellite, object: &ObjectRef) -> Evaluator<'m> {
    init_tracing();
    Evaluator::new(&fx.model, Value::Object(object.clone()))
}

fn all(class: &str) -> Expr {
    Expr::var(class).call("allInstances", vec![])
}

fn names(value: Value) -> Vec<String> {
    value.into_items().iter().map(|v| v.to_string()).collect()
}

mod invariants {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_every_part_has_non_negative_mass() {
        // GIVEN Part.allInstances()->forAll(p | p.mass >= 0)
        let fx = satellite();
        let constraint = all("Part").iter(
            IteratorKind::ForAll,
            "p",
            Expr::infix(Expr::var("p").prop("mass"), InfixOp::Ge, Expr::int(0)),
        );

        // WHEN / THEN
        assert_eq!(on(&fx, &fx.satellite).check(&constraint), Ok(true));
    }

    #[test]
    fn test_every_requirement_is_satisfied_by_some_part() {
        // Requirement.allInstances()->forAll(r |
        //     Part.allInstances()->exists(p | p.satisfies->includes(r)))
        let fx = satellite();
        let satisfied_by_some = all("Part").iter(
            IteratorKind::Exists,
            "p",
            Expr::var("p")
                .nav("satisfies")
                .arrow("includes", vec![Expr::var("r")]),
        );
        let constraint = all("Requirement").iter(IteratorKind::ForAll, "r", satisfied_by_some);

        assert_eq!(on(&fx, &fx.satellite).check(&constraint), Ok(true));
    }

    #[test]
    fn test_subsystem_mass_is_not_below_its_parts() {
        // self.parts->iterate(p; acc = 0 | acc + p.mass) <= self.mass
        let fx = satellite();
        let total = Expr::self_ref().nav("parts").iterate(
            "p",
            "acc",
            Expr::int(0),
            Expr::infix(Expr::var("acc"), InfixOp::Add, Expr::var("p").prop("mass")),
        );

        assert_eq!(on(&fx, &fx.power).evaluate(&total), Ok(Value::Real(12.5)));
        let constraint = Expr::infix(total, InfixOp::Le, Expr::self_ref().prop("mass"));
        assert_eq!(on(&fx, &fx.power).check(&constraint), Ok(true));
        // The satellite root carries no mass of its own.
        assert_eq!(on(&fx, &fx.satellite).check(&constraint), Ok(false));
    }

    #[test]
    fn test_null_constraint_is_not_satisfied() {
        let fx = satellite();
        let constraint = Expr::infix(Expr::self_ref().prop("voltage"), InfixOp::Gt, Expr::int(3));
        assert_eq!(on(&fx, &fx.battery).check(&constraint), Ok(false));
    }
}

mod navigation {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_closure_walks_the_decomposition_breadth_first() {
        // GIVEN self->closure(p | p.parts)
        let fx = satellite();
        let expr = Expr::self_ref()
            .iter(IteratorKind::Closure, "p", Expr::var("p").nav("parts"))
            .iter(IteratorKind::Collect, "p", Expr::var("p").prop("name"));

        // WHEN
        let result = on(&fx, &fx.satellite).evaluate(&expr).unwrap();

        // THEN the root comes first, then each level in discovery order
        assert_eq!(
            names(result),
            vec!["satellite", "power", "comms", "battery", "panel", "antenna"]
        );
    }

    #[test]
    fn test_closure_terminates_on_dependency_cycles() {
        let fx = satellite();
        let expr = Expr::self_ref()
            .iter(IteratorKind::Closure, "p", Expr::var("p").nav("depends"))
            .arrow("size", vec![]);

        assert_eq!(on(&fx, &fx.comms).evaluate(&expr), Ok(Value::Int(2)));
        assert_eq!(on(&fx, &fx.antenna).evaluate(&expr), Ok(Value::Int(2)));
    }

    #[test]
    fn test_implicit_collect_flattens() {
        // self.parts.parts.name from the root
        let fx = satellite();
        let expr = Expr::self_ref().nav("parts").nav("parts").prop("name");

        let result = on(&fx, &fx.satellite).evaluate(&expr).unwrap();

        assert_eq!(names(result), vec!["battery", "panel", "antenna"]);
    }

    #[test]
    fn test_derived_property() {
        let fx = satellite();
        assert_eq!(
            on(&fx, &fx.r2).evaluate(&Expr::self_ref().prop("label")),
            Ok(Value::from("[R2]"))
        );
    }

    #[test]
    fn test_sorted_by_mass() {
        let fx = satellite();
        let expr = all("Part")
            .iter(IteratorKind::SortedBy, "p", Expr::var("p").prop("mass"))
            .iter(IteratorKind::Collect, "p", Expr::var("p").prop("name"));

        let result = on(&fx, &fx.satellite).evaluate(&expr).unwrap();

        assert_eq!(
            names(result),
            vec!["satellite", "antenna", "comms", "panel", "battery", "power"]
        );
    }
}

mod dispatch {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cast_dispatches_to_the_view_type() {
        // GIVEN power, a Subsystem that overrides Part::describe
        let fx = satellite();
        let as_part = Expr::self_ref().type_op(TypeOpKind::OclAsType, "Part");

        // WHEN / THEN
        assert_eq!(
            on(&fx, &fx.power).evaluate(&Expr::call_on_self("describe", vec![])),
            Ok(Value::from("subsystem power"))
        );
        assert_eq!(
            on(&fx, &fx.power).evaluate(&as_part.clone().call("describe", vec![])),
            Ok(Value::from("part power"))
        );
        assert_eq!(
            on(&fx, &fx.power).evaluate(&as_part.clone().type_op(TypeOpKind::OclIsTypeOf, "Part")),
            Ok(Value::Bool(false))
        );
        assert_eq!(
            on(&fx, &fx.power).evaluate(&as_part.type_op(TypeOpKind::OclIsKindOf, "Part")),
            Ok(Value::Bool(true))
        );
    }

    #[test]
    fn test_operation_arguments_are_matched_by_position() {
        let fx = satellite();
        let eval = on(&fx, &fx.battery);

        assert_eq!(
            eval.evaluate(&Expr::call_on_self("massIn", vec![Expr::string("g")])),
            Ok(Value::Real(8000.0))
        );
        assert!(matches!(
            eval.evaluate(&Expr::call_on_self("massIn", vec![])),
            Err(EvalError::MissingArgument { .. })
        ));
        assert!(matches!(
            eval.evaluate(&Expr::call_on_self(
                "massIn",
                vec![Expr::string("g"), Expr::int(1)]
            )),
            Err(EvalError::TooManyArguments { .. })
        ));
        assert!(matches!(
            eval.evaluate(&Expr::call_on_self("massIn", vec![Expr::string("lb")])),
            Err(EvalError::InvocationFailed(_))
        ));
    }

    #[test]
    fn test_unknown_operation_aborts_the_expression() {
        let fx = satellite();
        let expr = Expr::infix(
            Expr::bool(true),
            InfixOp::And,
            Expr::call_on_self("launch", vec![]),
        );

        assert!(matches!(
            on(&fx, &fx.r1).evaluate(&expr),
            Err(EvalError::UnknownOperation { .. })
        ));
    }
}

mod semantics {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_logic_short_circuits_before_failing_operands() {
        let fx = satellite();
        let eval = on(&fx, &fx.r1);
        let failing = || Expr::call_on_self("launch", vec![]);

        assert_eq!(
            eval.evaluate(&Expr::infix(Expr::bool(false), InfixOp::And, failing())),
            Ok(Value::Bool(false))
        );
        assert_eq!(
            eval.evaluate(&Expr::infix(Expr::bool(true), InfixOp::Or, failing())),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            eval.evaluate(&Expr::infix(Expr::bool(false), InfixOp::Implies, failing())),
            Ok(Value::Bool(true))
        );
    }

    #[test]
    fn test_division_keeps_exact_integers() {
        let fx = satellite();
        let eval = on(&fx, &fx.r1);

        assert_eq!(
            eval.evaluate(&Expr::infix(Expr::int(7), InfixOp::Div, Expr::int(2))),
            Ok(Value::Real(3.5))
        );
        assert_eq!(
            eval.evaluate(&Expr::infix(Expr::int(10), InfixOp::Div, Expr::int(2))),
            Ok(Value::Int(5))
        );
        assert_eq!(
            eval.evaluate(&Expr::infix(Expr::int(1), InfixOp::Div, Expr::int(0))),
            Err(EvalError::DivisionByZero)
        );
    }

    #[test]
    fn test_set_literals_stay_unique() {
        let fx = satellite();
        let eval = on(&fx, &fx.r1);
        let set = |items: &[i64]| {
            Expr::collection(
                CollectionKind::Set,
                items.iter().map(|i| Expr::int(*i)).collect(),
            )
        };

        assert_eq!(
            eval.evaluate(&set(&[1, 2, 2]).arrow("size", vec![])),
            Ok(Value::Int(2))
        );
        assert_eq!(
            eval.evaluate(&set(&[1, 2]).arrow("including", vec![Expr::int(3)])),
            Ok(Value::Collection(Collection::set(vec![
                Value::Int(1),
                Value::Int(2),
                Value::Int(3)
            ])))
        );
        assert_eq!(
            eval.evaluate(
                &set(&[1, 2])
                    .arrow("including", vec![Expr::int(2)])
                    .arrow("size", vec![])
            ),
            Ok(Value::Int(2))
        );
    }

    #[test]
    fn test_sub_sequence_agrees_with_at() {
        let fx = satellite();
        let eval = on(&fx, &fx.r1);
        let seq = Expr::collection(
            CollectionKind::Sequence,
            vec![Expr::int(10), Expr::int(20), Expr::int(30), Expr::int(40)],
        );

        let sub_first = seq
            .clone()
            .arrow("subSequence", vec![Expr::int(2), Expr::int(3)])
            .arrow("at", vec![Expr::int(1)]);
        let direct = seq.arrow("at", vec![Expr::int(2)]);

        assert_eq!(eval.evaluate(&sub_first), eval.evaluate(&direct));
        assert_eq!(eval.evaluate(&direct), Ok(Value::Int(20)));
    }

    #[test]
    fn test_let_and_conditionals() {
        // let heavy = self.mass > 5 in if heavy then 'heavy' else 'light' endif
        let fx = satellite();
        let expr = Expr::let_in(
            "heavy",
            Expr::infix(Expr::self_ref().prop("mass"), InfixOp::Gt, Expr::int(5)),
            Expr::if_then_else(Expr::var("heavy"), Expr::string("heavy"), Expr::string("light")),
        );

        assert_eq!(on(&fx, &fx.battery).evaluate(&expr), Ok(Value::from("heavy")));
        assert_eq!(on(&fx, &fx.antenna).evaluate(&expr), Ok(Value::from("light")));
    }

    #[test]
    fn test_extra_variables_and_depth_limit() {
        let fx = satellite();
        let eval = on(&fx, &fx.r1)
            .with_variable("limit", Value::Int(2))
            .with_config(EvalConfig::new().with_max_depth(4));

        let shallow = Expr::infix(Expr::self_ref().prop("priority"), InfixOp::Le, Expr::var("limit"));
        assert_eq!(eval.evaluate(&shallow), Ok(Value::Bool(true)));

        let mut deep = Expr::int(1);
        for _ in 0..8 {
            deep = Expr::infix(Expr::int(1), InfixOp::Add, deep);
        }
        assert_eq!(eval.evaluate(&deep), Err(EvalError::DepthExceeded { limit: 4 }));
    }
}
