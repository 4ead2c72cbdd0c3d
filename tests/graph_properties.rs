// tests/graph_properties.rs

use std::collections::{BTreeSet, HashMap};

use objdag::dag::{build_order, topological_order, TargetId};
use objdag_test_utils::builders::{SpecBuilder, TargetBuilder};
use objdag_test_utils::fixture::Fixture;
use proptest::prelude::*;

// Strategy for a random acyclic program graph.
// Program N may only call programs 0..N-1, so the graph has no cycle.
fn call_graph_strategy(max_targets: usize) -> impl Strategy<Value = Vec<BTreeSet<usize>>> {
    (1..=max_targets).prop_flat_map(|count| {
        proptest::collection::vec(proptest::collection::vec(any::<usize>(), 0..count), count)
            .prop_map(|raw| {
                raw.into_iter()
                    .enumerate()
                    .map(|(i, picks)| {
                        if i == 0 {
                            BTreeSet::new()
                        } else {
                            picks.into_iter().map(|p| p % i).collect()
                        }
                    })
                    .collect()
            })
    })
}

fn program_name(i: usize) -> String {
    format!("PGM{i}")
}

/// One RPGLE program per entry, calling the listed programs through
/// `EXTPGM` prototypes. References to `UNKNOWN` are never declared.
fn fixture_for(calls: &[BTreeSet<usize>]) -> Fixture {
    let mut builder = SpecBuilder::new();
    for i in 0..calls.len() {
        let name = program_name(i);
        builder = builder.target(
            &format!("mylib.{name}.pgm.rpgle"),
            TargetBuilder::new().stream(&format!("{name}.pgm.rpgle")),
        );
    }

    let mut fx = Fixture::new(builder.build());
    for (i, callees) in calls.iter().enumerate() {
        let mut source = String::from("**free\ndcl-pr unknown extpgm('UNKNOWN');\nend-pr;\n");
        for callee in callees {
            let callee = program_name(*callee);
            source.push_str(&format!("dcl-pr {callee} extpgm('{callee}');\nend-pr;\n"));
        }
        fx = fx.source(&format!("{}.pgm.rpgle", program_name(i)), &source);
    }
    fx
}

fn scan_blocking(fx: &Fixture) {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(fx.scan())
        .unwrap();
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn detected_edges_match_the_calls(calls in call_graph_strategy(8)) {
        let fx = fixture_for(&calls);
        scan_blocking(&fx);

        let expected: Vec<(TargetId, TargetId)> = calls
            .iter()
            .enumerate()
            .flat_map(|(i, callees)| callees.iter().map(move |c| (TargetId(i), TargetId(*c))))
            .collect();
        prop_assert_eq!(fx.registry.edges(), expected);

        // Every edge has its mirror in the dependency's fathers.
        for (target, dependency) in fx.registry.edges() {
            prop_assert!(fx.registry.node(dependency).fathers().contains(&target));
        }
    }

    #[test]
    fn acyclic_graphs_order_every_target_once(calls in call_graph_strategy(8)) {
        let fx = fixture_for(&calls);
        scan_blocking(&fx);

        let order = build_order(&fx.registry).unwrap();
        prop_assert_eq!(order.len(), calls.len());

        let position: HashMap<TargetId, usize> =
            order.iter().enumerate().map(|(p, id)| (*id, p)).collect();
        prop_assert_eq!(position.len(), calls.len());

        for (target, dependency) in fx.registry.edges() {
            prop_assert!(position[&dependency] < position[&target]);
        }
    }

    #[test]
    fn scanning_is_deterministic(calls in call_graph_strategy(8)) {
        let first = fixture_for(&calls);
        let second = fixture_for(&calls);
        scan_blocking(&first);
        scan_blocking(&second);

        prop_assert_eq!(first.registry.edges(), second.registry.edges());
        prop_assert_eq!(
            topological_order(&first.registry).unwrap(),
            topological_order(&second.registry).unwrap()
        );
    }
}
