// src/dag/topo.rs

//! Ordering of declared targets over the detected dependency graph.

use std::collections::{HashMap, VecDeque};

use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::dag::graph::{TargetId, TargetRegistry};
use crate::errors::{BuildError, Result};

/// Kahn's algorithm over the `children` adjacency.
///
/// A target's in-degree is the number of targets listing it as a
/// dependency, so targets nothing depends on come out first and
/// leaf dependencies last. Seeding and traversal follow declaration order,
/// making the result deterministic. Use [`build_order`] for the
/// dependencies-first sequence.
///
/// Fails with [`BuildError::DependencyCycle`] and no partial order when
/// not every target can be emitted.
pub fn topological_order(registry: &TargetRegistry) -> Result<Vec<TargetId>> {
    let mut in_degree: HashMap<TargetId, usize> = registry.ids().map(|id| (id, 0)).collect();
    for node in registry.nodes() {
        for child in node.children() {
            *in_degree.entry(child).or_insert(0) += 1;
        }
    }

    let mut queue: VecDeque<TargetId> = registry
        .ids()
        .filter(|id| in_degree.get(id) == Some(&0))
        .collect();

    let mut order = Vec::with_capacity(registry.len());
    while let Some(id) = queue.pop_front() {
        order.push(id);
        for child in registry.node(id).children() {
            if let Some(degree) = in_degree.get_mut(&child) {
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(child);
                }
            }
        }
    }

    if order.len() != registry.len() {
        return Err(BuildError::DependencyCycle(describe_cycles(registry)));
    }

    debug!(targets = order.len(), "topological order computed");
    Ok(order)
}

/// Dependencies before dependents: the reverse of [`topological_order`].
pub fn build_order(registry: &TargetRegistry) -> Result<Vec<TargetId>> {
    let mut order = topological_order(registry)?;
    order.reverse();
    Ok(order)
}

/// Name the targets in every non-trivial strongly connected component.
fn describe_cycles(registry: &TargetRegistry) -> String {
    let mut graph: DiGraphMap<TargetId, ()> = DiGraphMap::new();
    for id in registry.ids() {
        graph.add_node(id);
    }
    for (target, dependency) in registry.edges() {
        graph.add_edge(target, dependency, ());
    }

    let mut cycles: Vec<Vec<TargetId>> = tarjan_scc(&graph)
        .into_iter()
        .filter(|scc| scc.len() > 1)
        .map(|mut scc| {
            scc.sort();
            scc
        })
        .collect();
    cycles.sort();

    if cycles.is_empty() {
        return "not every target could be ordered".to_string();
    }

    cycles
        .iter()
        .map(|scc| {
            let names: Vec<String> = scc
                .iter()
                .map(|id| registry.node(*id).key().to_string())
                .collect();
            format!("[{}]", names.join(" <-> "))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::{BuildSpec, TargetSpec};

    fn registry(keys: &[&str]) -> TargetRegistry {
        let spec = BuildSpec {
            targets: keys
                .iter()
                .map(|k| (k.parse().unwrap(), TargetSpec::default()))
                .collect(),
            ..BuildSpec::default()
        };
        TargetRegistry::from_spec(&spec)
    }

    #[test]
    fn emits_dependents_first() {
        // PGM -> SRVPGM -> MOD
        let reg = registry(&["L.MOD.MODULE.RPGLE", "L.SRV.SRVPGM.BND", "L.PGM.PGM.RPGLE"]);
        reg.add_edge(TargetId(1), TargetId(0));
        reg.add_edge(TargetId(2), TargetId(1));

        let order = topological_order(&reg).unwrap();
        assert_eq!(order, vec![TargetId(2), TargetId(1), TargetId(0)]);

        let build = build_order(&reg).unwrap();
        assert_eq!(build, vec![TargetId(0), TargetId(1), TargetId(2)]);
    }

    #[test]
    fn disconnected_targets_keep_declaration_order() {
        let reg = registry(&["L.A.PGM.RPGLE", "L.B.PGM.RPGLE", "L.C.PGM.RPGLE"]);
        let order = topological_order(&reg).unwrap();
        assert_eq!(order, vec![TargetId(0), TargetId(1), TargetId(2)]);
    }

    #[test]
    fn reciprocal_edges_are_a_cycle() {
        let reg = registry(&["L.A.PGM.RPGLE", "L.B.PGM.RPGLE", "L.C.PGM.RPGLE"]);
        reg.add_edge(TargetId(0), TargetId(1));
        reg.add_edge(TargetId(1), TargetId(0));

        match topological_order(&reg) {
            Err(BuildError::DependencyCycle(msg)) => {
                assert!(msg.contains("L.A.PGM.RPGLE"));
                assert!(msg.contains("L.B.PGM.RPGLE"));
                assert!(!msg.contains("L.C.PGM.RPGLE"));
            }
            other => panic!("expected a cycle error, got {other:?}"),
        }
    }

    #[test]
    fn empty_registry_orders_to_nothing() {
        let reg = TargetRegistry::default();
        assert!(topological_order(&reg).unwrap().is_empty());
    }
}
