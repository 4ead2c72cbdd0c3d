// src/dag/graph.rs

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::config::model::{BuildSpec, TargetSpec};
use crate::dag::key::TargetKey;
use crate::dag::location::SourceLocation;
use crate::engine::staleness::Timestamps;
use crate::types::ResolveClass;

/// Index of a node inside its [`TargetRegistry`].
///
/// Ids follow declaration order, so ordering by id is ordering by
/// position in the build spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TargetId(pub usize);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One declared build target plus its adjacency.
///
/// Adjacency sets are written concurrently during scanning: a task scanning
/// A adds A to B's `fathers` while another task may be doing the same for C.
/// Each set sits behind its own mutex and insertion is a single
/// `BTreeSet::insert`, so duplicates collapse without a check-then-add race.
#[derive(Debug)]
pub struct TargetNode {
    id: TargetId,
    key: TargetKey,
    location: Option<SourceLocation>,
    params: BTreeMap<String, String>,
    spec: TargetSpec,
    /// Dependencies of this target.
    children: Mutex<BTreeSet<TargetId>>,
    /// Targets depending on this one.
    fathers: Mutex<BTreeSet<TargetId>>,
    /// Refreshed from object metadata before a diff build.
    timestamps: Mutex<Timestamps>,
}

impl TargetNode {
    pub fn id(&self) -> TargetId {
        self.id
    }

    pub fn key(&self) -> &TargetKey {
        &self.key
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        self.location.as_ref()
    }

    /// Effective compile parameters (global defaults overlaid by the target's own).
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(|s| s.as_str())
    }

    pub fn spec(&self) -> &TargetSpec {
        &self.spec
    }

    pub fn children(&self) -> Vec<TargetId> {
        lock(&self.children).iter().copied().collect()
    }

    pub fn fathers(&self) -> Vec<TargetId> {
        lock(&self.fathers).iter().copied().collect()
    }

    pub fn child_count(&self) -> usize {
        lock(&self.children).len()
    }

    /// Whether any other target depends on this one.
    pub fn is_child(&self) -> bool {
        !lock(&self.fathers).is_empty()
    }

    pub fn timestamps(&self) -> Timestamps {
        *lock(&self.timestamps)
    }

    pub fn set_timestamps(&self, timestamps: Timestamps) {
        *lock(&self.timestamps) = timestamps;
    }

    pub fn update_timestamps(&self, f: impl FnOnce(&mut Timestamps)) {
        f(&mut lock(&self.timestamps));
    }

    pub fn needs_rebuild(&self) -> bool {
        self.timestamps().needs_rebuild()
    }
}

/// Result of [`TargetRegistry::add_edge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeInsert {
    Added,
    AlreadyPresent,
    /// A target referencing itself; never installed.
    SelfReference,
}

/// Central owner of every declared target.
///
/// Nodes live in a declaration-ordered vector; edges are recorded as
/// [`TargetId`] pairs inside the nodes, never as references between nodes.
#[derive(Debug, Default)]
pub struct TargetRegistry {
    nodes: Vec<TargetNode>,
    by_key: HashMap<TargetKey, TargetId>,
    by_name: HashMap<(ResolveClass, String), TargetId>,
}

impl TargetRegistry {
    /// Build the registry from a validated [`BuildSpec`], in declaration order.
    pub fn from_spec(spec: &BuildSpec) -> Self {
        let mut registry = Self::default();
        for (key, target) in spec.targets.iter() {
            let params = spec.effective_params(target);
            registry.insert(key.clone(), params, target.clone());
        }
        registry
    }

    fn insert(
        &mut self,
        key: TargetKey,
        params: BTreeMap<String, String>,
        spec: TargetSpec,
    ) -> TargetId {
        if let Some(existing) = self.by_key.get(&key) {
            warn!(key = %key, "duplicate target declaration; keeping the first");
            return *existing;
        }

        let id = TargetId(self.nodes.len());

        if let Some(class) = key.object_type().resolve_class() {
            let name_key = (class, key.object_name().to_string());
            match self.by_name.get(&name_key) {
                Some(first) => warn!(
                    key = %key,
                    first = %self.nodes[first.0].key,
                    "object name declared twice for the same kind; references resolve to the first"
                ),
                None => {
                    self.by_name.insert(name_key, id);
                }
            }
        }

        let location = SourceLocation::from_params(&key, &params);
        self.by_key.insert(key.clone(), id);
        self.nodes.push(TargetNode {
            id,
            key,
            location,
            params,
            spec,
            children: Mutex::new(BTreeSet::new()),
            fathers: Mutex::new(BTreeSet::new()),
            timestamps: Mutex::new(Timestamps::default()),
        });
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in declaration order.
    pub fn nodes(&self) -> impl Iterator<Item = &TargetNode> {
        self.nodes.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = TargetId> + '_ {
        self.nodes.iter().map(|n| n.id)
    }

    pub fn node(&self, id: TargetId) -> &TargetNode {
        &self.nodes[id.0]
    }

    pub fn get(&self, key: &TargetKey) -> Option<TargetId> {
        self.by_key.get(key).copied()
    }

    pub fn node_by_key(&self, key: &TargetKey) -> Option<&TargetNode> {
        self.get(key).map(|id| self.node(id))
    }

    /// Look up a declared target by normalized object name and expected class.
    pub fn resolve(&self, class: ResolveClass, name: &str) -> Option<TargetId> {
        self.by_name
            .get(&(class, name.trim().to_uppercase()))
            .copied()
    }

    /// Install `target -> dependency` together with its reverse edge.
    ///
    /// Safe to call from many tasks at once; repeated calls are no-ops.
    pub fn add_edge(&self, target: TargetId, dependency: TargetId) -> EdgeInsert {
        if target == dependency {
            debug!(
                key = %self.node(target).key,
                "ignoring reference of a target to itself"
            );
            return EdgeInsert::SelfReference;
        }

        let added = lock(&self.nodes[target.0].children).insert(dependency);
        lock(&self.nodes[dependency.0].fathers).insert(target);

        if added {
            EdgeInsert::Added
        } else {
            EdgeInsert::AlreadyPresent
        }
    }

    /// Every edge as `(target, dependency)`, sorted.
    pub fn edges(&self) -> Vec<(TargetId, TargetId)> {
        self.nodes
            .iter()
            .flat_map(|n| n.children().into_iter().map(move |c| (n.id, c)))
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.child_count()).sum()
    }
}

/// Adjacency and timestamps are plain data, so a poisoned lock is still usable.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn registry(keys: &[&str]) -> TargetRegistry {
        let mut reg = TargetRegistry::default();
        for k in keys {
            reg.insert(k.parse().unwrap(), BTreeMap::new(), TargetSpec::default());
        }
        reg
    }

    #[test]
    fn edges_are_symmetric_and_idempotent() {
        let reg = registry(&["L.PGMA.PGM.RPGLE", "L.CUST.PF.DDS"]);
        let (a, c) = (TargetId(0), TargetId(1));

        assert_eq!(reg.add_edge(a, c), EdgeInsert::Added);
        assert_eq!(reg.add_edge(a, c), EdgeInsert::AlreadyPresent);

        assert_eq!(reg.node(a).children(), vec![c]);
        assert_eq!(reg.node(c).fathers(), vec![a]);
        assert!(reg.node(c).is_child());
        assert_eq!(reg.edge_count(), 1);
    }

    #[test]
    fn self_reference_is_not_installed() {
        let reg = registry(&["L.MOD1.MODULE.RPGLE"]);
        assert_eq!(reg.add_edge(TargetId(0), TargetId(0)), EdgeInsert::SelfReference);
        assert_eq!(reg.edge_count(), 0);
    }

    #[test]
    fn resolves_by_class_and_name() {
        let reg = registry(&["L.CUSTOMER.TABLE.SQL", "L.CUSTOMER.PGM.RPGLE"]);
        assert_eq!(reg.resolve(ResolveClass::File, "customer"), Some(TargetId(0)));
        assert_eq!(reg.resolve(ResolveClass::Program, "CUSTOMER"), Some(TargetId(1)));
        assert_eq!(reg.resolve(ResolveClass::Module, "CUSTOMER"), None);
    }

    #[test]
    fn concurrent_inserts_collapse_to_one_edge() {
        let reg = Arc::new(registry(&["L.A.PGM.RPGLE", "L.B.PGM.RPGLE", "L.F.PF.DDS"]));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let reg = Arc::clone(&reg);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        reg.add_edge(TargetId(i % 2), TargetId(2));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(reg.node(TargetId(2)).fathers(), vec![TargetId(0), TargetId(1)]);
        assert_eq!(reg.edge_count(), 2);
    }
}
