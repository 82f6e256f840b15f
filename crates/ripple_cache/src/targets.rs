//! Target dependency graph and the set of caches wired along it.
//!
//! [`TargetGraph`] holds the dependency relation between the targets of one
//! build, with edges pointing from a dependency to its dependents.
//! [`incremental_caches`] opens one [`IncrementalCache`] per relevant target
//! and registers each dependent on the caches of its dependencies, so a
//! change saved into one cache can be read from the targets downstream.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Bfs, Reversed};
use petgraph::Direction;
use ripple_common::{BuildTarget, InternalError, TargetId};
use tracing::debug;

use crate::cache::IncrementalCache;
use crate::change::CompilationResult;
use crate::error::CacheError;

/// Dependency relation between the targets of a build.
#[derive(Debug, Clone)]
pub struct TargetGraph<T: BuildTarget> {
    graph: DiGraph<T, ()>,
    nodes: HashMap<T, NodeIndex>,
}

impl<T: BuildTarget> TargetGraph<T> {
    /// Builds the graph over `targets`.
    ///
    /// Dependencies outside `targets` are built elsewhere and are ignored, as
    /// are self-dependencies and repeated edges.
    pub fn build<D, I>(targets: impl IntoIterator<Item = T>, mut get_dependencies: D) -> Self
    where
        D: FnMut(&T) -> I,
        I: IntoIterator<Item = T>,
    {
        let mut graph = DiGraph::new();
        let mut nodes = HashMap::new();
        for target in targets {
            nodes
                .entry(target.clone())
                .or_insert_with(|| graph.add_node(target));
        }

        let indices: Vec<NodeIndex> = graph.node_indices().collect();
        for dependent in indices {
            for dependency in get_dependencies(&graph[dependent]) {
                match nodes.get(&dependency) {
                    Some(&dep) if dep != dependent => {
                        graph.update_edge(dep, dependent, ());
                    }
                    _ => {}
                }
            }
        }
        Self { graph, nodes }
    }

    /// Number of targets.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns `true` if the graph has no targets.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Returns `true` if `target` is part of the graph.
    pub fn contains(&self, target: &T) -> bool {
        self.nodes.contains_key(target)
    }

    /// Direct dependents of `target`.
    pub fn dependents_of(&self, target: &T) -> Vec<&T> {
        self.neighbors(target, Direction::Outgoing)
    }

    /// Direct dependencies of `target` within the graph.
    pub fn dependencies_of(&self, target: &T) -> Vec<&T> {
        self.neighbors(target, Direction::Incoming)
    }

    /// Returns `true` if some target in the graph depends on `target`.
    pub fn has_dependents(&self, target: &T) -> bool {
        self.nodes.get(target).is_some_and(|&n| {
            self.graph
                .neighbors_directed(n, Direction::Outgoing)
                .next()
                .is_some()
        })
    }

    /// Targets that need a cache for this build: every requested target and
    /// every target with at least one dependent, in graph order.
    pub fn relevant_targets(&self, requested: &[T]) -> Vec<&T> {
        self.graph
            .node_indices()
            .map(|n| &self.graph[n])
            .filter(|t| requested.contains(t) || self.has_dependents(t))
            .collect()
    }

    /// Targets ordered so that every dependency precedes its dependents.
    pub fn compilation_order(&self) -> Result<Vec<&T>, CacheError> {
        toposort(&self.graph, None)
            .map(|order| order.into_iter().map(|n| &self.graph[n]).collect())
            .map_err(|cycle| CacheError::DependencyCycle {
                target: self.graph[cycle.node_id()].target_id(),
            })
    }

    /// Every target that depends on `target`, directly or transitively.
    pub fn transitive_dependents(&self, target: &T) -> Vec<&T> {
        let Some(&start) = self.nodes.get(target) else {
            return Vec::new();
        };
        let mut bfs = Bfs::new(&self.graph, start);
        let mut found = Vec::new();
        while let Some(n) = bfs.next(&self.graph) {
            if n != start {
                found.push(&self.graph[n]);
            }
        }
        found
    }

    /// Every target `target` depends on, directly or transitively.
    pub fn transitive_dependencies(&self, target: &T) -> Vec<&T> {
        let Some(&start) = self.nodes.get(target) else {
            return Vec::new();
        };
        let reversed = Reversed(&self.graph);
        let mut bfs = Bfs::new(reversed, start);
        let mut found = Vec::new();
        while let Some(n) = bfs.next(reversed) {
            if n != start {
                found.push(&self.graph[n]);
            }
        }
        found
    }

    fn neighbors(&self, target: &T, direction: Direction) -> Vec<&T> {
        match self.nodes.get(target) {
            Some(&n) => self
                .graph
                .neighbors_directed(n, direction)
                .map(|m| &self.graph[m])
                .collect(),
            None => Vec::new(),
        }
    }
}

/// The caches of one build, keyed by stable target identity.
#[derive(Debug, Default)]
pub struct IncrementalCaches {
    caches: BTreeMap<TargetId, IncrementalCache>,
}

impl IncrementalCaches {
    /// Cache of `target`.
    pub fn get(&self, target: &TargetId) -> Option<&IncrementalCache> {
        self.caches.get(target)
    }

    /// Mutable cache of `target`.
    pub fn get_mut(&mut self, target: &TargetId) -> Option<&mut IncrementalCache> {
        self.caches.get_mut(target)
    }

    /// Returns `true` if `target` has a cache in this build.
    pub fn contains(&self, target: &TargetId) -> bool {
        self.caches.contains_key(target)
    }

    /// Number of caches.
    pub fn len(&self) -> usize {
        self.caches.len()
    }

    /// Returns `true` if no cache was opened.
    pub fn is_empty(&self) -> bool {
        self.caches.is_empty()
    }

    /// Targets with a cache, in identity order.
    pub fn targets(&self) -> impl Iterator<Item = &TargetId> {
        self.caches.keys()
    }

    /// All caches.
    pub fn iter(&self) -> impl Iterator<Item = (&TargetId, &IncrementalCache)> {
        self.caches.iter()
    }

    /// All caches, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&TargetId, &mut IncrementalCache)> {
        self.caches.iter_mut()
    }

    /// Sum of the pass changes of every cache that registered `target` as a
    /// dependent.
    pub fn changes_in_dependencies(&self, target: &TargetId) -> CompilationResult {
        self.caches
            .values()
            .filter(|cache| cache.dependents().any(|d| d == target))
            .map(|cache| cache.pass_changes().clone())
            .sum()
    }

    /// Every target reachable from `target` along dependent edges, excluding
    /// `target` itself.
    pub fn affected_targets(&self, target: &TargetId) -> BTreeSet<TargetId> {
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::from([target.clone()]);
        while let Some(next) = queue.pop_front() {
            let Some(cache) = self.caches.get(&next) else {
                continue;
            };
            for dependent in cache.dependents() {
                if dependent != target && seen.insert(dependent.clone()) {
                    queue.push_back(dependent.clone());
                }
            }
        }
        seen
    }

    /// Flushes every cache.
    pub fn flush_all(&mut self) -> Result<(), CacheError> {
        self.caches.values_mut().try_for_each(IncrementalCache::flush)
    }
}

/// Opens the caches a build needs and wires them along the dependency graph.
///
/// A cache is opened for every requested target and every target that some
/// other target in `targets` depends on; a leaf that was not requested gets
/// none. `get_cache` must return the cache of the target it is given.
pub fn incremental_caches<T, D, I, G>(
    targets: &[T],
    requested: &[T],
    get_dependencies: D,
    mut get_cache: G,
) -> Result<IncrementalCaches, CacheError>
where
    T: BuildTarget,
    D: FnMut(&T) -> I,
    I: IntoIterator<Item = T>,
    G: FnMut(&T) -> Result<IncrementalCache, CacheError>,
{
    let graph = TargetGraph::build(targets.iter().cloned(), get_dependencies);
    graph.compilation_order()?;

    let relevant = graph.relevant_targets(requested);
    let mut caches = BTreeMap::new();
    for target in &relevant {
        let id = target.target_id();
        let cache = get_cache(target)?;
        if cache.target() != &id {
            return Err(InternalError::new(format!(
                "cache of {} returned for target {id}",
                cache.target()
            ))
            .into());
        }
        caches.insert(id, cache);
    }

    for target in &relevant {
        let id = target.target_id();
        for dependent in graph.dependents_of(target) {
            let dependent_id = dependent.target_id();
            if !caches.contains_key(&dependent_id) {
                continue;
            }
            if let Some(cache) = caches.get_mut(&id) {
                cache.add_dependent_cache(&dependent_id);
            }
        }
    }

    debug!(targets = targets.len(), caches = caches.len(), "wired incremental caches");
    Ok(IncrementalCaches { caches })
}
