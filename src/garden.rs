//! The Garden: a weighted suggestion graph over command strings.
//!
//! The Garden is a directed multigraph from source strings to derived
//! strings. Each recorded target carries a weight that starts at
//! [`WEIGHT_BASE`](crate::config::WEIGHT_BASE) and grows by
//! [`WEIGHT_STEP`](crate::config::WEIGHT_STEP) every time the same string is
//! recorded as a target anywhere in the graph. Lookup picks the
//! heaviest-known target of a source; pruning trims the weight map without
//! touching the edges; depth reports the longest simple path.

use std::collections::{HashMap, HashSet};

use crate::config::{WEIGHT_BASE, WEIGHT_STEP};

/// Weighted suggestion graph. Owned exclusively by the core.
#[derive(Debug, Clone, Default)]
pub struct Garden {
    /// Source -> targets, insertion order preserved, duplicates allowed.
    edges: HashMap<String, Vec<String>>,
    /// Target -> accumulated weight. Entries may be pruned independently of
    /// the edges; a missing entry reads as weight 0.
    weights: HashMap<String, f64>,
}

impl Garden {
    /// Create an empty garden.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a derived string under a source.
    ///
    /// Appends to the source's target list (duplicates accumulate) and grows
    /// the target's weight: `WEIGHT_BASE + WEIGHT_STEP` on first sight,
    /// `+WEIGHT_STEP` on every repeat.
    pub fn record(&mut self, source: impl Into<String>, derived: impl Into<String>) {
        let derived = derived.into();
        *self.weights.entry(derived.clone()).or_insert(WEIGHT_BASE) += WEIGHT_STEP;
        self.edges.entry(source.into()).or_default().push(derived);
    }

    /// The heaviest recorded target of `source`.
    ///
    /// Ties break by insertion order: the first target to reach the maximum
    /// weight wins (stable maximum scan). Targets whose weight entry was
    /// pruned count as weight 0. Returns `None` when the source has no
    /// targets.
    pub fn best_next(&self, source: &str) -> Option<&str> {
        let targets = self.edges.get(source)?;
        let mut best: Option<(&str, f64)> = None;
        for target in targets {
            let weight = self.weight_of(target);
            match best {
                Some((_, top)) if weight <= top => {}
                _ => best = Some((target, weight)),
            }
        }
        best.map(|(target, _)| target)
    }

    /// Current weight of a target (0 when unknown or pruned).
    pub fn weight_of(&self, target: &str) -> f64 {
        self.weights.get(target).copied().unwrap_or(0.0)
    }

    /// Drop every weight entry strictly below `threshold`.
    ///
    /// The edges persist: only the weight accounting is trimmed. Returns the
    /// number of entries removed.
    pub fn prune(&mut self, threshold: f64) -> usize {
        let before = self.weights.len();
        self.weights.retain(|_, weight| *weight >= threshold);
        before - self.weights.len()
    }

    /// Number of source nodes with recorded targets.
    pub fn sources(&self) -> usize {
        self.edges.len()
    }

    /// Number of targets with live weight entries.
    pub fn tracked(&self) -> usize {
        self.weights.len()
    }

    /// Length of the longest simple path in the graph.
    ///
    /// Per starting node: 0 if the node is already on the current path, else
    /// 1 + the maximum over its children (0 with no children). The overall
    /// result is the maximum over all source nodes, or 0 for an empty graph.
    /// The visited set is path-local, so cyclic graphs terminate while nodes
    /// remain revisitable along other paths.
    pub fn depth(&self) -> usize {
        self.edges
            .keys()
            .map(|source| self.longest_path_from(source))
            .max()
            .unwrap_or(0)
    }

    /// Explicit-stack depth-first walk from one node, avoiding recursion so
    /// large graphs cannot exhaust the call stack.
    fn longest_path_from(&self, start: &str) -> usize {
        struct Frame<'a> {
            node: &'a str,
            children: std::slice::Iter<'a, String>,
            best_child: usize,
        }

        let mut on_path: HashSet<&str> = HashSet::new();
        on_path.insert(start);
        let mut stack = vec![Frame {
            node: start,
            children: self.children_of(start).iter(),
            best_child: 0,
        }];
        let mut result = 0;

        while let Some(top) = stack.last_mut() {
            match top.children.next() {
                Some(child) => {
                    let child = child.as_str();
                    if on_path.contains(child) {
                        // Cycle guard: a node already on this path adds 0.
                        continue;
                    }
                    on_path.insert(child);
                    stack.push(Frame {
                        node: child,
                        children: self.children_of(child).iter(),
                        best_child: 0,
                    });
                }
                None => {
                    let depth = top.best_child + 1;
                    let node = top.node;
                    stack.pop();
                    on_path.remove(node);
                    match stack.last_mut() {
                        Some(parent) => parent.best_child = parent.best_child.max(depth),
                        None => result = depth,
                    }
                }
            }
        }
        result
    }

    fn children_of(&self, node: &str) -> &[String] {
        self.edges.get(node).map(Vec::as_slice).unwrap_or(&[])
    }
}
