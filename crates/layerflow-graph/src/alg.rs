//! Traversal helpers shared by the layout stages.

use crate::graph::Graph;
use std::collections::{BTreeSet, VecDeque};

/// Weakly connected components, each in BFS discovery order. Component order
/// follows node insertion order, so the result is deterministic.
pub fn components<N, E, G>(g: &Graph<N, E, G>) -> Vec<Vec<String>>
where
    N: Default + 'static,
    E: Default + 'static,
    G: Default,
{
    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut out: Vec<Vec<String>> = Vec::new();

    for start in g.node_ids() {
        if !seen.insert(start.clone()) {
            continue;
        }
        let mut comp: Vec<String> = Vec::new();
        let mut q: VecDeque<String> = VecDeque::new();
        q.push_back(start);
        while let Some(v) = q.pop_front() {
            for n in g.successors(&v).into_iter().chain(g.predecessors(&v)) {
                if seen.insert(n.to_string()) {
                    q.push_back(n.to_string());
                }
            }
            comp.push(v);
        }
        out.push(comp);
    }

    out
}
