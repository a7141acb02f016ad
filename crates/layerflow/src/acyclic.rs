//! Cycle removal: reverse a feedback arc set so ranking sees a DAG.
//!
//! Reversed links remember their original identity (`forward_name`,
//! `reversed`) so `undo` can restore direction and flip the computed bend
//! points at the very end of the pipeline.

use crate::model::Acyclicer;
use crate::{greedy_fas, LayoutGraph};
use layerflow_graph::{Graph, LinkKey};
use std::collections::BTreeSet;

pub fn run(g: &mut LayoutGraph) {
    let fas = match g.data().acyclicer {
        Some(Acyclicer::Greedy) => greedy_fas::greedy_fas_with_weight(g, |data| {
            if !data.weight.is_finite() {
                return 0;
            }
            data.weight.round() as i64
        }),
        None => dfs_fas(g),
    };

    for key in fas.into_iter().filter(|k| k.n0 != k.n1) {
        let Some(mut data) = g.link_by_key(&key).cloned() else {
            continue;
        };
        let _ = g.del_link_key(&key);

        data.forward_name = key.name.clone();
        data.reversed = true;

        let name = unique_rev_name(g, &key.n1, &key.n0);
        g.set_link_named(key.n1, key.n0, Some(name), Some(data));
    }
}

pub fn undo(g: &mut LayoutGraph) {
    for key in g.link_keys() {
        let Some(mut data) = g.link_by_key(&key).cloned() else {
            continue;
        };
        if !data.reversed {
            continue;
        }
        let _ = g.del_link_key(&key);

        let forward_name = data.forward_name.take();
        data.reversed = false;
        data.points.reverse();
        g.set_link_named(key.n1, key.n0, forward_name, Some(data));
    }
}

fn unique_rev_name(g: &LayoutGraph, n0: &str, n1: &str) -> String {
    for i in 1usize.. {
        let candidate = format!("rev{i}");
        if !g.has_link(n0, n1, Some(&candidate)) {
            return candidate;
        }
    }
    unreachable!()
}

fn dfs_fas<G>(g: &Graph<crate::model::NodeLabel, crate::model::LinkData, G>) -> Vec<LinkKey>
where
    G: Default,
{
    fn dfs<N, E, G>(
        g: &Graph<N, E, G>,
        v: &str,
        visited: &mut BTreeSet<String>,
        stack: &mut BTreeSet<String>,
        fas: &mut Vec<LinkKey>,
    ) where
        N: Default + 'static,
        E: Default + 'static,
        G: Default,
    {
        if !visited.insert(v.to_string()) {
            return;
        }
        stack.insert(v.to_string());
        for key in g.out_links(v, None) {
            if key.n0 == key.n1 {
                continue;
            }
            if stack.contains(&key.n1) {
                fas.push(key);
            } else {
                dfs(g, &key.n1, visited, stack, fas);
            }
        }
        stack.remove(v);
    }

    let mut fas: Vec<LinkKey> = Vec::new();
    let mut stack: BTreeSet<String> = BTreeSet::new();
    let mut visited: BTreeSet<String> = BTreeSet::new();
    // Insertion order makes the choice of back edges deterministic.
    for v in g.nodes() {
        dfs(g, v, &mut visited, &mut stack, &mut fas);
    }
    fas
}
