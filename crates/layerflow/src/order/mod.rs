//! Crossing minimization.
//!
//! Alternating up/down sweeps sort each layer by the weighted mean position
//! of its fixed neighbors, with subgraph constraints kept consistent across
//! layers. The best layering seen (by weighted crossing count) wins.

mod constraints;
mod cross_count;
mod init_order;
mod layer_graph;
pub mod mass;

pub use constraints::add_subgraph_constraints;
pub use cross_count::cross_count;
pub use init_order::init_order;
pub use layer_graph::build_layer_graph;
pub use mass::{masses, resolve_conflicts, sort, sort_subgraph, Conflict, Mass, NodeMass};

use crate::model::NodeLabel;
use crate::LayoutGraph;
use layerflow_graph::{Graph, GraphOptions};
use std::collections::BTreeMap;

/// Which fixed layer a sweep step reads while sorting a movable layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relationship {
    InLinks,
    OutLinks,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerGraphLabel {
    pub root: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WeightLabel {
    pub weight: f64,
}

/// Rank-local view used by one sweep step.
pub type LayerGraph = Graph<NodeLabel, WeightLabel, LayerGraphLabel>;

/// Accumulated subgraph ordering constraints, one link per decided pair.
pub type ConstraintGraph = Graph<(), (), ()>;

/// Assigns an `order` index within each rank, minimizing weighted link
/// crossings. Keeps sweeping until four rounds pass without improvement.
pub fn run(g: &mut LayoutGraph) {
    let mut max_rank: i32 = i32::MIN;
    let mut nodes_by_rank: BTreeMap<i32, Vec<String>> = BTreeMap::new();

    for v in g.node_ids() {
        let Some(node) = g.node(&v) else {
            continue;
        };
        if let Some(rank) = node.rank {
            max_rank = max_rank.max(rank);
            nodes_by_rank.entry(rank).or_default().push(v.clone());
        }
        // Subgraph roots take part in every rank their span covers.
        if let (Some(min_rank), Some(max_rank_node)) = (node.min_rank, node.max_rank) {
            for r in min_rank..=max_rank_node {
                if node.rank == Some(r) {
                    continue;
                }
                nodes_by_rank.entry(r).or_default().push(v.clone());
            }
        }
    }

    if max_rank == i32::MIN {
        return;
    }

    let layering = init_order(g);
    assign_order(g, &layering);

    let mut best_cc: f64 = f64::INFINITY;
    let mut best_layering: Option<Vec<Vec<String>>> = None;

    let mut i: usize = 0;
    let mut last_best: usize = 0;
    while last_best < 4 {
        let use_down = i % 2 == 1;
        let bias_right = i % 4 >= 2;

        if use_down {
            let ranks: Vec<i32> = (1..=max_rank).collect();
            sweep(g, &nodes_by_rank, &ranks, Relationship::InLinks, bias_right);
        } else {
            let ranks: Vec<i32> = (0..max_rank).rev().collect();
            sweep(g, &nodes_by_rank, &ranks, Relationship::OutLinks, bias_right);
        }

        let layering_now = ordered_layer_matrix(g, max_rank);
        let cc = cross_count(g, &layering_now);
        if cc < best_cc {
            last_best = 0;
            best_cc = cc;
            best_layering = Some(layering_now);
        }

        i += 1;
        last_best += 1;
    }

    if let Some(best) = best_layering {
        assign_order(g, &best);
    }
}

fn assign_order(g: &mut LayoutGraph, layering: &[Vec<String>]) {
    for layer in layering {
        for (i, v) in layer.iter().enumerate() {
            if let Some(node) = g.node_mut(v) {
                node.order = Some(i);
            }
        }
    }
}

fn sweep(
    g: &mut LayoutGraph,
    nodes_by_rank: &BTreeMap<i32, Vec<String>>,
    ranks: &[i32],
    relationship: Relationship,
    bias_right: bool,
) {
    let mut cg: ConstraintGraph = Graph::new(GraphOptions::default());

    for &rank in ranks {
        let nodes = nodes_by_rank
            .get(&rank)
            .map(|v| v.as_slice())
            .unwrap_or(&[]);
        let lg = build_layer_graph(g, rank, relationship, nodes);
        let root = lg.data().root.clone();

        let sorted = sort_subgraph(&lg, &root, &cg, bias_right);
        for (i, v) in sorted.vs.iter().enumerate() {
            if let Some(n) = g.node_mut(v) {
                n.order = Some(i);
            }
        }

        add_subgraph_constraints(&lg, &mut cg, &sorted.vs);
    }
}

/// Layer matrix over nodes that already carry both a rank and an order.
fn ordered_layer_matrix(g: &LayoutGraph, max_rank: i32) -> Vec<Vec<String>> {
    let mut layers: Vec<Vec<(usize, String)>> = vec![Vec::new(); (max_rank + 1).max(1) as usize];
    for v in g.node_ids() {
        let Some(node) = g.node(&v) else {
            continue;
        };
        let (Some(rank), Some(order)) = (node.rank, node.order) else {
            continue;
        };
        layers[rank.max(0) as usize].push((order, v));
    }
    let mut out: Vec<Vec<String>> = Vec::with_capacity(layers.len());
    for mut layer in layers {
        layer.sort_by_key(|(o, _)| *o);
        out.push(layer.into_iter().map(|(_, v)| v).collect());
    }
    out
}
