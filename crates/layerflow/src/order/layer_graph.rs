//! Materializes the rank-local graph one sweep step sorts.

use super::{LayerGraph, LayerGraphLabel, Relationship, WeightLabel};
use crate::model::NodeLabel;
use crate::util::fresh_node_id;
use crate::LayoutGraph;
use layerflow_graph::{Graph, GraphOptions};

/// Builds the movable view of rank `r`: the nodes on that rank (plus subgraph
/// roots whose span covers it), their compound parents collapsed onto a fresh
/// root, and links to the fixed neighbor layer aggregated by weight. Out-links
/// are reversed so mass computation always reads in-links.
pub fn build_layer_graph(
    g: &LayoutGraph,
    rank: i32,
    relationship: Relationship,
    nodes_with_rank: &[String],
) -> LayerGraph {
    let root = fresh_node_id(g, "_root");
    let mut result: LayerGraph = Graph::new(GraphOptions {
        compound: true,
        multiple: false,
        ..Default::default()
    });
    result.set_data(LayerGraphLabel { root: root.clone() });
    result.set_node(root.clone(), NodeLabel::default());

    for v in nodes_with_rank {
        let Some(node) = g.node(v) else {
            continue;
        };
        let node = node.clone();
        let parent = g.parent(v).map(|p| p.to_string());

        result.set_node(v.clone(), node.clone());
        let _ = result.set_parent(v.clone(), Some(parent.as_deref().unwrap_or(&root)));

        let mut add_link = |fixed: &str, weight: f64| {
            if !result.has_node(fixed) {
                let label = g.node(fixed).cloned().unwrap_or_default();
                result.set_node(fixed.to_string(), label);
            }
            let existing = result
                .link(fixed, v, None)
                .map(|l| l.weight)
                .unwrap_or(0.0);
            result.set_link_with_data(
                fixed.to_string(),
                v.clone(),
                WeightLabel {
                    weight: weight + existing,
                },
            );
        };

        match relationship {
            Relationship::InLinks => {
                g.for_each_in_link(v, None, |key, data| add_link(&key.n0, data.weight));
            }
            Relationship::OutLinks => {
                g.for_each_out_link(v, None, |key, data| add_link(&key.n1, data.weight));
            }
        }

        // Subgraph roots appear with just the border pair for this rank; the
        // rest of their label would confuse the recursive sort.
        if node.min_rank.is_some() {
            let slice = rank.max(0) as usize;
            result.set_node(
                v.clone(),
                NodeLabel {
                    border_left: vec![node.border_left.get(slice).cloned().flatten()],
                    border_right: vec![node.border_right.get(slice).cloned().flatten()],
                    ..Default::default()
                },
            );
        }
    }

    result
}
