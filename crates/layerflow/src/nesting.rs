//! Nesting graph construction for compound inputs.
//!
//! Adds a synthetic root, a top and bottom border node per subgraph, and
//! nesting links with scaled minlens so the ranker keeps every subgraph's
//! children strictly between its borders. `cleanup` removes all of it once
//! ranks are assigned.

use crate::model::{Fake, LinkData, NodeLabel};
use crate::util::FreshIds;
use crate::LayoutGraph;
use layerflow_graph::alg;
use std::collections::BTreeMap;

fn add_border_node(g: &mut LayoutGraph, ids: &mut FreshIds, prefix: &str) -> String {
    ids.add_fake_node(
        g,
        Fake::Border,
        NodeLabel {
            width: 0.0,
            height: 0.0,
            ..Default::default()
        },
        prefix,
    )
}

fn tree_depths(g: &LayoutGraph) -> BTreeMap<String, usize> {
    fn dfs(g: &LayoutGraph, v: &str, depth: usize, out: &mut BTreeMap<String, usize>) {
        for child in g.children_iter(v) {
            dfs(g, child, depth + 1, out);
        }
        out.insert(v.to_string(), depth);
    }

    let mut out: BTreeMap<String, usize> = BTreeMap::new();
    for v in g.children_root() {
        dfs(g, v, 1, &mut out);
    }
    out
}

fn sum_weights(g: &LayoutGraph) -> f64 {
    let mut out: f64 = 0.0;
    g.for_each_link(|_k, data| out += data.weight);
    out
}

#[allow(clippy::too_many_arguments)]
fn dfs(
    g: &mut LayoutGraph,
    root: &str,
    node_sep: usize,
    weight: f64,
    height: usize,
    depths: &BTreeMap<String, usize>,
    ids: &mut FreshIds,
    v: &str,
) {
    let children: Vec<String> = g.children_iter(v).map(|s| s.to_string()).collect();
    if children.is_empty() {
        if v != root {
            g.set_link_with_data(
                root,
                v,
                LinkData {
                    weight: 0.0,
                    minlen: node_sep,
                    ..Default::default()
                },
            );
        }
        return;
    }

    let top = add_border_node(g, ids, "_bt");
    let bottom = add_border_node(g, ids, "_bb");

    let _ = g.set_parent(top.as_str(), Some(v));
    if let Some(label) = g.node_mut(v) {
        label.border_top = Some(top.clone());
    }
    let _ = g.set_parent(bottom.as_str(), Some(v));
    if let Some(label) = g.node_mut(v) {
        label.border_bottom = Some(bottom.clone());
    }

    for child in children {
        dfs(g, root, node_sep, weight, height, depths, ids, &child);

        let child_node = g.node(&child).cloned().unwrap_or_default();
        let child_top = child_node
            .border_top
            .as_deref()
            .unwrap_or(&child)
            .to_string();
        let child_bottom = child_node
            .border_bottom
            .as_deref()
            .unwrap_or(&child)
            .to_string();
        // Leaf children get double weight so subgraphs hug their contents.
        let this_weight = if child_node.border_top.is_some() {
            weight
        } else {
            2.0 * weight
        };
        let minlen = if child_top != child_bottom {
            1usize
        } else {
            let dv = depths.get(v).copied().unwrap_or(1);
            height.saturating_sub(dv).saturating_add(1)
        };

        g.set_link_with_data(
            top.clone(),
            child_top.clone(),
            LinkData {
                weight: this_weight,
                minlen,
                nesting: true,
                ..Default::default()
            },
        );
        g.set_link_with_data(
            child_bottom.clone(),
            bottom.clone(),
            LinkData {
                weight: this_weight,
                minlen,
                nesting: true,
                ..Default::default()
            },
        );
    }

    if g.parent(v).is_none() {
        let dv = depths.get(v).copied().unwrap_or(1);
        g.set_link_with_data(
            root,
            top,
            LinkData {
                weight: 0.0,
                minlen: height + dv,
                nesting: true,
                ..Default::default()
            },
        );
    }
}

pub fn run(g: &mut LayoutGraph) {
    let mut ids = FreshIds::default();
    let root = ids.add_fake_node(g, Fake::Root, NodeLabel::default(), "_root");

    let depths = tree_depths(g);
    let height = depths
        .values()
        .copied()
        .max()
        .unwrap_or(1)
        .saturating_sub(1);
    let node_sep = 2 * height + 1;

    g.data_mut().nesting_root = Some(root.clone());

    // Reserve rank room between every pair of real ranks for border nodes.
    g.for_each_link_mut(|_k, data| {
        data.minlen *= node_sep.max(1);
    });

    let weight = sum_weights(g) + 1.0;

    let children = g
        .children_root()
        .into_iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>();
    for child in children {
        dfs(g, &root, node_sep, weight, height, &depths, &mut ids, &child);
    }

    g.data_mut().node_rank_factor = Some(node_sep);

    // Ranking requires a connected graph. Links incident on subgraph roots
    // can leave components the nesting links alone do not reach; hook those
    // up through the root with the same scaled minlen.
    let comps = alg::components(g);
    if comps.len() > 1 {
        for comp in comps {
            if comp.iter().any(|v| v == &root) {
                continue;
            }
            let Some(v) = comp.first() else {
                continue;
            };
            if g.link(&root, v, None).is_some() {
                continue;
            }
            g.set_link_with_data(
                root.clone(),
                v.clone(),
                LinkData {
                    weight: 0.0,
                    minlen: node_sep.max(1),
                    nesting: true,
                    ..Default::default()
                },
            );
        }
    }
}

pub fn cleanup(g: &mut LayoutGraph) {
    if let Some(root) = g.data_mut().nesting_root.take() {
        let _ = g.del_node(&root);
    }

    let mut to_remove = Vec::new();
    g.for_each_link(|k, data| {
        if data.nesting {
            to_remove.push(k.clone());
        }
    });
    for k in to_remove {
        let _ = g.del_link_key(&k);
    }
}
