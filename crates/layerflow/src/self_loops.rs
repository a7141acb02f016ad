//! Self-loop handling.
//!
//! Loops would make the rank constraints infeasible, so they are pulled onto
//! their node before ranking, re-inserted as anchor nodes right of the node
//! after ordering, and finally turned into a five-point bulge to the node's
//! right once coordinates exist.

use crate::model::{Fake, NodeLabel, Point};
use crate::util;
use crate::LayoutGraph;

pub fn remove_self_loops(g: &mut LayoutGraph) {
    for key in g.link_keys() {
        if key.n0 != key.n1 {
            continue;
        }
        let Some(data) = g.link_by_key(&key).cloned() else {
            continue;
        };
        if let Some(n) = g.node_mut(&key.n0) {
            n.self_links.push(crate::model::SelfLink {
                key: key.clone(),
                data,
            });
        }
        let _ = g.del_link_key(&key);
    }
}

/// Gives each stored loop an anchor node immediately to the right of its
/// node, shifting the order indices of everything after it in the layer.
pub fn insert_self_loops(g: &mut LayoutGraph) {
    let layering = util::build_layer_matrix(g);
    let mut ids = util::FreshIds::default();
    for layer in layering {
        let mut extra: usize = 0;
        for (idx, node_id) in layer.iter().enumerate() {
            let Some(rank) = g.node(node_id).and_then(|n| n.rank) else {
                continue;
            };

            if let Some(n) = g.node_mut(node_id) {
                n.order = Some(idx + extra);
            }

            let self_links = g
                .node(node_id)
                .map(|n| n.self_links.clone())
                .unwrap_or_default();
            if self_links.is_empty() {
                continue;
            }
            if let Some(n) = g.node_mut(node_id) {
                n.self_links.clear();
            }

            for sl in self_links {
                extra += 1;
                ids.add_fake_node(
                    g,
                    Fake::SelfLoop,
                    NodeLabel {
                        width: sl.data.width,
                        height: sl.data.height,
                        rank: Some(rank),
                        order: Some(idx + extra),
                        link: Some(sl.key.clone()),
                        link_data: Some(sl.data.clone()),
                        ..Default::default()
                    },
                    "_sl",
                );
            }
        }
    }
}

/// Replaces each anchor with the real loop link carrying bulge points.
pub fn position_self_loops(g: &mut LayoutGraph) {
    for id in g.node_ids() {
        let Some(node) = g.node(&id).cloned() else {
            continue;
        };
        if node.fake != Some(Fake::SelfLoop) {
            continue;
        }
        let (Some(x), Some(y)) = (node.x, node.y) else {
            continue;
        };
        let Some(key) = node.link.clone() else {
            continue;
        };
        let Some(mut data) = node.link_data.clone() else {
            continue;
        };
        let Some(n0_node) = g.node(&key.n0) else {
            continue;
        };
        let (Some(n0_x), Some(n0_y)) = (n0_node.x, n0_node.y) else {
            continue;
        };

        let right = n0_x + n0_node.width / 2.0;
        let mid_y = n0_y;
        let reach = x - right;
        let half_h = n0_node.height / 2.0;

        data.points = vec![
            Point {
                x: right + 2.0 * reach / 3.0,
                y: mid_y - half_h,
            },
            Point {
                x: right + 5.0 * reach / 6.0,
                y: mid_y - half_h,
            },
            Point {
                x: right + reach,
                y: mid_y,
            },
            Point {
                x: right + 5.0 * reach / 6.0,
                y: mid_y + half_h,
            },
            Point {
                x: right + 2.0 * reach / 3.0,
                y: mid_y + half_h,
            },
        ];
        data.x = Some(x);
        data.y = Some(y);

        g.set_link_named(key.n0.clone(), key.n1.clone(), key.name.clone(), Some(data));
        let _ = g.del_node(&id);
    }
}
