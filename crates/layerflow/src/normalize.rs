//! Virtual-chain normalization.
//!
//! Links spanning more than one rank are split into chains of rank-adjacent
//! hops through zero-size chain nodes; the hop at a link's `label_rank` takes
//! the label's box. `undo` collapses each chain back into the original link,
//! harvesting the chain nodes' coordinates as bend points.

use crate::model::{Fake, LinkData, NodeLabel, Point};
use crate::util::FreshIds;
use crate::LayoutGraph;
use layerflow_graph::LinkKey;

pub fn run(g: &mut LayoutGraph) {
    g.data_mut().chain_starts.clear();
    let mut ids = FreshIds::default();
    for key in g.link_keys() {
        normalize_link(g, &mut ids, key);
    }
}

fn normalize_link(g: &mut LayoutGraph, ids: &mut FreshIds, key: LinkKey) {
    let n0_rank = g.node(&key.n0).and_then(|n| n.rank).unwrap_or(0);
    let n1_rank = g.node(&key.n1).and_then(|n| n.rank).unwrap_or(0);
    let Some(mut data) = g.link_by_key(&key).cloned() else {
        return;
    };
    let label_rank = data.label_rank;

    if n1_rank == n0_rank + 1 {
        return;
    }

    let _ = g.del_link_key(&key);

    data.points.clear();

    let mut prev = key.n0.clone();
    let mut first_hop: Option<String> = None;

    for r in (n0_rank + 1)..n1_rank {
        let hop = ids.add_fake_node(
            g,
            Fake::Chain,
            NodeLabel {
                width: 0.0,
                height: 0.0,
                rank: Some(r),
                link: Some(key.clone()),
                link_data: Some(data.clone()),
                ..Default::default()
            },
            "_c",
        );

        if first_hop.is_none() {
            first_hop = Some(hop.clone());
            g.data_mut().chain_starts.push(hop.clone());
        }

        if label_rank == Some(r) {
            if let Some(n) = g.node_mut(&hop) {
                n.width = data.width;
                n.height = data.height;
                n.fake = Some(Fake::ChainLabel);
                n.labelpos = Some(data.labelpos);
            }
        }

        g.set_link_named(
            prev.clone(),
            hop.clone(),
            key.name.clone(),
            Some(LinkData {
                weight: data.weight,
                ..Default::default()
            }),
        );
        prev = hop;
    }

    g.set_link_named(
        prev,
        key.n1.clone(),
        key.name.clone(),
        Some(LinkData {
            weight: data.weight,
            ..Default::default()
        }),
    );
}

pub fn undo(g: &mut LayoutGraph) {
    let chains = g.data().chain_starts.clone();
    for start in chains {
        let Some(start_node) = g.node(&start) else {
            continue;
        };
        let Some(mut data) = start_node.link_data.clone() else {
            continue;
        };
        let Some(key) = start_node.link.clone() else {
            continue;
        };

        let mut v = start.clone();
        while let Some(node) = g.node(&v) {
            if node.fake.is_none() {
                break;
            }
            let next = g.first_successor(&v).map(|s| s.to_string());

            if let (Some(x), Some(y)) = (node.x, node.y) {
                data.points.push(Point { x, y });
                if node.fake == Some(Fake::ChainLabel) {
                    data.x = Some(x);
                    data.y = Some(y);
                    data.width = node.width;
                    data.height = node.height;
                }
            }

            let _ = g.del_node(&v);
            match next {
                Some(next) => v = next,
                None => break,
            }
        }

        g.set_link_key(key, data);
    }
}
