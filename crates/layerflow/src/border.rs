//! Per-rank border segments for compound graphs.
//!
//! Each subgraph gets a left and right border node on every rank it spans,
//! chained vertically, so ordering and positioning route links around the
//! subgraph instead of through it.

use crate::model::{Fake, LinkData, NodeLabel, Side};
use crate::util::FreshIds;
use crate::LayoutGraph;

pub fn add_border_segments(g: &mut LayoutGraph) {
    if !g.options().compound {
        return;
    }

    fn dfs(g: &mut LayoutGraph, ids: &mut FreshIds, v: &str) {
        let children: Vec<String> = g.children(v).into_iter().map(|s| s.to_string()).collect();
        for c in children {
            dfs(g, ids, &c);
        }

        let Some((min_rank, max_rank)) = g.node(v).and_then(|n| Some((n.min_rank?, n.max_rank?)))
        else {
            return;
        };

        let max_rank_usize: usize = max_rank.max(0) as usize;
        if let Some(n) = g.node_mut(v) {
            n.border_left = vec![None; max_rank_usize + 1];
            n.border_right = vec![None; max_rank_usize + 1];
        }

        for rank in min_rank..=max_rank {
            add_border_node(g, ids, Side::Left, "_bl", v, rank);
            add_border_node(g, ids, Side::Right, "_br", v, rank);
        }
    }

    let mut ids = FreshIds::default();
    let roots: Vec<String> = g
        .children_root()
        .into_iter()
        .map(|s| s.to_string())
        .collect();
    for v in roots {
        dfs(g, &mut ids, &v);
    }
}

fn add_border_node(
    g: &mut LayoutGraph,
    ids: &mut FreshIds,
    side: Side,
    prefix: &str,
    sg: &str,
    rank: i32,
) {
    let prev = g
        .node(sg)
        .and_then(|n| {
            let idx = (rank - 1) as usize;
            match side {
                Side::Left => n.border_left.get(idx).and_then(|v| v.clone()),
                Side::Right => n.border_right.get(idx).and_then(|v| v.clone()),
            }
        })
        .unwrap_or_default();

    let curr = ids.add_fake_node(
        g,
        Fake::Border,
        NodeLabel {
            width: 0.0,
            height: 0.0,
            rank: Some(rank),
            border_side: Some(side),
            ..Default::default()
        },
        prefix,
    );

    if let Some(n) = g.node_mut(sg) {
        let idx = rank.max(0) as usize;
        let list = match side {
            Side::Left => &mut n.border_left,
            Side::Right => &mut n.border_right,
        };
        if idx >= list.len() {
            list.resize(idx + 1, None);
        }
        list[idx] = Some(curr.clone());
    }

    let _ = g.set_parent(curr.clone(), Some(sg));
    if !prev.is_empty() {
        g.set_link_with_data(
            prev,
            curr,
            LinkData {
                weight: 1.0,
                ..Default::default()
            },
        );
    }
}
