//! Rank-direction transforms.
//!
//! The pipeline always lays out top-to-bottom. For the other rank directions
//! node boxes are swapped before layout and coordinates mapped back after.

use crate::model::RankDir;
use crate::LayoutGraph;

pub fn adjust(g: &mut LayoutGraph) {
    match g.data().rankdir {
        RankDir::LR | RankDir::RL => swap_width_height(g),
        RankDir::TB | RankDir::BT => {}
    }
}

pub fn undo(g: &mut LayoutGraph) {
    match g.data().rankdir {
        RankDir::BT | RankDir::RL => reverse_y(g),
        RankDir::TB | RankDir::LR => {}
    }

    match g.data().rankdir {
        RankDir::LR | RankDir::RL => {
            swap_xy(g);
            swap_width_height(g);
        }
        RankDir::TB | RankDir::BT => {}
    }
}

fn swap_width_height(g: &mut LayoutGraph) {
    g.for_each_node_mut(|_id, n| {
        (n.width, n.height) = (n.height, n.width);
        // Self-loops stashed on the node ride along through the transform.
        for sl in &mut n.self_links {
            (sl.data.width, sl.data.height) = (sl.data.height, sl.data.width);
        }
    });
    g.for_each_link_mut(|_key, l| {
        (l.width, l.height) = (l.height, l.width);
    });
}

fn reverse_y(g: &mut LayoutGraph) {
    g.for_each_node_mut(|_id, n| {
        if let Some(y) = n.y {
            n.y = Some(-y);
        }
    });
    g.for_each_link_mut(|_key, l| {
        for p in &mut l.points {
            p.y = -p.y;
        }
        if let Some(y) = l.y {
            l.y = Some(-y);
        }
    });
}

fn swap_xy(g: &mut LayoutGraph) {
    g.for_each_node_mut(|_id, n| {
        if let (Some(x), Some(y)) = (n.x, n.y) {
            n.x = Some(y);
            n.y = Some(x);
        }
    });
    g.for_each_link_mut(|_key, l| {
        for p in &mut l.points {
            (p.x, p.y) = (p.y, p.x);
        }
        if let (Some(x), Some(y)) = (l.x, l.y) {
            l.x = Some(y);
            l.y = Some(x);
        }
    });
}
