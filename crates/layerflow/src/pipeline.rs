//! The layout pipeline.
//!
//! `layout` is the public entrypoint. It copies the caller's graph into a
//! working graph, runs the stage sequence there, and copies coordinates back,
//! so the caller never sees synthetic nodes or scratch state.

use crate::model::{Fake, LabelPos, LinkData, NodeLabel, Point, RankDir};
use crate::util::{self, Rect};
use crate::LayoutGraph;
use crate::{
    acyclic, border, coordinate, nesting, normalize, order, parent_chains, position, rank,
    self_loops,
};
use layerflow_graph::{Graph, GraphOptions};

/// Computes x/y for every node, bend points and label anchors for every link,
/// and the overall drawing size on the graph config.
pub fn layout(g: &mut LayoutGraph) {
    util::time("layout", || {
        let mut working = build_layout_graph(g);
        run_layout(&mut working);
        update_input_graph(g, &working);
    });
}

/// The working copy carries only the inputs the pipeline reads: node boxes,
/// link constraints and label boxes, and the parent forest. Everything else
/// starts from defaults.
fn build_layout_graph(g: &LayoutGraph) -> LayoutGraph {
    let mut working: LayoutGraph = Graph::new(GraphOptions {
        directed: true,
        multiple: true,
        compound: true,
    });

    let mut config = g.data().clone();
    config.width = 0.0;
    config.height = 0.0;
    config.chain_starts = Vec::new();
    config.nesting_root = None;
    config.node_rank_factor = None;
    working.set_data(config);

    for v in g.node_ids() {
        let Some(node) = g.node(&v) else {
            continue;
        };
        working.set_node(
            v.clone(),
            NodeLabel {
                width: node.width,
                height: node.height,
                ..Default::default()
            },
        );
        let parent = g.parent(&v).map(|p| p.to_string());
        let _ = working.set_parent(v, parent.as_deref());
    }

    g.for_each_link(|key, data| {
        working.set_link_named(
            key.n0.clone(),
            key.n1.clone(),
            key.name.clone(),
            Some(LinkData {
                minlen: data.minlen,
                weight: data.weight,
                width: data.width,
                height: data.height,
                labeloffset: data.labeloffset,
                labelpos: data.labelpos,
                ..Default::default()
            }),
        );
    });

    working
}

fn run_layout(g: &mut LayoutGraph) {
    make_space_for_link_labels(g);
    self_loops::remove_self_loops(g);
    util::time("acyclic", || acyclic::run(g));
    nesting::run(g);

    // Ranking runs on a leaf-only view; subgraph roots take no part in it.
    // The nesting border nodes are leaves, so they carry the compound
    // constraints into the flat graph.
    util::time("rank", || {
        let mut flat = util::as_non_compound_graph(g);
        rank::rank(&mut flat);
        for v in g.node_ids() {
            if !g.children(&v).is_empty() {
                continue;
            }
            let Some(r) = flat.node(&v).and_then(|n| n.rank) else {
                continue;
            };
            if let Some(n) = g.node_mut(&v) {
                n.rank = Some(r);
            }
        }
    });

    inject_link_label_proxies(g);
    util::remove_empty_ranks(g);
    nesting::cleanup(g);
    util::normalize_ranks(g);
    remove_link_label_proxies(g);
    assign_rank_min_max(g);

    normalize::run(g);
    parent_chains::parent_chains(g);
    border::add_border_segments(g);
    util::time("order", || order::run(g));

    coordinate::adjust(g);
    self_loops::insert_self_loops(g);
    util::time("position", || position::run(g));
    self_loops::position_self_loops(g);
    remove_border_nodes(g);

    normalize::undo(g);
    fixup_link_label_coords(g);
    coordinate::undo(g);
    translate_graph(g);
    assign_link_intersects(g);
    acyclic::undo(g);
}

/// Halves `ranksep` and doubles every `minlen` so each labeled link gets a
/// whole rank of its own for the label box. Side-positioned labels widen
/// their link on the cross axis instead.
fn make_space_for_link_labels(g: &mut LayoutGraph) {
    g.data_mut().ranksep /= 2.0;
    let rankdir = g.data().rankdir;
    g.for_each_link_mut(|_key, l| {
        l.minlen *= 2;
        if l.labelpos != LabelPos::C {
            match rankdir {
                RankDir::TB | RankDir::BT => l.width += l.labeloffset,
                RankDir::LR | RankDir::RL => l.height += l.labeloffset,
            }
        }
    });
}

/// Side-positioned labels were widened on the cross axis so ordering kept
/// room for them; shrink the box back and push the anchor off the path.
/// Runs before `coordinate::undo`, so `x`/`width` are still the cross axis
/// whatever the rankdir.
fn fixup_link_label_coords(g: &mut LayoutGraph) {
    g.for_each_link_mut(|_key, l| {
        let Some(x) = l.x else {
            return;
        };
        if matches!(l.labelpos, LabelPos::L | LabelPos::R) {
            l.width -= l.labeloffset;
        }
        match l.labelpos {
            LabelPos::L => l.x = Some(x - (l.width / 2.0 + l.labeloffset)),
            LabelPos::R => l.x = Some(x + (l.width / 2.0 + l.labeloffset)),
            LabelPos::C => {}
        }
    });
}

/// Plants a proxy node at the midpoint rank of every labeled link. The proxy
/// pins that rank through empty-rank removal, so the label lands on a rank
/// that still exists.
fn inject_link_label_proxies(g: &mut LayoutGraph) {
    let mut ids = util::FreshIds::default();
    for key in g.link_keys() {
        let Some(data) = g.link_by_key(&key) else {
            continue;
        };
        if data.width <= 0.0 || data.height <= 0.0 {
            continue;
        }
        let (Some(n0_rank), Some(n1_rank)) = (
            g.node(&key.n0).and_then(|n| n.rank),
            g.node(&key.n1).and_then(|n| n.rank),
        ) else {
            continue;
        };
        let rank = (n1_rank - n0_rank) / 2 + n0_rank;
        ids.add_fake_node(
            g,
            Fake::LinkProxy,
            NodeLabel {
                rank: Some(rank),
                link: Some(key.clone()),
                ..Default::default()
            },
            "_ep",
        );
    }
}

fn remove_link_label_proxies(g: &mut LayoutGraph) {
    for v in g.node_ids() {
        let Some(node) = g.node(&v) else {
            continue;
        };
        if node.fake != Some(Fake::LinkProxy) {
            continue;
        }
        let rank = node.rank;
        if let Some(key) = node.link.clone() {
            if let Some(l) = g.link_mut_by_key(&key) {
                l.label_rank = rank;
            }
        }
        let _ = g.del_node(&v);
    }
}

/// Copies each subgraph's rank span off its nesting border nodes. Ordering
/// and border segments read the span; the subgraph root itself stays
/// unranked.
fn assign_rank_min_max(g: &mut LayoutGraph) {
    for v in g.node_ids() {
        let Some(node) = g.node(&v) else {
            continue;
        };
        let (Some(bt), Some(bb)) = (node.border_top.clone(), node.border_bottom.clone()) else {
            continue;
        };
        let (Some(min_rank), Some(max_rank)) = (
            g.node(&bt).and_then(|n| n.rank),
            g.node(&bb).and_then(|n| n.rank),
        ) else {
            continue;
        };
        if let Some(n) = g.node_mut(&v) {
            n.min_rank = Some(min_rank);
            n.max_rank = Some(max_rank);
        }
    }
}

/// Reads each subgraph's geometry off its border nodes' extremes, then drops
/// every border fake from the graph.
fn remove_border_nodes(g: &mut LayoutGraph) {
    for v in g.node_ids() {
        if g.children(&v).is_empty() {
            continue;
        }
        let Some(node) = g.node(&v) else {
            continue;
        };
        let (Some(bt), Some(bb)) = (node.border_top.clone(), node.border_bottom.clone()) else {
            continue;
        };
        let bl = node.border_left.last().cloned().flatten();
        let br = node.border_right.last().cloned().flatten();
        let (Some(bl), Some(br)) = (bl, br) else {
            continue;
        };

        let (Some(ty), Some(by)) = (
            g.node(&bt).and_then(|n| n.y),
            g.node(&bb).and_then(|n| n.y),
        ) else {
            continue;
        };
        let (Some(lx), Some(rx)) = (
            g.node(&bl).and_then(|n| n.x),
            g.node(&br).and_then(|n| n.x),
        ) else {
            continue;
        };

        let width = (rx - lx).abs();
        let height = (by - ty).abs();
        if let Some(n) = g.node_mut(&v) {
            n.width = width;
            n.height = height;
            n.x = Some(lx + width / 2.0);
            n.y = Some(ty + height / 2.0);
        }
    }

    for v in g.node_ids() {
        if g.node(&v).map(|n| n.fake == Some(Fake::Border)).unwrap_or(false) {
            let _ = g.del_node(&v);
        }
    }
}

/// Shifts the drawing so its top-left corner sits at the configured margin
/// and records the bounding box on the graph config. Extremes come from node
/// boxes and link label boxes; interior bend points ride along but do not
/// grow the box.
fn translate_graph(g: &mut LayoutGraph) {
    let mut min_x: f64 = f64::INFINITY;
    let mut max_x: f64 = f64::NEG_INFINITY;
    let mut min_y: f64 = f64::INFINITY;
    let mut max_y: f64 = f64::NEG_INFINITY;

    g.for_each_node(|_id, n| {
        let (Some(x), Some(y)) = (n.x, n.y) else {
            return;
        };
        min_x = min_x.min(x - n.width / 2.0);
        max_x = max_x.max(x + n.width / 2.0);
        min_y = min_y.min(y - n.height / 2.0);
        max_y = max_y.max(y + n.height / 2.0);
    });
    g.for_each_link(|_key, l| {
        let (Some(x), Some(y)) = (l.x, l.y) else {
            return;
        };
        min_x = min_x.min(x - l.width / 2.0);
        max_x = max_x.max(x + l.width / 2.0);
        min_y = min_y.min(y - l.height / 2.0);
        max_y = max_y.max(y + l.height / 2.0);
    });

    if !min_x.is_finite() || !min_y.is_finite() {
        return;
    }

    min_x -= g.data().marginx;
    min_y -= g.data().marginy;

    g.for_each_node_mut(|_id, n| {
        if let Some(x) = n.x {
            n.x = Some(x - min_x);
        }
        if let Some(y) = n.y {
            n.y = Some(y - min_y);
        }
    });
    g.for_each_link_mut(|_key, l| {
        for p in &mut l.points {
            p.x -= min_x;
            p.y -= min_y;
        }
        if let Some(x) = l.x {
            l.x = Some(x - min_x);
        }
        if let Some(y) = l.y {
            l.y = Some(y - min_y);
        }
    });

    let config = g.data_mut();
    config.width = max_x - min_x + config.marginx;
    config.height = max_y - min_y + config.marginy;
}

/// Bookends each link's point list with the spots where it crosses its
/// endpoint node borders.
fn assign_link_intersects(g: &mut LayoutGraph) {
    for key in g.link_keys() {
        let Some(n0) = g.node(&key.n0) else {
            continue;
        };
        let Some(n1) = g.node(&key.n1) else {
            continue;
        };
        let n0_rect = Rect {
            x: n0.x.unwrap_or(0.0),
            y: n0.y.unwrap_or(0.0),
            width: n0.width,
            height: n0.height,
        };
        let n1_rect = Rect {
            x: n1.x.unwrap_or(0.0),
            y: n1.y.unwrap_or(0.0),
            width: n1.width,
            height: n1.height,
        };
        let n0_center = Point {
            x: n0_rect.x,
            y: n0_rect.y,
        };
        let n1_center = Point {
            x: n1_rect.x,
            y: n1_rect.y,
        };

        let Some(l) = g.link_mut_by_key(&key) else {
            continue;
        };
        let (p0, p1) = match (l.points.first(), l.points.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => (n1_center, n0_center),
        };
        l.points.insert(0, util::intersect_rect(n0_rect, p0));
        l.points.push(util::intersect_rect(n1_rect, p1));
    }
}

/// Copies results onto the caller's graph: node centers, compound node
/// geometry, link bend points and label anchors, and the drawing size.
fn update_input_graph(g: &mut LayoutGraph, working: &LayoutGraph) {
    for v in g.node_ids() {
        let Some(done) = working.node(&v) else {
            continue;
        };
        let is_subgraph = !g.children(&v).is_empty();
        if let Some(n) = g.node_mut(&v) {
            n.x = done.x;
            n.y = done.y;
            // Working ranks are doubled to reserve a rank per link label;
            // callers see the original scale.
            n.rank = done.rank.map(|r| r.div_euclid(2));
            n.order = done.order;
            if is_subgraph {
                n.width = done.width;
                n.height = done.height;
            }
        }
    }

    for key in g.link_keys() {
        let Some(done) = working.link_by_key(&key) else {
            continue;
        };
        if let Some(l) = g.link_mut_by_key(&key) {
            l.points = done.points.clone();
            l.x = done.x;
            l.y = done.y;
        }
    }

    let config = g.data_mut();
    config.width = working.data().width;
    config.height = working.data().height;
}
