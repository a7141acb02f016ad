//! Shared helpers for the layout stages.
//!
//! Degenerate inputs (zero-size nodes, coincident points) get best-effort
//! deterministic results instead of panics so downstream renderers keep
//! working.

use crate::model::{Fake, LinkData, NodeLabel, Point};
use crate::LayoutGraph;
use layerflow_graph::{Graph, GraphOptions};
use std::collections::BTreeMap;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Collapses parallel links and drops the compound structure: weights are
/// summed, minlens maxed. Ranking only cares about the aggregate constraint
/// per ordered node pair.
pub fn simplify(g: &LayoutGraph) -> LayoutGraph {
    let mut simplified: LayoutGraph = Graph::new(GraphOptions::default());
    simplified.set_data(g.data().clone());

    for v in g.node_ids() {
        if let Some(label) = g.node(&v) {
            simplified.set_node(v, label.clone());
        }
    }

    let mut merged: BTreeMap<(String, String), (f64, usize)> = BTreeMap::new();
    g.for_each_link(|key, data| {
        let entry = merged
            .entry((key.n0.clone(), key.n1.clone()))
            .or_insert((0.0, 1));
        entry.0 += data.weight;
        entry.1 = entry.1.max(data.minlen.max(1));
    });

    for ((n0, n1), (weight, minlen)) in merged {
        simplified.set_link_with_data(
            n0,
            n1,
            LinkData {
                weight,
                minlen,
                ..Default::default()
            },
        );
    }

    simplified
}

/// Leaf-only view of a compound graph: subgraph roots are dropped, links are
/// kept as-is.
pub fn as_non_compound_graph(g: &LayoutGraph) -> LayoutGraph {
    let mut flat: LayoutGraph = Graph::new(GraphOptions {
        multiple: g.options().multiple,
        compound: false,
        ..Default::default()
    });
    flat.set_data(g.data().clone());

    for v in g.node_ids() {
        if g.children(&v).is_empty() {
            if let Some(label) = g.node(&v) {
                flat.set_node(v, label.clone());
            }
        }
    }

    g.for_each_link(|key, data| {
        flat.set_link_named(
            key.n0.clone(),
            key.n1.clone(),
            key.name.clone(),
            Some(data.clone()),
        );
    });

    flat
}

/// Point where the ray from `rect`'s center to `point` crosses the rect
/// boundary.
pub fn intersect_rect(rect: Rect, point: Point) -> Point {
    let x = rect.x;
    let y = rect.y;

    let dx = point.x - x;
    let dy = point.y - y;
    let mut w = rect.width / 2.0;
    let mut h = rect.height / 2.0;

    if dx == 0.0 && dy == 0.0 {
        // No direction to intersect along; pick the right edge so the result
        // stays deterministic.
        tracing::warn!("link endpoint coincides with node center, snapping to boundary");
        return Point { x: x + w, y };
    }

    let (sx, sy) = if dy.abs() * w > dx.abs() * h {
        if dy < 0.0 {
            h = -h;
        }
        (h * dx / dy, h)
    } else {
        if dx < 0.0 {
            w = -w;
        }
        (w, w * dy / dx)
    };

    Point {
        x: x + sx,
        y: y + sy,
    }
}

/// Ranked nodes as rows (rank ascending), each row sorted by order index.
pub fn build_layer_matrix(g: &LayoutGraph) -> Vec<Vec<String>> {
    let mut min_rank: i32 = i32::MAX;
    let mut max_rank: i32 = i32::MIN;
    let mut entries: Vec<(i32, usize, String)> = Vec::new();

    for id in g.nodes() {
        let Some(node) = g.node(id) else {
            continue;
        };
        let Some(rank) = node.rank else {
            continue;
        };
        min_rank = min_rank.min(rank);
        max_rank = max_rank.max(rank);
        entries.push((rank, node.order.unwrap_or(0), id.to_string()));
    }

    if max_rank == i32::MIN {
        return Vec::new();
    }

    let shift = if min_rank < 0 { -min_rank } else { 0 };
    let len = (max_rank + shift + 1).max(0) as usize;
    let mut layers: Vec<Vec<(usize, String)>> = vec![Vec::new(); len];

    for (rank, order, id) in entries {
        let idx = (rank + shift).max(0) as usize;
        if idx < layers.len() {
            layers[idx].push((order, id));
        }
    }

    layers
        .into_iter()
        .map(|mut layer| {
            layer.sort_by_key(|(o, _)| *o);
            layer.into_iter().map(|(_, id)| id).collect()
        })
        .collect()
}

/// Shifts all ranks so the smallest becomes 0.
pub fn normalize_ranks(g: &mut LayoutGraph) {
    let mut min_rank: i32 = i32::MAX;
    g.for_each_node(|_id, n| {
        if let Some(rank) = n.rank {
            min_rank = min_rank.min(rank);
        }
    });
    if min_rank == i32::MAX {
        return;
    }
    g.for_each_node_mut(|_id, n| {
        if let Some(rank) = n.rank {
            n.rank = Some(rank - min_rank);
        }
    });
}

/// Closes gaps left by rank levels holding no nodes. With a nesting factor
/// set (compound layouts), levels at multiples of the factor are preserved
/// even when empty: the nesting step reserved them for subgraph borders.
pub fn remove_empty_ranks(g: &mut LayoutGraph) {
    let factor = g.data().node_rank_factor.unwrap_or(0);

    let mut offset: i32 = i32::MAX;
    g.for_each_node(|_id, n| {
        if let Some(rank) = n.rank {
            offset = offset.min(rank);
        }
    });
    if offset == i32::MAX {
        return;
    }

    let mut max_idx: usize = 0;
    let mut layers: BTreeMap<usize, Vec<String>> = BTreeMap::new();
    g.for_each_node(|id, n| {
        let Some(rank) = n.rank else {
            return;
        };
        let idx = (rank - offset).max(0) as usize;
        max_idx = max_idx.max(idx);
        layers.entry(idx).or_default().push(id.to_string());
    });

    let mut delta: i32 = 0;
    for i in 0..=max_idx {
        if !layers.contains_key(&i) && (factor == 0 || i % factor != 0) {
            delta -= 1;
            continue;
        }
        if delta == 0 {
            continue;
        }
        if let Some(vs) = layers.get(&i) {
            for v in vs {
                if let Some(n) = g.node_mut(v) {
                    if let Some(rank) = n.rank {
                        n.rank = Some(rank + delta);
                    }
                }
            }
        }
    }
}

/// Synthesizes a node id that does not collide with anything in the graph.
/// Derived by scanning existing ids, so re-running a stage on an equivalent
/// graph yields the same names (no ambient counters).
pub fn fresh_node_id<N, E, G>(g: &Graph<N, E, G>, prefix: &str) -> String
where
    N: Default + 'static,
    E: Default + 'static,
    G: Default,
{
    let mut next: u64 = 0;
    for id in g.nodes() {
        if let Some(rest) = id.strip_prefix(prefix) {
            if let Ok(n) = rest.parse::<u64>() {
                next = next.max(n + 1);
            }
        }
    }
    format!("{prefix}{next}")
}

/// Allocator for batches of synthetic ids. Seeds each prefix by scanning the
/// graph once, then counts up, so names depend only on graph content.
#[derive(Default)]
pub struct FreshIds {
    next: rustc_hash::FxHashMap<String, u64>,
}

impl FreshIds {
    pub fn add_fake_node(
        &mut self,
        g: &mut LayoutGraph,
        fake: Fake,
        mut label: NodeLabel,
        prefix: &str,
    ) -> String {
        let next = self.next.entry(prefix.to_string()).or_insert_with(|| {
            let seed = fresh_node_id(g, prefix);
            seed[prefix.len()..].parse::<u64>().unwrap_or(0)
        });
        let mut id = format!("{prefix}{next}");
        while g.has_node(&id) {
            *next += 1;
            id = format!("{prefix}{next}");
        }
        *next += 1;
        label.fake = Some(fake);
        g.set_node(id.clone(), label);
        id
    }
}

/// Runs a pipeline stage and records its wall time at debug level.
pub fn time<T>(name: &'static str, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let out = f();
    tracing::debug!(
        stage = name,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "stage finished"
    );
    out
}
