//! Greedy feedback arc set selection, used when `acyclicer = greedy`.
//!
//! Eades-Lin-Smyth style: repeatedly drain sinks and sources, then remove the
//! node with the largest out-minus-in weight, collecting its remaining
//! incoming links as the arcs to reverse.

use layerflow_graph::{Graph, LinkKey};
use rustc_hash::FxHashMap;
use std::collections::{hash_map::Entry, VecDeque};

pub fn greedy_fas<N, E, G>(g: &Graph<N, E, G>) -> Vec<LinkKey>
where
    N: Default + 'static,
    E: Default + 'static,
    G: Default,
{
    greedy_fas_with_weight(g, |_| 1)
}

pub fn greedy_fas_with_weight<N, E, G>(
    g: &Graph<N, E, G>,
    weight_fn: impl Fn(&E) -> i64,
) -> Vec<LinkKey>
where
    N: Default + 'static,
    E: Default + 'static,
    G: Default,
{
    let ids = g.node_ids();
    if ids.len() <= 1 {
        return Vec::new();
    }

    let index: FxHashMap<&str, usize> = ids
        .iter()
        .enumerate()
        .map(|(i, v)| (v.as_str(), i))
        .collect();
    let mut nodes: Vec<NodeState> = ids.iter().map(|_| NodeState::default()).collect();

    // Collapse parallel links into one weighted arc per node pair. Arcs keep
    // first-occurrence order and nodes keep insertion order, so the whole
    // selection depends only on graph content.
    let mut arcs: Vec<(usize, usize, i64)> = Vec::new();
    let mut arc_at: FxHashMap<(usize, usize), usize> = FxHashMap::default();
    let mut max_in: i64 = 0;
    let mut max_out: i64 = 0;
    for key in g.links() {
        let w = g.link_by_key(key).map(&weight_fn).unwrap_or(1);
        let (Some(&u), Some(&v)) = (index.get(key.n0.as_str()), index.get(key.n1.as_str())) else {
            continue;
        };
        match arc_at.entry((u, v)) {
            Entry::Vacant(slot) => {
                slot.insert(arcs.len());
                arcs.push((u, v, w));
            }
            Entry::Occupied(slot) => arcs[*slot.get()].2 += w,
        }
        nodes[u].out_w += w;
        max_out = max_out.max(nodes[u].out_w);
        nodes[v].in_w += w;
        max_in = max_in.max(nodes[v].in_w);
    }
    for &(u, v, w) in &arcs {
        nodes[u].outs.push((v, w));
        nodes[v].ins.push((u, w));
    }

    let bucket_len = (max_out + max_in + 3).max(3) as usize;
    let live = nodes.len();
    let mut sel = Selector {
        nodes,
        buckets: vec![VecDeque::new(); bucket_len],
        zero: max_in + 1,
        live,
    };
    for v in 0..sel.nodes.len() {
        sel.place(v);
    }

    let mut pairs: Vec<(usize, usize)> = Vec::new();
    while sel.live > 0 {
        // Sinks first (out weight 0).
        while let Some(v) = sel.pop(0) {
            sel.remove(v, None);
        }

        // Then sources (in weight 0).
        let top = sel.buckets.len() - 1;
        while let Some(v) = sel.pop(top) {
            sel.remove(v, None);
        }
        if sel.live == 0 {
            break;
        }

        let mut picked: Option<usize> = None;
        for i in (1..top).rev() {
            if let Some(v) = sel.pop(i) {
                picked = Some(v);
                break;
            }
        }
        match picked {
            Some(v) => sel.remove(v, Some(&mut pairs)),
            None => {
                // Nothing valid left in any bucket; drop the first live node
                // so the loop always terminates.
                let Some(v) = sel.nodes.iter().position(|n| n.alive) else {
                    break;
                };
                sel.remove(v, None);
            }
        }
    }

    // Expand aggregated arcs back to the concrete links between the pair.
    let mut out: Vec<LinkKey> = Vec::new();
    for (u, v) in pairs {
        out.extend(g.out_links(&ids[u], Some(&ids[v])));
    }
    out
}

struct NodeState {
    in_w: i64,
    out_w: i64,
    ins: Vec<(usize, i64)>,
    outs: Vec<(usize, i64)>,
    alive: bool,
    bucket: usize,
}

impl Default for NodeState {
    fn default() -> Self {
        Self {
            in_w: 0,
            out_w: 0,
            ins: Vec::new(),
            outs: Vec::new(),
            alive: true,
            bucket: 0,
        }
    }
}

/// Bucket queue over out-minus-in weight. Bucket 0 holds sinks, the last
/// bucket holds sources, and `zero` offsets the signed difference into the
/// middle range. Entries go stale when a node moves or dies; `pop` discards
/// them lazily.
struct Selector {
    nodes: Vec<NodeState>,
    buckets: Vec<VecDeque<usize>>,
    zero: i64,
    live: usize,
}

impl Selector {
    fn place(&mut self, v: usize) {
        let n = &self.nodes[v];
        let idx = if n.out_w == 0 {
            0
        } else if n.in_w == 0 {
            self.buckets.len() - 1
        } else {
            let raw = n.out_w - n.in_w + self.zero;
            raw.clamp(0, (self.buckets.len() - 1) as i64) as usize
        };
        self.nodes[v].bucket = idx;
        self.buckets[idx].push_front(v);
    }

    fn pop(&mut self, idx: usize) -> Option<usize> {
        while let Some(v) = self.buckets[idx].pop_back() {
            if self.nodes[v].alive && self.nodes[v].bucket == idx {
                return Some(v);
            }
        }
        None
    }

    /// Kills `v` and re-buckets its live neighbors. With `collect` set, the
    /// still-live predecessors are recorded as feedback arcs; a self loop is
    /// never recorded because `v` is already dead when its arcs are walked.
    fn remove(&mut self, v: usize, mut collect: Option<&mut Vec<(usize, usize)>>) {
        if !self.nodes[v].alive {
            return;
        }
        self.nodes[v].alive = false;
        self.live -= 1;

        let ins = std::mem::take(&mut self.nodes[v].ins);
        for &(u, w) in &ins {
            if !self.nodes[u].alive {
                continue;
            }
            if let Some(pairs) = collect.as_deref_mut() {
                pairs.push((u, v));
            }
            self.nodes[u].out_w -= w;
            self.place(u);
        }

        let outs = std::mem::take(&mut self.nodes[v].outs);
        for &(t, w) in &outs {
            if !self.nodes[t].alive {
                continue;
            }
            self.nodes[t].in_w -= w;
            self.place(t);
        }
    }
}
