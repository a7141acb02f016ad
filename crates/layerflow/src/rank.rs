//! Rank assignment.
//!
//! Every link `(u, v)` must satisfy `rank(v) - rank(u) >= minlen`; subject to
//! that, the default ranker keeps total weighted link span small by seeding
//! with longest-path ranks and tightening them along a feasible spanning
//! tree. Rankers run on a simplified copy (parallel links collapsed, compound
//! structure dropped) and write ranks back through it.

use crate::model::Ranker;
use crate::util::simplify;
use crate::LayoutGraph;

pub fn rank(g: &mut LayoutGraph) {
    let ranker = g.data().ranker;
    if ranker == Ranker::None {
        return;
    }

    let mut s = simplify(g);
    match ranker {
        Ranker::TightTree => {
            util::longest_path(&mut s);
            feasible_tree::feasible_tree(&mut s);
        }
        Ranker::LongestPath => util::longest_path(&mut s),
        Ranker::None => unreachable!(),
    }

    for id in s.node_ids() {
        let rank = s.node(&id).and_then(|n| n.rank);
        if let Some(n) = g.node_mut(&id) {
            n.rank = rank;
        }
    }
}

pub mod util {
    use crate::LayoutGraph;
    use layerflow_graph::LinkKey;
    use rustc_hash::FxHashMap as HashMap;

    /// Seeds ranks by pushing every node as high as its outgoing constraints
    /// allow; sinks land on rank 0, sources go negative.
    pub fn longest_path(g: &mut LayoutGraph) {
        fn dfs(v: &str, g: &mut LayoutGraph, visited: &mut HashMap<String, i32>) -> i32 {
            if let Some(&rank) = visited.get(v) {
                return rank;
            }

            let mut rank: Option<i32> = None;
            for key in g.out_links(v, None) {
                let minlen: i32 = g.link_by_key(&key).map(|d| d.minlen as i32).unwrap_or(1);
                let candidate = dfs(&key.n1, g, visited) - minlen;
                rank = Some(match rank {
                    Some(current) => current.min(candidate),
                    None => candidate,
                });
            }

            let rank = rank.unwrap_or(0);
            if let Some(label) = g.node_mut(v) {
                label.rank = Some(rank);
            }
            visited.insert(v.to_string(), rank);
            rank
        }

        let sources: Vec<String> = g.sources().into_iter().map(|s| s.to_string()).collect();
        let mut visited: HashMap<String, i32> = HashMap::default();
        for v in sources {
            dfs(&v, g, &mut visited);
        }
    }

    /// Rank room left on a link beyond its minimum length. Missing nodes or
    /// ranks count as 0 so malformed graphs degrade instead of panicking.
    pub fn slack(g: &LayoutGraph, key: &LinkKey) -> i32 {
        let n1_rank = g.node(&key.n1).and_then(|n| n.rank).unwrap_or(0);
        let n0_rank = g.node(&key.n0).and_then(|n| n.rank).unwrap_or(0);
        let minlen: i32 = g.link_by_key(key).map(|d| d.minlen as i32).unwrap_or(1);
        n1_rank - n0_rank - minlen
    }
}

pub mod feasible_tree {
    use super::util::slack;
    use crate::LayoutGraph;
    use layerflow_graph::{Graph, GraphOptions};

    type Tree = Graph<(), (), ()>;

    /// Grows a maximal tree of tight links (slack 0), shifting the tree's
    /// ranks by the minimum slack of a crossing link whenever growth stalls.
    /// Disconnected inputs become a forest: each new component restarts the
    /// tree from a fresh root.
    pub fn feasible_tree(g: &mut LayoutGraph) {
        let mut t: Tree = Graph::new(GraphOptions {
            directed: false,
            ..Default::default()
        });

        let Some(start) = g.nodes().next().map(|s| s.to_string()) else {
            return;
        };
        let size = g.node_count();
        t.ensure_node(start);

        while tight_tree(&mut t, g) < size {
            match find_min_slack_link(g, &t) {
                Some((slack, tail_in_tree)) => {
                    let delta = if tail_in_tree { slack } else { -slack };
                    shift_ranks(g, &t, delta);
                }
                None => {
                    let next_root = g
                        .nodes()
                        .find(|v| !t.has_node(v))
                        .map(|s| s.to_string());
                    let Some(next_root) = next_root else {
                        break;
                    };
                    t.ensure_node(next_root);
                }
            }
        }
    }

    /// Extends `t` with every node reachable through tight links and returns
    /// the resulting tree size.
    fn tight_tree(t: &mut Tree, g: &LayoutGraph) -> usize {
        let mut stack: Vec<String> = t.node_ids();
        while let Some(v) = stack.pop() {
            for key in g.node_links(&v) {
                let other = if key.n0 == v {
                    key.n1.as_str()
                } else {
                    key.n0.as_str()
                };
                if t.has_node(other) || slack(g, &key) != 0 {
                    continue;
                }
                let other = other.to_string();
                stack.push(other.clone());
                t.set_link(v.clone(), other);
            }
        }
        t.node_count()
    }

    /// The crossing link (one endpoint in the tree) with the least slack,
    /// plus whether its tail is the in-tree endpoint.
    fn find_min_slack_link(g: &LayoutGraph, t: &Tree) -> Option<(i32, bool)> {
        let mut best: Option<(i32, bool)> = None;
        for key in g.links() {
            let in_tail = t.has_node(&key.n0);
            let in_head = t.has_node(&key.n1);
            if in_tail == in_head {
                continue;
            }
            let s = slack(g, key);
            match &best {
                Some((best_slack, _)) if s >= *best_slack => {}
                _ => best = Some((s, in_tail)),
            }
        }
        best
    }

    fn shift_ranks(g: &mut LayoutGraph, t: &Tree, delta: i32) {
        for v in t.node_ids() {
            if let Some(label) = g.node_mut(&v) {
                label.rank = Some(label.rank.unwrap_or(0) + delta);
            }
        }
    }
}
