//! Re-parent virtual chains in compound graphs.
//!
//! A chain crossing subgraph boundaries is walked hop by hop and each hop is
//! assigned the subgraph whose rank span covers it, ascending from the source
//! endpoint to the endpoints' lowest common ancestor and descending to the
//! target.

use crate::LayoutGraph;
use std::collections::BTreeMap;

pub fn parent_chains(g: &mut LayoutGraph) {
    let postorder_nums = postorder(g);

    let chains = g.data().chain_starts.clone();
    for mut v in chains {
        let Some(node) = g.node(&v) else {
            continue;
        };
        let Some(key) = node.link.clone() else {
            continue;
        };

        let Some(path_data) = find_path(g, &postorder_nums, &key.n0, &key.n1) else {
            continue;
        };
        let path = path_data.path;
        let lca = path_data.lca;

        let mut path_idx: usize = 0;
        let mut path_v = path.get(path_idx).cloned().unwrap_or(None);
        let mut ascending = true;

        while v != key.n1 {
            let rank = g.node(&v).and_then(|n| n.rank).unwrap_or(0);

            if ascending {
                while path_v != lca
                    && path_v
                        .as_deref()
                        .and_then(|pv| g.node(pv))
                        .and_then(|n| n.max_rank)
                        .unwrap_or(i32::MAX / 2)
                        < rank
                {
                    path_idx += 1;
                    path_v = path.get(path_idx).cloned().unwrap_or(None);
                }

                if path_v == lca {
                    ascending = false;
                }
            }

            if !ascending {
                while path_idx + 1 < path.len()
                    && path
                        .get(path_idx + 1)
                        .and_then(|p| p.as_ref())
                        .and_then(|pv| g.node(pv))
                        .and_then(|n| n.min_rank)
                        .unwrap_or(i32::MIN / 2)
                        <= rank
                {
                    path_idx += 1;
                }
                path_v = path.get(path_idx).cloned().unwrap_or(None);
            }

            match &path_v {
                Some(parent) => {
                    let _ = g.set_parent(v.as_str(), Some(parent.as_str()));
                }
                None => {
                    g.clear_parent(&v);
                }
            }

            let Some(next) = g.first_successor(&v).map(|s| s.to_string()) else {
                break;
            };
            v = next;
        }
    }
}

struct PostorderNum {
    low: usize,
    lim: usize,
}

struct PathData {
    path: Vec<Option<String>>,
    lca: Option<String>,
}

fn find_path(
    g: &LayoutGraph,
    postorder_nums: &BTreeMap<String, PostorderNum>,
    n0: &str,
    n1: &str,
) -> Option<PathData> {
    let n0_po = postorder_nums.get(n0)?;
    let n1_po = postorder_nums.get(n1)?;
    let low = n0_po.low.min(n1_po.low);
    let lim = n0_po.lim.max(n1_po.lim);

    // Up from the source until an ancestor's interval covers both endpoints.
    let mut up_path: Vec<Option<String>> = Vec::new();
    let mut parent = Some(n0.to_string());
    let lca: Option<String>;
    loop {
        parent = parent
            .as_deref()
            .and_then(|p| g.parent(p))
            .map(|s| s.to_string());
        up_path.push(parent.clone());
        let Some(p) = parent.clone() else {
            lca = None;
            break;
        };
        let Some(po) = postorder_nums.get(&p) else {
            lca = None;
            break;
        };
        if po.low <= low && lim <= po.lim {
            lca = Some(p);
            break;
        }
    }

    // Up from the target to the LCA, reversed onto the tail of the path.
    let mut down_path: Vec<Option<String>> = Vec::new();
    let mut cur = n1.to_string();
    loop {
        let p = g.parent(&cur).map(|s| s.to_string());
        if p == lca || p.is_none() {
            break;
        }
        down_path.push(p.clone());
        if let Some(p) = p {
            cur = p;
        }
    }

    let mut path = up_path;
    down_path.reverse();
    path.extend(down_path);
    Some(PathData { path, lca })
}

fn postorder(g: &LayoutGraph) -> BTreeMap<String, PostorderNum> {
    fn dfs(
        g: &LayoutGraph,
        v: &str,
        lim: &mut usize,
        result: &mut BTreeMap<String, PostorderNum>,
    ) {
        let low = *lim;
        for child in g.children(v) {
            dfs(g, child, lim, result);
        }
        result.insert(v.to_string(), PostorderNum { low, lim: *lim });
        *lim += 1;
    }

    let mut result: BTreeMap<String, PostorderNum> = BTreeMap::new();
    let mut lim: usize = 0;
    for v in g.children_root() {
        dfs(g, v, &mut lim, &mut result);
    }
    result
}
