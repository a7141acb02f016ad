use crate::LayoutGraph;
use rustc_hash::FxHashSet;

/// Seeds an initial order: leaf nodes sorted by rank (insertion position
/// breaking ties), each expanded depth-first through its successors so
/// connected runs land near each other in every layer.
pub fn init_order(g: &LayoutGraph) -> Vec<Vec<String>> {
    let simple_nodes: Vec<String> = g
        .nodes()
        .filter(|v| g.children(v).is_empty())
        .map(|v| v.to_string())
        .collect();

    let mut max_rank: i32 = i32::MIN;
    for v in &simple_nodes {
        if let Some(rank) = g.node(v).and_then(|n| n.rank) {
            max_rank = max_rank.max(rank);
        }
    }
    if max_rank == i32::MIN {
        return Vec::new();
    }

    let mut layers: Vec<Vec<String>> = vec![Vec::new(); (max_rank + 1).max(0) as usize];
    let mut visited: FxHashSet<String> = FxHashSet::default();

    fn dfs(
        g: &LayoutGraph,
        v: &str,
        visited: &mut FxHashSet<String>,
        layers: &mut [Vec<String>],
    ) {
        if !visited.insert(v.to_string()) {
            return;
        }
        let Some(rank) = g.node(v).and_then(|n| n.rank) else {
            return;
        };
        if let Some(layer) = layers.get_mut(rank.max(0) as usize) {
            layer.push(v.to_string());
        }
        for w in g.successors(v) {
            dfs(g, w, visited, layers);
        }
    }

    // Node iteration order is insertion order, so a stable sort by rank alone
    // keeps same-rank nodes in the order the caller defined them.
    let mut ordered = simple_nodes;
    ordered.sort_by_key(|v| g.node(v).and_then(|n| n.rank).unwrap_or(i32::MAX));

    for v in ordered {
        dfs(g, &v, &mut visited, &mut layers);
    }

    layers
}
