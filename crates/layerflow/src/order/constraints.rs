use super::{ConstraintGraph, LayerGraph};
use rustc_hash::FxHashMap;

/// Records, for every compound level touched by the sorted run `vs`, the
/// order its subgraphs settled into. Later sweep steps feed these links to
/// conflict resolution so sibling subgraphs cannot leapfrog each other.
pub fn add_subgraph_constraints(lg: &LayerGraph, cg: &mut ConstraintGraph, vs: &[String]) {
    let mut prev: FxHashMap<&str, &str> = FxHashMap::default();
    let mut root_prev: Option<&str> = None;

    for v in vs {
        let mut child = lg.parent(v.as_str());
        while let Some(c) = child {
            let parent = lg.parent(c);

            let prev_child = if let Some(p) = parent {
                prev.insert(p, c)
            } else {
                root_prev.replace(c)
            };

            if let Some(prev_child) = prev_child {
                if prev_child != c {
                    cg.set_link(prev_child, c);
                    break;
                }
            }

            child = parent;
        }
    }
}
