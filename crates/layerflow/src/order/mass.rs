//! Mass (weighted mean position) computation, constraint-aware conflict
//! resolution, and recursive subgraph sorting for one ordering sweep.

use super::{ConstraintGraph, LayerGraph};
use rustc_hash::FxHashMap;

/// One movable node's pull toward its fixed neighbors. `value` is `None` for
/// nodes with no links into the fixed layer, which float wherever the sort
/// leaves room.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeMass {
    pub id: String,
    pub value: Option<f64>,
    pub weight: Option<f64>,
}

pub fn masses(lg: &LayerGraph, movable: &[String]) -> Vec<NodeMass> {
    movable
        .iter()
        .map(|v| {
            let mut saw_link = false;
            let mut sum: f64 = 0.0;
            let mut weight: f64 = 0.0;
            lg.for_each_in_link(v, None, |key, data| {
                saw_link = true;
                let u_order = lg
                    .node(&key.n0)
                    .and_then(|n| n.order)
                    .map(|n| n as f64)
                    .unwrap_or(0.0);
                sum += data.weight * u_order;
                weight += data.weight;
            });
            if !saw_link {
                return NodeMass {
                    id: v.clone(),
                    value: None,
                    weight: None,
                };
            }
            NodeMass {
                id: v.clone(),
                value: Some(sum / weight),
                weight: Some(weight),
            }
        })
        .collect()
}

/// A run of nodes forced to move together because a subgraph ordering
/// constraint contradicted their individual masses. `i` is the smallest input
/// index in the run and breaks ties during the sort.
#[derive(Debug, Clone, PartialEq)]
pub struct Conflict {
    pub vs: Vec<String>,
    pub i: usize,
    pub value: Option<f64>,
    pub weight: Option<f64>,
}

#[derive(Debug, Clone)]
struct ConflictSlot {
    indegree: usize,
    ins: Vec<usize>,
    outs: Vec<usize>,
    vs: Vec<usize>,
    i: usize,
    value: Option<f64>,
    weight: Option<f64>,
    merged: bool,
}

/// Collapses entries whose relative order is pinned by `cg` but whose masses
/// disagree. Processes constraint sources in input order so the result is a
/// pure function of the inputs.
pub fn resolve_conflicts(entries: &[NodeMass], cg: &ConstraintGraph) -> Vec<Conflict> {
    let mut id_to_ix: FxHashMap<&str, usize> = FxHashMap::default();
    let mut slots: Vec<ConflictSlot> = Vec::with_capacity(entries.len());
    for (ix, entry) in entries.iter().enumerate() {
        id_to_ix.insert(entry.id.as_str(), ix);
        slots.push(ConflictSlot {
            indegree: 0,
            ins: Vec::new(),
            outs: Vec::new(),
            vs: vec![ix],
            i: ix,
            value: entry.value,
            weight: entry.weight,
            merged: false,
        });
    }

    for key in cg.links() {
        let Some(&v_ix) = id_to_ix.get(key.n0.as_str()) else {
            continue;
        };
        let Some(&w_ix) = id_to_ix.get(key.n1.as_str()) else {
            continue;
        };
        slots[w_ix].indegree += 1;
        slots[v_ix].outs.push(w_ix);
    }

    let mut source_set: Vec<usize> = (0..slots.len())
        .filter(|&ix| slots[ix].indegree == 0)
        .collect();

    let mut processed: Vec<usize> = Vec::new();
    while let Some(v_ix) = source_set.pop() {
        processed.push(v_ix);

        let ins = std::mem::take(&mut slots[v_ix].ins);
        for u in ins.into_iter().rev() {
            if slots[u].merged {
                continue;
            }
            let should_merge = match (slots[u].value, slots[v_ix].value) {
                (None, _) => true,
                (_, None) => true,
                (Some(uv), Some(vv)) => uv >= vv,
            };
            if should_merge {
                merge_conflict_slots(&mut slots, v_ix, u);
            }
        }

        let outs = std::mem::take(&mut slots[v_ix].outs);
        for w_ix in outs {
            slots[w_ix].ins.push(v_ix);
            slots[w_ix].indegree = slots[w_ix].indegree.saturating_sub(1);
            if slots[w_ix].indegree == 0 {
                source_set.push(w_ix);
            }
        }
    }

    let mut out: Vec<Conflict> = Vec::new();
    for ix in processed {
        let slot = &slots[ix];
        if slot.merged {
            continue;
        }
        out.push(Conflict {
            vs: slot.vs.iter().map(|&i| entries[i].id.clone()).collect(),
            i: slot.i,
            value: slot.value,
            weight: slot.weight,
        });
    }
    out
}

fn merge_conflict_slots(slots: &mut [ConflictSlot], target: usize, source: usize) {
    if target == source {
        return;
    }

    let (t, s) = if target < source {
        let (left, right) = slots.split_at_mut(source);
        (&mut left[target], &mut right[0])
    } else {
        let (left, right) = slots.split_at_mut(target);
        (&mut right[0], &mut left[source])
    };

    let mut sum: f64 = 0.0;
    let mut weight: f64 = 0.0;
    if let (Some(v), Some(w)) = (t.value, t.weight) {
        if w != 0.0 {
            sum += v * w;
            weight += w;
        }
    }
    if let (Some(v), Some(w)) = (s.value, s.weight) {
        if w != 0.0 {
            sum += v * w;
            weight += w;
        }
    }

    let source_vs = std::mem::take(&mut s.vs);
    let target_vs = std::mem::take(&mut t.vs);
    let mut merged_vs: Vec<usize> = Vec::with_capacity(source_vs.len() + target_vs.len());
    merged_vs.extend(source_vs);
    merged_vs.extend(target_vs);
    t.vs = merged_vs;

    if weight != 0.0 {
        t.value = Some(sum / weight);
        t.weight = Some(weight);
    }
    t.i = t.i.min(s.i);
    s.merged = true;
}

/// The ordered result of sorting one layer (or one subgraph slice of it),
/// with the combined mass it presents to the enclosing level.
#[derive(Debug, Clone, PartialEq)]
pub struct Mass {
    pub vs: Vec<String>,
    pub value: Option<f64>,
    pub weight: Option<f64>,
}

/// Orders conflict runs by mass. Runs without a mass re-enter at their
/// original index; ties fall left or right with `bias_right`.
pub fn sort(entries: &[Conflict], bias_right: bool) -> Mass {
    let mut total_len: usize = 0;
    let mut sortable: Vec<usize> = Vec::new();
    let mut unsortable: Vec<usize> = Vec::new();

    for (ix, entry) in entries.iter().enumerate() {
        total_len += entry.vs.len();
        if entry.value.is_some() {
            sortable.push(ix);
        } else {
            unsortable.push(ix);
        }
    }

    unsortable.sort_by(|&a, &b| entries[b].i.cmp(&entries[a].i));

    sortable.sort_by(|&a, &b| {
        let a_entry = &entries[a];
        let b_entry = &entries[b];
        let av = a_entry.value.unwrap_or(0.0);
        let bv = b_entry.value.unwrap_or(0.0);
        if av < bv {
            std::cmp::Ordering::Less
        } else if av > bv {
            std::cmp::Ordering::Greater
        } else if !bias_right {
            a_entry.i.cmp(&b_entry.i)
        } else {
            b_entry.i.cmp(&a_entry.i)
        }
    });

    fn consume_unsortable(
        out: &mut Vec<String>,
        entries: &[Conflict],
        unsortable: &mut Vec<usize>,
        mut index: usize,
    ) -> usize {
        while let Some(&last_ix) = unsortable.last() {
            if entries[last_ix].i > index {
                break;
            }
            let Some(last_ix) = unsortable.pop() else {
                break;
            };
            out.extend(entries[last_ix].vs.iter().cloned());
            index += 1;
        }
        index
    }

    let mut out: Vec<String> = Vec::with_capacity(total_len);
    let mut sum: f64 = 0.0;
    let mut weight: f64 = 0.0;
    let mut vs_index: usize = 0;

    vs_index = consume_unsortable(&mut out, entries, &mut unsortable, vs_index);

    for entry_ix in sortable {
        let entry = &entries[entry_ix];
        vs_index += entry.vs.len();
        out.extend(entry.vs.iter().cloned());
        if let (Some(v), Some(w)) = (entry.value, entry.weight) {
            sum += v * w;
            weight += w;
        }
        vs_index = consume_unsortable(&mut out, entries, &mut unsortable, vs_index);
    }

    if weight != 0.0 {
        Mass {
            vs: out,
            value: Some(sum / weight),
            weight: Some(weight),
        }
    } else {
        Mass {
            vs: out,
            value: None,
            weight: None,
        }
    }
}

/// Sorts the children of `v` in the layer graph, recursing into nested
/// subgraphs and pinning border nodes to the outside of the run.
pub fn sort_subgraph(lg: &LayerGraph, v: &str, cg: &ConstraintGraph, bias_right: bool) -> Mass {
    let mut movable: Vec<String> = lg.children(v).into_iter().map(|s| s.to_string()).collect();

    let (border_left, border_right) = lg.node(v).map_or((None, None), |node| {
        (
            node.border_left.first().cloned().flatten(),
            node.border_right.first().cloned().flatten(),
        )
    });

    if let (Some(bl), Some(br)) = (border_left.as_deref(), border_right.as_deref()) {
        movable.retain(|w| w != bl && w != br);
    }

    let mut subgraphs: FxHashMap<String, Mass> = FxHashMap::default();
    let mut node_masses = masses(lg, &movable);

    for entry in &mut node_masses {
        if lg.children(&entry.id).is_empty() {
            continue;
        }
        let subgraph_result = sort_subgraph(lg, &entry.id, cg, bias_right);
        if subgraph_result.value.is_some() {
            merge_masses(entry, &subgraph_result);
        }
        subgraphs.insert(entry.id.clone(), subgraph_result);
    }

    let mut entries = resolve_conflicts(&node_masses, cg);
    expand_subgraphs(&mut entries, &subgraphs);

    let mut result = sort(&entries, bias_right);

    if let (Some(bl), Some(br)) = (border_left, border_right) {
        let mut out: Vec<String> = Vec::with_capacity(result.vs.len() + 2);
        out.push(bl.clone());
        out.extend(result.vs);
        out.push(br.clone());
        result.vs = out;

        // A border node's sole predecessor is the matching border on the rank
        // above; its order pulls the subgraph toward where it sat last sweep.
        let (Some(bl_pred), Some(br_pred)) = (lg.first_predecessor(&bl), lg.first_predecessor(&br))
        else {
            return result;
        };

        let bl_order = lg.node(bl_pred).and_then(|n| n.order).unwrap_or(0) as f64;
        let br_order = lg.node(br_pred).and_then(|n| n.order).unwrap_or(0) as f64;

        let v = result.value.unwrap_or(0.0);
        let w = result.weight.unwrap_or(0.0);
        let denom = w + 2.0;
        result.value = Some((v * w + bl_order + br_order) / denom);
        result.weight = Some(denom);
    }

    result
}

fn expand_subgraphs(entries: &mut [Conflict], subgraphs: &FxHashMap<String, Mass>) {
    for entry in entries {
        let mut out: Vec<String> = Vec::new();
        for v in &entry.vs {
            if let Some(sg) = subgraphs.get(v) {
                out.extend(sg.vs.iter().cloned());
            } else {
                out.push(v.clone());
            }
        }
        entry.vs = out;
    }
}

fn merge_masses(target: &mut NodeMass, other: &Mass) {
    let Some(other_v) = other.value else {
        return;
    };
    let other_w = other.weight.unwrap_or(0.0);

    if let (Some(v), Some(w)) = (target.value, target.weight) {
        let denom = w + other_w;
        target.value = Some((v * w + other_v * other_w) / denom);
        target.weight = Some(denom);
    } else {
        target.value = Some(other_v);
        target.weight = Some(other_w);
    }
}
