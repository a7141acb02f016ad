use layerflow::order::{resolve_conflicts, Conflict, ConstraintGraph, NodeMass};
use layerflow::{Graph, GraphOptions};

fn cg() -> ConstraintGraph {
    Graph::new(GraphOptions::default())
}

fn sorted_by_i(mut entries: Vec<Conflict>) -> Vec<Conflict> {
    entries.sort_by_key(|e| e.i);
    entries
}

#[test]
fn returns_a_singleton_run_per_node_without_constraints() {
    let entries = vec![
        NodeMass {
            id: "a".to_string(),
            value: Some(1.0),
            weight: Some(2.0),
        },
        NodeMass {
            id: "b".to_string(),
            value: Some(3.0),
            weight: Some(4.0),
        },
    ];
    assert_eq!(
        sorted_by_i(resolve_conflicts(&entries, &cg())),
        vec![
            Conflict {
                vs: vec!["a".to_string()],
                i: 0,
                value: Some(1.0),
                weight: Some(2.0),
            },
            Conflict {
                vs: vec!["b".to_string()],
                i: 1,
                value: Some(3.0),
                weight: Some(4.0),
            },
        ]
    );
}

#[test]
fn keeps_entries_apart_when_the_constraint_already_holds() {
    let entries = vec![
        NodeMass {
            id: "a".to_string(),
            value: Some(1.0),
            weight: Some(1.0),
        },
        NodeMass {
            id: "b".to_string(),
            value: Some(2.0),
            weight: Some(1.0),
        },
    ];
    let mut constraints = cg();
    constraints.set_link("a", "b");
    assert_eq!(resolve_conflicts(&entries, &constraints).len(), 2);
}

#[test]
fn merges_entries_when_the_constraint_is_violated() {
    let entries = vec![
        NodeMass {
            id: "a".to_string(),
            value: Some(2.0),
            weight: Some(3.0),
        },
        NodeMass {
            id: "b".to_string(),
            value: Some(1.0),
            weight: Some(2.0),
        },
    ];
    let mut constraints = cg();
    constraints.set_link("a", "b");
    assert_eq!(
        resolve_conflicts(&entries, &constraints),
        vec![Conflict {
            vs: vec!["a".to_string(), "b".to_string()],
            i: 0,
            value: Some(1.6),
            weight: Some(5.0),
        }]
    );
}

#[test]
fn merges_entries_without_a_value_into_their_successor() {
    let entries = vec![
        NodeMass {
            id: "a".to_string(),
            value: None,
            weight: None,
        },
        NodeMass {
            id: "b".to_string(),
            value: Some(1.0),
            weight: Some(2.0),
        },
    ];
    let mut constraints = cg();
    constraints.set_link("a", "b");
    assert_eq!(
        resolve_conflicts(&entries, &constraints),
        vec![Conflict {
            vs: vec!["a".to_string(), "b".to_string()],
            i: 0,
            value: Some(1.0),
            weight: Some(2.0),
        }]
    );
}

#[test]
fn ignores_constraints_on_nodes_outside_the_entry_set() {
    let entries = vec![NodeMass {
        id: "a".to_string(),
        value: Some(1.0),
        weight: Some(1.0),
    }];
    let mut constraints = cg();
    constraints.set_link("x", "y");
    assert_eq!(resolve_conflicts(&entries, &constraints).len(), 1);
}

#[test]
fn chained_violations_collapse_into_one_run() {
    let entries = vec![
        NodeMass {
            id: "a".to_string(),
            value: Some(3.0),
            weight: Some(1.0),
        },
        NodeMass {
            id: "b".to_string(),
            value: Some(2.0),
            weight: Some(1.0),
        },
        NodeMass {
            id: "c".to_string(),
            value: Some(1.0),
            weight: Some(1.0),
        },
    ];
    let mut constraints = cg();
    constraints.set_link("a", "b");
    constraints.set_link("b", "c");
    let result = resolve_conflicts(&entries, &constraints);
    assert_eq!(result.len(), 1);
    assert_eq!(
        result[0].vs,
        vec!["a".to_string(), "b".to_string(), "c".to_string()]
    );
    assert_eq!(result[0].value, Some(2.0));
    assert_eq!(result[0].weight, Some(3.0));
}
