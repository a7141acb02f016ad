use layerflow_graph::{Graph, GraphError, GraphOptions, LinkKey};

fn compound() -> Graph<(), (), ()> {
    Graph::new(GraphOptions {
        compound: true,
        ..Default::default()
    })
}

#[test]
fn set_node_is_idempotent_on_structure() {
    let mut g: Graph<i32, (), ()> = Graph::new(GraphOptions::default());
    g.set_node("a", 1);
    g.set_link("a", "b");
    g.set_node("a", 2);

    assert_eq!(g.node("a"), Some(&2));
    assert_eq!(g.node_count(), 2);
    assert!(g.has_link("a", "b", None));
}

#[test]
fn set_link_materializes_endpoints() {
    let mut g: Graph<(), i32, ()> = Graph::new(GraphOptions::default());
    g.set_link_with_data("a", "b", 5);

    assert!(g.has_node("a"));
    assert!(g.has_node("b"));
    assert_eq!(g.link("a", "b", None), Some(&5));
    assert_eq!(g.link("b", "a", None), None);
}

#[test]
fn named_links_are_distinct_on_multigraphs() {
    let mut g: Graph<(), i32, ()> = Graph::new(GraphOptions {
        multiple: true,
        ..Default::default()
    });
    g.set_link_named("a", "b", None::<String>, Some(1));
    g.set_link_named("a", "b", Some("x"), Some(2));

    assert_eq!(g.link_count(), 2);
    assert_eq!(g.link("a", "b", None), Some(&1));
    assert_eq!(g.link("a", "b", Some("x")), Some(&2));
}

#[test]
fn names_are_dropped_on_non_multigraphs() {
    let mut g: Graph<(), i32, ()> = Graph::new(GraphOptions::default());
    g.set_link_named("a", "b", Some("x"), Some(1));
    g.set_link_named("a", "b", Some("y"), Some(2));

    assert_eq!(g.link_count(), 1);
    assert_eq!(g.link("a", "b", None), Some(&2));
}

#[test]
fn undirected_links_are_symmetric() {
    let mut g: Graph<(), i32, ()> = Graph::new(GraphOptions {
        directed: false,
        ..Default::default()
    });
    g.set_link_with_data("b", "a", 7);

    assert!(g.has_link("a", "b", None));
    assert!(g.has_link("b", "a", None));
    assert_eq!(g.link("a", "b", None), Some(&7));
}

#[test]
fn del_node_removes_incident_links() {
    let mut g: Graph<(), (), ()> = Graph::new(GraphOptions::default());
    g.set_path(&["a", "b", "c"]);
    g.set_link("d", "b");

    assert!(g.del_node("b"));
    assert_eq!(g.link_count(), 0);
    assert_eq!(g.node_ids(), vec!["a", "c", "d"]);
    assert!(!g.del_node("b"));
}

#[test]
fn del_node_reparents_children_onto_grandparent() {
    let mut g = compound();
    g.ensure_node("root");
    g.set_parent("mid", Some("root")).unwrap();
    g.set_parent("leaf1", Some("mid")).unwrap();
    g.set_parent("leaf2", Some("mid")).unwrap();

    g.del_node("mid");

    assert_eq!(g.parent("leaf1"), Some("root"));
    assert_eq!(g.parent("leaf2"), Some("root"));
    let mut ch = g.children("root");
    ch.sort();
    assert_eq!(ch, vec!["leaf1", "leaf2"]);
}

#[test]
fn del_node_promotes_children_to_roots_when_parent_was_root() {
    let mut g = compound();
    g.set_parent("leaf", Some("top")).unwrap();
    g.del_node("top");

    assert_eq!(g.parent("leaf"), None);
    assert_eq!(g.children_root(), vec!["leaf"]);
}

#[test]
fn set_parent_rejects_non_compound_graphs() {
    let mut g: Graph<(), (), ()> = Graph::new(GraphOptions::default());
    assert_eq!(g.set_parent("a", Some("b")), Err(GraphError::NotCompound));
}

#[test]
fn set_parent_rejects_cycles() {
    let mut g = compound();
    g.set_parent("b", Some("a")).unwrap();
    g.set_parent("c", Some("b")).unwrap();

    assert_eq!(
        g.set_parent("a", Some("c")),
        Err(GraphError::ParentCycle {
            child: "a".to_string(),
            parent: "c".to_string(),
        })
    );
    assert_eq!(
        g.set_parent("a", Some("a")),
        Err(GraphError::ParentCycle {
            child: "a".to_string(),
            parent: "a".to_string(),
        })
    );
    // The failed calls must not have changed the forest.
    assert_eq!(g.parent("a"), None);
    assert_eq!(g.parent("b"), Some("a"));
}

#[test]
fn clear_parent_detaches_a_child() {
    let mut g = compound();
    g.set_parent("b", Some("a")).unwrap();
    g.set_parent("b", None).unwrap();

    assert_eq!(g.parent("b"), None);
    assert!(g.children("a").is_empty());
}

#[test]
fn successors_and_predecessors_follow_direction() {
    let mut g: Graph<(), (), ()> = Graph::new(GraphOptions::default());
    g.set_path(&["a", "b", "c"]);
    g.set_link("d", "b");

    assert_eq!(g.successors("b"), vec!["c"]);
    let mut pred = g.predecessors("b");
    pred.sort();
    assert_eq!(pred, vec!["a", "d"]);
    assert_eq!(g.first_successor("b"), Some("c"));
}

#[test]
fn successor_counts_report_parallel_multiplicity() {
    let mut g: Graph<(), (), ()> = Graph::new(GraphOptions {
        multiple: true,
        ..Default::default()
    });
    g.set_link_named("a", "b", Some("x"), None);
    g.set_link_named("a", "b", Some("y"), None);
    g.set_link("a", "c");

    assert_eq!(g.successor_counts("a"), vec![("b", 2), ("c", 1)]);
    assert_eq!(g.predecessor_counts("b"), vec![("a", 2)]);
    assert_eq!(g.successors("a"), vec!["b", "c"]);
}

#[test]
fn sources_are_nodes_without_in_links() {
    let mut g: Graph<(), (), ()> = Graph::new(GraphOptions::default());
    g.set_path(&["a", "b", "c"]);
    g.ensure_node("d");

    let mut s = g.sources();
    s.sort();
    assert_eq!(s, vec!["a", "d"]);
}

#[test]
fn out_links_can_filter_by_target() {
    let mut g: Graph<(), (), ()> = Graph::new(GraphOptions {
        multiple: true,
        ..Default::default()
    });
    g.set_link("a", "b");
    g.set_link_named("a", "b", Some("x"), None);
    g.set_link("a", "c");

    assert_eq!(g.out_links("a", None).len(), 3);
    assert_eq!(g.out_links("a", Some("b")).len(), 2);
    assert_eq!(g.in_links("b", Some("a")).len(), 2);
}

#[test]
fn node_links_lists_incident_keys_once() {
    let mut g: Graph<(), (), ()> = Graph::new(GraphOptions::default());
    g.set_link("a", "b");
    g.set_link("b", "c");
    g.set_link("b", "b");

    let keys = g.node_links("b");
    assert_eq!(keys.len(), 3);
    assert!(keys.contains(&LinkKey::new("b", "b", None::<String>)));
}

#[test]
fn filter_nodes_keeps_induced_structure() {
    let mut g: Graph<i32, i32, ()> = Graph::new(GraphOptions::default());
    g.set_node("a", 1);
    g.set_node("b", 2);
    g.set_node("c", 3);
    g.set_link_with_data("a", "b", 10);
    g.set_link_with_data("b", "c", 20);

    let f = g.filter_nodes(|id, _| id != "c");
    assert_eq!(f.node_ids(), vec!["a", "b"]);
    assert_eq!(f.link("a", "b", None), Some(&10));
    assert_eq!(f.link_count(), 1);
}

#[test]
fn filter_nodes_reparents_onto_nearest_surviving_ancestor() {
    let mut g: Graph<(), (), ()> = compound();
    g.set_parent("mid", Some("root")).unwrap();
    g.set_parent("inner", Some("mid")).unwrap();
    g.set_parent("leaf", Some("inner")).unwrap();

    let f = g.filter_nodes(|id, _| id != "mid" && id != "inner");
    assert_eq!(f.parent("leaf"), Some("root"));
    assert_eq!(f.parent("root"), None);
}

#[test]
fn children_root_lists_parentless_nodes() {
    let mut g = compound();
    g.set_parent("b", Some("a")).unwrap();
    g.ensure_node("c");

    let mut roots = g.children_root();
    roots.sort();
    assert_eq!(roots, vec!["a", "c"]);
}
