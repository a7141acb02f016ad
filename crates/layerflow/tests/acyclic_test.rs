use layerflow::model::{Acyclicer, GraphConfig, LinkData, NodeLabel, Point};
use layerflow::{acyclic, Graph, GraphOptions, LayoutGraph, LinkKey};

fn graph() -> LayoutGraph {
    let mut g: LayoutGraph = Graph::new(GraphOptions {
        directed: true,
        multiple: true,
        compound: true,
    });
    g.set_data(GraphConfig::default());
    g
}

fn key(n0: &str, n1: &str) -> LinkKey {
    LinkKey {
        n0: n0.to_string(),
        n1: n1.to_string(),
        name: None,
    }
}

#[test]
fn run_leaves_a_dag_untouched() {
    let mut g = graph();
    for v in ["a", "b", "c"] {
        g.set_node(v, NodeLabel::default());
    }
    g.set_link_with_data("a", "b", LinkData::default());
    g.set_link_with_data("b", "c", LinkData::default());

    acyclic::run(&mut g);

    assert!(g.has_link("a", "b", None));
    assert!(g.has_link("b", "c", None));
    assert_eq!(g.link_count(), 2);
}

#[test]
fn run_reverses_one_link_of_a_cycle() {
    let mut g = graph();
    for v in ["a", "b", "c"] {
        g.set_node(v, NodeLabel::default());
    }
    g.set_link_with_data("a", "b", LinkData::default());
    g.set_link_with_data("b", "c", LinkData::default());
    g.set_link_with_data("c", "a", LinkData::default());

    acyclic::run(&mut g);

    assert_eq!(g.link_count(), 3);
    let reversed: Vec<LinkKey> = g
        .link_keys()
        .into_iter()
        .filter(|k| g.link_by_key(k).is_some_and(|d| d.reversed))
        .collect();
    assert_eq!(reversed.len(), 1);
    // The dfs order visits a first, so c -> a is the back edge.
    let k = &reversed[0];
    assert_eq!((k.n0.as_str(), k.n1.as_str()), ("a", "c"));
    assert_eq!(k.name.as_deref(), Some("rev1"));
    let data = g.link_by_key(k).cloned().unwrap();
    assert_eq!(data.forward_name, None);
}

#[test]
fn greedy_acyclicer_reverses_the_lighter_direction() {
    let mut g = graph();
    g.data_mut().acyclicer = Some(Acyclicer::Greedy);
    g.set_node("a", NodeLabel::default());
    g.set_node("b", NodeLabel::default());
    g.set_link_with_data(
        "a",
        "b",
        LinkData {
            weight: 2.0,
            ..Default::default()
        },
    );
    g.set_link_with_data(
        "b",
        "a",
        LinkData {
            weight: 1.0,
            ..Default::default()
        },
    );

    acyclic::run(&mut g);

    let reversed: Vec<LinkKey> = g
        .link_keys()
        .into_iter()
        .filter(|k| g.link_by_key(k).is_some_and(|d| d.reversed))
        .collect();
    assert_eq!(reversed.len(), 1);
    let data = g.link_by_key(&reversed[0]).cloned().unwrap();
    assert_eq!(data.weight, 1.0);
}

#[test]
fn undo_restores_the_original_key_and_flips_points() {
    let mut g = graph();
    for v in ["a", "b", "c"] {
        g.set_node(v, NodeLabel::default());
    }
    g.set_link_named("a", "b", Some("x".to_string()), Some(LinkData::default()));
    g.set_link_with_data("b", "c", LinkData::default());
    g.set_link_with_data("c", "a", LinkData::default());

    acyclic::run(&mut g);

    // Simulate the layout filling in bend points on the reversed link.
    for k in g.link_keys() {
        if let Some(data) = g.link_mut_by_key(&k) {
            if data.reversed {
                data.points = vec![Point { x: 1.0, y: 1.0 }, Point { x: 2.0, y: 2.0 }];
            }
        }
    }

    acyclic::undo(&mut g);

    assert!(g.has_link("a", "b", Some("x")));
    assert!(g.has_link("b", "c", None));
    assert!(g.has_link("c", "a", None));
    assert_eq!(g.link_count(), 3);

    let data = g.link("c", "a", None).cloned().unwrap();
    assert!(!data.reversed);
    assert_eq!(
        data.points,
        vec![Point { x: 2.0, y: 2.0 }, Point { x: 1.0, y: 1.0 }]
    );
    assert!(!g.link_keys().iter().any(|k| g
        .link_by_key(k)
        .is_some_and(|d| d.reversed)));
}

#[test]
fn self_loops_are_never_part_of_the_feedback_set() {
    let mut g = graph();
    g.set_node("a", NodeLabel::default());
    g.set_link_with_data("a", "a", LinkData::default());

    acyclic::run(&mut g);

    assert!(g.has_link("a", "a", None));
    assert!(!g
        .link_by_key(&key("a", "a"))
        .is_some_and(|d| d.reversed));
}
