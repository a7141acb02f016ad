use layerflow::model::{GraphConfig, LinkData, NodeLabel};
use layerflow::order::{cross_count, init_order};
use layerflow::util::build_layer_matrix;
use layerflow::{order, Graph, GraphOptions, LayoutGraph};

fn graph() -> LayoutGraph {
    let mut g: LayoutGraph = Graph::new(GraphOptions {
        directed: true,
        multiple: true,
        compound: true,
    });
    g.set_data(GraphConfig::default());
    g
}

fn ranked(rank: i32) -> NodeLabel {
    NodeLabel {
        rank: Some(rank),
        ..Default::default()
    }
}

#[test]
fn init_order_keeps_same_rank_nodes_in_insertion_order() {
    let mut g = graph();
    g.set_node("a", ranked(0));
    g.set_node("b", ranked(0));
    g.set_node("c", ranked(1));

    let layers = init_order(&g);
    assert_eq!(layers[0], vec!["a".to_string(), "b".to_string()]);
    assert_eq!(layers[1], vec!["c".to_string()]);
}

#[test]
fn cross_count_sees_a_single_crossing() {
    let mut g = graph();
    for (v, r) in [("a", 0), ("b", 0), ("c", 1), ("d", 1)] {
        g.set_node(v, ranked(r));
    }
    g.set_link_with_data("a", "d", LinkData::default());
    g.set_link_with_data("b", "c", LinkData::default());

    let layering = vec![
        vec!["a".to_string(), "b".to_string()],
        vec!["c".to_string(), "d".to_string()],
    ];
    assert_eq!(cross_count(&g, &layering), 1.0);

    let uncrossed = vec![
        vec!["a".to_string(), "b".to_string()],
        vec!["d".to_string(), "c".to_string()],
    ];
    assert_eq!(cross_count(&g, &uncrossed), 0.0);
}

#[test]
fn cross_count_weighs_crossings_by_link_weight() {
    let mut g = graph();
    for (v, r) in [("a", 0), ("b", 0), ("c", 1), ("d", 1)] {
        g.set_node(v, ranked(r));
    }
    g.set_link_with_data(
        "a",
        "d",
        LinkData {
            weight: 2.0,
            ..Default::default()
        },
    );
    g.set_link_with_data(
        "b",
        "c",
        LinkData {
            weight: 3.0,
            ..Default::default()
        },
    );

    let layering = vec![
        vec!["a".to_string(), "b".to_string()],
        vec!["c".to_string(), "d".to_string()],
    ];
    assert_eq!(cross_count(&g, &layering), 6.0);
}

#[test]
fn run_assigns_a_permutation_of_orders_per_rank() {
    let mut g = graph();
    for (v, r) in [("a", 0), ("b", 1), ("c", 1), ("d", 2), ("e", 2), ("f", 2)] {
        g.set_node(v, ranked(r));
    }
    for (n0, n1) in [("a", "b"), ("a", "c"), ("b", "d"), ("c", "e"), ("c", "f")] {
        g.set_link_with_data(n0, n1, LinkData::default());
    }

    order::run(&mut g);

    let layering = build_layer_matrix(&g);
    assert_eq!(layering.len(), 3);
    for (rank, layer) in layering.iter().enumerate() {
        let mut orders: Vec<usize> = layer
            .iter()
            .filter_map(|v| g.node(v).and_then(|n| n.order))
            .collect();
        orders.sort_unstable();
        let expected: Vec<usize> = (0..layer.len()).collect();
        assert_eq!(orders, expected, "rank {rank} misses order indices");
    }
}

#[test]
fn run_untangles_an_obvious_crossing() {
    let mut g = graph();
    for (v, r) in [("a", 0), ("b", 0), ("c", 1), ("d", 1)] {
        g.set_node(v, ranked(r));
    }
    // Insertion order would cross; the sweeps must settle on zero crossings.
    g.set_link_with_data("a", "d", LinkData::default());
    g.set_link_with_data("b", "c", LinkData::default());

    order::run(&mut g);

    let layering = build_layer_matrix(&g);
    assert_eq!(cross_count(&g, &layering), 0.0);
}
