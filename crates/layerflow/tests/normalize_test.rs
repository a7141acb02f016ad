use layerflow::model::{Fake, GraphConfig, LinkData, NodeLabel};
use layerflow::{normalize, Graph, GraphOptions, LayoutGraph};

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
fn run_keeps_rank_adjacent_links() {
    let mut g = graph();
    g.set_node("a", ranked(0));
    g.set_node("b", ranked(1));
    g.set_link_with_data("a", "b", LinkData::default());

    normalize::run(&mut g);

    assert!(g.has_link("a", "b", None));
    assert_eq!(g.node_count(), 2);
    assert!(g.data().chain_starts.is_empty());
}

#[test]
fn run_splits_a_span_two_link_into_one_chain_node() {
    let mut g = graph();
    g.set_node("a", ranked(0));
    g.set_node("b", ranked(2));
    g.set_link_with_data(
        "a",
        "b",
        LinkData {
            weight: 2.0,
            ..Default::default()
        },
    );

    normalize::run(&mut g);

    assert!(!g.has_link("a", "b", None));
    assert_eq!(g.node_count(), 3);
    assert_eq!(g.data().chain_starts.len(), 1);

    let hop = g.data().chain_starts[0].clone();
    let node = g.node(&hop).cloned().unwrap();
    assert_eq!(node.fake, Some(Fake::Chain));
    assert_eq!(node.rank, Some(1));
    assert_eq!(node.width, 0.0);
    assert_eq!(node.height, 0.0);

    assert!(g.has_link("a", &hop, None));
    assert!(g.has_link(&hop, "b", None));
    assert_eq!(g.link("a", &hop, None).map(|d| d.weight), Some(2.0));
    assert_eq!(g.link(&hop, "b", None).map(|d| d.weight), Some(2.0));
}

#[test]
fn run_marks_the_label_rank_hop_with_the_label_box() {
    let mut g = graph();
    g.set_node("a", ranked(0));
    g.set_node("b", ranked(3));
    g.set_link_with_data(
        "a",
        "b",
        LinkData {
            width: 30.0,
            height: 10.0,
            label_rank: Some(2),
            ..Default::default()
        },
    );

    normalize::run(&mut g);

    let labeled: Vec<NodeLabel> = g
        .node_ids()
        .iter()
        .filter_map(|v| g.node(v))
        .filter(|n| n.fake == Some(Fake::ChainLabel))
        .cloned()
        .collect();
    assert_eq!(labeled.len(), 1);
    assert_eq!(labeled[0].rank, Some(2));
    assert_eq!(labeled[0].width, 30.0);
    assert_eq!(labeled[0].height, 10.0);
}

#[test]
fn undo_collapses_chains_back_into_links_with_bend_points() {
    let mut g = graph();
    g.set_node("a", ranked(0));
    g.set_node("b", ranked(3));
    g.set_link_with_data("a", "b", LinkData::default());

    normalize::run(&mut g);
    assert_eq!(g.node_count(), 4);

    // Stand in for positioning: give each chain node coordinates.
    let mut i = 0.0;
    for v in g.node_ids() {
        let Some(node) = g.node_mut(&v) else { continue };
        if node.fake.is_some() {
            i += 1.0;
            node.x = Some(i * 10.0);
            node.y = Some(i * 100.0);
        }
    }

    normalize::undo(&mut g);

    assert_eq!(g.node_count(), 2);
    assert_eq!(g.link_count(), 1);
    let data = g.link("a", "b", None).cloned().unwrap();
    assert_eq!(data.points.len(), 2);
    assert_eq!(data.points[0].y, 100.0);
    assert_eq!(data.points[1].y, 200.0);
}

#[test]
fn undo_copies_the_chain_label_box_onto_the_link() {
    let mut g = graph();
    g.set_node("a", ranked(0));
    g.set_node("b", ranked(2));
    g.set_link_with_data(
        "a",
        "b",
        LinkData {
            width: 40.0,
            height: 20.0,
            label_rank: Some(1),
            ..Default::default()
        },
    );

    normalize::run(&mut g);
    let hop = g.data().chain_starts[0].clone();
    if let Some(node) = g.node_mut(&hop) {
        node.x = Some(15.0);
        node.y = Some(120.0);
    }

    normalize::undo(&mut g);

    let data = g.link("a", "b", None).cloned().unwrap();
    assert_eq!(data.x, Some(15.0));
    assert_eq!(data.y, Some(120.0));
    assert_eq!(data.width, 40.0);
    assert_eq!(data.height, 20.0);
}
