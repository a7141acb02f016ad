use layerflow::model::{Fake, GraphConfig, LinkData, NodeLabel};
use layerflow::{nesting, Graph, GraphOptions, LayoutGraph};

fn graph() -> LayoutGraph {
    let mut g: LayoutGraph = Graph::new(GraphOptions {
        directed: true,
        multiple: true,
        compound: true,
    });
    g.set_data(GraphConfig::default());
    g
}

#[test]
fn run_connects_a_flat_graph_through_the_root() {
    let mut g = graph();
    g.set_node("a", NodeLabel::default());
    g.set_node("b", NodeLabel::default());
    g.set_link_with_data("a", "b", LinkData::default());

    nesting::run(&mut g);

    let root = g.data().nesting_root.clone().unwrap();
    assert_eq!(g.node(&root).and_then(|n| n.fake), Some(Fake::Root));
    assert!(g.has_link(&root, "a", None));
    assert!(g.has_link(&root, "b", None));
    // No compound structure: links keep their original minlen.
    assert_eq!(g.link("a", "b", None).map(|d| d.minlen), Some(1));
}

#[test]
fn run_gives_subgraphs_top_and_bottom_borders() {
    let mut g = graph();
    g.set_node("sg", NodeLabel::default());
    g.set_node("a", NodeLabel::default());
    g.set_node("b", NodeLabel::default());
    g.set_parent("a", Some("sg")).unwrap();
    g.set_parent("b", Some("sg")).unwrap();
    g.set_link_with_data("a", "b", LinkData::default());

    nesting::run(&mut g);

    let sg = g.node("sg").cloned().unwrap();
    let top = sg.border_top.unwrap();
    let bottom = sg.border_bottom.unwrap();
    assert_eq!(g.parent(&top), Some("sg"));
    assert_eq!(g.parent(&bottom), Some("sg"));
    assert_eq!(g.node(&top).and_then(|n| n.fake), Some(Fake::Border));

    // Children hang strictly between the borders via nesting links.
    for child in ["a", "b"] {
        assert!(g.link(&top, child, None).is_some_and(|d| d.nesting));
        assert!(g.link(child, &bottom, None).is_some_and(|d| d.nesting));
    }
}

#[test]
fn run_scales_minlen_to_leave_room_for_borders() {
    let mut g = graph();
    g.set_node("sg", NodeLabel::default());
    g.set_node("a", NodeLabel::default());
    g.set_parent("a", Some("sg")).unwrap();
    g.set_node("b", NodeLabel::default());
    g.set_link_with_data("a", "b", LinkData::default());

    nesting::run(&mut g);

    // One level of nesting: node_sep = 2 * 1 + 1.
    assert_eq!(g.link("a", "b", None).map(|d| d.minlen), Some(3));
    assert_eq!(g.data().node_rank_factor, Some(3));
}

#[test]
fn cleanup_removes_the_root_and_every_nesting_link() {
    let mut g = graph();
    g.set_node("sg", NodeLabel::default());
    g.set_node("a", NodeLabel::default());
    g.set_parent("a", Some("sg")).unwrap();
    g.set_node("b", NodeLabel::default());
    g.set_link_with_data("a", "b", LinkData::default());

    nesting::run(&mut g);
    nesting::cleanup(&mut g);

    assert_eq!(g.data().nesting_root, None);
    assert_eq!(g.link_count(), 1);
    assert!(g.has_link("a", "b", None));
    let mut nesting_links = 0;
    g.for_each_link(|_k, d| {
        if d.nesting {
            nesting_links += 1;
        }
    });
    assert_eq!(nesting_links, 0);
}
