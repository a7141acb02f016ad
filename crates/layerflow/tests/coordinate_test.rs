use layerflow::model::{GraphConfig, LinkData, NodeLabel, Point, RankDir};
use layerflow::{coordinate, Graph, GraphOptions, LayoutGraph};

fn graph(rankdir: RankDir) -> LayoutGraph {
    let mut g: LayoutGraph = Graph::new(GraphOptions {
        directed: true,
        multiple: true,
        compound: true,
    });
    g.set_data(GraphConfig {
        rankdir,
        ..Default::default()
    });
    g
}

fn positioned() -> (NodeLabel, LinkData) {
    let node = NodeLabel {
        width: 10.0,
        height: 20.0,
        x: Some(3.0),
        y: Some(7.0),
        ..Default::default()
    };
    let link = LinkData {
        width: 30.0,
        height: 40.0,
        x: Some(5.0),
        y: Some(9.0),
        points: vec![Point { x: 1.0, y: 2.0 }],
        ..Default::default()
    };
    (node, link)
}

#[test]
fn adjust_is_a_no_op_for_vertical_rank_directions() {
    for rankdir in [RankDir::TB, RankDir::BT] {
        let mut g = graph(rankdir);
        let (node, link) = positioned();
        g.set_node("a", node);
        g.set_node("b", NodeLabel::default());
        g.set_link_with_data("a", "b", link);

        coordinate::adjust(&mut g);

        let n = g.node("a").cloned().unwrap();
        assert_eq!((n.width, n.height), (10.0, 20.0));
    }
}

#[test]
fn adjust_swaps_node_and_link_boxes_for_horizontal_directions() {
    for rankdir in [RankDir::LR, RankDir::RL] {
        let mut g = graph(rankdir);
        let (node, link) = positioned();
        g.set_node("a", node);
        g.set_node("b", NodeLabel::default());
        g.set_link_with_data("a", "b", link);

        coordinate::adjust(&mut g);

        let n = g.node("a").cloned().unwrap();
        assert_eq!((n.width, n.height), (20.0, 10.0));
        let l = g.link("a", "b", None).cloned().unwrap();
        assert_eq!((l.width, l.height), (40.0, 30.0));
    }
}

#[test]
fn undo_for_bt_negates_all_y_coordinates() {
    let mut g = graph(RankDir::BT);
    let (node, link) = positioned();
    g.set_node("a", node);
    g.set_node("b", NodeLabel::default());
    g.set_link_with_data("a", "b", link);

    coordinate::undo(&mut g);

    let n = g.node("a").cloned().unwrap();
    assert_eq!((n.x, n.y), (Some(3.0), Some(-7.0)));
    let l = g.link("a", "b", None).cloned().unwrap();
    assert_eq!((l.x, l.y), (Some(5.0), Some(-9.0)));
    assert_eq!(l.points, vec![Point { x: 1.0, y: -2.0 }]);
}

#[test]
fn undo_for_lr_swaps_axes_back() {
    let mut g = graph(RankDir::LR);
    let (node, link) = positioned();
    g.set_node("a", node);
    g.set_node("b", NodeLabel::default());
    g.set_link_with_data("a", "b", link);

    coordinate::undo(&mut g);

    let n = g.node("a").cloned().unwrap();
    assert_eq!((n.x, n.y), (Some(7.0), Some(3.0)));
    assert_eq!((n.width, n.height), (20.0, 10.0));
    let l = g.link("a", "b", None).cloned().unwrap();
    assert_eq!((l.x, l.y), (Some(9.0), Some(5.0)));
    assert_eq!(l.points, vec![Point { x: 2.0, y: 1.0 }]);
}

#[test]
fn undo_for_rl_reflects_then_swaps() {
    let mut g = graph(RankDir::RL);
    let (node, link) = positioned();
    g.set_node("a", node);
    g.set_node("b", NodeLabel::default());
    g.set_link_with_data("a", "b", link);

    coordinate::undo(&mut g);

    let n = g.node("a").cloned().unwrap();
    assert_eq!((n.x, n.y), (Some(-7.0), Some(3.0)));
    let l = g.link("a", "b", None).cloned().unwrap();
    assert_eq!(l.points, vec![Point { x: -2.0, y: 1.0 }]);
}
