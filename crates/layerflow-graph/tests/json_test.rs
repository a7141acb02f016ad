use layerflow_graph::json;
use layerflow_graph::{Graph, GraphOptions};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct NodeData {
    width: f64,
    height: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct LinkData {
    weight: f64,
}

fn sample() -> Graph<NodeData, LinkData, String> {
    let mut g: Graph<NodeData, LinkData, String> = Graph::new(GraphOptions {
        directed: true,
        compound: true,
        multiple: true,
    });
    g.set_data("diagram".to_string());
    g.set_node(
        "a",
        NodeData {
            width: 10.0,
            height: 20.0,
        },
    );
    g.set_node(
        "b",
        NodeData {
            width: 30.0,
            height: 40.0,
        },
    );
    g.set_parent("b", Some("cluster")).unwrap();
    g.set_link_with_data("a", "b", LinkData { weight: 2.0 });
    g.set_link_named("a", "b", Some("alt"), Some(LinkData { weight: 3.0 }));
    g
}

#[test]
fn round_trip_preserves_everything() {
    let g = sample();
    let restored: Graph<NodeData, LinkData, String> =
        json::from_json_str(&json::to_json_string(&g).unwrap()).unwrap();

    assert!(restored.is_directed());
    assert!(restored.is_compound());
    assert!(restored.is_multiple());
    assert_eq!(restored.data(), g.data());
    assert_eq!(restored.node_ids(), g.node_ids());
    assert_eq!(restored.link_keys(), g.link_keys());
    assert_eq!(restored.parent("b"), Some("cluster"));
    assert_eq!(
        restored.link("a", "b", Some("alt")),
        Some(&LinkData { weight: 3.0 })
    );
}

#[test]
fn unnamed_links_stay_unnamed() {
    let g = sample();
    let snapshot = json::write(&g);
    let unnamed = snapshot
        .links
        .iter()
        .find(|l| l.name.is_none())
        .expect("unnamed link present");
    assert_eq!(unnamed.n0, "a");
    assert_eq!(unnamed.n1, "b");

    let restored = json::read(snapshot).unwrap();
    assert!(restored.has_link("a", "b", None));
}

#[test]
fn writing_twice_yields_identical_text() {
    let g = sample();
    assert_eq!(
        json::to_json_string(&g).unwrap(),
        json::to_json_string(&g).unwrap()
    );
}

#[test]
fn option_flags_serialize_with_is_prefix() {
    let text = json::to_json_string(&sample()).unwrap();
    assert!(text.contains("\"isDirected\": true"));
    assert!(text.contains("\"isCompound\": true"));
    assert!(text.contains("\"isMultiple\": true"));
}

#[test]
fn missing_optional_fields_decode_to_none() {
    let text = r#"{
        "opts": { "isDirected": true, "isCompound": false, "isMultiple": false },
        "nodes": [ { "name": "a" }, { "name": "b" } ],
        "edges": [ { "n0": "a", "n1": "b" } ]
    }"#;
    let g: Graph<NodeData, LinkData, String> = json::from_json_str(text).unwrap();

    assert_eq!(g.node("a"), Some(&NodeData::default()));
    assert_eq!(g.link("a", "b", None), Some(&LinkData::default()));
    assert!(g.data().is_empty());
}

#[test]
fn read_rejects_malformed_text() {
    let err = json::from_json_str::<NodeData, LinkData, String>("{not json");
    assert!(err.is_err());
}
