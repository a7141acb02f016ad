//! JSON persistence: a stable, human-readable snapshot of a graph that can be
//! round-tripped without losing structure.

use crate::graph::{Graph, GraphError, GraphOptions};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonOptions {
    #[serde(rename = "isDirected")]
    pub directed: bool,
    #[serde(rename = "isCompound")]
    pub compound: bool,
    #[serde(rename = "isMultiple")]
    pub multiple: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonNode<N> {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<N>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonLink<E> {
    pub n0: String,
    pub n1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<E>,
}

/// The serialized shape of a graph. Nodes and links appear in insertion
/// order, so writing the same graph twice yields identical output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonGraph<N, E, G> {
    #[serde(rename = "opts")]
    pub options: JsonOptions,
    pub nodes: Vec<JsonNode<N>>,
    #[serde(rename = "edges")]
    pub links: Vec<JsonLink<E>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<G>,
}

pub fn write<N, E, G>(g: &Graph<N, E, G>) -> JsonGraph<N, E, G>
where
    N: Default + Clone + 'static,
    E: Default + Clone + 'static,
    G: Default + Clone,
{
    let opts = g.options();
    let nodes = g
        .nodes()
        .map(|id| JsonNode {
            name: id.to_string(),
            data: g.node(id).cloned(),
            parent: if opts.compound {
                g.parent(id).map(|p| p.to_string())
            } else {
                None
            },
        })
        .collect();
    let links = g
        .links()
        .map(|key| JsonLink {
            n0: key.n0.clone(),
            n1: key.n1.clone(),
            name: key.name.clone(),
            data: g.link_by_key(key).cloned(),
        })
        .collect();
    JsonGraph {
        options: JsonOptions {
            directed: opts.directed,
            compound: opts.compound,
            multiple: opts.multiple,
        },
        nodes,
        links,
        data: Some(g.data().clone()),
    }
}

pub fn read<N, E, G>(json: JsonGraph<N, E, G>) -> Result<Graph<N, E, G>, GraphError>
where
    N: Default + Clone + 'static,
    E: Default + Clone + 'static,
    G: Default + Clone,
{
    let mut g: Graph<N, E, G> = Graph::new(GraphOptions {
        directed: json.options.directed,
        compound: json.options.compound,
        multiple: json.options.multiple,
    });
    if let Some(data) = json.data {
        g.set_data(data);
    }
    for node in &json.nodes {
        g.set_node(node.name.clone(), node.data.clone().unwrap_or_default());
    }
    // Parents are applied once every node exists so forward references work.
    for node in &json.nodes {
        if let Some(parent) = &node.parent {
            g.set_parent(node.name.clone(), Some(parent))?;
        }
    }
    for link in json.links {
        g.set_link_named(link.n0, link.n1, link.name, link.data);
    }
    Ok(g)
}

pub fn to_json_string<N, E, G>(g: &Graph<N, E, G>) -> serde_json::Result<String>
where
    N: Default + Clone + Serialize + 'static,
    E: Default + Clone + Serialize + 'static,
    G: Default + Clone + Serialize,
{
    serde_json::to_string_pretty(&write(g))
}

pub fn from_json_str<N, E, G>(s: &str) -> Result<Graph<N, E, G>, ReadError>
where
    N: Default + Clone + DeserializeOwned + 'static,
    E: Default + Clone + DeserializeOwned + 'static,
    G: Default + Clone + DeserializeOwned,
{
    let json: JsonGraph<N, E, G> = serde_json::from_str(s)?;
    Ok(read(json)?)
}

/// Failure while decoding a serialized graph.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("malformed graph JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Graph(#[from] GraphError),
}
