//! Layered layout for compound directed graphs.
//!
//! Nodes end up centered on ranked layers, links become point sequences with
//! optional label anchors, and subgraphs get tight bounding boxes. The caller
//! builds a [`LayoutGraph`], sets node sizes and link constraints, and runs
//! [`layout`].

pub mod acyclic;
pub mod border;
pub mod coordinate;
pub mod greedy_fas;
pub mod model;
pub mod nesting;
pub mod normalize;
pub mod order;
pub mod parent_chains;
pub mod pipeline;
pub mod position;
pub mod rank;
pub mod self_loops;
pub mod util;

pub use layerflow_graph::{Graph, GraphError, GraphOptions, LinkKey};
pub use model::{
    Acyclicer, Fake, GraphConfig, LabelPos, LinkData, NodeLabel, Point, RankDir, Ranker, SelfLink,
    Side,
};
pub use pipeline::layout;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The graph type the whole pipeline operates on.
pub type LayoutGraph = Graph<NodeLabel, LinkData, GraphConfig>;
