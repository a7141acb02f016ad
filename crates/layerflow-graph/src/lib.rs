//! Compound/multi directed graph container used by the `layerflow` layout
//! engine.
//!
//! String node ids, generic payloads on nodes, links, and the graph itself,
//! and a JSON adapter for snapshots. Mutation order is observable: node and
//! link iteration follows insertion order, which the layout stages rely on
//! for determinism.

mod graph;

pub mod alg;
pub mod json;

pub use graph::{Graph, GraphError, GraphOptions, LinkKey};
