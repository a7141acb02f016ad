//! Label types and geometry primitives carried through the layout pipeline.
//!
//! These are lightweight and `Clone`-friendly so the engine can work on a
//! throwaway copy of the caller's graph and copy results back at the end.

use layerflow_graph::LinkKey;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankDir {
    #[default]
    TB,
    BT,
    LR,
    RL,
}

/// Which rank-assignment algorithm to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Ranker {
    /// Longest-path seed tightened into a feasible spanning tree.
    #[default]
    TightTree,
    LongestPath,
    /// Trust ranks already present on the nodes.
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Acyclicer {
    Greedy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    pub rankdir: RankDir,
    pub nodesep: f64,
    pub ranksep: f64,
    pub edgesep: f64,
    pub marginx: f64,
    pub marginy: f64,
    pub align: Option<String>,
    pub ranker: Ranker,
    pub acyclicer: Option<Acyclicer>,

    /// Overall dimensions, written by the final translation step.
    pub width: f64,
    pub height: f64,

    // Pipeline-internal state. Present on the working copy only; the caller's
    // graph never sees these.
    #[serde(skip)]
    pub chain_starts: Vec<String>,
    #[serde(skip)]
    pub nesting_root: Option<String>,
    #[serde(skip)]
    pub node_rank_factor: Option<usize>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            rankdir: RankDir::TB,
            nodesep: 50.0,
            ranksep: 50.0,
            edgesep: 20.0,
            marginx: 0.0,
            marginy: 0.0,
            align: None,
            ranker: Ranker::TightTree,
            acyclicer: None,
            width: 0.0,
            height: 0.0,
            chain_starts: Vec::new(),
            nesting_root: None,
            node_rank_factor: None,
        }
    }
}

/// What a synthetic node stands in for. Real input nodes carry `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fake {
    /// Root of the nesting tree on compound graphs.
    Root,
    /// Subgraph border marker (top/bottom from the nesting step, left/right
    /// segments from the border step).
    Border,
    /// One hop of a multi-rank link's virtual chain.
    Chain,
    /// The chain hop that carries the link's label box.
    ChainLabel,
    /// Placeholder occupying the midpoint rank of a labeled self-loop's link.
    LinkProxy,
    /// Anchor for a self-loop extracted before ranking.
    SelfLoop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelPos {
    #[default]
    C,
    L,
    R,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeLabel {
    pub width: f64,
    pub height: f64,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub rank: Option<i32>,
    pub order: Option<usize>,
    pub fake: Option<Fake>,
    pub border_side: Option<Side>,
    pub labelpos: Option<LabelPos>,

    /// For `Fake::ChainLabel` / `Fake::LinkProxy` nodes: the link this node
    /// stands in for and its label data.
    pub link: Option<LinkKey>,
    pub link_data: Option<LinkData>,

    // Compound bookkeeping: rank span and border nodes of a subgraph root.
    pub min_rank: Option<i32>,
    pub max_rank: Option<i32>,
    pub border_left: Vec<Option<String>>,
    pub border_right: Vec<Option<String>>,
    pub border_top: Option<String>,
    pub border_bottom: Option<String>,

    pub self_links: Vec<SelfLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkData {
    pub width: f64,
    pub height: f64,
    pub labelpos: LabelPos,
    pub labeloffset: f64,
    pub label_rank: Option<i32>,
    pub minlen: usize,
    pub weight: f64,
    pub nesting: bool,
    pub reversed: bool,
    pub forward_name: Option<String>,

    pub x: Option<f64>,
    pub y: Option<f64>,
    pub points: Vec<Point>,
}

impl Default for LinkData {
    fn default() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            labelpos: LabelPos::C,
            labeloffset: 0.0,
            label_rank: None,
            minlen: 1,
            weight: 1.0,
            nesting: false,
            reversed: false,
            forward_name: None,
            x: None,
            y: None,
            points: Vec::new(),
        }
    }
}

/// A self-loop pulled off the graph before ranking, reattached to its node
/// after ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelfLink {
    pub key: LinkKey,
    pub data: LinkData,
}
