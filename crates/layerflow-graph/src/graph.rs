//! The core `Graph` container: a directed (optionally compound, optionally
//! multi) graph with string node ids, generic per-node/per-link/per-graph
//! payloads, and O(1) amortized lookups.
//!
//! Mutators keep every side table (node index, link index, parent/children
//! maps, adjacency cache generation) consistent before returning, since the
//! layout pipeline interleaves queries across tables between mutations.

use rustc_hash::FxBuildHasher;
use std::cell::RefCell;
use std::hash::{Hash, Hasher};
use thiserror::Error;

type HashMap<K, V> = hashbrown::HashMap<K, V, FxBuildHasher>;
type HashSet<T> = hashbrown::HashSet<T, FxBuildHasher>;

/// Structural errors. These indicate caller bugs, not recoverable
/// conditions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("setting parent of `{child}` to `{parent}` would create a cycle")]
    ParentCycle { child: String, parent: String },
    #[error("cannot set a parent on a non-compound graph")]
    NotCompound,
}

#[derive(Debug, Clone)]
struct DirectedAdjCache {
    generation: u64,
    out: Vec<Vec<usize>>,
    in_: Vec<Vec<usize>>,
}

#[derive(Clone, Copy, Hash)]
struct LinkKeyView<'a> {
    n0: &'a str,
    n1: &'a str,
    name: Option<&'a str>,
}

impl<'a> hashbrown::Equivalent<LinkKey> for LinkKeyView<'a> {
    fn equivalent(&self, key: &LinkKey) -> bool {
        key.n0 == self.n0 && key.n1 == self.n1 && key.name.as_deref() == self.name
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GraphOptions {
    pub directed: bool,
    pub compound: bool,
    pub multiple: bool,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            directed: true,
            compound: false,
            multiple: false,
        }
    }
}

/// Identity of a link: the ordered `(n0, n1)` endpoint pair plus an optional
/// disambiguating name on multigraphs. Undirected graphs canonicalize the
/// pair so the lexicographically smaller id is `n0`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LinkKey {
    pub n0: String,
    pub n1: String,
    pub name: Option<String>,
}

impl LinkKey {
    pub fn new(
        n0: impl Into<String>,
        n1: impl Into<String>,
        name: Option<impl Into<String>>,
    ) -> Self {
        Self {
            n0: n0.into(),
            n1: n1.into(),
            name: name.map(Into::into),
        }
    }
}

impl PartialEq for LinkKey {
    fn eq(&self, other: &Self) -> bool {
        self.n0 == other.n0 && self.n1 == other.n1 && self.name == other.name
    }
}

impl Eq for LinkKey {}

impl Hash for LinkKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.n0.hash(state);
        self.n1.hash(state);
        self.name.hash(state);
    }
}

#[derive(Debug, Clone)]
struct NodeEntry<N> {
    id: String,
    data: N,
}

#[derive(Debug, Clone)]
struct LinkEntry<E> {
    key: LinkKey,
    data: E,
}

pub struct Graph<N, E, G>
where
    N: Default + 'static,
    E: Default + 'static,
    G: Default,
{
    options: GraphOptions,

    data: G,
    default_node_data: Box<dyn Fn() -> N + Send + Sync>,
    default_link_data: Box<dyn Fn() -> E + Send + Sync>,

    nodes: Vec<NodeEntry<N>>,
    node_index: HashMap<String, usize>,

    links: Vec<LinkEntry<E>>,
    link_index: HashMap<LinkKey, usize>,

    parent: HashMap<String, String>,
    children: HashMap<String, Vec<String>>,

    // `predecessors` / `successors` / `in_links` / `out_links` are called
    // repeatedly by every pipeline stage. Scanning `self.links` each time is
    // O(E) per query, so directed graphs keep a lazily rebuilt adjacency
    // cache (interior mutability keeps query APIs on `&self`).
    adj_generation: u64,
    adj_cache: RefCell<Option<DirectedAdjCache>>,
}

impl<N, E, G> Graph<N, E, G>
where
    N: Default + 'static,
    E: Default + 'static,
    G: Default,
{
    pub fn new(options: GraphOptions) -> Self {
        Self {
            options,
            data: G::default(),
            default_node_data: Box::new(N::default),
            default_link_data: Box::new(E::default),
            nodes: Vec::new(),
            node_index: HashMap::default(),
            links: Vec::new(),
            link_index: HashMap::default(),
            parent: HashMap::default(),
            children: HashMap::default(),
            adj_generation: 0,
            adj_cache: RefCell::new(None),
        }
    }

    fn invalidate_adj(&mut self) {
        if !self.options.directed {
            return;
        }
        self.adj_generation = self.adj_generation.wrapping_add(1);
        *self.adj_cache.get_mut() = None;
    }

    fn ensure_adj<'a>(&'a self) -> std::cell::RefMut<'a, DirectedAdjCache> {
        debug_assert!(self.options.directed);
        let generation = self.adj_generation;
        let mut cache = self.adj_cache.borrow_mut();
        let stale = cache
            .as_ref()
            .map(|c| c.generation != generation)
            .unwrap_or(true);
        if stale {
            let mut out: Vec<Vec<usize>> = vec![Vec::new(); self.nodes.len()];
            let mut in_: Vec<Vec<usize>> = vec![Vec::new(); self.nodes.len()];
            for (link_idx, l) in self.links.iter().enumerate() {
                let Some(&n0_idx) = self.node_index.get(&l.key.n0) else {
                    continue;
                };
                let Some(&n1_idx) = self.node_index.get(&l.key.n1) else {
                    continue;
                };
                out[n0_idx].push(link_idx);
                in_[n1_idx].push(link_idx);
            }
            *cache = Some(DirectedAdjCache {
                generation,
                out,
                in_,
            });
        }
        std::cell::RefMut::map(cache, |c| {
            c.as_mut()
                .expect("adjacency cache should be present after ensure")
        })
    }

    fn key_view<'a>(&self, n0: &'a str, n1: &'a str, name: Option<&'a str>) -> LinkKeyView<'a> {
        let (n0, n1) = if self.options.directed || n0 <= n1 {
            (n0, n1)
        } else {
            (n1, n0)
        };
        let name = if self.options.multiple { name } else { None };
        LinkKeyView { n0, n1, name }
    }

    fn key_view_from_key<'a>(&self, key: &'a LinkKey) -> LinkKeyView<'a> {
        let mut n0 = key.n0.as_str();
        let mut n1 = key.n1.as_str();
        if !self.options.directed && n0 > n1 {
            (n0, n1) = (n1, n0);
        }
        let name = if self.options.multiple {
            key.name.as_deref()
        } else {
            None
        };
        LinkKeyView { n0, n1, name }
    }

    fn link_index_of_view(&self, view: LinkKeyView<'_>) -> Option<usize> {
        self.link_index.get(&view).copied()
    }

    fn canonicalize_endpoints(&self, n0: String, n1: String) -> (String, String) {
        if self.options.directed || n0 <= n1 {
            (n0, n1)
        } else {
            (n1, n0)
        }
    }

    fn canonicalize_name(&self, name: Option<String>) -> Option<String> {
        if self.options.multiple { name } else { None }
    }

    fn canonicalize_key(&self, mut key: LinkKey) -> LinkKey {
        if !self.options.directed && key.n0 > key.n1 {
            (key.n0, key.n1) = (key.n1, key.n0);
        }
        key.name = self.canonicalize_name(key.name);
        key
    }

    pub fn options(&self) -> GraphOptions {
        self.options
    }

    pub fn is_directed(&self) -> bool {
        self.options.directed
    }

    pub fn is_compound(&self) -> bool {
        self.options.compound
    }

    pub fn is_multiple(&self) -> bool {
        self.options.multiple
    }

    pub fn set_data(&mut self, data: G) -> &mut Self {
        self.data = data;
        self
    }

    pub fn data(&self) -> &G {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut G {
        &mut self.data
    }

    pub fn set_default_node_data<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn() -> N + Send + Sync + 'static,
    {
        self.default_node_data = Box::new(f);
        self
    }

    pub fn set_default_link_data<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn() -> E + Send + Sync + 'static,
    {
        self.default_link_data = Box::new(f);
        self
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    /// Idempotent: re-calling with new data updates the data but not the
    /// structure (links, parent, children are untouched).
    pub fn set_node(&mut self, id: impl Into<String>, data: N) -> &mut Self {
        let id = id.into();
        if let Some(&idx) = self.node_index.get(&id) {
            self.nodes[idx].data = data;
            return self;
        }
        self.invalidate_adj();
        let idx = self.nodes.len();
        self.nodes.push(NodeEntry {
            id: id.clone(),
            data,
        });
        self.node_index.insert(id, idx);
        self
    }

    pub fn ensure_node(&mut self, id: impl Into<String>) -> &mut Self {
        let id = id.into();
        if self.node_index.contains_key(&id) {
            return self;
        }
        let data = (self.default_node_data)();
        self.set_node(id, data)
    }

    pub fn node(&self, id: &str) -> Option<&N> {
        self.node_index.get(id).map(|&idx| &self.nodes[idx].data)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut N> {
        self.node_index
            .get(id)
            .copied()
            .map(move |idx| &mut self.nodes[idx].data)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.id.as_str())
    }

    pub fn node_ids(&self) -> Vec<String> {
        self.nodes.iter().map(|n| n.id.clone()).collect()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn links(&self) -> impl Iterator<Item = &LinkKey> {
        self.links.iter().map(|l| &l.key)
    }

    pub fn link_keys(&self) -> Vec<LinkKey> {
        self.links.iter().map(|l| l.key.clone()).collect()
    }

    pub fn for_each_node<F>(&self, mut f: F)
    where
        F: FnMut(&str, &N),
    {
        for n in &self.nodes {
            f(&n.id, &n.data);
        }
    }

    pub fn for_each_node_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&str, &mut N),
    {
        for n in &mut self.nodes {
            f(&n.id, &mut n.data);
        }
    }

    pub fn for_each_link<F>(&self, mut f: F)
    where
        F: FnMut(&LinkKey, &E),
    {
        for l in &self.links {
            f(&l.key, &l.data);
        }
    }

    pub fn for_each_link_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&LinkKey, &mut E),
    {
        for l in &mut self.links {
            f(&l.key, &mut l.data);
        }
    }

    pub fn set_link(&mut self, n0: impl Into<String>, n1: impl Into<String>) -> &mut Self {
        self.set_link_named(n0, n1, None::<String>, None)
    }

    pub fn set_link_with_data(
        &mut self,
        n0: impl Into<String>,
        n1: impl Into<String>,
        data: E,
    ) -> &mut Self {
        self.set_link_named(n0, n1, None::<String>, Some(data))
    }

    pub fn set_link_named(
        &mut self,
        n0: impl Into<String>,
        n1: impl Into<String>,
        name: Option<impl Into<String>>,
        data: Option<E>,
    ) -> &mut Self {
        let (n0, n1) = self.canonicalize_endpoints(n0.into(), n1.into());
        self.ensure_node(n0.clone());
        self.ensure_node(n1.clone());

        let name = self.canonicalize_name(name.map(Into::into));
        let key = LinkKey { n0, n1, name };

        if let Some(&idx) = self.link_index.get(&key) {
            if let Some(data) = data {
                self.links[idx].data = data;
            }
            return self;
        }

        self.invalidate_adj();
        let idx = self.links.len();
        self.links.push(LinkEntry {
            key: key.clone(),
            data: data.unwrap_or_else(|| (self.default_link_data)()),
        });
        self.link_index.insert(key, idx);
        self
    }

    pub fn set_link_key(&mut self, key: LinkKey, data: E) -> &mut Self {
        let key = self.canonicalize_key(key);
        self.set_link_named(key.n0, key.n1, key.name, Some(data))
    }

    pub fn set_path(&mut self, nodes: &[&str]) -> &mut Self {
        for pair in nodes.windows(2) {
            self.set_link(pair[0], pair[1]);
        }
        self
    }

    pub fn has_link(&self, n0: &str, n1: &str, name: Option<&str>) -> bool {
        let view = self.key_view(n0, n1, name);
        self.link_index_of_view(view).is_some()
    }

    pub fn link(&self, n0: &str, n1: &str, name: Option<&str>) -> Option<&E> {
        let view = self.key_view(n0, n1, name);
        let idx = self.link_index_of_view(view)?;
        Some(&self.links[idx].data)
    }

    pub fn link_mut(&mut self, n0: &str, n1: &str, name: Option<&str>) -> Option<&mut E> {
        let view = self.key_view(n0, n1, name);
        let idx = self.link_index_of_view(view)?;
        Some(&mut self.links[idx].data)
    }

    pub fn link_by_key(&self, key: &LinkKey) -> Option<&E> {
        let view = self.key_view_from_key(key);
        let idx = self.link_index_of_view(view)?;
        Some(&self.links[idx].data)
    }

    pub fn link_mut_by_key(&mut self, key: &LinkKey) -> Option<&mut E> {
        let view = self.key_view_from_key(key);
        let idx = self.link_index_of_view(view)?;
        Some(&mut self.links[idx].data)
    }

    fn del_link_at_index(&mut self, idx: usize) {
        self.invalidate_adj();
        let _ = self.link_index.remove_entry(&self.links[idx].key);
        self.links.remove(idx);
        for i in idx..self.links.len() {
            let k = &self.links[i].key;
            if let Some(v) = self.link_index.get_mut(k) {
                *v = i;
            }
        }
    }

    pub fn del_link_key(&mut self, key: &LinkKey) -> bool {
        let view = self.key_view_from_key(key);
        let Some(idx) = self.link_index_of_view(view) else {
            return false;
        };
        self.del_link_at_index(idx);
        true
    }

    pub fn del_link(&mut self, n0: &str, n1: &str, name: Option<&str>) -> bool {
        let view = self.key_view(n0, n1, name);
        let Some(idx) = self.link_index_of_view(view) else {
            return false;
        };
        self.del_link_at_index(idx);
        true
    }

    /// Deletes a node, all links touching it, and (on compound graphs)
    /// re-parents its children onto the node's own parent.
    pub fn del_node(&mut self, id: &str) -> bool {
        let Some(idx) = self.node_index.remove(id) else {
            return false;
        };

        self.invalidate_adj();
        self.nodes.remove(idx);
        for i in idx..self.nodes.len() {
            let node_id = self.nodes[i].id.as_str();
            if let Some(v) = self.node_index.get_mut(node_id) {
                *v = i;
            }
        }

        // Incident links.
        let mut removed_any = false;
        for l in &self.links {
            if l.key.n0 == id || l.key.n1 == id {
                removed_any = true;
                let _ = self.link_index.remove_entry(&l.key);
            }
        }
        if removed_any {
            self.links.retain(|l| l.key.n0 != id && l.key.n1 != id);
            for (i, l) in self.links.iter().enumerate() {
                if let Some(v) = self.link_index.get_mut(&l.key) {
                    *v = i;
                }
            }
        }

        // Parent forest: children move up to the deleted node's parent so the
        // forest stays connected where it was before.
        let own_parent = self.parent.remove(id);
        if let Some(p) = own_parent.as_deref() {
            if let Some(ch) = self.children.get_mut(p) {
                ch.retain(|c| c != id);
            }
        }
        if let Some(ch) = self.children.remove(id) {
            for child in ch {
                match own_parent.as_ref() {
                    Some(p) => {
                        self.parent.insert(child.clone(), p.clone());
                        let entry = self.children.entry(p.clone()).or_default();
                        if !entry.iter().any(|c| c == &child) {
                            entry.push(child);
                        }
                    }
                    None => {
                        self.parent.remove(&child);
                    }
                }
            }
        }

        true
    }

    /// Sets (or with `None`, clears) a node's parent. Fails if the graph is
    /// not compound or if the new parent is the node itself or one of its
    /// descendants.
    pub fn set_parent(
        &mut self,
        child: impl Into<String>,
        parent: Option<&str>,
    ) -> Result<(), GraphError> {
        if !self.options.compound {
            return Err(GraphError::NotCompound);
        }
        let child = child.into();

        let Some(parent) = parent else {
            self.clear_parent(&child);
            return Ok(());
        };

        // Walk up from the proposed parent; hitting `child` means the set
        // would close a cycle in the parent forest.
        let mut ancestor = Some(parent);
        while let Some(a) = ancestor {
            if a == child {
                return Err(GraphError::ParentCycle {
                    child,
                    parent: parent.to_string(),
                });
            }
            ancestor = self.parent.get(a).map(|s| s.as_str());
        }

        let parent = parent.to_string();
        self.ensure_node(child.clone());
        self.ensure_node(parent.clone());
        if let Some(prev) = self.parent.insert(child.clone(), parent.clone()) {
            if let Some(ch) = self.children.get_mut(&prev) {
                ch.retain(|c| c != &child);
            }
        }
        let entry = self.children.entry(parent).or_default();
        if !entry.iter().any(|c| c == &child) {
            entry.push(child);
        }
        Ok(())
    }

    pub fn clear_parent(&mut self, child: &str) -> &mut Self {
        if let Some(prev) = self.parent.remove(child) {
            if let Some(ch) = self.children.get_mut(&prev) {
                ch.retain(|c| c != child);
            }
        }
        self
    }

    pub fn parent(&self, child: &str) -> Option<&str> {
        self.parent.get(child).map(|s| s.as_str())
    }

    pub fn children(&self, parent: &str) -> Vec<&str> {
        self.children
            .get(parent)
            .map(|v| v.iter().map(|s| s.as_str()).collect::<Vec<_>>())
            .unwrap_or_default()
    }

    pub fn children_iter(&self, parent: &str) -> impl Iterator<Item = &str> {
        self.children
            .get(parent)
            .into_iter()
            .flat_map(|v| v.iter().map(|s| s.as_str()))
    }

    /// Nodes with no parent (the children of the implicit root).
    pub fn children_root(&self) -> Vec<&str> {
        if !self.options.compound {
            return self.nodes().collect();
        }
        self.nodes
            .iter()
            .filter(|n| !self.parent.contains_key(&n.id))
            .map(|n| n.id.as_str())
            .collect()
    }

    pub fn successors(&self, id: &str) -> Vec<&str> {
        if !self.options.directed {
            return self.adjacent_nodes(id);
        }
        let Some(&n_idx) = self.node_index.get(id) else {
            return Vec::new();
        };
        let cache = self.ensure_adj();
        let out_links = &cache.out[n_idx];
        let mut out: Vec<&str> = Vec::with_capacity(out_links.len());
        for &link_idx in out_links {
            let n1 = self.links[link_idx].key.n1.as_str();
            if !out.iter().any(|x| x == &n1) {
                out.push(n1);
            }
        }
        out
    }

    pub fn predecessors(&self, id: &str) -> Vec<&str> {
        if !self.options.directed {
            return self.adjacent_nodes(id);
        }
        let Some(&n_idx) = self.node_index.get(id) else {
            return Vec::new();
        };
        let cache = self.ensure_adj();
        let in_links = &cache.in_[n_idx];
        let mut out: Vec<&str> = Vec::with_capacity(in_links.len());
        for &link_idx in in_links {
            let n0 = self.links[link_idx].key.n0.as_str();
            if !out.iter().any(|x| x == &n0) {
                out.push(n0);
            }
        }
        out
    }

    /// Successor ids with the number of parallel links to each, in first-link
    /// order. The multiplicity weights rank/ordering computations.
    pub fn successor_counts(&self, id: &str) -> Vec<(&str, usize)> {
        let mut out: Vec<(&str, usize)> = Vec::new();
        self.for_each_successor(id, |n1| {
            if let Some(entry) = out.iter_mut().find(|(s, _)| *s == n1) {
                entry.1 += 1;
            } else {
                out.push((n1, 1));
            }
        });
        out
    }

    pub fn predecessor_counts(&self, id: &str) -> Vec<(&str, usize)> {
        let mut out: Vec<(&str, usize)> = Vec::new();
        self.for_each_predecessor(id, |n0| {
            if let Some(entry) = out.iter_mut().find(|(s, _)| *s == n0) {
                entry.1 += 1;
            } else {
                out.push((n0, 1));
            }
        });
        out
    }

    pub fn first_successor<'a>(&'a self, id: &str) -> Option<&'a str> {
        if !self.options.directed {
            return self.adjacent_nodes(id).into_iter().next();
        }
        let &n_idx = self.node_index.get(id)?;
        let n1 = {
            let cache = self.ensure_adj();
            let link_idx = *cache.out[n_idx].first()?;
            self.links[link_idx].key.n1.as_str()
        };
        Some(n1)
    }

    pub fn first_predecessor<'a>(&'a self, id: &str) -> Option<&'a str> {
        if !self.options.directed {
            return self.adjacent_nodes(id).into_iter().next();
        }
        let &n_idx = self.node_index.get(id)?;
        let n0 = {
            let cache = self.ensure_adj();
            let link_idx = *cache.in_[n_idx].first()?;
            self.links[link_idx].key.n0.as_str()
        };
        Some(n0)
    }

    pub fn for_each_successor<'a, F>(&'a self, id: &str, mut f: F)
    where
        F: FnMut(&'a str),
    {
        if !self.options.directed {
            for n in self.adjacent_nodes(id) {
                f(n);
            }
            return;
        }
        let Some(&n_idx) = self.node_index.get(id) else {
            return;
        };
        // Copy the indices out so the closure may issue adjacency queries of
        // its own without tripping the RefCell.
        let out: Vec<usize> = self.ensure_adj().out[n_idx].clone();
        for link_idx in out {
            f(self.links[link_idx].key.n1.as_str());
        }
    }

    pub fn for_each_predecessor<'a, F>(&'a self, id: &str, mut f: F)
    where
        F: FnMut(&'a str),
    {
        if !self.options.directed {
            for n in self.adjacent_nodes(id) {
                f(n);
            }
            return;
        }
        let Some(&n_idx) = self.node_index.get(id) else {
            return;
        };
        let in_: Vec<usize> = self.ensure_adj().in_[n_idx].clone();
        for link_idx in in_ {
            f(self.links[link_idx].key.n0.as_str());
        }
    }

    pub fn neighbors(&self, id: &str) -> Vec<&str> {
        if !self.options.directed {
            return self.adjacent_nodes(id);
        }
        let mut out: Vec<&str> = Vec::new();
        for n in self.successors(id) {
            if !out.iter().any(|x| x == &n) {
                out.push(n);
            }
        }
        for n in self.predecessors(id) {
            if !out.iter().any(|x| x == &n) {
                out.push(n);
            }
        }
        out
    }

    fn adjacent_nodes(&self, id: &str) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for l in &self.links {
            if l.key.n0 == id {
                let n1 = l.key.n1.as_str();
                if !out.iter().any(|x| x == &n1) {
                    out.push(n1);
                }
            } else if l.key.n1 == id {
                let n0 = l.key.n0.as_str();
                if !out.iter().any(|x| x == &n0) {
                    out.push(n0);
                }
            }
        }
        out
    }

    pub fn out_links(&self, n0: &str, n1: Option<&str>) -> Vec<LinkKey> {
        if self.options.directed {
            let Some(&idx) = self.node_index.get(n0) else {
                return Vec::new();
            };
            let cache = self.ensure_adj();
            let out_links = &cache.out[idx];
            let mut out: Vec<LinkKey> = Vec::with_capacity(out_links.len());
            for &link_idx in out_links {
                let l = &self.links[link_idx];
                if n1.is_none_or(|n1| l.key.n1 == n1) {
                    out.push(l.key.clone());
                }
            }
            return out;
        }

        self.links
            .iter()
            .filter(|l| {
                if l.key.n0 == n0 {
                    n1.is_none_or(|n1| l.key.n1 == n1)
                } else if l.key.n1 == n0 {
                    n1.is_none_or(|n1| l.key.n0 == n1)
                } else {
                    false
                }
            })
            .map(|l| l.key.clone())
            .collect()
    }

    pub fn in_links(&self, n1: &str, n0: Option<&str>) -> Vec<LinkKey> {
        if self.options.directed {
            let Some(&idx) = self.node_index.get(n1) else {
                return Vec::new();
            };
            let cache = self.ensure_adj();
            let in_links = &cache.in_[idx];
            let mut out: Vec<LinkKey> = Vec::with_capacity(in_links.len());
            for &link_idx in in_links {
                let l = &self.links[link_idx];
                if n0.is_none_or(|n0| l.key.n0 == n0) {
                    out.push(l.key.clone());
                }
            }
            return out;
        }
        self.out_links(n1, n0)
    }

    pub fn for_each_out_link<F>(&self, n0: &str, n1: Option<&str>, mut f: F)
    where
        F: FnMut(&LinkKey, &E),
    {
        if self.options.directed {
            let Some(&idx) = self.node_index.get(n0) else {
                return;
            };
            let out: Vec<usize> = self.ensure_adj().out[idx].clone();
            for link_idx in out {
                let l = &self.links[link_idx];
                if n1.is_none_or(|n1| l.key.n1 == n1) {
                    f(&l.key, &l.data);
                }
            }
            return;
        }

        for l in &self.links {
            if l.key.n0 == n0 {
                if n1.is_none_or(|n1| l.key.n1 == n1) {
                    f(&l.key, &l.data);
                }
            } else if l.key.n1 == n0 {
                if n1.is_none_or(|n1| l.key.n0 == n1) {
                    f(&l.key, &l.data);
                }
            }
        }
    }

    pub fn for_each_in_link<F>(&self, n1: &str, n0: Option<&str>, mut f: F)
    where
        F: FnMut(&LinkKey, &E),
    {
        if self.options.directed {
            let Some(&idx) = self.node_index.get(n1) else {
                return;
            };
            let in_: Vec<usize> = self.ensure_adj().in_[idx].clone();
            for link_idx in in_ {
                let l = &self.links[link_idx];
                if n0.is_none_or(|n0| l.key.n0 == n0) {
                    f(&l.key, &l.data);
                }
            }
            return;
        }

        self.for_each_out_link(n1, n0, f);
    }

    pub fn sources(&self) -> Vec<&str> {
        if !self.options.directed {
            return self.nodes().collect();
        }
        let cache = self.ensure_adj();
        self.nodes
            .iter()
            .enumerate()
            .filter(|(idx, _)| cache.in_[*idx].is_empty())
            .map(|(_, n)| n.id.as_str())
            .collect()
    }

    pub fn node_links(&self, id: &str) -> Vec<LinkKey> {
        let mut out: Vec<LinkKey> = Vec::new();
        let mut seen: HashSet<LinkKey> = HashSet::default();
        for l in &self.links {
            if (l.key.n0 == id || l.key.n1 == id) && seen.insert(l.key.clone()) {
                out.push(l.key.clone());
            }
        }
        out
    }
}

impl<N, E, G> Graph<N, E, G>
where
    N: Default + Clone + 'static,
    E: Default + Clone + 'static,
    G: Default + Clone,
{
    /// Induced subgraph over the nodes the predicate keeps. Links survive when
    /// both endpoints survive; on compound graphs each surviving node is
    /// re-parented onto its nearest surviving ancestor.
    pub fn filter_nodes<F>(&self, mut predicate: F) -> Graph<N, E, G>
    where
        F: FnMut(&str, &N) -> bool,
    {
        let mut filtered: Graph<N, E, G> = Graph::new(self.options);
        filtered.set_data(self.data.clone());

        for n in &self.nodes {
            if predicate(&n.id, &n.data) {
                filtered.set_node(n.id.clone(), n.data.clone());
            }
        }

        for l in &self.links {
            if filtered.has_node(&l.key.n0) && filtered.has_node(&l.key.n1) {
                filtered.set_link_key(l.key.clone(), l.data.clone());
            }
        }

        if self.options.compound {
            // Nearest surviving ancestor, iterative with a memo map keyed by
            // every node visited on the way up.
            let mut memo: HashMap<String, Option<String>> = HashMap::default();
            for id in filtered.node_ids() {
                let mut chain: Vec<String> = Vec::new();
                let mut cur = self.parent(&id).map(|s| s.to_string());
                let resolved: Option<String> = loop {
                    match cur {
                        None => break None,
                        Some(p) => {
                            if let Some(hit) = memo.get(&p) {
                                break hit.clone();
                            }
                            if filtered.has_node(&p) {
                                break Some(p);
                            }
                            chain.push(p.clone());
                            cur = self.parent(&p).map(|s| s.to_string());
                        }
                    }
                };
                for visited in chain {
                    memo.insert(visited, resolved.clone());
                }
                if let Some(p) = resolved {
                    // The source forest is acyclic, so this cannot fail.
                    let _ = filtered.set_parent(id, Some(&p));
                }
            }
        }

        filtered
    }
}
