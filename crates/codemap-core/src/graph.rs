//! Module- and symbol-level dependency graphs over a linked symbol table.
//!
//! Both graphs are `petgraph` digraphs with a string-id index kept in
//! insertion order, so node and edge listings are deterministic for a
//! deterministic symbol table.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use indexmap::IndexMap;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{Symbol, SymbolType};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub tooltip: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
}

/// A dependency whose target UID has no owner in the symbol table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedEdge {
    pub source: String,
    pub target_uid: String,
}

/// Serializable form of a graph.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphExport {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub dropped_edges: Vec<DroppedEdge>,
}

#[derive(Clone, Debug, Default)]
pub struct DependencyGraph {
    graph: DiGraph<GraphNode, ()>,
    index: IndexMap<String, NodeIndex>,
    dropped_edges: Vec<DroppedEdge>,
}

/// Nodes are file paths; `u → v` when a module in `u` depends on a symbol
/// defined in `v`.
pub type ModuleGraph = DependencyGraph;

/// Nodes are symbol UIDs; `a → b` for every `b` in `a.depends_on`.
pub type SymbolGraph = DependencyGraph;

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node unless one with the same id exists; returns its index.
    pub fn add_node(&mut self, node: GraphNode) -> NodeIndex {
        if let Some(&idx) = self.index.get(&node.id) {
            return idx;
        }
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.index.insert(id, idx);
        idx
    }

    /// Add `source → target` once. Returns false when either end is unknown
    /// or the edge already exists.
    pub fn add_edge(&mut self, source: &str, target: &str) -> bool {
        let (Some(&from), Some(&to)) = (self.index.get(source), self.index.get(target)) else {
            return false;
        };
        if self.graph.find_edge(from, to).is_some() {
            return false;
        }
        self.graph.add_edge(from, to, ());
        true
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.index.get(id).map(|&idx| &self.graph[idx])
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.index.values().map(move |&idx| &self.graph[idx])
    }

    /// Edges as `(source, target)` ids, in insertion order.
    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.graph
            .edge_references()
            .map(|edge| {
                (
                    self.graph[edge.source()].id.as_str(),
                    self.graph[edge.target()].id.as_str(),
                )
            })
            .collect()
    }

    pub fn has_edge(&self, source: &str, target: &str) -> bool {
        match (self.index.get(source), self.index.get(target)) {
            (Some(&from), Some(&to)) => self.graph.find_edge(from, to).is_some(),
            _ => false,
        }
    }

    /// Sorted ids of the nodes `id` points to.
    pub fn successors(&self, id: &str) -> Vec<&str> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// Sorted ids of the nodes pointing at `id`.
    pub fn predecessors(&self, id: &str) -> Vec<&str> {
        self.neighbors(id, Direction::Incoming)
    }

    fn neighbors(&self, id: &str, direction: Direction) -> Vec<&str> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        let mut ids: Vec<&str> = self
            .graph
            .neighbors_directed(idx, direction)
            .map(|n| self.graph[n].id.as_str())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    pub fn dropped_edges(&self) -> &[DroppedEdge] {
        &self.dropped_edges
    }

    /// In- plus out-degree of `id`; 0 for unknown ids.
    pub fn degree(&self, id: &str) -> usize {
        self.index.get(id).map_or(0, |&idx| {
            self.graph.edges_directed(idx, Direction::Outgoing).count()
                + self.graph.edges_directed(idx, Direction::Incoming).count()
        })
    }

    pub fn export(&self) -> GraphExport {
        GraphExport {
            nodes: self.nodes().cloned().collect(),
            edges: self
                .edges()
                .into_iter()
                .map(|(source, target)| GraphEdge {
                    source: source.to_string(),
                    target: target.to_string(),
                })
                .collect(),
            dropped_edges: self.dropped_edges.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

fn file_node(file_path: &str) -> GraphNode {
    let label = Path::new(file_path)
        .file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_else(|| file_path.to_string());
    GraphNode {
        id: file_path.to_string(),
        label,
        tooltip: file_path.to_string(),
    }
}

/// Collapse module-level dependencies to a file graph.
///
/// Every module symbol's file becomes a node (isolated files included).
/// Each `depends_on` UID of a module symbol is mapped to the file that owns
/// it; self-edges are skipped, duplicates merged, and UIDs with no owner are
/// reported in `dropped_edges`.
pub fn build_module_graph(symbols: &[Symbol]) -> ModuleGraph {
    let mut uid_to_file: HashMap<&str, &str> = HashMap::with_capacity(symbols.len());
    for symbol in symbols {
        uid_to_file.insert(symbol.uid.as_str(), symbol.file_path.as_str());
    }

    let mut graph = DependencyGraph::new();
    for module in symbols.iter().filter(|s| s.is_module()) {
        graph.add_node(file_node(&module.file_path));
    }

    for module in symbols.iter().filter(|s| s.is_module()) {
        for uid in &module.depends_on {
            match uid_to_file.get(uid.as_str()) {
                Some(&target) if target == module.file_path => {}
                Some(&target) => {
                    graph.add_node(file_node(target));
                    graph.add_edge(&module.file_path, target);
                }
                None => graph.dropped_edges.push(DroppedEdge {
                    source: module.file_path.clone(),
                    target_uid: uid.clone(),
                }),
            }
        }
    }

    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        dropped = graph.dropped_edges.len(),
        "Built module graph"
    );
    graph
}

/// Which symbols a symbol graph keeps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymbolGraphOptions {
    pub include_functions: bool,
    pub include_classes: bool,
    /// Keep only symbols defined in this file.
    pub file_path: Option<String>,
    /// Keep at most this many nodes, the most connected first.
    pub max_nodes: Option<usize>,
}

impl Default for SymbolGraphOptions {
    fn default() -> Self {
        Self {
            include_functions: true,
            include_classes: true,
            file_path: None,
            max_nodes: None,
        }
    }
}

impl SymbolGraphOptions {
    pub fn for_file(file_path: impl Into<String>) -> Self {
        Self {
            file_path: Some(file_path.into()),
            ..Self::default()
        }
    }

    fn admits(&self, symbol: &Symbol) -> bool {
        match symbol.symbol_type {
            SymbolType::Function if !self.include_functions => return false,
            SymbolType::Class if !self.include_classes => return false,
            _ => {}
        }
        self.file_path
            .as_deref()
            .map_or(true, |path| symbol.file_path == path)
    }
}

/// Symbol-level graph: one node per UID, an edge per resolvable
/// `depends_on` entry.
pub fn build_symbol_graph(symbols: &[Symbol]) -> SymbolGraph {
    build_symbol_graph_with(symbols, &SymbolGraphOptions::default())
}

/// Symbol graph restricted by `options`. Edges need both ends kept; only
/// targets unknown to the whole symbol table are reported as dropped.
pub fn build_symbol_graph_with(symbols: &[Symbol], options: &SymbolGraphOptions) -> SymbolGraph {
    let known: HashSet<&str> = symbols.iter().map(|s| s.uid.as_str()).collect();
    let kept: Vec<&Symbol> = symbols.iter().filter(|s| options.admits(s)).collect();

    let mut graph = DependencyGraph::new();
    for symbol in &kept {
        graph.add_node(GraphNode {
            id: symbol.uid.clone(),
            label: symbol.name.clone(),
            tooltip: format!(
                "{}:{}-{}",
                symbol.file_path, symbol.start_lineno, symbol.end_lineno
            ),
        });
    }
    for symbol in &kept {
        for target in &symbol.depends_on {
            if !known.contains(target.as_str()) {
                graph.dropped_edges.push(DroppedEdge {
                    source: symbol.uid.clone(),
                    target_uid: target.clone(),
                });
                continue;
            }
            graph.add_edge(&symbol.uid, target);
        }
    }

    match options.max_nodes {
        Some(max_nodes) if graph.node_count() > max_nodes => {
            let capped = most_connected(&graph, max_nodes);
            debug!(
                nodes = graph.node_count(),
                kept = max_nodes,
                "Capped symbol graph by degree"
            );
            capped
        }
        _ => graph,
    }
}

/// Induced subgraph over the `limit` highest-degree nodes. Ties keep the
/// parent graph's node order.
fn most_connected(graph: &DependencyGraph, limit: usize) -> DependencyGraph {
    let mut ranked: Vec<(&str, usize)> = graph
        .nodes()
        .map(|node| (node.id.as_str(), graph.degree(&node.id)))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    let selected: Vec<&str> = ranked.into_iter().take(limit).map(|(id, _)| id).collect();

    let mut sub = induced_subgraph(graph, &selected);
    let kept: HashSet<&str> = selected.into_iter().collect();
    sub.dropped_edges = graph
        .dropped_edges
        .iter()
        .filter(|dropped| kept.contains(dropped.source.as_str()))
        .cloned()
        .collect();
    sub
}

/// A dependency between two modules, keyed by qualified name.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModuleEdge {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub kind: String,
}

pub const DEPENDS_ON_EDGE: &str = "depends_on";

/// Module → module edges for every `depends_on` entry of a module symbol
/// that names another module, deduplicated and sorted by `(from, to)`.
pub fn build_module_edges(symbols: &[Symbol]) -> Vec<ModuleEdge> {
    let modules: HashSet<&str> = symbols
        .iter()
        .filter(|s| s.is_module())
        .map(|s| s.qualified_name.as_str())
        .collect();

    let mut edges: Vec<ModuleEdge> = symbols
        .iter()
        .filter(|s| s.is_module())
        .flat_map(|module| {
            module
                .depends_on
                .iter()
                .filter(|dep| modules.contains(dep.as_str()))
                .map(|dep| ModuleEdge {
                    from: module.qualified_name.clone(),
                    to: dep.clone(),
                    kind: DEPENDS_ON_EDGE.to_string(),
                })
        })
        .collect();
    edges.sort();
    edges.dedup();
    edges
}

/// Restrict `graph` to the selected node ids (unknown ids are ignored) and
/// the edges with both endpoints selected. Nodes keep the parent graph's
/// order; dropped-edge diagnostics are not carried over.
pub fn induced_subgraph<S: AsRef<str>>(graph: &DependencyGraph, nodes: &[S]) -> DependencyGraph {
    let mut sub = DependencyGraph::new();
    if nodes.is_empty() {
        return sub;
    }
    let selected: HashSet<&str> = nodes.iter().map(|n| n.as_ref()).collect();

    for node in graph.nodes().filter(|n| selected.contains(n.id.as_str())) {
        sub.add_node(node.clone());
    }
    for (source, target) in graph.edges() {
        if sub.contains_node(source) && sub.contains_node(target) {
            sub.add_edge(source, target);
        }
    }
    sub
}
