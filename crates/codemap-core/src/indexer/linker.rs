//! Repository-wide dependency linking.
//!
//! Every import target is looked up in the UID space of the whole
//! repository: a hit becomes a `depends_on` edge (mirrored into the
//! target's `used_by`), a miss becomes an external dependency. Edges are
//! computed into a standalone value first and applied afterwards, so the
//! symbol table is never mutated while it is being indexed.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::models::Symbol;

/// Edge sets for a symbol slice, indexed by symbol position.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DependencyEdges {
    depends_on: Vec<BTreeSet<String>>,
    used_by: Vec<BTreeSet<String>>,
    ext_dependencies: Vec<BTreeSet<String>>,
}

impl DependencyEdges {
    pub fn len(&self) -> usize {
        self.depends_on.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depends_on.is_empty()
    }

    /// Number of resolved (in-repository) edges.
    pub fn edge_count(&self) -> usize {
        self.depends_on.iter().map(BTreeSet::len).sum()
    }

    pub fn external_count(&self) -> usize {
        self.ext_dependencies.iter().map(BTreeSet::len).sum()
    }

    pub fn depends_on(&self, position: usize) -> impl Iterator<Item = &str> {
        self.depends_on
            .get(position)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    pub fn used_by(&self, position: usize) -> impl Iterator<Item = &str> {
        self.used_by
            .get(position)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Replace the edge fields of `symbols` (the same slice the edges were
    /// computed from) with these edge sets, sorted.
    pub fn apply(self, symbols: Vec<Symbol>) -> Vec<Symbol> {
        debug_assert_eq!(symbols.len(), self.len());
        symbols
            .into_iter()
            .zip(
                self.depends_on
                    .into_iter()
                    .zip(self.used_by)
                    .zip(self.ext_dependencies),
            )
            .map(|(mut symbol, ((depends_on, used_by), ext))| {
                symbol.depends_on = depends_on.into_iter().collect();
                symbol.used_by = used_by.into_iter().collect();
                symbol.ext_dependencies = ext.into_iter().collect();
                symbol
            })
            .collect()
    }
}

/// Resolve every symbol's imports against the UID index of `symbols`.
///
/// When several records share a UID the last one owns it: incoming
/// `used_by` edges land on that record only.
pub fn compute_edges(symbols: &[Symbol]) -> DependencyEdges {
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(symbols.len());
    for (position, symbol) in symbols.iter().enumerate() {
        index.insert(symbol.uid.as_str(), position);
    }

    let mut edges = DependencyEdges {
        depends_on: vec![BTreeSet::new(); symbols.len()],
        used_by: vec![BTreeSet::new(); symbols.len()],
        ext_dependencies: vec![BTreeSet::new(); symbols.len()],
    };

    for (position, symbol) in symbols.iter().enumerate() {
        for target in &symbol.imports {
            match index.get(target.as_str()) {
                Some(&owner) => {
                    edges.depends_on[position].insert(target.clone());
                    edges.used_by[owner].insert(symbol.uid.clone());
                }
                None => {
                    edges.ext_dependencies[position].insert(target.clone());
                }
            }
        }
    }

    debug!(
        symbols = symbols.len(),
        edges = edges.edge_count(),
        external = edges.external_count(),
        "Computed dependency edges"
    );
    edges
}

/// Compute and apply edges in one step.
pub fn link(symbols: Vec<Symbol>) -> Vec<Symbol> {
    let edges = compute_edges(&symbols);
    edges.apply(symbols)
}
