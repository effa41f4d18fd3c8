//! Codemap core library: static symbol extraction for Python repositories.
//!
//! The indexer walks a repository, extracts modules, classes, functions,
//! methods and module-level variables with tree-sitter, qualifies them into a
//! repository-wide name space and links their import edges. The resulting
//! snapshot feeds module/symbol dependency graphs and scope-filtered
//! retrieval over an external embedding search.

pub mod config;
pub mod errors;
pub mod graph;
pub mod indexer;
pub mod models;
pub mod query;

pub use config::ParseOptions;
pub use errors::{CodemapError, CodemapResult};
pub use graph::{
    build_module_edges, build_module_graph, build_symbol_graph, build_symbol_graph_with,
    induced_subgraph, DependencyGraph, GraphExport, ModuleEdge, ModuleGraph, SymbolGraph,
    SymbolGraphOptions,
};
pub use indexer::linker::{compute_edges, link, DependencyEdges};
pub use indexer::pipeline::{
    parse_repository, parse_repository_to, ParseOutcome, ParseReport, RepositoryParser,
};
pub use models::{RepoInfo, Snapshot, Symbol, SymbolType};
pub use query::context::{expand_with_dependencies, ExpandedSymbol, SymbolIndex};
pub use query::scope::{
    filter_candidates, Candidate, NearestNeighborSearch, Scope, ScopeRetriever, ScoredSymbol,
};
pub use query::units::{build_retrieval_units, RetrievalUnit};
