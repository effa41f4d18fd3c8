//! Scoped retrieval over an external nearest-neighbor search.
//!
//! A scope fixes which symbol types are eligible, how many candidates to
//! recall from the search backend and how many survive filtering:
//!
//! | scope    | eligible                    | recall | cap |
//! |----------|-----------------------------|--------|-----|
//! | `symbol` | function, class, variable   | 10     | 15  |
//! | `module` | module                      | 30     | 10  |
//! | `system` | module                      | 50     | 10  |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{CodemapError, CodemapResult};
use crate::models::{Symbol, SymbolType};
use crate::query::guards::truncate_query;

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Symbol,
    Module,
    System,
}

const SYMBOL_TYPES: &[SymbolType] = &[SymbolType::Function, SymbolType::Class, SymbolType::Variable];
const MODULE_TYPES: &[SymbolType] = &[SymbolType::Module];

impl Scope {
    pub const ALL: [Scope; 3] = [Scope::Symbol, Scope::Module, Scope::System];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Symbol => "symbol",
            Scope::Module => "module",
            Scope::System => "system",
        }
    }

    pub fn eligible_types(&self) -> &'static [SymbolType] {
        match self {
            Scope::Symbol => SYMBOL_TYPES,
            Scope::Module | Scope::System => MODULE_TYPES,
        }
    }

    pub fn is_eligible(&self, symbol_type: SymbolType) -> bool {
        self.eligible_types().contains(&symbol_type)
    }

    /// Candidates requested from the search backend.
    pub fn recall_k(&self) -> usize {
        match self {
            Scope::Symbol => 10,
            Scope::Module => 30,
            Scope::System => 50,
        }
    }

    /// Maximum results kept after filtering.
    pub fn final_k(&self) -> usize {
        match self {
            Scope::Symbol => 15,
            Scope::Module | Scope::System => 10,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = CodemapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "symbol" => Ok(Scope::Symbol),
            "module" => Ok(Scope::Module),
            "system" => Ok(Scope::System),
            other => Err(CodemapError::InvalidScope(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Candidates
// ---------------------------------------------------------------------------

/// Anything a search backend can return.
pub trait Candidate {
    /// `None` when the candidate has no recognizable type; such candidates
    /// are never eligible.
    fn symbol_type(&self) -> Option<SymbolType>;

    /// Distance reported by the backend; lower is better.
    fn score(&self) -> f32;
}

/// The `{score, symbol}` record produced by the embedding search, with the
/// symbol kept as an opaque JSON object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredSymbol {
    pub score: f32,
    pub symbol: serde_json::Value,
}

impl ScoredSymbol {
    pub fn uid(&self) -> Option<&str> {
        self.symbol.get("UID").and_then(|v| v.as_str())
    }
}

impl Candidate for ScoredSymbol {
    fn symbol_type(&self) -> Option<SymbolType> {
        self.symbol
            .get("symbol_type")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse().ok())
    }

    fn score(&self) -> f32 {
        self.score
    }
}

impl Candidate for (f32, Symbol) {
    fn symbol_type(&self) -> Option<SymbolType> {
        Some(self.1.symbol_type)
    }

    fn score(&self) -> f32 {
        self.0
    }
}

/// Keep eligible candidates in input order, at most `scope.final_k()` of
/// them. An empty result is a normal outcome.
pub fn filter_candidates<C: Candidate>(candidates: Vec<C>, scope: Scope) -> Vec<C> {
    candidates
        .into_iter()
        .filter(|c| c.symbol_type().is_some_and(|t| scope.is_eligible(t)))
        .take(scope.final_k())
        .collect()
}

// ---------------------------------------------------------------------------
// Retrieval
// ---------------------------------------------------------------------------

/// External nearest-neighbor search: `(query, k)` → ranked hits.
pub trait NearestNeighborSearch {
    type Hit: Candidate;

    fn search(&self, query: &str, k: usize) -> CodemapResult<Vec<Self::Hit>>;
}

pub struct ScopeRetriever<S> {
    search: S,
}

impl<S: NearestNeighborSearch> ScopeRetriever<S> {
    pub fn new(search: S) -> Self {
        Self { search }
    }

    /// Recall `scope.recall_k()` hits for the trimmed query, then filter.
    pub fn retrieve(&self, query: &str, scope: Scope) -> CodemapResult<Vec<S::Hit>> {
        let query = truncate_query(query);
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let hits = self.search.search(&query, scope.recall_k())?;
        let recalled = hits.len();
        let kept = filter_candidates(hits, scope);
        debug!(scope = %scope, recalled, kept = kept.len(), "Scoped retrieval");
        Ok(kept)
    }

    /// As `retrieve`, with the scope given by name.
    pub fn retrieve_named(&self, query: &str, scope: &str) -> CodemapResult<Vec<S::Hit>> {
        let scope: Scope = scope.parse()?;
        self.retrieve(query, scope)
    }

    pub fn backend(&self) -> &S {
        &self.search
    }
}
