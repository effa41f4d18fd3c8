//! One-hop dependency context around a symbol.
//!
//! Given a retrieved symbol, gather the symbols it depends on and the symbols
//! that use it so callers can present a primary hit with its neighborhood.

use std::collections::HashMap;

use serde::Serialize;

use crate::models::Symbol;

/// Lookup from qualified name to symbol. Later records win, matching the
/// linker's view of re-assigned names.
#[derive(Debug, Default)]
pub struct SymbolIndex<'a> {
    by_name: HashMap<&'a str, &'a Symbol>,
}

impl<'a> SymbolIndex<'a> {
    pub fn new(symbols: &'a [Symbol]) -> Self {
        let by_name = symbols
            .iter()
            .map(|symbol| (symbol.qualified_name.as_str(), symbol))
            .collect();
        Self { by_name }
    }

    pub fn get(&self, qualified_name: &str) -> Option<&'a Symbol> {
        self.by_name.get(qualified_name).copied()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    fn resolve_all(&self, uids: &[String]) -> Vec<&'a Symbol> {
        uids.iter().filter_map(|uid| self.get(uid)).collect()
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ExpandedSymbol<'a> {
    pub primary: &'a Symbol,
    pub depends_on: Vec<&'a Symbol>,
    pub used_by: Vec<&'a Symbol>,
}

/// Resolve `symbol`'s edge lists through `index`. Uids missing from the
/// index are skipped.
pub fn expand_with_dependencies<'a>(
    symbol: &'a Symbol,
    index: &SymbolIndex<'a>,
) -> ExpandedSymbol<'a> {
    ExpandedSymbol {
        primary: symbol,
        depends_on: index.resolve_all(&symbol.depends_on),
        used_by: index.resolve_all(&symbol.used_by),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::linker::link;
    use crate::models::tests::make_symbol;
    use crate::models::SymbolType;

    fn linked_pair() -> Vec<Symbol> {
        link(vec![
            make_symbol("a", SymbolType::Module, "a.py", &["b"]),
            make_symbol("b", SymbolType::Module, "b.py", &["os"]),
        ])
    }

    #[test]
    fn test_expand_resolves_both_directions() {
        let symbols = linked_pair();
        let index = SymbolIndex::new(&symbols);
        assert_eq!(index.len(), 2);

        let a = index.get("a").unwrap();
        let expanded = expand_with_dependencies(a, &index);
        assert_eq!(expanded.primary.uid, "a");
        assert_eq!(expanded.depends_on.len(), 1);
        assert_eq!(expanded.depends_on[0].uid, "b");
        assert!(expanded.used_by.is_empty());

        let b = index.get("b").unwrap();
        let expanded = expand_with_dependencies(b, &index);
        assert!(expanded.depends_on.is_empty());
        assert_eq!(expanded.used_by.len(), 1);
        assert_eq!(expanded.used_by[0].uid, "a");
    }

    #[test]
    fn test_unknown_edges_are_skipped() {
        let mut lone = make_symbol("a.f", SymbolType::Function, "a.py", &[]);
        lone.depends_on = vec!["gone.g".to_string()];
        let symbols = vec![lone];
        let index = SymbolIndex::new(&symbols);

        let expanded = expand_with_dependencies(&symbols[0], &index);
        assert!(expanded.depends_on.is_empty());
        assert!(index.get("gone.g").is_none());
    }

    #[test]
    fn test_index_last_wins() {
        let mut first = make_symbol("a.X", SymbolType::Variable, "a.py", &[]);
        first.start_lineno = 1;
        let mut second = make_symbol("a.X", SymbolType::Variable, "a.py", &[]);
        second.start_lineno = 4;
        let symbols = vec![first, second];

        let index = SymbolIndex::new(&symbols);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("a.X").unwrap().start_lineno, 4);
    }
}
