//! In-memory cache of resolved per-file symbols, keyed by relative path and
//! content hash.

use std::collections::{HashMap, HashSet};

use crate::models::Symbol;

#[derive(Clone, Debug)]
struct CacheEntry {
    content_hash: String,
    symbols: Vec<Symbol>,
}

/// Resolved (unlinked) symbols of previously parsed files. An entry is only
/// served while the file's content hash is unchanged.
#[derive(Clone, Debug, Default)]
pub struct ParseCache {
    entries: HashMap<String, CacheEntry>,
}

impl ParseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, relative_path: &str, content_hash: &str) -> Option<&[Symbol]> {
        self.entries
            .get(relative_path)
            .filter(|entry| entry.content_hash == content_hash)
            .map(|entry| entry.symbols.as_slice())
    }

    /// Store symbols with their edge fields cleared; linking always reruns
    /// over the whole repository.
    pub fn insert(&mut self, relative_path: &str, content_hash: &str, symbols: &[Symbol]) {
        let symbols = symbols
            .iter()
            .cloned()
            .map(|mut symbol| {
                symbol.depends_on.clear();
                symbol.used_by.clear();
                symbol.ext_dependencies.clear();
                symbol
            })
            .collect();
        self.entries.insert(
            relative_path.to_string(),
            CacheEntry {
                content_hash: content_hash.to_string(),
                symbols,
            },
        );
    }

    /// Drop entries for files that are no longer part of the repository.
    pub fn retain_paths(&mut self, live: &HashSet<&str>) {
        self.entries.retain(|path, _| live.contains(path.as_str()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::make_symbol;
    use crate::models::SymbolType;

    #[test]
    fn test_hit_requires_matching_hash() {
        let mut cache = ParseCache::new();
        let symbols = vec![make_symbol("a", SymbolType::Module, "a.py", &[])];
        cache.insert("a.py", "h1", &symbols);

        assert_eq!(cache.get("a.py", "h1").map(|s| s.len()), Some(1));
        assert!(cache.get("a.py", "h2").is_none());
        assert!(cache.get("b.py", "h1").is_none());
    }

    #[test]
    fn test_insert_clears_edges() {
        let mut cache = ParseCache::new();
        let mut symbol = make_symbol("a", SymbolType::Module, "a.py", &["b"]);
        symbol.depends_on = vec!["b".to_string()];
        symbol.used_by = vec!["c".to_string()];
        cache.insert("a.py", "h", &[symbol]);

        let cached = &cache.get("a.py", "h").unwrap()[0];
        assert!(cached.depends_on.is_empty());
        assert!(cached.used_by.is_empty());
        assert_eq!(cached.imports, vec!["b".to_string()]);
    }

    #[test]
    fn test_retain_paths_evicts_removed_files() {
        let mut cache = ParseCache::new();
        cache.insert("a.py", "h", &[]);
        cache.insert("b.py", "h", &[]);
        let live: HashSet<&str> = ["a.py"].into_iter().collect();
        cache.retain_paths(&live);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("b.py", "h").is_none());
    }
}
