//! Module qualification: turns file-local raw symbols into repository-wide
//! symbols with qualified names, UIDs and surrogate ids.

use std::collections::BTreeSet;
use std::path::{Component, Path};

use crate::indexer::imports::absolutize_target;
use crate::indexer::symbols::RawSymbol;
use crate::models::{surrogate_symbol_id, Symbol, SymbolType};

/// Dotted module name of a repository-relative path: extension stripped,
/// separators turned into dots (`pkg/sub/mod.py` → `pkg.sub.mod`). Package
/// initializers keep their `__init__` segment.
pub fn module_qname(relative_path: &str) -> String {
    let path = Path::new(relative_path);
    let without_ext = path.with_extension("");
    let parts: Vec<String> = without_ext
        .components()
        .filter_map(|c| match c {
            Component::Normal(os) => Some(os.to_string_lossy().to_string()),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .collect();
    if parts.is_empty() {
        return path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
    }
    parts.join(".")
}

/// Qualify every raw symbol of one file.
pub fn resolve(relative_path: &str, raw_symbols: Vec<RawSymbol>) -> Vec<Symbol> {
    let module = module_qname(relative_path);
    raw_symbols
        .into_iter()
        .map(|raw| qualify(relative_path, &module, raw))
        .collect()
}

fn qualify(relative_path: &str, module: &str, raw: RawSymbol) -> Symbol {
    let (qualified_name, parent_class) = match raw.symbol_type {
        SymbolType::Module => (module.to_string(), None),
        SymbolType::Variable => (format!("{module}.{}", raw.name), None),
        SymbolType::Class | SymbolType::Function | SymbolType::Method => (
            format!("{module}.{}", raw.local_qname),
            raw.parent_class.map(|parent| format!("{module}.{parent}")),
        ),
    };

    let imports: Vec<String> = raw
        .imports
        .iter()
        .map(|target| absolutize_target(target, module))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let symbol_id = surrogate_symbol_id(
        relative_path,
        raw.symbol_type,
        &qualified_name,
        raw.start_lineno,
    );

    Symbol {
        file_path: relative_path.to_string(),
        symbol_type: raw.symbol_type,
        name: raw.name,
        uid: qualified_name.clone(),
        qualified_name,
        parent_class,
        start_lineno: raw.start_lineno,
        end_lineno: raw.end_lineno,
        docstring: raw.docstring,
        imports,
        is_async: raw.is_async,
        exports: raw.exports,
        value_repr: raw.value_repr,
        code: raw.code,
        symbol_id,
        depends_on: Vec::new(),
        used_by: Vec::new(),
        ext_dependencies: Vec::new(),
    }
}
