//! Embedding-ready projections of linked symbols.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::models::{Symbol, SymbolType};
use crate::query::guards::MAX_DEPENDENCY_PREVIEW;

/// Flattened view of one symbol, the record handed to an embedding index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetrievalUnit {
    pub uid: String,
    pub symbol_type: SymbolType,
    pub name: String,
    pub qualified_name: String,
    pub file_path: String,
    pub signature: Option<String>,
    pub code: String,
    pub docstring: Option<String>,
    /// File name of the defining module.
    pub module: String,
    pub depends_on: Vec<String>,
    pub used_by: Vec<String>,
    pub external_dependencies: Vec<String>,
}

impl RetrievalUnit {
    /// Render the unit as a single text blob for embedding.
    pub fn to_embedding_text(&self) -> String {
        let mut sections = vec![format!(
            "{}: {}",
            self.symbol_type.label(),
            self.qualified_name
        )];

        if !self.depends_on.is_empty() {
            sections.push(format!("Calls: {}", preview(&self.depends_on)));
        }
        if !self.used_by.is_empty() {
            sections.push(format!("Called by: {}", preview(&self.used_by)));
        }
        if let Some(doc) = self.docstring.as_deref().filter(|d| !d.is_empty()) {
            sections.push(format!("Documentation:\n{doc}"));
        }
        if carries_code(self.symbol_type) && !self.code.is_empty() {
            sections.push(format!("Code:\n{}", self.code));
        }

        sections.join("\n\n")
    }
}

impl From<&Symbol> for RetrievalUnit {
    fn from(symbol: &Symbol) -> Self {
        let module = Path::new(&symbol.file_path)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| symbol.file_path.clone());
        Self {
            uid: symbol.uid.clone(),
            symbol_type: symbol.symbol_type,
            name: symbol.name.clone(),
            qualified_name: symbol.qualified_name.clone(),
            file_path: symbol.file_path.clone(),
            signature: extract_signature(symbol),
            code: symbol.code.clone(),
            docstring: symbol.docstring.clone(),
            module,
            depends_on: symbol.depends_on.clone(),
            used_by: symbol.used_by.clone(),
            external_dependencies: symbol.ext_dependencies.clone(),
        }
    }
}

fn carries_code(symbol_type: SymbolType) -> bool {
    matches!(
        symbol_type,
        SymbolType::Function | SymbolType::Class | SymbolType::Variable | SymbolType::Method
    )
}

fn preview(uids: &[String]) -> String {
    uids.iter()
        .take(MAX_DEPENDENCY_PREVIEW)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Best-effort one-line signature: the first line of a function's code or
/// `class <name>` for classes.
pub fn extract_signature(symbol: &Symbol) -> Option<String> {
    match symbol.symbol_type {
        SymbolType::Function | SymbolType::Method => symbol
            .code
            .trim()
            .lines()
            .next()
            .map(|line| line.trim_end().to_string())
            .filter(|line| !line.is_empty()),
        SymbolType::Class => Some(format!("class {}", symbol.name)),
        _ => None,
    }
}

pub fn build_retrieval_units(symbols: &[Symbol]) -> Vec<RetrievalUnit> {
    symbols.iter().map(RetrievalUnit::from).collect()
}
