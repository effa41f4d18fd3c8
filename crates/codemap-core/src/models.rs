//! Shared typed models used across indexing, graph, and query layers.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::errors::{CodemapError, CodemapResult};

// ---------------------------------------------------------------------------
// SymbolType
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolType {
    Module,
    Class,
    Function,
    Method,
    Variable,
}

impl SymbolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolType::Module => "module",
            SymbolType::Class => "class",
            SymbolType::Function => "function",
            SymbolType::Method => "method",
            SymbolType::Variable => "variable",
        }
    }

    /// Capitalized label used in rendered text ("Function", "Module", ...).
    pub fn label(&self) -> &'static str {
        match self {
            SymbolType::Module => "Module",
            SymbolType::Class => "Class",
            SymbolType::Function => "Function",
            SymbolType::Method => "Method",
            SymbolType::Variable => "Variable",
        }
    }
}

impl fmt::Display for SymbolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SymbolType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "module" => Ok(SymbolType::Module),
            "class" => Ok(SymbolType::Class),
            "function" => Ok(SymbolType::Function),
            "method" => Ok(SymbolType::Method),
            "variable" => Ok(SymbolType::Variable),
            other => Err(format!("unknown symbol type: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Symbol
// ---------------------------------------------------------------------------

/// A fully qualified symbol as stored in the snapshot.
///
/// `depends_on`, `used_by` and `ext_dependencies` stay empty until the
/// repository-wide linking pass has run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub file_path: String,
    pub symbol_type: SymbolType,
    pub name: String,
    pub qualified_name: String,
    pub parent_class: Option<String>,
    pub start_lineno: usize,
    pub end_lineno: usize,
    pub docstring: Option<String>,
    pub imports: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_async: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exports: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_repr: Option<String>,
    pub code: String,
    #[serde(rename = "UID")]
    pub uid: String,
    pub symbol_id: String,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub used_by: Vec<String>,
    #[serde(default)]
    pub ext_dependencies: Vec<String>,
}

impl Symbol {
    pub fn is_module(&self) -> bool {
        self.symbol_type == SymbolType::Module
    }
}

/// Derive the surrogate key for a symbol record: the first 16 hex chars of
/// SHA-256 over its file, type, qualified name and start line.
pub fn surrogate_symbol_id(
    file_path: &str,
    symbol_type: SymbolType,
    qualified_name: &str,
    start_lineno: usize,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(file_path.as_bytes());
    hasher.update([0u8]);
    hasher.update(symbol_type.as_str().as_bytes());
    hasher.update([0u8]);
    hasher.update(qualified_name.as_bytes());
    hasher.update([0u8]);
    hasher.update(start_lineno.to_string().as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..16].to_string()
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RepoInfo {
    pub name: String,
    pub language: String,
    pub absolute_path: String,
}

/// The canonical artifact of a parse: repository metadata plus the flat,
/// linked symbol table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub repo: RepoInfo,
    pub symbols: Vec<Symbol>,
}

impl Snapshot {
    pub fn to_json(&self) -> CodemapResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Persist the snapshot. The JSON is written to a sibling temporary file
    /// and renamed over `path`, so a failed write keeps the previous snapshot.
    pub fn save(&self, path: &Path) -> CodemapResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let payload = self.to_json()?;
        let file_name = path
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_else(|| "snapshot.json".to_string());
        let tmp_path = path.with_file_name(format!(".{file_name}.tmp"));
        std::fs::write(&tmp_path, payload.as_bytes())?;
        if let Err(err) = std::fs::rename(&tmp_path, path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(CodemapError::Io(err));
        }
        Ok(())
    }

    pub fn load(path: &Path) -> CodemapResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn module_symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter().filter(|s| s.is_module())
    }

    /// Last symbol carrying `uid`, matching the linker's last-wins index.
    pub fn find_by_uid(&self, uid: &str) -> Option<&Symbol> {
        self.symbols.iter().rev().find(|s| s.uid == uid)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn make_symbol(
        uid: &str,
        symbol_type: SymbolType,
        file_path: &str,
        imports: &[&str],
    ) -> Symbol {
        let name = uid.rsplit('.').next().unwrap_or(uid).to_string();
        Symbol {
            file_path: file_path.to_string(),
            symbol_type,
            name,
            qualified_name: uid.to_string(),
            parent_class: None,
            start_lineno: 1,
            end_lineno: 1,
            docstring: None,
            imports: imports.iter().map(|s| s.to_string()).collect(),
            is_async: None,
            exports: None,
            value_repr: None,
            code: String::new(),
            uid: uid.to_string(),
            symbol_id: surrogate_symbol_id(file_path, symbol_type, uid, 1),
            depends_on: Vec::new(),
            used_by: Vec::new(),
            ext_dependencies: Vec::new(),
        }
    }

    #[test]
    fn test_symbol_type_round_trip_str() {
        for ty in [
            SymbolType::Module,
            SymbolType::Class,
            SymbolType::Function,
            SymbolType::Method,
            SymbolType::Variable,
        ] {
            assert_eq!(ty.as_str().parse::<SymbolType>().unwrap(), ty);
        }
        assert!("lambda".parse::<SymbolType>().is_err());
    }

    #[test]
    fn test_symbol_serializes_uid_key() {
        let symbol = make_symbol("pkg.mod.func", SymbolType::Function, "pkg/mod.py", &[]);
        let value = serde_json::to_value(&symbol).unwrap();
        assert_eq!(value["UID"], "pkg.mod.func");
        assert_eq!(value["symbol_type"], "function");
        assert!(value.get("uid").is_none());
        assert!(value.get("exports").is_none());
        assert!(value["parent_class"].is_null());
    }

    #[test]
    fn test_surrogate_symbol_id_distinguishes_reassignment() {
        let first = surrogate_symbol_id("a.py", SymbolType::Variable, "a.X", 1);
        let second = surrogate_symbol_id("a.py", SymbolType::Variable, "a.X", 4);
        assert_ne!(first, second);
        assert_eq!(first.len(), 16);
        assert_eq!(
            first,
            surrogate_symbol_id("a.py", SymbolType::Variable, "a.X", 1)
        );
    }

    #[test]
    fn test_snapshot_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifacts").join("symbols.json");
        let snapshot = Snapshot {
            repo: RepoInfo {
                name: "demo".to_string(),
                language: "python".to_string(),
                absolute_path: "/tmp/demo".to_string(),
            },
            symbols: vec![make_symbol("a", SymbolType::Module, "a.py", &["os"])],
        };
        snapshot.save(&path).unwrap();
        assert!(!dir.path().join("artifacts").join(".symbols.json.tmp").exists());
        let loaded = Snapshot::load(&path).unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn test_find_by_uid_last_wins() {
        let mut first = make_symbol("a.X", SymbolType::Variable, "a.py", &[]);
        first.start_lineno = 1;
        let mut second = make_symbol("a.X", SymbolType::Variable, "a.py", &[]);
        second.start_lineno = 3;
        let snapshot = Snapshot {
            repo: RepoInfo {
                name: "demo".to_string(),
                language: "python".to_string(),
                absolute_path: "/tmp/demo".to_string(),
            },
            symbols: vec![first, second],
        };
        assert_eq!(snapshot.find_by_uid("a.X").unwrap().start_lineno, 3);
        assert!(snapshot.find_by_uid("a.Y").is_none());
    }
}
