//! Error types for the codemap core library.

use std::path::PathBuf;

/// Top-level error enum for the codemap core library.
#[derive(Debug, thiserror::Error)]
pub enum CodemapError {
    /// The repository root is missing or cannot be walked. Aborts a parse.
    #[error("Discovery error for {root}: {message}")]
    Discovery { root: PathBuf, message: String },

    /// A single file could not be read or parsed. The pipeline recovers from
    /// this by skipping the file.
    #[error("Parse error in {path}: {message}")]
    FileParse { path: String, message: String },

    /// The tree-sitter grammar could not be loaded into a parser.
    #[error("Grammar error: {0}")]
    Grammar(String),

    #[error("Invalid scope: {0}")]
    InvalidScope(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CodemapError {
    pub fn file_parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        CodemapError::FileParse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// True for errors the pipeline recovers from at file granularity.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CodemapError::FileParse { .. })
    }
}

pub type CodemapResult<T> = Result<T, CodemapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_parse_is_recoverable() {
        let err = CodemapError::file_parse("pkg/a.py", "syntax error at line 3");
        assert!(err.is_recoverable());
        assert_eq!(
            err.to_string(),
            "Parse error in pkg/a.py: syntax error at line 3"
        );
    }

    #[test]
    fn test_discovery_is_fatal() {
        let err = CodemapError::Discovery {
            root: PathBuf::from("/missing"),
            message: "not a directory".to_string(),
        };
        assert!(!err.is_recoverable());
    }
}
