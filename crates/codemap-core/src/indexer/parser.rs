//! tree-sitter front end for Python sources.
//!
//! A file only becomes a `ParsedUnit` when its syntax tree is clean: any
//! ERROR or MISSING node rejects the whole file.

use tree_sitter::{Node, Parser, Tree};

use crate::errors::{CodemapError, CodemapResult};

const UTF8_BOM: char = '\u{feff}';

/// A successfully parsed source file.
pub struct ParsedUnit {
    pub relative_path: String,
    pub source: String,
    pub tree: Tree,
}

impl ParsedUnit {
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Source lines split on `\n` with any trailing `\r` dropped. A final
    /// newline does not open an extra empty line.
    pub fn lines(&self) -> Vec<&str> {
        self.source.lines().collect()
    }

    pub fn line_count(&self) -> usize {
        self.source.lines().count().max(1)
    }
}

pub struct PythonParser {
    parser: Parser,
}

impl PythonParser {
    pub fn new() -> CodemapResult<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| CodemapError::Grammar(e.to_string()))?;
        Ok(Self { parser })
    }

    pub fn parse(&mut self, relative_path: &str, source: String) -> CodemapResult<ParsedUnit> {
        let tree = self
            .parser
            .parse(&source, None)
            .ok_or_else(|| CodemapError::file_parse(relative_path, "parser produced no tree"))?;

        let root = tree.root_node();
        if root.has_error() {
            let message = match first_error_position(root) {
                Some((line, column)) => format!("syntax error at line {line}, column {column}"),
                None => "syntax error".to_string(),
            };
            return Err(CodemapError::file_parse(relative_path, message));
        }

        Ok(ParsedUnit {
            relative_path: relative_path.to_string(),
            source,
            tree,
        })
    }
}

/// Decode raw file bytes as UTF-8, dropping a leading byte-order mark.
pub fn decode_source(relative_path: &str, bytes: Vec<u8>) -> CodemapResult<String> {
    let mut source = String::from_utf8(bytes)
        .map_err(|e| CodemapError::file_parse(relative_path, format!("invalid UTF-8: {e}")))?;
    if source.starts_with(UTF8_BOM) {
        source.drain(..UTF8_BOM.len_utf8());
    }
    Ok(source)
}

/// 1-based (line, column) of the first ERROR or MISSING node in document order.
fn first_error_position(root: Node<'_>) -> Option<(usize, usize)> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            let pos = node.start_position();
            return Some((pos.row + 1, pos.column + 1));
        }
        if !node.has_error() {
            continue;
        }
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    None
}
