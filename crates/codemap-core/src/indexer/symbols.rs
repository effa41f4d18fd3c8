//! Symbol extraction from Python syntax trees.
//!
//! Produces one `RawSymbol` per class, function (at any depth), module-level
//! variable and module. Names are local here: a method is `Class.method`, a
//! variable is its bare name, and the module carries its file stem. The
//! resolver turns these into repository-wide qualified names.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tree_sitter::Node;

use crate::errors::{CodemapError, CodemapResult};
use crate::indexer::filesystem::FileDescriptor;
use crate::indexer::imports::ImportTable;
use crate::indexer::parser::{decode_source, ParsedUnit, PythonParser};
use crate::models::SymbolType;

const TAB_SIZE: usize = 8;

// ---------------------------------------------------------------------------
// Extracted types
// ---------------------------------------------------------------------------

/// A symbol as it appears in one file, before module qualification.
#[derive(Clone, Debug, PartialEq)]
pub struct RawSymbol {
    pub symbol_type: SymbolType,
    pub name: String,
    /// Dotted path through enclosing classes (`Outer.Inner.method`).
    pub local_qname: String,
    /// Local qualified name of the nearest enclosing class.
    pub parent_class: Option<String>,
    pub start_lineno: usize,
    pub end_lineno: usize,
    pub docstring: Option<String>,
    /// Raw import targets, sorted and deduplicated.
    pub imports: Vec<String>,
    pub is_async: Option<bool>,
    pub exports: Option<Vec<String>>,
    pub value_repr: Option<String>,
    pub code: String,
}

// ---------------------------------------------------------------------------
// SyntaxIndexer
// ---------------------------------------------------------------------------

/// Parses files and extracts their symbols. Holds one tree-sitter parser, so
/// each worker thread owns its own indexer.
pub struct SyntaxIndexer {
    parser: PythonParser,
}

impl SyntaxIndexer {
    pub fn new() -> CodemapResult<Self> {
        Ok(Self {
            parser: PythonParser::new()?,
        })
    }

    pub fn index(&mut self, file: &FileDescriptor) -> CodemapResult<Vec<RawSymbol>> {
        let bytes = std::fs::read(&file.path)
            .map_err(|e| CodemapError::file_parse(&file.relative_path, e.to_string()))?;
        let source = decode_source(&file.relative_path, bytes)?;
        self.index_source(&file.relative_path, source)
    }

    pub fn index_source(
        &mut self,
        relative_path: &str,
        source: String,
    ) -> CodemapResult<Vec<RawSymbol>> {
        let unit = self.parser.parse(relative_path, source)?;
        Ok(extract_symbols(&unit))
    }
}

/// Extract every symbol of a parsed file: definitions in source order, then
/// module-level variables, then the module itself.
pub fn extract_symbols(unit: &ParsedUnit) -> Vec<RawSymbol> {
    let root = unit.root();
    let imports = ImportTable::from_tree(root, &unit.source);
    let mut extraction = Extraction {
        source: &unit.source,
        lines: unit.lines(),
        imports: &imports,
        symbols: Vec::new(),
    };

    let mut class_stack = Vec::new();
    extraction.visit_statements(root, &mut class_stack);
    let exports = extraction.collect_variables(root);

    let stem = Path::new(&unit.relative_path)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let end_lineno = unit.line_count();
    let module = RawSymbol {
        symbol_type: SymbolType::Module,
        name: stem.clone(),
        local_qname: stem,
        parent_class: None,
        start_lineno: 1,
        end_lineno,
        docstring: docstring_of_body(root, &unit.source),
        imports: imports.all_targets(),
        is_async: None,
        exports: Some(exports),
        value_repr: None,
        code: extraction.slice(1, end_lineno),
    };
    extraction.symbols.push(module);
    extraction.symbols
}

struct Extraction<'a> {
    source: &'a str,
    lines: Vec<&'a str>,
    imports: &'a ImportTable,
    symbols: Vec<RawSymbol>,
}

impl<'a> Extraction<'a> {
    /// Walk statement containers looking for definitions. Expressions are
    /// never descended: they cannot hold a `def` or `class`.
    fn visit_statements(&mut self, node: Node<'_>, class_stack: &mut Vec<String>) {
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
        for child in children {
            match child.kind() {
                "class_definition" => self.visit_class(child, child, class_stack),
                "function_definition" => self.visit_function(child, child, class_stack),
                "decorated_definition" => {
                    let Some(definition) = child.child_by_field_name("definition") else {
                        continue;
                    };
                    match definition.kind() {
                        "class_definition" => self.visit_class(definition, child, class_stack),
                        "function_definition" => {
                            self.visit_function(definition, child, class_stack)
                        }
                        _ => {}
                    }
                }
                kind if holds_statements(kind) => self.visit_statements(child, class_stack),
                _ => {}
            }
        }
    }

    /// `definition` supplies name, span and body; `outer` (the decorated
    /// wrapper when present) supplies the names the symbol uses.
    fn visit_class(&mut self, definition: Node<'_>, outer: Node<'_>, class_stack: &mut Vec<String>) {
        let Some(name_node) = definition.child_by_field_name("name") else {
            return;
        };
        let name = node_text(name_node, self.source);
        let local_qname = nest(class_stack.last(), &name);
        let (start_lineno, end_lineno) = definition_span(definition);
        let body = definition.child_by_field_name("body");

        self.symbols.push(RawSymbol {
            symbol_type: SymbolType::Class,
            name,
            local_qname: local_qname.clone(),
            parent_class: class_stack.last().cloned(),
            start_lineno,
            end_lineno,
            docstring: body.and_then(|b| docstring_of_body(b, self.source)),
            imports: self.imports.targets_for(&used_names(outer, self.source)),
            is_async: None,
            exports: None,
            value_repr: None,
            code: self.slice(start_lineno, end_lineno),
        });

        if let Some(body) = body {
            class_stack.push(local_qname);
            self.visit_statements(body, class_stack);
            class_stack.pop();
        }
    }

    fn visit_function(
        &mut self,
        definition: Node<'_>,
        outer: Node<'_>,
        class_stack: &mut Vec<String>,
    ) {
        let Some(name_node) = definition.child_by_field_name("name") else {
            return;
        };
        let name = node_text(name_node, self.source);
        let parent_class = class_stack.last().cloned();
        let symbol_type = if parent_class.is_some() {
            SymbolType::Method
        } else {
            SymbolType::Function
        };
        let (start_lineno, end_lineno) = definition_span(definition);
        let body = definition.child_by_field_name("body");

        self.symbols.push(RawSymbol {
            symbol_type,
            local_qname: nest(parent_class.as_ref(), &name),
            name,
            parent_class,
            start_lineno,
            end_lineno,
            docstring: body.and_then(|b| docstring_of_body(b, self.source)),
            imports: self.imports.targets_for(&used_names(outer, self.source)),
            is_async: Some(is_async_definition(definition)),
            exports: None,
            value_repr: None,
            code: self.slice(start_lineno, end_lineno),
        });

        if let Some(body) = body {
            self.visit_statements(body, class_stack);
        }
    }

    /// Emit a variable symbol per simple-name target of each top-level
    /// assignment and return the sorted set of assigned names.
    fn collect_variables(&mut self, root: Node<'_>) -> Vec<String> {
        let mut exports = BTreeSet::new();
        let mut cursor = root.walk();
        let statements: Vec<Node<'_>> = root.named_children(&mut cursor).collect();
        for statement in statements {
            if statement.kind() != "expression_statement" || statement.named_child_count() != 1 {
                continue;
            }
            let Some(assignment) = statement.named_child(0) else {
                continue;
            };
            if assignment.kind() != "assignment" {
                continue;
            }

            let (targets, value) = assignment_targets(assignment, self.source);
            if targets.is_empty() {
                continue;
            }
            let (start_lineno, end_lineno) = line_span(statement);
            let imports = self.imports.targets_for(&used_names(statement, self.source));
            let value_repr = value.map(|v| node_text(v, self.source));
            let code = self.slice(start_lineno, end_lineno);

            for target in targets {
                exports.insert(target.clone());
                self.symbols.push(RawSymbol {
                    symbol_type: SymbolType::Variable,
                    name: target.clone(),
                    local_qname: target,
                    parent_class: None,
                    start_lineno,
                    end_lineno,
                    docstring: None,
                    imports: imports.clone(),
                    is_async: None,
                    exports: None,
                    value_repr: value_repr.clone(),
                    code: code.clone(),
                });
            }
        }
        exports.into_iter().collect()
    }

    /// Lines `start..=end` (1-based) joined with `\n`.
    fn slice(&self, start: usize, end: usize) -> String {
        let from = start.saturating_sub(1).min(self.lines.len());
        let to = end.min(self.lines.len()).max(from);
        self.lines[from..to].join("\n")
    }
}

fn holds_statements(kind: &str) -> bool {
    kind == "block"
        || kind.ends_with("_clause")
        || (kind.ends_with("_statement") && kind != "expression_statement")
}

fn nest(parent: Option<&String>, name: &str) -> String {
    match parent {
        Some(parent) => format!("{parent}.{name}"),
        None => name.to_string(),
    }
}

fn is_async_definition(definition: Node<'_>) -> bool {
    definition
        .child(0)
        .map(|first| first.kind() == "async")
        .unwrap_or(false)
}

/// Simple-name targets of a possibly chained assignment (`a = b = value`)
/// and the final value node, if any.
fn assignment_targets<'t>(assignment: Node<'t>, source: &str) -> (Vec<String>, Option<Node<'t>>) {
    let mut targets = Vec::new();
    let mut current = assignment;
    loop {
        if let Some(left) = current.child_by_field_name("left") {
            if left.kind() == "identifier" {
                targets.push(node_text(left, source));
            }
        }
        match current.child_by_field_name("right") {
            Some(right) if right.kind() == "assignment" => current = right,
            other => return (targets, other),
        }
    }
}

// ---------------------------------------------------------------------------
// Spans and text
// ---------------------------------------------------------------------------

/// 1-based inclusive line span. A node ending at column 0 of a later row
/// ends on the previous line.
pub fn line_span(node: Node<'_>) -> (usize, usize) {
    let start = node.start_position();
    let end = node.end_position();
    let start_lineno = start.row + 1;
    let end_lineno = if end.column == 0 && end.row > start.row {
        end.row
    } else {
        end.row + 1
    };
    (start_lineno, end_lineno.max(start_lineno))
}

/// Span of a class or function definition, ending at its last statement.
/// Comments trailing the body are attached to the block by tree-sitter but
/// are not part of the definition.
pub fn definition_span(definition: Node<'_>) -> (usize, usize) {
    let (start_lineno, _) = line_span(definition);
    (start_lineno, statement_end(definition).max(start_lineno))
}

fn statement_end(node: Node<'_>) -> usize {
    let mut cursor = node.walk();
    let last = node
        .named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .last();
    match last {
        Some(child) if node.kind() == "block" || opens_block(child.kind()) => statement_end(child),
        _ => line_span(node).1,
    }
}

fn opens_block(kind: &str) -> bool {
    kind == "block"
        || kind.ends_with("_clause")
        || kind.ends_with("_definition")
        || (kind.ends_with("_statement") && kind != "expression_statement")
}

fn node_text(node: Node<'_>, source: &str) -> String {
    source
        .get(node.start_byte()..node.end_byte())
        .unwrap_or("")
        .trim()
        .to_string()
}

// ---------------------------------------------------------------------------
// Used names
// ---------------------------------------------------------------------------

/// Identifiers in expression position anywhere under `node`. Definition
/// names, parameter names, keyword-argument names, attribute members and
/// anything inside import or global/nonlocal statements are excluded.
pub fn used_names(node: Node<'_>, source: &str) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        match current.kind() {
            "import_statement"
            | "import_from_statement"
            | "future_import_statement"
            | "global_statement"
            | "nonlocal_statement"
            | "comment" => continue,
            "identifier" => {
                if is_expression_identifier(current) {
                    names.insert(node_text(current, source));
                }
                continue;
            }
            _ => {}
        }
        let mut cursor = current.walk();
        stack.extend(current.named_children(&mut cursor));
    }
    names
}

fn is_expression_identifier(node: Node<'_>) -> bool {
    let Some(parent) = node.parent() else {
        return true;
    };
    let is_field = |field: &str| parent.child_by_field_name(field) == Some(node);
    match parent.kind() {
        "attribute" => !is_field("attribute"),
        "function_definition" | "class_definition" | "keyword_argument" => !is_field("name"),
        "default_parameter" | "typed_default_parameter" => !is_field("name"),
        "parameters" | "lambda_parameters" | "typed_parameter" => false,
        "as_pattern_target" => !parent
            .parent()
            .is_some_and(|p| p.kind() == "as_pattern" && within_except_clause(p)),
        "as_pattern" if is_field("alias") => !within_except_clause(parent),
        "except_clause" | "except_group_clause" => {
            !(is_field("alias") || node.prev_sibling().is_some_and(|prev| prev.kind() == "as"))
        }
        "list_splat_pattern" | "dictionary_splat_pattern" => !parent
            .parent()
            .map(|p| {
                matches!(
                    p.kind(),
                    "parameters" | "lambda_parameters" | "typed_parameter"
                )
            })
            .unwrap_or(false),
        _ => true,
    }
}

/// The name bound by `except E as name` is a plain binding, not a use.
fn within_except_clause(node: Node<'_>) -> bool {
    node.parent()
        .is_some_and(|p| matches!(p.kind(), "except_clause" | "except_group_clause"))
}

// ---------------------------------------------------------------------------
// Docstrings
// ---------------------------------------------------------------------------

static STRING_OPENING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?P<prefix>[A-Za-z]{0,2})(?P<quote>'''|"""|'|")"#).unwrap()
});

/// Cleaned docstring of a module root or definition body: the first
/// statement, when it is a lone plain string literal.
pub fn docstring_of_body(body: Node<'_>, source: &str) -> Option<String> {
    let mut cursor = body.walk();
    let first = body
        .named_children(&mut cursor)
        .find(|child| child.kind() != "comment")?;
    if first.kind() != "expression_statement" || first.named_child_count() != 1 {
        return None;
    }
    let literal = literal_string_value(first.named_child(0)?, source)?;
    Some(cleandoc(&literal))
}

fn literal_string_value(node: Node<'_>, source: &str) -> Option<String> {
    match node.kind() {
        "string" => decode_string_literal(&node_text(node, source)),
        "concatenated_string" => {
            let mut cursor = node.walk();
            let parts: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
            let mut value = String::new();
            for part in parts {
                if part.kind() == "comment" {
                    continue;
                }
                value.push_str(&literal_string_value(part, source)?);
            }
            Some(value)
        }
        "parenthesized_expression" => {
            let mut cursor = node.walk();
            let inner = node
                .named_children(&mut cursor)
                .find(|child| child.kind() != "comment")?;
            literal_string_value(inner, source)
        }
        _ => None,
    }
}

/// Value of a plain (non-bytes, non-formatted) string literal.
pub fn decode_string_literal(raw: &str) -> Option<String> {
    let captures = STRING_OPENING.captures(raw)?;
    let prefix = captures.name("prefix")?.as_str().to_ascii_lowercase();
    // Only `r`/`u` prefixes yield a str constant; f-, b- and t-strings do not.
    if prefix.chars().any(|c| !matches!(c, 'r' | 'u')) {
        return None;
    }
    let quote = captures.name("quote")?.as_str();
    let open = prefix.len() + quote.len();
    if raw.len() < open + quote.len() || !raw.ends_with(quote) {
        return None;
    }
    let body = raw[open..raw.len() - quote.len()].replace("\r\n", "\n");
    if prefix.contains('r') {
        Some(body)
    } else {
        Some(unescape(&body))
    }
}

fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        let Some(next) = chars.next() else {
            out.push('\\');
            break;
        };
        match next {
            '\n' => {}
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0c}'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\u{0b}'),
            '0'..='7' => {
                let mut digits = String::from(next);
                while digits.len() < 3 {
                    match chars.peek() {
                        Some(d @ '0'..='7') => {
                            digits.push(*d);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                match u32::from_str_radix(&digits, 8).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push('\\');
                        out.push_str(&digits);
                    }
                }
            }
            'x' | 'u' | 'U' => {
                let width = match next {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let digits: String = chars.clone().take(width).collect();
                let decoded = (digits.len() == width && digits.chars().all(|c| c.is_ascii_hexdigit()))
                    .then(|| u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32))
                    .flatten();
                match decoded {
                    Some(decoded) => {
                        out.push(decoded);
                        for _ in 0..width {
                            chars.next();
                        }
                    }
                    None => {
                        out.push('\\');
                        out.push(next);
                    }
                }
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    out
}

/// Normalize docstring indentation: expand tabs, strip the first line's
/// leading whitespace, remove the common margin of the remaining lines and
/// drop blank lines at both ends.
pub fn cleandoc(doc: &str) -> String {
    let mut lines: Vec<String> = doc.split('\n').map(expand_tabs).collect();

    let margin = lines
        .iter()
        .skip(1)
        .filter_map(|line| {
            let content = line.trim_start();
            if content.is_empty() {
                None
            } else {
                Some(line.chars().count() - content.chars().count())
            }
        })
        .min();

    if let Some(first) = lines.first_mut() {
        *first = first.trim_start().to_string();
    }
    if let Some(margin) = margin {
        for line in lines.iter_mut().skip(1) {
            *line = line.chars().skip(margin).collect();
        }
    }

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    let leading = lines.iter().take_while(|l| l.is_empty()).count();
    lines.drain(..leading);
    lines.join("\n")
}

fn expand_tabs(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut column = 0;
    for ch in line.chars() {
        if ch == '\t' {
            let pad = TAB_SIZE - column % TAB_SIZE;
            out.extend(std::iter::repeat(' ').take(pad));
            column += pad;
        } else {
            out.push(ch);
            column += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(path: &str, source: &str) -> Vec<RawSymbol> {
        let mut indexer = SyntaxIndexer::new().unwrap();
        indexer.index_source(path, source.to_string()).unwrap()
    }

    fn find<'s>(symbols: &'s [RawSymbol], local_qname: &str) -> &'s RawSymbol {
        symbols
            .iter()
            .find(|s| s.local_qname == local_qname && !matches!(s.symbol_type, SymbolType::Module))
            .unwrap_or_else(|| panic!("missing symbol {local_qname}"))
    }

    #[test]
    fn test_functions_classes_and_methods() {
        let source = "\
import os

class Service:
    \"\"\"Runs things.\"\"\"

    def start(self, path):
        return os.path.join(path, 'x')

    class Config:
        def load(self):
            pass

def main():
    Service().start('.')
";
        let symbols = extract("pkg/service.py", source);

        let class = find(&symbols, "Service");
        assert_eq!(class.symbol_type, SymbolType::Class);
        assert_eq!((class.start_lineno, class.end_lineno), (3, 11));
        assert_eq!(class.docstring.as_deref(), Some("Runs things."));
        assert_eq!(class.imports, vec!["os".to_string()]);

        let start = find(&symbols, "Service.start");
        assert_eq!(start.symbol_type, SymbolType::Method);
        assert_eq!(start.parent_class.as_deref(), Some("Service"));
        assert_eq!((start.start_lineno, start.end_lineno), (6, 7));
        assert_eq!(start.is_async, Some(false));
        assert_eq!(
            start.code,
            "    def start(self, path):\n        return os.path.join(path, 'x')"
        );

        let load = find(&symbols, "Service.Config.load");
        assert_eq!(load.symbol_type, SymbolType::Method);
        assert_eq!(load.parent_class.as_deref(), Some("Service.Config"));

        let main = find(&symbols, "main");
        assert_eq!(main.symbol_type, SymbolType::Function);
        assert!(main.parent_class.is_none());
        assert!(main.imports.is_empty());
    }

    #[test]
    fn test_nested_definitions_qualify_by_class_chain() {
        let source = "\
class A:
    def m(self):
        def helper():
            return 1
        return helper()

def outer():
    class Local:
        pass
    async def inner():
        pass
";
        let symbols = extract("n.py", source);
        let helper = find(&symbols, "A.helper");
        assert_eq!(helper.symbol_type, SymbolType::Method);
        assert_eq!(helper.parent_class.as_deref(), Some("A"));

        let local = find(&symbols, "Local");
        assert_eq!(local.symbol_type, SymbolType::Class);
        assert!(local.parent_class.is_none());

        let inner = find(&symbols, "inner");
        assert_eq!(inner.symbol_type, SymbolType::Function);
        assert_eq!(inner.is_async, Some(true));
    }

    #[test]
    fn test_decorated_definition_spans_def_line() {
        let source = "\
from functools import lru_cache

@lru_cache(maxsize=None)
def cached(x):
    return x
";
        let symbols = extract("d.py", source);
        let cached = find(&symbols, "cached");
        assert_eq!((cached.start_lineno, cached.end_lineno), (4, 5));
        assert_eq!(cached.imports, vec!["functools.lru_cache".to_string()]);
    }

    #[test]
    fn test_module_level_variables() {
        let source = "\
import os
A = B = os.sep
C: int = 3
D: str
E, F = 1, 2
G += 1
if True:
    H = 4
";
        let symbols = extract("v.py", source);
        let variables: Vec<&str> = symbols
            .iter()
            .filter(|s| s.symbol_type == SymbolType::Variable)
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(variables, vec!["A", "B", "C", "D"]);

        let a = find(&symbols, "A");
        assert_eq!(a.value_repr.as_deref(), Some("os.sep"));
        assert_eq!(a.imports, vec!["os".to_string()]);
        assert_eq!(a.code, "A = B = os.sep");
        assert_eq!(find(&symbols, "C").value_repr.as_deref(), Some("3"));
        assert!(find(&symbols, "D").value_repr.is_none());

        let module = symbols.last().unwrap();
        assert_eq!(
            module.exports.as_deref(),
            Some(&["A".to_string(), "B".to_string(), "C".to_string(), "D".to_string()][..])
        );
    }

    #[test]
    fn test_module_symbol() {
        let source = "\"\"\"Helpers.\n\n    Details here.\n\"\"\"\nimport os\nfrom b import g\n\nX = 1\n";
        let symbols = extract("pkg/helpers.py", source);
        let module = symbols.last().unwrap();
        assert_eq!(module.symbol_type, SymbolType::Module);
        assert_eq!(module.name, "helpers");
        assert_eq!((module.start_lineno, module.end_lineno), (1, 8));
        assert_eq!(module.docstring.as_deref(), Some("Helpers.\n\nDetails here."));
        assert_eq!(module.imports, vec!["b.g".to_string(), "os".to_string()]);
        assert_eq!(module.code, source.trim_end_matches('\n'));
        assert_eq!(
            symbols.iter().filter(|s| s.symbol_type == SymbolType::Module).count(),
            1
        );
    }

    #[test]
    fn test_used_names_skip_binding_positions() {
        let source = "\
import json
import config

def dump(json_arg, *args, indent=config, **kwargs):
    return json.dumps(json_arg, indent=indent, sort_keys=True).config
";
        let symbols = extract("u.py", source);
        let dump = find(&symbols, "dump");
        assert_eq!(dump.imports, vec!["config".to_string(), "json".to_string()]);

        let source = "import config\n\ndef f(config):\n    return 1\n";
        let symbols = extract("p.py", source);
        assert!(find(&symbols, "f").imports.is_empty());

        let source = "import sort_keys\n\ndef g(x):\n    return x.sort_keys(sort_keys=1)\n";
        let symbols = extract("k.py", source);
        assert!(find(&symbols, "g").imports.is_empty());
    }

    #[test]
    fn test_code_slice_strips_carriage_returns() {
        let symbols = extract("w.py", "def f():\r\n    return 1\r\n");
        assert_eq!(find(&symbols, "f").code, "def f():\n    return 1");
    }

    #[test]
    fn test_docstring_variants() {
        let symbols = extract(
            "s.py",
            "def a():\n    # note\n    'single'\n\ndef b():\n    f'formatted'\n\ndef c():\n    r'raw\\n' 'joined'\n\ndef d():\n    x = 'not a doc'\n",
        );
        assert_eq!(find(&symbols, "a").docstring.as_deref(), Some("single"));
        assert!(find(&symbols, "b").docstring.is_none());
        assert_eq!(find(&symbols, "c").docstring.as_deref(), Some("raw\\njoined"));
        assert!(find(&symbols, "d").docstring.is_none());
    }

    #[test]
    fn test_decode_string_literal() {
        assert_eq!(decode_string_literal("'a\\tb'").as_deref(), Some("a\tb"));
        assert_eq!(decode_string_literal("\"\\x41\\u00e9\"").as_deref(), Some("Aé"));
        assert_eq!(decode_string_literal("'\\q'").as_deref(), Some("\\q"));
        assert_eq!(decode_string_literal("b'bytes'"), None);
        assert_eq!(decode_string_literal("u'text'").as_deref(), Some("text"));
        assert_eq!(decode_string_literal("'''multi\nline'''").as_deref(), Some("multi\nline"));
    }

    #[test]
    fn test_cleandoc() {
        assert_eq!(cleandoc("  Summary.\n\n    Body line.\n      Indented.\n  "), "Summary.\n\nBody line.\n  Indented.");
        assert_eq!(cleandoc("\n\n  Only body.\n"), "Only body.");
        assert_eq!(cleandoc("One line"), "One line");
        assert_eq!(cleandoc("Tabbed.\n\tline"), "Tabbed.\nline");
    }

    #[test]
    fn test_line_span_single_line() {
        let symbols = extract("o.py", "def f(): return 1\n");
        let f = find(&symbols, "f");
        assert_eq!((f.start_lineno, f.end_lineno), (1, 1));
    }

    #[test]
    fn test_trailing_comments_end_outside_definitions() {
        let source = "\
def f():
    return 1
    # more to come

class A:
    x = 1

    # trailing comment

def g(flag):
    if flag:
        return 1
    else:
        return 2
        # unreachable
";
        let symbols = extract("c.py", source);

        let f = find(&symbols, "f");
        assert_eq!((f.start_lineno, f.end_lineno), (1, 2));
        assert_eq!(f.code, "def f():\n    return 1");

        let class = find(&symbols, "A");
        assert_eq!((class.start_lineno, class.end_lineno), (5, 6));

        let g = find(&symbols, "g");
        assert_eq!((g.start_lineno, g.end_lineno), (10, 14));
    }

    #[test]
    fn test_except_alias_is_not_a_use() {
        let source = "\
import os

def f():
    try:
        pass
    except ValueError as os:
        pass

def g():
    try:
        pass
    except os.error as err:
        return err
";
        let symbols = extract("e.py", source);
        assert!(find(&symbols, "f").imports.is_empty());
        assert_eq!(find(&symbols, "g").imports, vec!["os".to_string()]);
    }

    #[test]
    fn test_malformed_file_is_rejected() {
        let mut indexer = SyntaxIndexer::new().unwrap();
        let err = indexer
            .index_source("bad.py", "class :\n".to_string())
            .unwrap_err();
        assert!(err.is_recoverable());
    }
}
