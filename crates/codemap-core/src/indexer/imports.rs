//! Import alias tables and relative-import absolutization.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use tree_sitter::Node;

/// Bound name → dotted import target for every import statement in a file.
///
/// `import a.b` binds `a.b → a.b`, `from m import x as y` binds `y → m.x`,
/// `from .m import x` binds `x → .m.x` and `from m import *` binds
/// `* → m.*`. A later binding of the same name replaces the earlier one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportTable {
    bindings: IndexMap<String, String>,
}

impl ImportTable {
    /// Collect bindings from every import statement under `root`, at any
    /// depth, in document order.
    pub fn from_tree(root: Node<'_>, source: &str) -> Self {
        let mut table = Self::default();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            match node.kind() {
                "import_statement" => {
                    table.add_import(node, source);
                    continue;
                }
                "import_from_statement" | "future_import_statement" => {
                    table.add_from_import(node, source);
                    continue;
                }
                _ => {}
            }
            let mut cursor = node.walk();
            let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
        table
    }

    pub fn insert(&mut self, bound: impl Into<String>, target: impl Into<String>) {
        self.bindings.insert(bound.into(), target.into());
    }

    pub fn get(&self, bound: &str) -> Option<&str> {
        self.bindings.get(bound).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Every import target, deduplicated and sorted.
    pub fn all_targets(&self) -> Vec<String> {
        self.bindings
            .values()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Targets of the bound names that appear in `used`, deduplicated and
    /// sorted.
    pub fn targets_for<'a, I>(&self, used: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        used.into_iter()
            .filter_map(|name| self.bindings.get(name).cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn add_import(&mut self, node: Node<'_>, source: &str) {
        let mut cursor = node.walk();
        for child in node.children_by_field_name("name", &mut cursor) {
            match child.kind() {
                "dotted_name" => {
                    let dotted = compact_text(child, source);
                    self.insert(dotted.clone(), dotted);
                }
                "aliased_import" => {
                    let Some(name) = child.child_by_field_name("name") else {
                        continue;
                    };
                    let dotted = compact_text(name, source);
                    let bound = child
                        .child_by_field_name("alias")
                        .map(|alias| compact_text(alias, source))
                        .unwrap_or_else(|| dotted.clone());
                    self.insert(bound, dotted);
                }
                _ => {}
            }
        }
    }

    fn add_from_import(&mut self, node: Node<'_>, source: &str) {
        let module = if node.kind() == "future_import_statement" {
            "__future__".to_string()
        } else {
            node.child_by_field_name("module_name")
                .map(|m| compact_text(m, source))
                .unwrap_or_default()
        };

        let mut cursor = node.walk();
        let has_wildcard = node
            .named_children(&mut cursor)
            .any(|child| child.kind() == "wildcard_import");
        if has_wildcard {
            self.insert("*", join_target(&module, "*"));
            return;
        }

        let mut cursor = node.walk();
        for child in node.children_by_field_name("name", &mut cursor) {
            let (name, bound) = match child.kind() {
                "dotted_name" => {
                    let name = compact_text(child, source);
                    (name.clone(), name)
                }
                "aliased_import" => {
                    let Some(name_node) = child.child_by_field_name("name") else {
                        continue;
                    };
                    let name = compact_text(name_node, source);
                    let bound = child
                        .child_by_field_name("alias")
                        .map(|alias| compact_text(alias, source))
                        .unwrap_or_else(|| name.clone());
                    (name, bound)
                }
                _ => continue,
            };
            self.insert(bound, join_target(&module, &name));
        }
    }
}

/// `module` + `.` + `name`, except that a bare relative prefix (`.`, `..`)
/// is followed directly by the name.
fn join_target(module: &str, name: &str) -> String {
    if module.is_empty() {
        name.to_string()
    } else if module.ends_with('.') {
        format!("{module}{name}")
    } else {
        format!("{module}.{name}")
    }
}

fn compact_text(node: Node<'_>, source: &str) -> String {
    source
        .get(node.start_byte()..node.end_byte())
        .unwrap_or("")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Make a relative import target absolute against the importing module.
///
/// The package of `module_qname` is the name without its last part; each
/// leading dot beyond the first climbs one more level. Absolute targets
/// are returned unchanged, and targets that climb above the repository
/// root are kept verbatim.
pub fn absolutize_target(target: &str, module_qname: &str) -> String {
    if !target.starts_with('.') {
        return target.to_string();
    }
    let level = target.chars().take_while(|c| *c == '.').count();
    let rest = &target[level..];

    let mut package: Vec<&str> = module_qname.split('.').filter(|p| !p.is_empty()).collect();
    package.pop();
    let up = level - 1;
    if up > package.len() {
        return target.to_string();
    }
    package.truncate(package.len() - up);
    package.extend(rest.split('.').filter(|p| !p.is_empty()));
    if package.is_empty() {
        target.to_string()
    } else {
        package.join(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::parser::PythonParser;

    fn table_for(source: &str) -> ImportTable {
        let mut parser = PythonParser::new().unwrap();
        let unit = parser.parse("t.py", source.to_string()).unwrap();
        ImportTable::from_tree(unit.root(), &unit.source)
    }

    #[test]
    fn test_plain_and_aliased_imports() {
        let table = table_for("import os\nimport os.path\nimport numpy as np\n");
        assert_eq!(table.get("os"), Some("os"));
        assert_eq!(table.get("os.path"), Some("os.path"));
        assert_eq!(table.get("np"), Some("numpy"));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_from_imports() {
        let table = table_for(
            "from b import g\nfrom pkg.mod import (x as y, z)\nfrom __future__ import annotations\n",
        );
        assert_eq!(table.get("g"), Some("b.g"));
        assert_eq!(table.get("y"), Some("pkg.mod.x"));
        assert_eq!(table.get("z"), Some("pkg.mod.z"));
        assert_eq!(table.get("annotations"), Some("__future__.annotations"));
        assert!(table.get("x").is_none());
    }

    #[test]
    fn test_relative_and_wildcard_imports() {
        let table = table_for("from .sibling import a\nfrom .. import b\nfrom . import c\nfrom m import *\n");
        assert_eq!(table.get("a"), Some(".sibling.a"));
        assert_eq!(table.get("b"), Some("..b"));
        assert_eq!(table.get("c"), Some(".c"));
        assert_eq!(table.get("*"), Some("m.*"));
    }

    #[test]
    fn test_nested_imports_are_collected() {
        let table = table_for("def f():\n    import json\n    return json\n");
        assert_eq!(table.get("json"), Some("json"));
    }

    #[test]
    fn test_targets_for_sorted_and_deduplicated() {
        let table = table_for("from b import g\nimport os\nfrom b import g as h\n");
        let used: Vec<String> = vec!["os".into(), "h".into(), "g".into(), "unused".into()];
        assert_eq!(table.targets_for(&used), vec!["b.g".to_string(), "os".to_string()]);
        assert_eq!(table.all_targets(), vec!["b.g".to_string(), "os".to_string()]);
    }

    #[test]
    fn test_absolutize_target() {
        assert_eq!(absolutize_target("os.path", "pkg.sub.mod"), "os.path");
        assert_eq!(absolutize_target(".m.x", "pkg.sub.mod"), "pkg.sub.m.x");
        assert_eq!(absolutize_target("..x", "pkg.sub.mod"), "pkg.x");
        assert_eq!(absolutize_target(".x", "pkg.__init__"), "pkg.x");
        assert_eq!(absolutize_target("...x", "pkg.mod"), "...x");
        assert_eq!(absolutize_target(".x", "top"), "x");
    }
}
