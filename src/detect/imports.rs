//! Unused-import detection.

use std::collections::HashSet;

use crate::syntax::{ImportKind, Node, SyntaxTree};

use super::{Category, Issue, Severity};

/// Report every name bound by an import that is never referenced as a bare
/// identifier. No line is attributed; two imports binding the same name can
/// produce duplicate issues.
///
/// The reported name is the name the import binds, not the text imported:
/// `import os.path` is reported as `os`, `import a as b` as `b`. Wildcard
/// imports and `from __future__ import ...` bind nothing checkable and are
/// never reported.
pub fn detect_unused_imports(tree: &SyntaxTree) -> Vec<Issue> {
    let referenced: HashSet<&str> = tree.walk().filter_map(Node::as_name).collect();

    bound_names(tree)
        .into_iter()
        .filter(|name| !referenced.contains(name))
        .map(|name| {
            Issue::new(
                Severity::Warning,
                Category::CodeQuality,
                format!("Unused import: {}", name),
                None,
            )
        })
        .collect()
}

/// Names that import statements bind, in source order.
fn bound_names(tree: &SyntaxTree) -> Vec<&str> {
    let mut names = Vec::new();
    for node in tree.walk() {
        let Node::Import(stmt) = node else {
            continue;
        };
        match &stmt.kind {
            ImportKind::Direct(aliases) => {
                for alias in aliases {
                    // `import os.path` binds `os`
                    let bound = match &alias.asname {
                        Some(asname) => asname.as_str(),
                        None => alias.name.split('.').next().unwrap_or(&alias.name),
                    };
                    names.push(bound);
                }
            }
            ImportKind::From { module, names: imported, .. } => {
                if module == "__future__" {
                    continue;
                }
                for alias in imported {
                    if alias.name == "*" {
                        continue;
                    }
                    names.push(alias.asname.as_deref().unwrap_or(&alias.name));
                }
            }
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse;

    fn unused(source: &str) -> Vec<String> {
        detect_unused_imports(&parse(source).unwrap())
            .into_iter()
            .map(|i| i.message)
            .collect()
    }

    #[test]
    fn test_reports_only_unreferenced() {
        assert_eq!(
            unused("import os\nimport sys\nprint(os.getcwd())\n"),
            vec!["Unused import: sys"]
        );
    }

    #[test]
    fn test_alias_is_the_bound_name() {
        assert_eq!(
            unused("import numpy as np\nfrom json import loads as parse_json\nnp.zeros(3)\n"),
            vec!["Unused import: parse_json"]
        );
    }

    #[test]
    fn test_dotted_import_binds_first_component() {
        assert!(unused("import os.path\nos.path.join('a', 'b')\n").is_empty());
    }

    #[test]
    fn test_wildcard_and_future_are_ignored() {
        assert!(unused("from __future__ import annotations\nfrom math import *\n").is_empty());
    }

    #[test]
    fn test_attribute_name_is_not_a_reference() {
        assert_eq!(
            unused("import path\nimport os\nos.path\n"),
            vec!["Unused import: path"]
        );
    }
}
