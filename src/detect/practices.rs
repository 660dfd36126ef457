//! Bad-practice checks: bare exception handlers and mutable default arguments.

use crate::syntax::{Node, SyntaxTree};

use super::{Category, Issue, Severity};

/// One warning per `except:` without an exception type, at the handler line.
pub fn detect_bare_excepts(tree: &SyntaxTree) -> Vec<Issue> {
    tree.walk()
        .filter_map(|node| match node {
            Node::ExceptHandler(handler) if handler.exception.is_none() => Some(Issue::new(
                Severity::Warning,
                Category::BestPractice,
                "Bare 'except:' clause - specify exception type",
                Some(handler.line),
            )),
            _ => None,
        })
        .collect()
}

/// One warning per function with at least one list/dict/set literal default.
pub fn detect_mutable_defaults(tree: &SyntaxTree) -> Vec<Issue> {
    tree.walk()
        .filter_map(|node| match node {
            Node::FunctionDef(def) => Some(def),
            _ => None,
        })
        .filter(|def| {
            def.parameters.iter().any(|param| {
                matches!(param.default.as_deref(), Some(Node::Literal(lit)) if lit.is_mutable_container())
            })
        })
        .map(|def| {
            Issue::new(
                Severity::Warning,
                Category::BestPractice,
                format!("Mutable default argument in function '{}'", def.name),
                Some(def.line),
            )
        })
        .collect()
}
