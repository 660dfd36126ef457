//! Python syntax tree used by every analysis stage.
//!
//! Source text is parsed with tree-sitter and lowered into a small, closed
//! set of node kinds. Analysis code matches on [`Node`] exhaustively instead
//! of inspecting tree-sitter kind strings.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Source text │────▶│ tree-sitter  │────▶│ SyntaxTree   │
//! └─────────────┘     │ (CST)        │     │ (Node enum)  │
//!                     └──────────────┘     └──────────────┘
//! ```
//!
//! Lowering follows Python `ast` conventions: decorated definitions become
//! their definition, parentheses are transparent, and attribute names,
//! keyword-argument names and parameter names are not identifier references.

mod lower;

use thiserror::Error;

pub use lower::parse;

/// Parse failure with the location of the first offending node.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
    #[error("python grammar unavailable: {0}")]
    Grammar(String),
}

impl ParseError {
    /// Line of the failure, when the parser produced one.
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::Syntax { line, .. } => Some(*line),
            ParseError::Grammar(_) => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ParseError::Syntax { message, .. } => message,
            ParseError::Grammar(message) => message,
        }
    }
}

/// A parsed module.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxTree {
    /// Top-level statements in source order.
    pub body: Vec<Node>,
}

impl SyntaxTree {
    /// Pre-order walk over every node in the module, in source order.
    pub fn walk(&self) -> Walk<'_> {
        Walk::new(self.body.iter())
    }
}

/// Node kinds the analysis cares about. Everything else is `Other`.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Import(ImportStmt),
    Assign(AssignStmt),
    FunctionDef(FunctionDef),
    ClassDef(ClassDef),
    Conditional(Compound),
    Call(CallExpr),
    Literal(LiteralExpr),
    Name(NameRef),
    ExceptHandler(ExceptHandler),
    Other(Compound),
}

impl Node {
    /// Line where the node starts (1-indexed).
    pub fn line(&self) -> usize {
        match self {
            Node::Import(n) => n.line,
            Node::Assign(n) => n.line,
            Node::FunctionDef(n) => n.line,
            Node::ClassDef(n) => n.line,
            Node::Conditional(n) | Node::Other(n) => n.line,
            Node::Call(n) => n.line,
            Node::Literal(n) => n.line,
            Node::Name(n) => n.line,
            Node::ExceptHandler(n) => n.line,
        }
    }

    /// Direct children in source order.
    pub fn children(&self) -> Vec<&Node> {
        match self {
            Node::Import(_) | Node::Name(_) => Vec::new(),
            Node::Assign(n) => n.targets.iter().chain(std::iter::once(&*n.value)).collect(),
            Node::FunctionDef(n) => {
                let mut out: Vec<&Node> = n.decorators.iter().collect();
                for param in &n.parameters {
                    out.extend(param.annotation.as_ref().map(|a| &*a.expr));
                    out.extend(param.default.as_deref());
                }
                out.extend(n.returns.as_ref().map(|a| &*a.expr));
                out.extend(n.body.iter());
                out
            }
            Node::ClassDef(n) => n
                .decorators
                .iter()
                .chain(n.bases.iter().map(|b| &b.expr))
                .chain(n.keywords.iter())
                .chain(n.body.iter())
                .collect(),
            Node::Conditional(n) | Node::Other(n) => n.children.iter().collect(),
            Node::Call(n) => std::iter::once(&*n.callee).chain(n.args.iter()).collect(),
            Node::Literal(n) => n.elements.iter().collect(),
            Node::ExceptHandler(n) => n
                .exception
                .iter()
                .map(|e| &**e)
                .chain(n.alias.iter().map(|a| &**a))
                .chain(n.body.iter())
                .collect(),
        }
    }

    /// Pre-order walk over this node and its descendants.
    pub fn walk(&self) -> Walk<'_> {
        Walk::new(std::iter::once(self))
    }

    /// The identifier if this node is a bare name reference.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Node::Name(n) => Some(&n.id),
            _ => None,
        }
    }
}

/// Pre-order iterator over nodes.
pub struct Walk<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Walk<'a> {
    fn new<I>(roots: I) -> Self
    where
        I: DoubleEndedIterator<Item = &'a Node>,
    {
        Self {
            stack: roots.rev().collect(),
        }
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<&'a Node> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().into_iter().rev());
        Some(node)
    }
}

/// `import a.b as c` or `from m import x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportStmt {
    pub line: usize,
    pub kind: ImportKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportKind {
    /// `import a, b.c as d`
    Direct(Vec<ImportAlias>),
    /// `from module import a, b as c`; `module` is empty for `from . import x`.
    From {
        module: String,
        names: Vec<ImportAlias>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportAlias {
    /// Imported name as written (`os.path`, `*`).
    pub name: String,
    pub asname: Option<String>,
}

/// Plain assignment `a = b = value`. Annotated and augmented assignments are
/// not represented here.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignStmt {
    pub line: usize,
    pub targets: Vec<Node>,
    pub value: Box<Node>,
}

impl AssignStmt {
    /// Targets that are bare names.
    pub fn name_targets(&self) -> impl Iterator<Item = &str> {
        self.targets.iter().filter_map(Node::as_name)
    }
}

/// Rendered annotation text plus its expression (for reference tracking).
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub text: String,
    pub expr: Box<Node>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    Positional,
    VarArgs,
    KeywordOnly,
    VarKeywords,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub kind: ParameterKind,
    pub annotation: Option<Annotation>,
    pub default: Option<Box<Node>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub line: usize,
    pub end_line: usize,
    pub decorators: Vec<Node>,
    pub parameters: Vec<Parameter>,
    pub returns: Option<Annotation>,
    pub docstring: Option<String>,
    pub body: Vec<Node>,
}

impl FunctionDef {
    /// Names of positional parameters in declaration order.
    pub fn positional_names(&self) -> Vec<String> {
        self.parameters
            .iter()
            .filter(|p| p.kind == ParameterKind::Positional)
            .map(|p| p.name.clone())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BaseClass {
    /// Source rendering of the base expression.
    pub text: String,
    pub expr: Node,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: String,
    pub line: usize,
    pub end_line: usize,
    pub decorators: Vec<Node>,
    pub bases: Vec<BaseClass>,
    /// Keyword arguments of the class header (`metaclass=...`), values only.
    pub keywords: Vec<Node>,
    pub docstring: Option<String>,
    pub body: Vec<Node>,
}

/// A node with no analysis-specific shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Compound {
    pub line: usize,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub line: usize,
    pub callee: Box<Node>,
    pub args: Vec<Node>,
}

impl CallExpr {
    /// Callee identifier when the call is `name(...)`.
    pub fn callee_name(&self) -> Option<&str> {
        self.callee.as_name()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralKind {
    /// A constant; `type_name` is the Python runtime type name.
    Constant {
        type_name: &'static str,
        /// Decoded value for `str` constants.
        text: Option<String>,
    },
    List,
    Dict,
    Set,
    Tuple,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiteralExpr {
    pub line: usize,
    pub kind: LiteralKind,
    pub elements: Vec<Node>,
}

impl LiteralExpr {
    /// Whether this is a mutable container display (`[]`, `{}`, `{1}`).
    pub fn is_mutable_container(&self) -> bool {
        matches!(self.kind, LiteralKind::List | LiteralKind::Dict | LiteralKind::Set)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRef {
    pub id: String,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExceptHandler {
    pub line: usize,
    /// Declared exception type; `None` for a bare `except:`.
    pub exception: Option<Box<Node>>,
    pub alias: Option<Box<Node>>,
    pub body: Vec<Node>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(tree: &SyntaxTree) -> Vec<String> {
        tree.walk()
            .filter_map(|n| n.as_name().map(str::to_string))
            .collect()
    }

    #[test]
    fn test_walk_is_source_ordered() {
        let tree = parse("a = b\nc(d)\n").unwrap();
        assert_eq!(names(&tree), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_walk_descends_into_definitions() {
        let source = r#"
@decorate
def f(x: Hint = default) -> Ret:
    return y
"#;
        let tree = parse(source).unwrap();
        assert_eq!(names(&tree), vec!["decorate", "Hint", "default", "Ret", "y"]);
    }

    #[test]
    fn test_parse_error_reports_line() {
        let err = parse("x = 1\ndef broken(:\n    pass\n").unwrap_err();
        assert_eq!(err.line(), Some(2));
        assert!(!err.message().is_empty());
    }
}
