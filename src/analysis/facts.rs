//! Structural facts extracted from a Python module.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// One import statement (or one module of a multi-module `import a, b`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    /// Source module; empty for `from . import x`.
    pub module: String,
    /// Names bound or imported by the statement, in order.
    pub imported_names: Vec<String>,
    pub source_line: usize,
    /// Filled by enrichment; empty until then.
    #[serde(default)]
    pub purpose: String,
}

/// Where a variable was assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Scope {
    Global,
    /// Assigned directly in the body of the named function.
    Function(String),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => write!(f, "global"),
            Scope::Function(name) => write!(f, "function:{}", name),
        }
    }
}

impl From<Scope> for String {
    fn from(scope: Scope) -> Self {
        scope.to_string()
    }
}

impl TryFrom<String> for Scope {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == "global" {
            return Ok(Scope::Global);
        }
        match value.strip_prefix("function:") {
            Some(name) if !name.is_empty() => Ok(Scope::Function(name.to_string())),
            _ => Err(format!("unknown scope: {}", value)),
        }
    }
}

/// A simple-name assignment target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    /// Literal-shape guess, `"unknown"` when nothing matches.
    pub inferred_type: String,
    pub scope: Scope,
    pub definition_line: usize,
    /// Every line where an identifier with this name is referenced anywhere
    /// in the module. Keyed by name only, so same-named variables in
    /// different scopes share one set.
    pub occurrence_lines: BTreeSet<usize>,
}

/// A callable that is not directly inside a class body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub parameters: Vec<String>,
    pub return_type_annotation: Option<String>,
    pub docstring: Option<String>,
    pub definition_line: usize,
    pub end_line: usize,
    pub variables_referenced: BTreeSet<String>,
    /// Lines of `name(...)` calls anywhere in the module.
    pub call_site_lines: BTreeSet<usize>,
    #[serde(default)]
    pub logic_explanation: String,
}

impl Function {
    /// `name(a, b)`
    pub fn signature(&self) -> String {
        format!("{}({})", self.name, self.parameters.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    pub name: String,
    pub method_names: Vec<String>,
    /// Class-level simple-name assignment targets.
    pub attribute_names: Vec<String>,
    pub base_class_names: Vec<String>,
    pub docstring: Option<String>,
    pub definition_line: usize,
    pub end_line: usize,
    #[serde(default)]
    pub detailed_explanation: String,
    #[serde(default)]
    pub per_method_explanations: BTreeMap<String, String>,
}

/// Everything the extractor produces for one module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralFacts {
    pub imports: Vec<Import>,
    pub variables: Vec<Variable>,
    pub functions: Vec<Function>,
    pub classes: Vec<Class>,
}

impl StructuralFacts {
    pub fn is_empty(&self) -> bool {
        self.imports.is_empty()
            && self.variables.is_empty()
            && self.functions.is_empty()
            && self.classes.is_empty()
    }
}
