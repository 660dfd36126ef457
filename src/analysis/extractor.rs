//! Structural extraction over the lowered Python syntax tree.

use std::collections::{BTreeMap, BTreeSet};

use crate::syntax::{self, FunctionDef, LiteralKind, Node, ParseError, SyntaxTree};

use super::{Class, Function, Import, Scope, StructuralFacts, Variable};

const UNKNOWN_TYPE: &str = "unknown";

/// Extracts imports, variables, functions and classes from a parsed module.
///
/// Every `extract_*` method accepts `None` (a failed parse) and returns an
/// empty list for it.
#[derive(Debug, Default, Clone, Copy)]
pub struct PythonExtractor;

impl PythonExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Parse source text into a syntax tree.
    pub fn parse(&self, source: &str) -> Result<SyntaxTree, ParseError> {
        syntax::parse(source)
    }

    /// Run every extraction pass.
    pub fn extract_facts(&self, tree: Option<&SyntaxTree>) -> StructuralFacts {
        StructuralFacts {
            imports: self.extract_imports(tree),
            variables: self.extract_variables(tree),
            functions: self.extract_functions(tree),
            classes: self.extract_classes(tree),
        }
    }

    pub fn extract_imports(&self, tree: Option<&SyntaxTree>) -> Vec<Import> {
        let Some(tree) = tree else {
            return Vec::new();
        };

        let mut imports = Vec::new();
        for node in tree.walk() {
            let Node::Import(stmt) = node else {
                continue;
            };
            match &stmt.kind {
                syntax::ImportKind::Direct(aliases) => {
                    for alias in aliases {
                        imports.push(Import {
                            module: alias.name.clone(),
                            imported_names: vec![alias
                                .asname
                                .clone()
                                .unwrap_or_else(|| alias.name.clone())],
                            source_line: stmt.line,
                            purpose: String::new(),
                        });
                    }
                }
                syntax::ImportKind::From { module, names, .. } => imports.push(Import {
                    module: module.clone(),
                    imported_names: names.iter().map(|a| a.name.clone()).collect(),
                    source_line: stmt.line,
                    purpose: String::new(),
                }),
            }
        }
        imports
    }

    pub fn extract_variables(&self, tree: Option<&SyntaxTree>) -> Vec<Variable> {
        let Some(tree) = tree else {
            return Vec::new();
        };

        // Pass 1: occurrence lines keyed by raw identifier.
        let mut occurrences: BTreeMap<&str, BTreeSet<usize>> = BTreeMap::new();
        for node in tree.walk() {
            if let Node::Name(name) = node {
                occurrences.entry(&name.id).or_default().insert(name.line);
            }
        }

        // Pass 2: assignments at module level, then directly in each function body.
        let mut variables = Vec::new();
        let mut collect = |statements: &[Node], scope: &Scope| {
            for stmt in statements {
                let Node::Assign(assign) = stmt else {
                    continue;
                };
                let inferred_type = infer_type(&assign.value);
                for name in assign.name_targets() {
                    variables.push(Variable {
                        name: name.to_string(),
                        inferred_type: inferred_type.clone(),
                        scope: scope.clone(),
                        definition_line: assign.line,
                        occurrence_lines: occurrences.get(name).cloned().unwrap_or_default(),
                    });
                }
            }
        };

        collect(&tree.body, &Scope::Global);
        for node in tree.walk() {
            if let Node::FunctionDef(def) = node {
                collect(&def.body, &Scope::Function(def.name.clone()));
            }
        }

        variables
    }

    pub fn extract_functions(&self, tree: Option<&SyntaxTree>) -> Vec<Function> {
        let Some(tree) = tree else {
            return Vec::new();
        };

        let mut call_sites: BTreeMap<&str, BTreeSet<usize>> = BTreeMap::new();
        for node in tree.walk() {
            if let Node::Call(call) = node {
                if let Some(callee) = call.callee_name() {
                    call_sites.entry(callee).or_default().insert(call.line);
                }
            }
        }

        let mut defs = Vec::new();
        for node in &tree.body {
            collect_non_methods(node, false, &mut defs);
        }

        defs.into_iter()
            .map(|def| Function {
                name: def.name.clone(),
                parameters: def.positional_names(),
                return_type_annotation: def.returns.as_ref().map(|r| r.text.clone()),
                docstring: def.docstring.clone(),
                definition_line: def.line,
                end_line: def.end_line,
                variables_referenced: def
                    .body
                    .iter()
                    .flat_map(Node::walk)
                    .filter_map(Node::as_name)
                    .map(str::to_string)
                    .collect(),
                call_site_lines: call_sites.get(def.name.as_str()).cloned().unwrap_or_default(),
                logic_explanation: String::new(),
            })
            .collect()
    }

    pub fn extract_classes(&self, tree: Option<&SyntaxTree>) -> Vec<Class> {
        let Some(tree) = tree else {
            return Vec::new();
        };

        tree.walk()
            .filter_map(|node| match node {
                Node::ClassDef(def) => Some(def),
                _ => None,
            })
            .map(|def| {
                let mut method_names = Vec::new();
                let mut attribute_names = Vec::new();
                for item in &def.body {
                    match item {
                        Node::FunctionDef(method) => method_names.push(method.name.clone()),
                        Node::Assign(assign) => {
                            attribute_names.extend(assign.name_targets().map(str::to_string))
                        }
                        _ => {}
                    }
                }
                Class {
                    name: def.name.clone(),
                    method_names,
                    attribute_names,
                    base_class_names: def.bases.iter().map(|b| b.text.clone()).collect(),
                    docstring: def.docstring.clone(),
                    definition_line: def.line,
                    end_line: def.end_line,
                    detailed_explanation: String::new(),
                    per_method_explanations: BTreeMap::new(),
                }
            })
            .collect()
    }
}

/// Pre-order collection of function definitions, skipping those that sit
/// directly in a class body.
fn collect_non_methods<'a>(node: &'a Node, in_class_body: bool, out: &mut Vec<&'a FunctionDef>) {
    if let Node::FunctionDef(def) = node {
        if !in_class_body {
            out.push(def);
        }
    }
    let is_class = matches!(node, Node::ClassDef(_));
    for child in node.children() {
        collect_non_methods(child, is_class, out);
    }
}

/// Literal-shape type heuristic.
fn infer_type(value: &Node) -> String {
    match value {
        Node::Literal(literal) => match &literal.kind {
            LiteralKind::Constant { type_name, .. } => type_name.to_string(),
            LiteralKind::List => "list".to_string(),
            LiteralKind::Dict => "dict".to_string(),
            LiteralKind::Set => "set".to_string(),
            LiteralKind::Tuple => "tuple".to_string(),
        },
        Node::Call(call) => call
            .callee_name()
            .map(str::to_string)
            .unwrap_or_else(|| UNKNOWN_TYPE.to_string()),
        Node::Import(_)
        | Node::Assign(_)
        | Node::FunctionDef(_)
        | Node::ClassDef(_)
        | Node::Conditional(_)
        | Node::Name(_)
        | Node::ExceptHandler(_)
        | Node::Other(_) => UNKNOWN_TYPE.to_string(),
    }
}
