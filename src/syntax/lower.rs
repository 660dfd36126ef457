//! tree-sitter-python parsing and lowering into [`Node`].

use tree_sitter::{Language, Node as TsNode, Parser};

use super::{
    Annotation, AssignStmt, BaseClass, CallExpr, ClassDef, Compound, ExceptHandler, FunctionDef,
    ImportAlias, ImportKind, ImportStmt, LiteralExpr, LiteralKind, NameRef, Node, Parameter,
    ParameterKind, ParseError, SyntaxTree,
};

/// Parse Python source into a [`SyntaxTree`].
///
/// tree-sitter recovers from errors, so any tree containing ERROR or MISSING
/// nodes is reported as a failure located at the first such node. The grammar
/// also accepts Python 2 `print` and `exec` statements; those are rejected the
/// way the Python 3 parser rejects them.
pub fn parse(source: &str) -> Result<SyntaxTree, ParseError> {
    let language: Language = tree_sitter_python::LANGUAGE.into();
    let mut parser = Parser::new();
    parser
        .set_language(&language)
        .map_err(|e| ParseError::Grammar(e.to_string()))?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| ParseError::Grammar("parser produced no tree".to_string()))?;

    let root = tree.root_node();
    if root.has_error() {
        return Err(locate_error(root));
    }
    if let Some(stmt) = first_legacy_statement(root) {
        return Err(legacy_statement_error(stmt));
    }

    let lowerer = Lowerer {
        source: source.as_bytes(),
    };
    Ok(SyntaxTree {
        body: lowerer.lower_named(root),
    })
}

fn locate_error(root: TsNode) -> ParseError {
    match first_error(root) {
        Some(node) if node.is_missing() => {
            let message = if node.is_named() {
                format!("expected {}", node.kind())
            } else {
                format!("expected '{}'", node.kind())
            };
            ParseError::Syntax {
                line: line_of(node),
                message,
            }
        }
        Some(node) => ParseError::Syntax {
            line: line_of(node),
            message: "invalid syntax".to_string(),
        },
        None => ParseError::Syntax {
            line: 1,
            message: "invalid syntax".to_string(),
        },
    }
}

fn first_legacy_statement(node: TsNode) -> Option<TsNode> {
    if matches!(node.kind(), "print_statement" | "exec_statement") {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<TsNode> = node.named_children(&mut cursor).collect();
    children.into_iter().find_map(first_legacy_statement)
}

fn legacy_statement_error(stmt: TsNode) -> ParseError {
    let keyword = if stmt.kind() == "exec_statement" {
        "exec"
    } else {
        "print"
    };
    ParseError::Syntax {
        line: line_of(stmt),
        message: format!(
            "Missing parentheses in call to '{0}'. Did you mean {0}(...)?",
            keyword
        ),
    }
}

fn first_error(node: TsNode) -> Option<TsNode> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<TsNode> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

fn line_of(node: TsNode) -> usize {
    node.start_position().row + 1 // tree-sitter is 0-indexed
}

fn end_line_of(node: TsNode) -> usize {
    node.end_position().row + 1
}

fn is_trivia(node: &TsNode) -> bool {
    matches!(node.kind(), "comment" | "line_continuation")
}

fn named_children(node: TsNode) -> Vec<TsNode> {
    let mut cursor = node.walk();
    let children: Vec<TsNode> = node
        .named_children(&mut cursor)
        .filter(|n| !is_trivia(n))
        .collect();
    children
}

fn field_children<'t>(node: TsNode<'t>, field: &str) -> Vec<TsNode<'t>> {
    let mut cursor = node.walk();
    let children: Vec<TsNode<'t>> = node.children_by_field_name(field, &mut cursor).collect();
    children
}

fn has_child_kind(node: TsNode, kind: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|c| c.kind() == kind);
    found
}

struct Lowerer<'a> {
    source: &'a [u8],
}

impl<'a> Lowerer<'a> {
    fn text(&self, node: TsNode) -> &'a str {
        node.utf8_text(self.source).unwrap_or("")
    }

    /// Node text with whitespace runs collapsed to one space.
    fn rendered(&self, node: TsNode) -> String {
        self.text(node).split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn lower_named(&self, node: TsNode) -> Vec<Node> {
        named_children(node)
            .into_iter()
            .map(|child| self.lower(child))
            .collect()
    }

    fn compound(&self, node: TsNode, children: Vec<Node>) -> Compound {
        Compound {
            line: line_of(node),
            children,
        }
    }

    fn lower(&self, node: TsNode) -> Node {
        let line = line_of(node);
        match node.kind() {
            "import_statement" => Node::Import(self.lower_import(node)),
            "import_from_statement" | "future_import_statement" => {
                Node::Import(self.lower_import_from(node))
            }
            "expression_statement" | "parenthesized_expression" => {
                let mut children = self.lower_named(node);
                if children.len() == 1 {
                    children.remove(0)
                } else {
                    Node::Other(Compound { line, children })
                }
            }
            "assignment" => self.lower_assignment(node),
            "function_definition" => Node::FunctionDef(self.lower_function(node, Vec::new())),
            "class_definition" => Node::ClassDef(self.lower_class(node, Vec::new())),
            "decorated_definition" => self.lower_decorated(node),
            "if_statement" => Node::Conditional(self.compound(node, self.lower_named(node))),
            "call" => self.lower_call(node),
            "identifier" => Node::Name(NameRef {
                id: self.text(node).to_string(),
                line,
            }),
            "integer" | "float" => {
                let text = self.text(node);
                let type_name = if text.ends_with(['j', 'J']) {
                    "complex"
                } else if node.kind() == "integer" {
                    "int"
                } else {
                    "float"
                };
                constant(line, type_name, None)
            }
            "true" | "false" => constant(line, "bool", None),
            "none" => constant(line, "NoneType", None),
            "ellipsis" => constant(line, "ellipsis", None),
            "string" => self.lower_string(node),
            "concatenated_string" => self.lower_concatenated(node),
            "list" => self.literal(node, LiteralKind::List),
            "dictionary" => self.literal(node, LiteralKind::Dict),
            "set" => self.literal(node, LiteralKind::Set),
            "tuple" | "expression_list" => self.literal(node, LiteralKind::Tuple),
            "except_clause" | "except_group_clause" => self.lower_except(node),
            "attribute" => {
                let children = node
                    .child_by_field_name("object")
                    .map(|object| vec![self.lower(object)])
                    .unwrap_or_default();
                Node::Other(Compound { line, children })
            }
            "keyword_argument" => {
                let children = node
                    .child_by_field_name("value")
                    .map(|value| vec![self.lower(value)])
                    .unwrap_or_default();
                Node::Other(Compound { line, children })
            }
            "global_statement" | "nonlocal_statement" => Node::Other(Compound {
                line,
                children: Vec::new(),
            }),
            "lambda" => self.lower_lambda(node),
            _ => Node::Other(self.compound(node, self.lower_named(node))),
        }
    }

    fn literal(&self, node: TsNode, kind: LiteralKind) -> Node {
        Node::Literal(LiteralExpr {
            line: line_of(node),
            kind,
            elements: self.lower_named(node),
        })
    }

    fn import_alias(&self, node: TsNode) -> ImportAlias {
        if node.kind() == "aliased_import" {
            ImportAlias {
                name: node
                    .child_by_field_name("name")
                    .map(|n| dotted(self.text(n)))
                    .unwrap_or_default(),
                asname: node
                    .child_by_field_name("alias")
                    .map(|n| self.text(n).to_string()),
            }
        } else {
            ImportAlias {
                name: dotted(self.text(node)),
                asname: None,
            }
        }
    }

    fn lower_import(&self, node: TsNode) -> ImportStmt {
        let aliases = field_children(node, "name")
            .into_iter()
            .map(|n| self.import_alias(n))
            .collect();
        ImportStmt {
            line: line_of(node),
            kind: ImportKind::Direct(aliases),
        }
    }

    fn lower_import_from(&self, node: TsNode) -> ImportStmt {
        // Leading dots of a relative import are not part of the module name.
        let module = match node.child_by_field_name("module_name") {
            Some(m) if m.kind() == "relative_import" => named_children(m)
                .into_iter()
                .find(|c| c.kind() == "dotted_name")
                .map(|c| dotted(self.text(c)))
                .unwrap_or_default(),
            Some(m) => dotted(self.text(m)),
            None => "__future__".to_string(),
        };

        let mut names: Vec<ImportAlias> = field_children(node, "name")
            .into_iter()
            .map(|n| self.import_alias(n))
            .collect();
        if has_child_kind(node, "wildcard_import") {
            names.push(ImportAlias {
                name: "*".to_string(),
                asname: None,
            });
        }

        ImportStmt {
            line: line_of(node),
            kind: ImportKind::From { module, names },
        }
    }

    fn lower_assignment(&self, node: TsNode) -> Node {
        let line = line_of(node);
        let annotated = node.child_by_field_name("type").is_some();
        let right = node.child_by_field_name("right");
        if annotated || right.is_none() {
            // Annotated assignment: references only.
            return Node::Other(self.compound(node, self.lower_named(node)));
        }

        let mut targets: Vec<Node> = node
            .child_by_field_name("left")
            .map(|left| self.lower(left))
            .into_iter()
            .collect();

        // `a = b = value` nests as assignment(a, assignment(b, value)).
        let mut value = right;
        while let Some(inner) = value.filter(|v| {
            v.kind() == "assignment" && v.child_by_field_name("type").is_none()
        }) {
            targets.extend(inner.child_by_field_name("left").map(|left| self.lower(left)));
            value = inner.child_by_field_name("right");
        }

        let value = match value {
            Some(v) => self.lower(v),
            None => Node::Other(Compound {
                line,
                children: Vec::new(),
            }),
        };

        Node::Assign(AssignStmt {
            line,
            targets,
            value: Box::new(value),
        })
    }

    fn annotation(&self, node: TsNode) -> Annotation {
        Annotation {
            text: self.rendered(node),
            expr: Box::new(self.lower(node)),
        }
    }

    fn lower_parameters(&self, node: TsNode) -> Vec<Parameter> {
        let mut params = Vec::new();
        let mut seen_star = false;

        for child in named_children(node) {
            let plain_kind = if seen_star {
                ParameterKind::KeywordOnly
            } else {
                ParameterKind::Positional
            };
            match child.kind() {
                "identifier" => params.push(Parameter {
                    name: self.text(child).to_string(),
                    kind: plain_kind,
                    annotation: None,
                    default: None,
                }),
                "typed_parameter" => {
                    let Some(inner) = named_children(child).into_iter().next() else {
                        continue;
                    };
                    let (name, kind) = match inner.kind() {
                        "list_splat_pattern" => {
                            seen_star = true;
                            (self.splat_name(inner), ParameterKind::VarArgs)
                        }
                        "dictionary_splat_pattern" => {
                            (self.splat_name(inner), ParameterKind::VarKeywords)
                        }
                        _ => (self.text(inner).to_string(), plain_kind),
                    };
                    params.push(Parameter {
                        name,
                        kind,
                        annotation: child.child_by_field_name("type").map(|t| self.annotation(t)),
                        default: None,
                    });
                }
                "default_parameter" | "typed_default_parameter" => params.push(Parameter {
                    name: child
                        .child_by_field_name("name")
                        .map(|n| self.text(n).to_string())
                        .unwrap_or_default(),
                    kind: plain_kind,
                    annotation: child.child_by_field_name("type").map(|t| self.annotation(t)),
                    default: child
                        .child_by_field_name("value")
                        .map(|v| Box::new(self.lower(v))),
                }),
                "list_splat_pattern" => {
                    seen_star = true;
                    params.push(Parameter {
                        name: self.splat_name(child),
                        kind: ParameterKind::VarArgs,
                        annotation: None,
                        default: None,
                    });
                }
                "dictionary_splat_pattern" => params.push(Parameter {
                    name: self.splat_name(child),
                    kind: ParameterKind::VarKeywords,
                    annotation: None,
                    default: None,
                }),
                "keyword_separator" => seen_star = true,
                _ => {}
            }
        }

        params
    }

    fn splat_name(&self, node: TsNode) -> String {
        named_children(node)
            .into_iter()
            .next()
            .map(|n| self.text(n).to_string())
            .unwrap_or_default()
    }

    fn lower_function(&self, node: TsNode, decorators: Vec<Node>) -> FunctionDef {
        let body = node
            .child_by_field_name("body")
            .map(|b| self.lower_named(b))
            .unwrap_or_default();
        FunctionDef {
            name: node
                .child_by_field_name("name")
                .map(|n| self.text(n).to_string())
                .unwrap_or_default(),
            line: line_of(node),
            end_line: end_line_of(node),
            decorators,
            parameters: node
                .child_by_field_name("parameters")
                .map(|p| self.lower_parameters(p))
                .unwrap_or_default(),
            returns: node
                .child_by_field_name("return_type")
                .map(|r| self.annotation(r)),
            docstring: docstring_of(&body),
            body,
        }
    }

    fn lower_class(&self, node: TsNode, decorators: Vec<Node>) -> ClassDef {
        let mut bases = Vec::new();
        let mut keywords = Vec::new();
        if let Some(args) = node.child_by_field_name("superclasses") {
            for arg in named_children(args) {
                if arg.kind() == "keyword_argument" {
                    keywords.push(self.lower(arg));
                } else {
                    bases.push(BaseClass {
                        text: self.rendered(arg),
                        expr: self.lower(arg),
                    });
                }
            }
        }

        let body = node
            .child_by_field_name("body")
            .map(|b| self.lower_named(b))
            .unwrap_or_default();
        ClassDef {
            name: node
                .child_by_field_name("name")
                .map(|n| self.text(n).to_string())
                .unwrap_or_default(),
            line: line_of(node),
            end_line: end_line_of(node),
            decorators,
            bases,
            keywords,
            docstring: docstring_of(&body),
            body,
        }
    }

    fn lower_decorated(&self, node: TsNode) -> Node {
        let decorators: Vec<Node> = named_children(node)
            .into_iter()
            .filter(|c| c.kind() == "decorator")
            .map(|d| Node::Other(self.compound(d, self.lower_named(d))))
            .collect();

        match node.child_by_field_name("definition") {
            Some(def) if def.kind() == "function_definition" => {
                Node::FunctionDef(self.lower_function(def, decorators))
            }
            Some(def) if def.kind() == "class_definition" => {
                Node::ClassDef(self.lower_class(def, decorators))
            }
            _ => Node::Other(self.compound(node, decorators)),
        }
    }

    fn lower_call(&self, node: TsNode) -> Node {
        let line = line_of(node);
        let callee = match node.child_by_field_name("function") {
            Some(f) => self.lower(f),
            None => Node::Other(Compound {
                line,
                children: Vec::new(),
            }),
        };
        let args = match node.child_by_field_name("arguments") {
            Some(a) if a.kind() == "argument_list" => self.lower_named(a),
            Some(a) => vec![self.lower(a)],
            None => Vec::new(),
        };
        Node::Call(CallExpr {
            line,
            callee: Box::new(callee),
            args,
        })
    }

    fn lower_except(&self, node: TsNode) -> Node {
        let mut body = Vec::new();
        let mut header = Vec::new();
        for child in named_children(node) {
            if child.kind() == "block" {
                body = self.lower_named(child);
            } else {
                header.push(self.lower(child));
            }
        }
        let mut header = header.into_iter();
        Node::ExceptHandler(ExceptHandler {
            line: line_of(node),
            exception: header.next().map(Box::new),
            alias: header.next().map(Box::new),
            body,
        })
    }

    fn lower_lambda(&self, node: TsNode) -> Node {
        let mut children = Vec::new();
        if let Some(params) = node.child_by_field_name("parameters") {
            for param in named_children(params) {
                if let Some(value) = param.child_by_field_name("value") {
                    children.push(self.lower(value));
                }
            }
        }
        if let Some(body) = node.child_by_field_name("body") {
            children.push(self.lower(body));
        }
        Node::Other(self.compound(node, children))
    }

    fn lower_string(&self, node: TsNode) -> Node {
        let line = line_of(node);
        let raw = self.text(node);
        let prefix_len = raw.chars().take_while(|c| c.is_ascii_alphabetic()).count();
        let prefix = raw[..prefix_len].to_ascii_lowercase();

        if prefix.contains('f') {
            // f-strings are not constants; only their interpolations matter.
            let children = named_children(node)
                .into_iter()
                .filter(|c| c.kind() == "interpolation")
                .flat_map(|c| self.lower_named(c))
                .collect();
            return Node::Other(Compound { line, children });
        }

        if prefix.contains('b') {
            return constant(line, "bytes", None);
        }
        let body = strip_quotes(&raw[prefix_len..]);
        let text = if prefix.contains('r') {
            body.to_string()
        } else {
            decode_escapes(body)
        };
        constant(line, "str", Some(text))
    }

    fn lower_concatenated(&self, node: TsNode) -> Node {
        let line = line_of(node);
        let parts: Vec<Node> = self.lower_named(node);

        let mut text = String::new();
        let mut type_name = "str";
        for part in &parts {
            match part {
                Node::Literal(LiteralExpr {
                    kind: LiteralKind::Constant { type_name: t, text: value },
                    ..
                }) => {
                    if *t == "bytes" {
                        type_name = "bytes";
                    }
                    if let Some(value) = value {
                        text.push_str(value);
                    }
                }
                _ => return Node::Other(Compound { line, children: parts }),
            }
        }

        let text = (type_name == "str").then_some(text);
        constant(line, type_name, text)
    }
}

fn constant(line: usize, type_name: &'static str, text: Option<String>) -> Node {
    Node::Literal(LiteralExpr {
        line,
        kind: LiteralKind::Constant { type_name, text },
        elements: Vec::new(),
    })
}

/// `os . path` -> `os.path`
fn dotted(text: &str) -> String {
    text.split_whitespace().collect()
}

fn strip_quotes(quoted: &str) -> &str {
    let width = if quoted.starts_with("\"\"\"") || quoted.starts_with("'''") {
        3
    } else {
        1
    };
    quoted
        .get(width..quoted.len().saturating_sub(width))
        .unwrap_or("")
}

fn docstring_of(body: &[Node]) -> Option<String> {
    match body.first()? {
        Node::Literal(LiteralExpr {
            kind: LiteralKind::Constant {
                text: Some(text), ..
            },
            ..
        }) => Some(clean_docstring(text)),
        _ => None,
    }
}

/// Resolve backslash escapes in a non-raw string body.
///
/// `\N{...}` and unrecognized escapes are kept as written.
fn decode_escapes(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(next) = chars.next() else {
            out.push('\\');
            break;
        };
        match next {
            '\n' => {}
            '\r' => {
                chars.next_if_eq(&'\n');
            }
            '\\' | '\'' | '"' => out.push(next),
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0c}'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\u{0b}'),
            '0'..='7' => {
                let mut value = next.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            value = value * 8 + d;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(value).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            'x' | 'u' | 'U' => {
                let width = match next {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let digits: String = chars.clone().take(width).collect();
                let decoded = (digits.len() == width && digits.chars().all(|d| d.is_ascii_hexdigit()))
                    .then(|| u32::from_str_radix(&digits, 16).ok())
                    .flatten()
                    .and_then(char::from_u32);
                match decoded {
                    Some(ch) => {
                        out.push(ch);
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

/// Expand tabs to 8-column stops, like `str.expandtabs()`.
fn expand_tabs(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut column = 0;
    for c in line.chars() {
        if c == '\t' {
            let pad = 8 - column % 8;
            out.extend(std::iter::repeat(' ').take(pad));
            column += pad;
        } else {
            out.push(c);
            column += 1;
        }
    }
    out
}

/// Normalize docstring indentation the way `inspect.cleandoc` does.
pub(crate) fn clean_docstring(raw: &str) -> String {
    let expanded: Vec<String> = raw.lines().map(expand_tabs).collect();
    let lines: Vec<&str> = expanded.iter().map(String::as_str).collect();

    let margin = lines
        .iter()
        .skip(1)
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut cleaned: Vec<&str> = Vec::with_capacity(lines.len());
    for (i, line) in lines.iter().enumerate() {
        if i == 0 {
            cleaned.push(line.trim_start());
        } else {
            cleaned.push(line.get(margin..).unwrap_or_else(|| line.trim_start()));
        }
    }

    while cleaned.first().is_some_and(|l| l.trim().is_empty()) {
        cleaned.remove(0);
    }
    while cleaned.last().is_some_and(|l| l.trim().is_empty()) {
        cleaned.pop();
    }

    cleaned.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first(source: &str) -> Node {
        let mut tree = parse(source).unwrap();
        tree.body.remove(0)
    }

    #[test]
    fn test_decorated_function_lowers_to_definition() {
        match first("@cache\ndef f(a, b=1, *args, c, **kw):\n    pass\n") {
            Node::FunctionDef(def) => {
                assert_eq!(def.name, "f");
                assert_eq!(def.line, 2);
                assert_eq!(def.decorators.len(), 1);
                assert_eq!(def.positional_names(), vec!["a", "b"]);
                let kinds: Vec<_> = def.parameters.iter().map(|p| p.kind).collect();
                assert_eq!(
                    kinds,
                    vec![
                        ParameterKind::Positional,
                        ParameterKind::Positional,
                        ParameterKind::VarArgs,
                        ParameterKind::KeywordOnly,
                        ParameterKind::VarKeywords,
                    ]
                );
            }
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_chained_assignment_collects_all_targets() {
        match first("a = b = [1, 2]\n") {
            Node::Assign(assign) => {
                assert_eq!(assign.name_targets().collect::<Vec<_>>(), vec!["a", "b"]);
                assert!(matches!(
                    *assign.value,
                    Node::Literal(LiteralExpr {
                        kind: LiteralKind::List,
                        ..
                    })
                ));
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_annotated_assignment_is_not_assign() {
        assert!(matches!(first("x: int = 1\n"), Node::Other(_)));
    }

    #[test]
    fn test_relative_import_without_module() {
        match first("from . import sibling\n") {
            Node::Import(ImportStmt {
                kind: ImportKind::From { module, names },
                ..
            }) => {
                assert_eq!(module, "");
                assert_eq!(names[0].name, "sibling");
            }
            other => panic!("expected import, got {:?}", other),
        }
    }

    #[test]
    fn test_string_prefixes() {
        let tree = parse("a = 'x'\nb = b'x'\nc = f'{y}'\n").unwrap();
        let values: Vec<&Node> = tree
            .body
            .iter()
            .filter_map(|n| match n {
                Node::Assign(a) => Some(&*a.value),
                _ => None,
            })
            .collect();
        assert!(matches!(
            values[0],
            Node::Literal(LiteralExpr {
                kind: LiteralKind::Constant { type_name: "str", .. },
                ..
            })
        ));
        assert!(matches!(
            values[1],
            Node::Literal(LiteralExpr {
                kind: LiteralKind::Constant { type_name: "bytes", .. },
                ..
            })
        ));
        assert!(matches!(values[2], Node::Other(_)));
    }

    #[test]
    fn test_clean_docstring() {
        let raw = "\n    Summary line.\n\n        Indented detail.\n    ";
        assert_eq!(clean_docstring(raw), "Summary line.\n\n    Indented detail.");
        assert_eq!(clean_docstring("One liner."), "One liner.");
    }

    #[test]
    fn test_docstring_escapes_are_decoded() {
        let source = "def f():\n    \"\"\"Tab\\there \\u00e9.\\nNext \\x41\\101 \\N{BULLET} \\q.\"\"\"\n";
        match first(source) {
            Node::FunctionDef(def) => assert_eq!(
                def.docstring.as_deref(),
                Some("Tab     here \u{e9}.\nNext AA \\N{BULLET} \\q.")
            ),
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_raw_string_keeps_backslashes() {
        match first("x = r'a\\nb'\n") {
            Node::Assign(assign) => assert!(matches!(
                &*assign.value,
                Node::Literal(LiteralExpr {
                    kind: LiteralKind::Constant { text: Some(text), .. },
                    ..
                }) if text == "a\\nb"
            )),
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_escapes_line_continuation() {
        assert_eq!(decode_escapes("one \\\ntwo"), "one two");
        assert_eq!(decode_escapes("\\\\ \\' \\\""), "\\ ' \"");
        assert_eq!(decode_escapes("bad \\x4"), "bad \\x4");
    }

    #[test]
    fn test_print_statement_is_rejected() {
        let err = parse("x = 1\nprint \"hello\"\n").unwrap_err();
        assert_eq!(err.line(), Some(2));
        assert!(err.to_string().contains("Missing parentheses in call to 'print'"));

        let err = parse("def f():\n    exec \"x = 1\"\n").unwrap_err();
        assert_eq!(err.line(), Some(2));
        assert!(err.to_string().contains("'exec'"));

        assert!(parse("print(\"hello\")\nexec(\"x = 1\")\nprint\n").is_ok());
    }

    #[test]
    fn test_bare_except_has_no_type() {
        let source = "try:\n    pass\nexcept:\n    pass\n";
        let tree = parse(source).unwrap();
        let handler = tree
            .walk()
            .find_map(|n| match n {
                Node::ExceptHandler(h) => Some(h),
                _ => None,
            })
            .unwrap();
        assert!(handler.exception.is_none());
        assert_eq!(handler.line, 3);
    }

    #[test]
    fn test_missing_node_message() {
        let err = parse("if x\n    pass\n").unwrap_err();
        assert_eq!(err.line(), Some(1));
    }
}
