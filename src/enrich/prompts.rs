//! Prompt construction.
//!
//! Every prompt embeds a bounded source excerpt; callers truncate before
//! passing text in.

use std::fmt::Write;

use crate::analysis::{Class, Function, Import, StructuralFacts};
use crate::detect::Issue;

pub fn overview(excerpt: &str, facts: &StructuralFacts) -> String {
    format!(
        r#"Analyze this Python code and provide a clear, beginner-friendly overview.

Code:
{excerpt}

Structure:
- Functions: {functions}
- Classes: {classes}
- Imports: {imports}

Provide a 2-3 paragraph overview explaining:
1. What this code does (its purpose)
2. The main components and how they work together
3. Any notable patterns or design choices

Keep it simple and clear for junior developers."#,
        excerpt = excerpt,
        functions = facts.functions.len(),
        classes = facts.classes.len(),
        imports = facts.imports.len(),
    )
}

pub fn detailed_overview(
    excerpt: &str,
    facts: &StructuralFacts,
    issues: &[Issue],
    line_count: usize,
) -> String {
    let mut prompt = format!(
        r#"Write a detailed technical overview of this Python module in Markdown.

Code:
{excerpt}

Structure:
- Total lines: {line_count}
- Functions: {functions}
- Classes: {classes}
- Imports: {imports}
- Detected issues: {issues}
"#,
        excerpt = excerpt,
        line_count = line_count,
        functions = names(facts.functions.iter().map(|f| f.name.as_str())),
        classes = names(facts.classes.iter().map(|c| c.name.as_str())),
        imports = names(facts.imports.iter().map(|i| i.module.as_str())),
        issues = issues.len(),
    );
    prompt.push_str(
        r#"
Cover the module's purpose, its architecture and data flow, the role of each
major component, and any risks or maintenance concerns. Use headings and keep
the tone professional."#,
    );
    prompt
}

pub fn function(func: &Function, snippet: &str) -> String {
    let mut prompt = format!(
        "Explain the logic of the Python function `{}` step by step.\n\nCode:\n{}\n",
        func.signature(),
        snippet
    );
    if let Some(doc) = &func.docstring {
        let _ = write!(prompt, "\nDocstring:\n{}\n", doc);
    }
    prompt.push_str(
        "\nDescribe what it takes as input, what it does with it, and what it returns. \
         Keep it to one short paragraph.",
    );
    prompt
}

pub fn class(class: &Class, snippet: &str) -> String {
    let mut prompt = format!(
        "Explain the Python class `{}` in detail.\n\nCode:\n{}\n",
        class.name, snippet
    );
    if !class.base_class_names.is_empty() {
        let _ = writeln!(prompt, "\nBase classes: {}", class.base_class_names.join(", "));
    }
    prompt.push_str(
        "\nFirst describe the class's responsibility and how its parts fit together in one or \
         two paragraphs.",
    );
    if !class.method_names.is_empty() {
        prompt.push_str(
            "\nThen explain each method on its own line using exactly this format:\n",
        );
        for method in &class.method_names {
            let _ = write!(prompt, "\nMETHOD {}: <explanation>", method);
        }
    }
    prompt
}

pub fn single_import(import: &Import) -> String {
    format!(
        "In one sentence, explain what the Python import `{}` provides and why a module \
         would use it.",
        render_import(import)
    )
}

pub fn batch_imports(imports: &[Import]) -> String {
    let mut prompt = String::from(
        "For each Python import below, explain in one or two sentences what it provides.\n\n",
    );
    for (i, import) in imports.iter().enumerate() {
        let _ = writeln!(prompt, "{}. {}", i + 1, render_import(import));
    }
    prompt.push_str(
        "\nAnswer with one block per import, in order, using exactly this format:\n\
         IMPORT 1: <explanation>\n\
         IMPORT 2: <explanation>",
    );
    prompt
}

pub fn suggestions(excerpt: &str, facts: &StructuralFacts, issues: &[Issue]) -> String {
    let mut prompt = format!(
        "Review this Python code and suggest 3-5 concrete improvements.\n\nCode:\n{}\n",
        excerpt
    );
    let _ = write!(
        prompt,
        "\nStructure: {} functions, {} classes, {} imports.\n",
        facts.functions.len(),
        facts.classes.len(),
        facts.imports.len()
    );
    if !issues.is_empty() {
        prompt.push_str("\nDetected issues:\n");
        for issue in issues {
            match issue.line {
                Some(line) => {
                    let _ = writeln!(prompt, "- line {}: {}", line, issue.message);
                }
                None => {
                    let _ = writeln!(prompt, "- {}", issue.message);
                }
            }
        }
    }
    prompt.push_str(
        r#"
Format each suggestion exactly like this, separating suggestions with a line containing only ---

CATEGORY: <Performance|Readability|Security|Maintainability|Best Practice>
TITLE: <short title>
DESCRIPTION: <what to change and why>
PRIORITY: <High|Medium|Low>
EXAMPLE: <optional short code example>
---"#,
    );
    prompt
}

/// `import os` / `from os import path, sep`
pub fn render_import(import: &Import) -> String {
    if import.imported_names.len() == 1 && import.imported_names[0] == import.module {
        format!("import {}", import.module)
    } else if import.module.is_empty() {
        format!("from . import {}", import.imported_names.join(", "))
    } else {
        format!(
            "from {} import {}",
            import.module,
            import.imported_names.join(", ")
        )
    }
}

fn names<'a>(items: impl Iterator<Item = &'a str>) -> String {
    let list: Vec<&str> = items.collect();
    if list.is_empty() {
        "none".to_string()
    } else {
        format!("{} ({})", list.len(), list.join(", "))
    }
}
