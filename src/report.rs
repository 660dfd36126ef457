//! Output formatting for analysis results.
//!
//! Supports three output formats:
//! - Pretty: colored terminal summary for human readability
//! - JSON: the full result record for programmatic consumption
//! - Markdown: a standalone report document

use colored::*;
use std::fmt::Write as _;
use std::io::{self, Write};

use crate::aggregate::{AnalysisResult, Priority, Suggestion};
use crate::detect::{Issue, Severity};
use crate::diagram::DiagramKind;
use crate::enrich::FallbackRecord;
use crate::source::SourceUnit;

// =============================================================================
// JSON Format
// =============================================================================

/// Write the result record as pretty-printed JSON.
pub fn write_json<W: Write>(out: &mut W, result: &AnalysisResult) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, result)?;
    writeln!(out)?;
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write a colored terminal summary.
pub fn write_pretty<W: Write>(
    out: &mut W,
    result: &AnalysisResult,
    fallbacks: &[FallbackRecord],
) -> io::Result<()> {
    // Header
    writeln!(out)?;
    writeln!(
        out,
        "  {} v{}",
        "pyexplain".cyan().bold(),
        env!("CARGO_PKG_VERSION")
    )?;
    writeln!(out)?;
    writeln!(out, "  {}{}", "File:  ".dimmed(), result.filename)?;
    writeln!(out, "  {}{}", "Lines: ".dimmed(), result.line_count)?;
    if let Some(id) = &result.result_id {
        writeln!(out, "  {}{}", "ID:    ".dimmed(), id)?;
    }
    writeln!(out)?;

    write_wrapped(out, &result.overview)?;
    writeln!(out)?;

    write_structure(out, result)?;

    if !result.issues.is_empty() {
        write_issues(out, &result.issues)?;
        writeln!(out)?;
    }

    if !result.suggestions.is_empty() {
        write_suggestions(out, &result.suggestions)?;
        writeln!(out)?;
    }

    if !fallbacks.is_empty() {
        writeln!(
            out,
            "  {}",
            format!("{} explanation(s) used fallback text:", fallbacks.len()).dimmed()
        )?;
        for record in fallbacks {
            writeln!(out, "    {}", record.to_string().dimmed())?;
        }
        writeln!(out)?;
    }

    write_final_status(out, result)?;
    writeln!(out)
}

fn write_wrapped<W: Write>(out: &mut W, text: &str) -> io::Result<()> {
    for line in text.lines() {
        writeln!(out, "  {}", line)?;
    }
    Ok(())
}

fn write_structure<W: Write>(out: &mut W, result: &AnalysisResult) -> io::Result<()> {
    if !result.imports.is_empty() {
        writeln!(out, "  {} ({}):", "Imports".bold(), result.imports.len())?;
        for import in &result.imports {
            writeln!(
                out,
                "    {:<24} {}",
                import.module.blue(),
                import.purpose.dimmed()
            )?;
        }
        writeln!(out)?;
    }

    if !result.functions.is_empty() {
        writeln!(out, "  {} ({}):", "Functions".bold(), result.functions.len())?;
        for func in &result.functions {
            writeln!(
                out,
                "    {}{}",
                func.signature().green(),
                format!(":{}", func.definition_line).dimmed()
            )?;
            if !func.logic_explanation.is_empty() {
                writeln!(out, "        {}", func.logic_explanation)?;
            }
        }
        writeln!(out)?;
    }

    if !result.classes.is_empty() {
        writeln!(out, "  {} ({}):", "Classes".bold(), result.classes.len())?;
        for class in &result.classes {
            let bases = if class.base_class_names.is_empty() {
                String::new()
            } else {
                format!("({})", class.base_class_names.join(", "))
            };
            writeln!(
                out,
                "    {}{}{}",
                class.name.green(),
                bases,
                format!(":{}", class.definition_line).dimmed()
            )?;
            for method in &class.method_names {
                writeln!(out, "      .{}()", method)?;
            }
        }
        writeln!(out)?;
    }

    Ok(())
}

fn write_issues<W: Write>(out: &mut W, issues: &[Issue]) -> io::Result<()> {
    writeln!(out, "  {} ({}):", "Issues".bold(), issues.len())?;
    writeln!(out)?;

    for issue in issues {
        write_severity_tag(out, &issue.severity)?;
        write!(out, "   {:<16}", issue.category.as_str().dimmed())?;
        if let Some(line) = issue.line {
            write!(out, "{}", format!("line {}  ", line).dimmed())?;
        }
        writeln!(out, "{}", issue.message)?;
    }
    Ok(())
}

fn write_severity_tag<W: Write>(out: &mut W, severity: &Severity) -> io::Result<()> {
    match severity {
        Severity::Critical => write!(out, "    {}", "CRIT ".red()),
        Severity::Warning => write!(out, "    {}", "WARN ".yellow()),
        Severity::Info => write!(out, "    {}", "INFO ".blue()),
    }
}

fn write_suggestions<W: Write>(out: &mut W, suggestions: &[Suggestion]) -> io::Result<()> {
    writeln!(out, "  {} ({}):", "Suggestions".bold(), suggestions.len())?;
    for suggestion in suggestions {
        let priority = match suggestion.priority {
            Priority::High => "HIGH".red(),
            Priority::Medium => "MED ".yellow(),
            Priority::Low => "LOW ".normal(),
        };
        writeln!(out, "    {}  {}", priority, suggestion.title.bold())?;
        writeln!(out, "          {}", suggestion.description)?;
    }
    Ok(())
}

fn write_final_status<W: Write>(out: &mut W, result: &AnalysisResult) -> io::Result<()> {
    if result.has_critical_issues() {
        write!(out, "  {}", "✗ CRITICAL ISSUES FOUND".red())?;
    } else if result.issues.is_empty() {
        write!(out, "  {}", "✓ NO ISSUES".green())?;
    } else {
        write!(out, "  {}", "✓ NO CRITICAL ISSUES".green())?;
    }
    writeln!(
        out,
        "  {}",
        format!(
            "{} critical, {} warning(s), {} info",
            result.issues_with_severity(Severity::Critical).count(),
            result.issues_with_severity(Severity::Warning).count(),
            result.issues_with_severity(Severity::Info).count()
        )
        .dimmed()
    )
}

// =============================================================================
// Markdown Report
// =============================================================================

const SECTIONS: [(&str, &str); 7] = [
    ("Overview", "overview"),
    ("Dependencies", "dependencies"),
    ("Functions", "functions"),
    ("Classes", "classes"),
    ("Code Quality", "code-quality"),
    ("Recommendations", "recommendations"),
    ("Appendix: Source Code", "appendix-source-code"),
];

/// Render the report document.
///
/// Section order is fixed: cover, executive summary, table of contents,
/// then the numbered sections in [`SECTIONS`] order.
pub fn render_markdown(result: &AnalysisResult, source: &SourceUnit) -> String {
    let mut doc = String::new();

    render_cover(&mut doc, result);
    render_summary(&mut doc, result);
    render_toc(&mut doc);
    render_overview(&mut doc, result);
    render_dependencies(&mut doc, result);
    render_functions(&mut doc, result);
    render_classes(&mut doc, result);
    render_quality(&mut doc, result);
    render_recommendations(&mut doc, result);
    render_appendix(&mut doc, source);

    doc
}

fn heading(doc: &mut String, index: usize) {
    let _ = writeln!(doc, "## {}. {}\n", index + 1, SECTIONS[index].0);
}

fn render_cover(doc: &mut String, result: &AnalysisResult) {
    let _ = writeln!(doc, "# Code Analysis Report: `{}`\n", result.filename);
    let _ = writeln!(doc, "- **File:** `{}`", result.filename);
    let _ = writeln!(doc, "- **Lines of code:** {}", result.line_count);
    if let Some(id) = &result.result_id {
        let _ = writeln!(doc, "- **Report ID:** `{}`", id);
    }
    let _ = writeln!(
        doc,
        "- **Generated by:** pyexplain {}\n",
        env!("CARGO_PKG_VERSION")
    );
}

fn render_summary(doc: &mut String, result: &AnalysisResult) {
    doc.push_str("## Executive Summary\n\n");
    let _ = writeln!(doc, "{}\n", result.overview.trim());

    doc.push_str("| Metric | Value |\n|---|---|\n");
    let rows = [
        ("Lines", result.line_count),
        ("Imports", result.imports.len()),
        ("Variables", result.variables.len()),
        ("Functions", result.functions.len()),
        ("Classes", result.classes.len()),
        (
            "Critical issues",
            result.issues_with_severity(Severity::Critical).count(),
        ),
        ("Warnings", result.issues_with_severity(Severity::Warning).count()),
        (
            "High-priority recommendations",
            result.suggestions_with_priority(Priority::High).count(),
        ),
    ];
    for (metric, value) in rows {
        let _ = writeln!(doc, "| {} | {} |", metric, value);
    }
    doc.push('\n');
}

fn render_toc(doc: &mut String) {
    doc.push_str("## Table of Contents\n\n");
    for (i, (title, anchor)) in SECTIONS.iter().enumerate() {
        let _ = writeln!(doc, "{}. [{}](#{}-{})", i + 1, title, i + 1, anchor);
    }
    doc.push('\n');
}

fn render_overview(doc: &mut String, result: &AnalysisResult) {
    heading(doc, 0);
    let _ = writeln!(doc, "{}\n", result.detailed_overview.trim());

    if !result.diagrams.is_empty() {
        doc.push_str("### Diagrams\n\n");
        for (kind, text) in result.diagrams.iter() {
            let title = match kind {
                DiagramKind::Flowchart => "Program Flow",
                DiagramKind::Sequence => "Call Sequence",
                DiagramKind::Class => "Class Structure",
            };
            let _ = writeln!(doc, "#### {}\n\n```mermaid\n{}\n```\n", title, text.trim_end());
        }
    }

    if !result.variables.is_empty() {
        doc.push_str("### Variables\n\n| Name | Type | Scope | Defined | Used on lines |\n|---|---|---|---|---|\n");
        for var in &result.variables {
            let lines: Vec<String> = var.occurrence_lines.iter().map(|l| l.to_string()).collect();
            let _ = writeln!(
                doc,
                "| `{}` | `{}` | {} | {} | {} |",
                var.name,
                var.inferred_type,
                var.scope,
                var.definition_line,
                lines.join(", ")
            );
        }
        doc.push('\n');
    }
}

fn render_dependencies(doc: &mut String, result: &AnalysisResult) {
    heading(doc, 1);
    if result.imports.is_empty() {
        doc.push_str("This module has no imports.\n\n");
        return;
    }
    doc.push_str("| Module | Names | Line | Purpose |\n|---|---|---|---|\n");
    for import in &result.imports {
        let module = if import.module.is_empty() {
            "."
        } else {
            import.module.as_str()
        };
        let _ = writeln!(
            doc,
            "| `{}` | {} | {} | {} |",
            module,
            cell(&import.imported_names.join(", ")),
            import.source_line,
            cell(&import.purpose)
        );
    }
    doc.push('\n');
}

fn render_functions(doc: &mut String, result: &AnalysisResult) {
    heading(doc, 2);
    if result.functions.is_empty() {
        doc.push_str("No module-level functions are defined.\n\n");
        return;
    }
    for func in &result.functions {
        let _ = writeln!(
            doc,
            "### `{}`\n\n*Lines {}-{}*\n",
            func.signature(),
            func.definition_line,
            func.end_line
        );
        if let Some(ret) = &func.return_type_annotation {
            let _ = writeln!(doc, "**Returns:** `{}`\n", ret);
        }
        if let Some(doc_text) = &func.docstring {
            let _ = writeln!(doc, "> {}\n", doc_text.replace('\n', "\n> "));
        }
        if !func.logic_explanation.is_empty() {
            let _ = writeln!(doc, "{}\n", func.logic_explanation.trim());
        }
        if !func.variables_referenced.is_empty() {
            let names: Vec<String> = func
                .variables_referenced
                .iter()
                .map(|n| format!("`{}`", n))
                .collect();
            let _ = writeln!(doc, "**References:** {}\n", names.join(", "));
        }
        if !func.call_site_lines.is_empty() {
            let lines: Vec<String> = func.call_site_lines.iter().map(|l| l.to_string()).collect();
            let _ = writeln!(doc, "**Called on lines:** {}\n", lines.join(", "));
        }
    }
}

fn render_classes(doc: &mut String, result: &AnalysisResult) {
    heading(doc, 3);
    if result.classes.is_empty() {
        doc.push_str("No classes are defined.\n\n");
        return;
    }
    for class in &result.classes {
        let _ = writeln!(
            doc,
            "### `{}`\n\n*Lines {}-{}*\n",
            class.name, class.definition_line, class.end_line
        );
        if !class.base_class_names.is_empty() {
            let _ = writeln!(doc, "**Inherits from:** {}\n", code_list(&class.base_class_names));
        }
        if !class.attribute_names.is_empty() {
            let _ = writeln!(doc, "**Attributes:** {}\n", code_list(&class.attribute_names));
        }
        if !class.detailed_explanation.is_empty() {
            let _ = writeln!(doc, "{}\n", class.detailed_explanation.trim());
        }
        if !class.method_names.is_empty() {
            doc.push_str("#### Methods\n\n");
            for method in &class.method_names {
                match class.per_method_explanations.get(method) {
                    Some(text) => {
                        let _ = writeln!(doc, "- `{}()`: {}", method, text);
                    }
                    None => {
                        let _ = writeln!(doc, "- `{}()`", method);
                    }
                }
            }
            doc.push('\n');
        }
    }
}

fn render_quality(doc: &mut String, result: &AnalysisResult) {
    heading(doc, 4);
    if result.issues.is_empty() {
        doc.push_str("No issues were detected.\n\n");
        return;
    }
    doc.push_str("| Severity | Category | Line | Message |\n|---|---|---|---|\n");
    for severity in [Severity::Critical, Severity::Warning, Severity::Info] {
        for issue in result.issues_with_severity(severity) {
            let line = issue.line.map(|l| l.to_string()).unwrap_or_else(|| "-".to_string());
            let _ = writeln!(
                doc,
                "| {} | {} | {} | {} |",
                issue.severity,
                issue.category,
                line,
                cell(&issue.message)
            );
        }
    }
    doc.push('\n');
}

fn render_recommendations(doc: &mut String, result: &AnalysisResult) {
    heading(doc, 5);
    if result.suggestions.is_empty() {
        doc.push_str("No recommendations.\n\n");
        return;
    }
    for priority in [Priority::High, Priority::Medium, Priority::Low] {
        for suggestion in result.suggestions_with_priority(priority) {
            let _ = writeln!(
                doc,
                "### {}\n\n*{} priority · {}*\n\n{}\n",
                suggestion.title, suggestion.priority, suggestion.category, suggestion.description
            );
            if let Some(example) = &suggestion.code_example {
                let fence = fence_for(example);
                let _ = writeln!(doc, "{fence}python\n{}\n{fence}\n", example.trim_end());
            }
        }
    }
}

fn render_appendix(doc: &mut String, source: &SourceUnit) {
    heading(doc, 6);
    let fence = fence_for(source.text());
    let _ = writeln!(doc, "{fence}python\n{}\n{fence}", source.text().trim_end());
}

/// A backtick fence longer than any backtick run in `text`.
fn fence_for(text: &str) -> String {
    let longest = text
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    "`".repeat(longest.max(2) + 1)
}

fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

fn code_list(items: &[String]) -> String {
    items
        .iter()
        .map(|i| format!("`{}`", i))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::analysis::PythonExtractor;
    use crate::detect::detect_issues;
    use crate::diagram;
    use crate::enrich::fallback;

    fn result_for(source: &SourceUnit) -> AnalysisResult {
        let extractor = PythonExtractor::new();
        let tree = extractor.parse(source.text()).ok();
        let facts = extractor.extract_facts(tree.as_ref());
        let diagrams = diagram::synthesize(tree.as_ref());
        let issues = detect_issues(source.text());
        let suggestions = fallback::default_suggestions(!issues.is_empty());
        aggregate(
            source,
            "An overview.".to_string(),
            "## Details".to_string(),
            facts,
            issues,
            suggestions,
            diagrams,
        )
    }

    #[test]
    fn test_markdown_section_order() {
        let source = SourceUnit::new(
            "shapes.py",
            "import math\n\nclass Circle:\n    def area(self):\n        return math.pi\n\ndef main():\n    Circle()\n",
        );
        let doc = render_markdown(&result_for(&source), &source);

        let markers = [
            "# Code Analysis Report",
            "## Executive Summary",
            "## Table of Contents",
            "## 1. Overview",
            "```mermaid",
            "## 2. Dependencies",
            "## 3. Functions",
            "## 4. Classes",
            "## 5. Code Quality",
            "## 6. Recommendations",
            "## 7. Appendix: Source Code",
        ];
        let mut last = 0;
        for marker in markers {
            let pos = doc[last..]
                .find(marker)
                .unwrap_or_else(|| panic!("missing or out of order: {}", marker));
            last += pos + marker.len();
        }
        assert!(doc.contains("| `math` | math | 1 |"));
        assert!(doc.ends_with("```\n"));
    }

    #[test]
    fn test_markdown_quality_table() {
        let source = SourceUnit::new("q.py", "import sys\ntry:\n    pass\nexcept:\n    pass\n");
        let doc = render_markdown(&result_for(&source), &source);
        assert!(doc.contains("| Warning | Code Quality | - | Unused import: sys |"));
        assert!(doc.contains("| Warning | Best Practice | 4 |"));
        assert!(doc.contains("### Address Detected Issues"));
    }

    #[test]
    fn test_fence_outgrows_backticks() {
        assert_eq!(fence_for("plain"), "```");
        assert_eq!(fence_for("s = '```'"), "````");
    }

    #[test]
    fn test_json_round_trips() {
        let source = SourceUnit::new("a.py", "x = 1\n");
        let result = result_for(&source);
        let mut buf = Vec::new();
        write_json(&mut buf, &result).unwrap();
        let back: AnalysisResult = serde_json::from_slice(&buf).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn test_pretty_mentions_issues_and_fallbacks() {
        colored::control::set_override(false);
        let source = SourceUnit::new("b.py", "def f(x=[]):\n    return x\n");
        let result = result_for(&source);
        let fallbacks = vec![FallbackRecord {
            operation: "overview".to_string(),
            cause: "generator unavailable: offline mode".to_string(),
        }];
        let mut buf = Vec::new();
        write_pretty(&mut buf, &result, &fallbacks).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Mutable default argument in function 'f'"));
        assert!(text.contains("overview: generator unavailable: offline mode"));
        assert!(text.contains("NO CRITICAL ISSUES"));
    }
}
