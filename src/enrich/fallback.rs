//! Deterministic substitutes used when a generator call fails.

use crate::aggregate::{Priority, Suggestion};
use crate::analysis::{Class, Function, Import, StructuralFacts};

pub fn overview(filename: &str, facts: &StructuralFacts, line_count: usize) -> String {
    format!(
        "`{}` is a Python module of {} lines with {} functions, {} classes and {} imports.",
        filename,
        line_count,
        facts.functions.len(),
        facts.classes.len(),
        facts.imports.len()
    )
}

/// Markdown structural summary built from counts only.
pub fn detailed_overview(facts: &StructuralFacts, line_count: usize) -> String {
    format!(
        "## Code Structure Summary\n\n\
         - **Functions:** {}\n\
         - **Classes:** {}\n\
         - **Imports:** {}\n\
         - **Total lines:** {}\n",
        facts.functions.len(),
        facts.classes.len(),
        facts.imports.len(),
        line_count
    )
}

pub fn function_explanation(func: &Function) -> String {
    match first_line(func.docstring.as_deref()) {
        Some(summary) => format!("`{}`: {}", func.signature(), summary),
        None => format!(
            "`{}` is defined at line {} and takes {} parameter{}.",
            func.signature(),
            func.definition_line,
            func.parameters.len(),
            if func.parameters.len() == 1 { "" } else { "s" }
        ),
    }
}

pub fn class_explanation(class: &Class) -> String {
    let mut text = format!("Class `{}`", class.name);
    if !class.base_class_names.is_empty() {
        text.push_str(&format!(" extends {}", class.base_class_names.join(", ")));
        text.push_str(" and");
    }
    let methods = class.method_names.len();
    let attributes = class.attribute_names.len();
    text.push_str(&format!(
        " defines {} method{} and {} class attribute{}.",
        methods,
        if methods == 1 { "" } else { "s" },
        attributes,
        if attributes == 1 { "" } else { "s" }
    ));
    if let Some(summary) = first_line(class.docstring.as_deref()) {
        text.push(' ');
        text.push_str(summary);
    }
    text
}

pub fn method_explanation(class: &Class, method: &str) -> String {
    format!("Method `{}` of class `{}`.", method, class.name)
}

pub fn import_purpose(import: &Import) -> String {
    let names = import.imported_names.join(", ");
    if import.imported_names.len() == 1 && import.imported_names[0] == import.module {
        format!("Imports the `{}` module.", import.module)
    } else if import.module.is_empty() {
        format!("Imports {} from the current package.", names)
    } else {
        format!("Imports {} from `{}`.", names, import.module)
    }
}

/// Default suggestion set; the first entry only when issues were detected.
pub fn default_suggestions(has_issues: bool) -> Vec<Suggestion> {
    let mut suggestions = Vec::with_capacity(3);
    if has_issues {
        suggestions.push(Suggestion {
            category: "Code Quality".to_string(),
            title: "Address Detected Issues".to_string(),
            description: "Fix the issues reported by static analysis before making further changes."
                .to_string(),
            code_example: None,
            priority: Priority::High,
        });
    }
    suggestions.push(Suggestion {
        category: "Best Practice".to_string(),
        title: "Add Type Hints".to_string(),
        description: "Annotate function parameters and return values to document intent and enable static checking."
            .to_string(),
        code_example: Some("def total(prices: list[float]) -> float:\n    ...".to_string()),
        priority: Priority::Medium,
    });
    suggestions.push(Suggestion {
        category: "Documentation".to_string(),
        title: "Add Docstrings".to_string(),
        description: "Document each public function and class with a short docstring describing its behavior."
            .to_string(),
        code_example: None,
        priority: Priority::Medium,
    });
    suggestions
}

fn first_line(text: Option<&str>) -> Option<&str> {
    text?.lines().map(str::trim).find(|l| !l.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};

    #[test]
    fn test_default_suggestions() {
        let with_issues = default_suggestions(true);
        assert_eq!(with_issues.len(), 3);
        assert_eq!(with_issues[0].title, "Address Detected Issues");
        assert_eq!(with_issues[0].priority, Priority::High);
        assert_eq!(default_suggestions(false).len(), 2);
    }

    #[test]
    fn test_detailed_overview_counts() {
        let text = detailed_overview(&StructuralFacts::default(), 42);
        assert!(text.contains("- **Functions:** 0"));
        assert!(text.contains("- **Total lines:** 42"));
    }

    #[test]
    fn test_function_explanation_prefers_docstring() {
        let mut func = Function {
            name: "load".to_string(),
            parameters: vec!["path".to_string()],
            return_type_annotation: None,
            docstring: Some("\nRead the file.\n\nMore detail.".to_string()),
            definition_line: 3,
            end_line: 5,
            variables_referenced: BTreeSet::new(),
            call_site_lines: BTreeSet::new(),
            logic_explanation: String::new(),
        };
        assert_eq!(function_explanation(&func), "`load(path)`: Read the file.");
        func.docstring = None;
        assert_eq!(
            function_explanation(&func),
            "`load(path)` is defined at line 3 and takes 1 parameter."
        );
    }

    #[test]
    fn test_class_and_import_fallbacks() {
        let class = Class {
            name: "Dog".to_string(),
            method_names: vec!["bark".to_string()],
            attribute_names: vec![],
            base_class_names: vec!["Animal".to_string()],
            docstring: None,
            definition_line: 1,
            end_line: 3,
            detailed_explanation: String::new(),
            per_method_explanations: BTreeMap::new(),
        };
        assert_eq!(
            class_explanation(&class),
            "Class `Dog` extends Animal and defines 1 method and 0 class attributes."
        );
        let plural = Class {
            method_names: vec!["bark".to_string(), "sit".to_string()],
            attribute_names: vec!["legs".to_string()],
            base_class_names: vec![],
            ..class.clone()
        };
        assert_eq!(
            class_explanation(&plural),
            "Class `Dog` defines 2 methods and 1 class attribute."
        );

        let import = Import {
            module: "typing".to_string(),
            imported_names: vec!["List".to_string()],
            source_line: 1,
            purpose: String::new(),
        };
        assert_eq!(import_purpose(&import), "Imports List from `typing`.");
    }
}
