//! The analysis record handed to rendering and storage collaborators.

use serde::{Deserialize, Serialize};

use crate::analysis::{Class, Function, Import, StructuralFacts, Variable};
use crate::detect::{Issue, Severity};
use crate::diagram::DiagramSet;
use crate::source::SourceUnit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Lenient, case-insensitive parse; anything unrecognized is Medium.
    pub fn parse_lenient(value: &str) -> Self {
        let lower = value.trim().to_lowercase();
        if lower.starts_with("high") {
            Priority::High
        } else if lower.starts_with("low") {
            Priority::Low
        } else {
            Priority::Medium
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::High => write!(f, "High"),
            Priority::Medium => write!(f, "Medium"),
            Priority::Low => write!(f, "Low"),
        }
    }
}

/// An improvement suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub category: String,
    pub title: String,
    pub description: String,
    pub code_example: Option<String>,
    pub priority: Priority,
}

/// Everything known about one analyzed source unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub filename: String,
    pub line_count: usize,
    pub overview: String,
    pub detailed_overview: String,
    pub variables: Vec<Variable>,
    pub functions: Vec<Function>,
    pub classes: Vec<Class>,
    pub imports: Vec<Import>,
    pub issues: Vec<Issue>,
    pub suggestions: Vec<Suggestion>,
    pub diagrams: DiagramSet,
    /// Assigned by a persistence collaborator after the record is stored.
    pub result_id: Option<String>,
}

/// Combine stage outputs into one record. No validation is performed.
pub fn aggregate(
    source: &SourceUnit,
    overview: String,
    detailed_overview: String,
    facts: StructuralFacts,
    issues: Vec<Issue>,
    suggestions: Vec<Suggestion>,
    diagrams: DiagramSet,
) -> AnalysisResult {
    AnalysisResult {
        filename: source.filename().to_string(),
        line_count: source.line_count(),
        overview,
        detailed_overview,
        variables: facts.variables,
        functions: facts.functions,
        classes: facts.classes,
        imports: facts.imports,
        issues,
        suggestions,
        diagrams,
        result_id: None,
    }
}

impl AnalysisResult {
    /// Record the identifier under which the result was persisted.
    pub fn assign_id(&mut self, id: impl Into<String>) {
        self.result_id = Some(id.into());
    }

    pub fn suggestions_with_priority(&self, priority: Priority) -> impl Iterator<Item = &Suggestion> {
        self.suggestions.iter().filter(move |s| s.priority == priority)
    }

    pub fn issues_with_severity(&self, severity: Severity) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.severity == severity)
    }

    pub fn has_critical_issues(&self) -> bool {
        self.issues.iter().any(Issue::is_critical)
    }
}
