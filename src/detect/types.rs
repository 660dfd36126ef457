//! Core types for detection results.

use serde::{Deserialize, Serialize};

/// Severity levels for issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "Critical"),
            Severity::Warning => write!(f, "Warning"),
            Severity::Info => write!(f, "Info"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "warning" => Ok(Severity::Warning),
            "info" => Ok(Severity::Info),
            _ => Err(format!("unknown severity: {}", s)),
        }
    }
}

/// Issue categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Syntax")]
    Syntax,
    #[serde(rename = "Code Quality")]
    CodeQuality,
    #[serde(rename = "Best Practice")]
    BestPractice,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Syntax => "Syntax",
            Category::CodeQuality => "Code Quality",
            Category::BestPractice => "Best Practice",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single detected issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Severity,
    pub message: String,
    /// `None` when the check does not attribute a line (unused imports).
    pub line: Option<usize>,
    pub category: Category,
}

impl Issue {
    pub fn new(
        severity: Severity,
        category: Category,
        message: impl Into<String>,
        line: Option<usize>,
    ) -> Self {
        Self {
            severity,
            message: message.into(),
            line,
            category,
        }
    }

    /// Check if this is a critical issue.
    pub fn is_critical(&self) -> bool {
        self.severity == Severity::Critical
    }
}
