//! Detection runner that orchestrates all checks.

use tracing::debug;

use crate::config::ChecksConfig;
use crate::syntax;

use super::{
    detect_bare_excepts, detect_mutable_defaults, detect_unused_imports, Category, Issue, Severity,
};

/// Executes the static checks against one source text.
///
/// See [`detect_unused_imports`] for which import forms the unused-import
/// check leaves alone.
#[derive(Debug, Clone)]
pub struct Detector {
    unused_imports: bool,
    bare_except: bool,
    mutable_defaults: bool,
}

impl Default for Detector {
    fn default() -> Self {
        Self {
            unused_imports: true,
            bare_except: true,
            mutable_defaults: true,
        }
    }
}

impl Detector {
    /// Create a detector with every check enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detector with the checks enabled in configuration.
    pub fn from_config(checks: &ChecksConfig) -> Self {
        Self {
            unused_imports: checks.unused_imports,
            bare_except: checks.bare_except,
            mutable_defaults: checks.mutable_defaults,
        }
    }

    pub fn unused_imports(mut self, enabled: bool) -> Self {
        self.unused_imports = enabled;
        self
    }

    pub fn bare_except(mut self, enabled: bool) -> Self {
        self.bare_except = enabled;
        self
    }

    pub fn mutable_defaults(mut self, enabled: bool) -> Self {
        self.mutable_defaults = enabled;
        self
    }

    /// Run the checks in order: syntax, unused imports, bare excepts,
    /// mutable defaults.
    ///
    /// Source that does not parse yields exactly one critical syntax issue
    /// and no other checks run.
    pub fn detect(&self, source: &str) -> Vec<Issue> {
        let tree = match syntax::parse(source) {
            Ok(tree) => tree,
            Err(err) => {
                debug!(line = ?err.line(), "source failed to parse");
                return vec![Issue::new(
                    Severity::Critical,
                    Category::Syntax,
                    format!("Syntax Error: {}", err.message()),
                    err.line(),
                )];
            }
        };

        let mut issues = Vec::new();
        if self.unused_imports {
            issues.extend(detect_unused_imports(&tree));
        }
        if self.bare_except {
            issues.extend(detect_bare_excepts(&tree));
        }
        if self.mutable_defaults {
            issues.extend(detect_mutable_defaults(&tree));
        }
        debug!(count = issues.len(), "static checks finished");
        issues
    }
}

/// Run every check with default settings.
pub fn detect_issues(source: &str) -> Vec<Issue> {
    Detector::new().detect(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_short_circuits() {
        let issues = detect_issues("import sys\ndef broken(:\n    pass\n");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Critical);
        assert_eq!(issues[0].category, Category::Syntax);
        assert!(issues[0].message.starts_with("Syntax Error: "));
        assert_eq!(issues[0].line, Some(2));
    }

    #[test]
    fn test_issue_order() {
        let source = r#"import sys

def f(x=[]):
    try:
        pass
    except:
        pass
"#;
        let categories: Vec<Category> = detect_issues(source).iter().map(|i| i.category).collect();
        assert_eq!(
            categories,
            vec![
                Category::CodeQuality,
                Category::BestPractice,
                Category::BestPractice
            ]
        );
        let issues = detect_issues(source);
        assert_eq!(issues[1].line, Some(6));
        assert_eq!(issues[2].line, Some(3));
    }

    #[test]
    fn test_disabled_checks() {
        let detector = Detector::new().unused_imports(false).bare_except(false);
        let issues = detector.detect("import sys\ndef f(x={}):\n    pass\n");
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("'f'"));
    }
}
