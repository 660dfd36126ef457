//! pyexplain - explain Python source files.
//!
//! pyexplain reads one Python module and produces an analysis record:
//! structural facts, static-analysis issues, Mermaid diagrams, and
//! natural-language explanations from an Ollama-compatible model. Generator
//! failures never fail an analysis; each one is replaced by deterministic
//! fallback text and recorded.
//!
//! # Architecture
//!
//! - `source`: decoded input unit
//! - `syntax`: tree-sitter parse lowered to a closed syntax tree
//! - `analysis`: structural extraction (imports, variables, functions, classes)
//! - `detect`: static issue detection
//! - `diagram`: Mermaid diagram synthesis
//! - `enrich`: generator client, prompts, reply parsers, fallbacks
//! - `aggregate`: the analysis record
//! - `pipeline`: runs the stages for one source unit
//! - `config`: YAML settings with environment overrides
//! - `report`: output formatting (pretty, JSON, Markdown)

pub mod aggregate;
pub mod analysis;
pub mod cli;
pub mod config;
pub mod detect;
pub mod diagram;
pub mod enrich;
pub mod pipeline;
pub mod report;
pub mod source;
pub mod syntax;

pub use aggregate::{AnalysisResult, Priority, Suggestion};
pub use analysis::{PythonExtractor, StructuralFacts};
pub use config::Settings;
pub use detect::{detect_issues, Detector, Issue, Severity};
pub use diagram::{DiagramKind, DiagramSet};
pub use enrich::{Enricher, EnrichmentOptions, FallbackRecord, TextGenerator};
pub use pipeline::{AnalysisRun, Analyzer};
pub use source::{InputError, SourceUnit};
