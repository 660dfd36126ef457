//! Enrichment orchestration: fan-out of generator calls with per-call
//! timeout tiers and deterministic fallbacks.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::aggregate::Suggestion;
use crate::analysis::{Class, Function, Import, StructuralFacts};
use crate::config::{ImportMode, Settings, TimeoutTier, TimeoutTiers};
use crate::detect::Issue;
use crate::source::{truncate_chars, SourceUnit};

use super::generator::{GeneratorError, TextGenerator};
use super::{fallback, prompts, replies};

/// Why a single enrichment call did not produce usable text.
#[derive(Error, Debug)]
pub enum EnrichmentError {
    #[error("{tier} tier timed out after {limit:?}")]
    Timeout { tier: TimeoutTier, limit: Duration },
    #[error(transparent)]
    Generator(#[from] GeneratorError),
    #[error("generator returned an empty reply")]
    EmptyReply,
    #[error("unusable reply: {0}")]
    Unusable(String),
}

/// Result of one enrichment operation.
#[derive(Debug)]
pub enum Outcome<T> {
    Generated(T),
    Fallback { value: T, cause: EnrichmentError },
}

impl<T> Outcome<T> {
    fn from_result(result: Result<T, EnrichmentError>, fallback: impl FnOnce() -> T) -> Self {
        match result {
            Ok(value) => Outcome::Generated(value),
            Err(cause) => Outcome::Fallback {
                value: fallback(),
                cause,
            },
        }
    }

    /// Unwrap the value, logging and recording the cause of a fallback.
    fn settle(self, operation: impl Into<String>, log: &mut Vec<FallbackRecord>) -> T {
        match self {
            Outcome::Generated(value) => value,
            Outcome::Fallback { value, cause } => {
                let record = FallbackRecord {
                    operation: operation.into(),
                    cause: cause.to_string(),
                };
                warn!(operation = %record.operation, cause = %record.cause, "enrichment fell back");
                log.push(record);
                value
            }
        }
    }
}

/// Observability entry for one fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FallbackRecord {
    pub operation: String,
    pub cause: String,
}

impl fmt::Display for FallbackRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.operation, self.cause)
    }
}

/// Generated or substituted class text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassExplanation {
    pub explanation: String,
    pub methods: BTreeMap<String, String>,
}

enum ImportPurposes {
    Batch(Outcome<Vec<String>>),
    Individual(Vec<Outcome<String>>),
}

/// Module-level text produced by enrichment. Per-entity text is written
/// into the facts themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrichment {
    pub overview: String,
    pub detailed_overview: String,
    pub suggestions: Vec<Suggestion>,
    pub fallbacks: Vec<FallbackRecord>,
}

/// Tunables for the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentOptions {
    pub tiers: TimeoutTiers,
    pub import_mode: ImportMode,
    pub max_concurrency: usize,
    pub excerpt_chars: usize,
    pub snippet_chars: usize,
}

impl Default for EnrichmentOptions {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl EnrichmentOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            tiers: settings.timeouts.tiers(),
            import_mode: settings.enrichment.import_mode,
            max_concurrency: settings.enrichment.max_concurrency,
            excerpt_chars: settings.enrichment.excerpt_chars,
            snippet_chars: settings.enrichment.snippet_chars,
        }
    }
}

/// Drives every enrichment call for one source unit.
pub struct Enricher {
    generator: Arc<dyn TextGenerator>,
    options: EnrichmentOptions,
}

impl Enricher {
    pub fn new(generator: Arc<dyn TextGenerator>, options: EnrichmentOptions) -> Self {
        Self { generator, options }
    }

    /// Enrich `facts` in place and produce the module-level text.
    ///
    /// Never fails: every failed call is replaced by its fallback and
    /// recorded in [`Enrichment::fallbacks`].
    pub async fn enrich(
        &self,
        source: &SourceUnit,
        facts: &mut StructuralFacts,
        issues: &[Issue],
    ) -> Enrichment {
        let limit = self.options.max_concurrency.max(1);
        debug!(generator = %self.generator.describe(), limit, "starting enrichment");

        let (overview, detailed, functions, classes, imports, suggestions) = {
            let facts = &*facts;
            tokio::join!(
                self.overview(source, facts),
                self.detailed_overview(source, facts, issues),
                stream::iter(facts.functions.iter().map(|f| self.explain_function(source, f)))
                    .buffered(limit)
                    .collect::<Vec<_>>(),
                stream::iter(facts.classes.iter().map(|c| self.explain_class(source, c)))
                    .buffered(limit)
                    .collect::<Vec<_>>(),
                self.explain_imports(&facts.imports),
                self.suggest(source, facts, issues),
            )
        };

        let mut fallbacks = Vec::new();
        let overview = overview.settle("overview", &mut fallbacks);
        let detailed_overview = detailed.settle("detailed overview", &mut fallbacks);

        for (func, outcome) in facts.functions.iter_mut().zip(functions) {
            func.logic_explanation = outcome.settle(format!("function {}", func.name), &mut fallbacks);
        }

        for (class, outcome) in facts.classes.iter_mut().zip(classes) {
            let text = outcome.settle(format!("class {}", class.name), &mut fallbacks);
            class.detailed_explanation = text.explanation;
            class.per_method_explanations = text.methods;
        }

        match imports {
            ImportPurposes::Batch(outcome) => {
                let purposes = outcome.settle("import purposes", &mut fallbacks);
                for (import, purpose) in facts.imports.iter_mut().zip(purposes) {
                    import.purpose = purpose;
                }
            }
            ImportPurposes::Individual(outcomes) => {
                for (import, outcome) in facts.imports.iter_mut().zip(outcomes) {
                    import.purpose =
                        outcome.settle(format!("import {}", import.module), &mut fallbacks);
                }
            }
        }

        let suggestions = suggestions.settle("suggestions", &mut fallbacks);

        debug!(fallbacks = fallbacks.len(), "enrichment finished");
        Enrichment {
            overview,
            detailed_overview,
            suggestions,
            fallbacks,
        }
    }

    /// One generator call bounded by its tier. Empty replies are failures.
    async fn call(&self, tier: TimeoutTier, prompt: String) -> Result<String, EnrichmentError> {
        let limit = self.options.tiers.get(tier);
        debug!(%tier, prompt_chars = prompt.chars().count(), "enrichment request");

        let reply = tokio::time::timeout(limit, self.generator.generate(&prompt))
            .await
            .map_err(|_| EnrichmentError::Timeout { tier, limit })??;

        let reply = reply.trim();
        if reply.is_empty() {
            return Err(EnrichmentError::EmptyReply);
        }
        Ok(reply.to_string())
    }

    fn excerpt<'a>(&self, source: &'a SourceUnit) -> &'a str {
        source.excerpt(self.options.excerpt_chars)
    }

    fn snippet(&self, source: &SourceUnit, start: usize, end: usize) -> String {
        let lines = source.lines_between(start, end);
        truncate_chars(&lines, self.options.snippet_chars).to_string()
    }

    async fn overview(&self, source: &SourceUnit, facts: &StructuralFacts) -> Outcome<String> {
        let prompt = prompts::overview(self.excerpt(source), facts);
        let result = self.call(TimeoutTier::Medium, prompt).await;
        Outcome::from_result(result, || {
            fallback::overview(source.filename(), facts, source.line_count())
        })
    }

    async fn detailed_overview(
        &self,
        source: &SourceUnit,
        facts: &StructuralFacts,
        issues: &[Issue],
    ) -> Outcome<String> {
        let prompt =
            prompts::detailed_overview(self.excerpt(source), facts, issues, source.line_count());
        let result = self.call(TimeoutTier::Long, prompt).await;
        Outcome::from_result(result, || {
            fallback::detailed_overview(facts, source.line_count())
        })
    }

    async fn explain_function(&self, source: &SourceUnit, func: &Function) -> Outcome<String> {
        let snippet = self.snippet(source, func.definition_line, func.end_line);
        let result = self
            .call(TimeoutTier::Medium, prompts::function(func, &snippet))
            .await;
        Outcome::from_result(result, || fallback::function_explanation(func))
    }

    /// Class prose plus one explanation per method. A reply missing the
    /// prose or a method block is completed from fallbacks and reported as
    /// a fallback naming what was substituted.
    async fn explain_class(&self, source: &SourceUnit, class: &Class) -> Outcome<ClassExplanation> {
        let snippet = self.snippet(source, class.definition_line, class.end_line);
        let reply = match self
            .call(TimeoutTier::Medium, prompts::class(class, &snippet))
            .await
        {
            Ok(reply) => reply,
            Err(cause) => {
                return Outcome::Fallback {
                    value: ClassExplanation {
                        explanation: fallback::class_explanation(class),
                        methods: complete_methods(class, BTreeMap::new()),
                    },
                    cause,
                }
            }
        };

        let parsed = replies::parse_class_reply(&reply, &class.method_names);
        let mut gaps = Vec::new();
        let explanation = if parsed.explanation.is_empty() {
            gaps.push("no class prose".to_string());
            fallback::class_explanation(class)
        } else {
            parsed.explanation
        };
        let missing: Vec<&str> = class
            .method_names
            .iter()
            .filter(|m| !parsed.methods.contains_key(m.as_str()))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            gaps.push(format!("no block for method {}", missing.join(", ")));
        }

        let value = ClassExplanation {
            explanation,
            methods: complete_methods(class, parsed.methods),
        };
        if gaps.is_empty() {
            Outcome::Generated(value)
        } else {
            Outcome::Fallback {
                value,
                cause: EnrichmentError::Unusable(gaps.join("; ")),
            }
        }
    }

    async fn explain_imports(&self, imports: &[Import]) -> ImportPurposes {
        match self.options.import_mode {
            ImportMode::Batch => ImportPurposes::Batch(self.explain_imports_batch(imports).await),
            ImportMode::Individual => ImportPurposes::Individual(
                stream::iter(imports.iter().map(|import| self.explain_import(import)))
                    .buffered(self.options.max_concurrency.max(1))
                    .collect()
                    .await,
            ),
        }
    }

    async fn explain_import(&self, import: &Import) -> Outcome<String> {
        let result = self
            .call(TimeoutTier::Short, prompts::single_import(import))
            .await;
        Outcome::from_result(result, || fallback::import_purpose(import))
    }

    /// One call for every import. Imports the reply has no block for get a
    /// fallback sentence; the outcome is then a fallback naming them.
    async fn explain_imports_batch(&self, imports: &[Import]) -> Outcome<Vec<String>> {
        if imports.is_empty() {
            return Outcome::Generated(Vec::new());
        }

        let reply = match self
            .call(TimeoutTier::Medium, prompts::batch_imports(imports))
            .await
        {
            Ok(reply) => reply,
            Err(cause) => {
                return Outcome::Fallback {
                    value: imports.iter().map(fallback::import_purpose).collect(),
                    cause,
                }
            }
        };

        let parsed = replies::parse_batch_imports(&reply, imports.len());
        let missing: Vec<String> = parsed
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_none())
            .map(|(i, _)| (i + 1).to_string())
            .collect();
        let purposes: Vec<String> = parsed
            .into_iter()
            .zip(imports)
            .map(|(purpose, import)| purpose.unwrap_or_else(|| fallback::import_purpose(import)))
            .collect();

        if missing.is_empty() {
            Outcome::Generated(purposes)
        } else {
            Outcome::Fallback {
                value: purposes,
                cause: EnrichmentError::Unusable(format!(
                    "no block for import {}",
                    missing.join(", ")
                )),
            }
        }
    }

    async fn suggest(
        &self,
        source: &SourceUnit,
        facts: &StructuralFacts,
        issues: &[Issue],
    ) -> Outcome<Vec<Suggestion>> {
        let prompt = prompts::suggestions(self.excerpt(source), facts, issues);
        let result = self
            .call(TimeoutTier::Long, prompt)
            .await
            .and_then(|reply| {
                let parsed = replies::parse_suggestions(&reply);
                if parsed.is_empty() {
                    Err(EnrichmentError::Unusable(
                        "no suggestion blocks found".to_string(),
                    ))
                } else {
                    Ok(parsed)
                }
            });
        Outcome::from_result(result, || fallback::default_suggestions(!issues.is_empty()))
    }
}

/// Give every method an explanation, keeping generated ones.
fn complete_methods(
    class: &Class,
    mut generated: BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    for method in &class.method_names {
        generated
            .entry(method.clone())
            .or_insert_with(|| fallback::method_explanation(class, method));
    }
    generated
}
