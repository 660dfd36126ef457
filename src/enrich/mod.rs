//! LLM enrichment.
//!
//! Every piece of generated text has a deterministic fallback, so a missing
//! or slow generator degrades the report instead of failing the analysis.

pub mod fallback;
mod generator;
mod orchestrator;
pub mod prompts;
pub mod replies;

pub use generator::{GeneratorError, OfflineGenerator, OllamaClient, TextGenerator};
pub use orchestrator::{
    ClassExplanation, Enricher, Enrichment, EnrichmentError, EnrichmentOptions, FallbackRecord,
    Outcome,
};
pub use replies::{parse_batch_imports, parse_class_reply, parse_suggestions, ClassReply};
