//! One analysis run over a decoded source unit.
//!
//! ```text
//!              ┌─ parse → extract facts → diagrams ─┐
//! SourceUnit ──┤                                     ├─→ enrich → aggregate
//!              └─ detect issues (own parse) ─────────┘
//! ```

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::aggregate::{aggregate, AnalysisResult};
use crate::analysis::{PythonExtractor, StructuralFacts};
use crate::config::Settings;
use crate::detect::{Detector, Issue};
use crate::diagram::{self, DiagramSet};
use crate::enrich::{Enricher, EnrichmentOptions, FallbackRecord, TextGenerator};
use crate::source::SourceUnit;

/// The aggregate plus the enrichment calls that fell back while building it.
#[derive(Debug, Clone)]
pub struct AnalysisRun {
    pub result: AnalysisResult,
    pub fallbacks: Vec<FallbackRecord>,
}

type StaticOutput = ((StructuralFacts, DiagramSet), Vec<Issue>);

/// Parse, extract and detect. CPU-bound; the two halves run on rayon.
fn static_stages(
    extractor: &PythonExtractor,
    detector: &Detector,
    source: &SourceUnit,
) -> StaticOutput {
    rayon::join(
        || {
            let tree = extractor.parse(source.text()).ok();
            let facts = extractor.extract_facts(tree.as_ref());
            let diagrams = diagram::synthesize(tree.as_ref());
            (facts, diagrams)
        },
        || detector.detect(source.text()),
    )
}

/// Runs every stage for a source unit.
pub struct Analyzer {
    extractor: PythonExtractor,
    detector: Detector,
    enricher: Enricher,
}

impl Analyzer {
    pub fn new(settings: &Settings, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            extractor: PythonExtractor::new(),
            detector: Detector::from_config(&settings.checks),
            enricher: Enricher::new(generator, EnrichmentOptions::from_settings(settings)),
        }
    }

    pub fn with_parts(detector: Detector, enricher: Enricher) -> Self {
        Self {
            extractor: PythonExtractor::new(),
            detector,
            enricher,
        }
    }

    /// Analyze one unit. Never fails: parse errors surface as a critical
    /// issue and generator failures as fallback text.
    ///
    /// Must run inside a tokio runtime; the static stages are moved off the
    /// async workers with `spawn_blocking`.
    pub async fn analyze(&self, source: &SourceUnit) -> AnalysisRun {
        let start = Instant::now();

        let (extractor, detector, unit) = (self.extractor, self.detector.clone(), source.clone());
        let handle =
            tokio::task::spawn_blocking(move || static_stages(&extractor, &detector, &unit));
        let ((mut facts, diagrams), issues) = match handle.await {
            Ok(output) => output,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(err) => {
                warn!(error = %err, "static stages cancelled, running inline");
                static_stages(&self.extractor, &self.detector, source)
            }
        };
        debug!(
            file = source.filename(),
            functions = facts.functions.len(),
            classes = facts.classes.len(),
            issues = issues.len(),
            "static stages finished"
        );

        let enrichment = self.enricher.enrich(source, &mut facts, &issues).await;

        let result = aggregate(
            source,
            enrichment.overview,
            enrichment.detailed_overview,
            facts,
            issues,
            enrichment.suggestions,
            diagrams,
        );

        info!(
            file = source.filename(),
            lines = result.line_count,
            issues = result.issues.len(),
            fallbacks = enrichment.fallbacks.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "analysis complete"
        );

        AnalysisRun {
            result,
            fallbacks: enrichment.fallbacks,
        }
    }
}
