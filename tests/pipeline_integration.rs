//! End-to-end pipeline tests with deterministic generator stubs.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use pyexplain::aggregate::Priority;
use pyexplain::config::{Settings, TimeoutTiers};
use pyexplain::detect::{Category, Detector, Severity};
use pyexplain::enrich::{
    fallback, Enricher, EnrichmentOptions, GeneratorError, OfflineGenerator, TextGenerator,
};
use pyexplain::pipeline::{AnalysisRun, Analyzer};
use pyexplain::source::{InputError, SourceUnit};

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn load_fixture(name: &str) -> SourceUnit {
    let bytes = std::fs::read(testdata_path().join(name)).expect("should read fixture");
    SourceUnit::from_bytes(name, &bytes).expect("fixture should be UTF-8")
}

/// Fixed replies keyed on the opening words of each prompt.
struct CannedGenerator {
    calls: AtomicUsize,
}

impl CannedGenerator {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TextGenerator for CannedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = if prompt.contains("IMPORT 1: <explanation>") {
            "IMPORT 1: Reads and writes JSON.\nIMPORT 2: Operating system helpers.\nIMPORT 3: Type hints."
                .to_string()
        } else if prompt.starts_with("Explain the logic") {
            "Walks through the function.".to_string()
        } else if prompt.starts_with("Explain the Python class `Item`") {
            "Represents stock.\nMETHOD __init__: Stores name and price.\nMETHOD total: Multiplies price by quantity."
                .to_string()
        } else if prompt.starts_with("Explain the Python class") {
            "Stock that expires.\nMETHOD expired: Compares the age with the shelf life.".to_string()
        } else if prompt.starts_with("Review this") {
            "CATEGORY: Maintainability\nTITLE: Narrow the except\nDESCRIPTION: Catch OSError.\nPRIORITY: High\n---\nTITLE: Drop os\nDESCRIPTION: Unused import.\nPRIORITY: Low\n---"
                .to_string()
        } else if prompt.starts_with("Write a detailed") {
            "## Architecture\n\nLoads and summarizes inventory.".to_string()
        } else {
            "Tracks a small shop's inventory.".to_string()
        };
        Ok(reply)
    }

    fn describe(&self) -> String {
        "canned".to_string()
    }
}

/// Never answers; every call hits its timeout.
struct HangingGenerator;

#[async_trait]
impl TextGenerator for HangingGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GeneratorError> {
        futures::future::pending::<()>().await;
        Ok(String::new())
    }

    fn describe(&self) -> String {
        "hanging".to_string()
    }
}

fn fast_timeouts() -> EnrichmentOptions {
    EnrichmentOptions {
        tiers: TimeoutTiers::uniform(Duration::from_millis(25)),
        ..EnrichmentOptions::default()
    }
}

#[tokio::test]
async fn test_canned_replies_fill_every_field() {
    let source = load_fixture("inventory.py");
    let analyzer = Analyzer::new(&Settings::default(), Arc::new(CannedGenerator::new()));
    let AnalysisRun { result, fallbacks } = analyzer.analyze(&source).await;

    assert!(fallbacks.is_empty(), "unexpected fallbacks: {:?}", fallbacks);
    assert_eq!(result.filename, "inventory.py");
    assert_eq!(result.line_count, 55);
    assert_eq!(result.overview, "Tracks a small shop's inventory.");
    assert!(result.detailed_overview.starts_with("## Architecture"));

    let purposes: Vec<&str> = result.imports.iter().map(|i| i.purpose.as_str()).collect();
    assert_eq!(
        purposes,
        vec!["Reads and writes JSON.", "Operating system helpers.", "Type hints."]
    );

    assert!(result
        .functions
        .iter()
        .all(|f| f.logic_explanation == "Walks through the function."));

    let item = &result.classes[0];
    assert_eq!(item.detailed_explanation, "Represents stock.");
    assert_eq!(item.per_method_explanations["total"], "Multiplies price by quantity.");
    assert_eq!(item.per_method_explanations["__init__"], "Stores name and price.");
    assert_eq!(result.classes[1].detailed_explanation, "Stock that expires.");

    assert_eq!(result.suggestions.len(), 2);
    assert_eq!(result.suggestions_with_priority(Priority::High).count(), 1);
    assert_eq!(result.issues.len(), 3);
    assert_eq!(result.diagrams.len(), 3);
    assert!(result.result_id.is_none());
}

/// Class replies without prose and without an `__init__` block.
struct TerseClassGenerator(CannedGenerator);

#[async_trait]
impl TextGenerator for TerseClassGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError> {
        if prompt.starts_with("Explain the Python class `Item`") {
            Ok("METHOD total: Multiplies price by quantity.".to_string())
        } else {
            self.0.generate(prompt).await
        }
    }

    fn describe(&self) -> String {
        "terse".to_string()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_partial_class_reply_is_recorded_as_fallback() {
    let source = load_fixture("inventory.py");
    let analyzer = Analyzer::new(
        &Settings::default(),
        Arc::new(TerseClassGenerator(CannedGenerator::new())),
    );
    let AnalysisRun { result, fallbacks } = analyzer.analyze(&source).await;

    assert_eq!(fallbacks.len(), 1, "{:?}", fallbacks);
    assert_eq!(fallbacks[0].operation, "class Item");
    assert_eq!(
        fallbacks[0].cause,
        "unusable reply: no class prose; no block for method __init__"
    );

    let item = &result.classes[0];
    assert_eq!(item.detailed_explanation, fallback::class_explanation(item));
    assert_eq!(item.per_method_explanations["total"], "Multiplies price by quantity.");
    assert_eq!(
        item.per_method_explanations["__init__"],
        "Method `__init__` of class `Item`."
    );
    assert_eq!(result.classes[1].detailed_explanation, "Stock that expires.");
}

#[tokio::test]
async fn test_structural_fields_are_idempotent() {
    let source = load_fixture("inventory.py");
    let generator = Arc::new(CannedGenerator::new());
    let analyzer = Analyzer::new(&Settings::default(), generator.clone());

    let first = analyzer.analyze(&source).await.result;
    let calls_after_first = generator.calls.load(Ordering::SeqCst);
    let second = analyzer.analyze(&source).await.result;

    assert_eq!(first.imports, second.imports);
    assert_eq!(first.variables, second.variables);
    assert_eq!(first.functions, second.functions);
    assert_eq!(first.classes, second.classes);
    assert_eq!(first.issues, second.issues);
    assert_eq!(first, second);
    assert_eq!(generator.calls.load(Ordering::SeqCst), calls_after_first * 2);
}

#[tokio::test]
async fn test_hanging_generator_falls_back_completely() {
    let source = load_fixture("inventory.py");
    let analyzer = Analyzer::with_parts(
        Detector::new(),
        Enricher::new(Arc::new(HangingGenerator), fast_timeouts()),
    );
    let AnalysisRun { result, fallbacks } = analyzer.analyze(&source).await;

    // overview, detailed overview, 3 functions, 2 classes, batch imports, suggestions
    assert_eq!(fallbacks.len(), 9);
    assert!(fallbacks.iter().all(|f| f.cause.contains("timed out")));

    assert_eq!(
        result.detailed_overview,
        "## Code Structure Summary\n\n\
         - **Functions:** 3\n\
         - **Classes:** 2\n\
         - **Imports:** 3\n\
         - **Total lines:** 55\n"
    );
    assert_eq!(result.suggestions.len(), 3);
    assert_eq!(result.suggestions[0].title, "Address Detected Issues");
    assert_eq!(result.suggestions, fallback::default_suggestions(true));

    assert_eq!(
        result.functions[0].logic_explanation,
        "`load_items(path, cache)`: Load items from a JSON file."
    );
    assert_eq!(result.imports[1].purpose, "Imports the `os` module.");
    assert_eq!(result.imports[2].purpose, "Imports Dict, List from `typing`.");
    assert_eq!(result.classes[1].per_method_explanations.len(), 1);
}

#[tokio::test]
async fn test_offline_clean_file_gets_two_default_suggestions() {
    let source = load_fixture("clean.py");
    let analyzer = Analyzer::new(&Settings::default(), Arc::new(OfflineGenerator));
    let run = analyzer.analyze(&source).await;

    assert!(run.result.issues.is_empty());
    assert_eq!(run.result.suggestions, fallback::default_suggestions(false));
    assert_eq!(run.result.suggestions.len(), 2);
    assert!(run
        .fallbacks
        .iter()
        .all(|f| f.cause == "generator unavailable: offline mode"));
}

#[tokio::test]
async fn test_parse_failure_boundary() {
    let source = load_fixture("broken.py");
    let analyzer = Analyzer::new(&Settings::default(), Arc::new(OfflineGenerator));
    let result = analyzer.analyze(&source).await.result;

    assert_eq!(result.issues.len(), 1);
    assert_eq!(result.issues[0].severity, Severity::Critical);
    assert_eq!(result.issues[0].category, Category::Syntax);
    assert!(result.variables.is_empty());
    assert!(result.functions.is_empty());
    assert!(result.classes.is_empty());
    assert!(result.imports.is_empty());
    assert!(result.diagrams.is_empty());
    assert!(result.has_critical_issues());
    assert!(result.detailed_overview.contains("- **Total lines:** 4"));
}

#[test]
fn test_undecodable_input_is_rejected() {
    let bytes = std::fs::read(testdata_path().join("latin1.py")).unwrap();
    let err = SourceUnit::from_bytes("latin1.py", &bytes).unwrap_err();
    assert!(matches!(err, InputError::Undecodable { .. }));
    assert!(err.to_string().contains("latin1.py"));
}
