//! Integration tests for the analyze and init commands.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use pyexplain::aggregate::AnalysisResult;
use pyexplain::cli::{
    run_analyze, run_init, AnalyzeArgs, InitArgs, EXIT_ERROR, EXIT_FAILED, EXIT_SUCCESS,
};
use pyexplain::config::{Settings, DEFAULT_CONFIG_YAML};

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

/// Offline analyze args with an explicit config so no user file is picked up.
fn offline_args(dir: &Path, fixture: &str, format: &str, output: &str) -> AnalyzeArgs {
    let config = dir.join("pyexplain.yaml");
    std::fs::write(&config, DEFAULT_CONFIG_YAML).unwrap();
    AnalyzeArgs {
        file: testdata_path().join(fixture),
        config: Some(config),
        format: format.to_string(),
        output: Some(dir.join(output)),
        model: None,
        base_url: None,
        offline: true,
    }
}

#[test]
fn test_analyze_writes_json_with_id() {
    let dir = TempDir::new().unwrap();
    let args = offline_args(dir.path(), "inventory.py", "json", "reports/r-001.json");

    assert_eq!(run_analyze(&args).unwrap(), EXIT_SUCCESS);

    let content = std::fs::read_to_string(dir.path().join("reports/r-001.json")).unwrap();
    let result: AnalysisResult = serde_json::from_str(&content).unwrap();
    let id = result.result_id.expect("written reports carry an id");
    assert_eq!(uuid::Uuid::parse_str(&id).unwrap().get_version_num(), 4);
    assert_eq!(result.filename, "inventory.py");
    assert_eq!(result.functions.len(), 3);
    assert_eq!(result.issues.len(), 3);

    let raw: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(raw["variables"][0]["scope"], "global");
    assert_eq!(raw["issues"][0]["category"], "Code Quality");
    assert!(raw["diagrams"]["flowchart"].is_string());
}

#[test]
fn test_analyze_markdown_report() {
    let dir = TempDir::new().unwrap();
    let args = offline_args(dir.path(), "clean.py", "markdown", "clean.md");

    assert_eq!(run_analyze(&args).unwrap(), EXIT_SUCCESS);

    let doc = std::fs::read_to_string(dir.path().join("clean.md")).unwrap();
    assert!(doc.starts_with("# Code Analysis Report: `clean.py`"));
    let id_line = doc
        .lines()
        .find(|l| l.starts_with("- **Report ID:** `"))
        .expect("markdown should carry the report id");
    let id = id_line.trim_start_matches("- **Report ID:** `").trim_end_matches('`');
    assert!(uuid::Uuid::parse_str(id).is_ok());
    assert!(doc.contains("## 7. Appendix: Source Code"));
    assert!(doc.contains("return math.pi * radius ** 2"));
}

#[test]
fn test_analyze_critical_issue_exit_code() {
    let dir = TempDir::new().unwrap();
    let args = offline_args(dir.path(), "broken.py", "pretty", "broken.txt");
    assert_eq!(run_analyze(&args).unwrap(), EXIT_FAILED);
}

#[test]
fn test_analyze_rejects_bad_input() {
    let dir = TempDir::new().unwrap();

    let args = offline_args(dir.path(), "latin1.py", "json", "latin1.json");
    assert_eq!(run_analyze(&args).unwrap(), EXIT_ERROR);
    assert!(!dir.path().join("latin1.json").exists());

    let args = offline_args(dir.path(), "inventory.py", "sarif", "out.sarif");
    assert_eq!(run_analyze(&args).unwrap(), EXIT_ERROR);

    let args = offline_args(dir.path(), "missing.py", "json", "missing.json");
    assert_eq!(run_analyze(&args).unwrap(), EXIT_ERROR);
}

#[test]
fn test_analyze_rejects_invalid_config() {
    let dir = TempDir::new().unwrap();
    let mut args = offline_args(dir.path(), "clean.py", "json", "clean.json");
    let config = dir.path().join("zero.yaml");
    std::fs::write(&config, "timeouts:\n  short_secs: 0\n").unwrap();
    args.config = Some(config);
    assert_eq!(run_analyze(&args).unwrap(), EXIT_ERROR);
}

#[test]
fn test_init_writes_default_config() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("conf/pyexplain.yaml");
    let args = InitArgs {
        output: output.clone(),
        force: false,
    };

    assert_eq!(run_init(&args).unwrap(), EXIT_SUCCESS);
    let settings = Settings::parse_file(&output).unwrap();
    assert_eq!(settings, Settings::default());

    // Refuses to overwrite without --force.
    assert_eq!(run_init(&args).unwrap(), EXIT_ERROR);

    std::fs::write(&output, "stale").unwrap();
    let forced = InitArgs {
        output: output.clone(),
        force: true,
    };
    assert_eq!(run_init(&forced).unwrap(), EXIT_SUCCESS);
    assert_eq!(std::fs::read_to_string(&output).unwrap(), DEFAULT_CONFIG_YAML);
}
