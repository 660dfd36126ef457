//! Command-line interface for pyexplain.

use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{self, Settings, DEFAULT_CONFIG_YAML};
use crate::enrich::{OfflineGenerator, OllamaClient, TextGenerator};
use crate::pipeline::{AnalysisRun, Analyzer};
use crate::report;
use crate::source::SourceUnit;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

const FORMATS: &[&str] = &["pretty", "json", "markdown"];

/// Explain a Python source file.
///
/// pyexplain extracts the structure of a module (imports, variables,
/// functions, classes), runs a handful of static checks, draws Mermaid
/// diagrams and asks a local Ollama model to explain each part. Every
/// explanation has a deterministic fallback, so the report is complete even
/// when the model is slow or unreachable.
#[derive(Parser)]
#[command(name = "pyexplain")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log debug output to stderr (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a Python file and print or write the report
    #[command(visible_alias = "explain")]
    Analyze(AnalyzeArgs),
    /// Write a default configuration file
    Init(InitArgs),
}

/// Arguments for the analyze command.
#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Python file to analyze
    pub file: PathBuf,

    /// Path to configuration YAML (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format: pretty, json, or markdown
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Write the report to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Model name (overrides configuration and OLLAMA_MODEL)
    #[arg(long)]
    pub model: Option<String>,

    /// Generator base URL (overrides configuration and OLLAMA_BASE_URL)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Skip the generator entirely and use fallback text
    #[arg(long)]
    pub offline: bool,
}

/// Arguments for the init command.
#[derive(Args, Debug, Clone)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "pyexplain.yaml")]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Build settings from the config chain plus command-line overrides.
fn resolve_settings(args: &AnalyzeArgs) -> anyhow::Result<Settings> {
    let cwd = std::env::current_dir()?;
    let mut settings = Settings::load(args.config.as_deref(), &cwd)?;
    if let Some(model) = &args.model {
        settings.generator.model = model.clone();
    }
    if let Some(url) = &args.base_url {
        settings.generator.base_url = url.clone();
    }
    settings.validate()?;
    Ok(settings)
}

fn build_generator(settings: &Settings, offline: bool) -> anyhow::Result<Arc<dyn TextGenerator>> {
    if offline {
        return Ok(Arc::new(OfflineGenerator));
    }
    Ok(Arc::new(OllamaClient::new(&settings.generator)?))
}

fn spinner(filename: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(format!("Explaining {}", filename));
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

/// Run the analyze command.
pub fn run_analyze(args: &AnalyzeArgs) -> anyhow::Result<i32> {
    // Validate format
    if !FORMATS.contains(&args.format.as_str()) {
        eprintln!(
            "Error: invalid format {:?}, must be one of: {}",
            args.format,
            FORMATS.join(", ")
        );
        return Ok(EXIT_ERROR);
    }

    let settings = match resolve_settings(args) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Run 'pyexplain init' to create a configuration file");
            return Ok(EXIT_ERROR);
        }
    };

    // Read and decode the source before any stage runs
    let bytes = match std::fs::read(&args.file) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Error: cannot read {}: {}", args.file.display(), e);
            return Ok(EXIT_ERROR);
        }
    };
    let filename = args
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.file.display().to_string());
    let source = match SourceUnit::from_bytes(filename, &bytes) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let generator = build_generator(&settings, args.offline)?;
    tracing::info!(generator = %generator.describe(), file = source.filename(), "starting analysis");
    let analyzer = Analyzer::new(&settings, generator);

    let runtime = tokio::runtime::Runtime::new()?;
    let bar = spinner(source.filename());
    let AnalysisRun {
        mut result,
        fallbacks,
    } = runtime.block_on(analyzer.analyze(&source));
    bar.finish_and_clear();

    match &args.output {
        Some(path) => {
            result.assign_id(new_report_id());
            ensure_parent(path)?;
            let mut file = io::BufWriter::new(std::fs::File::create(path)?);
            write_report(&mut file, &args.format, &result, &fallbacks, &source)?;
            file.flush()?;
            eprintln!("Wrote {} report to {}", args.format, path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            write_report(&mut out, &args.format, &result, &fallbacks, &source)?;
        }
    }

    // Return appropriate exit code
    if result.has_critical_issues() {
        Ok(EXIT_FAILED)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

fn write_report<W: Write>(
    out: &mut W,
    format: &str,
    result: &crate::aggregate::AnalysisResult,
    fallbacks: &[crate::enrich::FallbackRecord],
    source: &SourceUnit,
) -> anyhow::Result<()> {
    match format {
        "json" => report::write_json(out, result)?,
        "markdown" => out.write_all(report::render_markdown(result, source).as_bytes())?,
        _ => report::write_pretty(out, result, fallbacks)?,
    }
    Ok(())
}

/// Opaque identifier for a written report.
fn new_report_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && parent != Path::new(".") => {
            std::fs::create_dir_all(parent)
        }
        _ => Ok(()),
    }
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    // Check if output already exists
    if args.output.exists() && !args.force {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Use --force to overwrite or --output to choose another path");
        return Ok(EXIT_ERROR);
    }

    // Create output directory if needed
    if let Err(e) = ensure_parent(&args.output) {
        eprintln!("Error: failed to create directory: {}", e);
        return Ok(EXIT_ERROR);
    }

    // Write config file
    if let Err(e) = std::fs::write(&args.output, DEFAULT_CONFIG_YAML) {
        eprintln!("Error: failed to write configuration: {}", e);
        return Ok(EXIT_ERROR);
    }

    println!("Created {}", args.output.display());
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to point at your Ollama server", args.output.display());
    println!(
        "  2. Run: pyexplain analyze path/to/module.py --config {}",
        args.output.display()
    );
    if let Some(user) = config::user_config_path() {
        println!();
        println!("For a per-user default, copy it to {}", user.display());
    }

    Ok(EXIT_SUCCESS)
}
