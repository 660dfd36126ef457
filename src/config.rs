//! Settings for pyexplain.
//!
//! Settings are read once at startup from YAML, adjusted by environment
//! variables and CLI flags, validated, and then shared read-only.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Local config file names, checked in order in the working directory.
pub const LOCAL_CONFIG_FILES: [&str; 2] = ["pyexplain.yaml", ".pyexplain.yaml"];

pub const ENV_BASE_URL: &str = "OLLAMA_BASE_URL";
pub const ENV_MODEL: &str = "OLLAMA_MODEL";

/// Commented default configuration written by `pyexplain init`.
pub const DEFAULT_CONFIG_YAML: &str = r#"# pyexplain configuration
generator:
  # Ollama-compatible endpoint serving /api/generate
  base_url: http://localhost:11434
  model: deepseek-coder

# Per-call timeout tiers
timeouts:
  short_secs: 30
  medium_secs: 60
  long_secs: 120

enrichment:
  # batch: one call for all imports; individual: one call per import
  import_mode: batch
  max_concurrency: 4
  excerpt_chars: 1000
  snippet_chars: 1500

checks:
  unused_imports: true
  bare_except: true
  mutable_defaults: true
"#;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    #[serde(default)]
    pub checks: ChecksConfig,
}

/// Text generation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "deepseek-coder".to_string()
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
        }
    }
}

/// Timeout tier durations in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TimeoutsConfig {
    #[serde(default = "default_short")]
    pub short_secs: u64,
    #[serde(default = "default_medium")]
    pub medium_secs: u64,
    #[serde(default = "default_long")]
    pub long_secs: u64,
}

fn default_short() -> u64 {
    30
}

fn default_medium() -> u64 {
    60
}

fn default_long() -> u64 {
    120
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            short_secs: default_short(),
            medium_secs: default_medium(),
            long_secs: default_long(),
        }
    }
}

impl TimeoutsConfig {
    pub fn tiers(&self) -> TimeoutTiers {
        TimeoutTiers {
            short: Duration::from_secs(self.short_secs),
            medium: Duration::from_secs(self.medium_secs),
            long: Duration::from_secs(self.long_secs),
        }
    }
}

/// Timeout class of an enrichment call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeoutTier {
    /// Single-import explanation.
    Short,
    /// Overview, function, class and batch-import calls.
    Medium,
    /// Detailed overview and suggestions.
    Long,
}

impl std::fmt::Display for TimeoutTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeoutTier::Short => write!(f, "short"),
            TimeoutTier::Medium => write!(f, "medium"),
            TimeoutTier::Long => write!(f, "long"),
        }
    }
}

/// Resolved tier durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutTiers {
    pub short: Duration,
    pub medium: Duration,
    pub long: Duration,
}

impl TimeoutTiers {
    /// The same duration for every tier.
    pub fn uniform(duration: Duration) -> Self {
        Self {
            short: duration,
            medium: duration,
            long: duration,
        }
    }

    pub fn get(&self, tier: TimeoutTier) -> Duration {
        match tier {
            TimeoutTier::Short => self.short,
            TimeoutTier::Medium => self.medium,
            TimeoutTier::Long => self.long,
        }
    }
}

impl Default for TimeoutTiers {
    fn default() -> Self {
        TimeoutsConfig::default().tiers()
    }
}

/// How import purposes are requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    /// One call enumerating every import.
    #[default]
    Batch,
    /// One short-tier call per import.
    Individual,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EnrichmentConfig {
    #[serde(default)]
    pub import_mode: ImportMode,
    /// Upper bound on in-flight calls per entity group.
    #[serde(default = "default_concurrency")]
    pub max_concurrency: usize,
    /// Characters of the module embedded in overview prompts.
    #[serde(default = "default_excerpt_chars")]
    pub excerpt_chars: usize,
    /// Characters of a function or class embedded in its prompt.
    #[serde(default = "default_snippet_chars")]
    pub snippet_chars: usize,
}

fn default_concurrency() -> usize {
    4
}

fn default_excerpt_chars() -> usize {
    1000
}

fn default_snippet_chars() -> usize {
    1500
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            import_mode: ImportMode::default(),
            max_concurrency: default_concurrency(),
            excerpt_chars: default_excerpt_chars(),
            snippet_chars: default_snippet_chars(),
        }
    }
}

/// Static check toggles.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChecksConfig {
    #[serde(default = "default_true")]
    pub unused_imports: bool,
    #[serde(default = "default_true")]
    pub bare_except: bool,
    #[serde(default = "default_true")]
    pub mutable_defaults: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ChecksConfig {
    fn default() -> Self {
        Self {
            unused_imports: true,
            bare_except: true,
            mutable_defaults: true,
        }
    }
}

impl Settings {
    /// Parse settings from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse_str(content: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document is valid and means "all defaults".
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Resolve settings: explicit path, else discovered file, else defaults;
    /// then environment overrides; then validation.
    pub fn load(explicit: Option<&Path>, working_dir: &Path) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => discover(working_dir),
        };

        let mut settings = match &path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading configuration");
                Self::parse_file(path)?
            }
            None => Self::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok());
        settings.validate()?;
        Ok(settings)
    }

    /// Apply `OLLAMA_BASE_URL` / `OLLAMA_MODEL` overrides from `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            self.generator.base_url = url;
        }
        if let Some(model) = lookup(ENV_MODEL).filter(|v| !v.trim().is_empty()) {
            self.generator.model = model;
        }
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generator.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("generator.base_url is empty".to_string()));
        }
        if self.generator.model.trim().is_empty() {
            return Err(ConfigError::Invalid("generator.model is empty".to_string()));
        }
        for (name, secs) in [
            ("short_secs", self.timeouts.short_secs),
            ("medium_secs", self.timeouts.medium_secs),
            ("long_secs", self.timeouts.long_secs),
        ] {
            if secs == 0 {
                return Err(ConfigError::Invalid(format!(
                    "timeouts.{} must be greater than zero",
                    name
                )));
            }
        }
        if self.enrichment.max_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "enrichment.max_concurrency must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Find a config file: the working directory first, then the user config dir.
pub fn discover(working_dir: &Path) -> Option<PathBuf> {
    LOCAL_CONFIG_FILES
        .iter()
        .map(|name| working_dir.join(name))
        .chain(user_config_path())
        .find(|path| path.is_file())
}

/// `<config dir>/pyexplain/config.yaml`, when a home directory is known.
pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "pyexplain")
        .map(|dirs| dirs.config_dir().join("config.yaml"))
}
