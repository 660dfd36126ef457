//! Text generation backends.
//!
//! The remote service is an Ollama-compatible endpoint:
//! `POST {base_url}/api/generate` with `{model, prompt, stream: false}`,
//! answering `{"response": "..."}`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::GeneratorConfig;
use crate::source::truncate_chars;

/// Errors that can occur while talking to a generator.
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("generator returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("generator unavailable: {0}")]
    Unavailable(String),
}

/// A service that turns a prompt into a single text reply.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError>;

    /// Identifier used in logs.
    fn describe(&self) -> String;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Client for an Ollama `/api/generate` endpoint.
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(config: &GeneratorConfig) -> Result<Self, GeneratorError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("pyexplain/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        debug!(
            model = %self.model,
            prompt_chars = prompt.chars().count(),
            "sending generate request"
        );

        let response = self.http.post(self.endpoint()).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeneratorError::Status {
                status: status.as_u16(),
                body: truncate_chars(body.trim(), 200).to_string(),
            });
        }

        let reply: GenerateResponse = response.json().await?;
        Ok(reply.response)
    }

    fn describe(&self) -> String {
        format!("{} at {}", self.model, self.base_url)
    }
}

/// Generator that never answers; every enrichment falls back.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineGenerator;

#[async_trait]
impl TextGenerator for OfflineGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GeneratorError> {
        Err(GeneratorError::Unavailable("offline mode".to_string()))
    }

    fn describe(&self) -> String {
        "offline".to_string()
    }
}
