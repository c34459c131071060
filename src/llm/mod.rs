//! Generative text collaborator
//!
//! The pipeline treats the text generator as an unreliable external service:
//! it may return empty, malformed, or truncated output on any call. This
//! module defines the collaborator trait, an Ollama-backed production client,
//! and the bounded retry ladder every structured-output call goes through
//! (progressively simpler prompts and tightened decoding options on retry).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::GenerativeError;
use crate::repair::RepairEngine;

/// Two retries on top of the initial attempt; never more.
const MAX_RETRIES: u32 = 2;

/// Decoding parameters for one generation call.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub top_p: f32,
    pub num_ctx: u32,
    pub num_predict: u32,
}

impl GenerationOptions {
    /// First-attempt options: mildly creative, generous context.
    pub fn standard() -> Self {
        Self {
            temperature: 0.1,
            top_p: 0.9,
            num_ctx: 2048,
            num_predict: 512,
        }
    }

    /// Retry options: greedy decoding, tight budget.
    pub fn strict() -> Self {
        Self {
            temperature: 0.0,
            top_p: 0.7,
            num_ctx: 1024,
            num_predict: 256,
        }
    }
}

/// External text-generation service. Implementations must be callable
/// concurrently and must never panic; all failure is the error type.
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, GenerativeError>;
}

/// Production client for a local Ollama server.
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: &'a GenerationOptions,
}

#[derive(Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: String,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self, GenerativeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
        })
    }

    /// Configure from `OLLAMA_URL` / `OLLAMA_MODEL`, with local defaults.
    pub fn from_env() -> Result<Self, GenerativeError> {
        let base_url =
            std::env::var("OLLAMA_URL").unwrap_or_else(|_| "http://localhost:11434".to_string());
        let model = std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| "phi3:latest".to_string());
        Self::new(base_url, model)
    }
}

#[async_trait]
impl GenerativeClient for OllamaClient {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, GenerativeError> {
        let request = OllamaRequest {
            model: &self.model,
            prompt,
            stream: false,
            options,
        };

        debug!(model = %self.model, prompt_chars = prompt.len(), "calling generative collaborator");

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let body: OllamaResponse = response.json().await?;
        let content = body.response.trim().to_string();
        if content.is_empty() {
            return Err(GenerativeError::EmptyResponse);
        }
        Ok(content)
    }
}

/// Ask the collaborator for a JSON object, repairing and validating each
/// attempt. The first attempt wraps `prompt` in a JSON-assistant preamble with
/// standard options; retries switch to a terser instruction and strict
/// decoding. Returns the first attempt whose (repaired) output parses.
pub async fn generate_structured(
    client: &dyn GenerativeClient,
    repair: &RepairEngine,
    prompt: &str,
) -> Result<Value, GenerativeError> {
    for attempt in 0..=MAX_RETRIES {
        let (full_prompt, options) = if attempt == 0 {
            (
                format!(
                    "You are a JSON assistant. Return only valid JSON, no other text.\n\n{}",
                    prompt.trim()
                ),
                GenerationOptions::standard(),
            )
        } else {
            (
                format!("Return valid JSON only:\n{}", prompt.trim()),
                GenerationOptions::strict(),
            )
        };

        match client.generate(&full_prompt, &options).await {
            Ok(raw) => match repair.repair(&raw) {
                Ok(value) => {
                    debug!(attempt, "structured generation succeeded");
                    return Ok(value);
                }
                Err(e) => {
                    warn!(attempt, "unrepairable generative output: {}", e);
                }
            },
            Err(e) => {
                warn!(attempt, "generative call failed: {}", e);
            }
        }
    }

    Err(GenerativeError::AllAttemptsFailed {
        attempts: MAX_RETRIES + 1,
    })
}
