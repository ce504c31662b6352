// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding provider interface and implementations.
//!
//! The OpenAI provider talks to any OpenAI-compatible `/embeddings` endpoint
//! over a blocking HTTP client. The command provider shells out to an
//! external process, and the dummy provider returns zero vectors.

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Write;
use std::process::{Command, Stdio};
use std::time::Duration;
use tracing::debug;

use crate::config::{EmbeddingConfig, EmbeddingProviderType};
use crate::errors::{ConfigError, RetrievalError};

const DEFAULT_HTTP_BATCH_SIZE: usize = 64;
const DEFAULT_COMMAND_BATCH_SIZE: usize = 64;
const DEFAULT_DUMMY_BATCH_SIZE: usize = 512;

/// Trait for embedding providers.
///
/// Implementations take `&self` so one provider can serve concurrent callers.
pub trait EmbeddingProvider: Send + Sync {
    /// Returns the model identifier.
    fn model_id(&self) -> &str;

    /// Returns the batch size used by the provider.
    fn batch_size(&self) -> usize;

    /// Generates embeddings for the given texts, one vector per text in order.
    fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError>;

    /// Generates an embedding for a single text.
    fn embed_one(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        let mut result = self.embed_texts(&[text.to_string()])?;
        let embedding = result
            .pop()
            .ok_or_else(|| RetrievalError::Malformed("no embedding returned".to_string()))?;
        if embedding.is_empty() {
            return Err(RetrievalError::Malformed(
                "embedding vector is empty".to_string(),
            ));
        }
        if let Some(position) = embedding.iter().position(|v| !v.is_finite()) {
            return Err(RetrievalError::Malformed(format!(
                "embedding value at position {position} is not finite"
            )));
        }
        Ok(embedding)
    }
}

/// Builds the provider selected in the embedding configuration.
pub fn build_provider(
    config: &EmbeddingConfig,
    timeout: Option<Duration>,
) -> Result<Box<dyn EmbeddingProvider>, ConfigError> {
    match config.provider() {
        EmbeddingProviderType::OpenAi => {
            let var = config.api_key_env();
            let api_key = std::env::var(var)
                .ok()
                .filter(|key| !key.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingApiKey(var.to_string()))?;
            let provider = OpenAiProvider::new(&api_key, config.base_url(), config.model(), timeout)?
                .with_batch_size(config.batch_size());
            Ok(Box::new(provider))
        }
        EmbeddingProviderType::Command => {
            let command = config.command().ok_or(ConfigError::MissingCommand)?;
            Ok(Box::new(CommandProvider::new(
                command.to_string(),
                config.model().to_string(),
            )))
        }
        EmbeddingProviderType::Dummy => Ok(Box::new(DummyProvider::new(config.dimension()))),
    }
}

/// Blocking client for OpenAI-compatible embedding endpoints.
///
/// Performs exactly one request per call; retry and backoff belong to the caller.
pub struct OpenAiProvider {
    client: Client,
    endpoint: String,
    model: String,
    batch_size: usize,
}

impl OpenAiProvider {
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, ConfigError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .map_err(|_| ConfigError::InvalidApiKey)?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ConfigError::HttpClient)?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            model: model.to_string(),
            batch_size: DEFAULT_HTTP_BATCH_SIZE,
        })
    }

    /// Sets the number of texts sent per request.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

impl EmbeddingProvider for OpenAiProvider {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };
        debug!(model = %self.model, inputs = texts.len(), "requesting embeddings");
        let response = self.client.post(&self.endpoint).json(&request).send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(
                if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                    RetrievalError::Auth {
                        status: status.as_u16(),
                        body,
                    }
                } else {
                    RetrievalError::Service {
                        status: status.as_u16(),
                        body,
                    }
                },
            );
        }

        let mut parsed: EmbeddingResponse = response
            .json()
            .map_err(|err| RetrievalError::Malformed(err.to_string()))?;
        parsed.data.sort_by_key(|entry| entry.index);
        if parsed.data.len() != texts.len() {
            return Err(RetrievalError::Malformed(format!(
                "service returned {} embeddings for {} inputs",
                parsed.data.len(),
                texts.len()
            )));
        }

        Ok(parsed
            .data
            .into_iter()
            .map(|entry| entry.embedding)
            .collect())
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

/// Command provider that shells out to an external process.
///
/// The process receives `{"model": .., "texts": [..]}` on stdin and prints
/// either a JSON array of vectors or an object holding one under
/// `embeddings`, `vectors`, or `data`.
pub struct CommandProvider {
    command: String,
    model: String,
    batch_size: usize,
}

impl CommandProvider {
    pub fn new(command: String, model: String) -> Self {
        Self {
            command,
            model,
            batch_size: DEFAULT_COMMAND_BATCH_SIZE,
        }
    }

    fn failure(&self, message: impl Into<String>) -> RetrievalError {
        RetrievalError::Command {
            command: self.command.clone(),
            message: message.into(),
        }
    }

    fn run_command(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError> {
        let payload = serde_json::json!({
            "model": self.model,
            "texts": texts,
        });

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| self.failure(format!("failed to spawn: {err}")))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(payload.to_string().as_bytes())
                .map_err(|err| self.failure(format!("failed to write payload: {err}")))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|err| self.failure(format!("failed to read output: {err}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.failure(format!("status {}: {}", output.status, stderr.trim())));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let parsed: Value = serde_json::from_str(stdout.trim())
            .map_err(|err| RetrievalError::Malformed(format!("command output is not JSON: {err}")))?;
        parse_vectors(parsed)
    }
}

impl EmbeddingProvider for CommandProvider {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let vectors = self.run_command(texts)?;
        if vectors.len() != texts.len() {
            return Err(RetrievalError::Malformed(format!(
                "command returned {} embeddings for {} inputs",
                vectors.len(),
                texts.len()
            )));
        }
        Ok(vectors)
    }
}

fn parse_vectors(parsed: Value) -> Result<Vec<Vec<f32>>, RetrievalError> {
    let malformed = |msg: &str| RetrievalError::Malformed(msg.to_string());

    let embeddings_value = match parsed {
        Value::Array(arr) => Value::Array(arr),
        Value::Object(mut obj) => ["embeddings", "vectors", "data"]
            .iter()
            .find_map(|key| obj.remove(*key))
            .ok_or_else(|| malformed("output is missing an 'embeddings' field"))?,
        _ => return Err(malformed("output must be a JSON array or object")),
    };

    embeddings_value
        .as_array()
        .ok_or_else(|| malformed("embeddings must be a JSON array"))?
        .iter()
        .map(|row| {
            row.as_array()
                .ok_or_else(|| malformed("embedding row must be an array"))?
                .iter()
                .map(|value| {
                    value
                        .as_f64()
                        .map(|v| v as f32)
                        .filter(|v| v.is_finite())
                        .ok_or_else(|| malformed("embedding value must be a finite f32"))
                })
                .collect::<Result<Vec<f32>, _>>()
        })
        .collect()
}

/// Dummy provider that returns zero vectors (for testing/offline use).
pub struct DummyProvider {
    model: String,
    dimension: usize,
    batch_size: usize,
}

impl DummyProvider {
    /// Creates a new dummy provider with specified dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            model: "dummy".to_string(),
            dimension,
            batch_size: DEFAULT_DUMMY_BATCH_SIZE,
        }
    }
}

impl EmbeddingProvider for DummyProvider {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError> {
        Ok(texts.iter().map(|_| vec![0.0; self.dimension]).collect())
    }
}
