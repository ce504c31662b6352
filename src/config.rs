// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration file support for ragctx
//!
//! Loads configuration from .ragctx.toml in current directory or ~/.config/ragctx/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::ConfigError;
use crate::retrieval::PromptPreset;
use crate::utils;

/// Default completion model (also selects the tokenizer).
pub const DEFAULT_MODEL: &str = "gpt-4o";
/// Default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-large";
/// Default token budget for assembled prompts.
pub const DEFAULT_TOKEN_BUDGET: usize = 3000;
/// Default number of ranked results considered for assembly.
pub const DEFAULT_TOP_N: usize = 100;

/// Embedding provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderType {
    #[default]
    OpenAi,
    Command,
    Dummy,
}

/// Conversation store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    #[default]
    Sqlite,
}

/// The options recognized by the context retriever.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetrieverConfig {
    /// Completion model; its tokenizer enforces the budget
    pub model: String,
    /// Whether the chat request asks for a streamed completion
    pub streaming: bool,
    /// Maximum tokens in an assembled prompt
    pub token_budget: usize,
    /// Number of ranked entries handed to the assembler
    pub top_n: usize,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            streaming: false,
            token_budget: DEFAULT_TOKEN_BUDGET,
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl RetrieverConfig {
    /// Rejects budgets and result counts that can never produce a prompt.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token_budget == 0 {
            return Err(ConfigError::ZeroTokenBudget);
        }
        if self.top_n == 0 {
            return Err(ConfigError::ZeroTopN);
        }
        Ok(())
    }
}

/// Retriever section of the config file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RetrieverSection {
    /// Completion model identifier
    pub model: Option<String>,
    /// Ask for streamed completions
    pub streaming: Option<bool>,
    /// Prompt token budget
    pub token_budget: Option<usize>,
    /// Ranked results considered for assembly
    pub top_n: Option<usize>,
    /// Prompt preset (documents, code)
    pub preset: Option<PromptPreset>,
    /// Timeout applied to each embedding request
    pub request_timeout_secs: Option<u64>,
}

impl RetrieverSection {
    /// Get model (defaults to "gpt-4o")
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    /// Get streaming (defaults to false)
    pub fn streaming(&self) -> bool {
        self.streaming.unwrap_or(false)
    }

    /// Get token budget (defaults to 3000)
    pub fn token_budget(&self) -> usize {
        self.token_budget.unwrap_or(DEFAULT_TOKEN_BUDGET)
    }

    /// Get top_n (defaults to 100)
    pub fn top_n(&self) -> usize {
        self.top_n.unwrap_or(DEFAULT_TOP_N)
    }

    /// Get preset (defaults to Documents)
    pub fn preset(&self) -> PromptPreset {
        self.preset.unwrap_or_default()
    }

    /// Get request timeout; None leaves the HTTP client without one
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Provider type (openai, command, dummy)
    pub provider: Option<EmbeddingProviderType>,
    /// Model identifier for the embedding provider
    pub model: Option<String>,
    /// Base URL of an OpenAI-compatible API
    pub base_url: Option<String>,
    /// Name of the environment variable holding the API key
    pub api_key_env: Option<String>,
    /// Command to execute for command provider
    pub command: Option<String>,
    /// Vector dimension for the dummy provider
    pub dimension: Option<usize>,
    /// Documents above this many tokens are not embedded
    pub max_input_tokens: Option<usize>,
    /// Texts per embedding request
    pub batch_size: Option<usize>,
}

impl EmbeddingConfig {
    /// Get provider type (defaults to OpenAi)
    pub fn provider(&self) -> EmbeddingProviderType {
        self.provider.unwrap_or_default()
    }

    /// Get model identifier (defaults to "text-embedding-3-large")
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_EMBEDDING_MODEL)
    }

    /// Get base URL (defaults to the public OpenAI endpoint)
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or("https://api.openai.com/v1")
    }

    /// Get API key variable name (defaults to "OPENAI_API_KEY")
    pub fn api_key_env(&self) -> &str {
        self.api_key_env.as_deref().unwrap_or("OPENAI_API_KEY")
    }

    /// Get command, if configured
    pub fn command(&self) -> Option<&str> {
        self.command.as_deref().filter(|c| !c.trim().is_empty())
    }

    /// Get dummy dimension (defaults to 3072)
    pub fn dimension(&self) -> usize {
        self.dimension.unwrap_or(3072)
    }

    /// Get max input tokens (defaults to 8192)
    pub fn max_input_tokens(&self) -> usize {
        self.max_input_tokens.unwrap_or(8192)
    }

    /// Get batch size (defaults to 64, never zero)
    pub fn batch_size(&self) -> usize {
        self.batch_size.filter(|n| *n > 0).unwrap_or(64)
    }
}

/// Corpus location
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// Path to the corpus CSV
    pub path: Option<PathBuf>,
}

impl CorpusConfig {
    /// Get corpus path (defaults to `.ragctx/corpus.csv` under the data root)
    pub fn path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| utils::default_data_path("corpus.csv"))
    }
}

/// Conversation store configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend (memory, sqlite)
    pub backend: Option<StoreBackend>,
    /// SQLite database path
    pub path: Option<PathBuf>,
}

impl StoreConfig {
    /// Get backend (defaults to Sqlite)
    pub fn backend(&self) -> StoreBackend {
        self.backend.unwrap_or_default()
    }

    /// Get database path (defaults to `.ragctx/conversations.sqlite` under the data root)
    pub fn path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| utils::default_data_path("conversations.sqlite"))
    }
}

/// Configuration loaded from .ragctx.toml or ~/.config/ragctx/config.toml
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Retriever configuration
    #[serde(default)]
    pub retriever: RetrieverSection,

    /// Embedding configuration
    #[serde(default)]
    pub embeddings: EmbeddingConfig,

    /// Corpus configuration
    #[serde(default)]
    pub corpus: CorpusConfig,

    /// Conversation store configuration
    #[serde(default)]
    pub store: StoreConfig,
}

impl Config {
    /// Load configuration from files
    ///
    /// Precedence (highest to lowest):
    /// 1. .ragctx.toml in current directory
    /// 2. ~/.config/ragctx/config.toml
    ///
    /// A file that exists but does not parse is an error.
    pub fn load() -> Result<Self, ConfigError> {
        if let Some(config) = Self::load_from_path(Path::new(".ragctx.toml"))? {
            return Ok(config);
        }

        if let Some(home) = dirs::home_dir() {
            let config_path = home.join(".config").join("ragctx").join("config.toml");
            if let Some(config) = Self::load_from_path(&config_path)? {
                return Ok(config);
            }
        }

        Ok(Self::default())
    }

    /// Load one config file; Ok(None) when it does not exist.
    pub fn load_from_path(path: &Path) -> Result<Option<Self>, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(Some(config))
    }

    /// Build the explicit retriever options from the file sections.
    pub fn retriever_config(&self) -> RetrieverConfig {
        RetrieverConfig {
            model: self.retriever.model().to_string(),
            streaming: self.retriever.streaming(),
            token_budget: self.retriever.token_budget(),
            top_n: self.retriever.top_n(),
        }
    }

    /// Get the retriever section
    pub fn retriever(&self) -> &RetrieverSection {
        &self.retriever
    }

    /// Get the embedding configuration
    pub fn embeddings(&self) -> &EmbeddingConfig {
        &self.embeddings
    }

    /// Get the corpus configuration
    pub fn corpus(&self) -> &CorpusConfig {
        &self.corpus
    }

    /// Get the store configuration
    pub fn store(&self) -> &StoreConfig {
        &self.store
    }
}
