// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed errors for retrieval, corpus loading, and configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Failure while obtaining or validating a query embedding.
///
/// Never retried internally; the caller decides on retry or backoff.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// The query was empty or whitespace only.
    #[error("query must not be empty")]
    EmptyQuery,

    /// Transport-level failure talking to the embedding service.
    #[error("embedding service unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service rejected the credentials.
    #[error("embedding service rejected credentials (HTTP {status}): {body}")]
    Auth { status: u16, body: String },

    /// Any other non-success HTTP status.
    #[error("embedding service returned HTTP {status}: {body}")]
    Service { status: u16, body: String },

    /// The response could not be interpreted as embeddings.
    #[error("malformed embedding response: {0}")]
    Malformed(String),

    /// Query vector and corpus vectors disagree on dimensionality.
    #[error("query embedding has {got} dimensions but the corpus uses {expected}")]
    DimensionMismatch { expected: usize, got: usize },

    /// The external embedding command could not be run or failed.
    #[error("embedding command `{command}` failed: {message}")]
    Command { command: String, message: String },
}

/// Failure while reading or validating a corpus.
///
/// A corpus is either loaded completely or not at all.
#[derive(Debug, Error)]
pub enum CorpusLoadError {
    #[error("failed to open corpus {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse corpus {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("corpus {} is missing required column `{column}`", path.display())]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("corpus {} line {line}: malformed embedding: {reason}", path.display())]
    MalformedEmbedding {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    #[error(
        "corpus {} line {line}: embedding has {got} dimensions, expected {expected}",
        path.display()
    )]
    DimensionMismatch {
        path: PathBuf,
        line: u64,
        expected: usize,
        got: usize,
    },

    /// Raised when building a corpus from in-memory entries.
    #[error("corpus entry {index}: {reason}")]
    InvalidEntry { index: usize, reason: String },
}

/// Invalid or inconsistent configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("token budget must be greater than zero")]
    ZeroTokenBudget,

    #[error("top_n must be greater than zero")]
    ZeroTopN,

    #[error("no tokenizer is known for model `{0}`")]
    UnknownModel(String),

    #[error("token counter uses the `{counter}` tokenizer but the completion model is `{model}`")]
    TokenizerMismatch { model: String, counter: String },

    #[error("environment variable {0} must hold the embedding API key")]
    MissingApiKey(String),

    #[error("embedding API key contains characters not allowed in an HTTP header")]
    InvalidApiKey,

    #[error("embedding provider `command` requires `embeddings.command` to be set")]
    MissingCommand,

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
