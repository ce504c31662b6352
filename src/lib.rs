// SPDX-License-Identifier: MIT OR Apache-2.0

//! ragctx library - retrieval-augmented chat context building
//!
//! Ranks a corpus of embedded documents against a query and assembles the
//! most related excerpts into a prompt that fits a model's token budget.

pub mod chat;
pub mod config;
pub mod corpus;
pub mod embedding;
pub mod errors;
pub mod ingest;
pub mod output;
pub mod retrieval;
pub mod store;
pub mod utils;

pub use corpus::{Corpus, CorpusEntry};
pub use errors::{ConfigError, CorpusLoadError, RetrievalError};
pub use retrieval::{AssembledPrompt, ContextRetriever, PromptPreset, PromptTemplate, RankedResult};
