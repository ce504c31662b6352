// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding module - turns text into vectors for relatedness ranking
//!
//! Providers hide the embedding service behind one trait; every string is
//! passed through [`clean_text`] before it is embedded.

pub mod clean;
pub mod provider;

pub use clean::clean_text;
pub use provider::{
    build_provider, CommandProvider, DummyProvider, EmbeddingProvider, OpenAiProvider,
};
