// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subcommand implementations

pub mod build;
pub mod chat;
pub mod prompt;
pub mod rank;
pub mod tokens;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::cli::PromptArgs;
use ragctx::config::{Config, RetrieverConfig};
use ragctx::embedding::build_provider;
use ragctx::{ContextRetriever, Corpus, PromptPreset, PromptTemplate};

/// Load configuration, turning file errors into CLI errors
pub fn load_config() -> Result<Config> {
    Config::load().context("Failed to load configuration")
}

/// Load the corpus at `path`, or the configured one
pub fn load_corpus(config: &Config, path: Option<&Path>) -> Result<Corpus> {
    let path: PathBuf = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.corpus().path());
    Corpus::load(&path).with_context(|| {
        format!(
            "Failed to load corpus (run `ragctx build` first?): {}",
            path.display()
        )
    })
}

/// Retriever options from config, with command-line overrides applied
pub fn retriever_config(
    config: &Config,
    model: Option<&str>,
    budget: Option<usize>,
    top_n: Option<usize>,
) -> RetrieverConfig {
    let mut retriever = config.retriever_config();
    if let Some(model) = model {
        retriever.model = model.to_string();
    }
    if let Some(budget) = budget {
        retriever.token_budget = budget;
    }
    if let Some(top_n) = top_n {
        retriever.top_n = top_n;
    }
    retriever
}

/// Build a retriever from the configured embedding provider
pub fn open_retriever(config: &Config, retriever: RetrieverConfig) -> Result<ContextRetriever> {
    let provider = build_provider(config.embeddings(), config.retriever().request_timeout())?;
    Ok(ContextRetriever::with_model_tokenizer(retriever, provider)?)
}

/// Preset chosen on the command line, else the configured one
pub fn preset(config: &Config, args: &PromptArgs) -> PromptPreset {
    args.preset.unwrap_or_else(|| config.retriever().preset())
}

/// Template for the chosen preset, with any introduction override
pub fn template(preset: PromptPreset, args: &PromptArgs) -> PromptTemplate {
    let template = preset.template();
    match &args.introduction {
        Some(introduction) => template.with_introduction(introduction.clone()),
        None => template,
    }
}
