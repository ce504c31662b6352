// SPDX-License-Identifier: MIT OR Apache-2.0

//! Build a corpus from a document directory

use anyhow::Result;
use serde::Serialize;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use crate::cli::OutputFormat;
use crate::commands::load_config;
use ragctx::embedding::build_provider;
use ragctx::ingest::{build_corpus, BuildOptions};
use ragctx::output::{colorize_label, colorize_path, print_json, use_colors};
use ragctx::retrieval::TiktokenCounter;

#[derive(Debug, Serialize)]
struct BuildSummary {
    path: String,
    entries: usize,
    dimension: usize,
}

/// Run the build command
pub fn run(
    path: Option<&Path>,
    output: Option<&Path>,
    quiet: bool,
    format: OutputFormat,
    compact: bool,
) -> Result<()> {
    let config = load_config()?;
    let root = path.unwrap_or_else(|| Path::new("."));
    let output: PathBuf = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.corpus().path());

    let provider = build_provider(config.embeddings(), config.retriever().request_timeout())?;
    let counter = TiktokenCounter::for_model(config.retriever().model())?;
    let options = BuildOptions {
        max_input_tokens: config.embeddings().max_input_tokens(),
        show_progress: !quiet && format == OutputFormat::Text && std::io::stderr().is_terminal(),
    };

    let corpus = build_corpus(root, provider.as_ref(), &counter, &options)?;
    corpus.save(&output)?;

    let summary = BuildSummary {
        path: output.display().to_string(),
        entries: corpus.len(),
        dimension: corpus.dimension().unwrap_or(0),
    };
    match format {
        OutputFormat::Json => print_json(&summary, compact)?,
        OutputFormat::Text => {
            let use_color = use_colors();
            println!(
                "{} {} entries ({} dimensions) -> {}",
                colorize_label("Built", use_color),
                summary.entries,
                summary.dimension,
                colorize_path(&summary.path, use_color)
            );
        }
    }
    Ok(())
}
