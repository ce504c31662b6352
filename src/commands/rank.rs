// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rank corpus entries against a query

use anyhow::Result;
use std::path::Path;

use crate::cli::OutputFormat;
use crate::commands::{load_config, load_corpus, open_retriever, retriever_config};
use ragctx::output::{colorize_dim, colorize_path, colorize_score, preview, use_colors};

/// Run the rank command
pub fn run(
    query: &str,
    corpus: Option<&Path>,
    top_n: Option<usize>,
    format: OutputFormat,
    compact: bool,
) -> Result<()> {
    let config = load_config()?;
    let corpus = load_corpus(&config, corpus)?;
    let retriever = open_retriever(&config, retriever_config(&config, None, None, top_n))?;

    let ranked = retriever.rank(query, &corpus)?;

    match format {
        OutputFormat::Json => ragctx::output::print_json(&ranked, compact)?,
        OutputFormat::Text => {
            if ranked.is_empty() {
                println!("Corpus is empty.");
                return Ok(());
            }
            let use_color = use_colors();
            for result in &ranked {
                let source = result.source.unwrap_or("-");
                println!(
                    "{}  {}  {}",
                    colorize_score(result.relatedness, use_color),
                    colorize_path(source, use_color),
                    colorize_dim(&preview(result.text, 80), use_color)
                );
            }
        }
    }
    Ok(())
}
