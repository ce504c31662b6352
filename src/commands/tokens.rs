// SPDX-License-Identifier: MIT OR Apache-2.0

//! Report per-document token counts

use anyhow::Result;
use serde::Serialize;
use std::path::Path;

use crate::cli::OutputFormat;
use crate::commands::load_config;
use ragctx::ingest::{scan_tokens, DocumentTokens};
use ragctx::output::{colorize_label, colorize_path, print_json, use_colors};
use ragctx::retrieval::TiktokenCounter;

#[derive(Debug, Serialize)]
struct TokenReport<'a> {
    model: &'a str,
    total: usize,
    documents: &'a [DocumentTokens],
}

/// Run the tokens command
pub fn run(
    path: Option<&Path>,
    model: Option<&str>,
    format: OutputFormat,
    compact: bool,
) -> Result<()> {
    let config = load_config()?;
    let model = model.unwrap_or_else(|| config.retriever().model());
    let counter = TiktokenCounter::for_model(model)?;
    let root = path.unwrap_or_else(|| Path::new("."));

    let documents = scan_tokens(root, &counter)?;
    let total = documents.iter().map(|d| d.tokens).sum();

    match format {
        OutputFormat::Json => print_json(
            &TokenReport {
                model,
                total,
                documents: &documents,
            },
            compact,
        )?,
        OutputFormat::Text => {
            let use_color = use_colors();
            for document in &documents {
                println!(
                    "{:>8}  {}",
                    document.tokens,
                    colorize_path(&document.path, use_color)
                );
            }
            println!("{:>8}  {}", total, colorize_label("total", use_color));
        }
    }
    Ok(())
}
