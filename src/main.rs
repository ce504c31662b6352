// SPDX-License-Identifier: MIT OR Apache-2.0

//! ragctx - Retrieval-augmented chat context builder
//!
//! Ranks embedded documents by cosine relatedness to a query and packs the
//! best of them into a prompt that fits the completion model's token budget.

mod cli;
mod commands;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Initialize tracing with RAGCTX_LOG env var (e.g., RAGCTX_LOG=debug ragctx rank "query")
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("RAGCTX_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = cli.format;
    let compact = cli.compact;

    match cli.command {
        Commands::Build {
            path,
            output,
            quiet,
        } => {
            commands::build::run(path.as_deref(), output.as_deref(), quiet, format, compact)?;
        }
        Commands::Rank {
            query,
            corpus,
            top_n,
        } => {
            commands::rank::run(&query, corpus.as_deref(), top_n, format, compact)?;
        }
        Commands::Prompt { query, args } => {
            commands::prompt::run(&query, &args, format, compact)?;
        }
        Commands::Tokens { path, model } => {
            commands::tokens::run(path.as_deref(), model.as_deref(), format, compact)?;
        }
        Commands::ChatPrep {
            query,
            conversation,
            system,
            no_context,
            args,
        } => {
            commands::chat::prepare(
                &query,
                &conversation,
                system.as_deref(),
                no_context,
                &args,
                format,
                compact,
            )?;
        }
        Commands::Reply {
            content,
            conversation,
        } => {
            commands::chat::reply(&conversation, &content, format, compact)?;
        }
        Commands::Forget { conversation } => {
            commands::chat::forget(&conversation, format, compact)?;
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "ragctx", &mut std::io::stdout());
        }
    }

    Ok(())
}
