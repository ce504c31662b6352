// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assemble a token-budgeted prompt

use anyhow::Result;

use crate::cli::{OutputFormat, PromptArgs};
use crate::commands::{load_config, load_corpus, open_retriever, preset, retriever_config, template};
use ragctx::output::print_json;

/// Run the prompt command
pub fn run(query: &str, args: &PromptArgs, format: OutputFormat, compact: bool) -> Result<()> {
    let config = load_config()?;
    let corpus = load_corpus(&config, args.corpus.as_deref())?;
    let retriever = open_retriever(
        &config,
        retriever_config(&config, args.model.as_deref(), args.budget, args.top_n),
    )?;
    let template = template(preset(&config, args), args);

    let prompt = retriever.retrieve(query, &corpus, &template)?;
    tracing::info!(
        model = %retriever.config().model,
        budget = retriever.config().token_budget,
        included = prompt.included,
        tokens = prompt.token_count,
        "prompt ready"
    );

    match format {
        OutputFormat::Json => print_json(&prompt, compact)?,
        OutputFormat::Text => println!("{}", prompt.text),
    }
    Ok(())
}
