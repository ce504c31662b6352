// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation commands: prepare a turn, record a reply, forget history

use anyhow::{bail, Result};
use serde::Serialize;

use crate::cli::{OutputFormat, PromptArgs};
use crate::commands::{load_config, load_corpus, open_retriever, preset, retriever_config, template};
use ragctx::chat::{ChatRequest, ChatSession};
use ragctx::config::{Config, StoreBackend};
use ragctx::output::{colorize_dim, colorize_label, print_json, use_colors};
use ragctx::store::open_store;

/// Run the chat-prep command
pub fn prepare(
    query: &str,
    conversation: &str,
    system: Option<&str>,
    no_context: bool,
    args: &PromptArgs,
    format: OutputFormat,
    compact: bool,
) -> Result<()> {
    let config = load_config()?;
    let retriever_config =
        retriever_config(&config, args.model.as_deref(), args.budget, args.top_n);
    let preset = preset(&config, args);

    let user_content = if no_context {
        query.to_string()
    } else {
        let corpus = load_corpus(&config, args.corpus.as_deref())?;
        let retriever = open_retriever(&config, retriever_config.clone())?;
        retriever
            .retrieve(query, &corpus, &template(preset, args))?
            .text
    };

    let session = ChatSession::new(
        &retriever_config,
        system.unwrap_or_else(|| preset.system_prompt()),
    );
    let mut store = open_store(config.store())?;
    let request = session.prepare_turn(store.as_mut(), conversation, &user_content)?;

    match format {
        OutputFormat::Json => print_json(&request, compact)?,
        OutputFormat::Text => print_request(&request),
    }
    Ok(())
}

fn print_request(request: &ChatRequest) {
    let use_color = use_colors();
    println!(
        "{}",
        colorize_dim(
            &format!("model: {}  stream: {}", request.model, request.stream),
            use_color
        )
    );
    for message in &request.messages {
        println!();
        println!("{}", colorize_label(&format!("[{}]", message.role), use_color));
        println!("{}", message.content);
    }
}

#[derive(Debug, Serialize)]
struct StoreUpdate<'a> {
    conversation: &'a str,
    messages: usize,
}

/// Run the reply command
pub fn reply(conversation: &str, content: &str, format: OutputFormat, compact: bool) -> Result<()> {
    let config = load_config()?;
    require_persistent_store(&config, "reply")?;
    let session = ChatSession::new(&config.retriever_config(), "");
    let mut store = open_store(config.store())?;
    session.record_reply(store.as_mut(), conversation, content)?;
    let messages = store.history(conversation)?.len();

    match format {
        OutputFormat::Json => print_json(
            &StoreUpdate {
                conversation,
                messages,
            },
            compact,
        )?,
        OutputFormat::Text => println!("Recorded reply in {conversation} ({messages} messages)"),
    }
    Ok(())
}

/// Run the forget command
pub fn forget(conversation: &str, format: OutputFormat, compact: bool) -> Result<()> {
    let config = load_config()?;
    require_persistent_store(&config, "forget")?;
    let mut store = open_store(config.store())?;
    let removed = store.clear(conversation)?;

    match format {
        OutputFormat::Json => print_json(
            &StoreUpdate {
                conversation,
                messages: removed,
            },
            compact,
        )?,
        OutputFormat::Text => println!("Removed {removed} messages from {conversation}"),
    }
    Ok(())
}

/// The memory backend starts empty in every process.
fn require_persistent_store(config: &Config, command: &str) -> Result<()> {
    if config.store().backend() == StoreBackend::Memory {
        bail!(
            "`{command}` needs history that outlives this run, but the memory store backend \
             is dropped when the process exits. Set `backend = \"sqlite\"` under [store]."
        );
    }
    Ok(())
}
