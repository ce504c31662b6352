// SPDX-License-Identifier: MIT OR Apache-2.0

//! CLI argument parsing using clap

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use ragctx::PromptPreset;
use std::path::PathBuf;

/// ragctx - Retrieval-augmented chat context builder
///
/// Embeds a directory of documents into a corpus, ranks it against a query,
/// and assembles the best excerpts into a token-budgeted prompt.
#[derive(Parser, Debug)]
#[command(name = "ragctx")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Compact JSON output (no pretty formatting)
    #[arg(long, global = true)]
    pub compact: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for results
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Options shared by commands that assemble a prompt
#[derive(clap::Args, Debug, Clone)]
pub struct PromptArgs {
    /// Corpus CSV (defaults to the configured corpus path)
    #[arg(short, long)]
    pub corpus: Option<PathBuf>,

    /// Maximum tokens in the assembled prompt
    #[arg(short, long)]
    pub budget: Option<usize>,

    /// Ranked results considered for assembly
    #[arg(short = 'n', long)]
    pub top_n: Option<usize>,

    /// Completion model whose tokenizer enforces the budget
    #[arg(short, long)]
    pub model: Option<String>,

    /// Prompt preset
    #[arg(long, value_enum)]
    pub preset: Option<PromptPreset>,

    /// Replace the preset's introduction
    #[arg(long)]
    pub introduction: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Embed documents under a directory into a corpus file
    Build {
        /// Directory to scan (defaults to current directory)
        path: Option<PathBuf>,

        /// Corpus CSV to write (defaults to the configured corpus path)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Hide the progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// Rank corpus entries by relatedness to a query
    Rank {
        /// Query text
        query: String,

        /// Corpus CSV (defaults to the configured corpus path)
        #[arg(short, long)]
        corpus: Option<PathBuf>,

        /// Number of results to show
        #[arg(short = 'n', long)]
        top_n: Option<usize>,
    },

    /// Assemble a token-budgeted prompt for a query
    Prompt {
        /// Query text
        query: String,

        #[command(flatten)]
        args: PromptArgs,
    },

    /// Count tokens of each document under a directory
    Tokens {
        /// Directory to scan (defaults to current directory)
        path: Option<PathBuf>,

        /// Model whose tokenizer counts
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Record a user turn and print the chat-completion request for it
    #[command(name = "chat-prep")]
    ChatPrep {
        /// User message
        query: String,

        /// Conversation id
        #[arg(long, default_value = ragctx::chat::DEFAULT_CONVERSATION_ID)]
        conversation: String,

        /// System message (defaults to the preset's)
        #[arg(long)]
        system: Option<String>,

        /// Send the message as typed, without retrieved context
        #[arg(long)]
        no_context: bool,

        #[command(flatten)]
        args: PromptArgs,
    },

    /// Record the assistant's reply to the last turn
    Reply {
        /// Reply text
        content: String,

        /// Conversation id
        #[arg(long, default_value = ragctx::chat::DEFAULT_CONVERSATION_ID)]
        conversation: String,
    },

    /// Delete a conversation's history
    Forget {
        /// Conversation id
        #[arg(long, default_value = ragctx::chat::DEFAULT_CONVERSATION_ID)]
        conversation: String,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn prompt_accepts_budget_and_preset() {
        let cli = Cli::parse_from([
            "ragctx", "--format", "json", "prompt", "hi", "--budget", "1", "--preset", "code",
        ]);
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Commands::Prompt { query, args } => {
                assert_eq!(query, "hi");
                assert_eq!(args.budget, Some(1));
                assert_eq!(args.preset, Some(PromptPreset::Code));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
