// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token-budgeted prompt assembly.
//!
//! Excerpts are appended in ranked order until the next one would push the
//! prompt over budget. Assembly stops at the first excerpt that does not
//! fit; later, smaller excerpts are not tried.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::rank::RankedResult;
use super::tokens::TokenCounter;

const DOCUMENTS_INTRODUCTION: &str = "Use the Documents provided below to answer the users questions. \
Take care to ensure that your answers are based off of reliable information within the source text.";

const CODE_INTRODUCTION: &str = "Use the Original Code Files provided below to answer the users questions about the code. \
Based on the users input, generate one single code that implements an improvement upon the original code. \
Take into account the users input and the original code. \
Take care to ensure that the code is compatible with the original code. \
Respond only with the code, do not include any additional information.";

const DOCUMENTS_SYSTEM_PROMPT: &str =
    "You are a helpful assistant who researches and discusses provided documents.";
const CODE_SYSTEM_PROMPT: &str =
    "You Complete the users python, javascript, css, and html code and fully Implement New Code if possible";

/// Built-in prompt flavors.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum PromptPreset {
    /// Answer questions from document excerpts
    #[default]
    Documents,
    /// Improve code from source file excerpts
    Code,
}

impl PromptPreset {
    pub fn template(self) -> PromptTemplate {
        match self {
            PromptPreset::Documents => PromptTemplate::new(DOCUMENTS_INTRODUCTION, "Document"),
            PromptPreset::Code => PromptTemplate::new(CODE_INTRODUCTION, "Original Code File"),
        }
    }

    /// Default system message paired with this preset.
    pub fn system_prompt(self) -> &'static str {
        match self {
            PromptPreset::Documents => DOCUMENTS_SYSTEM_PROMPT,
            PromptPreset::Code => CODE_SYSTEM_PROMPT,
        }
    }
}

/// Introduction and excerpt label used to frame a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    pub introduction: String,
    pub excerpt_label: String,
}

impl PromptTemplate {
    pub fn new(introduction: impl Into<String>, excerpt_label: impl Into<String>) -> Self {
        Self {
            introduction: introduction.into(),
            excerpt_label: excerpt_label.into(),
        }
    }

    /// Same label, different introduction.
    pub fn with_introduction(mut self, introduction: impl Into<String>) -> Self {
        self.introduction = introduction.into();
        self
    }

    /// Wraps one excerpt in the triple-quote delimiter.
    pub fn wrap(&self, text: &str) -> String {
        format!("\n\n{}:\n\"\"\"\n{}\n\"\"\"", self.excerpt_label, text)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        PromptPreset::default().template()
    }
}

/// The user message handed to the completion model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssembledPrompt {
    /// Introduction, excerpts, and the task line
    pub text: String,
    /// Number of excerpts that fit the budget
    pub included: usize,
    /// Tokens in `text` as counted for the target model
    pub token_count: usize,
}

/// Builds a prompt from `ranked` results within `token_budget` tokens.
///
/// When even the introduction plus the task line exceeds the budget, that
/// pair is returned anyway with no excerpts.
pub fn assemble(
    query: &str,
    ranked: &[RankedResult<'_>],
    template: &PromptTemplate,
    token_budget: usize,
    counter: &dyn TokenCounter,
) -> AssembledPrompt {
    let question = format!("\n\nTask: {query}");
    let mut message = template.introduction.clone();
    let mut included = 0;

    for result in ranked {
        let excerpt = template.wrap(result.text);
        let candidate = format!("{message}{excerpt}{question}");
        if counter.count(&candidate) > token_budget {
            break;
        }
        message.push_str(&excerpt);
        included += 1;
    }

    message.push_str(&question);
    let token_count = counter.count(&message);
    debug!(
        included,
        available = ranked.len(),
        token_count,
        token_budget,
        "assembled prompt"
    );

    AssembledPrompt {
        text: message,
        included,
        token_count,
    }
}
