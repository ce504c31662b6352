// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model-specific token counting.

use tiktoken_rs::tokenizer::get_tokenizer;
use tiktoken_rs::CoreBPE;

use crate::errors::ConfigError;

/// Counts tokens the way a particular completion model does.
pub trait TokenCounter: Send + Sync {
    /// The model whose vocabulary this counter uses.
    fn model(&self) -> &str;

    /// Number of tokens in `text`.
    fn count(&self, text: &str) -> usize;
}

/// Token counter backed by the tiktoken vocabulary of an OpenAI model.
pub struct TiktokenCounter {
    model: String,
    bpe: CoreBPE,
}

impl TiktokenCounter {
    /// Loads the vocabulary for `model`.
    pub fn for_model(model: &str) -> Result<Self, ConfigError> {
        let tokenizer =
            get_tokenizer(model).ok_or_else(|| ConfigError::UnknownModel(model.to_string()))?;
        let bpe = tiktoken_rs::get_bpe_from_tokenizer(tokenizer)
            .map_err(|_| ConfigError::UnknownModel(model.to_string()))?;
        Ok(Self {
            model: model.to_string(),
            bpe,
        })
    }
}

impl TokenCounter for TiktokenCounter {
    fn model(&self) -> &str {
        &self.model
    }

    /// Special-token markers in `text` count as ordinary text.
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }
}

/// Whether two model names tokenize identically.
///
/// Equal names always match; otherwise both must map to the same known
/// vocabulary (for example `gpt-4o` and `gpt-4o-mini`).
pub fn same_tokenizer(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    match (get_tokenizer(a), get_tokenizer(b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}
