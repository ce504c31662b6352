// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retrieval: rank corpus entries against a query, then assemble a
//! token-budgeted prompt from the best of them.

pub mod assemble;
pub mod rank;
pub mod tokens;

pub use assemble::{assemble, AssembledPrompt, PromptPreset, PromptTemplate};
pub use rank::{cosine_similarity, rank, rank_by_embedding, RankedResult};
pub use tokens::{same_tokenizer, TiktokenCounter, TokenCounter};

use crate::config::RetrieverConfig;
use crate::corpus::Corpus;
use crate::embedding::EmbeddingProvider;
use crate::errors::{ConfigError, RetrievalError};

/// Ties a validated configuration to an embedding provider and the token
/// counter of the configured completion model.
pub struct ContextRetriever {
    config: RetrieverConfig,
    provider: Box<dyn EmbeddingProvider>,
    counter: Box<dyn TokenCounter>,
}

impl ContextRetriever {
    /// Fails when the config is invalid or `counter` tokenizes differently
    /// from `config.model`.
    pub fn new(
        config: RetrieverConfig,
        provider: Box<dyn EmbeddingProvider>,
        counter: Box<dyn TokenCounter>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if !same_tokenizer(&config.model, counter.model()) {
            return Err(ConfigError::TokenizerMismatch {
                model: config.model.clone(),
                counter: counter.model().to_string(),
            });
        }
        Ok(Self {
            config,
            provider,
            counter,
        })
    }

    /// Builds a retriever whose counter is the tiktoken vocabulary of
    /// `config.model`.
    pub fn with_model_tokenizer(
        config: RetrieverConfig,
        provider: Box<dyn EmbeddingProvider>,
    ) -> Result<Self, ConfigError> {
        let counter = TiktokenCounter::for_model(&config.model)?;
        Self::new(config, provider, Box::new(counter))
    }

    /// The validated configuration this retriever ranks and assembles with.
    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    /// Top `config.top_n` entries for `query`.
    pub fn rank<'c>(
        &self,
        query: &str,
        corpus: &'c Corpus,
    ) -> Result<Vec<RankedResult<'c>>, RetrievalError> {
        rank::rank(self.provider.as_ref(), query, corpus, self.config.top_n)
    }

    /// Assembles within `config.token_budget`.
    pub fn assemble(
        &self,
        query: &str,
        ranked: &[RankedResult<'_>],
        template: &PromptTemplate,
    ) -> AssembledPrompt {
        assemble::assemble(
            query,
            ranked,
            template,
            self.config.token_budget,
            self.counter.as_ref(),
        )
    }

    /// Ranks then assembles in one call.
    pub fn retrieve(
        &self,
        query: &str,
        corpus: &Corpus,
        template: &PromptTemplate,
    ) -> Result<AssembledPrompt, RetrievalError> {
        let ranked = self.rank(query, corpus)?;
        Ok(self.assemble(query, &ranked, template))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::CorpusEntry;
    use crate::embedding::DummyProvider;

    struct NamedCounter(&'static str);

    impl TokenCounter for NamedCounter {
        fn model(&self) -> &str {
            self.0
        }

        fn count(&self, text: &str) -> usize {
            text.split_whitespace().count()
        }
    }

    #[test]
    fn rejects_counter_for_a_different_model() {
        let err = ContextRetriever::new(
            RetrieverConfig::default(),
            Box::new(DummyProvider::new(2)),
            Box::new(NamedCounter("gpt-4")),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ConfigError::TokenizerMismatch { .. }));
    }

    #[test]
    fn rejects_invalid_config() {
        let config = RetrieverConfig {
            token_budget: 0,
            ..RetrieverConfig::default()
        };
        let err = ContextRetriever::new(
            config,
            Box::new(DummyProvider::new(2)),
            Box::new(NamedCounter("gpt-4o")),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ConfigError::ZeroTokenBudget));
    }

    #[test]
    fn empty_corpus_yields_introduction_and_task() {
        let retriever = ContextRetriever::new(
            RetrieverConfig::default(),
            Box::new(DummyProvider::new(2)),
            Box::new(NamedCounter("gpt-4o")),
        )
        .unwrap();
        let template = PromptTemplate::new("Intro", "Document");
        let prompt = retriever
            .retrieve("anything", &Corpus::empty(), &template)
            .unwrap();
        assert_eq!(prompt.text, "Intro\n\nTask: anything");
    }

    #[test]
    fn query_dimension_must_match_corpus() {
        let retriever = ContextRetriever::new(
            RetrieverConfig::default(),
            Box::new(DummyProvider::new(3)),
            Box::new(NamedCounter("gpt-4o")),
        )
        .unwrap();
        let corpus =
            Corpus::from_entries(vec![CorpusEntry::new("doc", vec![1.0, 0.0])]).unwrap();
        let err = retriever.rank("query", &corpus).unwrap_err();
        assert!(matches!(
            err,
            RetrievalError::DimensionMismatch {
                expected: 2,
                got: 3
            }
        ));
    }
}
