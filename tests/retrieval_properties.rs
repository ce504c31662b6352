// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::atomic::{AtomicUsize, Ordering};

use ragctx::config::RetrieverConfig;
use ragctx::embedding::EmbeddingProvider;
use ragctx::retrieval::{assemble, rank, TiktokenCounter, TokenCounter};
use ragctx::{ContextRetriever, Corpus, CorpusEntry, PromptTemplate, RetrievalError};

/// Returns the same vector for every text and counts calls.
struct FixedProvider {
    vector: Vec<f32>,
    calls: AtomicUsize,
}

impl FixedProvider {
    fn new(vector: &[f32]) -> Self {
        Self {
            vector: vector.to_vec(),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EmbeddingProvider for FixedProvider {
    fn model_id(&self) -> &str {
        "fixed"
    }

    fn batch_size(&self) -> usize {
        16
    }

    fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|_| self.vector.clone()).collect())
    }
}

struct UnreachableProvider;

impl EmbeddingProvider for UnreachableProvider {
    fn model_id(&self) -> &str {
        "unreachable"
    }

    fn batch_size(&self) -> usize {
        1
    }

    fn embed_texts(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError> {
        Err(RetrievalError::Service {
            status: 503,
            body: "service unavailable".to_string(),
        })
    }
}

/// One token per whitespace-separated word.
struct WordCounter;

impl TokenCounter for WordCounter {
    fn model(&self) -> &str {
        "gpt-4o"
    }

    fn count(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}

fn two_docs() -> Corpus {
    Corpus::from_entries(vec![
        CorpusEntry::new("doc A", vec![1.0, 0.0]),
        CorpusEntry::new("doc B", vec![0.0, 1.0]),
    ])
    .unwrap()
}

fn many_docs() -> Corpus {
    Corpus::from_entries(
        (0..20)
            .map(|i| {
                let angle = i as f32 * 0.15;
                CorpusEntry::new(
                    format!("document number {i} with some words"),
                    vec![angle.cos(), angle.sin()],
                )
            })
            .collect(),
    )
    .unwrap()
}

#[test]
fn ranks_matching_document_first() {
    let provider = FixedProvider::new(&[1.0, 0.0]);
    let corpus = two_docs();
    let ranked = rank(&provider, "hi", &corpus, 100).unwrap();

    let pairs: Vec<(&str, f32)> = ranked.iter().map(|r| (r.text, r.relatedness)).collect();
    assert_eq!(pairs.len(), 2);
    assert_eq!(pairs[0].0, "doc A");
    assert!((pairs[0].1 - 1.0).abs() < 1e-6);
    assert_eq!(pairs[1].0, "doc B");
    assert!(pairs[1].1.abs() < 1e-6);
}

#[test]
fn tiny_budget_returns_introduction_and_task_only() {
    let provider = FixedProvider::new(&[1.0, 0.0]);
    let corpus = two_docs();
    let ranked = rank(&provider, "hi", &corpus, 100).unwrap();
    let template = PromptTemplate::new("Use docs:", "Document");

    let prompt = assemble("hi", &ranked, &template, 1, &WordCounter);
    assert_eq!(prompt.text, "Use docs:\n\nTask: hi");
    assert_eq!(prompt.included, 0);
}

#[test]
fn provider_failure_is_an_error_not_an_empty_ranking() {
    let corpus = two_docs();
    let err = rank(&UnreachableProvider, "hi", &corpus, 100).unwrap_err();
    assert!(matches!(err, RetrievalError::Service { status: 503, .. }));
}

#[test]
fn empty_corpus_skips_the_embedding_service() {
    let provider = FixedProvider::new(&[1.0, 0.0]);
    let corpus = Corpus::empty();
    let ranked = rank(&provider, "hi", &corpus, 100).unwrap();
    assert!(ranked.is_empty());
    assert_eq!(provider.calls(), 0);
}

#[test]
fn empty_query_is_rejected() {
    let provider = FixedProvider::new(&[1.0, 0.0]);
    let err = rank(&provider, "   ", &two_docs(), 100).unwrap_err();
    assert!(matches!(err, RetrievalError::EmptyQuery));
    assert_eq!(provider.calls(), 0);
}

#[test]
fn ranking_is_descending_bounded_and_idempotent() {
    let provider = FixedProvider::new(&[0.3, 0.9]);
    let corpus = many_docs();

    let first = rank(&provider, "query", &corpus, 7).unwrap();
    let second = rank(&provider, "query", &corpus, 7).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 7);
    for pair in first.windows(2) {
        assert!(pair[0].relatedness >= pair[1].relatedness);
    }
    for result in &first {
        assert!((-1.0..=1.0).contains(&result.relatedness));
    }
}

#[test]
fn assembled_prompt_respects_budget_and_order() {
    let provider = FixedProvider::new(&[1.0, 0.0]);
    let corpus = many_docs();
    let ranked = rank(&provider, "question", &corpus, 100).unwrap();
    let template = PromptTemplate::new("Answer from these documents.", "Document");

    let mut previous_included = 0;
    for budget in (10..=200).step_by(5) {
        let prompt = assemble("question", &ranked, &template, budget, &WordCounter);
        assert!(prompt.token_count <= budget);
        assert!(prompt.text.starts_with("Answer from these documents."));
        assert!(prompt.text.ends_with("\n\nTask: question"));
        // A larger budget never includes fewer excerpts.
        assert!(prompt.included >= previous_included);
        previous_included = prompt.included;

        // Included excerpts are exactly the top-ranked prefix.
        for result in ranked.iter().take(prompt.included) {
            assert!(prompt.text.contains(&template.wrap(result.text)));
        }
    }
    assert!(previous_included > 0);
}

#[test]
fn retriever_combines_rank_and_assemble() {
    let config = RetrieverConfig {
        token_budget: 25,
        top_n: 1,
        ..RetrieverConfig::default()
    };
    let retriever = ContextRetriever::new(
        config,
        Box::new(FixedProvider::new(&[0.0, 1.0])),
        Box::new(WordCounter),
    )
    .unwrap();
    assert_eq!(retriever.config().token_budget, 25);
    assert_eq!(retriever.config().top_n, 1);

    let template = PromptTemplate::new("Use docs:", "Document");
    let prompt = retriever.retrieve("hi", &two_docs(), &template).unwrap();
    assert_eq!(
        prompt.text,
        "Use docs:\n\nDocument:\n\"\"\"\ndoc B\n\"\"\"\n\nTask: hi"
    );
    assert_eq!(prompt.included, 1);
}

#[test]
fn non_finite_query_embedding_is_malformed() {
    let provider = FixedProvider::new(&[f32::INFINITY, 0.0]);
    let err = rank(&provider, "hi", &two_docs(), 100).unwrap_err();
    assert!(matches!(err, RetrievalError::Malformed(_)));
}

#[test]
fn large_finite_components_rank_in_order() {
    let corpus = Corpus::from_entries(vec![
        CorpusEntry::new("b", vec![0.0, 1.0]),
        CorpusEntry::new("a", vec![3e38, 0.0]),
        CorpusEntry::new("c", vec![1.0, 0.5]),
    ])
    .unwrap();
    let provider = FixedProvider::new(&[1.0, 0.0]);
    let ranked = rank(&provider, "hi", &corpus, 100).unwrap();

    let texts: Vec<&str> = ranked.iter().map(|r| r.text).collect();
    assert_eq!(texts, vec!["a", "c", "b"]);
    for pair in ranked.windows(2) {
        assert!(pair[0].relatedness >= pair[1].relatedness);
    }
}

#[test]
fn assembly_is_deterministic_with_model_tokenizer() {
    let counter = TiktokenCounter::for_model("gpt-4o").unwrap();
    let provider = FixedProvider::new(&[0.6, 0.8]);
    let corpus = many_docs();
    let ranked = rank(&provider, "question", &corpus, 100).unwrap();
    let template = PromptTemplate::new("Answer from these documents.", "Document");

    for budget in [1, 40, 120, 3000] {
        let first = assemble("question", &ranked, &template, budget, &counter);
        let second = assemble("question", &ranked, &template, budget, &counter);
        assert_eq!(first, second);
        assert_eq!(first.text.as_bytes(), second.text.as_bytes());
    }
}
