// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding similarity ranking.
//!
//! Scores every corpus entry against the query embedding by raw cosine
//! similarity and orders them most related first. No threshold or
//! calibration is applied; scores are only comparable within one query.

use serde::Serialize;
use tracing::debug;

use crate::corpus::Corpus;
use crate::embedding::{clean_text, EmbeddingProvider};
use crate::errors::RetrievalError;

/// A corpus entry scored against one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResult<'a> {
    /// Entry text
    pub text: &'a str,
    /// Cosine similarity to the query, in [-1, 1]
    pub relatedness: f32,
    /// Source document of the entry, if recorded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<&'a str>,
}

/// Ranks `corpus` against `query`, returning at most `top_n` results.
///
/// An empty corpus yields an empty ranking without contacting the
/// embedding service. Any provider failure is returned as-is; a partial
/// ranking is never produced.
pub fn rank<'c>(
    provider: &dyn EmbeddingProvider,
    query: &str,
    corpus: &'c Corpus,
    top_n: usize,
) -> Result<Vec<RankedResult<'c>>, RetrievalError> {
    if corpus.is_empty() {
        debug!("corpus is empty; skipping query embedding");
        return Ok(Vec::new());
    }
    if query.trim().is_empty() {
        return Err(RetrievalError::EmptyQuery);
    }

    let query_embedding = provider.embed_one(&clean_text(query))?;
    if let Some(expected) = corpus.dimension() {
        if query_embedding.len() != expected {
            return Err(RetrievalError::DimensionMismatch {
                expected,
                got: query_embedding.len(),
            });
        }
    }

    let results = rank_by_embedding(&query_embedding, corpus, top_n);
    debug!(
        model = provider.model_id(),
        candidates = corpus.len(),
        returned = results.len(),
        best = results.first().map(|r| r.relatedness).unwrap_or(0.0),
        "ranked corpus"
    );
    Ok(results)
}

/// Ranks `corpus` against an already computed query embedding.
///
/// The sort is stable: entries with equal relatedness keep corpus order.
pub fn rank_by_embedding<'c>(
    query_embedding: &[f32],
    corpus: &'c Corpus,
    top_n: usize,
) -> Vec<RankedResult<'c>> {
    let mut results: Vec<RankedResult<'c>> = corpus
        .iter()
        .map(|entry| RankedResult {
            text: entry.text.as_str(),
            relatedness: cosine_similarity(query_embedding, &entry.embedding),
            source: entry.source.as_deref(),
        })
        .collect();

    results.sort_by(|a, b| b.relatedness.total_cmp(&a.relatedness));
    results.truncate(top_n);
    results
}

/// Computes cosine similarity between two vectors.
///
/// Mismatched lengths, empty input, a zero-magnitude vector, or a
/// non-finite component score 0.0. Sums are taken in f64 so large finite
/// components cannot overflow.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum();
    let magnitude_a: f64 = a.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    let magnitude_b: f64 = b.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    let score = (dot_product / (magnitude_a * magnitude_b)).clamp(-1.0, 1.0) as f32;
    // NaN (non-finite input) and -0.0 become 0.0 so total_cmp ties them with zero.
    if score.is_nan() || score == 0.0 {
        0.0
    } else {
        score
    }
}
