// SPDX-License-Identifier: MIT OR Apache-2.0

//! Corpus of document texts and their embeddings.
//!
//! The on-disk form is a CSV file with a header row. It must carry a `text`
//! column and an `embedding` column holding a bracketed list of floats
//! (`[0.1, -0.2, ...]`); a `filepath` or `source` column is kept when present
//! and every other column is ignored. Loading is all-or-nothing.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::path::Path;
use tracing::info;

use crate::errors::CorpusLoadError;

const TEXT_COLUMN: &str = "text";
const EMBEDDING_COLUMN: &str = "embedding";
const SOURCE_COLUMNS: [&str; 2] = ["filepath", "source"];

/// One document excerpt and its embedding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorpusEntry {
    /// Text extracted from the source document
    pub text: String,
    /// Embedding vector
    pub embedding: Vec<f32>,
    /// Path of the source document, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl CorpusEntry {
    pub fn new(text: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            text: text.into(),
            embedding,
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// An immutable, validated set of corpus entries.
///
/// Every entry has non-blank text and an embedding of the same dimension.
/// Entry order is preserved and breaks ties when ranking.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    entries: Vec<CorpusEntry>,
    dimension: Option<usize>,
}

impl Corpus {
    /// An empty corpus.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a corpus, dropping blank-text entries and rejecting empty,
    /// non-finite, or inconsistent embeddings.
    pub fn from_entries(entries: Vec<CorpusEntry>) -> Result<Self, CorpusLoadError> {
        let mut kept = Vec::with_capacity(entries.len());
        let mut dimension = None;

        for (index, entry) in entries.into_iter().enumerate() {
            if entry.text.trim().is_empty() {
                continue;
            }
            let got = entry.embedding.len();
            if got == 0 {
                return Err(CorpusLoadError::InvalidEntry {
                    index,
                    reason: "embedding is empty".to_string(),
                });
            }
            if entry.embedding.iter().any(|v| !v.is_finite()) {
                return Err(CorpusLoadError::InvalidEntry {
                    index,
                    reason: "embedding has a non-finite value".to_string(),
                });
            }
            match dimension {
                None => dimension = Some(got),
                Some(expected) if expected != got => {
                    return Err(CorpusLoadError::InvalidEntry {
                        index,
                        reason: format!("embedding has {got} dimensions, expected {expected}"),
                    });
                }
                Some(_) => {}
            }
            kept.push(entry);
        }

        Ok(Self {
            entries: kept,
            dimension,
        })
    }

    /// Loads a corpus CSV file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CorpusLoadError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| CorpusLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let csv_error = |source| CorpusLoadError::Csv {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(file);

        let headers = reader.headers().map_err(csv_error)?.clone();
        let column = |name: &'static str| -> Result<usize, CorpusLoadError> {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| CorpusLoadError::MissingColumn {
                    path: path.to_path_buf(),
                    column: name,
                })
        };
        let text_idx = column(TEXT_COLUMN)?;
        let embedding_idx = column(EMBEDDING_COLUMN)?;
        let source_idx = SOURCE_COLUMNS
            .iter()
            .find_map(|name| headers.iter().position(|h| h.trim() == *name));

        let mut entries = Vec::new();
        let mut dimension: Option<usize> = None;

        for (row, record) in reader.records().enumerate() {
            let record = record.map_err(csv_error)?;
            // Header is line 1; fall back to it when the reader has no position.
            let line = record
                .position()
                .map(|p| p.line())
                .unwrap_or(row as u64 + 2);

            let text = record.get(text_idx).unwrap_or_default();
            if text.trim().is_empty() {
                continue;
            }

            let raw = record.get(embedding_idx).unwrap_or_default();
            let embedding = parse_embedding(raw).map_err(|reason| {
                CorpusLoadError::MalformedEmbedding {
                    path: path.to_path_buf(),
                    line,
                    reason,
                }
            })?;

            match dimension {
                None => dimension = Some(embedding.len()),
                Some(expected) if expected != embedding.len() => {
                    return Err(CorpusLoadError::DimensionMismatch {
                        path: path.to_path_buf(),
                        line,
                        expected,
                        got: embedding.len(),
                    });
                }
                Some(_) => {}
            }

            let source = source_idx
                .and_then(|idx| record.get(idx))
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string);

            entries.push(CorpusEntry {
                text: text.to_string(),
                embedding,
                source,
            });
        }

        info!(
            path = %path.display(),
            entries = entries.len(),
            dimension = dimension.unwrap_or(0),
            "loaded corpus"
        );

        Ok(Self { entries, dimension })
    }

    /// Writes the corpus as `filepath,text,embedding` CSV, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create corpus file: {}", path.display()))?;
        writer.write_record(["filepath", TEXT_COLUMN, EMBEDDING_COLUMN])?;
        for entry in &self.entries {
            let embedding = serde_json::to_string(&entry.embedding)?;
            writer.write_record([
                entry.source.as_deref().unwrap_or(""),
                entry.text.as_str(),
                embedding.as_str(),
            ])?;
        }
        writer
            .flush()
            .with_context(|| format!("Failed to write corpus file: {}", path.display()))?;

        info!(path = %path.display(), entries = self.entries.len(), "saved corpus");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Embedding dimension shared by all entries; None when empty.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CorpusEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a Corpus {
    type Item = &'a CorpusEntry;
    type IntoIter = std::slice::Iter<'a, CorpusEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Parses a bracketed float list such as `[0.1, -2e-3, 4]`.
///
/// Values that do not fit a finite `f32` are rejected.
fn parse_embedding(raw: &str) -> std::result::Result<Vec<f32>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("embedding is missing".to_string());
    }
    let values: Vec<f64> = serde_json::from_str(raw).map_err(|err| err.to_string())?;
    if values.is_empty() {
        return Err("embedding is empty".to_string());
    }
    values
        .into_iter()
        .enumerate()
        .map(|(i, v)| {
            let value = v as f32;
            if value.is_finite() {
                Ok(value)
            } else {
                Err(format!("value {v} at position {i} is outside the f32 range"))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parse_embedding_accepts_python_list_literals() {
        assert_eq!(
            parse_embedding("[0.5, -1, 2e-1]").unwrap(),
            vec![0.5, -1.0, 0.2]
        );
        assert!(parse_embedding("[]").is_err());
        assert!(parse_embedding("").is_err());
        assert!(parse_embedding("[0.1, oops]").is_err());
        assert!(parse_embedding("[1e39, 0]").is_err());
        assert!(parse_embedding("[-1e39]").is_err());
    }

    #[test]
    fn from_entries_rejects_non_finite_values() {
        let err = Corpus::from_entries(vec![
            CorpusEntry::new("doc A", vec![1.0, 0.0]),
            CorpusEntry::new("doc B", vec![f32::INFINITY, 0.0]),
        ])
        .unwrap_err();
        assert!(matches!(err, CorpusLoadError::InvalidEntry { index: 1, .. }));
    }

    #[test]
    fn from_entries_drops_blank_text() {
        let corpus = Corpus::from_entries(vec![
            CorpusEntry::new("doc A", vec![1.0, 0.0]),
            CorpusEntry::new("   ", vec![0.0, 1.0]),
        ])
        .unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.dimension(), Some(2));
    }

    #[test]
    fn from_entries_rejects_mixed_dimensions() {
        let err = Corpus::from_entries(vec![
            CorpusEntry::new("doc A", vec![1.0, 0.0]),
            CorpusEntry::new("doc B", vec![1.0, 0.0, 0.0]),
        ])
        .unwrap_err();
        assert!(matches!(err, CorpusLoadError::InvalidEntry { index: 1, .. }));
    }

    #[test]
    fn save_then_load_preserves_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("corpus.csv");

        let corpus = Corpus::from_entries(vec![
            CorpusEntry::new("first, with \"quotes\"\nand a newline", vec![0.25, -0.5])
                .with_source("docs/a.md"),
            CorpusEntry::new("second", vec![1.0, 0.0]),
        ])
        .unwrap();
        corpus.save(&path).unwrap();

        let loaded = Corpus::load(&path).unwrap();
        assert_eq!(loaded.entries(), corpus.entries());
    }

    #[test]
    fn empty_corpus_has_no_dimension() {
        let corpus = Corpus::empty();
        assert!(corpus.is_empty());
        assert_eq!(corpus.dimension(), None);
    }
}
