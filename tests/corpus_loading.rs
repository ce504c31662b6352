// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use ragctx::{Corpus, CorpusLoadError};

fn write_csv(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("corpus.csv");
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn loads_columns_in_any_order_and_ignores_extras() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(
        &dir,
        "id,embedding,notes,text\n\
         1,\"[1.0, 0.0]\",x,doc A\n\
         2,\"[0.0, 1.0]\",y,\"doc B, with a comma\nand a second line\"\n",
    );

    let corpus = Corpus::load(&path).unwrap();
    assert_eq!(corpus.len(), 2);
    assert_eq!(corpus.dimension(), Some(2));
    assert_eq!(corpus.entries()[0].text, "doc A");
    assert_eq!(
        corpus.entries()[1].text,
        "doc B, with a comma\nand a second line"
    );
    assert_eq!(corpus.entries()[1].embedding, vec![0.0, 1.0]);
    assert_eq!(corpus.entries()[0].source, None);
}

#[test]
fn keeps_source_column_when_present() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(&dir, "filepath,text,embedding\ndocs/a.md,alpha,\"[0.5]\"\n");
    let corpus = Corpus::load(&path).unwrap();
    assert_eq!(corpus.entries()[0].source.as_deref(), Some("docs/a.md"));
}

#[test]
fn skips_rows_with_blank_text() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(
        &dir,
        "text,embedding\n\
         alpha,\"[1, 0]\"\n\
         \"   \",\"[0, 1]\"\n\
         ,not-even-parsed\n\
         beta,\"[0, 1]\"\n",
    );
    let corpus = Corpus::load(&path).unwrap();
    let texts: Vec<&str> = corpus.iter().map(|e| e.text.as_str()).collect();
    assert_eq!(texts, vec!["alpha", "beta"]);
}

#[test]
fn header_only_file_is_an_empty_corpus() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(&dir, "text,embedding\n");
    let corpus = Corpus::load(&path).unwrap();
    assert!(corpus.is_empty());
    assert_eq!(corpus.dimension(), None);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let err = Corpus::load(dir.path().join("absent.csv")).unwrap_err();
    assert!(matches!(err, CorpusLoadError::Io { .. }));
    assert!(err.to_string().contains("absent.csv"));
}

#[test]
fn missing_embedding_column_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(&dir, "text,vector\nalpha,\"[1]\"\n");
    let err = Corpus::load(&path).unwrap_err();
    assert!(matches!(
        err,
        CorpusLoadError::MissingColumn {
            column: "embedding",
            ..
        }
    ));
}

#[test]
fn malformed_embedding_names_its_line() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(
        &dir,
        "text,embedding\nalpha,\"[1, 0]\"\nbeta,\"[1, zero]\"\n",
    );
    let err = Corpus::load(&path).unwrap_err();
    match err {
        CorpusLoadError::MalformedEmbedding { line, .. } => assert_eq!(line, 3),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn inconsistent_dimension_names_its_line() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(
        &dir,
        "text,embedding\nalpha,\"[1, 0]\"\nbeta,\"[0, 1]\"\ngamma,\"[1, 0, 0]\"\n",
    );
    let err = Corpus::load(&path).unwrap_err();
    match err {
        CorpusLoadError::DimensionMismatch {
            line,
            expected,
            got,
            ..
        } => {
            assert_eq!(line, 4);
            assert_eq!(expected, 2);
            assert_eq!(got, 3);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn ragged_rows_are_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(&dir, "text,embedding\nalpha,\"[1]\",extra\n");
    let err = Corpus::load(&path).unwrap_err();
    assert!(matches!(err, CorpusLoadError::Csv { .. }));
}

#[test]
fn out_of_range_embedding_value_names_its_line() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(
        &dir,
        "text,embedding\nb,\"[0, 1]\"\na,\"[1e39, 0]\"\nc,\"[1, 0]\"\n",
    );
    let err = Corpus::load(&path).unwrap_err();
    match err {
        CorpusLoadError::MalformedEmbedding { line, reason, .. } => {
            assert_eq!(line, 3);
            assert!(reason.contains("f32"));
        }
        other => panic!("unexpected error: {other}"),
    }
}
