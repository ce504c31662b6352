// SPDX-License-Identifier: MIT OR Apache-2.0

//! Corpus building from a directory of documents.
//!
//! Markdown, HTML, and plain-text files are reduced to visible text,
//! cleaned, embedded in batches, and collected into a [`Corpus`].

use anyhow::{bail, Context, Result};
use ignore::WalkBuilder;
use indicatif::{ProgressBar, ProgressStyle};
use pulldown_cmark::{html, Options, Parser};
use scraper::{ElementRef, Html, Node};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::corpus::{Corpus, CorpusEntry};
use crate::embedding::{clean_text, EmbeddingProvider};
use crate::errors::RetrievalError;
use crate::retrieval::TokenCounter;
use crate::utils::DATA_DIR;

/// Largest input the default embedding model accepts.
pub const DEFAULT_MAX_INPUT_TOKENS: usize = 8192;

const EXTENSIONS: [&str; 5] = ["md", "markdown", "html", "htm", "txt"];

/// Elements whose content is never visible text.
const SKIPPED_ELEMENTS: [&str; 5] = ["script", "style", "noscript", "template", "head"];

/// Elements that end a line of text.
const BLOCK_ELEMENTS: [&str; 22] = [
    "p", "div", "br", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "pre", "blockquote",
    "tr", "table", "section", "article", "header", "footer", "hr", "dd",
];

/// Text extracted from one source file.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub text: String,
}

/// Finds supported documents under a directory, honoring ignore files.
pub struct DocumentScanner {
    root: PathBuf,
}

impl DocumentScanner {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Reads and extracts every supported document, sorted by path.
    ///
    /// Documents whose extracted text is blank are left out.
    pub fn scan(&self) -> Result<Vec<SourceDocument>> {
        if !self.root.is_dir() {
            bail!("document directory not found: {}", absolute(&self.root).display());
        }

        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(true)
            .git_exclude(true)
            .sort_by_file_path(|a, b| a.cmp(b))
            .filter_entry(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .map(|name| name != DATA_DIR && name != ".git")
                    .unwrap_or(true)
            })
            .build();

        let mut documents = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            let path = entry.path();
            if !path.is_file() || !is_supported(path) {
                continue;
            }

            let raw = match std::fs::read_to_string(path) {
                Ok(raw) => raw,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping unreadable document");
                    continue;
                }
            };
            let text = extract_text(path, &raw);
            if text.trim().is_empty() {
                warn!(path = %path.display(), "skipping document with no text");
                continue;
            }
            documents.push(SourceDocument {
                path: path.to_path_buf(),
                text,
            });
        }

        documents.sort_by(|a, b| a.path.cmp(&b.path));
        debug!(root = %self.root.display(), documents = documents.len(), "scanned documents");
        Ok(documents)
    }
}

fn is_supported(path: &Path) -> bool {
    let office_lock = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with("~$"))
        .unwrap_or(false);
    if office_lock {
        return false;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Visible text of a document, chosen by file extension.
pub fn extract_text(path: &Path, raw: &str) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "md" | "markdown" => markdown_to_text(raw),
        "html" | "htm" => html_to_text(raw),
        _ => raw.to_string(),
    }
}

/// Renders Markdown to HTML, then extracts its text.
pub fn markdown_to_text(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown, options);
    let mut rendered = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut rendered, parser);
    html_to_text(&rendered)
}

/// Extracts visible text from HTML, one line per block element.
pub fn html_to_text(source: &str) -> String {
    let document = Html::parse_document(source);
    let mut raw = String::new();
    collect_text(document.root_element(), &mut raw);

    let lines: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    lines.join("\n")
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED_ELEMENTS.contains(&name) {
                    continue;
                }
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, out);
                }
                if BLOCK_ELEMENTS.contains(&name) {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

/// Options for [`build_corpus`].
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Documents above this many tokens are skipped
    pub max_input_tokens: usize,
    /// Draw a progress bar on stderr
    pub show_progress: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            max_input_tokens: DEFAULT_MAX_INPUT_TOKENS,
            show_progress: false,
        }
    }
}

/// Embeds every supported document under `root`.
///
/// Provider failures abort the build. An empty result is an error.
pub fn build_corpus(
    root: &Path,
    provider: &dyn EmbeddingProvider,
    counter: &dyn TokenCounter,
    options: &BuildOptions,
) -> Result<Corpus> {
    let documents = DocumentScanner::new(root).scan()?;

    let mut pending: Vec<(String, String)> = Vec::with_capacity(documents.len());
    for document in documents {
        let text = clean_text(&document.text).into_owned();
        let tokens = counter.count(&text);
        if tokens > options.max_input_tokens {
            warn!(
                path = %document.path.display(),
                tokens,
                limit = options.max_input_tokens,
                "skipping document over the embedding input limit"
            );
            continue;
        }
        pending.push((relative_source(root, &document.path), text));
    }

    if pending.is_empty() {
        bail!("no valid documents found under {}", absolute(root).display());
    }

    let pb = if options.show_progress {
        let pb = ProgressBar::new(pending.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{bar:40.cyan/blue}] {pos}/{len} documents | Embedding {msg}")
                .expect("valid progress bar template")
                .progress_chars("##."),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let batch_size = provider.batch_size().max(1);
    let mut entries = Vec::with_capacity(pending.len());
    for batch in pending.chunks(batch_size) {
        if let Some((source, _)) = batch.first() {
            pb.set_message(source.clone());
        }
        let texts: Vec<String> = batch.iter().map(|(_, text)| text.clone()).collect();
        let embeddings = provider
            .embed_texts(&texts)
            .context("Failed to embed documents")?;
        if embeddings.len() != texts.len() {
            return Err(RetrievalError::Malformed(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                embeddings.len()
            )))
            .context("Failed to embed documents");
        }

        for ((source, text), embedding) in batch.iter().zip(embeddings) {
            entries.push(CorpusEntry::new(text.clone(), embedding).with_source(source.clone()));
        }
        pb.inc(batch.len() as u64);
    }
    pb.finish_and_clear();

    let corpus = Corpus::from_entries(entries)?;
    info!(
        root = %root.display(),
        entries = corpus.len(),
        model = provider.model_id(),
        "built corpus"
    );
    Ok(corpus)
}

fn relative_source(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Token count of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentTokens {
    pub path: String,
    pub tokens: usize,
}

/// Counts tokens of every document the builder would consider.
pub fn scan_tokens(root: &Path, counter: &dyn TokenCounter) -> Result<Vec<DocumentTokens>> {
    let documents = DocumentScanner::new(root).scan()?;
    Ok(documents
        .into_iter()
        .map(|document| DocumentTokens {
            tokens: counter.count(&clean_text(&document.text)),
            path: relative_source(root, &document.path),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::DummyProvider;
    use tempfile::TempDir;

    struct WordCounter;

    impl TokenCounter for WordCounter {
        fn model(&self) -> &str {
            "gpt-4o"
        }

        fn count(&self, text: &str) -> usize {
            text.split_whitespace().count()
        }
    }

    struct FailingProvider;

    impl EmbeddingProvider for FailingProvider {
        fn model_id(&self) -> &str {
            "failing"
        }

        fn batch_size(&self) -> usize {
            8
        }

        fn embed_texts(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError> {
            Err(RetrievalError::Service {
                status: 503,
                body: "unavailable".to_string(),
            })
        }
    }

    fn write(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn html_to_text_drops_scripts_and_keeps_blocks() {
        let text = html_to_text(
            "<html><head><title>t</title><style>p{}</style></head>\
             <body><h1>Title</h1><p>First <b>bold</b> line</p>\
             <script>var x = 1;</script><p>Second</p></body></html>",
        );
        assert_eq!(text, "Title\nFirst bold line\nSecond");
    }

    #[test]
    fn markdown_to_text_strips_markup() {
        let text = markdown_to_text("# Heading\n\nSome *emphasis* and `code`.\n\n- item one\n- item two\n");
        assert_eq!(text, "Heading\nSome emphasis and code.\nitem one\nitem two");
    }

    #[test]
    fn supported_files_exclude_office_locks() {
        assert!(is_supported(Path::new("notes.md")));
        assert!(is_supported(Path::new("page.HTML")));
        assert!(!is_supported(Path::new("~$notes.md")));
        assert!(!is_supported(Path::new("image.png")));
    }

    #[test]
    fn build_corpus_collects_documents_in_path_order() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "b.txt", "bravo text");
        write(dir.path(), "a.md", "# Alpha");
        write(dir.path(), "nested/c.html", "<p>charlie</p>");
        write(dir.path(), "blank.txt", "   \n");
        write(dir.path(), "skip.rs", "fn main() {}");

        let corpus = build_corpus(
            dir.path(),
            &DummyProvider::new(4),
            &WordCounter,
            &BuildOptions::default(),
        )
        .unwrap();

        let sources: Vec<&str> = corpus
            .iter()
            .map(|e| e.source.as_deref().unwrap())
            .collect();
        assert_eq!(sources, vec!["a.md", "b.txt", "nested/c.html"]);
        assert_eq!(corpus.entries()[0].text, "Alpha");
        assert_eq!(corpus.dimension(), Some(4));
    }

    #[test]
    fn build_corpus_skips_oversized_documents() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "small.txt", "one two");
        write(dir.path(), "large.txt", "one two three four five");

        let options = BuildOptions {
            max_input_tokens: 3,
            ..BuildOptions::default()
        };
        let corpus =
            build_corpus(dir.path(), &DummyProvider::new(2), &WordCounter, &options).unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.entries()[0].text, "one two");
    }

    #[test]
    fn build_corpus_fails_without_documents() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "image.png", "not text");
        let err = build_corpus(
            dir.path(),
            &DummyProvider::new(2),
            &WordCounter,
            &BuildOptions::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("no valid documents"));
    }

    #[test]
    fn build_corpus_propagates_provider_errors() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.txt", "alpha");
        let err = build_corpus(
            dir.path(),
            &FailingProvider,
            &WordCounter,
            &BuildOptions::default(),
        )
        .unwrap_err();
        assert!(err.downcast_ref::<RetrievalError>().is_some());
    }

    #[test]
    fn missing_directory_is_named_in_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let err = DocumentScanner::new(&missing).scan().unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn scan_tokens_reports_each_document() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.txt", "one two three");
        write(dir.path(), "b.txt", "four");
        let counts = scan_tokens(dir.path(), &WordCounter).unwrap();
        assert_eq!(
            counts,
            vec![
                DocumentTokens {
                    path: "a.txt".to_string(),
                    tokens: 3
                },
                DocumentTokens {
                    path: "b.txt".to_string(),
                    tokens: 1
                },
            ]
        );
    }
}
