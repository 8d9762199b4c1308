//! Pluggable extraction of Markdown documents from legacy HTML pages.
//!
//! Each document family gets its own [`ExtractionStrategy`]. Strategies
//! never write files themselves: they hand documents to a caller-owned
//! [`MarkdownWriter`], and the caller flushes it between pages.
//!
//! # Adding a Strategy
//!
//! ```ignore
//! struct LeyesStrategy;
//!
//! impl ExtractionStrategy for LeyesStrategy {
//!     fn name(&self) -> &'static str { "divinas-leyes" }
//!     fn matches(&self, path: &Path) -> bool { path.starts_with("leyes") }
//!     fn extract(&self, page: &SourcePage, writer: &mut MarkdownWriter) -> Result<usize, ExtractError> {
//!         // Find title, id and body in page.html, then writer.queue(...)
//!     }
//! }
//!
//! registry.register(LeyesStrategy);
//! ```

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, error, info, warn};

use super::files::{self, DiscoverError, GlobOptions};
use super::naming::{extracted_name, relative_display};

/// Documents with less visible text than this are not written.
const MIN_TEXT_CHARS: usize = 10;

#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    #[error(transparent)]
    Discover(#[from] DiscoverError),

    /// Generic failure reported by a strategy.
    #[error("{strategy}: {message}")]
    Strategy {
        strategy: &'static str,
        message: String,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// One HTML page handed to a strategy.
#[derive(Debug, Clone)]
pub struct SourcePage {
    /// Path relative to the extraction root, with `/` separators.
    pub rel_path: String,
    pub html: String,
}

/// Extracts the documents of one family from its HTML pages.
pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this strategy handles the page at `rel_path`.
    fn matches(&self, rel_path: &Path) -> bool;

    /// Queue the page's documents on `writer`. Returns how many were queued.
    fn extract(&self, page: &SourcePage, writer: &mut MarkdownWriter)
    -> Result<usize, ExtractError>;
}

/// Registry of extraction strategies.
#[derive(Default)]
pub struct StrategyRegistry {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later registrations take precedence.
    pub fn register<S: ExtractionStrategy + 'static>(&mut self, strategy: S) {
        self.strategies.push(Box::new(strategy));
    }

    pub fn for_path(&self, rel_path: &Path) -> Option<&dyn ExtractionStrategy> {
        self.strategies
            .iter()
            .rev()
            .find(|s| s.matches(rel_path))
            .map(|s| s.as_ref())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }
}

/// A document waiting to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDoc {
    pub file_name: String,
    pub markdown: String,
}

/// Streaming writer for extracted documents.
///
/// `queue` only records documents; nothing touches the disk until
/// `flush_pending` is called.
#[derive(Debug)]
pub struct MarkdownWriter {
    out_dir: PathBuf,
    pending: Vec<PendingDoc>,
    skipped_empty: usize,
    written: usize,
    failed: usize,
}

impl MarkdownWriter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            pending: Vec::new(),
            skipped_empty: 0,
            written: 0,
            failed: 0,
        }
    }

    /// Queue a document named `id-<id>[_pagina-<p>]__<TITLE>.md`.
    ///
    /// Returns false when the document was dropped for having no real text.
    pub fn queue(&mut self, id: Option<u64>, page: Option<u64>, title: &str, markdown: &str) -> bool {
        if is_trivially_empty(markdown) {
            debug!(title, "skipping empty document");
            self.skipped_empty += 1;
            return false;
        }
        self.pending.push(PendingDoc {
            file_name: extracted_name(id, page, title),
            markdown: markdown.to_string(),
        });
        true
    }

    pub fn pending(&self) -> &[PendingDoc] {
        &self.pending
    }

    pub fn skipped_empty(&self) -> usize {
        self.skipped_empty
    }

    pub fn written(&self) -> usize {
        self.written
    }

    /// Documents that could not be written.
    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Write every queued document and clear the queue.
    ///
    /// A document that fails to write is logged and counted, and the rest
    /// are still written. Only a missing output directory that cannot be
    /// created is returned as an error, with the whole queue counted failed.
    pub async fn flush_pending(&mut self) -> Result<usize, ExtractError> {
        if self.pending.is_empty() {
            return Ok(0);
        }
        let pending = std::mem::take(&mut self.pending);

        if let Err(source) = tokio::fs::create_dir_all(&self.out_dir).await {
            self.failed += pending.len();
            return Err(ExtractError::Write {
                path: self.out_dir.clone(),
                source,
            });
        }

        let mut count = 0;
        for doc in pending {
            let path = self.out_dir.join(&doc.file_name);
            match tokio::fs::write(&path, doc.markdown).await {
                Ok(()) => count += 1,
                Err(e) => {
                    error!(path = %path.display(), error = %e, "failed to write document");
                    self.failed += 1;
                }
            }
        }

        self.written += count;
        Ok(count)
    }
}

/// True when the Markdown has fewer than ten characters of text once
/// images, heading markers and emphasis markers are removed.
pub fn is_trivially_empty(markdown: &str) -> bool {
    static IMAGE_RE: OnceLock<Regex> = OnceLock::new();
    static MARKER_RE: OnceLock<Regex> = OnceLock::new();
    let image_re = IMAGE_RE.get_or_init(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)").unwrap());
    let marker_re = MARKER_RE.get_or_init(|| Regex::new(r"(?m)^\s*#+\s*|[*_>`~\-]").unwrap());

    let without_images = image_re.replace_all(markdown, "");
    let text = marker_re.replace_all(&without_images, "");
    text.chars().filter(|c| !c.is_whitespace()).count() < MIN_TEXT_CHARS
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub pages: usize,
    pub unmatched: usize,
    /// Pages that could not be read or that their strategy rejected.
    pub failed_pages: usize,
    pub written: usize,
    pub skipped_empty: usize,
    pub failed_documents: usize,
}

/// Run the matching strategy over every HTML page under `root`, flushing
/// the writer after each page.
///
/// Only a failure to list `root` ends the run. Bad pages and unwritable
/// documents are logged, counted and skipped.
pub async fn run(
    root: &Path,
    registry: &StrategyRegistry,
    writer: &mut MarkdownWriter,
) -> Result<ExtractSummary, ExtractError> {
    let pages = files::discover(
        root,
        "**/*.{htm,html}",
        GlobOptions {
            case_insensitive: true,
        },
    )?;
    let mut summary = ExtractSummary::default();

    for path in pages {
        let rel_path = relative_display(&path, root);
        let Some(strategy) = registry.for_path(Path::new(&rel_path)) else {
            debug!(page = %rel_path, "no strategy for page");
            summary.unmatched += 1;
            continue;
        };

        summary.pages += 1;
        let html = match tokio::fs::read_to_string(&path).await {
            Ok(html) => html,
            Err(e) => {
                error!(page = %rel_path, error = %e, "failed to read page");
                summary.failed_pages += 1;
                continue;
            }
        };
        let page = SourcePage { rel_path, html };

        if let Err(e) = strategy.extract(&page, writer) {
            warn!(page = %page.rel_path, strategy = strategy.name(), error = %e, "extraction failed");
            summary.failed_pages += 1;
        }

        debug!(page = %page.rel_path, pending = writer.pending().len(), "flushing");
        if let Err(e) = writer.flush_pending().await {
            error!(page = %page.rel_path, error = %e, "failed to flush documents");
        }
    }

    summary.written = writer.written();
    summary.skipped_empty = writer.skipped_empty();
    summary.failed_documents = writer.failed();
    info!(
        pages = summary.pages,
        failed_pages = summary.failed_pages,
        written = summary.written,
        skipped = summary.skipped_empty,
        failed_documents = summary.failed_documents,
        "extraction finished"
    );
    Ok(summary)
}
