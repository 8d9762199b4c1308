//! Markdown to JSON conversion of canonical `<id>.md` documents.

use std::path::{Path, PathBuf};

use futures_util::{StreamExt, stream};
use serde::Serialize;
use tracing::{debug, error, info};

use super::document::{IndexRow, StructuredDoc};
use super::files::{self, DiscoverError, GlobOptions};
use super::markdown::parse_markdown;
use super::naming::{canonical_id, file_name_of};

#[derive(thiserror::Error, Debug)]
pub enum ConvertError {
    #[error(transparent)]
    Discover(#[from] DiscoverError),

    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write docs index {path}: {source}")]
    WriteIndex {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub src: PathBuf,
    pub out: PathBuf,
    pub index: PathBuf,
    pub concurrency: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConvertSummary {
    pub converted: usize,
    pub errors: usize,
    pub skipped: usize,
}

impl ConvertSummary {
    pub fn line(&self) -> String {
        format!(
            "OK: {} JSON files generated ({} errors, {} skipped).",
            self.converted, self.errors, self.skipped
        )
    }
}

/// Read one document and parse it into its structured form.
pub async fn convert_file(path: &Path, id: u64) -> std::io::Result<StructuredDoc> {
    let content = tokio::fs::read_to_string(path).await?;
    let parsed = parse_markdown(&content);
    Ok(StructuredDoc {
        id,
        titulo: parsed.titulo,
        autor: parsed.autor,
        bloques: parsed.bloques,
    })
}

/// Convert every `<id>.md` directly under `opts.src`.
///
/// Writes `<out>/<id>.json` per document and the docs index sorted by id.
/// A document that fails to read or write is logged and left out of the
/// index.
pub async fn run(opts: &ConvertOptions) -> Result<ConvertSummary, ConvertError> {
    let candidates = files::discover(&opts.src, "*.md", GlobOptions::default())?;
    let mut summary = ConvertSummary::default();

    let mut documents: Vec<(PathBuf, u64)> = Vec::new();
    for path in candidates {
        match canonical_id(&file_name_of(&path)) {
            Some(id) => documents.push((path, id)),
            None => {
                debug!(file = %path.display(), "skipping non-canonical file");
                summary.skipped += 1;
            }
        }
    }

    tokio::fs::create_dir_all(&opts.out)
        .await
        .map_err(|source| ConvertError::CreateDir {
            path: opts.out.clone(),
            source,
        })?;

    info!(
        src = %opts.src.display(),
        documents = documents.len(),
        "converting markdown to json"
    );

    let results: Vec<(PathBuf, std::io::Result<IndexRow>)> = stream::iter(documents)
        .map(|(path, id)| async move {
            let result: std::io::Result<IndexRow> = async {
                let doc = convert_file(&path, id).await?;
                files::write_json(&opts.out.join(format!("{}.json", id)), &doc).await?;
                Ok(IndexRow::from(&doc))
            }
            .await;
            (path, result)
        })
        .buffered(opts.concurrency.max(1))
        .collect()
        .await;

    let mut rows = Vec::with_capacity(results.len());
    for (path, result) in results {
        match result {
            Ok(row) => {
                summary.converted += 1;
                rows.push(row);
            }
            Err(e) => {
                error!(file = %path.display(), error = %e, "conversion failed");
                summary.errors += 1;
            }
        }
    }

    rows.sort_by_key(|row| row.id);
    files::write_json(&opts.index, &rows)
        .await
        .map_err(|source| ConvertError::WriteIndex {
            path: opts.index.clone(),
            source,
        })?;

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(root: &Path) -> ConvertOptions {
        ConvertOptions {
            src: root.join("complete"),
            out: root.join("docs"),
            index: root.join("docs-index.json"),
            concurrency: 4,
        }
    }

    #[tokio::test]
    async fn test_converts_and_sorts_index() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path());
        std::fs::create_dir_all(&opts.src).unwrap();
        std::fs::write(opts.src.join("10.md"), "# Diez\n\ntexto\n\n*Escribe: Alfa*").unwrap();
        std::fs::write(opts.src.join("2.md"), "# Dos\n\nsin firma").unwrap();
        std::fs::write(opts.src.join("README.md"), "# Índice").unwrap();

        let summary = run(&opts).await.unwrap();

        assert_eq!(summary.converted, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.errors, 0);

        let index: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&opts.index).unwrap()).unwrap();
        assert_eq!(
            index,
            serde_json::json!([
                {"id": 2, "titulo": "Dos", "autor": ""},
                {"id": 10, "titulo": "Diez", "autor": "Alfa"}
            ])
        );

        let doc: StructuredDoc =
            serde_json::from_str(&std::fs::read_to_string(opts.out.join("10.json")).unwrap())
                .unwrap();
        assert_eq!(doc.id, 10);
        assert_eq!(doc.autor.as_deref(), Some("Alfa"));
        assert_eq!(doc.bloques.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_directory_writes_empty_index() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path());
        std::fs::create_dir_all(&opts.src).unwrap();

        let summary = run(&opts).await.unwrap();

        assert_eq!(summary, ConvertSummary::default());
        assert_eq!(std::fs::read_to_string(&opts.index).unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_missing_source_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let result = run(&options(dir.path())).await;
        assert!(matches!(result, Err(ConvertError::Discover(_))));
    }

    #[test]
    fn test_summary_line() {
        let summary = ConvertSummary {
            converted: 3,
            errors: 1,
            skipped: 0,
        };
        assert_eq!(summary.line(), "OK: 3 JSON files generated (1 errors, 0 skipped).");
    }
}
