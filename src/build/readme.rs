//! README index generation for a directory of canonical documents.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use futures_util::{StreamExt, stream};
use regex::Regex;
use serde::Serialize;
use tera::{Context, Tera};
use tracing::{error, info};

use super::files::{self, DiscoverError, GlobOptions};
use super::naming::{canonical_id, file_name_of};

pub const DEFAULT_HEADING: &str = "Índice General";
pub const DEFAULT_NOTE: &str = "La numeración indicada no se corresponde en algunos casos con la numeración real de los rollos, solamente indican un número correlativo.";

const TEMPLATE_NAME: &str = "README.md";

/// Built-in layout. Sections are windows of `per_page` ids starting at 1.
const DEFAULT_TEMPLATE: &str = r#"# {{ heading }}

{% if sections | length == 0 -%}
*(No se encontraron archivos <id>.md para indexar).*
{% else -%}
{{ note }}

{% for section in sections -%}
## Página {{ section.page }} (IDs {{ section.start }}–{{ section.end }})
{% if section.entries | length == 0 -%}
_(Sin elementos en este rango)_
{% else -%}
{% for entry in section.entries -%}
{{ entry.id }}. [{{ entry.title }}](./{{ entry.id }}.md)
{% endfor -%}
{% endif %}
{% endfor -%}
{% endif -%}
"#;

#[derive(thiserror::Error, Debug)]
pub enum ReadmeError {
    #[error(transparent)]
    Discover(#[from] DiscoverError),

    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error("failed to read template {path}: {source}")]
    ReadTemplate {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct ReadmeOptions {
    pub dir: PathBuf,
    /// Defaults to `<dir>/README.md`.
    pub out: Option<PathBuf>,
    pub per_page: u64,
    pub heading: String,
    pub note: String,
    pub include_empty_pages: bool,
    pub concurrency: usize,
    pub template: Option<PathBuf>,
}

impl ReadmeOptions {
    pub fn out_path(&self) -> PathBuf {
        self.out
            .clone()
            .unwrap_or_else(|| self.dir.join("README.md"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub id: u64,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub page: u64,
    pub start: u64,
    pub end: u64,
    pub entries: Vec<Entry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadmeSummary {
    pub out: PathBuf,
    pub entries: usize,
    pub sections: usize,
    pub errors: usize,
}

/// The README template renderer, wrapping Tera.
pub struct ReadmeRenderer {
    tera: Tera,
}

impl ReadmeRenderer {
    /// Use the built-in template, or the one at `template` when given.
    pub fn new(template: Option<&Path>) -> Result<Self, ReadmeError> {
        let source = match template {
            Some(path) => {
                std::fs::read_to_string(path).map_err(|source| ReadmeError::ReadTemplate {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            None => DEFAULT_TEMPLATE.to_string(),
        };

        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, &source)?;
        Ok(Self { tera })
    }

    pub fn render(
        &self,
        heading: &str,
        note: &str,
        sections: &[Section],
    ) -> Result<String, ReadmeError> {
        let mut context = Context::new();
        context.insert("heading", heading);
        context.insert("note", note);
        context.insert("sections", sections);

        Ok(self.tera.render(TEMPLATE_NAME, &context)?)
    }
}

/// The first `# ` heading of a document, ignoring a leading BOM.
pub fn first_heading(markdown: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^#\s+(.+?)\s*$").unwrap());

    markdown.lines().find_map(|raw| {
        let line = raw.strip_prefix('\u{feff}').unwrap_or(raw);
        let title = re.captures(line)?.get(1)?.as_str().trim();
        (!title.is_empty()).then(|| title.to_string())
    })
}

/// Partition `[1 ..= maxId]` into windows of `per_page` ids.
///
/// `entries` must be sorted by id. The last window ends at `maxId`.
pub fn sections(entries: &[Entry], per_page: u64, include_empty: bool) -> Vec<Section> {
    let per_page = per_page.max(1);
    let Some(max_id) = entries.last().map(|e| e.id) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    let mut start: u64 = 1;
    loop {
        if !include_empty {
            // Jump straight to the window holding the next entry.
            let Some(next) = entries.iter().map(|e| e.id).find(|&id| id >= start) else {
                break;
            };
            start = 1 + (next - 1) / per_page * per_page;
        }
        if start > max_id {
            break;
        }

        let end = start.saturating_add(per_page - 1).min(max_id);
        let chunk: Vec<Entry> = entries
            .iter()
            .filter(|e| (start..=end).contains(&e.id))
            .cloned()
            .collect();

        if include_empty || !chunk.is_empty() {
            out.push(Section {
                page: (start - 1) / per_page + 1,
                start,
                end,
                entries: chunk,
            });
        }
        match start.checked_add(per_page) {
            Some(next) => start = next,
            None => break,
        }
    }
    out
}

/// Read every `<id>.md` under `dir` and return its entry, sorted by id.
/// Files that cannot be read are logged and counted.
pub async fn collect_entries(dir: &Path, concurrency: usize) -> Result<(Vec<Entry>, usize), ReadmeError> {
    let candidates: Vec<(PathBuf, u64)> = files::discover(dir, "*.md", GlobOptions::default())?
        .into_iter()
        .filter_map(|path| canonical_id(&file_name_of(&path)).map(|id| (path, id)))
        .collect();

    let results: Vec<_> = stream::iter(candidates)
        .map(|(path, id)| async move {
            let result = tokio::fs::read_to_string(&path).await;
            (path, id, result)
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut entries = Vec::with_capacity(results.len());
    let mut errors = 0;
    for (path, id, result) in results {
        match result {
            Ok(content) => entries.push(Entry {
                id,
                title: first_heading(&content).unwrap_or_else(|| format!("Documento {}", id)),
            }),
            Err(e) => {
                error!(file = %path.display(), error = %e, "failed to read document");
                errors += 1;
            }
        }
    }

    entries.sort_by_key(|e| e.id);
    Ok((entries, errors))
}

/// Build and write the README.
pub async fn run(opts: &ReadmeOptions) -> Result<ReadmeSummary, ReadmeError> {
    let renderer = ReadmeRenderer::new(opts.template.as_deref())?;
    let (entries, errors) = collect_entries(&opts.dir, opts.concurrency).await?;
    let sections = sections(&entries, opts.per_page, opts.include_empty_pages);
    let markdown = renderer.render(&opts.heading, &opts.note, &sections)?;

    let out = opts.out_path();
    if let Some(parent) = out.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| ReadmeError::Write {
                path: out.clone(),
                source,
            })?;
    }
    tokio::fs::write(&out, markdown)
        .await
        .map_err(|source| ReadmeError::Write {
            path: out.clone(),
            source,
        })?;

    info!(out = %out.display(), entries = entries.len(), "readme written");

    Ok(ReadmeSummary {
        out,
        entries: entries.len(),
        sections: sections.len(),
        errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u64) -> Entry {
        Entry {
            id,
            title: format!("T{}", id),
        }
    }

    #[test]
    fn test_first_heading() {
        assert_eq!(first_heading("\u{feff}# Hola  \ntexto").as_deref(), Some("Hola"));
        assert_eq!(first_heading("intro\n## Sub\n# Real").as_deref(), Some("Real"));
        assert_eq!(first_heading("#\n# \nnada"), None);
    }

    #[test]
    fn test_sections_start_at_one_and_clip_end() {
        let entries = vec![entry(3), entry(12), entry(25)];

        let secs = sections(&entries, 10, false);
        assert_eq!(
            secs.iter().map(|s| (s.page, s.start, s.end)).collect::<Vec<_>>(),
            vec![(1, 1, 10), (2, 11, 20), (3, 21, 25)]
        );

        let entries = vec![entry(3), entry(25)];
        assert_eq!(sections(&entries, 10, false).len(), 2);
        let all = sections(&entries, 10, true);
        assert_eq!(all.len(), 3);
        assert!(all[1].entries.is_empty());
    }

    #[test]
    fn test_sections_with_huge_window_or_id() {
        let entries = vec![entry(1), entry(u64::MAX)];

        let secs = sections(&entries, u64::MAX, true);
        assert_eq!(secs.len(), 1);
        assert_eq!((secs[0].start, secs[0].end), (1, u64::MAX));
        assert_eq!(secs[0].entries.len(), 2);

        let secs = sections(&entries, 10, false);
        assert_eq!(
            secs.iter().map(|s| (s.start, s.entries.len())).collect::<Vec<_>>(),
            vec![(1, 1), (18446744073709551611, 1)]
        );
        assert_eq!(secs[1].end, u64::MAX);
    }

    #[test]
    fn test_render_default_template() {
        let renderer = ReadmeRenderer::new(None).unwrap();
        let secs = sections(&[entry(1), entry(2), entry(23)], 10, true);

        let out = renderer.render("Índice", "Nota", &secs).unwrap();

        assert_eq!(
            out,
            "# Índice\n\nNota\n\n\
             ## Página 1 (IDs 1–10)\n1. [T1](./1.md)\n2. [T2](./2.md)\n\n\
             ## Página 2 (IDs 11–20)\n_(Sin elementos en este rango)_\n\n\
             ## Página 3 (IDs 21–23)\n23. [T23](./23.md)\n\n"
        );
    }

    #[test]
    fn test_render_without_entries() {
        let renderer = ReadmeRenderer::new(None).unwrap();
        let out = renderer.render("Índice", "Nota", &[]).unwrap();
        assert_eq!(
            out,
            "# Índice\n\n*(No se encontraron archivos <id>.md para indexar).*\n"
        );
    }

    #[test]
    fn test_custom_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("readme.tera");
        std::fs::write(&path, "{{ heading }}: {{ sections | length }}").unwrap();

        let renderer = ReadmeRenderer::new(Some(&path)).unwrap();
        let out = renderer.render("H", "", &sections(&[entry(4)], 10, false)).unwrap();
        assert_eq!(out, "H: 1");
    }

    #[tokio::test]
    async fn test_run_writes_readme() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("2.md"), "# Segundo\n").unwrap();
        std::fs::write(dir.path().join("1.md"), "sin título").unwrap();
        std::fs::write(dir.path().join("notas.md"), "# Ignorado").unwrap();

        let opts = ReadmeOptions {
            dir: dir.path().to_path_buf(),
            out: None,
            per_page: 10,
            heading: DEFAULT_HEADING.to_string(),
            note: "n".to_string(),
            include_empty_pages: false,
            concurrency: 2,
            template: None,
        };

        let summary = run(&opts).await.unwrap();

        assert_eq!(summary.entries, 2);
        assert_eq!(summary.out, dir.path().join("README.md"));
        let readme = std::fs::read_to_string(&summary.out).unwrap();
        assert!(readme.contains("1. [Documento 1](./1.md)\n2. [Segundo](./2.md)\n"));
    }

    #[tokio::test]
    async fn test_nested_documents_are_not_indexed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/3.md"), "# Anidado\n").unwrap();
        std::fs::write(dir.path().join("1.md"), "# Uno\n").unwrap();

        let opts = ReadmeOptions {
            dir: dir.path().to_path_buf(),
            out: None,
            per_page: 10,
            heading: DEFAULT_HEADING.to_string(),
            note: "n".to_string(),
            include_empty_pages: false,
            concurrency: 2,
            template: None,
        };

        let summary = run(&opts).await.unwrap();

        assert_eq!(summary.entries, 1);
        let readme = std::fs::read_to_string(&summary.out).unwrap();
        assert!(readme.contains("[Uno](./1.md)"));
        assert!(!readme.contains("Anidado"));
        assert!(!readme.contains("3.md"));
    }
}
