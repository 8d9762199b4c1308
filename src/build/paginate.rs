//! Splits the flat docs index into fixed-width ID-range pages.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use super::document::IndexRow;
use super::files;

pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Largest id accepted from the docs index (2^53 - 1). Web clients read ids
/// as IEEE doubles, so anything above is not an exact integer for them.
pub const MAX_ID: u64 = (1 << 53) - 1;

#[derive(thiserror::Error, Debug)]
pub enum PaginateError {
    #[error("failed to read docs index {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse docs index {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("docs index must be an array of rows")]
    NotAnArray,

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// The nominal ID window a page covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRange {
    pub start: u64,
    pub end: u64,
}

impl PageRange {
    /// Saturates at `u64::MAX` instead of overflowing.
    pub fn for_page(page: u64, page_size: u64) -> Self {
        let start = page
            .saturating_sub(1)
            .checked_mul(page_size)
            .and_then(|n| n.checked_add(1))
            .unwrap_or(u64::MAX);
        PageRange {
            start,
            end: page.checked_mul(page_size).unwrap_or(u64::MAX),
        }
    }

    pub fn contains(&self, id: u64) -> bool {
        (self.start..=self.end).contains(&id)
    }
}

/// One `<page>.json` file. Field names are a published wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexPage {
    pub page: u64,
    pub page_size: u64,
    pub range: PageRange,
    pub items: Vec<IndexRow>,
    pub has_prev: bool,
    pub has_next: bool,
    pub total_ids: u64,
    pub total_pages: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagesMeta {
    pub total_pages: u64,
    pub page_size: u64,
    pub max_id: u64,
}

/// Rows that survived normalization, plus how many were dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRows {
    pub rows: Vec<IndexRow>,
    pub dropped: usize,
}

/// Coerce raw JSON rows into index rows sorted by id.
///
/// A row is kept when its `id` is a number or numeric string in
/// `1 ..= MAX_ID` (floored) and its `titulo` is non-empty after trimming.
pub fn normalize_rows(value: &Value) -> Result<NormalizedRows, PaginateError> {
    let raw = value.as_array().ok_or(PaginateError::NotAnArray)?;

    let mut rows: Vec<IndexRow> = raw.iter().filter_map(normalize_row).collect();
    rows.sort_by_key(|row| row.id);

    Ok(NormalizedRows {
        dropped: raw.len() - rows.len(),
        rows,
    })
}

fn normalize_row(value: &Value) -> Option<IndexRow> {
    let obj = value.as_object()?;

    let id = match obj.get("id")? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !id.is_finite() || id <= 0.0 || id > MAX_ID as f64 {
        return None;
    }
    let id = id.floor() as u64;
    if id == 0 {
        return None;
    }

    let titulo = text_field(obj.get("titulo"));
    if titulo.is_empty() {
        return None;
    }

    Some(IndexRow {
        id,
        titulo,
        autor: text_field(obj.get("autor")),
    })
}

fn text_field(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string(),
    }
}

/// Build every page for rows sorted by id. A zero page size falls back to
/// the default.
pub fn paginate(rows: &[IndexRow], page_size: u64) -> (PagesMeta, Vec<IndexPage>) {
    let page_size = if page_size == 0 {
        DEFAULT_PAGE_SIZE
    } else {
        page_size
    };
    let max_id = rows.iter().map(|r| r.id).max().unwrap_or(0);
    let total_pages = max_id.div_ceil(page_size).max(1);

    let pages = (1..=total_pages)
        .map(|page| {
            let range = PageRange::for_page(page, page_size);
            IndexPage {
                page,
                page_size,
                range,
                items: rows.iter().filter(|r| range.contains(r.id)).cloned().collect(),
                has_prev: page > 1,
                has_next: page < total_pages,
                total_ids: max_id,
                total_pages,
            }
        })
        .collect();

    let meta = PagesMeta {
        total_pages,
        page_size,
        max_id,
    };
    (meta, pages)
}

/// Read the docs index and write `meta.json` plus `<page>.json` into `out`.
pub async fn run(index: &Path, out: &Path, page_size: u64) -> Result<PagesMeta, PaginateError> {
    let raw = tokio::fs::read_to_string(index)
        .await
        .map_err(|source| PaginateError::Read {
            path: index.to_path_buf(),
            source,
        })?;
    let value: Value = serde_json::from_str(&raw).map_err(|source| PaginateError::Parse {
        path: index.to_path_buf(),
        source,
    })?;

    let normalized = normalize_rows(&value)?;
    if normalized.dropped > 0 {
        warn!(
            index = %index.display(),
            dropped = normalized.dropped,
            "dropped rows without a positive id or a title"
        );
    }

    let (meta, pages) = paginate(&normalized.rows, page_size);

    write(&out.join("meta.json"), &meta).await?;
    for page in &pages {
        write(&out.join(format!("{}.json", page.page)), page).await?;
    }

    Ok(meta)
}

async fn write<T: Serialize>(path: &Path, value: &T) -> Result<(), PaginateError> {
    files::write_json(path, value)
        .await
        .map_err(|source| PaginateError::Write {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(id: u64) -> IndexRow {
        IndexRow {
            id,
            titulo: format!("Doc {}", id),
            autor: String::new(),
        }
    }

    #[test]
    fn test_sparse_last_page() {
        let rows = vec![row(1), row(2), row(15), row(23)];
        let (meta, pages) = paginate(&rows, 10);

        assert_eq!(meta.total_pages, 3);
        assert_eq!(meta.max_id, 23);
        assert_eq!(pages.len(), 3);

        let last = &pages[2];
        assert_eq!(last.range, PageRange { start: 21, end: 30 });
        assert_eq!(last.items.len(), 1);
        assert!(last.has_prev);
        assert!(!last.has_next);
        assert_eq!(last.total_ids, 23);

        assert!(!pages[0].has_prev);
        assert_eq!(pages[0].items.len(), 2);
    }

    #[test]
    fn test_empty_rows_still_produce_one_page() {
        let (meta, pages) = paginate(&[], 10);
        assert_eq!(meta, PagesMeta {
            total_pages: 1,
            page_size: 10,
            max_id: 0
        });
        assert!(pages[0].items.is_empty());
        assert!(!pages[0].has_next);
    }

    #[test]
    fn test_zero_page_size_falls_back() {
        let (meta, _) = paginate(&[row(25)], 0);
        assert_eq!(meta.page_size, 10);
        assert_eq!(meta.total_pages, 3);
    }

    #[test]
    fn test_normalize_rows() {
        let value = json!([
            {"id": "7", "titulo": " Siete ", "autor": null},
            {"id": 3.9, "titulo": "Tres", "autor": " A "},
            {"id": 0, "titulo": "Cero"},
            {"id": "x", "titulo": "Nada"},
            {"id": 4, "titulo": "   "},
            "not an object"
        ]);

        let normalized = normalize_rows(&value).unwrap();

        assert_eq!(normalized.dropped, 4);
        assert_eq!(
            normalized.rows,
            vec![
                IndexRow {
                    id: 3,
                    titulo: "Tres".to_string(),
                    autor: "A".to_string()
                },
                IndexRow {
                    id: 7,
                    titulo: "Siete".to_string(),
                    autor: String::new()
                },
            ]
        );
    }

    #[test]
    fn test_out_of_range_ids_are_dropped() {
        let value = json!([
            {"id": 1e20, "titulo": "Enorme"},
            {"id": "18446744073709551615", "titulo": "Límite"},
            {"id": 9007199254740991u64, "titulo": "Máximo"},
            {"id": 1, "titulo": "Uno"}
        ]);

        let normalized = normalize_rows(&value).unwrap();

        assert_eq!(normalized.dropped, 2);
        assert_eq!(
            normalized.rows.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![1, MAX_ID]
        );
    }

    #[test]
    fn test_page_range_saturates() {
        assert_eq!(PageRange::for_page(1, 10), PageRange { start: 1, end: 10 });
        assert_eq!(
            PageRange::for_page(3, u64::MAX),
            PageRange {
                start: u64::MAX,
                end: u64::MAX
            }
        );
        assert_eq!(
            PageRange::for_page(1, u64::MAX),
            PageRange {
                start: 1,
                end: u64::MAX
            }
        );
    }

    #[test]
    fn test_normalize_rejects_non_array() {
        assert!(matches!(
            normalize_rows(&json!({"id": 1})),
            Err(PaginateError::NotAnArray)
        ));
    }

    #[tokio::test]
    async fn test_run_writes_meta_and_pages() {
        let dir = tempfile::tempdir().unwrap();
        let index = dir.path().join("docs-index.json");
        std::fs::write(
            &index,
            r#"[{"id": 23, "titulo": "Último", "autor": ""}, {"id": 1, "titulo": "Uno", "autor": "Alfa"}]"#,
        )
        .unwrap();
        let out = dir.path().join("pages");

        let meta = run(&index, &out, 10).await.unwrap();

        assert_eq!(meta.total_pages, 3);
        let meta_json: Value =
            serde_json::from_str(&std::fs::read_to_string(out.join("meta.json")).unwrap()).unwrap();
        assert_eq!(meta_json, json!({"totalPages": 3, "pageSize": 10, "maxId": 23}));

        let page: Value =
            serde_json::from_str(&std::fs::read_to_string(out.join("3.json")).unwrap()).unwrap();
        assert_eq!(page["range"], json!({"start": 21, "end": 30}));
        assert_eq!(page["items"][0]["titulo"], "Último");
        assert_eq!(page["hasPrev"], true);
        assert_eq!(page["hasNext"], false);
        assert_eq!(page["totalIds"], 23);
        assert!(out.join("2.json").exists());
    }
}
