//! Filename conventions shared by the pipeline stages.
//!
//! Two naming schemes flow through the pipeline:
//! - Pre-canonical names written by the extractor:
//!   `id-<N>[_pagina-<P>]__<UPPER-KEBAB-TITLE>.md`, optionally suffixed
//!   ` (n)` when dedup had to resolve a collision.
//! - Canonical names written by the renamer: `<N>.md`.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};

/// The `id-<N>` and `pagina-<P>` tokens parsed from a filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NameTokens {
    pub id: Option<u64>,
    pub page: Option<u64>,
}

/// Compiled matchers for the `id-<N>` / `pagina-<P>` tokens.
///
/// A token only matches at the start of the name or after a character
/// that is neither a letter nor a digit, so `xid-4` does not count.
#[derive(Debug, Clone)]
pub struct TokenMatcher {
    id_re: Regex,
    page_re: Regex,
}

impl TokenMatcher {
    pub fn new(case_insensitive: bool) -> Self {
        let build = |token: &str| {
            RegexBuilder::new(&format!(r"(?:^|[^\p{{L}}\p{{N}}]){}-([0-9]+)", token))
                .case_insensitive(case_insensitive)
                .build()
                .unwrap()
        };
        Self {
            id_re: build("id"),
            page_re: build("pagina"),
        }
    }

    /// Parse the tokens from a file name (not a full path).
    pub fn parse(&self, file_name: &str) -> NameTokens {
        let capture = |re: &Regex| {
            re.captures(file_name)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse::<u64>().ok())
        };
        NameTokens {
            id: capture(&self.id_re),
            page: capture(&self.page_re),
        }
    }
}

impl Default for TokenMatcher {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Remove a ` (n)` collision suffix placed right before `.md`.
///
/// `"id-5__X (2).md"` -> `"id-5__X.md"`
pub fn strip_collision_suffix(file_name: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"(?i)\s\([0-9]+\)(\.md)$").unwrap());
    re.replace(file_name, "$1").into_owned()
}

/// Parse a canonical `<id>.md` file name. Ids must be positive.
pub fn canonical_id(file_name: &str) -> Option<u64> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^([0-9]+)\.md$").unwrap());
    re.captures(file_name)
        .and_then(|c| c[1].parse::<u64>().ok())
        .filter(|id| *id > 0)
}

/// The canonical file name for an id.
pub fn canonical_name(id: u64) -> String {
    format!("{}.md", id)
}

/// Insert a ` (n)` suffix before the extension of a file name.
///
/// `("5.md", 2)` -> `"5 (2).md"`, `("notes", 3)` -> `"notes (3)"`
pub fn with_collision_suffix(file_name: &str, n: u32) -> String {
    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match path.extension() {
        Some(ext) => format!("{} ({}).{}", stem, n, ext.to_string_lossy()),
        None => format!("{} ({})", stem, n),
    }
}

/// Build the pre-canonical name the extractor gives a document.
///
/// `(Some(12), Some(3), "el rollo")` -> `"id-12_pagina-3__EL-ROLLO.md"`
pub fn extracted_name(id: Option<u64>, page: Option<u64>, title: &str) -> String {
    let title_part = upper_kebab(title);
    let title_part = if title_part.is_empty() {
        "SIN-TITULO".to_string()
    } else {
        title_part
    };

    match (id, page) {
        (Some(id), Some(page)) => format!("id-{}_pagina-{}__{}.md", id, page, title_part),
        (Some(id), None) => format!("id-{}__{}.md", id, title_part),
        _ => format!("{}.md", title_part),
    }
}

/// Collapse whitespace runs to `-` and upper-case, keeping accents.
fn upper_kebab(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_uppercase()
}

/// The file name of a path as a lossy string.
pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Path relative to `root` for display and reports, with `/` separators.
pub fn relative_display(path: &Path, root: &Path) -> String {
    let rel: PathBuf = path.strip_prefix(root).unwrap_or(path).to_path_buf();
    rel.to_string_lossy().replace('\\', "/")
}
