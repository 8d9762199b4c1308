//! Markdown normalization and content hashing for duplicate detection.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Toggles for the normalization steps. All steps are enabled by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeOptions {
    pub strip_bom: bool,
    pub normalize_eol: bool,
    pub trim_trailing_spaces: bool,
    pub ignore_front_matter: bool,
    pub collapse_blank_lines: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            strip_bom: true,
            normalize_eol: true,
            trim_trailing_spaces: true,
            ignore_front_matter: true,
            collapse_blank_lines: true,
        }
    }
}

/// Normalize Markdown so that cosmetic differences do not change its hash.
///
/// Steps, in order: strip BOM, unify line endings to LF, trim trailing
/// whitespace per line, drop a leading YAML front matter block, trim outer
/// whitespace (and any BOM it uncovers), collapse runs of blank lines to a single blank line.
///
/// Stripping front matter or outer whitespace can expose another strippable
/// prefix, so the steps repeat until the text is stable.
pub fn normalize_markdown(content: &str, opts: &NormalizeOptions) -> String {
    let mut current = normalize_once(content, opts);
    loop {
        let next = normalize_once(&current, opts);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn normalize_once(content: &str, opts: &NormalizeOptions) -> String {
    let mut s = content;
    if opts.strip_bom {
        s = s.strip_prefix('\u{feff}').unwrap_or(s);
    }

    let mut s = if opts.normalize_eol {
        eol_re().replace_all(s, "\n").into_owned()
    } else {
        s.to_string()
    };

    if opts.trim_trailing_spaces {
        s = s.split('\n').map(str::trim_end).collect::<Vec<_>>().join("\n");
    }

    if opts.ignore_front_matter {
        s = strip_front_matter(&s).to_string();
    }

    // A BOM exposed by front matter or leading whitespace goes with it.
    let s = if opts.strip_bom {
        s.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
    } else {
        s.trim()
    };

    if opts.collapse_blank_lines {
        blank_run_re().replace_all(s, "\n\n").into_owned()
    } else {
        s.to_string()
    }
}

/// Remove a leading `---` ... `---` block.
pub fn strip_front_matter(s: &str) -> &str {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"(?s)\A---\r?\n.*?\r?\n---\r?\n").unwrap());
    match re.find(s) {
        Some(m) => &s[m.end()..],
        None => s,
    }
}

fn eol_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("\r\n?|\u{2028}|\u{2029}").unwrap())
}

fn blank_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").unwrap())
}

/// SHA-256 of the text, hex encoded.
pub fn sha256_hex(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    hex::encode(hasher.finalize())
}

/// Normalize then hash.
pub fn content_hash(content: &str, opts: &NormalizeOptions) -> String {
    sha256_hex(&normalize_markdown(content, opts))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_full_pipeline() {
        let input = "\u{feff}---\ntitle: x\n---\r\n# Title  \r\n\r\n\r\n\r\nBody\t\n\n";
        let out = normalize_markdown(input, &NormalizeOptions::default());
        assert_eq!(out, "# Title\n\nBody");
    }

    #[test]
    fn test_normalize_respects_disabled_steps() {
        let opts = NormalizeOptions {
            ignore_front_matter: false,
            collapse_blank_lines: false,
            ..NormalizeOptions::default()
        };
        let out = normalize_markdown("---\na: 1\n---\nx\n\n\n\ny", &opts);
        assert_eq!(out, "---\na: 1\n---\nx\n\n\n\ny");
    }

    #[test]
    fn test_normalize_unicode_line_separators() {
        let out = normalize_markdown("a\u{2028}b\u{2029}c\rd", &NormalizeOptions::default());
        assert_eq!(out, "a\nb\nc\nd");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let opts = NormalizeOptions::default();
        let inputs = [
            "# A\n\n\n\nB   \n",
            "\n---\nk: v\n---\n# Exposed after trim\n",
            "---\na: 1\n---\n---\nb: 2\n---\nbody",
            "  \u{feff}weird start\r\r\r\rend",
            "",
        ];
        for input in inputs {
            let once = normalize_markdown(input, &opts);
            let twice = normalize_markdown(&once, &opts);
            assert_eq!(once, twice, "input: {:?}", input);
        }
    }

    #[test]
    fn test_inner_bom_is_stripped_with_outer_whitespace() {
        let opts = NormalizeOptions::default();
        assert_eq!(normalize_markdown("  \u{feff}x", &opts), "x");
        assert_eq!(
            content_hash("---\na: 1\n---\n\u{feff}# A\n", &opts),
            content_hash("# A", &opts)
        );
        assert_eq!(normalize_markdown("x\u{feff}\n", &opts), "x");

        let keep = NormalizeOptions {
            strip_bom: false,
            ..opts
        };
        assert_eq!(normalize_markdown("  \u{feff}x", &keep), "\u{feff}x");
    }

    #[test]
    fn test_strip_front_matter_requires_leading_block() {
        assert_eq!(strip_front_matter("---\na: 1\n---\nbody"), "body");
        assert_eq!(strip_front_matter("text\n---\na\n---\n"), "text\n---\na\n---\n");
        assert_eq!(strip_front_matter("---\nunterminated"), "---\nunterminated");
    }

    #[test]
    fn test_content_hash_ignores_trailing_whitespace() {
        let opts = NormalizeOptions::default();
        assert_eq!(
            content_hash("# A\nline one\n", &opts),
            content_hash("# A   \nline one\t\n\n\n", &opts)
        );
        assert_ne!(content_hash("# A", &opts), content_hash("# B", &opts));
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
