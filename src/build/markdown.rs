//! Line-oriented Markdown parsing into the structured block model.

use std::sync::OnceLock;

use regex::Regex;

use super::document::{Block, Inline};

const UNTITLED: &str = "Untitled";

/// Title, author and blocks of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMarkdown {
    pub titulo: String,
    pub autor: Option<String>,
    pub bloques: Vec<Block>,
}

fn title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#\s+(.*)$").unwrap())
}

fn author_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\*(.*?)\*$").unwrap())
}

fn escribe_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^Escribe:\s*").unwrap())
}

fn article_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)Art[ií]culo\s*N[ºo]\s*([0-9]+)").unwrap())
}

fn image_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*!\[(.*?)\]\((.*?)\)\s*$").unwrap())
}

/// Signature text of a `*...*` line, without an `Escribe:` prefix.
pub fn extract_author(line: &str) -> Option<String> {
    let caps = author_re().captures(line.trim())?;
    let inner = caps[1].trim();
    let cleaned = escribe_re().replace(inner, "");
    let cleaned = cleaned.trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

/// The number of an `Artículo Nº <n>` marker anywhere in the line.
pub fn extract_article_no(line: &str) -> Option<u64> {
    article_re()
        .captures(line)
        .and_then(|c| c[1].parse::<u64>().ok())
}

/// Parse a document.
///
/// The first `# ` line is the title and the last `*...*` line is the
/// author. The remaining lines become paragraphs (blank lines separate
/// them) and standalone images. Only the first article marker is kept.
pub fn parse_markdown(md: &str) -> ParsedMarkdown {
    let text = md.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<&str> = text.split('\n').collect();

    let (title_index, titulo) = lines
        .iter()
        .enumerate()
        .map(|(i, raw)| (i, raw.trim()))
        .filter(|(_, line)| !line.is_empty())
        .find_map(|(i, line)| {
            title_re().captures(line).map(|c| {
                let title = c[1].trim();
                let title = if title.is_empty() { UNTITLED } else { title };
                (Some(i), title.to_string())
            })
        })
        .unwrap_or((None, UNTITLED.to_string()));

    let (author_index, autor) = lines
        .iter()
        .enumerate()
        .rev()
        .filter(|(_, raw)| !raw.trim().is_empty())
        .find_map(|(i, raw)| extract_author(raw).map(|a| (Some(i), Some(a))))
        .unwrap_or((None, None));

    let mut bloques = vec![Block::Heading {
        text: titulo.clone(),
        id: slugify(&titulo),
    }];

    let mut article_seen = false;
    if let Some(value) = extract_article_no(&titulo) {
        bloques.push(Block::ArticleNo { value });
        article_seen = true;
    }

    let mut buffer: Vec<&str> = Vec::new();
    for (i, raw) in lines.iter().enumerate() {
        let line = raw.trim();
        if Some(i) == title_index || Some(i) == author_index || line.is_empty() {
            flush_paragraph(&mut buffer, &mut bloques);
            continue;
        }

        if let Some(caps) = image_re().captures(line) {
            flush_paragraph(&mut buffer, &mut bloques);
            let src = caps[2].trim();
            if !src.is_empty() {
                bloques.push(Block::Image {
                    src: src.to_string(),
                    alt: caps[1].trim().to_string(),
                });
            }
            continue;
        }

        // Stray signature lines are dropped.
        if extract_author(line).is_some() {
            flush_paragraph(&mut buffer, &mut bloques);
            continue;
        }

        if !article_seen && let Some(value) = extract_article_no(line) {
            flush_paragraph(&mut buffer, &mut bloques);
            bloques.push(Block::ArticleNo { value });
            article_seen = true;
            continue;
        }

        buffer.push(line);
    }
    flush_paragraph(&mut buffer, &mut bloques);

    if let Some(author) = &autor {
        bloques.push(Block::Author {
            text: author.clone(),
        });
    }

    ParsedMarkdown {
        titulo,
        autor,
        bloques,
    }
}

fn flush_paragraph(buffer: &mut Vec<&str>, bloques: &mut Vec<Block>) {
    if buffer.is_empty() {
        return;
    }
    let paragraph = buffer.join(" ");
    let paragraph = paragraph.trim();
    if !paragraph.is_empty() {
        bloques.push(Block::Paragraph {
            inlines: vec![Inline::text(paragraph)],
        });
    }
    buffer.clear();
}

/// Heading anchor: accents folded, lower-cased, runs of anything that is
/// not a letter or digit collapsed to `-`.
pub fn slugify(s: &str) -> String {
    let mut slug = String::with_capacity(s.len());
    let mut pending_dash = false;

    for c in s.chars().map(fold_accent).flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        "section".to_string()
    } else {
        slug
    }
}

/// Strip the diacritic from Latin letters. Other characters pass through.
fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => 'a',
        'Á' | 'À' | 'Â' | 'Ä' | 'Ã' | 'Å' => 'A',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
        'Ó' | 'Ò' | 'Ô' | 'Ö' | 'Õ' => 'O',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'ñ' => 'n',
        'Ñ' => 'N',
        'ç' => 'c',
        'Ç' => 'C',
        'ý' | 'ÿ' => 'y',
        'Ý' => 'Y',
        'º' => 'o',
        'ª' => 'a',
        other => other,
    }
}
