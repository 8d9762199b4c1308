//! A general-purpose strategy for saved HTML pages: one document per page.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use scraper::{Html, Selector};

use super::extract::{ExtractError, ExtractionStrategy, MarkdownWriter, SourcePage};

/// Takes the first `<h1>` (or `<title>`) as the title and every `<p>` as a
/// paragraph. The id and page come from `id=<N>` / `pagina=<P>` in the
/// saved file name, e.g. `rollo.php-id=12&pagina=3.htm`.
pub struct PlainHtmlStrategy;

impl PlainHtmlStrategy {
    pub const NAME: &'static str = "plain-html";
}

impl ExtractionStrategy for PlainHtmlStrategy {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn matches(&self, _rel_path: &Path) -> bool {
        true
    }

    fn extract(
        &self,
        page: &SourcePage,
        writer: &mut MarkdownWriter,
    ) -> Result<usize, ExtractError> {
        if looks_like_server_error(&page.html) {
            return Err(self.fail("page is a saved server error"));
        }

        let document = Html::parse_document(&page.html);
        let title = first_text(&document, "h1").or_else(|| first_text(&document, "title"));
        let paragraphs = all_texts(&document, "p");

        let Some(title) = title.or_else(|| (!paragraphs.is_empty()).then(String::new)) else {
            return Err(self.fail("no title or paragraphs"));
        };

        let mut markdown = String::new();
        if !title.is_empty() {
            markdown.push_str(&format!("# {}\n", title));
        }
        for p in &paragraphs {
            markdown.push('\n');
            markdown.push_str(p);
            markdown.push('\n');
        }

        let (id, page_no) = source_tokens(&page.rel_path);
        Ok(usize::from(writer.queue(id, page_no, &title, &markdown)))
    }
}

impl PlainHtmlStrategy {
    fn fail(&self, message: &str) -> ExtractError {
        ExtractError::Strategy {
            strategy: Self::NAME,
            message: message.to_string(),
        }
    }
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn first_text(document: &Html, css: &str) -> Option<String> {
    let selector = selector(css)?;
    document
        .select(&selector)
        .map(|el| collapse(&el.text().collect::<String>()))
        .find(|text| !text.is_empty())
}

fn all_texts(document: &Html, css: &str) -> Vec<String> {
    let Some(selector) = selector(css) else {
        return Vec::new();
    };
    document
        .select(&selector)
        .map(|el| collapse(&el.text().collect::<String>()))
        .filter(|text| !text.is_empty())
        .collect()
}

fn looks_like_server_error(html: &str) -> bool {
    collapse(html)
        .to_lowercase()
        .contains("error al conectar al servidor")
}

/// `id=<N>` and `pagina=<P>` from the base name of a saved page.
fn source_tokens(rel_path: &str) -> (Option<u64>, Option<u64>) {
    static ID_RE: OnceLock<Regex> = OnceLock::new();
    static PAGE_RE: OnceLock<Regex> = OnceLock::new();
    let id_re = ID_RE.get_or_init(|| Regex::new(r"(?i)\bid=([0-9]+)").unwrap());
    let page_re = PAGE_RE.get_or_init(|| Regex::new(r"(?i)\bpagina=([0-9]+)").unwrap());

    let base = rel_path.rsplit('/').next().unwrap_or(rel_path);
    let capture = |re: &Regex| {
        re.captures(base)
            .and_then(|c| c[1].parse::<u64>().ok())
    };
    (capture(id_re), capture(page_re))
}
