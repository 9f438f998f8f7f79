use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use unbait_logging::unbait_debug;

use crate::LoadedPage;

/// Maximum number of characters of visible text used by the fallback extraction.
pub const FALLBACK_TEXT_LIMIT: usize = 50_000;

const UNKNOWN_TITLE: &str = "Unknown Title";

/// Never visible to a reader.
const HIDDEN_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "head", "svg", "iframe", "object",
];

/// Page chrome dropped from the main-content candidate.
const CHROME_TAGS: &[&str] = &["nav", "aside", "footer", "header", "form", "button"];

const BLOCK_TAGS: &[&str] = &[
    "p", "div", "section", "article", "main", "header", "footer", "nav", "aside", "figure",
    "figcaption", "table", "tr", "td", "th", "blockquote", "address", "ul", "ol", "li", "pre",
    "h1", "h2", "h3", "h4", "h5", "h6", "br", "hr", "dl", "dt", "dd",
];

/// Simplified readable representation of a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    pub title: String,
    pub content: String,
    pub url: String,
}

impl ExtractedContent {
    pub fn is_usable(&self) -> bool {
        !self.title.trim().is_empty() && !self.content.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("document has no title")]
    NoTitle,
    #[error("no main content found")]
    NoMainContent,
}

pub trait ContentExtractor: Send + Sync {
    fn extract(&self, page: &LoadedPage) -> Result<ExtractedContent, ExtractError>;
}

/// Readability-style extractor:
/// - title from `<title>`, then `og:title`, then the first `<h1>`
/// - content from the first `<article>`, `<main>` or `[role=main]`, minus page chrome
#[derive(Debug, Default, Clone, Copy)]
pub struct ReadabilityExtractor;

impl ContentExtractor for ReadabilityExtractor {
    fn extract(&self, page: &LoadedPage) -> Result<ExtractedContent, ExtractError> {
        let doc = Html::parse_document(&page.html);
        let title = document_title(&doc)
            .or_else(|| meta_title(&doc))
            .or_else(|| first_text(&doc, "h1"))
            .ok_or(ExtractError::NoTitle)?;

        let content = ["article", "main", "[role=main]"]
            .iter()
            .filter_map(|css| Selector::parse(css).ok())
            .find_map(|sel| doc.select(&sel).next())
            .map(|node| visible_text(node, &[HIDDEN_TAGS, CHROME_TAGS].concat()))
            .filter(|text| !text.is_empty())
            .ok_or(ExtractError::NoMainContent)?;

        Ok(ExtractedContent {
            title,
            content,
            url: page.url.clone(),
        })
    }
}

/// Page title plus the leading visible text of `<body>`.
pub fn fallback_extraction(page: &LoadedPage) -> ExtractedContent {
    let doc = Html::parse_document(&page.html);
    let title = document_title(&doc).unwrap_or_else(|| UNKNOWN_TITLE.to_string());
    let body = Selector::parse("body")
        .ok()
        .and_then(|sel| doc.select(&sel).next())
        .map(|body| visible_text(body, HIDDEN_TAGS))
        .unwrap_or_default();

    ExtractedContent {
        title,
        content: body.chars().take(FALLBACK_TEXT_LIMIT).collect(),
        url: page.url.clone(),
    }
}

/// Run `extractor`, degrading to [`fallback_extraction`] on failure or empty output.
pub fn extract_or_fallback(extractor: &dyn ContentExtractor, page: &LoadedPage) -> ExtractedContent {
    match extractor.extract(page) {
        Ok(content) if content.is_usable() => content,
        Ok(_) => {
            unbait_debug!("Extractor returned empty content for {}; using fallback", page.url);
            fallback_extraction(page)
        }
        Err(err) => {
            unbait_debug!("Extractor failed for {}: {}; using fallback", page.url, err);
            fallback_extraction(page)
        }
    }
}

fn document_title(doc: &Html) -> Option<String> {
    first_text(doc, "title")
}

fn meta_title(doc: &Html) -> Option<String> {
    let sel = Selector::parse(r#"meta[property="og:title"]"#).ok()?;
    doc.select(&sel)
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .map(|content| collapse_whitespace(content))
        .filter(|title| !title.is_empty())
}

fn first_text(doc: &Html, css: &str) -> Option<String> {
    let sel = Selector::parse(css).ok()?;
    doc.select(&sel)
        .next()
        .map(|node| collapse_whitespace(&node.text().collect::<String>()))
        .filter(|text| !text.is_empty())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Approximates `innerText`: skips hidden subtrees, breaks lines at block elements.
fn visible_text(root: ElementRef, skip: &[&str]) -> String {
    let mut raw = String::new();
    for child in root.children() {
        collect_text(child, skip, &mut raw);
    }
    raw.lines()
        .map(collapse_whitespace)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_text(node: NodeRef<'_, Node>, skip: &[&str], out: &mut String) {
    match node.value() {
        Node::Text(text) => {
            // Source newlines are layout whitespace, not line breaks.
            out.push_str(&text.replace('\n', " "));
        }
        Node::Element(element) => {
            let tag = element.name().to_ascii_lowercase();
            if skip.contains(&tag.as_str()) {
                return;
            }
            let is_block = BLOCK_TAGS.contains(&tag.as_str());
            if is_block {
                out.push('\n');
            }
            for child in node.children() {
                collect_text(child, skip, out);
            }
            if is_block {
                out.push('\n');
            }
        }
        _ => {
            for child in node.children() {
                collect_text(child, skip, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn page(html: &str) -> LoadedPage {
        LoadedPage {
            url: "https://example.com/story".to_string(),
            status: 200,
            html: html.to_string(),
        }
    }

    #[test]
    fn visible_text_skips_scripts_and_breaks_blocks() {
        let html = "<html><body><p>One  two</p><script>var x = 1;</script><div>Three\nfour</div></body></html>";
        let extracted = fallback_extraction(&page(html));
        assert_eq!(extracted.content, "One two\nThree four");
        assert_eq!(extracted.title, UNKNOWN_TITLE);
    }

    #[test]
    fn og_title_used_when_title_tag_missing() {
        let html = r#"<html><head><meta property="og:title" content=" Big   News "></head>
            <body><article><p>Body</p></article></body></html>"#;
        let extracted = ReadabilityExtractor.extract(&page(html)).unwrap();
        assert_eq!(extracted.title, "Big News");
    }

    #[test]
    fn article_chrome_is_dropped() {
        let html = r#"<html><head><title>T</title></head><body>
            <article><nav>Home | About</nav><p>Actual text</p><footer>Share</footer></article>
            </body></html>"#;
        let extracted = ReadabilityExtractor.extract(&page(html)).unwrap();
        assert_eq!(extracted.content, "Actual text");
    }

    #[test]
    fn fallback_truncates_by_characters() {
        let body = "é".repeat(FALLBACK_TEXT_LIMIT + 10);
        let html = format!("<html><body><p>{body}</p></body></html>");
        let extracted = fallback_extraction(&page(&html));
        assert_eq!(extracted.content.chars().count(), FALLBACK_TEXT_LIMIT);
    }
}
