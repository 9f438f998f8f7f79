//! Minimal inline formatting for answers.
//!
//! Only the `**text**` convention is recognised. Everything else is literal
//! text; nothing in the input is ever interpreted as markup.

const MARKER: &str = "**";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    Text(String),
    Emphasis(String),
}

impl Span {
    pub fn text(&self) -> &str {
        match self {
            Span::Text(text) | Span::Emphasis(text) => text,
        }
    }
}

/// Split `text` into literal and emphasized runs.
///
/// A marker pair matches the nearest closing `**` on the same line; an
/// unmatched marker stays in the output verbatim.
pub fn parse_emphasis(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut literal_start = 0;
    let mut search_from = 0;

    while let Some(found) = text[search_from..].find(MARKER) {
        let open = search_from + found;
        let inner_start = open + MARKER.len();
        let line_end = text[inner_start..]
            .find('\n')
            .map_or(text.len(), |idx| inner_start + idx);

        match text[inner_start..line_end].find(MARKER) {
            Some(close_rel) => {
                let close = inner_start + close_rel;
                if open > literal_start {
                    spans.push(Span::Text(text[literal_start..open].to_string()));
                }
                spans.push(Span::Emphasis(text[inner_start..close].to_string()));
                literal_start = close + MARKER.len();
                search_from = literal_start;
            }
            // Markers are ASCII, so `open + 1` is a char boundary.
            None => search_from = open + 1,
        }
    }

    if literal_start < text.len() {
        spans.push(Span::Text(text[literal_start..].to_string()));
    }
    spans
}

/// Escape text for safe insertion into an HTML document.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Render spans as HTML: emphasis becomes `<strong>`, all text is escaped.
pub fn render_html(spans: &[Span]) -> String {
    spans
        .iter()
        .map(|span| match span {
            Span::Text(text) => escape_html(text),
            Span::Emphasis(text) => format!("<strong>{}</strong>", escape_html(text)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bold_markers_become_emphasis() {
        let spans = parse_emphasis("The answer is **no**, sadly.");
        assert_eq!(
            spans,
            vec![
                Span::Text("The answer is ".into()),
                Span::Emphasis("no".into()),
                Span::Text(", sadly.".into()),
            ]
        );
        assert_eq!(
            render_html(&spans),
            "The answer is <strong>no</strong>, sadly."
        );
    }

    #[test]
    fn script_tags_render_as_literal_text() {
        let html = render_html(&parse_emphasis("<script>alert(1)</script>"));
        assert_eq!(html, "&lt;script&gt;alert(1)&lt;/script&gt;");
        assert!(!html.contains('<'));
    }

    #[test]
    fn markup_inside_emphasis_is_escaped() {
        let html = render_html(&parse_emphasis("**<b>x</b>**"));
        assert_eq!(html, "<strong>&lt;b&gt;x&lt;/b&gt;</strong>");
    }

    #[test]
    fn unmatched_marker_stays_literal() {
        assert_eq!(
            parse_emphasis("5 ** 2 is 25"),
            vec![Span::Text("5 ** 2 is 25".into())]
        );
    }

    #[test]
    fn emphasis_does_not_span_lines() {
        assert_eq!(
            parse_emphasis("**a\nb**"),
            vec![Span::Text("**a\nb**".into())]
        );
    }

    #[test]
    fn multiple_runs_are_matched_lazily() {
        assert_eq!(
            parse_emphasis("**a** and **b**"),
            vec![
                Span::Emphasis("a".into()),
                Span::Text(" and ".into()),
                Span::Emphasis("b".into()),
            ]
        );
    }

    #[test]
    fn extra_leading_star_belongs_to_emphasis() {
        assert_eq!(parse_emphasis("***a**"), vec![Span::Emphasis("*a".into())]);
    }

    #[test]
    fn empty_input_yields_no_spans() {
        assert!(parse_emphasis("").is_empty());
    }
}
