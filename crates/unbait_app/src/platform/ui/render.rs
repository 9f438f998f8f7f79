use std::borrow::Cow;
use std::fmt::Write as _;

use unbait_core::{PageViewModel, PopupBody, PopupView, Size, Span, DISMISS_CONTROL_SIZE, LOADING_LABEL};

use super::constants::*;

struct Word<'a> {
    text: Cow<'a, str>,
    bold: bool,
}

/// Page and model text with control characters spelled out, so only our own
/// styling sequences ever reach the terminal.
fn printable(text: &str) -> Cow<'_, str> {
    if !text.chars().any(char::is_control) {
        return Cow::Borrowed(text);
    }
    let mut clean = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_control() {
            clean.extend(c.escape_default());
        } else {
            clean.push(c);
        }
    }
    Cow::Owned(clean)
}

/// Draw every popup as a boxed block of text.
pub fn render(view: &PageViewModel, styled: bool) -> String {
    let mut out = String::new();
    for popup in &view.popups {
        render_popup(&mut out, popup, styled);
    }
    if view.canceled_pending > 0 {
        let _ = writeln!(out, "({} canceled, awaiting result)", view.canceled_pending);
    }
    out
}

fn render_popup(out: &mut String, popup: &PopupView, styled: bool) {
    let control = if popup.dismissable { " [x]" } else { "" };
    let _ = writeln!(
        out,
        "+-- {} @ ({}, {}){}",
        printable(&popup.url),
        popup.position.x, popup.position.y, control
    );
    for line in body_lines(&popup.body, styled) {
        let _ = writeln!(out, "| {line}");
    }
    let _ = writeln!(out, "+--");
}

/// Box size of a popup body in page pixels, as a DOM host would report it.
pub fn measure(body: &PopupBody) -> Size {
    let lines = body_lines(body, false);
    let columns = lines
        .iter()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0) as i32;
    let control = match body {
        PopupBody::Loading => DISMISS_CONTROL_SIZE,
        _ => 0,
    };
    Size {
        width: columns * CHAR_WIDTH + 2 * POPUP_PADDING + control,
        height: (lines.len().max(1) as i32) * LINE_HEIGHT + 2 * POPUP_PADDING,
    }
}

fn body_lines(body: &PopupBody, styled: bool) -> Vec<String> {
    match body {
        PopupBody::Loading => vec![format!("{SPINNER} {LOADING_LABEL}")],
        PopupBody::Result(spans) => wrap(&words(spans), styled),
        PopupBody::Error(message) => wrap(
            &message
                .split_whitespace()
                .map(|text| Word {
                    text: printable(text),
                    bold: false,
                })
                .collect::<Vec<_>>(),
            styled,
        ),
    }
}

fn words(spans: &[Span]) -> Vec<Word<'_>> {
    spans
        .iter()
        .flat_map(|span| {
            let bold = matches!(span, Span::Emphasis(_));
            span.text()
                .split_whitespace()
                .map(move |text| Word {
                    text: printable(text),
                    bold,
                })
        })
        .collect()
}

/// Greedy word wrap at [`WRAP_COLUMNS`]; over-long words get a line of their own.
fn wrap(words: &[Word<'_>], styled: bool) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut width = 0;

    for word in words {
        let len = word.text.chars().count();
        if width > 0 && width + 1 + len > WRAP_COLUMNS {
            lines.push(std::mem::take(&mut line));
            width = 0;
        }
        if width > 0 {
            line.push(' ');
            width += 1;
        }
        if styled && word.bold {
            line.push_str(BOLD_ON);
            line.push_str(&word.text);
            line.push_str(BOLD_OFF);
        } else {
            line.push_str(&word.text);
        }
        width += len;
    }
    if width > 0 {
        lines.push(line);
    }
    lines
}
