//! Presentation transforms for streamed response text.
//!
//! Responses use two bits of markup: `**bold**` pairs, and a bold
//! `**Bibliografia**` heading after which the references follow.  The whole
//! accumulated response is re-parsed on every update, so the transforms never
//! see their own output and re-rendering cannot double-wrap anything.

use std::fmt::Write as _;

/// Heading that introduces the reference list.
pub const BIBLIOGRAPHY_MARKER: &str = "bibliografia";

/// CSS class of the region that holds the reference list.
pub const MINI_OUTPUT_CLASS: &str = "outputMini";

/// A run of response text with uniform styling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    /// Unstyled text.
    Text(String),

    /// Text that was delimited by `**`.
    Bold(String),
}

impl Span {
    /// The text of the span without delimiters.
    pub fn as_str(&self) -> &str {
        match self {
            Span::Text(s) | Span::Bold(s) => s,
        }
    }

    fn is_marker(&self) -> bool {
        matches!(self, Span::Bold(s) if s.trim().eq_ignore_ascii_case(BIBLIOGRAPHY_MARKER))
    }
}

/// Characters a bold pair never spans.
const LINE_TERMINATORS: [char; 4] = ['\n', '\r', '\u{2028}', '\u{2029}'];

/// Split `text` into plain and bold spans.
///
/// Pairs are matched left to right, shortest first, and never across a line
/// break; an unmatched `**` stays literal text.  `****` is an empty bold span.
pub fn parse_spans(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut plain = String::new();
    let mut rest = text;

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("**") {
            let line_end = after.find(LINE_TERMINATORS).unwrap_or(after.len());
            if let Some(close) = after[..line_end].find("**") {
                if !plain.is_empty() {
                    spans.push(Span::Text(std::mem::take(&mut plain)));
                }
                spans.push(Span::Bold(after[..close].to_string()));
                rest = &after[close + 2..];
                continue;
            }
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            plain.push(c);
        }
        rest = chars.as_str();
    }

    if !plain.is_empty() {
        spans.push(Span::Text(plain));
    }
    spans
}

/// Response text split into the main body and the optional reference list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Formatted {
    body: Vec<Span>,
    mini: Option<Vec<Span>>,
}

impl Formatted {
    /// Format accumulated response text.
    ///
    /// The first bold span reading `bibliografia` (any case, surrounding
    /// whitespace ignored) stays in the body; everything after it goes to the
    /// mini output region.
    pub fn parse(text: &str) -> Self {
        let mut body = parse_spans(text);
        let mini = body
            .iter()
            .position(Span::is_marker)
            .map(|idx| body.split_off(idx + 1));
        Self { body, mini }
    }

    /// Spans up to and including the bibliography marker.
    pub fn body(&self) -> &[Span] {
        &self.body
    }

    /// Spans after the bibliography marker, if there was one.
    pub fn mini(&self) -> Option<&[Span]> {
        self.mini.as_deref()
    }

    /// True if the text contained the bibliography marker.
    pub fn has_bibliography(&self) -> bool {
        self.mini.is_some()
    }

    /// The text with all markup removed.
    pub fn plain_text(&self) -> String {
        self.body
            .iter()
            .chain(self.mini.iter().flatten())
            .map(Span::as_str)
            .collect()
    }

    /// Render as HTML for insertion into the bot message container.
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        push_spans_html(&mut html, &self.body);
        if let Some(mini) = &self.mini {
            let _ = write!(html, "<span class=\"{MINI_OUTPUT_CLASS}\">");
            push_spans_html(&mut html, mini);
            html.push_str("</span>");
        }
        html
    }
}

fn push_spans_html(html: &mut String, spans: &[Span]) {
    for span in spans {
        match span {
            Span::Text(s) => html.push_str(&escape_html(s)),
            Span::Bold(s) => {
                html.push_str("<strong>");
                html.push_str(&escape_html(s));
                html.push_str("</strong>");
            }
        }
    }
}

/// Escape text for use as HTML element content.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bold_stops_at_any_line_terminator() {
        for sep in ["\r", "\u{2028}", "\u{2029}"] {
            let text = format!("**a{sep}b**");
            assert_eq!(parse_spans(&text), vec![Span::Text(text.clone())]);
        }
        assert_eq!(
            parse_spans("**a\r**b**"),
            vec![Span::Text("**a\r".to_string()), Span::Bold("b".to_string())]
        );
    }

    #[test]
    fn bold_pairs() {
        assert_eq!(
            parse_spans("Hello **world**!"),
            vec![
                Span::Text("Hello ".to_string()),
                Span::Bold("world".to_string()),
                Span::Text("!".to_string()),
            ]
        );
    }

    #[test]
    fn shortest_pair_wins() {
        assert_eq!(
            parse_spans("**a** and **b**"),
            vec![
                Span::Bold("a".to_string()),
                Span::Text(" and ".to_string()),
                Span::Bold("b".to_string()),
            ]
        );
        assert_eq!(parse_spans("***a**"), vec![Span::Bold("*a".to_string())]);
        assert_eq!(parse_spans("****"), vec![Span::Bold(String::new())]);
    }

    #[test]
    fn unmatched_delimiters_stay_literal() {
        assert_eq!(
            parse_spans("**incomplete"),
            vec![Span::Text("**incomplete".to_string())]
        );
        assert_eq!(
            parse_spans("**a\nb**"),
            vec![Span::Text("**a\nb**".to_string())]
        );
    }

    #[test]
    fn html_escapes_before_markup() {
        let formatted = Formatted::parse("1 < 2 **& more**");
        assert_eq!(formatted.to_html(), "1 &lt; 2 <strong>&amp; more</strong>");
    }

    #[test]
    fn bibliography_wraps_trailing_text() {
        let formatted = Formatted::parse("Risposta.\n**BIBLIOGRAFIA**\n- Rossi, 2020");
        assert!(formatted.has_bibliography());
        assert_eq!(
            formatted.to_html(),
            "Risposta.\n<strong>BIBLIOGRAFIA</strong><span class=\"outputMini\">\n- Rossi, 2020</span>"
        );
    }

    #[test]
    fn bibliography_marker_tolerates_whitespace() {
        let formatted = Formatted::parse("x ** Bibliografia ** y");
        assert_eq!(formatted.mini(), Some(&[Span::Text(" y".to_string())][..]));
    }

    #[test]
    fn only_first_marker_splits() {
        let formatted = Formatted::parse("**bibliografia** a **bibliografia** b");
        assert_eq!(formatted.body().len(), 1);
        assert_eq!(formatted.mini().map(<[Span]>::len), Some(3));
    }

    #[test]
    fn marker_at_end_wraps_empty_region() {
        let formatted = Formatted::parse("Fonti: **Bibliografia**");
        assert_eq!(
            formatted.to_html(),
            "Fonti: <strong>Bibliografia</strong><span class=\"outputMini\"></span>"
        );
    }

    #[test]
    fn plain_word_is_not_a_marker() {
        let formatted = Formatted::parse("vedi bibliografia sotto");
        assert!(!formatted.has_bibliography());
    }

    #[test]
    fn reparsing_is_stable() {
        let text = "Hel";
        let longer = "Hello **world**";
        assert_eq!(Formatted::parse(text).to_html(), "Hel");
        assert_eq!(
            Formatted::parse(longer).to_html(),
            Formatted::parse(longer).to_html()
        );
        assert_eq!(Formatted::parse(longer).plain_text(), "Hello world");
    }
}
