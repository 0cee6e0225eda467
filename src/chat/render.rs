//! Terminal rendering for the chat application.
//!
//! Streamed responses are written a line at a time: a completed line never
//! changes its formatting as more text arrives, so it can be printed as soon
//! as its newline shows up.  Bold spans use ANSI bold and the bibliography
//! region is dimmed.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::format::{Formatted, Span};
use crate::view::{ChatView, ExchangeView};

/// ANSI escape code for bold text.
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code for dim text (used for the bibliography).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code that clears the current line.
const ANSI_CLEAR_LINE: &str = "\x1b[2K";

/// Render formatted text for a terminal.
///
/// Styling is opened and closed around every line segment, so the rendering
/// of a text is a prefix of the rendering of any text that extends it by
/// whole lines.
pub fn render_ansi(formatted: &Formatted, use_color: bool) -> String {
    let mut out = String::new();
    push_spans(&mut out, formatted.body(), false, use_color);
    if let Some(mini) = formatted.mini() {
        push_spans(&mut out, mini, true, use_color);
    }
    out
}

fn push_spans(out: &mut String, spans: &[Span], dim: bool, use_color: bool) {
    for span in spans {
        let bold = matches!(span, Span::Bold(_));
        for (i, segment) in span.as_str().split('\n').enumerate() {
            if i > 0 {
                out.push('\n');
            }
            if segment.is_empty() {
                continue;
            }
            if use_color && (bold || dim) {
                if bold {
                    out.push_str(ANSI_BOLD);
                }
                if dim {
                    out.push_str(ANSI_DIM);
                }
                out.push_str(segment);
                out.push_str(ANSI_RESET);
            } else {
                out.push_str(segment);
            }
        }
    }
}

/// Chat view that writes to stdout.
///
/// User input is not echoed; the line editor already shows it next to the
/// user label.
pub struct TerminalView {
    use_color: bool,
    shown: AtomicBool,
}

impl TerminalView {
    /// Creates a new TerminalView with the given color setting.
    pub fn new(use_color: bool) -> Self {
        Self {
            use_color,
            shown: AtomicBool::new(false),
        }
    }
}

impl ChatView for TerminalView {
    fn show_chat(&self) {
        if !self.shown.swap(true, Ordering::Relaxed) {
            println!();
        }
    }

    fn create_exchange(&self) -> Box<dyn ExchangeView> {
        Box::new(TerminalExchange::new(io::stdout(), self.use_color))
    }
}

/// The bot half of one exchange on a terminal.
struct TerminalExchange<W: Write + Send> {
    out: W,
    use_color: bool,
    label: String,
    indicator: String,
    pending_shown: bool,
    rendered: String,
    printed: usize,
}

impl<W: Write + Send> TerminalExchange<W> {
    fn new(out: W, use_color: bool) -> Self {
        Self {
            out,
            use_color,
            label: String::new(),
            indicator: String::new(),
            pending_shown: false,
            rendered: String::new(),
            printed: 0,
        }
    }

    /// Take the pending indicator back off the screen.
    fn clear_pending(&mut self) {
        if !self.pending_shown {
            return;
        }
        self.pending_shown = false;
        if self.use_color {
            let _ = write!(self.out, "\r{ANSI_CLEAR_LINE}{}", self.label);
        } else {
            let width = self.indicator.chars().count();
            let back = "\x08".repeat(width);
            let _ = write!(self.out, "{back}{}{back}", " ".repeat(width));
        }
    }

    fn flush(&mut self) {
        let _ = self.out.flush();
    }
}

impl<W: Write + Send> ExchangeView for TerminalExchange<W> {
    fn user_message(&mut self, _: &str, _: &str) {}

    fn bot_pending(&mut self, label: &str, indicator: &str) {
        self.label = label.to_string();
        self.indicator = indicator.to_string();
        self.pending_shown = true;
        let _ = write!(self.out, "{label}{indicator}");
        self.flush();
    }

    fn bot_update(&mut self, formatted: &Formatted) {
        self.rendered = render_ansi(formatted, self.use_color);
        let complete = self.rendered.rfind('\n').map_or(0, |idx| idx + 1);
        if complete > self.printed {
            self.clear_pending();
            let _ = self.out.write_all(self.rendered[self.printed..complete].as_bytes());
            self.printed = complete;
            self.flush();
        }
    }

    fn bot_text(&mut self, text: &str) {
        if self.printed == 0 {
            self.clear_pending();
            self.rendered = text.to_string();
        }
    }

    fn finish(&mut self) {
        self.clear_pending();
        let _ = self.out.write_all(self.rendered[self.printed..].as_bytes());
        self.printed = self.rendered.len();
        let _ = writeln!(self.out);
        self.flush();
    }
}
