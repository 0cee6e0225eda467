//! Render targets for a chat session.
//!
//! A [`ChatView`] is the page the widget lives in: an intro panel, a chat
//! panel, and one message container per exchange.  Each container is driven
//! through its own [`ExchangeView`], so concurrent exchanges never share
//! render state.
//!
//! [`HtmlTranscript`] keeps the page as markup in memory, reproducing the
//! structure the widget's stylesheet expects.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::format::{Formatted, escape_html};

/// The page hosting the chat.
pub trait ChatView: Send + Sync {
    /// Hide the intro panel and reveal the chat panel.  Called on every
    /// submission; only the first call has any effect.
    fn show_chat(&self);

    /// Append a new, empty message container for one exchange.
    fn create_exchange(&self) -> Box<dyn ExchangeView>;
}

/// The message container of a single exchange.
pub trait ExchangeView: Send {
    /// Render the submitted text.
    fn user_message(&mut self, label: &str, text: &str);

    /// Render the bot label with a placeholder while the response is pending.
    fn bot_pending(&mut self, label: &str, indicator: &str);

    /// Replace the bot message with the formatted response so far.
    fn bot_update(&mut self, formatted: &Formatted);

    /// Replace the bot message with plain text.
    fn bot_text(&mut self, text: &str);

    /// Called once the exchange reached a terminal state.
    fn finish(&mut self) {}
}

/// One message container of an [`HtmlTranscript`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageContainer {
    /// Label of the user message.
    pub user_label: String,
    /// Escaped user text.
    pub user_html: String,
    /// Label of the bot message.
    pub bot_label: String,
    /// Inner HTML of the bot message.
    pub bot_html: String,
}

impl MessageContainer {
    /// Render the container as it appears inside the chat panel.
    pub fn to_html(&self) -> String {
        format!(
            "<div class=\"chatMessages\">\
             <div class=\"userMsg\"><p class=\"label\">{}</p><p class=\"input\">{}</p></div>\
             <div class=\"botMsg\"><p class=\"label\">{}</p><p class=\"input\">{}</p></div>\
             </div>",
            escape_html(&self.user_label),
            self.user_html,
            escape_html(&self.bot_label),
            self.bot_html,
        )
    }
}

#[derive(Debug)]
struct TranscriptState {
    chat_shown: bool,
    containers: Vec<MessageContainer>,
}

/// In-memory page: intro panel, chat panel, and the exchange containers.
#[derive(Clone, Debug)]
pub struct HtmlTranscript {
    state: Arc<Mutex<TranscriptState>>,
}

impl HtmlTranscript {
    /// A page with the intro showing and the chat hidden.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(TranscriptState {
                chat_shown: false,
                containers: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TranscriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// True once the first message has been submitted.
    pub fn chat_shown(&self) -> bool {
        self.lock().chat_shown
    }

    /// Number of exchange containers.
    pub fn len(&self) -> usize {
        self.lock().containers.len()
    }

    /// True if no exchange has been started.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A snapshot of the container at `index`.
    pub fn container(&self, index: usize) -> Option<MessageContainer> {
        self.lock().containers.get(index).cloned()
    }

    /// Render both panels.
    pub fn to_html(&self) -> String {
        let state = self.lock();
        let (intro, chat) = if state.chat_shown {
            ("none", "block")
        } else {
            ("block", "none")
        };
        let mut html = format!(
            "<div class=\"intro\" style=\"display: {intro}\"></div><div class=\"chat\" style=\"display: {chat}\">"
        );
        for container in &state.containers {
            html.push_str(&container.to_html());
        }
        html.push_str("</div>");
        html
    }
}

impl Default for HtmlTranscript {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatView for HtmlTranscript {
    fn show_chat(&self) {
        self.lock().chat_shown = true;
    }

    fn create_exchange(&self) -> Box<dyn ExchangeView> {
        let mut state = self.lock();
        state.containers.push(MessageContainer::default());
        Box::new(HtmlExchange {
            transcript: self.clone(),
            index: state.containers.len() - 1,
        })
    }
}

struct HtmlExchange {
    transcript: HtmlTranscript,
    index: usize,
}

impl HtmlExchange {
    fn with_container(&self, f: impl FnOnce(&mut MessageContainer)) {
        let mut state = self.transcript.lock();
        if let Some(container) = state.containers.get_mut(self.index) {
            f(container);
        }
    }
}

impl ExchangeView for HtmlExchange {
    fn user_message(&mut self, label: &str, text: &str) {
        self.with_container(|c| {
            c.user_label = label.to_string();
            c.user_html = escape_html(text);
        });
    }

    fn bot_pending(&mut self, label: &str, indicator: &str) {
        self.with_container(|c| {
            c.bot_label = label.to_string();
            c.bot_html = escape_html(indicator);
        });
    }

    fn bot_update(&mut self, formatted: &Formatted) {
        let html = formatted.to_html();
        self.with_container(|c| c.bot_html = html);
    }

    fn bot_text(&mut self, text: &str) {
        self.with_container(|c| c.bot_html = escape_html(text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_intro_visible() {
        let page = HtmlTranscript::new();
        assert!(!page.chat_shown());
        assert!(page.is_empty());
        assert_eq!(
            page.to_html(),
            "<div class=\"intro\" style=\"display: block\"></div><div class=\"chat\" style=\"display: none\"></div>"
        );
    }

    #[test]
    fn containers_are_independent() {
        let page = HtmlTranscript::new();
        page.show_chat();
        let mut first = page.create_exchange();
        let mut second = page.create_exchange();
        first.user_message("tu: ", "<b>uno</b>");
        second.user_message("tu: ", "due");
        first.bot_pending("Climino: ", "...");
        second.bot_text("Errore di rete.");
        first.bot_update(&Formatted::parse("**ok**"));

        assert!(page.chat_shown());
        assert_eq!(page.len(), 2);
        let first = page.container(0).unwrap();
        assert_eq!(first.user_html, "&lt;b&gt;uno&lt;/b&gt;");
        assert_eq!(first.bot_html, "<strong>ok</strong>");
        assert_eq!(page.container(1).unwrap().bot_html, "Errore di rete.");
    }

    #[test]
    fn container_markup() {
        let container = MessageContainer {
            user_label: "tu: ".to_string(),
            user_html: "ciao".to_string(),
            bot_label: "Climino: ".to_string(),
            bot_html: "...".to_string(),
        };
        assert_eq!(
            container.to_html(),
            "<div class=\"chatMessages\">\
             <div class=\"userMsg\"><p class=\"label\">tu: </p><p class=\"input\">ciao</p></div>\
             <div class=\"botMsg\"><p class=\"label\">Climino: </p><p class=\"input\">...</p></div>\
             </div>"
        );
    }
}
