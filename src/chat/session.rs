//! Core chat session management.
//!
//! This module provides the [`ChatSession`] struct, which owns the
//! conversation history and the page it renders into, and turns submissions
//! into independent [`Exchange`]s.

use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;

use crate::chat::config::ChatConfig;
use crate::chat::exchange::{Exchange, ExchangeOutcome, lock_history};
use crate::client::StreamTransport;
use crate::observability::{EXCHANGES_REJECTED, EXCHANGES_SUBMITTED};
use crate::types::{History, StreamRequest, Turn};
use crate::view::ChatView;

/// A chat session: one page, one history, any number of exchanges.
pub struct ChatSession<T: StreamTransport> {
    transport: Arc<T>,
    config: Arc<ChatConfig>,
    view: Arc<dyn ChatView>,
    history: Arc<Mutex<History>>,
}

impl<T: StreamTransport> ChatSession<T> {
    /// Creates a new chat session rendering into `view`.
    pub fn new(transport: T, config: ChatConfig, view: Arc<dyn ChatView>) -> Self {
        Self {
            transport: Arc::new(transport),
            config: Arc::new(config),
            view,
            history: Arc::new(Mutex::new(History::new())),
        }
    }

    /// The configuration this session runs with.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// A snapshot of the conversation history.
    pub fn history(&self) -> History {
        lock_history(&self.history).clone()
    }

    /// Returns the number of turns in the conversation.
    pub fn turn_count(&self) -> usize {
        lock_history(&self.history).len()
    }

    /// Accept a line of user input.
    ///
    /// Whitespace-only input is ignored and yields `None`.  Otherwise the
    /// chat panel is revealed, a new message container shows the text and a
    /// pending indicator, the user turn is recorded, and the returned
    /// exchange is ready to send the request.  The request context is the
    /// recent history *before* this turn.
    pub fn submit(&self, text: &str) -> Option<Exchange<T>> {
        let text = text.trim();
        if text.is_empty() {
            EXCHANGES_REJECTED.click();
            return None;
        }
        EXCHANGES_SUBMITTED.click();

        self.view.show_chat();
        let mut exchange_view = self.view.create_exchange();
        exchange_view.user_message(&self.config.user_label, text);

        let context = {
            let mut history = lock_history(&self.history);
            let context = history.context(self.config.context_turns);
            history.push(Turn::user(text));
            context
        };

        exchange_view.bot_pending(&self.config.bot_label, &self.config.pending_indicator);
        let request = StreamRequest::new(self.config.integration_id.clone(), text, context);
        Some(Exchange::new(
            Arc::clone(&self.transport),
            Arc::clone(&self.config),
            Arc::clone(&self.history),
            exchange_view,
            request,
        ))
    }

    /// Submit `text` and wait for the exchange to finish.
    pub async fn send(&self, text: &str) -> Option<ExchangeOutcome> {
        let exchange = self.submit(text)?;
        Some(exchange.run().await)
    }
}

impl<T: StreamTransport + 'static> ChatSession<T> {
    /// Submit `text` and run the exchange as its own task.
    ///
    /// Nothing stops a second submission while an earlier one is still
    /// streaming; their bot turns land in the history in completion order.
    pub fn spawn(&self, text: &str) -> Option<JoinHandle<ExchangeOutcome>> {
        let exchange = self.submit(text)?;
        Some(tokio::spawn(exchange.run()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::EventStream;
    use crate::error::Result;
    use crate::types::Role;
    use crate::view::HtmlTranscript;

    struct Unreachable;

    #[async_trait::async_trait]
    impl StreamTransport for Unreachable {
        async fn start_stream(&self, _: &StreamRequest) -> Result<Option<String>> {
            Ok(None)
        }

        async fn subscribe(&self, _: &str) -> Result<EventStream> {
            unreachable!("no location was handed out")
        }
    }

    fn session() -> (ChatSession<Unreachable>, HtmlTranscript) {
        let page = HtmlTranscript::new();
        let session = ChatSession::new(Unreachable, ChatConfig::new(), Arc::new(page.clone()));
        (session, page)
    }

    #[test]
    fn new_session_empty() {
        let (session, page) = session();
        assert_eq!(session.turn_count(), 0);
        assert!(!page.chat_shown());
    }

    #[test]
    fn whitespace_is_rejected() {
        let (session, page) = session();
        assert!(session.submit("").is_none());
        assert!(session.submit(" \t\n ").is_none());
        assert_eq!(session.turn_count(), 0);
        assert!(page.is_empty());
        assert!(!page.chat_shown());
    }

    #[test]
    fn submit_records_user_turn_before_sending() {
        let (session, page) = session();
        let exchange = session.submit("  Ciao  ").unwrap();
        assert_eq!(exchange.state(), crate::chat::ExchangeState::Idle);
        assert_eq!(exchange.request().input_prompt, "Ciao");
        assert!(exchange.request().messages.is_empty());

        let history = session.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history.turns()[0].role(), Role::User);
        assert_eq!(history.turns()[0].text(), "Ciao");

        assert!(page.chat_shown());
        let container = page.container(0).unwrap();
        assert_eq!(container.user_label, "tu: ");
        assert_eq!(container.user_html, "Ciao");
        assert_eq!(container.bot_label, "Climino: ");
        assert_eq!(container.bot_html, "...");
    }

    #[test]
    fn context_excludes_current_input() {
        let (session, _) = session();
        let _first = session.submit("uno").unwrap();
        let second = session.submit("due").unwrap();
        let contents: Vec<&str> = second
            .request()
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["uno"]);
        assert_eq!(session.turn_count(), 2);
    }

    #[tokio::test]
    async fn missing_location_shows_connection_error() {
        let (session, page) = session();
        let outcome = session.send("Ciao").await.unwrap();
        assert!(!outcome.is_completed());
        assert_eq!(page.container(0).unwrap().bot_html, "Errore di connessione.");
        assert_eq!(session.turn_count(), 1);
    }
}
