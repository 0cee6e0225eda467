//! A single exchange: one submission and the streamed response to it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use futures::StreamExt;

use crate::chat::config::ChatConfig;
use crate::client::StreamTransport;
use crate::error::Error;
use crate::format::Formatted;
use crate::observability::{
    EXCHANGES_COMPLETED, EXCHANGES_FAILED, STREAM_DURATION, STREAM_EVENTS, STREAM_FALLBACK_EVENTS,
    STREAM_TTFB,
};
use crate::types::{History, StreamEvent, StreamRequest, Turn};
use crate::view::ExchangeView;

/// Lifecycle of an exchange.
///
/// `Idle → Pending → Streaming → {Completed | Failed}`.  A response that ends
/// without text goes straight from `Pending` to a terminal state.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ExchangeState {
    /// Submitted; no request sent yet.
    Idle,
    /// Request sent; no text received.
    Pending,
    /// At least one fragment received.
    Streaming,
    /// The final event arrived and the response was recorded.
    Completed,
    /// The exchange ended without a final event.
    Failed,
}

impl ExchangeState {
    /// True for `Completed` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, ExchangeState::Completed | ExchangeState::Failed)
    }

    /// True if `next` is a legal successor of `self`.
    pub fn can_advance_to(self, next: ExchangeState) -> bool {
        use ExchangeState::*;
        matches!(
            (self, next),
            (Idle, Pending)
                | (Pending, Streaming)
                | (Pending, Completed)
                | (Pending, Failed)
                | (Streaming, Completed)
                | (Streaming, Failed)
        )
    }
}

/// Why an exchange failed.
#[derive(Clone, Debug)]
pub enum FailureCause {
    /// The service answered without a stream location.
    MissingLocation,
    /// The request that starts the stream failed.
    Request(Error),
    /// The stream could not be opened or broke mid-way.
    Transport(Error),
    /// The stream ended before the final event.
    Closed,
}

/// How an exchange ended.
#[derive(Clone, Debug)]
pub enum ExchangeOutcome {
    /// The response streamed to completion and was added to the history.
    Completed {
        /// The accumulated response text.
        text: String,
    },
    /// The exchange ended early; nothing was added to the history.
    Failed {
        /// Text received before the failure, if any.
        partial: Option<String>,
        /// What went wrong.
        cause: FailureCause,
    },
}

impl ExchangeOutcome {
    /// The terminal state this outcome corresponds to.
    pub fn state(&self) -> ExchangeState {
        match self {
            ExchangeOutcome::Completed { .. } => ExchangeState::Completed,
            ExchangeOutcome::Failed { .. } => ExchangeState::Failed,
        }
    }

    /// True if the response completed.
    pub fn is_completed(&self) -> bool {
        matches!(self, ExchangeOutcome::Completed { .. })
    }

    /// The response text, complete or partial.
    pub fn text(&self) -> Option<&str> {
        match self {
            ExchangeOutcome::Completed { text } => Some(text),
            ExchangeOutcome::Failed { partial, .. } => partial.as_deref(),
        }
    }
}

/// Response text received so far in one exchange.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Accumulator {
    text: String,
}

impl Accumulator {
    /// An empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment.
    pub fn push(&mut self, fragment: &str) {
        self.text.push_str(fragment);
    }

    /// The text so far.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// True if no text has arrived.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Take the text.
    pub fn into_string(self) -> String {
        self.text
    }
}

pub(crate) fn lock_history(history: &Mutex<History>) -> MutexGuard<'_, History> {
    history.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A submitted exchange, ready to run.
///
/// Created by [`ChatSession::submit`](crate::chat::ChatSession::submit) after
/// the user turn has been recorded and rendered.  Each exchange owns its view
/// and accumulator, so several may run at once.
pub struct Exchange<T: StreamTransport> {
    transport: Arc<T>,
    config: Arc<ChatConfig>,
    history: Arc<Mutex<History>>,
    view: Box<dyn ExchangeView>,
    request: StreamRequest,
    state: ExchangeState,
}

impl<T: StreamTransport> Exchange<T> {
    pub(crate) fn new(
        transport: Arc<T>,
        config: Arc<ChatConfig>,
        history: Arc<Mutex<History>>,
        view: Box<dyn ExchangeView>,
        request: StreamRequest,
    ) -> Self {
        Self {
            transport,
            config,
            history,
            view,
            request,
            state: ExchangeState::Idle,
        }
    }

    /// The payload this exchange will send.
    pub fn request(&self) -> &StreamRequest {
        &self.request
    }

    /// The current state.
    pub fn state(&self) -> ExchangeState {
        self.state
    }

    fn advance(&mut self, next: ExchangeState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal exchange transition {:?} -> {next:?}",
            self.state
        );
        self.state = next;
    }

    /// Send the request and stream the response into the view.
    ///
    /// Never returns an error: every failure is rendered and reported in the
    /// outcome.
    pub async fn run(mut self) -> ExchangeOutcome {
        self.advance(ExchangeState::Pending);
        let started = Instant::now();

        let location = match self.transport.start_stream(&self.request).await {
            Ok(Some(location)) => location,
            Ok(None) => return self.fail_to_connect(FailureCause::MissingLocation),
            Err(err) => return self.fail_to_connect(FailureCause::Request(err)),
        };

        let mut events = match self.transport.subscribe(&location).await {
            Ok(events) => events,
            Err(err) => return self.fail(None, FailureCause::Transport(err)),
        };

        let mut accumulator = Accumulator::new();
        let mut first_event = true;
        while let Some(message) = events.next().await {
            let message = match message {
                Ok(message) => message,
                Err(err) => {
                    drop(events);
                    return self.fail(Some(accumulator), FailureCause::Transport(err));
                }
            };
            if !message.is_message() {
                continue;
            }
            STREAM_EVENTS.click();
            if first_event {
                STREAM_TTFB.add(started.elapsed().as_secs_f64());
                first_event = false;
            }

            let event = StreamEvent::try_parse(&message.data).unwrap_or_else(|_| {
                STREAM_FALLBACK_EVENTS.click();
                StreamEvent::partial(message.data)
            });
            if let Some(text) = &event.text {
                accumulator.push(text);
                if self.state == ExchangeState::Pending {
                    self.advance(ExchangeState::Streaming);
                }
                self.view.bot_update(&Formatted::parse(accumulator.as_str()));
            }
            if event.is_final() {
                drop(events);
                STREAM_DURATION.add(started.elapsed().as_secs_f64());
                return self.complete(accumulator);
            }
        }

        drop(events);
        self.fail(Some(accumulator), FailureCause::Closed)
    }

    fn complete(mut self, accumulator: Accumulator) -> ExchangeOutcome {
        let text = accumulator.into_string();
        lock_history(&self.history).push(Turn::bot(text.clone()));
        self.advance(ExchangeState::Completed);
        EXCHANGES_COMPLETED.click();
        self.view.finish();
        ExchangeOutcome::Completed { text }
    }

    fn fail_to_connect(mut self, cause: FailureCause) -> ExchangeOutcome {
        self.view.bot_text(&self.config.connection_error);
        self.advance(ExchangeState::Failed);
        EXCHANGES_FAILED.click();
        self.view.finish();
        ExchangeOutcome::Failed {
            partial: None,
            cause,
        }
    }

    fn fail(mut self, accumulator: Option<Accumulator>, cause: FailureCause) -> ExchangeOutcome {
        let partial = accumulator
            .filter(|acc| !acc.is_empty())
            .map(Accumulator::into_string);
        match &partial {
            Some(text) => self.view.bot_text(text),
            None => self.view.bot_text(&self.config.network_error),
        }
        self.advance(ExchangeState::Failed);
        EXCHANGES_FAILED.click();
        self.view.finish();
        ExchangeOutcome::Failed { partial, cause }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ExchangeState::*;

    #[test]
    fn legal_transitions() {
        assert!(Idle.can_advance_to(Pending));
        assert!(Pending.can_advance_to(Streaming));
        assert!(Pending.can_advance_to(Failed));
        assert!(Pending.can_advance_to(Completed));
        assert!(Streaming.can_advance_to(Completed));
        assert!(Streaming.can_advance_to(Failed));
    }

    #[test]
    fn terminal_states_are_final() {
        for state in [Idle, Pending, Streaming, Completed, Failed] {
            assert!(!Completed.can_advance_to(state));
            assert!(!Failed.can_advance_to(state));
        }
        assert!(Completed.is_terminal());
        assert!(Failed.is_terminal());
        assert!(!Streaming.is_terminal());
    }

    #[test]
    fn no_skipping_the_request() {
        assert!(!Idle.can_advance_to(Streaming));
        assert!(!Idle.can_advance_to(Completed));
        assert!(!Streaming.can_advance_to(Pending));
    }

    #[test]
    fn accumulator_appends_fragments() {
        let mut acc = Accumulator::new();
        assert!(acc.is_empty());
        acc.push("Hel");
        acc.push("lo");
        assert_eq!(acc.as_str(), "Hello");
        assert_eq!(acc.into_string(), "Hello");
    }

    #[test]
    fn outcome_accessors() {
        let done = ExchangeOutcome::Completed {
            text: "ok".to_string(),
        };
        assert!(done.is_completed());
        assert_eq!(done.state(), Completed);
        assert_eq!(done.text(), Some("ok"));

        let failed = ExchangeOutcome::Failed {
            partial: None,
            cause: FailureCause::MissingLocation,
        };
        assert_eq!(failed.state(), Failed);
        assert_eq!(failed.text(), None);
    }
}
