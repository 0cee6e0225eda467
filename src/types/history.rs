use serde::{Deserialize, Serialize};

use crate::types::{ContextMessage, Turn};

/// Default number of prior turns sent as context with each request.
pub const DEFAULT_CONTEXT_WINDOW: usize = 10;

/// Append-only log of the turns of one session.
///
/// The history grows without bound; only the tail is ever read back when
/// building request context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    turns: Vec<Turn>,
}

impl History {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn.
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Number of turns recorded so far.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// True if nothing has been said yet.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// All turns, oldest first.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// The last `window` turns, oldest first.
    pub fn recent(&self, window: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(window);
        &self.turns[start..]
    }

    /// The last `window` turns converted to request context.
    ///
    /// Call this before recording the turn being submitted so that the
    /// current input is not part of its own context.
    pub fn context(&self, window: usize) -> Vec<ContextMessage> {
        self.recent(window).iter().map(ContextMessage::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContextRole;

    fn history_of(n: usize) -> History {
        let mut history = History::new();
        for i in 0..n {
            if i % 2 == 0 {
                history.push(Turn::user(format!("q{i}")));
            } else {
                history.push(Turn::bot(format!("a{i}")));
            }
        }
        history
    }

    #[test]
    fn empty_history_has_no_context() {
        let history = History::new();
        assert!(history.is_empty());
        assert!(history.context(DEFAULT_CONTEXT_WINDOW).is_empty());
    }

    #[test]
    fn short_history_is_sent_whole() {
        let history = history_of(3);
        let context = history.context(DEFAULT_CONTEXT_WINDOW);
        assert_eq!(context.len(), 3);
        assert_eq!(context[0].content, "q0");
        assert_eq!(context[1].role, ContextRole::Assistant);
        assert_eq!(context[2].content, "q2");
    }

    #[test]
    fn long_history_keeps_most_recent_in_order() {
        let history = history_of(25);
        let context = history.context(DEFAULT_CONTEXT_WINDOW);
        assert_eq!(context.len(), 10);
        let contents: Vec<&str> = context.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(
            contents,
            vec!["a15", "q16", "a17", "q18", "a19", "q20", "a21", "q22", "a23", "q24"]
        );
        assert_eq!(history.len(), 25);
    }

    #[test]
    fn zero_window_sends_nothing() {
        let history = history_of(4);
        assert!(history.context(0).is_empty());
        assert!(history.recent(0).is_empty());
    }
}
