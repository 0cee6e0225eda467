use serde::{Deserialize, Serialize};

/// Who produced a turn of the conversation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person typing into the widget.
    User,

    /// The hosted chatbot.
    Bot,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => f.pad("user"),
            Role::Bot => f.pad("bot"),
        }
    }
}

/// One entry of the conversation history.
///
/// Turns are immutable once created; the history only ever appends them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    role: Role,
    text: String,
}

impl Turn {
    /// Create a new turn.
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    /// Create a user turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    /// Create a bot turn.
    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(Role::Bot, text)
    }

    /// The role that produced this turn.
    pub fn role(&self) -> Role {
        self.role
    }

    /// The text of this turn.
    pub fn text(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn turn_serializes_lowercase_role() {
        let turn = Turn::bot("Ciao!");
        assert_eq!(
            to_value(&turn).unwrap(),
            json!({
                "role": "bot",
                "text": "Ciao!"
            })
        );
    }

    #[test]
    fn constructors_set_role() {
        assert_eq!(Turn::user("a").role(), Role::User);
        assert_eq!(Turn::bot("b").role(), Role::Bot);
        assert_eq!(Turn::user("a").text(), "a");
    }
}
