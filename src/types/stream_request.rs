use serde::{Deserialize, Serialize};

use crate::types::{Role, Turn};

/// Role of a context message as the vendor API names it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextRole {
    /// A previous user turn.
    User,

    /// A previous bot turn.
    Assistant,
}

impl From<Role> for ContextRole {
    fn from(role: Role) -> Self {
        match role {
            Role::User => ContextRole::User,
            Role::Bot => ContextRole::Assistant,
        }
    }
}

/// A prior turn sent along with the request so the bot has some context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextMessage {
    /// Who said it.
    pub role: ContextRole,

    /// What was said.
    pub content: String,
}

impl From<&Turn> for ContextMessage {
    fn from(turn: &Turn) -> Self {
        Self {
            role: turn.role().into(),
            content: turn.text().to_string(),
        }
    }
}

/// Body of the POST that starts a streamed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamRequest {
    /// Identifier of the hosted integration.
    pub integration_id: String,

    /// The text the user just submitted.
    pub input_prompt: String,

    /// Recent history, oldest first, excluding `input_prompt` itself.
    pub messages: Vec<ContextMessage>,
}

impl StreamRequest {
    /// Create a request for `input_prompt` with the given context.
    pub fn new(
        integration_id: impl Into<String>,
        input_prompt: impl Into<String>,
        messages: Vec<ContextMessage>,
    ) -> Self {
        Self {
            integration_id: integration_id.into(),
            input_prompt: input_prompt.into(),
            messages,
        }
    }
}
