use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Event type that marks the end of a streamed response.
pub const FINAL_RESPONSE: &str = "final_response";

/// Event type given to payloads that could not be parsed as JSON.
pub const PARTIAL: &str = "partial";

/// The interesting part of one message on the response stream.
///
/// The vendor sends considerably more than this; everything besides the text
/// fragment and the event type is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEvent {
    /// The event type, e.g. `final_response`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,

    /// A fragment of response text to append.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl StreamEvent {
    /// An event carrying a bare text fragment.
    pub fn partial(text: impl Into<String>) -> Self {
        Self {
            event_type: Some(PARTIAL.to_string()),
            text: Some(text.into()),
        }
    }

    /// The terminal event.
    pub fn final_response() -> Self {
        Self {
            event_type: Some(FINAL_RESPONSE.to_string()),
            text: None,
        }
    }

    /// Parse an event payload as JSON.
    ///
    /// A JSON value that is not an object yields an event with neither text
    /// nor type.  Numeric and boolean `text` values are stringified; `null`
    /// counts as absent.
    pub fn try_parse(data: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(data)?;
        let Value::Object(map) = value else {
            return Ok(Self::default());
        };
        let text = match map.get("text") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::Bool(b)) => Some(b.to_string()),
            _ => None,
        };
        let event_type = match map.get("type") {
            Some(Value::String(s)) => Some(s.clone()),
            _ => None,
        };
        Ok(Self { event_type, text })
    }

    /// Parse an event payload, treating anything that is not JSON as a
    /// partial text fragment.
    pub fn parse(data: &str) -> Self {
        Self::try_parse(data).unwrap_or_else(|_| Self::partial(data))
    }

    /// True for the event that ends the stream.
    pub fn is_final(&self) -> bool {
        self.event_type.as_deref() == Some(FINAL_RESPONSE)
    }
}
