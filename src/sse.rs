//! Server-Sent Events (SSE) processing for streaming responses.
//!
//! This module turns the raw byte stream of an HTTP response into a stream of
//! [`SseMessage`]s, handling buffering, line endings and multi-byte characters
//! split across chunks.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

use crate::observability::{STREAM_BYTES, STREAM_ERRORS};
use crate::{Error, Result};

/// One dispatched server-sent event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseMessage {
    /// The `event:` field, if the server named the event.
    pub event: Option<String>,

    /// All `data:` lines of the event, joined with `\n`.
    pub data: String,

    /// The `id:` field, if any.
    pub id: Option<String>,
}

impl SseMessage {
    /// A default-typed message with the given data.
    pub fn data(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            ..Self::default()
        }
    }

    /// True if an `EventSource` would hand this to its `message` listener.
    pub fn is_message(&self) -> bool {
        matches!(self.event.as_deref(), None | Some("message"))
    }
}

/// Process a stream of bytes into a stream of server-sent events.
///
/// An incomplete event left in the buffer when the byte stream ends is
/// discarded.
pub fn process_sse<S, E>(byte_stream: S) -> impl Stream<Item = Result<SseMessage>>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    let stream = byte_stream
        .map(|result| {
            result.map_err(|e| {
                Error::streaming(format!("Error in HTTP stream: {e}"), Some(Box::new(e)))
            })
        })
        .fuse();

    let buffer = String::new();
    let pending: Vec<u8> = Vec::new();

    stream::unfold(
        (stream, buffer, pending),
        move |(mut stream, mut buffer, mut pending)| async move {
            loop {
                if let Some((event, remaining)) = extract_event(&buffer) {
                    buffer = remaining;
                    match event {
                        Some(event) => return Some((Ok(event), (stream, buffer, pending))),
                        None => continue,
                    }
                }

                match stream.next().await {
                    Some(Ok(bytes)) => {
                        STREAM_BYTES.count(bytes.len() as u64);
                        pending.extend_from_slice(&bytes);
                        let valid = match std::str::from_utf8(&pending) {
                            Ok(text) => text.len(),
                            Err(e) if e.error_len().is_none() => e.valid_up_to(),
                            Err(e) => {
                                STREAM_ERRORS.click();
                                pending.clear();
                                return Some((Err(e.into()), (stream, buffer, pending)));
                            }
                        };
                        let rest = pending.split_off(valid);
                        if let Ok(text) = std::str::from_utf8(&pending) {
                            push_normalized(&mut buffer, text);
                        }
                        pending = rest;
                    }
                    Some(Err(e)) => {
                        STREAM_ERRORS.click();
                        return Some((Err(e), (stream, buffer, pending)));
                    }
                    None if buffer.ends_with('\r') => {
                        buffer.pop();
                        buffer.push('\n');
                    }
                    None => return None,
                }
            }
        },
    )
}

/// Append decoded text to `buffer`, folding CRLF and lone CR into LF.
///
/// A CR at the very end stays raw until the next chunk shows whether an LF
/// completes it.
fn push_normalized(buffer: &mut String, text: &str) {
    let mut pending_cr = buffer.ends_with('\r');
    if pending_cr {
        buffer.pop();
    }
    for c in text.chars() {
        if pending_cr {
            buffer.push('\n');
            pending_cr = false;
            if c == '\n' {
                continue;
            }
        }
        match c {
            '\r' => pending_cr = true,
            c => buffer.push(c),
        }
    }
    if pending_cr {
        buffer.push('\r');
    }
}

/// Extract the next complete SSE event from a buffer string.
///
/// Returns `None` if the buffer does not yet hold a blank-line terminated
/// event.  A complete event with no `data:` line yields `Some((None, rest))`
/// and is not dispatched.
fn extract_event(buffer: &str) -> Option<(Option<SseMessage>, String)> {
    let (event_text, rest) = buffer.split_once("\n\n")?;
    let rest = rest.to_string();

    let mut message = SseMessage::default();
    let mut data_lines: Vec<&str> = Vec::new();
    for line in event_text.split('\n') {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "data" => data_lines.push(value),
            "event" => message.event = Some(value.to_string()),
            "id" => message.id = Some(value.to_string()),
            _ => {}
        }
    }

    if data_lines.is_empty() {
        return Some((None, rest));
    }
    message.data = data_lines.join("\n");
    Some((Some(message), rest))
}
