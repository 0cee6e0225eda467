//! Logging trait for client operations.
//!
//! This module provides the [`ClientLogger`] trait that allows users to capture
//! the traffic passing through the [`Gooey`](crate::Gooey) client, and a
//! [`StderrLogger`] that prints it for debugging.

use std::io::{self, Write};

use crate::{StreamEvent, StreamRequest};

/// A trait for logging client operations.
///
/// # Example
///
/// ```rust,ignore
/// use climino::{ClientLogger, StreamEvent, StreamRequest};
/// use std::sync::Mutex;
///
/// struct FileLogger {
///     file: Mutex<std::fs::File>,
/// }
///
/// impl ClientLogger for FileLogger {
///     fn log_request(&self, request: &StreamRequest) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "Request: {}", serde_json::to_string(request).unwrap()).unwrap();
///     }
/// }
/// ```
pub trait ClientLogger: Send + Sync {
    /// Log the payload of a request that is about to be sent.
    fn log_request(&self, request: &StreamRequest);

    /// Log the stream location returned for a request.
    fn log_stream_location(&self, location: &str) {
        _ = location;
    }

    /// Log an individual parsed stream event.
    fn log_stream_event(&self, event: &StreamEvent) {
        _ = event;
    }

    /// Whether [`log_stream_event`](Self::log_stream_event) wants to be
    /// called.  Events are only parsed for logging when this is true.
    fn logs_stream_events(&self) -> bool {
        true
    }
}

/// Writes requests and stream locations to stderr.
#[derive(Debug, Default)]
pub struct StderrLogger {
    events: bool,
}

impl StderrLogger {
    /// Log requests and stream locations only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also log every stream event.
    pub fn with_events(mut self) -> Self {
        self.events = true;
        self
    }
}

impl ClientLogger for StderrLogger {
    fn log_request(&self, request: &StreamRequest) {
        let body = serde_json::to_string_pretty(request)
            .unwrap_or_else(|e| format!("<serialization error: {e}>"));
        let _ = writeln!(io::stderr(), "Sending to Gooey: {body}");
    }

    fn log_stream_location(&self, location: &str) {
        let _ = writeln!(io::stderr(), "Streaming from {location}");
    }

    fn log_stream_event(&self, event: &StreamEvent) {
        let _ = writeln!(io::stderr(), "Stream event: {event:?}");
    }

    fn logs_stream_events(&self) -> bool {
        self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RequestsOnly;

    impl ClientLogger for RequestsOnly {
        fn log_request(&self, _: &StreamRequest) {}
    }

    #[test]
    fn stderr_logger_skips_events_unless_asked() {
        assert!(!StderrLogger::new().logs_stream_events());
        assert!(StderrLogger::new().with_events().logs_stream_events());
    }

    #[test]
    fn custom_loggers_see_events_by_default() {
        assert!(RequestsOnly.logs_stream_events());
    }
}
