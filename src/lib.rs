// Public modules
pub mod chat;
pub mod client;
pub mod client_logger;
pub mod error;
pub mod format;
pub mod observability;
pub mod sse;
pub mod types;
pub mod view;

// Re-exports
pub use client::{DEFAULT_ENDPOINT, EventStream, Gooey, StreamTransport};
pub use client_logger::{ClientLogger, StderrLogger};
pub use error::{Error, Result};
pub use format::Formatted;
pub use observability::register_biometrics;
pub use sse::SseMessage;
pub use types::*;
pub use view::{ChatView, ExchangeView, HtmlTranscript};
