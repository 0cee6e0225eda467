// Public modules
pub mod history;
pub mod stream_event;
pub mod stream_request;
pub mod turn;

// Re-exports
pub use history::{DEFAULT_CONTEXT_WINDOW, History};
pub use stream_event::{FINAL_RESPONSE, PARTIAL, StreamEvent};
pub use stream_request::{ContextMessage, ContextRole, StreamRequest};
pub use turn::{Role, Turn};
