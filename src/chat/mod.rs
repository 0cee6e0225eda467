//! Chat front end for a hosted streaming chatbot.
//!
//! This module turns lines of user input into streamed exchanges with the
//! chatbot. It supports:
//!
//! - Streaming responses rendered as they arrive
//! - Limited conversational context drawn from recent history
//! - Bold and bibliography formatting of responses
//! - Installation (kiosk) mode
//!
//! # Architecture
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`session`]: history ownership and submission of exchanges
//! - [`exchange`]: one request and its streamed response
//! - [`render`]: terminal output
//! - [`commands`]: slash command parsing

mod commands;
mod config;
mod exchange;
mod render;
mod session;

pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig, DEFAULT_INTEGRATION_ID, is_installation_page};
pub use exchange::{Accumulator, Exchange, ExchangeOutcome, ExchangeState, FailureCause};
pub use render::{TerminalView, render_ansi};
pub use session::ChatSession;
