//! Interactive chat with a Gooey.AI hosted chatbot.
//!
//! This binary provides a streaming REPL in front of a hosted integration.
//!
//! # Usage
//!
//! ```bash
//! # Talk to the default integration
//! climino-chat
//!
//! # Another integration, fewer turns of context
//! climino-chat --integration-id abc123 --context-turns 4
//!
//! # Kiosk use: the prompt survives Ctrl+C and Ctrl+D
//! climino-chat --page-url "https://example.org/chat?type=installation"
//!
//! # Print each outgoing request to stderr
//! climino-chat --verbose
//!
//! # ...and every stream event as it arrives
//! climino-chat --log-events
//! ```
//!
//! # Commands
//!
//! - `/history` - Show the conversation history
//! - `/help` - Show available commands
//! - `/quit` - Exit the application

use std::io::IsTerminal;
use std::sync::Arc;

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use climino::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatSession, TerminalView, help_text, parse_command,
};
use climino::{Gooey, History, StderrLogger};

/// Main entry point for the climino-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("climino-chat [OPTIONS]");
    let config = ChatConfig::try_from(args)?;
    let installation = config.installation_mode;

    let mut client = Gooey::with_options(Some(&config.endpoint), config.timeout())?;
    if config.log_requests {
        let logger = if config.log_events {
            StderrLogger::new().with_events()
        } else {
            StderrLogger::new()
        };
        client = client.with_logger(Arc::new(logger));
    }
    let view = Arc::new(TerminalView::new(config.use_color));
    let session = ChatSession::new(client, config, view);
    let mut rl = DefaultEditor::new()?;

    // Ctrl+C while a response streams ends the program, except in installation mode.
    ctrlc::set_handler(move || {
        if !installation {
            std::process::exit(130);
        }
    })?;

    println!("Climino (integration: {})", session.config().integration_id);
    if installation {
        println!("Installation mode\n");
    } else {
        println!("Type /help for commands, /quit to exit\n");
    }

    let prompt = session.config().user_label.clone();
    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Arrivederci!");
                            break;
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::History => print_history(&session.history()),
                        ChatCommand::Invalid(message) => eprintln!("Error: {message}"),
                    }
                    continue;
                }

                session.send(line).await;
            }
            Err(ReadlineError::Interrupted) if installation => continue,
            Err(ReadlineError::Eof) if installation && std::io::stdin().is_terminal() => {
                continue;
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nArrivederci!");
                break;
            }
            Err(err) => {
                eprintln!("Input error: {}", err);
                break;
            }
        }
    }

    Ok(())
}

fn print_history(history: &History) {
    if history.is_empty() {
        println!("    (no messages yet)");
        return;
    }
    for (i, turn) in history.turns().iter().enumerate() {
        println!("    {:>3} {:<4} {}", i + 1, turn.role(), turn.text());
    }
}
