//! Slash command parsing for the chat application.
//!
//! Input starting with `/` controls the front end and is never sent to the
//! chatbot.

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Print the conversation history.
    History,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command, or `None` if it
/// should be submitted as a message.
///
/// # Examples
///
/// ```
/// # use climino::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("Che tempo fa a Roma?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(str::trim).filter(|s| !s.is_empty());

    let result = match (command.as_str(), argument) {
        ("history", None) => ChatCommand::History,
        ("help" | "?", None) => ChatCommand::Help,
        ("quit" | "exit" | "q", None) => ChatCommand::Quit,
        ("history" | "help" | "?" | "quit" | "exit" | "q", Some(_)) => {
            ChatCommand::Invalid(format!("/{command} takes no arguments"))
        }
        _ => ChatCommand::Invalid(format!("Unknown command: /{command}")),
    };

    Some(result)
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /history               Show the conversation history
  /help                  Show this help message
  /quit                  Exit the chat"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_commands() {
        assert_eq!(parse_command("/history"), Some(ChatCommand::History));
        assert_eq!(parse_command("/HELP"), Some(ChatCommand::Help));
        assert_eq!(parse_command("/?"), Some(ChatCommand::Help));
        assert_eq!(parse_command("  /exit  "), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/q"), Some(ChatCommand::Quit));
    }

    #[test]
    fn messages_are_not_commands() {
        assert_eq!(parse_command("ciao /quit"), None);
        assert_eq!(parse_command(""), None);
    }

    #[test]
    fn unknown_and_malformed_commands() {
        assert_eq!(
            parse_command("/model gpt"),
            Some(ChatCommand::Invalid("Unknown command: /model".to_string()))
        );
        assert_eq!(
            parse_command("/quit now"),
            Some(ChatCommand::Invalid("/quit takes no arguments".to_string()))
        );
    }

    #[test]
    fn help_lists_every_command() {
        let help = help_text();
        for command in ["/history", "/help", "/quit"] {
            assert!(help.contains(command));
        }
    }
}
